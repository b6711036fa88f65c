//! svc-call: 对服务模型中的单个操作发起调用并打印解析结果
//!
//! Usage:
//!   svc-call <model-file> <endpoint-url> <Operation> [params-json]
//!   svc-call operations <model-file>

use anyhow::{bail, Context};
use std::path::Path;
use std::sync::Arc;
use svc_lib_rust::{get_session, Error, ServiceModel, ServiceModelLoader};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!(
        r#"svc-call: 服务操作调用工具

USAGE:
    svc-call <model-file> <endpoint-url> <Operation> [params-json]
    svc-call operations <model-file>

ENVIRONMENT:
    RUST_LOG                    Log filter (e.g. svc_lib_rust=debug)
    SVC_MAX_ATTEMPTS            Total attempts per call (default 5)
    SVC_ATTEMPT_TIMEOUT_MS      Per-attempt timeout
    SVC_ACCESS_KEY_ID           Signing key id
    SVC_SECRET_ACCESS_KEY       Signing secret"#
    );
}

async fn load_model(path: &str) -> anyhow::Result<ServiceModel> {
    ServiceModelLoader::new()
        .load_from_file(Path::new(path))
        .await
        .with_context(|| format!("failed to load service model from {}", path))
}

async fn cmd_operations(args: &[String]) -> anyhow::Result<()> {
    let Some(path) = args.first() else {
        bail!("missing <model-file>");
    };
    let model = load_model(path).await?;
    for name in model.operation_names() {
        println!("{}", name);
    }
    Ok(())
}

async fn cmd_call(args: &[String]) -> anyhow::Result<()> {
    if args.len() < 3 {
        print_usage();
        bail!("expected <model-file> <endpoint-url> <Operation>");
    }
    let model = Arc::new(load_model(&args[0]).await?);
    let params: serde_json::Value = match args.get(3) {
        Some(raw) => serde_json::from_str(raw).context("params must be a JSON object")?,
        None => serde_json::json!({}),
    };

    let client = get_session(None).create_client(model, Some(args[1].as_str()))?;
    match client.invoke(&args[2], params).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(Error::Client(err)) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.response)?);
            bail!("{}", err)
        }
        Err(other) => Err(other.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(|s| s.as_str()) {
        None | Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("version") | Some("--version") | Some("-V") => {
            println!("svc-call {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("operations") => cmd_operations(&args[1..]).await,
        Some(_) => cmd_call(&args).await,
    }
}
