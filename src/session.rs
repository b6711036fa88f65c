//! 会话：共享配置、组件工厂与事件钩子，并据此创建客户端。
//!
//! A session holds what clients share: configuration, the component factory
//! that supplies collaborators, the hook registry and the model loader.

use std::sync::Arc;

use crate::client::{ClientBuilder, ServiceClient};
use crate::config::{ClientConfig, EnvVars};
use crate::events::EventEmitter;
use crate::model::{ServiceModel, ServiceModelLoader};
use crate::parser::{DefaultParserFactory, ParserFactory};
use crate::retry::{RetryPolicy, StandardRetryPolicy};
use crate::serialize::{JsonSerializer, RequestSerializer};
use crate::signer::{ContentHashSigner, RequestSigner};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};

/// Supplies the collaborators a client is assembled from.
pub trait ComponentFactory: Send + Sync {
    fn transport(&self, config: &ClientConfig) -> Result<Arc<dyn Transport>>;
    fn parser_factory(&self) -> Arc<dyn ParserFactory>;
    fn retry_policy(&self, config: &ClientConfig) -> Arc<dyn RetryPolicy>;
    fn signer(&self, service_model: &ServiceModel) -> Arc<dyn RequestSigner>;
    fn serializer(&self, protocol: &str) -> Result<Arc<dyn RequestSerializer>>;
}

/// reqwest transport, JSON parser/serializer, content-hash signer, standard
/// retry policy.
#[derive(Debug, Clone, Default)]
pub struct DefaultComponentFactory {
    signer: ContentHashSigner,
}

impl DefaultComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.signer = self.signer.with_credentials(access_key, secret_key);
        self
    }
}

impl ComponentFactory for DefaultComponentFactory {
    fn transport(&self, config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(config)?))
    }

    fn parser_factory(&self) -> Arc<dyn ParserFactory> {
        Arc::new(DefaultParserFactory::new())
    }

    fn retry_policy(&self, config: &ClientConfig) -> Arc<dyn RetryPolicy> {
        Arc::new(StandardRetryPolicy::new(config.max_attempts))
    }

    fn signer(&self, _service_model: &ServiceModel) -> Arc<dyn RequestSigner> {
        Arc::new(self.signer.clone())
    }

    fn serializer(&self, protocol: &str) -> Result<Arc<dyn RequestSerializer>> {
        match protocol {
            "json" | "rest-json" => Ok(Arc::new(JsonSerializer)),
            other => Err(Error::configuration(format!(
                "no request serializer for protocol '{}'",
                other
            ))),
        }
    }
}

pub struct Session {
    env_vars: EnvVars,
    config: ClientConfig,
    factory: Arc<dyn ComponentFactory>,
    events: Arc<EventEmitter>,
    loader: Arc<ServiceModelLoader>,
}

impl Session {
    /// Build a session whose settings come from the variables in `env_vars`.
    pub fn new(env_vars: EnvVars) -> Self {
        let config = ClientConfig::default().with_env_overrides(&env_vars);
        let mut factory = DefaultComponentFactory::new();
        if let (Some(ak), Some(sk)) = (env_vars.get("access_key_id"), env_vars.get("secret_access_key")) {
            factory = factory.with_credentials(ak, sk);
        }
        Self {
            env_vars,
            config,
            factory: Arc::new(factory),
            events: Arc::new(EventEmitter::new()),
            loader: Arc::new(ServiceModelLoader::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EnvVars::default())
    }

    pub fn env_vars(&self) -> &EnvVars {
        &self.env_vars
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_model_loader(mut self, loader: ServiceModelLoader) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Replace the factory used by every client created afterwards.
    pub fn register_component_factory(&mut self, factory: Arc<dyn ComponentFactory>) {
        self.factory = factory;
    }

    /// Hooks registered here fire for every client of this session.
    pub fn events(&self) -> &Arc<EventEmitter> {
        &self.events
    }

    /// Start a client builder wired to this session's shared state.
    pub fn client_builder(&self, service_model: Arc<ServiceModel>) -> ClientBuilder {
        ClientBuilder::new(service_model)
            .config(self.config.clone())
            .component_factory(self.factory.clone())
            .events(self.events.clone())
    }

    /// Create a client. `endpoint_url` falls back to the configured one.
    pub fn create_client(&self, service_model: Arc<ServiceModel>, endpoint_url: Option<&str>) -> Result<ServiceClient> {
        let mut builder = self.client_builder(service_model);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }
        builder.build()
    }

    /// Load `service` through the model loader, then create a client for it.
    pub async fn create_client_for(&self, service: &str, endpoint_url: Option<&str>) -> Result<ServiceClient> {
        let model = self.loader.load_service(service).await?;
        self.create_client(model, endpoint_url)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Session with default or remapped environment variable names.
pub fn get_session(env_vars: Option<EnvVars>) -> Session {
    Session::new(env_vars.unwrap_or_default())
}
