//! Scripted transport double: replays canned responses and records every
//! request it was asked to send.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use svc_lib_rust::events::InMemoryEventHook;
use svc_lib_rust::signer::ContentHashSigner;
use svc_lib_rust::{
    ClientBuilder, ClientConfig, EventEmitter, RawResponse, RequestDescriptor, ServiceClient, ServiceModel, StandardRetryPolicy,
    Transport, TransportError,
};

#[derive(Debug, Clone)]
pub enum Step {
    Respond(u16, &'static str),
    Refuse(&'static str),
    /// Never answers within any reasonable test timeout.
    Stall,
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub attempt: u32,
}

impl Sent {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Plays `steps` in order; once exhausted the last step repeats.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = steps.pop_front() {
            *last = Some(step.clone());
            step
        } else {
            last.clone().expect("scripted transport has no steps")
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let body = request
            .body_bytes()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        self.sent.lock().unwrap().push(Sent {
            url: request.url.to_string(),
            headers: request.headers.clone(),
            body,
            attempt: request.attempt,
        });

        match self.next_step() {
            Step::Respond(status, body) => {
                let mut headers = HeaderMap::new();
                headers.insert("x-amzn-requestid", HeaderValue::from_static("SCRIPTED-ID"));
                Ok(RawResponse::from_bytes(status, headers, body))
            }
            Step::Refuse(msg) => Err(TransportError::Connect(msg.to_string())),
            Step::Stall => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(TransportError::Other("stalled step finished".into()))
            }
        }
    }
}

pub struct Harness {
    pub client: ServiceClient,
    pub transport: Arc<ScriptedTransport>,
    pub events: Arc<InMemoryEventHook>,
}

/// Client over the scripted transport, zero backoff, recording after-call events.
pub fn harness(model: Arc<ServiceModel>, max_attempts: u32, steps: Vec<Step>) -> Harness {
    harness_with_config(model, ClientConfig::default().with_max_attempts(max_attempts), steps)
}

/// Same as [`harness`], with the client built from `config`.
pub fn harness_with_config(model: Arc<ServiceModel>, config: ClientConfig, steps: Vec<Step>) -> Harness {
    let max_attempts = config.max_attempts;
    let transport = ScriptedTransport::new(steps);
    let emitter = Arc::new(EventEmitter::new());
    let events = Arc::new(InMemoryEventHook::new(64));
    emitter.register("after-call", events.clone());

    let client = ClientBuilder::new(model)
        .config(config)
        .endpoint_url("https://dynamodb.us-east-1.example.com")
        .transport(transport.clone())
        .retry_policy(Arc::new(StandardRetryPolicy::no_backoff(max_attempts)))
        .signer(Arc::new(ContentHashSigner::new().with_credentials("AKIDEXAMPLE", "secret")))
        .events(emitter)
        .build()
        .expect("client builds");

    Harness {
        client,
        transport,
        events,
    }
}
