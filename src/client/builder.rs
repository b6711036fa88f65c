use std::sync::Arc;

use crate::client::core::{ClientInner, ServiceClient};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::events::EventEmitter;
use crate::model::ServiceModel;
use crate::parser::ParserFactory;
use crate::retry::RetryPolicy;
use crate::serialize::RequestSerializer;
use crate::session::{ComponentFactory, DefaultComponentFactory};
use crate::signer::RequestSigner;
use crate::transport::Transport;
use crate::{Error, Result};

/// Builder for [`ServiceClient`].
///
/// Anything not set explicitly comes from the component factory
/// ([`DefaultComponentFactory`] unless replaced).
pub struct ClientBuilder {
    service_model: Arc<ServiceModel>,
    endpoint_url: Option<String>,
    config: ClientConfig,
    factory: Arc<dyn ComponentFactory>,
    transport: Option<Arc<dyn Transport>>,
    parsers: Option<Arc<dyn ParserFactory>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    signer: Option<Arc<dyn RequestSigner>>,
    serializer: Option<Arc<dyn RequestSerializer>>,
    events: Option<Arc<EventEmitter>>,
}

impl ClientBuilder {
    pub fn new(service_model: Arc<ServiceModel>) -> Self {
        Self {
            service_model,
            endpoint_url: None,
            config: ClientConfig::default(),
            factory: Arc::new(DefaultComponentFactory::new()),
            transport: None,
            parsers: None,
            retry_policy: None,
            signer: None,
            serializer: None,
            events: None,
        }
    }

    /// Base URL requests are sent to. Falls back to `config.endpoint_url`.
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn component_factory(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replace the network transport (mock servers, scripted test doubles).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn parser_factory(mut self, parsers: Arc<dyn ParserFactory>) -> Self {
        self.parsers = Some(parsers);
        self
    }

    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn RequestSerializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Share a hook registry (e.g. the session's) instead of a private one.
    pub fn events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<ServiceClient> {
        let endpoint_url = self
            .endpoint_url
            .or_else(|| self.config.endpoint_url.clone())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "no endpoint url configured for service '{}'",
                    self.service_model.service_name()
                ))
            })?;

        let transport = match self.transport {
            Some(t) => t,
            None => self.factory.transport(&self.config)?,
        };
        let parsers = self.parsers.unwrap_or_else(|| self.factory.parser_factory());
        let retry_policy = self
            .retry_policy
            .unwrap_or_else(|| self.factory.retry_policy(&self.config));
        let signer = self
            .signer
            .unwrap_or_else(|| self.factory.signer(&self.service_model));
        let serializer = match self.serializer {
            Some(s) => s,
            None => self.factory.serializer(&self.service_model.metadata.protocol)?,
        };

        let endpoint = Endpoint::new(&endpoint_url, transport, parsers, signer, retry_policy)?
            .with_attempt_timeout(self.config.attempt_timeout());

        Ok(ServiceClient {
            inner: Arc::new(ClientInner {
                service_model: self.service_model,
                serializer,
                endpoint,
                events: self.events.unwrap_or_default(),
            }),
        })
    }
}
