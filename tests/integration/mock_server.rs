//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use svc_lib_rust::{ClientBuilder, ClientConfig, ServiceClient, ServiceModel, StandardRetryPolicy};
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client using the real reqwest transport against the mock server, with
    /// backoff disabled.
    pub fn create_test_client(&self, model: Arc<ServiceModel>, max_attempts: u32) -> svc_lib_rust::Result<ServiceClient> {
        ClientBuilder::new(model)
            .config(ClientConfig::default().with_max_attempts(max_attempts))
            .endpoint_url(&self.base_url)
            .retry_policy(Arc::new(StandardRetryPolicy::no_backoff(max_attempts)))
            .build()
    }

    /// JSON-protocol mock keyed on the `X-Amz-Target` header.
    pub async fn mock_target(&self, target: &str, status: u16, body: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", "/")
            .match_header("x-amz-target", target)
            .match_header("content-type", "application/x-amz-json-1.0")
            .with_status(usize::from(status))
            .with_header("content-type", "application/x-amz-json-1.0")
            .with_header("x-amzn-requestid", "MOCK-REQUEST-ID")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    pub async fn mock_path(&self, method: &str, path: &str, status: u16, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock(method, path)
            .match_query(Matcher::Any)
            .with_status(usize::from(status))
            .with_body(body)
            .create_async()
            .await
    }
}
