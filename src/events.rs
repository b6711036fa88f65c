//! 事件钩子：按点分层级名称注册，调用完成后同步、按序触发。
//!
//! Event hooks. Hooks register under a dotted name prefix and receive every
//! event at or below it: a hook on `after-call.dynamodb` sees
//! `after-call.dynamodb.GetItem`. Emission awaits hooks one by one in
//! registration order. A failing hook is logged and does not fail the call.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock};
use tracing::warn;

use crate::model::OperationModel;
use crate::transport::HttpResponse;
use crate::Result;

pub const AFTER_CALL: &str = "after-call";

/// Payload of an `after-call` event.
#[derive(Debug, Clone)]
pub struct CallEvent {
    pub name: String,
    pub http_response: HttpResponse,
    pub parsed: Value,
    pub model: OperationModel,
}

#[async_trait]
pub trait EventHook: Send + Sync {
    async fn on_event(&self, event: &CallEvent) -> Result<()>;
}

/// Adapter for plain closures.
pub struct FnHook<F>(pub F);

#[async_trait]
impl<F> EventHook for FnHook<F>
where
    F: Fn(&CallEvent) -> Result<()> + Send + Sync,
{
    async fn on_event(&self, event: &CallEvent) -> Result<()> {
        (self.0)(event)
    }
}

/// Keeps the most recent events in memory.
pub struct InMemoryEventHook {
    events: Mutex<Vec<CallEvent>>,
    max: usize,
}

impl InMemoryEventHook {
    pub fn new(max: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            max,
        }
    }

    pub fn get_events(&self) -> Vec<CallEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.get_events().into_iter().map(|e| e.name).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut e) = self.events.lock() {
            e.clear();
        }
    }
}

#[async_trait]
impl EventHook for InMemoryEventHook {
    async fn on_event(&self, event: &CallEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            if events.len() >= self.max {
                events.remove(0);
            }
            events.push(event.clone());
        }
        Ok(())
    }
}

fn matches_prefix(name: &str, prefix: &str) -> bool {
    name == prefix
        || (name.len() > prefix.len()
            && name.starts_with(prefix)
            && name.as_bytes()[prefix.len()] == b'.')
}

/// Registry of hooks keyed by dotted name prefix.
#[derive(Default)]
pub struct EventEmitter {
    hooks: RwLock<Vec<(String, Arc<dyn EventHook>)>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, prefix: impl Into<String>, hook: Arc<dyn EventHook>) {
        if let Ok(mut hooks) = self.hooks.write() {
            hooks.push((prefix.into(), hook));
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().map(|h| h.len()).unwrap_or(0)
    }

    /// Deliver `event` to every matching hook, in registration order.
    /// Returns how many hooks ran.
    pub async fn emit(&self, name: &str, event: &CallEvent) -> usize {
        let matching: Vec<Arc<dyn EventHook>> = match self.hooks.read() {
            Ok(hooks) => hooks
                .iter()
                .filter(|(prefix, _)| matches_prefix(name, prefix))
                .map(|(_, hook)| hook.clone())
                .collect(),
            Err(_) => return 0,
        };

        for hook in &matching {
            if let Err(e) = hook.on_event(event).await {
                warn!(event = name, error = %e, "event hook failed");
            }
        }
        matching.len()
    }
}
