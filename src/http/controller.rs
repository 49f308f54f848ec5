//! Perform-mode action controllers.
//!
//! A controller is the code behind one `(service, version, action)`
//! triple. The dispatcher validates the call against the schema, resolves
//! the controller here and encodes whatever it returns as JSON. Argument
//! values are not decoded; a controller sees the declared types, the
//! encoding and the raw body.

use axum::body::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::{ArgumentTypes, XhttpResult};
use crate::schema::ActionDescriptor;

/// A validated perform-mode request.
#[derive(Debug, Clone)]
pub struct ActionCall {
    pub service: String,
    pub version: String,
    /// Schema entry of the invoked action.
    pub action: ActionDescriptor,
    /// Types declared in `X-Arguments`, all known to the action.
    pub arguments: ArgumentTypes,
    pub encoding: String,
    pub body: Bytes,
}

/// Code implementing an action.
pub trait ActionController: Send + Sync {
    fn perform(&self, call: &ActionCall) -> XhttpResult<Value>;
}

impl<F> ActionController for F
where
    F: Fn(&ActionCall) -> XhttpResult<Value> + Send + Sync,
{
    fn perform(&self, call: &ActionCall) -> XhttpResult<Value> {
        self(call)
    }
}

type ControllerKey = (String, String, String);

/// Controllers keyed by `(service, version, action)`.
#[derive(Default, Clone)]
pub struct ControllerRegistry {
    controllers: HashMap<ControllerKey, Arc<dyn ActionController>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `controller`, replacing any previous one for the same action.
    pub fn register<C>(&mut self, service: &str, version: &str, action: &str, controller: C) -> &mut Self
    where
        C: ActionController + 'static,
    {
        let key = (service.to_string(), version.to_string(), action.to_string());
        if self.controllers.insert(key, Arc::new(controller)).is_some() {
            tracing::warn!(service, version, action, "Replaced action controller");
        }
        self
    }

    pub fn resolve(&self, service: &str, version: &str, action: &str) -> Option<Arc<dyn ActionController>> {
        let key = (service.to_string(), version.to_string(), action.to_string());
        self.controllers.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.controllers.keys()).finish()
    }
}
