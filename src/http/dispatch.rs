//! Request validation and mode dispatch.
//!
//! # Pipeline
//! ```text
//! X-Mode    missing → 550 "Missing X-Mode header" (or perform, if allowed)
//!           empty   → 550 "Request has no X-Mode"
//!           unknown → 550 "Invalid X-Mode <value>"
//! X-Service missing → 450, unknown name → 452
//! X-Version missing → 550 "Missing X-Version header", wrong → 551
//!           not declared by the service → 551
//!
//! version / info / schema:
//!     build content; empty content → 550 "Invalid X-Mode <mode>"
//! perform:
//!     X-Action missing → 451, unknown → 453
//!     X-Arguments malformed or undeclared → 550
//!     no controller → 550, else controller result as JSON
//! ```

use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::Value;

use crate::config::ProtocolConfig;
use crate::http::controller::{ActionCall, ControllerRegistry};
use crate::protocol::request::UnknownMode;
use crate::protocol::{ErrorKind, Mode, ServiceSpec, XhttpError, XhttpRequest, XhttpResponse, XhttpResult};
use crate::registry::ServiceRegistry;

/// Validates one request against a registry snapshot and answers it.
pub struct Dispatcher<'a> {
    registry: &'a ServiceRegistry,
    controllers: &'a ControllerRegistry,
    protocol: &'a ProtocolConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        registry: &'a ServiceRegistry,
        controllers: &'a ControllerRegistry,
        protocol: &'a ProtocolConfig,
    ) -> Self {
        Self {
            registry,
            controllers,
            protocol,
        }
    }

    pub fn dispatch(&self, headers: &HeaderMap, body: Bytes) -> XhttpResult<XhttpResponse> {
        let request = XhttpRequest::new(headers);
        let mode = self.resolve_mode(&request)?;

        tracing::debug!(mode = %mode, "Dispatching XHTTP request");

        match mode {
            Mode::Perform => self.perform(&request, body),
            Mode::Version | Mode::Info | Mode::Schema => self.describe(mode, &request),
        }
    }

    fn resolve_mode(&self, request: &XhttpRequest<'_>) -> XhttpResult<Mode> {
        match request.raw_mode()? {
            None if self.protocol.require_mode_header => Err(XhttpError::internal("Missing X-Mode header")),
            Some("") => Err(XhttpError::internal("Request has no X-Mode")),
            _ => request
                .mode()?
                .map_err(|UnknownMode(value)| XhttpError::internal(format!("Invalid X-Mode {}", value))),
        }
    }

    /// Service and version checks shared by every mode.
    fn target<'h>(&self, request: &XhttpRequest<'h>) -> XhttpResult<(ServiceSpec, &'h str)> {
        let service = request.service()?.ok_or(ErrorKind::ServiceNotSpecified)?;
        self.registry.lookup_service(&service.name)?;

        let version = request
            .version()?
            .ok_or_else(|| XhttpError::internal("Missing X-Version header"))?;
        let version = self.registry.validate_version(version)?;
        self.registry.schema(&service.name, version)?;

        Ok((service, version))
    }

    fn describe(&self, mode: Mode, request: &XhttpRequest<'_>) -> XhttpResult<XhttpResponse> {
        let (service, version) = self.target(request)?;

        let content = match mode {
            Mode::Version => Value::from(self.registry.list_versions(&service.name)?),
            Mode::Info => serde_json::to_value(self.registry.get_info(&service.name, version)?)
                .map_err(|e| XhttpError::unexpected(&e))?,
            // Reserved: no schema introspection response yet.
            Mode::Schema | Mode::Perform => Value::Null,
        };

        if is_empty(&content) {
            return Err(XhttpError::internal(format!("Invalid X-Mode {}", mode)));
        }

        XhttpResponse::json(&content)
    }

    fn perform(&self, request: &XhttpRequest<'_>, body: Bytes) -> XhttpResult<XhttpResponse> {
        let (service, version) = self.target(request)?;

        let action_name = request.action()?.ok_or(ErrorKind::ActionNotSpecified)?;
        let action = self.registry.action(&service.name, version, action_name)?;

        let arguments = request.arguments()?.unwrap_or_default();
        if let Some(unknown) = arguments.keys().find(|name| action.argument(name).is_none()) {
            return Err(XhttpError::internal(format!(
                "Unknown argument {} for action {}",
                unknown, action_name
            )));
        }

        let controller = self
            .controllers
            .resolve(&service.name, version, action_name)
            .ok_or_else(|| {
                XhttpError::internal(format!("No controller registered for action {}", action_name))
            })?;

        let call = ActionCall {
            service: service.name,
            version: version.to_string(),
            action: action.clone(),
            arguments,
            encoding: request.encoding(&self.protocol.default_encoding)?.to_string(),
            body,
        };

        tracing::debug!(
            service = %call.service,
            action = %action_name,
            function = ?call.action.function(),
            "Invoking action controller"
        );

        let result = controller.perform(&call)?;
        XhttpResponse::json(&result)
    }
}

/// Content that counts as "nothing to say".
fn is_empty(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
