//! XHTTP node library.
//!
//! A header-driven RPC node: clients pick a service, version and action
//! with `X-*` request headers and get JSON back.

// Schema dialect and the registry built from it
pub mod registry;
pub mod schema;

// Protocol and transport
pub mod http;
pub mod protocol;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::NodeConfig;
pub use http::{ActionCall, ActionController, ControllerRegistry, HttpServer};
pub use lifecycle::Shutdown;
pub use protocol::{ErrorKind, XhttpError, XhttpResult};
pub use registry::{RegistryWatcher, ServiceRegistry, SharedRegistry};
