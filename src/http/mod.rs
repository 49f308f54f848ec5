//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → dispatch.rs (validate X-* headers against the registry)
//!     → controller.rs (perform mode only)
//!     → protocol::response (JSON body or status line)
//!     → Send to client
//! ```

pub mod controller;
pub mod dispatch;
pub mod request;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ActionCall, ActionController, ControllerRegistry};
pub use dispatch::Dispatcher;
pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
