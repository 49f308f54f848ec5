//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! service_dir/*.xml
//!     → node.rs (scan, parse each document, fail fast)
//!     → ServiceRegistry (service → version → schema, immutable)
//!     → shared via ArcSwap to request handlers
//!
//! On change (watcher or SIGHUP):
//!     watcher.rs checks __meta__ against the directory
//!     → node.rs builds a fresh registry
//!     → atomic swap; a failed build keeps the old one
//! ```

pub mod node;
pub mod watcher;

pub use node::{scan_service_dir, RegistryError, ServiceRegistry};
pub use watcher::{RegistryWatcher, SharedRegistry};
