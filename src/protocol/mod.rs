//! XHTTP protocol vocabulary.
//!
//! # Data Flow
//! ```text
//! HTTP request headers
//!     → request.rs (X-Mode, X-Service, X-Version, ... as typed values)
//!     → [dispatcher validates against the registry]
//!     → response.rs (JSON envelope)           on success
//!     → error.rs → response.rs (status line)  on failure
//! ```

pub mod error;
pub mod request;
pub mod response;

/// The one XHTTP schema version this node speaks.
pub const SCHEMA_VERSION: &str = "1.0";

/// Default `Server` header value.
pub const SERVER_NAME: &str = "XHTTP Rust node";

pub use error::{ErrorKind, XhttpError, XhttpResult};
pub use request::{ArgumentTypes, Mode, ServiceSpec, XhttpRequest};
pub use response::XhttpResponse;
