//! Client SDK for XHTTP nodes.
//!
//! ```no_run
//! # async fn demo() -> Result<(), xhttp_sdk::ClientError> {
//! let client = xhttp_sdk::XhttpClient::new("http://localhost:8888");
//! let versions = client.versions("calculator").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{ClientError, XhttpClient, DEFAULT_VERSION};
