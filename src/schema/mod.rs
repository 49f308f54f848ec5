//! Service schema documents.
//!
//! # Data Flow
//! ```text
//! <service>.xml
//!     → parser.rs (roxmltree document → typed model)
//!     → SchemaDocument { version → VersionSchema, __meta__ }
//!     → handed to the registry, read-only from then on
//! ```
//!
//! # Design Decisions
//! - One document per service; the file stem is the service name
//! - Attributes are copied verbatim, only the mandatory ones are checked
//! - No partial results: any error fails the whole document

pub mod model;
pub mod parser;

pub use model::{
    ActionDescriptor, ArgumentDescriptor, Attributes, ExceptionDescriptor, SchemaDocument,
    SchemaMeta, VersionSchema, META_KEY,
};
pub use parser::{parse_document, ChildScope, ParseOptions, SchemaErrorKind, SchemaParseError, XHTTP_NAMESPACE};
