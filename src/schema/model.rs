//! In-memory model of a parsed schema document.
//!
//! Every type serializes to the same nested shape the document describes,
//! which is what `xhttp-node --check` prints.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

/// Reserved key under which document metadata is reported.
pub const META_KEY: &str = "__meta__";

/// XML attributes copied verbatim from an element.
pub type Attributes = BTreeMap<String, String>;

/// Keys a `schema` element's own fields take; attributes with these names are dropped.
pub const SCHEMA_FIELDS: &[&str] = &["info", "actions"];

/// Keys an `action` element's own fields take; attributes with these names are dropped.
pub const ACTION_FIELDS: &[&str] = &["return", "exceptions", "args"];

/// All versions a single service document declares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    /// Version string → schema for that version.
    #[serde(flatten)]
    pub versions: BTreeMap<String, VersionSchema>,

    /// Where the document came from.
    #[serde(rename = "__meta__")]
    pub meta: SchemaMeta,
}

impl SchemaDocument {
    /// Schema for one version, if declared.
    pub fn version(&self, version: &str) -> Option<&VersionSchema> {
        self.versions.get(version)
    }

    /// Declared versions in ascending lexicographic order, reserved
    /// `__`-prefixed keys excluded.
    pub fn version_names(&self) -> Vec<String> {
        // BTreeMap keys are already sorted.
        self.versions
            .keys()
            .filter(|v| !v.starts_with("__"))
            .cloned()
            .collect()
    }
}

/// Source file information, kept for reload checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaMeta {
    /// Absolute path of the document.
    pub file: PathBuf,
    /// Modification time observed when the document was parsed.
    pub mtime: SystemTime,
}

/// One `schema` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionSchema {
    /// Attributes of the `schema` element (at least `version`).
    #[serde(flatten)]
    pub attributes: Attributes,

    /// `info` children, name → value.
    pub info: BTreeMap<String, String>,

    /// `action` children keyed by name.
    pub actions: BTreeMap<String, ActionDescriptor>,
}

impl VersionSchema {
    pub fn version(&self) -> &str {
        self.attributes.get("version").map(String::as_str).unwrap_or_default()
    }

    /// The `service` info entry, if the schema declares one.
    pub fn service_name(&self) -> Option<&str> {
        self.info.get("service").map(String::as_str)
    }

    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.get(name)
    }

    /// Info entries as `(key, value)` pairs sorted by key.
    pub fn info_pairs(&self) -> Vec<(String, String)> {
        self.info
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// One `action` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    /// Attributes of the `action` element (`name`, `function`, ...).
    #[serde(flatten)]
    pub attributes: Attributes,

    /// Type code from the action's `return` element.
    #[serde(rename = "return")]
    pub return_type: String,

    /// Declared exceptions keyed by code.
    pub exceptions: BTreeMap<String, ExceptionDescriptor>,

    /// Declared arguments keyed by name.
    pub args: BTreeMap<String, ArgumentDescriptor>,
}

impl ActionDescriptor {
    pub fn name(&self) -> &str {
        self.attributes.get("name").map(String::as_str).unwrap_or_default()
    }

    /// Name of the function implementing the action.
    pub fn function(&self) -> Option<&str> {
        self.attributes.get("function").map(String::as_str)
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.args.get(name)
    }
}

/// Attributes of an `exception` element (at least `code`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExceptionDescriptor(pub Attributes);

impl ExceptionDescriptor {
    pub fn code(&self) -> &str {
        self.0.get("code").map(String::as_str).unwrap_or_default()
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").map(String::as_str)
    }
}

/// Attributes of an `argument` element (at least `name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgumentDescriptor(pub Attributes);

impl ArgumentDescriptor {
    pub fn name(&self) -> &str {
        self.0.get("name").map(String::as_str).unwrap_or_default()
    }

    /// Declared type code, kept as written in the document.
    pub fn type_code(&self) -> Option<&str> {
        self.0.get("type").map(String::as_str)
    }
}
