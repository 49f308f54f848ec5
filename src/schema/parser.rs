//! XHTTP schema document parsing.
//!
//! # Responsibilities
//! - Read one `<service>.xml` document
//! - Collect every `xhttp:schema` element, keyed by its `version`
//! - Build info, action, exception and argument maps for each schema
//! - Attach the `__meta__` record (absolute path, mtime)
//!
//! # Design Decisions
//! - `schema` elements may sit anywhere in the document
//! - Everything below a `schema` is looked up among direct children unless
//!   [`ChildScope::Subtree`] is requested
//! - Later duplicates overwrite earlier ones (versions, actions, codes, names)
//! - A `<!DOCTYPE>` with internal entities is accepted
//! - An attribute named like a structured field (`info`, `return`, ...) is
//!   dropped; the field wins

use roxmltree::{Attribute, Document, Node, ParsingOptions};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::model::{
    ActionDescriptor, ArgumentDescriptor, Attributes, ExceptionDescriptor, SchemaDocument,
    SchemaMeta, VersionSchema, ACTION_FIELDS, META_KEY, SCHEMA_FIELDS,
};

/// Namespace every schema element lives in.
pub const XHTTP_NAMESPACE: &str = "http://www.xhttp.org/schema";

/// Where nested elements are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildScope {
    /// Only direct children of the parent element.
    #[default]
    Direct,
    /// The whole subtree below the parent element.
    Subtree,
}

/// Parser options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub scope: ChildScope,
}

impl ParseOptions {
    pub fn new(scope: ChildScope) -> Self {
        Self { scope }
    }
}

/// Cause of a schema parse failure.
#[derive(Debug, Error)]
pub enum SchemaErrorKind {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("missing element '{child}' in element '{parent}'")]
    MissingElement {
        parent: &'static str,
        child: &'static str,
    },

    #[error("schema version '{0}' is reserved")]
    ReservedVersion(String),
}

/// A document could not be turned into a [`SchemaDocument`].
#[derive(Debug, Error)]
#[error("Unable to parse XHTTP schema file {}\n[error] {}", .path.display(), .kind)]
pub struct SchemaParseError {
    /// Document that failed.
    pub path: PathBuf,
    /// What went wrong.
    #[source]
    pub kind: SchemaErrorKind,
}

/// Parse a schema document from disk.
pub fn parse_document(path: &Path, options: ParseOptions) -> Result<SchemaDocument, SchemaParseError> {
    let fail = |path: &Path, kind: SchemaErrorKind| SchemaParseError {
        path: path.to_path_buf(),
        kind,
    };

    let file = fs::canonicalize(path).map_err(|e| fail(path, e.into()))?;
    let text = fs::read_to_string(&file).map_err(|e| fail(&file, e.into()))?;
    let mtime = fs::metadata(&file)
        .and_then(|m| m.modified())
        .map_err(|e| fail(&file, e.into()))?;

    let versions = parse_str(&text, options).map_err(|kind| fail(&file, kind))?;

    tracing::debug!(
        file = %file.display(),
        versions = versions.len(),
        "Parsed schema document"
    );

    Ok(SchemaDocument {
        versions,
        meta: SchemaMeta { file, mtime },
    })
}

/// Parse schema document text.
pub fn parse_str(
    text: &str,
    options: ParseOptions,
) -> Result<BTreeMap<String, VersionSchema>, SchemaErrorKind> {
    let xml_options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, xml_options)?;
    parse_tree(&doc, options)
}

/// Collect every `schema` element of a parsed document.
pub fn parse_tree(
    doc: &Document<'_>,
    options: ParseOptions,
) -> Result<BTreeMap<String, VersionSchema>, SchemaErrorKind> {
    let mut schemas = BTreeMap::new();

    for element in doc.descendants().filter(|n| is_xhttp(n, "schema")) {
        let version = required(element, "schema", "version")?;
        if version == META_KEY {
            return Err(SchemaErrorKind::ReservedVersion(version.to_string()));
        }
        schemas.insert(version.to_string(), parse_schema_element(element, options)?);
    }

    Ok(schemas)
}

/// Parse one `schema` element.
pub fn parse_schema_element(
    element: Node<'_, '_>,
    options: ParseOptions,
) -> Result<VersionSchema, SchemaErrorKind> {
    let mut schema = VersionSchema {
        attributes: copy_attributes_except(element, SCHEMA_FIELDS),
        ..Default::default()
    };

    for info in find_all(element, "info", options.scope) {
        let name = required(info, "info", "name")?;
        let value = required(info, "info", "value")?;
        schema.info.insert(name.to_string(), value.to_string());
    }

    for action in find_all(element, "action", options.scope) {
        let name = required(action, "action", "name")?;
        schema
            .actions
            .insert(name.to_string(), parse_action_element(action, options)?);
    }

    Ok(schema)
}

/// Parse one `action` element.
pub fn parse_action_element(
    element: Node<'_, '_>,
    options: ParseOptions,
) -> Result<ActionDescriptor, SchemaErrorKind> {
    let return_element = find_all(element, "return", options.scope)
        .into_iter()
        .next()
        .ok_or(SchemaErrorKind::MissingElement {
            parent: "action",
            child: "return",
        })?;

    let mut action = ActionDescriptor {
        attributes: copy_attributes_except(element, ACTION_FIELDS),
        return_type: required(return_element, "return", "type")?.to_string(),
        ..Default::default()
    };

    for exception in find_all(element, "exception", options.scope) {
        let code = required(exception, "exception", "code")?;
        action
            .exceptions
            .insert(code.to_string(), ExceptionDescriptor(copy_attributes(exception)));
    }

    for argument in find_all(element, "argument", options.scope) {
        let name = required(argument, "argument", "name")?;
        action
            .args
            .insert(name.to_string(), ArgumentDescriptor(copy_attributes(argument)));
    }

    Ok(action)
}

fn is_xhttp(node: &Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && node.has_tag_name((XHTTP_NAMESPACE, tag))
}

fn find_all<'a, 'input>(node: Node<'a, 'input>, tag: &str, scope: ChildScope) -> Vec<Node<'a, 'input>> {
    match scope {
        ChildScope::Direct => node.children().filter(|n| is_xhttp(n, tag)).collect(),
        // descendants() starts with the node itself
        ChildScope::Subtree => node.descendants().skip(1).filter(|n| is_xhttp(n, tag)).collect(),
    }
}

fn required<'a>(
    node: Node<'a, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, SchemaErrorKind> {
    node.attribute(attribute)
        .ok_or(SchemaErrorKind::MissingAttribute { element, attribute })
}

fn copy_attributes(node: Node<'_, '_>) -> Attributes {
    copy_attributes_except(node, &[])
}

fn copy_attributes_except(node: Node<'_, '_>, fields: &[&str]) -> Attributes {
    node.attributes()
        .map(|attr| (attribute_key(&attr), attr.value().to_string()))
        .filter(|(key, _)| {
            let shadowed = fields.contains(&key.as_str());
            if shadowed {
                tracing::debug!(attribute = %key, "Dropping attribute shadowed by element field");
            }
            !shadowed
        })
        .collect()
}

/// Namespaced attributes keep their namespace in `{ns}name` form.
fn attribute_key(attr: &Attribute<'_, '_>) -> String {
    match attr.namespace() {
        Some(ns) => format!("{{{}}}{}", ns, attr.name()),
        None => attr.name().to_string(),
    }
}
