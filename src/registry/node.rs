//! Service registry: every schema document of a service directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::error::{ErrorKind, XhttpError, XhttpResult};
use crate::protocol::SCHEMA_VERSION;
use crate::schema::{parse_document, ActionDescriptor, ParseOptions, SchemaDocument, SchemaParseError, VersionSchema};

/// Errors raised while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Cannot read service directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] SchemaParseError),
}

/// Parsed schemas of all services, keyed by service name.
///
/// Immutable once built; a reload builds a new registry.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    service_dir: PathBuf,
    options: ParseOptions,
    services: BTreeMap<String, SchemaDocument>,
}

impl ServiceRegistry {
    /// Parse every `*.xml` document in `service_dir`.
    ///
    /// Fails on the first document that does not parse.
    pub fn load(service_dir: &Path, options: ParseOptions) -> Result<Self, RegistryError> {
        let entries = scan_service_dir(service_dir).map_err(|source| RegistryError::Directory {
            path: service_dir.to_path_buf(),
            source,
        })?;

        let mut services = BTreeMap::new();
        for (name, path) in entries {
            tracing::debug!(service = %name, "Parsing schema for service");
            let document = parse_document(&path, options)?;
            services.insert(name, document);
        }

        tracing::info!(
            service_dir = %service_dir.display(),
            services = services.len(),
            "Service registry loaded"
        );

        Ok(Self {
            service_dir: service_dir.to_path_buf(),
            options,
            services,
        })
    }

    pub fn service_dir(&self) -> &Path {
        &self.service_dir
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn documents(&self) -> &BTreeMap<String, SchemaDocument> {
        &self.services
    }

    /// All versions of a service.
    pub fn lookup_service(&self, name: &str) -> XhttpResult<&SchemaDocument> {
        self.services
            .get(name)
            .ok_or_else(|| XhttpError::new(ErrorKind::ServiceNotFound))
    }

    /// Accept only the protocol version this node speaks.
    pub fn validate_version<'r>(&self, requested: &'r str) -> XhttpResult<&'r str> {
        tracing::debug!(version = %requested, "Validating X-Version");
        if requested == SCHEMA_VERSION {
            Ok(requested)
        } else {
            Err(XhttpError::version_not_supported(SCHEMA_VERSION))
        }
    }

    /// Schema of one service version.
    pub fn schema(&self, service: &str, version: &str) -> XhttpResult<&VersionSchema> {
        self.lookup_service(service)?
            .version(version)
            .ok_or_else(|| XhttpError::version_not_supported(SCHEMA_VERSION))
    }

    /// An action of one service version.
    pub fn action(&self, service: &str, version: &str, action: &str) -> XhttpResult<&ActionDescriptor> {
        self.schema(service, version)?
            .action(action)
            .ok_or_else(|| XhttpError::new(ErrorKind::ActionNotFound))
    }

    /// Versions of a service, sorted, reserved keys excluded.
    pub fn list_versions(&self, service: &str) -> XhttpResult<Vec<String>> {
        Ok(self.lookup_service(service)?.version_names())
    }

    /// Info pairs of a service version, sorted by key.
    pub fn get_info(&self, service: &str, version: &str) -> XhttpResult<Vec<(String, String)>> {
        Ok(self.schema(service, version)?.info_pairs())
    }

    /// Whether the directory no longer matches what was parsed: a document
    /// was added, removed or modified since.
    pub fn is_stale(&self) -> bool {
        let entries = match scan_service_dir(&self.service_dir) {
            Ok(entries) => entries,
            Err(_) => return true,
        };

        if entries.len() != self.services.len() {
            return true;
        }

        entries.iter().any(|(name, path)| match self.services.get(name) {
            None => true,
            Some(doc) => fs::metadata(path)
                .and_then(|m| m.modified())
                .map(|mtime| mtime != doc.meta.mtime)
                .unwrap_or(true),
        })
    }
}

/// Schema documents of a directory as `(service name, path)`, sorted by
/// name. Only regular `*.xml` files count; dot-files are skipped.
pub fn scan_service_dir(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().and_then(|e| e.to_str()) != Some("xml") || !path.is_file() {
            continue;
        }

        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) if !name.is_empty() && !name.starts_with('.') => name.to_string(),
            _ => continue,
        };

        entries.push((name, path));
    }

    entries.sort();
    Ok(entries)
}
