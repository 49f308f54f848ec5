//! Service directory watcher for registry reload.

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;
use crate::registry::node::{RegistryError, ServiceRegistry};

/// Registry snapshot shared with request handlers.
pub type SharedRegistry = Arc<ArcSwap<ServiceRegistry>>;

/// Rebuilds the shared registry when its service directory changes.
#[derive(Clone)]
pub struct RegistryWatcher {
    registry: SharedRegistry,
}

impl RegistryWatcher {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Rebuild and swap the registry if the directory changed.
    ///
    /// Returns whether a new snapshot was installed. On error the current
    /// snapshot stays in place.
    pub fn reload(&self) -> Result<bool, RegistryError> {
        let current = self.registry.load_full();
        if !current.is_stale() {
            return Ok(false);
        }

        let fresh = ServiceRegistry::load(current.service_dir(), current.options())?;
        self.registry.store(Arc::new(fresh));
        Ok(true)
    }

    /// [`reload`](Self::reload), with the outcome logged and counted.
    pub fn reload_logged(&self) {
        match self.reload() {
            Ok(true) => {
                metrics::record_reload("success");
                tracing::info!(services = self.registry.load().len(), "Service registry reloaded");
            }
            Ok(false) => tracing::debug!("Service registry unchanged"),
            Err(e) => {
                metrics::record_reload("failure");
                tracing::error!("Failed to reload service registry: {}. Keeping current schemas.", e);
            }
        }
    }

    /// Start watching the service directory in a background thread.
    ///
    /// The returned watcher must be kept alive for events to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self.registry.load().service_dir().to_path_buf();
        let this = self.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::debug!(paths = ?event.paths, "Service directory change detected");
                        this.reload_logged();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?dir, "Service directory watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParseOptions;
    use std::fs;

    const DOC: &str = r#"<x xmlns:xhttp="http://www.xhttp.org/schema"><xhttp:schema version="1.0"/></x>"#;

    #[test]
    fn test_reload_swaps_only_when_stale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alpha.xml"), DOC).unwrap();

        let registry = ServiceRegistry::load(dir.path(), ParseOptions::default()).unwrap();
        let shared: SharedRegistry = Arc::new(ArcSwap::from_pointee(registry));
        let watcher = RegistryWatcher::new(shared.clone());

        assert!(!watcher.reload().unwrap());

        fs::write(dir.path().join("beta.xml"), DOC).unwrap();
        assert!(watcher.reload().unwrap());
        assert_eq!(shared.load().len(), 2);
        assert!(shared.load().lookup_service("beta").is_ok());
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alpha.xml"), DOC).unwrap();

        let registry = ServiceRegistry::load(dir.path(), ParseOptions::default()).unwrap();
        let shared: SharedRegistry = Arc::new(ArcSwap::from_pointee(registry));
        let watcher = RegistryWatcher::new(shared.clone());

        fs::write(dir.path().join("broken.xml"), "<xhttp>").unwrap();
        assert!(watcher.reload().is_err());
        assert_eq!(shared.load().service_names().collect::<Vec<_>>(), vec!["alpha"]);
    }
}
