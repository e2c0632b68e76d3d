//! Name-keyed plugin registry

use super::{FtpWeakPassPlugin, HttpSecurityPlugin, Plugin};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL_REGISTRY: Lazy<PluginRegistry> = Lazy::new(PluginRegistry::with_builtin);

/// Process-wide registry holding the built-in plugins.
///
/// Populated on first access and never mutated afterwards, so lookups from
/// concurrent scans need no locking.
pub fn global() -> &'static PluginRegistry {
    &GLOBAL_REGISTRY
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `ftp-weakpass` and `http-security`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FtpWeakPassPlugin::new()));
        registry.register(Arc::new(HttpSecurityPlugin::new()));
        registry
    }

    /// Store `plugin` under its name. A later registration with the same name replaces it.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        log::info!("Registered plugin {}: {}", name, plugin.description());
        if self.plugins.insert(name.clone(), plugin).is_some() {
            log::debug!("Plugin {} replaced an earlier registration", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).cloned()
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }

    /// First plugin (by name) that claims `service`
    pub fn plugin_for_service(&self, service: &str) -> Option<Arc<dyn Plugin>> {
        self.list()
            .into_iter()
            .filter_map(|name| self.get(&name))
            .find(|plugin| plugin.services().contains(&service))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
