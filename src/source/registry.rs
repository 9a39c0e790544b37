//! Issue Source Registry
//!
//! Maps registry names (`php-errors`, `db-no-limit`, ...) to category
//! implementations, so checks can be configured by name and new categories
//! can be plugged in without touching the pipeline.

use super::{IssueSource, SourceKind};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SourceRegistry {
    /// Map of registry name -> category
    sources: HashMap<String, Arc<dyn IssueSource>>,
    /// Registration order, used when listing categories
    order: Vec<String>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry with every built-in category under its [`SourceKind`] name.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in SourceKind::ALL {
            registry.register_arc(kind.as_str(), kind.build());
        }
        registry
    }

    /// Register a category. A second registration under the same name
    /// replaces the first.
    pub fn register<S: IssueSource + 'static>(&mut self, name: &str, source: S) {
        self.register_arc(name, Arc::new(source));
    }

    pub fn register_arc(&mut self, name: &str, source: Arc<dyn IssueSource>) {
        let label = source.label();

        if self.sources.insert(name.to_string(), source).is_none() {
            self.order.push(name.to_string());
        }

        tracing::debug!(source = name, label = label, "Registered issue source");
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn IssueSource>> {
        self.sources.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.order)
            .finish()
    }
}
