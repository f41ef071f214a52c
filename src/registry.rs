//! Provider registry: maps a model-identifier prefix to an adapter factory.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::Provider;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::providers::OpenAiProvider;

/// Constructs an adapter for one backend from the shared configuration.
pub type ProviderFactory = Arc<dyn Fn(&Config) -> Result<Box<dyn Provider>> + Send + Sync>;

/// Lookup table from backend prefix to adapter factory.
///
/// Registration happens during startup; afterwards the table is read-only,
/// so concurrent `resolve` calls need no locking. Pure lookup, no business
/// logic.
#[derive(Clone, Default)]
pub struct Registry {
    table: HashMap<String, ProviderFactory>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in backend registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            OpenAiProvider::PREFIX,
            Arc::new(|config: &Config| {
                OpenAiProvider::from_config(config)
                    .map(|provider| Box::new(provider) as Box<dyn Provider>)
            }),
        );
        registry
    }

    /// Insert or overwrite the factory for `prefix`. Last write wins.
    pub fn register(&mut self, prefix: impl Into<String>, factory: ProviderFactory) {
        self.table.insert(prefix.into(), factory);
    }

    /// Split a model identifier on the first `/` and look up the prefix.
    ///
    /// An identifier without a separator is treated as a bare prefix.
    pub fn resolve(&self, model_id: &str) -> Result<&ProviderFactory> {
        let prefix = model_id.split_once('/').map_or(model_id, |(prefix, _)| prefix);
        self.table.get(prefix).ok_or_else(|| Error::UnknownProvider {
            prefix: prefix.to_string(),
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("prefixes", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_prefix() {
        let registry = Registry::with_defaults();
        assert!(registry.resolve("openai/gpt-4o-mini").is_ok());
    }

    #[test]
    fn unknown_prefix_is_named() {
        let registry = Registry::with_defaults();
        match registry.resolve("unknown/model") {
            Err(Error::UnknownProvider { prefix }) => assert_eq!(prefix, "unknown"),
            Err(other) => panic!("expected UnknownProvider, got {other:?}"),
            Ok(_) => panic!("expected UnknownProvider error, got factory"),
        }
    }

    #[test]
    fn identifier_without_separator_is_a_bare_prefix() {
        let registry = Registry::with_defaults();
        match registry.resolve("gpt-4o-mini") {
            Err(Error::UnknownProvider { prefix }) => assert_eq!(prefix, "gpt-4o-mini"),
            Err(other) => panic!("expected UnknownProvider, got {other:?}"),
            Ok(_) => panic!("expected UnknownProvider error, got factory"),
        }
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let mut registry = Registry::new();
        registry.register(
            "demo",
            Arc::new(|_: &Config| -> Result<Box<dyn Provider>> {
                Err(Error::Configuration("first".into()))
            }),
        );
        registry.register(
            "demo",
            Arc::new(|_: &Config| -> Result<Box<dyn Provider>> {
                Err(Error::Configuration("second".into()))
            }),
        );

        let factory = registry.resolve("demo/model").unwrap();
        match factory(&Config::new()) {
            Err(Error::Configuration(message)) => assert_eq!(message, "second"),
            Err(other) => panic!("expected Configuration, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got provider"),
        }
    }
}
