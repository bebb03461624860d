//! Global variant registry for looking up interpreters by name or alias.

use std::sync::RwLock;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::{Variant, interpreters};
use crate::error::{ConfigError, Result};

/// Global variant registry.
static REGISTRY: Lazy<RwLock<VariantRegistry>> = Lazy::new(|| {
    let mut registry = VariantRegistry::new();
    registry.register_builtin_variants();
    RwLock::new(registry)
});

/// Registry for variant definitions.
#[derive(Debug, Default)]
pub struct VariantRegistry {
    variants: IndexMap<String, Variant>,
}

impl VariantRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            variants: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<VariantRegistry> {
        &REGISTRY
    }

    /// Look up a variant in the global registry and clone it.
    pub fn resolve(name: &str) -> Result<Variant> {
        let registry = REGISTRY.read().map_err(|_| ConfigError::InvalidConfig {
            message: "variant registry lock poisoned".to_string(),
        })?;
        registry.get(name).cloned().ok_or_else(|| {
            ConfigError::UnknownVariant {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn register_builtin_variants(&mut self) {
        for variant in interpreters::builtin() {
            self.variants.insert(variant.name.clone(), variant);
        }
    }

    /// Register a variant definition.
    ///
    /// Fails if the name or any alias is already taken.
    pub fn register(&mut self, variant: Variant) -> Result<()> {
        variant.validate()?;
        let taken = std::iter::once(&variant.name)
            .chain(&variant.aliases)
            .find(|name| self.get(name).is_some());
        if let Some(name) = taken {
            return Err(ConfigError::AlreadyRegistered { name: name.clone() }.into());
        }
        self.variants.insert(variant.name.clone(), variant);
        Ok(())
    }

    /// Get a variant by name or alias.
    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.variants
            .get(name)
            .or_else(|| self.variants.values().find(|v| v.answers_to(name)))
    }

    /// Check if a name or alias is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// List all registered variant names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.variants.keys()
    }

    /// Find the first variant accepting files with `extension` (e.g. ".py").
    pub fn for_extension(&self, extension: &str) -> Option<&Variant> {
        self.variants
            .values()
            .find(|v| v.input_extensions.iter().any(|e| e == extension))
    }
}
