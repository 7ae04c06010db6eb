//! Registry of motion stack backends.
//!
//! Provides a `StackRegistry` for registering and retrieving stack
//! factories by name. Built at startup and passed by value.

use gantry_common::stack::{MotionStack, StackFactory};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No stack registered under the requested name.
    #[error("Motion stack not found: {0}")]
    StackNotFound(String),

    /// A stack with this name is already registered.
    #[error("Motion stack already registered: {0}")]
    AlreadyRegistered(String),
}

/// Registry of available motion stacks.
pub struct StackRegistry {
    factories: HashMap<&'static str, StackFactory>,
}

impl StackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in stack.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_stacks(&mut registry);
        registry
    }

    /// Register a stack factory.
    ///
    /// # Panics
    /// Panics if a stack with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: StackFactory) {
        if let Err(e) = self.try_register(name, factory) {
            panic!("{e}");
        }
    }

    /// Register a stack factory, failing on duplicates.
    pub fn try_register(
        &mut self,
        name: &'static str,
        factory: StackFactory,
    ) -> Result<(), RegistryError> {
        if self.factories.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Get a stack factory by name.
    pub fn get_factory(&self, name: &str) -> Option<StackFactory> {
        self.factories.get(name).copied()
    }

    /// Create a stack instance by name.
    ///
    /// # Errors
    /// Returns `RegistryError::StackNotFound` if no stack with the given name is registered.
    pub fn create_stack(&self, name: &str) -> Result<Box<dyn MotionStack>, RegistryError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| RegistryError::StackNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered stack names, sorted.
    pub fn list_stacks(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for StackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
