//! Registry of host modules and prelude globals.
//!
//! Built once through [`RegistryBuilder`], then shared read-only between
//! interpreters as a [`SharedRegistry`].

use super::{Capability, NativeDescriptor};
use crate::shared::SharedRegistry;
use rustc_hash::FxHashMap;

/// One importable host module.
#[derive(Debug)]
pub struct ModuleDef {
    name: &'static str,
    members: Vec<&'static NativeDescriptor>,
}

impl ModuleDef {
    pub fn new(name: &'static str, members: &[&'static NativeDescriptor]) -> Self {
        ModuleDef {
            name,
            members: members.to_vec(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exported functions, in registration order.
    pub fn members(&self) -> &[&'static NativeDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&'static NativeDescriptor> {
        self.members.iter().copied().find(|d| d.name == name)
    }

    /// Union of every capability this module's members require.
    pub fn capabilities(&self) -> Capability {
        self.members
            .iter()
            .fold(Capability::empty(), |acc, d| acc | d.capabilities)
    }
}

/// Lookup tables for host modules and globals.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    modules: FxHashMap<&'static str, ModuleDef>,
    globals: Vec<&'static NativeDescriptor>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry with no modules and no globals.
    pub fn empty() -> SharedRegistry<Self> {
        SharedRegistry::new(Self::default())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.get(name)
    }

    /// Resolve `module.function`.
    pub fn lookup(&self, module: &str, function: &str) -> Option<&'static NativeDescriptor> {
        self.module(module)?.member(function)
    }

    /// Functions bound in the global scope of every program.
    pub fn globals(&self) -> &[&'static NativeDescriptor] {
        &self.globals
    }

    /// Registered module names, sorted.
    pub fn module_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.modules.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Accumulates modules and globals before freezing them.
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
}

impl RegistryBuilder {
    /// Register a module. A later registration with the same name wins.
    #[must_use]
    pub fn module(mut self, module: ModuleDef) -> Self {
        tracing::trace!(module = module.name, members = module.members.len(), "register module");
        self.registry.modules.insert(module.name, module);
        self
    }

    #[must_use]
    pub fn global(mut self, descriptor: &'static NativeDescriptor) -> Self {
        self.registry.globals.push(descriptor);
        self
    }

    #[must_use]
    pub fn globals(mut self, descriptors: &[&'static NativeDescriptor]) -> Self {
        self.registry.globals.extend_from_slice(descriptors);
        self
    }

    pub fn build(self) -> SharedRegistry<CapabilityRegistry> {
        SharedRegistry::new(self.registry)
    }
}
