//! `import` resolution against the capability registry.
//!
//! A module namespace is an ordinary object whose properties are host
//! functions. Namespaces are built on first import and cached for the
//! lifetime of the interpreter, so importing twice yields the identical
//! object.

use crate::capability::CapabilityRegistry;
use crate::errors::{unknown_module, EvalError};
use crate::shared::SharedRegistry;
use crate::value::{ObjectMap, Value};
use rustc_hash::FxHashMap;

pub struct ModuleLoader {
    registry: SharedRegistry<CapabilityRegistry>,
    cache: FxHashMap<&'static str, Value>,
}

impl ModuleLoader {
    pub fn new(registry: SharedRegistry<CapabilityRegistry>) -> Self {
        ModuleLoader {
            registry,
            cache: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &SharedRegistry<CapabilityRegistry> {
        &self.registry
    }

    /// Namespace object for `module`, building it on first use.
    ///
    /// Loading never runs host code, so it is not capability gated; each
    /// member is checked when called.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load(&mut self, module: &str) -> Result<Value, EvalError> {
        let Some(def) = self.registry.module(module) else {
            return Err(unknown_module(module));
        };
        if let Some(namespace) = self.cache.get(def.name()) {
            tracing::trace!("module cache hit");
            return Ok(namespace.clone());
        }
        let members: ObjectMap = def
            .members()
            .iter()
            .map(|&descriptor| (descriptor.name.to_string(), Value::native(descriptor)))
            .collect();
        let namespace = Value::object(members);
        self.cache.insert(def.name(), namespace.clone());
        Ok(namespace)
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.cache.contains_key(module)
    }

    /// Drop every cached namespace.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut loaded: Vec<_> = self.cache.keys().collect();
        loaded.sort_unstable();
        f.debug_struct("ModuleLoader")
            .field("loaded", &loaded)
            .finish_non_exhaustive()
    }
}
