//! Capability registry and policy.
//!
//! Every host function is described by a static [`NativeDescriptor`] that
//! names its module, arity and the [`Capability`] set it requires. A call
//! into host code first asks the [`CapabilityPolicy`] whether those
//! capabilities are granted; a denial raises `CapabilityError` and the
//! handler never runs.

mod native;
mod registry;
mod state;

pub use native::{Arity, HostContext, NativeCall, NativeDescriptor, NativeFunction, NativeHandler};
pub use registry::{CapabilityRegistry, ModuleDef, RegistryBuilder};
pub use state::NativeState;

use crate::errors::{capability_denied, EvalError};
use bitflags::bitflags;

bitflags! {
    /// Permissions a host function may require.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct Capability: u16 {
        /// String manipulation.
        const STRING = 1 << 0;
        /// Array helpers.
        const ARRAY = 1 << 1;
        /// Map/set style helpers over objects and arrays.
        const COLLECTIONS = 1 << 2;
        /// Higher-order helpers that call back into script code.
        const FUNCTIONAL = 1 << 3;
        /// Regular-expression compilation and matching.
        const REGEX = 1 << 4;
        /// Reading the wall clock and date arithmetic.
        const CLOCK = 1 << 5;
        /// Injection and pattern security screens.
        const SECURITY = 1 << 6;
        /// Writing to the print handler.
        const PRINT = 1 << 7;
    }
}

impl Capability {
    /// Parse one lowercase capability name (`"regex"`).
    pub fn parse_name(name: &str) -> Option<Self> {
        Self::from_name(&name.trim().to_ascii_uppercase())
    }

    /// Parse a comma-separated list; `all` and `none` are accepted.
    ///
    /// Returns the first unknown name on failure.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        let list = list.trim();
        match list {
            "all" => return Ok(Self::all()),
            "" | "none" => return Ok(Self::empty()),
            _ => {}
        }
        list.split(',')
            .filter(|part| !part.trim().is_empty())
            .try_fold(Self::empty(), |acc, part| {
                Self::parse_name(part)
                    .map(|cap| acc | cap)
                    .ok_or_else(|| part.trim().to_string())
            })
    }

    /// Lowercase names of the set flags, in declaration order.
    pub fn names(self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }

    /// Comma-joined lowercase names.
    pub fn describe(self) -> String {
        self.names().join(", ")
    }
}

/// Which capabilities the running program may use.
///
/// Fail-closed: the default policy grants nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityPolicy {
    granted: Capability,
}

impl CapabilityPolicy {
    pub fn new(granted: Capability) -> Self {
        CapabilityPolicy { granted }
    }

    pub fn deny_all() -> Self {
        Self::new(Capability::empty())
    }

    pub fn allow_all() -> Self {
        Self::new(Capability::all())
    }

    #[inline]
    pub fn granted(&self) -> Capability {
        self.granted
    }

    pub fn grant(&mut self, capabilities: Capability) {
        self.granted |= capabilities;
    }

    pub fn revoke(&mut self, capabilities: Capability) {
        self.granted -= capabilities;
    }

    #[must_use]
    pub fn with(mut self, capabilities: Capability) -> Self {
        self.grant(capabilities);
        self
    }

    #[must_use]
    pub fn without(mut self, capabilities: Capability) -> Self {
        self.revoke(capabilities);
        self
    }

    #[inline]
    pub fn allows(&self, required: Capability) -> bool {
        self.granted.contains(required)
    }

    /// Gate a host call.
    pub fn check(&self, descriptor: &NativeDescriptor) -> Result<(), EvalError> {
        let missing = descriptor.capabilities.difference(self.granted);
        if missing.is_empty() {
            return Ok(());
        }
        let capability = missing.describe();
        tracing::warn!(
            module = descriptor.module,
            function = descriptor.name,
            capability = %capability,
            "capability denied"
        );
        Err(capability_denied(
            descriptor.module,
            descriptor.name,
            &capability,
        ))
    }
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self::deny_all()
    }
}
