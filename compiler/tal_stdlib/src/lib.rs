//! Tal standard library: the host modules scripts `import`, plus the
//! prelude globals every program sees.
//!
//! | Module        | Capabilities           |
//! |---------------|------------------------|
//! | `string`      | `STRING` (+`SECURITY`) |
//! | `array`       | `ARRAY`                |
//! | `collections` | `COLLECTIONS`          |
//! | `functional`  | `FUNCTIONAL`           |
//! | `regex`       | `REGEX` (+`SECURITY`)  |
//! | `datetime`    | `CLOCK`                |
//!
//! Every function is a static `NativeDescriptor`; the evaluator checks its
//! capabilities before the handler runs. Host functions never see the
//! caller's scope. Pattern and timestamp objects are plain objects whose
//! methods are natives bound to shared native state.

/// Declare a block of native descriptors for one module.
macro_rules! natives {
    (
        module = $module:literal;
        $( $(#[$meta:meta])* $static_name:ident = $name:literal, $arity:expr, $caps:expr => $handler:path; )*
    ) => {
        $(
            $(#[$meta])*
            pub(crate) static $static_name: tal_eval::NativeDescriptor =
                tal_eval::NativeDescriptor::new($module, $name, $arity, $caps, $handler);
        )*
    };
}

mod arrays;
mod callbacks;
mod collections;
mod datetime;
mod functional;
mod patterns;
mod prelude;
mod security;
mod strings;

pub use security::{
    contains_sql_injection_patterns, contains_xss_patterns, escape_html, is_catastrophic_pattern,
};

use tal_eval::{CapabilityRegistry, SharedRegistry};

/// Names of the importable modules.
pub const MODULE_NAMES: [&str; 6] = [
    "array",
    "collections",
    "datetime",
    "functional",
    "regex",
    "string",
];

/// Registry with every standard module and the prelude.
pub fn standard_registry() -> SharedRegistry<CapabilityRegistry> {
    CapabilityRegistry::builder()
        .module(strings::module())
        .module(arrays::module())
        .module(collections::module())
        .module(functional::module())
        .module(patterns::module())
        .module(datetime::module())
        .globals(prelude::GLOBALS)
        .build()
}

#[cfg(test)]
mod test_helpers;
