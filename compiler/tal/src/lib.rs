//! Tal - embeddable runtime for a small dynamically-typed scripting
//! language.
//!
//! Programs arrive as a `tal_ir::Program` (lexing and parsing happen
//! upstream) and run on a fresh interpreter with the standard library
//! registered and a capability policy applied:
//!
//! ```ignore
//! let runtime = Runtime::new(RuntimeConfig::builder().capabilities(Capability::STRING).build());
//! let mut b = AstBuilder::new(runtime.interner());
//! // ... build statements ...
//! let execution = runtime.run(&b.finish(body))?;
//! println!("{}", execution.output);
//! ```
//!
//! Set `RUST_LOG=tal_eval=debug` (after [`init_tracing`]) to trace imports,
//! host dispatch and capability denials.

mod config;
mod runtime;

pub use config::{ConfigError, OutputMode, RuntimeConfig, RuntimeConfigBuilder};
pub use runtime::{Execution, Runtime, RuntimeError, UncaughtException};

pub use tal_eval::{Capability, CapabilityPolicy, Uncaught, Value};
pub use tal_ir::{AstBuilder, BinaryOp, Program, SharedInterner, UnaryOp};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // Another subscriber may already be installed by the embedder.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
