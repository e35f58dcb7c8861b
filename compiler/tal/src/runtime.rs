//! Program execution with the standard library installed.

use crate::config::{ConfigError, OutputMode, RuntimeConfig};
use tal_eval::{
    buffer_handler, silent_handler, stdout_handler, CapabilityPolicy, CapabilityRegistry,
    InterpreterBuilder, SharedPrintHandler, SharedRegistry, Uncaught, Value,
};
use tal_ir::{Program, SharedInterner};
use thiserror::Error;

/// A completed run.
#[derive(Debug)]
pub struct Execution {
    /// Value of a top-level `return`, or null.
    pub value: Value,
    /// Captured `print` output; empty unless the output mode is `Capture`.
    pub output: String,
}

/// An exception that escaped the program, with the output printed before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct UncaughtException {
    pub error: Uncaught,
    pub output: String,
}

impl UncaughtException {
    /// Type tag of the outermost exception (`IndexError`, ...).
    pub fn kind(&self) -> &str {
        self.error.kind()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Uncaught(UncaughtException),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Runs programs against the standard library.
///
/// Programs must be built with [`Runtime::interner`]. Every run gets a
/// fresh interpreter, so globals and the module cache do not leak between
/// runs.
pub struct Runtime {
    config: RuntimeConfig,
    registry: SharedRegistry<CapabilityRegistry>,
    interner: SharedInterner,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Runtime {
            config,
            registry: tal_stdlib::standard_registry(),
            interner: SharedInterner::new(),
        }
    }

    /// A runtime configured from the `TAL_*` environment variables.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Ok(Self::new(RuntimeConfig::from_env()?))
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run `program` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Uncaught`] when an exception (thrown or a
    /// runtime fault) reaches the top level.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&self, program: &Program) -> Result<Execution, RuntimeError> {
        let output = self.print_handler();
        let mut interpreter = InterpreterBuilder::new()
            .interner(self.interner.clone())
            .registry(self.registry.clone())
            .policy(CapabilityPolicy::new(self.config.capabilities))
            .max_call_depth(self.config.max_call_depth)
            .print_handler(output.clone())
            .build();

        match interpreter.run(program) {
            Ok(value) => Ok(Execution {
                value,
                output: output.take_output(),
            }),
            Err(error) => {
                tracing::debug!(kind = error.kind(), "program raised an uncaught exception");
                Err(RuntimeError::Uncaught(UncaughtException {
                    error,
                    output: output.take_output(),
                }))
            }
        }
    }

    fn print_handler(&self) -> SharedPrintHandler {
        match self.config.output {
            OutputMode::Capture => buffer_handler(),
            OutputMode::Stdout => stdout_handler(),
            OutputMode::Silent => silent_handler(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
