//! Tal Eval - tree-walking evaluator for the Tal scripting runtime.
//!
//! # Architecture
//!
//! - `Value`: closed tagged union; arrays, objects and scopes are shared
//!   `Rc<RefCell<_>>` nodes
//! - `Environment`: lexical scope chain; closures capture a scope node
//! - `Interpreter`: walks a `tal_ir::Program`, with `return`/`break`/
//!   `continue`/throws/faults unwinding as `ControlAction`
//! - `CapabilityRegistry`: host modules and globals described by static
//!   `NativeDescriptor`s; every host call passes `CapabilityPolicy::check`
//! - `ModuleLoader`: `import` builds (and caches) namespace objects
//! - `CallStack`: recursion limit and backtraces
//!
//! Host modules live in `tal_stdlib`; this crate only defines the seams
//! they plug into.

mod capability;
mod diagnostics;
mod environment;
pub mod errors;
pub mod interpreter;
mod module_loader;
mod operators;
mod print_handler;
mod shared;
mod stack;
mod value;

pub use capability::{
    Arity, Capability, CapabilityPolicy, CapabilityRegistry, HostContext, ModuleDef, NativeCall,
    NativeDescriptor, NativeFunction, NativeHandler, NativeState, RegistryBuilder,
};
pub use diagnostics::{CallFrame, CallStack, ANONYMOUS, MAX_BACKTRACE_FRAMES};
pub use environment::{Environment, Scope, ScopeKind};
pub use errors::{
    // Access
    cannot_index, index_out_of_bounds, no_such_property, null_reference, unbound_name,
    // Operators
    invalid_binary_op, invalid_unary_op,
    // Calls
    no_such_method, not_callable, recursion_limit_exceeded, wrong_arg_count, wrong_arg_type,
    // Control flow
    control_outside_loop, invalid_assignment_target, not_iterable,
    // Capabilities and modules
    capability_denied, unknown_module,
    // Host input
    invalid_value,
    BacktraceFrame, ControlAction, EvalBacktrace, EvalError, EvalErrorKind, EvalResult, ExecResult,
};
pub use interpreter::builder::DEFAULT_MAX_CALL_DEPTH;
pub use interpreter::{Interpreter, InterpreterBuilder, ScopedInterpreter};
pub use module_loader::ModuleLoader;
pub use operators::{evaluate_binary, evaluate_unary};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use shared::SharedRegistry;
pub use stack::ensure_sufficient_stack;
pub use value::{
    causal_chain, format_number, ArrayRef, ChainLink, ExceptionRecord, FunctionValue, Heap,
    ObjectMap, ObjectRef, Reclaim, Shared, Uncaught, Value, MAX_CHAIN_DEPTH, MAX_DISPLAY_DEPTH,
};
