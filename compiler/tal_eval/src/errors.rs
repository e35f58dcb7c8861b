//! Runtime error taxonomy and evaluation outcomes.
//!
//! `EvalErrorKind` carries structured data for each fault category.
//! Factory functions (e.g., `not_callable()`) are the public API;
//! they populate both `kind` and `message`.
//!
//! Every fault travels through the same channel as a user `throw`
//! (`ControlAction::Error` next to `ControlAction::Throw`), so an
//! `except` block catches both.

use crate::value::Value;
use std::fmt;
use tal_ir::{BinaryOp, Span, UnaryOp};

/// Result of evaluating an expression.
pub type EvalResult = Result<Value, ControlAction>;

/// Result of executing a statement.
pub type ExecResult = Result<(), ControlAction>;

/// Non-normal evaluation outcome.
///
/// `Ok` is the normal path; everything that unwinds rides in `Err`.
#[derive(Clone, Debug)]
pub enum ControlAction {
    /// `return` unwinding to the enclosing call.
    Return(Value),
    Break,
    Continue,
    /// User `throw` with an arbitrary value.
    Throw(Value),
    /// Runtime fault raised by the evaluator or a host function.
    Error(EvalError),
}

impl ControlAction {
    /// Whether an `except` handler may catch this action.
    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Throw(_) | Self::Error(_))
    }

    /// The value an `except` binding sees, if this action is catchable.
    pub fn into_exception_value(self) -> Result<Value, ControlAction> {
        match self {
            Self::Throw(value) => Ok(value),
            Self::Error(err) => Ok(Value::exception(
                crate::value::ExceptionRecord::from_error(&err),
            )),
            other => Err(other),
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Error(err)
    }
}

// Structured error types

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Access
    UnboundName {
        name: String,
    },
    NullReference {
        property: String,
    },
    IndexOutOfBounds {
        index: i64,
        length: usize,
    },

    // Type/Operator
    InvalidBinaryOp {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },
    InvalidUnaryOp {
        op: UnaryOp,
        operand: &'static str,
    },
    NoSuchProperty {
        property: String,
        type_name: &'static str,
    },
    NoSuchMethod {
        method: String,
        type_name: &'static str,
    },
    InvalidIndex {
        receiver: &'static str,
        index: &'static str,
    },
    NotCallable {
        type_name: &'static str,
    },
    NotIterable {
        type_name: &'static str,
    },
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    // Function
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },
    StackOverflow {
        depth: usize,
    },
    ControlOutsideLoop {
        keyword: &'static str,
    },
    InvalidAssignmentTarget,

    // Capability and modules
    CapabilityDenied {
        module: String,
        function: String,
        capability: String,
    },
    UnknownModule {
        module: String,
    },

    /// Invalid input to a host function.
    InvalidValue {
        message: String,
    },

    /// Catch-all for errors without a structured kind.
    Custom {
        message: String,
    },
}

impl EvalErrorKind {
    /// Script-visible error type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::UnboundName { .. } => "UnboundNameError",
            Self::NullReference { .. } => "NullReferenceError",
            Self::IndexOutOfBounds { .. } => "IndexError",
            Self::InvalidBinaryOp { .. }
            | Self::InvalidUnaryOp { .. }
            | Self::NoSuchProperty { .. }
            | Self::NoSuchMethod { .. }
            | Self::InvalidIndex { .. }
            | Self::NotCallable { .. }
            | Self::NotIterable { .. }
            | Self::ArgumentType { .. } => "TypeError",
            Self::StackOverflow { .. } => "StackOverflowError",
            Self::CapabilityDenied { .. } => "CapabilityError",
            Self::UnknownModule { .. } => "ImportError",
            Self::InvalidValue { .. } => "ValueError",
            Self::ArityMismatch { .. }
            | Self::ControlOutsideLoop { .. }
            | Self::InvalidAssignmentTarget
            | Self::Custom { .. } => "RuntimeError",
        }
    }

    /// Severity reported on the exception record.
    pub fn severity(&self) -> &'static str {
        match self {
            Self::StackOverflow { .. } | Self::CapabilityDenied { .. } => "critical",
            _ => "error",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Access
            Self::UnboundName { name } => write!(f, "undefined variable: {name}"),
            Self::NullReference { property } => {
                write!(f, "cannot read property '{property}' of null")
            }
            Self::IndexOutOfBounds { index, length } => {
                write!(f, "index {index} out of bounds for length {length}")
            }

            // Type/Operator
            Self::InvalidBinaryOp { op, left, right } => write!(
                f,
                "operator `{}` cannot be applied to {left} and {right}",
                op.as_symbol()
            ),
            Self::InvalidUnaryOp { op, operand } => write!(
                f,
                "operator `{}` cannot be applied to {operand}",
                op.as_symbol()
            ),
            Self::NoSuchProperty {
                property,
                type_name,
            } => write!(f, "{type_name} has no property '{property}'"),
            Self::NoSuchMethod { method, type_name } => {
                write!(f, "no method '{method}' on type {type_name}")
            }
            Self::InvalidIndex { receiver, index } => {
                write!(f, "cannot index {receiver} with {index}")
            }
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::NotIterable { type_name } => write!(f, "cannot iterate over {type_name}"),
            Self::ArgumentType {
                function,
                position,
                expected,
                got,
            } => {
                let article = if expected.starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                write!(
                    f,
                    "{function} expects {article} {expected} as argument {}, got {got}",
                    position + 1
                )
            }

            // Function
            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let arg_word = if expected == "1" {
                    "argument"
                } else {
                    "arguments"
                };
                if name.is_empty() {
                    write!(f, "expected {expected} {arg_word}, got {got}")
                } else {
                    write!(f, "{name} expects {expected} {arg_word}, got {got}")
                }
            }
            Self::StackOverflow { depth } => {
                write!(f, "maximum recursion depth exceeded (limit: {depth})")
            }
            Self::ControlOutsideLoop { keyword } => write!(f, "'{keyword}' outside of a loop"),
            Self::InvalidAssignmentTarget => write!(f, "invalid assignment target"),

            // Capability and modules
            Self::CapabilityDenied {
                module,
                function,
                capability,
            } => {
                if module.is_empty() {
                    write!(f, "{function}")?;
                } else {
                    write!(f, "{module}.{function}")?;
                }
                write!(f, " requires capability '{capability}', which is not granted")
            }
            Self::UnknownModule { module } => write!(f, "no module named '{module}'"),

            Self::InvalidValue { message } | Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Function name (`<anonymous>` for unnamed closures).
    pub name: String,
    /// Source location of the call site.
    pub span: Option<Span>,
}

/// Immutable snapshot of the call stack at an error site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    /// Frames, most recent call first.
    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        write!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "\n  {i}: {}", frame.name)?;
            if let Some(span) = frame.span.filter(|s| !s.is_empty()) {
                write!(f, " at {span}")?;
            }
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message; equals `kind.to_string()` for
    /// factory-created errors.
    pub message: String,
    /// Source location where the error occurred.
    pub span: Option<Span>,
    /// Call stack at the error site.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Create an error with just a message (`RuntimeError`).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
        }
    }

    /// Script-visible error type tag.
    #[inline]
    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.type_tag(), self.message)
    }
}

impl std::error::Error for EvalError {}

// Access Errors

/// Name not bound in any enclosing scope.
#[cold]
pub fn unbound_name(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundName {
        name: name.to_string(),
    })
}

/// Property access on `null`.
#[cold]
pub fn null_reference(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NullReference {
        property: property.to_string(),
    })
}

/// Array or string index out of range.
#[cold]
pub fn index_out_of_bounds(index: i64, length: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, length })
}

/// Property read on a value that has no such property.
#[cold]
pub fn no_such_property(property: &str, type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoSuchProperty {
        property: property.to_string(),
        type_name,
    })
}

/// Cannot index `receiver` with `index`.
#[cold]
pub fn cannot_index(receiver: &'static str, index: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidIndex { receiver, index })
}

// Operator Errors

/// Binary operator applied to incompatible operands.
#[cold]
pub fn invalid_binary_op(op: BinaryOp, left: &'static str, right: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidBinaryOp { op, left, right })
}

/// Unary operator applied to an incompatible operand.
#[cold]
pub fn invalid_unary_op(op: UnaryOp, operand: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidUnaryOp { op, operand })
}

// Call Errors

/// Value is not callable.
#[cold]
pub fn not_callable(type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable { type_name })
}

/// Method not available on a built-in type.
#[cold]
pub fn no_such_method(method: &str, type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoSuchMethod {
        method: method.to_string(),
        type_name,
    })
}

/// Wrong number of arguments.
#[cold]
pub fn wrong_arg_count(name: &str, expected: impl ToString, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got,
    })
}

/// Argument of the wrong type passed to a function.
#[cold]
pub fn wrong_arg_type(
    function: &str,
    position: usize,
    expected: &'static str,
    got: &'static str,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArgumentType {
        function: function.to_string(),
        position,
        expected,
        got,
    })
}

/// Maximum recursion depth exceeded error.
#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

// Control Flow Errors

/// `break`/`continue` that escaped every loop.
#[cold]
pub fn control_outside_loop(keyword: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ControlOutsideLoop { keyword })
}

#[cold]
pub fn invalid_assignment_target() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidAssignmentTarget)
}

/// `for (x in value)` over a non-iterable value.
#[cold]
pub fn not_iterable(type_name: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIterable { type_name })
}

// Capability and Module Errors

/// Call blocked by the capability policy.
#[cold]
pub fn capability_denied(module: &str, function: &str, capability: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CapabilityDenied {
        module: module.to_string(),
        function: function.to_string(),
        capability: capability.to_string(),
    })
}

/// `import` of a module the registry does not know.
#[cold]
pub fn unknown_module(module: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownModule {
        module: module.to_string(),
    })
}

/// Invalid input to a host function (`ValueError`).
#[cold]
pub fn invalid_value(message: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidValue {
        message: message.into(),
    })
}
