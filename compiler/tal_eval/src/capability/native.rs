//! Host function descriptors and the calling convention.

use super::{Capability, NativeState};
use crate::errors::{wrong_arg_count, wrong_arg_type, EvalError, EvalResult};
use crate::value::{ArrayRef, ObjectRef, Value};
use std::fmt;

/// Signature of every host function.
///
/// Handlers reach back into the evaluator only through [`HostContext`];
/// they never see the caller's scope.
pub type NativeHandler = fn(&mut dyn HostContext, NativeCall<'_>) -> EvalResult;

/// Accepted argument counts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range.
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

/// Static description of a host function.
pub struct NativeDescriptor {
    pub module: &'static str,
    pub name: &'static str,
    pub arity: Arity,
    pub capabilities: Capability,
    pub handler: NativeHandler,
}

impl NativeDescriptor {
    pub const fn new(
        module: &'static str,
        name: &'static str,
        arity: Arity,
        capabilities: Capability,
        handler: NativeHandler,
    ) -> Self {
        NativeDescriptor {
            module,
            name,
            arity,
            capabilities,
            handler,
        }
    }

    /// `module.name`, or just `name` for globals.
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }

    pub fn check_arity(&self, got: usize) -> Result<(), EvalError> {
        if self.arity.accepts(got) {
            Ok(())
        } else {
            Err(wrong_arg_count(&self.qualified_name(), self.arity, got))
        }
    }
}

impl fmt::Debug for NativeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeDescriptor")
            .field("name", &self.qualified_name())
            .field("arity", &self.arity)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// A callable host function value, optionally bound to native state.
#[derive(Clone)]
pub struct NativeFunction {
    pub(crate) descriptor: &'static NativeDescriptor,
    pub(crate) receiver: Option<NativeState>,
}

impl NativeFunction {
    pub fn new(descriptor: &'static NativeDescriptor, receiver: Option<NativeState>) -> Self {
        NativeFunction {
            descriptor,
            receiver,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &'static NativeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn receiver(&self) -> Option<&NativeState> {
        self.receiver.as_ref()
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.descriptor, other.descriptor)
            && match (&self.receiver, &other.receiver) {
                (None, None) => true,
                (Some(a), Some(b)) => NativeState::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}", self.descriptor.qualified_name())?;
        if let Some(state) = &self.receiver {
            write!(f, ", {state:?}")?;
        }
        write!(f, ")")
    }
}

/// What a host function may ask of the evaluator.
pub trait HostContext {
    /// Call a script or host function with positional arguments.
    ///
    /// Throws from the callee propagate unchanged.
    fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult;

    /// Write a line through the configured print handler.
    fn print(&self, text: &str);
}

/// Arguments of one host call, with typed accessors.
///
/// Accessor failures are `TypeError`s naming the function and position.
#[derive(Clone, Copy)]
pub struct NativeCall<'a> {
    descriptor: &'static NativeDescriptor,
    args: &'a [Value],
    receiver: Option<&'a NativeState>,
}

impl<'a> NativeCall<'a> {
    pub fn new(
        descriptor: &'static NativeDescriptor,
        args: &'a [Value],
        receiver: Option<&'a NativeState>,
    ) -> Self {
        NativeCall {
            descriptor,
            args,
            receiver,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &'static NativeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument `i`, or `null` when absent.
    pub fn arg(&self, i: usize) -> Value {
        self.args.get(i).cloned().unwrap_or_default()
    }

    /// Argument `i` unless absent or `null`.
    pub fn opt_arg(&self, i: usize) -> Option<&'a Value> {
        self.args.get(i).filter(|v| !v.is_null())
    }

    /// Native state this function is bound to.
    pub fn receiver(&self) -> Result<&'a NativeState, EvalError> {
        self.receiver.ok_or_else(|| {
            EvalError::new(format!(
                "{} must be called as a method",
                self.descriptor.qualified_name()
            ))
        })
    }

    /// Bound state downcast to `T`.
    pub fn state<T: std::any::Any>(&self) -> Result<&'a T, EvalError> {
        self.receiver()?.downcast::<T>().ok_or_else(|| {
            EvalError::new(format!(
                "{} is bound to foreign state",
                self.descriptor.qualified_name()
            ))
        })
    }

    #[cold]
    fn type_error(&self, i: usize, expected: &'static str) -> EvalError {
        let got = self.args.get(i).map_or("nothing", Value::type_name);
        wrong_arg_type(&self.descriptor.qualified_name(), i, expected, got)
    }

    pub fn str_arg(&self, i: usize) -> Result<&'a str, EvalError> {
        match self.args.get(i) {
            Some(Value::Str(s)) => Ok(s),
            _ => Err(self.type_error(i, "string")),
        }
    }

    pub fn number_arg(&self, i: usize) -> Result<f64, EvalError> {
        match self.args.get(i) {
            Some(Value::Number(n)) => Ok(*n),
            _ => Err(self.type_error(i, "number")),
        }
    }

    /// Integral number argument.
    pub fn int_arg(&self, i: usize) -> Result<i64, EvalError> {
        match self.args.get(i) {
            Some(Value::Number(n)) if n.fract() == 0.0 && n.is_finite() => Ok(*n as i64),
            _ => Err(self.type_error(i, "integer")),
        }
    }

    pub fn bool_arg(&self, i: usize) -> Result<bool, EvalError> {
        match self.args.get(i) {
            Some(Value::Bool(b)) => Ok(*b),
            _ => Err(self.type_error(i, "boolean")),
        }
    }

    pub fn array_arg(&self, i: usize) -> Result<&'a ArrayRef, EvalError> {
        match self.args.get(i) {
            Some(Value::Array(a)) => Ok(a),
            _ => Err(self.type_error(i, "array")),
        }
    }

    pub fn object_arg(&self, i: usize) -> Result<&'a ObjectRef, EvalError> {
        match self.args.get(i) {
            Some(Value::Object(o)) => Ok(o),
            _ => Err(self.type_error(i, "object")),
        }
    }

    pub fn callable_arg(&self, i: usize) -> Result<&'a Value, EvalError> {
        match self.args.get(i) {
            Some(v) if v.is_callable() => Ok(v),
            _ => Err(self.type_error(i, "function")),
        }
    }
}
