//! Runtime values.
//!
//! `Value` is a small closed tagged union. Heap variants are reference
//! counted: arrays and objects alias on clone, strings and exception
//! records are immutable and shared. Construct heap values through the
//! factory methods (`Value::string`, `Value::array`, ...).

mod exception;
mod heap;

pub use exception::{causal_chain, ChainLink, ExceptionRecord, Uncaught, MAX_CHAIN_DEPTH};
pub use heap::{Heap, Reclaim, Shared};

use crate::capability::{NativeDescriptor, NativeFunction, NativeState};
use crate::environment::Scope;
use indexmap::IndexMap;
use std::fmt::{self, Write as _};
use std::rc::Rc;
use tal_ir::{FunctionId, Name, SharedArena};

/// Insertion-ordered property map backing `Value::Object`.
pub type ObjectMap = IndexMap<String, Value>;

/// Shared, mutable array storage.
pub type ArrayRef = Shared<Vec<Value>>;

/// Shared, mutable object storage.
pub type ObjectRef = Shared<ObjectMap>;

/// Nesting limit for structural equality before falling back to identity.
const MAX_COMPARE_DEPTH: usize = 128;

/// Nesting limit for display; deeper containers render as `[...]` or `{...}`.
pub const MAX_DISPLAY_DEPTH: usize = 256;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// IEEE-754 double; integers are not a separate type.
    Number(f64),
    Str(Heap<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    /// Closure over a user function.
    Function(FunctionValue),
    /// Host function, optionally bound to opaque native state.
    Native(NativeFunction),
    Exception(Heap<ExceptionRecord>),
}

/// A user function together with the scope it closed over.
#[derive(Clone)]
pub struct FunctionValue {
    pub(crate) def: FunctionId,
    pub(crate) arena: SharedArena,
    pub(crate) env: Shared<Scope>,
    /// Resolved function name, for display and backtraces.
    pub(crate) label: Option<&'static str>,
}

impl FunctionValue {
    pub(crate) fn new(
        def: FunctionId,
        arena: SharedArena,
        env: Shared<Scope>,
        label: Option<&'static str>,
    ) -> Self {
        FunctionValue {
            def,
            arena,
            env,
            label,
        }
    }

    /// Declared name, if any.
    pub fn name(&self) -> Option<Name> {
        self.arena.get_function(self.def).name
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.arena.get_function(self.def).params.len()
    }

    /// Identity: same definition closed over the same scope.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.def == b.def && a.arena.ptr_eq(&b.arena) && Shared::ptr_eq(&a.env, &b.env)
    }
}

impl Value {
    // ===== Factories =====

    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Number(n as f64)
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Heap::from_rc(Rc::from(s.as_ref())))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    pub fn object(map: ObjectMap) -> Self {
        Value::Object(Shared::new(map))
    }

    /// Build an object from `(key, value)` pairs, keeping their order.
    pub fn object_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Unbound host function.
    pub fn native(descriptor: &'static NativeDescriptor) -> Self {
        Value::Native(NativeFunction::new(descriptor, None))
    }

    /// Host function bound to shared native state.
    pub fn native_bound(descriptor: &'static NativeDescriptor, state: NativeState) -> Self {
        Value::Native(NativeFunction::new(descriptor, Some(state)))
    }

    pub fn exception(record: ExceptionRecord) -> Self {
        Value::Exception(Heap::new(record))
    }

    // ===== Inspection =====

    /// `null`, `false`, `0`, `NaN` and `""` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Object(_)
            | Value::Function(_)
            | Value::Native(_)
            | Value::Exception(_) => true,
        }
    }

    /// Type name used in error messages and by `type_of`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Exception(_) => "exception",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Property of an object (or field of an exception record).
    ///
    /// Returns `None` for other kinds and for missing keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.borrow().get(key).cloned(),
            Value::Exception(e) => e.property(key),
            _ => None,
        }
    }

    /// Snapshot of an array's elements.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        self.as_array().map(|a| a.borrow().clone())
    }

    /// Referential identity of heap values. Scalars are never identical.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Heap::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Shared::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => FunctionValue::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }

    // ===== Equality =====

    /// Structural equality used by `==`.
    ///
    /// Numbers compare numerically, arrays and objects element-wise,
    /// functions by identity, exception records field-wise.
    pub fn equals(&self, other: &Value) -> bool {
        self.equals_at(other, 0)
    }

    fn equals_at(&self, other: &Value, depth: usize) -> bool {
        if depth > MAX_COMPARE_DEPTH {
            return self.same_ref(other);
        }
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Array(a), Value::Array(b)) => {
                if Shared::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.equals_at(y, depth + 1))
            }
            (Value::Object(a), Value::Object(b)) => {
                if Shared::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.get(k)
                            .is_some_and(|other| v.equals_at(other, depth + 1))
                    })
            }
            (Value::Function(a), Value::Function(b)) => FunctionValue::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => {
                Heap::ptr_eq(a, b) || a.equals_at(b, depth + 1)
            }
            _ => false,
        }
    }

    // ===== Display =====

    /// Display form used by `print`, string concatenation and `str()`.
    ///
    /// Top-level strings render raw; strings nested in containers are quoted.
    pub fn display_value(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        self.render(&mut out, &mut seen, 0);
        out
    }

    /// `depth` is the number of enclosing containers; zero at the top level.
    fn render(&self, out: &mut String, seen: &mut Vec<usize>, depth: usize) {
        let nested = depth > 0;
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Str(s) => {
                if nested {
                    let _ = write!(out, "{:?}", &**s);
                } else {
                    out.push_str(s);
                }
            }
            Value::Array(a) => {
                if depth >= MAX_DISPLAY_DEPTH || seen.contains(&a.addr()) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(a.addr());
                out.push('[');
                for (i, item) in a.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out, seen, depth + 1);
                }
                out.push(']');
                seen.pop();
            }
            Value::Object(o) => {
                if depth >= MAX_DISPLAY_DEPTH || seen.contains(&o.addr()) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(o.addr());
                out.push('{');
                for (i, (key, value)) in o.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.render(out, seen, depth + 1);
                }
                out.push('}');
                seen.pop();
            }
            Value::Function(f) => match f.label {
                Some(name) => {
                    let _ = write!(out, "<function {name}>");
                }
                None => out.push_str("<function>"),
            },
            Value::Native(n) => {
                let _ = write!(out, "<native {}>", n.descriptor.qualified_name());
            }
            Value::Exception(e) => {
                let _ = write!(out, "{}: {}", e.kind, e.message);
            }
        }
    }
}

/// Format a number the way scripts see it.
///
/// Integral values print without a fractional part, `-0` prints as `0`,
/// and non-finite values print as `NaN`, `Infinity` or `-Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // f64's Display never uses exponent notation and drops `.0`.
        format!("{n}")
    }
}

impl Reclaim for ObjectMap {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.extend(self.drain(..).map(|(_, value)| value));
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({})", format_number(*n)),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Array(_) => write!(f, "Array({})", self.display_value()),
            Value::Object(_) => write!(f, "Object({})", self.display_value()),
            Value::Function(_) | Value::Native(_) | Value::Exception(_) => {
                write!(f, "{}", self.display_value())
            }
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionValue({:?}, {:?})", self.def, self.label)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}
