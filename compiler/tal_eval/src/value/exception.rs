//! Exception records and causal chains.
//!
//! Runtime faults become `ExceptionRecord`s when user code catches them.
//! User code throws arbitrary values; by convention those are objects with
//! `message`/`type`/`severity` fields and an optional `originalError`
//! link, which is what the causal-chain walk follows.

use super::{ObjectMap, Value};
use crate::errors::{EvalBacktrace, EvalError, EvalErrorKind};
use std::fmt;

/// Upper bound on causal-chain links rendered for a single exception.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Structured payload of a runtime fault seen from script code.
#[derive(Clone, Debug)]
pub struct ExceptionRecord {
    pub message: String,
    /// Error type tag (`TypeError`, `CapabilityError`, ...).
    pub kind: String,
    pub severity: String,
    /// Always an object.
    pub context: Value,
    pub original_error: Option<Value>,
}

impl ExceptionRecord {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ExceptionRecord {
            message: message.into(),
            kind: kind.into(),
            severity: "error".to_string(),
            context: Value::object(ObjectMap::new()),
            original_error: None,
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    #[must_use]
    pub fn with_original_error(mut self, original: Value) -> Self {
        self.original_error = Some(original);
        self
    }

    /// Convert a runtime fault into the record an `except` block binds.
    pub fn from_error(err: &EvalError) -> Self {
        let mut context = kind_context(&err.kind);
        if let Some(span) = err.span {
            context.insert("span".to_string(), Value::string(span.to_string()));
        }
        if let Some(backtrace) = &err.backtrace {
            let frames = backtrace
                .frames()
                .iter()
                .map(|frame| Value::string(&frame.name))
                .collect();
            context.insert("backtrace".to_string(), Value::array(frames));
        }
        ExceptionRecord {
            message: err.message.clone(),
            kind: err.kind.type_tag().to_string(),
            severity: err.kind.severity().to_string(),
            context: Value::object(context),
            original_error: None,
        }
    }

    /// Field access from script code.
    pub fn property(&self, name: &str) -> Option<Value> {
        match name {
            "message" => Some(Value::string(&self.message)),
            "type" | "kind" => Some(Value::string(&self.kind)),
            "severity" => Some(Value::string(&self.severity)),
            "context" => Some(self.context.clone()),
            "originalError" => Some(self.original_error.clone().unwrap_or_default()),
            _ => None,
        }
    }

    pub(super) fn equals_at(&self, other: &Self, depth: usize) -> bool {
        self.message == other.message
            && self.kind == other.kind
            && self.severity == other.severity
            && self.context.equals_at(&other.context, depth)
            && match (&self.original_error, &other.original_error) {
                (None, None) => true,
                (Some(a), Some(b)) => a.equals_at(b, depth),
                _ => false,
            }
    }
}

/// Structured details a handler can inspect via `e.context`.
fn kind_context(kind: &EvalErrorKind) -> ObjectMap {
    let mut context = ObjectMap::new();
    match kind {
        EvalErrorKind::UnboundName { name } => {
            context.insert("name".to_string(), Value::string(name));
        }
        EvalErrorKind::IndexOutOfBounds { index, length } => {
            context.insert("index".to_string(), Value::int(*index));
            context.insert("length".to_string(), Value::number(*length as f64));
        }
        EvalErrorKind::CapabilityDenied {
            module,
            function,
            capability,
        } => {
            context.insert("module".to_string(), Value::string(module));
            context.insert("function".to_string(), Value::string(function));
            context.insert("capability".to_string(), Value::string(capability));
        }
        EvalErrorKind::UnknownModule { module } => {
            context.insert("module".to_string(), Value::string(module));
        }
        EvalErrorKind::StackOverflow { depth } => {
            context.insert("limit".to_string(), Value::number(*depth as f64));
        }
        _ => {}
    }
    context
}

/// One rendered link of a causal chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub kind: String,
    pub message: String,
}

impl fmt::Display for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Walk `originalError` links starting at `value`.
///
/// Stops at a missing or `null` link, or after [`MAX_CHAIN_DEPTH`] links,
/// so self-referential chains still terminate.
pub fn causal_chain(value: &Value) -> Vec<ChainLink> {
    let mut links = Vec::new();
    let mut current = Some(value.clone());
    while let Some(value) = current.take() {
        if links.len() >= MAX_CHAIN_DEPTH {
            break;
        }
        let (link, next) = describe(&value);
        links.push(link);
        current = next.filter(|v| !v.is_null());
    }
    links
}

fn describe(value: &Value) -> (ChainLink, Option<Value>) {
    match value {
        Value::Exception(record) => (
            ChainLink {
                kind: record.kind.clone(),
                message: record.message.clone(),
            },
            record.original_error.clone(),
        ),
        Value::Object(object) => {
            let object = object.borrow();
            let kind = match object.get("type") {
                Some(Value::Str(s)) => s.to_string(),
                _ => "UserException".to_string(),
            };
            let message = match object.get("message") {
                Some(message) => message.display_value(),
                None => value.display_value(),
            };
            (
                ChainLink { kind, message },
                object.get("originalError").cloned(),
            )
        }
        other => (
            ChainLink {
                kind: "UserException".to_string(),
                message: other.display_value(),
            },
            None,
        ),
    }
}

/// A throw that escaped the program.
#[derive(Clone, Debug)]
pub struct Uncaught {
    /// The thrown value (runtime faults arrive as exception records).
    pub value: Value,
    /// Causal chain, outermost first.
    pub chain: Vec<ChainLink>,
    pub backtrace: Option<EvalBacktrace>,
}

impl Uncaught {
    pub fn from_value(value: Value) -> Self {
        let chain = causal_chain(&value);
        Uncaught {
            value,
            chain,
            backtrace: None,
        }
    }

    pub fn from_error(err: EvalError) -> Self {
        let value = Value::exception(ExceptionRecord::from_error(&err));
        let chain = causal_chain(&value);
        Uncaught {
            value,
            chain,
            backtrace: err.backtrace,
        }
    }

    /// Type tag of the outermost link.
    pub fn kind(&self) -> &str {
        self.chain.first().map_or("UserException", |link| &link.kind)
    }

    /// Message of the outermost link.
    pub fn message(&self) -> &str {
        self.chain.first().map_or("", |link| &link.message)
    }
}

impl fmt::Display for Uncaught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut links = self.chain.iter();
        match links.next() {
            Some(first) => write!(f, "uncaught exception: {first}")?,
            None => write!(f, "uncaught exception")?,
        }
        for link in links {
            write!(f, "\n  caused by: {link}")?;
        }
        if let Some(backtrace) = self.backtrace.as_ref().filter(|bt| !bt.is_empty()) {
            write!(f, "\n{backtrace}")?;
        }
        Ok(())
    }
}
