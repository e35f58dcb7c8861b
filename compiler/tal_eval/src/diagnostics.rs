//! Call-stack tracking for the evaluator.
//!
//! - `CallStack`: live frames plus the recursion limit
//! - `CallFrame`: per-call metadata (name, call-site span)
//!
//! `CallStack` captures backtraces at error sites. The snapshot is stored
//! on `EvalError` as `EvalBacktrace`.

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};
use tal_ir::Span;

/// Name shown for closures without a declared name.
pub const ANONYMOUS: &str = "<anonymous>";

/// Frames kept in a captured backtrace.
pub const MAX_BACKTRACE_FRAMES: usize = 32;

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Host module for native calls.
    pub module: Option<&'static str>,
    /// Function name.
    pub name: &'static str,
    /// Source location of the call site.
    pub call_span: Option<Span>,
}

impl CallFrame {
    pub fn user(name: Option<&'static str>, call_span: Span) -> Self {
        CallFrame {
            module: None,
            name: name.unwrap_or(ANONYMOUS),
            call_span: Some(call_span),
        }
    }

    pub fn native(module: &'static str, name: &'static str, call_span: Span) -> Self {
        CallFrame {
            module: Some(module),
            name,
            call_span: Some(call_span),
        }
    }

    /// `module.name` for natives, `name` otherwise.
    pub fn display_name(&self) -> String {
        match self.module {
            Some(module) if !module.is_empty() => format!("{module}.{}", self.name),
            _ => self.name.to_string(),
        }
    }
}

/// Live call stack for the interpreter.
///
/// Each function call pushes a frame; return pops it. The depth check is
/// integrated into `push()`, which is how runaway recursion surfaces as a
/// catchable `StackOverflowError` instead of crashing the host.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` is `None` for unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    ///
    /// The frame is NOT pushed on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent call frame.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Snapshot the current stack, most recent call first, truncated to
    /// [`MAX_BACKTRACE_FRAMES`].
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .take(MAX_BACKTRACE_FRAMES)
            .map(|f| BacktraceFrame {
                name: f.display_name(),
                span: f.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace to `err` unless it already has one.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}
