//! Reference-counted payloads for heap values.
//!
//! `Heap<T>` is an immutable shared payload (strings, exception records).
//! `Shared<T>` is a mutable shared container (arrays, objects, scopes):
//! cloning aliases the same storage, so mutation through one handle is
//! visible through every other.
//!
//! Dropping the last handle to a container releases its contents through
//! a work list rather than recursively, so arbitrarily deep nesting is
//! freed without exhausting the native stack.

use super::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Immutable shared payload.
pub struct Heap<T: ?Sized>(Rc<T>);

impl<T: ?Sized> Heap<T> {
    pub(crate) fn from_rc(inner: Rc<T>) -> Self {
        Heap(inner)
    }

    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl<T> Heap<T> {
    pub(crate) fn new(value: T) -> Self {
        Heap(Rc::new(value))
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Container payload whose values can be moved out before it is freed.
pub trait Reclaim {
    /// Move every contained value into `out`, leaving `self` empty.
    fn reclaim(&mut self, out: &mut Vec<Value>);
}

impl Reclaim for Vec<Value> {
    fn reclaim(&mut self, out: &mut Vec<Value>) {
        out.append(self);
    }
}

/// Mutable shared container.
///
/// Borrows must never be held across a call back into the evaluator;
/// callers snapshot what they need first.
pub struct Shared<T: Reclaim>(Rc<RefCell<T>>);

impl<T: Reclaim> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether both handles alias the same container.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<T>> {
        Rc::downgrade(&self.0)
    }

    /// Stable address, used to detect cycles while rendering.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Empty the container into `out` if this is its last strong handle.
    fn reclaim_into(&self, out: &mut Vec<Value>) {
        if Rc::strong_count(&self.0) != 1 {
            return;
        }
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.reclaim(out);
        }
    }
}

impl<T: Reclaim> Drop for Shared<T> {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.reclaim_into(&mut pending);
        // Children are emptied before they drop, so each drop below is shallow.
        while let Some(value) = pending.pop() {
            match &value {
                Value::Array(items) => items.reclaim_into(&mut pending),
                Value::Object(map) => map.reclaim_into(&mut pending),
                Value::Function(function) => function.env.reclaim_into(&mut pending),
                _ => {}
            }
        }
    }
}

impl<T: Reclaim> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(Rc::clone(&self.0))
    }
}

impl<T: Reclaim + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => inner.fmt(f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}
