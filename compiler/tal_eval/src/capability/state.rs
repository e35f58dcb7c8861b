//! Opaque native state.
//!
//! Pattern objects, timestamp objects and composed functions are plain
//! objects whose methods are natives bound to a shared `NativeState`. The
//! state is type-erased; host modules downcast it back. It is freed when
//! the last bound method referring to it goes away.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Host state shared by the methods of one native-backed object.
#[derive(Clone)]
pub struct NativeState(Rc<dyn Any>);

impl NativeState {
    pub fn new<T: Any>(state: T) -> Self {
        NativeState(Rc::new(state))
    }

    /// The state, if it has type `T`.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles share one allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Number of bound values sharing this state.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl fmt::Debug for NativeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeState({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}
