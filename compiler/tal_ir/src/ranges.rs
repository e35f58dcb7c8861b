//! Arena Range Types
//!
//! Compact `(start, len)` views into the flattened lists of an
//! [`ExprArena`](crate::ExprArena).

/// Macro to define range types for arena-allocated data.
///
/// Each generated type has:
/// - `start: u32` and `len: u32` fields
/// - `EMPTY` constant
/// - `new()`, `is_empty()`, `len()` methods
/// - `Debug` implementation showing the range as `TypeName(start..end)`
macro_rules! define_range {
    ($($name:ident),* $(,)?) => { $(
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        #[repr(C)]
        pub struct $name {
            pub start: u32,
            pub len: u32,
        }

        impl $name {
            pub const EMPTY: Self = Self { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u32) -> Self {
                Self { start, len }
            }

            #[inline]
            pub const fn is_empty(&self) -> bool {
                self.len == 0
            }

            #[inline]
            pub const fn len(&self) -> usize {
                self.len as usize
            }

            /// Slice bounds into the backing list.
            #[inline]
            pub const fn as_range(&self) -> ::std::ops::Range<usize> {
                self.start as usize..(self.start as usize + self.len as usize)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({}..{})", stringify!($name), self.start, self.start + self.len)
            }
        }
    )* };
}

define_range!(ExprRange, StmtRange, EntryRange, BranchRange, ParamRange);
