//! Value Identity
//!
//! A provider decides whether its value changed with an identity check,
//! never a deep comparison. Scalars and strings are compared by value,
//! shared pointers by address: two `Rc`s holding equal data are still
//! different values.
//!
//! Wrap structured values in `Rc` or `Arc` to publish them through a
//! context. Replacing the pointer is what signals a change.

use std::rc::Rc;
use std::sync::Arc;

/// Identity comparison used to detect a changed context value.
pub trait Identity {
    /// Returns `true` when `self` and `other` are the same value.
    fn is_same(&self, other: &Self) -> bool;
}

macro_rules! impl_identity_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identity for $ty {
                #[inline]
                fn is_same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

// Floats use `==`, so NaN is never the same as itself.
impl_identity_by_value!(
    (), bool, char,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
    &'static str, String,
);

impl<T: ?Sized> Identity for Rc<T> {
    fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Identity> Identity for Option<T> {
    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.is_same(b),
            (None, None) => true,
            _ => false,
        }
    }
}
