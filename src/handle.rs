//! Single-owner handles with idempotent release.
//!
//! Every resource the engine hands out (encoders, encoded payloads, shares,
//! commitments, verifiers) sits behind a [`Handle`].  A handle owns at most
//! one value, cannot be cloned, and can be emptied explicitly with
//! [`Handle::release`] or moved out with [`Handle::transfer`].  Operations on
//! an empty handle fail with [`DaError::InvalidInput`].
//!
//! Dropping a handle also frees its value, so an owner that never calls
//! `release` does not leak.  `release` stays available and idempotent for
//! callers that want the value gone before the owner goes out of scope.

use std::fmt;

use crate::error::DaError;

/// Owning slot for one engine resource.
pub struct Handle<T> {
    kind: &'static str,
    slot: Option<T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(kind: &'static str, value: T) -> Self {
        Self {
            kind,
            slot: Some(value),
        }
    }

    pub(crate) fn null(kind: &'static str) -> Self {
        Self { kind, slot: None }
    }

    /// Returns `true` while the handle owns a resource.
    pub fn is_live(&self) -> bool {
        self.slot.is_some()
    }

    /// Drops the owned resource.  Releasing an empty handle does nothing.
    pub fn release(&mut self) {
        if self.slot.take().is_some() {
            tracing::trace!(kind = self.kind, "released handle");
        }
    }

    /// Moves the resource into a new handle, leaving this one empty.
    pub fn transfer(&mut self) -> Self {
        Self {
            kind: self.kind,
            slot: self.slot.take(),
        }
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.slot.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        self.slot.as_mut()
    }

    /// Borrows the resource or reports which handle was null.
    pub(crate) fn require(&self, operation: &'static str) -> Result<&T, DaError> {
        self.slot
            .as_ref()
            .ok_or_else(|| DaError::invalid_input(operation, format!("{} handle is null", self.kind)))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Implements the shared ownership surface for a resource wrapper whose only
/// field is `handle: Handle<_>`.
macro_rules! owned_resource {
    ($ty:ident, $kind:literal) => {
        impl $ty {
            /// Returns an empty (null) instance.
            pub fn null() -> Self {
                Self {
                    handle: $crate::handle::Handle::null($kind),
                }
            }

            /// Returns `true` until the instance is released or transferred.
            pub fn is_live(&self) -> bool {
                self.handle.is_live()
            }

            /// Frees the underlying resource.  Safe to call repeatedly and on
            /// null instances.
            pub fn release(&mut self) {
                self.handle.release();
            }

            /// Moves ownership into the returned instance and leaves `self` null.
            pub fn transfer(&mut self) -> Self {
                Self {
                    handle: self.handle.transfer(),
                }
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::null()
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("live", &self.is_live())
                    .finish()
            }
        }
    };
}

pub(crate) use owned_resource;
