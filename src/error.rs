//! Result codes, typed errors and the engine's last-error channel.
//!
//! Engine-level routines report a bare [`ResultCode`] and leave a
//! human-readable diagnostic in a thread-local slot.  The public wrappers
//! turn that pair into a [`DaError`] by draining the slot, so every error a
//! caller sees carries the operation name, the code and the detail.

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Result type used by engine-level routines.
pub(crate) type EngineResult<T> = Result<T, ResultCode>;

/// Records `detail` as the most recent engine diagnostic on this thread.
pub(crate) fn set_last_error(detail: impl Into<String>) {
    let detail = detail.into();
    tracing::trace!(%detail, "engine diagnostic recorded");
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(detail));
}

/// Records `detail` and fails with `code`.
pub(crate) fn engine_failure<T>(code: ResultCode, detail: impl Into<String>) -> EngineResult<T> {
    set_last_error(detail);
    Err(code)
}

/// Returns the most recent engine diagnostic on this thread and clears it.
///
/// Wrappers drain the channel when they build a [`DaError`], so after a
/// failed call this usually returns `None`.  It stays useful for outcomes
/// that are not errors, such as a verification that returned `false`.
pub fn take_last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow_mut().take())
}

/// Discriminated outcome of an engine operation.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// The operation completed.
    Success = 0,
    /// A caller-supplied argument violated a precondition.
    InvalidInput = -1,
    /// The engine failed for reasons opaque to the caller.
    InternalError = -2,
    /// The engine could not obtain memory.
    AllocationFailure = -3,
}

impl ResultCode {
    /// Returns `true` for [`ResultCode::Success`].
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    fn label(self) -> &'static str {
        match self {
            ResultCode::Success => "success",
            ResultCode::InvalidInput => "invalid input",
            ResultCode::InternalError => "internal error",
            ResultCode::AllocationFailure => "allocation failure",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn compose(operation: &Option<&'static str>, code: ResultCode, detail: &Option<String>) -> String {
    let mut message = String::new();
    if let Some(operation) = operation {
        message.push_str(operation);
        message.push_str(": ");
    }
    message.push_str(code.label());
    if let Some(detail) = detail {
        message.push_str(": ");
        message.push_str(detail);
    }
    message
}

/// Errors surfaced by every fallible public operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaError {
    /// A caller-supplied argument violated a precondition.
    #[error("{}", compose(.operation, ResultCode::InvalidInput, .detail))]
    InvalidInput {
        /// Operation that rejected the input.
        operation: Option<&'static str>,
        /// Diagnostic detail.
        detail: Option<String>,
    },
    /// The coding engine failed.
    #[error("{}", compose(.operation, ResultCode::InternalError, .detail))]
    Internal {
        /// Operation that failed.
        operation: Option<&'static str>,
        /// Diagnostic detail, passed through verbatim from the engine.
        detail: Option<String>,
    },
    /// Resource exhaustion.
    #[error("{}", compose(.operation, ResultCode::AllocationFailure, .detail))]
    Allocation {
        /// Operation that failed.
        operation: Option<&'static str>,
        /// Diagnostic detail.
        detail: Option<String>,
    },
    /// Malformed bytes at the serialization boundary.
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),
}

impl DaError {
    pub(crate) fn invalid_input(operation: &'static str, detail: impl Into<String>) -> Self {
        DaError::InvalidInput {
            operation: Some(operation),
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn internal(operation: &'static str, detail: impl Into<String>) -> Self {
        DaError::Internal {
            operation: Some(operation),
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn allocation(operation: &'static str, detail: impl Into<String>) -> Self {
        DaError::Allocation {
            operation: Some(operation),
            detail: Some(detail.into()),
        }
    }

    /// Builds the error for an engine result code, draining the last-error channel.
    pub(crate) fn from_code(operation: &'static str, code: ResultCode) -> Self {
        let detail = take_last_error();
        let operation = Some(operation);
        match code {
            ResultCode::InvalidInput => DaError::InvalidInput { operation, detail },
            ResultCode::AllocationFailure => DaError::Allocation { operation, detail },
            ResultCode::InternalError => DaError::Internal { operation, detail },
            ResultCode::Success => DaError::Internal {
                operation,
                detail: Some("engine reported success for a failed call".into()),
            },
        }
    }

    /// Maps the error back onto the engine's result codes.
    ///
    /// Decode failures are reported as [`ResultCode::InvalidInput`]: the
    /// caller handed over bytes that do not satisfy the wire contract.
    pub fn code(&self) -> ResultCode {
        match self {
            DaError::InvalidInput { .. } | DaError::Decode(_) => ResultCode::InvalidInput,
            DaError::Internal { .. } => ResultCode::InternalError,
            DaError::Allocation { .. } => ResultCode::AllocationFailure,
        }
    }

    /// Name of the operation that failed, when known.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            DaError::InvalidInput { operation, .. }
            | DaError::Internal { operation, .. }
            | DaError::Allocation { operation, .. } => *operation,
            DaError::Decode(_) => None,
        }
    }

    /// Diagnostic detail, when one was recorded.
    pub fn detail(&self) -> Option<&str> {
        match self {
            DaError::InvalidInput { detail, .. }
            | DaError::Internal { detail, .. }
            | DaError::Allocation { detail, .. } => detail.as_deref(),
            DaError::Decode(_) => None,
        }
    }

    /// Returns `true` when the error is [`DaError::InvalidInput`].
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DaError::InvalidInput { .. })
    }
}
