//! Outcome container.
//!
//! Every engine read operation returns an [`Outcome`]: either a success
//! value, or a failure carrying the cause plus an optional fallback value
//! (typically whatever the local cache held before the remote fetch
//! failed). Callers can distinguish "succeeded", "failed but degraded data
//! available", and "failed, nothing available".
//!
//! Fallback presence is explicit and generic: `fallback: Option<T>` records
//! whether a fallback was *supplied* at all, independent of whether `T`
//! itself has content. For `Outcome<Option<Event>>`, a failure with
//! `fallback = Some(None)` means the cache was readable and held nothing —
//! [`has_value`](Outcome::has_value) is true and the fallback is an empty
//! optional.
//!
//! # Example
//!
//! ```
//! use observance_engine::{EngineError, Outcome, SourceError};
//!
//! let ok: Outcome<Vec<u32>> = Outcome::success(vec![1, 2]);
//! assert!(ok.is_success());
//! assert_eq!(ok.unwrap_or(vec![]), vec![1, 2]);
//!
//! let err = EngineError::Remote(SourceError::Http("connection reset".into()));
//! let degraded: Outcome<Vec<u32>> = Outcome::failure_with(err, vec![3]);
//! assert!(!degraded.is_success());
//! assert!(degraded.has_value());
//! assert_eq!(degraded.unwrap_or(vec![]), vec![3]);
//! ```

use crate::engine::EngineError;

/// Success value, or failure with an optional fallback.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Success(T),
    /// The operation failed; `fallback` is whatever degraded data was
    /// still available, if any.
    Failure {
        error: EngineError,
        fallback: Option<T>,
    },
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    pub fn failure(error: EngineError) -> Self {
        Outcome::Failure {
            error,
            fallback: None,
        }
    }

    pub fn failure_with(error: EngineError, fallback: T) -> Self {
        Outcome::Failure {
            error,
            fallback: Some(fallback),
        }
    }

    /// True for [`Outcome::Success`] only. A failure with a fallback is
    /// still a failure; see [`has_value`](Self::has_value).
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// True if a value is available: success, or a supplied fallback.
    #[must_use]
    pub fn has_value(&self) -> bool {
        match self {
            Outcome::Success(_) => true,
            Outcome::Failure { fallback, .. } => fallback.is_some(),
        }
    }

    /// The failure cause, if any.
    #[must_use]
    pub fn error(&self) -> Option<&EngineError> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }

    /// The success value or the fallback, consuming the outcome.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure { fallback, .. } => fallback,
        }
    }

    /// The success value or the fallback, else `default`.
    #[must_use]
    pub fn unwrap_or(self, default: T) -> T {
        self.ok().unwrap_or(default)
    }

    /// The success value or the fallback, else the result of `f`.
    #[must_use]
    pub fn unwrap_or_else<F: FnOnce() -> T>(self, f: F) -> T {
        self.ok().unwrap_or_else(f)
    }

    /// The success value or the fallback; on a fallback-less failure, the
    /// cause.
    pub fn into_result(self) -> Result<T, EngineError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure {
                fallback: Some(value),
                ..
            } => Ok(value),
            Outcome::Failure { error, .. } => Err(error),
        }
    }

    /// Borrow the success value or the fallback.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure { fallback, .. } => fallback.as_ref(),
        }
    }
}
