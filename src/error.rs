//! Error types and the [`Error`] trait.
//!
//! All errors in this library implement the [`Error`] trait, which extends
//! [`std::error::Error`] with retry semantics. [`BoxedError`] provides
//! type-erased error handling while preserving retryability, and is what
//! transport and hook failures are carried as.

use std::convert::Infallible;

use snafu::{AsErrorSource, Snafu};

/// Errors that may occur in the library.
pub trait Error: std::error::Error + AsErrorSource + Send + Sync + 'static {
    /// If true, this indicates that a failed request may succeed if retried.
    ///
    /// The library itself never retries; this is information for the caller.
    fn is_retryable(&self) -> bool;
}

impl Error for Infallible {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// A boxed error that can be used without type parameters.
#[derive(Debug, Snafu)]
#[snafu(transparent)]
pub struct BoxedError {
    source: Box<dyn Error>,
}

impl BoxedError {
    /// Create a new boxed error from a generic `Error`.
    pub fn from_err<E: Error + 'static>(err: E) -> Self {
        Self {
            source: Box::new(err),
        }
    }

    /// Wraps any standard error as a non-retryable `BoxedError`.
    ///
    /// Useful inside provider hooks that call into foreign libraries.
    pub fn from_std<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::from_err(Opaque {
            source: Box::new(err),
        })
    }

    /// Creates a non-retryable error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::from_err(Message {
            message: message.into(),
        })
    }
}

impl Error for BoxedError {
    fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("{source}"))]
struct Opaque {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl Error for Opaque {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("{message}"))]
struct Message {
    message: String,
}

impl Error for Message {
    fn is_retryable(&self) -> bool {
        false
    }
}
