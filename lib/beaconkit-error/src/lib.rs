//! Generic error handling for fallible BeaconKit APIs.
#![deny(warnings)]
#![deny(missing_docs)]

use std::fmt::Display;

/// A generic, opaque error.
///
/// Used at API boundaries where the caller cannot meaningfully react to individual failure modes and only needs to
/// report or propagate the error. Concerns with an enumerable set of failures define their own error types instead.
pub type GenericError = anyhow::Error;

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;

/// Constructs a [`GenericError`].
///
/// Accepts a string literal, a format string with arguments, or any value implementing `Debug` and `Display`. When
/// given an existing error that implements `std::error::Error`, its source chain is preserved.
#[macro_export]
macro_rules! generic_error {
    // Forwards to `anyhow::anyhow`, which we wrap rather than re-export so that the documentation callers see is not
    // `anyhow`-specific.
    ($msg:literal $(,)?) => { $crate::_anyhow!($msg) };
    ($err:expr $(,)?) => { $crate::_anyhow!($err) };
    ($fmt:expr, $($arg:tt)*) => { $crate::_anyhow!($fmt, $($arg)*) };
}

pub(crate) mod private {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}

/// Extension trait for attaching context to the error variant of a `Result`.
///
/// The method names deliberately avoid `context`, so that this trait can be imported alongside `snafu::ResultExt`
/// without the extension methods colliding.
pub trait ErrorContext<T, E>: private::Sealed {
    /// Wraps the error value with additional context.
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error value with additional context, evaluated lazily only if an error occurs.
    fn with_error_context<C, F>(self, f: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T, E> for Result<T, E>
where
    Result<T, E>: anyhow::Context<T, E>,
{
    fn error_context<C>(self, context: C) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
    {
        <Self as anyhow::Context<T, E>>::context(self, context)
    }

    fn with_error_context<C, F>(self, context: F) -> Result<T, GenericError>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        <Self as anyhow::Context<T, E>>::with_context(self, context)
    }
}
