//! Fill-engine errors
//!
//! Validation errors are raised synchronously while building a `FillSpec`,
//! before any file is touched.  Everything that can go wrong once the write
//! loop is running is a `FillError`.
//!
//! ## Authors
//!
//! The fillgen Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.md` file in the fillgen root directory for
//! information on licensing and copyright.

use crate::{content::FillPolicy, operation::Cancellation, size::SizeUnit};
use err_derive::Error;

////////////////////////////////////////////////////////////////////////////////
// Validation errors.
////////////////////////////////////////////////////////////////////////////////

/// A malformed fill request.  None of these are ever produced after file I/O
/// has started.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The policy draws its content from the template, but none was supplied.
    #[error(
        display = "ValidationError: the {:?} policy requires a non-empty content template.",
        _0
    )]
    EmptyTemplate(FillPolicy),
    /// Templates must be ASCII so that one template character is one byte.
    #[error(display = "ValidationError: the content template must be ASCII.")]
    NonAsciiTemplate,
    /// `magnitude * 1024^k` does not fit in 64 bits.
    #[error(
        display = "ValidationError: a size of {} {:?} overflows the byte count.",
        _0,
        _1
    )]
    SizeOverflow(u64, SizeUnit),
    /// No target path was supplied.
    #[error(display = "ValidationError: no target file path was supplied.")]
    MissingPath,
    #[error(display = "ValidationError: unknown size unit {:?}.", _0)]
    UnknownUnit(String),
    #[error(display = "ValidationError: unknown fill policy {:?}.", _0)]
    UnknownPolicy(String),
}

////////////////////////////////////////////////////////////////////////////////
// Write-loop errors.
////////////////////////////////////////////////////////////////////////////////

/// Errors raised by `SizedFileWriter::run`.
#[derive(Debug, Error)]
pub enum FillError {
    /// The stop token was raised between two chunks.
    #[error(display = "FillError: the fill operation was cancelled.")]
    Cancelled,
    #[error(display = "FillError: IOError: {:?}.", _0)]
    IOError(#[error(source)] std::io::Error),
    /// The finished staging file could not replace the target.  The staging
    /// file has already been removed.
    #[error(display = "FillError: failed to replace the target file: {:?}.", _0)]
    PersistError(std::io::Error),
}

impl Cancellation for FillError {
    fn is_cancellation(&self) -> bool {
        matches!(self, FillError::Cancelled)
    }
}
