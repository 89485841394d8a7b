//! Error kinds shared by the coders and the integrity checks.

use thiserror::Error;

/// Everything that can go wrong while building or running a coder, or while
/// selecting a check. Reaching the end of the stream is not an error, see
/// [`crate::stream::Status`].
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The check type is reserved or was not compiled in. The caller may pick
    /// another check, or no check at all.
    #[error("unsupported integrity check")]
    UnsupportedCheck,

    /// The library was misused, or an internal invariant broke. Never
    /// expected in correct operation.
    #[error("programming error: {0}")]
    Program(&'static str),

    /// No progress was possible. Retry with more input or more output space.
    #[error("no progress is possible")]
    Buf,

    /// The input is corrupt or does not match its declared size.
    #[error("data error: {0}")]
    Data(&'static str),

    /// Memory for the coder could not be allocated.
    #[error("cannot allocate memory")]
    Mem,
}

impl Error {
    /// Returns true if the coder may be called again after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Buf | Error::UnsupportedCheck)
    }
}
