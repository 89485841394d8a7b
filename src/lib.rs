pub mod chain;
pub mod check;
pub mod error;
pub mod nop;
pub mod simple;
pub mod stream;

pub use chain::{code_buffer, simple_coder_init, Chain};
pub use check::{Check, CheckType};
pub use error::Error;
pub use simple::{FilterCoder, Transform};
pub use stream::{Action, Coder, InBuf, OutBuf, Status};

/// The largest value of a variable length integer in the container format.
/// Sizes are limited to 63 bits.
pub const VLI_MAX: u64 = i64::MAX as u64;

/// Options that every filter in a chain accepts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// The number of bytes that the filter will process, or None if unknown.
    pub uncompressed_size: Option<u64>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uncompressed_size(size: u64) -> Self {
        Self {
            uncompressed_size: Some(size),
        }
    }

    /// Returns the uncompressed size, if it can be represented in the
    /// container format.
    pub fn validated_size(&self) -> Result<Option<u64>, Error> {
        match self.uncompressed_size {
            Some(size) if size > VLI_MAX => {
                Err(Error::Program("uncompressed size is too large"))
            }
            size => Ok(size),
        }
    }
}
