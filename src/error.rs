use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A type tag was 0 (reserved) or past the last known tag.
    #[error("invalid type tag {0}")]
    InvalidType(u8),
    /// A length or count field reached the `MAX_LEN` ceiling. Raised before any allocation is
    /// attempted for the field.
    #[error("{field} of {len} exceeds the maximum of {max}", max = crate::MAX_LEN - 1)]
    Overflow { field: &'static str, len: usize },
    /// The allocator refused a buffer.
    #[error("failed to allocate {requested} bytes")]
    AllocationFailure { requested: usize },
    /// A short read or write, or any other failure of the underlying reader or writer.
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    /// An in-memory buffer ended before the value did.
    #[error("expected {expected} bytes but only {actual} remain on step [{step}]")]
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Containers were nested deeper than the decoder allows.
    #[error("nesting depth limit of {max} exceeded")]
    DepthLimit { max: usize },
    /// A container's declared content-length didn't match what it actually held. Only raised when
    /// the decoder is told to verify content-lengths.
    #[error("container declared {declared} content bytes but held {actual}")]
    ContentLength { declared: u32, actual: usize },
}

impl Error {
    pub(crate) fn alloc(requested: usize) -> impl FnOnce(TryReserveError) -> Error {
        move |_| Error::AllocationFailure { requested }
    }

    /// True for failures that came from the byte source or sink rather than from the data itself.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
