//! Error types for WAD archive operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("corrupt directory entry {index}: {reason}")]
    CorruptDirectory { index: usize, reason: String },

    #[error("entry range [{offset}, +{length}) falls outside archive of {archive_len} bytes")]
    CorruptArchive {
        offset: u64,
        length: u64,
        archive_len: u64,
    },

    #[error("invalid entry name {0:?}")]
    InvalidName(String),

    #[error("entry index {index} out of range for directory of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("lump decode error: {0}")]
    LumpDecode(String),

    #[error("lump encode error: {0}")]
    LumpEncode(String),

    #[error("archive backend is read-only")]
    UnsupportedMutation,

    #[error("archive is closed")]
    Closed,

    #[error("archive would exceed the 2 GiB wire limit ({0} bytes)")]
    TooLarge(u64),
}

pub type Result<T> = std::result::Result<T, WadError>;
