//! Storage backends: the byte space underneath an archive

mod buffer;
mod file;
mod mapped;

pub use buffer::BufferBackend;
pub use file::FileBackend;
pub use mapped::MappedBackend;

use crate::error::Result;

/// Capability contract for an archive's byte storage.
///
/// A backend owns one linear byte sequence and the primitives to read and
/// write it; it knows nothing about headers, directories, or lumps. The
/// archive façade is the only caller and is responsible for keeping the
/// directory and the byte space consistent.
///
/// Read-only backends report `writable() == false` and fail every mutating
/// operation with [`crate::WadError::UnsupportedMutation`].
pub trait Backend {
    /// Read exactly `buf.len()` bytes starting at `offset`. A short byte
    /// space is an error, never a partial read.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Write `data` at `offset`, extending the byte space if the write ends
    /// past its current length.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Current length of the byte space.
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Truncate the byte space to `len` bytes.
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Make previously written bytes durable.
    fn flush(&mut self) -> Result<()>;

    /// Whether structural mutation is supported at all.
    fn writable(&self) -> bool;

    /// Replace the whole byte space in one step. For persistent backends
    /// this must be atomic: a failure leaves the previous contents intact.
    /// Used only by compaction.
    fn replace_contents(&mut self, bytes: Vec<u8>) -> Result<()>;

    /// Release underlying resources. Reads after close fail.
    fn close(&mut self) -> Result<()>;
}
