//! The codec contract between the storage engine and lump-format
//! collaborators

use crate::archive::Wad;
use crate::backend::Backend;
use crate::directory::Entry;
use crate::error::Result;

/// Decode/encode contract implemented by lump-format collaborators (map
/// geometry, pictures, sounds, text tables).
///
/// The archive imposes no schema. It guarantees that `decode` receives
/// exactly `entry.length` bytes, with no truncation or padding added.
/// Implementations fail with [`crate::WadError::LumpDecode`] on malformed or
/// short input and [`crate::WadError::LumpEncode`] on values outside the
/// representable range; either is local to that record and does not
/// invalidate the archive.
pub trait LumpCodec: Sized {
    fn decode(data: &[u8]) -> Result<Self>;

    fn encode(&self) -> Result<Vec<u8>>;
}

impl<B: Backend> Wad<B> {
    /// Read the lump at `index` and decode it.
    pub fn decode_lump<T: LumpCodec>(&mut self, index: usize) -> Result<T> {
        let data = self.read_bytes(index)?;
        T::decode(&data)
    }

    /// Encode a value and append it as a new lump.
    pub fn append_encoded<T: LumpCodec>(&mut self, name: &str, value: &T) -> Result<Entry> {
        let data = value.encode()?;
        self.append(name, &data)
    }
}
