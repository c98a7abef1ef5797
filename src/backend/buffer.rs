//! In-memory backend over an owned byte buffer

use super::Backend;
use crate::error::Result;
use std::io;

/// Backend keeping the entire archive in one owned `Vec<u8>`.
///
/// All reads and writes are slice operations; growth is amortized by the
/// vector's geometric reallocation. Best fit for archives built or edited
/// programmatically before being persisted once.
#[derive(Debug, Default)]
pub struct BufferBackend {
    buf: Vec<u8>,
}

impl BufferBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    /// The serialized archive bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    fn range(&self, offset: u64, len: usize) -> io::Result<std::ops::Range<usize>> {
        let end = offset
            .checked_add(len as u64)
            .filter(|&end| end <= self.buf.len() as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "read beyond buffer bounds: offset={offset}, len={len}, size={}",
                        self.buf.len()
                    ),
                )
            })?;
        Ok(offset as usize..end as usize)
    }
}

impl Backend for BufferBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buf[range]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset as usize + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.buf.len() as u64)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.buf.resize(len as usize, 0);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }

    fn replace_contents(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.buf = bytes;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WadError;

    #[test]
    fn write_extends_buffer() {
        let mut backend = BufferBackend::new();
        backend.write_at(4, b"abcd").unwrap();
        assert_eq!(backend.len().unwrap(), 8);
        assert_eq!(backend.as_slice(), b"\0\0\0\0abcd");
    }

    #[test]
    fn read_past_end_fails() {
        let mut backend = BufferBackend::from_vec(vec![1, 2, 3]);
        let mut buf = [0u8; 4];
        assert!(matches!(
            backend.read_at(0, &mut buf),
            Err(WadError::Io(_))
        ));
    }

    #[test]
    fn set_len_truncates() {
        let mut backend = BufferBackend::from_vec(vec![0u8; 16]);
        backend.set_len(4).unwrap();
        assert_eq!(backend.len().unwrap(), 4);
    }
}
