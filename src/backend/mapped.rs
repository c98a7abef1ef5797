//! Read-only memory-mapped backend

use super::Backend;
use crate::error::{Result, WadError};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Backend serving reads straight from a memory-mapped file.
///
/// Read-only by contract: a mapped region cannot be grown in place, so every
/// mutating operation fails with [`WadError::UnsupportedMutation`]. Callers
/// that need mutation open a file-backed archive instead. Closing releases
/// the mapping; later reads fail with [`WadError::Closed`].
#[derive(Debug)]
pub struct MappedBackend {
    mmap: Option<Mmap>,
    len: u64,
}

impl MappedBackend {
    /// Map an existing archive file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(WadError::MalformedHeader("empty file".to_string()));
        }

        // Safety contract of mmap: the caller must not let the file be
        // truncated externally while the mapping is live (single-writer
        // model, documented on the crate).
        let mmap = unsafe { Mmap::map(&file)? };
        debug!("memory-mapped archive {:?} ({} bytes)", path, len);

        Ok(Self {
            mmap: Some(mmap),
            len,
        })
    }

    fn mapping(&self) -> Result<&Mmap> {
        self.mmap.as_ref().ok_or(WadError::Closed)
    }
}

impl Backend for MappedBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mmap = self.mapping()?;
        let end = offset
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= self.len)
            .ok_or_else(|| {
                WadError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "read beyond mapped bounds: offset={offset}, len={}, size={}",
                        buf.len(),
                        self.len
                    ),
                ))
            })?;
        buf.copy_from_slice(&mmap[offset as usize..end as usize]);
        Ok(())
    }

    fn write_at(&mut self, _offset: u64, _data: &[u8]) -> Result<()> {
        Err(WadError::UnsupportedMutation)
    }

    fn len(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(WadError::UnsupportedMutation)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn writable(&self) -> bool {
        false
    }

    fn replace_contents(&mut self, _bytes: Vec<u8>) -> Result<()> {
        Err(WadError::UnsupportedMutation)
    }

    fn close(&mut self) -> Result<()> {
        self.mmap = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_from_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"mapped bytes")
            .unwrap();

        let mut backend = MappedBackend::open(&path).unwrap();
        let mut buf = [0u8; 5];
        backend.read_at(7, &mut buf).unwrap();
        assert_eq!(&buf, b"bytes");
    }

    #[test]
    fn mutation_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        std::fs::write(&path, b"x").unwrap();

        let mut backend = MappedBackend::open(&path).unwrap();
        assert!(!backend.writable());
        assert!(matches!(
            backend.write_at(0, b"y"),
            Err(WadError::UnsupportedMutation)
        ));
        assert!(matches!(
            backend.set_len(0),
            Err(WadError::UnsupportedMutation)
        ));
    }

    #[test]
    fn reads_fail_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        std::fs::write(&path, b"x").unwrap();

        let mut backend = MappedBackend::open(&path).unwrap();
        backend.close().unwrap();
        let mut buf = [0u8; 1];
        assert!(matches!(backend.read_at(0, &mut buf), Err(WadError::Closed)));
    }
}
