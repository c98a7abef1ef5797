//! Random-access file backend

use super::Backend;
use crate::error::{Result, WadError};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Backend over an exclusively-owned random-access file.
///
/// Reads seek-and-read, writes seek-and-write through a single handle.
/// [`Backend::replace_contents`] goes through a temp-file-then-persist
/// discipline so a failure mid-rewrite cannot truncate or corrupt the
/// original file.
#[derive(Debug)]
pub struct FileBackend {
    file: File,
    path: PathBuf,
}

impl FileBackend {
    /// Create a new, empty backing file, truncating any existing one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("creating archive file {:?}", path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing file for read/write access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!(
            "opened archive file {:?} ({} bytes)",
            path,
            file.metadata()?.len()
        );
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn writable(&self) -> bool {
        true
    }

    fn replace_contents(&mut self, bytes: Vec<u8>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".wad-rewrite")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;

        // Atomic swap: the original stays intact until the new file is
        // complete and durable.
        let file = tmp
            .persist(&self.path)
            .map_err(|e| WadError::Io(e.error))?;
        debug!(
            "rewrote archive file {:?} ({} bytes)",
            self.path,
            bytes.len()
        );
        self.file = file;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
