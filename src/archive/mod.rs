//! The archive façade: a directory plus a storage backend

mod stream;

pub use stream::LumpReader;

use crate::backend::{Backend, BufferBackend, FileBackend, MappedBackend};
use crate::directory::{Directory, Entry};
use crate::error::{Result, WadError};
use crate::header::Header;
use crate::name::EntryName;
use crate::types::{ArchiveStats, OpenMode, WadKind};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Largest byte offset the wire format can express (`i32` fields).
const WIRE_LIMIT: u64 = i32::MAX as u64;

/// A WAD archive: one [`Directory`] over one [`Backend`].
///
/// Every structural mutation applies a directory edit and a content edit as
/// one logical step; no method leaves the two visibly inconsistent to a
/// subsequent call. Content writes always go to the end of the content
/// region, so existing lump bytes are never rewritten by `append`,
/// `insert_at`, or a growing `replace`.
///
/// The serialized directory and header are **not** rewritten per mutation.
/// Mutations mark the archive dirty; [`Wad::flush`] (or [`Wad::close`], or
/// drop) writes the coalesced directory exactly once. Content appended after
/// a flush reuses the byte range of the previous directory table, so a crash
/// before the next flush can leave the stored header pointing at overwritten
/// table bytes; a strict reopen then fails with
/// [`WadError::CorruptDirectory`]. Only a flushed archive is stable on disk.
///
/// `delete` and `replace` leave orphaned byte ranges behind rather than
/// rewriting content; [`Wad::compact`] is the only operation that reclaims
/// them, and nothing invokes it implicitly.
///
/// An archive is not internally synchronized. One logical writer per
/// instance; cross-instance locking over the same file is the caller's
/// responsibility.
#[derive(Debug)]
pub struct Wad<B: Backend> {
    backend: B,
    directory: Directory,
    kind: WadKind,
    /// End of the content region; the directory table is written here.
    content_end: u64,
    dirty: bool,
    closed: bool,
    stats: ArchiveStats,
}

/// Archive held entirely in memory.
pub type WadBuffer = Wad<BufferBackend>;
/// Archive over a random-access file.
pub type WadFile = Wad<FileBackend>;
/// Read-only archive over a memory-mapped file.
pub type WadMap = Wad<MappedBackend>;

fn entry_in_bounds(entry: &Entry, archive_len: u64) -> bool {
    let offset = entry.offset as u64;
    if entry.is_marker() {
        // Markers carry a sentinel position; real files put anything from 0
        // to the archive length there.
        offset <= archive_len
    } else {
        offset >= Header::SIZE as u64 && offset + entry.length as u64 <= archive_len
    }
}

impl<B: Backend> Wad<B> {
    /// Build an archive over an already-populated backend: validate the
    /// header, parse the directory, and (eagerly) check every entry range.
    fn from_backend(mut backend: B, mode: OpenMode) -> Result<Self> {
        let archive_len = backend.len()?;
        if archive_len < Header::SIZE as u64 {
            return Err(WadError::MalformedHeader(format!(
                "{archive_len} bytes is too short for a header"
            )));
        }

        let mut head = [0u8; Header::SIZE];
        backend.read_at(0, &mut head)?;
        let header = Header::parse(&head)?;

        let dir_offset = header.dir_offset as u64;
        let table_len = header.entry_count as u64 * Entry::WIRE_SIZE as u64;
        if dir_offset < Header::SIZE as u64 || dir_offset + table_len > archive_len {
            return Err(WadError::MalformedHeader(format!(
                "directory table [{dir_offset}, +{table_len}) falls outside archive of {archive_len} bytes"
            )));
        }

        let mut table = vec![0u8; table_len as usize];
        backend.read_at(dir_offset, &mut table)?;
        let mut directory = Directory::parse(&table, header.entry_count as usize)?;

        match mode {
            OpenMode::Strict => {
                for (index, entry) in directory.iter().enumerate() {
                    if !entry_in_bounds(entry, archive_len) {
                        return Err(WadError::CorruptDirectory {
                            index,
                            reason: format!(
                                "range [{}, +{}) falls outside archive of {archive_len} bytes",
                                entry.offset, entry.length
                            ),
                        });
                    }
                }
            }
            OpenMode::BestEffort => {
                directory.retain(|entry| {
                    let keep = entry_in_bounds(entry, archive_len);
                    if !keep {
                        warn!(
                            "dropping out-of-range entry {} [{}, +{})",
                            entry.name, entry.offset, entry.length
                        );
                    }
                    keep
                });
            }
        }

        let mut content_end = dir_offset.max(Header::SIZE as u64);
        for entry in directory.iter() {
            content_end = content_end.max(entry.offset as u64 + entry.length as u64);
        }

        debug!(
            "opened {:?} archive: {} entries, directory at {dir_offset}",
            header.kind,
            directory.len()
        );

        Ok(Self {
            backend,
            directory,
            kind: header.kind,
            content_end,
            dirty: false,
            closed: false,
            stats: ArchiveStats::default(),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(WadError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if self.backend.writable() {
            Ok(())
        } else {
            Err(WadError::UnsupportedMutation)
        }
    }

    fn entry_at(&self, index: usize) -> Result<Entry> {
        self.directory
            .get(index)
            .copied()
            .ok_or(WadError::IndexOutOfRange {
                index,
                len: self.directory.len(),
            })
    }

    /// Write lump bytes at the end of the content region and advance it.
    fn write_content(&mut self, data: &[u8]) -> Result<u32> {
        let offset = self.content_end;
        let end = offset + data.len() as u64;
        if end > WIRE_LIMIT {
            return Err(WadError::TooLarge(end));
        }
        if !data.is_empty() {
            self.backend.write_at(offset, data)?;
        }
        self.content_end = end;
        self.stats.content_bytes_written += data.len() as u64;
        Ok(offset as u32)
    }

    // ---- read contract -----------------------------------------------

    /// The archive's role as declared by its magic.
    pub fn kind(&self) -> WadKind {
        self.kind
    }

    pub fn is_iwad(&self) -> bool {
        self.kind == WadKind::Iwad
    }

    pub fn is_pwad(&self) -> bool {
        self.kind == WadKind::Pwad
    }

    /// The directory, for the full lookup API.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn entry_count(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.directory.get(index)
    }

    pub fn entries(&self) -> std::slice::Iter<'_, Entry> {
        self.directory.iter()
    }

    /// First entry with this name, case-insensitive.
    pub fn find_entry(&self, name: &str) -> Option<&Entry> {
        self.directory.index_of(name).and_then(|i| self.directory.get(i))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.directory.index_of(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directory.index_of(name).is_some()
    }

    /// Read the raw bytes of the lump at `index`: exactly `entry.length`
    /// bytes, zero for markers.
    pub fn read_bytes(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entry_at(index)?;
        self.read_entry(&entry)
    }

    /// Read the raw bytes a directory entry describes.
    ///
    /// The range is re-checked against the live backend before reading, so
    /// an entry taken from a different archive fails with `CorruptArchive`
    /// instead of returning someone else's bytes.
    pub fn read_entry(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        self.ensure_open()?;
        if entry.is_marker() {
            return Ok(Vec::new());
        }
        let archive_len = self.backend.len()?;
        let (offset, length) = (entry.offset as u64, entry.length as u64);
        if !entry_in_bounds(entry, archive_len) {
            return Err(WadError::CorruptArchive {
                offset,
                length,
                archive_len,
            });
        }
        let mut buf = vec![0u8; entry.length as usize];
        self.backend.read_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Read the first lump with this name, if any.
    pub fn read_bytes_named(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.directory.index_of(name) {
            Some(index) => Ok(Some(self.read_bytes(index)?)),
            None => Ok(None),
        }
    }

    /// Open a bounded, forward-only stream over the lump at `index`.
    ///
    /// Streams own their cursor; any number may be open concurrently
    /// without disturbing each other.
    pub fn open_stream(&mut self, index: usize) -> Result<LumpReader> {
        Ok(LumpReader::new(self.read_bytes(index)?))
    }

    /// Open a stream over the lump a directory entry describes.
    pub fn open_entry_stream(&mut self, entry: &Entry) -> Result<LumpReader> {
        Ok(LumpReader::new(self.read_entry(entry)?))
    }

    // ---- mutation protocol -------------------------------------------

    /// Append a lump: bytes at the end of the content region, entry at the
    /// end of the directory. O(data length); never rewrites existing
    /// content.
    pub fn append(&mut self, name: &str, data: &[u8]) -> Result<Entry> {
        self.ensure_writable()?;
        let name = EntryName::new(name)?;
        let offset = self.write_content(data)?;
        let entry = Entry::new(name, offset, data.len() as u32);
        self.directory.push(entry);
        self.dirty = true;
        Ok(entry)
    }

    /// Append a lump's bytes but insert its entry at `index`, shifting
    /// later directory positions (not content).
    pub fn insert_at(&mut self, index: usize, name: &str, data: &[u8]) -> Result<Entry> {
        self.ensure_writable()?;
        if index > self.directory.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.directory.len(),
            });
        }
        let name = EntryName::new(name)?;
        let offset = self.write_content(data)?;
        let entry = Entry::new(name, offset, data.len() as u32);
        self.directory.insert(index, entry);
        self.dirty = true;
        Ok(entry)
    }

    /// Append several lumps as one batch. Every name is validated before
    /// the first byte is written, so an invalid name fails the whole batch
    /// and leaves the archive untouched.
    pub fn append_all(&mut self, lumps: &[(&str, &[u8])]) -> Result<Vec<Entry>> {
        self.ensure_writable()?;
        for (name, _) in lumps {
            EntryName::new(name)?;
        }
        let mut out = Vec::with_capacity(lumps.len());
        for (name, data) in lumps {
            out.push(self.append(name, data)?);
        }
        Ok(out)
    }

    /// Insert several lumps as one batch, keeping their relative order.
    /// Like [`Wad::append_all`], names and the index are validated before
    /// anything is written.
    pub fn insert_all_at(&mut self, index: usize, lumps: &[(&str, &[u8])]) -> Result<Vec<Entry>> {
        self.ensure_writable()?;
        if index > self.directory.len() {
            return Err(WadError::IndexOutOfRange {
                index,
                len: self.directory.len(),
            });
        }
        for (name, _) in lumps {
            EntryName::new(name)?;
        }
        let mut out = Vec::with_capacity(lumps.len());
        for (i, (name, data)) in lumps.iter().enumerate() {
            out.push(self.insert_at(index + i, name, data)?);
        }
        Ok(out)
    }

    /// Append a marker: a zero-length entry at the current end of the
    /// content region. Allocates no content space.
    pub fn add_marker(&mut self, name: &str) -> Result<Entry> {
        self.append(name, &[])
    }

    /// Insert a marker entry at `index`.
    pub fn insert_marker_at(&mut self, index: usize, name: &str) -> Result<Entry> {
        self.insert_at(index, name, &[])
    }

    /// Remove the entry at `index` and return it.
    ///
    /// The lump's bytes are not reclaimed; they become orphaned space. Only
    /// [`Wad::compact`] reclaims it.
    pub fn delete(&mut self, index: usize) -> Result<Entry> {
        self.ensure_writable()?;
        self.entry_at(index)?;
        let removed = self.directory.remove(index);
        self.stats.orphaned_bytes += removed.length as u64;
        self.dirty = true;
        Ok(removed)
    }

    /// Remove `count` entries starting at `index`. Bytes are orphaned, as
    /// with [`Wad::delete`].
    pub fn delete_range(&mut self, index: usize, count: usize) -> Result<()> {
        self.ensure_writable()?;
        if index
            .checked_add(count)
            .is_none_or(|end| end > self.directory.len())
        {
            return Err(WadError::IndexOutOfRange {
                index: index.saturating_add(count),
                len: self.directory.len(),
            });
        }
        for removed in self.directory.remove_range(index, count) {
            self.stats.orphaned_bytes += removed.length as u64;
        }
        self.dirty = true;
        Ok(())
    }

    /// Rename the entry at `index`. Directory-only edit.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<Entry> {
        self.ensure_writable()?;
        let entry = self.entry_at(index)?;
        let renamed = Entry::new(EntryName::new(new_name)?, entry.offset, entry.length);
        self.directory.set(index, renamed);
        self.dirty = true;
        Ok(renamed)
    }

    /// Replace the content of the entry at `index`, preserving its
    /// directory position.
    ///
    /// Shrink-or-equal payloads overwrite in place and orphan the trailing
    /// bytes; larger payloads are appended to the content region and the
    /// entry repointed, orphaning the whole old range.
    pub fn replace(&mut self, index: usize, data: &[u8]) -> Result<Entry> {
        self.ensure_writable()?;
        let entry = self.entry_at(index)?;
        let new_len = data.len() as u64;

        let updated = if new_len <= entry.length as u64 {
            if !data.is_empty() {
                self.backend.write_at(entry.offset as u64, data)?;
            }
            self.stats.orphaned_bytes += entry.length as u64 - new_len;
            self.stats.content_bytes_written += new_len;
            Entry::new(entry.name, entry.offset, new_len as u32)
        } else {
            let offset = self.write_content(data)?;
            self.stats.orphaned_bytes += entry.length as u64;
            Entry::new(entry.name, offset, data.len() as u32)
        };

        self.directory.set(index, updated);
        self.dirty = true;
        Ok(updated)
    }

    /// Replace the whole directory in one step (advanced callers reordering
    /// sections). Every entry must reference bytes inside the current
    /// content region.
    pub fn set_entries(&mut self, entries: Vec<Entry>) -> Result<()> {
        self.ensure_writable()?;
        for entry in &entries {
            if !entry_in_bounds(entry, self.content_end) {
                return Err(WadError::CorruptArchive {
                    offset: entry.offset as u64,
                    length: entry.length as u64,
                    archive_len: self.content_end,
                });
            }
        }
        self.directory.replace_all(entries);
        self.dirty = true;
        Ok(())
    }

    /// Rewrite the content region with only the bytes the directory still
    /// references, in directory order, then rewrite directory and header.
    ///
    /// O(live content). The only operation that reclaims orphaned space;
    /// no other mutation ever triggers it. Idempotent: compacting twice
    /// produces byte-identical archives. On the file backend the rewrite
    /// goes to a temporary file that atomically replaces the original, so a
    /// failure leaves the archive untouched.
    pub fn compact(&mut self) -> Result<()> {
        self.ensure_writable()?;

        let entries: Vec<Entry> = self.directory.iter().copied().collect();
        let mut image = vec![0u8; Header::SIZE];
        let mut rebuilt = Vec::with_capacity(entries.len());
        for entry in &entries {
            let data = self.read_entry(entry)?;
            let offset = image.len() as u32;
            image.extend_from_slice(&data);
            rebuilt.push(Entry::new(entry.name, offset, entry.length));
        }

        let dir_offset = image.len() as u64;
        let rebuilt = Directory::from_entries(rebuilt);
        image.extend_from_slice(&rebuilt.to_table_bytes());
        if image.len() as u64 > WIRE_LIMIT {
            return Err(WadError::TooLarge(image.len() as u64));
        }
        let header = Header {
            kind: self.kind,
            entry_count: rebuilt.len() as u32,
            dir_offset: dir_offset as u32,
        };
        image[..Header::SIZE].copy_from_slice(&header.to_bytes());

        let reclaimed = self.stats.orphaned_bytes;
        self.backend.replace_contents(image)?;
        self.directory = rebuilt;
        self.content_end = dir_offset;
        self.dirty = false;
        self.stats.directory_rewrites += 1;
        self.stats.orphaned_bytes = 0;
        debug!("compacted archive, reclaimed {reclaimed} orphaned bytes");
        Ok(())
    }

    /// Write the coalesced directory table and header.
    ///
    /// Content bytes are made durable before the directory that references
    /// them, so a crash mid-flush cannot produce an entry pointing at
    /// never-written bytes. A no-op when nothing changed since the last
    /// flush.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.dirty {
            return Ok(());
        }

        self.backend.flush()?;

        let table = self.directory.to_table_bytes();
        let dir_offset = self.content_end;
        let total = dir_offset + table.len() as u64;
        if total > WIRE_LIMIT {
            return Err(WadError::TooLarge(total));
        }
        self.backend.write_at(dir_offset, &table)?;
        let header = Header {
            kind: self.kind,
            entry_count: self.directory.len() as u32,
            dir_offset: dir_offset as u32,
        };
        self.backend.write_at(0, &header.to_bytes())?;
        self.backend.set_len(total)?;
        self.backend.flush()?;

        self.dirty = false;
        self.stats.directory_rewrites += 1;
        debug!(
            "flushed directory: {} entries at offset {dir_offset}",
            self.directory.len()
        );
        Ok(())
    }

    /// Flush pending changes (writable backends) and release the backend.
    /// Safe to call more than once; every later operation fails with
    /// [`WadError::Closed`].
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.backend.writable() && self.dirty {
            self.flush()?;
        }
        self.backend.close()?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Write-behavior counters (directory rewrites, orphaned bytes).
    pub fn stats(&self) -> ArchiveStats {
        self.stats
    }

    /// Size of the content region in bytes, orphaned ranges included.
    pub fn content_size(&self) -> u64 {
        self.content_end - Header::SIZE as u64
    }
}

impl<B: Backend> Drop for Wad<B> {
    fn drop(&mut self) {
        if !self.closed && self.backend.writable() && self.dirty {
            if let Err(e) = self.flush() {
                warn!("flush on drop failed: {e}");
            }
        }
    }
}

impl WadBuffer {
    /// Create an empty in-memory archive.
    pub fn new(kind: WadKind) -> Self {
        let header = Header {
            kind,
            entry_count: 0,
            dir_offset: Header::SIZE as u32,
        };
        Self {
            backend: BufferBackend::from_vec(header.to_bytes().to_vec()),
            directory: Directory::new(),
            kind,
            content_end: Header::SIZE as u64,
            dirty: false,
            closed: false,
            stats: ArchiveStats::default(),
        }
    }

    /// Parse an archive from serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, OpenMode::Strict)
    }

    pub fn from_bytes_with(bytes: &[u8], mode: OpenMode) -> Result<Self> {
        Self::from_backend(BufferBackend::from_vec(bytes.to_vec()), mode)
    }

    /// Read a whole archive file into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, OpenMode::Strict)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_backend(BufferBackend::from_vec(data), mode)
    }

    /// The serialized archive, flushing pending changes first.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        Ok(self.backend.as_slice().to_vec())
    }

    /// Write the serialized archive to a writer.
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        self.flush()?;
        writer.write_all(self.backend.as_slice())?;
        Ok(())
    }

    /// Persist the serialized archive to a file, overwriting it.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        std::fs::write(path, self.backend.as_slice())?;
        Ok(())
    }
}

impl WadFile {
    /// Create a new, empty archive file (a `PWAD`), truncating any existing
    /// file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with(path, WadKind::Pwad)
    }

    pub fn create_with<P: AsRef<Path>>(path: P, kind: WadKind) -> Result<Self> {
        let mut backend = FileBackend::create(path)?;
        let header = Header {
            kind,
            entry_count: 0,
            dir_offset: Header::SIZE as u32,
        };
        backend.write_at(0, &header.to_bytes())?;
        backend.flush()?;
        Ok(Self {
            backend,
            directory: Directory::new(),
            kind,
            content_end: Header::SIZE as u64,
            dirty: false,
            closed: false,
            stats: ArchiveStats::default(),
        })
    }

    /// Open an existing archive file for random access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, OpenMode::Strict)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::from_backend(FileBackend::open(path)?, mode)
    }

    pub fn path(&self) -> &Path {
        self.backend.path()
    }
}

impl WadMap {
    /// Memory-map an existing archive file, read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, OpenMode::Strict)
    }

    pub fn open_with<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::from_backend(MappedBackend::open(path)?, mode)
    }
}
