//! The ordered lump directory

mod entry;

pub use entry::Entry;

use crate::error::{Result, WadError};

/// Scan direction for name lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First match at or after the starting index.
    Forward,
    /// Last match at or before the starting index.
    Backward,
}

/// An ordered sequence of [`Entry`] records.
///
/// Insertion order is significant and observable; it mirrors the on-disk
/// directory order, which is independent of where lump bytes sit in the
/// content region. The directory performs no I/O of its own beyond
/// (de)serializing its wire table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<Entry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Parse a serialized directory table of `count` 16-byte records.
    pub fn parse(table: &[u8], count: usize) -> Result<Self> {
        if table.len() < count * Entry::WIRE_SIZE {
            return Err(WadError::CorruptDirectory {
                index: table.len() / Entry::WIRE_SIZE,
                reason: "directory table truncated".to_string(),
            });
        }
        let mut entries = Vec::with_capacity(count);
        for (index, record) in table.chunks_exact(Entry::WIRE_SIZE).take(count).enumerate() {
            let entry = Entry::parse_wire(record)
                .map_err(|reason| WadError::CorruptDirectory { index, reason })?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Serialize the table in current order.
    pub fn to_table_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * Entry::WIRE_SIZE);
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_wire());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Directional name scan, case-insensitive.
    ///
    /// `Forward` finds the first match at or after `from`; `Backward` finds
    /// the last match at or before `from`. `from` past the end is clamped
    /// for backward scans and yields no forward match.
    pub fn find(&self, name: &str, from: usize, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => (from..self.entries.len())
                .find(|&i| self.entries[i].name.matches(name)),
            Direction::Backward => {
                let start = from.min(self.entries.len().checked_sub(1)?);
                (0..=start).rev().find(|&i| self.entries[i].name.matches(name))
            }
        }
    }

    /// Index of the first entry with this name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.find(name, 0, Direction::Forward)
    }

    /// Index of the first entry with this name at or after `from`.
    pub fn index_of_from(&self, name: &str, from: usize) -> Option<usize> {
        self.find(name, from, Direction::Forward)
    }

    /// Index of the last entry with this name.
    pub fn last_index_of(&self, name: &str) -> Option<usize> {
        self.find(name, self.entries.len().saturating_sub(1), Direction::Backward)
    }

    /// Lazy iterator over every index whose entry has this name, in
    /// directory order. The iterator is `Clone`, so a scan can be restarted.
    pub fn indices_of<'a>(&'a self, name: &'a str) -> IndicesOf<'a> {
        IndicesOf {
            entries: &self.entries,
            name,
            next: 0,
        }
    }

    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub(crate) fn insert(&mut self, index: usize, entry: Entry) {
        self.entries.insert(index, entry);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    pub(crate) fn remove_range(&mut self, index: usize, count: usize) -> Vec<Entry> {
        self.entries.drain(index..index + count).collect()
    }

    pub(crate) fn set(&mut self, index: usize, entry: Entry) {
        self.entries[index] = entry;
    }

    pub(crate) fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Entry) -> bool) {
        self.entries.retain(keep);
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Iterator returned by [`Directory::indices_of`].
#[derive(Debug, Clone)]
pub struct IndicesOf<'a> {
    entries: &'a [Entry],
    name: &'a str,
    next: usize,
}

impl Iterator for IndicesOf<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.entries.len() {
            let index = self.next;
            self.next += 1;
            if self.entries[index].name.matches(self.name) {
                return Some(index);
            }
        }
        None
    }
}
