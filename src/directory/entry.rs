//! Directory entries: name, offset, length

use crate::name::{EntryName, NAME_LEN};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// One directory record describing a lump.
///
/// An entry carries no data; it describes where a lump's bytes live in the
/// archive that produced it. Entries from one archive are meaningless
/// against another. Duplicate names are permitted; an entry's identity is
/// its position in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Lump name.
    pub name: EntryName,
    /// Byte offset of the lump content within the archive.
    pub offset: u32,
    /// Content length in bytes. Zero denotes a marker.
    pub length: u32,
}

impl Entry {
    /// Size of one serialized directory record.
    pub const WIRE_SIZE: usize = 16;

    pub fn new(name: EntryName, offset: u32, length: u32) -> Self {
        Self {
            name,
            offset,
            length,
        }
    }

    /// Markers are zero-length entries used as positional delimiters.
    pub fn is_marker(&self) -> bool {
        self.length == 0
    }

    /// Parse one 16-byte wire record. Returns the failure reason on
    /// negative offset or length; the directory attaches the entry index.
    pub(crate) fn parse_wire(raw: &[u8]) -> std::result::Result<Self, String> {
        debug_assert!(raw.len() >= Self::WIRE_SIZE);
        let mut cursor = Cursor::new(raw);
        let offset = cursor
            .read_i32::<LittleEndian>()
            .map_err(|e| e.to_string())?;
        let length = cursor
            .read_i32::<LittleEndian>()
            .map_err(|e| e.to_string())?;
        if offset < 0 {
            return Err(format!("negative offset {offset}"));
        }
        if length < 0 {
            return Err(format!("negative length {length}"));
        }
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&raw[8..Self::WIRE_SIZE]);
        Ok(Self {
            name: EntryName::from_wire(name),
            offset: offset as u32,
            length: length as u32,
        })
    }

    /// Serialize to the 16-byte wire record.
    pub fn to_wire(&self) -> [u8; Self::WIRE_SIZE] {
        let mut raw = [0u8; Self::WIRE_SIZE];
        raw[0..4].copy_from_slice(&(self.offset as i32).to_le_bytes());
        raw[4..8].copy_from_slice(&(self.length as i32).to_le_bytes());
        raw[8..].copy_from_slice(&self.name.wire_bytes());
        raw
    }
}
