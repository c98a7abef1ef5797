//! The fixed 12-byte archive header

use crate::error::{Result, WadError};
use crate::types::WadKind;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Parsed archive header: magic, entry count, directory offset.
///
/// Wire form is 12 bytes: 4-byte magic (`IWAD` or `PWAD`), `i32` LE entry
/// count, `i32` LE byte offset of the directory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: WadKind,
    pub entry_count: u32,
    pub dir_offset: u32,
}

impl Header {
    /// Size of the serialized header in bytes.
    pub const SIZE: usize = 12;

    /// Parse a header from the first [`Header::SIZE`] bytes of an archive.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < Self::SIZE {
            return Err(WadError::MalformedHeader(format!(
                "{} bytes is too short for a header",
                raw.len()
            )));
        }

        let kind = WadKind::from_magic(&raw[0..4]).ok_or_else(|| {
            WadError::MalformedHeader(format!(
                "unrecognized magic {:?}",
                String::from_utf8_lossy(&raw[0..4])
            ))
        })?;

        let mut cursor = Cursor::new(&raw[4..Self::SIZE]);
        let entry_count = cursor.read_i32::<LittleEndian>()?;
        let dir_offset = cursor.read_i32::<LittleEndian>()?;
        if entry_count < 0 {
            return Err(WadError::MalformedHeader(format!(
                "negative entry count {entry_count}"
            )));
        }
        if dir_offset < 0 {
            return Err(WadError::MalformedHeader(format!(
                "negative directory offset {dir_offset}"
            )));
        }

        Ok(Self {
            kind,
            entry_count: entry_count as u32,
            dir_offset: dir_offset as u32,
        })
    }

    /// Serialize the header to its wire form.
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = Vec::with_capacity(Self::SIZE);
        out.extend_from_slice(self.kind.magic());
        // Counts fit in i32 by construction; the façade enforces the wire limit.
        let _ = out.write_i32::<LittleEndian>(self.entry_count as i32);
        let _ = out.write_i32::<LittleEndian>(self.dir_offset as i32);
        let mut raw = [0u8; Self::SIZE];
        raw.copy_from_slice(&out);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pwad() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"PWAD");
        raw.extend_from_slice(&7i32.to_le_bytes());
        raw.extend_from_slice(&1024i32.to_le_bytes());

        let header = Header::parse(&raw).unwrap();
        assert_eq!(header.kind, WadKind::Pwad);
        assert_eq!(header.entry_count, 7);
        assert_eq!(header.dir_offset, 1024);
    }

    #[test]
    fn round_trip() {
        let header = Header {
            kind: WadKind::Iwad,
            entry_count: 3,
            dir_offset: 12,
        };
        assert_eq!(Header::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut raw = b"WAD2".to_vec();
        raw.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            Header::parse(&raw),
            Err(WadError::MalformedHeader(_))
        ));
    }

    #[test]
    fn rejects_lowercase_magic() {
        let mut raw = b"pwad".to_vec();
        raw.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            Header::parse(&raw),
            Err(WadError::MalformedHeader(_))
        ));
    }

    #[test]
    fn rejects_negative_count() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"IWAD");
        raw.extend_from_slice(&(-1i32).to_le_bytes());
        raw.extend_from_slice(&12i32.to_le_bytes());
        assert!(matches!(
            Header::parse(&raw),
            Err(WadError::MalformedHeader(_))
        ));
    }
}
