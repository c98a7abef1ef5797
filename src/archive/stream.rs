//! Bounded lump streams

use std::io::{Cursor, Read};

/// A bounded, forward-only byte stream over one lump.
///
/// Each reader owns its cursor, so any number of streams over the same
/// archive read independently. The stream covers exactly the lump's
/// `[offset, offset + length)` range; reading past the end yields EOF even
/// when the archive has more bytes beyond it.
#[derive(Debug)]
pub struct LumpReader {
    data: Cursor<Vec<u8>>,
}

impl LumpReader {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cursor::new(data),
        }
    }

    /// Bytes left before EOF.
    pub fn remaining(&self) -> u64 {
        self.data.get_ref().len() as u64 - self.data.position()
    }
}

impl Read for LumpReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}
