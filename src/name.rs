//! Entry names: 8-byte padded ASCII identifiers

use crate::error::{Result, WadError};
use std::fmt;

/// Number of bytes a name occupies in a directory record.
pub const NAME_LEN: usize = 8;

/// The name of a directory entry.
///
/// Stored space-padded to 8 bytes, the way it appears on the wire. Valid
/// names are 1-8 characters from `A-Z 0-9 [ ] - _ \`. Equality and hashing
/// are exact (case-sensitive); directory lookup goes through
/// [`EntryName::matches`], which ignores ASCII case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryName([u8; NAME_LEN]);

impl EntryName {
    /// Create a name from a string, validating it against the naming rules.
    pub fn new(name: &str) -> Result<Self> {
        if !is_valid_entry_name(name) {
            return Err(WadError::InvalidName(name.to_string()));
        }
        let mut raw = [b' '; NAME_LEN];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self(raw))
    }

    /// Create a name from the 8 raw bytes of a directory record.
    ///
    /// Trailing spaces and NULs are both treated as padding (real files pad
    /// with either), and the remainder is normalized into a valid name.
    pub fn from_wire(raw: [u8; NAME_LEN]) -> Self {
        let end = raw
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_LEN);
        let trimmed: &[u8] = &raw[..end];
        let text: String = trimmed
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '-' })
            .collect();
        let name = to_valid_entry_name(text.trim_end_matches(' '));
        let mut out = [b' '; NAME_LEN];
        out[..name.len()].copy_from_slice(name.as_bytes());
        Self(out)
    }

    /// The name as it appears in a serialized directory record.
    pub fn wire_bytes(&self) -> [u8; NAME_LEN] {
        self.0
    }

    /// The name with padding removed.
    pub fn as_str(&self) -> &str {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |p| p + 1);
        std::str::from_utf8(&self.0[..end]).unwrap_or("-")
    }

    /// Case-insensitive comparison against a plain string.
    pub fn matches(&self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryName({:?})", self.as_str())
    }
}

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '[' | ']' | '-' | '_' | '\\')
}

/// Tests if a string is a valid entry name: 1-8 characters, each one of
/// `A-Z 0-9 [ ] - _ \` (uppercase only).
pub fn is_valid_entry_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= NAME_LEN && name.chars().all(is_valid_name_char)
}

/// Converts an arbitrary string into a valid entry name.
///
/// Lowercase letters are uppercased, unknown characters become dashes, the
/// result is cut at the first NUL and truncated to 8 characters. An empty
/// input becomes `-`.
pub fn to_valid_entry_name(name: &str) -> String {
    if is_valid_entry_name(name) {
        return name.to_string();
    }
    if name.is_empty() {
        return "-".to_string();
    }

    let mut out = String::with_capacity(NAME_LEN);
    for c in name.chars().take(NAME_LEN) {
        if c == '\0' {
            break;
        }
        let c = c.to_ascii_uppercase();
        out.push(if is_valid_name_char(c) { c } else { '-' });
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}
