//! Common types used throughout the WAD storage engine

/// Role of a WAD archive, as declared by its 4-byte magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadKind {
    /// `IWAD`: a primary (standalone) archive.
    Iwad,
    /// `PWAD`: a patch archive layered over a primary one.
    Pwad,
}

impl WadKind {
    /// The on-wire magic tag for this kind.
    pub fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Iwad => b"IWAD",
            Self::Pwad => b"PWAD",
        }
    }

    /// Match a 4-byte magic tag. Case-sensitive.
    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        if magic == b"IWAD" {
            Some(Self::Iwad)
        } else if magic == b"PWAD" {
            Some(Self::Pwad)
        } else {
            None
        }
    }
}

/// How strictly `open` treats a directory whose entries fall outside the
/// archive's byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Fail the open with `CorruptDirectory` on the first bad entry.
    #[default]
    Strict,
    /// Drop out-of-range entries and keep the rest. Never the default;
    /// callers opt into partial recovery explicitly.
    BestEffort,
}

/// Counters describing an archive's write behavior.
///
/// `directory_rewrites` counts serialized directory/header rewrites, which
/// are deferred and coalesced: a batch of mutations followed by one
/// `flush`/`close` bumps it once. `orphaned_bytes` tracks content made
/// unreachable by `delete`/`replace`; only `compact` resets it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    pub directory_rewrites: u64,
    pub orphaned_bytes: u64,
    pub content_bytes_written: u64,
}
