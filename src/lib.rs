//! Storage engine for Doom-engine WAD archives
//!
//! A WAD file is a container of named byte records ("lumps") plus a
//! directory describing them. This crate implements the storage engine:
//! the directory model, three interchangeable backends, and a mutation
//! protocol that keeps directory and byte storage consistent without
//! rewriting a multi-megabyte file on every change.
//!
//! - [`WadBuffer`] holds the whole archive in memory; best for building or
//!   bulk-editing an archive before persisting it once.
//! - [`WadFile`] works against a random-access file; appends are O(data)
//!   and the directory is rewritten once per [`Wad::flush`], not per call.
//! - [`WadMap`] memory-maps a file for read-mostly access; mutation is
//!   rejected by contract.
//!
//! Lump *contents* are never interpreted here. Format codecs implement
//! [`LumpCodec`] against the raw bytes and streams this crate hands out.
//!
//! ```no_run
//! use wad_storage::{Result, WadFile};
//!
//! fn main() -> Result<()> {
//!     let mut wad = WadFile::create("maps.wad")?;
//!     wad.add_marker("E1M1")?;
//!     wad.append("THINGS", &[0u8; 20])?;
//!     wad.append("VERTEXES", &[0u8; 16])?;
//!     wad.close()?; // one directory rewrite for the whole batch
//!     Ok(())
//! }
//! ```
//!
//! An archive instance is not internally synchronized: one logical writer
//! per instance, external serialization for shared use.

pub mod archive;
pub mod backend;
pub mod codec;
pub mod directory;
pub mod error;
pub mod header;
pub mod name;
pub mod types;

pub use archive::{LumpReader, Wad, WadBuffer, WadFile, WadMap};
pub use backend::{Backend, BufferBackend, FileBackend, MappedBackend};
pub use codec::LumpCodec;
pub use directory::{Directory, Direction, Entry, IndicesOf};
pub use error::{Result, WadError};
pub use header::Header;
pub use name::EntryName;
pub use types::{ArchiveStats, OpenMode, WadKind};
