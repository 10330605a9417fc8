//! Loader for obfuscated, checksummed savefiles.
//!
//! [`SaveGame::load`] reads a file against live [`ContentTables`] and returns
//! the reconstructed game state, or a [`LoadError`] naming the phase that
//! failed. Front ends usually go through [`core_api`] instead.

pub mod cave;
pub mod core_api;
pub mod error;
pub mod item;
pub mod level;
pub mod link;
pub mod load;
pub mod monster;
pub mod player;
pub mod reader;
pub mod sections;
pub mod tables;
pub mod types;
pub mod version;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{DecodeError, ErrorKind, LoadError, Phase};
pub use level::{Level, LevelStatus, RegenReason};
pub use load::{LoadOptions, SaveGame};
pub use tables::ContentTables;
pub use version::FormatVersion;
