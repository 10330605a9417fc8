use std::fmt;
use std::io;

use thiserror::Error;

/// Ordered load phases. The orchestrator runs them strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Randomizer,
    Options,
    Messages,
    MonsterMemory,
    ObjectMemory,
    Quests,
    Artifacts,
    Player,
    Squelch,
    Misc,
    PlayerHp,
    PlayerSpells,
    Randarts,
    Inventory,
    Stores,
    Dungeon,
    Objects,
    Monsters,
    Ghost,
    History,
    Checksum,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Randomizer => "randomizer",
            Self::Options => "options",
            Self::Messages => "messages",
            Self::MonsterMemory => "monster memory",
            Self::ObjectMemory => "object memory",
            Self::Quests => "quests",
            Self::Artifacts => "artifacts",
            Self::Player => "player",
            Self::Squelch => "squelch",
            Self::Misc => "misc",
            Self::PlayerHp => "player hp",
            Self::PlayerSpells => "player spells",
            Self::Randarts => "random artifacts",
            Self::Inventory => "inventory",
            Self::Stores => "stores",
            Self::Dungeon => "dungeon",
            Self::Objects => "objects",
            Self::Monsters => "monsters",
            Self::Ghost => "ghost",
            Self::History => "history",
            Self::Checksum => "checksum",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// Sum of deciphered bytes.
    Value,
    /// Sum of raw (encoded) bytes.
    Encoded,
}

/// Failure raised by a single decoder. Every variant is fatal for the load.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("too many {what}: {count} exceeds capacity {capacity}")]
    StructuralOverflow {
        what: &'static str,
        count: usize,
        capacity: usize,
    },

    #[error("invalid {what} index {index} (limit {limit})")]
    InvalidReference {
        what: &'static str,
        index: i64,
        limit: usize,
    },

    #[error("invalid {field} ({value})")]
    InvalidField { field: &'static str, value: i64 },

    #[error("incompatible random artifacts version {found:#x}, expected {expected:#x}")]
    IncompatibleRandarts { found: u32, expected: u32 },

    #[error("cannot place {what} at ({y},{x})")]
    Placement { what: &'static str, y: i32, x: i32 },

    #[error("invalid {kind} checksum: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        kind: ChecksumKind,
        stored: u32,
        computed: u32,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Encoded => f.write_str("encoded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StructuralOverflow,
    InvalidReference,
    InvalidField,
    IncompatibleRandarts,
    Placement,
    ChecksumMismatch,
    Io,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StructuralOverflow { .. } => ErrorKind::StructuralOverflow,
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::InvalidField { .. } => ErrorKind::InvalidField,
            Self::IncompatibleRandarts { .. } => ErrorKind::IncompatibleRandarts,
            Self::Placement { .. } => ErrorKind::Placement,
            Self::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn overflow(what: &'static str, count: usize, capacity: usize) -> Self {
        Self::StructuralOverflow {
            what,
            count,
            capacity,
        }
    }

    pub(crate) fn reference(what: &'static str, index: impl Into<i64>, limit: usize) -> Self {
        Self::InvalidReference {
            what,
            index: index.into(),
            limit,
        }
    }

    pub(crate) fn field(field: &'static str, value: impl Into<i64>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// A failed load: the phase that aborted it and why.
#[derive(Debug, Error)]
#[error("failed to load savefile ({phase}): {source}")]
pub struct LoadError {
    pub phase: Phase,
    #[source]
    pub source: DecodeError,
}

impl LoadError {
    pub fn new(phase: Phase, source: DecodeError) -> Self {
        Self { phase, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// True when every record decoded but a trailing checksum disagreed.
    pub fn is_corrupt(&self) -> bool {
        self.kind() == ErrorKind::ChecksumMismatch
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
