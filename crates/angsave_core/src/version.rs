use std::fmt;

use serde::{Deserialize, Serialize};

/// Savefile format version, read once from the stream header.
///
/// Every version-dependent branch in the loader goes through one of the
/// named predicates below rather than comparing raw tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FormatVersion {
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True iff this version sorts strictly before `major.minor.patch`.
    pub fn older_than(&self, major: u8, minor: u8, patch: u8) -> bool {
        (self.major, self.minor, self.patch) < (major, minor, patch)
    }

    /// 3.0.14 and later carry random artifacts inline; earlier files only
    /// store the seed and expect the generator to rebuild them.
    pub fn stores_randarts_inline(&self) -> bool {
        !self.older_than(3, 0, 14)
    }

    /// The ego-item "seen" table appears in the squelch block of every 3.0.x
    /// file except 3.0.9.
    pub fn has_ego_squelch_table(&self) -> bool {
        self.major == 3 && self.minor == 0 && self.patch != 9
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
