use std::fmt;
use std::iter;

use serde::{Deserialize, Serialize};

use crate::cave::Cave;
use crate::error::{DecodeError, Result};
use crate::item::Item;
use crate::monster::Monster;

/// Why a stored level was discarded instead of rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegenReason {
    IllegalDepth { depth: i16 },
    DimensionMismatch { height: i16, width: i16 },
}

impl fmt::Display for RegenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalDepth { depth } => write!(f, "illegal dungeon depth {depth}"),
            Self::DimensionMismatch { height, width } => {
                write!(f, "dungeon size {height}x{width} does not fit this build")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LevelStatus {
    /// Terrain, objects and monsters were rebuilt and linked.
    Placed,
    /// The caller must generate a fresh level.
    Regenerate { reason: RegenReason },
    /// The character is dead; the file carries no level.
    PlayerDead,
}

impl fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed => f.write_str("placed"),
            Self::Regenerate { reason } => write!(f, "regenerate ({reason})"),
            Self::PlayerDead => f.write_str("player dead"),
        }
    }
}

/// The reconstructed level. Both arenas reserve index 0 as "none".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub status: LevelStatus,
    pub depth: i16,
    pub py: i16,
    pub px: i16,
    pub cave: Cave,
    /// Object arena. A `None` slot held an object whose kind no longer exists.
    pub objects: Vec<Option<Item>>,
    pub monsters: Vec<Option<Monster>>,
}

impl Level {
    pub fn new(status: LevelStatus) -> Self {
        Self {
            status,
            depth: 0,
            py: 0,
            px: 0,
            cave: Cave::new(),
            objects: vec![None],
            monsters: vec![None],
        }
    }

    pub fn is_placed(&self) -> bool {
        self.status == LevelStatus::Placed
    }

    pub fn object(&self, o_idx: usize) -> Option<&Item> {
        self.objects.get(o_idx).and_then(Option::as_ref)
    }

    pub fn monster(&self, m_idx: usize) -> Option<&Monster> {
        self.monsters.get(m_idx).and_then(Option::as_ref)
    }

    pub fn monster_count(&self) -> usize {
        self.monsters.iter().flatten().count()
    }

    pub fn object_count(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    /// Put a monster in the next arena slot and mark its cell.
    pub fn place_monster(&mut self, monster: Monster) -> Result<usize> {
        let (y, x) = (usize::from(monster.fy), usize::from(monster.fx));
        let placement = DecodeError::Placement {
            what: "monster",
            y: i32::from(monster.fy),
            x: i32::from(monster.fx),
        };
        if !Cave::in_bounds(y as i32, x as i32) || self.cave.m_idx(y, x) != 0 {
            return Err(placement);
        }
        let m_idx = self.monsters.len();
        let marker = i16::try_from(m_idx)
            .map_err(|_| DecodeError::overflow("monsters", m_idx, i16::MAX as usize))?;
        self.cave.set_m_idx(y, x, marker);
        self.monsters.push(Some(monster));
        Ok(m_idx)
    }

    /// Object indices in the pile at (y, x), top first.
    pub fn floor_pile(&self, y: usize, x: usize) -> Vec<usize> {
        self.chain(self.cave.o_idx(y, x))
    }

    /// Object indices carried by a monster, most recent first.
    pub fn hoard(&self, m_idx: usize) -> Vec<usize> {
        let head = self.monster(m_idx).map_or(0, |m| m.hold_o_idx);
        self.chain(head)
    }

    fn chain(&self, head: usize) -> Vec<usize> {
        iter::successors(Some(head), |&o_idx| self.object(o_idx).map(|o| o.next_o_idx))
            .take_while(|&o_idx| o_idx != 0)
            .take(self.objects.len())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, LevelStatus, RegenReason};
    use crate::error::ErrorKind;
    use crate::monster::Monster;

    fn monster_at(fy: u8, fx: u8) -> Monster {
        Monster {
            r_idx: 1,
            fy,
            fx,
            ..Monster::default()
        }
    }

    #[test]
    fn monsters_get_ascending_slots() {
        let mut level = Level::new(LevelStatus::Placed);
        assert_eq!(level.place_monster(monster_at(3, 4)).unwrap(), 1);
        assert_eq!(level.place_monster(monster_at(3, 5)).unwrap(), 2);
        assert_eq!(level.cave.m_idx(3, 5), 2);
        assert_eq!(level.monster_count(), 2);
    }

    #[test]
    fn occupied_or_outside_cells_reject_monsters() {
        let mut level = Level::new(LevelStatus::Placed);
        level.cave.place_player(3, 4).unwrap();
        let err = level.place_monster(monster_at(3, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);

        let err = level.place_monster(monster_at(200, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);
        assert_eq!(level.monsters.len(), 1);
    }

    #[test]
    fn status_text() {
        let status = LevelStatus::Regenerate {
            reason: RegenReason::DimensionMismatch {
                height: 40,
                width: 80,
            },
        };
        assert_eq!(
            status.to_string(),
            "regenerate (dungeon size 40x80 does not fit this build)"
        );
        assert_eq!(LevelStatus::PlayerDead.to_string(), "player dead");
    }
}
