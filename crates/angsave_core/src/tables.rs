//! Live content tables the loader resolves references against.
//!
//! Slot 0 of the kind, artifact, ego and race tables is the blank entry, as
//! in the game data files. A slot with an empty name does not exist in this
//! build.

use serde::{Deserialize, Serialize};

use crate::types::OBJ_FLAG_WORDS;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectKind {
    pub name: String,
    pub tval: u8,
    pub sval: u8,
    pub to_h: i16,
    pub to_d: i16,
    pub to_a: i16,
    pub ac: i16,
    pub dd: u8,
    pub ds: u8,
    pub weight: i16,
    pub flags: [u32; OBJ_FLAG_WORDS],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifact {
    pub name: String,
    pub tval: u8,
    pub sval: u8,
    pub pval: i16,
    pub to_h: i16,
    pub to_d: i16,
    pub to_a: i16,
    pub ac: i16,
    pub dd: u8,
    pub ds: u8,
    pub weight: i16,
    pub cost: i32,
    pub flags: [u32; OBJ_FLAG_WORDS],
    pub level: u8,
    pub rarity: u8,
    pub effect: u16,
    pub time_base: u16,
    pub time_dice: u16,
    pub time_sides: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EgoItem {
    pub name: String,
    pub flags: [u32; OBJ_FLAG_WORDS],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterRace {
    pub name: String,
    pub flags: [u32; 3],
    pub spell_flags: [u32; 3],
}

/// Capacities of the live object and monster arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub o_max: usize,
    pub m_max: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            o_max: 512,
            m_max: 512,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentTables {
    pub kinds: Vec<ObjectKind>,
    pub artifacts: Vec<Artifact>,
    pub egos: Vec<EgoItem>,
    pub monster_races: Vec<MonsterRace>,
    pub player_races: Vec<String>,
    pub player_classes: Vec<String>,
    pub store_owners: usize,
    /// Options that are on unless the file says otherwise.
    pub default_options: Vec<usize>,
    pub limits: Limits,
    /// Version of the random artifact generator in this build.
    pub randart_version: u32,
}

impl ContentTables {
    /// Find the live kind index for a (tval, sval) pair. Index 0 is never
    /// returned.
    pub fn lookup_kind(&self, tval: u8, sval: u8) -> Option<usize> {
        self.kinds
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, k)| !k.name.is_empty() && k.tval == tval && k.sval == sval)
            .map(|(idx, _)| idx)
    }

    pub fn kind(&self, k_idx: usize) -> Option<&ObjectKind> {
        self.kinds.get(k_idx).filter(|k| !k.name.is_empty())
    }

    pub fn race_name(&self, index: u8) -> Option<&str> {
        self.player_races.get(index as usize).map(String::as_str)
    }

    pub fn class_name(&self, index: u8) -> Option<&str> {
        self.player_classes.get(index as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentTables, ObjectKind};

    fn kind(name: &str, tval: u8, sval: u8) -> ObjectKind {
        ObjectKind {
            name: name.to_string(),
            tval,
            sval,
            ..ObjectKind::default()
        }
    }

    #[test]
    fn lookup_skips_blank_and_unnamed_slots() {
        let tables = ContentTables {
            kinds: vec![
                kind("", 0, 0),
                kind("", 75, 1),
                kind("Potion of Speed", 75, 1),
            ],
            ..ContentTables::default()
        };

        assert_eq!(tables.lookup_kind(75, 1), Some(2));
        assert_eq!(tables.lookup_kind(75, 2), None);
        assert_eq!(tables.lookup_kind(0, 0), None);
        assert!(tables.kind(1).is_none());
    }

    #[test]
    fn tables_deserialize_with_defaults() {
        let json = r#"{
            "kinds": [{}, {"name": "Ration of Food", "tval": 80, "sval": 35, "weight": 8}],
            "player_races": ["Human"],
            "player_classes": ["Warrior"],
            "store_owners": 4,
            "limits": {"o_max": 64, "m_max": 32}
        }"#;
        let tables: ContentTables = serde_json::from_str(json).expect("tables should parse");
        assert_eq!(tables.lookup_kind(80, 35), Some(1));
        assert_eq!(tables.kinds[1].weight, 8);
        assert_eq!(tables.limits.m_max, 32);
        assert!(tables.artifacts.is_empty());
    }
}
