use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub character_name: String,
    pub race_index: u8,
    pub race: String,
    pub class_index: u8,
    pub class: String,
    pub sex_index: u8,
    pub sex: String,
    pub level: i16,
    pub max_level: i16,
    pub experience: i32,
    pub max_experience: i32,
    pub gold: i32,
    pub hp: i16,
    pub max_hp: i16,
    pub depth: i16,
    pub max_depth: i16,
    pub turn: i32,
    pub is_dead: bool,
    pub died_from: Option<String>,
    pub version: String,
    pub level_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatEntry {
    pub index: usize,
    pub name: String,
    pub current: i16,
    pub max: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryEntry {
    pub slot: usize,
    pub equipped: bool,
    pub name: String,
    pub quantity: u8,
    pub weight: i32,
    pub artifact: Option<String>,
    pub ego: Option<String>,
    pub inscription: Option<String>,
}
