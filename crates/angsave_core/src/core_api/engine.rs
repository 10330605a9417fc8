use std::io::Cursor;
use std::path::Path;

use crate::item::Item;
use crate::load::{LoadOptions, SaveGame};
use crate::sections::{HistoryEntry, Message};
use crate::tables::ContentTables;
use crate::types::{SEX_NAMES, STAT_NAMES};

use super::error::CoreError;
use super::types::{InventoryEntry, Snapshot, StatEntry};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine {
    options: LoadOptions,
}

#[derive(Debug)]
pub struct Session {
    snapshot: Snapshot,
    inventory: Vec<InventoryEntry>,
    save: SaveGame,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        tables: &ContentTables,
    ) -> Result<Session, CoreError> {
        let save = SaveGame::parse(Cursor::new(bytes.as_ref()), tables, self.options)?;
        Ok(Session::new(save, tables))
    }

    pub fn open_path(
        &self,
        path: impl AsRef<Path>,
        tables: &ContentTables,
    ) -> Result<Session, CoreError> {
        let save = SaveGame::load(path, tables, self.options)?;
        Ok(Session::new(save, tables))
    }
}

impl Session {
    fn new(save: SaveGame, tables: &ContentTables) -> Self {
        let snapshot = snapshot_from(&save, tables);
        let inventory = inventory_from(&save, tables);
        Self {
            snapshot,
            inventory,
            save,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn save(&self) -> &SaveGame {
        &self.save
    }

    pub fn into_save(self) -> SaveGame {
        self.save
    }

    /// Pack then equipment, with names resolved against the tables the
    /// session was opened with.
    pub fn inventory(&self) -> &[InventoryEntry] {
        &self.inventory
    }

    /// Oldest first.
    pub fn messages(&self) -> Vec<&Message> {
        self.save.messages.iter().collect()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.save.history
    }

    pub fn stats(&self) -> Vec<StatEntry> {
        let player = &self.save.player;
        STAT_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| StatEntry {
                index,
                name: (*name).to_string(),
                current: player.stat_cur[index],
                max: player.stat_max[index],
            })
            .collect()
    }
}

fn snapshot_from(save: &SaveGame, tables: &ContentTables) -> Snapshot {
    let player = &save.player;
    let name_or_index = |name: Option<&str>, index: u8| {
        name.map_or_else(|| format!("#{index}"), str::to_string)
    };

    Snapshot {
        character_name: player.name.clone(),
        race_index: player.race,
        race: name_or_index(tables.race_name(player.race), player.race),
        class_index: player.class,
        class: name_or_index(tables.class_name(player.class), player.class),
        sex_index: player.sex,
        sex: name_or_index(
            SEX_NAMES.get(usize::from(player.sex)).copied(),
            player.sex,
        ),
        level: player.lev,
        max_level: player.max_lev,
        experience: player.exp,
        max_experience: player.max_exp,
        gold: player.au,
        hp: player.chp,
        max_hp: player.mhp,
        depth: save.level.depth,
        max_depth: player.max_depth,
        turn: save.misc.turn,
        is_dead: save.misc.is_dead,
        died_from: (!player.died_from.is_empty()).then(|| player.died_from.clone()),
        version: save.version.to_string(),
        level_status: save.level.status.to_string(),
    }
}

fn inventory_from(save: &SaveGame, tables: &ContentTables) -> Vec<InventoryEntry> {
    let pack = save.inventory.pack().enumerate();
    let equipment = save.inventory.equipment();

    pack.map(|(slot, item)| entry(save, tables, slot, false, item))
        .chain(equipment.map(|(slot, item)| entry(save, tables, slot, true, item)))
        .collect()
}

fn entry(
    save: &SaveGame,
    tables: &ContentTables,
    slot: usize,
    equipped: bool,
    item: &Item,
) -> InventoryEntry {
    let named = |name: &str| (!name.is_empty()).then(|| name.to_string());
    InventoryEntry {
        slot,
        equipped,
        name: tables
            .kind(item.k_idx)
            .map_or_else(|| format!("kind #{}", item.k_idx), |k| k.name.clone()),
        quantity: item.number,
        weight: item.total_weight(),
        artifact: (item.name1 != 0)
            .then(|| save.artifacts.get(usize::from(item.name1)))
            .flatten()
            .and_then(|a| named(&a.name)),
        ego: (item.name2 != 0)
            .then(|| tables.egos.get(usize::from(item.name2)))
            .flatten()
            .and_then(|e| named(&e.name)),
        inscription: item.inscription.clone(),
    }
}
