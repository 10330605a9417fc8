use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChecksumKind, DecodeError, LoadError, Phase, Result};
use crate::item::ItemTables;
use crate::level::{Level, LevelStatus};
use crate::link::{link_floor_objects, link_held_objects};
use crate::player::{Player, read_player, read_player_hp, read_player_spells};
use crate::reader::ChecksumReader;
use crate::sections::{
    HistoryEntry, Inventory, KindMemory, MessageLog, Misc, MonsterLore, Options, Quest,
    RandartSource, RandartsSection, Randomizer, Squelch, Store, read_artifacts, read_dungeon,
    read_history, read_inventory, read_messages, read_misc, read_monster_memory, read_monsters,
    read_object_memory, read_objects, read_options, read_quests, read_randarts, read_randomizer,
    read_squelch, read_stores, skip_ghost,
};
use crate::tables::{Artifact, ContentTables};
use crate::types::OPT_ADULT_RANDARTS;
use crate::version::FormatVersion;

/// Number of legacy header bytes after the version, read through the cipher.
const HEADER_SKIP: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Keep a dead character's stored random artifacts.
    pub wizard: bool,
}

/// Everything a savefile reconstructs, ready for the game loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: FormatVersion,
    pub rng: Randomizer,
    pub options: Options,
    pub messages: MessageLog,
    pub monster_lore: Vec<MonsterLore>,
    pub kind_memory: Vec<KindMemory>,
    pub quests: Vec<Quest>,
    /// Copies in existence per artifact slot.
    pub artifact_counts: Vec<u8>,
    /// The artifact table items were resolved against.
    pub artifacts: Vec<Artifact>,
    pub randarts: RandartSource,
    pub player: Player,
    pub squelch: Squelch,
    pub misc: Misc,
    pub inventory: Inventory,
    pub stores: Vec<Store>,
    pub level: Level,
    pub history: Vec<HistoryEntry>,
}

impl SaveGame {
    /// Load a savefile from disk. The file is closed before this returns,
    /// whatever the outcome.
    pub fn load(
        path: impl AsRef<Path>,
        tables: &ContentTables,
        options: LoadOptions,
    ) -> std::result::Result<Self, LoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening savefile");
        let file = File::open(path).map_err(|e| LoadError::new(Phase::Header, e.into()))?;
        Self::parse(BufReader::new(file), tables, options)
    }

    /// Decode a complete savefile stream.
    pub fn parse<R: Read>(
        reader: R,
        tables: &ContentTables,
        options: LoadOptions,
    ) -> std::result::Result<Self, LoadError> {
        let mut r = ChecksumReader::new(reader);

        let version = in_phase(Phase::Header, || read_header(&mut r))?;
        info!(%version, "savefile version");

        let rng = in_phase(Phase::Randomizer, || read_randomizer(&mut r))?;
        let game_options = in_phase(Phase::Options, || read_options(&mut r, tables))?;
        let messages = in_phase(Phase::Messages, || read_messages(&mut r))?;
        let mut monster_lore = in_phase(Phase::MonsterMemory, || {
            read_monster_memory(&mut r, tables)
        })?;
        let kind_memory = in_phase(Phase::ObjectMemory, || read_object_memory(&mut r, tables))?;
        let quests = in_phase(Phase::Quests, || read_quests(&mut r))?;
        let artifact_counts = in_phase(Phase::Artifacts, || read_artifacts(&mut r, tables))?;

        let mut player = in_phase(Phase::Player, || read_player(&mut r, tables))?;
        let squelch = in_phase(Phase::Squelch, || read_squelch(&mut r, version, tables))?;
        let misc = in_phase(Phase::Misc, || read_misc(&mut r))?;
        player.player_hp = in_phase(Phase::PlayerHp, || read_player_hp(&mut r))?;
        player.spells = in_phase(Phase::PlayerSpells, || read_player_spells(&mut r))?;

        let randarts = in_phase(Phase::Randarts, || {
            read_randarts(
                &mut r,
                version,
                game_options.is_set(OPT_ADULT_RANDARTS),
                &misc,
                tables,
                options.wizard,
            )
        })?;
        let item_tables = ItemTables::new(tables, &randarts.artifacts);

        let inventory = in_phase(Phase::Inventory, || read_inventory(&mut r, item_tables))?;
        let stores = in_phase(Phase::Stores, || read_stores(&mut r, item_tables))?;

        let level = if misc.is_dead {
            debug!("character is dead, no level stored");
            Level::new(LevelStatus::PlayerDead)
        } else {
            let mut level = in_phase(Phase::Dungeon, || read_dungeon(&mut r))?;
            in_phase(Phase::Objects, || {
                read_objects(&mut r, &mut level, item_tables, tables.limits)
            })?;
            in_phase(Phase::Monsters, || {
                read_monsters(&mut r, &mut level, tables, tables.limits)?;
                if level.is_placed() {
                    link_floor_objects(&mut level)?;
                    link_held_objects(&mut level)?;
                }
                Ok(())
            })?;
            in_phase(Phase::Ghost, || skip_ghost(&mut r))?;
            level
        };

        let history = in_phase(Phase::History, || read_history(&mut r))?;
        in_phase(Phase::Checksum, || verify_checksums(&mut r))?;

        // No ghosts.
        if let Some(last) = monster_lore.last_mut() {
            last.max_num = 0;
        }

        info!(
            name = %player.name,
            level = player.lev,
            status = %level.status,
            bytes = r.position(),
            "savefile loaded"
        );

        let RandartsSection { artifacts, source } = randarts;
        Ok(Self {
            version,
            rng,
            options: game_options,
            messages,
            monster_lore,
            kind_memory,
            quests,
            artifact_counts,
            artifacts,
            randarts: source,
            player,
            squelch,
            misc,
            inventory,
            stores,
            level,
            history,
        })
    }
}

fn in_phase<T>(
    phase: Phase,
    decode: impl FnOnce() -> Result<T>,
) -> std::result::Result<T, LoadError> {
    debug!(%phase, "decoding");
    decode().map_err(|source| LoadError::new(phase, source))
}

/// Version bytes are stored in the clear; the fourth seeds the cipher.
fn read_header<R: Read>(r: &mut ChecksumReader<R>) -> Result<FormatVersion> {
    let [major, minor, patch, seed] = r.read_raw::<4>()?;
    r.reset(seed);
    r.skip(HEADER_SKIP)?;
    Ok(FormatVersion::new(major, minor, patch))
}

/// Each sum is snapshotted before its own stored value is read, so the
/// encoded sum covers the stored value sum's bytes.
fn verify_checksums<R: Read>(r: &mut ChecksumReader<R>) -> Result<()> {
    let computed = r.v_check();
    let stored = r.read_u32()?;
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch {
            kind: ChecksumKind::Value,
            stored,
            computed,
        });
    }

    let computed = r.x_check();
    let stored = r.read_u32()?;
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch {
            kind: ChecksumKind::Encoded,
            stored,
            computed,
        });
    }
    Ok(())
}
