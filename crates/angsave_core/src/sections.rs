use std::collections::VecDeque;
use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cave::{self, Cave};
use crate::error::{DecodeError, Result};
use crate::item::{Item, ItemTables, read_item};
use crate::level::{Level, LevelStatus, RegenReason};
use crate::monster::read_monster;
use crate::reader::ChecksumReader;
use crate::tables::{Artifact, ContentTables, Limits};
use crate::types::{
    ANGBAND_TERM_MAX, AUTO_INSCRIPTION_LEN, DUNGEON_HGT, DUNGEON_WID, GHOST_NAME_LEN,
    HISTORY_TEXT_LEN, INVEN_PACK, INVEN_TOTAL, INVEN_WIELD, INVENTORY_END, MAX_DEPTH, MAX_Q_IDX,
    MAX_STORES, MESSAGE_LEN, MESSAGE_MAX, MONSTER_BLOW_MAX, OBJ_FLAG_WORDS, OPT_MAX, OPT_WORDS,
    RACE_FLAG_WORDS, RACE_SPELL_FLAG_WORDS, RAND_DEG, SQUELCH_BYTES, STORE_INVEN_MAX,
    WINDOW_FLAG_VALID,
};
use crate::version::FormatVersion;

// --- Randomizer ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Randomizer {
    pub place: u16,
    pub state: Vec<u32>,
}

pub fn read_randomizer<R: Read>(r: &mut ChecksumReader<R>) -> Result<Randomizer> {
    r.read_u16()?;
    let place = r.read_u16()?;
    if usize::from(place) >= RAND_DEG {
        return Err(DecodeError::field("randomizer position", place));
    }
    let state = (0..RAND_DEG)
        .map(|_| r.read_u32())
        .collect::<std::io::Result<Vec<_>>>()?;
    Ok(Randomizer { place, state })
}

// --- Options ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub delay_factor: u8,
    pub hitpoint_warn: u8,
    pub lazymove_delay: u16,
    pub opt: Vec<bool>,
    pub window_flags: [u32; ANGBAND_TERM_MAX],
}

impl Options {
    pub fn is_set(&self, index: usize) -> bool {
        self.opt.get(index).copied().unwrap_or(false)
    }
}

pub fn read_options<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: &ContentTables,
) -> Result<Options> {
    r.skip(16)?;

    let delay_factor = r.read_u8()?;
    let hitpoint_warn = r.read_u8()?;
    let lazymove_delay = match r.read_u16()? {
        delay if delay < 1000 => delay,
        _ => 0,
    };

    let flags = r.read_u32_array::<OPT_WORDS>()?;
    let masks = r.read_u32_array::<OPT_WORDS>()?;

    let mut opt = vec![false; OPT_MAX];
    for &index in &tables.default_options {
        if let Some(slot) = opt.get_mut(index) {
            *slot = true;
        }
    }
    for (i, slot) in opt.iter_mut().enumerate() {
        let bit = 1u32 << (i % 32);
        if masks[i / 32] & bit != 0 {
            *slot = flags[i / 32] & bit != 0;
        }
    }

    let mut window_flags = r.read_u32_array::<ANGBAND_TERM_MAX>()?;
    let window_masks = r.read_u32_array::<ANGBAND_TERM_MAX>()?;
    for (flag, mask) in window_flags.iter_mut().zip(window_masks) {
        *flag &= !(WINDOW_FLAG_VALID & !mask);
    }

    Ok(Options {
        delay_factor,
        hitpoint_warn,
        lazymove_delay,
        opt,
        window_flags,
    })
}

// --- Messages ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub kind: u16,
}

/// Message log holding at most [`MESSAGE_MAX`] entries; older ones fall off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    entries: VecDeque<Message>,
}

impl MessageLog {
    pub fn push(&mut self, message: Message) {
        if self.entries.len() == MESSAGE_MAX {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }
}

pub fn read_messages<R: Read>(r: &mut ChecksumReader<R>) -> Result<MessageLog> {
    let count = r.read_i16()?;
    let mut log = MessageLog::default();
    for _ in 0..count.max(0) {
        let text = r.read_string(MESSAGE_LEN)?;
        let kind = r.read_u16()?;
        log.push(Message { text, kind });
    }
    Ok(log)
}

// --- Monster memory ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterLore {
    pub sights: i16,
    pub deaths: i16,
    pub pkills: i16,
    pub tkills: i16,
    pub wake: u8,
    pub ignore: u8,
    pub drop_gold: u8,
    pub drop_item: u8,
    pub cast_innate: u8,
    pub cast_spell: u8,
    pub blows: [u8; MONSTER_BLOW_MAX],
    pub flags: [u32; RACE_FLAG_WORDS],
    pub spell_flags: [u32; RACE_SPELL_FLAG_WORDS],
    /// Per-level population limit of the race.
    pub max_num: u8,
}

/// Lore for every live race; races the file does not cover keep defaults.
pub fn read_monster_memory<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: &ContentTables,
) -> Result<Vec<MonsterLore>> {
    let races = &tables.monster_races;
    let count = usize::from(r.read_u16()?);
    if count > races.len() {
        return Err(DecodeError::overflow("monster races", count, races.len()));
    }

    let mut lore = vec![MonsterLore::default(); races.len()];
    for (entry, race) in lore.iter_mut().zip(races).take(count) {
        entry.sights = r.read_i16()?;
        entry.deaths = r.read_i16()?;
        entry.pkills = r.read_i16()?;
        entry.tkills = r.read_i16()?;
        entry.wake = r.read_u8()?;
        entry.ignore = r.read_u8()?;
        entry.drop_gold = r.read_u8()?;
        entry.drop_item = r.read_u8()?;
        entry.cast_innate = r.read_u8()?;
        entry.cast_spell = r.read_u8()?;
        entry.blows = r.read_u8_array::<MONSTER_BLOW_MAX>()?;
        entry.flags = r.read_u32_array::<RACE_FLAG_WORDS>()?;
        entry.spell_flags = r.read_u32_array::<RACE_SPELL_FLAG_WORDS>()?;
        entry.max_num = r.read_u8()?;
        r.skip(3)?;

        // Only remember what the live race can actually do.
        for (known, live) in entry.flags.iter_mut().zip(race.flags) {
            *known &= live;
        }
        for (known, live) in entry.spell_flags.iter_mut().zip(race.spell_flags) {
            *known &= live;
        }
    }
    Ok(lore)
}

// --- Object memory ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMemory {
    pub aware: bool,
    pub tried: bool,
    pub squelch: bool,
    pub everseen: bool,
}

pub fn read_object_memory<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: &ContentTables,
) -> Result<Vec<KindMemory>> {
    let count = usize::from(r.read_u16()?);
    if count > tables.kinds.len() {
        return Err(DecodeError::overflow("object kinds", count, tables.kinds.len()));
    }

    let mut memory = vec![KindMemory::default(); tables.kinds.len()];
    for entry in memory.iter_mut().take(count) {
        let bits = r.read_u8()?;
        *entry = KindMemory {
            aware: bits & 0x01 != 0,
            tried: bits & 0x02 != 0,
            squelch: bits & 0x04 != 0,
            everseen: bits & 0x08 != 0,
        };
    }
    Ok(memory)
}

// --- Quests ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub level: u8,
}

pub fn read_quests<R: Read>(r: &mut ChecksumReader<R>) -> Result<Vec<Quest>> {
    let count = usize::from(r.read_u16()?);
    if count > MAX_Q_IDX {
        return Err(DecodeError::overflow("quests", count, MAX_Q_IDX));
    }

    let mut quests = vec![Quest::default(); MAX_Q_IDX];
    for quest in quests.iter_mut().take(count) {
        quest.level = r.read_u8()?;
        r.skip(3)?;
    }
    Ok(quests)
}

// --- Artifacts ---

/// How many copies of each artifact exist, indexed like the artifact table.
pub fn read_artifacts<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: &ContentTables,
) -> Result<Vec<u8>> {
    let count = usize::from(r.read_u16()?);
    if count > tables.artifacts.len() {
        return Err(DecodeError::overflow(
            "artifacts",
            count,
            tables.artifacts.len(),
        ));
    }

    let mut cur_num = vec![0u8; tables.artifacts.len()];
    for slot in cur_num.iter_mut().take(count) {
        *slot = r.read_u8()?;
        r.skip(3)?;
    }
    Ok(cur_num)
}

// --- Squelch ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoInscription {
    pub kind_idx: i16,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squelch {
    /// Quality squelch levels; all zero when the file's table has another size.
    pub quality: Vec<u8>,
    pub ego_everseen: Vec<bool>,
    pub inscriptions: Vec<AutoInscription>,
}

pub fn read_squelch<R: Read>(
    r: &mut ChecksumReader<R>,
    version: FormatVersion,
    tables: &ContentTables,
) -> Result<Squelch> {
    let mut squelch = Squelch {
        quality: vec![0; SQUELCH_BYTES],
        ego_everseen: vec![false; tables.egos.len()],
        inscriptions: Vec::new(),
    };

    let stored = usize::from(r.read_u8()?);
    if stored == SQUELCH_BYTES {
        for level in &mut squelch.quality {
            *level = r.read_u8()?;
        }
    } else {
        debug!(stored, expected = SQUELCH_BYTES, "skipping quality squelch table");
        r.skip(stored)?;
    }

    if version.has_ego_squelch_table() {
        let count = usize::from(r.read_u16()?);
        for i in 0..count {
            let bits = r.read_u8()?;
            if let Some(seen) = squelch.ego_everseen.get_mut(i) {
                *seen |= bits & 0x02 != 0;
            }
        }
    }

    let count = usize::from(r.read_u16()?);
    if count > tables.kinds.len() {
        return Err(DecodeError::overflow(
            "auto-inscriptions",
            count,
            tables.kinds.len(),
        ));
    }
    for _ in 0..count {
        let kind_idx = r.read_i16()?;
        let text = r.read_string(AUTO_INSCRIPTION_LEN)?;
        squelch.inscriptions.push(AutoInscription { kind_idx, text });
    }
    Ok(squelch)
}

// --- Misc ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misc {
    pub randart_version: u32,
    pub seed_randart: u32,
    pub seed_flavor: u32,
    pub seed_town: u32,
    pub panic_save: u16,
    pub total_winner: u16,
    pub noscore: u16,
    pub is_dead: bool,
    pub feeling: u8,
    pub old_turn: i32,
    pub turn: i32,
}

pub fn read_misc<R: Read>(r: &mut ChecksumReader<R>) -> Result<Misc> {
    let randart_version = r.read_u32()?;
    let seed_randart = r.read_u32()?;
    r.skip(12)?;
    let seed_flavor = r.read_u32()?;
    let seed_town = r.read_u32()?;
    let panic_save = r.read_u16()?;
    let total_winner = r.read_u16()?;
    let noscore = r.read_u16()?;
    let is_dead = r.read_u8()? != 0;
    let feeling = r.read_u8()?;
    let old_turn = r.read_i32()?;
    let turn = r.read_i32()?;

    Ok(Misc {
        randart_version,
        seed_randart,
        seed_flavor,
        seed_town,
        panic_save,
        total_winner,
        noscore,
        is_dead,
        feeling,
        old_turn,
        turn,
    })
}

// --- Random artifacts ---

/// Where the artifact table in effect for this load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RandartSource {
    /// Random artifacts are off; the regular table applies.
    Regular,
    /// An older file: the caller rebuilds the set from this seed.
    Regenerate { seed: u32 },
    /// The file's own records replaced the first `count` slots.
    Stored { count: usize },
    /// Records of a dead character, read and dropped.
    Discarded { count: usize },
}

pub struct RandartsSection {
    pub artifacts: Vec<Artifact>,
    pub source: RandartSource,
}

pub fn read_randarts<R: Read>(
    r: &mut ChecksumReader<R>,
    version: FormatVersion,
    enabled: bool,
    misc: &Misc,
    tables: &ContentTables,
    wizard: bool,
) -> Result<RandartsSection> {
    let regular = || tables.artifacts.clone();
    if !enabled {
        return Ok(RandartsSection {
            artifacts: regular(),
            source: RandartSource::Regular,
        });
    }

    if !version.stores_randarts_inline() {
        if misc.randart_version != tables.randart_version {
            return Err(DecodeError::IncompatibleRandarts {
                found: misc.randart_version,
                expected: tables.randart_version,
            });
        }
        return Ok(RandartsSection {
            artifacts: regular(),
            source: RandartSource::Regenerate {
                seed: misc.seed_randart,
            },
        });
    }

    let count = usize::from(r.read_u16()?);
    if misc.is_dead && !wizard {
        for _ in 0..count {
            read_artifact_record(r)?;
        }
        return Ok(RandartsSection {
            artifacts: regular(),
            source: RandartSource::Discarded { count },
        });
    }

    if count > tables.artifacts.len() {
        return Err(DecodeError::overflow(
            "random artifacts",
            count,
            tables.artifacts.len(),
        ));
    }

    let mut artifacts = regular();
    for slot in &mut artifacts {
        slot.tval = 0;
        slot.sval = 0;
    }
    for slot in artifacts.iter_mut().take(count) {
        let stored = read_artifact_record(r)?;
        *slot = Artifact {
            name: std::mem::take(&mut slot.name),
            ..stored
        };
    }
    Ok(RandartsSection {
        artifacts,
        source: RandartSource::Stored { count },
    })
}

fn read_artifact_record<R: Read>(r: &mut ChecksumReader<R>) -> Result<Artifact> {
    Ok(Artifact {
        name: String::new(),
        tval: r.read_u8()?,
        sval: r.read_u8()?,
        pval: r.read_i16()?,
        to_h: r.read_i16()?,
        to_d: r.read_i16()?,
        to_a: r.read_i16()?,
        ac: r.read_i16()?,
        dd: r.read_u8()?,
        ds: r.read_u8()?,
        weight: r.read_i16()?,
        cost: r.read_i32()?,
        flags: r.read_u32_array::<OBJ_FLAG_WORDS>()?,
        level: r.read_u8()?,
        rarity: r.read_u8()?,
        effect: r.read_u16()?,
        time_base: r.read_u16()?,
        time_dice: r.read_u16()?,
        time_sides: r.read_u16()?,
    })
}

// --- Inventory ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Pack slots first, then equipment from [`INVEN_WIELD`].
    pub slots: Vec<Option<Item>>,
    pub pack_count: usize,
    pub equip_count: usize,
    pub total_weight: i32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: vec![None; INVEN_TOTAL],
            pack_count: 0,
            equip_count: 0,
            total_weight: 0,
        }
    }
}

impl Inventory {
    pub fn pack(&self) -> impl Iterator<Item = &Item> {
        self.slots[..INVEN_PACK].iter().flatten()
    }

    pub fn equipment(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.slots
            .iter()
            .enumerate()
            .skip(INVEN_WIELD)
            .filter_map(|(slot, item)| item.as_ref().map(|item| (slot, item)))
    }
}

pub fn read_inventory<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: ItemTables<'_>,
) -> Result<Inventory> {
    let mut inventory = Inventory::default();
    loop {
        let slot = r.read_u16()?;
        if slot == INVENTORY_END {
            break;
        }
        let Some(item) = read_item(r, tables)? else {
            continue;
        };

        let slot = usize::from(slot);
        if slot >= INVEN_TOTAL {
            return Err(DecodeError::reference("inventory slot", slot as i64, INVEN_TOTAL));
        }
        inventory.total_weight += item.total_weight();
        if slot >= INVEN_WIELD {
            inventory.slots[slot] = Some(item);
            inventory.equip_count += 1;
        } else if inventory.pack_count == INVEN_PACK {
            return Err(DecodeError::overflow(
                "inventory items",
                INVEN_PACK + 1,
                INVEN_PACK,
            ));
        } else {
            inventory.slots[inventory.pack_count] = Some(item);
            inventory.pack_count += 1;
        }
    }
    Ok(inventory)
}

// --- Stores ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub owner: u8,
    pub stock: Vec<Item>,
}

pub fn read_stores<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: ItemTables<'_>,
) -> Result<Vec<Store>> {
    let count = usize::from(r.read_u16()?);
    if count > MAX_STORES {
        return Err(DecodeError::overflow("stores", count, MAX_STORES));
    }

    let owners = tables.content.store_owners;
    let mut stores = Vec::with_capacity(count);
    for _ in 0..count {
        r.skip(6)?;
        let owner = r.read_u8()?;
        let stocked = r.read_u8()?;
        r.skip(4)?;
        if usize::from(owner) >= owners {
            return Err(DecodeError::reference("store owner", owner, owners));
        }

        let mut store = Store {
            owner,
            stock: Vec::new(),
        };
        for _ in 0..stocked {
            if let Some(item) = read_item(r, tables)?
                && store.stock.len() < STORE_INVEN_MAX
            {
                store.stock.push(item);
            }
        }
        stores.push(store);
    }
    Ok(stores)
}

// --- Dungeon ---

pub fn read_dungeon<R: Read>(r: &mut ChecksumReader<R>) -> Result<Level> {
    let depth = r.read_i16()?;
    r.read_u16()?;
    let py = r.read_i16()?;
    let px = r.read_i16()?;
    let ymax = r.read_i16()?;
    let xmax = r.read_i16()?;
    r.read_u16()?;
    r.read_u16()?;

    let reason = if !(0..MAX_DEPTH).contains(&depth) {
        Some(RegenReason::IllegalDepth { depth })
    } else if usize::try_from(ymax).ok() != Some(DUNGEON_HGT)
        || usize::try_from(xmax).ok() != Some(DUNGEON_WID)
    {
        Some(RegenReason::DimensionMismatch {
            height: ymax,
            width: xmax,
        })
    } else {
        None
    };

    if let Some(reason) = reason {
        warn!(%reason, "ignoring stored level");
        let height = usize::try_from(ymax).unwrap_or(0);
        let width = usize::try_from(xmax).unwrap_or(0);
        cave::skip_planes(r, height, width)?;
        return Ok(Level::new(LevelStatus::Regenerate { reason }));
    }

    if !Cave::in_bounds(i32::from(py), i32::from(px)) {
        return Err(DecodeError::Placement {
            what: "player",
            y: i32::from(py),
            x: i32::from(px),
        });
    }

    let mut level = Level::new(LevelStatus::Placed);
    level.depth = depth;
    level.py = py;
    level.px = px;
    level.cave.read_planes(r)?;
    level.cave.place_player(py, px)?;
    Ok(level)
}

// --- Objects ---

/// Fill the object arena in stored order. Records of a level that will be
/// regenerated are read and dropped.
pub fn read_objects<R: Read>(
    r: &mut ChecksumReader<R>,
    level: &mut Level,
    tables: ItemTables<'_>,
    limits: Limits,
) -> Result<()> {
    let limit = usize::from(r.read_u16()?);
    if limit > limits.o_max {
        return Err(DecodeError::overflow("object entries", limit, limits.o_max));
    }

    let keep = level.is_placed();
    for _ in 1..limit {
        let item = read_item(r, tables)?;
        if keep {
            level.objects.push(item);
        }
    }
    Ok(())
}

// --- Monsters ---

pub fn read_monsters<R: Read>(
    r: &mut ChecksumReader<R>,
    level: &mut Level,
    tables: &ContentTables,
    limits: Limits,
) -> Result<()> {
    let limit = usize::from(r.read_u16()?);
    if limit > limits.m_max {
        return Err(DecodeError::overflow("monster entries", limit, limits.m_max));
    }

    let keep = level.is_placed();
    for _ in 1..limit {
        let monster = read_monster(r)?;
        if !keep {
            continue;
        }
        let known = usize::try_from(monster.r_idx)
            .ok()
            .and_then(|r_idx| tables.monster_races.get(r_idx))
            .is_some_and(|race| !race.name.is_empty());
        if !known {
            warn!(r_idx = monster.r_idx, "monster race missing from this build");
        }
        level.place_monster(monster)?;
    }
    Ok(())
}

// --- Ghost ---

pub fn skip_ghost<R: Read>(r: &mut ChecksumReader<R>) -> Result<()> {
    r.read_string(GHOST_NAME_LEN)?;
    r.skip(60)?;
    Ok(())
}

// --- History ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: u16,
    pub turn: i32,
    pub dlev: i16,
    pub clev: i16,
    pub art_idx: u8,
    pub text: String,
}

pub fn read_history<R: Read>(r: &mut ChecksumReader<R>) -> Result<Vec<HistoryEntry>> {
    let count = r.read_u32()?;
    let mut history = Vec::new();
    for _ in 0..count {
        history.push(HistoryEntry {
            kind: r.read_u16()?,
            turn: r.read_i32()?,
            dlev: r.read_i16()?,
            clev: r.read_i16()?,
            art_idx: r.read_u8()?,
            text: r.read_string(HISTORY_TEXT_LEN)?,
        });
    }
    Ok(history)
}
