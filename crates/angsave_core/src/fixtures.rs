//! Stream encoder for tests: writes savefiles the loader accepts.
//!
//! [`SaveWriter`] applies the cipher and keeps both running sums exactly as
//! the reader computes them. [`SaveBuilder`] lays out a whole file from
//! in-memory values, with content tables to load it against.

use crate::cave::Cave;
use crate::item::Item;
use crate::monster::Monster;
use crate::player::Player;
use crate::sections::{HistoryEntry, Message, Misc, Store};
use crate::tables::{Artifact, ContentTables, EgoItem, Limits, MonsterRace, ObjectKind};
use crate::types::{
    ANGBAND_TERM_MAX, INVENTORY_END, MONSTER_BLOW_MAX, OPT_ADULT_RANDARTS, OPT_WORDS,
    RACE_FLAG_WORDS, RACE_SPELL_FLAG_WORDS, RAND_DEG, SQUELCH_BYTES, TMD_MAX, TR0_PVAL_MASK,
    TV_FOOD, TV_LIGHT, TV_POTION, TV_SOFT_ARMOR, TV_SWORD,
};
use crate::version::FormatVersion;

pub struct SaveWriter {
    out: Vec<u8>,
    xor_byte: u8,
    v_check: u32,
    x_check: u32,
}

impl SaveWriter {
    pub fn new(xor_byte: u8) -> Self {
        Self {
            out: Vec::new(),
            xor_byte,
            v_check: 0,
            x_check: 0,
        }
    }

    /// Append bytes verbatim, outside the cipher and the sums.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn reset(&mut self, xor_byte: u8) {
        self.xor_byte = xor_byte;
        self.v_check = 0;
        self.x_check = 0;
    }

    pub fn write_u8(&mut self, value: u8) {
        let raw = value ^ self.xor_byte;
        self.xor_byte = raw;
        self.v_check = self.v_check.wrapping_add(u32::from(value));
        self.x_check = self.x_check.wrapping_add(u32::from(raw));
        self.out.push(raw);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_u8(b);
        }
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// NUL-terminated.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
        self.write_u8(0);
    }

    /// Run-length encode one plane, runs capped at 255.
    pub fn write_rle_plane(&mut self, cells: &[u8]) {
        let mut i = 0;
        while i < cells.len() {
            let value = cells[i];
            let run = cells[i..]
                .iter()
                .take(u8::MAX as usize)
                .take_while(|&&c| c == value)
                .count();
            self.write_u8(run as u8);
            self.write_u8(value);
            i += run;
        }
    }

    pub fn write_item(&mut self, item: &Item) {
        self.write_i16(item.k_idx as i16);
        self.write_u8(item.iy);
        self.write_u8(item.ix);
        self.write_u8(item.tval);
        self.write_u8(item.sval);
        self.write_i16(item.pval);
        self.write_u8(0);
        self.write_u8(item.number);
        self.write_i16(item.weight);
        self.write_u8(item.name1);
        self.write_u8(item.name2);
        self.write_i16(item.timeout);
        self.write_i16(item.to_h);
        self.write_i16(item.to_d);
        self.write_i16(item.to_a);
        self.write_i16(item.ac);
        self.write_u8(item.dd);
        self.write_u8(item.ds);
        self.write_u8(item.ident);
        self.write_u8(item.marked);
        self.write_u8(item.origin);
        self.write_u8(item.origin_depth);
        self.write_u16(item.origin_xtra);
        for word in item.flags {
            self.write_u32(word);
        }
        self.write_i16(item.held_m_idx);
        self.write_string(item.inscription.as_deref().unwrap_or(""));
    }

    pub fn write_artifact(&mut self, a: &Artifact) {
        self.write_u8(a.tval);
        self.write_u8(a.sval);
        self.write_i16(a.pval);
        self.write_i16(a.to_h);
        self.write_i16(a.to_d);
        self.write_i16(a.to_a);
        self.write_i16(a.ac);
        self.write_u8(a.dd);
        self.write_u8(a.ds);
        self.write_i16(a.weight);
        self.write_i32(a.cost);
        for word in a.flags {
            self.write_u32(word);
        }
        self.write_u8(a.level);
        self.write_u8(a.rarity);
        self.write_u16(a.effect);
        self.write_u16(a.time_base);
        self.write_u16(a.time_dice);
        self.write_u16(a.time_sides);
    }

    pub fn write_monster(&mut self, m: &Monster) {
        self.write_i16(m.r_idx);
        self.write_u8(m.fy);
        self.write_u8(m.fx);
        self.write_i16(m.hp);
        self.write_i16(m.maxhp);
        self.write_i16(m.csleep);
        self.write_u8(m.mspeed);
        self.write_u8(m.energy);
        self.write_u8(m.stunned);
        self.write_u8(m.confused);
        self.write_u8(m.monfear);
        self.write_u8(0);
    }

    /// Value sum, then encoded sum, each taken just before it is written.
    pub fn write_checksums(&mut self) {
        let v_check = self.v_check;
        self.write_u32(v_check);
        let x_check = self.x_check;
        self.write_u32(x_check);
    }

    pub fn v_check(&self) -> u32 {
        self.v_check
    }

    pub fn x_check(&self) -> u32 {
        self.x_check
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

/// Stored level geometry. Dimensions other than the compiled-in grid make
/// the loader discard the level.
#[derive(Debug, Clone)]
pub struct DungeonLayout {
    pub depth: i16,
    pub py: i16,
    pub px: i16,
    pub height: i16,
    pub width: i16,
    /// Feature plane, row-major over `height * width` cells.
    pub feat: Vec<u8>,
}

impl DungeonLayout {
    /// A walled room filling the compiled-in grid.
    pub fn walled(depth: i16, py: i16, px: i16) -> Self {
        let mut feat = vec![1u8; Cave::CELLS];
        for y in 0..Cave::HEIGHT {
            for x in 0..Cave::WIDTH {
                if y == 0 || x == 0 || y == Cave::HEIGHT - 1 || x == Cave::WIDTH - 1 {
                    feat[y * Cave::WIDTH + x] = 56;
                }
            }
        }
        Self {
            depth,
            py,
            px,
            height: Cave::HEIGHT as i16,
            width: Cave::WIDTH as i16,
            feat,
        }
    }

    fn cells(&self) -> usize {
        usize::try_from(self.height).unwrap_or(0) * usize::try_from(self.width).unwrap_or(0)
    }
}

/// Builds a complete savefile. Every field is public so tests can bend one
/// thing at a time.
#[derive(Debug, Clone)]
pub struct SaveBuilder {
    pub version: FormatVersion,
    pub seed: u8,
    pub tables: ContentTables,
    /// Options stored as on. Every option is stored, so defaults never apply.
    pub options: Vec<usize>,
    pub messages: Vec<Message>,
    pub player: Player,
    /// Timed effects as stored; the count may differ from this build's.
    pub timed: Vec<i16>,
    pub misc: Misc,
    pub randarts: Vec<Artifact>,
    pub inventory: Vec<(u16, Item)>,
    pub stores: Vec<Store>,
    pub dungeon: DungeonLayout,
    pub objects: Vec<Item>,
    pub monsters: Vec<Monster>,
    pub history: Vec<HistoryEntry>,
}

impl Default for SaveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveBuilder {
    pub fn new() -> Self {
        let player = Player {
            name: "Frodo".to_string(),
            died_from: String::new(),
            history: "You are the son of a hobbit farmer.".to_string(),
            race: 3,
            class: 0,
            sex: 1,
            hitdie: 7,
            expfact: 110,
            age: 33,
            height: 36,
            weight: 60,
            stat_max: [14, 10, 12, 17, 15, 11],
            stat_cur: [14, 10, 12, 17, 15, 11],
            stat_birth: [14, 10, 12, 17, 15, 11],
            au: 612,
            max_exp: 1450,
            exp: 1400,
            lev: 12,
            mhp: 98,
            chp: 90,
            max_lev: 12,
            max_depth: 9,
            food: 5000,
            player_hp: (1..=12).map(|lvl| lvl * 8).collect(),
            ..Player::default()
        };

        Self {
            version: FormatVersion::new(3, 0, 14),
            seed: 0x5A,
            tables: sample_tables(),
            options: Vec::new(),
            messages: vec![
                Message {
                    text: "Welcome to the dungeon.".to_string(),
                    kind: 0,
                },
                Message {
                    text: "You feel something in the air.".to_string(),
                    kind: 3,
                },
            ],
            player,
            timed: vec![0; TMD_MAX],
            misc: Misc {
                randart_version: sample_tables().randart_version,
                seed_randart: 0xDEAD_BEEF,
                seed_flavor: 17,
                seed_town: 99,
                turn: 123_456,
                old_turn: 120_000,
                ..Misc::default()
            },
            randarts: Vec::new(),
            inventory: vec![
                (0, sample_item(TV_FOOD, 35, 5)),
                (24, sample_item(TV_SWORD, 4, 1)),
            ],
            stores: vec![Store {
                owner: 1,
                stock: vec![sample_item(TV_POTION, 34, 3)],
            }],
            dungeon: DungeonLayout::walled(5, 10, 20),
            objects: Vec::new(),
            monsters: Vec::new(),
            history: vec![HistoryEntry {
                kind: 1,
                turn: 0,
                dlev: 0,
                clev: 1,
                art_idx: 0,
                text: "Began the quest to destroy Morgoth.".to_string(),
            }],
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = SaveWriter::new(0);
        w.write_raw(&[
            self.version.major,
            self.version.minor,
            self.version.patch,
            self.seed,
        ]);
        w.reset(self.seed);
        w.write_bytes(&[0; 20]);

        // Randomizer
        w.write_u16(0);
        w.write_u16(7);
        for i in 0..RAND_DEG as u32 {
            w.write_u32(i.wrapping_mul(0x9E37_79B9));
        }

        self.write_options(&mut w);

        w.write_i16(self.messages.len() as i16);
        for message in &self.messages {
            w.write_string(&message.text);
            w.write_u16(message.kind);
        }

        // Monster memory
        w.write_u16(self.tables.monster_races.len() as u16);
        for (r_idx, race) in self.tables.monster_races.iter().enumerate() {
            for v in [r_idx as i16, 0, 0, 0] {
                w.write_i16(v);
            }
            w.write_bytes(&[0; 6]);
            w.write_bytes(&[0; MONSTER_BLOW_MAX]);
            for word in race.flags.iter().take(RACE_FLAG_WORDS) {
                w.write_u32(*word);
            }
            for word in race.spell_flags.iter().take(RACE_SPELL_FLAG_WORDS) {
                w.write_u32(*word);
            }
            w.write_u8(1);
            w.write_bytes(&[0; 3]);
        }

        // Object memory
        w.write_u16(self.tables.kinds.len() as u16);
        for k_idx in 0..self.tables.kinds.len() {
            w.write_u8(if k_idx % 2 == 1 { 0x09 } else { 0 });
        }

        // Quests
        w.write_u16(2);
        for level in [99u8, 100] {
            w.write_bytes(&[level, 0, 0, 0]);
        }

        // Artifacts
        w.write_u16(self.tables.artifacts.len() as u16);
        for _ in &self.tables.artifacts {
            w.write_bytes(&[0; 4]);
        }

        self.write_player(&mut w);

        // Squelch
        w.write_u8(SQUELCH_BYTES as u8);
        w.write_bytes(&[1; SQUELCH_BYTES]);
        if self.version.has_ego_squelch_table() {
            w.write_u16(self.tables.egos.len() as u16);
            for _ in &self.tables.egos {
                w.write_u8(0x02);
            }
        }
        w.write_u16(1);
        w.write_i16(1);
        w.write_string("=g");

        self.write_misc(&mut w);

        w.write_u16(self.player.player_hp.len() as u16);
        for &hp in &self.player.player_hp {
            w.write_i16(hp);
        }

        w.write_u16(self.player.spells.flags.len() as u16);
        w.write_bytes(&self.player.spells.flags);
        w.write_bytes(&self.player.spells.order);

        if self.options.contains(&OPT_ADULT_RANDARTS) && self.version.stores_randarts_inline() {
            w.write_u16(self.randarts.len() as u16);
            for artifact in &self.randarts {
                w.write_artifact(artifact);
            }
        }

        for (slot, item) in &self.inventory {
            w.write_u16(*slot);
            w.write_item(item);
        }
        w.write_u16(INVENTORY_END);

        w.write_u16(self.stores.len() as u16);
        for store in &self.stores {
            w.write_bytes(&[0; 6]);
            w.write_u8(store.owner);
            w.write_u8(store.stock.len() as u8);
            w.write_bytes(&[0; 4]);
            for item in &store.stock {
                w.write_item(item);
            }
        }

        if !self.misc.is_dead {
            self.write_level(&mut w);
        }

        w.write_u32(self.history.len() as u32);
        for entry in &self.history {
            w.write_u16(entry.kind);
            w.write_i32(entry.turn);
            w.write_i16(entry.dlev);
            w.write_i16(entry.clev);
            w.write_u8(entry.art_idx);
            w.write_string(&entry.text);
        }

        w.write_checksums();
        w.into_bytes()
    }

    fn write_options(&self, w: &mut SaveWriter) {
        w.write_bytes(&[0; 16]);
        w.write_u8(4);
        w.write_u8(3);
        w.write_u16(50);

        let mut flags = [0u32; OPT_WORDS];
        for &index in &self.options {
            flags[index / 32] |= 1 << (index % 32);
        }
        for word in flags {
            w.write_u32(word);
        }
        for _ in 0..OPT_WORDS {
            w.write_u32(u32::MAX);
        }

        for term in 0..ANGBAND_TERM_MAX as u32 {
            w.write_u32(1 << term);
        }
        for _ in 0..ANGBAND_TERM_MAX {
            w.write_u32(u32::MAX);
        }
    }

    fn write_player(&self, w: &mut SaveWriter) {
        let p = &self.player;
        w.write_string(&p.name);
        w.write_string(&p.died_from);
        w.write_string(&p.history);
        w.write_u8(p.race);
        w.write_u8(p.class);
        w.write_u8(p.sex);
        w.write_u8(p.name_suffix);
        w.write_u8(p.hitdie);
        w.write_u8(p.expfact);
        w.write_i16(p.age);
        w.write_i16(p.height);
        w.write_i16(p.weight);
        for stats in [&p.stat_max, &p.stat_cur, &p.stat_birth] {
            for &v in stats {
                w.write_i16(v);
            }
        }
        w.write_i16(p.ht_birth);
        w.write_i16(p.wt_birth);
        w.write_i32(p.au_birth);
        w.write_bytes(&[0; 4]);
        w.write_i32(p.au);
        w.write_i32(p.max_exp);
        w.write_i32(p.exp);
        w.write_u16(p.exp_frac);
        w.write_i16(p.lev);
        w.write_i16(p.mhp);
        w.write_i16(p.chp);
        w.write_u16(p.chp_frac);
        w.write_i16(p.msp);
        w.write_i16(p.csp);
        w.write_u16(p.csp_frac);
        w.write_i16(p.max_lev);
        w.write_i16(p.max_depth);
        w.write_bytes(&[0; 8]);
        w.write_i16(p.sc);
        w.write_bytes(&[0; 2]);
        w.write_i16(p.food);
        w.write_i16(p.energy);
        w.write_i16(p.word_recall);
        w.write_i16(p.see_infra);
        w.write_u8(p.confusing);
        w.write_u8(p.searching);
        w.write_u8(self.timed.len() as u8);
        for &v in &self.timed {
            w.write_i16(v);
        }
        w.write_bytes(&[0; 40]);
    }

    fn write_misc(&self, w: &mut SaveWriter) {
        let m = &self.misc;
        w.write_u32(m.randart_version);
        w.write_u32(m.seed_randart);
        w.write_bytes(&[0; 12]);
        w.write_u32(m.seed_flavor);
        w.write_u32(m.seed_town);
        w.write_u16(m.panic_save);
        w.write_u16(m.total_winner);
        w.write_u16(m.noscore);
        w.write_u8(u8::from(m.is_dead));
        w.write_u8(m.feeling);
        w.write_i32(m.old_turn);
        w.write_i32(m.turn);
    }

    fn write_level(&self, w: &mut SaveWriter) {
        let d = &self.dungeon;
        w.write_i16(d.depth);
        w.write_u16(0);
        w.write_i16(d.py);
        w.write_i16(d.px);
        w.write_i16(d.height);
        w.write_i16(d.width);
        w.write_u16(0);
        w.write_u16(0);

        let blank = vec![0u8; d.cells()];
        w.write_rle_plane(&blank);
        w.write_rle_plane(&blank);
        if d.feat.len() == d.cells() {
            w.write_rle_plane(&d.feat);
        } else {
            w.write_rle_plane(&blank);
        }

        w.write_u16(self.objects.len() as u16 + 1);
        for item in &self.objects {
            w.write_item(item);
        }

        w.write_u16(self.monsters.len() as u16 + 1);
        for monster in &self.monsters {
            w.write_monster(monster);
        }

        w.write_string("Grip");
        w.write_bytes(&[0; 60]);
    }
}

/// An item as a conforming writer stores it: combat fields already match
/// the kind, so a load round-trips it unchanged.
pub fn sample_item(tval: u8, sval: u8, number: u8) -> Item {
    let tables = sample_tables();
    let k_idx = tables.lookup_kind(tval, sval).unwrap_or(0);
    let kind = tables.kinds.get(k_idx).cloned().unwrap_or_default();
    Item {
        k_idx,
        tval,
        sval,
        number,
        weight: kind.weight,
        to_h: kind.to_h,
        to_d: kind.to_d,
        to_a: kind.to_a,
        ac: kind.ac,
        dd: kind.dd,
        ds: kind.ds,
        ..Item::default()
    }
}

pub fn sample_tables() -> ContentTables {
    let kind = |name: &str, tval: u8, sval: u8, weight: i16, ac: i16, dd: u8, ds: u8| {
        ObjectKind {
            name: name.to_string(),
            tval,
            sval,
            weight,
            ac,
            dd,
            ds,
            ..ObjectKind::default()
        }
    };
    let race = |name: &str, flags0: u32| MonsterRace {
        name: name.to_string(),
        flags: [flags0, 0, 0],
        spell_flags: [0; 3],
    };

    ContentTables {
        kinds: vec![
            ObjectKind::default(),
            kind("Ration of Food", TV_FOOD, 35, 8, 0, 0, 0),
            kind("Dagger", TV_SWORD, 4, 12, 0, 1, 4),
            kind("Cure Light Wounds", TV_POTION, 34, 4, 0, 0, 0),
            kind("Soft Leather Armour", TV_SOFT_ARMOR, 8, 80, 8, 0, 0),
            kind("Wooden Torch", TV_LIGHT, 1, 30, 0, 1, 1),
        ],
        artifacts: vec![
            Artifact::default(),
            Artifact {
                name: "'Sting'".to_string(),
                tval: TV_SWORD,
                sval: 4,
                pval: 2,
                to_h: 7,
                to_d: 8,
                dd: 1,
                ds: 6,
                weight: 75,
                cost: 100_000,
                ..Artifact::default()
            },
            Artifact {
                name: "of Galadriel".to_string(),
                tval: TV_LIGHT,
                sval: 4,
                weight: 10,
                ..Artifact::default()
            },
        ],
        egos: vec![
            EgoItem::default(),
            EgoItem {
                name: "of Westernesse".to_string(),
                flags: [TR0_PVAL_MASK & 0b111, 0, 0],
            },
        ],
        monster_races: vec![
            MonsterRace::default(),
            race("Grip, Farmer Maggot's Dog", 0x1),
            race("Fang, Farmer Maggot's Dog", 0x1),
            race("Cave spider", 0x2),
            race("Player ghost", 0x4),
        ],
        player_races: ["Human", "Half-Elf", "Elf", "Hobbit"]
            .map(String::from)
            .to_vec(),
        player_classes: ["Warrior", "Mage", "Priest", "Rogue"]
            .map(String::from)
            .to_vec(),
        store_owners: 4,
        default_options: vec![2],
        limits: Limits {
            o_max: 64,
            m_max: 32,
        },
        randart_version: 0x1F,
    }
}
