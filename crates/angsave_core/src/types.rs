// Compiled-in dimensions of the live build.

pub const DUNGEON_HGT: usize = 66;
pub const DUNGEON_WID: usize = 198;
pub const MAX_DEPTH: i16 = 128;

pub const RAND_DEG: usize = 63;

pub const OPT_MAX: usize = 256;
pub const OPT_WORDS: usize = OPT_MAX / 32;
pub const OPT_ADULT_RANDARTS: usize = 131;

pub const ANGBAND_TERM_MAX: usize = 8;
/// Window flag bits that have a live description. Others pass through.
pub const WINDOW_FLAG_VALID: u32 = 0x0000_0FFF;

pub const MONSTER_BLOW_MAX: usize = 4;
pub const RACE_FLAG_WORDS: usize = 3;
pub const RACE_SPELL_FLAG_WORDS: usize = 3;

pub const A_MAX: usize = 6;
pub const MAX_SEXES: usize = 2;
pub const TMD_MAX: usize = 30;
pub const PY_MAX_LEVEL: usize = 50;
pub const PY_MAX_SPELLS: usize = 64;

pub const SQUELCH_BYTES: usize = 24;

pub const MAX_Q_IDX: usize = 4;
pub const MAX_STORES: usize = 8;
pub const STORE_INVEN_MAX: usize = 24;

pub const INVEN_PACK: usize = 23;
pub const INVEN_WIELD: usize = 24;
pub const INVEN_TOTAL: usize = 36;
pub const INVENTORY_END: u16 = 0xFFFF;

pub const MESSAGE_MAX: usize = 2048;

pub const OBJ_FLAG_WORDS: usize = 3;

// String buffer sizes used by the writer.
pub const NAME_LEN: usize = 32;
pub const DIED_FROM_LEN: usize = 80;
pub const HISTORY_LEN: usize = 250;
pub const MESSAGE_LEN: usize = 128;
pub const INSCRIPTION_LEN: usize = 128;
pub const AUTO_INSCRIPTION_LEN: usize = 80;
pub const GHOST_NAME_LEN: usize = 64;
pub const HISTORY_TEXT_LEN: usize = 80;

// Item tvals
pub const TV_SHOT: u8 = 16;
pub const TV_ARROW: u8 = 17;
pub const TV_BOLT: u8 = 18;
pub const TV_BOW: u8 = 19;
pub const TV_DIGGING: u8 = 20;
pub const TV_HAFTED: u8 = 21;
pub const TV_POLEARM: u8 = 22;
pub const TV_SWORD: u8 = 23;
pub const TV_BOOTS: u8 = 30;
pub const TV_GLOVES: u8 = 31;
pub const TV_HELM: u8 = 32;
pub const TV_CROWN: u8 = 33;
pub const TV_SHIELD: u8 = 34;
pub const TV_CLOAK: u8 = 35;
pub const TV_SOFT_ARMOR: u8 = 36;
pub const TV_HARD_ARMOR: u8 = 37;
pub const TV_DRAG_ARMOR: u8 = 38;
pub const TV_LIGHT: u8 = 39;
pub const TV_AMULET: u8 = 40;
pub const TV_RING: u8 = 45;
pub const TV_POTION: u8 = 75;
pub const TV_FOOD: u8 = 80;
pub const TV_GOLD: u8 = 100;

// Item identification bits
pub const IDENT_SENSE: u8 = 0x01;
pub const IDENT_WORN: u8 = 0x02;
pub const IDENT_KNOWN: u8 = 0x08;

// Object flag masks, by flag word
pub const TR0_PVAL_MASK: u32 = 0x0000_7FFF;
pub const TR0_OBVIOUS_MASK: u32 = 0x0000_3FFF;
pub const TR2_OBVIOUS_MASK: u32 = 0x0000_F000;
pub const TR2_CURSE_MASK: u32 = 0xE000_0000;

pub fn wearable_tval(tval: u8) -> bool {
    matches!(
        tval,
        TV_SHOT
            | TV_ARROW
            | TV_BOLT
            | TV_BOW
            | TV_DIGGING
            | TV_HAFTED
            | TV_POLEARM
            | TV_SWORD
            | TV_BOOTS
            | TV_GLOVES
            | TV_HELM
            | TV_CROWN
            | TV_SHIELD
            | TV_CLOAK
            | TV_SOFT_ARMOR
            | TV_HARD_ARMOR
            | TV_DRAG_ARMOR
            | TV_LIGHT
            | TV_AMULET
            | TV_RING
    )
}

pub const SEX_NAMES: [&str; MAX_SEXES] = ["Female", "Male"];

pub const STAT_NAMES: [&str; A_MAX] = ["Str", "Int", "Wis", "Dex", "Con", "Chr"];
