use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::reader::ChecksumReader;
use crate::tables::{Artifact, ContentTables};
use crate::types::{
    IDENT_KNOWN, IDENT_WORN, INSCRIPTION_LEN, OBJ_FLAG_WORDS, TR0_OBVIOUS_MASK, TR0_PVAL_MASK,
    TR2_CURSE_MASK, TR2_OBVIOUS_MASK, wearable_tval,
};

/// One object instance as reconstructed from the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub k_idx: usize,
    pub iy: u8,
    pub ix: u8,
    pub tval: u8,
    pub sval: u8,
    pub pval: i16,
    pub number: u8,
    pub weight: i16,
    /// Artifact slot, 0 for none.
    pub name1: u8,
    /// Ego-item slot, 0 for none.
    pub name2: u8,
    pub timeout: i16,
    pub to_h: i16,
    pub to_d: i16,
    pub to_a: i16,
    pub ac: i16,
    pub dd: u8,
    pub ds: u8,
    pub ident: u8,
    pub marked: u8,
    pub origin: u8,
    pub origin_depth: u8,
    pub origin_xtra: u16,
    pub flags: [u32; OBJ_FLAG_WORDS],
    pub known_flags: [u32; OBJ_FLAG_WORDS],
    /// Owning monster in the level arena, 0 when the object lies on the floor.
    pub held_m_idx: i16,
    /// Next object in the same floor pile or monster hoard. Never persisted.
    #[serde(skip)]
    pub next_o_idx: usize,
    pub inscription: Option<String>,
}

impl Item {
    pub fn is_wearable(&self) -> bool {
        wearable_tval(self.tval)
    }

    pub fn total_weight(&self) -> i32 {
        i32::from(self.number) * i32::from(self.weight)
    }
}

/// The tables an item is repaired against. Artifacts are passed separately
/// because random artifacts replace the regular table for the whole load.
#[derive(Debug, Clone, Copy)]
pub struct ItemTables<'a> {
    pub content: &'a ContentTables,
    pub artifacts: &'a [Artifact],
}

impl<'a> ItemTables<'a> {
    pub fn new(content: &'a ContentTables, artifacts: &'a [Artifact]) -> Self {
        Self { content, artifacts }
    }
}

/// Read one item record and repair it against the live tables.
///
/// `Ok(None)` means the item's kind no longer exists; callers drop it.
pub fn read_item<R: Read>(
    r: &mut ChecksumReader<R>,
    tables: ItemTables<'_>,
) -> Result<Option<Item>> {
    // The stored kind index is specific to the build that wrote the file;
    // the kind is re-derived from (tval, sval) below.
    let _raw_k_idx = r.read_i16()?;

    let iy = r.read_u8()?;
    let ix = r.read_u8()?;
    let tval = r.read_u8()?;
    let sval = r.read_u8()?;
    let pval = r.read_i16()?;
    let pseudo = r.read_u8()?;
    let number = r.read_u8()?;
    let weight = r.read_i16()?;
    let name1 = r.read_u8()?;
    let name2 = r.read_u8()?;
    let timeout = r.read_i16()?;
    let to_h = r.read_i16()?;
    let to_d = r.read_i16()?;
    let to_a = r.read_i16()?;
    let ac = r.read_i16()?;
    let dd = r.read_u8()?;
    let ds = r.read_u8()?;
    let ident = r.read_u8()?;
    let marked = r.read_u8()?;
    let origin = r.read_u8()?;
    let origin_depth = r.read_u8()?;
    let origin_xtra = r.read_u16()?;
    let flags = r.read_u32_array::<OBJ_FLAG_WORDS>()?;
    let held_m_idx = r.read_i16()?;
    let note = r.read_string(INSCRIPTION_LEN)?;

    let raw = Item {
        k_idx: 0,
        iy,
        ix,
        tval,
        sval,
        pval,
        number,
        weight,
        name1,
        name2,
        timeout,
        to_h,
        to_d,
        to_a,
        ac,
        dd,
        ds,
        ident,
        marked,
        origin,
        origin_depth,
        origin_xtra,
        flags,
        known_flags: [0; OBJ_FLAG_WORDS],
        held_m_idx,
        next_o_idx: 0,
        inscription: (!note.is_empty()).then_some(note),
    };

    let Some(mut item) = repair(raw, tables)? else {
        tracing::debug!(tval, sval, "dropping item of unknown kind");
        return Ok(None);
    };
    item.known_flags = known_flags(&item, pseudo, tables);
    Ok(Some(item))
}

/// Overwrite the fields the live tables own.
///
/// The stream's copies of combat values, dice and weight are a stale cache;
/// only the dice count of an ego item survives, and only when the stream's
/// count is larger with the same number of sides. Applying this twice gives
/// the same result as applying it once.
pub fn repair(mut item: Item, tables: ItemTables<'_>) -> Result<Option<Item>> {
    let old_dd = item.dd;
    let old_ds = item.ds;

    let Some(k_idx) = tables.content.lookup_kind(item.tval, item.sval) else {
        return Ok(None);
    };
    let kind = &tables.content.kinds[k_idx];
    item.k_idx = k_idx;

    if !item.is_wearable() {
        item.to_h = kind.to_h;
        item.to_d = kind.to_d;
        item.to_a = kind.to_a;
        item.ac = kind.ac;
        item.dd = kind.dd;
        item.ds = kind.ds;
        item.weight = kind.weight;
        item.name1 = 0;
        item.name2 = 0;
        return Ok(Some(item));
    }

    if item.name1 != 0 {
        let artifact = tables.artifacts.get(item.name1 as usize).ok_or_else(|| {
            DecodeError::reference("artifact", item.name1, tables.artifacts.len())
        })?;
        if artifact.name.is_empty() {
            item.name1 = 0;
        }
    }

    if item.name2 != 0 {
        let ego = tables
            .content
            .egos
            .get(item.name2 as usize)
            .ok_or_else(|| {
                DecodeError::reference("ego item", item.name2, tables.content.egos.len())
            })?;
        if ego.name.is_empty() {
            item.name2 = 0;
        }
    }

    item.ac = kind.ac;
    item.dd = kind.dd;
    item.ds = kind.ds;
    item.weight = kind.weight;

    if item.name1 != 0 {
        let artifact = &tables.artifacts[item.name1 as usize];
        item.pval = artifact.pval;
        item.ac = artifact.ac;
        item.dd = artifact.dd;
        item.ds = artifact.ds;
        item.weight = artifact.weight;
    }

    if item.name2 != 0 {
        let ego = &tables.content.egos[item.name2 as usize];

        // Keep boosted damage dice. Provenance of this rule is undocumented;
        // it is preserved as-is.
        if item.dd < old_dd && item.ds == old_ds {
            item.dd = old_dd;
        }

        if ego.flags[0] & TR0_PVAL_MASK != 0 && item.pval == 0 {
            item.pval = 1;
        }
    }

    Ok(Some(item))
}

fn combined_flags(item: &Item, tables: ItemTables<'_>) -> [u32; OBJ_FLAG_WORDS] {
    let mut f = item.flags;
    let sources = [
        tables.content.kinds.get(item.k_idx).map(|k| k.flags),
        (item.name1 != 0)
            .then(|| tables.artifacts.get(item.name1 as usize).map(|a| a.flags))
            .flatten(),
        (item.name2 != 0)
            .then(|| tables.content.egos.get(item.name2 as usize).map(|e| e.flags))
            .flatten(),
    ];
    for words in sources.into_iter().flatten() {
        for (acc, w) in f.iter_mut().zip(words) {
            *acc |= w;
        }
    }
    f
}

fn known_flags(item: &Item, pseudo: u8, tables: ItemTables<'_>) -> [u32; OBJ_FLAG_WORDS] {
    let f = combined_flags(item, tables);
    let mut known = [0u32; OBJ_FLAG_WORDS];

    if item.ident & IDENT_KNOWN != 0 {
        known = f;
    } else if item.ident & IDENT_WORN != 0 {
        known[0] = f[0] & TR0_OBVIOUS_MASK;
        known[2] = f[2] & TR2_OBVIOUS_MASK;
    }

    // Old pseudo-ID markers 1..=3 meant "sensed as cursed".
    if (1..=3).contains(&pseudo) {
        known[2] |= f[2] & TR2_CURSE_MASK;
    }

    known
}
