use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DecodeError, Result};
use crate::reader::ChecksumReader;
use crate::tables::ContentTables;
use crate::types::{
    A_MAX, DIED_FROM_LEN, HISTORY_LEN, MAX_SEXES, NAME_LEN, PY_MAX_LEVEL, PY_MAX_SPELLS, TMD_MAX,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub died_from: String,
    pub history: String,
    pub race: u8,
    pub class: u8,
    pub sex: u8,
    pub name_suffix: u8,
    pub hitdie: u8,
    pub expfact: u8,
    pub age: i16,
    pub height: i16,
    pub weight: i16,
    pub stat_max: [i16; A_MAX],
    pub stat_cur: [i16; A_MAX],
    pub stat_birth: [i16; A_MAX],
    pub ht_birth: i16,
    pub wt_birth: i16,
    pub au_birth: i32,
    pub au: i32,
    pub max_exp: i32,
    pub exp: i32,
    pub exp_frac: u16,
    pub lev: i16,
    pub mhp: i16,
    pub chp: i16,
    pub chp_frac: u16,
    pub msp: i16,
    pub csp: i16,
    pub csp_frac: u16,
    pub max_lev: i16,
    pub max_depth: i16,
    pub sc: i16,
    pub food: i16,
    pub energy: i16,
    pub word_recall: i16,
    pub see_infra: i16,
    pub confusing: u8,
    pub searching: u8,
    pub timed: [i16; TMD_MAX],
    /// Hit points gained per level, filled by the hp phase.
    pub player_hp: Vec<i16>,
    pub spells: Spells,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spells {
    pub flags: Vec<u8>,
    pub order: Vec<u8>,
}

// --- Player ---

pub fn read_player<R: Read>(r: &mut ChecksumReader<R>, tables: &ContentTables) -> Result<Player> {
    let name = r.read_string(NAME_LEN)?;
    let died_from = r.read_string(DIED_FROM_LEN)?;
    let history = r.read_string(HISTORY_LEN)?;

    let race = r.read_u8()?;
    if usize::from(race) >= tables.player_races.len() {
        return Err(DecodeError::reference(
            "player race",
            race,
            tables.player_races.len(),
        ));
    }
    let class = r.read_u8()?;
    if usize::from(class) >= tables.player_classes.len() {
        return Err(DecodeError::reference(
            "player class",
            class,
            tables.player_classes.len(),
        ));
    }
    let sex = r.read_u8()?;
    if usize::from(sex) >= MAX_SEXES {
        return Err(DecodeError::reference("player sex", sex, MAX_SEXES));
    }

    let name_suffix = r.read_u8()?;
    let hitdie = r.read_u8()?;
    let expfact = r.read_u8()?;

    let age = r.read_i16()?;
    let height = r.read_i16()?;
    let weight = r.read_i16()?;

    let stat_max = r.read_i16_array::<A_MAX>()?;
    let stat_cur = r.read_i16_array::<A_MAX>()?;
    let stat_birth = r.read_i16_array::<A_MAX>()?;

    let ht_birth = r.read_i16()?;
    let wt_birth = r.read_i16()?;
    let au_birth = r.read_i32()?;
    r.skip(4)?;
    let au = r.read_i32()?;

    let max_exp = r.read_i32()?;
    let exp = r.read_i32()?;
    let exp_frac = r.read_u16()?;

    let lev = r.read_i16()?;
    if !(1..=PY_MAX_LEVEL as i16).contains(&lev) {
        return Err(DecodeError::field("player level", lev));
    }

    let mhp = r.read_i16()?;
    let chp = r.read_i16()?;
    let chp_frac = r.read_u16()?;
    let msp = r.read_i16()?;
    let csp = r.read_i16()?;
    let csp_frac = r.read_u16()?;

    let max_lev = r.read_i16()?.max(lev);
    let mut max_depth = r.read_i16()?;
    if max_depth < 0 {
        max_depth = 1;
    }

    r.skip(8)?;
    let sc = r.read_i16()?;
    r.skip(2)?;

    let food = r.read_i16()?;
    let energy = r.read_i16()?;
    let word_recall = r.read_i16()?;
    let see_infra = r.read_i16()?;
    let confusing = r.read_u8()?;
    let searching = r.read_u8()?;

    let timed = read_timed_effects(r)?;

    r.skip(40)?;

    Ok(Player {
        name,
        died_from,
        history,
        race,
        class,
        sex,
        name_suffix,
        hitdie,
        expfact,
        age,
        height,
        weight,
        stat_max,
        stat_cur,
        stat_birth,
        ht_birth,
        wt_birth,
        au_birth,
        au,
        max_exp,
        exp,
        exp_frac,
        lev,
        mhp,
        chp,
        chp_frac,
        msp,
        csp,
        csp_frac,
        max_lev,
        max_depth,
        sc,
        food,
        energy,
        word_recall,
        see_infra,
        confusing,
        searching,
        timed,
        player_hp: Vec::new(),
        spells: Spells::default(),
    })
}

/// Count-prefixed timed effects. Slots this build lacks are read and
/// dropped; slots the file lacks stay zero.
fn read_timed_effects<R: Read>(r: &mut ChecksumReader<R>) -> Result<[i16; TMD_MAX]> {
    let count = usize::from(r.read_u8()?);
    let mut timed = [0i16; TMD_MAX];
    for slot in timed.iter_mut().take(count) {
        *slot = r.read_i16()?;
    }
    if count > TMD_MAX {
        r.skip(2 * (count - TMD_MAX))?;
        warn!(count, supported = TMD_MAX, "discarded unsupported timed effects");
    }
    Ok(timed)
}

// --- Player HP ---

pub fn read_player_hp<R: Read>(r: &mut ChecksumReader<R>) -> Result<Vec<i16>> {
    let count = usize::from(r.read_u16()?);
    if count > PY_MAX_LEVEL {
        return Err(DecodeError::overflow("hitpoint entries", count, PY_MAX_LEVEL));
    }
    let hp = (0..count)
        .map(|_| r.read_i16())
        .collect::<io::Result<Vec<_>>>()?;
    Ok(hp)
}

// --- Player spells ---

pub fn read_player_spells<R: Read>(r: &mut ChecksumReader<R>) -> Result<Spells> {
    let count = usize::from(r.read_u16()?);
    if count > PY_MAX_SPELLS {
        return Err(DecodeError::overflow("player spells", count, PY_MAX_SPELLS));
    }
    let flags = (0..count)
        .map(|_| r.read_u8())
        .collect::<io::Result<Vec<_>>>()?;
    let order = (0..count)
        .map(|_| r.read_u8())
        .collect::<io::Result<Vec<_>>>()?;
    Ok(Spells { flags, order })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{read_player_hp, read_player_spells, read_timed_effects};
    use crate::error::ErrorKind;
    use crate::fixtures::SaveWriter;
    use crate::reader::ChecksumReader;
    use crate::types::TMD_MAX;

    fn reader(w: SaveWriter) -> ChecksumReader<Cursor<Vec<u8>>> {
        ChecksumReader::new(Cursor::new(w.into_bytes()))
    }

    #[test]
    fn fewer_timed_effects_are_zero_filled() {
        let mut w = SaveWriter::new(0);
        w.write_u8(3);
        for v in [5, 6, 7] {
            w.write_i16(v);
        }
        w.write_u8(0xEE);
        let mut r = reader(w);

        let timed = read_timed_effects(&mut r).unwrap();
        assert_eq!(&timed[..3], &[5, 6, 7]);
        assert!(timed[3..].iter().all(|&v| v == 0));
        assert_eq!(r.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn extra_timed_effects_are_discarded() {
        let mut w = SaveWriter::new(0);
        w.write_u8((TMD_MAX + 2) as u8);
        for v in 0..(TMD_MAX + 2) as i16 {
            w.write_i16(v + 1);
        }
        w.write_u8(0xEE);
        let mut r = reader(w);

        let timed = read_timed_effects(&mut r).unwrap();
        assert_eq!(timed[TMD_MAX - 1], TMD_MAX as i16);
        assert_eq!(r.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn hp_table_over_capacity_is_overflow() {
        let mut w = SaveWriter::new(0);
        w.write_u16(51);
        let err = read_player_hp(&mut reader(w)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralOverflow);
    }

    #[test]
    fn spells_read_flags_then_order() {
        let mut w = SaveWriter::new(0);
        w.write_u16(2);
        w.write_bytes(&[1, 3, 9, 8]);
        let spells = read_player_spells(&mut reader(w)).unwrap();
        assert_eq!(spells.flags, vec![1, 3]);
        assert_eq!(spells.order, vec![9, 8]);
    }
}
