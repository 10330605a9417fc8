use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reader::ChecksumReader;

/// One live monster on the saved level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub r_idx: i16,
    pub fy: u8,
    pub fx: u8,
    pub hp: i16,
    pub maxhp: i16,
    pub csleep: i16,
    pub mspeed: u8,
    pub energy: u8,
    pub stunned: u8,
    pub confused: u8,
    pub monfear: u8,
    /// Head of the hoard chain. Rebuilt by the linker, never persisted.
    #[serde(skip)]
    pub hold_o_idx: usize,
}

pub fn read_monster<R: Read>(r: &mut ChecksumReader<R>) -> Result<Monster> {
    let r_idx = r.read_i16()?;
    let fy = r.read_u8()?;
    let fx = r.read_u8()?;
    let hp = r.read_i16()?;
    let maxhp = r.read_i16()?;
    let csleep = r.read_i16()?;
    let mspeed = r.read_u8()?;
    let energy = r.read_u8()?;
    let stunned = r.read_u8()?;
    let confused = r.read_u8()?;
    let monfear = r.read_u8()?;
    r.skip(1)?;

    Ok(Monster {
        r_idx,
        fy,
        fx,
        hp,
        maxhp,
        csleep,
        mspeed,
        energy,
        stunned,
        confused,
        monfear,
        hold_o_idx: 0,
    })
}
