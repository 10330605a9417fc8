use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::reader::ChecksumReader;
use crate::types::{DUNGEON_HGT, DUNGEON_WID};

/// Marker in the monster plane for the cell the player stands on.
pub const PLAYER_CELL: i16 = -1;

/// The level grid at the compiled-in size: two flag planes, the feature
/// plane, and the per-cell heads of the object and monster index chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cave {
    info: Vec<u8>,
    info2: Vec<u8>,
    feat: Vec<u8>,
    o_idx: Vec<usize>,
    m_idx: Vec<i16>,
}

impl Default for Cave {
    fn default() -> Self {
        Self::new()
    }
}

impl Cave {
    pub const HEIGHT: usize = DUNGEON_HGT;
    pub const WIDTH: usize = DUNGEON_WID;
    pub const CELLS: usize = DUNGEON_HGT * DUNGEON_WID;

    pub fn new() -> Self {
        Self {
            info: vec![0; Self::CELLS],
            info2: vec![0; Self::CELLS],
            feat: vec![0; Self::CELLS],
            o_idx: vec![0; Self::CELLS],
            m_idx: vec![0; Self::CELLS],
        }
    }

    pub fn in_bounds(y: i32, x: i32) -> bool {
        (0..Self::HEIGHT as i32).contains(&y) && (0..Self::WIDTH as i32).contains(&x)
    }

    fn offset(y: usize, x: usize) -> usize {
        y * Self::WIDTH + x
    }

    pub fn info(&self, y: usize, x: usize) -> u8 {
        self.info[Self::offset(y, x)]
    }

    pub fn info2(&self, y: usize, x: usize) -> u8 {
        self.info2[Self::offset(y, x)]
    }

    pub fn feat(&self, y: usize, x: usize) -> u8 {
        self.feat[Self::offset(y, x)]
    }

    /// Head of the floor pile at (y, x), 0 when empty.
    pub fn o_idx(&self, y: usize, x: usize) -> usize {
        self.o_idx[Self::offset(y, x)]
    }

    pub(crate) fn set_o_idx(&mut self, y: usize, x: usize, o_idx: usize) {
        self.o_idx[Self::offset(y, x)] = o_idx;
    }

    /// Monster occupying (y, x): 0 for none, [`PLAYER_CELL`] for the player.
    pub fn m_idx(&self, y: usize, x: usize) -> i16 {
        self.m_idx[Self::offset(y, x)]
    }

    pub(crate) fn set_m_idx(&mut self, y: usize, x: usize, m_idx: i16) {
        self.m_idx[Self::offset(y, x)] = m_idx;
    }

    /// Decode the three run-length planes in stream order.
    pub fn read_planes<R: Read>(&mut self, r: &mut ChecksumReader<R>) -> io::Result<()> {
        read_rle_plane(r, Self::HEIGHT, Self::WIDTH, |i, v| self.info[i] = v)?;
        read_rle_plane(r, Self::HEIGHT, Self::WIDTH, |i, v| self.info2[i] = v)?;
        read_rle_plane(r, Self::HEIGHT, Self::WIDTH, |i, v| self.feat[i] = v)?;
        Ok(())
    }

    pub fn place_player(&mut self, y: i16, x: i16) -> Result<()> {
        let (yi, xi) = (i32::from(y), i32::from(x));
        if !Self::in_bounds(yi, xi) || self.m_idx(y as usize, x as usize) != 0 {
            return Err(DecodeError::Placement {
                what: "player",
                y: yi,
                x: xi,
            });
        }
        self.set_m_idx(y as usize, x as usize, PLAYER_CELL);
        Ok(())
    }
}

/// Consume three planes laid out for a grid of the declared size without
/// keeping them. Used when a level cannot be reconstructed.
pub fn skip_planes<R: Read>(
    r: &mut ChecksumReader<R>,
    height: usize,
    width: usize,
) -> io::Result<()> {
    for _ in 0..3 {
        read_rle_plane(r, height, width, |_, _| {})?;
    }
    Ok(())
}

/// Expand one run-length plane of `height * width` cells in row-major order.
///
/// Each run is a `(count, value)` byte pair. A run that reaches past the last
/// cell is clamped.
pub fn read_rle_plane<R: Read>(
    r: &mut ChecksumReader<R>,
    height: usize,
    width: usize,
    mut store: impl FnMut(usize, u8),
) -> io::Result<()> {
    let cells = height.saturating_mul(width);
    let mut pos = 0usize;
    while pos < cells {
        let count = r.read_u8()?;
        let value = r.read_u8()?;
        for _ in 0..count {
            if pos >= cells {
                break;
            }
            store(pos, value);
            pos += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Cave, read_rle_plane};
    use crate::error::ErrorKind;
    use crate::fixtures::SaveWriter;
    use crate::reader::ChecksumReader;

    fn reader_for(pairs: &[(u8, u8)]) -> ChecksumReader<Cursor<Vec<u8>>> {
        let mut w = SaveWriter::new(0);
        for &(count, value) in pairs {
            w.write_u8(count);
            w.write_u8(value);
        }
        ChecksumReader::new(Cursor::new(w.into_bytes()))
    }

    #[test]
    fn runs_wrap_rows() {
        let mut r = reader_for(&[(3, 7), (3, 9)]);
        let mut plane = vec![0u8; 6];
        read_rle_plane(&mut r, 2, 3, |i, v| plane[i] = v).unwrap();
        assert_eq!(plane, vec![7, 7, 7, 9, 9, 9]);

        let mut r = reader_for(&[(4, 1), (2, 2)]);
        read_rle_plane(&mut r, 2, 3, |i, v| plane[i] = v).unwrap();
        assert_eq!(plane, vec![1, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn final_run_is_clamped() {
        let mut r = reader_for(&[(2, 5), (255, 6), (1, 0xAA)]);
        let mut plane = vec![0u8; 4];
        read_rle_plane(&mut r, 2, 2, |i, v| plane[i] = v).unwrap();
        assert_eq!(plane, vec![5, 5, 6, 6]);
        // The pair after the clamped run is still unread.
        assert_eq!(r.read_u8().unwrap(), 1);
    }

    #[test]
    fn zero_length_runs_consume_input() {
        let mut r = reader_for(&[(0, 3), (0, 4), (1, 8)]);
        let mut plane = vec![0u8; 1];
        read_rle_plane(&mut r, 1, 1, |i, v| plane[i] = v).unwrap();
        assert_eq!(plane, vec![8]);
    }

    #[test]
    fn truncated_plane_is_io_error() {
        let mut r = reader_for(&[(3, 1)]);
        let result = read_rle_plane(&mut r, 2, 3, |_, _| {});
        assert!(result.is_err());
    }

    #[test]
    fn player_placement_checks_bounds_and_occupancy() {
        let mut cave = Cave::new();
        cave.place_player(5, 10).unwrap();
        assert_eq!(cave.m_idx(5, 10), super::PLAYER_CELL);

        let err = cave.place_player(5, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);
        let err = cave.place_player(Cave::HEIGHT as i16, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);
        let err = cave.place_player(0, -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);
    }
}
