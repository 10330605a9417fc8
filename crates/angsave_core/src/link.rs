//! Rebuilds the transient object chains after the level arenas are loaded.
//!
//! Every chain is built by pushing onto the head in ascending object index,
//! so the highest-numbered object ends up first.

use crate::cave::Cave;
use crate::error::{DecodeError, Result};
use crate::level::Level;

/// Thread every floor object into the pile of its cell.
pub fn link_floor_objects(level: &mut Level) -> Result<()> {
    let Level { cave, objects, .. } = level;
    for (o_idx, slot) in objects.iter_mut().enumerate().skip(1) {
        let Some(item) = slot else { continue };
        if item.held_m_idx != 0 {
            continue;
        }
        let (y, x) = (usize::from(item.iy), usize::from(item.ix));
        if !Cave::in_bounds(y as i32, x as i32) {
            return Err(DecodeError::reference(
                "object location",
                i64::from(item.iy) * Cave::WIDTH as i64 + i64::from(item.ix),
                Cave::CELLS,
            ));
        }
        item.next_o_idx = cave.o_idx(y, x);
        cave.set_o_idx(y, x, o_idx);
    }
    Ok(())
}

/// Thread every carried object into its owner's hoard.
pub fn link_held_objects(level: &mut Level) -> Result<()> {
    let Level {
        objects, monsters, ..
    } = level;
    let limit = monsters.len();
    for (o_idx, slot) in objects.iter_mut().enumerate().skip(1) {
        let Some(item) = slot else { continue };
        let holder = item.held_m_idx;
        if holder == 0 {
            continue;
        }
        let owner = usize::try_from(holder)
            .ok()
            .and_then(|m_idx| monsters.get_mut(m_idx))
            .and_then(Option::as_mut)
            .ok_or_else(|| DecodeError::reference("monster", holder, limit))?;
        item.next_o_idx = owner.hold_o_idx;
        owner.hold_o_idx = o_idx;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{link_floor_objects, link_held_objects};
    use crate::error::ErrorKind;
    use crate::item::Item;
    use crate::level::{Level, LevelStatus};
    use crate::monster::Monster;

    fn floor(iy: u8, ix: u8) -> Option<Item> {
        Some(Item {
            iy,
            ix,
            ..Item::default()
        })
    }

    fn held(m_idx: i16) -> Option<Item> {
        Some(Item {
            held_m_idx: m_idx,
            ..Item::default()
        })
    }

    fn level_with(objects: Vec<Option<Item>>) -> Level {
        let mut level = Level::new(LevelStatus::Placed);
        level.objects.extend(objects);
        level
    }

    #[test]
    fn floor_piles_put_highest_index_first() {
        let mut level = level_with(vec![floor(2, 3), floor(9, 9), None, floor(2, 3)]);
        link_floor_objects(&mut level).unwrap();

        assert_eq!(level.cave.o_idx(2, 3), 4);
        assert_eq!(level.floor_pile(2, 3), vec![4, 1]);
        assert_eq!(level.floor_pile(9, 9), vec![2]);
        assert!(level.floor_pile(0, 0).is_empty());
    }

    #[test]
    fn held_objects_skip_the_floor() {
        let mut level = level_with(vec![held(1), floor(2, 3), held(1)]);
        level
            .place_monster(Monster {
                r_idx: 1,
                fy: 5,
                fx: 5,
                ..Monster::default()
            })
            .unwrap();

        link_floor_objects(&mut level).unwrap();
        link_held_objects(&mut level).unwrap();

        assert_eq!(level.floor_pile(2, 3), vec![2]);
        assert_eq!(level.hoard(1), vec![3, 1]);
        assert_eq!(level.cave.o_idx(0, 0), 0);
    }

    #[test]
    fn holder_outside_the_arena_is_rejected() {
        let mut level = level_with(vec![held(4)]);
        let err = link_held_objects(&mut level).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);

        let mut level = level_with(vec![held(-2)]);
        let err = link_held_objects(&mut level).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn floor_object_outside_grid_is_rejected() {
        let mut level = level_with(vec![floor(100, 3)]);
        let err = link_floor_objects(&mut level).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }
}
