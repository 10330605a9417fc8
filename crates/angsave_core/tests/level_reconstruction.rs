use std::io::Cursor;

use angsave_core::error::ErrorKind;
use angsave_core::fixtures::{DungeonLayout, SaveBuilder, sample_item};
use angsave_core::item::Item;
use angsave_core::monster::Monster;
use angsave_core::types::{TV_FOOD, TV_LIGHT, TV_POTION};
use angsave_core::{LevelStatus, LoadError, LoadOptions, Phase, RegenReason, SaveGame};

fn parse(builder: &SaveBuilder) -> Result<SaveGame, LoadError> {
    SaveGame::parse(
        Cursor::new(builder.build()),
        &builder.tables,
        LoadOptions::default(),
    )
}

fn load(builder: &SaveBuilder) -> SaveGame {
    parse(builder).unwrap_or_else(|e| panic!("failed to load built savefile: {e}"))
}

fn monster(r_idx: i16, fy: u8, fx: u8) -> Monster {
    Monster {
        r_idx,
        fy,
        fx,
        hp: 10,
        maxhp: 10,
        mspeed: 110,
        ..Monster::default()
    }
}

fn on_floor(mut item: Item, iy: u8, ix: u8) -> Item {
    item.iy = iy;
    item.ix = ix;
    item
}

fn carried(mut item: Item, m_idx: i16) -> Item {
    item.held_m_idx = m_idx;
    item
}

#[test]
fn piles_and_hoards_are_rebuilt() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(1, 5, 5), monster(2, 6, 6)];
    builder.objects = vec![
        on_floor(sample_item(TV_FOOD, 35, 1), 10, 21),
        on_floor(sample_item(TV_POTION, 34, 2), 10, 21),
        carried(sample_item(TV_FOOD, 35, 1), 2),
        carried(sample_item(TV_LIGHT, 1, 1), 1),
        carried(sample_item(TV_POTION, 34, 1), 2),
    ];

    let save = load(&builder);
    let level = &save.level;
    assert_eq!(level.status, LevelStatus::Placed);
    assert_eq!(level.object_count(), 5);
    assert_eq!(level.monster_count(), 2);

    assert_eq!(level.floor_pile(10, 21), vec![2, 1]);
    assert_eq!(level.hoard(1), vec![4]);
    assert_eq!(level.hoard(2), vec![5, 3]);
    assert!(level.floor_pile(10, 22).is_empty());

    assert_eq!(level.cave.m_idx(5, 5), 1);
    assert_eq!(level.cave.m_idx(6, 6), 2);
    assert_eq!(level.monster(2).map(|m| m.r_idx), Some(2));
}

#[test]
fn every_object_is_in_exactly_one_chain() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(3, 30, 40)];
    builder.objects = (0..8u8)
        .map(|i| match i % 3 {
            0 => carried(sample_item(TV_FOOD, 35, 1), 1),
            1 => on_floor(sample_item(TV_POTION, 34, 1), 2, 2),
            _ => on_floor(sample_item(TV_LIGHT, 1, 1), 3, i),
        })
        .collect();

    let save = load(&builder);
    let level = &save.level;
    let mut seen: Vec<usize> = level.hoard(1);
    for y in 0..4 {
        for x in 0..10 {
            seen.extend(level.floor_pile(y, x));
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=8).collect::<Vec<_>>());
}

#[test]
fn unknown_kind_leaves_an_empty_slot() {
    let mut builder = SaveBuilder::new();
    let mut retired = on_floor(sample_item(TV_FOOD, 35, 1), 4, 4);
    retired.sval = 99;
    builder.objects = vec![
        retired,
        on_floor(sample_item(TV_POTION, 34, 1), 4, 4),
    ];

    let save = load(&builder);
    assert!(save.level.object(1).is_none());
    assert_eq!(save.level.floor_pile(4, 4), vec![2]);
}

#[test]
fn unknown_monster_race_is_kept() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(40, 7, 7)];

    let save = load(&builder);
    assert_eq!(save.level.monster(1).map(|m| m.r_idx), Some(40));
}

#[test]
fn monster_on_player_is_placement_error() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(1, 10, 20)];

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Monsters);
    assert_eq!(err.kind(), ErrorKind::Placement);
}

#[test]
fn two_monsters_on_one_cell_is_placement_error() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(1, 3, 3), monster(2, 3, 3)];

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Placement);
}

#[test]
fn object_held_by_missing_monster_is_invalid_reference() {
    let mut builder = SaveBuilder::new();
    builder.monsters = vec![monster(1, 3, 3)];
    builder.objects = vec![carried(sample_item(TV_FOOD, 35, 1), 2)];

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Monsters);
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn player_outside_grid_is_placement_error() {
    let mut builder = SaveBuilder::new();
    builder.dungeon.py = 70;

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Dungeon);
    assert_eq!(err.kind(), ErrorKind::Placement);
}

#[test]
fn foreign_dimensions_regenerate_and_keep_loading() {
    let mut builder = SaveBuilder::new();
    builder.dungeon = DungeonLayout {
        depth: 5,
        py: 3,
        px: 3,
        height: 22,
        width: 80,
        feat: vec![1; 22 * 80],
    };
    builder.monsters = vec![monster(1, 4, 4)];
    builder.objects = vec![on_floor(sample_item(TV_FOOD, 35, 1), 4, 4)];

    let save = load(&builder);
    assert_eq!(
        save.level.status,
        LevelStatus::Regenerate {
            reason: RegenReason::DimensionMismatch {
                height: 22,
                width: 80
            }
        }
    );
    assert_eq!(save.level.object_count(), 0);
    assert_eq!(save.level.monster_count(), 0);
    assert_eq!(save.history, builder.history);
}

#[test]
fn illegal_depth_regenerates() {
    let mut builder = SaveBuilder::new();
    builder.dungeon.depth = 200;

    let save = load(&builder);
    assert_eq!(
        save.level.status,
        LevelStatus::Regenerate {
            reason: RegenReason::IllegalDepth { depth: 200 }
        }
    );
    assert!(!save.level.is_placed());
}

#[test]
fn dead_character_has_no_level() {
    let mut builder = SaveBuilder::new();
    builder.misc.is_dead = true;
    builder.monsters = vec![monster(1, 3, 3)];

    let save = load(&builder);
    assert_eq!(save.level.status, LevelStatus::PlayerDead);
    assert_eq!(save.level.monster_count(), 0);
    assert_eq!(save.history, builder.history);
}
