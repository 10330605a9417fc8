use std::io::Cursor;

use angsave_core::error::{ChecksumKind, DecodeError, ErrorKind};
use angsave_core::fixtures::{SaveBuilder, sample_item};
use angsave_core::types::{TV_FOOD, TV_SWORD};
use angsave_core::{LoadError, LoadOptions, Phase, SaveGame};

fn parse_bytes(bytes: &[u8], builder: &SaveBuilder) -> Result<SaveGame, LoadError> {
    SaveGame::parse(Cursor::new(bytes), &builder.tables, LoadOptions::default())
}

fn parse(builder: &SaveBuilder) -> Result<SaveGame, LoadError> {
    parse_bytes(&builder.build(), builder)
}

#[test]
fn flipped_byte_fails_checksum() {
    let builder = SaveBuilder::new();
    let mut bytes = builder.build();
    // Inside the legacy header block, so decoding stays in step.
    bytes[10] ^= 0x40;

    let err = parse_bytes(&bytes, &builder).unwrap_err();
    assert_eq!(err.phase, Phase::Checksum);
    assert!(err.is_corrupt());
}

#[test]
fn damaged_encoded_sum_is_reported_as_such() {
    let builder = SaveBuilder::new();
    let mut bytes = builder.build();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let err = parse_bytes(&bytes, &builder).unwrap_err();
    assert!(matches!(
        err.source,
        DecodeError::ChecksumMismatch {
            kind: ChecksumKind::Encoded,
            ..
        }
    ));
}

#[test]
fn damaged_value_sum_is_reported_first() {
    let builder = SaveBuilder::new();
    let mut bytes = builder.build();
    let value_sum = bytes.len() - 8;
    bytes[value_sum] ^= 0x01;

    let err = parse_bytes(&bytes, &builder).unwrap_err();
    assert!(matches!(
        err.source,
        DecodeError::ChecksumMismatch {
            kind: ChecksumKind::Value,
            ..
        }
    ));
}

#[test]
fn every_truncation_is_a_clean_io_error() {
    let builder = SaveBuilder::new();
    let bytes = builder.build();
    for cut in 0..bytes.len() {
        let err = parse_bytes(&bytes[..cut], &builder)
            .err()
            .unwrap_or_else(|| panic!("truncated at {cut} of {} loaded", bytes.len()));
        assert_eq!(err.kind(), ErrorKind::Io, "truncated at {cut}: {err}");
    }
}

#[test]
fn empty_input_fails_in_header() {
    let builder = SaveBuilder::new();
    let err = parse_bytes(&[], &builder).unwrap_err();
    assert_eq!(err.phase, Phase::Header);
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn more_monster_races_than_loaded_is_overflow() {
    let builder = SaveBuilder::new();
    let bytes = builder.build();
    let mut tables = builder.tables.clone();
    tables.monster_races.pop();

    let err = SaveGame::parse(Cursor::new(bytes), &tables, LoadOptions::default()).unwrap_err();
    assert_eq!(err.phase, Phase::MonsterMemory);
    assert_eq!(err.kind(), ErrorKind::StructuralOverflow);
}

#[test]
fn object_count_above_limit_is_overflow() {
    let mut builder = SaveBuilder::new();
    builder.objects = vec![sample_item(TV_FOOD, 35, 1); 3];
    for (i, item) in builder.objects.iter_mut().enumerate() {
        item.iy = 5;
        item.ix = 5 + i as u8;
    }
    builder.tables.limits.o_max = 3;

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Objects);
    assert_eq!(err.kind(), ErrorKind::StructuralOverflow);
}

#[test]
fn unknown_player_race_is_invalid_reference() {
    let mut builder = SaveBuilder::new();
    builder.player.race = 9;

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Player);
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn player_level_zero_is_invalid_field() {
    let mut builder = SaveBuilder::new();
    builder.player.lev = 0;

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Player);
    assert_eq!(err.kind(), ErrorKind::InvalidField);
}

#[test]
fn too_many_pack_items_is_overflow() {
    let mut builder = SaveBuilder::new();
    builder.inventory = (0..24).map(|i| (i, sample_item(TV_FOOD, 35, 1))).collect();

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Inventory);
    assert_eq!(err.kind(), ErrorKind::StructuralOverflow);
}

#[test]
fn inventory_slot_past_equipment_is_invalid_reference() {
    let mut builder = SaveBuilder::new();
    builder.inventory = vec![(36, sample_item(TV_SWORD, 4, 1))];

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Inventory);
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn unknown_store_owner_is_invalid_reference() {
    let mut builder = SaveBuilder::new();
    builder.stores[0].owner = 4;

    let err = parse(&builder).unwrap_err();
    assert_eq!(err.phase, Phase::Stores);
    assert_eq!(err.kind(), ErrorKind::InvalidReference);
}

#[test]
fn structural_errors_are_not_corruption() {
    let mut builder = SaveBuilder::new();
    builder.player.lev = 51;

    let err = parse(&builder).unwrap_err();
    assert!(!err.is_corrupt());
    assert!(err.to_string().contains("player"), "{err}");
}

#[test]
fn missing_file_is_io_error() {
    let builder = SaveBuilder::new();
    let path = std::env::temp_dir().join("angsave-no-such-savefile");
    let err = SaveGame::load(&path, &builder.tables, LoadOptions::default()).unwrap_err();
    assert_eq!(err.phase, Phase::Header);
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn load_reads_savefile_from_disk() {
    let builder = SaveBuilder::new();
    let path = std::env::temp_dir().join(format!("angsave-load-{}.sav", std::process::id()));
    std::fs::write(&path, builder.build()).expect("write temp savefile");

    let loaded = SaveGame::load(&path, &builder.tables, LoadOptions::default());
    let _ = std::fs::remove_file(&path);
    let save = loaded.unwrap_or_else(|e| panic!("failed to load {:?}: {}", path, e));
    assert_eq!(save.player.name, "Frodo");
}
