use angsave_core::LoadOptions;
use angsave_core::core_api::{CoreErrorCode, Engine, InventoryEntry, Session};
use angsave_core::fixtures::{SaveBuilder, sample_item};
use angsave_core::types::{OPT_ADULT_RANDARTS, TV_SWORD};

fn open(builder: &SaveBuilder) -> Session {
    Engine::new()
        .open_bytes(builder.build(), &builder.tables)
        .unwrap_or_else(|e| panic!("failed to open built savefile: {e}"))
}

#[test]
fn snapshot_resolves_names() {
    let session = open(&SaveBuilder::new());
    let snapshot = session.snapshot();

    assert_eq!(snapshot.character_name, "Frodo");
    assert_eq!(snapshot.race, "Hobbit");
    assert_eq!(snapshot.class, "Warrior");
    assert_eq!(snapshot.sex, "Male");
    assert_eq!(snapshot.level, 12);
    assert_eq!(snapshot.gold, 612);
    assert_eq!((snapshot.hp, snapshot.max_hp), (90, 98));
    assert_eq!(snapshot.depth, 5);
    assert_eq!(snapshot.turn, 123_456);
    assert_eq!(snapshot.version, "3.0.14");
    assert_eq!(snapshot.level_status, "placed");
    assert!(!snapshot.is_dead);
    assert_eq!(snapshot.died_from, None);
}

#[test]
fn inventory_lists_pack_then_equipment() {
    let session = open(&SaveBuilder::new());
    let entries = session.inventory();

    assert_eq!(
        entries[0],
        InventoryEntry {
            slot: 0,
            equipped: false,
            name: "Ration of Food".to_string(),
            quantity: 5,
            weight: 40,
            artifact: None,
            ego: None,
            inscription: None,
        }
    );
    assert_eq!(entries[1].slot, 24);
    assert!(entries[1].equipped);
    assert_eq!(entries[1].name, "Dagger");
    assert_eq!(entries.len(), 2);
}

#[test]
fn inventory_names_artifacts_egos_and_inscriptions() {
    let mut builder = SaveBuilder::new();
    let mut sting = sample_item(TV_SWORD, 4, 1);
    sting.name1 = 1;
    sting.inscription = Some("@w1".to_string());
    let mut ego = sample_item(TV_SWORD, 4, 1);
    ego.name2 = 1;
    builder.inventory = vec![(0, ego), (24, sting)];

    let session = open(&builder);
    let entries = session.inventory();
    assert_eq!(entries[0].ego.as_deref(), Some("of Westernesse"));
    assert_eq!(entries[1].artifact.as_deref(), Some("'Sting'"));
    assert_eq!(entries[1].inscription.as_deref(), Some("@w1"));
    assert_eq!(entries[1].weight, 75);
}

#[test]
fn stats_messages_and_history_are_exposed() {
    let session = open(&SaveBuilder::new());

    let stats = session.stats();
    assert_eq!(stats.len(), 6);
    assert_eq!(stats[3].name, "Dex");
    assert_eq!(stats[3].current, 17);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "Welcome to the dungeon.");

    assert_eq!(session.history().len(), 1);
}

#[test]
fn dead_character_snapshot() {
    let mut builder = SaveBuilder::new();
    builder.misc.is_dead = true;
    builder.player.died_from = "Fang, Farmer Maggot's Dog".to_string();

    let session = open(&builder);
    let snapshot = session.snapshot();
    assert!(snapshot.is_dead);
    assert_eq!(snapshot.died_from.as_deref(), Some("Fang, Farmer Maggot's Dog"));
    assert_eq!(snapshot.level_status, "player dead");
}

#[test]
fn wizard_option_flows_to_loader() {
    let mut builder = SaveBuilder::new();
    builder.options = vec![OPT_ADULT_RANDARTS];
    builder.randarts = builder.tables.artifacts.clone();
    builder.misc.is_dead = true;

    let session = Engine::with_options(LoadOptions { wizard: true })
        .open_bytes(builder.build(), &builder.tables)
        .unwrap_or_else(|e| panic!("failed to open built savefile: {e}"));
    assert_eq!(
        session.save().randarts,
        angsave_core::sections::RandartSource::Stored { count: 3 }
    );
}

#[test]
fn checksum_failure_maps_to_corrupt() {
    let builder = SaveBuilder::new();
    let mut bytes = builder.build();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let err = Engine::new().open_bytes(bytes, &builder.tables).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Corrupt);
}

#[test]
fn structural_failure_maps_to_parse() {
    let mut builder = SaveBuilder::new();
    builder.player.class = 12;

    let err = Engine::new()
        .open_bytes(builder.build(), &builder.tables)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Parse);
    assert!(err.message.contains("player class"), "{}", err.message);
}

#[test]
fn missing_path_maps_to_io() {
    let builder = SaveBuilder::new();
    let err = Engine::new()
        .open_path(std::env::temp_dir().join("angsave-missing.sav"), &builder.tables)
        .unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Io);
}

#[test]
fn snapshot_serializes_to_json() {
    let session = open(&SaveBuilder::new());
    let json = serde_json::to_value(session.snapshot()).expect("snapshot should serialize");
    assert_eq!(json["race"], "Hobbit");
    assert_eq!(json["died_from"], serde_json::Value::Null);
}
