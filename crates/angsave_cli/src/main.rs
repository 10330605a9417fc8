use std::fs;
use std::path::PathBuf;
use std::process;

use angsave_core::core_api::{CoreErrorCode, Engine, InventoryEntry, Session, StatEntry};
use angsave_core::{ContentTables, LoadOptions};
use clap::Parser;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVEFILE")]
    path: PathBuf,
    /// Content tables the save is checked against (JSON).
    #[arg(long, value_name = "TABLES.JSON")]
    tables: PathBuf,
    /// Keep a dead character's stored random artifacts.
    #[arg(long)]
    wizard: bool,
    #[arg(long)]
    name: bool,
    #[arg(long)]
    race: bool,
    #[arg(long)]
    class: bool,
    #[arg(long)]
    sex: bool,
    #[arg(long)]
    level: bool,
    #[arg(long)]
    xp: bool,
    #[arg(long)]
    hp: bool,
    #[arg(long)]
    gold: bool,
    #[arg(long)]
    depth: bool,
    #[arg(long = "max-depth")]
    max_depth: bool,
    #[arg(long)]
    turn: bool,
    #[arg(long = "format-version")]
    format_version: bool,
    #[arg(long)]
    status: bool,
    #[arg(long)]
    stats: bool,
    #[arg(long)]
    inventory: bool,
    #[arg(long)]
    messages: bool,
    #[arg(long)]
    history: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct FieldSelection {
    name: bool,
    race: bool,
    class: bool,
    sex: bool,
    level: bool,
    xp: bool,
    hp: bool,
    gold: bool,
    depth: bool,
    max_depth: bool,
    turn: bool,
    format_version: bool,
    status: bool,
    stats: bool,
    inventory: bool,
    messages: bool,
    history: bool,
}

impl FieldSelection {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            name: cli.name,
            race: cli.race,
            class: cli.class,
            sex: cli.sex,
            level: cli.level,
            xp: cli.xp,
            hp: cli.hp,
            gold: cli.gold,
            depth: cli.depth,
            max_depth: cli.max_depth,
            turn: cli.turn,
            format_version: cli.format_version,
            status: cli.status,
            stats: cli.stats,
            inventory: cli.inventory,
            messages: cli.messages,
            history: cli.history,
        }
    }

    fn is_field_mode(&self) -> bool {
        self.name
            || self.race
            || self.class
            || self.sex
            || self.level
            || self.xp
            || self.hp
            || self.gold
            || self.depth
            || self.max_depth
            || self.turn
            || self.format_version
            || self.status
            || self.stats
            || self.inventory
            || self.messages
            || self.history
    }

    fn selected_pairs(&self, session: &Session) -> Vec<(&'static str, String)> {
        let snapshot = session.snapshot();
        let mut out = Vec::new();

        if self.name {
            out.push(("name", snapshot.character_name.clone()));
        }
        if self.race {
            out.push(("race", snapshot.race.clone()));
        }
        if self.class {
            out.push(("class", snapshot.class.clone()));
        }
        if self.sex {
            out.push(("sex", snapshot.sex.clone()));
        }
        if self.level {
            out.push(("level", snapshot.level.to_string()));
        }
        if self.xp {
            out.push(("xp", snapshot.experience.to_string()));
        }
        if self.hp {
            out.push(("hp", format!("{}/{}", snapshot.hp, snapshot.max_hp)));
        }
        if self.gold {
            out.push(("gold", snapshot.gold.to_string()));
        }
        if self.depth {
            out.push(("depth", snapshot.depth.to_string()));
        }
        if self.max_depth {
            out.push(("max_depth", snapshot.max_depth.to_string()));
        }
        if self.turn {
            out.push(("turn", snapshot.turn.to_string()));
        }
        if self.format_version {
            out.push(("version", snapshot.version.clone()));
        }
        if self.status {
            out.push(("status", snapshot.level_status.clone()));
        }
        if self.stats {
            for s in session.stats() {
                out.push(("stat", format!("{}={}", s.name, s.current)));
            }
        }
        if self.inventory {
            for item in session.inventory() {
                out.push(("inventory", format!("{} {}", item.slot, describe_item(item))));
            }
        }
        if self.messages {
            for m in session.messages() {
                out.push(("message", m.text.clone()));
            }
        }
        if self.history {
            for h in session.history() {
                out.push(("history", format!("{} {}", h.turn, h.text)));
            }
        }

        out
    }

    fn selected_json(&self, session: &Session) -> JsonMap<String, JsonValue> {
        let snapshot = session.snapshot();
        let mut out = JsonMap::new();

        if self.name {
            out.insert(
                "name".to_string(),
                JsonValue::String(snapshot.character_name.clone()),
            );
        }
        if self.race {
            out.insert("race".to_string(), JsonValue::String(snapshot.race.clone()));
        }
        if self.class {
            out.insert(
                "class".to_string(),
                JsonValue::String(snapshot.class.clone()),
            );
        }
        if self.sex {
            out.insert("sex".to_string(), JsonValue::String(snapshot.sex.clone()));
        }
        if self.level {
            out.insert("level".to_string(), JsonValue::from(snapshot.level));
        }
        if self.xp {
            out.insert("xp".to_string(), JsonValue::from(snapshot.experience));
        }
        if self.hp {
            out.insert("hp".to_string(), JsonValue::from(snapshot.hp));
            out.insert("max_hp".to_string(), JsonValue::from(snapshot.max_hp));
        }
        if self.gold {
            out.insert("gold".to_string(), JsonValue::from(snapshot.gold));
        }
        if self.depth {
            out.insert("depth".to_string(), JsonValue::from(snapshot.depth));
        }
        if self.max_depth {
            out.insert("max_depth".to_string(), JsonValue::from(snapshot.max_depth));
        }
        if self.turn {
            out.insert("turn".to_string(), JsonValue::from(snapshot.turn));
        }
        if self.format_version {
            out.insert(
                "version".to_string(),
                JsonValue::String(snapshot.version.clone()),
            );
        }
        if self.status {
            out.insert(
                "status".to_string(),
                JsonValue::String(snapshot.level_status.clone()),
            );
        }
        if self.stats {
            out.insert("stats".to_string(), stats_to_json(session));
        }
        if self.inventory {
            out.insert("inventory".to_string(), inventory_to_json(session));
        }
        if self.messages {
            out.insert("messages".to_string(), messages_to_json(session));
        }
        if self.history {
            out.insert("history".to_string(), history_to_json(session));
        }

        out
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let fields = FieldSelection::from_cli(&cli);

    let tables_json = fs::read_to_string(&cli.tables).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.tables.display());
        process::exit(1);
    });
    let tables: ContentTables = serde_json::from_str(&tables_json).unwrap_or_else(|e| {
        eprintln!("Error parsing content tables: {}", cli.tables.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    debug!(
        kinds = tables.kinds.len(),
        artifacts = tables.artifacts.len(),
        monster_races = tables.monster_races.len(),
        "content tables loaded"
    );

    let engine = Engine::with_options(LoadOptions { wizard: cli.wizard });
    let session = engine.open_path(&cli.path, &tables).unwrap_or_else(|e| {
        match e.code {
            CoreErrorCode::Corrupt => {
                eprintln!("Savefile is corrupt: {}", cli.path.display());
            }
            CoreErrorCode::Io => eprintln!("Error reading {}", cli.path.display()),
            CoreErrorCode::Parse => {
                eprintln!("Error parsing savefile: {}", cli.path.display());
            }
        }
        eprintln!("  {}", e.message);
        process::exit(1);
    });

    if cli.json {
        let json = if fields.is_field_mode() {
            JsonValue::Object(fields.selected_json(&session))
        } else {
            JsonValue::Object(default_json(&session))
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if fields.is_field_mode() {
        for (key, value) in fields.selected_pairs(&session) {
            println!("{key}={value}");
        }
        return;
    }

    print_character_sheet(&session);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// JSON output
// ---------------------------------------------------------------------------

fn default_json(session: &Session) -> JsonMap<String, JsonValue> {
    let mut out = match serde_json::to_value(session.snapshot()) {
        Ok(JsonValue::Object(map)) => map,
        _ => JsonMap::new(),
    };
    out.insert("stats".to_string(), stats_to_json(session));
    out.insert("inventory".to_string(), inventory_to_json(session));
    out.insert("history".to_string(), history_to_json(session));
    out
}

fn stats_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .stats()
            .iter()
            .map(|s: &StatEntry| {
                let mut m = JsonMap::new();
                m.insert("name".to_string(), JsonValue::String(s.name.clone()));
                m.insert("current".to_string(), JsonValue::from(s.current));
                m.insert("max".to_string(), JsonValue::from(s.max));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn inventory_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .inventory()
            .iter()
            .map(|item: &InventoryEntry| {
                let mut m = JsonMap::new();
                m.insert("slot".to_string(), JsonValue::from(item.slot));
                m.insert("equipped".to_string(), JsonValue::from(item.equipped));
                m.insert("name".to_string(), JsonValue::String(describe_item(item)));
                m.insert("quantity".to_string(), JsonValue::from(item.quantity));
                m.insert("weight".to_string(), JsonValue::from(item.weight));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn messages_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .messages()
            .iter()
            .map(|m| JsonValue::String(m.text.clone()))
            .collect(),
    )
}

fn history_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .history()
            .iter()
            .map(|h| {
                let mut m = JsonMap::new();
                m.insert("turn".to_string(), JsonValue::from(h.turn));
                m.insert("depth".to_string(), JsonValue::from(h.dlev));
                m.insert("level".to_string(), JsonValue::from(h.clev));
                m.insert("text".to_string(), JsonValue::String(h.text.clone()));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn print_character_sheet(session: &Session) {
    let snapshot = session.snapshot();

    println!();
    let title = format!(
        "{} the {} {}",
        snapshot.character_name, snapshot.race, snapshot.class
    );
    println!("{:^72}", title);
    println!("{:^72}", format!("savefile version {}", snapshot.version));
    println!();

    println!(
        " {:<24}{:<24}{}",
        format!("Sex: {}", snapshot.sex),
        format!("Level: {}", snapshot.level),
        format!("Max Level: {}", snapshot.max_level),
    );
    println!(
        " {:<24}{:<24}{}",
        format!("Gold: {}", format_number_with_commas(snapshot.gold)),
        format!("Exp: {}", format_number_with_commas(snapshot.experience)),
        format!("Max Exp: {}", format_number_with_commas(snapshot.max_experience)),
    );
    println!(
        " {:<24}{:<24}{}",
        format!("HP: {}/{}", snapshot.hp, snapshot.max_hp),
        format!("Depth: {}", format_depth(snapshot.depth)),
        format!("Max Depth: {}", format_depth(snapshot.max_depth)),
    );
    println!(" Turn: {}", snapshot.turn);
    println!();

    for s in session.stats() {
        if s.current == s.max {
            println!(" {:>4}: {}", s.name, format_stat(s.current));
        } else {
            println!(
                " {:>4}: {} ({})",
                s.name.to_lowercase(),
                format_stat(s.current),
                format_stat(s.max)
            );
        }
    }
    println!();

    if snapshot.is_dead {
        let cause = snapshot.died_from.as_deref().unwrap_or("unknown causes");
        println!(" Killed by {cause}.");
    } else {
        println!(" Level: {}", snapshot.level_status);
    }
    println!();

    let inventory = session.inventory();
    if !inventory.is_empty() {
        println!(" ::: Inventory :::");
        for item in inventory {
            let marker = if item.equipped { '*' } else { ' ' };
            println!(
                " {marker}{:>2}) {:<48}{:>6.1} lb",
                item.slot,
                describe_item(item),
                f64::from(item.weight) / 10.0
            );
        }
        println!();
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn describe_item(item: &InventoryEntry) -> String {
    let mut out = if item.quantity > 1 {
        format!("{} {}", item.quantity, item.name)
    } else {
        item.name.clone()
    };
    if let Some(ego) = &item.ego {
        out.push(' ');
        out.push_str(ego);
    }
    if let Some(artifact) = &item.artifact {
        out.push(' ');
        out.push_str(artifact);
    }
    if let Some(note) = &item.inscription {
        out.push_str(&format!(" {{{note}}}"));
    }
    out
}

/// Stats above 18 are shown as 18/xx, the way the game prints them.
fn format_stat(value: i16) -> String {
    if value > 18 {
        let bonus = value - 18;
        if bonus >= 220 {
            "18/***".to_string()
        } else if bonus >= 100 {
            format!("18/{bonus:03}")
        } else {
            format!("18/{bonus:02}")
        }
    } else {
        value.to_string()
    }
}

fn format_depth(depth: i16) -> String {
    if depth == 0 {
        "Town".to_string()
    } else {
        format!("{} ft", i32::from(depth) * 50)
    }
}

fn format_number_with_commas(n: i32) -> String {
    if n < 0 {
        return format!("-{}", format_number_with_commas(n.saturating_neg()));
    }
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
