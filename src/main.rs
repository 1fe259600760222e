// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use futures::executor::block_on;
use rusqlite::Connection;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Use library instead of local modules
use upgrade_planner::{
    category_progress, get_current_hero, get_hero, get_saved_heroes, group_by_category,
    load_hero, progress_percent, save_hero, setup_database, Config, CostTable, CostTableIndex,
    CsvCostTableProvider, Hero, MaterialCatalog, PlanBuilder, Rarity, Track, UpgradePath,
};

const USAGE: &str = "\
Usage: upgrade-planner <command>

Commands:
  new <name> <legendary|mythic>    Create and save a hero
  list                             List saved heroes, most recent first
  show <hero-id>                   Show a hero and its pending upgrades
  plan <hero-id>                   Material bill for maxing every track
  preview <path> <from> <to>       Cost of one level range on one path
  set <hero-id> <track> <level>    Set one track (e.g. ability:1, gear:2, mod:1:3)
  validate                         Check the cost table and material catalog
  ui [hero-id]                     Interactive planner (default)";

fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env();
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("ui");
    let rest = args.get(1..).unwrap_or_default();

    match command {
        "new" => run_new(&config, rest),
        "list" => run_list(&config),
        "show" => run_show(&config, rest),
        "plan" => run_plan(&config, rest),
        "preview" => run_preview(&config, rest),
        "set" => run_set(&config, rest),
        "validate" => run_validate(&config),
        "ui" => run_ui_mode(&config, rest.first().map(String::as_str)),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(config: &Config) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("opening hero store {}", config.db_path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn cost_index(config: &Config) -> CostTableIndex<CsvCostTableProvider> {
    CostTableIndex::new(CsvCostTableProvider::new(&config.costs_csv))
}

fn require_hero(conn: &Connection, hero_id: &str) -> Result<Hero> {
    get_hero(conn, hero_id)?.ok_or_else(|| anyhow!("Hero not found: {}", hero_id))
}

fn arg<'a>(rest: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing <{}>\n\n{}", name, USAGE))
}

fn parse_level(raw: &str) -> Result<u32> {
    raw.parse()
        .with_context(|| format!("'{}' is not a level", raw))
}

fn run_new(config: &Config, rest: &[String]) -> Result<()> {
    let name = arg(rest, 0, "name")?;
    let rarity: Rarity = arg(rest, 1, "rarity")?.parse().map_err(|e: String| anyhow!(e))?;

    let conn = open_store(config)?;
    let saved = save_hero(&conn, &Hero::new(name, rarity))?;

    println!("✓ Created {} ({})", saved.name, saved.rarity.as_str());
    println!("  id: {}", saved.id);
    Ok(())
}

fn run_list(config: &Config) -> Result<()> {
    let conn = open_store(config)?;
    let heroes = get_saved_heroes(&conn)?;
    let current = get_current_hero(&conn)?.map(|h| h.id);

    if heroes.is_empty() {
        println!("No saved heroes. Create one with: upgrade-planner new <name> <rarity>");
        return Ok(());
    }

    println!("🦸 Saved heroes ({})", heroes.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for saved in heroes {
        let marker = if current.as_deref() == Some(saved.id.as_str()) { "→" } else { " " };
        println!(
            "{} {:<24} {:<10} {}  {}",
            marker,
            saved.name,
            saved.rarity.as_str(),
            saved.last_modified.format("%Y-%m-%d %H:%M"),
            saved.id
        );
    }
    Ok(())
}

fn run_show(config: &Config, rest: &[String]) -> Result<()> {
    let hero_id = arg(rest, 0, "hero-id")?;
    let conn = open_store(config)?;
    let hero = load_hero(&conn, hero_id)?.ok_or_else(|| anyhow!("Hero not found: {}", hero_id))?;

    let targets = upgrade_planner::enumerate_targets(&hero);
    let progress = category_progress(&targets);

    println!("🦸 {} ({}, power {})", hero.name, hero.rarity.as_str(), hero.power);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Overall progress: {:.1}%", progress_percent(&targets));

    for (category, group) in group_by_category(&targets) {
        println!(
            "\n{} ({:.1}%)",
            category.title(),
            progress.get(&category).copied().unwrap_or(100.0)
        );
        for target in group {
            println!(
                "  {:<36} {:<16} {:>3} → {:<3} [{}]",
                target.item_name,
                target.subcategory,
                target.current_level,
                target.target_level,
                target.track
            );
        }
    }

    if targets.is_empty() {
        println!("\n🎉 Every track is maxed");
    }
    Ok(())
}

fn run_plan(config: &Config, rest: &[String]) -> Result<()> {
    let hero_id = arg(rest, 0, "hero-id")?;
    let conn = open_store(config)?;
    let hero = require_hero(&conn, hero_id)?;

    let index = cost_index(config);
    let plan = block_on(PlanBuilder::new(&index).build_max(&hero))?;

    println!("📦 Upgrade plan for {}", hero.name);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", plan.summary());

    println!("\nMaterials needed:");
    for (material, amount) in plan.material_summary.sorted_by_amount() {
        println!("  {:<32} {:>10}", material, amount);
    }
    println!("  {:<32} {:>10}", "TOTAL", plan.material_summary.total_units());

    let failures = plan.failures();
    if !failures.is_empty() {
        println!("\n⚠️  Targets with no cost data:");
        for (target, reason) in failures {
            println!("  {} ({}): {}", target.item_name, target.path, reason);
        }
    }
    Ok(())
}

fn run_preview(config: &Config, rest: &[String]) -> Result<()> {
    let path: UpgradePath = arg(rest, 0, "path")?.parse().map_err(|e: String| anyhow!(e))?;
    let from = parse_level(arg(rest, 1, "from")?)?;
    let to = parse_level(arg(rest, 2, "to")?)?;

    let index = cost_index(config);
    let preview = block_on(PlanBuilder::new(&index).preview(path, from, to))?;

    println!("🔍 {} {} → {}", path.display_name(), from, to);
    if preview.materials.is_empty() {
        println!("  No costs in this range");
    }
    for (material, amount) in preview.materials.sorted_by_amount() {
        println!("  {:<32} {:>10}", material, amount);
    }
    Ok(())
}

fn run_set(config: &Config, rest: &[String]) -> Result<()> {
    let hero_id = arg(rest, 0, "hero-id")?;
    let track: Track = arg(rest, 1, "track")?.parse().map_err(|e: String| anyhow!(e))?;
    let level = parse_level(arg(rest, 2, "level")?)?;

    let conn = open_store(config)?;
    let hero = require_hero(&conn, hero_id)?;
    let before = hero.level_of(track);
    let updated = hero.with_level(track, level)?;
    save_hero(&conn, &updated)?;

    match before {
        Some(before) => println!("✓ {} {}: {} → {}", updated.name, track, before, level),
        None => println!("✓ {} {}: {}", updated.name, track, level),
    }
    Ok(())
}

fn run_validate(config: &Config) -> Result<()> {
    println!("🔍 Validating cost data");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let table = CostTable::load_csv(&config.costs_csv)?;
    println!("✓ Loaded {} cost rows from {}", table.len(), config.costs_csv.display());
    println!("  fingerprint {}", table.fingerprint());

    let mut problems = 0;

    if let Err(e) = table.validate_paths() {
        println!("✗ {}", e);
        problems += 1;
    }

    let unrecognized = table.unrecognized_paths();
    if !unrecognized.is_empty() {
        println!("✗ Unrecognized paths: {}", unrecognized.join(", "));
        problems += 1;
    }

    match MaterialCatalog::load_csv(&config.materials_csv) {
        Ok(catalog) => {
            println!("✓ Loaded {} materials from {}", catalog.len(), config.materials_csv.display());
            let unknown = table.unknown_materials(&catalog);
            if !unknown.is_empty() {
                println!("✗ Materials missing from catalog: {}", unknown.join(", "));
                problems += 1;
            }
        }
        Err(e) => {
            println!("⚠️  {}", e);
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    println!("✅ Cost data is consistent");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, hero_id: Option<&str>) -> Result<()> {
    let conn = open_store(config)?;

    let hero = match hero_id {
        Some(id) => load_hero(&conn, id)?.ok_or_else(|| anyhow!("Hero not found: {}", id))?,
        None => match get_current_hero(&conn)? {
            Some(hero) => hero,
            None => bail!("No current hero. Create one with: upgrade-planner new <name> <rarity>"),
        },
    };

    let index = cost_index(config);
    block_on(index.load()).context("loading cost table")?;

    let mut app = ui::App::new(hero, &index);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _hero_id: Option<&str>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin planner-server --features server");
    std::process::exit(1);
}
