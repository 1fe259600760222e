// 💾 Hero Store - saved heroes in SQLite + WAL
//
// Heroes are stored whole, as JSON. The store never computes anything;
// it only hands snapshots to the planner and takes new ones back.

use crate::error::{PlannerError, Result};
use crate::hero::{Hero, Rarity};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CURRENT_HERO_KEY: &str = "current_hero";

/// A stored hero plus listing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedHero {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub last_modified: DateTime<Utc>,
    pub hero: Hero,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Heroes Table (full snapshot as JSON, listing columns alongside)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS heroes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            rarity TEXT NOT NULL,
            last_modified TEXT NOT NULL,
            revision INTEGER NOT NULL,
            hero_json TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // App State (which hero is currently selected)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_heroes_revision ON heroes(revision)",
        [],
    )?;

    Ok(())
}

/// Insert or replace a hero and make it the current one
pub fn save_hero(conn: &Connection, hero: &Hero) -> Result<SavedHero> {
    hero.validate()?;

    let now = Utc::now();
    let hero_json = serde_json::to_string(hero)?;

    // Row and current selection change together or not at all
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO heroes (id, name, rarity, last_modified, revision, hero_json)
         VALUES (?1, ?2, ?3, ?4, (SELECT COALESCE(MAX(revision), 0) + 1 FROM heroes), ?5)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            rarity = excluded.rarity,
            last_modified = excluded.last_modified,
            revision = excluded.revision,
            hero_json = excluded.hero_json",
        params![
            hero.id,
            hero.name,
            hero.rarity.as_str(),
            now.to_rfc3339_opts(SecondsFormat::Micros, true),
            hero_json,
        ],
    )?;

    set_current_hero_id(&tx, &hero.id)?;
    tx.commit()?;
    debug!(hero_id = %hero.id, name = %hero.name, "hero saved");

    Ok(SavedHero {
        id: hero.id.clone(),
        name: hero.name.clone(),
        rarity: hero.rarity,
        last_modified: now,
        hero: hero.clone(),
    })
}

/// All saved heroes, most recently saved first
pub fn get_saved_heroes(conn: &Connection) -> Result<Vec<SavedHero>> {
    let mut stmt = conn.prepare(
        "SELECT last_modified, hero_json
         FROM heroes
         ORDER BY revision DESC",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let last_modified: String = row.get(0)?;
            let hero_json: String = row.get(1)?;
            Ok((last_modified, hero_json))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(last_modified, hero_json)| saved_hero_from_row(&last_modified, &hero_json))
        .collect()
}

/// Hero by id, None if it was never saved
pub fn get_hero(conn: &Connection, hero_id: &str) -> Result<Option<Hero>> {
    let hero_json: Option<String> = conn
        .query_row(
            "SELECT hero_json FROM heroes WHERE id = ?1",
            params![hero_id],
            |row| row.get(0),
        )
        .optional()?;

    hero_json
        .map(|json| serde_json::from_str(&json).map_err(PlannerError::from))
        .transpose()
}

/// Hero by id, also marked as the current hero
pub fn load_hero(conn: &Connection, hero_id: &str) -> Result<Option<Hero>> {
    let hero = get_hero(conn, hero_id)?;
    if hero.is_some() {
        set_current_hero_id(conn, hero_id)?;
    }
    Ok(hero)
}

/// The current hero, if one is selected and still stored
pub fn get_current_hero(conn: &Connection) -> Result<Option<Hero>> {
    match current_hero_id(conn)? {
        Some(id) => get_hero(conn, &id),
        None => Ok(None),
    }
}

/// Delete a hero; clears the current selection if it pointed at it.
/// Returns false when no hero had that id.
pub fn delete_hero(conn: &Connection, hero_id: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let deleted = tx.execute("DELETE FROM heroes WHERE id = ?1", params![hero_id])?;

    if current_hero_id(&tx)?.as_deref() == Some(hero_id) {
        tx.execute(
            "DELETE FROM app_state WHERE key = ?1",
            params![CURRENT_HERO_KEY],
        )?;
    }
    tx.commit()?;

    Ok(deleted > 0)
}

/// Remove every hero and the current selection
pub fn clear_all_hero_data(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM heroes", [])?;
    conn.execute(
        "DELETE FROM app_state WHERE key = ?1",
        params![CURRENT_HERO_KEY],
    )?;
    Ok(())
}

pub fn count_heroes(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM heroes", [], |row| row.get(0))?;
    Ok(count)
}

fn current_hero_id(conn: &Connection) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1",
            params![CURRENT_HERO_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn set_current_hero_id(conn: &Connection, hero_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
        params![CURRENT_HERO_KEY, hero_id],
    )?;
    Ok(())
}

fn saved_hero_from_row(last_modified: &str, hero_json: &str) -> Result<SavedHero> {
    let hero: Hero = serde_json::from_str(hero_json)?;
    let last_modified = DateTime::parse_from_rfc3339(last_modified)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            PlannerError::CorruptRecord(format!(
                "hero {} has a bad timestamp '{}': {}",
                hero.id, last_modified, e
            ))
        })?;

    Ok(SavedHero {
        id: hero.id.clone(),
        name: hero.name.clone(),
        rarity: hero.rarity,
        last_modified,
        hero,
    })
}
