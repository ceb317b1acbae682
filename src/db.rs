use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::aggregator::BatchStats;
use crate::registry::parse_register_date;
use crate::report::BuildingSummary;

/// One reconciliation run, appended to the run log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub source_files: Vec<String>,
    pub accepted: usize,
    pub skipped: usize,
    pub buildings: usize,
}

impl RunRecord {
    pub fn new(source_files: Vec<String>, stats: &BatchStats, buildings: usize) -> Self {
        RunRecord {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source_files,
            accepted: stats.accepted,
            skipped: stats.skipped(),
            buildings,
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Buildings (one row per summary, identified by the building-key hash)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS buildings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            building_hash TEXT UNIQUE NOT NULL,
            building_name TEXT NOT NULL,
            address TEXT NOT NULL,
            building_type TEXT NOT NULL,
            room_type TEXT NOT NULL,
            area REAL NOT NULL,
            floor INTEGER NOT NULL,
            deposit REAL NOT NULL,
            monthly_rent REAL NOT NULL,
            construction_year INTEGER NOT NULL,
            road_name TEXT NOT NULL,
            sample_count INTEGER NOT NULL,
            households INTEGER NOT NULL,
            floors_ground INTEGER NOT NULL,
            floors_basement INTEGER NOT NULL,
            elevators INTEGER NOT NULL,
            building_usage TEXT,
            heating_type TEXT,
            approval_date TEXT,
            completion_date TEXT,
            registry_match TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Run log
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ingest_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            source_files TEXT NOT NULL,
            accepted INTEGER NOT NULL,
            skipped INTEGER NOT NULL,
            buildings INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_buildings_address ON buildings(address)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_buildings_room_type ON buildings(room_type)",
        [],
    )?;

    Ok(())
}

/// Blank text becomes NULL
fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Register dates are stored as ISO dates; anything unparseable as NULL
fn iso_date(value: &str) -> Option<String> {
    parse_register_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Upsert summaries keyed on `building_hash`. Re-running the same batch
/// updates rows in place instead of duplicating them.
pub fn insert_summaries(conn: &mut Connection, summaries: &[BuildingSummary]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO buildings (
                building_hash, building_name, address, building_type, room_type,
                area, floor, deposit, monthly_rent, construction_year,
                road_name, sample_count, households, floors_ground, floors_basement,
                elevators, building_usage, heating_type, approval_date, completion_date,
                registry_match
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            ON CONFLICT(building_hash) DO UPDATE SET
                area = excluded.area,
                floor = excluded.floor,
                deposit = excluded.deposit,
                monthly_rent = excluded.monthly_rent,
                construction_year = excluded.construction_year,
                road_name = excluded.road_name,
                sample_count = excluded.sample_count,
                households = excluded.households,
                floors_ground = excluded.floors_ground,
                floors_basement = excluded.floors_basement,
                elevators = excluded.elevators,
                building_usage = excluded.building_usage,
                heating_type = excluded.heating_type,
                approval_date = excluded.approval_date,
                completion_date = excluded.completion_date,
                registry_match = excluded.registry_match,
                updated_at = CURRENT_TIMESTAMP",
        )?;

        for s in summaries {
            stmt.execute(params![
                s.building_hash,
                s.building_name,
                s.address,
                s.building_type,
                s.room_type,
                s.area,
                s.floor,
                s.avg_deposit,
                s.avg_monthly_rent,
                s.construction_year,
                s.road_name,
                s.sample_count as i64,
                s.households,
                s.ground_floors,
                s.basement_floors,
                s.elevators,
                non_empty(&s.building_usage),
                non_empty(&s.heating_type),
                iso_date(&s.approval_date),
                iso_date(&s.completion_date),
                s.registry_match,
            ])
            .with_context(|| format!("Failed to write building {}", s.building_name))?;
            written += 1;
        }
    }

    tx.commit()?;
    Ok(written)
}

pub fn record_run(conn: &Connection, run: &RunRecord) -> Result<()> {
    let files_json = serde_json::to_string(&run.source_files)?;

    conn.execute(
        "INSERT INTO ingest_runs (run_id, timestamp, source_files, accepted, skipped, buildings)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            run.run_id,
            run.timestamp.to_rfc3339(),
            files_json,
            run.accepted as i64,
            run.skipped as i64,
            run.buildings as i64,
        ],
    )
    .context("Failed to record ingest run")?;

    Ok(())
}

pub fn count_buildings(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM buildings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn get_runs(conn: &Connection) -> Result<Vec<RunRecord>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, timestamp, source_files, accepted, skipped, buildings
         FROM ingest_runs ORDER BY id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(run_id, timestamp, files, accepted, skipped, buildings)| -> Result<RunRecord> {
            Ok(RunRecord {
                run_id,
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .context("Invalid run timestamp")?
                    .with_timezone(&Utc),
                source_files: serde_json::from_str(&files)?,
                accepted: accepted as usize,
                skipped: skipped as usize,
                buildings: buildings as usize,
            })
        })
        .collect()
}
