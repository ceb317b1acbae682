// 🔄 Pipeline - registry load → batch ingest → report → export
//
// Every source file is read up front, so a missing or mis-encoded input fails
// the run before any row reaches the batch.

use crate::aggregator::Batch;
use crate::config::PipelineConfig;
use crate::db;
use crate::export;
use crate::parser::extract_registry_record;
use crate::registry::RegistryIndex;
use crate::report::{assemble, Report};
use crate::source::{read_rows, SourceRead, TransactionSource};
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Build the registry index from title extracts, in file then row order.
pub fn load_registry(files: &[PathBuf], header_lines: usize) -> Result<RegistryIndex> {
    let mut index = RegistryIndex::new();

    for path in files {
        let read = read_rows(path, header_lines)?;
        let before = index.len();
        let mut rejected = 0;

        for row in &read.rows {
            match extract_registry_record(row) {
                Some(record) => index.insert(record),
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            warn!(path = %path.display(), rejected, "registry rows without a usable address");
        }
        info!(
            path = %path.display(),
            added = index.len() - before,
            "loaded registry file"
        );
    }

    Ok(index)
}

/// Read every transaction source. Fails on the first unreadable file.
fn read_transactions(
    files: &[PathBuf],
    preamble_lines: usize,
) -> Result<Vec<(TransactionSource, SourceRead)>> {
    files
        .iter()
        .map(|path| -> Result<(TransactionSource, SourceRead)> {
            let source = TransactionSource::from_path(path)?;
            let read = source.read(preamble_lines)?;
            if read.unreadable > 0 {
                warn!(path = %path.display(), lines = read.unreadable, "skipped unreadable lines");
            }
            Ok((source, read))
        })
        .collect()
}

/// Run one reconciliation batch over the configured inputs.
pub fn run(config: &PipelineConfig) -> Result<Report> {
    config.validate()?;

    let registry = load_registry(&config.input.registry_files, config.input.registry_header_lines)?;
    let sources = read_transactions(&config.input.transaction_files, config.input.preamble_lines)?;

    let mut batch = Batch::new(&registry);
    for (source, read) in &sources {
        let stats = batch.ingest_rows(&read.rows, source.building_type);
        info!(
            path = %source.path.display(),
            building_type = source.building_type.name(),
            accepted = stats.accepted,
            created = stats.created,
            skipped = stats.skipped(),
            "ingested transactions"
        );
    }

    let (records, stats) = batch.into_records();
    let report = assemble(&records, stats);
    info!(
        buildings = report.stats.total_buildings,
        registry_size = registry.len(),
        "batch complete"
    );

    Ok(report)
}

/// Where a run's outputs went
#[derive(Debug, Clone, Default)]
pub struct Written {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub database_rows: Option<usize>,
}

/// Write the report to every configured output.
pub fn persist(config: &PipelineConfig, report: &Report) -> Result<Written> {
    let mut written = Written::default();

    if config.output.csv {
        let path = config.csv_path();
        let count = export::write_csv(&path, &report.summaries)?;
        info!(path = %path.display(), rows = count, "wrote CSV");
        written.csv = Some(path);
    }

    if config.output.json {
        let path = config.json_path();
        let count = export::write_json(&path, &report.summaries)?;
        info!(path = %path.display(), rows = count, "wrote JSON");
        written.json = Some(path);
    }

    if let Some(db_path) = &config.output.database {
        let rows = save_to_database(db_path, config, report)?;
        written.database_rows = Some(rows);
    }

    Ok(written)
}

fn save_to_database(db_path: &Path, config: &PipelineConfig, report: &Report) -> Result<usize> {
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    db::setup_database(&conn)?;

    let rows = db::insert_summaries(&mut conn, &report.summaries)?;

    let source_files = config
        .input
        .transaction_files
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let run = db::RunRecord::new(source_files, &report.batch, report.summaries.len());
    db::record_run(&conn, &run)?;

    info!(
        path = %db_path.display(),
        rows,
        total = db::count_buildings(&conn)?,
        run_id = %run.run_id,
        "saved to database"
    );

    Ok(rows)
}
