// 💾 Export - Summaries to CSV (tabular) and JSON (nested)

use crate::report::BuildingSummary;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write summaries as CSV with a header row. A UTF-8 BOM is written first
/// so spreadsheet tools pick up the Korean text correctly.
pub fn write_csv<'a, I>(path: &Path, summaries: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a BuildingSummary>,
{
    ensure_parent(path)?;
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    file.write_all("\u{feff}".as_bytes())?;

    let mut writer = csv::Writer::from_writer(file);
    let mut written = 0;
    for summary in summaries {
        writer
            .serialize(summary)
            .with_context(|| format!("Failed to write row {} to {}", summary.id, path.display()))?;
        written += 1;
    }
    writer.flush()?;

    Ok(written)
}

/// Write summaries as a pretty-printed JSON array
pub fn write_json<'a, I>(path: &Path, summaries: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a BuildingSummary>,
{
    ensure_parent(path)?;
    let rows: Vec<&BuildingSummary> = summaries.into_iter().collect();

    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &rows)
        .with_context(|| format!("Failed to write JSON: {}", path.display()))?;
    writer.flush()?;

    Ok(rows.len())
}

/// Read summaries back from a CSV written by `write_csv`
pub fn read_csv(path: &Path) -> Result<Vec<BuildingSummary>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut summaries = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let summary: BuildingSummary = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        summaries.push(summary);
    }

    Ok(summaries)
}
