// 📊 Report Assembler - Reduce building records to summary rows
//
// One summary per building record, in first-seen order, ids from 1.
// Summaries are flat so they serialize the same way to CSV, JSON and SQLite.

use crate::aggregator::{BatchStats, BuildingKey, BuildingRecord};
use crate::parser::BuildingType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// SUMMARY ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub id: usize,
    pub building_name: String,
    pub address: String,
    pub building_type: String,
    pub room_type: String,
    pub area: f64,
    pub floor: i64,
    pub avg_deposit: f64,
    pub avg_monthly_rent: f64,
    pub construction_year: i64,
    pub road_name: String,
    pub sample_count: usize,
    pub households: i64,
    pub ground_floors: i64,
    pub basement_floors: i64,
    pub elevators: i64,
    pub building_usage: String,
    pub heating_type: String,
    pub approval_date: String,
    pub completion_date: String,
    pub registry_match: String,
    /// SHA-256 of the building key
    pub building_hash: String,
}

impl BuildingSummary {
    pub fn from_record(id: usize, key: &BuildingKey, record: &BuildingRecord) -> Self {
        BuildingSummary {
            id,
            building_name: record.building_name.clone(),
            address: record.address.clone(),
            building_type: record.building_type.name().to_string(),
            room_type: record.room_type.label(),
            area: record.area,
            floor: record.floor,
            avg_deposit: mean(&record.deposits),
            avg_monthly_rent: mean(&record.monthly_rents),
            construction_year: record.construction_year,
            road_name: record.road_name.clone(),
            sample_count: record.sample_count(),
            households: record.registry.households,
            ground_floors: record.registry.ground_floors,
            basement_floors: record.registry.basement_floors,
            elevators: record.registry.elevators,
            building_usage: record.registry.building_usage.clone(),
            heating_type: record.registry.heating_type.clone(),
            approval_date: record.registry.approval_date.clone(),
            // the register's use-approval date doubles as the completion date
            completion_date: record.registry.approval_date.clone(),
            registry_match: record.match_tier.as_str().to_string(),
            building_hash: key.hash(),
        }
    }
}

/// Arithmetic mean; 0 for an empty sequence.
///
/// Summed in i128 so saturated amounts near `i64::MAX` cannot overflow.
pub fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: i128 = values.iter().map(|&v| i128::from(v)).sum();
    total as f64 / values.len() as f64
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total_buildings: usize,
    /// Building count per type, keyed by display name
    pub by_building_type: IndexMap<String, usize>,
}

impl ReportStats {
    fn collect(summaries: &[BuildingSummary]) -> Self {
        let mut by_building_type: IndexMap<String, usize> = BuildingType::all()
            .iter()
            .map(|t| (t.name().to_string(), 0))
            .collect();

        for summary in summaries {
            *by_building_type.entry(summary.building_type.clone()).or_insert(0) += 1;
        }

        ReportStats {
            total_buildings: summaries.len(),
            by_building_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summaries: Vec<BuildingSummary>,
    pub stats: ReportStats,
    pub batch: BatchStats,
}

impl Report {
    pub fn summary(&self) -> String {
        let per_type = self
            .stats
            .by_building_type
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{} buildings ({}) from {} rows, {} skipped",
            self.stats.total_buildings,
            per_type,
            self.batch.rows_seen(),
            self.batch.skipped()
        )
    }
}

/// Reduce completed records to summaries, numbered in iteration order.
pub fn assemble(records: &IndexMap<BuildingKey, BuildingRecord>, batch: BatchStats) -> Report {
    let summaries: Vec<BuildingSummary> = records
        .iter()
        .enumerate()
        .map(|(i, (key, record))| BuildingSummary::from_record(i + 1, key, record))
        .collect();

    let stats = ReportStats::collect(&summaries);

    Report {
        summaries,
        stats,
        batch,
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Select summaries by room type and/or an address whitelist.
/// Empty criteria select everything.
#[derive(Debug, Clone, Default)]
pub struct SummaryFilter {
    pub room_type: Option<String>,
    pub addresses: Vec<String>,
}

impl SummaryFilter {
    pub fn matches(&self, summary: &BuildingSummary) -> bool {
        if let Some(room_type) = &self.room_type {
            if &summary.room_type != room_type {
                return false;
            }
        }

        self.addresses.is_empty() || self.addresses.iter().any(|a| a == &summary.address)
    }

    pub fn apply<'a>(&self, summaries: &'a [BuildingSummary]) -> Vec<&'a BuildingSummary> {
        summaries.iter().filter(|s| self.matches(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterStats {
    pub count: usize,
    pub mean_area: f64,
    pub mean_deposit: f64,
    pub mean_monthly_rent: f64,
    pub mean_construction_year: f64,
    /// Count per region (first three address tokens), first-seen order
    pub by_region: IndexMap<String, usize>,
}

impl FilterStats {
    pub fn collect(selected: &[&BuildingSummary]) -> Self {
        let n = selected.len();
        let avg = |f: &dyn Fn(&BuildingSummary) -> f64| {
            if n == 0 {
                0.0
            } else {
                selected.iter().map(|s| f(*s)).sum::<f64>() / n as f64
            }
        };

        let mut by_region = IndexMap::new();
        for summary in selected {
            let region = summary
                .address
                .split_whitespace()
                .take(3)
                .collect::<Vec<_>>()
                .join(" ");
            *by_region.entry(region).or_insert(0) += 1;
        }

        FilterStats {
            count: n,
            mean_area: avg(&|s: &BuildingSummary| s.area),
            mean_deposit: avg(&|s: &BuildingSummary| s.avg_deposit),
            mean_monthly_rent: avg(&|s: &BuildingSummary| s.avg_monthly_rent),
            mean_construction_year: avg(&|s: &BuildingSummary| s.construction_year as f64),
            by_region,
        }
    }
}
