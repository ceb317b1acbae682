// 🧱 Building Aggregator - One record per (name, address, room type)
//
// Transaction rows stream in one at a time. The first row for a key creates
// the record and attaches registry attributes; later rows append prices and
// fill sticky fields that are still at zero. Nothing here can fail a batch:
// bad rows are counted and skipped.

use crate::classifier::{classify, RoomType};
use crate::parser::{extractor_for, BuildingType, Malformed, RawRow, TransactionFields};
use crate::registry::{MatchTier, RegistryAttributes, RegistryIndex};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// Lease-type labels that leak into the name column of some extracts
const PLACEHOLDER_NAMES: &[&str] = &["전세", "월세", "nan"];

// ============================================================================
// BUILDING KEY
// ============================================================================

/// Identity of an aggregated building record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingKey {
    pub building_name: String,
    pub address: String,
    pub room_type: RoomType,
}

impl BuildingKey {
    /// Build a key; `None` when the name is blank or a placeholder label.
    pub fn new(building_name: &str, address: &str, room_type: RoomType) -> Option<Self> {
        let name = building_name.trim();
        if name.is_empty() || PLACEHOLDER_NAMES.contains(&name) {
            return None;
        }

        Some(BuildingKey {
            building_name: name.to_string(),
            address: address.to_string(),
            room_type,
        })
    }

    pub fn for_fields(fields: &TransactionFields, room_type: RoomType) -> Option<Self> {
        BuildingKey::new(&fields.building_name, &fields.address, room_type)
    }

    /// "{name}_{address}_{room type}"
    pub fn as_string(&self) -> String {
        format!("{}_{}_{}", self.building_name, self.address, self.room_type)
    }

    /// Stable content hash of the key, used as the persisted row identity
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.as_string());
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// BUILDING RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    // Identity
    pub building_name: String,
    pub address: String,
    pub building_type: BuildingType,
    pub room_type: RoomType,
    pub road_name: String,

    // Market observations, one entry per accepted positive price
    pub deposits: Vec<i64>,
    pub monthly_rents: Vec<i64>,

    // Sticky scalars
    pub area: f64,
    pub floor: i64,
    pub construction_year: i64,

    // Registry, attached at creation
    pub registry: RegistryAttributes,
    pub match_tier: MatchTier,
}

impl BuildingRecord {
    fn create(
        key: &BuildingKey,
        fields: &TransactionFields,
        registry: RegistryAttributes,
        match_tier: MatchTier,
    ) -> Self {
        let mut record = BuildingRecord {
            building_name: key.building_name.clone(),
            address: key.address.clone(),
            building_type: fields.building_type,
            room_type: key.room_type,
            road_name: fields.road_name.clone(),
            deposits: Vec::new(),
            monthly_rents: Vec::new(),
            area: fields.area,
            floor: fields.floor,
            construction_year: fields.construction_year,
            registry,
            match_tier,
        };
        record.observe_prices(fields);
        record
    }

    fn observe_prices(&mut self, fields: &TransactionFields) {
        if fields.deposit > 0 {
            self.deposits.push(fields.deposit);
        }
        if fields.monthly_rent > 0 {
            self.monthly_rents.push(fields.monthly_rent);
        }
    }

    /// Fill sticky fields still at zero; never overwrite a known value.
    fn fill_sticky(&mut self, fields: &TransactionFields) {
        if self.area == 0.0 && fields.area != 0.0 {
            self.area = fields.area;
        }
        if self.floor == 0 && fields.floor != 0 {
            self.floor = fields.floor;
        }
        if self.construction_year == 0 && fields.construction_year != 0 {
            self.construction_year = fields.construction_year;
        }
    }

    pub fn sample_count(&self) -> usize {
        self.deposits.len()
    }
}

// ============================================================================
// BATCH STATS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Row shorter than the layout's minimum column count
    Malformed,

    /// Blank or placeholder building name
    Unnamed,
}

/// What happened to one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created(BuildingKey),
    Merged(BuildingKey),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub accepted: usize,
    pub created: usize,
    pub merged: usize,
    pub skipped_malformed: usize,
    pub skipped_unnamed: usize,
    /// Registry resolutions by tier, one per created record
    pub match_tiers: HashMap<MatchTier, usize>,
}

impl BatchStats {
    pub fn skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_unnamed
    }

    pub fn rows_seen(&self) -> usize {
        self.accepted + self.skipped()
    }

    pub fn tier_count(&self, tier: MatchTier) -> usize {
        self.match_tiers.get(&tier).copied().unwrap_or(0)
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Malformed => self.skipped_malformed += 1,
            SkipReason::Unnamed => self.skipped_unnamed += 1,
        }
    }
}

// ============================================================================
// BATCH
// ============================================================================

/// One ingestion batch: a borrowed registry index and the key→record map it
/// builds. Batches never share aggregation state; several may borrow the same
/// index.
pub struct Batch<'r> {
    registry: &'r RegistryIndex,
    records: IndexMap<BuildingKey, BuildingRecord>,
    stats: BatchStats,
}

impl<'r> Batch<'r> {
    pub fn new(registry: &'r RegistryIndex) -> Self {
        Batch {
            registry,
            records: IndexMap::new(),
            stats: BatchStats::default(),
        }
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &BuildingKey) -> Option<&BuildingRecord> {
        self.records.get(key)
    }

    /// Records in first-seen order
    pub fn records(&self) -> impl Iterator<Item = (&BuildingKey, &BuildingRecord)> {
        self.records.iter()
    }

    /// Merge one observation into the record for `key`, creating it (and
    /// resolving registry attributes) on first sight.
    pub fn ingest(&mut self, fields: &TransactionFields, key: BuildingKey) -> &BuildingRecord {
        self.stats.accepted += 1;

        if self.records.contains_key(&key) {
            self.stats.merged += 1;
            let record = &mut self.records[&key];
            record.observe_prices(fields);
            record.fill_sticky(fields);
            return record;
        }

        let resolution = self.registry.resolve(&key.building_name, &key.address);
        *self.stats.match_tiers.entry(resolution.tier).or_insert(0) += 1;
        self.stats.created += 1;

        let record = BuildingRecord::create(&key, fields, resolution.attributes(), resolution.tier);
        debug!(
            key = %key.as_string(),
            tier = resolution.tier.as_str(),
            "new building record"
        );

        let (index, _) = self.records.insert_full(key, record);
        &self.records[index]
    }

    /// Full per-row path: extract → classify → key → ingest. Never fails;
    /// rows that cannot be recorded are counted and skipped.
    pub fn ingest_row(&mut self, row: &RawRow, building_type: BuildingType) -> RowOutcome {
        let extractor = extractor_for(building_type);
        let fields = match extractor.extract(row) {
            Ok(fields) => fields,
            Err(Malformed::TooShort { expected, actual }) => {
                debug!(
                    building_type = extractor.building_type().code(),
                    expected,
                    actual,
                    "skipping short row"
                );
                self.stats.record_skip(SkipReason::Malformed);
                return RowOutcome::Skipped(SkipReason::Malformed);
            }
        };

        self.ingest_fields(fields)
    }

    /// Classify and ingest already-extracted fields
    pub fn ingest_fields(&mut self, fields: TransactionFields) -> RowOutcome {
        let room_type = classify(fields.area, fields.building_type);

        let key = match BuildingKey::for_fields(&fields, room_type) {
            Some(key) => key,
            None => {
                self.stats.record_skip(SkipReason::Unnamed);
                return RowOutcome::Skipped(SkipReason::Unnamed);
            }
        };

        let existed = self.records.contains_key(&key);
        self.ingest(&fields, key.clone());

        if existed {
            RowOutcome::Merged(key)
        } else {
            RowOutcome::Created(key)
        }
    }

    /// Ingest a whole sequence of rows of one building type
    pub fn ingest_rows<'a, I>(&mut self, rows: I, building_type: BuildingType) -> BatchStats
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let before = self.stats.clone();
        for row in rows {
            self.ingest_row(row, building_type);
        }
        self.stats.delta_since(&before)
    }

    /// Finish the batch, handing over the records in first-seen order
    pub fn into_records(self) -> (IndexMap<BuildingKey, BuildingRecord>, BatchStats) {
        (self.records, self.stats)
    }
}

impl BatchStats {
    fn delta_since(&self, before: &BatchStats) -> BatchStats {
        let match_tiers = self
            .match_tiers
            .iter()
            .map(|(tier, count)| (*tier, count - before.tier_count(*tier)))
            .filter(|(_, count)| *count > 0)
            .collect();

        BatchStats {
            accepted: self.accepted - before.accepted,
            created: self.created - before.created,
            merged: self.merged - before.merged,
            skipped_malformed: self.skipped_malformed - before.skipped_malformed,
            skipped_unnamed: self.skipped_unnamed - before.skipped_unnamed,
            match_tiers,
        }
    }
}
