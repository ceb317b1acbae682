// 🏛️ Building Registry - Static building attributes + tiered matching
//
// Registry (표제부) rows describe the physical building and are sourced
// independently of lease transactions, so names and addresses rarely line up
// exactly. Matching falls through four tiers:
//   1. exact "{name}_{address}" key
//   2. normalized address / "dong lot" fragment contained in a registry address
//   3. name contained in a registry key
//   4. no match (empty attributes - an information gap, not an error)

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// REGISTRY RECORD
// ============================================================================

/// One building-register title row. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub building_name: String,
    /// Lot-number address (대지위치)
    pub address: String,
    pub road_address: String,
    pub dong_name: String,
    pub structure_name: String,
    pub main_use_code: String,
    pub main_use_name: String,
    pub ground_floors: i64,
    pub basement_floors: i64,
    pub elevators: i64,
    pub households: i64,
    pub families: i64,
    pub units: i64,
    pub site_area: f64,
    pub building_area: f64,
    pub coverage_ratio: f64,
    pub total_floor_area: f64,
    pub floor_area_ratio: f64,
    pub permit_date: String,
    pub start_date: String,
    pub approval_date: String,
}

impl RegistryRecord {
    /// Index key, same shape as the exact-match tier's lookup
    pub fn key(&self) -> String {
        registry_key(&self.building_name, &self.address)
    }

    /// Usage description: the register's own use name, else the code table
    pub fn building_usage(&self) -> String {
        if !self.main_use_name.is_empty() {
            return self.main_use_name.clone();
        }
        usage_for_code(&self.main_use_code).to_string()
    }

    /// Heating type estimated from the main use
    pub fn heating_type(&self) -> &'static str {
        let usage = self.building_usage();
        match (self.main_use_code.as_str(), usage.as_str()) {
            ("04000" | "05000", _) | (_, "업무시설" | "판매시설" | "사무용" | "상업용") => {
                "중앙난방"
            }
            _ => "개별난방",
        }
    }
}

pub fn registry_key(building_name: &str, address: &str) -> String {
    format!("{}_{}", building_name, address)
}

/// Main-use code → description (건축물대장 주용도코드)
pub fn usage_for_code(code: &str) -> &'static str {
    match code {
        "01000" => "주거용",
        "02000" => "공동주택",
        "03000" => "숙박시설",
        "04000" => "사무용",
        "05000" => "상업용",
        "06000" => "업무시설",
        "07000" => "위락시설",
        "08000" => "집회시설",
        "09000" => "종교시설",
        "10000" => "교육연구시설",
        "11000" => "의료시설",
        "12000" => "노유자시설",
        "13000" => "수련시설",
        "14000" => "운동시설",
        "15000" => "창고시설",
        "16000" => "위험물저장시설",
        "17000" => "자동차관련시설",
        "18000" => "동물관련시설",
        _ => "기타",
    }
}

// ============================================================================
// REGISTRY ATTRIBUTES (what a building record carries)
// ============================================================================

/// Registry attributes attached to a building record. All zero/blank when
/// the building had no registry match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryAttributes {
    pub households: i64,
    pub ground_floors: i64,
    pub basement_floors: i64,
    pub elevators: i64,
    pub building_usage: String,
    pub heating_type: String,
    pub approval_date: String,
}

impl RegistryAttributes {
    pub fn from_record(record: &RegistryRecord) -> Self {
        RegistryAttributes {
            households: record.households,
            ground_floors: record.ground_floors,
            basement_floors: record.basement_floors,
            elevators: record.elevators,
            building_usage: record.building_usage(),
            heating_type: record.heating_type().to_string(),
            approval_date: record.approval_date.clone(),
        }
    }

    /// Approval date as a calendar date, when it is in `YYYYMMDD` form
    pub fn approval_date_iso(&self) -> Option<NaiveDate> {
        parse_register_date(&self.approval_date)
    }
}

/// Register dates are `YYYYMMDD`; anything else is treated as unknown.
pub fn parse_register_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

// ============================================================================
// MATCHING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    /// "{name}_{address}" found as-is
    ExactKey,

    /// Normalized address or dong/lot fragment inside a registry address
    AddressContainment,

    /// Building name inside a registry key
    NameContainment,

    /// Nothing matched
    Unmatched,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::ExactKey => "exact_key",
            MatchTier::AddressContainment => "address_containment",
            MatchTier::NameContainment => "name_containment",
            MatchTier::Unmatched => "unmatched",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    pub tier: MatchTier,
    pub record: Option<&'a RegistryRecord>,
}

impl<'a> Resolution<'a> {
    fn hit(tier: MatchTier, record: &'a RegistryRecord) -> Self {
        Resolution {
            tier,
            record: Some(record),
        }
    }

    fn miss() -> Self {
        Resolution {
            tier: MatchTier::Unmatched,
            record: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }

    /// Attributes to attach; empty on a miss
    pub fn attributes(&self) -> RegistryAttributes {
        self.record
            .map(RegistryAttributes::from_record)
            .unwrap_or_default()
    }
}

/// Province prefixes stripped before address containment. Registry lot
/// addresses are not always written with the province.
const PROVINCE_PREFIXES: &[&str] = &[
    "경기도 ",
    "서울특별시 ",
    "인천광역시 ",
    "부산광역시 ",
    "대구광역시 ",
    "광주광역시 ",
    "대전광역시 ",
    "울산광역시 ",
    "세종특별자치시 ",
    "강원특별자치도 ",
    "강원도 ",
    "충청북도 ",
    "충청남도 ",
    "전북특별자치도 ",
    "전라북도 ",
    "전라남도 ",
    "경상북도 ",
    "경상남도 ",
    "제주특별자치도 ",
];

/// Drop a known province prefix: "경기도 수원시 영통구 영통동 1153" →
/// "수원시 영통구 영통동 1153"
pub fn normalize_address(address: &str) -> &str {
    PROVINCE_PREFIXES
        .iter()
        .find_map(|prefix| address.strip_prefix(prefix))
        .unwrap_or(address)
}

/// Trailing "dong lot" fragment, for addresses of at least three tokens:
/// "경기도 수원시 영통구 영통동 1153" → "영통동 1153"
pub fn dong_lot_fragment(address: &str) -> Option<String> {
    let parts: Vec<&str> = address.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    Some(format!("{} {}", parts[parts.len() - 2], parts[parts.len() - 1]))
}

// ============================================================================
// REGISTRY INDEX
// ============================================================================

/// Registry records keyed by "{name}_{address}", in load order.
///
/// Loaded once per run and read-only afterwards; batches borrow it.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    records: IndexMap<String, RegistryRecord>,
}

impl RegistryIndex {
    pub fn new() -> Self {
        RegistryIndex {
            records: IndexMap::new(),
        }
    }

    /// Insert a record. A repeated key keeps its original position and takes
    /// the newer record.
    pub fn insert(&mut self, record: RegistryRecord) {
        self.records.insert(record.key(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RegistryRecord> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryRecord)> {
        self.records.iter()
    }

    /// Resolve a transaction's building against the registry.
    ///
    /// Tiers 2 and 3 scan in load order and take the first hit, so the same
    /// index and inputs always resolve to the same record.
    pub fn resolve(&self, building_name: &str, address: &str) -> Resolution<'_> {
        // Tier 1: exact key
        if let Some(record) = self.records.get(&registry_key(building_name, address)) {
            debug!(building_name, address, "registry match: exact key");
            return Resolution::hit(MatchTier::ExactKey, record);
        }

        // Tier 2: address containment
        if let Some(dong_lot) = dong_lot_fragment(address) {
            let normalized = normalize_address(address);
            let found = self.records.values().find(|record| {
                record.address.contains(dong_lot.as_str()) || record.address.contains(normalized)
            });
            if let Some(record) = found {
                debug!(
                    building_name,
                    address,
                    registry_key = %record.key(),
                    "registry match: address containment"
                );
                return Resolution::hit(MatchTier::AddressContainment, record);
            }
        }

        // Tier 3: name containment
        if !building_name.is_empty() {
            let found = self
                .records
                .iter()
                .find(|(key, _)| key.contains(building_name))
                .map(|(_, record)| record);
            if let Some(record) = found {
                debug!(
                    building_name,
                    registry_key = %record.key(),
                    "registry match: name containment"
                );
                return Resolution::hit(MatchTier::NameContainment, record);
            }
        }

        Resolution::miss()
    }
}

impl FromIterator<RegistryRecord> for RegistryIndex {
    fn from_iter<I: IntoIterator<Item = RegistryRecord>>(iter: I) -> Self {
        let mut index = RegistryIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}
