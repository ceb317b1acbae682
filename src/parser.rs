// 🏗️ Row Extractors - One extractor per building type
// Transaction extracts differ in column layout by building type, so each
// type gets its own extractor behind a shared trait, dispatched by tag.

use crate::lenient::{self, Lenient};
use crate::registry::RegistryRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// CORE TYPES
// ============================================================================

/// BuildingType - declared by the source file a transaction row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Apartment,
    Officetel,
    DetachedMultiUnit,
}

#[derive(Debug, Error, PartialEq)]
#[error("cannot determine building type from file name: {0}")]
pub struct UnknownBuildingType(pub String);

impl BuildingType {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            BuildingType::Apartment => "아파트",
            BuildingType::Officetel => "오피스텔",
            BuildingType::DetachedMultiUnit => "단독다가구",
        }
    }

    /// Short code for internal use
    pub fn code(&self) -> &'static str {
        match self {
            BuildingType::Apartment => "apartment",
            BuildingType::Officetel => "officetel",
            BuildingType::DetachedMultiUnit => "detached-multi-unit",
        }
    }

    pub fn all() -> [BuildingType; 3] {
        [
            BuildingType::Apartment,
            BuildingType::Officetel,
            BuildingType::DetachedMultiUnit,
        ]
    }

    /// Detect the building type from a transaction file name
    ///
    /// Extract files are named after the housing category they cover, e.g.
    /// `오피스텔(전월세)_실거래가_20251019153748_영통동.csv`.
    pub fn detect(file_name: &str) -> Result<BuildingType, UnknownBuildingType> {
        if file_name.contains("아파트") {
            Ok(BuildingType::Apartment)
        } else if file_name.contains("오피스텔") {
            Ok(BuildingType::Officetel)
        } else if file_name.contains("단독다가구") {
            Ok(BuildingType::DetachedMultiUnit)
        } else {
            Err(UnknownBuildingType(file_name.to_string()))
        }
    }
}

/// RawRow - one line of a source extract, cells addressed by column position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        RawRow { cells }
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawRow {
            cells: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at a column, if the row is long enough
    pub fn get(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    fn text(&self, column: usize) -> String {
        lenient::text(self.get(column))
    }

    fn decimal(&self, column: usize) -> Lenient<f64> {
        lenient::parse_decimal(self.get(column).unwrap_or(""))
    }

    fn integer(&self, column: usize) -> Lenient<i64> {
        lenient::parse_integer(self.get(column).unwrap_or(""))
    }

    fn amount(&self, column: usize) -> Lenient<i64> {
        lenient::parse_amount(self.get(column).unwrap_or(""))
    }
}

/// TransactionFields - typed view of one transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFields {
    pub building_type: BuildingType,
    pub building_name: String,
    pub address: String,
    pub area: f64,
    pub deposit: i64,
    pub monthly_rent: i64,
    pub floor: i64,
    pub construction_year: i64,
    pub road_name: String,
}

/// Why a row produced no fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// Fewer cells than the layout needs
    TooShort { expected: usize, actual: usize },
}

fn join_address(sigungu: &str, jibun: &str) -> String {
    format!("{} {}", sigungu, jibun).trim().to_string()
}

// ============================================================================
// EXTRACTOR TRAIT
// ============================================================================

/// RowExtractor - one implementation per building-type column layout
pub trait RowExtractor: Send + Sync {
    /// Building type this extractor handles
    fn building_type(&self) -> BuildingType;

    /// Minimum cell count for a row to be considered well-formed
    fn min_columns(&self) -> usize {
        TRANSACTION_MIN_COLUMNS
    }

    /// Extract typed fields. Malformed numeric cells become defaults; only a
    /// structurally short row is refused.
    fn extract(&self, row: &RawRow) -> Result<TransactionFields, Malformed>;
}

pub const TRANSACTION_MIN_COLUMNS: usize = 15;

fn check_width(row: &RawRow, expected: usize) -> Result<(), Malformed> {
    if row.len() < expected {
        return Err(Malformed::TooShort {
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Get the extractor for a building type
pub fn extractor_for(building_type: BuildingType) -> Box<dyn RowExtractor> {
    match building_type {
        BuildingType::Apartment => Box::new(UnitExtractor::new(BuildingType::Apartment)),
        BuildingType::Officetel => Box::new(UnitExtractor::new(BuildingType::Officetel)),
        BuildingType::DetachedMultiUnit => Box::new(DetachedExtractor),
    }
}

// ============================================================================
// APARTMENT / OFFICETEL
// ============================================================================

/// Apartment and officetel extracts share one layout:
/// NO, 시군구, 번지, 본번, 부번, 단지명, 전월세구분, 전용면적, 계약년월, 계약일,
/// 보증금, 월세금, 층, 건축년도, 도로명, ...
pub struct UnitExtractor {
    building_type: BuildingType,
}

impl UnitExtractor {
    pub fn new(building_type: BuildingType) -> Self {
        UnitExtractor { building_type }
    }
}

impl RowExtractor for UnitExtractor {
    fn building_type(&self) -> BuildingType {
        self.building_type
    }

    fn extract(&self, row: &RawRow) -> Result<TransactionFields, Malformed> {
        check_width(row, self.min_columns())?;

        Ok(TransactionFields {
            building_type: self.building_type,
            building_name: row.text(5),
            address: join_address(&row.text(1), &row.text(2)),
            area: row.decimal(7).value(),
            deposit: row.amount(10).value(),
            monthly_rent: row.amount(11).value(),
            floor: row.integer(12).value(),
            construction_year: row.integer(13).value(),
            road_name: row.text(14),
        })
    }
}

// ============================================================================
// DETACHED / MULTI-UNIT
// ============================================================================

/// Detached and multi-unit houses have no complex name and no floor column:
/// NO, 시군구, 번지, 도로조건, 계약면적, 전월세구분, 계약년월, 계약일, 보증금,
/// 월세금, 건축년도, 도로명, ...
pub struct DetachedExtractor;

/// Prefix for names synthesized from the lot number
pub const DETACHED_NAME_PREFIX: &str = "단독다가구_";

impl RowExtractor for DetachedExtractor {
    fn building_type(&self) -> BuildingType {
        BuildingType::DetachedMultiUnit
    }

    fn extract(&self, row: &RawRow) -> Result<TransactionFields, Malformed> {
        check_width(row, self.min_columns())?;

        let jibun = row.text(2);
        // An empty lot number leaves no name to key on; let the key builder reject it.
        let building_name = if jibun.is_empty() {
            String::new()
        } else {
            format!("{}{}", DETACHED_NAME_PREFIX, jibun)
        };

        Ok(TransactionFields {
            building_type: BuildingType::DetachedMultiUnit,
            building_name,
            address: join_address(&row.text(1), &jibun),
            area: row.decimal(4).value(),
            deposit: row.amount(8).value(),
            monthly_rent: row.amount(9).value(),
            floor: 1,
            construction_year: row.integer(10).value(),
            road_name: row.text(11),
        })
    }
}

// ============================================================================
// REGISTRY (표제부)
// ============================================================================

pub const REGISTRY_MIN_COLUMNS: usize = 70;

/// Prefix for registry names synthesized from the lot address
pub const REGISTRY_NAME_PREFIX: &str = "건물_";

/// Extract a registry record from a building-register title row.
///
/// Returns `None` for rows that are too short or carry no lot address.
pub fn extract_registry_record(row: &RawRow) -> Option<RegistryRecord> {
    if row.len() < REGISTRY_MIN_COLUMNS {
        return None;
    }

    let address = row.text(0);
    let last_token = address.split_whitespace().last()?;

    let mut building_name = row.text(12);
    if building_name.is_empty() {
        building_name = format!("{}{}", REGISTRY_NAME_PREFIX, last_token);
    }

    Some(RegistryRecord {
        building_name,
        road_address: row.text(11),
        dong_name: row.text(22),
        site_area: row.decimal(25).value(),
        building_area: row.decimal(26).value(),
        coverage_ratio: row.decimal(27).value(),
        total_floor_area: row.decimal(28).value(),
        floor_area_ratio: row.decimal(30).value(),
        structure_name: row.text(32),
        main_use_code: row.text(34),
        main_use_name: row.text(35),
        households: row.integer(40).value(),
        families: row.integer(41).value(),
        ground_floors: row.integer(43).value(),
        basement_floors: row.integer(44).value(),
        elevators: row.integer(45).value(),
        permit_date: row.text(58),
        start_date: row.text(59),
        approval_date: row.text(60),
        units: row.integer(66).value(),
        address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_row(name: &str, area: &str, deposit: &str, rent: &str, floor: &str) -> RawRow {
        RawRow::from_fields([
            "1",
            "경기도 수원시 영통구 영통동",
            "1012-1",
            "1012",
            "1",
            name,
            "월세",
            area,
            "202409",
            "12",
            deposit,
            rent,
            floor,
            "2004",
            "봉영로",
            "24.09~26.09",
        ])
    }

    fn detached_row(jibun: &str, area: &str, deposit: &str, rent: &str) -> RawRow {
        RawRow::from_fields([
            "1",
            "경기도 수원시 영통구 영통동",
            jibun,
            "8m미만",
            area,
            "월세",
            "202409",
            "3",
            deposit,
            rent,
            "1998",
            "영통로",
            "",
            "",
            "",
        ])
    }

    #[test]
    fn test_building_type_names() {
        assert_eq!(BuildingType::Apartment.name(), "아파트");
        assert_eq!(BuildingType::Officetel.name(), "오피스텔");
        assert_eq!(BuildingType::DetachedMultiUnit.name(), "단독다가구");
    }

    #[test]
    fn test_extractor_for_matches_tag() {
        for building_type in BuildingType::all() {
            let extractor = extractor_for(building_type);
            assert_eq!(extractor.building_type(), building_type);
            assert_eq!(extractor.min_columns(), TRANSACTION_MIN_COLUMNS);
        }
    }

    #[test]
    fn test_detect_building_type() {
        assert_eq!(
            BuildingType::detect("아파트(전월세)_실거래가_20251019154026_영통동.csv"),
            Ok(BuildingType::Apartment)
        );
        assert_eq!(
            BuildingType::detect("오피스텔(전월세)_실거래가_20251019153748_영통동.csv"),
            Ok(BuildingType::Officetel)
        );
        assert_eq!(
            BuildingType::detect("단독다가구(전월세)_실거래가_20251019153905_영통동.csv"),
            Ok(BuildingType::DetachedMultiUnit)
        );
        assert!(BuildingType::detect("표제부_영통.csv").is_err());
    }

    #[test]
    fn test_unit_extractor_reads_layout() {
        let extractor = extractor_for(BuildingType::Officetel);
        let fields = extractor
            .extract(&unit_row("영통SK뷰", "23.5", "1,000", "55", "7"))
            .unwrap();

        assert_eq!(fields.building_type, BuildingType::Officetel);
        assert_eq!(fields.building_name, "영통SK뷰");
        assert_eq!(fields.address, "경기도 수원시 영통구 영통동 1012-1");
        assert_eq!(fields.area, 23.5);
        assert_eq!(fields.deposit, 1000);
        assert_eq!(fields.monthly_rent, 55);
        assert_eq!(fields.floor, 7);
        assert_eq!(fields.construction_year, 2004);
        assert_eq!(fields.road_name, "봉영로");
    }

    #[test]
    fn test_unit_extractor_degrades_malformed_cells() {
        let extractor = extractor_for(BuildingType::Apartment);
        let fields = extractor
            .extract(&unit_row("벽적골", "n/a", "", "-", "지하"))
            .unwrap();

        assert_eq!(fields.area, 0.0);
        assert_eq!(fields.deposit, 0);
        assert_eq!(fields.monthly_rent, 0);
        assert_eq!(fields.floor, 0);
        assert_eq!(fields.building_name, "벽적골");
    }

    #[test]
    fn test_detached_extractor_synthesizes_name() {
        let extractor = extractor_for(BuildingType::DetachedMultiUnit);
        let fields = extractor
            .extract(&detached_row("958-2", "28", "5,000", "30"))
            .unwrap();

        assert_eq!(fields.building_name, "단독다가구_958-2");
        assert_eq!(fields.address, "경기도 수원시 영통구 영통동 958-2");
        assert_eq!(fields.area, 28.0);
        assert_eq!(fields.deposit, 5000);
        assert_eq!(fields.monthly_rent, 30);
        assert_eq!(fields.floor, 1);
        assert_eq!(fields.construction_year, 1998);
        assert_eq!(fields.road_name, "영통로");
    }

    #[test]
    fn test_detached_extractor_blank_lot_gives_blank_name() {
        let extractor = extractor_for(BuildingType::DetachedMultiUnit);
        let fields = extractor.extract(&detached_row("", "28", "5000", "0")).unwrap();

        assert_eq!(fields.building_name, "");
    }

    #[test]
    fn test_short_row_is_malformed() {
        let row = RawRow::from_fields(["1", "경기도 수원시", "100"]);

        for building_type in BuildingType::all() {
            let result = extractor_for(building_type).extract(&row);
            assert_eq!(
                result,
                Err(Malformed::TooShort {
                    expected: 15,
                    actual: 3
                })
            );
        }
    }

    fn registry_row(address: &str, name: &str) -> RawRow {
        let mut cells = vec![String::new(); REGISTRY_MIN_COLUMNS];
        cells[0] = address.to_string();
        cells[11] = "경기도 수원시 영통구 봉영로 1517".to_string();
        cells[12] = name.to_string();
        cells[35] = "공동주택".to_string();
        cells[40] = "312".to_string();
        cells[43] = "15".to_string();
        cells[44] = "2".to_string();
        cells[45] = "4.0".to_string();
        cells[60] = "19970530".to_string();
        RawRow::new(cells)
    }

    #[test]
    fn test_extract_registry_record() {
        let record =
            extract_registry_record(&registry_row("경기도 수원시 영통구 영통동 200", "동편마을"))
                .unwrap();

        assert_eq!(record.building_name, "동편마을");
        assert_eq!(record.address, "경기도 수원시 영통구 영통동 200");
        assert_eq!(record.main_use_name, "공동주택");
        assert_eq!(record.households, 312);
        assert_eq!(record.ground_floors, 15);
        assert_eq!(record.basement_floors, 2);
        assert_eq!(record.elevators, 4);
        assert_eq!(record.approval_date, "19970530");
        assert_eq!(record.site_area, 0.0);
    }

    #[test]
    fn test_registry_blank_name_uses_lot_number() {
        let record =
            extract_registry_record(&registry_row("경기도 수원시 영통구 영통동 958-2", ""))
                .unwrap();

        assert_eq!(record.building_name, "건물_958-2");
    }

    #[test]
    fn test_registry_rejects_short_or_addressless_rows() {
        assert!(extract_registry_record(&RawRow::from_fields(["a", "b"])).is_none());
        assert!(extract_registry_record(&registry_row("   ", "동편마을")).is_none());
    }
}
