// End-to-end: extracts on disk → pipeline → CSV / JSON / SQLite

use building_reconcile::{db, export, pipeline, MatchTier, PipelineConfig};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

const PREAMBLE: usize = 16;

fn preamble() -> String {
    let mut text = String::new();
    for i in 1..PREAMBLE {
        text.push_str(&format!("□ 검색조건 {}\n", i));
    }
    text.push_str("NO,시군구,번지,본번,부번,단지명,전월세구분,전용면적,계약년월,계약일,보증금,월세금,층,건축년도,도로명\n");
    text
}

fn officetel_row(name: &str, lot: &str, area: f64, deposit: &str, rent: &str, floor: i64, year: i64) -> String {
    format!(
        "1,경기도 수원시 영통구 영통동,{lot},{lot},0,{name},월세,{area},202501,15,\"{deposit}\",{rent},{floor},{year},봉영로,\n"
    )
}

fn detached_row(lot: &str, area: f64, deposit: &str, rent: &str, year: i64) -> String {
    format!(
        "1,경기도 수원시 영통구 영통동,{lot},8m미만,{area},월세,202501,15,\"{deposit}\",{rent},{year},영통로,,,,\n"
    )
}

fn registry_row(address: &str, name: &str, households: i64, approval: &str) -> String {
    let mut cells = vec![String::new(); 70];
    cells[0] = address.to_string();
    cells[12] = name.to_string();
    cells[34] = "02000".to_string();
    cells[40] = households.to_string();
    cells[43] = "15".to_string();
    cells[44] = "2".to_string();
    cells[45] = "4".to_string();
    cells[60] = approval.to_string();
    cells.join(",") + "\n"
}

struct Fixture {
    _dir: tempfile::TempDir,
    config: PipelineConfig,
}

fn fixture(root: &Path) -> PipelineConfig {
    let registry = root.join("표제부_영통.csv");
    fs::write(
        &registry,
        format!(
            "대지위치,...\n{}",
            registry_row("경기도 수원시 영통구 영통동 200", "동편마을", 120, "19970530")
        ),
    )
    .unwrap();

    let officetel = root.join("오피스텔(전월세)_실거래가_영통동.csv");
    let mut text = preamble();
    text.push_str(&officetel_row("동편마을", "200", 25.0, "1,000", "50", 3, 1997));
    text.push_str(&officetel_row("동편마을", "200", 25.0, "2,000", "0", 0, 0));
    text.push_str(&officetel_row("동편마을", "200", 25.0, "3,000", "70", 5, 1997));
    text.push_str(&officetel_row("새빛오피스텔", "200", 35.0, "500", "40", 7, 2005));
    text.push_str(&officetel_row("월세", "300", 25.0, "500", "40", 2, 2005));
    text.push_str("1,2,3\n");
    fs::write(&officetel, text).unwrap();

    let detached = root.join("단독다가구(전월세)_실거래가_영통동.csv");
    let mut text = preamble();
    text.push_str(&detached_row("1012-1", 28.0, "5,000", "30", 1998));
    text.push_str(&detached_row("1012-1", 32.0, "7,000", "45", 1998));
    fs::write(&detached, text).unwrap();

    let mut config = PipelineConfig::default();
    config.input.registry_files = vec![registry];
    config.input.transaction_files = vec![officetel, detached];
    config.output.dir = root.join("processed");
    config
}

fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture(dir.path());
    Fixture { _dir: dir, config }
}

#[test]
fn test_reconcile_scenarios() {
    let f = setup();
    let report = pipeline::run(&f.config).unwrap();

    assert_eq!(report.stats.total_buildings, 4);
    assert_eq!(report.stats.by_building_type["오피스텔"], 2);
    assert_eq!(report.stats.by_building_type["단독다가구"], 2);
    assert_eq!(report.stats.by_building_type["아파트"], 0);

    assert_eq!(report.batch.accepted, 6);
    assert_eq!(report.batch.skipped_unnamed, 1);
    assert_eq!(report.batch.skipped_malformed, 1);

    let ids: Vec<usize> = report.summaries.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    // Three rows on one key: mean deposit over all three, rent over the two positive ones
    let dongpyeon = &report.summaries[0];
    assert_eq!(dongpyeon.building_name, "동편마을");
    assert_eq!(dongpyeon.room_type, "studio");
    assert_eq!(dongpyeon.sample_count, 3);
    assert_eq!(dongpyeon.avg_deposit, 2000.0);
    assert_eq!(dongpyeon.avg_monthly_rent, 60.0);
    assert_eq!(dongpyeon.floor, 3);
    assert_eq!(dongpyeon.registry_match, "exact_key");
    assert_eq!(dongpyeon.households, 120);
    assert_eq!(dongpyeon.building_usage, "공동주택");
    assert_eq!(dongpyeon.heating_type, "개별난방");
    assert_eq!(dongpyeon.approval_date, "19970530");
    assert_eq!(dongpyeon.completion_date, "19970530");

    // Different name at the same lot falls back to address containment
    let saebit = &report.summaries[1];
    assert_eq!(saebit.room_type, "two-room");
    assert_eq!(saebit.registry_match, "address_containment");
    assert_eq!(saebit.households, 120);

    // One detached lot, two room types
    let studio = &report.summaries[2];
    let two_room = &report.summaries[3];
    assert_eq!(studio.building_name, "단독다가구_1012-1");
    assert_eq!(studio.address, "경기도 수원시 영통구 영통동 1012-1");
    assert_eq!(studio.room_type, "studio");
    assert_eq!(studio.floor, 1);
    assert_eq!(studio.sample_count, 1);
    assert_eq!(two_room.room_type, "two-room");
    assert_eq!(two_room.sample_count, 1);
    assert_eq!(studio.registry_match, "unmatched");
    assert_eq!(studio.households, 0);
    assert_eq!(studio.heating_type, "");

    assert_eq!(report.batch.tier_count(MatchTier::ExactKey), 1);
    assert_eq!(report.batch.tier_count(MatchTier::AddressContainment), 1);
    assert_eq!(report.batch.tier_count(MatchTier::Unmatched), 2);
}

#[test]
fn test_rerun_gives_identical_report() {
    let f = setup();

    let first = pipeline::run(&f.config).unwrap();
    let second = pipeline::run(&f.config).unwrap();

    assert_eq!(first.summaries, second.summaries);
}

#[test]
fn test_persist_writes_every_output() {
    let f = setup();
    let mut config = f.config.clone();
    let db_path: PathBuf = config.output.dir.join("buildings.db");
    config.output.database = Some(db_path.clone());

    let report = pipeline::run(&config).unwrap();
    fs::create_dir_all(&config.output.dir).unwrap();

    let written = pipeline::persist(&config, &report).unwrap();
    assert_eq!(written.database_rows, Some(4));

    let csv_path = written.csv.unwrap();
    assert_eq!(export::read_csv(&csv_path).unwrap(), report.summaries);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written.json.unwrap()).unwrap()).unwrap();
    assert_eq!(json.as_array().map(|a| a.len()), Some(4));

    // A second run upserts in place and logs another run
    pipeline::persist(&config, &report).unwrap();
    let conn = Connection::open(&db_path).unwrap();
    assert_eq!(db::count_buildings(&conn).unwrap(), 4);
    assert_eq!(db::get_runs(&conn).unwrap().len(), 2);
}

#[test]
fn test_missing_transaction_file_fails_run() {
    let f = setup();
    let mut config = f.config.clone();
    config
        .input
        .transaction_files
        .push(PathBuf::from("/nonexistent/아파트(전월세)_실거래가.csv"));

    assert!(pipeline::run(&config).is_err());
}
