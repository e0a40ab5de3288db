use std::fs;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::tempdir;
use zsun_riders::config::SyncConfig;
use zsun_riders::io::destination::Destination;
use zsun_riders::io::{FileTransport, WorkbookDestination};
use zsun_riders::model::{CellValue, column_headers, field_index};
use zsun_riders::repository::RiderRepository;
use zsun_riders::{ErrorKind, sync, timestamp};

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn squad_payload() -> serde_json::Value {
    json!({
        "5490373": {
            "zwift_id": "5490373",
            "name": "Ada Lovelace",
            "weight_kg": "61.5",
            "age_years": 34.9,
            "zwift_cat_open": "B",
            "zsun_when_curves_fitted": "/Date(1700000000000)/"
        },
        "1193": {
            "zwiftId": 1193,
            "fullName": "Bo Diddley",
            "weightKg": 80,
            "zsunWhenCurvesFitted": 638000000000000000_i64
        },
        "abc": {"zwift_id": "abc", "name": "Not A Rider"},
        "77": {"zwift_id": "77", "name": ""}
    })
}

#[test]
fn file_payload_updates_an_existing_workbook() {
    let dir = tempdir().expect("temporary directory");
    let input = dir.path().join("riders.json");
    let workbook = dir.path().join("squad.xlsx");
    fs::write(&input, squad_payload().to_string()).expect("payload written");

    let mut seed = WorkbookDestination::open(&workbook, "Squad").expect("new workbook");
    seed.append_header_row(&column_headers()).expect("header");
    seed.write_contiguous_rows(
        2,
        &[
            vec![text("5490373"), text("old name")],
            vec![text("42"), text("stranger"), text("keep")],
            vec![CellValue::Int(1193)],
        ],
    )
    .expect("seed rows");
    seed.flush().expect("seed saved");

    let mut destination = WorkbookDestination::open(&workbook, "Squad").expect("existing workbook");
    let report = sync::run_sync(
        &FileTransport::new(&input),
        &mut destination,
        &SyncConfig::default(),
        None,
    )
    .expect("sync succeeds");

    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.rows_matched, 2);
    assert_eq!(report.blocks_written, 2);

    let mut reopened = WorkbookDestination::open(&workbook, "Squad").expect("saved workbook");
    let rows = reopened.get_all_rows(2).expect("rows read");
    assert_eq!(rows[0][1], text("Ada Lovelace"));
    assert_eq!(rows[0][3], CellValue::Float(61.5));
    assert_eq!(rows[1], vec![text("42"), text("stranger"), text("keep")]);
    assert_eq!(rows[2][1], text("Bo Diddley"));
    assert_eq!(rows[2][0], text("1193"));

    let fitted_column = column_headers()
        .iter()
        .position(|header| header == "Curves fitted")
        .expect("timestamp column");
    let CellValue::Text(persisted) = &rows[0][fitted_column] else {
        panic!("timestamps are persisted as text");
    };
    let decoded = timestamp::decode(persisted.as_str(), None);
    let expected = Utc.timestamp_millis_opt(1_700_000_000_000).single().expect("valid instant");
    assert!((decoded - expected).num_milliseconds().abs() < 1000);
}

#[test]
fn export_reloads_to_the_same_riders() {
    let dir = tempdir().expect("temporary directory");
    let output = dir.path().join("normalized.json");

    let mut repository = RiderRepository::new();
    repository
        .load_from_raw_dictionary(&squad_payload())
        .expect("valid dictionary");
    sync::export_json(&repository, &output).expect("export written");

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("export read"))
            .expect("export is JSON");
    let mut reloaded = RiderRepository::new();
    let report = reloaded
        .load_from_raw_dictionary(&exported)
        .expect("exported dictionary loads");

    assert_eq!(report.loaded, repository.count());
    for rider in repository.iter() {
        let restored = reloaded.get_by_id(rider.id()).expect("rider survives export");
        assert_eq!(rider.display_name(), restored.display_name());
        let original = rider.timestamp("zsunWhenCurvesFitted").expect("timestamp");
        let round_tripped = restored.timestamp("zsunWhenCurvesFitted").expect("timestamp");
        assert!((original - round_tripped).num_milliseconds().abs() < 1000);
    }
}

#[test]
fn dump_lists_every_rider_in_name_order() {
    let dir = tempdir().expect("temporary directory");
    let workbook = dir.path().join("dump.xlsx");

    let mut repository = RiderRepository::new();
    repository
        .load_from_raw_records(&[
            json!({"zwift_id": "3", "name": "charlie"}),
            json!({"zwift_id": "1", "name": "Alpha"}),
            json!({"zwift_id": "2", "name": "bravo"}),
        ])
        .expect("valid records");

    let mut destination = WorkbookDestination::open(&workbook, "Dump").expect("new workbook");
    let written = sync::dump_to_destination(&repository, &mut destination).expect("dump");
    assert_eq!(written, 3);

    let mut reopened = WorkbookDestination::open(&workbook, "Dump").expect("saved workbook");
    let rows = reopened.get_all_rows(1).expect("rows read");
    let name_column = field_index("name").expect("name field");
    let names: Vec<&CellValue> = rows.iter().map(|row| &row[name_column]).collect();
    assert_eq!(
        names,
        vec![&text("Name"), &text("Alpha"), &text("bravo"), &text("charlie")]
    );
}

#[test]
fn missing_payload_is_a_validation_failure() {
    let dir = tempdir().expect("temporary directory");
    let mut repository = RiderRepository::new();
    let err = sync::refresh_repository(
        &mut repository,
        &FileTransport::new(dir.path().join("absent.json")),
    )
    .expect_err("no payload");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(repository.is_empty());
}

#[test]
fn header_row_below_a_banner_is_respected() {
    let repository = {
        let mut repository = RiderRepository::new();
        repository
            .load_from_raw_dictionary(&json!({"9": {"zwift_id": "9", "name": "Nine"}}))
            .expect("valid dictionary");
        repository
    };
    let mut sheet = zsun_riders::io::MemorySheet::from_rows(vec![
        vec![text("9"), text("banner that looks like a key")],
        vec![text("Zwift ID"), text("Name")],
        vec![text("9"), text("stale")],
    ]);
    let config = SyncConfig {
        header_row: 2,
        ..SyncConfig::default()
    };

    let diff = sync::sync_to_destination(&repository, &mut sheet, &config).expect("sync");

    assert_eq!(diff.blocks.len(), 1);
    assert_eq!(diff.blocks[0].start_row, 3);
    assert_eq!(sheet.cell(1, 1), Some(&text("banner that looks like a key")));
    assert_eq!(sheet.cell(3, 1), Some(&text("Nine")));
}
