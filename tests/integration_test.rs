use std::cell::RefCell;

use async_trait::async_trait;
use ride_admin_wasm::error::StoreError;
use ride_admin_wasm::geometry;
use ride_admin_wasm::options::TrackUploadLimits;
use ride_admin_wasm::race_import::parse_race_table;
use ride_admin_wasm::records::{RecordKind, RouteMetrics};
use ride_admin_wasm::upload::{BatchUploadDriver, RecordStore};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

/// Accepts every insert except races whose name is listed in `reject`.
#[derive(Default)]
struct TableStore {
    reject: Vec<&'static str>,
    inserted: RefCell<Vec<(RecordKind, serde_json::Value)>>,
}

#[async_trait(?Send)]
impl RecordStore for TableStore {
    async fn insert(&self, kind: RecordKind, record: serde_json::Value) -> Result<(), StoreError> {
        let name = record["name"].as_str().unwrap_or_default().to_string();
        if self.reject.contains(&name.as_str()) {
            return Err(StoreError::new(format!("new row for relation \"{kind}\" violates check constraint")).with_code("23514"));
        }
        self.inserted.borrow_mut().push((kind, record));
        Ok(())
    }
}

// ---- gpx/ ----

#[test]
fn test_01_climb_and_descent() {
    let summary = geometry::parse(&load_fixture("gpx/01_climb_and_descent.gpx"));
    assert_eq!(summary.error, None);
    assert_eq!(summary.point_count, 3);
    assert_eq!(summary.elevation_gain_m, 20.0);
    assert!(summary.distance_km > 0.0);
    assert_eq!(summary.distance_km, 1.88);
}

#[test]
fn test_02_route_points_fallback() {
    let summary = geometry::parse(&load_fixture("gpx/02_route_only.gpx"));
    assert_eq!(summary.error, None);
    // Waypoint is not part of the path
    assert_eq!(summary.point_count, 3);
    assert_eq!(summary.distance_km, 2.22);
    assert_eq!(summary.elevation_gain_m, 50.0);
}

#[test]
fn test_03_garmin_with_gaps() {
    let summary = geometry::parse(&load_fixture("gpx/03_garmin_with_gaps.gpx"));
    assert_eq!(summary.point_count, 3);
    assert_eq!(summary.distance_km, 0.0);
    // 400 -> (no elevation) -> 415.4
    assert_eq!(summary.elevation_gain_m, 15.0);
}

#[test]
fn test_04_empty_track() {
    let summary = geometry::parse(&load_fixture("gpx/04_empty.gpx"));
    assert_eq!(summary.point_count, 0);
    assert_eq!(summary.distance_km, 0.0);
    assert_eq!(summary.elevation_gain_m, 0.0);
    assert_eq!(summary.error.as_deref(), Some("No track points found in GPX file"));
    assert_eq!(RouteMetrics::from(&summary), RouteMetrics::default());
}

#[test]
fn test_garbage_input_never_fails() {
    for input in ["", "<<<>>>", "<gpx><trk><trkseg><trkpt lat=", "\u{feff}hello"] {
        let summary = geometry::parse(input);
        assert_eq!(summary.point_count, 0);
        assert!(summary.error.is_some());
    }
}

#[test]
fn test_upload_gate_before_parsing() {
    let limits = TrackUploadLimits::default();
    let gpx = load_fixture("gpx/01_climb_and_descent.gpx");
    assert!(limits.check("climb.gpx", gpx.len() as u64).is_ok());
    assert!(limits.check("climb.tcx", gpx.len() as u64).is_err());
    assert!(limits.check("climb.gpx", 11 * 1024 * 1024).is_err());
}

// ---- races/ ----

#[test]
fn test_05_tab_separated() {
    let result = parse_race_table(&load_fixture("races/01_tab_separated.tsv"));

    let dates: Vec<&str> = result.rows.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["2026-03-01", "2026-09-05", "2026-10-04"]);
    assert_eq!(result.rows[1].name, "Vzpon na Vršič");
    assert_eq!(result.rows[1].link, "");

    assert_eq!(result.parse_errors.len(), 1);
    assert_eq!(result.parse_errors[0].line_number, 4);
    assert_eq!(
        result.parse_errors[0].message,
        "Row 4: Invalid date format \"31.13.2026\" (expected DD.MM.YYYY)"
    );
}

#[test]
fn test_06_comma_separated() {
    let result = parse_race_table(&load_fixture("races/02_comma_separated.csv"));

    let names: Vec<&str> = result.rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Gran Fondo, Celje", "Maraton Franja"]);
    assert_eq!(result.rows[1].date, "2026-09-05");

    let messages: Vec<&str> = result.parse_errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Row 3: Not enough columns (need at least Date, Type, Name)",
            "Row 4: Invalid date format \"13/2026\" (expected DD.MM.YYYY)",
            "Row 5: Name is required",
        ]
    );
    // header excluded, five data lines
    assert_eq!(result.rows.len() + result.parse_errors.len(), 5);
}

#[tokio::test]
async fn test_import_then_upload() {
    let result = parse_race_table(&load_fixture("races/01_tab_separated.tsv"));
    let store = TableStore {
        reject: vec!["Vzpon na Vršič"],
        ..Default::default()
    };
    let driver = BatchUploadDriver::new();
    let mut last_progress = (0, 0);

    let outcome = driver
        .upload(&result.rows, &store, |done, total| last_progress = (done, total))
        .await
        .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].row_name, "Vzpon na Vršič");
    assert_eq!(outcome.failures[0].code.as_deref(), Some("23514"));
    assert_eq!(
        outcome.failures[0].message,
        "new row for relation \"races\" violates check constraint"
    );
    assert_eq!(last_progress, (3, 3));

    let inserted = store.inserted.borrow();
    assert_eq!(inserted[0].0, RecordKind::Races);
    assert_eq!(inserted[0].1["link"], "https://dirka.si");
    assert_eq!(inserted[0].1["race_type"], "Cestna");
    assert_eq!(inserted[1].1["name"], "Kronometer Ljubljana");
    assert_eq!(inserted[1].1["link"], "https://klub.si/kronometer");
}
