pub mod dates;
pub mod error;
pub mod geometry;
pub mod js_store;
pub mod logging;
pub mod options;
pub mod parser;
pub mod race_import;
pub mod records;
pub mod track_types;
pub mod upload;

use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::js_store::JsRecordStore;
use crate::options::TrackUploadLimits;
use crate::race_import::ImportRow;
use crate::records::RouteMetrics;
use crate::upload::BatchUploadDriver;

/// Install the console logger. `level` is one of TRACE, DEBUG, INFO, WARN,
/// ERROR; anything else picks the build default.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    console_error_panic_hook::set_once();
    logging::init(logging::parse_level(level.as_deref()));
}

/// Compute distance and elevation gain of a GPX document, returned as a JS object.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let summary = geometry::parse(gpx_string);
    to_js(&summary)
}

/// Compute distance and elevation gain of a GPX document, returned as a JSON string.
#[wasm_bindgen(js_name = parseGpxString)]
pub fn parse_gpx_string(gpx_string: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let summary = geometry::parse(gpx_string);
    serde_json::to_string(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Route columns (`distance_km`, `elevation_m`) derived from a GPX document.
/// Both are null when the document could not be used.
#[wasm_bindgen(js_name = routeMetricsFromGpx)]
pub fn route_metrics_from_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let metrics = RouteMetrics::from(&geometry::parse(gpx_string));
    to_js(&metrics)
}

/// Refuse files that are not track files or exceed the size limit.
#[wasm_bindgen(js_name = checkTrackUpload)]
pub fn check_track_upload(file_name: &str, size: f64, options: JsValue) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let limits = parse_limits(options)?;
    limits.check(file_name, size.max(0.0) as u64)?;
    Ok(())
}

/// Parse a pasted or uploaded race table into rows and per-line errors.
#[wasm_bindgen(js_name = parseRaceImport)]
pub fn parse_race_import(text: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let result = race_import::parse_race_table(text);
    to_js(&result)
}

/// Uploads imported races one at a time. Keep one instance per page so the
/// in-flight guard covers every upload button.
#[wasm_bindgen]
pub struct RaceUploader {
    driver: Rc<BatchUploadDriver>,
}

#[wasm_bindgen]
impl RaceUploader {
    #[allow(clippy::new_without_default)]
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self {
            driver: Rc::new(BatchUploadDriver::new()),
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    /// Insert `rows` (the `rows` of a `parseRaceImport` result) through
    /// `submit(table, record)`. Resolves to `{ successCount, failures }`;
    /// rejects only when another upload is still running.
    pub fn upload(
        &self,
        rows: JsValue,
        submit: js_sys::Function,
        on_progress: Option<js_sys::Function>,
    ) -> Result<js_sys::Promise, JsValue> {
        let rows: Vec<ImportRow> =
            serde_wasm_bindgen::from_value(rows).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let driver = Rc::clone(&self.driver);
        let store = JsRecordStore::new(submit);

        Ok(wasm_bindgen_futures::future_to_promise(async move {
            let report = |done: usize, total: usize| {
                if let Some(callback) = &on_progress {
                    let _ = callback.call2(
                        &JsValue::NULL,
                        &JsValue::from_f64(done as f64),
                        &JsValue::from_f64(total as f64),
                    );
                }
            };
            let outcome = driver.upload(&rows, &store, report).await?;
            to_js(&outcome)
        }))
    }
}

fn parse_limits(options: JsValue) -> Result<TrackUploadLimits, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(TrackUploadLimits::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Plain JS objects with `null` for missing values.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
