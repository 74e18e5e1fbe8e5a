use serde::Serialize;

/// A single point read from a `<trkpt>` or `<rtept>` element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
        }
    }

    pub fn with_ele(mut self, ele: f64) -> Self {
        self.ele = Some(ele);
        self
    }
}

/// Distance and climbing computed from one track file.
///
/// When `point_count` is zero, `error` is set and both measurements are 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySummary {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub point_count: usize,
    pub error: Option<String>,
}

impl GeometrySummary {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            distance_km: 0.0,
            elevation_gain_m: 0.0,
            point_count: 0,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
