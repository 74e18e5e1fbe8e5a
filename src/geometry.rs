//! Distance and elevation gain along an ordered track.

use std::panic::{self, AssertUnwindSafe};

use crate::error::TrackError;
use crate::parser::extract_points;
use crate::track_types::{GeometrySummary, TrackPoint};

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two positions in decimal degrees, in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Sum of the haversine distances between consecutive points.
pub fn distance_km(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum()
}

/// Total climbing in metres. Points without elevation are skipped rather than
/// read as zero, and descents never subtract.
pub fn elevation_gain_m(points: &[TrackPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut gain = 0.0;
    let mut last_ele: Option<f64> = None;

    for ele in points.iter().filter_map(|p| p.ele) {
        if let Some(prev) = last_ele {
            if ele > prev {
                gain += ele - prev;
            }
        }
        last_ele = Some(ele);
    }

    gain
}

/// Parse a GPX document into a summary. Never fails: every problem ends up
/// in the summary's `error` field.
pub fn parse(xml: &str) -> GeometrySummary {
    match panic::catch_unwind(AssertUnwindSafe(|| summarize(xml))) {
        Ok(Ok(summary)) => {
            tracing::debug!(
                points = summary.point_count,
                distance_km = summary.distance_km,
                elevation_gain_m = summary.elevation_gain_m,
                "parsed GPX track"
            );
            summary
        }
        Ok(Err(err)) => {
            tracing::debug!(%err, "GPX track rejected");
            GeometrySummary::failed(err.to_string())
        }
        Err(_) => {
            tracing::error!("panic while parsing GPX track");
            GeometrySummary::failed(TrackError::Unexpected.to_string())
        }
    }
}

fn summarize(xml: &str) -> Result<GeometrySummary, TrackError> {
    let points = extract_points(xml);
    if points.is_empty() {
        return Err(TrackError::NoPoints);
    }

    Ok(GeometrySummary {
        distance_km: round_to(distance_km(&points), 2),
        elevation_gain_m: elevation_gain_m(&points).round(),
        point_count: points.len(),
        error: None,
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
