use serde::Serialize;

use crate::race_import::ImportRow;
use crate::track_types::GeometrySummary;

/// The record tables managed from the admin back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Announcements,
    Routes,
    GroupRides,
    Races,
}

impl RecordKind {
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Announcements => "announcements",
            Self::Routes => "routes",
            Self::GroupRides => "group_rides",
            Self::Races => "races",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Insert payload for the `races` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceInsert {
    pub name: String,
    pub race_date: String,
    pub race_type: Option<String>,
    pub region: Option<String>,
    pub link: Option<String>,
}

impl From<&ImportRow> for RaceInsert {
    fn from(row: &ImportRow) -> Self {
        let race_type = row.race_type.trim();
        Self {
            name: row.name.trim().to_string(),
            race_date: row.date.clone(),
            race_type: (!race_type.is_empty()).then(|| race_type.to_string()),
            region: None,
            link: normalize_url(&row.link),
        }
    }
}

/// Distance and climbing columns of the `routes` table.
///
/// A summary that carries an error yields `None` for both, so a failed GPX
/// parse never overwrites stored values with zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RouteMetrics {
    pub distance_km: Option<f64>,
    pub elevation_m: Option<f64>,
}

impl From<&GeometrySummary> for RouteMetrics {
    fn from(summary: &GeometrySummary) -> Self {
        if !summary.is_ok() {
            return Self::default();
        }
        Self {
            distance_km: Some(summary.distance_km),
            elevation_m: Some(summary.elevation_gain_m),
        }
    }
}

/// Trim a user-entered link and add `https://` when no scheme is given.
/// Blank input means "no link".
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{trimmed}"))
    }
}
