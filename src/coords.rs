//! GPS coordinate extraction and display formatting

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use crate::finding::ConfidenceLevel;
use crate::paths;
use crate::tree::{resolve_value, value_as_f64, value_as_string};

static DMS_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Signed decimal coordinates (south and west negative)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Finite and inside the valid latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    pub fn display(&self) -> String {
        format_coordinates(self.latitude, self.longitude)
    }
}

/// Render signed coordinates as `"37.7749° N, 122.4194° W"`
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lng_dir = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}° {}, {:.4}° {}", lat.abs(), lat_dir, lng.abs(), lng_dir)
}

/// How a coordinate component was read from the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordinateForm {
    /// Plain signed decimal number
    Decimal,
    /// Reconstructed from degrees/minutes/seconds
    Dms,
}

/// Locate and decode the GPS position in a metadata tree
///
/// Confidence is `high` when both components were plain decimals and
/// `medium` when either had to be rebuilt from a degree/minute/second form.
pub fn extract_coordinates(tree: &Value) -> Option<(Coordinates, ConfidenceLevel)> {
    let (lat, lat_form) = parse_component(resolve_value(tree, paths::LATITUDE)?)?;
    let (lng, lng_form) = parse_component(resolve_value(tree, paths::LONGITUDE)?)?;

    let lat_ref = resolve_value(tree, paths::LATITUDE_REF).and_then(value_as_string);
    let lng_ref = resolve_value(tree, paths::LONGITUDE_REF).and_then(value_as_string);

    let coords = Coordinates {
        latitude: apply_reference(lat, lat_ref.as_deref(), 'S'),
        longitude: apply_reference(lng, lng_ref.as_deref(), 'W'),
    };

    if !coords.is_valid() {
        debug!("Discarding out-of-range coordinates: {:?}", coords);
        return None;
    }

    let confidence = if lat_form == CoordinateForm::Decimal && lng_form == CoordinateForm::Decimal {
        ConfidenceLevel::High
    } else {
        ConfidenceLevel::Medium
    };

    Some((coords, confidence))
}

/// Negate a positive magnitude when a separate hemisphere field says so
fn apply_reference(value: f64, reference: Option<&str>, negative: char) -> f64 {
    match reference {
        Some(r) if value > 0.0 && r.trim().to_ascii_uppercase().starts_with(negative) => -value,
        _ => value,
    }
}

fn parse_component(value: &Value) -> Option<(f64, CoordinateForm)> {
    if let Some(decimal) = value_as_f64(value) {
        return Some((decimal, CoordinateForm::Decimal));
    }

    match value {
        Value::String(s) => parse_dms_str(s).map(|v| (v, CoordinateForm::Dms)),
        Value::Array(parts) => {
            let nums: Option<Vec<f64>> = parts.iter().map(value_as_f64).collect();
            dms_to_decimal(&nums?).map(|v| (v, CoordinateForm::Dms))
        }
        _ => None,
    }
}

/// Parse `37 deg 46' 29.64" N`, `37°46'29.64"S`, or `37,46,29.64`
fn parse_dms_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let nums: Vec<f64> = DMS_NUMBER
        .find_iter(trimmed)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let magnitude = dms_to_decimal(&nums)?;
    let hemisphere = trimmed.chars().last().map(|c| c.to_ascii_uppercase());
    let negative = trimmed.starts_with('-') || matches!(hemisphere, Some('S') | Some('W'));

    Some(if negative { -magnitude } else { magnitude })
}

fn dms_to_decimal(parts: &[f64]) -> Option<f64> {
    match parts {
        [deg] => Some(*deg),
        [deg, min] => Some(deg + min / 60.0),
        [deg, min, sec, ..] => Some(deg + min / 60.0 + sec / 3600.0),
        [] => None,
    }
}
