//! Deterministic rule-based extractors
//!
//! Each extractor is a pure function of the metadata tree. `None` means the
//! field is absent; [`DeterministicPipeline`] decides whether absence becomes
//! a "not available" warning or is skipped.

use serde_json::Value;
use tracing::debug;

use crate::authenticity::{score_authenticity, AuthenticitySignals};
use crate::coords::extract_coordinates;
use crate::date::{parse_date_value, render};
use crate::device::DeviceResolver;
use crate::finding::{ConfidenceLevel, Finding, FindingLabel, FindingStatus};
use crate::paths;
use crate::tree::{resolve_str, resolve_value, value_as_string, CandidatePath};

pub const DATE_UNAVAILABLE: &str = "Date not available";
pub const LOCATION_UNAVAILABLE: &str = "Location not available";
pub const DEVICE_UNAVAILABLE: &str = "Device information not available";

/// Date sources from most to least authoritative; only the first is `high`
const DATE_TIERS: [&[CandidatePath<'static>]; 4] = [
    paths::CAPTURE_DATE,
    paths::EDIT_DATE,
    paths::FILESYSTEM_CREATED,
    paths::FILESYSTEM_MODIFIED,
];

// ============================================================================
// Extractors
// ============================================================================

/// WHEN: capture time, falling back to edit and filesystem dates
///
/// Every candidate is tried in priority order until one parses. A value
/// that cannot be parsed is kept only as a last resort and shown raw with
/// `low` confidence and `warning` status.
pub fn extract_when(tree: &Value) -> Option<Finding> {
    let mut unparsed: Option<String> = None;

    for (tier, candidates) in DATE_TIERS.iter().enumerate() {
        for candidate in candidates.iter() {
            let Some(raw) = resolve_value(tree, std::slice::from_ref(candidate)) else {
                continue;
            };

            let parsed = match raw {
                Value::String(_) | Value::Number(_) => parse_date_value(raw),
                _ => {
                    debug!("Ignoring non-scalar date value at {:?}", candidate);
                    continue;
                }
            };

            let Some(dt) = parsed else {
                debug!("Unparseable date at {:?}, trying lower-priority sources", candidate);
                if unparsed.is_none() {
                    unparsed = value_as_string(raw);
                }
                continue;
            };

            let confidence = if tier == 0 {
                ConfidenceLevel::High
            } else {
                ConfidenceLevel::Medium
            };
            return Some(Finding::new(FindingLabel::When, render(&dt), confidence, FindingStatus::Success));
        }
    }

    unparsed.map(|raw| Finding::new(FindingLabel::When, raw, ConfidenceLevel::Low, FindingStatus::Warning))
}

/// WHERE: GPS coordinates only; place names belong to the geocoding service
pub fn extract_where(tree: &Value) -> Option<Finding> {
    let (coords, confidence) = extract_coordinates(tree)?;
    Some(Finding::new(
        FindingLabel::Where,
        coords.display(),
        confidence,
        FindingStatus::Success,
    ))
}

/// DEVICE: friendly name from make/model
pub fn extract_device(tree: &Value, resolver: &DeviceResolver) -> Option<Finding> {
    let make = resolve_str(tree, paths::MAKE);
    let model = resolve_str(tree, paths::MODEL);
    let device = resolver.resolve(make.as_deref(), model.as_deref())?;
    Some(Finding::new(
        FindingLabel::Device,
        device.name,
        device.confidence,
        FindingStatus::Success,
    ))
}

/// AUTHENTICITY: always produces a finding
pub fn extract_authenticity(tree: &Value) -> Finding {
    score_authenticity(&AuthenticitySignals::from_tree(tree))
}

// ============================================================================
// Pipeline
// ============================================================================

/// Runs the four extractors in display order
#[derive(Debug, Clone)]
pub struct DeterministicPipeline {
    resolver: DeviceResolver,
    include_unavailable: bool,
}

impl DeterministicPipeline {
    pub fn new(resolver: DeviceResolver, include_unavailable: bool) -> Self {
        Self {
            resolver,
            include_unavailable,
        }
    }

    pub fn resolver(&self) -> &DeviceResolver {
        &self.resolver
    }

    /// Findings in the fixed order WHEN, WHERE, DEVICE, AUTHENTICITY
    pub fn run(&self, tree: &Value) -> Vec<Finding> {
        FindingLabel::ORDER
            .iter()
            .filter_map(|label| self.extract(*label, tree))
            .collect()
    }

    /// Run a single extractor, applying the absence policy
    pub fn extract(&self, label: FindingLabel, tree: &Value) -> Option<Finding> {
        let (found, unavailable) = match label {
            FindingLabel::When => (extract_when(tree), DATE_UNAVAILABLE),
            FindingLabel::Where => (extract_where(tree), LOCATION_UNAVAILABLE),
            FindingLabel::Device => (extract_device(tree, &self.resolver), DEVICE_UNAVAILABLE),
            FindingLabel::Authenticity => return Some(extract_authenticity(tree)),
        };

        match found {
            Some(finding) => Some(finding),
            None if self.include_unavailable => Some(Finding::unavailable(label, unavailable)),
            None => None,
        }
    }
}

impl Default for DeterministicPipeline {
    fn default() -> Self {
        Self::new(DeviceResolver::default(), true)
    }
}
