//! Authenticity scoring
//!
//! Independent signals are combined by a strict priority cascade rather than
//! a weighted sum. The first matching rule decides the outcome:
//!
//! 1. Manipulation or AI-generation flag → `error` / `high`
//! 2. Capture date and filesystem creation date more than a day apart → `warning` / `medium`
//! 3. Completeness: count of {EXIF (> 5 keys), GPS, thumbnail} present
//!    - 2 or 3 → `success` / `high`
//!    - 1 → `success` / `medium`
//!    - 0 → `warning` / `low`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::coords::extract_coordinates;
use crate::date::parse_date_value;
use crate::finding::{ConfidenceLevel, Finding, FindingLabel, FindingStatus};
use crate::paths;
use crate::tree::{count_keys, count_prefixed_keys, is_truthy, resolve_value, CandidatePath};

/// EXIF counts as present only above this many keys
pub const MIN_EXIF_KEYS: usize = 5;

const SECONDS_PER_DAY: i64 = 86_400;

pub const MANIPULATION_SUMMARY: &str = "Manipulation indicators detected.";
pub const DATE_MISMATCH_SUMMARY: &str = "Date mismatch between capture metadata and file system.";
pub const COMPLETE_SUMMARY: &str = "File appears authentic — complete metadata.";
pub const PARTIAL_SUMMARY: &str = "Partial metadata — likely authentic.";
pub const MINIMAL_SUMMARY: &str = "Minimal metadata — cannot assess authenticity.";

/// Signals consumed by the scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticitySignals {
    pub manipulation_detected: bool,
    pub ai_generated: bool,
    pub has_exif: bool,
    pub has_gps: bool,
    pub has_thumbnail: bool,
    /// Raw capture timestamp (string or epoch number)
    pub capture_date: Option<Value>,
    /// Raw filesystem creation timestamp (string or epoch number)
    pub filesystem_date: Option<Value>,
}

impl AuthenticitySignals {
    /// Gather every signal from a metadata tree
    pub fn from_tree(tree: &Value) -> Self {
        let flag = |candidates: &[CandidatePath<'static>]| {
            resolve_value(tree, candidates).map(is_truthy).unwrap_or(false)
        };
        let exif_keys = paths::EXIF_GROUPS
            .iter()
            .map(|group| count_keys(tree, group))
            .chain(std::iter::once(count_prefixed_keys(tree, paths::EXIF_KEY_PREFIX)))
            .max()
            .unwrap_or(0);

        Self {
            manipulation_detected: flag(paths::MANIPULATION_DETECTED),
            ai_generated: flag(paths::AI_GENERATED),
            has_exif: exif_keys > MIN_EXIF_KEYS,
            has_gps: extract_coordinates(tree).is_some(),
            has_thumbnail: flag(paths::THUMBNAIL),
            capture_date: resolve_value(tree, paths::CAPTURE_DATE).cloned(),
            filesystem_date: resolve_value(tree, paths::FILESYSTEM_CREATED).cloned(),
        }
    }

    /// Number of completeness signals present (0..=3)
    pub fn signal_count(&self) -> u8 {
        [self.has_exif, self.has_gps, self.has_thumbnail]
            .iter()
            .filter(|present| **present)
            .count() as u8
    }

    /// True only when both dates parse and differ by more than one day
    ///
    /// Unparseable dates skip the check rather than counting as a mismatch.
    pub fn dates_mismatch(&self) -> bool {
        let (Some(capture), Some(filesystem)) = (&self.capture_date, &self.filesystem_date) else {
            return false;
        };

        match (parse_date_value(capture), parse_date_value(filesystem)) {
            (Some(a), Some(b)) => (a - b).num_seconds().abs() > SECONDS_PER_DAY,
            _ => {
                debug!("Skipping date consistency check, unparseable date");
                false
            }
        }
    }
}

/// Which cascade rule produced the assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticityRule {
    Manipulation,
    DateMismatch,
    Completeness,
}

/// Full scorer output; [`AuthenticityAssessment::to_finding`] keeps only the display contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityAssessment {
    pub rule: AuthenticityRule,
    pub status: FindingStatus,
    pub confidence: ConfidenceLevel,
    pub summary: String,
    /// Bounded completeness score, 0..=3
    pub signal_count: u8,
}

impl AuthenticityAssessment {
    pub fn to_finding(&self) -> Finding {
        Finding::new(FindingLabel::Authenticity, self.summary.clone(), self.confidence, self.status)
    }
}

/// Run the priority cascade over a set of signals
pub fn assess(signals: &AuthenticitySignals) -> AuthenticityAssessment {
    let signal_count = signals.signal_count();
    let outcome = |rule, status, confidence, summary: &str| AuthenticityAssessment {
        rule,
        status,
        confidence,
        summary: summary.to_string(),
        signal_count,
    };

    if signals.manipulation_detected || signals.ai_generated {
        return outcome(
            AuthenticityRule::Manipulation,
            FindingStatus::Error,
            ConfidenceLevel::High,
            MANIPULATION_SUMMARY,
        );
    }

    if signals.dates_mismatch() {
        return outcome(
            AuthenticityRule::DateMismatch,
            FindingStatus::Warning,
            ConfidenceLevel::Medium,
            DATE_MISMATCH_SUMMARY,
        );
    }

    match signal_count {
        0 => outcome(
            AuthenticityRule::Completeness,
            FindingStatus::Warning,
            ConfidenceLevel::Low,
            MINIMAL_SUMMARY,
        ),
        1 => outcome(
            AuthenticityRule::Completeness,
            FindingStatus::Success,
            ConfidenceLevel::Medium,
            PARTIAL_SUMMARY,
        ),
        _ => outcome(
            AuthenticityRule::Completeness,
            FindingStatus::Success,
            ConfidenceLevel::High,
            COMPLETE_SUMMARY,
        ),
    }
}

/// Score signals straight into an AUTHENTICITY finding
pub fn score_authenticity(signals: &AuthenticitySignals) -> Finding {
    assess(signals).to_finding()
}
