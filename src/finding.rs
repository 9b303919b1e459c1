//! Finding types shared by the extractors, the orchestrator and the organ surface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which canonical fact a finding describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingLabel {
    When,
    Where,
    Device,
    Authenticity,
}

impl FindingLabel {
    /// Fixed display order consumed by the presentation layer
    pub const ORDER: [FindingLabel; 4] = [
        FindingLabel::When,
        FindingLabel::Where,
        FindingLabel::Device,
        FindingLabel::Authenticity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingLabel::When => "WHEN",
            FindingLabel::Where => "WHERE",
            FindingLabel::Device => "DEVICE",
            FindingLabel::Authenticity => "AUTHENTICITY",
        }
    }
}

impl fmt::Display for FindingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How authoritative the source of a finding was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation hint, independent of confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    /// Clean positive result
    Success,
    /// Field absent, not necessarily meaningful
    Warning,
    /// Field present and indicates a problem
    Error,
}

/// One display-ready fact derived from raw metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub label: FindingLabel,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FindingStatus>,
}

impl Finding {
    pub fn new(
        label: FindingLabel,
        value: impl Into<String>,
        confidence: ConfidenceLevel,
        status: FindingStatus,
    ) -> Self {
        Self {
            label,
            value: value.into(),
            confidence: Some(confidence),
            status: Some(status),
        }
    }

    /// Honest "not available" finding for an absent field
    pub fn unavailable(label: FindingLabel, value: impl Into<String>) -> Self {
        Self::new(label, value, ConfidenceLevel::Low, FindingStatus::Warning)
    }

    /// A finding is usable for display when it carries a non-blank value
    pub fn is_well_formed(&self) -> bool {
        !self.value.trim().is_empty()
    }
}
