//! Device name resolution
//!
//! Raw device identifiers are often cryptic model codes (`iPhone14,3`,
//! `SM-S918B`). A curated [`DeviceDatabase`] maps known codes to friendly
//! names; unknown devices get a cleaned-up "make model" string instead, so
//! resolution never fails once either field is present.
//!
//! ## Database format
//!
//! A flat JSON object from exact model code to display name:
//!
//! ```json
//! { "iPhone14,3": "iPhone 13 Pro Max", "SM-S918B": "Samsung Galaxy S23 Ultra" }
//! ```
//!
//! The bundled table is compiled in; [`DeviceDatabase::load`] replaces it
//! from a file at start-up without touching resolver logic.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::error::{FindingsError, Result};
use crate::finding::ConfidenceLevel;

const BUNDLED_DEVICES: &str = include_str!("../resources/devices.json");

/// Separator some sources use to append an app/description suffix to the model
const MODEL_SUFFIX_DELIMITER: &str = "::";

/// Corporate suffixes dropped from fallback names (compared lowercase, without punctuation)
const CORPORATE_TOKENS: &[&str] = &[
    "corporation", "corp", "incorporated", "inc", "company", "co", "ltd", "limited",
    "llc", "gmbh", "imaging",
];

static APP_BRANDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:(?:made|edited|created|shot)\s+(?:with|on|by)\s+\S+|snapchat|instagram|whatsapp|tiktok)\b")
        .unwrap()
});

static BUNDLED: LazyLock<Arc<DeviceDatabase>> = LazyLock::new(|| {
    let db = DeviceDatabase::from_json_str(BUNDLED_DEVICES).unwrap_or_else(|e| {
        warn!("Bundled device database unreadable, using empty table: {}", e);
        DeviceDatabase::default()
    });
    Arc::new(db)
});

// ============================================================================
// Device Database
// ============================================================================

/// Read-only mapping from exact model code to friendly display name
#[derive(Debug, Clone, Default)]
pub struct DeviceDatabase {
    entries: HashMap<String, String>,
}

impl DeviceDatabase {
    /// Process-wide bundled table, parsed once on first use
    pub fn bundled() -> Arc<DeviceDatabase> {
        Arc::clone(&BUNDLED)
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| FindingsError::DeviceDatabase(format!("invalid device table: {}", e)))?;
        Ok(Self { entries })
    }

    /// Load a replacement table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let db = Self::from_json_str(&content)?;
        debug!("Loaded {} device entries from {}", db.len(), path.display());
        Ok(db)
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, model: &str) -> Option<&str> {
        self.entries.get(model).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Friendly device name plus how it was obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDevice {
    pub name: String,
    pub confidence: ConfidenceLevel,
}

/// Resolves (make, model) pairs against an injected database
#[derive(Debug, Clone)]
pub struct DeviceResolver {
    database: Arc<DeviceDatabase>,
}

impl DeviceResolver {
    pub fn new(database: Arc<DeviceDatabase>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &DeviceDatabase {
        &self.database
    }

    /// Resolve a device name, or `None` when neither field is present
    ///
    /// Exact database hits are `high` confidence; names rebuilt from the raw
    /// fields are `medium`.
    pub fn resolve(&self, make: Option<&str>, model: Option<&str>) -> Option<ResolvedDevice> {
        let make = make.map(str::trim).filter(|s| !s.is_empty());
        let model = model.map(clean_model).filter(|s| !s.is_empty());

        if make.is_none() && model.is_none() {
            return None;
        }

        if let Some(name) = model.and_then(|m| self.database.lookup(m)) {
            return Some(ResolvedDevice {
                name: name.to_string(),
                confidence: ConfidenceLevel::High,
            });
        }

        let name = fallback_name(make, model);
        if name.is_empty() {
            debug!("Device fields reduced to nothing: make={:?} model={:?}", make, model);
            return None;
        }

        Some(ResolvedDevice {
            name,
            confidence: ConfidenceLevel::Medium,
        })
    }
}

impl Default for DeviceResolver {
    fn default() -> Self {
        Self::new(DeviceDatabase::bundled())
    }
}

/// Keep only the part before `::` and trim it
fn clean_model(raw: &str) -> &str {
    raw.split(MODEL_SUFFIX_DELIMITER).next().unwrap_or(raw).trim()
}

fn fallback_name(make: Option<&str>, model: Option<&str>) -> String {
    let make = make.map(strip_corporate).filter(|s| !s.is_empty());

    let combined = match (make.as_deref(), model) {
        (Some(mk), Some(md)) if md.to_lowercase().contains(&mk.to_lowercase()) => md.to_string(),
        (Some(mk), Some(md)) => format!("{} {}", mk, md),
        (Some(mk), None) => mk.to_string(),
        (None, Some(md)) => md.to_string(),
        (None, None) => String::new(),
    };

    let without_branding = APP_BRANDING.replace_all(&combined, " ");
    title_case(&strip_corporate(&without_branding))
}

/// Drop corporate suffix tokens and collapse whitespace
fn strip_corporate(s: &str) -> String {
    s.split_whitespace()
        .map(|token| token.trim_end_matches(','))
        .filter(|token| {
            let bare = token.trim_matches(|c: char| c == '.' || c == ',').to_lowercase();
            !bare.is_empty() && !CORPORATE_TOKENS.contains(&bare.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalize all-lowercase words; words with existing capitals keep their casing
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            if word.chars().any(|c| c.is_uppercase()) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
