//! UMA Organ Interface for soma_findings
//!
//! Exposes the findings engine through the Universal Module Architecture
//! (UMA) stimulus/response pattern so orchestrators can discover and invoke
//! it like any other SOMA organ.
//!
//! ## Available Operations
//!
//! 1. `findings.extract` - Full WHEN/WHERE/DEVICE/AUTHENTICITY extraction
//! 2. `findings.format_date` - Render a raw date for display
//! 3. `findings.format_coordinates` - Render signed coordinates
//! 4. `findings.resolve_device` - Friendly device name from make/model
//! 5. `findings.score_authenticity` - Authenticity cascade over a metadata tree
//! 6. `findings.capabilities` - Capability card query
//! 7. `metrics` - Counter snapshot
//!
//! ## Example
//!
//! ```rust,no_run
//! use soma_findings::organ::{FindingsOrgan, Organ, Stimulus};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let organ = FindingsOrgan::new();
//!
//! let response = organ.stimulate(Stimulus {
//!     op: "findings.extract".to_string(),
//!     input: json!({ "metadata": { "exif": { "Make": "Apple", "Model": "iPhone14,3" } } }),
//!     context: HashMap::new(),
//! }).await?;
//! println!("{}", response.output["findings"]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use crate::authenticity::{assess, AuthenticitySignals};
use crate::coords::format_coordinates;
use crate::date::{format_date_time, parse_date_time};
use crate::engine::FindingsEngine;
use crate::config::EngineConfig;
use crate::error::FindingsError;
use crate::metrics::Metrics;
use crate::validation::validate_input;

/// UMA Stimulus - input to organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stimulus {
    pub op: String,
    pub input: Value,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

/// UMA Response - output from organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    pub output: Value,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl Response {
    pub fn error(message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            ok: false,
            output: json!({ "error": message.into() }),
            latency_ms,
            cost: None,
        }
    }
}

/// Organ trait - all SOMA organs implement this
#[async_trait]
pub trait Organ: Send + Sync {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError>;
    fn describe(&self) -> OrganCard;
}

/// Organ-level errors
#[derive(Debug, Error)]
pub enum OrganError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<FindingsError> for OrganError {
    fn from(err: FindingsError) -> Self {
        match err {
            FindingsError::ValidationError(msg) => OrganError::InvalidInput(msg),
            FindingsError::Json(e) => OrganError::SerializationError(e),
            other => OrganError::ProcessingError(other.to_string()),
        }
    }
}

/// Organ capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganCard {
    pub name: String,
    pub version: String,
    pub description: String,
    pub division: String,
    pub subsystem: String,
    pub tags: Vec<String>,
    pub execution_modes: Vec<String>,
    pub functions: Vec<FunctionCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Function capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCard {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
    pub idempotent: bool,
    pub side_effects: Vec<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Value,
}

/// Findings Extraction Organ
pub struct FindingsOrgan {
    engine: Arc<FindingsEngine>,
    metrics: Arc<Metrics>,
}

impl FindingsOrgan {
    /// Organ over a default engine (bundled device table, no enhancer)
    pub fn new() -> Self {
        let engine = FindingsEngine::with_pipeline(
            Default::default(),
            EngineConfig::default().enhanced_timeout,
        );
        Self::with_engine(Arc::new(engine))
    }

    /// Organ over a configured engine; metrics are shared with it
    pub fn with_engine(engine: Arc<FindingsEngine>) -> Self {
        let metrics = engine.metrics();
        Self { engine, metrics }
    }

    pub fn engine(&self) -> Arc<FindingsEngine> {
        Arc::clone(&self.engine)
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle findings.extract operation
    async fn handle_extract(&self, input: Value) -> Result<Value, OrganError> {
        let skip_enhanced = input["skip_enhanced"].as_bool().unwrap_or(false);
        let report = self.engine.extract_with(&input["metadata"], !skip_enhanced).await;
        Ok(serde_json::to_value(&report)?)
    }

    /// Handle findings.format_date operation
    fn handle_format_date(&self, input: Value) -> Result<Value, OrganError> {
        let raw = input["raw"]
            .as_str()
            .ok_or_else(|| OrganError::InvalidInput("Missing raw".to_string()))?;

        Ok(json!({
            "display": format_date_time(raw),
            "parsed": parse_date_time(raw).is_some(),
        }))
    }

    /// Handle findings.format_coordinates operation
    fn handle_format_coordinates(&self, input: Value) -> Result<Value, OrganError> {
        let latitude = input["latitude"]
            .as_f64()
            .ok_or_else(|| OrganError::InvalidInput("Missing latitude".to_string()))?;
        let longitude = input["longitude"]
            .as_f64()
            .ok_or_else(|| OrganError::InvalidInput("Missing longitude".to_string()))?;

        Ok(json!({ "display": format_coordinates(latitude, longitude) }))
    }

    /// Handle findings.resolve_device operation
    fn handle_resolve_device(&self, input: Value) -> Result<Value, OrganError> {
        let device = self
            .engine
            .pipeline()
            .resolver()
            .resolve(input["make"].as_str(), input["model"].as_str());

        Ok(json!({ "device": device }))
    }

    /// Handle findings.score_authenticity operation
    fn handle_score_authenticity(&self, input: Value) -> Result<Value, OrganError> {
        let signals = match input.get("signals") {
            Some(signals) if !signals.is_null() => serde_json::from_value(signals.clone())?,
            _ => AuthenticitySignals::from_tree(&input["metadata"]),
        };
        let assessment = assess(&signals);

        Ok(json!({
            "finding": assessment.to_finding(),
            "assessment": assessment,
            "signals": signals,
        }))
    }

    fn handle_capabilities(&self) -> Result<Value, OrganError> {
        Ok(serde_json::to_value(self.describe())?)
    }

    async fn dispatch(&self, op: &str, input: Value) -> Result<Value, OrganError> {
        if let Some(schema) = self.input_schema(op) {
            validate_input(&input, &schema)?;
        }

        match op {
            "findings.extract" => self.handle_extract(input).await,
            "findings.format_date" => self.handle_format_date(input),
            "findings.format_coordinates" => self.handle_format_coordinates(input),
            "findings.resolve_device" => self.handle_resolve_device(input),
            "findings.score_authenticity" => self.handle_score_authenticity(input),
            "findings.capabilities" => self.handle_capabilities(),
            "metrics" => Ok(json!(self.metrics.snapshot())),
            _ => Err(OrganError::UnsupportedOperation(op.to_string())),
        }
    }

    fn input_schema(&self, op: &str) -> Option<Value> {
        self.describe()
            .functions
            .into_iter()
            .find(|f| f.name == op)
            .and_then(|f| f.input_schema)
    }
}

impl Default for FindingsOrgan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Organ for FindingsOrgan {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError> {
        let start = Instant::now();
        let op = stimulus.op.clone();

        let result = self.dispatch(&op, stimulus.input).await;
        let latency = start.elapsed().as_millis() as u64;
        self.metrics.record_request(&op, result.is_ok(), latency);

        match result {
            Ok(output) => Ok(Response {
                ok: true,
                output,
                latency_ms: latency,
                cost: None,
            }),
            Err(OrganError::UnsupportedOperation(op)) => Ok(Response {
                ok: false,
                output: json!({
                    "error": format!("Unsupported operation: {}", op),
                    "op": op,
                    "available_operations": OPERATIONS,
                }),
                latency_ms: latency,
                cost: None,
            }),
            Err(e) => {
                debug!("Operation {} failed: {}", op, e);
                Ok(Response::error(e.to_string(), latency))
            }
        }
    }

    fn describe(&self) -> OrganCard {
        OrganCard {
            name: "soma_findings".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Distills nested file metadata into WHEN/WHERE/DEVICE/AUTHENTICITY findings with confidence tiers".to_string(),
            division: "media".to_string(),
            subsystem: "findings".to_string(),
            tags: ["metadata", "exif", "gps", "device", "authenticity", "findings"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            execution_modes: vec![
                "embedded".to_string(),
                "server".to_string(),
            ],
            author: Some("SOMA Media Team".to_string()),
            functions: function_cards(),
        }
    }
}

const OPERATIONS: [&str; 7] = [
    "findings.extract",
    "findings.format_date",
    "findings.format_coordinates",
    "findings.resolve_device",
    "findings.score_authenticity",
    "findings.capabilities",
    "metrics",
];

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn finding_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "label": { "type": "string", "enum": ["WHEN", "WHERE", "DEVICE", "AUTHENTICITY"] },
            "value": { "type": "string" },
            "confidence": { "type": "string", "enum": ["high", "medium", "low"] },
            "status": { "type": "string", "enum": ["success", "warning", "error"] }
        }
    })
}

fn function_cards() -> Vec<FunctionCard> {
    vec![
        FunctionCard {
            name: "findings.extract".to_string(),
            description: "Extract ordered WHEN/WHERE/DEVICE/AUTHENTICITY findings, preferring enhanced extraction within a time bound".to_string(),
            tags: tags(&["findings", "extraction", "metadata"]),
            examples: tags(&[
                "Summarize EXIF/GPS/filesystem metadata of an uploaded photo",
                "Produce display-ready findings for a file detail view",
            ]),
            idempotent: true,
            side_effects: tags(&["may call enhanced extraction service"]),
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "metadata": { "type": "object", "description": "Raw metadata tree for one file" },
                    "skip_enhanced": { "type": "boolean", "description": "Use rule-based findings only (default: false)" }
                },
                "required": ["metadata"]
            })),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "findings": { "type": "array", "items": finding_schema() },
                    "source": { "type": "string", "enum": ["enhanced", "deterministic"] },
                    "fallback_reason": { "type": "string" },
                    "latency_ms": { "type": "integer" }
                }
            }),
        },
        FunctionCard {
            name: "findings.format_date".to_string(),
            description: "Render an EXIF/ISO-8601/RFC 2822 date as 'June 15, 2023 at 2:34 PM'; unparseable input is returned unchanged".to_string(),
            tags: tags(&["date", "formatting"]),
            examples: tags(&["Format '2023:06:15 14:34:22' for display"]),
            idempotent: true,
            side_effects: vec![],
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "raw": { "type": "string", "description": "Raw date string" }
                },
                "required": ["raw"]
            })),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "display": { "type": "string" },
                    "parsed": { "type": "boolean" }
                }
            }),
        },
        FunctionCard {
            name: "findings.format_coordinates".to_string(),
            description: "Render signed latitude/longitude with hemisphere letters to 4 decimal places".to_string(),
            tags: tags(&["gps", "formatting"]),
            examples: tags(&["Format 37.7749, -122.4194 as '37.7749° N, 122.4194° W'"]),
            idempotent: true,
            side_effects: vec![],
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "latitude": { "type": "number" },
                    "longitude": { "type": "number" }
                },
                "required": ["latitude", "longitude"]
            })),
            output_schema: json!({
                "type": "object",
                "properties": { "display": { "type": "string" } }
            }),
        },
        FunctionCard {
            name: "findings.resolve_device".to_string(),
            description: "Map a make/model pair to a friendly device name via the device table, with cleanup fallback".to_string(),
            tags: tags(&["device", "lookup"]),
            examples: tags(&["Resolve Apple iPhone14,3 to 'iPhone 13 Pro Max'"]),
            idempotent: true,
            side_effects: vec![],
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "make": { "type": ["string", "null"] },
                    "model": { "type": ["string", "null"] }
                }
            })),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "device": {
                        "type": ["object", "null"],
                        "properties": {
                            "name": { "type": "string" },
                            "confidence": { "type": "string", "enum": ["high", "medium", "low"] }
                        }
                    }
                }
            }),
        },
        FunctionCard {
            name: "findings.score_authenticity".to_string(),
            description: "Run the authenticity cascade (manipulation flags, date consistency, metadata completeness)".to_string(),
            tags: tags(&["authenticity", "forensics"]),
            examples: tags(&[
                "Assess whether a photo's metadata looks complete",
                "Score explicit signals from an external forensic scan",
            ]),
            idempotent: true,
            side_effects: vec![],
            input_schema: Some(json!({
                "type": "object",
                "properties": {
                    "metadata": { "type": "object", "description": "Metadata tree to gather signals from" },
                    "signals": { "type": ["object", "null"], "description": "Explicit signals, overriding metadata" }
                }
            })),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "finding": finding_schema(),
                    "assessment": { "type": "object" },
                    "signals": { "type": "object" }
                }
            }),
        },
        FunctionCard {
            name: "findings.capabilities".to_string(),
            description: "Return organ capability card with all available functions and metadata".to_string(),
            tags: tags(&["metadata", "discovery", "mcp"]),
            examples: tags(&["Discover available findings operations"]),
            idempotent: true,
            side_effects: vec![],
            input_schema: None,
            output_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "functions": { "type": "array" }
                }
            }),
        },
    ]
}
