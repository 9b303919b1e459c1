//! Findings orchestrator
//!
//! Tries the enhanced collaborator first under a hard time bound and falls
//! back to the deterministic pipeline on any failure: error, timeout, panic,
//! cancellation, empty list or malformed findings. The caller always gets a
//! displayable list and never sees the underlying error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use soma_findings::{EngineConfig, FindingsEngine};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = FindingsEngine::new(&EngineConfig::default())?;
//! let findings = engine.extract_findings(&json!({ "exif": { "Make": "Apple" } })).await;
//! for finding in findings {
//!     println!("{}: {}", finding.label, finding.value);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::device::DeviceResolver;
use crate::enhanced::EnhancedExtractor;
use crate::error::{FindingsError, Result};
use crate::extract::DeterministicPipeline;
use crate::finding::{Finding, FindingLabel};
use crate::metrics::Metrics;

/// Which path produced a findings list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingsSource {
    Enhanced,
    Deterministic,
}

/// Findings plus how they were obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingsReport {
    pub findings: Vec<Finding>,
    pub source: FindingsSource,
    /// Why the enhanced path was not used, when an enhancer is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub latency_ms: u64,
}

impl FindingsReport {
    pub fn is_enhanced(&self) -> bool {
        self.source == FindingsSource::Enhanced
    }
}

pub struct FindingsEngine {
    pipeline: DeterministicPipeline,
    enhancer: Option<Arc<dyn EnhancedExtractor>>,
    enhanced_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl FindingsEngine {
    /// Build an engine from configuration, loading the device table
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let database = config.load_device_database()?;
        let pipeline = DeterministicPipeline::new(
            DeviceResolver::new(database),
            config.include_unavailable,
        );
        Ok(Self::with_pipeline(pipeline, config.enhanced_timeout))
    }

    pub fn with_pipeline(pipeline: DeterministicPipeline, enhanced_timeout: Duration) -> Self {
        Self {
            pipeline,
            enhancer: None,
            enhanced_timeout,
            metrics: Metrics::new(),
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn EnhancedExtractor>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn pipeline(&self) -> &DeterministicPipeline {
        &self.pipeline
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Synchronous rule-based findings, no collaborator involved
    pub fn extract_deterministic(&self, tree: &Value) -> Vec<Finding> {
        self.pipeline.run(tree)
    }

    /// Best available findings within the configured time bound
    pub async fn extract_findings(&self, tree: &Value) -> Vec<Finding> {
        self.extract_report(tree).await.findings
    }

    /// Like [`extract_findings`](Self::extract_findings) but reports the path taken
    pub async fn extract_report(&self, tree: &Value) -> FindingsReport {
        self.extract_with(tree, true).await
    }

    /// Run extraction, optionally bypassing the enhanced collaborator
    pub async fn extract_with(&self, tree: &Value, allow_enhanced: bool) -> FindingsReport {
        let start = Instant::now();

        let enhancer = match &self.enhancer {
            Some(enhancer) if allow_enhanced => Arc::clone(enhancer),
            _ => return self.deterministic_report(tree, None, start),
        };

        match self.try_enhanced(enhancer, tree).await {
            Ok(findings) => {
                self.metrics.record_extraction(true);
                FindingsReport {
                    findings,
                    source: FindingsSource::Enhanced,
                    fallback_reason: None,
                    latency_ms: start.elapsed().as_millis() as u64,
                }
            }
            Err(e) => {
                warn!("Enhanced extraction unavailable, using rule-based findings: {}", e);
                self.metrics
                    .record_enhanced_failure(matches!(e, FindingsError::Timeout(_)));
                self.deterministic_report(tree, Some(e.to_string()), start)
            }
        }
    }

    fn deterministic_report(
        &self,
        tree: &Value,
        fallback_reason: Option<String>,
        start: Instant,
    ) -> FindingsReport {
        let findings = self.pipeline.run(tree);
        self.metrics.record_extraction(false);
        debug!("Rule-based extraction produced {} findings", findings.len());

        FindingsReport {
            findings,
            source: FindingsSource::Deterministic,
            fallback_reason,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Enhanced call on its own task so panics and cancellation surface as errors
    async fn try_enhanced(
        &self,
        enhancer: Arc<dyn EnhancedExtractor>,
        tree: &Value,
    ) -> Result<Vec<Finding>> {
        let owned = tree.clone();
        let name = enhancer.name().to_string();
        let mut handle = tokio::spawn(async move { enhancer.extract(&owned).await });

        let joined = match tokio::time::timeout(self.enhanced_timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(FindingsError::Timeout(self.enhanced_timeout));
            }
        };

        let reply = joined.map_err(|e| {
            let what = if e.is_cancelled() { "was cancelled" } else { "panicked" };
            FindingsError::Enhancement(format!("{} extractor {}", name, what))
        })??;

        let findings = reply
            .ok_or_else(|| FindingsError::InvalidResponse("no findings returned".to_string()))?;
        validate_enhanced(findings)
    }
}

/// Accept only a non-empty list of well-formed findings, in display order
fn validate_enhanced(mut findings: Vec<Finding>) -> Result<Vec<Finding>> {
    if findings.is_empty() {
        return Err(FindingsError::InvalidResponse("empty findings list".to_string()));
    }
    if let Some(bad) = findings.iter().find(|f| !f.is_well_formed()) {
        return Err(FindingsError::InvalidResponse(format!(
            "blank value for {} finding",
            bad.label
        )));
    }

    findings.sort_by_key(|f| label_rank(f.label));
    Ok(findings)
}

fn label_rank(label: FindingLabel) -> usize {
    FindingLabel::ORDER
        .iter()
        .position(|l| *l == label)
        .unwrap_or(FindingLabel::ORDER.len())
}
