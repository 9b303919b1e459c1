//! soma_findings - WHEN/WHERE/DEVICE/AUTHENTICITY findings for SOMA platform
//!
//! Distills a raw, loosely structured metadata tree (EXIF, GPS, filesystem
//! and forensic sections) into a short ordered list of human-readable
//! findings, each with a confidence tier and status. An optional enhanced
//! extraction service is consulted first under a hard time bound; any
//! failure falls back to the rule-based pipeline.

pub mod authenticity;
pub mod config;
pub mod coords;
pub mod date;
pub mod device;
pub mod engine;
pub mod enhanced;
pub mod error;
pub mod extract;
pub mod finding;
pub mod metrics;
pub mod organ;
pub mod paths;
pub mod tree;
pub mod validation;
pub mod wire;

pub use authenticity::{score_authenticity, AuthenticityAssessment, AuthenticitySignals};
pub use config::EngineConfig;
pub use coords::{format_coordinates, Coordinates};
pub use date::format_date_time;
pub use device::{DeviceDatabase, DeviceResolver, ResolvedDevice};
pub use engine::{FindingsEngine, FindingsReport, FindingsSource};
pub use enhanced::{EnhancedExtractor, UdsEnhancedClient};
pub use error::{FindingsError, Result};
pub use extract::DeterministicPipeline;
pub use finding::{ConfidenceLevel, Finding, FindingLabel, FindingStatus};
pub use tree::{resolve_value, CandidatePath, MetadataTree};
