//! Integration tests for soma_findings engine and organ operations

use async_trait::async_trait;
use serde_json::{json, Value};
use soma_findings::authenticity::{COMPLETE_SUMMARY, DATE_MISMATCH_SUMMARY, MANIPULATION_SUMMARY};
use soma_findings::organ::{FindingsOrgan, Organ, Response, Stimulus};
use soma_findings::wire::{read_frame, write_frame};
use soma_findings::{
    ConfidenceLevel, DeterministicPipeline, EnhancedExtractor, EngineConfig, Finding, FindingLabel,
    FindingStatus, FindingsEngine, FindingsError, FindingsSource, UdsEnhancedClient,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::UnixListener;

/// Helper to create a test stimulus
fn create_stimulus(op: &str, input: Value) -> Stimulus {
    Stimulus {
        op: op.to_string(),
        input,
        context: HashMap::new(),
    }
}

/// A photo with full EXIF, GPS, thumbnail and a consistent filesystem date
fn iphone_photo() -> Value {
    json!({
        "exif": {
            "Make": "Apple",
            "Model": "iPhone14,3",
            "DateTimeOriginal": "2023:06:15 14:34:22",
            "ExposureTime": "1/120",
            "FNumber": 1.5,
            "ISO": 64,
            "FocalLength": "5.7 mm",
            "ThumbnailOffset": 2048
        },
        "gps": {
            "latitude": 37.7749,
            "longitude": -122.4194
        },
        "filesystem": {
            "created": "2023-06-15T14:40:00Z"
        }
    })
}

fn enhanced_findings() -> Vec<Finding> {
    vec![
        Finding::new(FindingLabel::Where, "Golden Gate Park, San Francisco", ConfidenceLevel::High, FindingStatus::Success),
        Finding::new(FindingLabel::When, "Thursday afternoon, June 15, 2023", ConfidenceLevel::High, FindingStatus::Success),
    ]
}

// ============================================================================
// Scripted enhanced collaborators
// ============================================================================

struct WellFormed;

#[async_trait]
impl EnhancedExtractor for WellFormed {
    async fn extract(&self, _tree: &Value) -> soma_findings::Result<Option<Vec<Finding>>> {
        Ok(Some(enhanced_findings()))
    }
}

struct Slow(Duration);

#[async_trait]
impl EnhancedExtractor for Slow {
    async fn extract(&self, _tree: &Value) -> soma_findings::Result<Option<Vec<Finding>>> {
        tokio::time::sleep(self.0).await;
        Ok(Some(enhanced_findings()))
    }
}

struct Failing;

#[async_trait]
impl EnhancedExtractor for Failing {
    async fn extract(&self, _tree: &Value) -> soma_findings::Result<Option<Vec<Finding>>> {
        Err(FindingsError::Enhancement("quota exhausted".to_string()))
    }
}

struct Panicking;

#[async_trait]
impl EnhancedExtractor for Panicking {
    async fn extract(&self, _tree: &Value) -> soma_findings::Result<Option<Vec<Finding>>> {
        panic!("enhancer crashed");
    }
}

struct Malformed;

#[async_trait]
impl EnhancedExtractor for Malformed {
    async fn extract(&self, _tree: &Value) -> soma_findings::Result<Option<Vec<Finding>>> {
        Ok(Some(vec![Finding::new(
            FindingLabel::Device,
            "",
            ConfidenceLevel::High,
            FindingStatus::Success,
        )]))
    }
}

fn engine_with(enhancer: impl EnhancedExtractor + 'static, timeout: Duration) -> FindingsEngine {
    FindingsEngine::with_pipeline(DeterministicPipeline::default(), timeout)
        .with_enhancer(Arc::new(enhancer))
}

fn assert_deterministic_iphone(findings: &[Finding]) {
    let labels: Vec<FindingLabel> = findings.iter().map(|f| f.label).collect();
    assert_eq!(labels, FindingLabel::ORDER.to_vec());
    assert_eq!(findings[0].value, "June 15, 2023 at 2:34 PM");
    assert_eq!(findings[1].value, "37.7749° N, 122.4194° W");
    assert_eq!(findings[2].value, "iPhone 13 Pro Max");
    assert_eq!(findings[3].value, COMPLETE_SUMMARY);
}

// ============================================================================
// Deterministic pipeline
// ============================================================================

#[tokio::test]
async fn test_full_photo_deterministic() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let findings = engine.extract_findings(&iphone_photo()).await;

    assert_deterministic_iphone(&findings);
    for finding in &findings {
        assert_eq!(finding.confidence, Some(ConfidenceLevel::High), "{:?}", finding);
        assert_eq!(finding.status, Some(FindingStatus::Success), "{:?}", finding);
    }
}

#[tokio::test]
async fn test_empty_tree_reports_unavailable() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let findings = engine.extract_findings(&json!({})).await;

    assert_eq!(findings.len(), 4);
    assert_eq!(findings[0].value, "Date not available");
    assert_eq!(findings[1].value, "Location not available");
    assert_eq!(findings[2].value, "Device information not available");
    assert_eq!(findings[3].value, "Minimal metadata — cannot assess authenticity.");
    assert!(findings.iter().all(|f| f.status == Some(FindingStatus::Warning)));
    assert!(findings.iter().all(|f| f.confidence == Some(ConfidenceLevel::Low)));
}

#[tokio::test]
async fn test_omit_unavailable_skips_absent_fields() {
    let config = EngineConfig::default().with_unavailable(false);
    let engine = FindingsEngine::new(&config).unwrap();
    let findings = engine
        .extract_findings(&json!({ "exif": { "Make": "Google", "Model": "Pixel 7" } }))
        .await;

    let labels: Vec<FindingLabel> = findings.iter().map(|f| f.label).collect();
    assert_eq!(labels, vec![FindingLabel::Device, FindingLabel::Authenticity]);
}

#[tokio::test]
async fn test_manipulation_dominates_complete_metadata() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let mut tree = iphone_photo();
    tree["forensics"] = json!({ "aiGenerated": "yes" });

    let findings = engine.extract_findings(&tree).await;
    let authenticity = &findings[3];
    assert_eq!(authenticity.value, MANIPULATION_SUMMARY);
    assert_eq!(authenticity.status, Some(FindingStatus::Error));
    assert_eq!(authenticity.confidence, Some(ConfidenceLevel::High));
}

#[tokio::test]
async fn test_date_mismatch_warning() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let mut tree = iphone_photo();
    tree["filesystem"]["created"] = json!("2023-06-20T10:00:00Z");

    let findings = engine.extract_findings(&tree).await;
    assert_eq!(findings[3].value, DATE_MISMATCH_SUMMARY);
    assert_eq!(findings[3].status, Some(FindingStatus::Warning));
    assert_eq!(findings[3].confidence, Some(ConfidenceLevel::Medium));
}

#[tokio::test]
async fn test_flat_exiftool_tree_scores_complete() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let tree = json!({
        "EXIF:Make": "Apple",
        "EXIF:Model": "iPhone14,3",
        "EXIF:DateTimeOriginal": "2023:06:15 14:34:22",
        "EXIF:ISO": 64,
        "EXIF:FNumber": 1.5,
        "EXIF:ExposureTime": "1/120",
        "EXIF:FocalLength": "5.7 mm",
        "EXIF:ThumbnailImage": "(Binary data 8124 bytes, use -b option to extract)"
    });

    let findings = engine.extract_findings(&tree).await;
    assert_eq!(findings[0].value, "June 15, 2023 at 2:34 PM");
    assert_eq!(findings[0].confidence, Some(ConfidenceLevel::High));
    assert_eq!(findings[2].value, "iPhone 13 Pro Max");
    assert_eq!(findings[3].value, COMPLETE_SUMMARY);
    assert_eq!(findings[3].status, Some(FindingStatus::Success));
    assert_eq!(findings[3].confidence, Some(ConfidenceLevel::High));
}

#[tokio::test]
async fn test_zeroed_capture_date_uses_filesystem_date() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let tree = json!({
        "exif": { "DateTimeOriginal": "0000:00:00 00:00:00" },
        "filesystem": { "created": "2023-06-15T14:40:00Z" }
    });

    let findings = engine.extract_findings(&tree).await;
    assert_eq!(findings[0].value, "June 15, 2023 at 2:40 PM");
    assert_eq!(findings[0].confidence, Some(ConfidenceLevel::Medium));
    assert_eq!(findings[0].status, Some(FindingStatus::Success));
}

#[tokio::test]
async fn test_any_tree_shape_yields_four_ordered_findings() {
    let engine = FindingsEngine::new(&EngineConfig::default()).unwrap();
    let shapes = [
        Value::Null,
        json!([1, "two", { "exif": {} }]),
        json!("not a tree"),
        json!(42),
        json!({
            "exif": "n/a",
            "gps": "n/a",
            "filesystem": [null],
            "forensics": null,
            "thumbnail": ""
        }),
        json!({ "gps": { "latitude": "north", "longitude": {} }, "exif": { "Make": null } }),
    ];

    for tree in &shapes {
        let findings = engine.extract_findings(tree).await;
        let labels: Vec<FindingLabel> = findings.iter().map(|f| f.label).collect();
        assert_eq!(labels, FindingLabel::ORDER.to_vec(), "tree: {}", tree);
        assert!(findings.iter().all(|f| f.is_well_formed()), "tree: {}", tree);
    }
}

#[tokio::test]
async fn test_custom_device_database_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("devices.json");
    fs::write(&db_path, r#"{ "FC3582": "DJI Mini 3 Pro" }"#).unwrap();

    let config = EngineConfig::default().with_device_database(&db_path);
    let engine = FindingsEngine::new(&config).unwrap();
    let findings = engine
        .extract_findings(&json!({ "exif": { "Make": "DJI", "Model": "FC3582" } }))
        .await;

    assert_eq!(findings[2].value, "DJI Mini 3 Pro");
    assert_eq!(findings[2].confidence, Some(ConfidenceLevel::High));
}

#[test]
fn test_bad_device_database_fails_at_startup() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("devices.json");
    fs::write(&db_path, "[1, 2, 3]").unwrap();

    let config = EngineConfig::default().with_device_database(&db_path);
    assert!(FindingsEngine::new(&config).is_err());

    let missing = EngineConfig::default().with_device_database(temp_dir.path().join("absent.json"));
    assert!(FindingsEngine::new(&missing).is_err());
}

// ============================================================================
// Enhanced path and fallback
// ============================================================================

#[tokio::test]
async fn test_enhanced_result_used_in_display_order() {
    let engine = engine_with(WellFormed, Duration::from_secs(2));
    let report = engine.extract_report(&iphone_photo()).await;

    assert_eq!(report.source, FindingsSource::Enhanced);
    assert!(report.fallback_reason.is_none());
    assert_eq!(report.findings.len(), 2);
    assert_eq!(report.findings[0].label, FindingLabel::When);
    assert_eq!(report.findings[1].value, "Golden Gate Park, San Francisco");
}

#[tokio::test]
async fn test_slow_enhancer_times_out_within_same_call() {
    let engine = engine_with(Slow(Duration::from_secs(10)), Duration::from_millis(100));
    let start = std::time::Instant::now();
    let report = engine.extract_report(&iphone_photo()).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.source, FindingsSource::Deterministic);
    assert!(report.fallback_reason.unwrap().contains("timed out"));
    assert_deterministic_iphone(&report.findings);

    let snap = engine.metrics().snapshot();
    assert_eq!(snap.extraction.enhanced_timeouts, 1);
    assert_eq!(snap.extraction.fallback, 1);
}

#[tokio::test]
async fn test_failing_enhancer_falls_back() {
    let engine = engine_with(Failing, Duration::from_secs(2));
    let report = engine.extract_report(&iphone_photo()).await;

    assert_eq!(report.source, FindingsSource::Deterministic);
    assert!(report.fallback_reason.unwrap().contains("quota exhausted"));
    assert_deterministic_iphone(&report.findings);
}

#[tokio::test]
async fn test_panicking_enhancer_falls_back() {
    let engine = engine_with(Panicking, Duration::from_secs(2));
    let findings = engine.extract_findings(&iphone_photo()).await;
    assert_deterministic_iphone(&findings);
}

#[tokio::test]
async fn test_malformed_enhancer_falls_back() {
    let engine = engine_with(Malformed, Duration::from_secs(2));
    let report = engine.extract_report(&iphone_photo()).await;

    assert_eq!(report.source, FindingsSource::Deterministic);
    assert_deterministic_iphone(&report.findings);
    assert_eq!(engine.metrics().snapshot().extraction.enhanced_failures, 1);
}

// ============================================================================
// Enhanced organ over a Unix socket
// ============================================================================

/// Serve one connection, answering every stimulus with `reply`
fn spawn_enhanced_server(socket_path: &Path, reply: Response) {
    let listener = UnixListener::bind(socket_path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        while let Some(stimulus) = read_frame::<_, Stimulus>(&mut stream).await.unwrap() {
            assert_eq!(stimulus.op, "findings.enhance");
            assert!(stimulus.input["metadata"].is_object());
            write_frame(&mut stream, &reply).await.unwrap();
        }
    });
}

#[tokio::test]
async fn test_uds_enhanced_client_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let socket_path = temp_dir.path().join("enhanced.sock");
    spawn_enhanced_server(
        &socket_path,
        Response {
            ok: true,
            output: json!({ "findings": enhanced_findings() }),
            latency_ms: 12,
            cost: None,
        },
    );

    let client = UdsEnhancedClient::new(&socket_path.to_string_lossy());
    let engine = FindingsEngine::with_pipeline(DeterministicPipeline::default(), Duration::from_secs(2))
        .with_enhancer(Arc::new(client));

    let report = engine.extract_report(&iphone_photo()).await;
    assert!(report.is_enhanced());
    assert_eq!(report.findings[0].label, FindingLabel::When);
    assert_eq!(report.findings[1].label, FindingLabel::Where);
}

#[tokio::test]
async fn test_uds_enhanced_error_reply_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let socket_path = temp_dir.path().join("enhanced.sock");
    spawn_enhanced_server(&socket_path, Response::error("model unavailable", 3));

    let client = UdsEnhancedClient::new(&socket_path.to_string_lossy());
    let result = client.extract(&iphone_photo()).await;
    assert!(matches!(result, Err(FindingsError::Enhancement(ref m)) if m == "model unavailable"));
}

// ============================================================================
// Organ surface
// ============================================================================

#[tokio::test]
async fn test_findings_capabilities() {
    let organ = FindingsOrgan::new();
    let response = organ
        .stimulate(create_stimulus("findings.capabilities", json!({})))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(response.output["name"], "soma_findings");
    assert_eq!(response.output["division"], "media");
    assert_eq!(response.output["functions"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_organ_extract_with_and_without_enhancer() {
    let engine = engine_with(WellFormed, Duration::from_secs(2));
    let organ = FindingsOrgan::with_engine(Arc::new(engine));

    let enhanced = organ
        .stimulate(create_stimulus("findings.extract", json!({ "metadata": iphone_photo() })))
        .await
        .unwrap();
    assert!(enhanced.ok);
    assert_eq!(enhanced.output["source"], "enhanced");

    let deterministic = organ
        .stimulate(create_stimulus(
            "findings.extract",
            json!({ "metadata": iphone_photo(), "skip_enhanced": true }),
        ))
        .await
        .unwrap();
    assert!(deterministic.ok);
    assert_eq!(deterministic.output["source"], "deterministic");
    assert_eq!(deterministic.output["findings"][0]["label"], "WHEN");
    assert_eq!(deterministic.output["findings"][0]["confidence"], "high");
    assert_eq!(deterministic.output["findings"][2]["value"], "iPhone 13 Pro Max");
}

#[tokio::test]
async fn test_organ_extract_missing_metadata() {
    let organ = FindingsOrgan::new();
    let response = organ
        .stimulate(create_stimulus("findings.extract", json!({})))
        .await
        .unwrap();

    assert!(!response.ok);
    assert!(response.output["error"].as_str().unwrap().contains("metadata"));
}

#[tokio::test]
async fn test_organ_format_operations() {
    let organ = FindingsOrgan::new();

    let date = organ
        .stimulate(create_stimulus("findings.format_date", json!({ "raw": "2023:06:15 14:34:22" })))
        .await
        .unwrap();
    assert_eq!(date.output["display"], "June 15, 2023 at 2:34 PM");
    assert_eq!(date.output["parsed"], true);

    let garbage = organ
        .stimulate(create_stimulus("findings.format_date", json!({ "raw": "sometime last summer" })))
        .await
        .unwrap();
    assert_eq!(garbage.output["display"], "sometime last summer");
    assert_eq!(garbage.output["parsed"], false);

    let coords = organ
        .stimulate(create_stimulus(
            "findings.format_coordinates",
            json!({ "latitude": -33.8688, "longitude": 151.2093 }),
        ))
        .await
        .unwrap();
    assert_eq!(coords.output["display"], "33.8688° S, 151.2093° E");
}

#[tokio::test]
async fn test_organ_resolve_device() {
    let organ = FindingsOrgan::new();

    let known = organ
        .stimulate(create_stimulus(
            "findings.resolve_device",
            json!({ "make": "Apple", "model": "iPhone14,3" }),
        ))
        .await
        .unwrap();
    assert_eq!(known.output["device"]["name"], "iPhone 13 Pro Max");
    assert_eq!(known.output["device"]["confidence"], "high");

    let absent = organ
        .stimulate(create_stimulus("findings.resolve_device", json!({})))
        .await
        .unwrap();
    assert!(absent.ok);
    assert!(absent.output["device"].is_null());
}

#[tokio::test]
async fn test_organ_score_authenticity() {
    let organ = FindingsOrgan::new();
    let response = organ
        .stimulate(create_stimulus(
            "findings.score_authenticity",
            json!({ "metadata": iphone_photo() }),
        ))
        .await
        .unwrap();

    assert!(response.ok);
    assert_eq!(response.output["finding"]["value"], COMPLETE_SUMMARY);
    assert_eq!(response.output["assessment"]["signal_count"], 3);
    assert_eq!(response.output["signals"]["hasGps"], true);
}

#[tokio::test]
async fn test_organ_metrics_counts_requests() {
    let organ = FindingsOrgan::new();
    organ
        .stimulate(create_stimulus("findings.extract", json!({ "metadata": {} })))
        .await
        .unwrap();
    organ
        .stimulate(create_stimulus("invalid.operation", json!({})))
        .await
        .unwrap();

    let response = organ.stimulate(create_stimulus("metrics", json!({}))).await.unwrap();
    assert!(response.ok);
    assert_eq!(response.output["total_requests"], 2);
    assert_eq!(response.output["failed_requests"], 1);
    assert_eq!(response.output["extraction"]["fallback"], 1);
    assert_eq!(response.output["operations"]["extract"], 1);
    assert_eq!(response.output["operations"]["format_date"], 0);
}
