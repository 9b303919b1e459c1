//! Enhanced (AI-assisted) findings extraction collaborator
//!
//! The engine treats the enhanced service as a black box that may be slow,
//! unavailable, or return garbage. [`EnhancedExtractor`] is the seam;
//! [`UdsEnhancedClient`] talks to an organ daemon over a Unix socket using
//! the same stimulus/response framing as this crate's own daemon.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{FindingsError, Result};
use crate::finding::Finding;
use crate::organ::{Response, Stimulus};
use crate::wire::{read_frame, write_frame};

/// Operation name requested from the enhanced organ
pub const ENHANCE_OP: &str = "findings.enhance";

/// Async source of higher-quality findings
///
/// `Ok(None)` means "no enhancement available" and is handled exactly like
/// an error by the orchestrator.
#[async_trait]
pub trait EnhancedExtractor: Send + Sync {
    async fn extract(&self, tree: &Value) -> Result<Option<Vec<Finding>>>;

    fn name(&self) -> &str {
        "enhanced"
    }
}

/// Client for an enhanced-extraction organ listening on a Unix socket
pub struct UdsEnhancedClient {
    socket_path: String,
    /// Per-step I/O timeout; the orchestrator applies its own overall bound
    io_timeout: Duration,
}

impl UdsEnhancedClient {
    pub fn new(socket_path: &str) -> Self {
        Self {
            socket_path: socket_path.to_string(),
            io_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    async fn send_request(&self, stimulus: &Stimulus) -> Result<Response> {
        if !Path::new(&self.socket_path).exists() {
            return Err(FindingsError::Enhancement(format!(
                "socket not found: {}",
                self.socket_path
            )));
        }

        let mut stream = tokio::time::timeout(self.io_timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| FindingsError::Timeout(self.io_timeout))?
            .map_err(|e| FindingsError::Enhancement(format!("connect failed: {}", e)))?;

        write_frame(&mut stream, stimulus).await?;

        tokio::time::timeout(self.io_timeout, read_frame::<_, Response>(&mut stream))
            .await
            .map_err(|_| FindingsError::Timeout(self.io_timeout))??
            .ok_or_else(|| FindingsError::InvalidResponse("connection closed before reply".to_string()))
    }
}

#[async_trait]
impl EnhancedExtractor for UdsEnhancedClient {
    async fn extract(&self, tree: &Value) -> Result<Option<Vec<Finding>>> {
        let stimulus = Stimulus {
            op: ENHANCE_OP.to_string(),
            input: json!({ "metadata": tree }),
            context: HashMap::new(),
        };

        let response = self.send_request(&stimulus).await?;
        debug!("Enhanced organ replied: ok={} latency={}ms", response.ok, response.latency_ms);

        if !response.ok {
            let message = response
                .output
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("Unknown error");
            return Err(FindingsError::Enhancement(message.to_string()));
        }

        parse_findings(&response.output)
    }

    fn name(&self) -> &str {
        "uds"
    }
}

/// Decode the `findings` array from an enhanced reply
///
/// A missing or `null` array is "no enhancement"; any other shape that does
/// not decode into findings is an invalid response.
pub fn parse_findings(output: &Value) -> Result<Option<Vec<Finding>>> {
    match output.get("findings") {
        None | Some(Value::Null) => Ok(None),
        Some(findings @ Value::Array(_)) => serde_json::from_value(findings.clone())
            .map(Some)
            .map_err(|e| FindingsError::InvalidResponse(format!("malformed findings: {}", e))),
        Some(other) => Err(FindingsError::InvalidResponse(format!(
            "findings is not an array: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::FindingLabel;

    #[test]
    fn test_parse_findings_shapes() {
        let ok = parse_findings(&json!({
            "findings": [{ "label": "WHERE", "value": "Golden Gate Park", "confidence": "high" }]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].label, FindingLabel::Where);

        assert!(parse_findings(&json!({})).unwrap().is_none());
        assert!(parse_findings(&json!({ "findings": null })).unwrap().is_none());
        assert!(parse_findings(&json!({ "findings": "nope" })).is_err());
        assert!(parse_findings(&json!({ "findings": [{ "label": "WHEN" }] })).is_err());
    }

    #[tokio::test]
    async fn test_missing_socket_is_error() {
        let client = UdsEnhancedClient::new("/nonexistent/enhanced.sock");
        let result = client.extract(&json!({})).await;
        assert!(matches!(result, Err(FindingsError::Enhancement(_))));
    }
}
