//! Engine configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::device::DeviceDatabase;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on the enhanced extraction call
    pub enhanced_timeout: Duration,
    /// Emit "not available" warnings for absent fields instead of omitting them
    pub include_unavailable: bool,
    /// Replacement device table; the bundled one is used when unset
    pub device_database: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enhanced_timeout: Duration::from_millis(8000),
            include_unavailable: true,
            device_database: None,
        }
    }
}

impl EngineConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.enhanced_timeout = timeout;
        self
    }

    pub fn with_unavailable(mut self, include: bool) -> Self {
        self.include_unavailable = include;
        self
    }

    pub fn with_device_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_database = Some(path.into());
        self
    }

    /// Load the configured device table, falling back to the bundled one
    pub fn load_device_database(&self) -> Result<Arc<DeviceDatabase>> {
        match &self.device_database {
            Some(path) => Ok(Arc::new(DeviceDatabase::load(path)?)),
            None => Ok(DeviceDatabase::bundled()),
        }
    }
}
