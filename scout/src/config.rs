use crate::errors::AutomationError;
use crate::poll::WaitCondition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ENV_OBJECT_TIMEOUT_MS: &str = "SCOUT_OBJECT_TIMEOUT_MS";
pub const ENV_WAIT_TIMEOUT_MS: &str = "SCOUT_WAIT_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "SCOUT_POLL_INTERVAL_MS";
pub const ENV_STARTUP_GRACE_MS: &str = "SCOUT_STARTUP_GRACE_MS";

/// Timing knobs shared by every lookup and wait of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long object lookups wait for the object to appear
    pub object_timeout_ms: u64,
    /// Timeout for condition waits that do not specify one
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// How long to watch for a plugin error dialog after launch
    pub startup_grace_ms: u64,
    /// Program handed to the engine on launch
    pub program: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub program_args: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            object_timeout_ms: 20_000,
            wait_timeout_ms: 20_000,
            poll_interval_ms: 100,
            startup_grace_ms: 2_000,
            program: "qtcreator".to_string(),
            program_args: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by the `SCOUT_*` environment variables
    pub fn from_env() -> Result<Self, AutomationError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::InvalidArgument(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: SessionConfig = serde_json::from_str(&text).map_err(|e| {
            AutomationError::InvalidArgument(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the environment, in practice)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AutomationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&str, &mut u64); 4] = [
            (ENV_OBJECT_TIMEOUT_MS, &mut self.object_timeout_ms),
            (ENV_WAIT_TIMEOUT_MS, &mut self.wait_timeout_ms),
            (ENV_POLL_INTERVAL_MS, &mut self.poll_interval_ms),
            (ENV_STARTUP_GRACE_MS, &mut self.startup_grace_ms),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                *slot = raw.trim().parse().map_err(|_| {
                    AutomationError::InvalidArgument(format!("{key} must be milliseconds, got {raw:?}"))
                })?;
                debug!(key, value = *slot, "config override");
            }
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), AutomationError> {
        if self.poll_interval_ms == 0 {
            return Err(AutomationError::InvalidArgument(
                "poll interval must be at least 1 ms".to_string(),
            ));
        }
        if self.program.trim().is_empty() {
            return Err(AutomationError::InvalidArgument(
                "program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn object_timeout(&self) -> Duration {
        Duration::from_millis(self.object_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Wait condition with this config's poll interval
    pub fn wait(&self, timeout_ms: Option<u64>) -> WaitCondition {
        WaitCondition::from_millis(timeout_ms.unwrap_or(self.wait_timeout_ms))
            .with_poll_interval(self.poll_interval())
    }
}
