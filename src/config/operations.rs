//! Config loading, validation, and command-line overrides.

use super::model::Config;
use crate::cli::Cli;
use crate::error::{Result, ZklockError};
use crate::lock::{Identity, validate_root};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(ZklockError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ZklockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| ZklockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Build the effective config: file (if given) with flags layered on top.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Override fields with every flag that was given.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(zk) = &cli.zk {
            self.endpoints = zk.clone();
        }
        if let Some(prefix) = &cli.prefix {
            self.root = prefix.clone();
        }
        if cli.wait {
            self.wait = true;
        }
        if cli.no_wait {
            self.wait = false;
        }
        if let Some(ms) = cli.session_timeout_ms {
            self.session_timeout_ms = ms;
        }
        if let Some(secs) = cli.sleep_after {
            self.sleep_after_secs = secs;
        }
        if let Some(secs) = cli.sleep_before {
            self.sleep_before_secs = secs;
        }
        if cli.dont_kill {
            self.kill_on_fatal = false;
        }
        if cli.debug {
            self.debug = true;
        }
        if let Some(identity) = &cli.identity {
            self.identity = Some(identity.clone());
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - at least one non-blank endpoint
    /// - `root` is an absolute node path
    /// - `session_timeout_ms` and `poll_interval_ms` are positive
    /// - `identity`, when set, is non-empty
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(ZklockError::UserError(
                "config validation failed: at least one endpoint is required".to_string(),
            ));
        }

        validate_root(&self.root)
            .map_err(|e| ZklockError::UserError(format!("config validation failed: {}", e)))?;

        if self.session_timeout_ms == 0 {
            return Err(ZklockError::UserError(
                "config validation failed: session_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ZklockError::UserError(
                "config validation failed: poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(identity) = &self.identity {
            Identity::new(identity.as_str())
                .map_err(|e| ZklockError::UserError(format!("config validation failed: {}", e)))?;
        }

        Ok(())
    }

    /// The configured identity, or the host name.
    pub fn resolve_identity(&self) -> Result<Identity> {
        match &self.identity {
            Some(identity) => Identity::new(identity.as_str()),
            None => Identity::from_hostname(),
        }
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn sleep_before(&self) -> Duration {
        Duration::from_secs(self.sleep_before_secs)
    }

    pub fn sleep_after(&self) -> Duration {
        Duration::from_secs(self.sleep_after_secs)
    }
}
