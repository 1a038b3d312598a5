//! Configuration loading, validation, and management for Caliper.
//!
//! Loads configuration from `~/.caliper/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use caliper_core::session::AssessmentSettings;

/// The root configuration structure.
///
/// Maps directly to `~/.caliper/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Assessment defaults applied to every new session.
    #[serde(default)]
    pub assessment: AssessmentConfig,

    /// Ability estimator tuning.
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Item bank source.
    #[serde(default)]
    pub bank: BankConfig,

    /// Session persistence.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Session lifecycle (abandonment sweep).
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_min_items")]
    pub min_items: usize,

    #[serde(default = "default_target_se")]
    pub target_se: f64,

    #[serde(default)]
    pub prior_theta: f64,

    #[serde(default = "default_prior_se")]
    pub prior_se: f64,

    #[serde(default = "default_theta_min")]
    pub theta_min: f64,

    #[serde(default = "default_theta_max")]
    pub theta_max: f64,

    /// Optional wall-clock budget per session, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seconds: Option<u64>,
}

fn default_max_items() -> usize {
    30
}
fn default_min_items() -> usize {
    10
}
fn default_target_se() -> f64 {
    0.3
}
fn default_prior_se() -> f64 {
    1.0
}
fn default_theta_min() -> f64 {
    -4.0
}
fn default_theta_max() -> f64 {
    4.0
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            min_items: default_min_items(),
            target_se: default_target_se(),
            prior_theta: 0.0,
            prior_se: default_prior_se(),
            theta_min: default_theta_min(),
            theta_max: default_theta_max(),
            max_seconds: None,
        }
    }
}

impl AssessmentConfig {
    /// Convert to the per-session settings snapshot.
    pub fn settings(&self) -> AssessmentSettings {
        AssessmentSettings {
            max_items: self.max_items,
            min_items: self.min_items,
            target_se: self.target_se,
            prior_theta: self.prior_theta,
            prior_se: self.prior_se,
            theta_min: self.theta_min,
            theta_max: self.theta_max,
            max_seconds: self.max_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Newton-Raphson stops once |Δθ| falls below this.
    #[serde(default = "default_convergence_tol")]
    pub convergence_tol: f64,

    /// Iteration cap; beyond it the prior estimate is kept.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_convergence_tol() -> f64 {
    1e-4
}
fn default_max_iterations() -> u32 {
    25
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            convergence_tol: default_convergence_tol(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Path to the bank JSON file. Empty = built-in demo bank.
    #[serde(default)]
    pub path: String,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self { path: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite", "file", "memory", or "none".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database / file path. Empty = default under the config dir.
    #[serde(default)]
    pub path: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    42910
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Idle time after which an active session is closed as abandoned.
    #[serde(default = "default_abandon_after_secs")]
    pub abandon_after_secs: u64,

    /// How often the sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_abandon_after_secs() -> u64 {
    86_400
}
fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            abandon_after_secs: default_abandon_after_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.caliper/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `CALIPER_PORT` — gateway port
    /// - `CALIPER_BANK` — item bank JSON path
    /// - `CALIPER_STORE` — store backend name
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(port) = std::env::var("CALIPER_PORT") {
            config.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("CALIPER_PORT is not a port number: {port}"))
            })?;
        }
        if let Ok(path) = std::env::var("CALIPER_BANK") {
            config.bank.path = path;
        }
        if let Ok(backend) = std::env::var("CALIPER_STORE") {
            config.store.backend = backend;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".caliper")
    }

    /// Default session store location when `store.path` is empty.
    pub fn default_store_path(&self) -> PathBuf {
        match self.store.backend.as_str() {
            "sqlite" => Self::config_dir().join("sessions.db"),
            _ => Self::config_dir().join("sessions"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assessment.min_items > self.assessment.max_items {
            return Err(ConfigError::ValidationError(format!(
                "min_items ({}) must not exceed max_items ({})",
                self.assessment.min_items, self.assessment.max_items
            )));
        }
        if self.assessment.max_items == 0 {
            return Err(ConfigError::ValidationError("max_items must be > 0".into()));
        }
        if self.assessment.target_se <= 0.0 {
            return Err(ConfigError::ValidationError("target_se must be > 0".into()));
        }
        if self.assessment.prior_se <= 0.0 {
            return Err(ConfigError::ValidationError("prior_se must be > 0".into()));
        }
        if self.assessment.theta_min >= self.assessment.theta_max {
            return Err(ConfigError::ValidationError(
                "theta_min must be below theta_max".into(),
            ));
        }
        if self.estimator.convergence_tol <= 0.0 {
            return Err(ConfigError::ValidationError(
                "convergence_tol must be > 0".into(),
            ));
        }
        if self.estimator.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be > 0".into(),
            ));
        }
        match self.store.backend.as_str() {
            "sqlite" | "file" | "memory" | "none" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown store backend '{other}' (expected sqlite, file, memory, or none)"
                )));
            }
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
