use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::profile::PhysiologyProfile;
use crate::state::Anthropometrics;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvaConfig {
    pub simulation: SimulationConfig,
    pub astronaut: Anthropometrics,
    pub mission: MissionConfig,
    /// Physiology profile TOML; the built-in profile is used when absent.
    pub profile: Option<PathBuf>,
}

impl EvaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::parse(&content)
    }

    /// Load from path; only a missing file falls back to defaults (with env
    /// overrides). A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("Invalid config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                Ok(cfg)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display())),
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let mut config: EvaConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the physiology profile. A configured but unreadable or invalid
    /// profile is an error, never a silent fallback.
    pub fn load_profile(&self) -> Result<PhysiologyProfile> {
        match &self.profile {
            Some(path) => PhysiologyProfile::load(path),
            None => Ok(PhysiologyProfile::default()),
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("EVA_GRANULARITY") {
            if let Ok(n) = v.parse() {
                self.simulation.granularity_minutes = n;
            }
        }
        if let Ok(v) = std::env::var("EVA_PRECISION") {
            if let Ok(n) = v.parse() {
                self.simulation.precision = n;
            }
        }
        if let Ok(v) = std::env::var("EVA_OUTPUT_DIR") {
            self.simulation.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("EVA_PROFILE") {
            self.profile = Some(PathBuf::from(v));
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Minutes simulated per sequence letter. Shocks always take one minute.
    pub granularity_minutes: i64,
    /// Decimal places kept in written logs.
    pub precision: u32,
    /// Write variables as rows and records as columns.
    pub transpose: bool,
    pub output_dir: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: 10,
            precision: 4,
            transpose: false,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Mission plan CSV with one task-letter column per EVA.
    pub path: Option<PathBuf>,
    /// Columns of `path` to simulate, one astronaut each.
    pub columns: Vec<String>,
    /// Inline task sequence, used when no mission file is given.
    pub sequence: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
