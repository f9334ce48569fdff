// src/config.rs
// Pipeline configuration: TOML file resolved via env var with a conventional
// fallback path, defaulting to the built-in values when neither exists.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "HARVESTER_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/harvester.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Base URL of the discovery surface.
    #[serde(default = "default_surface_base_url")]
    pub surface_base_url: String,
    /// Cap on candidates consumed from discovery.
    #[serde(default = "default_max_postings")]
    pub max_postings: usize,
    /// Cap on postings fetched per company from its ATS.
    #[serde(default = "default_max_per_company")]
    pub max_per_company: usize,
    /// Minimum interval between outbound requests.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// When false, discovery data is final for every company.
    #[serde(default = "default_fetch_ats")]
    pub fetch_ats: bool,
}

fn default_surface_base_url() -> String {
    "https://www.linkedin.com".to_string()
}
fn default_max_postings() -> usize {
    25
}
fn default_max_per_company() -> usize {
    50
}
fn default_rate_limit_ms() -> u64 {
    2000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_fetch_ats() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        toml::from_str("").expect("defaults deserialize")
    }
}

impl PipelineConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolution order:
    /// 1) $HARVESTER_CONFIG_PATH (must exist if set)
    /// 2) config/harvester.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let fallback = PathBuf::from(DEFAULT_PATH);
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }
}
