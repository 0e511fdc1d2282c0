use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DsuError, DsuResult};

/// Everything the original program compiled in: repo endpoint, the
/// deployment's NDN naming scheme, retry/lifetime tuning, and where the
/// pending-interest table is persisted. Layered defaults < file < env <
/// CLI flags, following the precedence the pack's configuration-bearing
/// crates use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub repo_host: String,
  pub repo_port: u16,

  pub common_prefix: String,
  pub catalog_suffix: String,
  pub data_suffix: String,

  pub register_prefix: String,
  pub confirm_prefix: String,
  pub confirm_reply_prefix: String,

  pub interest_lifetime: Duration,
  pub register_ack_freshness: Duration,
  pub confirm_reply_freshness: Duration,

  pub leaf_retry_cap: u32,

  pub state_file: PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      repo_host: "localhost".to_string(),
      repo_port: 7376,

      common_prefix: "/org/openmhealth".to_string(),
      catalog_suffix: "/SAMPLE/fitness/physical_activity/time_location/catalog".to_string(),
      data_suffix: "/SAMPLE/fitness/physical_activity/time_location".to_string(),

      register_prefix: "/org/openmhealth/dsu/register/org/openmhealth".to_string(),
      confirm_prefix: "/org/openmhealth/dsu/confirm/org/openmhealth".to_string(),
      confirm_reply_prefix: "/org/openmhealth/dsu/confirm".to_string(),

      interest_lifetime: Duration::from_secs(60),
      register_ack_freshness: Duration::from_secs(10),
      confirm_reply_freshness: Duration::from_secs(10),

      leaf_retry_cap: 3,

      state_file: PathBuf::from("state"),
    }
  }
}

impl Config {
  /// Loads a TOML file on top of [`Config::default`]. Missing file is not
  /// an error — callers normally call this only when a path was actually
  /// given on the command line or in the environment.
  pub fn load_file(path: &Path) -> DsuResult<Config> {
    let text = std::fs::read_to_string(path)
      .map_err(|source| DsuError::ConfigFile { path: path.to_path_buf(), source })?;
    toml::from_str(&text).map_err(|source| DsuError::ConfigParse { path: path.to_path_buf(), source })
  }

  /// Applies `DSU_*` environment variable overrides on top of whatever was
  /// loaded so far (defaults, or defaults-plus-file).
  pub fn apply_env(mut self) -> Config {
    if let Ok(v) = std::env::var("DSU_REPO_HOST") {
      self.repo_host = v;
    }
    if let Ok(v) = std::env::var("DSU_REPO_PORT") {
      if let Ok(port) = v.parse() {
        self.repo_port = port;
      }
    }
    if let Ok(v) = std::env::var("DSU_STATE_FILE") {
      self.state_file = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("DSU_COMMON_PREFIX") {
      self.common_prefix = v;
    }
    self
  }

  pub fn repo_addr(&self) -> String {
    format!("{}:{}", self.repo_host, self.repo_port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_the_original_deployment_prefixes() {
    let config = Config::default();
    assert_eq!(config.repo_addr(), "localhost:7376");
    assert_eq!(config.register_prefix, "/org/openmhealth/dsu/register/org/openmhealth");
  }

  #[test]
  fn env_overrides_apply_on_top_of_defaults() {
    std::env::set_var("DSU_REPO_PORT", "9999");
    let config = Config::default().apply_env();
    assert_eq!(config.repo_port, 9999);
    std::env::remove_var("DSU_REPO_PORT");
  }
}
