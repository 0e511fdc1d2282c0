use std::path::PathBuf;

use thiserror::Error;

/// Failures that legitimately propagate with `?` rather than being logged
/// and absorbed where the spec says to absorb them (malformed catalog JSON,
/// late timeouts — see §7 of the design).
#[derive(Debug, Error)]
pub enum DsuError {
  #[error("repo at {addr} is unreachable: {source}")]
  RepoUnreachable { addr: String, #[source] source: std::io::Error },

  #[error("repo channel I/O error: {0}")]
  RepoIo(#[from] std::io::Error),

  #[error("failed to decode TLV element from repo channel: {0}")]
  TlvDecode(#[from] crate::ndn::tlv::TlvError),

  #[error("state file {path}: {source}")]
  StateFile { path: PathBuf, #[source] source: std::io::Error },

  #[error("config file {path}: {source}")]
  ConfigFile { path: PathBuf, #[source] source: std::io::Error },

  #[error("config file {path} is not valid TOML: {source}")]
  ConfigParse { path: PathBuf, #[source] source: toml::de::Error },

  #[error("failed to register interest filter for prefix {prefix}: {reason}")]
  PrefixRegistration { prefix: String, reason: String },
}

pub type DsuResult<T> = Result<T, DsuError>;
