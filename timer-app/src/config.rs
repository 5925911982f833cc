//! Environment-driven process configuration (§4.7). Read once at boot, never
//! mutated afterward.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

const ENV_STORAGE: &str = "TIMER_STORAGE";
const ENV_MIN_POLL_PERIOD_MS: &str = "TIMER_MIN_POLL_PERIOD_MS";
const ENV_LOG_LEVEL: &str = "TIMER_LOG_LEVEL";

const DEFAULT_MIN_POLL_PERIOD_MS: u64 = 1000;
const DEFAULT_LOG_LEVEL: Level = Level::INFO;

/// App data directory name used when a storage path isn't explicit, matching
/// the teacher codebase's own per-app subdirectory convention.
const APP_DIR_NAME: &str = "timer-app";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid {env} value {value:?}: {reason}")]
  InvalidValue {
    env: &'static str,
    value: String,
    reason: String,
  },
}

/// Which [`timer_core::IdentifiableTimerCollection`] implementation to
/// construct (§3, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
  Memory,
  JsonDir(PathBuf),
  Sled(PathBuf),
}

impl StorageKind {
  fn parse(raw: &str) -> Result<Self, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
      env: ENV_STORAGE,
      value: raw.to_string(),
      reason: reason.to_string(),
    };
    match raw.split_once(':') {
      Some(("json-dir", path)) if !path.is_empty() => Ok(StorageKind::JsonDir(PathBuf::from(path))),
      Some(("sled", path)) if !path.is_empty() => Ok(StorageKind::Sled(PathBuf::from(path))),
      Some(("json-dir" | "sled", _)) => Err(invalid("path must not be empty")),
      None if raw == "memory" => Ok(StorageKind::Memory),
      _ => Err(invalid("expected `memory`, `json-dir:<path>`, or `sled:<path>`")),
    }
  }

  /// Per-build-profile default (§9): in-memory for a debug build, a
  /// sled-backed directory under the platform data dir for release.
  fn default_for_profile() -> Self {
    if cfg!(debug_assertions) {
      StorageKind::Memory
    } else {
      StorageKind::Sled(app_data_dir().join("timers.sled"))
    }
  }
}

fn app_data_dir() -> PathBuf {
  dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
  pub min_poll_period: Duration,
  pub storage: StorageKind,
  pub log_level: Level,
}

impl RunnerConfig {
  /// Read configuration from the process environment, falling back to
  /// documented defaults for anything unset.
  pub fn from_env() -> Result<Self, ConfigError> {
    let storage = match std::env::var(ENV_STORAGE) {
      Ok(raw) => StorageKind::parse(&raw)?,
      Err(_) => StorageKind::default_for_profile(),
    };

    let min_poll_period_ms = match std::env::var(ENV_MIN_POLL_PERIOD_MS) {
      Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        env: ENV_MIN_POLL_PERIOD_MS,
        value: raw,
        reason: e.to_string(),
      })?,
      Err(_) => DEFAULT_MIN_POLL_PERIOD_MS,
    };

    let log_level = match std::env::var(ENV_LOG_LEVEL) {
      Ok(raw) => raw.parse::<Level>().map_err(|_| ConfigError::InvalidValue {
        env: ENV_LOG_LEVEL,
        value: raw,
        reason: "expected one of trace, debug, info, warn, error".to_string(),
      })?,
      Err(_) => DEFAULT_LOG_LEVEL,
    };

    Ok(Self {
      min_poll_period: Duration::from_millis(min_poll_period_ms),
      storage,
      log_level,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn storage_kind_parses_memory() {
    assert_eq!(StorageKind::parse("memory").unwrap(), StorageKind::Memory);
  }

  #[test]
  fn storage_kind_parses_json_dir_with_path() {
    assert_eq!(
      StorageKind::parse("json-dir:/var/lib/timers").unwrap(),
      StorageKind::JsonDir(PathBuf::from("/var/lib/timers"))
    );
  }

  #[test]
  fn storage_kind_parses_sled_with_path() {
    assert_eq!(
      StorageKind::parse("sled:/var/lib/timers.db").unwrap(),
      StorageKind::Sled(PathBuf::from("/var/lib/timers.db"))
    );
  }

  #[test]
  fn storage_kind_rejects_empty_path() {
    assert!(StorageKind::parse("sled:").is_err());
    assert!(StorageKind::parse("json-dir:").is_err());
  }

  #[test]
  fn storage_kind_rejects_unknown_scheme() {
    assert!(StorageKind::parse("postgres:localhost").is_err());
    assert!(StorageKind::parse("").is_err());
  }

  #[test]
  fn default_min_poll_period_is_one_second() {
    assert_eq!(DEFAULT_MIN_POLL_PERIOD_MS, 1000);
  }
}
