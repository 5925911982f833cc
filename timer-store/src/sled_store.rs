use std::path::{Path, PathBuf};

use sled::Db;
use timer_core::{IdentifiableTimer, IdentifiableTimerCollection, Result, Timer, TimerError, TimerId};
use tracing::debug;

/// A single sled database keyed by id, more efficient than [`crate::json_dir`]
/// under frequent writes (§4.4). Every mutation is flushed synchronously
/// before returning, matching the teacher codebase's crash-safety posture.
pub struct SledTimerCollection {
  db: Db,
  path: Option<PathBuf>,
}

impl SledTimerCollection {
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(storage_err)?;
    }
    let db = sled::Config::default().path(path).open().map_err(storage_err)?;
    debug!(path = %path.display(), "opened sled timer store");
    Ok(Self {
      db,
      path: Some(path.to_path_buf()),
    })
  }

  #[cfg(test)]
  fn temporary() -> Result<Self> {
    let db = sled::Config::default().temporary(true).open().map_err(storage_err)?;
    Ok(Self { db, path: None })
  }

  fn log_path(&self) -> String {
    self.path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<temporary>".to_string())
  }

  fn key_for(id: TimerId) -> [u8; 8] {
    id.0.to_be_bytes()
  }

  fn decode(bytes: &[u8]) -> Result<IdentifiableTimer> {
    let (record, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map_err(storage_err)?;
    Ok(record)
  }

  fn encode(record: &IdentifiableTimer) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(record, bincode::config::standard()).map_err(storage_err)
  }

  fn next_id(&self) -> Result<TimerId> {
    let max = self
      .db
      .iter()
      .keys()
      .filter_map(|k| k.ok())
      .filter_map(|k| k.as_ref().try_into().ok())
      .map(u64::from_be_bytes)
      .max();
    Ok(TimerId(max.map(|m| m + 1).unwrap_or(0)))
  }
}

impl IdentifiableTimerCollection for SledTimerCollection {
  fn len(&self) -> usize {
    self.db.len()
  }

  fn iter(&self) -> Vec<IdentifiableTimer> {
    self
      .db
      .iter()
      .values()
      .filter_map(|v| v.ok())
      .filter_map(|v| Self::decode(&v).ok())
      .collect()
  }

  fn contains(&self, record: &IdentifiableTimer) -> bool {
    self.get(record.id).as_ref() == Ok(record)
  }

  fn get(&self, id: TimerId) -> Result<IdentifiableTimer> {
    let bytes = self
      .db
      .get(Self::key_for(id))
      .map_err(storage_err)?
      .ok_or(TimerError::NotFound(id.0))?;
    Self::decode(&bytes)
  }

  fn add(&mut self, timer: Timer) -> Result<IdentifiableTimer> {
    let id = self.next_id()?;
    self.add_identified(IdentifiableTimer::from_timer(timer, id))
  }

  fn add_identified(&mut self, record: IdentifiableTimer) -> Result<IdentifiableTimer> {
    let key = Self::key_for(record.id);
    if self.db.contains_key(key).map_err(storage_err)? {
      return Err(TimerError::Conflict(record.id.0));
    }
    let encoded = Self::encode(&record)?;
    self.db.insert(key, encoded).map_err(storage_err)?;
    self.db.flush().map_err(storage_err)?;
    debug!(path = %self.log_path(), id = %record.id, "wrote timer record");
    Ok(record)
  }

  fn remove(&mut self, id: TimerId) -> Result<bool> {
    let removed = self.db.remove(Self::key_for(id)).map_err(storage_err)?.is_some();
    if removed {
      self.db.flush().map_err(storage_err)?;
      debug!(path = %self.log_path(), id = %id, "removed timer record");
    }
    Ok(removed)
  }
}

fn storage_err(e: impl std::fmt::Display) -> TimerError {
  TimerError::Storage(e.to_string())
}
