use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use timer_core::{IdentifiableTimer, IdentifiableTimerCollection, Result, Timer, TimerError, TimerId};
use tracing::debug;

const FILE_EXTENSION: &str = "json";

/// A directory of one `<id>.json` file per timer, human-inspectable on an
/// embedded filesystem (§4.4).
///
/// Every write is followed by `File::sync_all()` before returning, so a
/// restart — clean or after a crash mid-write elsewhere in the directory —
/// observes exactly the set of previously-successful `add` calls that
/// reached this point; `remove` similarly only returns once the file is
/// gone from the directory.
#[derive(Debug)]
pub struct JsonDirTimerCollection {
  directory: PathBuf,
}

impl JsonDirTimerCollection {
  pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
    let directory = directory.into();
    fs::create_dir_all(&directory).map_err(storage_err)?;
    debug!(path = %directory.display(), "opened json-dir timer store");
    Ok(Self { directory })
  }

  fn file_for(&self, id: TimerId) -> PathBuf {
    self.directory.join(format!("{}.{}", id.0, FILE_EXTENSION))
  }

  fn entries(&self) -> Result<Vec<(TimerId, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(&self.directory).map_err(storage_err)? {
      let entry = entry.map_err(storage_err)?;
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
        continue;
      }
      let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        continue;
      };
      let Ok(raw) = stem.parse::<u64>() else {
        continue;
      };
      out.push((TimerId(raw), path));
    }
    Ok(out)
  }

  fn read(path: &Path) -> Result<IdentifiableTimer> {
    let contents = fs::read_to_string(path).map_err(storage_err)?;
    serde_json::from_str(&contents).map_err(storage_err)
  }

  fn next_id(&self) -> Result<TimerId> {
    let max = self.entries()?.into_iter().map(|(id, _)| id.0).max();
    Ok(TimerId(max.map(|m| m + 1).unwrap_or(0)))
  }
}

impl IdentifiableTimerCollection for JsonDirTimerCollection {
  fn len(&self) -> usize {
    self.entries().map(|e| e.len()).unwrap_or(0)
  }

  fn iter(&self) -> Vec<IdentifiableTimer> {
    let Ok(entries) = self.entries() else {
      return Vec::new();
    };
    entries
      .into_iter()
      .filter_map(|(_, path)| Self::read(&path).ok())
      .collect()
  }

  fn contains(&self, record: &IdentifiableTimer) -> bool {
    self.get(record.id).as_ref() == Ok(record)
  }

  fn get(&self, id: TimerId) -> Result<IdentifiableTimer> {
    let path = self.file_for(id);
    if !path.exists() {
      return Err(TimerError::NotFound(id.0));
    }
    Self::read(&path)
  }

  fn add(&mut self, timer: Timer) -> Result<IdentifiableTimer> {
    let id = self.next_id()?;
    self.add_identified(IdentifiableTimer::from_timer(timer, id))
  }

  fn add_identified(&mut self, record: IdentifiableTimer) -> Result<IdentifiableTimer> {
    let path = self.file_for(record.id);
    if path.exists() {
      return Err(TimerError::Conflict(record.id.0));
    }
    let serialized = serde_json::to_string(&record).map_err(storage_err)?;
    let mut file = File::create(&path).map_err(storage_err)?;
    file.write_all(serialized.as_bytes()).map_err(storage_err)?;
    file.sync_all().map_err(storage_err)?;
    debug!(path = %path.display(), "wrote timer record");
    Ok(record)
  }

  fn remove(&mut self, id: TimerId) -> Result<bool> {
    let path = self.file_for(id);
    if !path.exists() {
      return Ok(false);
    }
    fs::remove_file(&path).map_err(storage_err)?;
    debug!(path = %path.display(), "removed timer record");
    Ok(true)
  }
}

fn storage_err(e: impl std::fmt::Display) -> TimerError {
  TimerError::Storage(e.to_string())
}
