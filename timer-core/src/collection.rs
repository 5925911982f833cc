use std::collections::BTreeMap;

use crate::error::{Result, TimerError};
use crate::timer::{IdentifiableTimer, Timer, TimerId};

/// The capability set the runner and drivers need from a timer store (§4.4,
/// REDESIGN FLAGS: "dynamic dispatch of collections"). Durable and in-memory
/// implementations share this without any inheritance hierarchy.
pub trait IdentifiableTimerCollection {
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// All stored records, in unspecified order.
  fn iter(&self) -> Vec<IdentifiableTimer>;

  fn contains(&self, record: &IdentifiableTimer) -> bool;

  fn get(&self, id: TimerId) -> Result<IdentifiableTimer>;

  /// Store an un-ided timer, allocating a fresh id.
  fn add(&mut self, timer: Timer) -> Result<IdentifiableTimer>;

  /// Store an already-ided record as-is. Fails if the id is taken.
  fn add_identified(&mut self, record: IdentifiableTimer) -> Result<IdentifiableTimer>;

  /// Remove by id. Returns whether a record was actually removed.
  fn remove(&mut self, id: TimerId) -> Result<bool>;
}

/// In-memory collection keyed by id, backed by a `BTreeMap` for deterministic
/// iteration order (not mandated by §4.4, but convenient for tests and logs).
///
/// Id allocation: smallest non-negative integer not currently in use,
/// matching the original in-memory backend (§9 decision).
#[derive(Debug, Default)]
pub struct InMemoryTimerCollection {
  timers: BTreeMap<TimerId, IdentifiableTimer>,
}

impl InMemoryTimerCollection {
  pub fn new() -> Self {
    Self::default()
  }

  fn next_free_id(&self) -> TimerId {
    for (i, id) in self.timers.keys().enumerate() {
      if id.0 != i as u64 {
        return TimerId(i as u64);
      }
    }
    TimerId(self.timers.len() as u64)
  }
}

impl IdentifiableTimerCollection for InMemoryTimerCollection {
  fn len(&self) -> usize {
    self.timers.len()
  }

  fn iter(&self) -> Vec<IdentifiableTimer> {
    self.timers.values().cloned().collect()
  }

  fn contains(&self, record: &IdentifiableTimer) -> bool {
    self.timers.get(&record.id) == Some(record)
  }

  fn get(&self, id: TimerId) -> Result<IdentifiableTimer> {
    self.timers.get(&id).cloned().ok_or(TimerError::NotFound(id.0))
  }

  fn add(&mut self, timer: Timer) -> Result<IdentifiableTimer> {
    let id = self.next_free_id();
    self.add_identified(IdentifiableTimer::from_timer(timer, id))
  }

  fn add_identified(&mut self, record: IdentifiableTimer) -> Result<IdentifiableTimer> {
    if self.timers.contains_key(&record.id) {
      return Err(TimerError::Conflict(record.id.0));
    }
    self.timers.insert(record.id, record.clone());
    Ok(record)
  }

  fn remove(&mut self, id: TimerId) -> Result<bool> {
    Ok(self.timers.remove(&id).is_some())
  }
}
