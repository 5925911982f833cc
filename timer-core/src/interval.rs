use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::day_time::DayTime;
use crate::error::{Result, TimerError};

/// A daily interval `[start, end)` on the 24-hour circle.
///
/// If `start < end` the interval is *ordinary*; if `start > end` it *spans
/// midnight*. `start == end` is rejected at construction (§4.1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeInterval {
  pub start: DayTime,
  pub end: DayTime,
}

impl TimeInterval {
  pub fn new(start: DayTime, end: DayTime) -> Result<Self> {
    if start == end {
      return Err(TimerError::EmptyInterval);
    }
    Ok(Self { start, end })
  }

  pub fn spans_midnight(&self) -> bool {
    self.start > self.end
  }

  pub fn duration(&self) -> Duration {
    Duration::seconds(self.start.distance_to(self.end) as i64)
  }

  /// True iff this interval and `other` share at least one instant, under
  /// the `[start, end)` convention. Endpoints touching (`a.end == b.start`)
  /// are not an intersection.
  ///
  /// Implements the exact decision table from §4.1: sort by start, handle
  /// the both-span-midnight case, normalize so at most one side spans
  /// midnight, then branch on whether the later-starting interval does.
  pub fn intersects(&self, other: &TimeInterval) -> bool {
    let (mut earlier, mut later) = if self.start <= other.start {
      (*self, *other)
    } else {
      (*other, *self)
    };

    if earlier.spans_midnight() {
      if later.spans_midnight() {
        // Both cross midnight, so they share at least that instant.
        return true;
      }
      std::mem::swap(&mut earlier, &mut later);
    }

    if later.spans_midnight() {
      later.start < earlier.end || later.end > earlier.start
    } else {
      later.start < earlier.end && later.end > earlier.start
    }
  }
}

impl PartialEq for TimeInterval {
  fn eq(&self, other: &Self) -> bool {
    self.start == other.start && self.end == other.end
  }
}
impl Eq for TimeInterval {}

impl std::fmt::Display for TimeInterval {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}->{}", self.start, self.end)
  }
}
