use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::day_time::DayTime;
use crate::error::{Result, TimerError};
use crate::interval::TimeInterval;

/// Stable integer identity assigned to a [`Timer`] once stored in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// An immutable, unidentified daily timer: a name, a start-of-day, and a
/// duration in `(0, 24h]` (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
  pub name: String,
  #[serde(rename = "startTime")]
  pub start_time: DayTime,
  #[serde(with = "duration_seconds")]
  pub duration: Duration,
}

impl Timer {
  pub fn new(name: impl Into<String>, start_time: DayTime, duration: Duration) -> Result<Self> {
    let seconds = duration.num_seconds();
    if seconds <= 0 || seconds > 24 * 60 * 60 {
      return Err(TimerError::InvalidDuration { seconds });
    }
    Ok(Self {
      name: name.into(),
      start_time,
      duration,
    })
  }

  pub fn end_time(&self) -> DayTime {
    self.start_time + self.duration
  }

  /// The timer's own interval. Fails only in the degenerate case where
  /// `duration == 24h` and wraps back onto `start_time` exactly, which
  /// [`TimeInterval`] cannot represent (§3: legal for a single timer, but
  /// see §4.2 for why it forbids further wrap expansion on merge).
  pub fn interval(&self) -> Result<TimeInterval> {
    TimeInterval::new(self.start_time, self.end_time())
  }
}

/// A [`Timer`] that has been assigned an id by a collection (§4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiableTimer {
  pub id: TimerId,
  #[serde(flatten)]
  pub timer: Timer,
}

impl IdentifiableTimer {
  pub fn from_timer(timer: Timer, id: TimerId) -> Self {
    Self { id, timer }
  }

  pub fn to_timer(&self) -> Timer {
    self.timer.clone()
  }

  pub fn name(&self) -> &str {
    &self.timer.name
  }

  pub fn start_time(&self) -> DayTime {
    self.timer.start_time
  }

  pub fn duration(&self) -> Duration {
    self.timer.duration
  }

  pub fn end_time(&self) -> DayTime {
    self.timer.end_time()
  }

  pub fn interval(&self) -> Result<TimeInterval> {
    self.timer.interval()
  }
}

mod duration_seconds {
  use chrono::Duration;
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    duration.num_seconds().serialize(serializer)
  }

  pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
  where
    D: Deserializer<'de>,
  {
    let seconds = i64::deserialize(deserializer)?;
    Ok(Duration::seconds(seconds))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dt(h: u32, m: u32, s: u32) -> DayTime {
    DayTime::new(h, m, s).unwrap()
  }

  #[test]
  fn new_rejects_zero_duration() {
    assert_eq!(
      Timer::new("t", dt(0, 0, 0), Duration::zero()),
      Err(TimerError::InvalidDuration { seconds: 0 })
    );
  }

  #[test]
  fn new_rejects_duration_over_24h() {
    assert!(Timer::new("t", dt(0, 0, 0), Duration::hours(24) + Duration::seconds(1)).is_err());
  }

  #[test]
  fn new_accepts_exactly_24h() {
    assert!(Timer::new("t", dt(0, 0, 0), Duration::hours(24)).is_ok());
  }

  #[test]
  fn end_time_wraps_past_midnight() {
    let t = Timer::new("t", dt(23, 0, 0), Duration::hours(2)).unwrap();
    assert_eq!(t.end_time(), dt(1, 0, 0));
  }

  #[test]
  fn interval_matches_start_and_end() {
    let t = Timer::new("t", dt(1, 0, 0), Duration::hours(1)).unwrap();
    let interval = t.interval().unwrap();
    assert_eq!(interval.start, dt(1, 0, 0));
    assert_eq!(interval.end, dt(2, 0, 0));
  }

  #[test]
  fn interval_fails_for_exactly_24h_duration() {
    let t = Timer::new("t", dt(5, 0, 0), Duration::hours(24)).unwrap();
    assert_eq!(t.interval(), Err(TimerError::EmptyInterval));
  }

  #[test]
  fn identifiable_timer_round_trips_through_timer() {
    let timer = Timer::new("watering", dt(6, 0, 0), Duration::minutes(30)).unwrap();
    let identifiable = IdentifiableTimer::from_timer(timer.clone(), TimerId(7));
    assert_eq!(identifiable.id, TimerId(7));
    assert_eq!(identifiable.to_timer(), timer);
  }

  #[test]
  fn equality_is_by_value_not_identity() {
    let a = Timer::new("t", dt(0, 0, 0), Duration::minutes(1)).unwrap();
    let b = Timer::new("t", dt(0, 0, 0), Duration::minutes(1)).unwrap();
    assert_eq!(a, b);
  }
}
