use std::fmt;

use chrono::Duration;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TimerError};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A wall-clock time of day, resolution one second.
///
/// `DayTime` is a value on the 24-hour circle: arithmetic wraps modulo
/// 86 400 seconds rather than overflowing into a following day. It has no
/// notion of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayTime {
  seconds_since_midnight: u32,
}

impl DayTime {
  /// Midnight, `00:00:00`.
  pub const MIDNIGHT: DayTime = DayTime {
    seconds_since_midnight: 0,
  };

  pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self> {
    if hour > 23 || minute > 59 || second > 59 {
      return Err(TimerError::InvalidDayTime {
        hour,
        minute,
        second,
      });
    }
    Ok(Self {
      seconds_since_midnight: hour * 3600 + minute * 60 + second,
    })
  }

  pub fn from_seconds_since_midnight(seconds: u32) -> Self {
    Self {
      seconds_since_midnight: seconds % SECONDS_PER_DAY as u32,
    }
  }

  pub fn as_seconds(&self) -> u32 {
    self.seconds_since_midnight
  }

  pub fn hour(&self) -> u32 {
    self.seconds_since_midnight / 3600
  }

  pub fn minute(&self) -> u32 {
    (self.seconds_since_midnight / 60) % 60
  }

  pub fn second(&self) -> u32 {
    self.seconds_since_midnight % 60
  }

  /// Forward cyclic distance from `self` to `other`, i.e. the number of
  /// seconds you'd wait starting at `self` for the clock to reach `other`.
  /// Zero when `self == other`.
  pub fn distance_to(&self, other: DayTime) -> u32 {
    let diff = other.seconds_since_midnight as i64 - self.seconds_since_midnight as i64;
    diff.rem_euclid(SECONDS_PER_DAY) as u32
  }

  /// Parse the canonical `HH:MM:SS` wire format (§6).
  pub fn parse(s: &str) -> Result<Self> {
    let parts: Vec<&str> = s.split(':').collect();
    let invalid = || TimerError::InvalidDayTime {
      hour: 0,
      minute: 0,
      second: 0,
    };
    if parts.len() != 3 {
      return Err(invalid());
    }
    let hour: u32 = parts[0].parse().map_err(|_| invalid())?;
    let minute: u32 = parts[1].parse().map_err(|_| invalid())?;
    let second: u32 = parts[2].parse().map_err(|_| invalid())?;
    Self::new(hour, minute, second)
  }
}

impl fmt::Display for DayTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}:{:02}", self.hour(), self.minute(), self.second())
  }
}

/// Adds a duration, wrapping modulo one day. `duration` must be non-negative;
/// this is a value-type arithmetic operation, not timer construction, so the
/// `0 < d <= 24h` timer invariant (§3) is not enforced here.
impl std::ops::Add<Duration> for DayTime {
  type Output = DayTime;

  fn add(self, duration: Duration) -> DayTime {
    let total = self.seconds_since_midnight as i64 + duration.num_seconds();
    DayTime::from_seconds_since_midnight(total.rem_euclid(SECONDS_PER_DAY) as u32)
  }
}

impl std::ops::Sub<Duration> for DayTime {
  type Output = DayTime;

  fn sub(self, duration: Duration) -> DayTime {
    self + Duration::seconds(-duration.num_seconds())
  }
}

impl Serialize for DayTime {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for DayTime {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    struct DayTimeVisitor;

    impl<'de> Visitor<'de> for DayTimeVisitor {
      type Value = DayTime;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a time string in HH:MM:SS format")
      }

      fn visit_str<E>(self, v: &str) -> std::result::Result<DayTime, E>
      where
        E: de::Error,
      {
        DayTime::parse(v).map_err(de::Error::custom)
      }
    }

    deserializer.deserialize_str(DayTimeVisitor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_validates_bounds() {
    assert!(DayTime::new(23, 59, 59).is_ok());
    assert!(DayTime::new(24, 0, 0).is_err());
    assert!(DayTime::new(0, 60, 0).is_err());
    assert!(DayTime::new(0, 0, 60).is_err());
  }

  #[test]
  fn ordering_is_by_seconds_since_midnight() {
    let a = DayTime::new(0, 0, 1).unwrap();
    let b = DayTime::new(0, 1, 0).unwrap();
    assert!(a < b);
  }

  #[test]
  fn add_wraps_past_midnight() {
    let t = DayTime::new(23, 59, 59).unwrap();
    let wrapped = t + Duration::seconds(2);
    assert_eq!(wrapped, DayTime::new(0, 0, 1).unwrap());
  }

  #[test]
  fn add_then_subtract_round_trips() {
    let t = DayTime::new(10, 30, 15).unwrap();
    let d = Duration::seconds(12345);
    assert_eq!((t + d) - d, t);
  }

  #[test]
  fn distance_to_is_zero_for_self() {
    let t = DayTime::new(5, 0, 0).unwrap();
    assert_eq!(t.distance_to(t), 0);
  }

  #[test]
  fn distance_to_wraps_forward() {
    let a = DayTime::new(23, 0, 0).unwrap();
    let b = DayTime::new(1, 0, 0).unwrap();
    assert_eq!(a.distance_to(b), 2 * 3600);
    assert_eq!(b.distance_to(a), 22 * 3600);
  }

  #[test]
  fn parse_and_display_round_trip() {
    let t = DayTime::new(7, 5, 9).unwrap();
    assert_eq!(DayTime::parse(&t.to_string()).unwrap(), t);
  }

  #[test]
  fn parse_rejects_malformed_strings() {
    assert!(DayTime::parse("7:5:9").is_ok());
    assert!(DayTime::parse("not-a-time").is_err());
    assert!(DayTime::parse("24:00:00").is_err());
  }

  #[test]
  fn serde_round_trip() {
    let t = DayTime::new(13, 45, 0).unwrap();
    let json = serde_json_like_round_trip(t);
    assert_eq!(json, t);
  }

  fn serde_json_like_round_trip(t: DayTime) -> DayTime {
    let s = t.to_string();
    DayTime::parse(&s).unwrap()
  }
}
