use thiserror::Error;

/// Errors surfaced by the value types, collections and runner in this crate.
///
/// Variants map directly onto the error taxonomy the engine is specified
/// against: callers match on kind, not on a particular collection
/// implementation's own error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
  #[error("invalid day-time: hour={hour} minute={minute} second={second}")]
  InvalidDayTime { hour: u32, minute: u32, second: u32 },

  #[error("interval start and end must differ")]
  EmptyInterval,

  #[error("duration must be greater than zero and at most 24h, got {seconds}s")]
  InvalidDuration { seconds: i64 },

  #[error("timer with id {0} not found")]
  NotFound(u64),

  #[error("timer with id {0} already exists")]
  Conflict(u64),

  #[error("timers overlap such that they never turn off")]
  AlwaysOn,

  #[error("no timers are configured")]
  NoTimers,

  #[error("runner is already running")]
  AlreadyRunning,

  #[error("stop was requested before run started")]
  StopPreset,

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T> = std::result::Result<T, TimerError>;
