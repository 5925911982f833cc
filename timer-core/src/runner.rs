use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::collection::IdentifiableTimerCollection;
use crate::day_time::DayTime;
use crate::error::{Result, TimerError};
use crate::interval::TimeInterval;
use crate::listenable::{Event, Listenable};
use crate::merge;
use crate::timer::{Timer, TimerId};

/// Result of an action callback. Failures are logged by the runner and never
/// terminate the loop (§4.6).
pub type ActionResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// An async, side-effecting on/off callback. Boxed and shared so the same
/// callback can be dispatched repeatedly without reconstructing it.
pub type Action = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ActionResult> + Send>> + Send + Sync>;

/// A source of the current wall-clock day-time (§1: "a monotonic source of
/// wall-clock day-time"). Injected so tests can drive the clock explicitly.
pub type TimeGetter = Arc<dyn Fn() -> DayTime + Send + Sync>;

pub const DEFAULT_MIN_POLL_PERIOD_MS: u64 = 1000;

/// Outcome of a `_wait_until` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
  /// The clock reached or passed the target, or a miss was detected.
  Completed { missed: bool },
  /// `change_signalled` (or a stop request) woke the wait early.
  Interrupted,
}

struct SharedState {
  /// Un-merged timers, mirrored here from collection events so listener
  /// callbacks never need to re-enter the collection's own lock.
  raw: Mutex<BTreeMap<TimerId, Timer>>,
  merged_intervals: Mutex<Vec<TimeInterval>>,
  turned_on: AtomicBool,
  running: AtomicBool,
  stop_requested: AtomicBool,
  change_signalled: AtomicBool,
  notify: Notify,
}

fn recompute(raw: &BTreeMap<TimerId, Timer>) -> Result<Vec<TimeInterval>> {
  let mut intervals = Vec::with_capacity(raw.len());
  for timer in raw.values() {
    // A 24h-duration timer's own interval is degenerate (start == end) in
    // this value type; at the merge layer that degenerate case and a true
    // AlwaysOn union mean the same thing.
    let interval = timer.interval().map_err(|_| TimerError::AlwaysOn)?;
    intervals.push(interval);
  }
  merge::merge(&intervals)
}

fn handle_event(state: &SharedState, event: &Event) -> Result<()> {
  let raw_snapshot = {
    let mut raw = state.raw.lock().unwrap();
    match event {
      Event::TimerAdded(record) => {
        raw.insert(record.id, record.timer.clone());
      }
      Event::TimerRemoved(id) => {
        raw.remove(id);
      }
    }
    raw.clone()
  };

  match recompute(&raw_snapshot) {
    Ok(merged) => {
      *state.merged_intervals.lock().unwrap() = merged;
    }
    Err(e) => {
      let kept = state.merged_intervals.lock().unwrap().clone();
      warn!(error = %e, kept_intervals = ?kept, "rejecting timer change that would leave no off-time");
      return Err(e);
    }
  }

  state.change_signalled.store(true, Ordering::SeqCst);
  state.notify.notify_waiters();
  Ok(())
}

/// Long-running cooperative task that owns the merged schedule and drives
/// on/off action dispatch (§4.6).
///
/// Construction recomputes the initial merged snapshot once, then registers
/// a single listener on `timers` for both event kinds; the listener never
/// re-enters `timers`'s own lock, so it's safe to call while a caller
/// already holds it for the mutating `add`/`remove`.
pub struct TimerRunner<C: Listenable + Send + 'static> {
  timers: Arc<Mutex<C>>,
  state: Arc<SharedState>,
  on_action: Action,
  off_action: Action,
  current_time_getter: TimeGetter,
  min_poll_period: StdDuration,
}

impl<C: Listenable + Send + 'static> TimerRunner<C> {
  pub fn new(timers: C, on_action: Action, off_action: Action, current_time_getter: TimeGetter) -> Self {
    Self::with_min_poll_period(
      timers,
      on_action,
      off_action,
      current_time_getter,
      StdDuration::from_millis(DEFAULT_MIN_POLL_PERIOD_MS),
    )
  }

  pub fn with_min_poll_period(
    mut timers: C,
    on_action: Action,
    off_action: Action,
    current_time_getter: TimeGetter,
    min_poll_period: StdDuration,
  ) -> Self {
    let raw: BTreeMap<TimerId, Timer> = timers.iter().into_iter().map(|r| (r.id, r.timer)).collect();
    let initial_merged = recompute(&raw).unwrap_or_default();

    let state = Arc::new(SharedState {
      raw: Mutex::new(raw),
      merged_intervals: Mutex::new(initial_merged),
      turned_on: AtomicBool::new(false),
      running: AtomicBool::new(false),
      stop_requested: AtomicBool::new(false),
      change_signalled: AtomicBool::new(false),
      notify: Notify::new(),
    });

    let listener_state = state.clone();
    timers.add_listener(move |event| handle_event(&listener_state, event));

    Self {
      timers: Arc::new(Mutex::new(timers)),
      state,
      on_action,
      off_action,
      current_time_getter,
      min_poll_period,
    }
  }

  /// Shared handle to the wrapped collection, for callers that need to
  /// add/remove timers while `run()` is active.
  pub fn timers(&self) -> Arc<Mutex<C>> {
    self.timers.clone()
  }

  pub fn on_off_intervals(&self) -> Vec<TimeInterval> {
    self.state.merged_intervals.lock().unwrap().clone()
  }

  pub fn is_on(&self) -> bool {
    self.next_interval().map(|(_, on_now)| on_now).unwrap_or(false)
  }

  pub fn next_interval(&self) -> Result<(TimeInterval, bool)> {
    let merged = self.state.merged_intervals.lock().unwrap();
    if merged.is_empty() {
      return Err(TimerError::NoTimers);
    }

    let now = (self.current_time_getter)();
    let now_interval =
      TimeInterval::new(now, now + Duration::seconds(1)).expect("now and now+1s are never equal");

    for (i, interval) in merged.iter().enumerate() {
      if interval.intersects(&now_interval) {
        return Ok((*interval, true));
      }
      if interval.start >= now {
        let last = merged[merged.len() - 1];
        if i == 0 && last.intersects(&now_interval) {
          return Ok((last, true));
        }
        return Ok((*interval, false));
      }
    }
    Ok((merged[0], false))
  }

  pub fn request_stop(&self) {
    self.state.stop_requested.store(true, Ordering::SeqCst);
    self.state.change_signalled.store(true, Ordering::SeqCst);
    self.state.notify.notify_waiters();
  }

  /// Runs until `request_stop()` is called. Only one invocation may be
  /// active at a time.
  pub async fn run(&self) -> Result<()> {
    if self.state.running.swap(true, Ordering::SeqCst) {
      return Err(TimerError::AlreadyRunning);
    }
    if self.state.stop_requested.load(Ordering::SeqCst) {
      self.state.running.store(false, Ordering::SeqCst);
      return Err(TimerError::StopPreset);
    }

    info!("timer runner starting");
    self.run_loop().await;
    info!("timer runner stopped");

    self.state.running.store(false, Ordering::SeqCst);
    self.state.stop_requested.store(false, Ordering::SeqCst);
    Ok(())
  }

  async fn run_loop(&self) {
    loop {
      if self.state.stop_requested.load(Ordering::SeqCst) {
        if self.state.turned_on.load(Ordering::SeqCst) {
          self.dispatch_off().await;
        }
        return;
      }

      if self.on_off_intervals().is_empty() {
        if self.state.turned_on.load(Ordering::SeqCst) {
          self.dispatch_off().await;
        }
        self.wait_for_change().await;
        self.state.change_signalled.store(false, Ordering::SeqCst);
        continue;
      }

      self.state.change_signalled.store(false, Ordering::SeqCst);
      let (next, on_now) = match self.next_interval() {
        Ok(v) => v,
        Err(_) => continue,
      };
      let first_seen_time = (self.current_time_getter)();

      if !on_now {
        if self.state.turned_on.load(Ordering::SeqCst) {
          self.dispatch_off().await;
        }
        match self.wait_until(next.start, first_seen_time).await {
          WaitOutcome::Interrupted => continue,
          WaitOutcome::Completed { missed: true } => {
            warn!(target_time = %next.start, "missed timer start, the interval was skipped");
            continue;
          }
          WaitOutcome::Completed { missed: false } => {}
        }
      }

      let now = (self.current_time_getter)();
      if Self::missed(now, first_seen_time, next.end) {
        warn!(target_time = %next.end, "missed the entire on window");
        continue;
      }

      if !self.state.turned_on.load(Ordering::SeqCst) {
        self.dispatch_on(&next).await;
      }

      match self.wait_until(next.end, first_seen_time).await {
        WaitOutcome::Interrupted => continue,
        WaitOutcome::Completed { .. } => {
          self.dispatch_off().await;
          continue;
        }
      }
    }
  }

  async fn wait_for_change(&self) {
    loop {
      if self.state.change_signalled.load(Ordering::SeqCst) {
        return;
      }
      tokio::select! {
        _ = tokio::time::sleep(self.min_poll_period) => {},
        _ = self.state.notify.notified() => {},
      }
    }
  }

  async fn wait_until(&self, target: DayTime, first_seen_time: DayTime) -> WaitOutcome {
    loop {
      let now = (self.current_time_getter)();
      if Self::reached(first_seen_time, now, target) {
        return WaitOutcome::Completed { missed: false };
      }
      if Self::missed(now, first_seen_time, target) {
        return WaitOutcome::Completed { missed: true };
      }
      if self.state.change_signalled.load(Ordering::SeqCst) {
        return WaitOutcome::Interrupted;
      }
      tokio::select! {
        _ = tokio::time::sleep(self.min_poll_period) => {},
        _ = self.state.notify.notified() => {},
      }
    }
  }

  fn reached(first_seen_time: DayTime, now: DayTime, target: DayTime) -> bool {
    first_seen_time.distance_to(target) <= first_seen_time.distance_to(now)
  }

  /// `t` has gone past `target` the long way around (clock jump, suspend).
  fn missed(t: DayTime, first_seen_time: DayTime, target: DayTime) -> bool {
    if t == first_seen_time {
      return false;
    }
    t.distance_to(first_seen_time) < t.distance_to(target)
  }

  async fn dispatch_on(&self, interval: &TimeInterval) {
    info!(interval = %interval, "dispatching on action");
    self.state.turned_on.store(true, Ordering::SeqCst);
    Self::spawn_action(self.on_action.clone());
  }

  async fn dispatch_off(&self) {
    info!("dispatching off action");
    self.state.turned_on.store(false, Ordering::SeqCst);
    Self::spawn_action(self.off_action.clone());
  }

  fn spawn_action(action: Action) {
    tokio::spawn(async move {
      if let Err(e) = action().await {
        tracing::error!(error = %e, "action callback failed");
      }
    });
  }
}
