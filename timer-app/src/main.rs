//! Driver-less host process for the timer-runner core (§4.9).
//!
//! Boots configuration, installs a `tracing` subscriber, constructs the
//! collection the configured storage backend names, wraps it as listenable,
//! and runs the scheduler with logged-stub on/off actions until `Ctrl-C`.
//! The real actuator driver and any HTTP surface are out of scope.

mod config;

use std::sync::Arc;

use chrono::Timelike;
use timer_core::{Action, DayTime, Event, Listenable, ListenableTimerCollection, TimeGetter, TimerRunner};
use timer_store::{JsonDirTimerCollection, SledTimerCollection};
use tracing::{debug, info};

use config::{RunnerConfig, StorageKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = RunnerConfig::from_env()?;
  init_tracing(config.log_level);

  info!(
    storage = ?config.storage,
    min_poll_period_ms = config.min_poll_period.as_millis(),
    "starting timer-app"
  );

  match config.storage.clone() {
    StorageKind::Memory => run_with_collection(timer_core::InMemoryTimerCollection::new(), config).await,
    StorageKind::JsonDir(path) => run_with_collection(JsonDirTimerCollection::open(path)?, config).await,
    StorageKind::Sled(path) => run_with_collection(SledTimerCollection::open(path)?, config).await,
  }
}

fn init_tracing(level: tracing::Level) {
  tracing_subscriber::fmt()
    .with_max_level(level)
    .with_target(true)
    .init();
}

async fn run_with_collection<C>(collection: C, config: RunnerConfig) -> Result<(), Box<dyn std::error::Error>>
where
  C: timer_core::IdentifiableTimerCollection + Send + 'static,
{
  let mut listenable = ListenableTimerCollection::new(collection);
  listenable.add_listener(|event| {
    match event {
      Event::TimerAdded(record) => debug!(id = %record.id, name = record.name(), "timer added"),
      Event::TimerRemoved(id) => debug!(id = %id, "timer removed"),
    }
    Ok(())
  });

  let runner = Arc::new(TimerRunner::with_min_poll_period(
    listenable,
    logged_stub_action("on"),
    logged_stub_action("off"),
    system_clock(),
    config.min_poll_period,
  ));

  let stop_signal = runner.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("shutdown requested");
      stop_signal.request_stop();
    }
  });

  runner.run().await?;
  Ok(())
}

/// Stub actuator action: logs and returns immediately. The real driver is
/// out of scope for this repository (§1).
fn logged_stub_action(label: &'static str) -> Action {
  Arc::new(move || {
    Box::pin(async move {
      info!(actuator = label, "actuator action dispatched (stub)");
      Ok(())
    })
  })
}

fn system_clock() -> TimeGetter {
  Arc::new(|| {
    let now = chrono::Local::now().time();
    DayTime::from_seconds_since_midnight(now.num_seconds_from_midnight())
  })
}
