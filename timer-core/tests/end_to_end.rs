use chrono::Duration;
use timer_core::{DayTime, Event, IdentifiableTimerCollection, Listenable, ListenableTimerCollection, Timer, TimerId};

fn timer(name: &str, hour: u32, minutes: i64) -> Timer {
  Timer::new(name, DayTime::new(hour, 0, 0).unwrap(), Duration::minutes(minutes)).unwrap()
}

#[test]
fn identifiable_timer_wire_format_matches_external_interface() {
  let record = timer_core::IdentifiableTimer::from_timer(timer("watering", 6, 30), TimerId(3));
  let json = serde_json::to_value(&record).unwrap();
  assert_eq!(json["id"], 3);
  assert_eq!(json["name"], "watering");
  assert_eq!(json["startTime"], "06:00:00");
  assert_eq!(json["duration"], 1800);
}

#[test]
fn timer_without_id_parses_from_the_external_add_shape() {
  let payload = serde_json::json!({"name": "lights", "startTime": "18:30:00", "duration": 3600});
  let timer: Timer = serde_json::from_value(payload).unwrap();
  assert_eq!(timer.name, "lights");
  assert_eq!(timer.start_time, DayTime::new(18, 30, 0).unwrap());
  assert_eq!(timer.duration, Duration::hours(1));
}

#[test]
fn adding_and_removing_through_the_listenable_wrapper_drives_observable_events() {
  let mut wrapped = ListenableTimerCollection::new(timer_core::InMemoryTimerCollection::new());
  let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));

  let events_clone = events.clone();
  wrapped.add_listener(move |event| {
    events_clone.lock().unwrap().push(event.clone());
    Ok(())
  });

  let a = wrapped.add(timer("a", 1, 30)).unwrap();
  let b = wrapped.add(timer("b", 2, 30)).unwrap();
  wrapped.remove(a.id).unwrap();

  let events = events.lock().unwrap();
  assert_eq!(events.len(), 3);
  assert!(matches!(&events[0], Event::TimerAdded(r) if r.id == a.id));
  assert!(matches!(&events[1], Event::TimerAdded(r) if r.id == b.id));
  assert!(matches!(&events[2], Event::TimerRemoved(id) if *id == a.id));

  assert_eq!(wrapped.len(), 1);
  assert_eq!(wrapped.get(b.id).unwrap().name(), "b");
}

#[test]
fn overlapping_timers_that_cover_the_full_day_are_rejected_on_add() {
  use timer_core::TimerError;

  let mut collection = timer_core::InMemoryTimerCollection::new();
  collection.add(timer("a", 0, 23 * 60)).unwrap();

  let overlapping_rest_of_day = Timer::new("b", DayTime::new(23, 0, 0).unwrap(), Duration::hours(1)).unwrap();
  let intervals = vec![
    collection.iter()[0].interval().unwrap(),
    overlapping_rest_of_day.interval().unwrap(),
  ];
  assert_eq!(timer_core::merge(&intervals), Err(TimerError::AlwaysOn));
}
