use crate::collection::IdentifiableTimerCollection;
use crate::error::Result;
use crate::timer::{IdentifiableTimer, Timer, TimerId};

/// Fixed, closed event set — deliberately not an open string-keyed fan-out
/// (§9 REDESIGN FLAGS: "event fan-out").
#[derive(Debug, Clone)]
pub enum Event {
  TimerAdded(IdentifiableTimer),
  TimerRemoved(TimerId),
}

type Listener = Box<dyn FnMut(&Event) -> Result<()> + Send>;

/// Capability set consumed by the runner and by drivers: the C4 collection
/// operations plus listener registration (§9 REDESIGN FLAGS: "dynamic
/// dispatch of collections").
pub trait Listenable: IdentifiableTimerCollection {
  fn add_listener(&mut self, listener: impl FnMut(&Event) -> Result<()> + Send + 'static)
  where
    Self: Sized;
}

/// Decorates any [`IdentifiableTimerCollection`] with synchronous event
/// notification (§4.5). Listeners fire in registration order, after the
/// underlying mutation has already succeeded; a listener that errors stops
/// the remaining listeners from firing but does not undo the mutation, and
/// its error propagates to the caller of `add`/`remove`.
pub struct ListenableTimerCollection<C: IdentifiableTimerCollection> {
  inner: C,
  listeners: Vec<Listener>,
}

impl<C: IdentifiableTimerCollection> ListenableTimerCollection<C> {
  pub fn new(inner: C) -> Self {
    Self {
      inner,
      listeners: Vec::new(),
    }
  }

  fn notify(&mut self, event: &Event) -> Result<()> {
    for listener in &mut self.listeners {
      listener(event)?;
    }
    Ok(())
  }
}

impl<C: IdentifiableTimerCollection> Listenable for ListenableTimerCollection<C> {
  fn add_listener(&mut self, listener: impl FnMut(&Event) -> Result<()> + Send + 'static) {
    self.listeners.push(Box::new(listener));
  }
}

impl<C: IdentifiableTimerCollection> IdentifiableTimerCollection for ListenableTimerCollection<C> {
  fn len(&self) -> usize {
    self.inner.len()
  }

  fn iter(&self) -> Vec<IdentifiableTimer> {
    self.inner.iter()
  }

  fn contains(&self, record: &IdentifiableTimer) -> bool {
    self.inner.contains(record)
  }

  fn get(&self, id: TimerId) -> Result<IdentifiableTimer> {
    self.inner.get(id)
  }

  fn add(&mut self, timer: Timer) -> Result<IdentifiableTimer> {
    let record = self.inner.add(timer)?;
    self.notify(&Event::TimerAdded(record.clone()))?;
    Ok(record)
  }

  fn add_identified(&mut self, record: IdentifiableTimer) -> Result<IdentifiableTimer> {
    let stored = self.inner.add_identified(record)?;
    self.notify(&Event::TimerAdded(stored.clone()))?;
    Ok(stored)
  }

  fn remove(&mut self, id: TimerId) -> Result<bool> {
    let removed = self.inner.remove(id)?;
    if removed {
      self.notify(&Event::TimerRemoved(id))?;
    }
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use chrono::Duration;

  use super::*;
  use crate::collection::InMemoryTimerCollection;
  use crate::day_time::DayTime;
  use crate::error::TimerError;

  fn timer(name: &str, hour: u32) -> Timer {
    Timer::new(name, DayTime::new(hour, 0, 0).unwrap(), Duration::minutes(30)).unwrap()
  }

  #[test]
  fn add_fires_timer_added_on_success() {
    let mut wrapped = ListenableTimerCollection::new(InMemoryTimerCollection::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    wrapped.add_listener(move |event| {
      events_clone.lock().unwrap().push(event.clone());
      Ok(())
    });

    let record = wrapped.add(timer("a", 1)).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
      Event::TimerAdded(added) => assert_eq!(added, &record),
      Event::TimerRemoved(_) => panic!("expected TimerAdded"),
    }
  }

  #[test]
  fn remove_fires_timer_removed_only_when_something_was_removed() {
    let mut wrapped = ListenableTimerCollection::new(InMemoryTimerCollection::new());
    let record = wrapped.add(timer("a", 1)).unwrap();

    let count = Arc::new(Mutex::new(0));
    let count_clone = count.clone();
    wrapped.add_listener(move |_| {
      *count_clone.lock().unwrap() += 1;
      Ok(())
    });

    assert_eq!(wrapped.remove(record.id).unwrap(), true);
    assert_eq!(*count.lock().unwrap(), 1);

    assert_eq!(wrapped.remove(record.id).unwrap(), false);
    assert_eq!(*count.lock().unwrap(), 1);
  }

  #[test]
  fn listeners_fire_in_registration_order() {
    let mut wrapped = ListenableTimerCollection::new(InMemoryTimerCollection::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let order_a = order.clone();
    wrapped.add_listener(move |_| {
      order_a.lock().unwrap().push("a");
      Ok(())
    });
    let order_b = order.clone();
    wrapped.add_listener(move |_| {
      order_b.lock().unwrap().push("b");
      Ok(())
    });

    wrapped.add(timer("x", 3)).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
  }

  #[test]
  fn a_failing_listener_propagates_and_stops_later_listeners() {
    let mut wrapped = ListenableTimerCollection::new(InMemoryTimerCollection::new());
    let fired = Arc::new(Mutex::new(false));

    wrapped.add_listener(|_| Err(TimerError::AlwaysOn));
    let fired_clone = fired.clone();
    wrapped.add_listener(move |_| {
      *fired_clone.lock().unwrap() = true;
      Ok(())
    });

    let result = wrapped.add(timer("x", 4));
    assert_eq!(result, Err(TimerError::AlwaysOn));
    assert!(!*fired.lock().unwrap());
  }

  #[test]
  fn registration_is_not_retroactive() {
    let mut wrapped = ListenableTimerCollection::new(InMemoryTimerCollection::new());
    wrapped.add(timer("a", 1)).unwrap();

    let count = Arc::new(Mutex::new(0));
    let count_clone = count.clone();
    wrapped.add_listener(move |_| {
      *count_clone.lock().unwrap() += 1;
      Ok(())
    });

    assert_eq!(*count.lock().unwrap(), 0);
  }
}
