//! Durable implementations of [`timer_core::IdentifiableTimerCollection`]
//! (§4.4): a directory of one JSON file per id, and a single sled database.
//!
//! Both allocate ids as `max(existing ids) + 1` (falling back to `0` when
//! empty), unlike the in-memory collection's smallest-free-id rule: a
//! durable store must not be able to reissue an id that still names a file
//! or record elsewhere (a stale backup, a half-completed remove) just
//! because a gap briefly opened up.

pub mod json_dir;
pub mod sled_store;

pub use json_dir::JsonDirTimerCollection;
pub use sled_store::SledTimerCollection;
