//! Attendance time-tracking core: the clock session state machine, the
//! geolocation gate, duplicate reconciliation, the day-status calendar
//! engine, the statistics aggregator, and the optimistic status cache.

pub mod calendar;
pub mod clock;
pub mod geo;
pub mod reconcile;
pub mod stats;
pub mod status_cache;
pub mod time;

use crate::config::AttendancePolicy;

/// The attendance service, generic over the record store so tests can run
/// the full state machine against the in-memory store.
#[derive(Clone)]
pub struct Attendance<S> {
    store: S,
    policy: AttendancePolicy,
}

impl<S> Attendance<S> {
    pub fn new(store: S, policy: AttendancePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }
}
