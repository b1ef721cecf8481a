//! Clock session state machine.
//!
//! States per employee-day: NOT_CLOCKED_IN -> CLOCKED_IN <-> ON_BREAK ->
//! CLOCKED_OUT. A new local calendar day resets to NOT_CLOCKED_IN.
//!
//! Every mutation follows the optimistic discipline: write a guess to the
//! status cache, run the store mutation, re-derive the status from the
//! store strictly after the mutation is acknowledged, and roll the cache
//! back if anything fails. Validation always happens before the first
//! store write.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::attendance::geo::{self, LocationReport};
use crate::attendance::{Attendance, reconcile, status_cache, time};
use crate::error::{ClockError, StoreError};
use crate::model::session::{Break, Session, SessionStatus};
use crate::model::status::{ClockState, CurrentStatus};
use crate::store::{NewSession, RecordStore, SessionClose, SessionPatch};

/// Result of a clock-in attempt. `session: None` is the `AlreadyClockedIn`
/// policy no-op: nothing was created and the caller should simply adopt
/// the returned (re-synchronized) status.
#[derive(Debug)]
pub struct ClockInOutcome {
    pub session: Option<Session>,
    pub status: CurrentStatus,
    pub accuracy_warning: Option<String>,
}

#[derive(Debug)]
pub struct ClockOutOutcome {
    pub session: Session,
    pub status: CurrentStatus,
    pub accuracy_warning: Option<String>,
}

#[derive(Debug)]
pub struct BreakOutcome {
    pub session: Session,
    pub status: CurrentStatus,
}

fn session_gone(e: StoreError) -> ClockError {
    match e {
        StoreError::NotFound => ClockError::NoActiveSession,
        other => ClockError::Store(other),
    }
}

impl<S: RecordStore> Attendance<S> {
    /// Authoritative current status. Always answered from the store; the
    /// cache only gets refreshed on the way out. Runs the duplicate-
    /// reconciliation backstop first, so every status read doubles as a
    /// cleanup pass.
    pub async fn current_status(
        &self,
        employee_id: u64,
        now: DateTime<Utc>,
    ) -> Result<CurrentStatus, ClockError> {
        reconcile::reconcile_duplicates(&self.store, employee_id).await?;

        let status = self.status_from_store(employee_id, now).await?;

        if let Some(hint) = status_cache::hint(employee_id).await {
            if hint != status {
                debug!(employee_id, ?hint, ?status, "Status cache hint diverged from store");
            }
        }
        status_cache::apply(employee_id, status.clone()).await;
        Ok(status)
    }

    /// Re-derive `CurrentStatus` from the record store alone.
    async fn status_from_store(
        &self,
        employee_id: u64,
        now: DateTime<Utc>,
    ) -> Result<CurrentStatus, StoreError> {
        if let Some(open) = self.store.find_open_session(employee_id).await? {
            return Ok(if open.open_break().is_some() {
                CurrentStatus::on_break(Some(open.id), open.clock_in)
            } else {
                CurrentStatus::clocked_in(Some(open.id), open.clock_in)
            });
        }

        // No open session: distinguish "done for the day" from "not yet".
        let today = time::local_date(now, self.policy.tz_offset_minutes);
        let (start, end) = time::day_bounds(today, self.policy.tz_offset_minutes);
        let today_sessions = self.store.sessions_in_range(employee_id, start, end).await?;
        Ok(if today_sessions.is_empty() {
            CurrentStatus::not_clocked_in()
        } else {
            CurrentStatus::clocked_out()
        })
    }

    /// The open session's id, if the employee has one.
    pub async fn open_session_id(&self, employee_id: u64) -> Result<Option<u64>, ClockError> {
        Ok(self
            .store
            .find_open_session(employee_id)
            .await?
            .map(|s| s.id))
    }

    pub async fn clock_in(
        &self,
        employee_id: u64,
        employee_name: &str,
        at: DateTime<Utc>,
        location: Option<&LocationReport>,
    ) -> Result<ClockInOutcome, ClockError> {
        // Correlates the optimistic write, the store mutation, and the
        // post-ack re-query in the logs.
        let request_id = Uuid::new_v4();

        let gate = geo::gate(&self.policy, location, at)?;

        let prior = status_cache::hint(employee_id).await;
        status_cache::apply(employee_id, CurrentStatus::clocked_in(None, at)).await;

        let result: Result<(Option<Session>, CurrentStatus), ClockError> = async {
            if let Some(open) = self.store.find_open_session(employee_id).await? {
                info!(
                    employee_id,
                    session_id = open.id,
                    request_id = %request_id,
                    "Clock-in ignored, session already open"
                );
                let status = self.status_from_store(employee_id, at).await?;
                return Ok((None, status));
            }

            let session = self
                .store
                .create_session(NewSession {
                    employee_id,
                    employee_name: employee_name.to_string(),
                    clock_in: at,
                    clock_in_location: gate.coords,
                })
                .await?;
            // Re-query only after the create is acknowledged; a
            // speculative read could still see "no open session".
            let status = self.status_from_store(employee_id, at).await?;
            Ok((Some(session), status))
        }
        .await;

        match result {
            Ok((session, status)) => {
                if let Some(s) = &session {
                    info!(employee_id, session_id = s.id, request_id = %request_id, "Clocked in");
                }
                status_cache::apply(employee_id, status.clone()).await;
                Ok(ClockInOutcome {
                    session,
                    status,
                    accuracy_warning: gate.accuracy_warning,
                })
            }
            Err(e) => {
                status_cache::restore(employee_id, prior).await;
                Err(e)
            }
        }
    }

    pub async fn clock_out(
        &self,
        session_id: u64,
        at: DateTime<Utc>,
        location: Option<&LocationReport>,
    ) -> Result<ClockOutOutcome, ClockError> {
        let request_id = Uuid::new_v4();

        let gate = geo::gate(&self.policy, location, at)?;

        let session = self.store.get_session(session_id).await.map_err(session_gone)?;
        if !session.is_open() {
            return Err(ClockError::NoActiveSession);
        }
        if at <= session.clock_in {
            return Err(ClockError::ClockOutBeforeClockIn);
        }

        // Dangling open break clamps to the clock-out instant.
        let mut breaks = session.breaks.clone();
        for b in breaks.iter_mut().filter(|b| b.is_open()) {
            let end = at.max(b.start);
            b.duration_secs = (end - b.start).num_seconds();
            b.end = Some(end);
        }
        let break_secs: i64 = breaks.iter().map(|b| b.duration_secs).sum();
        let net_secs = ((at - session.clock_in).num_seconds() - break_secs).max(0);
        let total_hours = net_secs as f64 / 3600.0;

        let employee_id = session.employee_id;
        let prior = status_cache::hint(employee_id).await;
        status_cache::apply(employee_id, CurrentStatus::clocked_out()).await;

        let result: Result<(Session, CurrentStatus), ClockError> = async {
            let closed = self
                .store
                .close_session(
                    session_id,
                    SessionClose {
                        clock_out: at,
                        clock_out_location: gate.coords,
                        breaks,
                        total_hours,
                        status: SessionStatus::Completed,
                        edited_by: None,
                        edit_reason: None,
                    },
                )
                .await
                .map_err(session_gone)?;
            let status = self.status_from_store(employee_id, at).await?;
            Ok((closed, status))
        }
        .await;

        match result {
            Ok((closed, status)) => {
                info!(
                    employee_id,
                    session_id,
                    total_hours = closed.total_hours,
                    request_id = %request_id,
                    "Clocked out"
                );
                status_cache::apply(employee_id, status.clone()).await;
                Ok(ClockOutOutcome {
                    session: closed,
                    status,
                    accuracy_warning: gate.accuracy_warning,
                })
            }
            Err(e) => {
                status_cache::restore(employee_id, prior).await;
                Err(e)
            }
        }
    }

    pub async fn start_break(
        &self,
        session_id: u64,
        at: DateTime<Utc>,
    ) -> Result<BreakOutcome, ClockError> {
        let session = self.store.get_session(session_id).await.map_err(session_gone)?;
        if !session.is_open() {
            return Err(ClockError::NoActiveSession);
        }
        if session.open_break().is_some() {
            return Err(ClockError::BreakAlreadyOpen);
        }

        let mut breaks = session.breaks.clone();
        breaks.push(Break::open(at));

        self.patch_breaks(
            &session,
            breaks,
            CurrentStatus::on_break(Some(session.id), session.clock_in),
        )
        .await
    }

    pub async fn end_break(
        &self,
        session_id: u64,
        at: DateTime<Utc>,
    ) -> Result<BreakOutcome, ClockError> {
        let session = self.store.get_session(session_id).await.map_err(session_gone)?;
        if !session.is_open() {
            return Err(ClockError::NoActiveSession);
        }
        if session.open_break().is_none() {
            return Err(ClockError::NoOpenBreak);
        }

        let mut breaks = session.breaks.clone();
        for b in breaks.iter_mut().filter(|b| b.is_open()) {
            let end = at.max(b.start);
            b.duration_secs = (end - b.start).num_seconds();
            b.end = Some(end);
        }

        self.patch_breaks(
            &session,
            breaks,
            CurrentStatus::clocked_in(Some(session.id), session.clock_in),
        )
        .await
    }

    async fn patch_breaks(
        &self,
        session: &Session,
        breaks: Vec<Break>,
        guess: CurrentStatus,
    ) -> Result<BreakOutcome, ClockError> {
        let employee_id = session.employee_id;
        let prior = status_cache::hint(employee_id).await;
        status_cache::apply(employee_id, guess).await;

        let result: Result<(Session, CurrentStatus), ClockError> = async {
            let patched = self
                .store
                .patch_session(
                    session.id,
                    SessionPatch {
                        breaks: Some(breaks),
                        ..SessionPatch::default()
                    },
                )
                .await
                .map_err(session_gone)?;
            let status = self.status_from_store(employee_id, session.clock_in).await?;
            Ok((patched, status))
        }
        .await;

        match result {
            Ok((patched, status)) => {
                status_cache::apply(employee_id, status.clone()).await;
                Ok(BreakOutcome {
                    session: patched,
                    status,
                })
            }
            Err(e) => {
                status_cache::restore(employee_id, prior).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendancePolicy;
    use crate::model::session::SessionLocation;
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    // Each test uses its own employee id: the status cache is process-wide.

    fn service() -> Attendance<MemoryStore> {
        Attendance::new(MemoryStore::new(), AttendancePolicy::default())
    }

    // 2026-03-02 is a Monday.
    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn open_session(employee_id: u64, clock_in: DateTime<Utc>) -> Session {
        Session {
            id: 0,
            employee_id,
            employee_name: "Jane".into(),
            clock_in,
            clock_out: None,
            breaks: Vec::new(),
            location: SessionLocation::default(),
            total_hours: 0.0,
            status: SessionStatus::Active,
            edited_by: None,
            edit_reason: None,
        }
    }

    #[actix_web::test]
    async fn second_clock_in_is_a_noop() {
        let svc = service();
        let first = svc.clock_in(101, "Jane", ts(9, 0), None).await.unwrap();
        assert!(first.session.is_some());
        assert_eq!(first.status.state, ClockState::ClockedIn);

        let second = svc.clock_in(101, "Jane", ts(9, 1), None).await.unwrap();
        assert!(second.session.is_none(), "no new record on duplicate clock-in");
        // Resynchronized status still points at the first session.
        assert_eq!(second.status.session_id, first.session.map(|s| s.id));
        assert_eq!(svc.store().session_count(), 1);
    }

    #[actix_web::test]
    async fn full_day_scenario_yields_eight_hours() {
        let svc = service();
        let session = svc
            .clock_in(102, "Jane", ts(9, 0), None)
            .await
            .unwrap()
            .session
            .unwrap();

        svc.start_break(session.id, ts(12, 0)).await.unwrap();
        let after_break = svc.end_break(session.id, ts(12, 30)).await.unwrap();
        assert_eq!(after_break.session.breaks[0].duration_secs, 1800);
        assert_eq!(after_break.status.state, ClockState::ClockedIn);

        let out = svc.clock_out(session.id, ts(17, 30), None).await.unwrap();
        assert_eq!(out.session.total_hours, 8.0);
        assert_eq!(out.session.status, SessionStatus::Completed);
        assert_eq!(out.status.state, ClockState::ClockedOut);
    }

    #[actix_web::test]
    async fn clock_out_before_clock_in_is_rejected_before_any_write() {
        let svc = service();
        let session = svc
            .clock_in(103, "Jane", ts(9, 0), None)
            .await
            .unwrap()
            .session
            .unwrap();

        let err = svc.clock_out(session.id, ts(8, 59), None).await.unwrap_err();
        assert!(matches!(err, ClockError::ClockOutBeforeClockIn));

        let untouched = svc.store().get_session(session.id).await.unwrap();
        assert!(untouched.is_open());
        assert_eq!(untouched.status, SessionStatus::Active);
    }

    #[actix_web::test]
    async fn break_state_machine_preconditions() {
        let svc = service();
        let session = svc
            .clock_in(104, "Jane", ts(9, 0), None)
            .await
            .unwrap()
            .session
            .unwrap();

        assert!(matches!(
            svc.end_break(session.id, ts(10, 0)).await.unwrap_err(),
            ClockError::NoOpenBreak
        ));

        svc.start_break(session.id, ts(10, 0)).await.unwrap();
        assert!(matches!(
            svc.start_break(session.id, ts(10, 5)).await.unwrap_err(),
            ClockError::BreakAlreadyOpen
        ));

        svc.end_break(session.id, ts(10, 15)).await.unwrap();
        svc.clock_out(session.id, ts(17, 0), None).await.unwrap();

        // Closed session accepts no further transitions.
        assert!(matches!(
            svc.start_break(session.id, ts(17, 5)).await.unwrap_err(),
            ClockError::NoActiveSession
        ));
        assert!(matches!(
            svc.clock_out(session.id, ts(17, 10), None).await.unwrap_err(),
            ClockError::NoActiveSession
        ));
    }

    #[actix_web::test]
    async fn dangling_break_clamps_to_clock_out() {
        let svc = service();
        let session = svc
            .clock_in(105, "Jane", ts(9, 0), None)
            .await
            .unwrap()
            .session
            .unwrap();
        svc.start_break(session.id, ts(17, 0)).await.unwrap();

        let out = svc.clock_out(session.id, ts(17, 30), None).await.unwrap();
        let b = &out.session.breaks[0];
        assert_eq!(b.end, Some(ts(17, 30)));
        assert_eq!(b.duration_secs, 1800);
        // 8.5h elapsed minus the 30-minute clamped break.
        assert_eq!(out.session.total_hours, 8.0);
    }

    #[actix_web::test]
    async fn store_failure_rolls_the_hint_back() {
        let svc = service();
        let session = svc
            .clock_in(106, "Jane", ts(9, 0), None)
            .await
            .unwrap()
            .session
            .unwrap();
        let confirmed = status_cache::hint(106).await.unwrap();
        assert_eq!(confirmed.state, ClockState::ClockedIn);

        svc.store().fail_writes(true);
        let err = svc.clock_out(session.id, ts(17, 0), None).await.unwrap_err();
        assert!(matches!(err, ClockError::Store(_)));

        // The optimistic CLOCKED_OUT guess must not survive the failure.
        assert_eq!(status_cache::hint(106).await, Some(confirmed));

        svc.store().fail_writes(false);
        let out = svc.clock_out(session.id, ts(17, 0), None).await.unwrap();
        assert_eq!(out.status.state, ClockState::ClockedOut);
    }

    #[actix_web::test]
    async fn status_comes_from_the_store_not_the_cache() {
        let svc = service();
        let id = svc.store().seed_session(open_session(107, ts(9, 0)));

        // Poison the hint; the store must still win.
        status_cache::apply(107, CurrentStatus::not_clocked_in()).await;

        let status = svc.current_status(107, ts(10, 0)).await.unwrap();
        assert_eq!(status.state, ClockState::ClockedIn);
        assert_eq!(status.session_id, Some(id));
    }

    #[actix_web::test]
    async fn status_read_reconciles_concurrent_duplicates() {
        let svc = service();
        let early = svc.store().seed_session(open_session(108, ts(9, 0)));
        svc.store().seed_session(open_session(108, ts(9, 3)));

        let status = svc.current_status(108, ts(10, 0)).await.unwrap();
        assert_eq!(status.session_id, Some(early));
        assert_eq!(svc.store().find_open_sessions(108).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn at_most_one_open_session_across_a_day() {
        let svc = service();
        let s1 = svc.clock_in(109, "Jane", ts(8, 0), None).await.unwrap();
        svc.clock_in(109, "Jane", ts(8, 5), None).await.unwrap();
        assert_eq!(svc.store().find_open_sessions(109).await.unwrap().len(), 1);

        svc.clock_out(s1.session.unwrap().id, ts(12, 0), None)
            .await
            .unwrap();
        assert_eq!(svc.store().find_open_sessions(109).await.unwrap().len(), 0);

        svc.clock_in(109, "Jane", ts(13, 0), None).await.unwrap();
        assert_eq!(svc.store().find_open_sessions(109).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn geolocation_gate_runs_before_any_mutation() {
        let svc = Attendance::new(
            MemoryStore::new(),
            AttendancePolicy {
                require_location: true,
                ..AttendancePolicy::default()
            },
        );
        let err = svc.clock_in(110, "Jane", ts(9, 0), None).await.unwrap_err();
        assert!(matches!(err, ClockError::PositionUnavailable));
        assert_eq!(svc.store().session_count(), 0);
    }
}
