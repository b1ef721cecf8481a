//! In-memory record store used by the attendance tests. Mirrors the
//! per-document atomicity of the real store: each method locks, applies
//! one record's change, and releases.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StoreError;
use crate::model::holiday::Holiday;
use crate::model::leave::LeaveSpan;
use crate::model::session::{Session, SessionLocation};
use crate::store::{NewSession, RecordStore, SessionClose, SessionPatch};

#[derive(Default)]
struct Inner {
    next_id: u64,
    sessions: BTreeMap<u64, Session>,
    holidays: Vec<Holiday>,
    leaves: Vec<LeaveSpan>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a dead network/store.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn add_holiday(&self, date: NaiveDate, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.holidays.len() as u64 + 1;
        inner.holidays.push(Holiday {
            id,
            date,
            name: name.to_string(),
            description: None,
        });
    }

    pub fn add_leave(&self, leave: LeaveSpan) {
        self.inner.lock().unwrap().leaves.push(leave);
    }

    /// Insert a session as-is, bypassing the state machine. Lets tests set
    /// up racy or historic states the service itself would refuse to
    /// create.
    pub fn seed_session(&self, mut session: Session) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        session.id = inner.next_id;
        let id = session.id;
        inner.sessions.insert(id, session);
        id
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }
}

impl RecordStore for MemoryStore {
    async fn create_session(&self, new: NewSession) -> Result<Session, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let session = Session {
            id: inner.next_id,
            employee_id: new.employee_id,
            employee_name: new.employee_name,
            clock_in: new.clock_in,
            clock_out: None,
            breaks: Vec::new(),
            location: SessionLocation {
                clock_in: new.clock_in_location,
                clock_out: None,
            },
            total_hours: 0.0,
            status: crate::model::session::SessionStatus::Active,
            edited_by: None,
            edit_reason: None,
        };
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: u64) -> Result<Session, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn close_session(&self, id: u64, close: SessionClose) -> Result<Session, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let session = inner.sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if session.clock_out.is_some() {
            return Err(StoreError::NotFound);
        }
        session.clock_out = Some(close.clock_out);
        session.location.clock_out = close.clock_out_location;
        session.breaks = close.breaks;
        session.total_hours = close.total_hours;
        session.status = close.status;
        session.edited_by = close.edited_by;
        session.edit_reason = close.edit_reason;
        Ok(session.clone())
    }

    async fn patch_session(&self, id: u64, patch: SessionPatch) -> Result<Session, StoreError> {
        self.write_guard()?;
        let mut inner = self.inner.lock().unwrap();
        let session = inner.sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(breaks) = patch.breaks {
            session.breaks = breaks;
        }
        if let Some(location) = patch.location {
            session.location = location;
        }
        if let Some(status) = patch.status {
            session.status = status;
        }
        if let Some(total_hours) = patch.total_hours {
            session.total_hours = total_hours;
        }
        if let Some(edited_by) = patch.edited_by {
            session.edited_by = Some(edited_by);
        }
        if let Some(edit_reason) = patch.edit_reason {
            session.edit_reason = Some(edit_reason);
        }
        Ok(session.clone())
    }

    async fn find_open_session(&self, employee_id: u64) -> Result<Option<Session>, StoreError> {
        Ok(self.find_open_sessions(employee_id).await?.into_iter().next())
    }

    async fn find_open_sessions(&self, employee_id: u64) -> Result<Vec<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut open: Vec<Session> = inner
            .sessions
            .values()
            .filter(|s| s.employee_id == employee_id && s.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|s| s.clock_in);
        Ok(open)
    }

    async fn sessions_in_range(
        &self,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut hits: Vec<Session> = inner
            .sessions
            .values()
            .filter(|s| s.employee_id == employee_id && s.clock_in >= start && s.clock_in < end)
            .cloned()
            .collect();
        hits.sort_by_key(|s| s.clock_in);
        Ok(hits)
    }

    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        Ok(self.inner.lock().unwrap().holidays.clone())
    }

    async fn leaves_in_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveSpan>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id && l.start_date <= end && l.end_date >= start)
            .cloned()
            .collect())
    }
}
