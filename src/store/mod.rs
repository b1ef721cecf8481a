//! Record store interface for the attendance engine.
//!
//! The store gives per-document atomicity and nothing more; there are no
//! cross-document transactions, which is why the clock service enforces
//! the single-open-session invariant with read-before-write plus the
//! duplicate-reconciliation backstop.

pub mod mysql;

#[cfg(test)]
pub mod memory;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StoreError;
use crate::model::holiday::Holiday;
use crate::model::leave::LeaveSpan;
use crate::model::session::{
    Break, Coordinates, Session, SessionLocation, SessionStatus,
};

/// Fields of a session created at clock-in.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub employee_id: u64,
    pub employee_name: String,
    pub clock_in: DateTime<Utc>,
    pub clock_in_location: Option<Coordinates>,
}

/// Everything that changes when a session is closed, applied in one write.
#[derive(Debug, Clone)]
pub struct SessionClose {
    pub clock_out: DateTime<Utc>,
    pub clock_out_location: Option<Coordinates>,
    pub breaks: Vec<Break>,
    pub total_hours: f64,
    pub status: SessionStatus,
    pub edited_by: Option<String>,
    pub edit_reason: Option<String>,
}

/// Partial update for an open session. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub breaks: Option<Vec<Break>>,
    pub status: Option<SessionStatus>,
    pub total_hours: Option<f64>,
    pub location: Option<SessionLocation>,
    pub edited_by: Option<String>,
    pub edit_reason: Option<String>,
}

pub trait RecordStore {
    async fn create_session(&self, new: NewSession) -> Result<Session, StoreError>;

    async fn get_session(&self, id: u64) -> Result<Session, StoreError>;

    async fn close_session(&self, id: u64, close: SessionClose) -> Result<Session, StoreError>;

    async fn patch_session(&self, id: u64, patch: SessionPatch) -> Result<Session, StoreError>;

    /// The open session for an employee, earliest clock-in first if the
    /// invariant has been violated and several exist.
    async fn find_open_session(&self, employee_id: u64) -> Result<Option<Session>, StoreError>;

    /// Every open session for an employee; feeds duplicate reconciliation.
    async fn find_open_sessions(&self, employee_id: u64) -> Result<Vec<Session>, StoreError>;

    /// Sessions whose clock-in falls in `[start, end)`, ordered by clock-in.
    async fn sessions_in_range(
        &self,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError>;

    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError>;

    /// Leave spans for an employee overlapping `[start, end]` (inclusive
    /// dates, local calendar).
    async fn leaves_in_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveSpan>, StoreError>;
}
