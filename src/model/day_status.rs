use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::model::session::Session;

/// The single classification a calendar day gets for one employee.
/// Precedence is fixed: upcoming, then holiday/Sunday, then leave, then
/// present, then absent (see the calendar engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DayKind {
    Present,
    Absent,
    ApprovedLeave,
    UnapprovedLeave,
    HalfDay,
    Holiday,
    Upcoming,
}

/// Derived view of one day. Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayStatus {
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: DayKind,
    /// Attached only when `status` is `present`.
    #[schema(nullable = true)]
    pub session: Option<Session>,
}
