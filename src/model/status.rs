use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ClockState {
    NotClockedIn,
    ClockedIn,
    OnBreak,
    ClockedOut,
}

/// Where the employee stands right now.
///
/// Cached as a responsiveness hint by the status-cache layer; always
/// reconstructable from the record store, and the store wins whenever the
/// two disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentStatus {
    pub state: ClockState,
    #[schema(nullable = true)]
    pub session_id: Option<u64>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_in: Option<DateTime<Utc>>,
}

impl CurrentStatus {
    pub fn not_clocked_in() -> Self {
        Self {
            state: ClockState::NotClockedIn,
            session_id: None,
            clock_in: None,
        }
    }

    pub fn clocked_out() -> Self {
        Self {
            state: ClockState::ClockedOut,
            session_id: None,
            clock_in: None,
        }
    }

    pub fn clocked_in(session_id: Option<u64>, clock_in: DateTime<Utc>) -> Self {
        Self {
            state: ClockState::ClockedIn,
            session_id,
            clock_in: Some(clock_in),
        }
    }

    pub fn on_break(session_id: Option<u64>, clock_in: DateTime<Utc>) -> Self {
        Self {
            state: ClockState::OnBreak,
            session_id,
            clock_in: Some(clock_in),
        }
    }
}
