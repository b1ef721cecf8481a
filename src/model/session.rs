use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of one clock-in-to-clock-out work period.
///
/// `Edited` marks administrative rewrites (including duplicate cleanup);
/// once a session carries a `clock_out` it is immutable except for those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Incomplete,
    Edited,
}

/// A geographic point captured at clock-in or clock-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    /// Reported fix accuracy in meters, when the device provides one.
    #[schema(example = 35.0)]
    pub accuracy: Option<f64>,
}

impl Coordinates {
    pub fn in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Where the employee was at each end of the session. Stored embedded in
/// the session document, never as its own record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionLocation {
    pub clock_in: Option<Coordinates>,
    pub clock_out: Option<Coordinates>,
}

/// One break inside a session. At most one break per session may be open
/// (absent `end`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Break {
    #[schema(value_type = String, format = "date-time")]
    pub start: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub end: Option<DateTime<Utc>>,
    pub duration_secs: i64,
}

impl Break {
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            duration_secs: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// One attendance session document.
///
/// Invariant: for a given employee at most one session with absent
/// `clock_out` exists at any time ("the open session"). The store cannot
/// guarantee this transactionally, so the clock service enforces it with
/// read-before-write and the duplicate-reconciliation backstop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(value_type = String, format = "date-time")]
    pub clock_in: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<DateTime<Utc>>,
    pub breaks: Vec<Break>,
    pub location: SessionLocation,
    /// Net worked hours, breaks subtracted. Zero until clock-out.
    #[schema(example = 8.0)]
    pub total_hours: f64,
    pub status: SessionStatus,
    #[schema(nullable = true)]
    pub edited_by: Option<String>,
    #[schema(nullable = true)]
    pub edit_reason: Option<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.is_open())
    }

    /// Total seconds spent on breaks, with any still-open break clamped to
    /// `until`. Clamping keeps the math defined for dangling breaks.
    pub fn break_secs(&self, until: DateTime<Utc>) -> i64 {
        self.breaks
            .iter()
            .map(|b| match b.end {
                Some(end) => (end - b.start).num_seconds().max(0),
                None => (until - b.start).num_seconds().max(0),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn coordinates_range_check() {
        let ok = Coordinates {
            latitude: 23.8,
            longitude: 90.4,
            accuracy: None,
        };
        assert!(ok.in_range());

        let bad_lat = Coordinates {
            latitude: 91.0,
            ..ok
        };
        assert!(!bad_lat.in_range());

        let nan = Coordinates {
            latitude: f64::NAN,
            ..ok
        };
        assert!(!nan.in_range());
    }

    #[test]
    fn break_seconds_clamp_open_break() {
        let session = Session {
            id: 1,
            employee_id: 1,
            employee_name: "x".into(),
            clock_in: ts(9, 0),
            clock_out: None,
            breaks: vec![
                Break {
                    start: ts(12, 0),
                    end: Some(ts(12, 30)),
                    duration_secs: 1800,
                },
                Break::open(ts(15, 0)),
            ],
            location: SessionLocation::default(),
            total_hours: 0.0,
            status: SessionStatus::Active,
            edited_by: None,
            edit_reason: None,
        };
        // closed 30 min + open break clamped to 15:10 = 10 min
        assert_eq!(session.break_secs(ts(15, 10)), 1800 + 600);
    }
}
