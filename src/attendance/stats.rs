//! Duration math and the statistics aggregator.
//!
//! Historic records can be corrupt (a clock-out before the clock-in after
//! a bad administrative edit). Reports must stay renderable, so duration
//! math degrades to sentinels instead of failing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::attendance::calendar::derive_status;
use crate::attendance::{Attendance, time};
use crate::error::ClockError;
use crate::model::day_status::DayKind;
use crate::model::session::Session;
use crate::model::stats::AttendanceStats;
use crate::store::RecordStore;

/// Display form of a session's gross duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationDisplay {
    /// Session is still open.
    InProgress,
    /// Clock-out precedes clock-in; corrupt historic data.
    Invalid,
    /// Truncated to whole hours and minutes for rendering. Aggregation
    /// never uses this; it sums full-precision hours.
    Complete { hours: i64, minutes: i64 },
}

impl fmt::Display for DurationDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationDisplay::InProgress => write!(f, "in progress"),
            DurationDisplay::Invalid => write!(f, "--"),
            DurationDisplay::Complete { hours, minutes } => {
                write!(f, "{hours}h {minutes:02}m")
            }
        }
    }
}

pub fn calculate_duration(
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
) -> DurationDisplay {
    let Some(clock_out) = clock_out else {
        return DurationDisplay::InProgress;
    };
    if clock_out < clock_in {
        return DurationDisplay::Invalid;
    }
    let secs = (clock_out - clock_in).num_seconds();
    DurationDisplay::Complete {
        hours: secs / 3600,
        minutes: (secs % 3600) / 60,
    }
}

/// Net worked hours of a session, breaks subtracted, full precision.
/// Open or corrupt sessions contribute zero.
pub fn worked_hours(session: &Session) -> f64 {
    let Some(clock_out) = session.clock_out else {
        return 0.0;
    };
    if clock_out < session.clock_in {
        return 0.0;
    }
    let net =
        (clock_out - session.clock_in).num_seconds() - session.break_secs(clock_out);
    net.max(0) as f64 / 3600.0
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

impl<S: RecordStore> Attendance<S> {
    /// Aggregate stats over `[start, end]`, clipped at today. Working days
    /// exclude Sundays and holidays; a day counts as present only when the
    /// calendar engine derives `present` for it, so worked Sundays and
    /// holidays stay out of every rate.
    pub async fn stats(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStats, ClockError> {
        let tz = self.policy.tz_offset_minutes;
        let today = time::local_date(now, tz);
        let end = end.min(today);
        if start > end {
            return Ok(AttendanceStats::empty());
        }

        let holidays: HashSet<NaiveDate> = self
            .store()
            .list_holidays()
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();
        let leaves = self.store().leaves_in_range(employee_id, start, end).await?;

        let (range_start, _) = time::day_bounds(start, tz);
        let (_, range_end) = time::day_bounds(end, tz);
        let sessions = self
            .store()
            .sessions_in_range(employee_id, range_start, range_end)
            .await?;

        let mut by_day: HashMap<NaiveDate, Vec<Session>> = HashMap::new();
        for session in sessions {
            by_day
                .entry(time::local_date(session.clock_in, tz))
                .or_default()
                .push(session);
        }

        let punctual_deadline = self.policy.shift_start
            + Duration::minutes(self.policy.grace_minutes);

        let mut working_days = 0u32;
        let mut present_days = 0u32;
        let mut punctual_days = 0u32;
        let mut total_hours = 0.0f64;
        let mut overtime_hours = 0.0f64;

        let mut date = start;
        while date <= end {
            let day_sessions = by_day.get(&date);
            let primary = day_sessions.and_then(|v| v.first());

            if !holidays.contains(&date)
                && date.weekday() != chrono::Weekday::Sun
            {
                working_days += 1;
            }

            let kind = derive_status(date, &holidays, &leaves, primary, today);
            if kind == DayKind::Present {
                present_days += 1;

                let sessions = day_sessions.map(Vec::as_slice).unwrap_or(&[]);
                for session in sessions {
                    let hours = worked_hours(session);
                    total_hours += hours;
                    overtime_hours +=
                        (hours - self.policy.overtime_threshold_hours).max(0.0);
                }
                if let Some(primary) = primary {
                    if time::local_time(primary.clock_in, tz) <= punctual_deadline {
                        punctual_days += 1;
                    }
                }
            }

            date += Duration::days(1);
        }

        Ok(AttendanceStats {
            total_hours,
            average_hours: if present_days == 0 {
                0.0
            } else {
                total_hours / present_days as f64
            },
            attendance_rate: percent(present_days, working_days),
            punctuality_rate: percent(punctual_days, present_days),
            overtime_hours,
            present_days,
            working_days,
        })
    }
}
