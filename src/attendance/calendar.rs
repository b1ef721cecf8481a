//! Day-status derivation.
//!
//! One pure function owns the classification precedence; every surface
//! that renders a day (calendar, stats, reports) goes through it, so the
//! ordering can never drift between call sites.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::attendance::{Attendance, time};
use crate::error::ClockError;
use crate::model::day_status::{DayKind, DayStatus};
use crate::model::leave::{LeaveSpan, LeaveStatus, LeaveType};
use crate::model::session::Session;
use crate::store::RecordStore;

/// Classify one local calendar day.
///
/// Precedence is fixed: upcoming, then holiday, then Sunday, then leave,
/// then present, then absent. Sunday wins even over a recorded session:
/// a worked Sunday renders as a holiday (product decision; the attendance
/// signal for that day is deliberately discarded).
pub fn derive_status(
    date: NaiveDate,
    holidays: &HashSet<NaiveDate>,
    leaves: &[LeaveSpan],
    session: Option<&Session>,
    today: NaiveDate,
) -> DayKind {
    if date > today {
        return DayKind::Upcoming;
    }
    if holidays.contains(&date) || date.weekday() == Weekday::Sun {
        return DayKind::Holiday;
    }
    for leave in leaves.iter().filter(|l| l.covers(date)) {
        return match (leave.status, leave.leave_type) {
            (LeaveStatus::Approved, LeaveType::HalfDay) => DayKind::HalfDay,
            (LeaveStatus::Approved, _) => DayKind::ApprovedLeave,
            (LeaveStatus::Pending, _) => DayKind::UnapprovedLeave,
            // A rejected request leaves the day to the session/absence
            // rules below.
            (LeaveStatus::Rejected, _) => {
                if session.is_some() {
                    DayKind::Present
                } else {
                    DayKind::Absent
                }
            }
        };
    }
    if session.is_some() {
        DayKind::Present
    } else {
        DayKind::Absent
    }
}

impl<S: RecordStore> Attendance<S> {
    /// Full month of day statuses, one ranged store query per source.
    pub async fn calendar_month(
        &self,
        employee_id: u64,
        month_start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DayStatus>, ClockError> {
        let tz = self.policy.tz_offset_minutes;
        let month_end = last_day_of_month(month_start);

        let (range_start, _) = time::day_bounds(month_start, tz);
        let (_, range_end) = time::day_bounds(month_end, tz);

        let holidays: HashSet<NaiveDate> = self
            .store()
            .list_holidays()
            .await?
            .into_iter()
            .map(|h| h.date)
            .collect();
        let leaves = self
            .store()
            .leaves_in_range(employee_id, month_start, month_end)
            .await?;
        let sessions = self
            .store()
            .sessions_in_range(employee_id, range_start, range_end)
            .await?;

        // Earliest session of each local day represents the day.
        let mut by_day: HashMap<NaiveDate, Session> = HashMap::new();
        for session in sessions {
            by_day
                .entry(time::local_date(session.clock_in, tz))
                .or_insert(session);
        }

        let today = time::local_date(now, tz);
        let mut days = Vec::with_capacity(31);
        let mut date = month_start;
        while date <= month_end {
            let session = by_day.get(&date);
            let status = derive_status(date, &holidays, &leaves, session, today);
            days.push(DayStatus {
                date,
                status,
                session: (status == DayKind::Present).then(|| session.cloned()).flatten(),
            });
            date += Duration::days(1);
        }
        Ok(days)
    }
}

fn last_day_of_month(month_start: NaiveDate) -> NaiveDate {
    let (year, month) = (month_start.year(), month_start.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.expect("first of month is always valid") - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttendancePolicy;
    use crate::model::session::{SessionLocation, SessionStatus};
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session_on(employee_id: u64, day: NaiveDate) -> Session {
        Session {
            id: 0,
            employee_id,
            employee_name: "Jane".into(),
            clock_in: Utc
                .from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap()),
            clock_out: Some(Utc.from_utc_datetime(&day.and_hms_opt(17, 0, 0).unwrap())),
            breaks: Vec::new(),
            location: SessionLocation::default(),
            total_hours: 8.0,
            status: SessionStatus::Completed,
            edited_by: None,
            edit_reason: None,
        }
    }

    fn leave(status: LeaveStatus, leave_type: LeaveType, day: NaiveDate) -> LeaveSpan {
        LeaveSpan {
            id: 1,
            employee_id: 1,
            start_date: day,
            end_date: day,
            leave_type,
            status,
        }
    }

    // 2026-03-01 is a Sunday; 2026-03-02 a Monday.
    const EMPTY_LEAVES: &[LeaveSpan] = &[];

    #[test]
    fn future_days_are_upcoming_regardless_of_everything() {
        let today = date(2026, 3, 10);
        let mut holidays = HashSet::new();
        holidays.insert(date(2026, 3, 11));
        assert_eq!(
            derive_status(date(2026, 3, 11), &holidays, EMPTY_LEAVES, None, today),
            DayKind::Upcoming
        );
    }

    #[test]
    fn sunday_with_session_is_still_holiday() {
        let sunday = date(2026, 3, 1);
        let session = session_on(1, sunday);
        assert_eq!(
            derive_status(
                sunday,
                &HashSet::new(),
                EMPTY_LEAVES,
                Some(&session),
                date(2026, 3, 10)
            ),
            DayKind::Holiday
        );
    }

    #[test]
    fn holiday_entry_beats_leave_and_session() {
        let day = date(2026, 3, 4);
        let mut holidays = HashSet::new();
        holidays.insert(day);
        let leaves = vec![leave(LeaveStatus::Approved, LeaveType::Annual, day)];
        let session = session_on(1, day);
        assert_eq!(
            derive_status(day, &holidays, &leaves, Some(&session), date(2026, 3, 10)),
            DayKind::Holiday
        );
    }

    #[test]
    fn leave_takes_precedence_over_present() {
        let day = date(2026, 3, 4);
        let session = session_on(1, day);

        let approved = vec![leave(LeaveStatus::Approved, LeaveType::Sick, day)];
        assert_eq!(
            derive_status(day, &HashSet::new(), &approved, Some(&session), date(2026, 3, 10)),
            DayKind::ApprovedLeave
        );

        let half = vec![leave(LeaveStatus::Approved, LeaveType::HalfDay, day)];
        assert_eq!(
            derive_status(day, &HashSet::new(), &half, None, date(2026, 3, 10)),
            DayKind::HalfDay
        );

        let pending = vec![leave(LeaveStatus::Pending, LeaveType::Annual, day)];
        assert_eq!(
            derive_status(day, &HashSet::new(), &pending, None, date(2026, 3, 10)),
            DayKind::UnapprovedLeave
        );
    }

    #[test]
    fn rejected_leave_falls_through_to_attendance() {
        let day = date(2026, 3, 4);
        let rejected = vec![leave(LeaveStatus::Rejected, LeaveType::Annual, day)];
        let session = session_on(1, day);
        assert_eq!(
            derive_status(day, &HashSet::new(), &rejected, Some(&session), date(2026, 3, 10)),
            DayKind::Present
        );
        assert_eq!(
            derive_status(day, &HashSet::new(), &rejected, None, date(2026, 3, 10)),
            DayKind::Absent
        );
    }

    #[test]
    fn plain_present_and_absent() {
        let day = date(2026, 3, 3);
        let session = session_on(1, day);
        assert_eq!(
            derive_status(day, &HashSet::new(), EMPTY_LEAVES, Some(&session), date(2026, 3, 10)),
            DayKind::Present
        );
        assert_eq!(
            derive_status(day, &HashSet::new(), EMPTY_LEAVES, None, date(2026, 3, 10)),
            DayKind::Absent
        );
    }

    #[actix_web::test]
    async fn calendar_month_classifies_each_day() {
        let store = MemoryStore::new();
        store.add_holiday(date(2026, 3, 26), "Independence Day");
        let mut sick = leave(LeaveStatus::Approved, LeaveType::Sick, date(2026, 3, 4));
        sick.employee_id = 42;
        store.add_leave(sick);
        store.seed_session(session_on(42, date(2026, 3, 2)));
        // Worked Sunday: still renders as holiday.
        store.seed_session(session_on(42, date(2026, 3, 1)));

        let svc = Attendance::new(store, AttendancePolicy::default());
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let days = svc
            .calendar_month(42, date(2026, 3, 1), now)
            .await
            .unwrap();

        assert_eq!(days.len(), 31);
        let by_date: HashMap<NaiveDate, &DayStatus> =
            days.iter().map(|d| (d.date, d)).collect();

        assert_eq!(by_date[&date(2026, 3, 1)].status, DayKind::Holiday);
        assert_eq!(by_date[&date(2026, 3, 2)].status, DayKind::Present);
        assert!(by_date[&date(2026, 3, 2)].session.is_some());
        assert_eq!(by_date[&date(2026, 3, 3)].status, DayKind::Absent);
        assert_eq!(by_date[&date(2026, 3, 4)].status, DayKind::ApprovedLeave);
        assert_eq!(by_date[&date(2026, 3, 8)].status, DayKind::Holiday); // Sunday
        assert_eq!(by_date[&date(2026, 3, 11)].status, DayKind::Upcoming);
        assert_eq!(by_date[&date(2026, 3, 26)].status, DayKind::Upcoming); // future holiday
    }
}
