use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::warn;

use crate::error::StoreError;
use crate::model::holiday::Holiday;
use crate::model::leave::{LeaveSpan, LeaveStatus, LeaveType};
use crate::model::session::{Break, Session, SessionLocation, SessionStatus};
use crate::store::{NewSession, RecordStore, SessionClose, SessionPatch};

/// MySQL-backed record store. Session breaks and locations live in JSON
/// columns so one session stays one document.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
    breaks: Json<Vec<Break>>,
    location: Json<SessionLocation>,
    total_hours: f64,
    status: String,
    edited_by: Option<String>,
    edit_reason: Option<String>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|_| {
            warn!(session_id = row.id, status = %row.status, "Unknown session status in store");
            SessionStatus::Incomplete
        });
        Session {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            breaks: row.breaks.0,
            location: row.location.0,
            total_hours: row.total_hours,
            status,
            edited_by: row.edited_by,
            edit_reason: row.edit_reason,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
    status: String,
}

impl From<LeaveRow> for LeaveSpan {
    fn from(row: LeaveRow) -> Self {
        // Historic rows may carry values newer code no longer writes;
        // degrade instead of refusing to load the calendar.
        let leave_type = row.leave_type.parse().unwrap_or(LeaveType::Unpaid);
        let status = row.status.parse().unwrap_or(LeaveStatus::Pending);
        LeaveSpan {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type,
            status,
        }
    }
}

const SESSION_COLS: &str =
    "id, employee_id, employee_name, clock_in, clock_out, breaks, location, \
     total_hours, status, edited_by, edit_reason";

/// Bindable value for dynamically built session patches.
enum PatchValue {
    BreaksJson(Json<Vec<Break>>),
    LocationJson(Json<SessionLocation>),
    Text(String),
    F64(f64),
}

impl RecordStore for MySqlStore {
    async fn create_session(&self, new: NewSession) -> Result<Session, StoreError> {
        let location = SessionLocation {
            clock_in: new.clock_in_location,
            clock_out: None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_sessions
                (employee_id, employee_name, clock_in, breaks, location, total_hours, status)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(&new.employee_name)
        .bind(new.clock_in)
        .bind(Json(Vec::<Break>::new()))
        .bind(Json(&location))
        .bind(SessionStatus::Active.to_string())
        .execute(&self.pool)
        .await?;

        self.get_session(result.last_insert_id()).await
    }

    async fn get_session(&self, id: u64) -> Result<Session, StoreError> {
        let sql = format!("SELECT {SESSION_COLS} FROM attendance_sessions WHERE id = ?");
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn close_session(&self, id: u64, close: SessionClose) -> Result<Session, StoreError> {
        // Merge the clock-out point into the embedded location; the
        // clock-in point must survive the close.
        let current = self.get_session(id).await?;
        let location = SessionLocation {
            clock_in: current.location.clock_in,
            clock_out: close.clock_out_location,
        };

        let affected = sqlx::query(
            r#"
            UPDATE attendance_sessions
            SET clock_out = ?, breaks = ?, location = ?, total_hours = ?,
                status = ?, edited_by = ?, edit_reason = ?
            WHERE id = ? AND clock_out IS NULL
            "#,
        )
        .bind(close.clock_out)
        .bind(Json(&close.breaks))
        .bind(Json(&location))
        .bind(close.total_hours)
        .bind(close.status.to_string())
        .bind(&close.edited_by)
        .bind(&close.edit_reason)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            // Already closed (or gone) between our read and this write.
            return Err(StoreError::NotFound);
        }

        self.get_session(id).await
    }

    async fn patch_session(&self, id: u64, patch: SessionPatch) -> Result<Session, StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<PatchValue> = Vec::new();

        if let Some(breaks) = patch.breaks {
            sets.push("breaks = ?");
            values.push(PatchValue::BreaksJson(Json(breaks)));
        }
        if let Some(location) = patch.location {
            sets.push("location = ?");
            values.push(PatchValue::LocationJson(Json(location)));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            values.push(PatchValue::Text(status.to_string()));
        }
        if let Some(total_hours) = patch.total_hours {
            sets.push("total_hours = ?");
            values.push(PatchValue::F64(total_hours));
        }
        if let Some(edited_by) = patch.edited_by {
            sets.push("edited_by = ?");
            values.push(PatchValue::Text(edited_by));
        }
        if let Some(edit_reason) = patch.edit_reason {
            sets.push("edit_reason = ?");
            values.push(PatchValue::Text(edit_reason));
        }

        if sets.is_empty() {
            return self.get_session(id).await;
        }

        let sql = format!(
            "UPDATE attendance_sessions SET {} WHERE id = ?",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for value in values {
            query = match value {
                PatchValue::BreaksJson(v) => query.bind(v),
                PatchValue::LocationJson(v) => query.bind(v),
                PatchValue::Text(v) => query.bind(v),
                PatchValue::F64(v) => query.bind(v),
            };
        }

        let affected = query.bind(id).execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_session(id).await
    }

    async fn find_open_session(&self, employee_id: u64) -> Result<Option<Session>, StoreError> {
        let sql = format!(
            "SELECT {SESSION_COLS} FROM attendance_sessions \
             WHERE employee_id = ? AND clock_out IS NULL \
             ORDER BY clock_in ASC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_open_sessions(&self, employee_id: u64) -> Result<Vec<Session>, StoreError> {
        let sql = format!(
            "SELECT {SESSION_COLS} FROM attendance_sessions \
             WHERE employee_id = ? AND clock_out IS NULL \
             ORDER BY clock_in ASC"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn sessions_in_range(
        &self,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, StoreError> {
        let sql = format!(
            "SELECT {SESSION_COLS} FROM attendance_sessions \
             WHERE employee_id = ? AND clock_in >= ? AND clock_in < ? \
             ORDER BY clock_in ASC"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        let holidays = sqlx::query_as::<_, Holiday>(
            "SELECT id, date, name, description FROM holidays ORDER BY date ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(holidays)
    }

    async fn leaves_in_range(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LeaveSpan>, StoreError> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, leave_type, status
            FROM leave_requests
            WHERE employee_id = ? AND start_date <= ? AND end_date >= ?
            ORDER BY start_date ASC
            "#,
        )
        .bind(employee_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
