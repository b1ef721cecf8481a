use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::Attendance;
use crate::attendance::geo::LocationReport;
use crate::auth::auth::AuthUser;
use crate::error::ClockError;
use crate::model::day_status::DayStatus;
use crate::model::employee::Employee;
use crate::model::session::Session;
use crate::model::stats::AttendanceStats;
use crate::model::status::CurrentStatus;
use crate::store::mysql::MySqlStore;

type Svc = web::Data<Attendance<MySqlStore>>;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(nullable = true)]
    pub location: Option<LocationReport>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClockOutRequest {
    /// Omit to close the caller's open session.
    #[schema(nullable = true)]
    pub session_id: Option<u64>,
    #[schema(nullable = true)]
    pub location: Option<LocationReport>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BreakRequest {
    /// Omit to target the caller's open session.
    #[schema(nullable = true)]
    pub session_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ClockResponse {
    #[schema(example = "Clocked in successfully")]
    pub message: String,
    /// False when the call was absorbed as an already-clocked-in no-op.
    pub created: bool,
    #[schema(nullable = true)]
    pub session: Option<Session>,
    pub status: CurrentStatus,
    #[schema(nullable = true)]
    pub accuracy_warning: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CalendarQuery {
    /// Calendar month, `YYYY-MM`.
    #[schema(example = "2026-03")]
    pub month: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StatsQuery {
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub start: NaiveDate,
    #[schema(example = "2026-03-31", value_type = String, format = "date")]
    pub end: NaiveDate,
}

/// Display name snapshot stored on the session; falls back to the account
/// username when no employee profile row exists yet.
async fn employee_display_name(store: &MySqlStore, employee_id: u64, fallback: &str) -> String {
    let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(store.pool())
        .await;

    match row {
        Ok(Some(employee)) => employee.full_name(),
        Ok(None) => fallback.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, employee_id, "Employee name lookup failed");
            fallback.to_string()
        }
    }
}

async fn resolve_session_id(
    svc: &Attendance<MySqlStore>,
    employee_id: u64,
    explicit: Option<u64>,
) -> Result<u64, ClockError> {
    match explicit {
        Some(id) => Ok(id),
        None => svc
            .open_session_id(employee_id)
            .await?
            .ok_or(ClockError::NoActiveSession),
    }
}

/// Current clock status
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status",
    responses(
        (status = 200, description = "Authoritative current status", body = CurrentStatus),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(auth: AuthUser, svc: Svc) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;
    let status = svc.current_status(employee_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(status))
}

/// Clock in
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in, or absorbed as a no-op when a session is already open", body = ClockResponse),
        (status = 400, description = "Validation or location failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    svc: Svc,
    payload: web::Json<ClockInRequest>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;
    let name = employee_display_name(svc.store(), employee_id, &auth.username).await;

    let outcome = svc
        .clock_in(employee_id, &name, Utc::now(), payload.location.as_ref())
        .await?;

    let created = outcome.session.is_some();
    Ok(HttpResponse::Ok().json(ClockResponse {
        message: if created {
            "Clocked in successfully".to_string()
        } else {
            "Already clocked in".to_string()
        },
        created,
        session: outcome.session,
        status: outcome.status,
        accuracy_warning: outcome.accuracy_warning,
    }))
}

/// Clock out
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-out",
    request_body = ClockOutRequest,
    responses(
        (status = 200, description = "Clocked out successfully", body = ClockResponse),
        (status = 400, description = "Validation or location failure"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "No active session"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    svc: Svc,
    payload: web::Json<ClockOutRequest>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;
    let session_id = resolve_session_id(&svc, employee_id, payload.session_id).await?;

    let outcome = svc
        .clock_out(session_id, Utc::now(), payload.location.as_ref())
        .await?;

    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Clocked out successfully".to_string(),
        created: false,
        session: Some(outcome.session),
        status: outcome.status,
        accuracy_warning: outcome.accuracy_warning,
    }))
}

/// Start a break
#[utoipa::path(
    post,
    path = "/api/v1/attendance/break/start",
    request_body = BreakRequest,
    responses(
        (status = 200, description = "Break started", body = ClockResponse),
        (status = 400, description = "A break is already open"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No active session"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn start_break(
    auth: AuthUser,
    svc: Svc,
    payload: web::Json<BreakRequest>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;
    let session_id = resolve_session_id(&svc, employee_id, payload.session_id).await?;

    let outcome = svc.start_break(session_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Break started".to_string(),
        created: false,
        session: Some(outcome.session),
        status: outcome.status,
        accuracy_warning: None,
    }))
}

/// End a break
#[utoipa::path(
    post,
    path = "/api/v1/attendance/break/end",
    request_body = BreakRequest,
    responses(
        (status = 200, description = "Break ended", body = ClockResponse),
        (status = 400, description = "No open break"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No active session"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn end_break(
    auth: AuthUser,
    svc: Svc,
    payload: web::Json<BreakRequest>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;
    let session_id = resolve_session_id(&svc, employee_id, payload.session_id).await?;

    let outcome = svc.end_break(session_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(ClockResponse {
        message: "Break ended".to_string(),
        created: false,
        session: Some(outcome.session),
        status: outcome.status,
        accuracy_warning: None,
    }))
}

/// Month calendar of day statuses
#[utoipa::path(
    get,
    path = "/api/v1/attendance/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "One status per day of the month", body = [DayStatus]),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn calendar(
    auth: AuthUser,
    svc: Svc,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;

    let month_start = NaiveDate::parse_from_str(&format!("{}-01", query.month), "%Y-%m-%d")
        .map_err(|_| actix_web::error::ErrorBadRequest("month must be YYYY-MM"))?;

    let days = svc
        .calendar_month(employee_id, month_start, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(days))
}

/// Attendance statistics over a range
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Aggregated metrics", body = AttendanceStats),
        (status = 400, description = "start after end"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn stats(
    auth: AuthUser,
    svc: Svc,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = auth.require_employee_id()?;

    if query.start > query.end {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start cannot be after end"
        })));
    }

    let stats = svc
        .stats(employee_id, query.start, query.end, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(stats))
}
