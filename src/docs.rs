use crate::api::attendance::{
    BreakRequest, CalendarQuery, ClockInRequest, ClockOutRequest, ClockResponse, StatsQuery,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::holiday::CreateHoliday;
use crate::api::leave::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::attendance::geo::{GeoFailure, GeoFix, LocationReport};
use crate::model::day_status::{DayKind, DayStatus};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave::LeaveType;
use crate::model::session::{Break, Coordinates, Session, SessionLocation, SessionStatus};
use crate::model::stats::AttendanceStats;
use crate::model::status::{ClockState, CurrentStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce Attendance API",
        version = "1.0.0",
        description = r#"
## Workforce Attendance Service

This API tracks employee working time within an organization.

### 🔹 Key Features
- **Clock Sessions**
  - Clock in/out with optional geolocation, break start/end
- **Day Status Calendar**
  - Per-day derived status for a whole month (present, absent, leave, holiday)
- **Statistics**
  - Worked hours, attendance rate, punctuality, overtime over any date range
- **Holiday & Leave Management**
  - Configure holidays, apply for leave, approve/reject requests

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication**.
Holiday and employee administration requires **Admin** or **HR** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::status,
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::start_break,
        crate::api::attendance::end_break,
        crate::api::attendance::calendar,
        crate::api::attendance::stats,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::leave::leave_list,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees
    ),
    components(
        schemas(
            ClockInRequest,
            ClockOutRequest,
            BreakRequest,
            ClockResponse,
            CalendarQuery,
            StatsQuery,
            LocationReport,
            GeoFix,
            GeoFailure,
            Session,
            SessionStatus,
            SessionLocation,
            Coordinates,
            Break,
            CurrentStatus,
            ClockState,
            DayStatus,
            DayKind,
            AttendanceStats,
            Holiday,
            CreateHoliday,
            CreateLeave,
            LeaveType,
            LeaveResponse,
            LeaveListResponse,
            LeaveFilter,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock session, calendar and statistics APIs"),
        (name = "Holiday", description = "Holiday configuration APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
