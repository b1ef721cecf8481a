use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Administrator-managed non-working day. Read-only to the attendance
/// engine; dates are in the employees' local calendar.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2026-03-26", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
}
