use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregated attendance metrics over a date range. Recomputed from
/// sessions and holidays on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceStats {
    /// Net worked hours over the range, full precision.
    #[schema(example = 160.5)]
    pub total_hours: f64,
    /// Mean worked hours per present day.
    #[schema(example = 8.02)]
    pub average_hours: f64,
    /// Present days over working days, percent, rounded. 0 when the range
    /// has no working days.
    #[schema(example = 95)]
    pub attendance_rate: u32,
    /// Punctual sessions over present days, percent, rounded.
    #[schema(example = 88)]
    pub punctuality_rate: u32,
    #[schema(example = 4.5)]
    pub overtime_hours: f64,
    #[schema(example = 20)]
    pub present_days: u32,
    #[schema(example = 21)]
    pub working_days: u32,
}

impl AttendanceStats {
    pub fn empty() -> Self {
        Self {
            total_hours: 0.0,
            average_hours: 0.0,
            attendance_rate: 0,
            punctuality_rate: 0,
            overtime_hours: 0.0,
            present_days: 0,
            working_days: 0,
        }
    }
}
