use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

/// Attendance policy knobs. Everything here is tunable per deployment;
/// defaults match the head-office shift.
#[derive(Clone, Debug)]
pub struct AttendancePolicy {
    /// Start of the nominal shift, local time.
    pub shift_start: NaiveTime,
    /// Minutes after `shift_start` a clock-in still counts as punctual.
    pub grace_minutes: i64,
    /// Daily worked hours beyond which time accrues as overtime.
    pub overtime_threshold_hours: f64,
    /// When true, clock-in/out without a usable location fix is rejected.
    pub require_location: bool,
    /// Fix accuracy (meters) above which a non-fatal warning is attached.
    pub accuracy_warn_meters: f64,
    /// Maximum age of a submitted fix; older fixes are rejected as stale.
    pub fix_max_age_secs: i64,
    /// Offset of the employees' local calendar from UTC, in minutes.
    /// Calendar-day bucketing always happens in local time, never UTC.
    pub tz_offset_minutes: i32,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            shift_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            grace_minutes: 15,
            overtime_threshold_hours: 8.0,
            require_location: false,
            accuracy_warn_meters: 100.0,
            fix_max_age_secs: 60,
            tz_offset_minutes: 0,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_clock_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub policy: AttendancePolicy,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = AttendancePolicy::default();

        let shift_start = env::var("SHIFT_START")
            .ok()
            .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M").ok())
            .unwrap_or(defaults.shift_start);

        // Clamp to the real-world offset range so FixedOffset construction
        // downstream can never fail.
        let tz_offset_minutes: i32 = env::var("TZ_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".to_string())
            .parse::<i32>()
            .unwrap()
            .clamp(-14 * 60, 14 * 60);

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_clock_per_min: env::var("RATE_CLOCK_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            policy: AttendancePolicy {
                shift_start,
                grace_minutes: env::var("GRACE_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap(),
                overtime_threshold_hours: env::var("OVERTIME_THRESHOLD_HOURS")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .unwrap(),
                require_location: env::var("REQUIRE_LOCATION")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap(),
                accuracy_warn_meters: env::var("ACCURACY_WARN_METERS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap(),
                fix_max_age_secs: env::var("FIX_MAX_AGE_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap(),
                tz_offset_minutes,
            },
        }
    }
}
