//! Geolocation gate. Clock mutations may only proceed once the submitted
//! fix (acquired client-side with high accuracy, a bounded timeout, and
//! caching disabled) passes validation here. Everything in this module
//! runs before any store write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::AttendancePolicy;
use crate::error::ClockError;
use crate::model::session::Coordinates;

/// Client-reported reason a fix could not be acquired. Mapped 1:1 onto
/// typed errors so the UI can render a specific remediation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GeoFailure {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// A position fix as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeoFix {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    #[schema(example = 35.0, nullable = true)]
    pub accuracy: Option<f64>,
    /// When the device produced the fix. Guards against replayed
    /// coordinates from a cached position.
    #[schema(value_type = String, format = "date-time")]
    pub captured_at: DateTime<Utc>,
    /// Whether the page acquiring the fix ran in a secure context.
    #[serde(default = "default_true")]
    pub secure_context: bool,
}

fn default_true() -> bool {
    true
}

/// The location part of a clock request: either a fix or the reason the
/// client failed to acquire one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LocationReport {
    #[schema(nullable = true)]
    pub fix: Option<GeoFix>,
    #[schema(nullable = true)]
    pub failure: Option<GeoFailure>,
}

/// What the gate hands to the state machine on success.
#[derive(Debug, Default, PartialEq)]
pub struct GateOutcome {
    pub coords: Option<Coordinates>,
    /// Set when the fix was usable but coarser than policy likes. Poor GPS
    /// accuracy is common under bad signal, so it warns instead of
    /// blocking the clock operation.
    pub accuracy_warning: Option<String>,
}

pub fn gate(
    policy: &AttendancePolicy,
    report: Option<&LocationReport>,
    now: DateTime<Utc>,
) -> Result<GateOutcome, ClockError> {
    let report = match report {
        Some(r) => r,
        None if policy.require_location => return Err(ClockError::PositionUnavailable),
        None => return Ok(GateOutcome::default()),
    };

    if let Some(failure) = report.failure {
        return Err(match failure {
            GeoFailure::PermissionDenied => ClockError::PermissionDenied,
            GeoFailure::PositionUnavailable => ClockError::PositionUnavailable,
            GeoFailure::Timeout => ClockError::GeoTimeout,
        });
    }

    let fix = match &report.fix {
        Some(f) => f,
        None if policy.require_location => return Err(ClockError::PositionUnavailable),
        None => return Ok(GateOutcome::default()),
    };

    if !fix.secure_context {
        return Err(ClockError::InsecureContext);
    }

    let age = (now - fix.captured_at).num_seconds();
    if age > policy.fix_max_age_secs {
        return Err(ClockError::StaleFix);
    }

    let coords = Coordinates {
        latitude: fix.latitude,
        longitude: fix.longitude,
        accuracy: fix.accuracy,
    };
    if !coords.in_range() {
        return Err(ClockError::InvalidCoordinates);
    }

    let accuracy_warning = fix.accuracy.and_then(|acc| {
        (acc > policy.accuracy_warn_meters).then(|| {
            format!(
                "Location accuracy is {acc:.0} m (threshold {:.0} m); position recorded anyway",
                policy.accuracy_warn_meters
            )
        })
    });

    Ok(GateOutcome {
        coords: Some(coords),
        accuracy_warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> AttendancePolicy {
        AttendancePolicy {
            require_location: true,
            ..AttendancePolicy::default()
        }
    }

    fn fresh_fix(now: DateTime<Utc>) -> GeoFix {
        GeoFix {
            latitude: 23.8103,
            longitude: 90.4125,
            accuracy: Some(30.0),
            captured_at: now,
            secure_context: true,
        }
    }

    #[test]
    fn missing_report_fails_only_when_required() {
        let now = Utc::now();
        assert!(matches!(
            gate(&policy(), None, now),
            Err(ClockError::PositionUnavailable)
        ));

        let lax = AttendancePolicy::default();
        let out = gate(&lax, None, now).unwrap();
        assert_eq!(out, GateOutcome::default());
    }

    #[test]
    fn client_failures_map_to_typed_errors() {
        let now = Utc::now();
        let report = LocationReport {
            fix: None,
            failure: Some(GeoFailure::PermissionDenied),
        };
        assert!(matches!(
            gate(&policy(), Some(&report), now),
            Err(ClockError::PermissionDenied)
        ));

        let report = LocationReport {
            fix: None,
            failure: Some(GeoFailure::Timeout),
        };
        assert!(matches!(
            gate(&policy(), Some(&report), now),
            Err(ClockError::GeoTimeout)
        ));
    }

    #[test]
    fn insecure_context_is_rejected_first() {
        let now = Utc::now();
        let mut fix = fresh_fix(now);
        fix.secure_context = false;
        let report = LocationReport {
            fix: Some(fix),
            failure: None,
        };
        assert!(matches!(
            gate(&policy(), Some(&report), now),
            Err(ClockError::InsecureContext)
        ));
    }

    #[test]
    fn stale_fix_is_rejected() {
        let now = Utc::now();
        let mut fix = fresh_fix(now);
        fix.captured_at = now - Duration::seconds(300);
        let report = LocationReport {
            fix: Some(fix),
            failure: None,
        };
        assert!(matches!(
            gate(&policy(), Some(&report), now),
            Err(ClockError::StaleFix)
        ));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let now = Utc::now();
        let mut fix = fresh_fix(now);
        fix.latitude = 123.0;
        let report = LocationReport {
            fix: Some(fix),
            failure: None,
        };
        assert!(matches!(
            gate(&policy(), Some(&report), now),
            Err(ClockError::InvalidCoordinates)
        ));
    }

    #[test]
    fn coarse_accuracy_warns_but_passes() {
        let now = Utc::now();
        let mut fix = fresh_fix(now);
        fix.accuracy = Some(250.0);
        let report = LocationReport {
            fix: Some(fix),
            failure: None,
        };
        let out = gate(&policy(), Some(&report), now).unwrap();
        assert!(out.coords.is_some());
        assert!(out.accuracy_warning.is_some());
    }

    #[test]
    fn good_fix_passes_clean() {
        let now = Utc::now();
        let report = LocationReport {
            fix: Some(fresh_fix(now)),
            failure: None,
        };
        let out = gate(&policy(), Some(&report), now).unwrap();
        assert!(out.coords.is_some());
        assert!(out.accuracy_warning.is_none());
    }
}
