use actix_web::{HttpResponse, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure reading or writing the record store.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "record not found")]
    NotFound,
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

/// Everything a clock operation can fail with, grouped the way callers
/// branch on it: validation failures are rejected before any store write,
/// environment failures carry remediation guidance, and store failures
/// trigger an optimistic rollback. `AlreadyClockedIn` is deliberately NOT
/// here; it is a policy no-op, not an error.
#[derive(Debug, Display)]
pub enum ClockError {
    // -- validation --
    #[display(fmt = "clock-out time must be after clock-in time")]
    ClockOutBeforeClockIn,
    #[display(fmt = "no active session")]
    NoActiveSession,
    #[display(fmt = "a break is already open for this session")]
    BreakAlreadyOpen,
    #[display(fmt = "no open break to end")]
    NoOpenBreak,
    #[display(fmt = "latitude/longitude is not a valid coordinate")]
    InvalidCoordinates,

    // -- environment --
    #[display(fmt = "location can only be captured from a secure origin")]
    InsecureContext,
    #[display(fmt = "location permission was denied")]
    PermissionDenied,
    #[display(fmt = "device position is unavailable")]
    PositionUnavailable,
    #[display(fmt = "location request timed out")]
    GeoTimeout,
    #[display(fmt = "location fix is too old to trust")]
    StaleFix,

    // -- store --
    #[display(fmt = "store error: {}", _0)]
    Store(StoreError),
}

impl std::error::Error for ClockError {}

impl From<StoreError> for ClockError {
    fn from(e: StoreError) -> Self {
        ClockError::Store(e)
    }
}

impl ClockError {
    /// Stable machine-readable discriminant so the UI can branch on error
    /// kind instead of matching message strings.
    pub fn kind(&self) -> &'static str {
        match self {
            ClockError::ClockOutBeforeClockIn => "clock-out-before-clock-in",
            ClockError::NoActiveSession => "no-active-session",
            ClockError::BreakAlreadyOpen => "break-already-open",
            ClockError::NoOpenBreak => "no-open-break",
            ClockError::InvalidCoordinates => "invalid-coordinates",
            ClockError::InsecureContext => "insecure-context",
            ClockError::PermissionDenied => "permission-denied",
            ClockError::PositionUnavailable => "position-unavailable",
            ClockError::GeoTimeout => "geo-timeout",
            ClockError::StaleFix => "stale-fix",
            ClockError::Store(_) => "store-error",
        }
    }

    /// User-facing guidance for failures the user can act on themselves.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ClockError::InsecureContext => {
                Some("Open the dashboard over HTTPS and try again")
            }
            ClockError::PermissionDenied => {
                Some("Allow location access in your browser settings, then retry")
            }
            ClockError::PositionUnavailable | ClockError::GeoTimeout => {
                Some("Move to an area with better signal and retry")
            }
            ClockError::StaleFix => Some("Refresh your location and try again"),
            _ => None,
        }
    }
}

impl actix_web::ResponseError for ClockError {
    fn status_code(&self) -> StatusCode {
        match self {
            ClockError::NoActiveSession => StatusCode::CONFLICT,
            ClockError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store internals stay in the logs, not in the response body.
        let message = match self {
            ClockError::Store(e) => {
                tracing::error!(error = %e, "attendance store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "message": message,
            "kind": self.kind(),
        });
        if let Some(hint) = self.remediation() {
            body["remediation"] = json!(hint);
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(ClockError::ClockOutBeforeClockIn.kind(), "clock-out-before-clock-in");
        assert_eq!(
            ClockError::Store(StoreError::NotFound).kind(),
            "store-error"
        );
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ClockError::NoActiveSession.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ClockError::PermissionDenied.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClockError::Store(StoreError::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn environment_failures_carry_remediation() {
        assert!(ClockError::PermissionDenied.remediation().is_some());
        assert!(ClockError::ClockOutBeforeClockIn.remediation().is_none());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }
}
