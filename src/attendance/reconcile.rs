//! Duplicate-session reconciliation.
//!
//! Clock-in races across tabs and devices can leave more than one open
//! session for an employee. This pass keeps the earliest and closes the
//! rest as zero-duration edits. It runs on every status read, so it must
//! be idempotent and must never touch a sole open session.

use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::session::SessionStatus;
use crate::store::{RecordStore, SessionClose};

pub const DUPLICATE_CLEANUP_REASON: &str = "duplicate-cleanup";

/// Returns how many duplicates were closed (0 on the common path).
pub async fn reconcile_duplicates<S: RecordStore>(
    store: &S,
    employee_id: u64,
) -> Result<usize, StoreError> {
    let open = store.find_open_sessions(employee_id).await?;
    if open.len() <= 1 {
        return Ok(0);
    }

    warn!(
        employee_id,
        open_count = open.len(),
        "Multiple open sessions found, reconciling"
    );

    // find_open_sessions orders by clock_in; the earliest survives.
    let keep = &open[0];
    let mut closed = 0usize;

    for dup in &open[1..] {
        // Synthetic zero-duration close; any dangling break collapses to
        // its own start.
        let mut breaks = dup.breaks.clone();
        for b in breaks.iter_mut().filter(|b| b.is_open()) {
            b.end = Some(b.start);
            b.duration_secs = 0;
        }

        store
            .close_session(
                dup.id,
                SessionClose {
                    clock_out: dup.clock_in,
                    clock_out_location: None,
                    breaks,
                    total_hours: 0.0,
                    status: SessionStatus::Edited,
                    edited_by: Some("system".to_string()),
                    edit_reason: Some(DUPLICATE_CLEANUP_REASON.to_string()),
                },
            )
            .await?;
        closed += 1;
    }

    info!(
        employee_id,
        kept_session = keep.id,
        closed,
        "Duplicate sessions reconciled"
    );
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::session::{Break, Session, SessionLocation};
    use crate::store::memory::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn open_session(employee_id: u64, clock_in: DateTime<Utc>) -> Session {
        Session {
            id: 0,
            employee_id,
            employee_name: "Jane".into(),
            clock_in,
            clock_out: None,
            breaks: Vec::new(),
            location: SessionLocation::default(),
            total_hours: 0.0,
            status: SessionStatus::Active,
            edited_by: None,
            edit_reason: None,
        }
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[actix_web::test]
    async fn keeps_earliest_and_closes_rest() {
        let store = MemoryStore::new();
        let early = store.seed_session(open_session(7, ts(9, 0)));
        let late = store.seed_session(open_session(7, ts(9, 5)));

        let closed = reconcile_duplicates(&store, 7).await.unwrap();
        assert_eq!(closed, 1);

        let kept = store.get_session(early).await.unwrap();
        assert!(kept.is_open());

        let dup = store.get_session(late).await.unwrap();
        assert_eq!(dup.clock_out, Some(dup.clock_in));
        assert_eq!(dup.total_hours, 0.0);
        assert_eq!(dup.status, SessionStatus::Edited);
        assert_eq!(dup.edit_reason.as_deref(), Some(DUPLICATE_CLEANUP_REASON));
    }

    #[actix_web::test]
    async fn is_idempotent() {
        let store = MemoryStore::new();
        store.seed_session(open_session(8, ts(9, 0)));
        store.seed_session(open_session(8, ts(9, 1)));
        store.seed_session(open_session(8, ts(9, 2)));

        assert_eq!(reconcile_duplicates(&store, 8).await.unwrap(), 2);
        let after_first = store.find_open_sessions(8).await.unwrap();

        assert_eq!(reconcile_duplicates(&store, 8).await.unwrap(), 0);
        let after_second = store.find_open_sessions(8).await.unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(after_first.len(), 1);
    }

    #[actix_web::test]
    async fn never_touches_a_sole_open_session() {
        let store = MemoryStore::new();
        let id = store.seed_session(open_session(9, ts(9, 0)));

        assert_eq!(reconcile_duplicates(&store, 9).await.unwrap(), 0);
        assert!(store.get_session(id).await.unwrap().is_open());
    }

    #[actix_web::test]
    async fn clamps_dangling_breaks_on_duplicates() {
        let store = MemoryStore::new();
        store.seed_session(open_session(10, ts(9, 0)));

        let mut dup = open_session(10, ts(9, 10));
        dup.breaks.push(Break::open(ts(9, 20)));
        let dup_id = store.seed_session(dup);

        reconcile_duplicates(&store, 10).await.unwrap();

        let closed = store.get_session(dup_id).await.unwrap();
        assert!(closed.breaks.iter().all(|b| !b.is_open()));
        assert_eq!(closed.breaks[0].duration_secs, 0);
    }
}
