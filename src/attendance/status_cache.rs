//! Optimistic reconciliation layer for `CurrentStatus`.
//!
//! The cache is a responsiveness hint, never a source of truth. Mutations
//! write an optimistic guess here before the store round-trip, overwrite
//! it with a store-derived value after the mutation is acknowledged, and
//! restore the prior hint if the mutation fails.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::status::CurrentStatus;

static STATUS_CACHE: Lazy<Cache<u64, CurrentStatus>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        // A stale hint self-heals on the next read, the TTL just bounds
        // memory for employees who stop showing up.
        .time_to_live(Duration::from_secs(18 * 3600))
        .build()
});

/// The cached hint, if any. Callers must not base decisions on this
/// without re-validating against the store.
pub async fn hint(employee_id: u64) -> Option<CurrentStatus> {
    STATUS_CACHE.get(&employee_id).await
}

/// Record a status, optimistic or confirmed.
pub async fn apply(employee_id: u64, status: CurrentStatus) {
    STATUS_CACHE.insert(employee_id, status).await;
}

/// Roll back to the snapshot taken before an optimistic write.
pub async fn restore(employee_id: u64, prior: Option<CurrentStatus>) {
    match prior {
        Some(status) => STATUS_CACHE.insert(employee_id, status).await,
        None => STATUS_CACHE.invalidate(&employee_id).await,
    }
}

/// Prime the cache with every currently open session so first status
/// reads after a restart hit a warm hint.
pub async fn warmup_status_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u64, u64, DateTime<Utc>)>(
        r#"
        SELECT employee_id, id, clock_in
        FROM attendance_sessions
        WHERE clock_out IS NULL
        ORDER BY clock_in ASC
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_id, session_id, clock_in) = row?;
        batch.push((
            employee_id,
            CurrentStatus::clocked_in(Some(session_id), clock_in),
        ));
        total_count += 1;

        if batch.len() >= batch_size {
            flush(&mut batch).await;
        }
    }
    flush(&mut batch).await;

    tracing::info!(open_sessions = total_count, "Status cache warmup complete");
    Ok(())
}

async fn flush(batch: &mut Vec<(u64, CurrentStatus)>) {
    let inserts: Vec<_> = batch
        .drain(..)
        .map(|(id, status)| STATUS_CACHE.insert(id, status))
        .collect();
    futures::future::join_all(inserts).await;
}
