pub mod api_key;
pub mod encounter;
pub mod user;

/// Result of an insert that runs behind a per-plan quota. The count check and
/// the insert share one transaction, so concurrent creates cannot overshoot.
#[derive(Debug)]
pub enum QuotaOutcome<T> {
    Created(T),
    /// The owner already holds `current` rows and the plan allows no more.
    LimitReached { current: u64, limit: u64 },
}

/// Current UTC time truncated to whole seconds, the precision stored for
/// every `created_at` column.
pub(crate) fn utc_now_seconds() -> chrono::NaiveDateTime {
    use chrono::Timelike;

    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}
