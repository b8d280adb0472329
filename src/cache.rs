use crate::models::{FetchParams, TransferTable};
use moka::sync::Cache;
use std::time::Duration;

/// How long a fetched table is reused for identical parameters.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Distinct parameter sets kept at once.
pub const MAX_CACHED_TABLES: u64 = 64;

/// Normalized tables keyed by the full fetch parameters. Entries only leave by
/// expiry (or capacity); there is no manual invalidation.
pub type TransferCache = Cache<FetchParams, TransferTable>;

pub fn transfer_cache(ttl: Duration) -> TransferCache {
    Cache::builder()
        .max_capacity(MAX_CACHED_TABLES)
        .time_to_live(ttl)
        .build()
}
