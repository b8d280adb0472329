use crate::cache::{transfer_cache, TransferCache};
use crate::error::Result;
use crate::models::{FetchParams, TransferTable};
use crate::normalize::normalize;
use crate::transactions::{fetch_all, PageSource};
use std::time::Duration;
use tracing::debug;

/// Fetch-and-normalize front end that memoizes tables for a short window,
/// so repeated renders with identical parameters do not hit the explorer.
pub struct Session<S> {
    source: S,
    cache: TransferCache,
}

impl<S: PageSource> Session<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            cache: transfer_cache(ttl),
        }
    }

    /// Table for `params`. Failures are never cached.
    pub async fn load(&mut self, params: &FetchParams) -> Result<TransferTable> {
        if let Some(table) = self.cache.get(params) {
            debug!("Cache hit for {:?}", params);
            return Ok(table);
        }

        let raw = fetch_all(&self.source, params).await?;
        let table = normalize(&raw, &params.address)?;
        self.cache.insert(params.clone(), table.clone());
        debug!("Cached table of {} rows", table.len());

        Ok(table)
    }
}
