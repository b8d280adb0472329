use crate::error::Result;
use crate::explorer::{ExplorerClient, PageQuery};
use crate::models::{FetchParams, RawTransferRecord};
use crate::response::{classify, PageOutcome};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Anything that can serve one `tokentx` page as (body, resolved url).
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery, api_key: &str) -> Result<(Value, String)>;
}

#[async_trait]
impl PageSource for ExplorerClient {
    async fn fetch_page(&self, query: &PageQuery, api_key: &str) -> Result<(Value, String)> {
        self.tokentx(query, api_key).await
    }
}

/// Walk `tokentx` pages until a short page, an empty result, or the page
/// ceiling. Any API or shape error aborts the whole fetch. A ceiling of 0
/// issues no request.
pub async fn fetch_all<S>(source: &S, params: &FetchParams) -> Result<Vec<RawTransferRecord>>
where
    S: PageSource + ?Sized,
{
    let mut records: Vec<RawTransferRecord> = Vec::new();
    if params.max_pages == 0 {
        return Ok(records);
    }
    let mut page = 1;

    loop {
        let query = PageQuery {
            chain_id: params.chain_id,
            contract: params.contract.clone(),
            address: params.address.clone(),
            page,
            page_size: params.page_size,
            sort: params.sort,
        };

        let (body, url) = source.fetch_page(&query, &params.api_key).await?;

        match classify(&body) {
            PageOutcome::Page(batch) => {
                let fetched = batch.len();
                records.extend(batch);
                debug!(page, fetched, total = records.len(), "Fetched page");

                if fetched < params.page_size as usize {
                    break;
                }

                page += 1;
                if page > params.max_pages {
                    info!(
                        "Stopped at the page ceiling ({} pages); older transfers were not fetched",
                        params.max_pages
                    );
                    break;
                }

                if !params.delay.is_zero() {
                    tokio::time::sleep(params.delay).await;
                }
            }
            PageOutcome::EmptyFinal => {
                if page == 1 {
                    info!("No transactions found for {}", params.address);
                } else {
                    debug!(page, "Explorer reported no further transactions");
                }
                break;
            }
            PageOutcome::ApiError(detail) => return Err(detail.into_api_error(&url)),
            PageOutcome::MalformedShape(detail) => return Err(detail.into_shape_error(&url)),
        }
    }

    info!("Fetched {} transfer records", records.len());
    Ok(records)
}
