use crate::error::Result;
use crate::explorer::ExplorerClient;
use crate::response::ResponseDetail;
use serde_json::Value;
use tracing::{info, warn};

/// Outcome of a `tokenbalance` connectivity check. Transport failures are
/// errors; an API-level failure is reported in `detail` so the caller can
/// still show the body.
#[derive(Debug)]
pub struct BalanceCheck {
    pub url: String,
    pub body: Value,
    pub detail: ResponseDetail,
}

impl BalanceCheck {
    pub fn from_response(body: Value, url: String) -> Self {
        let detail = ResponseDetail::from_body(&body);
        Self { url, body, detail }
    }

    pub fn is_ok(&self) -> bool {
        !self.detail.is_failure()
    }

    /// Raw integer balance, when the explorer returned one.
    pub fn raw_balance(&self) -> Option<&str> {
        if !self.is_ok() {
            return None;
        }
        self.body
            .get("result")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
    }
}

pub async fn check_token_balance(
    client: &ExplorerClient,
    chain_id: u64,
    contract: &str,
    address: &str,
    api_key: &str,
) -> Result<BalanceCheck> {
    info!("Checking tokenbalance for {} on chain {}", address, chain_id);
    let (body, url) = client
        .token_balance(chain_id, contract, address, api_key)
        .await?;

    let check = BalanceCheck::from_response(body, url);
    if check.is_ok() {
        info!("tokenbalance reachable");
    } else {
        warn!("tokenbalance reported failure: {}", check.detail);
    }
    Ok(check)
}
