use crate::error::{Result, TokenflowError};
use crate::models::SortOrder;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/v2/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of `tokentx` for a wallet/contract pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub chain_id: u64,
    pub contract: String,
    pub address: String,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortOrder,
}

/// Thin client over the Etherscan V2 unified endpoint. It never interprets
/// the body; that is left to `response::classify`.
pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExplorerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport(&base_url))?;
        Ok(Self { client, base_url })
    }

    /// Fetch one `tokentx` page. Returns the decoded body and the resolved URL
    /// with the API key redacted.
    pub async fn tokentx(&self, query: &PageQuery, api_key: &str) -> Result<(Value, String)> {
        self.get(&tokentx_params(query, api_key)).await
    }

    /// Lightweight `tokenbalance` call, used as a connectivity check.
    pub async fn token_balance(
        &self,
        chain_id: u64,
        contract: &str,
        address: &str,
        api_key: &str,
    ) -> Result<(Value, String)> {
        self.get(&tokenbalance_params(chain_id, contract, address, api_key))
            .await
    }

    async fn get(&self, params: &[(&'static str, String)]) -> Result<(Value, String)> {
        let request = self
            .client
            .get(&self.base_url)
            .query(params)
            .build()
            .map_err(transport(&self.base_url))?;
        let url = redact_url(request.url());

        debug!("GET {}", url);
        let response = self
            .client
            .execute(request)
            .await
            .map_err(transport(&url))?;

        debug!("Response status: {}", response.status());
        let response = response.error_for_status().map_err(transport(&url))?;
        let body = response.json::<Value>().await.map_err(transport(&url))?;

        Ok((body, url))
    }
}

fn transport(url: &str) -> impl FnOnce(reqwest::Error) -> TokenflowError + '_ {
    move |source| TokenflowError::Transport {
        url: url.to_string(),
        // reqwest embeds the full URL, API key included
        source: source.without_url(),
    }
}

pub(crate) fn tokentx_params(query: &PageQuery, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("chainid", query.chain_id.to_string()),
        ("module", "account".to_string()),
        ("action", "tokentx".to_string()),
        ("contractaddress", query.contract.clone()),
        ("address", query.address.clone()),
        ("page", query.page.to_string()),
        ("offset", query.page_size.to_string()),
        ("sort", query.sort.as_str().to_string()),
        ("apikey", api_key.to_string()),
    ]
}

pub(crate) fn tokenbalance_params(
    chain_id: u64,
    contract: &str,
    address: &str,
    api_key: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("chainid", chain_id.to_string()),
        ("module", "account".to_string()),
        ("action", "tokenbalance".to_string()),
        ("contractaddress", contract.to_string()),
        ("address", address.to_string()),
        ("tag", "latest".to_string()),
        ("apikey", api_key.to_string()),
    ]
}

/// Replace the `apikey` query value so URLs can be logged and shown.
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "apikey" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> PageQuery {
        PageQuery {
            chain_id: 137,
            contract: "0xe7c3d8c9a439fede00d2600032d5db0be71c3c29".to_string(),
            address: "0x1111111111111111111111111111111111111111".to_string(),
            page: 3,
            page_size: 200,
            sort: SortOrder::Desc,
        }
    }

    #[test]
    fn test_tokentx_params() {
        let params = tokentx_params(&query(), "secret");
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("chainid"), Some("137"));
        assert_eq!(get("module"), Some("account"));
        assert_eq!(get("action"), Some("tokentx"));
        assert_eq!(get("page"), Some("3"));
        assert_eq!(get("offset"), Some("200"));
        assert_eq!(get("sort"), Some("desc"));
        assert_eq!(get("apikey"), Some("secret"));
    }

    #[test]
    fn test_tokenbalance_params() {
        let params = tokenbalance_params(1, "0xabc", "0xdef", "k");
        assert!(params.contains(&("action", "tokenbalance".to_string())));
        assert!(params.contains(&("tag", "latest".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "page"));
    }

    #[test]
    fn test_redact_url_hides_api_key() {
        let url = Url::parse_with_params(
            DEFAULT_BASE_URL,
            &[("chainid", "137"), ("apikey", "supersecret"), ("page", "1")],
        )
        .unwrap();
        let redacted = redact_url(&url);
        assert!(!redacted.contains("supersecret"));
        assert!(redacted.contains("apikey=***"));
        assert!(redacted.contains("chainid=137"));
        assert!(redacted.contains("page=1"));
    }

    #[test]
    fn test_redact_url_without_query() {
        let url = Url::parse(DEFAULT_BASE_URL).unwrap();
        assert_eq!(redact_url(&url), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_builds() {
        assert!(ExplorerClient::new(DEFAULT_BASE_URL).is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let client = ExplorerClient::new("http://127.0.0.1:1/api").unwrap();
        let err = client.tokentx(&query(), "supersecret").await.unwrap_err();

        match &err {
            TokenflowError::Transport { url, .. } => {
                assert!(url.contains("apikey=***"));
                assert!(!url.contains("supersecret"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
        let text = err.to_string();
        assert!(text.contains("apikey=***"));
        assert!(!text.contains("supersecret"));
        assert!(!format!("{:?}", err).contains("supersecret"));
    }
}
