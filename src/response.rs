//! Classification of explorer response bodies.
//!
//! The explorer reports success, "nothing found" and failure through the same
//! `result` field with a different JSON type each time. [`classify`] turns
//! that into a closed set of outcomes before any business logic sees it.

use crate::error::TokenflowError;
use crate::models::RawTransferRecord;
use serde_json::Value;
use std::fmt;

/// Substring the explorer uses in `result` when a wallet has no transfers.
pub const EMPTY_SENTINEL: &str = "No transactions";

/// Status, message and raw result of a response, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDetail {
    pub status: String,
    pub message: String,
    pub result: String,
}

impl ResponseDetail {
    pub fn from_body(body: &Value) -> Self {
        Self {
            status: text_of(body.get("status")),
            message: text_of(body.get("message")),
            result: text_of(body.get("result")),
        }
    }

    /// The explorer flags failures with `status == "0"`.
    pub fn is_failure(&self) -> bool {
        self.status == "0"
    }

    pub fn into_api_error(self, url: &str) -> TokenflowError {
        TokenflowError::Api {
            status: self.status,
            message: self.message,
            result: self.result,
            url: url.to_string(),
        }
    }

    pub fn into_shape_error(self, url: &str) -> TokenflowError {
        TokenflowError::UnexpectedShape {
            status: self.status,
            message: self.message,
            result: self.result,
            url: url.to_string(),
        }
    }
}

impl fmt::Display for ResponseDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} message={} result={}",
            self.status, self.message, self.result
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Non-empty list of transfer records.
    Page(Vec<RawTransferRecord>),
    /// Wallet has no (more) transfers. Not an error.
    EmptyFinal,
    ApiError(ResponseDetail),
    MalformedShape(ResponseDetail),
}

pub fn classify(body: &Value) -> PageOutcome {
    match body.get("result") {
        None | Some(Value::Null) => PageOutcome::ApiError(ResponseDetail::from_body(body)),
        Some(Value::String(s)) if s.contains(EMPTY_SENTINEL) => PageOutcome::EmptyFinal,
        Some(Value::String(_)) => PageOutcome::ApiError(ResponseDetail::from_body(body)),
        Some(Value::Array(items)) if items.is_empty() => PageOutcome::EmptyFinal,
        Some(Value::Array(items)) => match records_of(items) {
            Some(records) => PageOutcome::Page(records),
            None => PageOutcome::MalformedShape(ResponseDetail::from_body(body)),
        },
        Some(_) => PageOutcome::MalformedShape(ResponseDetail::from_body(body)),
    }
}

// Every list element must be an object; anything else is a shape error.
fn records_of(items: &[Value]) -> Option<Vec<RawTransferRecord>> {
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => Some(RawTransferRecord(map.clone())),
            _ => None,
        })
        .collect()
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_empty_list_is_page() {
        let body = json!({
            "status": "1",
            "message": "OK",
            "result": [{"hash": "0x1"}, {"hash": "0x2"}]
        });
        match classify(&body) {
            PageOutcome::Page(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[1].field("hash").as_deref(), Some("0x2"));
            }
            other => panic!("expected page, got {:?}", other),
        }
    }

    #[test]
    fn test_no_transactions_sentinel_is_empty_final() {
        let body = json!({
            "status": "0",
            "message": "No transactions found",
            "result": "No transactions found"
        });
        assert_eq!(classify(&body), PageOutcome::EmptyFinal);
    }

    #[test]
    fn test_empty_list_is_empty_final() {
        let body = json!({"status": "1", "message": "OK", "result": []});
        assert_eq!(classify(&body), PageOutcome::EmptyFinal);
    }

    #[test]
    fn test_error_string_is_api_error() {
        let body = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        });
        match classify(&body) {
            PageOutcome::ApiError(detail) => {
                assert_eq!(detail.status, "0");
                assert_eq!(detail.message, "NOTOK");
                assert_eq!(detail.result, "Invalid API Key");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_or_missing_result_is_api_error() {
        let null = json!({"status": "0", "message": "NOTOK", "result": null});
        assert!(matches!(classify(&null), PageOutcome::ApiError(_)));

        let missing = json!({"status": "0", "message": "NOTOK"});
        match classify(&missing) {
            PageOutcome::ApiError(detail) => assert_eq!(detail.result, "None"),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_types_are_malformed() {
        let number = json!({"status": "1", "message": "OK", "result": 42});
        assert!(matches!(classify(&number), PageOutcome::MalformedShape(_)));

        let object = json!({"status": "1", "message": "OK", "result": {"a": 1}});
        assert!(matches!(classify(&object), PageOutcome::MalformedShape(_)));

        let list_of_strings = json!({"status": "1", "message": "OK", "result": ["x"]});
        assert!(matches!(
            classify(&list_of_strings),
            PageOutcome::MalformedShape(_)
        ));
    }

    #[test]
    fn test_detail_errors_carry_url() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"});
        let detail = match classify(&body) {
            PageOutcome::ApiError(detail) => detail,
            other => panic!("expected api error, got {:?}", other),
        };
        assert!(detail.is_failure());
        assert_eq!(
            detail.to_string(),
            "status=0 message=NOTOK result=Max rate limit reached"
        );
        match detail.into_api_error("https://example.test/api?apikey=***") {
            TokenflowError::Api { result, url, .. } => {
                assert_eq!(result, "Max rate limit reached");
                assert!(url.contains("apikey=***"));
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }
}
