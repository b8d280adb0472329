use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

/// Time zone every timestamp and calendar day is expressed in.
pub const DISPLAY_TZ: Tz = chrono_tz::Asia::Tokyo;

// Explorer models

/// One `tokentx` entry exactly as the explorer returned it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawTransferRecord(pub Map<String, Value>);

impl RawTransferRecord {
    /// Field as text. Numbers are rendered, null and nested values are treated as absent.
    pub fn field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Everything that determines the outcome of one paginated fetch.
/// Also the memoization key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub chain_id: u64,
    pub contract: String,
    pub address: String,
    pub api_key: String,
    pub page_size: u32,
    pub sort: SortOrder,
    pub max_pages: u32,
    pub delay: Duration,
}

impl fmt::Debug for FetchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchParams")
            .field("chain_id", &self.chain_id)
            .field("contract", &self.contract)
            .field("address", &self.address)
            .field("api_key", &"***")
            .field("page_size", &self.page_size)
            .field("sort", &self.sort)
            .field("max_pages", &self.max_pages)
            .field("delay", &self.delay)
            .finish()
    }
}

// Normalized models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "IN"),
            Direction::Out => write!(f, "OUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransfer {
    pub timestamp: DateTime<Tz>,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value_raw: String,
    pub token_decimal: u32,
    pub amount: f64,
    pub direction: Direction,
    pub signed_amount: f64,
    pub counterparty: String,
    pub block_number: Option<u64>,
    pub token_symbol: Option<String>,
}

impl NormalizedTransfer {
    /// Calendar day in the display time zone.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Transfers in fetch order. Never re-sorted by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferTable {
    pub rows: Vec<NormalizedTransfer>,
    /// Field names observed in the raw payload, in first-seen order.
    pub columns: Vec<String>,
}

impl TransferTable {
    pub fn new(rows: Vec<NormalizedTransfer>, columns: Vec<String>) -> Self {
        Self { rows, columns }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedTransfer> {
        self.rows.iter()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Tz>> {
        self.rows.iter().map(|r| r.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Tz>> {
        self.rows.iter().map(|r| r.timestamp).max()
    }
}

// Aggregate models

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub total_in: f64,
    pub total_out: f64,
    pub net: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyNet {
    pub day: NaiveDate,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyInOut {
    pub day: NaiveDate,
    pub inflow: f64,
    pub outflow: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyTotal {
    pub counterparty: String,
    pub amount: f64,
}

// Export models
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferOutputRecord {
    pub timestamp: String,
    pub block_number: Option<u64>,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub token_symbol: Option<String>,
    pub value_raw: String,
    pub token_decimal: u32,
    pub amount: f64,
    pub direction: Direction,
    pub signed_amount: f64,
    pub counterparty: String,
}
