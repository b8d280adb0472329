use crate::error::{Result, TokenflowError};
use crate::models::{Direction, NormalizedTransfer, RawTransferRecord, TransferTable, DISPLAY_TZ};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Fields every `tokentx` batch must carry.
pub const REQUIRED_FIELDS: [&str; 6] = ["timeStamp", "value", "tokenDecimal", "from", "to", "hash"];

/// Build the transfer table for `wallet` from raw explorer records.
///
/// The schema check is strict across the batch (a required field missing from
/// every record fails), while per-row numeric parsing is lenient: unparsable
/// values become 0.
pub fn normalize(raw: &[RawTransferRecord], wallet: &str) -> Result<TransferTable> {
    if raw.is_empty() {
        return Ok(TransferTable::default());
    }

    let columns = observed_columns(raw);
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !columns.iter().any(|c| c == *f))
        .map(|f| f.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TokenflowError::Schema {
            missing,
            columns,
            sample: serde_json::to_string(&raw[0])?,
        });
    }

    let wallet = wallet.trim().to_lowercase();
    let mut lenient = LenientCounts::default();
    let rows = raw
        .iter()
        .map(|record| normalize_record(record, &wallet, &mut lenient))
        .collect();
    lenient.report();

    Ok(TransferTable::new(rows, columns))
}

fn normalize_record(
    record: &RawTransferRecord,
    wallet: &str,
    lenient: &mut LenientCounts,
) -> NormalizedTransfer {
    let field = |key: &str| record.field(key).unwrap_or_default();

    // unparsable and out-of-range seconds both fall back to the epoch
    let timestamp = field("timeStamp")
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
        .unwrap_or_else(|| {
            lenient.timestamp += 1;
            DateTime::<Utc>::UNIX_EPOCH
        })
        .with_timezone(&DISPLAY_TZ);

    let token_decimal = field("tokenDecimal").trim().parse::<u32>().unwrap_or_else(|_| {
        lenient.decimals += 1;
        0
    });

    let value_raw = field("value").trim().to_string();
    let amount = scaled_amount(&value_raw, token_decimal).unwrap_or_else(|| {
        lenient.value += 1;
        0.0
    });

    let from = field("from");
    let to = field("to");
    let direction = if to.to_lowercase() == wallet {
        Direction::In
    } else {
        Direction::Out
    };
    let (signed_amount, counterparty) = match direction {
        Direction::In => (amount, from.clone()),
        Direction::Out => (-amount, to.clone()),
    };

    NormalizedTransfer {
        timestamp,
        hash: field("hash"),
        from,
        to,
        value_raw,
        token_decimal,
        amount,
        direction,
        signed_amount,
        counterparty,
        block_number: record.field("blockNumber").and_then(|b| b.trim().parse().ok()),
        token_symbol: record.field("tokenSymbol").filter(|s| !s.is_empty()),
    }
}

/// `value / 10^decimals`, or `None` when `value` is not an unsigned integer.
///
/// The division is done by the float parser on `"<value>e-<decimals>"` so
/// the result is correctly rounded even for values beyond 64 bits.
pub fn scaled_amount(value: &str, decimals: u32) -> Option<f64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("{}e-{}", value, decimals).parse::<f64>().ok()
}

// Field names in first-seen order across the whole batch.
fn observed_columns(raw: &[RawTransferRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in raw {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

#[derive(Default)]
struct LenientCounts {
    timestamp: usize,
    decimals: usize,
    value: usize,
}

impl LenientCounts {
    fn report(&self) {
        if self.decimals > 0 {
            // amounts of these rows are off by a factor of 10^decimals
            warn!(
                "{} record(s) had an unparsable tokenDecimal; treated as 0, amounts are unscaled",
                self.decimals
            );
        }
        if self.value > 0 {
            warn!("{} record(s) had an unparsable value; treated as 0", self.value);
        }
        if self.timestamp > 0 {
            warn!(
                "{} record(s) had an unparsable timeStamp; treated as the Unix epoch",
                self.timestamp
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const WALLET: &str = "0xAbCdEf0000000000000000000000000000000001";
    const OTHER: &str = "0x9999999999999999999999999999999999999999";

    fn raw(value: Value) -> RawTransferRecord {
        match value {
            Value::Object(map) => RawTransferRecord(map),
            other => panic!("not an object: {}", other),
        }
    }

    fn transfer(from: &str, to: &str, value: &str, decimals: &str) -> RawTransferRecord {
        raw(json!({
            "blockNumber": "51234567",
            "timeStamp": "1704067200",
            "hash": "0xfeed",
            "from": from,
            "to": to,
            "value": value,
            "tokenName": "JPY Coin",
            "tokenSymbol": "JPYC",
            "tokenDecimal": decimals
        }))
    }

    #[test]
    fn test_empty_input_is_empty_table() {
        let table = normalize(&[], WALLET).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_amount_and_direction() {
        let records = vec![
            transfer(OTHER, &WALLET.to_lowercase(), "100000000000000000000", "18"),
            transfer(WALLET, OTHER, "30500000", "6"),
        ];
        let table = normalize(&records, WALLET).unwrap();

        let incoming = &table.rows[0];
        assert_eq!(incoming.direction, Direction::In);
        assert!((incoming.amount - 100.0).abs() < 1e-9);
        assert!((incoming.signed_amount - 100.0).abs() < 1e-9);
        assert_eq!(incoming.counterparty, OTHER);
        assert_eq!(incoming.block_number, Some(51234567));
        assert_eq!(incoming.token_symbol.as_deref(), Some("JPYC"));

        let outgoing = &table.rows[1];
        assert_eq!(outgoing.direction, Direction::Out);
        assert!((outgoing.amount - 30.5).abs() < 1e-9);
        assert!((outgoing.signed_amount + 30.5).abs() < 1e-9);
        assert_eq!(outgoing.counterparty, OTHER);
    }

    #[test]
    fn test_direction_is_case_insensitive() {
        let upper_to = transfer(OTHER, &WALLET.to_uppercase().replace("0X", "0x"), "1", "0");
        let table = normalize(&[upper_to], &WALLET.to_lowercase()).unwrap();
        assert_eq!(table.rows[0].direction, Direction::In);
    }

    #[test]
    fn test_timestamp_in_display_zone() {
        // 2024-01-01T00:00:00Z is 09:00 in Tokyo
        let table = normalize(&[transfer(OTHER, WALLET, "1", "0")], WALLET).unwrap();
        let ts = table.rows[0].timestamp;
        assert_eq!(ts.to_rfc3339(), "2024-01-01T09:00:00+09:00");
        assert_eq!(table.rows[0].day().to_string(), "2024-01-01");
    }

    #[test]
    fn test_unparsable_numbers_default_to_zero() {
        let mut bad_decimals = transfer(OTHER, WALLET, "1500", "eighteen");
        let table = normalize(&[bad_decimals.clone()], WALLET).unwrap();
        assert_eq!(table.rows[0].token_decimal, 0);
        assert!((table.rows[0].amount - 1500.0).abs() < 1e-9);

        bad_decimals.0.insert("value".into(), json!("-5"));
        bad_decimals.0.insert("timeStamp".into(), json!("yesterday"));
        let table = normalize(&[bad_decimals], WALLET).unwrap();
        assert_eq!(table.rows[0].amount, 0.0);
        assert_eq!(table.rows[0].timestamp.timestamp(), 0);
    }

    #[test]
    fn test_numeric_json_fields_are_accepted() {
        let record = raw(json!({
            "timeStamp": 1704067200,
            "hash": "0x1",
            "from": OTHER,
            "to": WALLET,
            "value": 2500,
            "tokenDecimal": 2
        }));
        let table = normalize(&[record], WALLET).unwrap();
        assert!((table.rows[0].amount - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let record = raw(json!({
            "timeStamp": "1704067200",
            "hash": "0x1",
            "from": OTHER,
            "to": WALLET,
            "value": "1"
        }));
        match normalize(&[record], WALLET).unwrap_err() {
            TokenflowError::Schema { missing, columns, sample } => {
                assert_eq!(missing, vec!["tokenDecimal".to_string()]);
                assert_eq!(columns.len(), 5);
                assert!(sample.contains("0x1"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_field_missing_from_some_rows_only_is_lenient() {
        let complete = transfer(OTHER, WALLET, "10", "0");
        let partial = raw(json!({"hash": "0x2", "to": WALLET}));
        let table = normalize(&[complete, partial], WALLET).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].amount, 0.0);
        assert_eq!(table.rows[1].direction, Direction::In);
        assert_eq!(table.rows[1].counterparty, "");
    }

    #[test]
    fn test_scaled_amount() {
        assert_eq!(scaled_amount("1000000", 6), Some(1.0));
        assert_eq!(scaled_amount("123", 0), Some(123.0));
        assert_eq!(scaled_amount("", 6), None);
        assert_eq!(scaled_amount("12.5", 0), None);
        // far beyond u64
        let huge = scaled_amount("123456789012345678901234567890", 18).unwrap();
        assert!((huge - 123456789012.34567890).abs() / huge < 1e-12);
    }

    #[test]
    fn test_out_of_range_timestamp_is_counted() {
        let mut bad = transfer(OTHER, WALLET, "1", "0");
        bad.0.insert("timeStamp".to_string(), json!(i64::MAX.to_string()));
        let mut garbled = transfer(OTHER, WALLET, "1", "0");
        garbled.0.insert("timeStamp".to_string(), json!("yesterday"));

        let mut lenient = LenientCounts::default();
        let wallet = WALLET.to_lowercase();
        let row = normalize_record(&bad, &wallet, &mut lenient);
        normalize_record(&garbled, &wallet, &mut lenient);
        normalize_record(&transfer(OTHER, WALLET, "1", "0"), &wallet, &mut lenient);

        assert_eq!(row.timestamp.timestamp(), 0);
        assert_eq!(lenient.timestamp, 2);
    }

    #[test]
    fn test_amounts_never_negative() {
        let records: Vec<RawTransferRecord> = (0..20)
            .map(|i| {
                let to = if i % 2 == 0 { WALLET } else { OTHER };
                transfer(OTHER, to, &(i * 1_000).to_string(), &(i % 7).to_string())
            })
            .collect();
        let table = normalize(&records, WALLET).unwrap();
        for row in table.iter() {
            assert!(row.amount >= 0.0);
            match row.direction {
                Direction::In => assert_eq!(row.signed_amount, row.amount),
                Direction::Out => assert_eq!(row.signed_amount, -row.amount),
            }
        }
    }
}
