use crate::error::Result;
use crate::models::{NormalizedTransfer, TransferOutputRecord, TransferTable};
use std::io;
use std::path::Path;
use tracing::info;

pub const DEFAULT_EXPORT_PATH: &str = "jpyc_tokentx.csv";

impl From<&NormalizedTransfer> for TransferOutputRecord {
    fn from(row: &NormalizedTransfer) -> Self {
        TransferOutputRecord {
            timestamp: row.timestamp.to_rfc3339(),
            block_number: row.block_number,
            hash: row.hash.clone(),
            from: row.from.clone(),
            to: row.to.clone(),
            token_symbol: row.token_symbol.clone(),
            value_raw: row.value_raw.clone(),
            token_decimal: row.token_decimal,
            amount: row.amount,
            direction: row.direction,
            signed_amount: row.signed_amount,
            counterparty: row.counterparty.clone(),
        }
    }
}

/// Write `table` as UTF-8 CSV with a header row, one line per transfer.
pub fn write_csv<W: io::Write>(table: &TransferTable, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for row in table.iter() {
        wtr.serialize(TransferOutputRecord::from(row))?;
    }

    // serialize only emits the header with the first record
    if table.is_empty() {
        wtr.write_record(HEADERS)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_csv(table: &TransferTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(table, file)?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Parse an exported CSV back into records.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<TransferOutputRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

const HEADERS: [&str; 12] = [
    "timestamp",
    "block_number",
    "hash",
    "from",
    "to",
    "token_symbol",
    "value_raw",
    "token_decimal",
    "amount",
    "direction",
    "signed_amount",
    "counterparty",
];
