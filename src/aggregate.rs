use crate::models::{
    CounterpartyTotal, DailyInOut, DailyNet, Direction, Totals, TransferTable,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DEFAULT_TOP_N: usize = 20;

pub fn totals(table: &TransferTable) -> Totals {
    let mut totals = Totals {
        count: table.len(),
        ..Totals::default()
    };
    for row in table.iter() {
        match row.direction {
            Direction::In => totals.total_in += row.amount,
            Direction::Out => totals.total_out += row.amount,
        }
    }
    totals.net = totals.total_in - totals.total_out;
    totals
}

/// Rows whose display-zone date lies in `start..=end`. Row order is kept.
pub fn filter_by_date(table: &TransferTable, start: NaiveDate, end: NaiveDate) -> TransferTable {
    let rows = table
        .iter()
        .filter(|row| {
            let day = row.day();
            day >= start && day <= end
        })
        .cloned()
        .collect();
    TransferTable::new(rows, table.columns.clone())
}

/// Net signed flow per day, ascending. Days without transfers are absent.
pub fn daily_net(table: &TransferTable) -> Vec<DailyNet> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in table.iter() {
        *by_day.entry(row.day()).or_insert(0.0) += row.signed_amount;
    }
    by_day
        .into_iter()
        .map(|(day, net)| DailyNet { day, net })
        .collect()
}

/// Inflow and outflow per day, ascending. A direction with no transfers on a
/// given day reads 0.
pub fn daily_inout(table: &TransferTable) -> Vec<DailyInOut> {
    let mut by_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in table.iter() {
        let entry = by_day.entry(row.day()).or_insert((0.0, 0.0));
        match row.direction {
            Direction::In => entry.0 += row.amount,
            Direction::Out => entry.1 += row.amount,
        }
    }
    by_day
        .into_iter()
        .map(|(day, (inflow, outflow))| DailyInOut { day, inflow, outflow })
        .collect()
}

/// Counterparties ranked by summed amount, largest first, at most `n`.
/// Ties keep grouping order (ascending address).
pub fn top_counterparties(table: &TransferTable, n: usize) -> Vec<CounterpartyTotal> {
    let mut by_counterparty: BTreeMap<&str, f64> = BTreeMap::new();
    for row in table.iter() {
        *by_counterparty.entry(row.counterparty.as_str()).or_insert(0.0) += row.amount;
    }

    let mut ranked: Vec<CounterpartyTotal> = by_counterparty
        .into_iter()
        .map(|(counterparty, amount)| CounterpartyTotal {
            counterparty: counterparty.to_string(),
            amount,
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    ranked.truncate(n);
    ranked
}
