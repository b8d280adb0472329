// Terminal rendering of the aggregates: KPI block, daily series, counterparty
// ranking and the transaction list.

use crate::aggregate::{daily_inout, daily_net, filter_by_date, top_counterparties, totals};
use crate::error::{Result, TokenflowError};
use crate::models::{
    CounterpartyTotal, DailyInOut, DailyNet, Direction, Totals, TransferTable,
};
use chrono::NaiveDate;
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub top_n: usize,
    /// Rows of the transaction list; 0 hides it.
    pub limit: usize,
    pub debug: bool,
}

/// `0x1234...abcd`. Strings shorter than `head + tail` are returned as is.
pub fn shorten(addr: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = addr.chars().collect();
    if chars.len() < head + tail {
        return addr.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}...{}", start, end)
}

/// Two decimals with thousands separators, e.g. `-1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Inclusive date range, defaulting to the span of the table.
pub fn resolve_range(
    table: &TransferTable,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate)> {
    let first = table.first_timestamp().map(|t| t.date_naive());
    let last = table.last_timestamp().map(|t| t.date_naive());

    let start = start.or(first).unwrap_or(NaiveDate::MIN);
    let end = end.or(last).unwrap_or(NaiveDate::MAX);
    if start > end {
        return Err(TokenflowError::invalid_input(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }
    Ok((start, end))
}

fn token_label(table: &TransferTable) -> String {
    table
        .iter()
        .find_map(|r| r.token_symbol.clone())
        .unwrap_or_else(|| "tokens".to_string())
}

pub fn render_report(table: &TransferTable, opts: &ReportOptions) -> Result<String> {
    let mut out = String::new();

    if table.is_empty() {
        out.push_str("No transfers found. Check that the address, chain and contract match.\n");
        return Ok(out);
    }

    let symbol = token_label(table);
    if opts.debug {
        out.push_str(&render_debug(table));
    }
    out.push_str(&render_kpis(&totals(table), &symbol));

    let (start, end) = resolve_range(table, opts.start, opts.end)?;
    let filtered = filter_by_date(table, start, end);
    let _ = writeln!(out, "\nPeriod: {} .. {}", start, end);
    if filtered.is_empty() {
        out.push_str("No transfers in this period.\n");
        return Ok(out);
    }

    out.push_str(&render_daily_net(&daily_net(&filtered)));
    out.push_str(&render_daily_inout(&daily_inout(&filtered)));
    out.push_str(&render_top(&top_counterparties(&filtered, opts.top_n), opts.top_n));
    if opts.limit > 0 {
        out.push_str(&render_transactions(&filtered, opts.limit));
    }
    Ok(out)
}

pub fn render_debug(table: &TransferTable) -> String {
    let mut out = String::from("== Debug ==\n");
    let _ = writeln!(out, "Rows fetched: {}", table.len());
    if let (Some(first), Some(last)) = (table.first_timestamp(), table.last_timestamp()) {
        let _ = writeln!(out, "Period: {} .. {}", first.to_rfc3339(), last.to_rfc3339());
    }
    let _ = writeln!(out, "Columns: {}", table.columns.join(", "));
    out.push('\n');
    out
}

pub fn render_kpis(totals: &Totals, symbol: &str) -> String {
    let mut out = String::from("== KPI ==\n");
    let _ = writeln!(out, "Total IN ({}):  {:>20}", symbol, format_amount(totals.total_in));
    let _ = writeln!(out, "Total OUT ({}): {:>20}", symbol, format_amount(totals.total_out));
    let _ = writeln!(out, "Net ({}):       {:>20}", symbol, format_amount(totals.net));
    let _ = writeln!(out, "Transfers:      {:>20}", totals.count);
    out
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let len = ((value.abs() / max) * BAR_WIDTH as f64).round() as usize;
    let c = if value < 0.0 { '-' } else { '+' };
    std::iter::repeat(c).take(len.min(BAR_WIDTH)).collect()
}

pub fn render_daily_net(daily: &[DailyNet]) -> String {
    let mut out = String::from("\n== Daily net flow ==\n");
    let max = daily.iter().map(|d| d.net.abs()).fold(0.0, f64::max);
    for d in daily {
        let _ = writeln!(out, "{}  {:>18}  {}", d.day, format_amount(d.net), bar(d.net, max));
    }
    out
}

pub fn render_daily_inout(daily: &[DailyInOut]) -> String {
    let mut out = String::from("\n== Daily IN / OUT ==\n");
    let _ = writeln!(out, "{:<10}  {:>18}  {:>18}", "date", "IN", "OUT");
    for d in daily {
        let _ = writeln!(
            out,
            "{}  {:>18}  {:>18}",
            d.day,
            format_amount(d.inflow),
            format_amount(d.outflow)
        );
    }
    out
}

pub fn render_top(top: &[CounterpartyTotal], n: usize) -> String {
    let mut out = format!("\n== Top {} counterparties ==\n", n);
    let max = top.first().map(|c| c.amount).unwrap_or(0.0);
    for (rank, c) in top.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<13}  {:>18}  {}",
            rank + 1,
            shorten(&c.counterparty, 6, 4),
            format_amount(c.amount),
            bar(c.amount, max)
        );
    }
    out
}

/// Newest first, at most `limit` rows.
pub fn render_transactions(table: &TransferTable, limit: usize) -> String {
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut out = String::from("\n== Transfers (newest first) ==\n");
    let _ = writeln!(
        out,
        "{:<25}  {:<3}  {:>18}  {:<13}  {:<13}  {}",
        "timestamp", "dir", "amount", "from", "to", "hash"
    );
    for r in rows.iter().take(limit) {
        let dir = match r.direction {
            Direction::In => "IN",
            Direction::Out => "OUT",
        };
        let _ = writeln!(
            out,
            "{:<25}  {:<3}  {:>18}  {:<13}  {:<13}  {}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            dir,
            format_amount(r.amount),
            shorten(&r.from, 6, 4),
            shorten(&r.to, 6, 4),
            shorten(&r.hash, 10, 6)
        );
    }
    if rows.len() > limit {
        let _ = writeln!(out, "... {} more", rows.len() - limit);
    }
    out
}
