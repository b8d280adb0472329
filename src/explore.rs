//! Line-oriented exploration of one wallet. Every command reloads the table
//! through the session, so repeats inside the cache window stay offline.

use crate::aggregate::filter_by_date;
use crate::error::{Result, TokenflowError};
use crate::export::export_csv;
use crate::models::FetchParams;
use crate::report::{render_report, resolve_range, ReportOptions};
use crate::session::Session;
use crate::transactions::PageSource;
use chrono::NaiveDate;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

pub const HELP: &str = "\
Commands:
  show                     render the report for the current range
  range <start> <end>      restrict to dates (YYYY-MM-DD, inclusive)
  all                      clear the date range
  top <n>                  number of counterparties to rank
  limit <n>                rows in the transfer list (0 hides it)
  export <path>            write the current range as CSV
  help                     this text
  quit                     leave
";

#[derive(Debug, Clone, PartialEq)]
pub enum ExploreCommand {
    Show,
    Range(NaiveDate, NaiveDate),
    All,
    Top(usize),
    Limit(usize),
    Export(PathBuf),
    Help,
    Quit,
}

impl ExploreCommand {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        let command = match (cmd.to_lowercase().as_str(), args.as_slice()) {
            ("show", []) => ExploreCommand::Show,
            ("range", [start, end]) => ExploreCommand::Range(parse_date(start)?, parse_date(end)?),
            ("all", []) => ExploreCommand::All,
            ("top", [n]) => ExploreCommand::Top(parse_count(n)?),
            ("limit", [n]) => ExploreCommand::Limit(parse_count(n)?),
            ("export", [path]) => ExploreCommand::Export(PathBuf::from(path)),
            ("help", _) | ("?", _) => ExploreCommand::Help,
            ("quit", _) | ("exit", _) | ("q", _) => ExploreCommand::Quit,
            _ => {
                return Err(TokenflowError::invalid_input(format!(
                    "Unrecognised command '{}'. Type 'help' for the list.",
                    line.trim()
                )))
            }
        };
        Ok(Some(command))
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| TokenflowError::invalid_input(format!("Bad date '{}': {}", s, e)))
}

fn parse_count(s: &str) -> Result<usize> {
    s.parse::<usize>()
        .map_err(|_| TokenflowError::invalid_input(format!("Expected a whole number, got '{}'", s)))
}

/// Read commands from `input` until `quit` or end of input.
pub async fn run_explore<S, R, W>(
    session: &mut Session<S>,
    params: &FetchParams,
    mut opts: ReportOptions,
    input: R,
    mut output: W,
) -> Result<()>
where
    S: PageSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    write!(output, "{}> ", HELP)?;
    output.flush()?;

    while let Some(line) = lines.next_line().await? {
        let command = match ExploreCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                write!(output, "> ")?;
                output.flush()?;
                continue;
            }
            Err(e) => {
                writeln!(output, "{}", e)?;
                write!(output, "> ")?;
                output.flush()?;
                continue;
            }
        };

        match command {
            ExploreCommand::Quit => break,
            ExploreCommand::Help => write!(output, "{}", HELP)?,
            ExploreCommand::All => {
                opts.start = None;
                opts.end = None;
                writeln!(output, "Date range cleared")?;
            }
            ExploreCommand::Range(start, end) => {
                opts.start = Some(start);
                opts.end = Some(end);
                writeln!(output, "Date range set to {} .. {}", start, end)?;
            }
            ExploreCommand::Top(n) => {
                opts.top_n = n;
                writeln!(output, "Ranking top {}", n)?;
            }
            ExploreCommand::Limit(n) => {
                opts.limit = n;
                writeln!(output, "Listing up to {} transfers", n)?;
            }
            ExploreCommand::Show => match session.load(params).await {
                Ok(table) => match render_report(&table, &opts) {
                    Ok(text) => write!(output, "{}", text)?,
                    Err(e) => writeln!(output, "{}", e)?,
                },
                Err(e) => {
                    warn!("Fetch failed: {}", e);
                    writeln!(output, "Fetch failed: {}", e)?;
                }
            },
            ExploreCommand::Export(path) => {
                let written = export_range(session, params, &opts, &path).await;
                match written {
                    Ok(0) => writeln!(output, "Nothing to export for this range")?,
                    Ok(n) => writeln!(output, "Exported {} rows to {}", n, path.display())?,
                    Err(e) => writeln!(output, "Export failed: {}", e)?,
                }
            }
        }
        write!(output, "> ")?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}

async fn export_range<S: PageSource>(
    session: &mut Session<S>,
    params: &FetchParams,
    opts: &ReportOptions,
    path: &std::path::Path,
) -> Result<usize> {
    let table = session.load(params).await?;
    if table.is_empty() {
        return Ok(0);
    }
    let (start, end) = resolve_range(&table, opts.start, opts.end)?;
    let filtered = filter_by_date(&table, start, end);
    if filtered.is_empty() {
        return Ok(0);
    }
    export_csv(&filtered, path)?;
    Ok(filtered.len())
}
