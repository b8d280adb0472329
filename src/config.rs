use crate::error::{Result, TokenflowError};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const API_KEY_VAR: &str = "ETHERSCAN_API_KEY";
pub const SECRETS_PATH_VAR: &str = "TOKENFLOW_SECRETS";
pub const DEFAULT_SECRETS_PATH: &str = ".tokenflow/secrets.toml";

pub const PAGE_SIZE_MIN: u32 = 10;
pub const PAGE_SIZE_MAX: u32 = 1000;
pub const DEFAULT_PAGE_SIZE: u32 = 200;
pub const MAX_PAGES_MIN: u32 = 1;
pub const MAX_PAGES_MAX: u32 = 50;
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DELAY_MAX_SECS: f64 = 1.0;
pub const DEFAULT_DELAY_SECS: f64 = 0.25;

/// Resolve the explorer API key: secrets file first, then the environment.
pub fn resolve_api_key() -> Result<String> {
    let secrets_path =
        env::var(SECRETS_PATH_VAR).unwrap_or_else(|_| DEFAULT_SECRETS_PATH.to_string());
    resolve_api_key_from(Path::new(&secrets_path), env::var(API_KEY_VAR).ok())
}

fn resolve_api_key_from(secrets_path: &Path, env_value: Option<String>) -> Result<String> {
    if let Some(key) = read_secret(secrets_path) {
        debug!("API key resolved from secrets file {}", secrets_path.display());
        return Ok(key);
    }

    if let Some(key) = env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        debug!("API key resolved from {}", API_KEY_VAR);
        return Ok(key);
    }

    Err(TokenflowError::configuration(format!(
        "{} not found. Put it in .env, export it, or add it to {}",
        API_KEY_VAR,
        secrets_path.display()
    )))
}

// A missing or unreadable secrets file falls through to the environment.
fn read_secret(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => {
            warn!("Ignoring malformed secrets file {}: {}", path.display(), e);
            return None;
        }
    };
    table
        .get(API_KEY_VAR)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `0x` followed by exactly 40 hex digits. Surrounding whitespace is ignored.
pub fn is_valid_address(addr: &str) -> bool {
    let addr = addr.trim();
    match addr.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Trimmed address, or `InvalidInput` naming what was being validated.
pub fn validate_address(addr: &str, what: &str) -> Result<String> {
    if !is_valid_address(addr) {
        return Err(TokenflowError::invalid_input(format!(
            "{} '{}' is not a valid address (expected 0x followed by 40 hex characters)",
            what,
            addr.trim()
        )));
    }
    Ok(addr.trim().to_string())
}

/// Check paging settings against the bounds the explorer tolerates.
/// Returns the inter-page delay as a `Duration`.
pub fn validate_fetch_settings(page_size: u32, max_pages: u32, delay_secs: f64) -> Result<Duration> {
    if !(PAGE_SIZE_MIN..=PAGE_SIZE_MAX).contains(&page_size) {
        return Err(TokenflowError::configuration(format!(
            "Page size must be between {} and {}",
            PAGE_SIZE_MIN, PAGE_SIZE_MAX
        )));
    }

    if !(MAX_PAGES_MIN..=MAX_PAGES_MAX).contains(&max_pages) {
        return Err(TokenflowError::configuration(format!(
            "Max pages must be between {} and {}",
            MAX_PAGES_MIN, MAX_PAGES_MAX
        )));
    }

    if !delay_secs.is_finite() || !(0.0..=DELAY_MAX_SECS).contains(&delay_secs) {
        return Err(TokenflowError::configuration(format!(
            "Inter-page delay must be between 0 and {} seconds",
            DELAY_MAX_SECS
        )));
    }

    Ok(Duration::from_secs_f64(delay_secs))
}

/// Get the log filter directives: `--verbose` wins, then `TOKENFLOW_LOG`,
/// then `RUST_LOG`, then `info`.
pub fn log_level(verbose: bool) -> String {
    log_level_from(
        verbose,
        env::var("TOKENFLOW_LOG").ok(),
        env::var("RUST_LOG").ok(),
    )
}

fn log_level_from(verbose: bool, tokenflow_log: Option<String>, rust_log: Option<String>) -> String {
    if verbose {
        return "debug".to_string();
    }
    [tokenflow_log, rust_log]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn env_filter(directives: &str) -> tracing_subscriber::EnvFilter {
    use tracing_subscriber::EnvFilter;

    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({}), using info", directives, e);
        EnvFilter::new("info")
    })
}

/// Initialize tracing. Logs go to stderr so reports on stdout stay clean.
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&log_level(verbose)))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
