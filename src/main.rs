use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use tokenflow::{
    aggregate::{filter_by_date, DEFAULT_TOP_N},
    balances::check_token_balance,
    cache::DEFAULT_TTL,
    chains::{chain_name, resolve_chain, CHAINS, DEFAULT_CHAIN, DEFAULT_JPYC_POLYGON},
    config::{self, DEFAULT_DELAY_SECS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE},
    explore::{parse_date, run_explore},
    explorer::DEFAULT_BASE_URL,
    export::{export_csv, DEFAULT_EXPORT_PATH},
    models::SortOrder,
    report::{render_report, resolve_range, ReportOptions},
    ExplorerClient, FetchParams, Result, Session,
};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connectivity check via the tokenbalance action
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Fetch transfers and print KPIs, daily flows and counterparties
    Report {
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Fetch transfers and write the date-filtered table as CSV
    Export {
        #[command(flatten)]
        fetch: FetchArgs,
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(short, long, default_value = DEFAULT_EXPORT_PATH)]
        output: PathBuf,
    },
    /// Interactive prompt over one wallet, reusing fetched data for a minute
    Explore {
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List known chains
    Chains,
}

#[derive(Args)]
struct TargetArgs {
    /// Wallet address (0x + 40 hex characters)
    #[arg(short, long, env = "TOKENFLOW_ADDRESS")]
    address: String,

    /// Chain name or numeric chain id
    #[arg(long, default_value = DEFAULT_CHAIN)]
    chain: String,

    /// Token contract address
    #[arg(long, default_value = DEFAULT_JPYC_POLYGON)]
    contract: String,

    /// Explorer endpoint
    #[arg(long, env = "ETHERSCAN_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args)]
struct FetchArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Records per page (10-1000)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Page ceiling (1-50)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
    sort: SortOrder,

    /// Seconds to wait between pages (0-1)
    #[arg(long, default_value_t = DEFAULT_DELAY_SECS)]
    delay: f64,
}

#[derive(Args)]
struct ViewArgs {
    /// First day to include (YYYY-MM-DD, display time zone)
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD, display time zone)
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Counterparties to rank
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Rows in the transfer list (0 hides it)
    #[arg(long, default_value_t = 50)]
    limit: usize,

    /// Print row count, period and observed columns
    #[arg(long)]
    debug: bool,
}

impl ViewArgs {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            start: self.start,
            end: self.end,
            top_n: self.top,
            limit: self.limit,
            debug: self.debug,
        }
    }
}

/// Validated target: (chain id, contract, wallet).
fn resolve_target(target: &TargetArgs) -> Result<(u64, String, String)> {
    let chain_id = resolve_chain(&target.chain)?;
    let contract = config::validate_address(&target.contract, "Contract")?.to_lowercase();
    let address = config::validate_address(&target.address, "Wallet")?;
    Ok((chain_id, contract, address))
}

fn resolve_fetch(fetch: &FetchArgs, api_key: String) -> Result<FetchParams> {
    let (chain_id, contract, address) = resolve_target(&fetch.target)?;
    let delay = config::validate_fetch_settings(fetch.page_size, fetch.max_pages, fetch.delay)?;
    Ok(FetchParams {
        chain_id,
        contract,
        address,
        api_key,
        page_size: fetch.page_size,
        sort: fetch.sort,
        max_pages: fetch.max_pages,
        delay,
    })
}

fn log_target(params: &FetchParams) {
    info!(
        "Wallet {} | contract {} | {} ({})",
        params.address,
        params.contract,
        chain_name(params.chain_id),
        params.chain_id
    );
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Chains = cli.command {
        for (name, id) in CHAINS {
            println!("{:<28} {}", name, id);
        }
        return Ok(());
    }

    // Nothing is fetched without a key.
    let api_key = config::resolve_api_key()?;

    match cli.command {
        Commands::Chains => Ok(()),

        Commands::Check { target } => {
            let (chain_id, contract, address) = resolve_target(&target)?;
            let client = ExplorerClient::new(target.base_url.clone())?;
            let check = check_token_balance(&client, chain_id, &contract, &address, &api_key).await?;

            println!("{}", check.url);
            println!("{}", serde_json::to_string_pretty(&check.body)?);
            if check.is_ok() {
                println!("tokenbalance OK");
                if let Some(raw) = check.raw_balance() {
                    println!("Raw balance: {}", raw);
                }
            } else {
                println!("API reported failure: {}", check.detail);
            }
            Ok(())
        }

        Commands::Report { fetch, view } => {
            let params = resolve_fetch(&fetch, api_key)?;
            log_target(&params);
            let client = ExplorerClient::new(fetch.target.base_url.clone())?;
            let mut session = Session::new(client, DEFAULT_TTL);

            let table = session.load(&params).await?;
            print!("{}", render_report(&table, &view.options())?);
            Ok(())
        }

        Commands::Export { fetch, start, end, output } => {
            let params = resolve_fetch(&fetch, api_key)?;
            log_target(&params);
            let client = ExplorerClient::new(fetch.target.base_url.clone())?;
            let mut session = Session::new(client, DEFAULT_TTL);

            let table = session.load(&params).await?;
            if table.is_empty() {
                println!("No transfers found. Nothing exported.");
                return Ok(());
            }
            let (start, end) = resolve_range(&table, start, end)?;
            let filtered = filter_by_date(&table, start, end);
            if filtered.is_empty() {
                println!("No transfers between {} and {}. Nothing exported.", start, end);
                return Ok(());
            }
            export_csv(&filtered, &output)?;
            println!("Exported {} rows to {}", filtered.len(), output.display());
            Ok(())
        }

        Commands::Explore { fetch, view } => {
            let params = resolve_fetch(&fetch, api_key)?;
            log_target(&params);
            let client = ExplorerClient::new(fetch.target.base_url.clone())?;
            let mut session = Session::new(client, DEFAULT_TTL);

            let stdin = BufReader::new(tokio::io::stdin());
            run_explore(&mut session, &params, view.options(), stdin, std::io::stdout()).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_precondition() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
