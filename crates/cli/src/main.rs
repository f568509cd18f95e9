mod commands;
mod config;
mod sample;

use anyhow::{bail, Result};
use cashflow_analysis::GroupingKey;
use cashflow_core::{DateRange, YearMonth};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::OutputFormat;
use config::Config;

#[derive(Parser)]
#[command(
    name = "cashflow",
    version,
    about = "Categorize bank exports and report income, spending and budgets."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: the user config directory's config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summaries, savings rate, cash allocation and budget usage.
    Report {
        /// CSV file of transactions
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Restrict to one month (YYYY-MM)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        month: Option<YearMonth>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Fail on the first malformed record instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Fill in missing categories and vendors and write the result as CSV.
    Categorize {
        #[arg(short, long)]
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite existing labels when a rule matches
        #[arg(long)]
        force: bool,
    },
    /// One summary table grouped by a single key.
    Summary {
        #[arg(short, long)]
        input: PathBuf,
        /// type, category, subcategory, vendor, payment-method or month
        #[arg(short, long, default_value = "category")]
        group_by: GroupingKey,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate labelled demo transactions from the last 90 days.
    Sample {
        /// Number of transactions
        #[arg(short = 'n', long, default_value_t = sample::DEFAULT_COUNT)]
        count: usize,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn period(
    month: Option<YearMonth>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<DateRange>> {
    if let Some(month) = month {
        return Ok(Some(month.range()));
    }
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            bail!("--from {from} is after --to {to}");
        }
    }
    Ok((from.is_some() || to.is_some()).then(|| DateRange::bounded(from, to)))
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Report {
            input,
            format,
            month,
            from,
            to,
            strict,
        } => {
            let range = period(month, from, to)?;
            commands::report(&input, &config, strict, range, format, &mut stdout)
        }
        Commands::Categorize {
            input,
            output,
            force,
        } => commands::categorize(&input, output.as_deref(), &config, force, &mut stdout),
        Commands::Summary {
            input,
            group_by,
            format,
        } => commands::summary(&input, &config, group_by, format, &mut stdout),
        Commands::Sample {
            count,
            output,
            seed,
        } => {
            let today = chrono::Local::now().date_naive();
            let transactions = match seed {
                Some(seed) => sample::generate(count, today, &mut StdRng::seed_from_u64(seed)),
                None => sample::generate(count, today, &mut rand::thread_rng()),
            };
            commands::write_sample(&transactions, output.as_deref(), &mut stdout)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
