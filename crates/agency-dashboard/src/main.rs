//! Agency earnings dashboard
//!
//! Loads a transaction ledger from the configured store and prints earnings
//! overviews, creator performance, trends and fan metrics, or exports them
//! as CSV.

mod config;
mod constants;
mod reports;
mod store;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use clap::{Parser, Subcommand};
use earnings_engine::ledger::parse_instant;
use earnings_engine::period::{end_of_day, local_date};
use earnings_engine::{
    Channel, Clock, FixedClock, Granularity, Ledger, LedgerAnalytics, LedgerStore, Period, Session, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Backend, Config, FileConfig, Overrides};
use reports::FanMetrics;
use store::Store;

#[derive(Parser, Debug)]
#[command(name = "agency-dashboard")]
#[command(about = "Earnings analytics for creator-management agencies")]
struct Args {
    /// Config file (defaults apply when it does not exist)
    #[arg(short, long, default_value = constants::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Data directory for stored ledgers (overrides [storage] data_dir)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides [storage] backend)
    #[arg(long, value_enum, global = true)]
    backend: Option<Backend>,

    /// Ledger to open instead of the selected one
    #[arg(short, long, global = true)]
    ledger: Option<String>,

    /// Reporting UTC offset, e.g. -07:00 (overrides the ledger's own)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// Reference instant for "today" (RFC 3339); defaults to the system clock
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Earnings by standard period and this week's statistics (default)
    Summary,

    /// Creator performance, this week vs. last week
    Creators,

    /// Earnings for a custom range
    Earnings {
        /// Range start (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: String,

        /// Range end, inclusive (YYYY-MM-DD covers the whole day)
        #[arg(long)]
        end: String,

        /// Only this channel: subscriptions, tips, posts, messages, referrals, streams
        #[arg(long)]
        channel: Option<Channel>,

        /// Only this creator alias
        #[arg(long)]
        creator: Option<String>,
    },

    /// Refunds issued in a custom range
    Refunds {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },

    /// Earnings trend over a custom range
    Trends {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// Point size: hour, day, week, month
        #[arg(long, default_value = "day")]
        by: Granularity,

        /// Break each point down by channel
        #[arg(long)]
        channels: bool,
    },

    /// Fan and subscription metrics for one creator
    Fans {
        #[arg(long)]
        creator: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,
    },

    /// Manage stored ledgers
    Ledger {
        #[command(subcommand)]
        action: LedgerCommand,
    },

    /// Write CSV reports
    Export {
        /// Output directory for generated CSV reports
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Trend range start (default: 30 days before today)
        #[arg(long)]
        start: Option<String>,

        /// Trend range end (default: today)
        #[arg(long)]
        end: Option<String>,

        /// Trend point size
        #[arg(long, default_value = "day")]
        by: Granularity,
    },
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Validate a JSON ledger, store it and select it
    Import {
        /// Path to the ledger JSON file
        file: PathBuf,

        /// Name to store it under (default: the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Show stored ledgers
    List,

    /// Delete a stored ledger
    Delete { name: String },

    /// Select the ledger opened by default
    Use { name: String },

    /// Describe the selected ledger
    Info,
}

/// Install the tracing subscriber, filtered by AGENCY_LOG
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;
    let config = Config::resolve(
        file_config,
        Overrides {
            backend: args.backend,
            data_dir: args.data_dir,
            utc_offset: args.utc_offset,
        },
    )?;

    let store = Store::open(&config).await?;
    let clock: Arc<dyn Clock> = match args.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };

    match args.command.unwrap_or(Command::Summary) {
        Command::Ledger { action } => handle_ledger_command(action, &store, &config, clock).await,
        command => {
            let session = open_session(&store, &config, clock, args.ledger.as_deref()).await?;
            handle_report_command(command, &session)
        }
    }
}

/// Load the requested (or selected) ledger into a new session
async fn open_session(store: &Store, config: &Config, clock: Arc<dyn Clock>, requested: Option<&str>) -> Result<Session> {
    let name = match requested {
        Some(name) => name.to_string(),
        None => store.current().await?,
    };

    let mut session = Session::new(clock, config.ledger_options);
    if !session.load_from(store, &name).await? {
        println!(
            "Ledger '{}' not found; showing empty data.\n\
             Use 'agency-dashboard ledger list' to see stored ledgers.\n",
            name
        );
    }
    Ok(session)
}

/// Offset used to read `--start`/`--end`
fn reporting_offset(session: &Session) -> FixedOffset {
    session
        .engine()
        .map(|e| e.offset())
        .or(session.options().utc_offset)
        .unwrap_or_else(|| Utc.fix())
}

/// Parse an inclusive range; a bare end date covers that whole day
fn parse_range(start: &str, end: &str, offset: &FixedOffset) -> Result<Period> {
    let start_at =
        parse_instant(start, offset).with_context(|| format!("Invalid --start '{}', expected YYYY-MM-DD", start))?;
    let end_at = match NaiveDate::parse_from_str(end, "%Y-%m-%d") {
        Ok(date) => end_of_day(date, offset),
        Err(_) => parse_instant(end, offset).with_context(|| format!("Invalid --end '{}', expected YYYY-MM-DD", end))?,
    };

    if end_at < start_at {
        bail!("--end ({}) is before --start ({})", end, start);
    }
    Ok(Period::new(start_at, end_at))
}

fn handle_report_command(command: Command, session: &Session) -> Result<()> {
    let offset = reporting_offset(session);

    match command {
        Command::Summary => {
            reports::print_summary(&session.snapshot());
            Ok(())
        }

        Command::Creators => {
            reports::print_creator_table(&session.snapshot().creator_table);
            Ok(())
        }

        Command::Earnings {
            start,
            end,
            channel,
            creator,
        } => {
            let period = parse_range(&start, &end, &offset)?;
            let totals = match &creator {
                Some(alias) => session.calculate_creator_earnings(alias, period, channel),
                None => session.calculate_earnings_for_period(period, channel),
            };

            let label = match (&creator, channel) {
                (Some(alias), Some(channel)) => format!("for {} / {}", alias, channel),
                (Some(alias), None) => format!("for {}", alias),
                (None, Some(channel)) => format!("from {}", channel),
                (None, None) => "from all channels".to_string(),
            };
            reports::print_totals(&period, &label, &totals);
            Ok(())
        }

        Command::Refunds { start, end } => {
            let period = parse_range(&start, &end, &offset)?;
            println!(
                "Refunded ({}): ${:.2}",
                period,
                session.calculate_refunds_for_period(period)
            );
            Ok(())
        }

        Command::Trends {
            start,
            end,
            by,
            channels,
        } => {
            let period = parse_range(&start, &end, &offset)?;
            if channels {
                reports::print_sales_chart(&session.generate_dynamic_sales_chart(period, by));
            } else {
                reports::print_trend(&session.generate_dynamic_earnings_trends(period, by));
            }
            Ok(())
        }

        Command::Fans { creator, start, end } => {
            let period = parse_range(&start, &end, &offset)?;
            if session.creator_profile(&creator).is_none() && session.fans_for_creator(&creator, period).is_empty() {
                println!("Note: no profile or earnings for {} in the active ledger.\n", creator);
            }
            let metrics = FanMetrics::collect(session, &creator, period);
            reports::print_fan_metrics(&creator, &period, &metrics);
            Ok(())
        }

        Command::Export {
            output_dir,
            start,
            end,
            by,
        } => {
            let period = match (start, end) {
                (Some(start), Some(end)) => parse_range(&start, &end, &offset)?,
                (None, None) => {
                    let today = local_date(session.now(), &offset);
                    let first = today - Duration::days(constants::EXPORT_TREND_DAYS - 1);
                    Period::for_local_dates(first, today, &offset)
                }
                _ => bail!("--start and --end must be given together"),
            };

            println!("Writing reports to {}...", output_dir.display());
            let trend = session.generate_dynamic_sales_chart(period, by);
            reports::export_all(&output_dir, &session.snapshot(), &trend)?;
            println!("Done.");
            Ok(())
        }

        Command::Ledger { .. } => bail!("ledger commands do not produce a report"),
    }
}

/// Handle ledger management subcommands
async fn handle_ledger_command(
    action: LedgerCommand,
    store: &Store,
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<()> {
    match action {
        LedgerCommand::Import { file, name } => {
            println!("Importing ledger from {}...\n", file.display());

            let body = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let ledger = Ledger::from_json_str(&body, &config.ledger_options)
                .with_context(|| format!("{} is not a valid transaction ledger", file.display()))?;

            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("Could not derive a ledger name from the file path; pass --name")?,
            };

            store.save(&name, &body).await?;
            store.set_current(&name).await?;

            println!("Imported '{}' for {}:", name, ledger.metadata.user_name);
            println!("  Transactions:  {}", ledger.transactions.len());
            println!("  Fans:          {}", ledger.fans.len());
            println!("  Creators:      {}", ledger.creator_aliases().len());
            println!("\nNow using '{}'.", name);
            Ok(())
        }

        LedgerCommand::List => {
            let current = store.current().await?;
            let names = store.list().await?;

            println!("{:<3} {:<32} {:<20}", "", "Name", "Uploaded");
            println!("{}", "-".repeat(56));
            for name in &names {
                let uploaded = match store.timestamp(name).await? {
                    Some(at) => at.format("%Y-%m-%d %H:%M UTC").to_string(),
                    None => "bundled".to_string(),
                };
                let marker = if *name == current { "*" } else { "" };
                println!("{:<3} {:<32} {:<20}", marker, name, uploaded);
            }
            println!("\n{} ledger(s), * = selected", names.len());
            Ok(())
        }

        LedgerCommand::Delete { name } => {
            if store.delete(&name).await? {
                println!("Deleted '{}'.", name);
            } else {
                println!("No stored ledger named '{}'.", name);
            }
            println!("Now using '{}'.", store.current().await?);
            Ok(())
        }

        LedgerCommand::Use { name } => {
            if store.load(&name).await?.is_none() {
                bail!("No stored ledger named '{}'. Use 'agency-dashboard ledger list' to see stored ledgers.", name);
            }
            store.set_current(&name).await?;
            println!("Now using '{}'.", name);
            Ok(())
        }

        LedgerCommand::Info => {
            let session = open_session(store, config, clock, None).await?;
            let Some(active) = session.active() else {
                return Ok(());
            };

            let ledger = active.engine.ledger();
            let name = active.name.as_deref().unwrap_or("-");
            println!("Ledger:          {}", name);
            println!("User:            {}", ledger.metadata.user_name);
            println!("UTC offset:      {}", ledger.metadata.utc_offset);
            println!("Operational:     {}", ledger.metadata.operational_status);
            println!("Platform fee:    {:.1}%", ledger.platform_fee_rate() * 100.0);
            if let Some(range) = ledger.data_range() {
                println!("Data range:      {} to {}", range.start_date.to_rfc3339(), range.end_date.to_rfc3339());
            }
            println!("Transactions:    {}", ledger.transactions.len());
            println!(
                "Refunded:        {}",
                ledger.transactions.iter().filter(|tx| tx.is_refunded()).count()
            );
            println!("Fans:            {}", ledger.fans.len());
            println!("Creators:        {}", ledger.creator_aliases().len());
            if let Some(uploaded) = store.timestamp(name).await? {
                println!("Uploaded:        {}", uploaded.to_rfc3339());
            }
            Ok(())
        }
    }
}
