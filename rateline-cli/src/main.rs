//! Rateline CLI — universe lookup and history retrieval commands.
//!
//! Commands:
//! - `universe` — list the instruments a terminal offers, minus exclusions
//! - `fetch` — pull history per instrument and summarize close/log-return tables
//!
//! Both commands talk to an in-memory terminal, loaded from a JSON snapshot or
//! generated synthetically. Logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rateline_core::domain::SymbolInfo;
use rateline_core::terminal::synthetic;
use rateline_core::{
    align_returns, resolve_universe, FetchMode, MemoryTerminal, ResultCollection, Session,
    SessionConfig, SessionError, Terminal, TimeWindow, Timeframe, DEFAULT_LOOKBACK_DAYS,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "rateline",
    about = "Rateline CLI — instrument universe and price history retrieval"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the instrument universe, one name per line.
    Universe {
        #[command(flatten)]
        source: SourceArgs,

        /// Exclude instruments whose name ends with this pattern (repeatable).
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclusions: Vec<String>,
    },
    /// Fetch history and summarize one line per instrument.
    Fetch {
        /// Path to a TOML session config.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Request strategy: from_anchor or range.
        #[arg(long)]
        mode: Option<FetchMode>,

        /// Bar timeframe (M1 … MN1). Defaults to D1.
        #[arg(long)]
        timeframe: Option<Timeframe>,

        /// Days back from the end when no start is given. Defaults to 250.
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Window start (RFC 3339).
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Window end (RFC 3339). Defaults to now.
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Comma-separated instruments. Defaults to the resolved universe.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Exclude instruments whose name ends with this pattern (repeatable).
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclusions: Vec<String>,
    },
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Load the terminal from a JSON snapshot.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Use a synthetic random-walk terminal.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Universe { source, exclusions } => run_universe(&source, &exclusions),
        Commands::Fetch {
            config,
            source,
            mode,
            timeframe,
            lookback_days,
            start,
            end,
            symbols,
            exclusions,
        } => {
            let mut cfg = match config {
                Some(path) => SessionConfig::from_file(&path)?,
                None => SessionConfig::default(),
            };
            // Flags override the config file.
            if let Some(mode) = mode {
                cfg.mode = mode;
            }
            if let Some(timeframe) = timeframe {
                cfg.timeframe = timeframe;
            }
            if let Some(days) = lookback_days {
                cfg.lookback_days = days;
            }
            if start.is_some() {
                cfg.start = start;
            }
            if end.is_some() {
                cfg.end = end;
            }
            if !symbols.is_empty() {
                cfg.symbols = symbols;
            }
            if !exclusions.is_empty() {
                cfg.exclusions = exclusions;
            }
            run_fetch(&source, &cfg)
        }
    }
}

/// Open the terminal selected on the command line.
///
/// Synthetic series cover `window`, for `symbols` (or a default set).
fn open_terminal(
    source: &SourceArgs,
    timeframe: Timeframe,
    window: TimeWindow,
    symbols: &[String],
) -> Result<Box<dyn Terminal>> {
    if source.snapshot.is_some() && source.synthetic {
        bail!("--snapshot and --synthetic are mutually exclusive");
    }

    if let Some(path) = &source.snapshot {
        return Ok(Box::new(load_snapshot(path)?));
    }
    if source.synthetic {
        let terminal = if symbols.is_empty() {
            synthetic::generate(&synthetic::DEFAULT_SYMBOLS, timeframe, window.start, window.end)
        } else {
            synthetic::generate(symbols, timeframe, window.start, window.end)
        };
        return Ok(Box::new(terminal));
    }

    bail!("one of --snapshot or --synthetic is required")
}

fn load_snapshot(path: &Path) -> Result<MemoryTerminal> {
    MemoryTerminal::from_snapshot_file(path)
        .with_context(|| format!("loading terminal snapshot {}", path.display()))
}

fn run_universe(source: &SourceArgs, exclusions: &[String]) -> Result<()> {
    let window = TimeWindow::resolve(None, None, DEFAULT_LOOKBACK_DAYS, Utc::now());
    let terminal = open_terminal(source, Timeframe::default(), window, &[])?;

    match resolve_universe(&terminal, exclusions)? {
        Some(symbols) => {
            for info in &symbols {
                println!("{}", info.name);
            }
            info!(terminal = terminal.name(), instruments = symbols.len(), "universe resolved");
        }
        None => bail!("terminal '{}' returned no symbol list", terminal.name()),
    }

    Ok(())
}

fn run_fetch(source: &SourceArgs, cfg: &SessionConfig) -> Result<()> {
    let now = Utc::now();
    let options = cfg.options();
    let window = TimeWindow::resolve(options.start, options.end, options.lookback_days, now);
    let terminal = open_terminal(source, cfg.timeframe, window, &cfg.symbols)?;

    let session = Session::with_clock(terminal, options, now)?;

    let instruments: Vec<SymbolInfo> = if !cfg.symbols.is_empty() {
        cfg.symbols.iter().map(SymbolInfo::named).collect()
    } else if !cfg.exclusions.is_empty() {
        session
            .resolve_universe(&cfg.exclusions)?
            .ok_or(SessionError::UniverseUnavailable)?
    } else {
        session
            .universe()
            .ok_or(SessionError::UniverseUnavailable)?
            .to_vec()
    };

    println!(
        "{} {} → {} ({}, {})",
        session.terminal().name(),
        session.start().to_rfc3339(),
        session.end().to_rfc3339(),
        session.timeframe(),
        cfg.mode
    );

    let collection = session.fetch_history(&instruments, cfg.mode)?;
    print_summary(&collection);

    let omitted = omitted_symbols(&instruments, &collection);
    if !omitted.is_empty() {
        warn!(count = omitted.len(), symbols = %omitted.join(", "), "no history returned");
    }

    let aligned = align_returns(&collection);
    println!(
        "Aligned: {} timestamps, {} complete rows across {} instruments",
        aligned.index.len(),
        aligned.complete_rows(),
        aligned.columns.len()
    );

    Ok(())
}

/// Requested instruments that came back without a table.
fn omitted_symbols<'a>(instruments: &'a [SymbolInfo], collection: &ResultCollection) -> Vec<&'a str> {
    instruments
        .iter()
        .map(|i| i.name.as_str())
        .filter(|name| !collection.contains_key(*name))
        .collect()
}

fn print_summary(collection: &ResultCollection) {
    for (symbol, table) in collection {
        let first = table
            .first_time()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let last = table
            .last_time()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let close = table
            .last_close()
            .map(|c| format!("{c:.5}"))
            .unwrap_or_else(|| "-".into());
        let mean = table
            .mean_log_return()
            .map(|r| format!("{r:+.6}"))
            .unwrap_or_else(|| "-".into());

        println!(
            "{symbol:<10} rows={:>6}  first={first}  last={last}  close={close}  mean_log_return={mean}",
            table.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rateline_core::BarTable;

    #[test]
    fn omitted_symbols_keep_request_order() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut collection = ResultCollection::new();
        collection.insert(
            "GBPUSD".into(),
            BarTable::from_closes(vec![t0], vec![1.27]).unwrap(),
        );

        let instruments: Vec<SymbolInfo> = ["USDJPY", "GBPUSD", "EURUSD"]
            .into_iter()
            .map(SymbolInfo::named)
            .collect();

        assert_eq!(
            omitted_symbols(&instruments, &collection),
            vec!["USDJPY", "EURUSD"]
        );
        assert!(omitted_symbols(&instruments[1..2], &collection).is_empty());
    }

    #[test]
    fn fetch_flags_parse() {
        let cli = Cli::try_parse_from([
            "rateline",
            "fetch",
            "--synthetic",
            "--mode",
            "range",
            "--timeframe",
            "h1",
            "--symbols",
            "EURUSD,GBPUSD",
            "--exclude",
            "JPY",
        ])
        .unwrap();

        match cli.command {
            Commands::Fetch {
                source,
                mode,
                timeframe,
                symbols,
                exclusions,
                ..
            } => {
                assert!(source.synthetic);
                assert_eq!(mode, Some(FetchMode::Range));
                assert_eq!(timeframe, Some(Timeframe::H1));
                assert_eq!(symbols, vec!["EURUSD", "GBPUSD"]);
                assert_eq!(exclusions, vec!["JPY"]);
            }
            Commands::Universe { .. } => panic!("expected fetch"),
        }
    }
}
