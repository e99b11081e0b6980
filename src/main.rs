//! Arb Desk - Main Entry Point
//!
//! Thin CLI over the scanning library: one-shot scans, a polling loop with
//! optional paper settlement, and a listing of the configured universe.

use anyhow::Result;
use arb_desk::config::Config;
use arb_desk::market::{CoinGeckoSource, QuoteSource, StaticSource};
use arb_desk::strategy::{scan_cycle, ArbitrageOpportunity, OpportunityScanner};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Arb Desk CLI
#[derive(Parser)]
#[command(name = "arb-desk")]
#[command(version, about = "Cross-venue arbitrage scanning and position tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan and print the ranked opportunities
    Scan {
        /// Use the built-in static quote book instead of CoinGecko
        #[arg(long)]
        paper: bool,

        /// Print opportunities as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll quotes and scan continuously until Ctrl-C
    Run {
        /// Use the built-in static quote book instead of CoinGecko
        #[arg(long)]
        paper: bool,

        /// Seconds between scans (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Consume executable opportunities after each scan (paper settlement)
        #[arg(long)]
        execute: bool,
    },

    /// Print the configured instruments and venues
    Pairs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load()?;
    config.validate()?;

    match cli.command {
        Commands::Scan { paper, json } => run_scan(&config, paper, json).await,
        Commands::Run {
            paper,
            interval,
            execute,
        } => run_loop(&config, paper, interval, execute).await,
        Commands::Pairs => show_pairs(&config),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_source(config: &Config, paper: bool) -> Result<Box<dyn QuoteSource>> {
    if paper {
        info!("Using static quote book (paper mode)");
        Ok(Box::new(StaticSource::sample()))
    } else {
        Ok(Box::new(CoinGeckoSource::new(&config.market)?))
    }
}

async fn run_scan(config: &Config, paper: bool, json: bool) -> Result<()> {
    let source = build_source(config, paper)?;
    let mut scanner = OpportunityScanner::new(config.scanner.clone());

    let opportunities =
        scan_cycle(source.as_ref(), &mut scanner, config.source.max_quote_age()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&opportunities)?);
        return Ok(());
    }

    if opportunities.is_empty() {
        println!("No opportunities found.");
        return Ok(());
    }

    print_table(&opportunities);
    Ok(())
}

fn print_table(opportunities: &[ArbitrageOpportunity]) {
    println!(
        "{:<4} {:<8} {:<24} {:>10} {:>8} {:>10} {:>5} {:>5}",
        "ID", "ASSET", "ROUTE", "GROSS", "COST", "NET", "CONF", "EXEC"
    );
    for opp in opportunities {
        println!(
            "{:<4} {:<8} {:<24} {:>10} {:>8} {:>10} {:>4}% {:>5}",
            opp.id,
            opp.instrument,
            format!("{} -> {}", opp.buy_venue, opp.sell_venue),
            opp.gross_profit.round_dp(4),
            opp.estimated_cost,
            opp.net_profit.round_dp(4),
            opp.confidence,
            if opp.executable { "yes" } else { "no" },
        );
    }
}

async fn run_loop(
    config: &Config,
    paper: bool,
    interval: Option<u64>,
    execute: bool,
) -> Result<()> {
    let source = build_source(config, paper)?;
    let mut scanner = OpportunityScanner::new(config.scanner.clone());
    let poll = Duration::from_secs(interval.unwrap_or(config.source.poll_interval_secs));

    info!(
        source = source.name(),
        poll_secs = poll.as_secs(),
        "Starting scan loop"
    );

    let mut ticker = tokio::time::interval(poll);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scan_cycle(source.as_ref(), &mut scanner, config.source.max_quote_age()).await {
                    Ok(opportunities) => {
                        for opp in &opportunities {
                            info!(
                                id = %opp.id,
                                instrument = %opp.instrument,
                                buy_venue = %opp.buy_venue,
                                sell_venue = %opp.sell_venue,
                                net_profit = %opp.net_profit,
                                confidence = opp.confidence,
                                executable = opp.executable,
                                "Opportunity"
                            );
                        }
                        if execute {
                            settle_executable(&mut scanner, &opportunities);
                        }
                    }
                    Err(e) => error!(error = %e, "Scan cycle failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Paper settlement: consume every executable opportunity from the scan.
fn settle_executable(scanner: &mut OpportunityScanner, opportunities: &[ArbitrageOpportunity]) {
    for opp in opportunities.iter().filter(|o| o.executable) {
        match scanner.execute(opp.id) {
            Ok(executed) => info!(
                id = %executed.id,
                net_profit = %executed.net_profit,
                "Executed (paper)"
            ),
            Err(e) => warn!(id = %opp.id, error = %e, "Skipped execution"),
        }
    }
}

fn show_pairs(config: &Config) -> Result<()> {
    println!("Instruments:");
    for spec in &config.market.instruments {
        println!(
            "  {:<8} coingecko={:<12} size={}",
            spec.symbol,
            spec.coingecko_id,
            config.scanner.size_for(&spec.symbol)
        );
    }

    println!("Venues:");
    for venue in &config.market.venues {
        println!(
            "  {:<10} liquidity_factor={:<8} spread_ratio={}",
            venue.name, venue.liquidity_factor, venue.spread_ratio
        );
    }

    Ok(())
}
