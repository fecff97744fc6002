// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use chrono::{Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::api::{FundamentalsProvider, PriceHistoryProvider, YahooClient, YahooFundamentals};
use crate::config::Config;
use crate::finviz::FinvizClient;
use crate::fundamentals::{FundamentalsResolver, ResolutionState};
use crate::prices::{PriceSeries, fetch_price_series};
use crate::report::{MetricRow, Report};
use crate::tickers::{TickerUniverse, load_tickers};

/// Fetch prices and fundamentals for every instrument and assemble the report.
pub async fn build_report<H, P, S>(
    universe: &TickerUniverse,
    history: &H,
    resolver: &mut FundamentalsResolver<P, S>,
    start: NaiveDate,
    today: NaiveDate,
) -> Report
where
    H: PriceHistoryProvider + ?Sized,
    P: FundamentalsProvider,
    S: FundamentalsProvider,
{
    println!(
        "Fetching price history for {} symbols since {}...",
        universe.len(),
        start
    );
    let price_series = fetch_price_series(history, &universe.symbols, start, today).await;
    println!(
        "✅ Usable price history for {}/{} symbols",
        price_series.len(),
        universe.len()
    );

    let rows = build_rows(universe, &price_series, resolver).await;
    Report::new(rows, today)
}

/// One row per instrument with usable prices, in ticker-list order.
pub async fn build_rows<P, S>(
    universe: &TickerUniverse,
    price_series: &HashMap<String, PriceSeries>,
    resolver: &mut FundamentalsResolver<P, S>,
) -> Vec<MetricRow>
where
    P: FundamentalsProvider,
    S: FundamentalsProvider,
{
    let progress = ProgressBar::new(price_series.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        progress.set_style(style.progress_chars("=>-"));
    }

    let mut rows = Vec::new();
    for symbol in &universe.symbols {
        let Some(series) = price_series.get(symbol) else {
            tracing::info!("[skip] {} - no usable prices", symbol);
            continue;
        };
        let Some(instrument) = universe.get(symbol) else {
            continue;
        };

        progress.set_message(format!("Fundamentals {}", symbol));
        let resolved = resolver.resolve(symbol).await;
        progress.inc(1);
        if resolved.state == ResolutionState::Merged {
            tracing::debug!("{} fundamentals merged with fallback source", symbol);
        }

        if let Some(row) = MetricRow::new(instrument, series, resolved.fundamentals) {
            rows.push(row);
        }
    }
    progress.finish_and_clear();

    rows
}

/// Print the table and save the CSV beside the crate.
pub fn publish(report: &Report, output_path: &Path, missing_marker: &str) -> Result<()> {
    if report.is_empty() {
        println!("Nothing to report.");
        return Ok(());
    }

    println!("\n{}\n", report.header());
    print!("{}", report.render_table());

    report.write_csv(output_path, missing_marker)?;
    println!("\nSaved → {}", output_path.display());

    Ok(())
}

pub async fn run(config: &Config) -> Result<()> {
    let started = Instant::now();
    let start = config.start_date()?;

    let ticker_path = config.ticker_map_path();
    let universe = load_tickers(&ticker_path)?;
    tracing::info!(
        "Loaded {} tickers from {}",
        universe.len(),
        ticker_path.display()
    );

    let yahoo = YahooClient::new(config)?;
    let key_statistics = YahooFundamentals::new(config)?;
    let finviz = FinvizClient::new(config)?;
    let mut resolver = FundamentalsResolver::new(&key_statistics, &finviz);

    let today = Local::now().date_naive();
    let report = build_report(&universe, &yahoo, &mut resolver, start, today).await;

    publish(&report, &config.output_csv_path(), &config.missing_marker)?;

    tracing::info!(
        "Reported {}/{} tickers ({} needed fallback fundamentals) in {:.1}s",
        report.ticker_count(),
        universe.len(),
        resolver.fallback_count(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
