// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::api::PriceHistoryProvider;
use crate::metrics::LONGEST_MA_WINDOW;
use crate::models::ChartSeries;

/// A symbol needs strictly more observations than the longest MA window
pub const MIN_OBSERVATIONS: usize = LONGEST_MA_WINDOW + 1;

/// Daily closes ascending by date, one observation per date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Sorts by date; a repeated date keeps its last observation.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let by_date: BTreeMap<NaiveDate, f64> = points.into_iter().collect();
        let (dates, closes) = by_date.into_iter().unzip();
        Self { dates, closes }
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

pub fn has_sufficient_history(series: &PriceSeries) -> bool {
    series.len() >= MIN_OBSERVATIONS
}

/// Drop gaps and observations before `start`, then order by date.
pub fn extract_series(raw: &ChartSeries, start: NaiveDate) -> Result<PriceSeries> {
    if raw.timestamps.len() != raw.closes.len() {
        anyhow::bail!(
            "{} timestamps but {} closes",
            raw.timestamps.len(),
            raw.closes.len()
        );
    }

    let mut points = Vec::with_capacity(raw.closes.len());
    for (&ts, close) in raw.timestamps.iter().zip(&raw.closes) {
        let Some(close) = close.filter(|c| c.is_finite()) else {
            continue;
        };
        let date = DateTime::from_timestamp(ts, 0)
            .with_context(|| format!("Invalid timestamp {}", ts))?
            .date_naive();
        if date >= start {
            points.push((date, close));
        }
    }

    Ok(PriceSeries::from_points(points))
}

/// One batched history request for every symbol. Symbols that are missing
/// from the response, malformed, or too short are logged and left out.
pub async fn fetch_price_series<P>(
    provider: &P,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> HashMap<String, PriceSeries>
where
    P: PriceHistoryProvider + ?Sized,
{
    let mut out = HashMap::new();

    let mut batch = match provider.daily_closes(symbols, start, end).await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("Price history download failed: {:#}", e);
            return out;
        }
    };

    for symbol in symbols {
        let Some(raw) = batch.remove(symbol) else {
            tracing::warn!("[download failed] {}", symbol);
            continue;
        };

        match extract_series(&raw, start) {
            Ok(series) if has_sufficient_history(&series) => {
                out.insert(symbol.clone(), series);
            }
            Ok(series) => {
                tracing::warn!(
                    "[insufficient history] {} ({} observations)",
                    symbol,
                    series.len()
                );
            }
            Err(e) => {
                tracing::warn!("[download failed] {}: {:#}", symbol, e);
            }
        }
    }

    out
}
