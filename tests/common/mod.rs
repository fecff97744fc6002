// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Common test utilities and helpers
//!
//! In-memory stand-ins for the data providers plus builders for synthetic
//! price histories and ticker maps.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use morning_dashboard::api::{FundamentalsProvider, PriceHistoryProvider};
use morning_dashboard::models::{ChartSeries, EpsSnapshot};

pub const DAY: i64 = 86_400;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn timestamp(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::default())
        .and_utc()
        .timestamp()
}

/// `len` daily closes starting 2024-01-02, drifting up by `step` per day,
/// with the final close moved by `last_move_pct` percent.
pub fn chart(len: usize, base: f64, step: f64, last_move_pct: f64) -> ChartSeries {
    let first = timestamp(date(2024, 1, 2));
    let mut closes: Vec<Option<f64>> = (0..len).map(|i| Some(base + step * i as f64)).collect();
    if len >= 2 {
        let previous = closes[len - 2].unwrap();
        closes[len - 1] = Some(previous * (1.0 + last_move_pct / 100.0));
    }

    ChartSeries {
        timestamps: (0..len as i64).map(|i| first + i * DAY).collect(),
        closes,
    }
}

pub struct MockHistory {
    pub batch: HashMap<String, ChartSeries>,
    pub calls: AtomicUsize,
}

impl MockHistory {
    pub fn new() -> Self {
        Self {
            batch: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, symbol: &str, series: ChartSeries) -> Self {
        self.batch.insert(symbol.to_string(), series);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceHistoryProvider for MockHistory {
    async fn daily_closes(
        &self,
        symbols: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<HashMap<String, ChartSeries>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(symbols
            .iter()
            .filter_map(|s| self.batch.get(s).map(|c| (s.clone(), c.clone())))
            .collect())
    }
}

pub struct MockFundamentals {
    pub snapshots: HashMap<String, EpsSnapshot>,
    pub should_fail: bool,
    pub calls: AtomicUsize,
}

impl MockFundamentals {
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    pub fn with(mut self, symbol: &str, forward_pe: f64, trailing_eps: f64, forward_eps: f64) -> Self {
        self.snapshots.insert(
            symbol.to_string(),
            EpsSnapshot {
                forward_pe: Some(forward_pe),
                trailing_eps: Some(trailing_eps),
                forward_eps: Some(forward_eps),
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FundamentalsProvider for MockFundamentals {
    async fn eps_snapshot(&self, symbol: &str) -> Result<EpsSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            anyhow::bail!("API error");
        }
        Ok(self.snapshots.get(symbol).copied().unwrap_or_default())
    }
}

/// A ticker map covering every branch of the loader
pub const TICKER_MAP: &str = r#"{
    "SPX":    {"source": "stocks.index", "symbol": "GSPC", "co": "S&P 500", "cat": "Global Markets"},
    "NDX":    {"source": "stocks.index", "symbol": "NDX", "co": "Nasdaq 100", "cat": "Global Markets"},
    "GOLD":   {"source": "stocks.futures", "symbol": "GC=F", "co": "Gold", "cat": "Commodities"},
    "RSPT":   {"source": "stocks.us", "symbol": "RSPT", "co": "Tech Equal Weight", "cat": "Equal Weight"},
    "AAPL":   {"source": "stocks.us", "symbol": "AAPL", "co": "Apple", "cat": "USA Thematics"},
    "BTC":    {"source": "crypto.spot", "symbol": "BTC-USD", "co": "Bitcoin", "cat": "Crypto"},
    "NEWIPO": {"source": "stocks.us", "symbol": "NEW", "co": "Recent IPO", "cat": "USA Thematics"},
    "GONE":   {"source": "stocks.us", "symbol": "GONE", "co": "Delisted", "cat": "USA Sectors"},
    "NEWS":   {"source": "news.rss", "symbol": "FEED", "co": "Feed", "cat": "Global Markets"}
}"#;
