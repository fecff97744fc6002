// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Source prefixes that mark a record as a tradeable instrument
const RECOGNIZED_SOURCES: [&str; 2] = ["stocks.", "crypto."];

/// Bare index codes mapped to their market-convention symbol
const INDEX_ALIASES: [(&str, &str); 10] = [
    ("GSPC", "^GSPC"),
    ("NDX", "^NDX"),
    ("RUT", "^RUT"),
    ("HSI", "^HSI"),
    ("STOXX50E", "^STOXX50E"),
    ("N225", "^N225"),
    ("VIX", "^VIX"),
    ("AXJO", "^AXJO"),
    ("XJO", "^AXJO"),
    ("DJI", "^DJI"),
];

/// One entry of `ticker_map.json`
#[derive(Debug, Default, Deserialize)]
pub struct TickerRecord {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub co: Option<String>,
    #[serde(default)]
    pub cat: Option<String>,
}

/// Display metadata for a resolved symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub code: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Default)]
pub struct TickerUniverse {
    /// Unique symbols in file order
    pub symbols: Vec<String>,
    pub instruments: HashMap<String, Instrument>,
}

impl TickerUniverse {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }
}

pub fn resolve_symbol(raw: &str) -> String {
    INDEX_ALIASES
        .iter()
        .find(|(code, _)| *code == raw)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn normalize_category(cat: &str) -> String {
    match cat {
        "Equal Weight" => "USA Equal Weight".to_string(),
        other => other.to_string(),
    }
}

fn is_recognized_source(source: &str) -> bool {
    RECOGNIZED_SOURCES
        .iter()
        .any(|prefix| source.starts_with(prefix))
}

/// Parse the ticker map JSON, keeping the order records appear in the file.
pub fn parse_ticker_map(json: &str) -> Result<TickerUniverse> {
    let root: Map<String, Value> =
        serde_json::from_str(json).context("Ticker map must be a JSON object")?;

    let mut universe = TickerUniverse::default();
    let mut seen = HashSet::new();

    for (code, value) in root {
        let record: TickerRecord = serde_json::from_value(value)
            .with_context(|| format!("Malformed ticker record for {}", code))?;

        let source = record.source.as_deref().unwrap_or_default();
        if !is_recognized_source(source) {
            continue;
        }

        let raw_symbol = record.symbol.as_deref().unwrap_or_default();
        if raw_symbol.is_empty() {
            continue;
        }

        let symbol = resolve_symbol(raw_symbol);
        let instrument = Instrument {
            name: record.co.clone().unwrap_or_else(|| code.clone()),
            category: normalize_category(record.cat.as_deref().unwrap_or_default()),
            symbol: symbol.clone(),
            code,
        };

        if seen.insert(symbol.clone()) {
            universe.symbols.push(symbol.clone());
        }
        universe.instruments.insert(symbol, instrument);
    }

    Ok(universe)
}

pub fn load_tickers(path: &Path) -> Result<TickerUniverse> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ticker map from {}", path.display()))?;
    parse_ticker_map(&content)
        .with_context(|| format!("Failed to parse ticker map {}", path.display()))
}
