// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Fallback fundamentals scraped from the Finviz quote page.
//!
//! The quote page carries a "snapshot" table whose cells alternate between a
//! label (`Forward P/E`) and its value (`24.31`). Values are display text and
//! may contain thousands separators.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use crate::api::{FundamentalsProvider, build_http_client};
use crate::config::Config;
use crate::models::EpsSnapshot;
use crate::utils::strip_thousands;

pub const TRAILING_EPS_LABEL: &str = "EPS (ttm)";
pub const FORWARD_EPS_LABEL: &str = "EPS next Y";
pub const FORWARD_PE_LABEL: &str = "Forward P/E";

#[derive(Clone)]
pub struct FinvizClient {
    client: Client,
    base_url: String,
    request_delay: Duration,
}

impl FinvizClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.user_agent)?,
            base_url: config.finviz_base_url.trim_end_matches('/').to_string(),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    pub async fn get_snapshot(&self, symbol: &str) -> Result<HashMap<String, String>> {
        if symbol.is_empty() {
            anyhow::bail!("symbol empty");
        }

        sleep(self.request_delay).await;

        let url = format!("{}/quote.ashx", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("t", symbol)])
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Finviz request failed with status: {}", status);
        }

        let html = response.text().await.context("Failed to get response text")?;
        Ok(parse_snapshot_table(&html))
    }
}

/// Pair up the snapshot table cells as label -> value.
pub fn parse_snapshot_table(html: &str) -> HashMap<String, String> {
    let document = Html::parse_document(html);
    let mut table = HashMap::new();

    let Ok(cell_selector) = Selector::parse("table.snapshot-table2 td") else {
        return table;
    };

    let cells: Vec<String> = document
        .select(&cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect();

    for pair in cells.chunks_exact(2) {
        table
            .entry(pair[0].clone())
            .or_insert_with(|| pair[1].clone());
    }

    table
}

/// Missing or empty text counts as zero; anything else must parse.
pub fn parse_snapshot_number(text: Option<&str>) -> Result<f64> {
    let cleaned = strip_thousands(text.unwrap_or_default().trim());
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .with_context(|| format!("Not a number: '{}'", cleaned))
}

pub fn snapshot_to_eps(table: &HashMap<String, String>) -> Result<EpsSnapshot> {
    let field = |label: &str| parse_snapshot_number(table.get(label).map(String::as_str));

    Ok(EpsSnapshot {
        trailing_eps: Some(field(TRAILING_EPS_LABEL)?),
        forward_eps: Some(field(FORWARD_EPS_LABEL)?),
        forward_pe: Some(field(FORWARD_PE_LABEL)?),
    })
}

#[async_trait]
impl FundamentalsProvider for FinvizClient {
    async fn eps_snapshot(&self, symbol: &str) -> Result<EpsSnapshot> {
        let table = self.get_snapshot(symbol).await?;
        snapshot_to_eps(&table)
    }
}
