// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use yahoo_finance_api::YahooConnector;

use crate::config::Config;
use crate::models::{ChartSeries, EpsSnapshot, SparkEnvelope};

/// Source of daily close history for many symbols in one request
#[async_trait]
pub trait PriceHistoryProvider {
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, ChartSeries>>;
}

/// Source of forward P/E and EPS figures for a single symbol
#[async_trait]
pub trait FundamentalsProvider {
    async fn eps_snapshot(&self, symbol: &str) -> Result<EpsSnapshot>;
}

#[async_trait]
impl<'a, T> FundamentalsProvider for &'a T
where
    T: FundamentalsProvider + Sync + ?Sized,
{
    async fn eps_snapshot(&self, symbol: &str) -> Result<EpsSnapshot> {
        (**self).eps_snapshot(symbol).await
    }
}

pub(crate) fn build_http_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent)
        .build()
        .context("Failed to build HTTP client")
}

fn unix_seconds(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::default())
        .and_utc()
        .timestamp()
}

/// Yahoo Finance chart API client for batched daily history
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(&config.user_agent)?,
            base_url: config.yahoo_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Batched daily history via the spark endpoint.
    pub async fn get_spark(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, ChartSeries>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/v7/finance/spark", self.base_url);
        // period2 is exclusive, so include the whole end day
        let period2 = unix_seconds(end) + 86_400;

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbols", symbols.join(",")),
                ("period1", unix_seconds(start).to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!("API error: {} - {}", status, text);
        }

        let envelope: SparkEnvelope =
            serde_json::from_str(&text).context("Failed to parse spark response")?;

        if let Some(error) = envelope.spark.error {
            anyhow::bail!("Spark error {}: {}", error.code, error.description);
        }

        let mut out = HashMap::new();
        for result in envelope.spark.result.unwrap_or_default() {
            if let Some(chart) = result.response.into_iter().next() {
                out.insert(result.symbol, chart.into_series());
            }
        }

        Ok(out)
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, ChartSeries>> {
        self.get_spark(symbols, start, end).await
    }
}

/// Yahoo key statistics through `yahoo_finance_api`, which performs the
/// cookie and crumb handshake that quoteSummary requires.
pub struct YahooFundamentals {
    connector: Mutex<YahooConnector>,
    request_delay: Duration,
}

impl YahooFundamentals {
    pub fn new(config: &Config) -> Result<Self> {
        let connector = YahooConnector::new()
            .map_err(|e| anyhow::anyhow!("Failed to create Yahoo connector: {}", e))?;
        Ok(Self {
            connector: Mutex::new(connector),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Forward P/E, trailing and forward EPS from the key statistics module,
    /// with the summary detail forward P/E as a fallback.
    pub async fn get_key_statistics(&self, symbol: &str) -> Result<EpsSnapshot> {
        if symbol.is_empty() {
            anyhow::bail!("symbol empty");
        }

        sleep(self.request_delay).await;

        let summary = {
            let mut connector = self.connector.lock().await;
            connector
                .get_ticker_info(symbol)
                .await
                .map_err(|e| anyhow::anyhow!("Yahoo ticker info failed for {}: {}", symbol, e))?
        };

        let Some(data) = summary
            .quote_summary
            .and_then(|qs| qs.result)
            .and_then(|results| results.into_iter().next())
        else {
            anyhow::bail!("No quote summary for {}", symbol);
        };

        let key_stats = data.default_key_statistics.as_ref();
        let snapshot = EpsSnapshot {
            forward_pe: key_stats.and_then(|ks| ks.forward_pe),
            trailing_eps: key_stats.and_then(|ks| ks.trailing_eps),
            forward_eps: key_stats.and_then(|ks| ks.forward_eps),
        };
        let summary_forward_pe = data.summary_detail.as_ref().and_then(|sd| sd.forward_pe);

        Ok(snapshot.with_forward_pe_fallback(summary_forward_pe))
    }
}

#[async_trait]
impl FundamentalsProvider for YahooFundamentals {
    async fn eps_snapshot(&self, symbol: &str) -> Result<EpsSnapshot> {
        self.get_key_statistics(symbol).await
    }
}
