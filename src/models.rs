// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Deserialize;

/// Raw daily closes for one symbol, exactly as the provider returned them.
/// `closes[i]` belongs to `timestamps[i]`; gaps are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub timestamps: Vec<i64>,
    pub closes: Vec<Option<f64>>,
}

/// EPS and valuation fields as reported by a single fundamentals source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpsSnapshot {
    pub forward_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
}

impl EpsSnapshot {
    /// Use `fallback` when this snapshot has no usable forward P/E.
    pub fn with_forward_pe_fallback(self, fallback: Option<f64>) -> Self {
        Self {
            forward_pe: self.forward_pe.filter(|pe| *pe != 0.0).or(fallback),
            ..self
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct YahooError {
    pub code: String,
    pub description: String,
}

// /v7/finance/spark

#[derive(Debug, Deserialize)]
pub struct SparkEnvelope {
    pub spark: SparkBody,
}

#[derive(Debug, Deserialize)]
pub struct SparkBody {
    pub result: Option<Vec<SparkResult>>,
    pub error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
pub struct SparkResult {
    pub symbol: String,
    #[serde(default)]
    pub response: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseIndicator>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjCloseIndicator {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResult {
    /// Adjusted closes when the provider sent them, raw closes otherwise.
    pub fn into_series(self) -> ChartSeries {
        let ChartResult {
            timestamp,
            indicators,
        } = self;

        let adjusted = indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose)
            .filter(|closes| !closes.is_empty());

        let closes = match adjusted {
            Some(closes) => closes,
            None => indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .unwrap_or_default(),
        };

        ChartSeries {
            timestamps: timestamp,
            closes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spark_prefers_adjusted_closes() {
        let json = r#"{
            "spark": {
                "result": [{
                    "symbol": "AAPL",
                    "response": [{
                        "timestamp": [1704205800, 1704292200],
                        "indicators": {
                            "quote": [{"close": [185.64, 184.25]}],
                            "adjclose": [{"adjclose": [184.73, null]}]
                        }
                    }]
                }],
                "error": null
            }
        }"#;

        let envelope: SparkEnvelope = serde_json::from_str(json).unwrap();
        let mut results = envelope.spark.result.unwrap();
        let chart = results.remove(0).response.remove(0);
        let series = chart.into_series();

        assert_eq!(series.timestamps, vec![1704205800, 1704292200]);
        assert_eq!(series.closes, vec![Some(184.73), None]);
    }

    #[test]
    fn test_spark_falls_back_to_raw_closes() {
        let json = r#"{
            "timestamp": [1704205800],
            "indicators": {"quote": [{"close": [4742.83]}]}
        }"#;

        let chart: ChartResult = serde_json::from_str(json).unwrap();
        assert_eq!(chart.into_series().closes, vec![Some(4742.83)]);
    }

    #[test]
    fn test_forward_pe_falls_back_to_summary_detail() {
        let missing = EpsSnapshot {
            forward_pe: None,
            trailing_eps: Some(6.0),
            forward_eps: Some(6.6),
        };
        let zero = EpsSnapshot {
            forward_pe: Some(0.0),
            ..missing
        };
        let present = EpsSnapshot {
            forward_pe: Some(28.4),
            ..missing
        };

        assert_eq!(missing.with_forward_pe_fallback(Some(27.9)).forward_pe, Some(27.9));
        assert_eq!(zero.with_forward_pe_fallback(Some(27.9)).forward_pe, Some(27.9));
        assert_eq!(present.with_forward_pe_fallback(Some(27.9)).forward_pe, Some(28.4));
        assert_eq!(missing.with_forward_pe_fallback(None).forward_pe, None);
        assert_eq!(missing.with_forward_pe_fallback(Some(27.9)).trailing_eps, Some(6.0));
    }
}
