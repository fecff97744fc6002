// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Rolling statistics over a close-price series (most recent observation last).

use crate::utils::percent_diff;

pub const TRADING_DAYS_MONTH: usize = 21;
pub const TRADING_DAYS_QUARTER: usize = 63;
pub const TRADING_DAYS_YEAR: usize = 252;

/// Column label and trading-period offset for each change horizon
pub const CHANGE_HORIZONS: [(&str, usize); 4] = [
    ("chg_1d", 1),
    ("chg_1m", TRADING_DAYS_MONTH),
    ("chg_1q", TRADING_DAYS_QUARTER),
    ("chg_1y", TRADING_DAYS_YEAR),
];

pub const MA_WINDOWS: [usize; 4] = [10, 20, 100, 200];

pub const LONGEST_MA_WINDOW: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentChanges {
    pub day: Option<f64>,
    pub month: Option<f64>,
    pub quarter: Option<f64>,
    pub year: Option<f64>,
}

impl PercentChanges {
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.day, self.month, self.quarter, self.year]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaDeviations {
    pub vs_10d: Option<f64>,
    pub vs_20d: Option<f64>,
    pub vs_100d: Option<f64>,
    pub vs_200d: Option<f64>,
}

impl MaDeviations {
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.vs_10d, self.vs_20d, self.vs_100d, self.vs_200d]
    }
}

/// Change of the last close against the close `horizon` observations earlier.
pub fn percent_change(closes: &[f64], horizon: usize) -> Option<f64> {
    let last = *closes.last()?;
    if closes.len() <= horizon {
        return None;
    }
    let base = closes[closes.len() - 1 - horizon];
    percent_diff(last, base)
}

pub fn percent_changes(closes: &[f64]) -> PercentChanges {
    let [day, month, quarter, year] = CHANGE_HORIZONS.map(|(_, h)| percent_change(closes, h));
    PercentChanges {
        day,
        month,
        quarter,
        year,
    }
}

/// Arithmetic mean of the trailing `window` closes, or of all of them when
/// the series is shorter than the window.
pub fn simple_moving_average(closes: &[f64], window: usize) -> Option<f64> {
    if closes.is_empty() || window == 0 {
        return None;
    }
    let tail = &closes[closes.len().saturating_sub(window)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Distance of the last close from its simple moving average, in percent.
pub fn ma_deviation(closes: &[f64], window: usize) -> Option<f64> {
    let last = *closes.last()?;
    let sma = simple_moving_average(closes, window)?;
    percent_diff(last, sma)
}

pub fn ma_deviations(closes: &[f64]) -> MaDeviations {
    let [vs_10d, vs_20d, vs_100d, vs_200d] = MA_WINDOWS.map(|w| ma_deviation(closes, w));
    MaDeviations {
        vs_10d,
        vs_20d,
        vs_100d,
        vs_200d,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn ramp(len: usize) -> Vec<f64> {
        (1..=len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_percent_change_exact() {
        let closes = vec![100.0, 105.0, 110.0];

        assert_relative_eq!(percent_change(&closes, 1).unwrap(), (110.0 / 105.0 - 1.0) * 100.0);
        assert_relative_eq!(percent_change(&closes, 2).unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percent_change_horizon_too_long() {
        let closes = vec![100.0, 105.0, 110.0];

        assert!(percent_change(&closes, 3).is_none());
        assert!(percent_change(&[], 1).is_none());
    }

    #[test]
    fn test_percent_change_zero_base_is_undefined() {
        assert!(percent_change(&[0.0, 5.0], 1).is_none());
    }

    #[test]
    fn test_percent_changes_short_series() {
        let closes = ramp(30);
        let changes = percent_changes(&closes);

        assert_relative_eq!(changes.day.unwrap(), (30.0 / 29.0 - 1.0) * 100.0);
        assert_relative_eq!(changes.month.unwrap(), (30.0 / 9.0 - 1.0) * 100.0);
        assert!(changes.quarter.is_none());
        assert!(changes.year.is_none());
    }

    #[test]
    fn test_percent_changes_full_year() {
        let closes = ramp(253);
        let changes = percent_changes(&closes);

        assert_relative_eq!(changes.year.unwrap(), (253.0 / 1.0 - 1.0) * 100.0);
        assert!(changes.values().iter().all(Option::is_some));
    }

    #[test]
    fn test_moving_average() {
        let closes = ramp(20);

        // mean of 11..=20
        assert_relative_eq!(simple_moving_average(&closes, 10).unwrap(), 15.5);
        assert_relative_eq!(simple_moving_average(&closes, 20).unwrap(), 10.5);
        // window longer than the series uses what is there
        assert_relative_eq!(simple_moving_average(&closes, 100).unwrap(), 10.5);
        assert!(simple_moving_average(&[], 10).is_none());
    }

    #[test]
    fn test_ma_deviation() {
        let closes = ramp(20);

        assert_relative_eq!(ma_deviation(&closes, 10).unwrap(), (20.0 / 15.5 - 1.0) * 100.0);
    }

    #[test]
    fn test_flat_series_has_zero_deviation() {
        let closes = vec![50.0; 250];
        let deviations = ma_deviations(&closes);

        for value in deviations.values() {
            assert_relative_eq!(value.unwrap(), 0.0);
        }
    }

    #[test]
    fn test_single_observation() {
        let closes = [42.0];

        assert_eq!(percent_changes(&closes), PercentChanges::default());
        assert_relative_eq!(ma_deviation(&closes, 200).unwrap(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_percent_change_matches_formula(
            closes in prop::collection::vec(0.01f64..10_000.0, 1..300),
            horizon in 0usize..300,
        ) {
            let result = percent_change(&closes, horizon);
            let len = closes.len();
            if horizon <= len - 1 {
                let expected = (closes[len - 1] / closes[len - 1 - horizon] - 1.0) * 100.0;
                prop_assert_eq!(result, Some(expected));
            } else {
                prop_assert!(result.is_none());
            }
        }

        #[test]
        fn prop_ma_deviation_matches_formula(
            closes in prop::collection::vec(0.01f64..10_000.0, 1..300),
            window in 1usize..250,
        ) {
            let len = closes.len();
            let tail = &closes[len.saturating_sub(window)..];
            let mean = tail.iter().sum::<f64>() / tail.len() as f64;
            let expected = (closes[len - 1] / mean - 1.0) * 100.0;

            let result = ma_deviation(&closes, window).unwrap();
            prop_assert!((result - expected).abs() < 1e-9);
        }
    }
}
