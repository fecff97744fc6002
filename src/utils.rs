// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn strip_thousands(text: &str) -> String {
    text.replace(',', "")
}

/// `(numerator / denominator - 1) * 100`, undefined for a zero or non-finite result
pub fn percent_diff(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let pct = (numerator / denominator - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}
