// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::Writer;
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

use crate::fundamentals::Fundamentals;
use crate::metrics::{MaDeviations, PercentChanges, ma_deviations, percent_changes};
use crate::prices::PriceSeries;
use crate::tickers::Instrument;
use crate::utils::round_to;

/// Shown on the console wherever a value is undefined
pub const PLACEHOLDER: &str = "–";

/// Rank given to categories missing from the order table
pub const UNRANKED_CATEGORY: u32 = 99;

const CATEGORY_ORDER: [(&str, u32); 9] = [
    ("Global Markets", 1),
    ("ASX Indices", 2),
    ("ASX Sectors", 3),
    ("Commodities", 4),
    ("Forex", 5),
    ("Bonds", 6),
    ("USA Equal Weight", 7),
    ("USA Thematics", 8),
    ("USA Sectors", 9),
];

pub const COLUMNS: [&str; 14] = [
    "Disp",
    "Name",
    "Cat",
    "Last_Price",
    "chg_1d",
    "chg_1m",
    "chg_1q",
    "chg_1y",
    "forward_PE",
    "EPS_growth",
    "Px_vs_10d",
    "Px_vs_20d",
    "Px_vs_100d",
    "Px_vs_200d",
];

pub fn category_rank(category: &str) -> u32 {
    CATEGORY_ORDER
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNRANKED_CATEGORY)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub code: String,
    pub name: String,
    pub category: String,
    pub last_price: f64,
    pub changes: PercentChanges,
    pub fundamentals: Fundamentals,
    pub ma: MaDeviations,
}

impl MetricRow {
    /// `None` for an empty series, since there is no last price to report.
    pub fn new(
        instrument: &Instrument,
        series: &PriceSeries,
        fundamentals: Fundamentals,
    ) -> Option<Self> {
        let last_price = series.last_close()?;
        Some(Self {
            code: instrument.code.clone(),
            name: instrument.name.clone(),
            category: instrument.category.clone(),
            last_price,
            changes: percent_changes(series.closes()),
            fundamentals,
            ma: ma_deviations(series.closes()),
        })
    }

    /// Every numeric field rounded to two decimals
    pub fn rounded(&self) -> Self {
        let r = |v: Option<f64>| v.map(|v| round_to(v, 2));
        Self {
            code: self.code.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            last_price: round_to(self.last_price, 2),
            changes: PercentChanges {
                day: r(self.changes.day),
                month: r(self.changes.month),
                quarter: r(self.changes.quarter),
                year: r(self.changes.year),
            },
            fundamentals: Fundamentals {
                forward_pe: r(self.fundamentals.forward_pe),
                eps_growth: r(self.fundamentals.eps_growth),
            },
            ma: MaDeviations {
                vs_10d: r(self.ma.vs_10d),
                vs_20d: r(self.ma.vs_20d),
                vs_100d: r(self.ma.vs_100d),
                vs_200d: r(self.ma.vs_200d),
            },
        }
    }

    /// Console cells, in `COLUMNS` order
    pub fn display_cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.code.clone(),
            self.name.clone(),
            self.category.clone(),
            format_decimal(Some(self.last_price)),
        ];
        cells.extend(self.changes.values().map(format_percent));
        cells.push(format_decimal(self.fundamentals.forward_pe));
        cells.push(format_percent(self.fundamentals.eps_growth));
        cells.extend(self.ma.values().map(format_percent));
        cells
    }

    /// CSV fields, in `COLUMNS` order
    pub fn csv_fields(&self, missing_marker: &str) -> Vec<String> {
        let raw = |v: Option<f64>| {
            v.map(|v| v.to_string())
                .unwrap_or_else(|| missing_marker.to_string())
        };
        let mut fields = vec![
            self.code.clone(),
            self.name.clone(),
            self.category.clone(),
            self.last_price.to_string(),
        ];
        fields.extend(self.changes.values().map(raw));
        fields.push(raw(self.fundamentals.forward_pe));
        fields.push(raw(self.fundamentals.eps_growth));
        fields.extend(self.ma.values().map(raw));
        fields
    }
}

/// One line of the report: a data row or a blank line between categories
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    Row(MetricRow),
    Separator,
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", round_to(v, 1)),
        None => PLACEHOLDER.to_string(),
    }
}

fn format_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => PLACEHOLDER.to_string(),
    }
}

fn compare_day_change_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Category rank, then category name, then one-day change descending.
pub fn sort_rows(rows: &mut [MetricRow]) {
    rows.sort_by(|a, b| {
        category_rank(&a.category)
            .cmp(&category_rank(&b.category))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| compare_day_change_desc(a.changes.day, b.changes.day))
    });
}

pub fn with_separators(rows: Vec<MetricRow>) -> Vec<ReportLine> {
    let mut lines = Vec::with_capacity(rows.len() * 2);
    let mut current: Option<String> = None;

    for row in rows {
        if let Some(previous) = &current {
            if *previous != row.category {
                lines.push(ReportLine::Separator);
            }
        }
        current = Some(row.category.clone());
        lines.push(ReportLine::Row(row));
    }

    lines
}

#[derive(Debug, Clone)]
pub struct Report {
    pub date: NaiveDate,
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Sorts, rounds, and groups the rows for output.
    pub fn new(mut rows: Vec<MetricRow>, date: NaiveDate) -> Self {
        sort_rows(&mut rows);
        let rows = rows.iter().map(MetricRow::rounded).collect();
        Self {
            date,
            lines: with_separators(rows),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &MetricRow> {
        self.lines.iter().filter_map(|line| match line {
            ReportLine::Row(row) => Some(row),
            ReportLine::Separator => None,
        })
    }

    pub fn ticker_count(&self) -> usize {
        self.rows().count()
    }

    pub fn is_empty(&self) -> bool {
        self.ticker_count() == 0
    }

    pub fn header(&self) -> String {
        format!(
            "Multi-Asset Metrics ({} tickers, {})",
            self.ticker_count(),
            self.date.format("%Y-%m-%d")
        )
    }

    /// Column-aligned table: labels left-aligned, numbers right-aligned.
    pub fn render_table(&self) -> String {
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.lines.len() + 1);
        grid.push(COLUMNS.iter().map(|c| c.to_string()).collect());
        for line in &self.lines {
            match line {
                ReportLine::Row(row) => grid.push(row.display_cells()),
                ReportLine::Separator => grid.push(vec![String::new(); COLUMNS.len()]),
            }
        }

        let mut widths = vec![0usize; COLUMNS.len()];
        for cells in &grid {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for cells in &grid {
            let line = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, &width))| {
                    if i < 3 {
                        pad_right(cell, width)
                    } else {
                        pad_left(cell, width)
                    }
                })
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    pub fn write_csv_to<W: Write>(&self, writer: W, missing_marker: &str) -> Result<()> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(COLUMNS)?;

        for line in &self.lines {
            match line {
                ReportLine::Row(row) => writer.write_record(row.csv_fields(missing_marker))?,
                ReportLine::Separator => writer.write_record(vec![""; COLUMNS.len()])?,
            }
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path, missing_marker: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_csv_to(file, missing_marker)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

// `{:<width$}` counts chars, not display columns, which is what we measure with
fn pad_right(cell: &str, width: usize) -> String {
    format!("{:<width$}", cell, width = width)
}

fn pad_left(cell: &str, width: usize) -> String {
    format!("{:>width$}", cell, width = width)
}
