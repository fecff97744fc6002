// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod api;
pub mod config;
pub mod dashboard;
pub mod finviz;
pub mod fundamentals;
pub mod metrics;
pub mod models;
pub mod prices;
pub mod report;
pub mod tickers;
pub mod utils;
