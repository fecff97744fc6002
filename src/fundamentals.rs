// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Forward P/E and EPS growth with a two-source fallback.
//!
//! The primary source is asked first. Only when it lacks a forward P/E or an
//! EPS growth figure is the secondary source consulted, and the two results
//! are merged field by field with the primary taking precedence. Each
//! source's answer is memoized per symbol for the life of the resolver.

use std::collections::HashMap;

use crate::api::FundamentalsProvider;
use crate::models::EpsSnapshot;
use crate::utils::percent_diff;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fundamentals {
    pub forward_pe: Option<f64>,
    pub eps_growth: Option<f64>,
}

impl Fundamentals {
    pub fn is_complete(&self) -> bool {
        self.forward_pe.is_some() && self.eps_growth.is_some()
    }

    /// Field-wise: keep our value where defined, otherwise take `other`'s.
    pub fn or(self, other: Fundamentals) -> Fundamentals {
        Fundamentals {
            forward_pe: self.forward_pe.or(other.forward_pe),
            eps_growth: self.eps_growth.or(other.eps_growth),
        }
    }
}

impl From<EpsSnapshot> for Fundamentals {
    fn from(snapshot: EpsSnapshot) -> Self {
        Fundamentals {
            forward_pe: snapshot.forward_pe.filter(|pe| *pe != 0.0 && pe.is_finite()),
            eps_growth: eps_growth(snapshot.trailing_eps, snapshot.forward_eps),
        }
    }
}

/// Growth from trailing to forward EPS; both must be present and non-zero.
pub fn eps_growth(trailing: Option<f64>, forward: Option<f64>) -> Option<f64> {
    match (trailing, forward) {
        (Some(t), Some(f)) if t != 0.0 && f != 0.0 => percent_diff(f, t),
        _ => None,
    }
}

/// Merge records given in preference order; the first defined value of each
/// field wins.
pub fn merge_by_priority<I>(records: I) -> Fundamentals
where
    I: IntoIterator<Item = Fundamentals>,
{
    records
        .into_iter()
        .fold(Fundamentals::default(), Fundamentals::or)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// The primary source had everything
    PrimaryOnly,
    /// The secondary source was consulted and merged in
    Merged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub fundamentals: Fundamentals,
    pub state: ResolutionState,
}

pub struct FundamentalsResolver<P, S> {
    primary: P,
    secondary: S,
    primary_cache: HashMap<String, Fundamentals>,
    secondary_cache: HashMap<String, Fundamentals>,
}

impl<P, S> FundamentalsResolver<P, S>
where
    P: FundamentalsProvider,
    S: FundamentalsProvider,
{
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            primary_cache: HashMap::new(),
            secondary_cache: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, symbol: &str) -> Resolved {
        let primary = self.from_primary(symbol).await;
        if primary.is_complete() {
            return Resolved {
                fundamentals: primary,
                state: ResolutionState::PrimaryOnly,
            };
        }

        let secondary = self.from_secondary(symbol).await;
        Resolved {
            fundamentals: merge_by_priority([primary, secondary]),
            state: ResolutionState::Merged,
        }
    }

    /// Symbols whose primary record was incomplete and went to the secondary source
    pub fn fallback_count(&self) -> usize {
        self.secondary_cache.len()
    }

    async fn from_primary(&mut self, symbol: &str) -> Fundamentals {
        if let Some(cached) = self.primary_cache.get(symbol) {
            return *cached;
        }

        let fundamentals = match self.primary.eps_snapshot(symbol).await {
            Ok(snapshot) => Fundamentals::from(snapshot),
            Err(e) => {
                tracing::warn!("Primary fundamentals lookup failed for {}: {:#}", symbol, e);
                Fundamentals::default()
            }
        };

        self.primary_cache.insert(symbol.to_string(), fundamentals);
        fundamentals
    }

    async fn from_secondary(&mut self, symbol: &str) -> Fundamentals {
        if let Some(cached) = self.secondary_cache.get(symbol) {
            return *cached;
        }

        let fundamentals = match self.secondary.eps_snapshot(symbol).await {
            Ok(snapshot) => Fundamentals::from(snapshot),
            Err(e) => {
                tracing::debug!("Fallback fundamentals unavailable for {}: {:#}", symbol, e);
                Fundamentals::default()
            }
        };

        self.secondary_cache.insert(symbol.to_string(), fundamentals);
        fundamentals
    }
}
