//! Request pricing and the spending ceiling.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RecapError, Result};

/// Known prices per 1000 tokens, in the provider's billing currency.
pub const KNOWN_MODEL_PRICES: &[(&str, f64)] = &[
    ("gpt-3.5-turbo", 0.0005),
    ("gpt-4o", 0.005),
    ("gpt-4o-mini", 0.00015),
    ("deepseek-chat", 0.00007),
];

/// Multiplier covering currency conversion and margin.
pub const DEFAULT_SURCHARGE: f64 = 1.1;

/// Largest cost a single request may reach.
pub const DEFAULT_COST_CEILING: u64 = 10;

/// Price-per-1000-tokens table with user overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTable {
    overrides: HashMap<String, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table whose entries take priority over the built-in prices.
    pub fn with_overrides(overrides: HashMap<String, f64>) -> Self {
        Self { overrides }
    }

    pub fn set_price(&mut self, model: impl Into<String>, price_per_k: f64) {
        self.overrides.insert(model.into(), price_per_k);
    }

    /// Price per 1000 tokens for an exact model name.
    pub fn price_per_k(&self, model: &str) -> Option<f64> {
        if let Some(price) = self.overrides.get(model) {
            return Some(*price);
        }
        KNOWN_MODEL_PRICES
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, price)| *price)
    }
}

/// Cost of one request. Derived per call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub model: String,
    pub tokens: usize,
    pub cost: u64,
}

#[derive(Debug, Clone)]
pub struct CostEstimator {
    prices: PriceTable,
    surcharge: f64,
    ceiling: u64,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(PriceTable::default(), DEFAULT_SURCHARGE, DEFAULT_COST_CEILING)
    }
}

impl CostEstimator {
    pub fn new(prices: PriceTable, surcharge: f64, ceiling: u64) -> Self {
        Self {
            prices,
            surcharge,
            ceiling,
        }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// `ceil(tokens / 1000 * price * 100 * surcharge) + 1`.
    ///
    /// The flat `+ 1` keeps every request from being free.
    pub fn estimate(&self, tokens: usize, model: &str) -> Result<CostEstimate> {
        let price = self
            .prices
            .price_per_k(model)
            .ok_or_else(|| RecapError::UnknownModel(model.to_string()))?;

        let raw = tokens as f64 / 1000.0 * price * 100.0 * self.surcharge;
        let cost = (raw.ceil() as u64).saturating_add(1);

        Ok(CostEstimate {
            model: model.to_string(),
            tokens,
            cost,
        })
    }

    /// Estimate and reject in one step, using this estimator's ceiling.
    pub fn estimate_within_ceiling(&self, tokens: usize, model: &str) -> Result<CostEstimate> {
        let estimate = self.estimate(tokens, model)?;
        enforce_ceiling(estimate.cost, self.ceiling)?;
        Ok(estimate)
    }
}

/// Fails with [`RecapError::BudgetExceeded`] when `cost > limit`.
pub fn enforce_ceiling(cost: u64, limit: u64) -> Result<()> {
    if cost > limit {
        return Err(RecapError::BudgetExceeded { cost, limit });
    }
    Ok(())
}
