//! Engine configuration: policy constants that are not per-run inputs.
//!
//! The fiscal policy rules here (financing mix, surplus treatment, reserve
//! accumulation) are inferred rather than published, so they live in one
//! configurable place instead of inside the projection formulas.

use serde::{Deserialize, Serialize};

/// How a fiscal surplus feeds back into the debt stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurplusPolicy {
    /// Repay debt with the surplus, split by the financing mix.
    ReduceDebt,
    /// Keep debt flat; the surplus is not applied.
    HoldDebt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalPolicy {
    /// Share of the deficit financed externally; the rest is internal.
    pub external_financing_share: f64,
    pub surplus_policy: SurplusPolicy,
    /// Share of the trade balance that accrues to reserves.
    pub trade_balance_retention: f64,
    /// Reserves cannot fall below zero.
    pub floor_reserves_at_zero: bool,
    /// Divisor from raw calibration units (Bs, USD) to millions.
    pub monetary_scale: f64,
}

impl Default for FiscalPolicy {
    fn default() -> Self {
        Self {
            external_financing_share: 0.6,
            surplus_policy:           SurplusPolicy::ReduceDebt,
            trade_balance_retention:  1.0,
            floor_reserves_at_zero:   true,
            monetary_scale:           1_000_000.0,
        }
    }
}

/// Thresholds that put a warning in a year's `cambios` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Debt / GDP, %.
    pub debt_to_gdp: f64,
    /// Deficit / GDP, %.
    pub deficit_to_gdp: f64,
    /// Months of imports covered by reserves.
    pub min_reserve_months: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            debt_to_gdp:        70.0,
            deficit_to_gdp:     5.0,
            min_reserve_months: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub min_iterations: u32,
    pub max_iterations: u32,
    /// Dedicated worker pool size. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            min_iterations: 100,
            max_iterations: 10_000,
            threads:        None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: FiscalPolicy,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

impl EngineConfig {
    /// Load from a JSON file. Missing sections fall back to the defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.check()?;
        Ok(config)
    }

    /// Config with the Monte Carlo floor relaxed to one iteration,
    /// for tests that compare a single iteration against a single path.
    pub fn default_test() -> Self {
        Self {
            monte_carlo: MonteCarloConfig {
                min_iterations: 1,
                ..MonteCarloConfig::default()
            },
            ..Self::default()
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        let share = self.policy.external_financing_share;
        anyhow::ensure!(
            (0.0..=1.0).contains(&share),
            "policy.external_financing_share must be in [0, 1], got {share}"
        );
        anyhow::ensure!(
            self.policy.monetary_scale > 0.0,
            "policy.monetary_scale must be positive"
        );
        anyhow::ensure!(
            self.monte_carlo.min_iterations >= 1
                && self.monte_carlo.min_iterations <= self.monte_carlo.max_iterations,
            "monte_carlo iteration bounds are inconsistent"
        );
        Ok(())
    }
}
