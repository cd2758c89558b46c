//! Parameter sweep over threshold, lookback and bias strategy.
//!
//! Every combination runs an isolated simulation; the best run is the one
//! with the highest profit_pct, the earliest combination winning ties.

use serde::Serialize;

use super::bias::BiasKind;
use super::daily_move::DailyMoveTable;
use super::error::BiastraderError;
use super::price::PriceSeries;
use super::simulation::{SimulationConfig, run_simulation_with};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub thresholds: Vec<f64>,
    pub lookbacks: Vec<u32>,
    pub biases: Vec<BiasKind>,
}

impl SweepConfig {
    /// 1.0% to 25.0% in 0.5% steps.
    pub fn default_thresholds() -> Vec<f64> {
        (10..=250).step_by(5).map(|i| i as f64 / 1000.0).collect()
    }

    pub fn combinations(&self) -> usize {
        self.thresholds.len() * self.lookbacks.len() * self.biases.len()
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            thresholds: Self::default_thresholds(),
            lookbacks: vec![5, 10, 20, 30],
            biases: vec![BiasKind::Volatility, BiasKind::Trend],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub threshold: f64,
    pub lookback_days: u32,
    pub bias: BiasKind,
    pub final_valuation: f64,
    pub profit_pct: f64,
    pub buys: usize,
    pub sells: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    pub best: SweepEntry,
    pub entries: Vec<SweepEntry>,
}

/// Run every combination against `base` (cash and date range are shared).
pub fn run_sweep(
    series: &PriceSeries,
    base: &SimulationConfig,
    sweep: &SweepConfig,
) -> Result<SweepResult, BiastraderError> {
    if sweep.combinations() == 0 {
        return Err(BiastraderError::ConfigInvalid {
            section: "sweep".into(),
            key: "thresholds".into(),
            reason: "sweep grid has no combinations".into(),
        });
    }

    let moves = DailyMoveTable::compute(series);
    let total = sweep.combinations();
    let mut entries: Vec<SweepEntry> = Vec::with_capacity(total);
    let mut best = 0;

    for &bias in &sweep.biases {
        for &lookback_days in &sweep.lookbacks {
            let scorer = bias.scorer(lookback_days);
            for &threshold in &sweep.thresholds {
                let config = SimulationConfig {
                    threshold,
                    lookback_days,
                    bias,
                    ..base.clone()
                };
                let result = run_simulation_with(series, &moves, scorer.as_ref(), &config)?;

                let entry = SweepEntry {
                    threshold,
                    lookback_days,
                    bias,
                    final_valuation: result.final_valuation,
                    profit_pct: result.profit_pct,
                    buys: result.buys,
                    sells: result.sells,
                };
                tracing::debug!(
                    run = entries.len() + 1,
                    total,
                    %bias,
                    lookback_days,
                    threshold,
                    profit_pct = entry.profit_pct,
                    "sweep run"
                );

                if let Some(current) = entries.get(best) {
                    if entry.profit_pct > current.profit_pct {
                        best = entries.len();
                    }
                }
                entries.push(entry);
            }
        }
    }

    let best = entries[best].clone();
    tracing::info!(
        runs = entries.len(),
        bias = %best.bias,
        lookback_days = best.lookback_days,
        threshold = best.threshold,
        profit_pct = best.profit_pct,
        "sweep complete"
    );

    Ok(SweepResult { best, entries })
}
