//! Day-by-day portfolio simulation.
//!
//! Replays [`PreviousDayPolicy`] over the trading days in a date range. Days
//! with `index <= lookback_days` are warm-up and get no decision. A day whose
//! bias cannot be scored is skipped without aborting the run.

use chrono::NaiveDate;
use serde::Serialize;

use super::bias::{BiasKind, BiasScorer};
use super::daily_move::DailyMoveTable;
use super::decision::{Action, Decision, PreviousDayPolicy};
use super::error::BiastraderError;
use super::lot::Lot;
use super::portfolio::{DayRecord, PortfolioState};
use super::price::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub starting_cash: f64,
    pub threshold: f64,
    pub lookback_days: u32,
    pub bias: BiasKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            starting_cash: 10_000.0,
            threshold: 0.01,
            lookback_days: 10,
            bias: BiasKind::Volatility,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastDecision {
    pub date: NaiveDate,
    pub action: Action,
    pub quantity: u64,
}

/// The per-run result record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub bias: BiasKind,
    pub threshold: f64,
    pub lookback_days: u32,
    pub starting_cash: f64,
    pub final_cash: f64,
    pub final_date: NaiveDate,
    pub final_price: f64,
    pub final_valuation: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub lots: Vec<Lot>,
    pub last_decision: Option<LastDecision>,
    pub buys: usize,
    pub sells: usize,
    pub days: Vec<DayRecord>,
}

impl SimulationResult {
    pub fn shares_held(&self) -> u64 {
        self.lots.iter().map(|l| l.quantity).sum()
    }
}

pub fn run_simulation(
    series: &PriceSeries,
    config: &SimulationConfig,
) -> Result<SimulationResult, BiastraderError> {
    let moves = DailyMoveTable::compute(series);
    let scorer = config.bias.scorer(config.lookback_days);
    run_simulation_with(series, &moves, scorer.as_ref(), config)
}

/// Run with an explicit scorer and a precomputed move table.
pub fn run_simulation_with(
    series: &PriceSeries,
    moves: &DailyMoveTable,
    scorer: &dyn BiasScorer,
    config: &SimulationConfig,
) -> Result<SimulationResult, BiastraderError> {
    let range = series.index_range(config.start_date, config.end_date)?;
    let policy = PreviousDayPolicy {
        threshold: config.threshold,
    };
    let warmup = config.lookback_days as usize;

    let mut state = PortfolioState::new(config.starting_cash);
    let mut days = Vec::with_capacity(range.end() - range.start() + 1);
    let mut last_decision = None;
    let mut buys = 0;
    let mut sells = 0;

    for i in range.clone() {
        let point = series.points()[i];
        let daily_move = moves.pct_change(i).unwrap_or(0.0);
        let mut record = DayRecord {
            date: point.date,
            price: point.close,
            daily_move,
            evaluated: false,
            bias: None,
            action: Action::Hold,
            quantity: 0,
            cash: state.cash,
            shares_held: state.shares_held(),
            equity: state.valuation(point.close),
        };

        if i > warmup {
            match scorer.score(series, moves, i) {
                Ok(score) => {
                    let decision = policy.decide(
                        daily_move,
                        &score,
                        point.close,
                        state.cash,
                        state.shares_held(),
                    );
                    let filled = state.apply_decision(&decision, point.close, point.date);
                    let executed = if filled > 0 {
                        Decision {
                            quantity: filled,
                            ..decision
                        }
                    } else {
                        Decision::hold()
                    };

                    match executed.action {
                        Action::Buy => buys += 1,
                        Action::Sell => sells += 1,
                        Action::Hold => {}
                    }
                    if !executed.is_hold() {
                        tracing::debug!(
                            date = %point.date,
                            action = %executed.action,
                            quantity = executed.quantity,
                            price = point.close,
                            cash = state.cash,
                            "trade executed"
                        );
                    }

                    record.evaluated = true;
                    record.bias = Some(score.value());
                    record.action = executed.action;
                    record.quantity = executed.quantity;
                    record.cash = state.cash;
                    record.shares_held = state.shares_held();
                    record.equity = state.valuation(point.close);

                    last_decision = Some(LastDecision {
                        date: point.date,
                        action: executed.action,
                        quantity: executed.quantity,
                    });
                }
                Err(e) => {
                    tracing::debug!(date = %point.date, error = %e, "skipping day");
                }
            }
        }

        days.push(record);
    }

    let final_point = series.points()[*range.end()];
    let final_valuation = state.valuation(final_point.close);
    let profit = final_valuation - config.starting_cash;
    let profit_pct = if config.starting_cash > 0.0 {
        profit / config.starting_cash
    } else {
        0.0
    };

    Ok(SimulationResult {
        bias: scorer.kind(),
        threshold: config.threshold,
        lookback_days: config.lookback_days,
        starting_cash: config.starting_cash,
        final_cash: state.cash,
        final_date: final_point.date,
        final_price: final_point.close,
        final_valuation,
        profit,
        profit_pct,
        lots: state.lots.to_vec(),
        last_decision,
        buys,
        sells,
        days,
    })
}
