//! Single-day trend analysis: the threshold-vs-window-start decision.
//!
//! Compares today's close against the first close in the trend window and
//! sizes the trade from base_shares with the TrendBias multipliers.

use chrono::NaiveDate;
use serde::Serialize;

use super::bias::{TrendBias, TrendScore};
use super::decision::{Decision, WindowStartPolicy};
use super::error::BiastraderError;
use super::price::{PriceDelta, PriceSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Calendar days; 6 months is approximated as 180.
    pub lookback_days: u32,
    pub threshold: f64,
    pub base_shares: u32,
    /// Analyze as of this date instead of the latest trading day.
    pub as_of: Option<NaiveDate>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            lookback_days: 180,
            threshold: 0.05,
            base_shares: 5,
            as_of: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub today_date: NaiveDate,
    pub today_price: f64,
    pub start_date: NaiveDate,
    pub start_price: f64,
    pub pct_change_vs_start: f64,
    pub window_delta: PriceDelta,
    /// Sum of day-over-day fractional changes across the window.
    pub cumulative_change: f64,
    pub threshold: f64,
    pub base_shares: u32,
    pub score: TrendScore,
    pub decision: Decision,
}

pub fn analyze(
    series: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<TrendAnalysis, BiastraderError> {
    let today = match config.as_of {
        Some(date) => series.index_of(date)?,
        None => series.len() - 1,
    };

    let score = TrendBias {
        lookback_days: config.lookback_days,
    }
    .compute(series, today)?;

    let today_point = series.points()[today];
    let start_point = series.points()[score.window_start_index];
    let pct_change_vs_start = (today_point.close - start_point.close) / start_point.close;
    let window_delta = series.price_delta(start_point.date, today_point.date)?;
    let cumulative_change = series.cumulative_daily_change(start_point.date, today_point.date);

    let policy = WindowStartPolicy {
        threshold: config.threshold,
        base_shares: config.base_shares,
    };
    let decision = policy.decide(pct_change_vs_start, &score);

    tracing::info!(
        date = %today_point.date,
        action = %decision.action,
        quantity = decision.quantity,
        raw_bias = score.raw_bias,
        "trend analysis complete"
    );

    Ok(TrendAnalysis {
        today_date: today_point.date,
        today_price: today_point.close,
        start_date: start_point.date,
        start_price: start_point.close,
        pct_change_vs_start,
        window_delta,
        cumulative_change,
        threshold: config.threshold,
        base_shares: config.base_shares,
        score,
        decision,
    })
}
