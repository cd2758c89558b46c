//! Bias scoring strategies.
//!
//! A bias is a bounded scalar derived from recent price behaviour that scales
//! trade size. Two independent strategies are provided:
//!
//! - [`TrendBias`]: time- and magnitude-weighted net direction over a
//!   calendar-day window, normalized to [-1, 1], with derived buy/sell
//!   multipliers in [1, 3].
//! - [`VolatilityBias`]: mean absolute daily move over a trading-day window,
//!   mapped to a multiplier in [0.5, 2.0].

use chrono::Days;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::daily_move::DailyMoveTable;
use super::error::BiastraderError;
use super::price::PriceSeries;

/// A single-day move of this size saturates the trend magnitude weight.
pub const MAGNITUDE_SATURATION: f64 = 0.05;
/// Floor on the trend time weight so old days keep a minimal say.
pub const MIN_TIME_WEIGHT: f64 = 0.1;
/// Scale applied to |raw_bias| when deriving buy/sell multipliers.
pub const MULTIPLIER_SCALE: f64 = 2.0;

pub const VOLATILITY_BIAS_MIN: f64 = 0.5;
pub const VOLATILITY_BIAS_MAX: f64 = 2.0;
pub const NEUTRAL_BIAS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendScore {
    pub window_start_index: usize,
    pub window_len: usize,
    pub bias_up: f64,
    pub bias_down: f64,
    pub bias_net: f64,
    /// Net bias normalized by window length, clamped to [-1, 1].
    pub raw_bias: f64,
    pub buy_multiplier: f64,
    pub sell_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BiasScore {
    Trend(TrendScore),
    Volatility { bias: f64 },
}

impl BiasScore {
    /// Headline value: raw_bias for trend, the multiplier for volatility.
    pub fn value(&self) -> f64 {
        match self {
            BiasScore::Trend(t) => t.raw_bias,
            BiasScore::Volatility { bias } => *bias,
        }
    }

    /// Multiplier applied when sizing a BUY.
    pub fn buy_scale(&self) -> f64 {
        match self {
            BiasScore::Trend(t) => t.buy_multiplier,
            BiasScore::Volatility { bias } => *bias,
        }
    }

    /// Multiplier applied when sizing a SELL.
    pub fn sell_scale(&self) -> f64 {
        match self {
            BiasScore::Trend(t) => t.sell_multiplier,
            BiasScore::Volatility { bias } => *bias,
        }
    }
}

/// Common scoring capability shared by both strategies.
pub trait BiasScorer {
    fn kind(&self) -> BiasKind;

    fn score(
        &self,
        series: &PriceSeries,
        moves: &DailyMoveTable,
        today: usize,
    ) -> Result<BiasScore, BiastraderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasKind {
    Trend,
    Volatility,
}

impl BiasKind {
    pub fn scorer(self, lookback_days: u32) -> Box<dyn BiasScorer> {
        match self {
            BiasKind::Trend => Box::new(TrendBias { lookback_days }),
            BiasKind::Volatility => Box::new(VolatilityBias { lookback_days }),
        }
    }
}

impl fmt::Display for BiasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasKind::Trend => write!(f, "trend"),
            BiasKind::Volatility => write!(f, "volatility"),
        }
    }
}

impl FromStr for BiasKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trend" => Ok(BiasKind::Trend),
            "volatility" => Ok(BiasKind::Volatility),
            other => Err(format!(
                "unknown bias '{}', expected 'trend' or 'volatility'",
                other
            )),
        }
    }
}

/// Trend bias over the calendar window `[today - lookback_days, today]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendBias {
    pub lookback_days: u32,
}

impl TrendBias {
    pub fn compute(
        &self,
        series: &PriceSeries,
        today: usize,
    ) -> Result<TrendScore, BiastraderError> {
        let today_point = *series.point(today)?;
        // A lookback reaching past the earliest representable date covers
        // the whole history.
        let start = today_point
            .date
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .map_or(0, |window_start| series.first_index_on_or_after(window_start));
        let window = &series.points()[start..=today];

        if window.len() < 2 {
            return Err(BiastraderError::InsufficientWindow {
                points: window.len(),
                minimum: 2,
            });
        }

        let lookback = f64::from(self.lookback_days);
        let mut bias_up = 0.0;
        let mut bias_down = 0.0;
        let mut bias_net = 0.0;

        for (i, point) in window.iter().enumerate() {
            let days_from_today = (today_point.date - point.date).num_days() as f64;
            let time_weight = (1.0 - days_from_today / lookback).max(MIN_TIME_WEIGHT);

            // Change vs the previous day inside the window, not the series.
            let daily_pct_change = if i == 0 {
                0.0
            } else {
                let prev = window[i - 1].close;
                (point.close - prev) / prev
            };
            let magnitude_weight = (daily_pct_change.abs() / MAGNITUDE_SATURATION).min(1.0);
            let increment = sign(daily_pct_change) * time_weight * magnitude_weight;

            if increment > 0.0 {
                bias_up += increment;
            } else if increment < 0.0 {
                bias_down += increment;
            }
            bias_net += increment;
        }

        let raw_bias = (bias_net / window.len() as f64).clamp(-1.0, 1.0);

        Ok(TrendScore {
            window_start_index: start,
            window_len: window.len(),
            bias_up,
            bias_down,
            bias_net,
            raw_bias,
            buy_multiplier: 1.0 + (-raw_bias).max(0.0) * MULTIPLIER_SCALE,
            sell_multiplier: 1.0 + raw_bias.max(0.0) * MULTIPLIER_SCALE,
        })
    }
}

impl BiasScorer for TrendBias {
    fn kind(&self) -> BiasKind {
        BiasKind::Trend
    }

    fn score(
        &self,
        series: &PriceSeries,
        _moves: &DailyMoveTable,
        today: usize,
    ) -> Result<BiasScore, BiastraderError> {
        self.compute(series, today).map(BiasScore::Trend)
    }
}

/// Volatility bias over the trading-day window
/// `[max(1, today - lookback_days), today)`.
///
/// Index 0 is always excluded since it carries the zero sentinel. An empty
/// window yields the neutral bias rather than an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityBias {
    pub lookback_days: u32,
}

impl VolatilityBias {
    pub fn compute(&self, moves: &DailyMoveTable, today: usize) -> f64 {
        let lo = today.saturating_sub(self.lookback_days as usize).max(1);
        let hi = today.min(moves.len());
        if lo >= hi {
            return NEUTRAL_BIAS;
        }

        let window = &moves.moves()[lo..hi];
        let avg_abs_move =
            window.iter().map(|m| m.pct_change.abs()).sum::<f64>() / window.len() as f64;

        (1.0 + avg_abs_move).clamp(VOLATILITY_BIAS_MIN, VOLATILITY_BIAS_MAX)
    }
}

impl BiasScorer for VolatilityBias {
    fn kind(&self) -> BiasKind {
        BiasKind::Volatility
    }

    fn score(
        &self,
        _series: &PriceSeries,
        moves: &DailyMoveTable,
        today: usize,
    ) -> Result<BiasScore, BiastraderError> {
        Ok(BiasScore::Volatility {
            bias: self.compute(moves, today),
        })
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
