//! Decision policies: turn a percentage move plus a bias into an action and size.
//!
//! Two named policies exist:
//!
//! - [`WindowStartPolicy`]: move measured against the first day of the trend
//!   window; size = base_shares * (buy|sell) multiplier, rounded.
//! - [`PreviousDayPolicy`]: move measured against the previous trading day;
//!   size = a bias-scaled fraction of cash (BUY) or shares held (SELL).
//!
//! All moves and thresholds are fractions (0.05 = 5%).

use serde::Serialize;
use std::fmt;

use super::bias::{BiasScore, TrendScore};

/// Base fraction of cash (or shares) committed per threshold multiple.
pub const BASE_FRACTION: f64 = 0.05;
/// Upper bound on the fraction committed in a single decision.
pub const MAX_FRACTION: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub quantity: u64,
    /// Fraction of cash (BUY) or holdings (SELL) behind the quantity; 0 for
    /// window-start decisions and HOLD.
    pub fraction: f64,
}

impl Decision {
    pub fn hold() -> Self {
        Decision {
            action: Action::Hold,
            quantity: 0,
            fraction: 0.0,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStartPolicy {
    pub threshold: f64,
    pub base_shares: u32,
}

impl WindowStartPolicy {
    pub fn decide(&self, pct_change_vs_start: f64, score: &TrendScore) -> Decision {
        let (action, multiplier) = if pct_change_vs_start >= self.threshold {
            (Action::Sell, score.sell_multiplier)
        } else if pct_change_vs_start <= -self.threshold {
            (Action::Buy, score.buy_multiplier)
        } else {
            return Decision::hold();
        };

        Decision {
            action,
            quantity: (f64::from(self.base_shares) * multiplier).round_ties_even() as u64,
            fraction: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviousDayPolicy {
    pub threshold: f64,
}

impl PreviousDayPolicy {
    /// Fraction to commit for a move `factor` threshold-multiples in size.
    pub fn sizing_fraction(factor: f64, bias: f64) -> f64 {
        (BASE_FRACTION * factor * bias).clamp(0.0, MAX_FRACTION)
    }

    /// Never fails: any zero-quantity outcome is a HOLD.
    pub fn decide(
        &self,
        daily_move: f64,
        bias: &BiasScore,
        price: f64,
        cash: f64,
        shares_held: u64,
    ) -> Decision {
        if daily_move <= -self.threshold {
            let drop_factor = daily_move.abs() / self.threshold;
            let fraction = Self::sizing_fraction(drop_factor, bias.buy_scale());
            let quantity = floor_quantity(cash * fraction / price);
            if quantity > 0 {
                return Decision {
                    action: Action::Buy,
                    quantity,
                    fraction,
                };
            }
        } else if daily_move >= self.threshold && shares_held > 0 {
            let rise_factor = daily_move / self.threshold;
            let fraction = Self::sizing_fraction(rise_factor, bias.sell_scale());
            let quantity = floor_quantity(shares_held as f64 * fraction).min(shares_held);
            if quantity > 0 {
                return Decision {
                    action: Action::Sell,
                    quantity,
                    fraction,
                };
            }
        }
        Decision::hold()
    }
}

// Negative or non-finite sizes (e.g. cash driven below zero) collapse to 0.
fn floor_quantity(raw: f64) -> u64 {
    if raw.is_finite() && raw >= 1.0 {
        raw.floor() as u64
    } else {
        0
    }
}
