//! Portfolio state for a single simulation run.

use chrono::NaiveDate;
use serde::Serialize;

use super::decision::{Action, Decision};
use super::lot::{Lot, LotQueue};

/// One trading day's snapshot on the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub daily_move: f64,
    /// False for warm-up days and days the scorer could not evaluate.
    pub evaluated: bool,
    pub bias: Option<f64>,
    pub action: Action,
    pub quantity: u64,
    pub cash: f64,
    pub shares_held: u64,
    pub equity: f64,
}

/// Cash plus a FIFO queue of lots. Owned exclusively by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub lots: LotQueue,
}

impl PortfolioState {
    pub fn new(starting_cash: f64) -> Self {
        PortfolioState {
            cash: starting_cash,
            lots: LotQueue::new(),
        }
    }

    pub fn shares_held(&self) -> u64 {
        self.lots.total_quantity()
    }

    pub fn valuation(&self, price: f64) -> f64 {
        self.cash + self.lots.market_value(price)
    }

    /// Apply a decision at `price`. Returns the number of shares that changed
    /// hands.
    ///
    /// Sells are valued at the current price, not the lots' purchase prices.
    pub fn apply_decision(&mut self, decision: &Decision, price: f64, date: NaiveDate) -> u64 {
        match decision.action {
            Action::Hold => 0,
            Action::Buy => {
                if decision.quantity == 0 {
                    return 0;
                }
                self.cash -= price * decision.quantity as f64;
                self.lots.push(Lot {
                    purchase_price: price,
                    quantity: decision.quantity,
                    purchase_date: date,
                });
                decision.quantity
            }
            Action::Sell => {
                let sold = self.lots.drain_front(decision.quantity);
                self.cash += price * sold as f64;
                sold
            }
        }
    }
}
