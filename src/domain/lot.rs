//! Purchased share lots and their FIFO queue.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Lot {
    pub purchase_price: f64,
    pub quantity: u64,
    pub purchase_date: NaiveDate,
}

impl Lot {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.purchase_price
    }
}

/// Lots in acquisition order. Insertion order is liquidation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LotQueue {
    lots: VecDeque<Lot>,
}

impl LotQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a lot at the tail. Empty lots are not recorded.
    pub fn push(&mut self, lot: Lot) {
        if lot.quantity > 0 {
            self.lots.push_back(lot);
        }
    }

    /// Remove up to `quantity` shares from the front, shrinking or removing
    /// the oldest lots first. Returns the number of shares actually removed.
    pub fn drain_front(&mut self, quantity: u64) -> u64 {
        let mut remaining = quantity;
        while remaining > 0 {
            let Some(front) = self.lots.front_mut() else {
                break;
            };
            let taken = front.quantity.min(remaining);
            front.quantity -= taken;
            remaining -= taken;
            if front.quantity == 0 {
                self.lots.pop_front();
            }
        }
        quantity - remaining
    }

    pub fn total_quantity(&self) -> u64 {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.lots.iter().map(|l| l.market_value(price)).sum()
    }

    pub fn cost_basis(&self) -> f64 {
        self.lots.iter().map(Lot::cost_basis).sum()
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    pub fn to_vec(&self) -> Vec<Lot> {
        self.lots.iter().copied().collect()
    }
}

impl FromIterator<Lot> for LotQueue {
    fn from_iter<I: IntoIterator<Item = Lot>>(iter: I) -> Self {
        let mut queue = LotQueue::new();
        for lot in iter {
            queue.push(lot);
        }
        queue
    }
}
