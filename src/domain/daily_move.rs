//! Day-over-day percentage changes.
//!
//! move[0] = 0 (no prior day; never a trading signal)
//! move[i] = (C[i] - C[i-1]) / C[i-1], or 0 if C[i-1] == 0

use serde::Serialize;

use super::price::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyMove {
    pub index: usize,
    pub pct_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMoveTable {
    moves: Vec<DailyMove>,
}

impl DailyMoveTable {
    pub fn compute(series: &PriceSeries) -> Self {
        let closes: Vec<f64> = series.closes().collect();
        Self::from_closes(&closes)
    }

    pub fn from_closes(closes: &[f64]) -> Self {
        let moves = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let pct_change = if i == 0 {
                    0.0
                } else {
                    let prev = closes[i - 1];
                    if prev == 0.0 { 0.0 } else { (close - prev) / prev }
                };
                DailyMove {
                    index: i,
                    pct_change,
                }
            })
            .collect();
        DailyMoveTable { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[DailyMove] {
        &self.moves
    }

    pub fn get(&self, index: usize) -> Option<&DailyMove> {
        self.moves.get(index)
    }

    pub fn pct_change(&self, index: usize) -> Option<f64> {
        self.moves.get(index).map(|m| m.pct_change)
    }
}
