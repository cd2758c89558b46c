//! Performance metrics for a simulation run.

use serde::Serialize;

use super::decision::Action;
use super::portfolio::DayRecord;
use super::simulation::SimulationResult;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub buy_count: usize,
    pub sell_count: usize,
    pub shares_bought: u64,
    pub shares_sold: u64,
    pub days_evaluated: usize,
}

impl RunMetrics {
    pub fn compute(result: &SimulationResult) -> Self {
        let initial = result.starting_cash;
        let total_return = if initial > 0.0 {
            (result.final_valuation - initial) / initial
        } else {
            0.0
        };

        let trading_days = result.days.len() as f64;
        let years = trading_days / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.days);

        let mut shares_bought = 0u64;
        let mut shares_sold = 0u64;
        for day in &result.days {
            match day.action {
                Action::Buy => shares_bought += day.quantity,
                Action::Sell => shares_sold += day.quantity,
                Action::Hold => {}
            }
        }

        RunMetrics {
            total_return,
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            buy_count: result.buys,
            sell_count: result.sells,
            shares_bought,
            shares_sold,
            days_evaluated: result.days.iter().filter(|d| d.evaluated).count(),
        }
    }
}

fn compute_drawdown(days: &[DayRecord]) -> (f64, i64) {
    if days.is_empty() {
        return (0.0, 0);
    }

    let mut peak = days[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for day in days {
        if day.equity > peak {
            peak = day.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 && day.equity < peak {
            let dd = (peak - day.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bias::BiasKind;
    use chrono::NaiveDate;

    fn day(d: u32, equity: f64, action: Action, quantity: u64) -> DayRecord {
        DayRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            price: 10.0,
            daily_move: 0.0,
            evaluated: true,
            bias: Some(1.0),
            action,
            quantity,
            cash: equity,
            shares_held: 0,
            equity,
        }
    }

    fn result(days: Vec<DayRecord>, final_valuation: f64) -> SimulationResult {
        SimulationResult {
            bias: BiasKind::Volatility,
            threshold: 0.01,
            lookback_days: 1,
            starting_cash: 1_000.0,
            final_cash: final_valuation,
            final_date: days.last().unwrap().date,
            final_price: 10.0,
            final_valuation,
            profit: final_valuation - 1_000.0,
            profit_pct: (final_valuation - 1_000.0) / 1_000.0,
            lots: Vec::new(),
            last_decision: None,
            buys: days.iter().filter(|d| d.action == Action::Buy).count(),
            sells: days.iter().filter(|d| d.action == Action::Sell).count(),
            days,
        }
    }

    #[test]
    fn drawdown_from_peak() {
        let days = vec![
            day(1, 1_000.0, Action::Hold, 0),
            day(2, 1_200.0, Action::Buy, 10),
            day(3, 900.0, Action::Hold, 0),
            day(4, 960.0, Action::Sell, 4),
            day(5, 1_300.0, Action::Hold, 0),
        ];
        let metrics = RunMetrics::compute(&result(days, 1_300.0));

        assert!((metrics.max_drawdown - 0.25).abs() < 1e-12);
        assert_eq!(metrics.max_drawdown_duration, 2);
        assert!((metrics.total_return - 0.3).abs() < 1e-12);
        assert_eq!(metrics.buy_count, 1);
        assert_eq!(metrics.sell_count, 1);
        assert_eq!(metrics.shares_bought, 10);
        assert_eq!(metrics.shares_sold, 4);
        assert_eq!(metrics.days_evaluated, 5);
    }

    #[test]
    fn flat_equity_has_no_drawdown() {
        let days = vec![day(1, 1_000.0, Action::Hold, 0), day(2, 1_000.0, Action::Hold, 0)];
        let metrics = RunMetrics::compute(&result(days, 1_000.0));
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.max_drawdown_duration, 0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.annualized_return, 0.0);
    }

    #[test]
    fn annualized_return_over_one_year() {
        let days: Vec<DayRecord> = (0..252)
            .map(|i| DayRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i),
                ..day(1, 1_000.0, Action::Hold, 0)
            })
            .collect();
        let metrics = RunMetrics::compute(&result(days, 1_100.0));
        assert!((metrics.annualized_return - 0.1).abs() < 1e-9);
    }
}
