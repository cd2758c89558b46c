//! Property tests for scoring bounds and portfolio invariants.

mod common;

use approx::relative_eq;
use biastrader::domain::bias::{BiasKind, BiasScore, TrendBias, VolatilityBias};
use biastrader::domain::daily_move::DailyMoveTable;
use biastrader::domain::decision::{Action, Decision, MAX_FRACTION, PreviousDayPolicy};
use biastrader::domain::lot::{Lot, LotQueue};
use biastrader::domain::portfolio::PortfolioState;
use biastrader::domain::simulation::{SimulationConfig, run_simulation};
use common::*;
use proptest::prelude::*;

fn closes_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, 2..80)
}

#[derive(Debug, Clone)]
enum Op {
    Buy(u64, f64),
    Sell(u64, f64),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            (1u64..50, 1.0f64..200.0).prop_map(|(q, p)| Op::Buy(q, p)),
            (1u64..80, 1.0f64..200.0).prop_map(|(q, p)| Op::Sell(q, p)),
        ],
        0..40,
    )
}

/// Reference FIFO drain: shrink or drop lots strictly from the front.
fn drain_oldest_first(lots: &[Lot], mut quantity: u64) -> Vec<Lot> {
    let mut out = Vec::new();
    for lot in lots {
        let taken = lot.quantity.min(quantity);
        quantity -= taken;
        if lot.quantity > taken {
            out.push(Lot {
                quantity: lot.quantity - taken,
                ..*lot
            });
        }
    }
    out
}

proptest! {
    #[test]
    fn daily_moves_match_recomputation(closes in closes_strategy()) {
        let series = series_from_closes(&closes);
        let moves = DailyMoveTable::compute(&series);

        prop_assert_eq!(moves.len(), closes.len());
        prop_assert_eq!(moves.pct_change(0), Some(0.0));
        for i in 1..closes.len() {
            let expected = (closes[i] - closes[i - 1]) / closes[i - 1];
            prop_assert_eq!(moves.pct_change(i), Some(expected));
        }
    }

    #[test]
    fn trend_bias_is_bounded_and_one_sided(
        closes in closes_strategy(),
        lookback in 1u32..60,
    ) {
        let series = series_from_closes(&closes);
        for today in 1..series.len() {
            let score = TrendBias { lookback_days: lookback }.compute(&series, today).unwrap();
            prop_assert!((-1.0..=1.0).contains(&score.raw_bias));
            prop_assert!((1.0..=3.0).contains(&score.buy_multiplier));
            prop_assert!((1.0..=3.0).contains(&score.sell_multiplier));
            prop_assert!(!(score.buy_multiplier > 1.0 && score.sell_multiplier > 1.0));
        }
    }

    #[test]
    fn volatility_bias_is_bounded(
        closes in closes_strategy(),
        lookback in 0u32..60,
    ) {
        let moves = DailyMoveTable::from_closes(&closes);
        for today in 0..closes.len() {
            let bias = VolatilityBias { lookback_days: lookback }.compute(&moves, today);
            prop_assert!((0.5..=2.0).contains(&bias));
        }
    }

    #[test]
    fn decision_never_oversells_or_exceeds_cap(
        daily_move in -0.5f64..0.5,
        threshold in 0.001f64..0.2,
        bias in 0.5f64..2.0,
        price in 1.0f64..500.0,
        cash in 0.0f64..100_000.0,
        shares in 0u64..1_000,
    ) {
        let policy = PreviousDayPolicy { threshold };
        let decision = policy.decide(
            daily_move,
            &BiasScore::Volatility { bias },
            price,
            cash,
            shares,
        );
        prop_assert!(decision.fraction <= MAX_FRACTION);
        match decision.action {
            Action::Buy => {
                prop_assert!(decision.quantity > 0);
                prop_assert!(
                    price * decision.quantity as f64 <= cash * MAX_FRACTION * (1.0 + 1e-9)
                );
            }
            Action::Sell => {
                prop_assert!(decision.quantity > 0);
                prop_assert!(decision.quantity <= shares);
            }
            Action::Hold => prop_assert_eq!(decision.quantity, 0),
        }
    }

    #[test]
    fn lot_queue_is_fifo_and_conserves_shares(ops in ops_strategy()) {
        let mut state = PortfolioState::new(1_000_000.0);
        let mut bought = 0u64;
        let mut sold = 0u64;
        let day = date(2024, 1, 1);

        for op in ops {
            let before: Vec<Lot> = state.lots.to_vec();
            let cash_before = state.cash;
            match op {
                Op::Buy(q, p) => {
                    let filled = state.apply_decision(
                        &Decision { action: Action::Buy, quantity: q, fraction: 0.0 },
                        p,
                        day,
                    );
                    bought += filled;
                    prop_assert!((state.cash + filled as f64 * p - cash_before).abs() < 1e-6);
                }
                Op::Sell(q, p) => {
                    let filled = state.apply_decision(
                        &Decision { action: Action::Sell, quantity: q, fraction: 0.0 },
                        p,
                        day,
                    );
                    sold += filled;
                    prop_assert!((state.cash - (cash_before + filled as f64 * p)).abs() < 1e-6);

                    prop_assert_eq!(state.lots.to_vec(), drain_oldest_first(&before, filled));
                }
            }
            prop_assert_eq!(state.shares_held(), bought - sold);
        }
    }

    #[test]
    fn hold_is_bit_identical(cash in 0.0f64..1e6, quantities in prop::collection::vec(1u64..100, 0..10)) {
        let lots: LotQueue = quantities
            .iter()
            .map(|&quantity| Lot { purchase_price: 10.0, quantity, purchase_date: date(2024, 1, 1) })
            .collect();
        let mut state = PortfolioState { cash, lots };
        let before = state.clone();
        prop_assert_eq!(state.apply_decision(&Decision::hold(), 42.0, date(2024, 1, 2)), 0);
        prop_assert_eq!(state.cash.to_bits(), before.cash.to_bits());
        prop_assert_eq!(state, before);
    }

    #[test]
    fn simulation_valuation_is_cash_plus_lots(
        closes in prop::collection::vec(5.0f64..200.0, 3..60),
        threshold in 0.005f64..0.1,
        lookback in 1u32..10,
        trend in any::<bool>(),
    ) {
        let series = series_from_closes(&closes);
        let config = SimulationConfig {
            starting_cash: 10_000.0,
            threshold,
            lookback_days: lookback,
            bias: if trend { BiasKind::Trend } else { BiasKind::Volatility },
            ..SimulationConfig::default()
        };
        let result = run_simulation(&series, &config).unwrap();
        let last = *closes.last().unwrap();
        let expected = result.final_cash + result.shares_held() as f64 * last;
        // Cash can compound far from its start, so compare relatively.
        prop_assert!(
            relative_eq!(result.final_valuation, expected, epsilon = 1e-6, max_relative = 1e-12),
            "valuation {} vs cash plus lots {}",
            result.final_valuation,
            expected
        );
        prop_assert!(result.final_cash >= -1e-6);
    }
}
