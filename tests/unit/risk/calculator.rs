//! Unit tests for stop-loss and take-profit derivation

use perpscan::models::Direction;
use perpscan::risk::{RiskCalculator, RiskError, RiskInput, RiskPolicy, StopLossMethod};
use proptest::prelude::*;

use crate::candles::flat_series;

fn input(direction: Direction, entry: f64, reference: f64) -> RiskInput<'static> {
    RiskInput {
        direction,
        entry_price: entry,
        reference_level: reference,
        compression_low: None,
        candles: None,
    }
}

fn calculator(policy: RiskPolicy) -> RiskCalculator {
    RiskCalculator::new(policy).unwrap()
}

#[test]
fn test_reference_stop_and_target() {
    let levels = calculator(RiskPolicy::default())
        .calculate(&input(Direction::Long, 112.0, 110.0))
        .unwrap();
    assert!((levels.stop_loss - 107.8).abs() < 1e-9);
    assert!((levels.take_profit - 122.5).abs() < 1e-9);
}

#[test]
fn test_short_mirrors_long() {
    let levels = calculator(RiskPolicy::default())
        .calculate(&input(Direction::Short, 98.0, 100.0))
        .unwrap();
    assert!((levels.stop_loss - 102.0).abs() < 1e-9);
    assert!((levels.take_profit - (98.0 - 4.0 * 2.5)).abs() < 1e-9);
}

#[test]
fn test_stop_clamped_below_entry() {
    let policy = RiskPolicy {
        below_pct: 0.0,
        thin_margin: None,
        ..RiskPolicy::default()
    };
    let levels = calculator(policy)
        .calculate(&input(Direction::Long, 100.1, 100.0))
        .unwrap();
    assert!((levels.stop_loss - 100.1 * 0.99).abs() < 1e-9);
    assert!(levels.stop_loss < 100.1 * 0.99);

    let levels = calculator(policy)
        .calculate(&input(Direction::Short, 99.9, 100.0))
        .unwrap();
    assert!((levels.stop_loss - 99.9 * 1.01).abs() < 1e-9);
    assert!(levels.stop_loss > 99.9 * (2.0 - 0.99));
}

#[test]
fn test_stop_on_the_clamp_boundary_moves_below_it() {
    let policy = RiskPolicy {
        below_pct: 0.0,
        thin_margin: None,
        ..RiskPolicy::default()
    };
    // Entry 100 at reference 99 puts the raw stop exactly on entry * 0.99.
    let levels = calculator(policy)
        .calculate(&input(Direction::Long, 100.0, 99.0))
        .unwrap();
    assert!(levels.stop_loss < 100.0 * 0.99);

    let levels = calculator(policy)
        .calculate(&input(Direction::Long, 100.0, 100.0))
        .unwrap();
    assert!(levels.stop_loss < 100.0 * 0.99);
    let achieved = (levels.take_profit - 100.0) / (100.0 - levels.stop_loss);
    assert!((achieved - 2.5).abs() < 1e-9);
}

#[test]
fn test_short_target_below_zero_is_rejected() {
    // Trap high twice the entry: 20.4 stop, target 10 - 10.4 * 2.5 < 0.
    let err = calculator(RiskPolicy::default())
        .calculate(&input(Direction::Short, 10.0, 20.0))
        .unwrap_err();
    assert!(matches!(err, RiskError::DegenerateTarget { take_profit } if take_profit < 0.0));
}

#[test]
fn test_compression_low_method() {
    let policy = RiskPolicy {
        method: StopLossMethod::CompressionLow { buffer: 0.003 },
        ..RiskPolicy::default()
    };
    let calc = calculator(policy);

    let mut long = input(Direction::Long, 112.0, 110.0);
    long.compression_low = Some(99.0);
    let levels = calc.calculate(&long).unwrap();
    assert!((levels.stop_loss - 99.0 * 0.997).abs() < 1e-9);

    // Without a compression low the reference buffer applies.
    let levels = calc.calculate(&input(Direction::Long, 112.0, 110.0)).unwrap();
    assert!((levels.stop_loss - 107.8).abs() < 1e-9);
}

#[test]
fn test_atr_method_and_fallback() {
    let policy = RiskPolicy {
        method: StopLossMethod::Atr {
            period: 14,
            multiplier: 1.5,
        },
        ..RiskPolicy::default()
    };
    let calc = calculator(policy);

    let candles = flat_series(15);
    let mut with_history = input(Direction::Long, 112.0, 110.0);
    with_history.candles = Some(&candles);
    let levels = calc.calculate(&with_history).unwrap();
    assert!((levels.stop_loss - 109.0).abs() < 1e-9);

    let short_history = flat_series(10);
    let mut fallback = input(Direction::Long, 112.0, 110.0);
    fallback.candles = Some(&short_history);
    let levels = calc.calculate(&fallback).unwrap();
    assert!((levels.stop_loss - 107.8).abs() < 1e-9);
}

#[test]
fn test_invalid_prices() {
    let calc = calculator(RiskPolicy::default());
    assert!(matches!(
        calc.calculate(&input(Direction::Long, 0.0, 110.0)),
        Err(RiskError::InvalidPrice { field: "entry_price", .. })
    ));
    assert!(matches!(
        calc.calculate(&input(Direction::Long, 112.0, f64::INFINITY)),
        Err(RiskError::InvalidPrice { field: "reference_level", .. })
    ));
}

#[test]
fn test_policy_validation() {
    for policy in [
        RiskPolicy {
            risk_reward_ratio: -1.0,
            ..RiskPolicy::default()
        },
        RiskPolicy {
            max_stop_fraction: 1.0,
            ..RiskPolicy::default()
        },
        RiskPolicy {
            below_pct: 0.9,
            ..RiskPolicy::default()
        },
        RiskPolicy {
            method: StopLossMethod::Atr {
                period: 0,
                multiplier: 1.0,
            },
            ..RiskPolicy::default()
        },
    ] {
        assert!(RiskCalculator::new(policy).is_err(), "{policy:?}");
    }
}

proptest! {
    #[test]
    fn prop_long_stop_below_entry_and_ratio_holds(
        entry in 0.0001f64..100_000.0,
        offset in -0.2f64..0.2,
        ratio in 0.5f64..5.0,
    ) {
        let policy = RiskPolicy { risk_reward_ratio: ratio, ..RiskPolicy::default() };
        let reference = entry * (1.0 - offset);
        let levels = calculator(policy)
            .calculate(&input(Direction::Long, entry, reference))
            .unwrap();

        prop_assert!(levels.stop_loss < entry);
        prop_assert!(levels.take_profit > entry);
        let achieved = (levels.take_profit - entry) / (entry - levels.stop_loss);
        prop_assert!((achieved - ratio).abs() <= 1e-6 * ratio);
    }

    #[test]
    fn prop_short_stop_above_entry(
        entry in 0.0001f64..100_000.0,
        offset in -0.2f64..0.2,
    ) {
        let reference = entry * (1.0 + offset);
        let levels = calculator(RiskPolicy::default())
            .calculate(&input(Direction::Short, entry, reference))
            .unwrap();
        prop_assert!(levels.stop_loss > entry);
        prop_assert!(levels.take_profit < entry);
    }

    #[test]
    fn prop_short_target_is_positive_or_rejected(
        entry in 0.0001f64..100_000.0,
        stretch in 1.0f64..5.0,
    ) {
        let reference = entry * stretch;
        match calculator(RiskPolicy::default()).calculate(&input(Direction::Short, entry, reference)) {
            Ok(levels) => prop_assert!(levels.take_profit > 0.0),
            Err(e) => prop_assert!(
                matches!(e, RiskError::DegenerateTarget { .. }),
                "unexpected error {:?}", e
            ),
        }
    }

    #[test]
    fn prop_long_stop_strictly_inside_clamp(
        entry in 0.0001f64..100_000.0,
        offset in -0.05f64..0.05,
    ) {
        let policy = RiskPolicy { below_pct: 0.0, thin_margin: None, ..RiskPolicy::default() };
        let levels = calculator(policy)
            .calculate(&input(Direction::Long, entry, entry * (1.0 - offset)))
            .unwrap();
        prop_assert!(levels.stop_loss < entry * 0.99);
    }
}
