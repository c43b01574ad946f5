//! Shrinking correctness properties
//!
//! These properties ensure that the numeric shrink engine emits finite,
//! strictly smaller candidates forming a resumption chain, and that the
//! runner built on it converges to minimal counterexamples.

use crate::{arbitrary_seed, check_meta};
use num_bigint::BigInt;
use sprig::*;

/// Property: shrink streams are finite, skip `current`, stay between
/// `current` and `target`, and chain their contexts
pub fn test_shrink_stream_invariants() {
    let pairs = tuple2(
        integer(-1_000_000, 1_000_000).unwrap(),
        integer(-1_000_000, 1_000_000).unwrap(),
    );
    let prop = for_all(pairs, |&(current, target)| {
        [true, false].into_iter().all(|asap| {
            let shrinks: Vec<Value<i64, i64>> =
                shrink_integer(current, target, asap).take(100).collect();
            let (low, high) = (current.min(target), current.max(target));
            shrinks.len() < 100
                && shrinks.iter().all(|v| v.value != current)
                && (asap || shrinks.iter().all(|v| v.value != target))
                && shrinks.iter().all(|v| low <= v.value && v.value <= high)
                && shrinks
                    .windows(2)
                    .all(|pair| pair[1].context == Some(pair[0].value))
        })
    });
    check_meta("Shrink stream invariants", prop, Config::default().with_seed(11).with_runs(500));
}

/// Concrete scenarios from scratch
pub fn test_concrete_shrinks() {
    let shrinks: Vec<i64> = integer(0, 10).unwrap().shrink(&8, None).map(|v| v.value).collect();
    assert!(shrinks.contains(&0));
    assert!(!shrinks.contains(&8));

    let big = big_int(BigInt::from(-10), BigInt::from(10)).unwrap();
    let shrinks: Vec<BigInt> = big.shrink(&BigInt::from(8), None).map(|v| v.value).collect();
    assert!(shrinks.contains(&BigInt::from(0)));
    println!("✓ Concrete shrink scenarios passed");
}

/// The last chance retry proposes the context value once, without context
pub fn test_last_chance_retry() {
    let arb = integer(-100, 100).unwrap();
    let retry: Vec<_> = arb.shrink(&7, Some(&6)).collect();
    assert_eq!(retry, vec![Value::without_context(6)]);
    let retry: Vec<_> = arb.shrink(&-7, Some(&-6)).collect();
    assert_eq!(retry, vec![Value::without_context(-6)]);
    assert_eq!(arb.shrink(&6, None).next(), Some(Value::without_context(0)));
    println!("✓ Last chance retry passed");
}

/// Property: a threshold property shrinks to exactly the threshold
pub fn test_integer_shrinks_to_threshold() {
    let prop = for_all(tuple2(nat(100_000).unwrap(), arbitrary_seed()), |&(threshold, seed)| {
        let inner = for_all(integer(0, 1_000_000).unwrap(), move |n| *n < threshold);
        match inner.run(&Config::default().with_seed(seed as u64)) {
            Outcome::Failed(failure) => failure.counterexample == threshold,
            Outcome::Passed { .. } => false,
        }
    });
    check_meta("Integer shrinks to threshold", prop, Config::default().with_seed(12).with_runs(30));
}

/// Property: a threshold property over doubles shrinks to exactly the threshold
pub fn test_double_shrinks_to_threshold() {
    let thresholds = double(DoubleConstraints {
        min: Some(0.0),
        max: Some(1e6),
        no_nan: true,
        ..DoubleConstraints::default()
    })
    .unwrap();
    let prop = for_all(tuple2(thresholds, arbitrary_seed()), |&(threshold, seed)| {
        let values = double(DoubleConstraints {
            no_nan: true,
            ..DoubleConstraints::default()
        })
        .unwrap();
        let inner = for_all(values, move |v| *v < threshold);
        match inner.run(&Config::default().with_seed(seed as u64)) {
            Outcome::Failed(failure) => failure.counterexample == threshold,
            Outcome::Passed { .. } => false,
        }
    });
    check_meta("Double shrinks to threshold", prop, Config::default().with_seed(13).with_runs(30));
}

/// Property: big integers shrink to the threshold too
pub fn test_big_int_shrinks_to_threshold() {
    let prop = for_all(tuple2(nat(1_000_000).unwrap(), arbitrary_seed()), |&(threshold, seed)| {
        let limit = BigInt::from(threshold);
        let huge = BigInt::from(i64::MAX) * BigInt::from(1000);
        let inner = for_all(big_int(BigInt::from(0), huge).unwrap(), move |n| *n < limit);
        match inner.run(&Config::default().with_seed(seed as u64)) {
            Outcome::Failed(failure) => failure.counterexample == BigInt::from(threshold),
            Outcome::Passed { .. } => false,
        }
    });
    check_meta("Big integer shrinks to threshold", prop, Config::default().with_seed(14).with_runs(20));
}
