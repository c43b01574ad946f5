//! Property runner properties
//!
//! Runs are reproducible from their seed, shrinking stays within its budget,
//! and explicit examples are checked before generated values.

use crate::{arbitrary_seed, check_meta};
use sprig::*;

/// Property: running twice with the same seed gives the same outcome
pub fn test_same_seed_same_outcome() {
    let prop = for_all(arbitrary_seed(), |seed| {
        let inner = for_all(integer(i64::MIN, i64::MAX).unwrap(), |n| n % 13 != 5);
        let config = Config::default().with_seed(*seed as u64);
        inner.run(&config) == inner.run(&config)
    });
    check_meta("Same seed same outcome", prop, Config::default().with_seed(41).with_runs(50));
}

/// Property: no more candidates are evaluated than the shrink limit allows
pub fn test_shrink_limit_respected() {
    let prop = for_all(tuple2(nat(30).unwrap(), arbitrary_seed()), |&(limit, seed)| {
        let inner = for_all(integer(0, i64::MAX).unwrap(), |n| *n < 1_000_000);
        let config = Config::default()
            .with_seed(seed as u64)
            .with_shrinks(limit as usize);
        match inner.run(&config) {
            Outcome::Failed(failure) => failure.shrink_evaluations <= limit as usize,
            Outcome::Passed { .. } => false,
        }
    });
    check_meta("Shrink limit respected", prop, Config::default().with_seed(42).with_runs(50));
}

/// Explicit examples run first and count as tests
pub fn test_examples_checked_first() {
    let prop = for_all(integer(0, 100).unwrap(), |n| *n != 42).with_examples(vec![1, 42]);
    match prop.run(&Config::default().with_seed(0).without_bias()) {
        Outcome::Failed(failure) => {
            assert_eq!(failure.tests_run, 2);
            assert_eq!(failure.counterexample, 42);
            assert_eq!(failure.shrink_steps.len(), 1);
        }
        other => panic!("Expected the example to fail, got: {other}"),
    }

    let prop = for_all(integer(0, 100).unwrap(), |n| *n <= 100).with_examples(vec![3, 4]);
    assert_eq!(
        prop.run(&Config::default().with_runs(10)),
        Outcome::Passed {
            tests_run: 12,
            property_name: None
        }
    );
    println!("✓ Examples checked first passed");
}
