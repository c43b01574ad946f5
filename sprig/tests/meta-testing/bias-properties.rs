//! Bias engine properties
//!
//! Biased sub-ranges must never escape the legal range, and biased
//! generation must never produce out-of-range values.

use crate::{arbitrary_seed, check_meta};
use num_bigint::BigInt;
use sprig::*;

fn ordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Property: every bias range lies within `[min, max]`
pub fn test_bias_ranges_within_bounds() {
    let bounds = tuple2(
        integer(i64::MIN, i64::MAX).unwrap(),
        integer(i64::MIN, i64::MAX).unwrap(),
    );
    let prop = for_all(bounds, |&(a, b)| {
        let (min, max) = ordered(a, b);
        let ranges = bias_numeric_ranges(&min, &max);
        !ranges.is_empty()
            && ranges
                .iter()
                .all(|range| min <= range.min && range.min <= range.max && range.max <= max)
    });
    check_meta("Bias ranges within bounds", prop, Config::default().with_seed(21).with_runs(1000));
}

/// Property: the same holds for big integers, whose log is a digit count
pub fn test_big_int_bias_ranges_within_bounds() {
    let scale = BigInt::from(i64::MAX);
    let bounds = tuple2(
        integer(-1_000_000, 1_000_000).unwrap(),
        integer(-1_000_000, 1_000_000).unwrap(),
    )
    .map(move |(a, b)| (BigInt::from(a) * &scale, BigInt::from(b)));
    let prop = for_all(bounds, |(a, b)| {
        let (min, max) = ordered(a.clone(), b.clone());
        bias_numeric_ranges(&min, &max)
            .iter()
            .all(|range| min <= range.min && range.min <= range.max && range.max <= max)
    });
    check_meta("Big integer bias ranges within bounds", prop, Config::default().with_seed(22));
}

/// Property: biased generation stays in range for any bias factor
pub fn test_biased_generation_within_bounds() {
    let cases = tuple2(
        tuple2(integer(-1_000_000_000, 1_000_000_000).unwrap(), nat(1_000_000_000).unwrap()),
        tuple2(integer(2, 10).unwrap(), arbitrary_seed()),
    );
    let prop = for_all(cases, |&((min, width), (factor, seed))| {
        let max = min + width;
        let arb = integer(min, max).unwrap();
        let mut rng = Random::from_seed(seed as u64);
        (0..200).all(|_| {
            let value = arb.generate(&mut rng, Some(factor as u32)).value;
            min <= value && value <= max
        })
    });
    check_meta("Biased generation within bounds", prop, Config::default().with_seed(23));
}
