//! Range splitting used to skew generation toward boundary values.

use super::Integral;
use crate::random::Random;

/// An inclusive sub-range of an arbitrary's legal range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiasRange<N> {
    pub min: N,
    pub max: N,
}

impl<N> BiasRange<N> {
    pub fn new(min: N, max: N) -> Self {
        BiasRange { min, max }
    }
}

/// Split `[min, max]` into the sub-ranges favored by biased generation.
///
/// The first range is the one closest to zero. Widths come from
/// [`Integral::magnitude_log`], so ranges stay small compared to the full one.
pub fn bias_numeric_ranges<N: Integral>(min: &N, max: &N) -> Vec<BiasRange<N>> {
    if min == max {
        return vec![BiasRange::new(min.clone(), max.clone())];
    }

    let zero = N::zero();
    if *min < zero && *max > zero {
        let log_min = min.magnitude_log();
        let log_max = max.magnitude_log();
        return vec![
            BiasRange::new(log_min.negate(), log_max.clone()),
            BiasRange::new(max.minus(&log_max), max.clone()),
            BiasRange::new(min.clone(), min.plus(&log_min)),
        ];
    }

    let log_gap = N::gap_log(min, max);
    let close_to_min = BiasRange::new(min.clone(), min.plus(&log_gap));
    let close_to_max = BiasRange::new(max.minus(&log_gap), max.clone());
    if *min < zero {
        vec![close_to_max, close_to_min]
    } else {
        vec![close_to_min, close_to_max]
    }
}

/// Whether this generation should be biased: one draw in `[1, bias_factor]`,
/// biased when it lands on 1.
pub fn should_bias(rng: &mut Random, bias_factor: Option<u32>) -> bool {
    match bias_factor {
        Some(factor) => rng.next_int(1, i64::from(factor)) == 1,
        None => false,
    }
}

/// Pick one of the biased ranges, giving the first one elevated priority.
///
/// With `n` ranges the draw is over `[-2(n-1), n-2]`: negative draws select
/// the first range, a non-negative `k` selects range `k + 1`.
pub fn pick_biased_range<'a, N>(rng: &mut Random, ranges: &'a [BiasRange<N>]) -> &'a BiasRange<N> {
    if ranges.len() == 1 {
        return &ranges[0];
    }
    let n = ranges.len() as i64;
    let id = rng.next_int(-2 * (n - 1), n - 2);
    if id < 0 {
        &ranges[0]
    } else {
        &ranges[id as usize + 1]
    }
}
