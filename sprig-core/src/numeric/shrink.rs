//! Target-seeking shrink sequence shared by every numeric arbitrary.

use super::Integral;
use crate::stream::Stream;
use crate::value::Value;

/// Candidates moving `current` toward `target`.
///
/// The removed amount starts at the whole gap when `try_target_asap` is set
/// (so `target` itself comes first) and at half the gap otherwise, then keeps
/// halving toward zero. Each candidate carries the previous candidate as its
/// context, the first one carrying `target` (or nothing when trying the
/// target first), so a later shrink resumes where this one stopped.
pub fn shrink_integer<N: Integral>(
    current: N,
    target: N,
    try_target_asap: bool,
) -> Stream<Value<N, N>> {
    let Some(real_gap) = current.checked_minus(&target) else {
        return Stream::nil();
    };
    if real_gap.is_zero() {
        return Stream::nil();
    }

    let first_removal = if try_target_asap {
        real_gap.clone()
    } else {
        real_gap.halve()
    };
    let mut previous = if try_target_asap {
        None
    } else {
        Some(target.clone())
    };

    let removals = std::iter::successors(Some(first_removal), |removed| Some(removed.halve()))
        .take_while(|removed| !removed.is_zero());

    Stream::new(removals).map(move |removed| {
        let next = if removed == real_gap {
            target.clone()
        } else {
            current.minus(&removed)
        };
        let context = previous.replace(next.clone());
        Value::new(next, context)
    })
}
