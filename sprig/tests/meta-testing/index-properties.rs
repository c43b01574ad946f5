//! Float index bijection properties
//!
//! Every non-NaN float has exactly one index, indices are consecutive, and the
//! order on indices is the numeric order on floats.

use crate::check_meta;
use sprig::*;

fn any_double() -> FloatArbitrary<f64> {
    double(DoubleConstraints {
        no_nan: true,
        ..DoubleConstraints::default()
    })
    .unwrap()
}

/// Property: decoding the index of a double gives back the same bits
pub fn test_double_round_trip() {
    let prop = for_all(any_double(), |value: &f64| match f64_to_index(*value) {
        Some(index) => index_to_f64(index).to_bits() == value.to_bits(),
        None => false,
    });
    check_meta("Double round trip", prop, Config::default().with_seed(1).with_runs(1000));
}

/// Property: decoding the index of a float gives back the same bits
pub fn test_float_round_trip() {
    let floats = float(FloatConstraints {
        no_nan: true,
        ..FloatConstraints::default()
    })
    .unwrap();
    let prop = for_all(floats, |value: &f32| match f32_to_index(*value) {
        Some(index) => index_to_f32(index).to_bits() == value.to_bits(),
        None => false,
    });
    check_meta("Float round trip", prop, Config::default().with_seed(2).with_runs(1000));
}

/// Property: every index in range decodes to a value with that index
pub fn test_index_round_trip() {
    let indices = integer(min_f64_index(), max_f64_index()).unwrap();
    let prop = for_all(indices, |index| f64_to_index(index_to_f64(*index)) == Some(*index));
    check_meta("Double index round trip", prop, Config::default().with_seed(3).with_runs(1000));

    let indices = integer(i64::from(min_f32_index()), i64::from(max_f32_index())).unwrap();
    let prop = for_all(indices, |index| {
        let index = *index as i32;
        f32_to_index(index_to_f32(index)) == Some(index)
    });
    check_meta("Float index round trip", prop, Config::default().with_seed(4).with_runs(1000));
}

/// Property: ordering on values is the ordering on indices
pub fn test_index_ordering() {
    let prop = for_all(tuple2(any_double(), any_double()), |(a, b)| {
        let (ia, ib) = (f64_to_index(*a), f64_to_index(*b));
        match a.total_cmp(b) {
            std::cmp::Ordering::Less => ia < ib,
            std::cmp::Ordering::Equal => ia == ib,
            std::cmp::Ordering::Greater => ia > ib,
        }
    });
    check_meta("Index ordering", prop, Config::default().with_seed(5).with_runs(1000));
}

/// Concrete scenarios around zero and the smallest subnormal
pub fn test_concrete_indices() {
    assert_eq!(f64_to_index(0.0), Some(0));
    assert_eq!(f64_to_index(f64::from_bits(1)), Some(1));
    assert_eq!(f64_to_index(-0.0), Some(-1));
    assert_eq!(f32_to_index(f32::from_bits(1)), Some(1));
    assert_eq!(f64_to_index(f64::INFINITY), Some(f64_to_index(f64::MAX).unwrap() + 1));
    assert_eq!(f64_to_index(f64::NAN), None);
    println!("✓ Concrete index scenarios passed");
}
