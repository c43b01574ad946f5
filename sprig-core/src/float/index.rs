//! Order-preserving bijection between IEEE-754 values and integer indices.
//!
//! Non-negative values are numbered from `+0` (index 0) upward, one index per
//! representable value, `+Infinity` taking the index right after the largest
//! finite value. Negative values mirror them with `index(-x) = -index(x) - 1`,
//! which keeps `-0` and `+0` adjacent. NaN has no index.

/// A float split into exponent and significand.
///
/// At the minimum exponent the significand ranges over `[0, 2)`, covering the
/// subnormals; above it the significand is in `[1, 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    pub exponent: i32,
    pub significand: f64,
}

/// Shape of an IEEE-754 binary format.
#[derive(Debug, Clone, Copy)]
struct Layout {
    significand_bits: u32,
    min_exponent: i32,
    max_exponent: i32,
}

const DOUBLE: Layout = Layout {
    significand_bits: 52,
    min_exponent: -1022,
    max_exponent: 1023,
};

const FLOAT: Layout = Layout {
    significand_bits: 23,
    min_exponent: -126,
    max_exponent: 127,
};

impl Layout {
    fn scale(&self) -> f64 {
        (1_u64 << self.significand_bits) as f64
    }

    fn exponent_bias(&self) -> i32 {
        self.max_exponent
    }

    /// Index of `+Infinity`, one past the largest finite value.
    fn infinity_index(&self) -> i64 {
        i64::from(self.max_exponent - self.min_exponent + 2) << self.significand_bits
    }

    fn decompose(&self, biased_exponent: u64, fraction: u64) -> Decomposition {
        let fraction = fraction as f64 / self.scale();
        if biased_exponent == 0 {
            Decomposition {
                exponent: self.min_exponent,
                significand: fraction,
            }
        } else {
            Decomposition {
                exponent: biased_exponent as i32 - self.exponent_bias(),
                significand: 1.0 + fraction,
            }
        }
    }

    fn index_of(&self, decomposition: Decomposition) -> i64 {
        let Decomposition {
            exponent,
            significand,
        } = decomposition;
        if exponent == self.min_exponent {
            return (significand * self.scale()) as i64;
        }
        let rescaled = ((significand - 1.0) * self.scale()) as i64;
        let region = i64::from(exponent - self.min_exponent - 1);
        (1_i64 << (self.significand_bits + 1)) + (region << self.significand_bits) + rescaled
    }

    /// Magnitude encoded by a non-negative index below `infinity_index`.
    fn magnitude_at(&self, index: i64) -> f64 {
        let bits = self.significand_bits;
        let low_region = 1_i64 << (bits + 1);
        if index < low_region {
            // Both steps are exact: scaling by powers of two only moves the
            // exponent, and the result is a multiple of the smallest subnormal.
            return index as f64 * power_of_two(self.min_exponent) / self.scale();
        }
        let post = index - low_region;
        let exponent = self.min_exponent + 1 + (post >> bits) as i32;
        let significand = 1.0 + (post & ((1_i64 << bits) - 1)) as f64 / self.scale();
        significand * power_of_two(exponent)
    }
}

/// `2^exponent` for a normal double exponent.
fn power_of_two(exponent: i32) -> f64 {
    f64::from_bits(((exponent + 1023) as u64) << 52)
}

/// Decompose a finite double; `None` for NaN and infinities.
pub fn decompose_f64(value: f64) -> Option<Decomposition> {
    if !value.is_finite() {
        return None;
    }
    let bits = value.abs().to_bits();
    Some(DOUBLE.decompose(bits >> 52, bits & ((1 << 52) - 1)))
}

/// Decompose a finite float; `None` for NaN and infinities.
pub fn decompose_f32(value: f32) -> Option<Decomposition> {
    if !value.is_finite() {
        return None;
    }
    let bits = u64::from(value.abs().to_bits());
    Some(FLOAT.decompose(bits >> 23, bits & ((1 << 23) - 1)))
}

fn signed_index(layout: &Layout, negative: bool, magnitude: Option<Decomposition>) -> i64 {
    let index = match magnitude {
        Some(decomposition) => layout.index_of(decomposition),
        None => layout.infinity_index(),
    };
    if negative {
        -index - 1
    } else {
        index
    }
}

fn value_at(layout: &Layout, index: i64) -> f64 {
    let infinity = layout.infinity_index();
    if index < -infinity - 1 || index > infinity {
        return f64::NAN;
    }
    if index < 0 {
        return -value_at(layout, -index - 1);
    }
    if index == infinity {
        return f64::INFINITY;
    }
    layout.magnitude_at(index)
}

/// Index of a double, `None` for NaN.
pub fn f64_to_index(value: f64) -> Option<i64> {
    if value.is_nan() {
        return None;
    }
    Some(signed_index(
        &DOUBLE,
        value.is_sign_negative(),
        decompose_f64(value),
    ))
}

/// Double at `index`; indices outside `[min_f64_index(), max_f64_index()]`
/// decode to NaN.
pub fn index_to_f64(index: i64) -> f64 {
    value_at(&DOUBLE, index)
}

/// Index of a float, `None` for NaN.
pub fn f32_to_index(value: f32) -> Option<i32> {
    if value.is_nan() {
        return None;
    }
    let index = signed_index(&FLOAT, value.is_sign_negative(), decompose_f32(value));
    i32::try_from(index).ok()
}

/// Float at `index`; indices outside `[min_f32_index(), max_f32_index()]`
/// decode to NaN.
pub fn index_to_f32(index: i32) -> f32 {
    value_at(&FLOAT, i64::from(index)) as f32
}

/// Index of `+Infinity` for doubles.
pub fn max_f64_index() -> i64 {
    DOUBLE.infinity_index()
}

/// Index of `-Infinity` for doubles.
pub fn min_f64_index() -> i64 {
    -DOUBLE.infinity_index() - 1
}

/// Index of `+Infinity` for floats.
pub fn max_f32_index() -> i32 {
    FLOAT.infinity_index() as i32
}

/// Index of `-Infinity` for floats.
pub fn min_f32_index() -> i32 {
    -(FLOAT.infinity_index() as i32) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECIAL_DOUBLES: [f64; 14] = [
        0.0,
        -0.0,
        1.0,
        -1.0,
        0.5,
        f64::MIN_POSITIVE,
        -f64::MIN_POSITIVE,
        f64::EPSILON,
        f64::MAX,
        f64::MIN,
        f64::INFINITY,
        f64::NEG_INFINITY,
        4.9406564584124654e-324,
        -4.9406564584124654e-324,
    ];

    #[test]
    fn test_zero_and_smallest_subnormal() {
        assert_eq!(f64_to_index(0.0), Some(0));
        assert_eq!(f64_to_index(f64::from_bits(1)), Some(1));
        assert_eq!(f32_to_index(0.0), Some(0));
        assert_eq!(f32_to_index(f32::from_bits(1)), Some(1));
    }

    #[test]
    fn test_signed_zeros_are_adjacent() {
        assert_eq!(f64_to_index(-0.0), Some(-1));
        assert_eq!(f32_to_index(-0.0), Some(-1));
        assert!(index_to_f64(-1).is_sign_negative());
        assert_eq!(index_to_f64(-1), 0.0);
        assert!(index_to_f64(0).is_sign_positive());
    }

    #[test]
    fn test_infinities_sit_next_to_the_finite_range() {
        assert_eq!(f64_to_index(f64::INFINITY), Some(max_f64_index()));
        assert_eq!(f64_to_index(f64::MAX), Some(max_f64_index() - 1));
        assert_eq!(f64_to_index(f64::NEG_INFINITY), Some(min_f64_index()));
        assert_eq!(f64_to_index(f64::MIN), Some(min_f64_index() + 1));
        assert_eq!(f32_to_index(f32::INFINITY), Some(max_f32_index()));
        assert_eq!(f32_to_index(f32::MAX), Some(max_f32_index() - 1));
        assert_eq!(f32_to_index(f32::NEG_INFINITY), Some(min_f32_index()));
    }

    #[test]
    fn test_nan_has_no_index() {
        assert_eq!(f64_to_index(f64::NAN), None);
        assert_eq!(f32_to_index(f32::NAN), None);
        assert!(index_to_f64(max_f64_index() + 1).is_nan());
        assert!(index_to_f64(min_f64_index() - 1).is_nan());
        assert!(index_to_f32(max_f32_index() + 1).is_nan());
    }

    #[test]
    fn test_positive_index_matches_bit_pattern() {
        for value in [1.0_f64, 0.1, 3.5e-310, 2.2250738585072014e-308, 1e300, f64::MAX] {
            assert_eq!(f64_to_index(value), Some(value.to_bits() as i64));
        }
        for value in [1.0_f32, 0.1, 1e-40, 3.4e38] {
            assert_eq!(f32_to_index(value), Some(value.to_bits() as i32));
        }
    }

    #[test]
    fn test_decomposition() {
        assert_eq!(
            decompose_f64(6.0),
            Some(Decomposition {
                exponent: 2,
                significand: 1.5
            })
        );
        assert_eq!(
            decompose_f64(f64::from_bits(1)),
            Some(Decomposition {
                exponent: -1022,
                significand: f64::EPSILON
            })
        );
        assert_eq!(
            decompose_f32(f32::MIN_POSITIVE),
            Some(Decomposition {
                exponent: -126,
                significand: 1.0
            })
        );
        assert_eq!(decompose_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_double_round_trip_on_special_values() {
        for value in SPECIAL_DOUBLES {
            let index = f64_to_index(value).unwrap();
            let back = index_to_f64(index);
            assert_eq!(back.to_bits(), value.to_bits(), "{value:e} via {index}");
        }
    }

    #[test]
    fn test_double_index_round_trip_across_the_range() {
        let min = min_f64_index();
        let max = max_f64_index();
        let step = (max / 5003) as i128;
        let mut index = min as i128;
        while index <= max as i128 {
            let i = index as i64;
            assert_eq!(f64_to_index(index_to_f64(i)), Some(i));
            index += step;
        }
        for i in (-70_000..70_000).chain(max - 70_000..=max).chain(min..min + 70_000) {
            assert_eq!(f64_to_index(index_to_f64(i)), Some(i));
        }
    }

    #[test]
    fn test_float_round_trip_over_bit_patterns() {
        for bits in (0..=u32::MAX).step_by(4099) {
            let value = f32::from_bits(bits);
            if value.is_nan() {
                assert_eq!(f32_to_index(value), None);
                continue;
            }
            let index = f32_to_index(value).unwrap();
            assert_eq!(index_to_f32(index).to_bits(), bits);
        }
    }

    #[test]
    fn test_ordering_is_preserved() {
        let mut values: Vec<f64> = SPECIAL_DOUBLES.to_vec();
        values.extend([-1e-300, 1e-300, 123.456, -123.456, 1e308, -1e308]);
        values.sort_by(|a, b| a.total_cmp(b));
        let indices: Vec<i64> = values.iter().map(|v| f64_to_index(*v).unwrap()).collect();
        for pair in indices.windows(2) {
            assert!(pair[0] < pair[1], "{pair:?} out of order");
        }

        let mut floats: Vec<f32> = (0..=u32::MAX)
            .step_by(65_537)
            .map(f32::from_bits)
            .filter(|v| !v.is_nan())
            .collect();
        floats.sort_by(|a, b| a.total_cmp(b));
        let indices: Vec<i32> = floats.iter().map(|v| f32_to_index(*v).unwrap()).collect();
        for pair in indices.windows(2) {
            assert!(pair[0] < pair[1], "{pair:?} out of order");
        }
    }
}
