//! Integer and arbitrary-precision integer arbitraries.

use crate::arbitrary::Arbitrary;
use crate::error::{contract_violation, Result, SprigError};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;

pub mod bias;
pub mod shrink;

pub use bias::{bias_numeric_ranges, BiasRange};
pub use shrink::shrink_integer;

/// Integer types the shrink and bias engines work with.
///
/// Arithmetic helpers are only called where the result is known to be in
/// range, except [`Integral::checked_minus`].
pub trait Integral: Clone + Ord + fmt::Debug + 'static {
    fn zero() -> Self;
    fn one() -> Self;
    fn plus(&self, other: &Self) -> Self;
    fn minus(&self, other: &Self) -> Self;
    fn checked_minus(&self, other: &Self) -> Option<Self>;
    fn negate(&self) -> Self;
    /// Division by two, truncating toward zero.
    fn halve(&self) -> Self;
    /// Log-like magnitude of `|self|`: `floor(log2)` for machine integers,
    /// the decimal digit count for big integers. Zero maps to zero.
    fn magnitude_log(&self) -> Self;
    /// `magnitude_log` of `max - min`, computed without overflowing.
    fn gap_log(min: &Self, max: &Self) -> Self;
    /// Uniform draw in `[min, max]`.
    fn draw(rng: &mut Random, min: &Self, max: &Self) -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn sign(&self) -> Ordering {
        self.cmp(&Self::zero())
    }
}

impl Integral for i64 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn plus(&self, other: &Self) -> Self {
        self + other
    }

    fn minus(&self, other: &Self) -> Self {
        self - other
    }

    fn checked_minus(&self, other: &Self) -> Option<Self> {
        i64::checked_sub(*self, *other)
    }

    fn negate(&self) -> Self {
        -self
    }

    fn halve(&self) -> Self {
        self / 2
    }

    fn magnitude_log(&self) -> Self {
        match self.unsigned_abs() {
            0 => 0,
            magnitude => i64::from(magnitude.ilog2()),
        }
    }

    fn gap_log(min: &Self, max: &Self) -> Self {
        let gap = (i128::from(*max) - i128::from(*min)).unsigned_abs();
        match gap {
            0 => 0,
            gap => i64::from(gap.ilog2()),
        }
    }

    fn draw(rng: &mut Random, min: &Self, max: &Self) -> Self {
        rng.next_int(*min, *max)
    }
}

impl Integral for BigInt {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        BigInt::from(1)
    }

    fn plus(&self, other: &Self) -> Self {
        self + other
    }

    fn minus(&self, other: &Self) -> Self {
        self - other
    }

    fn checked_minus(&self, other: &Self) -> Option<Self> {
        Some(self - other)
    }

    fn negate(&self) -> Self {
        -self
    }

    fn halve(&self) -> Self {
        self / 2u32
    }

    fn magnitude_log(&self) -> Self {
        if Zero::is_zero(self) {
            return Zero::zero();
        }
        BigInt::from(self.abs().to_string().len())
    }

    fn gap_log(min: &Self, max: &Self) -> Self {
        (max - min).magnitude_log()
    }

    fn draw(rng: &mut Random, min: &Self, max: &Self) -> Self {
        rng.next_bigint(min, max)
    }
}

/// Integers in `[min, max]`, shrinking toward zero or the bound nearest to it.
pub struct IntegerArbitrary<N: Integral> {
    min: N,
    max: N,
    biased: OnceCell<Vec<BiasRange<N>>>,
}

/// Create an arbitrary for `i64` values in `[min, max]`.
pub fn integer(min: i64, max: i64) -> Result<IntegerArbitrary<i64>> {
    IntegerArbitrary::new(min, max)
}

/// Create an arbitrary for non-negative `i64` values up to `max`.
pub fn nat(max: i64) -> Result<IntegerArbitrary<i64>> {
    IntegerArbitrary::new(0, max)
}

/// Create an arbitrary for big integers in `[min, max]`.
pub fn big_int(min: BigInt, max: BigInt) -> Result<IntegerArbitrary<BigInt>> {
    IntegerArbitrary::new(min, max)
}

impl<N: Integral> IntegerArbitrary<N> {
    pub fn new(min: N, max: N) -> Result<Self> {
        if min > max {
            return Err(SprigError::invalid(format!(
                "min ({min:?}) must be less than or equal to max ({max:?})"
            )));
        }
        Ok(IntegerArbitrary {
            min,
            max,
            biased: OnceCell::new(),
        })
    }

    pub fn min(&self) -> &N {
        &self.min
    }

    pub fn max(&self) -> &N {
        &self.max
    }

    /// Zero when in range, otherwise the bound closest to zero.
    pub fn default_target(&self) -> N {
        let zero = N::zero();
        if self.min <= zero && self.max >= zero {
            zero
        } else if self.min < zero {
            self.max.clone()
        } else {
            self.min.clone()
        }
    }

    fn generate_range(&self, rng: &mut Random, bias_factor: Option<u32>) -> (&N, &N) {
        if !bias::should_bias(rng, bias_factor) {
            return (&self.min, &self.max);
        }
        let ranges = self
            .biased
            .get_or_init(|| bias_numeric_ranges(&self.min, &self.max));
        let range = bias::pick_biased_range(rng, ranges);
        (&range.min, &range.max)
    }

    // Fires once, when the value sits right next to the last known-passing
    // candidate.
    fn is_last_chance_try(&self, current: &N, context: &N) -> bool {
        match current.sign() {
            Ordering::Greater => *current == context.plus(&N::one()) && *current > self.min,
            Ordering::Less => *current == context.minus(&N::one()) && *current < self.max,
            Ordering::Equal => false,
        }
    }

    fn validate_context(current: &N, context: &N) {
        if !context.is_zero() && current.sign() != context.sign() {
            contract_violation(SprigError::MalformedContext {
                arbitrary: "IntegerArbitrary",
                reason: format!("context {context:?} and value {current:?} differ in sign"),
            });
        }
    }
}

impl<N: Integral> fmt::Debug for IntegerArbitrary<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegerArbitrary")
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

impl<N: Integral> Arbitrary for IntegerArbitrary<N> {
    type Item = N;
    type Context = N;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<N, N> {
        let (min, max) = self.generate_range(rng, bias_factor);
        Value::without_context(N::draw(rng, min, max))
    }

    fn can_shrink_without_context(&self, candidate: &N) -> bool {
        self.min <= *candidate && *candidate <= self.max
    }

    fn shrink(&self, current: &N, context: Option<&N>) -> Stream<Value<N, N>> {
        let Some(context) = context else {
            return shrink_integer(current.clone(), self.default_target(), true);
        };
        Self::validate_context(current, context);
        if self.is_last_chance_try(current, context) {
            tracing::trace!(?current, ?context, "integer last chance shrink");
            return Stream::of(vec![Value::without_context(context.clone())]);
        }
        shrink_integer(current.clone(), context.clone(), false)
    }
}
