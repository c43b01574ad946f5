//! Floating point arbitraries built on the index bijection.
//!
//! A float arbitrary is an integer arbitrary over index space followed by a
//! decode step, so generation, biasing and shrinking all come from the
//! integer engine.

use crate::arbitrary::Arbitrary;
use crate::error::{Result, SprigError};
use crate::numeric::IntegerArbitrary;
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use std::fmt;

pub mod index;

pub use index::{
    decompose_f32, decompose_f64, f32_to_index, f64_to_index, index_to_f32, index_to_f64,
    max_f32_index, max_f64_index, min_f32_index, min_f64_index, Decomposition,
};

/// Floating point types that have an index bijection.
pub trait IndexedFloat: Copy + PartialOrd + fmt::Debug + 'static {
    const MAX: Self;
    const INFINITY: Self;
    const NAN: Self;
    /// Magnitude from which every finite value is an integer.
    const INTEGRAL_FROM: Self;

    fn to_index(self) -> Option<i64>;
    fn from_index(index: i64) -> Self;
    fn is_nan(self) -> bool;
    fn is_integer(self) -> bool;
    fn negate(self) -> Self;
}

impl IndexedFloat for f64 {
    const MAX: Self = f64::MAX;
    const INFINITY: Self = f64::INFINITY;
    const NAN: Self = f64::NAN;
    const INTEGRAL_FROM: Self = 4_503_599_627_370_496.0;

    fn to_index(self) -> Option<i64> {
        f64_to_index(self)
    }

    fn from_index(index: i64) -> Self {
        index_to_f64(index)
    }

    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    fn is_integer(self) -> bool {
        self.is_finite() && self.fract() == 0.0
    }

    fn negate(self) -> Self {
        -self
    }
}

impl IndexedFloat for f32 {
    const MAX: Self = f32::MAX;
    const INFINITY: Self = f32::INFINITY;
    const NAN: Self = f32::NAN;
    const INTEGRAL_FROM: Self = 8_388_608.0;

    fn to_index(self) -> Option<i64> {
        f32_to_index(self).map(i64::from)
    }

    fn from_index(index: i64) -> Self {
        match i32::try_from(index) {
            Ok(index) => index_to_f32(index),
            Err(_) => f32::NAN,
        }
    }

    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }

    fn is_integer(self) -> bool {
        self.is_finite() && self.fract() == 0.0
    }

    fn negate(self) -> Self {
        -self
    }
}

/// Constraints for [`double`] and [`float`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatConstraints<F> {
    /// Lower bound, `-Infinity` (or `-MAX` with `no_default_infinity`) when absent.
    pub min: Option<F>,
    /// Upper bound, `+Infinity` (or `MAX` with `no_default_infinity`) when absent.
    pub max: Option<F>,
    pub min_excluded: bool,
    pub max_excluded: bool,
    pub no_nan: bool,
    pub no_default_infinity: bool,
    pub no_integer: bool,
}

impl<F> Default for FloatConstraints<F> {
    fn default() -> Self {
        FloatConstraints {
            min: None,
            max: None,
            min_excluded: false,
            max_excluded: false,
            no_nan: false,
            no_default_infinity: false,
            no_integer: false,
        }
    }
}

pub type DoubleConstraints = FloatConstraints<f64>;

/// Floating point values in a range, optionally including NaN.
pub struct FloatArbitrary<F> {
    indices: IntegerArbitrary<i64>,
    min_index: i64,
    max_index: i64,
    nan_index: Option<i64>,
    no_integer: bool,
    _float: std::marker::PhantomData<F>,
}

/// Create an arbitrary for `f64` values.
pub fn double(constraints: DoubleConstraints) -> Result<FloatArbitrary<f64>> {
    FloatArbitrary::new(constraints)
}

/// Create an arbitrary for `f32` values.
pub fn float(constraints: FloatConstraints<f32>) -> Result<FloatArbitrary<f32>> {
    FloatArbitrary::new(constraints)
}

fn bound_index<F: IndexedFloat>(value: F, bound: &'static str) -> Result<i64> {
    value.to_index().ok_or(SprigError::NanBound { bound })
}

/// Whether `[low, high]` holds a value that is not a finite integer.
fn has_non_integer<F: IndexedFloat>(low: F, high: F) -> bool {
    if !low.is_integer() || !high.is_integer() {
        return true;
    }
    // Below `INTEGRAL_FROM` consecutive integers have non-integers between them.
    let limit = F::INTEGRAL_FROM;
    let low = if low < limit.negate() { limit.negate() } else { low };
    let high = if high > limit { limit } else { high };
    low < high
}

impl<F: IndexedFloat> FloatArbitrary<F> {
    pub fn new(constraints: FloatConstraints<F>) -> Result<Self> {
        let default_max = if constraints.no_default_infinity {
            F::MAX
        } else {
            F::INFINITY
        };
        let min = constraints.min.unwrap_or(default_max.negate());
        let max = constraints.max.unwrap_or(default_max);

        let min_index = bound_index(min, "min")? + i64::from(constraints.min_excluded);
        let max_index = bound_index(max, "max")? - i64::from(constraints.max_excluded);
        if max_index < min_index {
            return Err(SprigError::invalid(format!(
                "min ({min:?}) must be less than or equal to max ({max:?})"
            )));
        }

        if constraints.no_integer
            && constraints.no_nan
            && !has_non_integer(F::from_index(min_index), F::from_index(max_index))
        {
            return Err(SprigError::invalid(format!(
                "no_integer leaves no value between min ({min:?}) and max ({max:?})"
            )));
        }

        // NaN takes one extra index just outside the range, on the positive
        // side unless the whole range is negative.
        let (nan_index, index_range) = if constraints.no_nan {
            (None, (min_index, max_index))
        } else if max_index > 0 {
            (Some(max_index + 1), (min_index, max_index + 1))
        } else {
            (Some(min_index - 1), (min_index - 1, max_index))
        };

        Ok(FloatArbitrary {
            indices: IntegerArbitrary::new(index_range.0, index_range.1)?,
            min_index,
            max_index,
            nan_index,
            no_integer: constraints.no_integer,
            _float: std::marker::PhantomData,
        })
    }

    fn decode(&self, index: i64) -> F {
        if Some(index) == self.nan_index {
            F::NAN
        } else {
            F::from_index(index)
        }
    }

    fn encode(&self, value: F) -> Option<i64> {
        if value.is_nan() {
            self.nan_index
        } else {
            value.to_index()
        }
    }

    fn accepts(&self, value: F) -> bool {
        !(self.no_integer && value.is_integer())
    }
}

impl<F: IndexedFloat> fmt::Debug for FloatArbitrary<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatArbitrary")
            .field("min", &F::from_index(self.min_index))
            .field("max", &F::from_index(self.max_index))
            .field("nan", &self.nan_index.is_some())
            .field("no_integer", &self.no_integer)
            .finish()
    }
}

impl<F: IndexedFloat> Arbitrary for FloatArbitrary<F> {
    type Item = F;
    type Context = i64;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<F, i64> {
        loop {
            let (index, context) = self.indices.generate(rng, bias_factor).into_parts();
            let value = self.decode(index);
            if self.accepts(value) {
                return Value::new(value, context);
            }
        }
    }

    fn can_shrink_without_context(&self, candidate: &F) -> bool {
        if candidate.is_nan() {
            return self.nan_index.is_some();
        }
        match candidate.to_index() {
            Some(index) => {
                self.min_index <= index && index <= self.max_index && self.accepts(*candidate)
            }
            None => false,
        }
    }

    fn shrink(&self, value: &F, context: Option<&i64>) -> Stream<Value<F, i64>> {
        let Some(index) = self.encode(*value) else {
            return Stream::nil();
        };
        let nan_index = self.nan_index;
        let no_integer = self.no_integer;
        self.indices
            .shrink(&index, context)
            .map(move |candidate| {
                candidate.map(|index| {
                    if Some(index) == nan_index {
                        F::NAN
                    } else {
                        F::from_index(index)
                    }
                })
            })
            .filter(move |candidate| !(no_integer && candidate.value.is_integer()))
    }
}
