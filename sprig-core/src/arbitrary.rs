//! The generation and shrinking contract.

use crate::combinators::{Filter, Map, NoBias};
use crate::error::{contract_violation, SprigError};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A generator of values of type [`Arbitrary::Item`] with an associated
/// shrinking strategy.
///
/// Arbitraries are explicit values built once per property and reused for
/// every `generate` and `shrink` call. They never carry per-call state.
pub trait Arbitrary {
    /// Type of the produced values.
    type Item: Clone + 'static;

    /// State handed back to [`Arbitrary::shrink`] to resume an exploration.
    type Context: Clone + 'static;

    /// Produce a value, consuming randomness from `rng` only.
    ///
    /// `bias_factor`, when present, is at least 2 and means roughly one
    /// generation in `bias_factor` should favor boundary values.
    fn generate(
        &self,
        rng: &mut Random,
        bias_factor: Option<u32>,
    ) -> Value<Self::Item, Self::Context>;

    /// Whether this arbitrary could have produced `candidate`.
    ///
    /// Used to accept externally supplied values that come without a context.
    fn can_shrink_without_context(&self, candidate: &Self::Item) -> bool;

    /// Candidates strictly smaller than `value`, never `value` itself.
    fn shrink(
        &self,
        value: &Self::Item,
        context: Option<&Self::Context>,
    ) -> Stream<Value<Self::Item, Self::Context>>;

    /// Map a function over the generated values.
    ///
    /// Values that come without a context cannot be shrunk; use
    /// [`Arbitrary::map_invertible`] when an inverse exists.
    fn map<U, F>(self, f: F) -> Map<Self, U>
    where
        Self: Sized,
        F: Fn(Self::Item) -> U + 'static,
        U: Clone + 'static,
    {
        Map::new(self, f, None)
    }

    /// Map a function over the generated values, with an inverse used to
    /// shrink values that come without a context.
    fn map_invertible<U, F, G>(self, f: F, unmap: G) -> Map<Self, U>
    where
        Self: Sized,
        F: Fn(Self::Item) -> U + 'static,
        G: Fn(&U) -> Option<Self::Item> + 'static,
        U: Clone + 'static,
    {
        let unmap: Rc<dyn Fn(&U) -> Option<Self::Item>> = Rc::new(unmap);
        Map::new(self, f, Some(unmap))
    }

    /// Keep only the values satisfying `predicate`.
    fn filter<F>(self, predicate: F) -> Filter<Self>
    where
        Self: Sized,
        F: Fn(&Self::Item) -> bool + 'static,
    {
        Filter::new(self, predicate)
    }

    /// Ignore any bias factor passed to `generate`.
    fn no_bias(self) -> NoBias<Self>
    where
        Self: Sized,
    {
        NoBias::new(self)
    }

    /// Erase the concrete type, keeping only the item type.
    fn boxed(self) -> BoxedArbitrary<Self::Item>
    where
        Self: Sized + 'static,
    {
        BoxedArbitrary::new(self)
    }
}

/// Type-erased shrink context carried by [`BoxedArbitrary`].
///
/// The concrete context is checked back at runtime when shrinking; a context
/// of the wrong type is a [`SprigError::MalformedContext`].
#[derive(Clone)]
pub struct ErasedContext(Rc<dyn Any>);

impl ErasedContext {
    pub fn new<C: 'static>(context: C) -> Self {
        ErasedContext(Rc::new(context))
    }

    pub fn downcast_ref<C: 'static>(&self) -> Option<&C> {
        self.0.downcast_ref::<C>()
    }
}

impl fmt::Debug for ErasedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErasedContext(..)")
    }
}

trait DynArbitrary<T> {
    fn generate_dyn(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<T, ErasedContext>;
    fn can_shrink_dyn(&self, candidate: &T) -> bool;
    fn shrink_dyn(&self, value: &T, context: Option<&ErasedContext>)
        -> Stream<Value<T, ErasedContext>>;
}

impl<A> DynArbitrary<A::Item> for A
where
    A: Arbitrary,
{
    fn generate_dyn(
        &self,
        rng: &mut Random,
        bias_factor: Option<u32>,
    ) -> Value<A::Item, ErasedContext> {
        self.generate(rng, bias_factor)
            .map_context(ErasedContext::new)
    }

    fn can_shrink_dyn(&self, candidate: &A::Item) -> bool {
        self.can_shrink_without_context(candidate)
    }

    fn shrink_dyn(
        &self,
        value: &A::Item,
        context: Option<&ErasedContext>,
    ) -> Stream<Value<A::Item, ErasedContext>> {
        let context = context.map(|erased| match erased.downcast_ref::<A::Context>() {
            Some(context) => context,
            None => contract_violation(SprigError::MalformedContext {
                arbitrary: std::any::type_name::<A>(),
                reason: format!(
                    "expected a context of type {}",
                    std::any::type_name::<A::Context>()
                ),
            }),
        });
        self.shrink(value, context)
            .map(|v| v.map_context(ErasedContext::new))
    }
}

/// An arbitrary whose concrete type has been erased.
///
/// Cheap to clone: clones share the same underlying arbitrary.
pub struct BoxedArbitrary<T> {
    inner: Rc<dyn DynArbitrary<T>>,
}

impl<T: Clone + 'static> BoxedArbitrary<T> {
    pub fn new<A>(arbitrary: A) -> Self
    where
        A: Arbitrary<Item = T> + 'static,
    {
        BoxedArbitrary {
            inner: Rc::new(arbitrary),
        }
    }
}

impl<T> Clone for BoxedArbitrary<T> {
    fn clone(&self) -> Self {
        BoxedArbitrary {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for BoxedArbitrary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedArbitrary")
            .field("item", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Clone + 'static> Arbitrary for BoxedArbitrary<T> {
    type Item = T;
    type Context = ErasedContext;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<T, ErasedContext> {
        self.inner.generate_dyn(rng, bias_factor)
    }

    fn can_shrink_without_context(&self, candidate: &T) -> bool {
        self.inner.can_shrink_dyn(candidate)
    }

    fn shrink(
        &self,
        value: &T,
        context: Option<&ErasedContext>,
    ) -> Stream<Value<T, ErasedContext>> {
        self.inner.shrink_dyn(value, context)
    }

    fn boxed(self) -> BoxedArbitrary<T> {
        self
    }
}
