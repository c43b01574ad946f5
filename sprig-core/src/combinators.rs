//! Combinators building new arbitraries out of existing ones.

use crate::arbitrary::{Arbitrary, BoxedArbitrary, ErasedContext};
use crate::error::{Result, SprigError};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use std::cell::Cell;
use std::rc::Rc;

type Mapper<T, U> = Rc<dyn Fn(T) -> U>;
type Unmapper<T, U> = Rc<dyn Fn(&U) -> Option<T>>;
type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

/// Context of a [`Map`]: the source value and its own context.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContext<S, C> {
    pub source: S,
    pub context: Option<C>,
}

/// Arbitrary produced by [`Arbitrary::map`].
pub struct Map<A: Arbitrary, U> {
    inner: A,
    mapper: Mapper<A::Item, U>,
    unmapper: Option<Unmapper<A::Item, U>>,
}

impl<A: Arbitrary, U> Map<A, U> {
    pub(crate) fn new<F>(inner: A, mapper: F, unmapper: Option<Unmapper<A::Item, U>>) -> Self
    where
        F: Fn(A::Item) -> U + 'static,
    {
        Map {
            inner,
            mapper: Rc::new(mapper),
            unmapper,
        }
    }

    fn wrap(
        mapper: &Mapper<A::Item, U>,
        source: Value<A::Item, A::Context>,
    ) -> Value<U, MapContext<A::Item, A::Context>> {
        let mapped = mapper(source.value.clone());
        Value::new(
            mapped,
            Some(MapContext {
                source: source.value,
                context: source.context,
            }),
        )
    }
}

impl<A, U> Arbitrary for Map<A, U>
where
    A: Arbitrary,
    U: Clone + 'static,
{
    type Item = U;
    type Context = MapContext<A::Item, A::Context>;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<U, Self::Context> {
        Self::wrap(&self.mapper, self.inner.generate(rng, bias_factor))
    }

    fn can_shrink_without_context(&self, candidate: &U) -> bool {
        match &self.unmapper {
            Some(unmap) => match unmap(candidate) {
                Some(source) => self.inner.can_shrink_without_context(&source),
                None => false,
            },
            None => false,
        }
    }

    fn shrink(&self, value: &U, context: Option<&Self::Context>) -> Stream<Value<U, Self::Context>> {
        let mapper = self.mapper.clone();
        match context {
            Some(context) => self
                .inner
                .shrink(&context.source, context.context.as_ref())
                .map(move |v| Self::wrap(&mapper, v)),
            None => match self.unmapper.as_ref().and_then(|unmap| unmap(value)) {
                Some(source) => self
                    .inner
                    .shrink(&source, None)
                    .map(move |v| Self::wrap(&mapper, v)),
                None => Stream::nil(),
            },
        }
    }
}

/// Arbitrary produced by [`Arbitrary::filter`].
pub struct Filter<A: Arbitrary> {
    inner: A,
    predicate: Predicate<A::Item>,
}

impl<A: Arbitrary> Filter<A> {
    pub(crate) fn new<F>(inner: A, predicate: F) -> Self
    where
        F: Fn(&A::Item) -> bool + 'static,
    {
        Filter {
            inner,
            predicate: Rc::new(predicate),
        }
    }
}

impl<A: Arbitrary> Arbitrary for Filter<A> {
    type Item = A::Item;
    type Context = A::Context;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<A::Item, A::Context> {
        loop {
            let candidate = self.inner.generate(rng, bias_factor);
            if (self.predicate)(&candidate.value) {
                return candidate;
            }
        }
    }

    fn can_shrink_without_context(&self, candidate: &A::Item) -> bool {
        self.inner.can_shrink_without_context(candidate) && (self.predicate)(candidate)
    }

    fn shrink(
        &self,
        value: &A::Item,
        context: Option<&A::Context>,
    ) -> Stream<Value<A::Item, A::Context>> {
        let predicate = self.predicate.clone();
        self.inner
            .shrink(value, context)
            .filter(move |v| predicate(&v.value))
    }
}

/// Arbitrary produced by [`Arbitrary::no_bias`].
pub struct NoBias<A> {
    inner: A,
}

impl<A> NoBias<A> {
    pub(crate) fn new(inner: A) -> Self {
        NoBias { inner }
    }
}

impl<A: Arbitrary> Arbitrary for NoBias<A> {
    type Item = A::Item;
    type Context = A::Context;

    fn generate(&self, rng: &mut Random, _bias_factor: Option<u32>) -> Value<A::Item, A::Context> {
        self.inner.generate(rng, None)
    }

    fn can_shrink_without_context(&self, candidate: &A::Item) -> bool {
        self.inner.can_shrink_without_context(candidate)
    }

    fn shrink(
        &self,
        value: &A::Item,
        context: Option<&A::Context>,
    ) -> Stream<Value<A::Item, A::Context>> {
        self.inner.shrink(value, context)
    }
}

/// Always produces the same value.
#[derive(Debug, Clone)]
pub struct Constant<T> {
    value: T,
}

/// Create an arbitrary that always produces `value`.
pub fn constant<T>(value: T) -> Constant<T>
where
    T: Clone + PartialEq + 'static,
{
    Constant { value }
}

impl<T> Arbitrary for Constant<T>
where
    T: Clone + PartialEq + 'static,
{
    type Item = T;
    type Context = ();

    fn generate(&self, _rng: &mut Random, _bias_factor: Option<u32>) -> Value<T, ()> {
        Value::new(self.value.clone(), Some(()))
    }

    fn can_shrink_without_context(&self, candidate: &T) -> bool {
        *candidate == self.value
    }

    fn shrink(&self, _value: &T, _context: Option<&()>) -> Stream<Value<T, ()>> {
        Stream::nil()
    }
}

/// Pair of two independent arbitraries, shrunk component by component.
pub struct Tuple2<A, B> {
    first: Rc<A>,
    second: Rc<B>,
}

/// Create an arbitrary for pairs.
pub fn tuple2<A, B>(first: A, second: B) -> Tuple2<A, B>
where
    A: Arbitrary,
    B: Arbitrary,
{
    Tuple2 {
        first: Rc::new(first),
        second: Rc::new(second),
    }
}

impl<A, B> Arbitrary for Tuple2<A, B>
where
    A: Arbitrary + 'static,
    B: Arbitrary + 'static,
{
    type Item = (A::Item, B::Item);
    type Context = (Option<A::Context>, Option<B::Context>);

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<Self::Item, Self::Context> {
        let (a, ca) = self.first.generate(rng, bias_factor).into_parts();
        let (b, cb) = self.second.generate(rng, bias_factor).into_parts();
        Value::new((a, b), Some((ca, cb)))
    }

    fn can_shrink_without_context(&self, candidate: &Self::Item) -> bool {
        self.first.can_shrink_without_context(&candidate.0)
            && self.second.can_shrink_without_context(&candidate.1)
    }

    fn shrink(
        &self,
        value: &Self::Item,
        context: Option<&Self::Context>,
    ) -> Stream<Value<Self::Item, Self::Context>> {
        let (ca, cb) = match context {
            Some((ca, cb)) => (ca.clone(), cb.clone()),
            None => (None, None),
        };
        let (a, b) = value.clone();

        let kept_b = b.clone();
        let kept_cb = cb.clone();
        let shrink_first = self.first.shrink(&a, ca.as_ref()).map(move |v| {
            let (na, nca) = v.into_parts();
            Value::new((na, kept_b.clone()), Some((nca, kept_cb.clone())))
        });

        let second = self.second.clone();
        let shrink_second = Stream::lazy(move || {
            second.shrink(&b, cb.as_ref()).map(move |v| {
                let (nb, ncb) = v.into_parts();
                Value::new((a.clone(), nb), Some((ca.clone(), ncb)))
            })
        });

        shrink_first.join(shrink_second)
    }
}

/// Depth counter shared by the [`OneOf`] arbitraries of a recursive structure.
///
/// Generation increments it while descending into an alternative, so nested
/// `one_of`s sharing a counter know how deep they are.
#[derive(Debug, Clone, Default)]
pub struct Depth(Rc<Cell<usize>>);

impl Depth {
    pub fn new() -> Self {
        Depth::default()
    }

    pub fn current(&self) -> usize {
        self.0.get()
    }

    fn enter(&self) -> DepthGuard<'_> {
        self.0.set(self.0.get() + 1);
        DepthGuard(self)
    }
}

struct DepthGuard<'a>(&'a Depth);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let depth = &self.0 .0;
        depth.set(depth.get().saturating_sub(1));
    }
}

/// Context of a [`OneOf`].
#[derive(Debug, Clone)]
pub struct OneOfContext {
    pub selected: usize,
    pub bias_factor: Option<u32>,
    pub context: Option<ErasedContext>,
    fallback: Option<Random>,
}

/// Picks one of several arbitraries producing the same type.
///
/// The first alternative is treated as the simplest: it is the one chosen
/// once `max_depth` is reached and the one favored by `depth_bias`.
pub struct OneOf<T> {
    alternatives: Vec<BoxedArbitrary<T>>,
    depth: Depth,
    max_depth: usize,
    depth_bias: f64,
    cross_shrink: bool,
}

/// Create an arbitrary choosing uniformly among `alternatives`.
pub fn one_of<T>(alternatives: Vec<BoxedArbitrary<T>>) -> Result<OneOf<T>>
where
    T: Clone + 'static,
{
    if alternatives.is_empty() {
        return Err(SprigError::invalid("one_of expects at least one arbitrary"));
    }
    Ok(OneOf {
        alternatives,
        depth: Depth::new(),
        max_depth: usize::MAX,
        depth_bias: 0.0,
        cross_shrink: false,
    })
}

impl<T: Clone + 'static> OneOf<T> {
    /// Share a depth counter with other `one_of`s.
    pub fn with_depth(mut self, depth: &Depth) -> Self {
        self.depth = depth.clone();
        self
    }

    /// Always pick the first alternative at or beyond this depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Favor the first alternative more and more as depth grows.
    pub fn with_depth_bias(mut self, depth_bias: f64) -> Self {
        self.depth_bias = depth_bias;
        self
    }

    /// When another alternative was picked, first try a value of the first
    /// alternative while shrinking.
    pub fn with_cross_shrink(mut self) -> Self {
        self.cross_shrink = true;
        self
    }

    fn negative_depth_benefit(&self) -> i64 {
        if self.depth_bias <= 0.0 {
            return 0;
        }
        let benefit = (self.depth.current() as f64 * self.depth_bias + 1.0).floor() as i64 - 1;
        let total = self.alternatives.len() as i64;
        -total.saturating_mul(benefit)
    }

    fn select(&self, rng: &mut Random) -> usize {
        if self.depth.current() >= self.max_depth {
            return 0;
        }
        let last = self.alternatives.len() as i64 - 1;
        let selected = rng.next_int(self.negative_depth_benefit(), last);
        selected.max(0) as usize
    }

    fn wrap(
        selected: usize,
        bias_factor: Option<u32>,
        value: Value<T, ErasedContext>,
        fallback: Option<Random>,
    ) -> Value<T, OneOfContext> {
        let (value, context) = value.into_parts();
        Value::new(
            value,
            Some(OneOfContext {
                selected,
                bias_factor,
                context,
                fallback,
            }),
        )
    }
}

impl<T: Clone + 'static> Arbitrary for OneOf<T> {
    type Item = T;
    type Context = OneOfContext;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<T, OneOfContext> {
        let selected = self.select(rng);
        let fallback = (self.cross_shrink && selected != 0).then(|| rng.clone());
        let _guard = self.depth.enter();
        let generated = self.alternatives[selected].generate(rng, bias_factor);
        Self::wrap(selected, bias_factor, generated, fallback)
    }

    fn can_shrink_without_context(&self, candidate: &T) -> bool {
        self.alternatives
            .iter()
            .any(|arb| arb.can_shrink_without_context(candidate))
    }

    fn shrink(&self, value: &T, context: Option<&OneOfContext>) -> Stream<Value<T, OneOfContext>> {
        let Some(context) = context else {
            return match self
                .alternatives
                .iter()
                .position(|arb| arb.can_shrink_without_context(value))
            {
                Some(selected) => self.alternatives[selected]
                    .shrink(value, None)
                    .map(move |v| Self::wrap(selected, None, v, None)),
                None => Stream::nil(),
            };
        };

        let Some(alternative) = self.alternatives.get(context.selected) else {
            crate::error::contract_violation(SprigError::MalformedContext {
                arbitrary: "OneOf",
                reason: format!("no alternative at index {}", context.selected),
            });
        };
        let selected = context.selected;
        let bias_factor = context.bias_factor;
        let original = alternative
            .shrink(value, context.context.as_ref())
            .map(move |v| Self::wrap(selected, bias_factor, v, None));

        match &context.fallback {
            Some(rng) => {
                let first = self.alternatives[0].clone();
                let mut rng = rng.clone();
                Stream::lazy(move || {
                    let generated = first.generate(&mut rng, bias_factor);
                    Stream::of(vec![Self::wrap(0, bias_factor, generated, None)])
                })
                .join(original)
            }
            None => original,
        }
    }
}
