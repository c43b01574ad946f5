//! Letrec families producing genuinely cyclic data.
//!
//! Plain recursion always terminates with a finite unrolling, which cannot
//! produce a type whose back-references are mandatory. Here every member is
//! generated a bounded number of times as *open* instances, whose links are
//! markers naming a member and an ordinal. A deref pass then binds every
//! marker to a slot of one shared arena, so nodes may point at each other
//! and at themselves without reference-counted cycles.

use super::{build_arena, Arena, Family, Ties};
use crate::arbitrary::{Arbitrary, BoxedArbitrary, ErasedContext};
use crate::error::{contract_violation, Result, SprigError};
use crate::numeric::IntegerArbitrary;
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Options for [`letrec_cyclic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOptions {
    /// Upper bound on the number of instances generated per member.
    pub max_instances: usize,
}

impl Default for CycleOptions {
    fn default() -> Self {
        CycleOptions { max_instances: 3 }
    }
}

impl CycleOptions {
    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Target {
    Open { member: Rc<str>, ordinal: usize },
    Bound(usize),
}

/// A reference from one node of a cyclic structure to another.
///
/// Links are produced open by a [`Knot`] and bound to an arena slot once
/// the whole structure exists. Use [`Cycle::follow`] to walk them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Link(Target);

impl Link {
    fn open(member: Rc<str>, ordinal: usize) -> Self {
        Link(Target::Open { member, ordinal })
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.0, Target::Bound(_))
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Target::Open { member, ordinal } => write!(f, "Link({member}#{ordinal})"),
            Target::Bound(index) => write!(f, "Link(@{index})"),
        }
    }
}

/// Values that contain [`Link`]s.
pub trait Linked {
    /// Call `f` on every link reachable from `self`.
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link));
}

impl Linked for Link {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        f(self)
    }
}

impl<T: Linked> Linked for Option<T> {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        if let Some(inner) = self {
            inner.for_each_link(f);
        }
    }
}

impl<T: Linked> Linked for Box<T> {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        (**self).for_each_link(f)
    }
}

impl<T: Linked> Linked for Vec<T> {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        for item in self {
            item.for_each_link(f);
        }
    }
}

impl<A: Linked, B: Linked> Linked for (A, B) {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        self.0.for_each_link(f);
        self.1.for_each_link(f);
    }
}

/// Hands out knots while a cyclic family is being built.
#[derive(Debug)]
pub struct Knots {
    ordinals: Rc<IntegerArbitrary<i64>>,
}

impl Knots {
    fn new(max_instances: usize) -> Result<Self> {
        let max_ordinal = i64::try_from(max_instances - 1)
            .map_err(|_| SprigError::invalid("max_instances does not fit in an i64"))?;
        Ok(Knots {
            ordinals: Rc::new(IntegerArbitrary::new(0, max_ordinal)?),
        })
    }

    /// An arbitrary link to one of the instances of the member called `name`.
    pub fn knot(&self, name: &str) -> Knot {
        Knot {
            member: Rc::from(name),
            ordinals: self.ordinals.clone(),
        }
    }
}

/// Produces open links to some instance of a member.
///
/// The ordinal is drawn up to `max_instances` and taken modulo the number of
/// instances actually generated for the member.
#[derive(Debug, Clone)]
pub struct Knot {
    member: Rc<str>,
    ordinals: Rc<IntegerArbitrary<i64>>,
}

impl Arbitrary for Knot {
    type Item = Link;
    type Context = i64;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<Link, i64> {
        let member = self.member.clone();
        self.ordinals
            .generate(rng, bias_factor)
            .map(|ordinal| Link::open(member, ordinal as usize))
    }

    fn can_shrink_without_context(&self, candidate: &Link) -> bool {
        match &candidate.0 {
            Target::Open { member, ordinal } => {
                *member == self.member
                    && i64::try_from(*ordinal)
                        .is_ok_and(|o| self.ordinals.can_shrink_without_context(&o))
            }
            Target::Bound(_) => false,
        }
    }

    fn shrink(&self, value: &Link, context: Option<&i64>) -> Stream<Value<Link, i64>> {
        let Target::Open { member, ordinal } = &value.0 else {
            return Stream::nil();
        };
        let member = member.clone();
        self.ordinals
            .shrink(&(*ordinal as i64), context)
            .map(move |candidate| {
                let member = member.clone();
                candidate.map(|ordinal| Link::open(member, ordinal as usize))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    member: Rc<str>,
    offset: usize,
    count: usize,
}

#[derive(PartialEq)]
struct Graph<T> {
    nodes: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Graph<T> {
    fn span_of(&self, index: usize) -> Option<&Span> {
        self.spans
            .iter()
            .find(|span| span.offset <= index && index < span.offset + span.count)
    }
}

/// A handle on one node of a cyclic structure.
///
/// All handles obtained by following links share the same arena.
pub struct Cycle<T> {
    graph: Rc<Graph<T>>,
    index: usize,
}

impl<T> Cycle<T> {
    pub fn get(&self) -> &T {
        &self.graph.nodes[self.index]
    }

    /// The node `link` points to.
    ///
    /// Panics if the link was never bound, meaning it was generated outside
    /// of a cyclic family.
    pub fn follow(&self, link: &Link) -> Cycle<T> {
        match &link.0 {
            Target::Bound(index) if *index < self.graph.nodes.len() => Cycle {
                graph: self.graph.clone(),
                index: *index,
            },
            Target::Bound(index) => contract_violation(SprigError::KnotOutsideCycle {
                name: format!("@{index}"),
            }),
            Target::Open { member, .. } => contract_violation(SprigError::KnotOutsideCycle {
                name: member.to_string(),
            }),
        }
    }

    /// Position of this node in the arena.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of nodes in the whole structure.
    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }

    /// Name of the member that generated this node.
    pub fn member(&self) -> &str {
        self.graph
            .span_of(self.index)
            .map(|span| &*span.member)
            .unwrap_or_default()
    }

    /// Whether both handles point into the same arena.
    pub fn same_structure(&self, other: &Cycle<T>) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }
}

impl<T> Deref for Cycle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> Clone for Cycle<T> {
    fn clone(&self) -> Self {
        Cycle {
            graph: self.graph.clone(),
            index: self.index,
        }
    }
}

impl<T: PartialEq> PartialEq for Cycle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.graph == other.graph
    }
}

impl<T: fmt::Debug> fmt::Debug for Cycle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cycle")
            .field("at", &self.index)
            .field("nodes", &self.graph.nodes)
            .finish()
    }
}

type Instances<T> = Vec<Vec<Value<T, ErasedContext>>>;

/// Context of a [`CyclicArbitrary`]: the open instances, before binding.
pub struct CycleContext<T> {
    open: Rc<Instances<T>>,
}

impl<T> Clone for CycleContext<T> {
    fn clone(&self) -> Self {
        CycleContext {
            open: self.open.clone(),
        }
    }
}

impl<T> fmt::Debug for CycleContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<usize> = self.open.iter().map(Vec::len).collect();
        f.debug_struct("CycleContext")
            .field("instances", &counts)
            .finish()
    }
}

struct Members<T> {
    entries: Vec<(Rc<str>, BoxedArbitrary<T>)>,
    max_instances: usize,
}

/// A built cyclic family.
pub struct CyclicFamily<T> {
    members: Rc<Members<T>>,
    arena: Rc<Arena>,
}

/// Build a family whose values may reference each other cyclically.
///
/// The builder receives [`Ties`] for finite recursion and [`Knots`] for links
/// that are bound after generation. Every member must produce values of
/// type `T`.
pub fn letrec_cyclic<T, F>(options: CycleOptions, builder: F) -> Result<CyclicFamily<T>>
where
    T: Linked + Clone + 'static,
    F: FnOnce(&Ties, &Knots) -> Result<Family>,
{
    if options.max_instances == 0 {
        return Err(SprigError::invalid("max_instances must be at least 1"));
    }
    let knots = Knots::new(options.max_instances)?;
    let arena = build_arena(|ties| builder(ties, &knots))?;
    let entries = (0..arena.len())
        .map(|index| Ok((Rc::from(arena.name(index)), arena.member::<T>(index)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(CyclicFamily {
        members: Rc::new(Members {
            entries,
            max_instances: options.max_instances,
        }),
        arena,
    })
}

impl<T: Linked + Clone + 'static> CyclicFamily<T> {
    /// An arbitrary producing structures rooted at the first instance of `name`.
    pub fn get(&self, name: &str) -> Result<CyclicArbitrary<T>> {
        let root = self
            .members
            .entries
            .iter()
            .position(|(member, _)| &**member == name)
            .ok_or_else(|| SprigError::UnknownMember {
                name: name.to_string(),
            })?;
        Ok(CyclicArbitrary {
            members: self.members.clone(),
            root,
            _arena: self.arena.clone(),
        })
    }
}

impl<T> fmt::Debug for CyclicFamily<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.members.entries.iter().map(|(name, _)| name))
            .finish()
    }
}

/// Generates [`Cycle`]s rooted at one member of a cyclic family.
pub struct CyclicArbitrary<T> {
    members: Rc<Members<T>>,
    root: usize,
    _arena: Rc<Arena>,
}

impl<T> Clone for CyclicArbitrary<T> {
    fn clone(&self) -> Self {
        CyclicArbitrary {
            members: self.members.clone(),
            root: self.root,
            _arena: self._arena.clone(),
        }
    }
}

impl<T> fmt::Debug for CyclicArbitrary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyclicArbitrary")
            .field("root", &self.members.entries[self.root].0)
            .field("max_instances", &self.members.max_instances)
            .finish()
    }
}

impl<T: Linked + Clone + 'static> CyclicArbitrary<T> {
    /// The deref pass: copy every open instance into the arena, binding its links.
    fn bind(&self, open: &Instances<T>) -> Cycle<T> {
        let mut offset = 0;
        let spans: Vec<Span> = self
            .members
            .entries
            .iter()
            .zip(open)
            .map(|((member, _), instances)| {
                let span = Span {
                    member: member.clone(),
                    offset,
                    count: instances.len(),
                };
                offset += instances.len();
                span
            })
            .collect();

        let nodes = open
            .iter()
            .flatten()
            .map(|instance| {
                let mut node = instance.value.clone();
                node.for_each_link(&mut |link| {
                    if let Target::Open { member, ordinal } = &link.0 {
                        let Some(span) = spans.iter().find(|span| span.member == *member) else {
                            contract_violation(SprigError::Unresolved {
                                name: member.to_string(),
                            });
                        };
                        let index = span.offset + ordinal % span.count;
                        link.0 = Target::Bound(index);
                    }
                });
                node
            })
            .collect();

        let index = spans[self.root].offset;
        Cycle {
            graph: Rc::new(Graph { nodes, spans }),
            index,
        }
    }

    /// Recover open instances from a bound structure of this family.
    fn unbind(&self, cycle: &Cycle<T>) -> Option<Instances<T>> {
        let graph = &cycle.graph;
        let same_members = graph.spans.len() == self.members.entries.len()
            && graph
                .spans
                .iter()
                .zip(&self.members.entries)
                .all(|(span, (member, _))| span.member == *member);
        if !same_members || cycle.index != graph.spans[self.root].offset {
            return None;
        }

        let mut open = Vec::with_capacity(graph.spans.len());
        for span in &graph.spans {
            let mut instances = Vec::with_capacity(span.count);
            for node in &graph.nodes[span.offset..span.offset + span.count] {
                let mut node = node.clone();
                let mut dangling = false;
                node.for_each_link(&mut |link| {
                    if let Target::Bound(index) = link.0 {
                        match graph.span_of(index) {
                            Some(target) => {
                                *link = Link::open(target.member.clone(), index - target.offset)
                            }
                            None => dangling = true,
                        }
                    }
                });
                if dangling {
                    return None;
                }
                instances.push(Value::without_context(node));
            }
            open.push(instances);
        }
        Some(open)
    }

    fn candidate(&self, open: Instances<T>) -> Value<Cycle<T>, CycleContext<T>> {
        let cycle = self.bind(&open);
        Value::new(cycle, Some(CycleContext { open: Rc::new(open) }))
    }

    /// Drop the last instance of `member`, pointing its referrers at ordinal 0.
    ///
    /// Links to `member` are first reduced to the ordinal they are bound to,
    /// so every other link keeps its target once the count shrinks.
    fn drop_last(&self, open: &Instances<T>, member: usize) -> Instances<T> {
        let mut next = open.clone();
        let count = next[member].len();
        next[member].pop();
        let removed = count - 1;
        let name = &self.members.entries[member].0;
        for instance in next.iter_mut().flatten() {
            let mut touched = false;
            instance.value.for_each_link(&mut |link| {
                if let Target::Open { member, ordinal } = &mut link.0 {
                    if member != name {
                        return;
                    }
                    let bound = *ordinal % count;
                    let target = if bound == removed { 0 } else { bound };
                    if target != *ordinal {
                        *ordinal = target;
                        touched = true;
                    }
                }
            });
            if touched {
                instance.context = None;
            }
        }
        next
    }
}

impl<T: Linked + Clone + 'static> Arbitrary for CyclicArbitrary<T> {
    type Item = Cycle<T>;
    type Context = CycleContext<T>;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<Cycle<T>, CycleContext<T>> {
        let max = self.members.max_instances as i64;
        let counts: Vec<usize> = self
            .members
            .entries
            .iter()
            .map(|_| rng.next_int(1, max) as usize)
            .collect();
        tracing::trace!(?counts, "cyclic generation");

        let open: Instances<T> = self
            .members
            .entries
            .iter()
            .zip(&counts)
            .map(|((_, arbitrary), &count)| {
                (0..count)
                    .map(|_| arbitrary.generate(rng, bias_factor))
                    .collect()
            })
            .collect();
        self.candidate(open)
    }

    fn can_shrink_without_context(&self, candidate: &Cycle<T>) -> bool {
        let Some(open) = self.unbind(candidate) else {
            return false;
        };
        open.iter()
            .zip(&self.members.entries)
            .all(|(instances, (_, arbitrary))| {
                (1..=self.members.max_instances).contains(&instances.len())
                    && instances
                        .iter()
                        .all(|instance| arbitrary.can_shrink_without_context(&instance.value))
            })
    }

    fn shrink(
        &self,
        value: &Cycle<T>,
        context: Option<&CycleContext<T>>,
    ) -> Stream<Value<Cycle<T>, CycleContext<T>>> {
        let open = match context {
            Some(context) => context.open.clone(),
            None => match self.unbind(value) {
                Some(open) => Rc::new(open),
                None => return Stream::nil(),
            },
        };

        let droppable: Vec<usize> = (0..open.len()).filter(|&m| open[m].len() > 1).collect();
        let this = self.clone();
        let from = open.clone();
        let drops = Stream::of(droppable).map(move |member| {
            let next = this.drop_last(&from, member);
            this.candidate(next)
        });

        let this = self.clone();
        let positions: Vec<(usize, usize)> = open
            .iter()
            .enumerate()
            .flat_map(|(member, instances)| (0..instances.len()).map(move |ordinal| (member, ordinal)))
            .collect();
        let instance_shrinks = Stream::of(positions).flat_map(move |(member, ordinal)| {
            let instance = &open[member][ordinal];
            let arbitrary = &this.members.entries[member].1;
            let this = this.clone();
            let open = open.clone();
            arbitrary
                .shrink(&instance.value, instance.context.as_ref())
                .map(move |shrunk| {
                    let mut next = (*open).clone();
                    next[member][ordinal] = shrunk;
                    this.candidate(next)
                })
        });

        drops.join(instance_shrinks)
    }
}
