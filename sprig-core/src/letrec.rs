//! Recursive and mutually recursive arbitraries.
//!
//! A family is declared in two passes. The builder passed to [`letrec`]
//! receives a [`Ties`] handle and returns a [`Family`] of named members;
//! every `ties.tie(name)` it calls is recorded as an unresolved placeholder.
//! Once the builder returns, each placeholder is bound to the arena slot of
//! the member with that name. Placeholders naming an undeclared member stay
//! unresolved and only fail when they are first used, so forward references
//! are always legal.

use crate::arbitrary::{Arbitrary, BoxedArbitrary, ErasedContext};
use crate::error::{contract_violation, Result, SprigError};
use crate::random::Random;
use crate::stream::Stream;
use crate::value::Value;
use std::any::{type_name, Any};
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

pub mod cycle;

pub use cycle::{
    letrec_cyclic, Cycle, CycleContext, CycleOptions, CyclicArbitrary, CyclicFamily, Knot, Knots, Link,
    Linked,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TieState {
    Pending,
    Unresolved,
    Resolved(usize),
}

struct Slot {
    name: String,
    // Always a `BoxedArbitrary<T>` for the member's item type.
    arbitrary: Rc<dyn Any>,
    // Target of a member declared as a bare tie.
    alias: Option<Rc<str>>,
}

/// Storage for the members of a family, filled once after the builder ran.
#[derive(Default)]
pub(crate) struct Arena {
    slots: OnceCell<Vec<Slot>>,
}

impl Arena {
    fn slots(&self) -> &[Slot] {
        self.slots.get().map(Vec::as_slice).unwrap_or_default()
    }

    fn fill(&self, family: Family) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in &family.members {
            if !seen.insert(slot.name.as_str()) {
                return Err(SprigError::DuplicateMember {
                    name: slot.name.clone(),
                });
            }
        }
        self.slots
            .set(family.members)
            .map_err(|_| SprigError::invalid("letrec family members were already declared"))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots().iter().position(|slot| slot.name == name)
    }

    /// Follow members declared as a bare tie to the member they stand for.
    ///
    /// Stops at an alias whose target is undeclared. `None` when aliases
    /// loop without reaching a real member.
    fn resolve(&self, index: usize) -> Option<usize> {
        let mut current = index;
        for _ in 0..=self.len() {
            let slot = &self.slots()[current];
            match slot.alias.as_deref().and_then(|target| self.position(target)) {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
        None
    }

    /// The arbitrary handed out for the member at `index`.
    pub(crate) fn member<T: Clone + 'static>(&self, index: usize) -> Result<BoxedArbitrary<T>> {
        self.arbitrary(self.resolve(index).unwrap_or(index))
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.slots()[index].name
    }

    pub(crate) fn len(&self) -> usize {
        self.slots().len()
    }

    pub(crate) fn arbitrary<T: Clone + 'static>(&self, index: usize) -> Result<BoxedArbitrary<T>> {
        let slot = &self.slots()[index];
        slot.arbitrary
            .downcast_ref::<BoxedArbitrary<T>>()
            .cloned()
            .ok_or_else(|| SprigError::TieTypeMismatch {
                name: slot.name.clone(),
                expected: type_name::<T>(),
            })
    }
}

/// Members returned by a [`letrec`] builder.
#[derive(Default)]
pub struct Family {
    members: Vec<Slot>,
}

impl Family {
    pub fn new() -> Self {
        Family::default()
    }

    /// Declare a member. Members may freely reference each other through ties.
    ///
    /// A member that is just a tie hands out its target directly.
    pub fn member<A>(mut self, name: &str, arbitrary: A) -> Self
    where
        A: Arbitrary + 'static,
    {
        let alias = (&arbitrary as &dyn Any)
            .downcast_ref::<Tie<A::Item>>()
            .map(|tie| tie.name.clone());
        self.members.push(Slot {
            name: name.to_string(),
            arbitrary: Rc::new(arbitrary.boxed()),
            alias,
        });
        self
    }
}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.members.iter().map(|slot| &slot.name))
            .finish()
    }
}

/// Hands out placeholders while a family is being built.
pub struct Ties {
    arena: Weak<Arena>,
    placeholders: RefCell<Vec<(Rc<str>, Rc<Cell<TieState>>)>>,
}

impl Ties {
    fn new(arena: Weak<Arena>) -> Self {
        Ties {
            arena,
            placeholders: RefCell::new(Vec::new()),
        }
    }

    /// A placeholder for the member called `name`, producing values of type `T`.
    pub fn tie<T: Clone + 'static>(&self, name: &str) -> Tie<T> {
        let name: Rc<str> = Rc::from(name);
        let state = Rc::new(Cell::new(TieState::Pending));
        self.placeholders
            .borrow_mut()
            .push((name.clone(), state.clone()));
        Tie {
            name,
            state,
            arena: self.arena.clone(),
            _item: PhantomData,
        }
    }

    fn bind(&self, arena: &Arena) {
        let placeholders = self.placeholders.borrow();
        let mut unresolved = Vec::new();
        for (name, state) in placeholders.iter() {
            match arena.position(name).and_then(|index| arena.resolve(index)) {
                Some(index) => state.set(TieState::Resolved(index)),
                None => {
                    state.set(TieState::Unresolved);
                    unresolved.push(name.clone());
                }
            }
        }
        tracing::debug!(
            bound = placeholders.len() - unresolved.len(),
            ?unresolved,
            "letrec placeholders bound"
        );
    }
}

impl fmt::Debug for Ties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ties")
            .field("placeholders", &self.placeholders.borrow().len())
            .finish()
    }
}

/// A forward reference to a family member.
///
/// Behaves exactly like its target once the family is built: generation,
/// shrinking and contexts all pass through unchanged.
pub struct Tie<T> {
    name: Rc<str>,
    state: Rc<Cell<TieState>>,
    arena: Weak<Arena>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Clone + 'static> Tie<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> BoxedArbitrary<T> {
        let unresolved = || SprigError::Unresolved {
            name: self.name.to_string(),
        };
        let TieState::Resolved(index) = self.state.get() else {
            contract_violation(unresolved());
        };
        let Some(arena) = self.arena.upgrade() else {
            contract_violation(unresolved());
        };
        match arena.arbitrary(index) {
            Ok(arbitrary) => arbitrary,
            Err(error) => contract_violation(error),
        }
    }
}

impl<T> Clone for Tie<T> {
    fn clone(&self) -> Self {
        Tie {
            name: self.name.clone(),
            state: self.state.clone(),
            arena: self.arena.clone(),
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Tie<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tie")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .finish()
    }
}

impl<T: Clone + 'static> Arbitrary for Tie<T> {
    type Item = T;
    type Context = ErasedContext;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<T, ErasedContext> {
        self.target().generate(rng, bias_factor)
    }

    fn can_shrink_without_context(&self, candidate: &T) -> bool {
        self.target().can_shrink_without_context(candidate)
    }

    fn shrink(&self, value: &T, context: Option<&ErasedContext>) -> Stream<Value<T, ErasedContext>> {
        self.target().shrink(value, context)
    }
}

/// A built family. Members are looked up by name and value type.
pub struct LetrecFamily {
    arena: Rc<Arena>,
}

/// Build a recursive family of arbitraries.
///
/// ```
/// use sprig_core::{integer, letrec, Arbitrary, Family, Random};
///
/// let family = letrec(|ties| {
///     Ok(Family::new()
///         .member("a", ties.tie::<i64>("b"))
///         .member("b", integer(0, 10)?))
/// })
/// .unwrap();
/// let a = family.get::<i64>("a").unwrap();
/// let value = a.generate(&mut Random::from_seed(1), None).value;
/// assert!((0..=10).contains(&value));
/// ```
pub fn letrec<F>(builder: F) -> Result<LetrecFamily>
where
    F: FnOnce(&Ties) -> Result<Family>,
{
    let arena = build_arena(builder)?;
    Ok(LetrecFamily { arena })
}

/// Run both passes: collect the members, then bind every placeholder.
pub(crate) fn build_arena<F>(builder: F) -> Result<Rc<Arena>>
where
    F: FnOnce(&Ties) -> Result<Family>,
{
    let arena = Rc::new(Arena::default());
    let ties = Ties::new(Rc::downgrade(&arena));
    let family = builder(&ties)?;
    arena.fill(family)?;
    ties.bind(&arena);
    Ok(arena)
}

impl LetrecFamily {
    /// The member called `name`, producing values of type `T`.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Result<Member<T>> {
        let index = self
            .arena
            .position(name)
            .ok_or_else(|| SprigError::UnknownMember {
                name: name.to_string(),
            })?;
        Ok(Member {
            arbitrary: self.arena.member(index)?,
            _arena: self.arena.clone(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        (0..self.arena.len()).map(|index| self.arena.name(index))
    }
}

impl fmt::Debug for LetrecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A member taken out of a [`LetrecFamily`]; keeps the whole family alive.
pub struct Member<T> {
    arbitrary: BoxedArbitrary<T>,
    _arena: Rc<Arena>,
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Member {
            arbitrary: self.arbitrary.clone(),
            _arena: self._arena.clone(),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Member").field(&self.arbitrary).finish()
    }
}

impl<T: Clone + 'static> Arbitrary for Member<T> {
    type Item = T;
    type Context = ErasedContext;

    fn generate(&self, rng: &mut Random, bias_factor: Option<u32>) -> Value<T, ErasedContext> {
        self.arbitrary.generate(rng, bias_factor)
    }

    fn can_shrink_without_context(&self, candidate: &T) -> bool {
        self.arbitrary.can_shrink_without_context(candidate)
    }

    fn shrink(&self, value: &T, context: Option<&ErasedContext>) -> Stream<Value<T, ErasedContext>> {
        self.arbitrary.shrink(value, context)
    }
}
