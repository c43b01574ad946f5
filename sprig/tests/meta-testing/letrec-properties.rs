//! Letrec properties
//!
//! Ties must be transparent indirections, recursive families must terminate
//! under a depth limit, and cyclic families must always produce fully bound
//! structures.

use crate::{arbitrary_seed, check_meta};
use sprig::*;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(i64),
    Add(Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
}

impl Expr {
    fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Add(left, right) => 1 + left.depth().max(right.depth()),
            Expr::Negate(inner) => 1 + inner.depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    age: i64,
    friend: Link,
}

impl Linked for Person {
    fn for_each_link(&mut self, f: &mut dyn FnMut(&mut Link)) {
        self.friend.for_each_link(f)
    }
}

/// Property: `a -> b -> leaf` generates exactly like the leaf for every seed
pub fn test_tied_member_generates_like_leaf() {
    let family = letrec(|ties| {
        Ok(Family::new()
            .member("a", ties.tie::<i64>("b"))
            .member("b", ties.tie::<i64>("leaf"))
            .member("leaf", integer(-500, 500)?))
    })
    .unwrap();
    let a = family.get::<i64>("a").unwrap();
    let leaf = integer(-500, 500).unwrap();

    let prop = for_all(arbitrary_seed(), move |seed| {
        let seed = *seed as u64;
        [None, Some(2), Some(5)].into_iter().all(|bias| {
            a.generate(&mut Random::from_seed(seed), bias).value
                == leaf.generate(&mut Random::from_seed(seed), bias).value
        })
    });
    check_meta("Tied member generates like leaf", prop, Config::default().with_seed(31));
}

/// Property: a mutually recursive expression family respects its depth limit
pub fn test_recursive_family_terminates() {
    let family = letrec(|ties| {
        let depth = Depth::new();
        let literal = integer(-100, 100)?.map(Expr::Literal).boxed();
        let add = tuple2(ties.tie::<Expr>("expr"), ties.tie::<Expr>("expr"))
            .map(|(left, right)| Expr::Add(Box::new(left), Box::new(right)))
            .boxed();
        let negate = ties
            .tie::<Expr>("expr")
            .map(|inner| Expr::Negate(Box::new(inner)))
            .boxed();
        let expr = one_of(vec![literal, ties.tie::<Expr>("compound").boxed()])?
            .with_depth(&depth)
            .with_max_depth(4);
        let compound = one_of(vec![add, negate])?;
        Ok(Family::new().member("expr", expr).member("compound", compound))
    })
    .unwrap();
    let expr = family.get::<Expr>("expr").unwrap();

    let prop = for_all(arbitrary_seed(), move |seed| {
        let mut rng = Random::from_seed(*seed as u64);
        (0..20).all(|_| expr.generate(&mut rng, Some(2)).value.depth() <= 8)
    });
    check_meta("Recursive family terminates", prop, Config::default().with_seed(32));
}

/// Property: every link of a generated cyclic structure can be followed
pub fn test_cyclic_links_always_resolve() {
    let people = letrec_cyclic::<Person, _>(CycleOptions::default().with_max_instances(5), |_, knots| {
        let person = tuple2(nat(120)?, knots.knot("person")).map_invertible(
            |(age, friend)| Person { age, friend },
            |person: &Person| Some((person.age, person.friend.clone())),
        );
        Ok(Family::new().member("person", person))
    })
    .unwrap()
    .get("person")
    .unwrap();

    let prop = for_all(people, |root| {
        let mut current = root.clone();
        (0..2 * root.node_count()).all(|_| {
            current = current.follow(&current.friend);
            current.same_structure(root) && current.friend.is_bound()
        })
    });
    check_meta("Cyclic links always resolve", prop, Config::default().with_seed(33));
}

/// Using a tie whose target was never declared fails with its name
pub fn use_unresolved_tie() {
    let family = letrec(|ties| Ok(Family::new().member("root", ties.tie::<i64>("leaf")))).unwrap();
    let root = family.get::<i64>("root").unwrap();
    let _ = root.generate(&mut Random::from_seed(0), None);
}
