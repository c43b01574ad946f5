//! Core engine for Sprig property-based testing.
//!
//! This crate provides the generation and shrinking contract ([`Arbitrary`]),
//! numeric arbitraries with biased generation and resumable shrinking, the
//! order-preserving float index bijection, recursive arbitraries through
//! `letrec`, and the property runner.

pub mod arbitrary;
pub mod combinators;
pub mod error;
pub mod float;
pub mod letrec;
pub mod numeric;
pub mod property;
pub mod random;
pub mod stream;
pub mod value;

// Re-export the main types
pub use arbitrary::*;
pub use combinators::*;
pub use error::*;
pub use float::*;
pub use letrec::*;
pub use numeric::*;
pub use property::*;
pub use random::*;
pub use stream::*;
pub use value::*;
