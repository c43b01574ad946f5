//! Sprig property-based testing library.
//!
//! This is the main entry point for the Sprig library, providing
//! a convenient API for property-based testing in Rust.
//!
//! ```
//! use sprig::*;
//!
//! let prop = for_all(integer(0, 1000).unwrap(), |n| *n < 500);
//! let failure = prop.run(&Config::default().with_seed(7)).failure().cloned().unwrap();
//! assert_eq!(failure.counterexample, 500);
//! ```

pub use sprig_core::*;
