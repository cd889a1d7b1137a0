//! # harkon
//!
//! Persistent hash maps with structural sharing, built for the variable
//! environments of interpreters.
//!
//! ## Overview
//!
//! An environment is extended once per scope and read far more often than it
//! is written. Persistent maps fit that pattern: extending a scope returns a
//! new map that shares everything it does not change with its parent, so
//! closures can keep the environment they captured at no cost.
//!
//! - **`PersistentMap`**: hash array mapped trie with copy-on-write insertion
//!   and a right-biased structural merge
//! - **`PersistentList`**: immutable cons-list, also the trie's collision
//!   bucket
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` instead of `Rc`, making maps and lists
//!   `Send + Sync`
//! - `fxhash`: use `rustc-hash`'s `FxHasher` as the default hash builder
//! - `ahash`: use `AHasher` as the default hash builder
//!
//! ## Example
//!
//! ```rust
//! use harkon::prelude::*;
//!
//! let outer = PersistentMap::new().new_insert("x", 1).new_insert("y", 2);
//! let inner = outer.new_insert("x", 10);
//!
//! assert_eq!(inner.find("x"), Some(&10));
//! assert_eq!(inner.find("y"), Some(&2));
//! assert_eq!(outer.find("x"), Some(&1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types.
///
/// # Usage
///
/// ```rust
/// use harkon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
