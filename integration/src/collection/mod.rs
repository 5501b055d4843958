//! Specialized collection types for variable-cardinality data: "one or
//! several" ([`OneOrMany`]), "zero, one, or several" ([`NoneOneOrMany`]),
//! and FNV-hashed index maps/sets for the small, short-lived keys (ISINs,
//! bucket ids) the pipeline passes around.

pub mod none_one_or_many;
pub mod one_or_many;

pub use none_one_or_many::NoneOneOrMany;
pub use one_or_many::OneOrMany;

/// Fast IndexMap using FNV hasher for better performance with small keys.
pub type FnvIndexMap<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;

/// Fast IndexSet using FNV hasher for better performance with small keys.
pub type FnvIndexSet<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;
