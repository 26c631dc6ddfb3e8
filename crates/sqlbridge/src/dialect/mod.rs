//! Type mapping between native engine types and the canonical vocabulary.
//!
//! Rendering canonical types is a per-dialect concern
//! (`Dialect::native_type`); [`canonical`] holds the shared reverse mapping
//! used when introspecting live tables.

pub mod canonical;

pub use canonical::{to_canonical, NativeType};
