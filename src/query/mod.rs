//! Condition building and finalization.
//!
//! - [`builder`]: the fluent [`Query`] builder
//! - [`condition`]: predicate tree and its `?`-placeholder rendering
//! - [`context`]: [`QueryContext`], the finalized form handed to a store

pub mod builder;
pub mod condition;
pub mod context;

pub use builder::Query;
pub use condition::Connective;
pub use context::QueryContext;
