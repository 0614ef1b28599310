//! Error type shared by the builder, the orchestrator and store implementations.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by condor.
///
/// The builder itself never fails while chaining; problems it detects
/// (such as an unresolved column reference) are reported when the query is
/// finalized. Everything the store reports is passed through as [`Error::Store`].
#[derive(Debug, Error)]
pub enum Error {
    /// Error reported by the underlying store (connectivity, constraint, bad SQL...)
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A field handle that is not registered for the entity was used in a query
    #[error("unresolved column reference: field #{field} is not registered for entity `{entity}`")]
    UnresolvedColumn { entity: &'static str, field: usize },

    /// An entity was updated by primary key but carried no key value
    #[error("entity `{entity}` has no value for primary key column `{column}`")]
    MissingPrimaryKey { entity: &'static str, column: String },

    /// A delete or update would have run without any condition
    #[error("refusing to {operation} on `{entity}` without a condition")]
    MissingCondition {
        entity: &'static str,
        operation: &'static str,
    },

    /// Entity <-> row conversion failed
    #[error("row marshaling error: {0}")]
    Marshal(#[from] serde_json::Error),

    /// No store handle was passed and no default store was installed
    #[error("no store available: call condor::init() or pass a store explicitly")]
    NotInitialized,

    /// `init` was called more than once
    #[error("default store has already been initialized")]
    AlreadyInitialized,

    /// The store does not support the requested operation
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Settings could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Wrap a driver-specific error as a [`Error::Store`].
    ///
    /// Used by [`Store`](crate::Store) implementations to report failures.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Store(Box::new(err))
    }

    /// Build a [`Error::Store`] from a plain message.
    pub fn store_msg(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        Error::Store(msg.into())
    }
}
