//! Store abstraction and the process-wide default store.
//!
//! The store is the execution engine behind condor: it runs finalized
//! [`QueryContext`]s against the database and marshals rows. condor never
//! writes SQL to a connection itself.
//!
//! A default store is installed once at start-up with [`init`]; every
//! orchestrator call may pass its own store instead (a transaction, for
//! instance) without touching the default.

use crate::config::Settings;
use crate::entity::Row;
use crate::error::{Error, Result};
use crate::query::QueryContext;
use once_cell::sync::OnceCell;
use sea_query::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Column -> value assignments of a predicate-scoped update.
pub type Patch = BTreeMap<String, Value>;

/// Kind of store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    CreateBatch,
    Find,
    Scan,
    Count,
    Update,
    Delete,
    Begin,
    Commit,
    Rollback,
}

impl Op {
    pub fn name(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::CreateBatch => "create_batch",
            Op::Find => "find",
            Op::Scan => "scan",
            Op::Count => "count",
            Op::Update => "update",
            Op::Delete => "delete",
            Op::Begin => "begin",
            Op::Commit => "commit",
            Op::Rollback => "rollback",
        }
    }
}

/// Execution engine consumed by the orchestrator.
///
/// Implementations compose [`QueryContext::where_clause`] (or the individual
/// fields) into their own statement language. Mutations return the number
/// of affected rows.
pub trait Store: Send + Sync {
    /// Insert one row.
    fn create(&self, table: &str, row: Row) -> Result<u64>;

    /// Insert rows, at most `chunk_size` per statement.
    fn create_batch(&self, table: &str, rows: Vec<Row>, chunk_size: usize) -> Result<u64>;

    /// Fetch rows shaped like the entity.
    fn find(&self, query: &QueryContext) -> Result<Vec<Row>>;

    /// Fetch rows for projection into another shape.
    fn scan(&self, query: &QueryContext) -> Result<Vec<Row>> {
        self.find(query)
    }

    fn count(&self, query: &QueryContext) -> Result<i64>;

    fn update(&self, query: &QueryContext, patch: &Patch) -> Result<u64>;

    fn delete(&self, query: &QueryContext) -> Result<u64>;

    /// Open a transaction; the returned handle is itself a store.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        Err(Error::Unsupported("transactions".to_string()))
    }
}

/// Store bound to an open transaction.
pub trait Transaction: Store {
    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

struct Defaults {
    store: Arc<dyn Store>,
    settings: Settings,
}

static DEFAULTS: OnceCell<Defaults> = OnceCell::new();

/// Install the process-wide default store. Can only be called once.
pub fn init(store: Arc<dyn Store>) -> Result<()> {
    init_with_settings(store, Settings::default())
}

/// Install the process-wide default store together with settings.
pub fn init_with_settings(store: Arc<dyn Store>, settings: Settings) -> Result<()> {
    log::debug!(
        "installing default store (batch_size={}, page_size={}, primary_key={})",
        settings.batch_size,
        settings.page_size,
        settings.primary_key
    );
    DEFAULTS
        .set(Defaults { store, settings })
        .map_err(|_| Error::AlreadyInitialized)
}

/// The store to use for one call: `explicit` if given, else the default.
pub fn resolve_store(explicit: Option<&dyn Store>) -> Result<&dyn Store> {
    match explicit {
        Some(store) => Ok(store),
        None => DEFAULTS
            .get()
            .map(|defaults| defaults.store.as_ref())
            .ok_or(Error::NotInitialized),
    }
}

/// Installed settings, or the defaults when [`init`] has not been called.
pub fn settings() -> Settings {
    DEFAULTS
        .get()
        .map(|defaults| defaults.settings.clone())
        .unwrap_or_default()
}

/// Open a transaction on `store` (or the default store).
pub fn begin(store: Option<&dyn Store>) -> Result<Box<dyn Transaction + '_>> {
    resolve_store(store)?.begin()
}
