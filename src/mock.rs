//! In-memory recording store for tests.
//!
//! [`RecordingStore`] executes nothing. It records every call it receives
//! and answers from scripted responses, falling back to neutral defaults
//! (no rows, zero counts) when nothing is scripted.
//!
//! ```ignore
//! let store = RecordingStore::new();
//! store.push_affected(0);
//! crud::save_or_update(&user, Some(&store))?;
//! assert_eq!(store.ops(), vec![Op::Update, Op::Create]);
//! ```

use crate::entity::Row;
use crate::error::{Error, Result};
use crate::query::QueryContext;
pub use crate::store::Op;
use crate::store::{Patch, Store, Transaction};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Op,
    pub table: String,
    /// Finalized query, for predicate-based calls
    pub query: Option<QueryContext>,
    /// Inserted rows, for create calls
    pub rows: Vec<Row>,
    pub patch: Option<Patch>,
    /// Chunk size, for batch creates
    pub chunk_size: Option<usize>,
}

impl Call {
    fn new(op: Op, table: &str) -> Self {
        Self {
            op,
            table: table.to_string(),
            query: None,
            rows: Vec::new(),
            patch: None,
            chunk_size: None,
        }
    }

    fn with_query(op: Op, query: &QueryContext) -> Self {
        Self {
            query: Some(query.clone()),
            ..Self::new(op, &query.table)
        }
    }
}

#[derive(Default)]
struct Script {
    rows: VecDeque<Vec<Row>>,
    counts: VecDeque<i64>,
    affected: VecDeque<u64>,
    failures: HashMap<Op, VecDeque<String>>,
}

/// Store double that records calls and replays scripted results.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue rows for the next `find`/`scan`.
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        lock(&self.script).rows.push_back(rows);
        self
    }

    /// Queue the result of the next `count`.
    pub fn push_count(&self, count: i64) -> &Self {
        lock(&self.script).counts.push_back(count);
        self
    }

    /// Queue the affected-row count of the next `update`/`delete`.
    pub fn push_affected(&self, affected: u64) -> &Self {
        lock(&self.script).affected.push_back(affected);
        self
    }

    /// Make the next call of kind `op` fail with a store error.
    pub fn fail_next(&self, op: Op, message: impl Into<String>) -> &Self {
        lock(&self.script)
            .failures
            .entry(op)
            .or_default()
            .push_back(message.into());
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        lock(&self.calls).iter().map(|call| call.op).collect()
    }

    pub fn last_call(&self) -> Option<Call> {
        lock(&self.calls).last().cloned()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// Record `call`, then fail if a failure was scripted for its kind.
    fn record(&self, call: Call) -> Result<()> {
        let op = call.op;
        lock(&self.calls).push(call);
        let failure = lock(&self.script)
            .failures
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(message) => Err(Error::store_msg(message)),
            None => Ok(()),
        }
    }

    fn next_rows(&self) -> Vec<Row> {
        lock(&self.script).rows.pop_front().unwrap_or_default()
    }

    fn next_affected(&self) -> u64 {
        lock(&self.script).affected.pop_front().unwrap_or(0)
    }
}

impl Store for RecordingStore {
    fn create(&self, table: &str, row: Row) -> Result<u64> {
        self.record(Call {
            rows: vec![row],
            ..Call::new(Op::Create, table)
        })?;
        Ok(1)
    }

    fn create_batch(&self, table: &str, rows: Vec<Row>, chunk_size: usize) -> Result<u64> {
        let inserted = rows.len() as u64;
        self.record(Call {
            rows,
            chunk_size: Some(chunk_size),
            ..Call::new(Op::CreateBatch, table)
        })?;
        Ok(inserted)
    }

    fn find(&self, query: &QueryContext) -> Result<Vec<Row>> {
        self.record(Call::with_query(Op::Find, query))?;
        Ok(self.next_rows())
    }

    fn scan(&self, query: &QueryContext) -> Result<Vec<Row>> {
        self.record(Call::with_query(Op::Scan, query))?;
        Ok(self.next_rows())
    }

    fn count(&self, query: &QueryContext) -> Result<i64> {
        self.record(Call::with_query(Op::Count, query))?;
        Ok(lock(&self.script).counts.pop_front().unwrap_or(0))
    }

    fn update(&self, query: &QueryContext, patch: &Patch) -> Result<u64> {
        self.record(Call {
            patch: Some(patch.clone()),
            ..Call::with_query(Op::Update, query)
        })?;
        Ok(self.next_affected())
    }

    fn delete(&self, query: &QueryContext) -> Result<u64> {
        self.record(Call::with_query(Op::Delete, query))?;
        Ok(self.next_affected())
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        self.record(Call::new(Op::Begin, ""))?;
        Ok(Box::new(RecordingTransaction { store: self }))
    }
}

/// Transaction handle of a [`RecordingStore`]; calls are recorded on the parent.
pub struct RecordingTransaction<'a> {
    store: &'a RecordingStore,
}

impl Store for RecordingTransaction<'_> {
    fn create(&self, table: &str, row: Row) -> Result<u64> {
        self.store.create(table, row)
    }

    fn create_batch(&self, table: &str, rows: Vec<Row>, chunk_size: usize) -> Result<u64> {
        self.store.create_batch(table, rows, chunk_size)
    }

    fn find(&self, query: &QueryContext) -> Result<Vec<Row>> {
        self.store.find(query)
    }

    fn scan(&self, query: &QueryContext) -> Result<Vec<Row>> {
        self.store.scan(query)
    }

    fn count(&self, query: &QueryContext) -> Result<i64> {
        self.store.count(query)
    }

    fn update(&self, query: &QueryContext, patch: &Patch) -> Result<u64> {
        self.store.update(query, patch)
    }

    fn delete(&self, query: &QueryContext) -> Result<u64> {
        self.store.delete(query)
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        Err(Error::Unsupported("nested transactions".to_string()))
    }
}

impl Transaction for RecordingTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        self.store.record(Call::new(Op::Commit, ""))
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.store.record(Call::new(Op::Rollback, ""))
    }
}
