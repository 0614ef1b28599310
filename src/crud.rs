//! CRUD and pagination over a [`Store`].
//!
//! Every function takes an optional store handle; `None` uses the default
//! installed with [`init`](crate::init). Builders are borrowed, never
//! consumed: finalizing is side-effect free, so the paginated selects can
//! finalize the same builder for the count and for the fetch.

use crate::column::ColumnMap;
use crate::config::Settings;
use crate::entity::{self, Entity, Row};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::query::{Query, QueryContext};
use crate::resolver;
use crate::store::{self, Op, Patch, Store};
use crate::value;
use sea_query::Value;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Insert one entity. Returns the affected row count.
pub fn save<T: Entity>(entity: &T, store: Option<&dyn Store>) -> Result<u64> {
    let store = store::resolve_store(store)?;
    let columns = resolver::columns::<T>();
    let row = entity::to_row(entity, &columns)?;
    log::debug!("INSERT INTO {} ({} columns)", columns.table(), row.len());
    run(Op::Create, columns.table(), || store.create(columns.table(), row))
}

/// Update by primary key, inserting instead when no row was affected.
///
/// Not atomic: a row deleted or inserted concurrently between the two steps
/// can make the insert fail on a duplicate key. An update that matches a row
/// but changes nothing also reports zero rows on some stores and leads to an
/// insert attempt.
pub fn save_or_update<T: Entity>(entity: &T, store: Option<&dyn Store>) -> Result<u64> {
    let store = store::resolve_store(store)?;
    match update_by_id(entity, Some(store)) {
        Ok(0) => {
            log::warn!(
                "update on `{}` affected no rows, falling back to insert",
                T::table_name()
            );
            save(entity, Some(store))
        }
        Err(Error::MissingPrimaryKey { .. }) => save(entity, Some(store)),
        other => other,
    }
}

/// Batch insert with the configured chunk size.
pub fn save_batch<T: Entity>(entities: &[T], store: Option<&dyn Store>) -> Result<u64> {
    save_batch_size(entities, 0, store)
}

/// Batch insert, `chunk_size` rows per statement (`<= 0` uses the configured size).
///
/// An empty slice is a no-op and issues no store call.
pub fn save_batch_size<T: Entity>(
    entities: &[T],
    chunk_size: i64,
    store: Option<&dyn Store>,
) -> Result<u64> {
    if entities.is_empty() {
        return Ok(0);
    }
    let store = store::resolve_store(store)?;
    let columns = resolver::columns::<T>();
    let chunk_size = match usize::try_from(chunk_size) {
        Ok(size) if size > 0 => size,
        _ => store::settings().batch_size,
    };
    let rows = entities
        .iter()
        .map(|entity| entity::to_row(entity, &columns))
        .collect::<Result<Vec<_>>>()?;
    log::debug!(
        "INSERT INTO {} ({} rows, chunks of {chunk_size})",
        columns.table(),
        rows.len()
    );
    run(Op::CreateBatch, columns.table(), || {
        store.create_batch(columns.table(), rows, chunk_size)
    })
}

pub fn delete_by_id<T: Entity>(id: impl Into<Value>, store: Option<&dyn Store>) -> Result<u64> {
    let query = by_key::<T>(id.into());
    delete(&query, store)
}

pub fn delete_by_ids<T: Entity, V: Into<Value>>(
    ids: impl IntoIterator<Item = V>,
    store: Option<&dyn Store>,
) -> Result<u64> {
    let query = by_keys::<T, V>(ids);
    delete(&query, store)
}

/// Delete every row matching `query`.
///
/// A query without conditions is refused with [`Error::MissingCondition`]
/// before any store call.
pub fn delete<T: Entity>(query: &Query<T>, store: Option<&dyn Store>) -> Result<u64> {
    require_condition(query, Op::Delete)?;
    let store = store::resolve_store(store)?;
    let ctx = query.build_condition()?;
    log_statement(Op::Delete, &ctx);
    run(Op::Delete, &ctx.table, || store.delete(&ctx))
}

/// Delete rows whose columns equal every entry of `conditions`.
///
/// An empty map is refused like an unconditioned [`delete`].
pub fn delete_by_map<T: Entity>(
    conditions: &BTreeMap<String, Value>,
    store: Option<&dyn Store>,
) -> Result<u64> {
    delete(&by_map::<T>(conditions), store)
}

/// Update the row identified by the entity's primary key.
///
/// Columns holding their zero value (null, `false`, `0`, `""`) are skipped;
/// the rest, minus the key, become the patch. Fails with
/// [`Error::MissingPrimaryKey`] when the key is absent or zero.
pub fn update_by_id<T: Entity>(entity: &T, store: Option<&dyn Store>) -> Result<u64> {
    let store = store::resolve_store(store)?;
    let settings = store::settings();
    let columns = resolver::columns::<T>();
    let key_column = primary_key_column(&columns, &settings);

    let mut row = entity::to_row(entity, &columns)?;
    let key = match row.remove(&key_column) {
        Some(key) if !value::is_zero(&key) => value::from_json(key),
        _ => {
            return Err(Error::MissingPrimaryKey {
                entity: columns.table(),
                column: key_column,
            })
        }
    };

    let patch: Patch = row
        .into_iter()
        .filter(|(_, json)| !value::is_zero(json))
        .map(|(column, json)| (column, value::from_json(json)))
        .collect();
    if patch.is_empty() {
        log::debug!("nothing to update on `{}`", columns.table());
        return Ok(0);
    }

    let ctx = Query::<T>::empty()
        .eq(key_column.as_str(), key)
        .build_condition()?;
    log_statement(Op::Update, &ctx);
    run(Op::Update, &ctx.table, || store.update(&ctx, &patch))
}

/// Apply the builder's `set` assignments to every row matching it.
///
/// Refused with [`Error::MissingCondition`] when the builder has no conditions.
pub fn update<T: Entity>(query: &Query<T>, store: Option<&dyn Store>) -> Result<u64> {
    require_condition(query, Op::Update)?;
    let store = store::resolve_store(store)?;
    let ctx = query.build_condition()?;
    let patch: Patch = query.updates().clone();
    log_statement(Op::Update, &ctx);
    run(Op::Update, &ctx.table, || store.update(&ctx, &patch))
}

pub fn select_by_id<T: Entity>(id: impl Into<Value>, store: Option<&dyn Store>) -> Result<Option<T>> {
    select_one(&by_key::<T>(id.into()), store)
}

pub fn select_by_ids<T: Entity, V: Into<Value>>(
    ids: impl IntoIterator<Item = V>,
    store: Option<&dyn Store>,
) -> Result<Vec<T>> {
    select_list(Some(&by_keys::<T, V>(ids)), store)
}

/// First row matching `query`, if any.
///
/// Without an explicit order the rows are ordered by primary key, ascending.
pub fn select_one<T: Entity>(query: &Query<T>, store: Option<&dyn Store>) -> Result<Option<T>> {
    let store = store::resolve_store(store)?;
    let columns = resolver::columns::<T>();
    let mut ctx = query.build_condition()?;
    if ctx.order.is_none() {
        let key = primary_key_column(&columns, &store::settings());
        ctx.order = Some(format!("{key} ASC"));
    }
    ctx.limit = Some(1);
    let rows = fetch(store, &ctx, Op::Find)?;
    rows.into_iter()
        .next()
        .map(|row| entity::from_row(row, &columns))
        .transpose()
}

/// Every row matching `query` (all rows of the table with `None`).
pub fn select_list<T: Entity>(query: Option<&Query<T>>, store: Option<&dyn Store>) -> Result<Vec<T>> {
    let store = store::resolve_store(store)?;
    let ctx = context(query)?;
    let rows = fetch(store, &ctx, Op::Find)?;
    to_entities(rows)
}

/// Like [`select_list`], projecting each row into `R` instead of `T`.
///
/// `R` is deserialized from rows keyed by column name.
pub fn select_list_model<T: Entity, R: DeserializeOwned>(
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
) -> Result<Vec<R>> {
    let store = store::resolve_store(store)?;
    let ctx = context(query)?;
    entity::project(fetch(store, &ctx, Op::Scan)?)
}

pub fn select_list_by_map<T: Entity>(
    conditions: &BTreeMap<String, Value>,
    store: Option<&dyn Store>,
) -> Result<Vec<T>> {
    select_list(Some(&by_map::<T>(conditions)), store)
}

/// Like [`select_list`], returning raw rows keyed by column name.
pub fn select_list_maps<T: Entity>(
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
) -> Result<Vec<Row>> {
    let store = store::resolve_store(store)?;
    let ctx = context(query)?;
    fetch(store, &ctx, Op::Scan)
}

pub fn select_count<T: Entity>(query: Option<&Query<T>>, store: Option<&dyn Store>) -> Result<i64> {
    let store = store::resolve_store(store)?;
    let ctx = context(query)?;
    count(store, &ctx)
}

/// Whether at least one row matches `query`.
pub fn exists<T: Entity>(query: &Query<T>, store: Option<&dyn Store>) -> Result<bool> {
    Ok(select_one(query, store)?.is_some())
}

/// Fill `page` with one page of entities.
///
/// Counts first; if the count fails the page is left untouched.
pub fn select_page<T: Entity>(
    page: &mut Page<T>,
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
) -> Result<()> {
    let rows = paginate(page, query, store, Op::Find)?;
    page.records = to_entities(rows)?;
    Ok(())
}

/// Like [`select_page`], projecting each row into `R`.
pub fn select_page_model<T: Entity, R: DeserializeOwned>(
    page: &mut Page<R>,
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
) -> Result<()> {
    let rows = paginate(page, query, store, Op::Scan)?;
    page.records = entity::project(rows)?;
    Ok(())
}

/// Like [`select_page`], with raw rows as records.
pub fn select_page_maps<T: Entity>(
    page: &mut Page<Row>,
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
) -> Result<()> {
    page.records = paginate(page, query, store, Op::Scan)?;
    Ok(())
}

/// Count, record the total, then fetch the bounded window.
///
/// The clamped page number and size are written back to `page`.
fn paginate<T: Entity, R>(
    page: &mut Page<R>,
    query: Option<&Query<T>>,
    store: Option<&dyn Store>,
    op: Op,
) -> Result<Vec<Row>> {
    let store = store::resolve_store(store)?;
    let total = count(store, &context(query)?)?;
    page.total = total;

    let (offset, limit) = page.bounds(store::settings().page_size);
    page.current = page.page_number();
    page.size = i64::try_from(limit).unwrap_or(i64::MAX);
    let ctx = context(query)?.with_bounds(offset, limit);
    fetch(store, &ctx, op)
}

fn require_condition<T: Entity>(query: &Query<T>, op: Op) -> Result<()> {
    if query.has_conditions() {
        return Ok(());
    }
    log::warn!("refusing unconditioned {} on `{}`", op.name(), T::table_name());
    Err(Error::MissingCondition {
        entity: T::table_name(),
        operation: op.name(),
    })
}

/// Column used for key lookups on `T`.
fn primary_key_column(columns: &ColumnMap, settings: &Settings) -> String {
    columns
        .primary_key()
        .map(str::to_string)
        .unwrap_or_else(|| settings.primary_key.clone())
}

fn by_key<T: Entity>(id: Value) -> Query<T> {
    let key = primary_key_column(&resolver::columns::<T>(), &store::settings());
    Query::<T>::empty().eq(key, id)
}

fn by_keys<T: Entity, V: Into<Value>>(ids: impl IntoIterator<Item = V>) -> Query<T> {
    let key = primary_key_column(&resolver::columns::<T>(), &store::settings());
    Query::<T>::empty().in_list(key, ids)
}

fn by_map<T: Entity>(conditions: &BTreeMap<String, Value>) -> Query<T> {
    conditions
        .iter()
        .fold(Query::<T>::empty(), |query, (column, value)| {
            query.map_eq(column, value.clone())
        })
}

fn context<T: Entity>(query: Option<&Query<T>>) -> Result<QueryContext> {
    match query {
        Some(query) => query.build_condition(),
        None => Ok(QueryContext::new(T::table_name())),
    }
}

fn to_entities<T: Entity>(rows: Vec<Row>) -> Result<Vec<T>> {
    let columns = resolver::columns::<T>();
    rows.into_iter()
        .map(|row| entity::from_row(row, &columns))
        .collect()
}

fn fetch(store: &dyn Store, ctx: &QueryContext, op: Op) -> Result<Vec<Row>> {
    log_statement(op, ctx);
    run(op, &ctx.table, || match op {
        Op::Scan => store.scan(ctx),
        _ => store.find(ctx),
    })
}

fn count(store: &dyn Store, ctx: &QueryContext) -> Result<i64> {
    log_statement(Op::Count, ctx);
    run(Op::Count, &ctx.table, || store.count(ctx))
}

fn log_statement(op: Op, ctx: &QueryContext) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let (sql, args) = match op {
        Op::Count => ctx.count_sql(),
        Op::Find | Op::Scan => ctx.select_sql(),
        _ => {
            let (clause, args) = ctx.where_clause().unwrap_or_default();
            let verb = op.name().to_uppercase();
            (format!("{verb} {} WHERE {clause}", ctx.table), args)
        }
    };
    log::debug!("{sql} ({} args)", args.len());
}

/// Run one store call, inside a `condor.store` span when tracing is enabled.
#[cfg(feature = "tracing")]
fn run<R>(op: Op, table: &str, call: impl FnOnce() -> Result<R>) -> Result<R> {
    let span = tracing::debug_span!("condor.store", op = op.name(), table);
    let _guard = span.enter();
    call()
}

#[cfg(not(feature = "tracing"))]
fn run<R>(_op: Op, _table: &str, call: impl FnOnce() -> Result<R>) -> Result<R> {
    call()
}
