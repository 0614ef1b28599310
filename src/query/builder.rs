//! Fluent condition builder.
//!
//! Conditions chain left to right. Unless the previous call was an explicit
//! [`Query::and`] / [`Query::or`], every new condition is joined with `AND`;
//! the explicit connective only applies to the condition right after it.
//! Parenthesised sub-conditions are attached with [`Query::and_bracket`] and
//! [`Query::or_bracket`]; they are kept apart from the main chain and flushed
//! after it, AND-groups first, when the query is finalized.

use super::condition::{CompareOp, Connective, Expr, Predicate};
use super::context::QueryContext;
use crate::column::{ColumnMap, ColumnRef};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::resolver;
use sea_query::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::sync::Arc;

/// Condition / update builder for entity `T`.
///
/// A builder belongs to one call path; it is not meant to be shared.
/// Finalizing does not consume or mutate it, so the same builder can be
/// finalized again (the paginated selects rely on this for their count step).
///
/// # Example
///
/// ```ignore
/// let (q, u) = Query::<User>::new();
/// let q = q
///     .eq(u.status, "active")
///     .ge(u.age, 18)
///     .and_bracket(Query::<User>::empty().eq(u.role, "admin").or().eq(u.role, "owner"))
///     .order_by_desc([u.created_at]);
/// let users = crud::select_list(Some(&q), None)?;
/// ```
pub struct Query<T: Entity> {
    columns: Arc<ColumnMap>,
    select: Vec<String>,
    distinct: Vec<String>,
    predicate: Predicate,
    pending: Option<Connective>,
    and_groups: Vec<Predicate>,
    or_groups: Vec<Predicate>,
    order: Vec<String>,
    group: Vec<String>,
    having: Vec<String>,
    having_args: Vec<Value>,
    updates: BTreeMap<String, Value>,
    conditions: Option<BTreeMap<String, Value>>,
    unresolved: Option<usize>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Query<T> {
    /// New builder together with the entity's shared field proxy.
    pub fn new() -> (Self, Arc<T::Fields>) {
        let resolved = resolver::resolve::<T>();
        (Self::with_columns(resolved.columns), resolved.proxy)
    }

    /// New builder whose equality map is enabled (see [`Query::map_eq`]).
    pub fn with_map() -> (Self, Arc<T::Fields>) {
        let (mut query, proxy) = Self::new();
        query.conditions = Some(BTreeMap::new());
        (query, proxy)
    }

    /// New builder without the proxy, for bracket groups and internal use.
    pub fn empty() -> Self {
        Self::with_columns(resolver::columns::<T>())
    }

    fn with_columns(columns: Arc<ColumnMap>) -> Self {
        Self {
            columns,
            select: Vec::new(),
            distinct: Vec::new(),
            predicate: Predicate::default(),
            pending: None,
            and_groups: Vec::new(),
            or_groups: Vec::new(),
            order: Vec::new(),
            group: Vec::new(),
            having: Vec::new(),
            having_args: Vec::new(),
            updates: BTreeMap::new(),
            conditions: None,
            unresolved: None,
            _entity: PhantomData,
        }
    }

    pub fn eq(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Eq, value.into())
    }

    pub fn ne(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Ne, value.into())
    }

    pub fn gt(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Gt, value.into())
    }

    pub fn ge(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Ge, value.into())
    }

    pub fn lt(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Lt, value.into())
    }

    pub fn le(self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        self.compare(column.into(), CompareOp::Le, value.into())
    }

    /// `column LIKE '%value%'`
    pub fn like(self, column: impl Into<ColumnRef<T>>, value: impl Display) -> Self {
        self.compare(column.into(), CompareOp::Like, Value::from(format!("%{value}%")))
    }

    /// `column NOT LIKE '%value%'`
    pub fn not_like(self, column: impl Into<ColumnRef<T>>, value: impl Display) -> Self {
        self.compare(
            column.into(),
            CompareOp::NotLike,
            Value::from(format!("%{value}%")),
        )
    }

    /// `column LIKE '%value'` (matches values ending with `value`)
    pub fn like_left(self, column: impl Into<ColumnRef<T>>, value: impl Display) -> Self {
        self.compare(column.into(), CompareOp::Like, Value::from(format!("%{value}")))
    }

    /// `column LIKE 'value%'` (matches values starting with `value`)
    pub fn like_right(self, column: impl Into<ColumnRef<T>>, value: impl Display) -> Self {
        self.compare(column.into(), CompareOp::Like, Value::from(format!("{value}%")))
    }

    pub fn is_null(mut self, column: impl Into<ColumnRef<T>>) -> Self {
        let column = self.column_name(&column.into());
        self.push(Expr::Null {
            column,
            negated: false,
        });
        self
    }

    pub fn is_not_null(mut self, column: impl Into<ColumnRef<T>>) -> Self {
        let column = self.column_name(&column.into());
        self.push(Expr::Null {
            column,
            negated: true,
        });
        self
    }

    /// `column IN (...)`
    pub fn in_list<V: Into<Value>>(
        self,
        column: impl Into<ColumnRef<T>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.membership(column.into(), values, false)
    }

    /// `column NOT IN (...)`
    pub fn not_in<V: Into<Value>>(
        self,
        column: impl Into<ColumnRef<T>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.membership(column.into(), values, true)
    }

    pub fn between(
        self,
        column: impl Into<ColumnRef<T>>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.range(column.into(), low.into(), high.into(), false)
    }

    pub fn not_between(
        self,
        column: impl Into<ColumnRef<T>>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.range(column.into(), low.into(), high.into(), true)
    }

    /// Join the next condition with `AND`.
    pub fn and(mut self) -> Self {
        self.pending = Some(Connective::And);
        self
    }

    /// Join the next condition with `OR`. Only the next condition is affected.
    pub fn or(mut self) -> Self {
        self.pending = Some(Connective::Or);
        self
    }

    /// Attach `AND (<bracket>)`, emitted after the main chain.
    pub fn and_bracket(mut self, bracket: Query<T>) -> Self {
        if let Some(group) = self.absorb(bracket) {
            self.and_groups.push(group);
        }
        self
    }

    /// Attach `OR (<bracket>)`, emitted after the main chain and all AND-groups.
    pub fn or_bracket(mut self, bracket: Query<T>) -> Self {
        if let Some(group) = self.absorb(bracket) {
            self.or_groups.push(group);
        }
        self
    }

    pub fn select<C: Into<ColumnRef<T>>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        for column in columns {
            let name = self.column_name(&column.into());
            self.select.push(name);
        }
        self
    }

    pub fn distinct<C: Into<ColumnRef<T>>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        for column in columns {
            let name = self.column_name(&column.into());
            self.distinct.push(name);
        }
        self
    }

    pub fn order_by_asc<C: Into<ColumnRef<T>>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        self.order_by(columns, "ASC")
    }

    pub fn order_by_desc<C: Into<ColumnRef<T>>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        self.order_by(columns, "DESC")
    }

    pub fn group<C: Into<ColumnRef<T>>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        for column in columns {
            let name = self.column_name(&column.into());
            self.group.push(name);
        }
        self
    }

    /// Raw `HAVING` fragment with `?` placeholders. Repeated calls are AND-ed.
    pub fn having<V: Into<Value>>(
        mut self,
        fragment: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> Self {
        self.having.push(fragment.into());
        self.having_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Record `column = value` for predicate-scoped updates.
    pub fn set(mut self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        let column = self.column_name(&column.into());
        self.updates.insert(column, value.into());
        self
    }

    /// Add an entry to the equality map: an implicit `column = value`,
    /// AND-combined with every other condition.
    pub fn map_eq(mut self, column: impl Into<ColumnRef<T>>, value: impl Into<Value>) -> Self {
        let column = self.column_name(&column.into());
        self.conditions
            .get_or_insert_with(BTreeMap::new)
            .insert(column, value.into());
        self
    }

    /// Column -> value pairs collected by [`Query::set`].
    pub fn updates(&self) -> &BTreeMap<String, Value> {
        &self.updates
    }

    pub fn has_conditions(&self) -> bool {
        !self.predicate.is_empty()
            || !self.and_groups.is_empty()
            || !self.or_groups.is_empty()
            || self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Main chain with bracket groups flushed, AND-groups before OR-groups.
    fn full_predicate(&self) -> Predicate {
        let mut predicate = self.predicate.clone();
        for group in &self.and_groups {
            predicate.push(Connective::And, Expr::Group(group.clone()));
        }
        for group in &self.or_groups {
            predicate.push(Connective::Or, Expr::Group(group.clone()));
        }
        predicate
    }

    /// Finalize into a store-bound [`QueryContext`].
    ///
    /// Fails with [`Error::UnresolvedColumn`] if any field handle used while
    /// building did not belong to `T`.
    pub fn build_condition(&self) -> Result<QueryContext> {
        if let Some(field) = self.unresolved {
            return Err(Error::UnresolvedColumn {
                entity: self.columns.table(),
                field,
            });
        }

        let mut ctx = QueryContext::new(self.columns.table());
        ctx.distinct = self.distinct.clone();
        ctx.select = self.select.clone();

        let predicate = self.full_predicate();
        if !predicate.is_empty() {
            let (sql, args) = predicate.to_sql();
            ctx.predicate = Some(sql);
            ctx.args = args;
        }

        if let Some(conditions) = &self.conditions {
            ctx.conditions = conditions.clone();
        }

        if !self.order.is_empty() {
            ctx.order = Some(self.order.join(", "));
        }
        if !self.group.is_empty() {
            ctx.group = Some(self.group.join(", "));
        }
        if !self.having.is_empty() {
            ctx.having = Some(self.having.join(" AND "));
            ctx.having_args = self.having_args.clone();
        }

        Ok(ctx)
    }

    fn compare(mut self, column: ColumnRef<T>, op: CompareOp, value: Value) -> Self {
        let column = self.column_name(&column);
        self.push(Expr::Compare { column, op, value });
        self
    }

    fn membership<V: Into<Value>>(
        mut self,
        column: ColumnRef<T>,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> Self {
        let column = self.column_name(&column);
        let values = values.into_iter().map(Into::into).collect();
        self.push(Expr::InList {
            column,
            values,
            negated,
        });
        self
    }

    fn range(mut self, column: ColumnRef<T>, low: Value, high: Value, negated: bool) -> Self {
        let column = self.column_name(&column);
        self.push(Expr::Between {
            column,
            low,
            high,
            negated,
        });
        self
    }

    fn order_by<C: Into<ColumnRef<T>>>(
        mut self,
        columns: impl IntoIterator<Item = C>,
        direction: &str,
    ) -> Self {
        for column in columns {
            let name = self.column_name(&column.into());
            self.order.push(format!("{name} {direction}"));
        }
        self
    }

    /// Append to the main chain, consuming a pending explicit connective.
    fn push(&mut self, expr: Expr) {
        let connective = self.pending.take().unwrap_or(Connective::And);
        self.predicate.push(connective, expr);
    }

    /// Take a bracket's full predicate and its recorded failure, if any.
    fn absorb(&mut self, bracket: Query<T>) -> Option<Predicate> {
        self.unresolved = self.unresolved.or(bracket.unresolved);
        let group = bracket.full_predicate();
        (!group.is_empty()).then_some(group)
    }

    /// Resolve a column reference, remembering the first failure.
    fn column_name(&mut self, column: &ColumnRef<T>) -> String {
        if let Some(name) = self.columns.resolve(column) {
            return name.to_string();
        }
        let field = match column {
            ColumnRef::Field(field) => field.ordinal(),
            ColumnRef::Name(_) => usize::MAX,
        };
        log::warn!(
            "field #{field} is not registered for `{}`; query will fail to finalize",
            self.columns.table()
        );
        self.unresolved = self.unresolved.or(Some(field));
        String::new()
    }
}

impl<T: Entity> Default for Query<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Entity> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (predicate, args) = self.full_predicate().to_sql();
        f.debug_struct("Query")
            .field("table", &self.columns.table())
            .field("predicate", &predicate)
            .field("args", &args)
            .field("conditions", &self.conditions)
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}
