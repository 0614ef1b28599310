//! Column identity: typed field handles, column references and column maps.
//!
//! A [`Field<T>`] is an opaque selector for one field of entity `T`. It is
//! type-tagged, so a handle taken from another entity's proxy does not
//! compile. A [`ColumnRef<T>`] is what builder methods accept: either a
//! literal column name, passed through unchanged, or a field handle resolved
//! through the entity's [`ColumnMap`].

use crate::entity::{Entity, FieldMeta};
use crate::naming;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Handle to one field of entity `T`.
///
/// Handles are obtained from the proxy returned by
/// [`Query::new`](crate::Query::new) or [`resolve`](crate::resolver::resolve).
pub struct Field<T> {
    ordinal: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    /// Create a handle for the field at `ordinal` (declaration order).
    ///
    /// Used by generated code; a handle with an ordinal the entity does not
    /// declare fails to resolve.
    #[doc(hidden)]
    pub const fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            _entity: PhantomData,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
    }
}

impl<T> Eq for Field<T> {}

impl<T> Hash for Field<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordinal.hash(state);
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field<{}>#{}", std::any::type_name::<T>(), self.ordinal)
    }
}

/// A column reference: a literal column name or a field handle.
pub enum ColumnRef<T> {
    Name(String),
    Field(Field<T>),
}

impl<T> Clone for ColumnRef<T> {
    fn clone(&self) -> Self {
        match self {
            ColumnRef::Name(name) => ColumnRef::Name(name.clone()),
            ColumnRef::Field(field) => ColumnRef::Field(*field),
        }
    }
}

impl<T> fmt::Debug for ColumnRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            ColumnRef::Field(field) => f.debug_tuple("Field").field(field).finish(),
        }
    }
}

impl<T> From<Field<T>> for ColumnRef<T> {
    fn from(field: Field<T>) -> Self {
        ColumnRef::Field(field)
    }
}

impl<T> From<&str> for ColumnRef<T> {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl<T> From<String> for ColumnRef<T> {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl<T> From<&String> for ColumnRef<T> {
    fn from(name: &String) -> Self {
        ColumnRef::Name(name.clone())
    }
}

/// Resolved column names of one entity, indexed by field ordinal.
#[derive(Debug)]
pub struct ColumnMap {
    table: &'static str,
    columns: Vec<String>,
    fields: &'static [FieldMeta],
    by_field: HashMap<&'static str, usize>,
    by_column: HashMap<String, usize>,
    primary_key: Option<usize>,
}

impl ColumnMap {
    /// Build the map for `T` from its field metadata.
    ///
    /// Explicit `column_name`s win; every other field goes through
    /// [`naming::column_name`].
    pub fn build<T: Entity>() -> Self {
        let fields = T::fields();
        let mut columns = Vec::with_capacity(fields.len());
        let mut by_field = HashMap::with_capacity(fields.len());
        let mut by_column = HashMap::with_capacity(fields.len());
        let mut primary_key = None;

        for (ordinal, meta) in fields.iter().enumerate() {
            let column = match meta.column {
                Some(explicit) => explicit.to_string(),
                None => naming::column_name(meta.name),
            };
            if meta.primary_key && primary_key.is_none() {
                primary_key = Some(ordinal);
            }
            by_field.insert(meta.name, ordinal);
            by_column.insert(column.clone(), ordinal);
            columns.push(column);
        }

        Self {
            table: T::table_name(),
            columns,
            fields,
            by_field,
            by_column,
            primary_key,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Column name of the field at `ordinal`, `None` if the entity has no such field.
    pub fn column_name(&self, ordinal: usize) -> Option<&str> {
        self.columns.get(ordinal).map(String::as_str)
    }

    /// Resolve a column reference. Literal names pass through unchanged.
    pub fn resolve<'a, T>(&'a self, column: &'a ColumnRef<T>) -> Option<&'a str> {
        match column {
            ColumnRef::Name(name) => Some(name.as_str()),
            ColumnRef::Field(field) => self.column_name(field.ordinal()),
        }
    }

    /// Column of the first field flagged `#[primary_key]`.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.and_then(|ordinal| self.column_name(ordinal))
    }

    pub fn column_for_field(&self, field: &str) -> Option<&str> {
        self.by_field
            .get(field)
            .and_then(|&ordinal| self.column_name(ordinal))
    }

    pub fn field_for_column(&self, column: &str) -> Option<&'static str> {
        self.by_column
            .get(column)
            .map(|&ordinal| self.fields[ordinal].name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
