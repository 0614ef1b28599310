//! Entity trait, field metadata and row marshaling.
//!
//! Entities are plain serde structs; `#[derive(Entity)]` adds the metadata
//! the column resolver needs. Rows exchanged with the store are JSON objects
//! keyed by column name, so conversion renames keys through the entity's
//! [`ColumnMap`] and lets serde do the rest.

use crate::column::ColumnMap;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One row as exchanged with the store, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Metadata of one entity field, as declared on the struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Declared field name
    pub name: &'static str,
    /// Explicit column name from `#[column_name = "..."]`
    pub column: Option<&'static str>,
    /// Set by `#[primary_key]`
    pub primary_key: bool,
}

impl FieldMeta {
    pub const fn new(name: &'static str, column: Option<&'static str>, primary_key: bool) -> Self {
        Self {
            name,
            column,
            primary_key,
        }
    }
}

/// A record type mapped to one table.
///
/// Normally implemented with `#[derive(Entity)]`, which also generates the
/// `{Struct}Fields` proxy used as [`Entity::Fields`].
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Entity)]
/// #[table_name = "users"]
/// pub struct User {
///     #[primary_key]
///     pub id: i64,
///     pub name: String,
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Proxy holding one typed [`Field`](crate::Field) handle per field.
    type Fields: Default + Send + Sync + 'static;

    fn table_name() -> &'static str;

    /// Field metadata, in declaration order (ordinals index into this slice).
    fn fields() -> &'static [FieldMeta];
}

/// Serialize an entity into a row keyed by column name.
pub(crate) fn to_row<T: Entity>(entity: &T, columns: &ColumnMap) -> Result<Row> {
    let value = serde_json::to_value(entity)?;
    let serde_json::Value::Object(object) = value else {
        return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "entity `{}` did not serialize to an object",
            T::table_name()
        ))
        .into());
    };

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let column = columns
                .column_for_field(&key)
                .map(str::to_string)
                .unwrap_or(key);
            (column, value)
        })
        .collect())
}

/// Deserialize a row keyed by column name into an entity.
pub(crate) fn from_row<T: Entity>(row: Row, columns: &ColumnMap) -> Result<T> {
    let object: Row = row
        .into_iter()
        .map(|(key, value)| {
            let field = columns
                .field_for_column(&key)
                .map(str::to_string)
                .unwrap_or(key);
            (field, value)
        })
        .collect();
    Ok(serde_json::from_value(serde_json::Value::Object(object))?)
}

/// Deserialize rows into an arbitrary result shape, without renaming.
pub(crate) fn project<R: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<R>> {
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(serde_json::Value::Object(row))?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: i64,
        owner_name: String,
        balance: i64,
    }

    impl Entity for Account {
        type Fields = ();

        fn table_name() -> &'static str {
            "accounts"
        }

        fn fields() -> &'static [FieldMeta] {
            const FIELDS: &[FieldMeta] = &[
                FieldMeta::new("id", None, true),
                FieldMeta::new("owner_name", Some("owner"), false),
                FieldMeta::new("balance", None, false),
            ];
            FIELDS
        }
    }

    fn columns() -> ColumnMap {
        ColumnMap::build::<Account>()
    }

    #[test]
    fn test_to_row_uses_column_names() {
        let account = Account {
            id: 1,
            owner_name: "ada".into(),
            balance: 10,
        };
        let row = to_row(&account, &columns()).unwrap();
        assert_eq!(row.get("owner"), Some(&json!("ada")));
        assert_eq!(row.get("balance"), Some(&json!(10)));
        assert!(row.get("owner_name").is_none());
    }

    #[test]
    fn test_from_row_maps_back_to_fields() {
        let row = json!({"id": 2, "owner": "grace", "balance": 5});
        let serde_json::Value::Object(row) = row else {
            unreachable!()
        };
        let account: Account = from_row(row, &columns()).unwrap();
        assert_eq!(
            account,
            Account {
                id: 2,
                owner_name: "grace".into(),
                balance: 5
            }
        );
    }

    #[test]
    fn test_from_row_reports_missing_field() {
        let serde_json::Value::Object(row) = json!({"id": 2}) else {
            unreachable!()
        };
        let err = from_row::<Account>(row, &columns()).unwrap_err();
        assert!(matches!(err, crate::Error::Marshal(_)));
    }
}
