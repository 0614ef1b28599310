//! Integration tests for `#[derive(Entity)]` and the column resolver.

use condor::{resolver, ColumnMap, Entity, Error, Field, Query};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Barrier};
use std::thread;

#[allow(non_snake_case)]
#[derive(Debug, Serialize, Deserialize, Entity)]
#[table_name = "user_accounts"]
pub struct UserAccount {
    #[primary_key]
    pub id: i64,
    #[column_name = "login"]
    pub user_name: String,
    pub emailAddress: String,
    pub r#type: String,
    pub age: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Entity)]
pub struct AuditEvent {
    pub event_id: i64,
    pub payload: String,
}

#[test]
fn test_table_name_attribute() {
    assert_eq!(UserAccount::table_name(), "user_accounts");
}

#[test]
fn test_table_name_defaults_to_snake_case() {
    assert_eq!(AuditEvent::table_name(), "audit_event");
}

#[test]
fn test_field_metadata_in_declaration_order() {
    let fields = UserAccount::fields();
    let names: Vec<_> = fields.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["id", "user_name", "emailAddress", "type", "age"]);
    assert!(fields[0].primary_key);
    assert_eq!(fields[1].column, Some("login"));
    assert!(fields[2].column.is_none());
}

#[test]
fn test_column_map_resolution() {
    let columns = ColumnMap::build::<UserAccount>();
    let (_, u) = Query::<UserAccount>::new();
    assert_eq!(columns.column_name(u.id.ordinal()), Some("id"));
    assert_eq!(columns.column_name(u.user_name.ordinal()), Some("login"));
    assert_eq!(columns.column_name(u.emailAddress.ordinal()), Some("email_address"));
    assert_eq!(columns.column_name(u.r#type.ordinal()), Some("type"));
    assert_eq!(columns.primary_key(), Some("id"));
}

#[test]
fn test_no_primary_key_declared() {
    let columns = ColumnMap::build::<AuditEvent>();
    assert_eq!(columns.primary_key(), None);
}

#[test]
fn test_resolver_returns_shared_instances() {
    let first = resolver::resolve::<UserAccount>();
    let second = resolver::resolve::<UserAccount>();
    assert!(Arc::ptr_eq(&first.proxy, &second.proxy));
    assert!(Arc::ptr_eq(&first.columns, &second.columns));
}

#[test]
fn test_concurrent_first_resolution() {
    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                resolver::columns::<AuditEvent>()
            })
        })
        .collect();
    let maps: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(maps.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_generated_handles_build_conditions() {
    let (q, u) = Query::<UserAccount>::new();
    let q = q.eq(u.user_name, "ada").or().is_null(u.age);
    let ctx = q.build_condition().unwrap();
    assert_eq!(ctx.table, "user_accounts");
    assert_eq!(ctx.predicate.as_deref(), Some("login = ? OR age IS NULL"));
}

#[test]
fn test_foreign_ordinal_fails_to_finalize() {
    let q = Query::<AuditEvent>::empty().eq(Field::<AuditEvent>::new(17), 1);
    assert!(matches!(
        q.build_condition(),
        Err(Error::UnresolvedColumn {
            entity: "audit_event",
            field: 17
        })
    ));
}
