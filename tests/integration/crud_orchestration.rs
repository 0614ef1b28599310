//! Integration tests for the CRUD/pagination functions against a recording store.

use condor::mock::{Op, RecordingStore};
use condor::{crud, Entity, Error, Page, Query, Row, Settings};
use fake::{Dummy, Fake, Faker};
use rand::Rng;
use sea_query::Value;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Entity, Dummy)]
#[table_name = "products"]
pub struct Product {
    #[primary_key]
    #[column_name = "sku"]
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryTotal {
    category: String,
    total: i64,
}

fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(row) => row,
        other => panic!("expected an object, got {other}"),
    }
}

fn product(id: i64) -> Product {
    Product {
        id,
        name: format!("product-{id}"),
        price: 100,
        category: Some("tools".into()),
    }
}

#[test]
fn test_upsert_creates_once_when_nothing_updated() {
    let store = RecordingStore::new();
    store.push_affected(0);

    crud::save_or_update(&product(7), Some(&store)).unwrap();

    assert_eq!(store.ops(), vec![Op::Update, Op::Create]);
    let created = store.last_call().unwrap();
    assert_eq!(created.table, "products");
    assert_eq!(created.rows[0].get("sku"), Some(&json!(7)));
}

#[test]
fn test_upsert_does_not_create_when_updated() {
    let store = RecordingStore::new();
    store.push_affected(1);

    let affected = crud::save_or_update(&product(7), Some(&store)).unwrap();

    assert_eq!(affected, 1);
    assert_eq!(store.ops(), vec![Op::Update]);
}

#[test]
fn test_empty_batch_issues_no_call() {
    let store = RecordingStore::new();
    let inserted = crud::save_batch::<Product>(&[], Some(&store)).unwrap();
    assert_eq!(inserted, 0);
    assert!(store.calls().is_empty());
}

#[test]
fn test_batch_chunk_size() {
    let store = RecordingStore::new();
    let products: Vec<Product> = (0..5).map(|_| Faker.fake()).collect();
    let chunk: i64 = rand::thread_rng().gen_range(1..=5);

    assert_eq!(crud::save_batch_size(&products, chunk, Some(&store)).unwrap(), 5);
    assert_eq!(store.last_call().unwrap().chunk_size, Some(chunk as usize));

    crud::save_batch_size(&products, -1, Some(&store)).unwrap();
    assert_eq!(store.last_call().unwrap().chunk_size, Some(1000));
    assert_eq!(store.last_call().unwrap().rows.len(), 5);
}

#[test]
fn test_delete_by_id_uses_declared_primary_key() {
    let store = RecordingStore::new();
    store.push_affected(1);
    assert_eq!(crud::delete_by_id::<Product>(3_i64, Some(&store)).unwrap(), 1);

    let ctx = store.last_call().unwrap().query.unwrap();
    assert_eq!(ctx.predicate.as_deref(), Some("sku = ?"));
    assert_eq!(ctx.args, vec![Value::from(3_i64)]);
}

#[test]
fn test_delete_by_builder() {
    let store = RecordingStore::new();
    let (q, p) = Query::<Product>::new();
    let q = q.lt(p.price, 10).and_bracket(
        Query::<Product>::empty()
            .is_null(p.category)
            .or()
            .eq(p.category, "discontinued"),
    );
    crud::delete(&q, Some(&store)).unwrap();

    let ctx = store.last_call().unwrap().query.unwrap();
    assert_eq!(
        ctx.predicate.as_deref(),
        Some("price < ? AND (category IS NULL OR category = ?)")
    );
}

#[test]
fn test_select_list_by_map() {
    let store = RecordingStore::new();
    store.push_rows(vec![row(
        json!({"sku": 1, "name": "saw", "price": 30, "category": "tools"}),
    )]);

    let conditions = [("category".to_string(), Value::from("tools"))]
        .into_iter()
        .collect();
    let products = crud::select_list_by_map::<Product>(&conditions, Some(&store)).unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, 1);
    let ctx = store.last_call().unwrap().query.unwrap();
    assert_eq!(ctx.where_clause().unwrap().0, "category = ?");
}

#[test]
fn test_select_by_ids() {
    let store = RecordingStore::new();
    store.push_rows(vec![
        row(json!({"sku": 1, "name": "saw", "price": 30, "category": null})),
        row(json!({"sku": 2, "name": "drill", "price": 90, "category": null})),
    ]);
    let products = crud::select_by_ids::<Product, _>([1_i64, 2], Some(&store)).unwrap();
    assert_eq!(products.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    let ctx = store.last_call().unwrap().query.unwrap();
    assert_eq!(ctx.predicate.as_deref(), Some("sku IN (?, ?)"));
}

#[test]
fn test_select_list_model_projects_rows() {
    let store = RecordingStore::new();
    store.push_rows(vec![row(json!({"category": "tools", "total": 3}))]);

    let (q, p) = Query::<Product>::new();
    let q = q
        .select([p.category])
        .group([p.category])
        .having("COUNT(*) > ?", [1]);
    let totals: Vec<CategoryTotal> = crud::select_list_model(Some(&q), Some(&store)).unwrap();

    assert_eq!(totals[0].category, "tools");
    assert_eq!(totals[0].total, 3);
    assert_eq!(store.ops(), vec![Op::Scan]);
}

#[test]
fn test_pagination_counts_then_fetches_bounded_window() {
    let store = RecordingStore::new();
    store.push_count(57).push_rows(vec![row(
        json!({"sku": 41, "name": "file", "price": 5, "category": null}),
    )]);

    let (q, p) = Query::<Product>::new();
    let q = q.gt(p.price, 1).order_by_asc([p.id]);
    let mut page = Page::new(3, 20);
    crud::select_page(&mut page, Some(&q), Some(&store)).unwrap();

    assert_eq!(page.total, 57);
    assert_eq!(page.pages(), 3);
    assert_eq!(page.records.len(), 1);

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    let count = calls[0].query.as_ref().unwrap();
    let fetch = calls[1].query.as_ref().unwrap();
    assert_eq!(count.args, fetch.args);
    assert_eq!(count.limit, None);
    assert_eq!((fetch.offset, fetch.limit), (Some(40), Some(20)));
}

#[test]
fn test_pagination_clamps_page_and_size() {
    let store = RecordingStore::new();
    let mut page: Page<Product> = Page::new(0, 0);
    crud::select_page::<Product>(&mut page, None, Some(&store)).unwrap();
    let fetch = store.last_call().unwrap().query.unwrap();
    assert_eq!((fetch.offset, fetch.limit), (Some(0), Some(10)));
}

#[test]
fn test_page_model_projects_records() {
    let store = RecordingStore::new();
    store
        .push_count(1)
        .push_rows(vec![row(json!({"category": "tools", "total": 8}))]);
    let mut page: Page<CategoryTotal> = Page::new(1, 5);
    crud::select_page_model::<Product, _>(&mut page, None, Some(&store)).unwrap();
    assert_eq!(page.records[0].total, 8);
}

#[test]
fn test_unresolved_handle_reaches_no_store() {
    let store = RecordingStore::new();
    let q = Query::<Product>::empty().eq(condor::Field::<Product>::new(40), 1);
    let err = crud::select_list(Some(&q), Some(&store)).unwrap_err();
    assert!(matches!(err, Error::UnresolvedColumn { field: 40, .. }));
    assert!(store.calls().is_empty());
}

#[test]
fn test_transaction_scoped_calls() {
    let store = RecordingStore::new();
    let tx = condor::begin(Some(&store)).unwrap();
    crud::save(&product(1), Some(&*tx)).unwrap();
    crud::delete_by_id::<Product>(2_i64, Some(&*tx)).unwrap();
    tx.rollback().unwrap();
    assert_eq!(
        store.ops(),
        vec![Op::Begin, Op::Create, Op::Delete, Op::Rollback]
    );
}

#[test]
fn test_default_store() {
    let store = Arc::new(RecordingStore::new());
    condor::init(store.clone()).unwrap();
    assert!(matches!(
        condor::init_with_settings(store.clone(), Settings::default()),
        Err(Error::AlreadyInitialized)
    ));

    store.push_count(4);
    assert_eq!(crud::select_count::<Product>(None, None).unwrap(), 4);

    let products: Vec<Product> = (0..3).map(|_| Faker.fake()).collect();
    crud::save_batch(&products, None).unwrap();
    assert_eq!(store.last_call().unwrap().chunk_size, Some(1000));
}
