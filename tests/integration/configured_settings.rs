//! Orchestrator behavior under non-default installed settings.
//!
//! Runs in its own binary: the default store and settings can only be
//! installed once per process.

use condor::mock::{Op, RecordingStore};
use condor::{crud, Entity, Page, Settings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Entity)]
#[table_name = "tickets"]
pub struct Ticket {
    pub id: i64,
    pub title: String,
}

#[test]
fn test_configured_page_size_reaches_page_helpers() {
    let store = Arc::new(RecordingStore::new());
    condor::init_with_settings(
        store.clone(),
        Settings {
            page_size: 25,
            batch_size: 40,
            ..Settings::default()
        },
    )
    .unwrap();

    store.push_count(50);
    let mut page: Page<Ticket> = Page::new(2, 0);
    crud::select_page::<Ticket>(&mut page, None, None).unwrap();

    assert_eq!(store.ops(), vec![Op::Count, Op::Find]);
    let fetch = store.last_call().unwrap().query.unwrap();
    assert_eq!((fetch.offset, fetch.limit), (Some(25), Some(25)));
    assert_eq!(page.size, 25);
    assert_eq!(page.limit(), 25);
    assert_eq!(page.offset(), 25);
    assert_eq!(page.pages(), 2);

    let tickets: Vec<Ticket> = (1..=3)
        .map(|id| Ticket {
            id,
            title: format!("ticket-{id}"),
        })
        .collect();
    crud::save_batch(&tickets, None).unwrap();
    assert_eq!(store.last_call().unwrap().chunk_size, Some(40));

    store.push_rows(Vec::new());
    assert!(crud::select_by_id::<Ticket>(9_i64, None).unwrap().is_none());
    let lookup = store.last_call().unwrap().query.unwrap();
    assert_eq!(lookup.predicate.as_deref(), Some("id = ?"));
    assert_eq!(lookup.order.as_deref(), Some("id ASC"));
}
