//! # condor
//!
//! Type-assisted condition building and CRUD/pagination over a pluggable
//! relational store.
//!
//! Entities are serde structs deriving [`Entity`]. Conditions are built with
//! [`Query`], using typed field handles from the entity's generated
//! `{Struct}Fields` proxy or literal column names. The [`crud`] functions
//! finalize a query and hand it to a [`Store`], the execution engine the
//! application provides.
//!
//! ```ignore
//! use condor::{crud, Entity, Page, Query};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Entity)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     pub id: i64,
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! condor::init(std::sync::Arc::new(MyStore::connect()?))?;
//!
//! let (q, u) = Query::<User>::new();
//! let q = q.ge(u.age, 18).or().like(u.name, "ada");
//! let mut page = Page::new(1, 20);
//! crud::select_page(&mut page, Some(&q), None)?;
//! ```

extern crate self as condor;

pub mod column;
pub mod config;
pub mod crud;
pub mod entity;
pub mod error;
pub mod mock;
pub mod naming;
pub mod page;
pub mod query;
pub mod resolver;
pub mod store;
pub mod value;

pub use column::{ColumnMap, ColumnRef, Field};
pub use condor_derive::Entity;
pub use config::Settings;
pub use entity::{Entity, FieldMeta, Row};
pub use error::{Error, Result};
pub use page::Page;
pub use query::{Connective, Query, QueryContext};
pub use store::{begin, init, init_with_settings, Op, Patch, Store, Transaction};
