//! Process-wide column resolver.
//!
//! For every entity type the resolver builds, once, a shared proxy (the
//! entity's `Fields` struct of typed handles) and its [`ColumnMap`], and keeps
//! both for the life of the process. There is no eviction and no teardown.
//!
//! Population goes through the `DashMap` entry API: the first caller for a
//! type builds the registration while holding the shard lock, concurrent
//! callers for the same type wait and then observe the published value.

use crate::column::ColumnMap;
use crate::entity::Entity;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

static REGISTRY: Lazy<DashMap<TypeId, Registration>> = Lazy::new(DashMap::new);

#[derive(Clone)]
struct Registration {
    proxy: Arc<dyn Any + Send + Sync>,
    columns: Arc<ColumnMap>,
}

/// Cached proxy and column map of entity `T`.
pub struct Resolved<T: Entity> {
    pub proxy: Arc<T::Fields>,
    pub columns: Arc<ColumnMap>,
}

impl<T: Entity> Clone for Resolved<T> {
    fn clone(&self) -> Self {
        Self {
            proxy: Arc::clone(&self.proxy),
            columns: Arc::clone(&self.columns),
        }
    }
}

/// Return the cached proxy and column map for `T`, building them on first use.
///
/// Every call for the same `T` returns the same `Arc`s.
pub fn resolve<T: Entity>() -> Resolved<T> {
    let key = TypeId::of::<T>();

    let registration = match REGISTRY.get(&key) {
        Some(hit) => hit.value().clone(),
        None => REGISTRY
            .entry(key)
            .or_insert_with(|| {
                log::trace!("building column map for `{}`", T::table_name());
                Registration {
                    proxy: Arc::new(T::Fields::default()),
                    columns: Arc::new(ColumnMap::build::<T>()),
                }
            })
            .value()
            .clone(),
    };

    let proxy = Arc::downcast::<T::Fields>(registration.proxy)
        .unwrap_or_else(|_| unreachable!("registry entry keyed by TypeId holds that type's proxy"));

    Resolved {
        proxy,
        columns: registration.columns,
    }
}

/// Cached column map for `T`.
pub fn columns<T: Entity>() -> Arc<ColumnMap> {
    resolve::<T>().columns
}

/// Cached proxy for `T`.
pub fn proxy<T: Entity>() -> Arc<T::Fields> {
    resolve::<T>().proxy
}
