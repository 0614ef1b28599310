//! Macro implementations

pub mod entity;

pub use entity::derive_entity;
