//! Procedural macros for condor
//!
//! This crate provides the `Entity` derive. It is re-exported by `condor`,
//! so applications never depend on it directly.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates entity metadata and the field proxy
///
/// This macro generates:
/// - `condor::Entity` implementation (table name + per-field metadata)
/// - `{Struct}Fields` proxy struct holding one typed `condor::Field` handle per field
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Entity)]
/// #[table_name = "users"]
/// pub struct User {
///     #[primary_key]
///     pub id: i64,
///     #[column_name = "user_name"]
///     pub name: String,
///     pub age: i32,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(table_name, primary_key, column_name))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}
