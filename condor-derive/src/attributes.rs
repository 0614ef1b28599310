//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// Read the string value of a `#[name = "value"]` attribute
fn name_value_str(attr: &Attribute) -> Option<String> {
    let meta = attr.meta.require_name_value().ok()?;
    if let syn::Expr::Lit(ExprLit {
        lit: Lit::Str(s), ..
    }) = &meta.value
    {
        return Some(s.value());
    }
    None
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("table_name"))
        .find_map(name_value_str)
}

/// Column attributes recognised on a field
#[derive(Default)]
pub struct ColumnAttributes {
    pub is_primary_key: bool,
    pub column_name: Option<String>,
}

/// Parse all column attributes from a field
pub fn parse_column_attributes(field: &Field) -> syn::Result<ColumnAttributes> {
    let mut attrs = ColumnAttributes::default();

    for attr in &field.attrs {
        if attr.path().is_ident("primary_key") {
            attr.meta.require_path_only()?;
            attrs.is_primary_key = true;
        } else if attr.path().is_ident("column_name") {
            match name_value_str(attr) {
                Some(name) if !name.is_empty() => attrs.column_name = Some(name),
                _ => {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "expected `#[column_name = \"...\"]` with a non-empty name",
                    ))
                }
            }
        }
    }

    Ok(attrs)
}
