//! Derive macro for Entity
//!
//! Generates the `condor::Entity` implementation and the `{Struct}Fields`
//! proxy struct whose members are typed field handles.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes;
use crate::utils;

/// Generate the Entity implementation and the field proxy struct
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Entity requires a struct with named fields",
            ));
        }
    };

    let table_name = attributes::extract_table_name(&input.attrs)
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));

    let fields_name = format_ident!("{}Fields", struct_name);

    let mut metas = Vec::with_capacity(fields.len());
    let mut handle_decls = Vec::with_capacity(fields.len());
    let mut handle_inits = Vec::with_capacity(fields.len());

    for (ordinal, field) in fields.iter().enumerate() {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = attributes::parse_column_attributes(field)?;
        let field_name = utils::unraw(ident);
        let column = match &attrs.column_name {
            Some(name) => quote! { ::core::option::Option::Some(#name) },
            None => quote! { ::core::option::Option::None },
        };
        let primary_key = attrs.is_primary_key;

        metas.push(quote! {
            ::condor::FieldMeta::new(#field_name, #column, #primary_key)
        });
        handle_decls.push(quote! {
            pub #ident: ::condor::Field<#struct_name>
        });
        handle_inits.push(quote! {
            #ident: ::condor::Field::new(#ordinal)
        });
    }

    let doc = format!("Typed field handles for [`{struct_name}`].");

    Ok(quote! {
        impl ::condor::Entity for #struct_name {
            type Fields = #fields_name;

            fn table_name() -> &'static str {
                #table_name
            }

            fn fields() -> &'static [::condor::FieldMeta] {
                const FIELDS: &[::condor::FieldMeta] = &[#(#metas),*];
                FIELDS
            }
        }

        #[doc = #doc]
        #[derive(Debug, Clone, Copy)]
        #[allow(non_snake_case)]
        #vis struct #fields_name {
            #(#handle_decls,)*
        }

        impl ::core::default::Default for #fields_name {
            fn default() -> Self {
                Self {
                    #(#handle_inits,)*
                }
            }
        }
    })
}
