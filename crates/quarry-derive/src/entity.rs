//! Entity derive macro implementation

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

use crate::attrs::{parse_field_attrs, parse_struct_attrs};

struct MappedField {
    ident: syn::Ident,
    column: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let struct_attr = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let table = struct_attr
        .table
        .unwrap_or_else(|| format!("{}s", name.to_string().to_snake_case()));

    let mut mapped = Vec::with_capacity(fields.len());
    let mut primary_key: Option<String> = None;
    for field in fields {
        let attr = parse_field_attrs(field)?;
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        if attr.skip {
            if attr.is_id || attr.column.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "a skipped field cannot also be `id` or carry a `column`",
                ));
            }
            continue;
        }

        let column = attr.column.unwrap_or_else(|| ident.unraw().to_string());
        if mapped.iter().any(|m: &MappedField| m.column == column) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column `{column}` is mapped twice"),
            ));
        }
        if attr.is_id {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be marked #[orm(id)]",
                ));
            }
            primary_key = Some(column.clone());
        }
        mapped.push(MappedField { ident, column });
    }
    let primary_key = primary_key.unwrap_or_else(|| "id".to_string());

    let registrations = mapped.iter().map(|MappedField { ident, column }| {
        quote! {
            .field(
                #column,
                |entity: &mut Self, value: ::quarry::Value| -> ::core::result::Result<(), ::quarry::ConversionError> {
                    entity.#ident = ::quarry::FromValue::from_value(value)?;
                    ::core::result::Result::Ok(())
                },
                |entity: &Self| ::quarry::IntoValue::into_value(::core::clone::Clone::clone(&entity.#ident)),
            )
        }
    });

    let relations = struct_attr.relations.map(|path| {
        quote! {
            fn relations() -> ::quarry::Relations<Self> {
                #path()
            }
        }
    });

    let scopes = struct_attr.scopes.map(|path| {
        quote! {
            fn scopes() -> ::quarry::Scopes<Self> {
                #path()
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::quarry::Entity for #name #ty_generics #where_clause {
            fn table() -> &'static str {
                #table
            }

            fn primary_key() -> &'static str {
                #primary_key
            }

            fn fields() -> ::quarry::Fields<Self> {
                ::quarry::Fields::new()
                    #(#registrations)*
            }

            #relations

            #scopes
        }
    })
}
