//! `#[orm(...)]` attribute parsing.

use syn::parse::{Parse, ParseStream};
use syn::{Field, LitStr, Path, Result, Token};

use crate::sql_ident::{parse_column, parse_table};

/// Struct-level `#[orm(table = "...", relations = path, scopes = path)]`.
#[derive(Default)]
pub(crate) struct StructAttr {
    pub table: Option<String>,
    pub relations: Option<Path>,
    pub scopes: Option<Path>,
}

impl Parse for StructAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let _: Token![=] = input.parse()?;
            if ident == "table" {
                let lit: LitStr = input.parse()?;
                attr.table = Some(parse_table(&lit.value(), lit.span())?);
            } else if ident == "relations" {
                attr.relations = Some(input.parse()?);
            } else if ident == "scopes" {
                attr.scopes = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown entity attribute `{ident}` (expected `table`, `relations` or `scopes`)"),
                ));
            }

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

/// Field-level `#[orm(id)]`, `#[orm(column = "...")]`, `#[orm(skip)]`, `#[orm(relation)]`.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub column: Option<String>,
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "id" {
                attr.is_id = true;
            } else if ident == "skip" || ident == "relation" {
                attr.skip = true;
            } else if ident == "column" {
                let _: Token![=] = input.parse()?;
                let lit: LitStr = input.parse()?;
                attr.column = Some(parse_column(&lit.value(), lit.span(), "column")?);
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!(
                        "unknown field attribute `{ident}` (expected `id`, `column`, `skip` or `relation`)"
                    ),
                ));
            }

            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            } else {
                break;
            }
        }
        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on an item into one value.
pub(crate) fn parse_struct_attrs(attrs: &[syn::Attribute]) -> Result<StructAttr> {
    let mut merged = StructAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
        let parsed: StructAttr = attr.parse_args()?;
        if parsed.table.is_some() {
            merged.table = parsed.table;
        }
        if parsed.relations.is_some() {
            merged.relations = parsed.relations;
        }
        if parsed.scopes.is_some() {
            merged.scopes = parsed.scopes;
        }
    }
    Ok(merged)
}

pub(crate) fn parse_field_attrs(field: &Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.skip |= parsed.skip;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
    }
    Ok(merged)
}
