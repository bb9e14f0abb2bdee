//! Derive macros for quarry
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;
mod sql_ident;

/// Derive `quarry::Entity` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use quarry::Entity;
///
/// #[derive(Debug, Default, Serialize, Deserialize, Entity)]
/// #[orm(table = "users", relations = user_relations)]
/// struct User {
///     #[orm(id)]
///     id: i64,
///     #[orm(column = "user_name")]
///     name: String,
///     #[orm(relation)]
///     articles: Vec<Article>,
/// }
/// ```
///
/// # Generated
///
/// - `table()` - the table name, defaulting to the snake-cased struct name plus `s`
/// - `primary_key()` - the column of the `#[orm(id)]` field, or `id`
/// - `fields()` - one setter and getter per mapped field, converting through
///   `FromValue`/`IntoValue`
/// - `relations()` - delegates to the `relations = path` function when given
/// - `scopes()` - delegates to the `scopes = path` function when given
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Specify the table name
/// - `#[orm(relations = path)]` - Function returning `Relations<Self>`
/// - `#[orm(scopes = path)]` - Function returning `Scopes<Self>`
/// - `#[orm(id)]` - Mark field as primary key
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(relation)]` / `#[orm(skip)]` - Leave the field out of the column mapping
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
