//! Entity definitions: table metadata and the explicit field registry.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::Db;
use crate::error::OrmResult;
use crate::hydrate;
use crate::relation::Relations;
use crate::row::Row;
use crate::scope::Scopes;
use crate::value::{ConversionError, Value};

/// Assigns a column value to an entity field.
pub type Setter<E> = fn(&mut E, Value) -> Result<(), ConversionError>;

/// Reads an entity field as a bind value.
pub type Getter<E> = fn(&E) -> Value;

/// A table-backed type the builder can hydrate.
///
/// Usually generated with `#[derive(Entity)]`:
///
/// ```ignore
/// #[derive(Debug, Default, Serialize, Deserialize, Entity)]
/// #[orm(table = "users", relations = user_relations)]
/// struct User {
///     #[orm(id)]
///     id: i64,
///     name: String,
///     #[orm(relation)]
///     articles: Vec<Article>,
/// }
/// ```
pub trait Entity: Default + Serialize + DeserializeOwned + 'static {
    fn table() -> &'static str;

    fn primary_key() -> &'static str {
        "id"
    }

    /// Column to field mapping used by hydration and persistence.
    fn fields() -> Fields<Self>;

    fn relations() -> Relations<Self> {
        Relations::new()
    }

    /// Named refinements applied with [`Builder::scope`](crate::Builder::scope).
    fn scopes() -> Scopes<Self> {
        Scopes::new()
    }
}

/// One registered column.
pub struct Field<E> {
    column: &'static str,
    set: Setter<E>,
    get: Getter<E>,
}

impl<E> Field<E> {
    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn set(&self, entity: &mut E, value: Value) -> Result<(), ConversionError> {
        (self.set)(entity, value)
    }

    pub fn get(&self, entity: &E) -> Value {
        (self.get)(entity)
    }
}

/// Ordered column registry for an entity type.
pub struct Fields<E> {
    fields: Vec<Field<E>>,
}

impl<E> Default for Fields<E> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<E> Fields<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `column` with its setter and getter.
    pub fn field(mut self, column: &'static str, set: Setter<E>, get: Getter<E>) -> Self {
        self.fields.push(Field { column, set, get });
        self
    }

    pub fn get(&self, column: &str) -> Option<&Field<E>> {
        self.fields.iter().find(|f| f.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<E>> {
        self.fields.iter()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.column).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every column except `skip`, read from `entity`.
    pub(crate) fn values_except(&self, entity: &E, skip: &str) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .filter(|f| f.column != skip)
            .map(|f| (f.column.to_string(), f.get(entity)))
            .collect()
    }
}

/// Anything a builder can return: untyped [`Row`]s or hydrated entities.
pub trait Record: Serialize + DeserializeOwned + Sized + 'static {
    /// Column `first`/`last` order by.
    fn key_column() -> &'static str;

    /// Turn raw rows into records, eager-loading `with` when supported.
    fn hydrate(db: &Db, rows: Vec<Row>, with: &[String]) -> OrmResult<Vec<Self>>;
}

impl Record for Row {
    fn key_column() -> &'static str {
        "id"
    }

    fn hydrate(_db: &Db, rows: Vec<Row>, _with: &[String]) -> OrmResult<Vec<Self>> {
        Ok(rows)
    }
}

impl<E: Entity> Record for E {
    fn key_column() -> &'static str {
        E::primary_key()
    }

    fn hydrate(db: &Db, rows: Vec<Row>, with: &[String]) -> OrmResult<Vec<Self>> {
        hydrate::hydrate_all(db, rows, with)
    }
}
