//! # quarry
//!
//! A fluent SQL query builder with an entity hydrator that loads relations
//! lazily (one query per parent) or eagerly (one query per relation).
//!
//! ## Features
//!
//! - **Positional binds**: every value is bound as `?`, in the order the
//!   placeholders appear
//! - **Four statement forms**: SELECT, INSERT, UPDATE and DELETE from the same builder
//! - **Explicit mapping**: columns reach entity fields through a registered
//!   setter, generated by `#[derive(Entity)]` or written by hand
//! - **Relations**: has-one, has-many, belongs-to and belongs-to-many, resolved
//!   per entity or per batch with the same result
//! - **Read-through cache**: opt-in per query, keyed by a blake3 digest
//! - **Query monitoring**: `tracing` logging and counting hooks around every statement
//!
//! ## Example
//!
//! ```ignore
//! use quarry::{Db, Entity, Order, SqliteConnection};
//!
//! let mut db = Db::new(SqliteConnection::open("app.db")?);
//! db.register::<User>().register::<Article>();
//!
//! // Untyped rows
//! let rows = db.table("users").where_op("id", ">", 1).order_by("id", Order::Asc).get()?;
//!
//! // Entities, articles eager-loaded in one extra query
//! let users = db.query::<User>().with(&["articles"]).get()?;
//!
//! // Lazy, one parent at a time
//! let mut user = db.find_or_fail::<User>(1)?;
//! db.load(&mut user, "articles")?;
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod connection;
pub mod db;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod inflect;
pub mod monitor;
pub mod pagination;
pub mod raw;
pub mod registry;
pub mod relation;
pub mod row;
pub mod scope;
pub mod value;

mod hydrate;
mod model;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{Builder, Order, StatementKind};
pub use cache::{CacheStore, MemoryStore};
pub use config::{ColumnPolicy, DbConfig, RelationPolicy};
pub use connection::{Connection, DriverError};
pub use db::Db;
pub use dialect::Dialect;
pub use entity::{Entity, Field, Fields, Getter, Record, Setter};
pub use error::{OrmError, OrmResult};
pub use hooks::Hooks;
pub use model::Criterion;
pub use monitor::{QueryCounter, QueryHook, TracingSqlHook};
pub use pagination::{LinkStyle, Paginator};
pub use raw::{Raw, raw};
pub use registry::{EntityMeta, Registry};
pub use relation::{
    Batch, BelongsTo, BelongsToMany, EagerQuery, HasMany, HasOne, Pivot, RelationDescriptor,
    RelationKind, Relations, Resolver,
};
pub use row::Row;
pub use scope::{ScopeFn, Scopes};
pub use value::{ConversionError, FromValue, IntoValue, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

#[cfg(feature = "derive")]
pub use quarry_derive::Entity;
