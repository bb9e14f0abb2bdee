//! Fluent SQL query builder.
//!
//! A builder accumulates clause fragments and their bind values in call order
//! and renders one of four statement forms:
//!
//! ```text
//! SELECT cols FROM table [AS alias][, extra][joins] [WHERE ..] [GROUP BY ..] [HAVING ..] [ORDER BY ..] [LIMIT ..]
//! INSERT INTO table (c1, c2) VALUES (?, ?)
//! UPDATE table SET a = ?, b = ? [WHERE ..]
//! DELETE FROM table [WHERE ..]
//! ```
//!
//! Binds are emitted as insert values, then SET values, then WHERE values,
//! then HAVING values, matching the order of the `?` placeholders.
//!
//! # Usage
//!
//! ```ignore
//! use quarry::{Db, Order};
//!
//! // Untyped rows
//! let rows = db.table("users")
//!     .where_op("id", ">", 1)
//!     .order_by("id", Order::Asc)
//!     .get()?;
//!
//! // Entities with one eager query per relation
//! let users = db.query::<User>()
//!     .in_list("status", ["active", "invited"])
//!     .with(&["articles"])
//!     .get()?;
//!
//! // Mutations consume the builder
//! let id = db.table("users").insert([("name", "alice".into_value())])?;
//! db.table("users").where_("id", id).update([("name", "bob".into_value())])?;
//! ```
//!
//! Chaining never fails: invalid input (an unknown operator, a negative limit,
//! a second conflicting verb) is recorded and reported by the executing verb
//! or by [`Builder::to_sql`].

mod exec;
mod state;

#[cfg(test)]
mod tests;

use std::marker::PhantomData;

use crate::db::Db;
use crate::entity::{Entity, Record};
use crate::error::{OrmError, OrmResult};
use crate::raw::Raw;
use crate::row::Row;
use crate::value::{IntoValue, Value};

pub use state::{Order, StatementKind};
pub(crate) use state::Connector;
use state::{Deferred, QueryState, check_operator, placeholders};

/// Read-through cache request attached to a SELECT.
#[derive(Debug, Clone)]
pub(crate) struct CacheSpec {
    pub key: String,
    pub ttl_secs: u64,
}

/// A single-use statement builder bound to a [`Db`] session.
///
/// `T` is what `get()` returns: [`Row`] by default, or an [`Entity`] after
/// [`Builder::entity`].
pub struct Builder<'a, T = Row> {
    pub(crate) db: &'a Db,
    pub(crate) state: QueryState,
    pub(crate) with: Vec<String>,
    pub(crate) cache: Option<CacheSpec>,
    pub(crate) tag: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a> Builder<'a, Row> {
    pub(crate) fn new(db: &'a Db) -> Self {
        Self {
            db,
            state: QueryState::default(),
            with: Vec::new(),
            cache: None,
            tag: None,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: Record> Builder<'a, T> {
    /// Hydrate results as `E` instead of `T`.
    ///
    /// Sets the table to `E::table()` unless one was already chosen.
    pub fn entity<E: Entity>(self) -> Builder<'a, E> {
        let mut state = self.state;
        if state.table.is_none() {
            state.table = Some(E::table().to_string());
        }
        Builder {
            db: self.db,
            state,
            with: self.with,
            cache: self.cache,
            tag: self.tag,
            _marker: PhantomData,
        }
    }

    /// The session this builder executes against.
    pub fn db(&self) -> &'a Db {
        self.db
    }

    // ── Tables ──

    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.state.table = Some(table.into());
        self
    }

    /// Alias of [`Builder::from`] that reads better before `insert`.
    pub fn into(self, table: impl Into<String>) -> Self {
        self.from(table)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.state.alias = Some(alias.into());
        self
    }

    /// Add a comma-joined table to the FROM list.
    pub fn add_table(mut self, table: impl Into<String>) -> Self {
        self.state.extra_tables.push(table.into());
        self
    }

    pub fn inner_join(mut self, table: &str, on: &str) -> Self {
        self.state.joins.push(format!("INNER JOIN {table} ON {on}"));
        self
    }

    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.state.joins.push(format!("LEFT JOIN {table} ON {on}"));
        self
    }

    // ── Columns ──

    /// Replace the selected column list (defaults to `*`).
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.state.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append a literal select expression.
    pub fn select_raw(mut self, expr: Raw) -> Self {
        self.state.columns.push(expr.into_inner());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.state.distinct = true;
        self
    }

    // ── WHERE ──

    fn condition(mut self, connector: Connector, field: &str, op: &str, value: Value) -> Self {
        match check_operator(op) {
            Ok(op) => self
                .state
                .push_where(connector, format!("{field} {op} ?"), vec![value]),
            Err(err) => self.state.fail(err),
        }
        self
    }

    fn raw_condition(mut self, connector: Connector, expr: Raw) -> Self {
        self.state
            .push_where(connector, expr.into_inner(), Vec::new());
        self
    }

    /// `field = ?`
    pub fn where_(self, field: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::And, field, "=", value.into_value())
    }

    /// `field <op> ?`
    pub fn where_op(self, field: &str, op: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::And, field, op, value.into_value())
    }

    /// Literal condition, no bind.
    pub fn where_raw(self, expr: impl Into<Raw>) -> Self {
        self.raw_condition(Connector::And, expr.into())
    }

    pub fn and(self, field: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::And, field, "=", value.into_value())
    }

    pub fn and_op(self, field: &str, op: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::And, field, op, value.into_value())
    }

    pub fn and_raw(self, expr: impl Into<Raw>) -> Self {
        self.raw_condition(Connector::And, expr.into())
    }

    pub fn or(self, field: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::Or, field, "=", value.into_value())
    }

    pub fn or_op(self, field: &str, op: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::Or, field, op, value.into_value())
    }

    pub fn or_raw(self, expr: impl Into<Raw>) -> Self {
        self.raw_condition(Connector::Or, expr.into())
    }

    /// `NOT field = ?`, joined with AND when other conditions precede it.
    pub fn not(self, field: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::AndNot, field, "=", value.into_value())
    }

    pub fn not_op(self, field: &str, op: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::AndNot, field, op, value.into_value())
    }

    pub fn not_raw(self, expr: impl Into<Raw>) -> Self {
        self.raw_condition(Connector::AndNot, expr.into())
    }

    pub fn and_not(self, field: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::AndNot, field, "=", value.into_value())
    }

    pub fn and_not_op(self, field: &str, op: &str, value: impl IntoValue) -> Self {
        self.condition(Connector::AndNot, field, op, value.into_value())
    }

    // ── IN / BETWEEN ──

    fn membership<I, V>(mut self, connector: Connector, field: &str, negated: bool, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        let values: Vec<Value> = values.into_iter().map(IntoValue::into_value).collect();
        let sql = match (values.is_empty(), negated) {
            // An empty list matches nothing, and excludes nothing.
            (true, false) => "1 = 0".to_string(),
            (true, true) => "1 = 1".to_string(),
            (false, false) => format!("{field} IN ({})", placeholders(values.len())),
            (false, true) => format!("{field} NOT IN ({})", placeholders(values.len())),
        };
        self.state.push_where(connector, sql, values);
        self
    }

    /// `field IN (?, ?, ..)`; an empty list renders `1 = 0`.
    pub fn in_list<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.membership(Connector::And, field, false, values)
    }

    /// `field NOT IN (?, ?, ..)`; an empty list renders `1 = 1`.
    pub fn not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.membership(Connector::And, field, true, values)
    }

    pub fn and_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.membership(Connector::And, field, false, values)
    }

    pub fn and_not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.membership(Connector::And, field, true, values)
    }

    pub fn or_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.membership(Connector::Or, field, false, values)
    }

    /// `field BETWEEN ? AND ?`
    pub fn between(mut self, field: &str, low: impl IntoValue, high: impl IntoValue) -> Self {
        self.state.push_where(
            Connector::And,
            format!("{field} BETWEEN ? AND ?"),
            vec![low.into_value(), high.into_value()],
        );
        self
    }

    /// `field NOT BETWEEN ? AND ?`
    pub fn not_between(mut self, field: &str, low: impl IntoValue, high: impl IntoValue) -> Self {
        self.state.push_where(
            Connector::And,
            format!("{field} NOT BETWEEN ? AND ?"),
            vec![low.into_value(), high.into_value()],
        );
        self
    }

    // ── GROUP BY / HAVING ──

    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.state
            .group_by
            .extend(fields.iter().map(|f| f.to_string()));
        self
    }

    fn having_condition(mut self, connector: Connector, column: &str, op: &str, value: Value) -> Self {
        match check_operator(op) {
            Ok(op) => self
                .state
                .push_having(connector, format!("{column} {op} ?"), vec![value]),
            Err(err) => self.state.fail(err),
        }
        self
    }

    /// `HAVING column = ?`
    pub fn having(self, column: &str, value: impl IntoValue) -> Self {
        self.having_condition(Connector::And, column, "=", value.into_value())
    }

    pub fn having_op(self, column: &str, op: &str, value: impl IntoValue) -> Self {
        self.having_condition(Connector::And, column, op, value.into_value())
    }

    pub fn or_having(self, column: &str, value: impl IntoValue) -> Self {
        self.having_condition(Connector::Or, column, "=", value.into_value())
    }

    pub fn or_having_op(self, column: &str, op: &str, value: impl IntoValue) -> Self {
        self.having_condition(Connector::Or, column, op, value.into_value())
    }

    pub fn having_raw(mut self, expr: impl Into<Raw>) -> Self {
        self.state
            .push_having(Connector::And, expr.into().into_inner(), Vec::new());
        self
    }

    pub fn or_having_raw(mut self, expr: impl Into<Raw>) -> Self {
        self.state
            .push_having(Connector::Or, expr.into().into_inner(), Vec::new());
        self
    }

    // ── ORDER / LIMIT ──

    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.state
            .order
            .push(format!("{field} {}", order.as_sql()));
        self
    }

    pub fn order_by_raw(mut self, expr: impl Into<Raw>) -> Self {
        self.state.order.push(expr.into().into_inner());
        self
    }

    /// Limit to `count` rows after skipping `offset`; `count == 0` means no limit.
    ///
    /// Negative arguments are reported as `InvalidParameter`.
    pub fn limit(mut self, count: i64, offset: i64) -> Self {
        match (u64::try_from(count), u64::try_from(offset)) {
            (Ok(count), Ok(offset)) => self.state.limit = Some((count, offset)),
            _ => self.state.fail(Deferred::InvalidParameter(format!(
                "limit and offset must be non-negative (got {count}, {offset})"
            ))),
        }
        self
    }

    // ── Execution options ──

    /// Serve `get()` from the session cache for `ttl_secs` seconds.
    pub fn cache(mut self, key: impl Into<String>, ttl_secs: u64) -> Self {
        self.cache = Some(CacheSpec {
            key: key.into(),
            ttl_secs,
        });
        self
    }

    /// Label passed to query hooks in [`QueryContext::tag`](crate::monitor::QueryContext).
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    // ── Inspection ──

    /// The statement this builder would run.
    pub fn to_sql(&self) -> OrmResult<String> {
        self.state.render(self.db.connection()).map(|(sql, _)| sql)
    }

    /// Positional binds in placeholder order.
    pub fn bind_values(&self) -> OrmResult<Vec<Value>> {
        self.state
            .render(self.db.connection())
            .map(|(_, binds)| binds)
    }

    pub fn statement_kind(&self) -> StatementKind {
        self.state.kind()
    }
}

impl<'a, E: Entity> Builder<'a, E> {
    /// Eager-load the named relations, one extra query per relation.
    ///
    /// Repeated names are loaded once.
    pub fn with(mut self, relations: &[&str]) -> Self {
        for name in relations {
            if !self.with.iter().any(|w| w == name) {
                self.with.push(name.to_string());
            }
        }
        self
    }

    /// Apply the scope `name` declared in [`Entity::scopes`].
    ///
    /// An unknown name, or an entity missing from the session, fails when
    /// the statement is built.
    pub fn scope(mut self, name: &str) -> Self {
        let found = match self.db.registry().meta::<E>() {
            Ok(meta) => meta.scopes.get(name),
            Err(OrmError::ModelResolution(msg)) => {
                self.state.fail(Deferred::ModelResolution(msg));
                return self;
            }
            Err(other) => {
                self.state.fail(Deferred::Query(other.to_string()));
                return self;
            }
        };
        match found {
            Some(apply) => apply(self),
            None => {
                self.state.fail(Deferred::ScopeNotFound {
                    entity: E::table().to_string(),
                    scope: name.to_string(),
                });
                self
            }
        }
    }
}
