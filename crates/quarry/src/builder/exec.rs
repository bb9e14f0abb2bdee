//! Executing verbs. Every verb here consumes the builder.

use super::state::StatementKind;
use super::{Builder, Order};
use crate::cache;
use crate::entity::Record;
use crate::error::{OrmError, OrmResult};
use crate::pagination::{LinkStyle, Paginator};
use crate::row::Row;
use crate::value::Value;

impl<'a, T: Record> Builder<'a, T> {
    // ── Staging ──

    /// Stage `INSERT INTO table (cols) VALUES (..)` without running it.
    pub fn values<I, K>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.state.set_kind(StatementKind::Insert);
        for (column, value) in data {
            self.state.insert_columns.push(column.into());
            self.state.insert_binds.push(value);
        }
        self
    }

    /// Stage `UPDATE table SET col = ?, ..` without running it.
    pub fn set<I, K>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.state.set_kind(StatementKind::Update);
        for (column, value) in data {
            self.state.sets.push(format!("{} = ?", column.into()));
            self.state.set_binds.push(value);
        }
        self
    }

    /// Stage `SET field = field + ?`.
    pub fn set_increment(mut self, field: &str, by: i64) -> Self {
        self.state.set_kind(StatementKind::Update);
        self.state.sets.push(format!("{field} = {field} + ?"));
        self.state.set_binds.push(Value::Integer(by));
        self
    }

    /// Stage `SET field = field - ?`.
    pub fn set_decrement(mut self, field: &str, by: i64) -> Self {
        self.state.set_kind(StatementKind::Update);
        self.state.sets.push(format!("{field} = {field} - ?"));
        self.state.set_binds.push(Value::Integer(by));
        self
    }

    /// Stage `DELETE FROM table [WHERE ..]` without running it.
    pub fn mark_delete(mut self) -> Self {
        self.state.set_kind(StatementKind::Delete);
        self
    }

    // ── Mutations ──

    /// Run the staged INSERT/UPDATE/DELETE and return the affected row count.
    pub fn execute(self) -> OrmResult<u64> {
        if self.state.kind() == StatementKind::Select {
            return Err(OrmError::query(
                "execute() needs a staged INSERT, UPDATE or DELETE; use get() for SELECT",
            ));
        }
        let (sql, binds) = self.state.render(self.db.connection())?;
        self.db.run_execute(&sql, &binds, self.tag.as_deref())
    }

    /// Insert one row and return the generated id.
    pub fn insert<I, K>(self, data: I) -> OrmResult<i64>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let db = self.db;
        self.values(data).execute()?;
        db.last_insert_id()
    }

    /// Update the matching rows and return how many changed.
    pub fn update<I, K>(self, data: I) -> OrmResult<u64>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.set(data).execute()
    }

    /// Delete the matching rows and return how many were removed.
    pub fn delete(self) -> OrmResult<u64> {
        self.mark_delete().execute()
    }

    pub fn increment(self, field: &str, by: i64) -> OrmResult<u64> {
        self.set_increment(field, by).execute()
    }

    pub fn decrement(self, field: &str, by: i64) -> OrmResult<u64> {
        self.set_decrement(field, by).execute()
    }

    // ── Reads ──

    /// Run the SELECT and hydrate every row, eager-loading requested relations.
    pub fn get(self) -> OrmResult<Vec<T>> {
        let Builder {
            db,
            state,
            with,
            cache,
            tag,
            ..
        } = self;

        if state.kind() != StatementKind::Select {
            return Err(OrmError::query(format!(
                "get() needs a SELECT, builder holds a staged {}",
                state.kind().as_str()
            )));
        }
        let (sql, binds) = state.render(db.connection())?;

        let fetch = || -> OrmResult<Vec<T>> {
            let rows = db.run_query(&sql, &binds, tag.as_deref())?;
            T::hydrate(db, rows, &with)
        };

        match cache {
            None => fetch(),
            Some(spec) => {
                let store = db.cache_store().ok_or_else(|| {
                    OrmError::cache("cache() requested but the session has no cache store")
                })?;
                let path = cache::cache_path(&spec.key, &db.config().cache_suffix);
                cache::read_through(store, &path, spec.ttl_secs, fetch)
            }
        }
    }

    /// The first row, if any.
    pub fn one(self) -> OrmResult<Option<T>> {
        Ok(self.limit(1, 0).get()?.into_iter().next())
    }

    /// The first `n` records by key column, ascending.
    pub fn first(self, n: i64) -> OrmResult<Vec<T>> {
        self.order_by(T::key_column(), Order::Asc).limit(n, 0).get()
    }

    /// The last `n` records by key column, newest first.
    pub fn last(self, n: i64) -> OrmResult<Vec<T>> {
        self.order_by(T::key_column(), Order::Desc)
            .limit(n, 0)
            .get()
    }

    /// `SELECT count(*) AS total` over the current filters.
    pub fn count(self) -> OrmResult<i64> {
        let (sql, binds) = self.state.render_count()?;
        let rows = self.db.run_query(&sql, &binds, self.tag.as_deref())?;
        match rows.first() {
            Some(row) => row.get_as::<i64>("total"),
            None => Ok(0),
        }
    }

    /// `(key, field)` pairs keyed by [`Record::key_column`], in result order.
    pub fn lists(self, field: &str) -> OrmResult<Vec<(Value, Value)>> {
        self.lists_with_key(field, T::key_column())
    }

    /// `(key, value)` pairs of two columns, in result order.
    pub fn lists_with_key(self, field: &str, key_field: &str) -> OrmResult<Vec<(Value, Value)>> {
        let rows = self.select(&[key_field, field]).raw_rows()?;
        rows.into_iter()
            .map(|row| {
                let key = row.get(key_field).cloned().ok_or_else(|| {
                    OrmError::hydration(key_field, "column missing from result")
                })?;
                let value = row
                    .get(field)
                    .cloned()
                    .ok_or_else(|| OrmError::hydration(field, "column missing from result"))?;
                Ok((key, value))
            })
            .collect()
    }

    /// Values of one column, in result order.
    pub fn pluck(self, field: &str) -> OrmResult<Vec<Value>> {
        let rows = self.select(&[field]).raw_rows()?;
        Ok(rows
            .into_iter()
            .map(|mut row| row.take(field).unwrap_or_default())
            .collect())
    }

    /// Run `get()` once and wrap the result for page-by-page access.
    pub fn paginate(self, per_page: i64, style: LinkStyle) -> OrmResult<Paginator<T>> {
        if per_page <= 0 {
            return Err(OrmError::invalid_parameter(format!(
                "per_page must be positive (got {per_page})"
            )));
        }
        let items = self.get()?;
        Ok(Paginator::new(items, per_page as usize, style))
    }

    /// [`Builder::paginate`] with the session's default page size.
    pub fn paginate_default(self, style: LinkStyle) -> OrmResult<Paginator<T>> {
        let per_page = self.db.config().default_per_page;
        self.paginate(per_page, style)
    }

    /// Run the SELECT without hydration.
    fn raw_rows(self) -> OrmResult<Vec<Row>> {
        if self.state.kind() != StatementKind::Select {
            return Err(OrmError::query("expected a SELECT"));
        }
        let (sql, binds) = self.state.render(self.db.connection())?;
        self.db.run_query(&sql, &binds, self.tag.as_deref())
    }
}
