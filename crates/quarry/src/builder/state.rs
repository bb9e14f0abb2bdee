//! Accumulated clause state and SQL assembly.

use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// The statement form a builder will emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// How a condition joins the conditions before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connector {
    And,
    Or,
    AndNot,
}

#[derive(Debug, Clone)]
pub(crate) struct Condition {
    connector: Connector,
    sql: String,
}

/// An error recorded while chaining and reported when the statement is built.
#[derive(Debug, Clone)]
pub(crate) enum Deferred {
    Query(String),
    InvalidParameter(String),
    ModelResolution(String),
    ScopeNotFound { entity: String, scope: String },
}

impl From<Deferred> for OrmError {
    fn from(err: Deferred) -> Self {
        match err {
            Deferred::Query(msg) => OrmError::Query(msg),
            Deferred::InvalidParameter(msg) => OrmError::InvalidParameter(msg),
            Deferred::ModelResolution(msg) => OrmError::ModelResolution(msg),
            Deferred::ScopeNotFound { entity, scope } => OrmError::scope_not_found(entity, scope),
        }
    }
}

const OPERATORS: &[&str] = &[
    "=", "!=", "<>", "<", "<=", ">", ">=", "LIKE", "NOT LIKE", "GLOB", "IS", "IS NOT",
];

pub(crate) fn check_operator(op: &str) -> Result<String, Deferred> {
    let normalized = op.trim().to_ascii_uppercase();
    if OPERATORS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(Deferred::InvalidParameter(format!(
            "unsupported comparison operator `{op}`"
        )))
    }
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[derive(Debug, Clone, Default)]
pub(crate) struct QueryState {
    pub table: Option<String>,
    pub alias: Option<String>,
    pub extra_tables: Vec<String>,
    pub distinct: bool,
    pub columns: Vec<String>,
    pub joins: Vec<String>,
    pub wheres: Vec<Condition>,
    pub where_binds: Vec<Value>,
    pub group_by: Vec<String>,
    pub havings: Vec<Condition>,
    pub having_binds: Vec<Value>,
    pub order: Vec<String>,
    pub limit: Option<(u64, u64)>,
    pub kind: Option<StatementKind>,
    pub insert_columns: Vec<String>,
    pub insert_binds: Vec<Value>,
    pub sets: Vec<String>,
    pub set_binds: Vec<Value>,
    pub error: Option<Deferred>,
}

impl QueryState {
    /// Keep the first error; later ones are usually consequences of it.
    pub fn fail(&mut self, err: Deferred) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Fix the statement kind, rejecting a second, different mutating verb.
    pub fn set_kind(&mut self, kind: StatementKind) {
        match self.kind {
            None => self.kind = Some(kind),
            Some(existing) if existing == kind => {}
            Some(existing) => self.fail(Deferred::Query(format!(
                "builder already holds a {} statement; cannot switch to {}",
                existing.as_str(),
                kind.as_str()
            ))),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind.unwrap_or(StatementKind::Select)
    }

    pub fn push_where(&mut self, connector: Connector, sql: String, binds: Vec<Value>) {
        self.wheres.push(Condition { connector, sql });
        self.where_binds.extend(binds);
    }

    pub fn push_having(&mut self, connector: Connector, sql: String, binds: Vec<Value>) {
        self.havings.push(Condition { connector, sql });
        self.having_binds.extend(binds);
    }

    fn table(&self) -> OrmResult<&str> {
        self.table
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| OrmError::query("no table selected; call from() or into() first"))
    }

    fn check(&self) -> OrmResult<()> {
        match &self.error {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    /// Assemble the statement and its positional binds.
    pub fn render(&self, conn: &dyn Connection) -> OrmResult<(String, Vec<Value>)> {
        self.check()?;
        match self.kind() {
            StatementKind::Select => self.render_select(conn),
            StatementKind::Insert => self.render_insert(),
            StatementKind::Update => self.render_update(),
            StatementKind::Delete => self.render_delete(),
        }
    }

    fn write_from(&self, sql: &mut String) -> OrmResult<()> {
        sql.push_str(" FROM ");
        sql.push_str(self.table()?);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        for table in &self.extra_tables {
            sql.push_str(", ");
            sql.push_str(table);
        }
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        Ok(())
    }

    fn write_where(&self, sql: &mut String) {
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            write_conditions(sql, &self.wheres);
        }
    }

    fn write_grouping(&self, sql: &mut String) {
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            write_conditions(sql, &self.havings);
        }
    }

    fn filter_binds(&self) -> Vec<Value> {
        let mut binds = Vec::with_capacity(self.where_binds.len() + self.having_binds.len());
        binds.extend(self.where_binds.iter().cloned());
        binds.extend(self.having_binds.iter().cloned());
        binds
    }

    fn render_select(&self, conn: &dyn Connection) -> OrmResult<(String, Vec<Value>)> {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        self.write_from(&mut sql)?;
        self.write_where(&mut sql);
        self.write_grouping(&mut sql);
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        if let Some((count, offset)) = self.limit {
            sql.push_str(&conn.limit_clause(count, offset));
        }
        Ok((sql, self.filter_binds()))
    }

    /// `SELECT count(*) AS total` over the same filters, without order or limit.
    ///
    /// Grouped or distinct queries are counted through a derived table so the
    /// total is the number of result rows.
    pub fn render_count(&self) -> OrmResult<(String, Vec<Value>)> {
        self.check()?;
        if self.kind() != StatementKind::Select {
            return Err(OrmError::query(format!(
                "count() needs a SELECT, builder holds {}",
                self.kind().as_str()
            )));
        }

        let mut inner = String::new();
        let wrap = self.distinct || !self.group_by.is_empty();
        if wrap {
            inner.push_str("SELECT ");
            if self.distinct {
                inner.push_str("DISTINCT ");
            }
            if self.columns.is_empty() {
                inner.push('*');
            } else {
                inner.push_str(&self.columns.join(", "));
            }
        } else {
            inner.push_str("SELECT count(*) AS total");
        }
        self.write_from(&mut inner)?;
        self.write_where(&mut inner);
        self.write_grouping(&mut inner);

        let sql = if wrap {
            format!("SELECT count(*) AS total FROM ({inner}) AS counted")
        } else {
            inner
        };
        Ok((sql, self.filter_binds()))
    }

    /// Mutations render a single table and an optional WHERE; any other
    /// recorded clause would be silently dropped, so it is an error instead.
    fn reject_select_clauses(&self) -> OrmResult<()> {
        let verb = self.kind().as_str();
        let unsupported = [
            (self.alias.is_some(), "a table alias"),
            (!self.extra_tables.is_empty(), "additional FROM tables"),
            (!self.joins.is_empty(), "JOIN clauses"),
            (self.distinct, "DISTINCT"),
            (!self.columns.is_empty(), "a column list"),
            (!self.group_by.is_empty(), "GROUP BY"),
            (!self.havings.is_empty(), "HAVING conditions"),
            (!self.order.is_empty(), "ORDER BY"),
            (self.limit.is_some(), "LIMIT"),
        ];
        match unsupported.iter().find(|(present, _)| *present) {
            Some((_, clause)) => Err(OrmError::query(format!(
                "{verb} does not take {clause}"
            ))),
            None => Ok(()),
        }
    }

    fn render_insert(&self) -> OrmResult<(String, Vec<Value>)> {
        let table = self.table()?;
        if self.insert_columns.is_empty() {
            return Err(OrmError::invalid_parameter("insert data is empty"));
        }
        if !self.wheres.is_empty() {
            return Err(OrmError::query("INSERT does not take WHERE conditions"));
        }
        self.reject_select_clauses()?;
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            self.insert_columns.join(", "),
            placeholders(self.insert_binds.len())
        );
        Ok((sql, self.insert_binds.clone()))
    }

    fn render_update(&self) -> OrmResult<(String, Vec<Value>)> {
        let table = self.table()?;
        if self.sets.is_empty() {
            return Err(OrmError::invalid_parameter("update data is empty"));
        }
        self.reject_select_clauses()?;
        let mut sql = format!("UPDATE {table} SET {}", self.sets.join(", "));
        self.write_where(&mut sql);

        let mut binds = self.set_binds.clone();
        binds.extend(self.where_binds.iter().cloned());
        Ok((sql, binds))
    }

    fn render_delete(&self) -> OrmResult<(String, Vec<Value>)> {
        let table = self.table()?;
        self.reject_select_clauses()?;
        let mut sql = format!("DELETE FROM {table}");
        self.write_where(&mut sql);
        Ok((sql, self.where_binds.clone()))
    }
}

fn write_conditions(sql: &mut String, conditions: &[Condition]) {
    for (i, cond) in conditions.iter().enumerate() {
        match (i, cond.connector) {
            (0, Connector::AndNot) => sql.push_str("NOT "),
            (0, _) => {}
            (_, Connector::And) => sql.push_str(" AND "),
            (_, Connector::Or) => sql.push_str(" OR "),
            (_, Connector::AndNot) => sql.push_str(" AND NOT "),
        }
        sql.push_str(&cond.sql);
    }
}
