//! Shared fixtures for unit tests: a scripted connection and a small schema.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::builder::Order;
use crate::connection::{Connection, DriverError};
use crate::dialect::Dialect;
use crate::entity::{Entity, Fields};
use crate::relation::{BelongsTo, Relations};
use crate::row::Row;
use crate::scope::Scopes;
use crate::value::{FromValue, IntoValue, Value};

#[derive(Default)]
struct Script {
    log: RefCell<Vec<(String, Vec<Value>)>>,
    responses: RefCell<VecDeque<Vec<Row>>>,
    failure: RefCell<Option<String>>,
    dialect: Cell<Dialect>,
}

/// Records every statement and answers queries from a queue of canned results.
#[derive(Clone, Default)]
pub(crate) struct MockConnection {
    script: Rc<Script>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mysql() -> Self {
        let conn = Self::default();
        conn.script.dialect.set(Dialect::MySql);
        conn
    }

    /// Queue the rows returned by the next `query`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.script.responses.borrow_mut().push_back(rows);
    }

    /// Make the next statement fail with `message`.
    pub fn fail_next(&self, message: &str) {
        *self.script.failure.borrow_mut() = Some(message.to_string());
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.script.log.borrow().clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.statements().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, sql: &str, params: &[Value]) -> Result<(), DriverError> {
        self.script
            .log
            .borrow_mut()
            .push((sql.to_string(), params.to_vec()));
        match self.script.failure.borrow_mut().take() {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.script.dialect.get()
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        self.record(sql, params)?;
        Ok(self
            .script
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_default())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        self.record(sql, params)?;
        Ok(1)
    }

    fn last_insert_id(&self) -> Result<i64, DriverError> {
        Ok(42)
    }

    fn begin(&self) -> Result<(), DriverError> {
        self.record("BEGIN", &[])
    }

    fn commit(&self) -> Result<(), DriverError> {
        self.record("COMMIT", &[])
    }

    fn rollback(&self) -> Result<(), DriverError> {
        self.record("ROLLBACK", &[])
    }
}

/// Build a row from `(column, value)` pairs.
pub(crate) fn row<const N: usize>(pairs: [(&str, Value); N]) -> Row {
    Row::from_pairs(pairs)
}

pub(crate) fn int(i: i64) -> Value {
    Value::Integer(i)
}

pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct User {
    pub id: i64,
    pub name: String,
    pub articles: Vec<Article>,
    pub roles: Vec<Role>,
    pub profile: Option<Profile>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Article {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub author: Option<User>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: String,
}

impl Entity for User {
    fn table() -> &'static str {
        "users"
    }

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .field(
                "id",
                |u, v| {
                    u.id = i64::from_value(v)?;
                    Ok(())
                },
                |u| u.id.into_value(),
            )
            .field(
                "name",
                |u, v| {
                    u.name = String::from_value(v)?;
                    Ok(())
                },
                |u| u.name.clone().into_value(),
            )
    }

    fn relations() -> Relations<Self> {
        Relations::<Self>::new()
            .has_many::<Article>("articles", |u, v| u.articles = v)
            .has_one::<Profile>("profile", |u, p| u.profile = p)
            .belongs_to_many::<Role>("roles", "role_user", |u, v| u.roles = v)
    }

    fn scopes() -> Scopes<Self> {
        Scopes::new()
            .scope("named", |q| q.where_op("name", "!=", ""))
            .scope("newest", |q| q.order_by("id", Order::Desc))
    }
}

impl Entity for Article {
    fn table() -> &'static str {
        "articles"
    }

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .field(
                "id",
                |a, v| {
                    a.id = i64::from_value(v)?;
                    Ok(())
                },
                |a| a.id.into_value(),
            )
            .field(
                "user_id",
                |a, v| {
                    a.user_id = Option::<i64>::from_value(v)?;
                    Ok(())
                },
                |a| a.user_id.into_value(),
            )
            .field(
                "title",
                |a, v| {
                    a.title = String::from_value(v)?;
                    Ok(())
                },
                |a| a.title.clone().into_value(),
            )
    }

    fn relations() -> Relations<Self> {
        Relations::new().relation(BelongsTo::<Article, User>::new("author", |a, u| a.author = u))
    }
}

impl Entity for Role {
    fn table() -> &'static str {
        "roles"
    }

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .field(
                "id",
                |r, v| {
                    r.id = i64::from_value(v)?;
                    Ok(())
                },
                |r| r.id.into_value(),
            )
            .field(
                "name",
                |r, v| {
                    r.name = String::from_value(v)?;
                    Ok(())
                },
                |r| r.name.clone().into_value(),
            )
    }
}

impl Entity for Profile {
    fn table() -> &'static str {
        "profiles"
    }

    fn fields() -> Fields<Self> {
        Fields::<Self>::new()
            .field(
                "id",
                |p, v| {
                    p.id = i64::from_value(v)?;
                    Ok(())
                },
                |p| p.id.into_value(),
            )
            .field(
                "user_id",
                |p, v| {
                    p.user_id = i64::from_value(v)?;
                    Ok(())
                },
                |p| p.user_id.into_value(),
            )
            .field(
                "bio",
                |p, v| {
                    p.bio = String::from_value(v)?;
                    Ok(())
                },
                |p| p.bio.clone().into_value(),
            )
    }
}

/// A session over `conn` with the fixture entities registered.
pub(crate) fn db_with(conn: &MockConnection) -> crate::Db {
    let mut db = crate::Db::new(conn.clone());
    db.register::<User>()
        .register::<Article>()
        .register::<Role>()
        .register::<Profile>();
    db
}
