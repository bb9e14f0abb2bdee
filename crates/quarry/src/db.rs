//! The `Db` session: connection, entity registry, cache and hooks.

use std::sync::Arc;
use std::time::Instant;

use crate::builder::Builder;
use crate::cache::CacheStore;
use crate::config::DbConfig;
use crate::connection::{Connection, DriverError};
use crate::dialect::Dialect;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::hooks::Hooks;
use crate::monitor::{HookAction, QueryContext, QueryHook, QueryResult};
use crate::registry::Registry;
use crate::row::Row;
use crate::value::Value;

/// A database session.
///
/// Owns one connection; builders borrow the session, so a session is used
/// from one thread at a time and statements run strictly in call order.
///
/// ```ignore
/// let mut db = Db::new(SqliteConnection::open_in_memory()?)
///     .with_cache(MemoryStore::new())
///     .with_hook(TracingSqlHook::new());
/// db.register::<User>().register::<Article>();
///
/// let users = db.query::<User>().with(&["articles"]).get()?;
/// ```
pub struct Db {
    conn: Box<dyn Connection>,
    registry: Registry,
    cache: Option<Box<dyn CacheStore>>,
    config: DbConfig,
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl Db {
    pub fn new(conn: impl Connection + 'static) -> Self {
        Self {
            conn: Box::new(conn),
            registry: Registry::new(),
            cache: None,
            config: DbConfig::default(),
            hooks: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: DbConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable `.cache(key, ttl)` on this session's builders.
    pub fn with_cache(mut self, store: impl CacheStore + 'static) -> Self {
        self.cache = Some(Box::new(store));
        self
    }

    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Add a hook the caller keeps a handle to (e.g. a [`QueryCounter`](crate::monitor::QueryCounter)).
    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Register `E` so its rows can be hydrated and its relations resolved.
    pub fn register<E: Entity>(&mut self) -> &mut Self {
        self.registry.register::<E>();
        self
    }

    /// Install lifecycle hooks for `E`, registering it if needed.
    pub fn observe<E: Entity>(&mut self, hooks: Hooks<E>) -> &mut Self {
        self.registry.observe(hooks);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn connection(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    pub fn dialect(&self) -> Dialect {
        self.conn.dialect()
    }

    pub(crate) fn cache_store(&self) -> Option<&dyn CacheStore> {
        self.cache.as_deref()
    }

    // ── Builders ──

    /// Untyped builder over `table`.
    pub fn table(&self, table: impl Into<String>) -> Builder<'_, Row> {
        Builder::new(self).from(table)
    }

    /// Builder with no table chosen yet; call `from` or `into`.
    pub fn builder(&self) -> Builder<'_, Row> {
        Builder::new(self)
    }

    /// Builder over `E::table()` hydrating `E`.
    pub fn query<E: Entity>(&self) -> Builder<'_, E> {
        Builder::new(self).entity::<E>()
    }

    // ── Raw SQL ──

    /// Run `sql` with positional `?` binds and return the rows.
    pub fn raw_query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.run_query(sql, params, Some("raw"))
    }

    /// Run `sql` with positional `?` binds and return the affected row count.
    pub fn raw_execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.run_execute(sql, params, Some("raw"))
    }

    // ── Transactions ──

    pub fn begin(&self) -> OrmResult<()> {
        self.conn.begin().map_err(connection_error)
    }

    pub fn commit(&self) -> OrmResult<()> {
        self.conn.commit().map_err(connection_error)
    }

    pub fn rollback(&self) -> OrmResult<()> {
        self.conn.rollback().map_err(connection_error)
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// The closure's error is returned even if the rollback itself fails.
    pub fn transaction<R>(&self, f: impl FnOnce(&Db) -> OrmResult<R>) -> OrmResult<R> {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    // ── Execution ──

    pub(crate) fn last_insert_id(&self) -> OrmResult<i64> {
        self.conn.last_insert_id().map_err(connection_error)
    }

    pub(crate) fn run_query(&self, sql: &str, params: &[Value], tag: Option<&str>) -> OrmResult<Vec<Row>> {
        self.instrumented(sql, params, tag, |conn| conn.query(sql, params), |rows| {
            QueryResult::Rows(rows.len())
        })
    }

    pub(crate) fn run_execute(&self, sql: &str, params: &[Value], tag: Option<&str>) -> OrmResult<u64> {
        self.instrumented(sql, params, tag, |conn| conn.execute(sql, params), |n| {
            QueryResult::Affected(*n)
        })
    }

    /// Run one statement through the registered hooks.
    fn instrumented<R>(
        &self,
        sql: &str,
        params: &[Value],
        tag: Option<&str>,
        run: impl FnOnce(&dyn Connection) -> Result<R, DriverError>,
        outcome: impl FnOnce(&R) -> QueryResult,
    ) -> OrmResult<R> {
        let mut ctx = QueryContext::new(sql, params.len());
        if let Some(tag) = tag {
            ctx = ctx.with_tag(tag);
        }

        for hook in &self.hooks {
            if let HookAction::Abort(reason) = hook.before_query(&ctx) {
                return Err(OrmError::query(format!("statement aborted by hook: {reason}")));
            }
        }

        let start = Instant::now();
        let result = run(self.conn.as_ref());
        let elapsed = start.elapsed();

        match result {
            Ok(value) => {
                let report = outcome(&value);
                for hook in &self.hooks {
                    hook.after_query(&ctx, elapsed, &report);
                }
                Ok(value)
            }
            Err(source) => {
                let report = QueryResult::error(source.to_string());
                for hook in &self.hooks {
                    hook.after_query(&ctx, elapsed, &report);
                }
                Err(OrmError::Execution {
                    sql: sql.to_string(),
                    params: params.to_vec(),
                    source,
                })
            }
        }
    }
}

fn connection_error(err: DriverError) -> OrmError {
    OrmError::Connection(err.to_string())
}

#[cfg(feature = "sqlite")]
impl Db {
    /// Session over a fresh in-memory SQLite database.
    pub fn sqlite_in_memory() -> OrmResult<Self> {
        Ok(Self::new(crate::sqlite::SqliteConnection::open_in_memory()?))
    }
}
