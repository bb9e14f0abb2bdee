//! The connection collaborator queries execute against.

use crate::dialect::Dialect;
use crate::row::Row;
use crate::value::Value;

/// Boxed driver error carried inside [`OrmError::Execution`](crate::OrmError::Execution).
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A synchronous database connection.
///
/// Each statement is prepared and executed in one call. Implementations only
/// see finished SQL with `?` placeholders and the matching positional values.
pub trait Connection {
    fn dialect(&self) -> Dialect;

    /// Run a statement that returns rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Id generated by the most recent successful INSERT.
    fn last_insert_id(&self) -> Result<i64, DriverError>;

    fn begin(&self) -> Result<(), DriverError>;

    fn commit(&self) -> Result<(), DriverError>;

    fn rollback(&self) -> Result<(), DriverError>;

    /// Dialect-specific `LIMIT`/`OFFSET` rendering.
    fn limit_clause(&self, count: u64, offset: u64) -> String {
        self.dialect().limit_clause(count, offset)
    }
}
