//! Query monitoring and hooks for SQL execution.
//!
//! Every statement a [`Db`](crate::Db) runs, whether built by a query
//! builder, issued by a relation resolver or passed through
//! [`Db::raw_query`](crate::Db::raw_query), goes through the registered
//! [`QueryHook`]s:
//!
//! ```rust,ignore
//! use quarry::monitor::{QueryCounter, TracingSqlHook};
//! use std::sync::Arc;
//!
//! let counter = Arc::new(QueryCounter::new());
//! let db = Db::new(conn)
//!     .with_hook(TracingSqlHook::new())
//!     .with_hook_arc(counter.clone());
//!
//! db.table("users").get()?;
//! assert_eq!(counter.stats().select_count, 1);
//! ```

mod counter;
mod tracing_hook;
mod types;


pub use counter::{QueryCounter, QueryStats};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
