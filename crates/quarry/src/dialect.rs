//! SQL dialect hooks

use crate::raw::Raw;

/// The SQL dialect spoken by a connection.
///
/// Dialects differ in how pagination and type casts are rendered; every other
/// clause is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    MySql,
}

impl Dialect {
    /// Render the `LIMIT`/`OFFSET` tail of a SELECT.
    ///
    /// A zero count means "no limit". SQLite requires a LIMIT before OFFSET,
    /// so an offset-only query renders `LIMIT -1`; MySQL uses its documented
    /// maximum row count for the same purpose.
    pub fn limit_clause(&self, count: u64, offset: u64) -> String {
        let mut sql = String::new();
        if count > 0 {
            sql.push_str(&format!(" LIMIT {count}"));
        } else if offset > 0 {
            match self {
                Dialect::Sqlite => sql.push_str(" LIMIT -1"),
                Dialect::MySql => sql.push_str(" LIMIT 18446744073709551615"),
            }
        }
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    /// `expr` converted to an integer, for select lists, ordering and filters.
    ///
    /// ```ignore
    /// let d = db.dialect();
    /// db.table("scores").select_raw(d.cast_integer("points")).get()?;
    /// ```
    pub fn cast_integer(&self, expr: &str) -> Raw {
        match self {
            Dialect::Sqlite => Raw::new(format!("CAST({expr} AS INTEGER)")),
            Dialect::MySql => Raw::new(format!("CAST({expr} AS SIGNED INTEGER)")),
        }
    }

    /// `expr` converted to a fixed-point number with `precision` digits,
    /// `scale` of them after the decimal point.
    pub fn cast_decimal(&self, expr: &str, precision: u8, scale: u8) -> Raw {
        Raw::new(format!("CAST({expr} AS DECIMAL({precision},{scale}))"))
    }

    pub fn cast_string(&self, expr: &str) -> Raw {
        match self {
            Dialect::Sqlite => Raw::new(format!("CAST({expr} AS TEXT)")),
            Dialect::MySql => Raw::new(format!("CAST({expr} AS CHAR)")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        }
    }
}
