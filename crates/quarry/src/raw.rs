//! Literal SQL fragments that bypass parameter binding.

use std::fmt;

/// SQL text inserted verbatim into a statement.
///
/// Anything wrapped in `Raw` is never bound as a parameter, so it must not
/// carry user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raw(String);

impl Raw {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Raw {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for Raw {
    fn from(sql: String) -> Self {
        Self(sql)
    }
}

/// Shorthand for [`Raw::new`].
pub fn raw(sql: impl Into<String>) -> Raw {
    Raw::new(sql)
}
