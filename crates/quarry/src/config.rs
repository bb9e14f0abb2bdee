//! Session configuration

/// What hydration does with a column that has no registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnPolicy {
    /// Drop the column silently.
    #[default]
    Ignore,
    /// Fail with `OrmError::Hydration`.
    Reject,
}

/// What eager loading does with a relation name the entity does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationPolicy {
    /// Fail with `OrmError::RelationNotFound`.
    #[default]
    Strict,
    /// Skip the unknown name.
    Lenient,
}

/// Configuration for a [`Db`](crate::Db) session.
///
/// ```rust,ignore
/// let config = DbConfig::new()
///     .column_policy(ColumnPolicy::Reject)
///     .default_per_page(25);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub column_policy: ColumnPolicy,
    pub relation_policy: RelationPolicy,
    /// Suffix appended to the hashed key to form a cache path.
    pub cache_suffix: String,
    /// Page size used by `paginate_default`.
    pub default_per_page: i64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            column_policy: ColumnPolicy::Ignore,
            relation_policy: RelationPolicy::Strict,
            cache_suffix: "_database_cache".to_string(),
            default_per_page: 10,
        }
    }
}

impl DbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_policy(mut self, policy: ColumnPolicy) -> Self {
        self.column_policy = policy;
        self
    }

    pub fn relation_policy(mut self, policy: RelationPolicy) -> Self {
        self.relation_policy = policy;
        self
    }

    pub fn cache_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.cache_suffix = suffix.into();
        self
    }

    pub fn default_per_page(mut self, per_page: i64) -> Self {
        self.default_per_page = per_page;
        self
    }
}
