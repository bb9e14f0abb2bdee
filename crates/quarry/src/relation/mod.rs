//! Relation resolvers for lazy (single parent) and eager (batched) loading.
//!
//! Relations are declared once per entity type, in [`Entity::relations`], and
//! the session keeps the resolver objects for the lifetime of the registry:
//!
//! ```ignore
//! fn user_relations() -> Relations<User> {
//!     Relations::new()
//!         .has_many::<Article>("articles", |u, v| u.articles = v)
//!         .belongs_to_many::<Role>("roles", "role_user", |u, v| u.roles = v)
//!         .relation(HasOne::<User, Profile>::new("profile", |u, p| u.profile = p).foreign_key("owner_id"))
//! }
//! ```
//!
//! The two strategies are selected explicitly:
//!
//! - lazy: [`Resolver::resolve_one`] (or `for_entity` on a typed relation)
//!   issues one query for one parent;
//! - eager: [`Resolver::conditions_for_batch`] builds one query for every
//!   parent, the rows are grouped once into a [`Batch`], and
//!   [`Resolver::resolve_batch`] hands each parent its bucket.
//!
//! Both produce the same object graph.

mod belongs_to;
mod belongs_to_many;
mod has_many;
mod has_one;


use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use crate::builder::Builder;
use crate::db::Db;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::hydrate;
use crate::pagination::{LinkStyle, Paginator};
use crate::row::Row;
use crate::value::{Key, Value};

pub use belongs_to::BelongsTo;
pub use belongs_to_many::BelongsToMany;
pub use has_many::HasMany;
pub use has_one::HasOne;

/// Column alias carrying the pivot's parent key in many-to-many batch rows.
pub(crate) const PIVOT_PARENT_ALIAS: &str = "__quarry_parent_key";

/// Relationship topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
}

/// Join table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub table: String,
    /// Pivot column referencing the declaring entity.
    pub parent_key: String,
    /// Pivot column referencing the related entity.
    pub related_key: String,
}

/// Fully resolved key names of one relation.
///
/// `parent_key` is always read from the declaring entity and `related_key`
/// is always a column of the related table:
///
/// | kind            | parent_key            | related_key           |
/// |-----------------|-----------------------|-----------------------|
/// | `HasOne/HasMany`| local key (parent pk) | foreign key on child  |
/// | `BelongsTo`     | foreign key on parent | owner key (related pk)|
/// | `BelongsToMany` | parent pk             | related pk            |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub name: String,
    pub kind: RelationKind,
    pub related_table: String,
    pub parent_key: String,
    pub related_key: String,
    pub pivot: Option<Pivot>,
}

impl RelationDescriptor {
    /// The column holding the foreign key, wherever it lives.
    pub fn foreign_key(&self) -> &str {
        match (&self.kind, &self.pivot) {
            (RelationKind::BelongsTo, _) => &self.parent_key,
            (RelationKind::BelongsToMany, Some(pivot)) => &pivot.parent_key,
            _ => &self.related_key,
        }
    }

    /// The column the foreign key points at.
    pub fn local_key(&self) -> &str {
        match self.kind {
            RelationKind::BelongsTo => &self.related_key,
            _ => &self.parent_key,
        }
    }

    /// Column filtered on by both strategies.
    fn filter_column(&self) -> String {
        match &self.pivot {
            Some(pivot) => format!("{}.{}", pivot.table, pivot.parent_key),
            None => self.related_key.clone(),
        }
    }

    /// Column of a fetched row that identifies its parent.
    fn match_column(&self) -> &str {
        match self.pivot {
            Some(_) => PIVOT_PARENT_ALIAS,
            None => &self.related_key,
        }
    }

    /// The SELECT shared by the lazy and eager paths, before filtering.
    fn base_query<'a>(&self, db: &'a Db, batch: bool) -> Builder<'a, Row> {
        let builder = db.table(self.related_table.as_str());
        match &self.pivot {
            None => builder,
            Some(pivot) => {
                let related_all = format!("{}.*", self.related_table);
                let on = format!(
                    "{}.{} = {}.{}",
                    pivot.table, pivot.related_key, self.related_table, self.related_key
                );
                let builder = if batch {
                    let parent = format!(
                        "{}.{} AS {PIVOT_PARENT_ALIAS}",
                        pivot.table, pivot.parent_key
                    );
                    builder.select(&[parent.as_str(), related_all.as_str()])
                } else {
                    builder.select(&[related_all.as_str()])
                };
                builder.distinct().inner_join(&pivot.table, &on)
            }
        }
    }

    pub(crate) fn lazy_query<'a, P: Entity>(&self, db: &'a Db, parent: &P) -> OrmResult<Builder<'a, Row>> {
        let key = key_of(db, parent, &self.parent_key, &self.name)?;
        Ok(self
            .base_query(db, false)
            .where_(&self.filter_column(), key)
            .tag(format!("lazy:{}", self.name)))
    }

    pub(crate) fn batch_query<'a, P: Entity>(
        &self,
        db: &'a Db,
        parents: &[P],
    ) -> OrmResult<Builder<'a, Row>> {
        let keys = distinct_keys(db, parents, &self.parent_key, &self.name)?;
        Ok(self
            .base_query(db, true)
            .in_list(&self.filter_column(), keys)
            .tag(format!("eager:{}", self.name)))
    }

    /// Bucket the rows of one batch query by the parent they belong to.
    ///
    /// Many-to-many rows lose their pivot column and are collapsed on the
    /// related primary key within each bucket. Rows without a usable parent
    /// key are dropped.
    pub(crate) fn group(&self, rows: Vec<Row>) -> Batch {
        let column = self.match_column();
        let mut groups: HashMap<Key, Vec<Row>> = HashMap::new();
        let mut seen: HashSet<(Key, Key)> = HashSet::new();
        let mut total = 0;

        for mut row in rows {
            let parent = match self.pivot {
                Some(_) => row.take(PIVOT_PARENT_ALIAS).and_then(|v| v.key()),
                None => row.get(column).and_then(Value::key),
            };
            let Some(parent) = parent else {
                continue;
            };
            if self.pivot.is_some() {
                if let Some(related) = row.get(&self.related_key).and_then(Value::key) {
                    if !seen.insert((parent.clone(), related)) {
                        continue;
                    }
                }
            }
            groups.entry(parent).or_default().push(row);
            total += 1;
        }
        Batch { groups, total }
    }
}

/// The rows of one eager query, grouped once by parent key.
#[derive(Debug, Default)]
pub struct Batch {
    groups: HashMap<Key, Vec<Row>>,
    total: usize,
}

impl Batch {
    /// Rows belonging to the parent keyed `key`; empty for a null key.
    pub fn rows_for(&self, key: &Value) -> &[Row] {
        key.key()
            .and_then(|k| self.groups.get(&k))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Hydrate the bucket of the parent keyed `key`.
    pub fn hydrate<C: Entity>(&self, db: &Db, key: &Value) -> OrmResult<Vec<C>> {
        hydrate::hydrate_all(db, self.rows_for(key).to_vec(), &[])
    }

    /// Rows kept after grouping.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct parent keys with at least one row.
    pub fn parents(&self) -> usize {
        self.groups.len()
    }
}

/// Read `column` from `entity` through its registered getter.
pub(crate) fn key_of<E: Entity>(db: &Db, entity: &E, column: &str, relation: &str) -> OrmResult<Value> {
    let meta = db.registry().meta::<E>()?;
    let field = meta.fields.get(column).ok_or_else(|| {
        OrmError::RelationMisconfigured(format!(
            "relation `{relation}` on `{}` reads column `{column}`, which has no registered field",
            E::table()
        ))
    })?;
    Ok(field.get(entity))
}

/// Distinct non-null `column` values across `entities`, in first-seen order.
pub(crate) fn distinct_keys<E: Entity>(
    db: &Db,
    entities: &[E],
    column: &str,
    relation: &str,
) -> OrmResult<Vec<Value>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for entity in entities {
        let value = key_of(db, entity, column, relation)?;
        if let Some(key) = value.key() {
            if seen.insert(key) {
                keys.push(value);
            }
        }
    }
    Ok(keys)
}

/// Uniform contract every relation type implements for its declaring entity `E`.
pub trait Resolver<E: Entity> {
    fn name(&self) -> &str;

    fn descriptor(&self) -> RelationDescriptor;

    /// Query for the related rows of one parent.
    fn conditions_for_one<'a>(&self, db: &'a Db, parent: &E) -> OrmResult<Builder<'a, Row>> {
        self.descriptor().lazy_query(db, parent)
    }

    /// One query for the related rows of every parent.
    fn conditions_for_batch<'a>(&self, db: &'a Db, parents: &[E]) -> OrmResult<Builder<'a, Row>> {
        self.descriptor().batch_query(db, parents)
    }

    /// Lazy: query and attach the relation to `parent`.
    fn resolve_one(&self, db: &Db, parent: &mut E) -> OrmResult<()>;

    /// Eager: attach `parent`'s bucket of the rows fetched by `conditions_for_batch`.
    fn resolve_batch(&self, db: &Db, batch: &Batch, parent: &mut E) -> OrmResult<()>;
}

/// The relations declared on `E`, looked up by name.
pub struct Relations<E> {
    resolvers: Vec<Box<dyn Resolver<E>>>,
}

impl<E> Default for Relations<E> {
    fn default() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }
}

impl<E: Entity> Relations<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any resolver, typically a typed relation with key overrides.
    pub fn relation(mut self, resolver: impl Resolver<E> + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// One child row of `C` per parent, keys by convention.
    pub fn has_one<C: Entity>(self, name: &str, attach: fn(&mut E, Option<C>)) -> Self {
        self.relation(HasOne::new(name, attach))
    }

    /// Many child rows of `C` per parent, keys by convention.
    pub fn has_many<C: Entity>(self, name: &str, attach: fn(&mut E, Vec<C>)) -> Self {
        self.relation(HasMany::new(name, attach))
    }

    /// The `C` row this entity's foreign key points at, keys by convention.
    pub fn belongs_to<C: Entity>(self, name: &str, attach: fn(&mut E, Option<C>)) -> Self {
        self.relation(BelongsTo::new(name, attach))
    }

    /// `C` rows linked through the `pivot` join table, keys by convention.
    pub fn belongs_to_many<C: Entity>(self, name: &str, pivot: &str, attach: fn(&mut E, Vec<C>)) -> Self {
        self.relation(BelongsToMany::new(name, pivot, attach))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Resolver<E>> {
        self.resolvers
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

/// A batch query for the related rows of several parents, built by a typed
/// relation's `for_batch`.
///
/// [`EagerQuery::get`] returns one group per parent, aligned with the parent
/// slice the query was built from.
pub struct EagerQuery<'a, C> {
    builder: Builder<'a, Row>,
    descriptor: RelationDescriptor,
    parent_keys: Vec<Value>,
    _marker: PhantomData<fn() -> C>,
}

impl<'a, C: Entity> EagerQuery<'a, C> {
    pub(crate) fn new<P: Entity>(
        db: &'a Db,
        descriptor: RelationDescriptor,
        parents: &[P],
    ) -> OrmResult<Self> {
        let builder = descriptor.batch_query(db, parents)?;
        let parent_keys = parents
            .iter()
            .map(|p| key_of(db, p, &descriptor.parent_key, &descriptor.name))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self {
            builder,
            descriptor,
            parent_keys,
            _marker: PhantomData,
        })
    }

    pub fn to_sql(&self) -> OrmResult<String> {
        self.builder.to_sql()
    }

    pub fn bind_values(&self) -> OrmResult<Vec<Value>> {
        self.builder.bind_values()
    }

    /// Run the single batch query and group the results per parent.
    pub fn get(self) -> OrmResult<Vec<Vec<C>>> {
        let db = self.builder.db();
        let batch = self.descriptor.group(self.builder.get()?);
        self.parent_keys
            .iter()
            .map(|key| batch.hydrate::<C>(db, key))
            .collect()
    }

    /// Pagination needs a single parent; use the relation's `for_entity`.
    pub fn paginate(self, _per_page: i64, _style: LinkStyle) -> OrmResult<Paginator<C>> {
        Err(OrmError::unsupported(format!(
            "relation `{}` cannot be paginated while eager loading; load it for a single entity instead",
            self.descriptor.name
        )))
    }
}
