use crate::builder::Builder;
use crate::db::Db;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::inflect::foreign_key_for;

use super::{Batch, EagerQuery, RelationDescriptor, RelationKind, Resolver, key_of};

/// Child rows of `C` whose foreign key references `P`.
///
/// Keys default to `singular(P::table())_id` on the child and `P`'s primary
/// key on the parent.
pub struct HasMany<P, C> {
    name: String,
    foreign_key: Option<String>,
    local_key: Option<String>,
    attach: fn(&mut P, Vec<C>),
}

impl<P: Entity, C: Entity> HasMany<P, C> {
    pub fn new(name: impl Into<String>, attach: fn(&mut P, Vec<C>)) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            local_key: None,
            attach,
        }
    }

    /// Child column referencing the parent.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Parent column the foreign key references.
    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    /// Lazy entry point: the children of `parent`, still open for chaining
    /// (ordering, limits, pagination).
    pub fn for_entity<'a>(&self, db: &'a Db, parent: &P) -> OrmResult<Builder<'a, C>> {
        Ok(self.descriptor().lazy_query(db, parent)?.entity::<C>())
    }

    /// Eager entry point: one query for the children of every parent.
    pub fn for_batch<'a>(&self, db: &'a Db, parents: &[P]) -> OrmResult<EagerQuery<'a, C>> {
        EagerQuery::new(db, self.descriptor(), parents)
    }
}

impl<P: Entity, C: Entity> Resolver<P> for HasMany<P, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            kind: RelationKind::HasMany,
            related_table: C::table().to_string(),
            parent_key: self
                .local_key
                .clone()
                .unwrap_or_else(|| P::primary_key().to_string()),
            related_key: self
                .foreign_key
                .clone()
                .unwrap_or_else(|| foreign_key_for(P::table())),
            pivot: None,
        }
    }

    fn resolve_one(&self, db: &Db, parent: &mut P) -> OrmResult<()> {
        let children = self.for_entity(db, parent)?.get()?;
        (self.attach)(parent, children);
        Ok(())
    }

    fn resolve_batch(&self, db: &Db, batch: &Batch, parent: &mut P) -> OrmResult<()> {
        let descriptor = self.descriptor();
        let key = key_of(db, parent, &descriptor.parent_key, &self.name)?;
        let children = batch.hydrate::<C>(db, &key)?;
        (self.attach)(parent, children);
        Ok(())
    }
}
