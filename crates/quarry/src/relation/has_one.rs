use crate::builder::Builder;
use crate::db::Db;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::inflect::foreign_key_for;

use super::{Batch, EagerQuery, RelationDescriptor, RelationKind, Resolver, key_of};

/// A single child row of `C` whose foreign key references `P`.
///
/// Same key conventions as [`HasMany`](super::HasMany); when several rows
/// match, the first one returned wins.
pub struct HasOne<P, C> {
    name: String,
    foreign_key: Option<String>,
    local_key: Option<String>,
    attach: fn(&mut P, Option<C>),
}

impl<P: Entity, C: Entity> HasOne<P, C> {
    pub fn new(name: impl Into<String>, attach: fn(&mut P, Option<C>)) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            local_key: None,
            attach,
        }
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    pub fn for_entity<'a>(&self, db: &'a Db, parent: &P) -> OrmResult<Builder<'a, C>> {
        Ok(self.descriptor().lazy_query(db, parent)?.entity::<C>())
    }

    pub fn for_batch<'a>(&self, db: &'a Db, parents: &[P]) -> OrmResult<EagerQuery<'a, C>> {
        EagerQuery::new(db, self.descriptor(), parents)
    }
}

impl<P: Entity, C: Entity> Resolver<P> for HasOne<P, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            kind: RelationKind::HasOne,
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
        let child = self.for_entity(db, parent)?.one()?;
        (self.attach)(parent, child);
        Ok(())
    }

    fn resolve_batch(&self, db: &Db, batch: &Batch, parent: &mut P) -> OrmResult<()> {
        let descriptor = self.descriptor();
        let key = key_of(db, parent, &descriptor.parent_key, &self.name)?;
        let child = batch.hydrate::<C>(db, &key)?.into_iter().next();
        (self.attach)(parent, child);
        Ok(())
    }
}
