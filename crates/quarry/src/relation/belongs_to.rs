use crate::builder::Builder;
use crate::db::Db;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::inflect::foreign_key_for;

use super::{Batch, EagerQuery, RelationDescriptor, RelationKind, Resolver, key_of};

/// The `R` row referenced by a foreign key stored on `P`.
///
/// Keys default to `singular(R::table())_id` on `P` and `R`'s primary key.
pub struct BelongsTo<P, R> {
    name: String,
    foreign_key: Option<String>,
    owner_key: Option<String>,
    attach: fn(&mut P, Option<R>),
}

impl<P: Entity, R: Entity> BelongsTo<P, R> {
    pub fn new(name: impl Into<String>, attach: fn(&mut P, Option<R>)) -> Self {
        Self {
            name: name.into(),
            foreign_key: None,
            owner_key: None,
            attach,
        }
    }

    /// Column on `P` holding the reference.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Column on `R` the reference points at.
    pub fn owner_key(mut self, column: impl Into<String>) -> Self {
        self.owner_key = Some(column.into());
        self
    }

    pub fn for_entity<'a>(&self, db: &'a Db, parent: &P) -> OrmResult<Builder<'a, R>> {
        Ok(self.descriptor().lazy_query(db, parent)?.entity::<R>())
    }

    pub fn for_batch<'a>(&self, db: &'a Db, parents: &[P]) -> OrmResult<EagerQuery<'a, R>> {
        EagerQuery::new(db, self.descriptor(), parents)
    }
}

impl<P: Entity, R: Entity> Resolver<P> for BelongsTo<P, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            kind: RelationKind::BelongsTo,
            related_table: R::table().to_string(),
            parent_key: self
                .foreign_key
                .clone()
                .unwrap_or_else(|| foreign_key_for(R::table())),
            related_key: self
                .owner_key
                .clone()
                .unwrap_or_else(|| R::primary_key().to_string()),
            pivot: None,
        }
    }

    fn resolve_one(&self, db: &Db, parent: &mut P) -> OrmResult<()> {
        let owner = self.for_entity(db, parent)?.one()?;
        (self.attach)(parent, owner);
        Ok(())
    }

    fn resolve_batch(&self, db: &Db, batch: &Batch, parent: &mut P) -> OrmResult<()> {
        let descriptor = self.descriptor();
        let key = key_of(db, parent, &descriptor.parent_key, &self.name)?;
        let owner = batch.hydrate::<R>(db, &key)?.into_iter().next();
        (self.attach)(parent, owner);
        Ok(())
    }
}
