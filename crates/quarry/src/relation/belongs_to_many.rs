use crate::builder::Builder;
use crate::db::Db;
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::inflect::foreign_key_for;

use super::{Batch, EagerQuery, Pivot, RelationDescriptor, RelationKind, Resolver, key_of};

/// `R` rows linked to `P` through a pivot table.
///
/// Pivot columns default to `singular(P::table())_id` and
/// `singular(R::table())_id`. A related row linked twice to the same parent
/// is returned once.
pub struct BelongsToMany<P, R> {
    name: String,
    pivot_table: String,
    foreign_key: Option<String>,
    related_key: Option<String>,
    attach: fn(&mut P, Vec<R>),
}

impl<P: Entity, R: Entity> BelongsToMany<P, R> {
    pub fn new(name: impl Into<String>, pivot_table: impl Into<String>, attach: fn(&mut P, Vec<R>)) -> Self {
        Self {
            name: name.into(),
            pivot_table: pivot_table.into(),
            foreign_key: None,
            related_key: None,
            attach,
        }
    }

    /// Pivot column referencing `P`.
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Pivot column referencing `R`.
    pub fn related_key(mut self, column: impl Into<String>) -> Self {
        self.related_key = Some(column.into());
        self
    }

    pub fn for_entity<'a>(&self, db: &'a Db, parent: &P) -> OrmResult<Builder<'a, R>> {
        Ok(self.descriptor().lazy_query(db, parent)?.entity::<R>())
    }

    pub fn for_batch<'a>(&self, db: &'a Db, parents: &[P]) -> OrmResult<EagerQuery<'a, R>> {
        EagerQuery::new(db, self.descriptor(), parents)
    }
}

impl<P: Entity, R: Entity> Resolver<P> for BelongsToMany<P, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            kind: RelationKind::BelongsToMany,
            related_table: R::table().to_string(),
            parent_key: P::primary_key().to_string(),
            related_key: R::primary_key().to_string(),
            pivot: Some(Pivot {
                table: self.pivot_table.clone(),
                parent_key: self
                    .foreign_key
                    .clone()
                    .unwrap_or_else(|| foreign_key_for(P::table())),
                related_key: self
                    .related_key
                    .clone()
                    .unwrap_or_else(|| foreign_key_for(R::table())),
            }),
        }
    }

    fn resolve_one(&self, db: &Db, parent: &mut P) -> OrmResult<()> {
        let related = self.for_entity(db, parent)?.get()?;
        (self.attach)(parent, related);
        Ok(())
    }

    fn resolve_batch(&self, db: &Db, batch: &Batch, parent: &mut P) -> OrmResult<()> {
        let descriptor = self.descriptor();
        let key = key_of(db, parent, &descriptor.parent_key, &self.name)?;
        let related = batch.hydrate::<R>(db, &key)?;
        (self.attach)(parent, related);
        Ok(())
    }
}
