//! Row to entity hydration with eager relation loading.

use crate::config::{ColumnPolicy, RelationPolicy};
use crate::db::Db;
use crate::entity::{Entity, Fields};
use crate::error::{OrmError, OrmResult};
use crate::hooks::Event;
use crate::relation::Resolver;
use crate::row::Row;

/// Build one entity from one row through the registered setters.
pub(crate) fn hydrate_row<E: Entity>(fields: &Fields<E>, row: Row, policy: ColumnPolicy) -> OrmResult<E> {
    let mut entity = E::default();
    for (column, value) in row {
        match fields.get(&column) {
            Some(field) => field
                .set(&mut entity, value)
                .map_err(|e| OrmError::hydration(&column, e.to_string()))?,
            None if policy == ColumnPolicy::Reject => {
                return Err(OrmError::hydration(
                    column,
                    format!("no field registered on `{}`", E::table()),
                ));
            }
            None => {}
        }
    }
    Ok(entity)
}

/// Hydrate every row, then eager-load `with` with one query per relation.
///
/// Relation names are checked before any row is converted, so a typo fails
/// without running follow-up queries.
pub(crate) fn hydrate_all<E: Entity>(db: &Db, rows: Vec<Row>, with: &[String]) -> OrmResult<Vec<E>> {
    let meta = db.registry().meta::<E>()?;
    let config = db.config();

    let mut requested: Vec<&dyn Resolver<E>> = Vec::with_capacity(with.len());
    for name in with {
        match meta.relations.get(name) {
            Some(resolver) => requested.push(resolver),
            None if config.relation_policy == RelationPolicy::Lenient => {
                tracing::debug!(
                    target: "quarry.eager",
                    entity = E::table(),
                    relation = %name,
                    "skipping undeclared relation"
                );
            }
            None => return Err(OrmError::relation_not_found(E::table(), name)),
        }
    }

    let mut entities = rows
        .into_iter()
        .map(|row| hydrate_row(&meta.fields, row, config.column_policy))
        .collect::<OrmResult<Vec<E>>>()?;

    for resolver in requested {
        let rows = resolver.conditions_for_batch(db, &entities)?.get()?;
        let batch = resolver.descriptor().group(rows);
        tracing::debug!(
            target: "quarry.eager",
            entity = E::table(),
            relation = resolver.name(),
            parents = entities.len(),
            rows = batch.len(),
            groups = batch.parents(),
            "eager batch loaded"
        );
        for entity in entities.iter_mut() {
            resolver.resolve_batch(db, &batch, entity)?;
        }
    }

    if meta.hooks.has_after_hydrate() {
        for entity in entities.iter_mut() {
            meta.hooks.run(Event::AfterHydrate, entity)?;
        }
    }
    Ok(entities)
}
