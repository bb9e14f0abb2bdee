//! Entity persistence and lookup helpers on [`Db`].

use crate::builder::{Builder, Order};
use crate::db::Db;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::hooks::Event;
use crate::registry::EntityMeta;
use crate::value::{IntoValue, Value};

/// Whether a primary key value marks an entity that was never inserted.
fn is_unsaved(key: &Value) -> bool {
    match key {
        Value::Null => true,
        Value::Integer(0) => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    }
}

/// The value side of a `find_by`/`count_by` pair.
///
/// A single value compares with `=`; a list matches any of its members.
///
/// ```ignore
/// db.find_by::<User>(&[
///     ("status", Criterion::from("active".into_value())),
///     ("id", Criterion::any_of([1, 2, 3])),
/// ])?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Eq(Value),
    In(Vec<Value>),
}

impl Criterion {
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        Self::In(values.into_iter().map(IntoValue::into_value).collect())
    }
}

impl From<Value> for Criterion {
    fn from(value: Value) -> Self {
        Self::Eq(value)
    }
}

impl From<Vec<Value>> for Criterion {
    fn from(values: Vec<Value>) -> Self {
        Self::In(values)
    }
}

fn primary_key<E: Entity>(meta: &EntityMeta<E>, entity: &E) -> OrmResult<Value> {
    meta.fields
        .get(E::primary_key())
        .map(|field| field.get(entity))
        .ok_or_else(|| {
            OrmError::ModelResolution(format!(
                "`{}` has no field for its primary key `{}`",
                E::table(),
                E::primary_key()
            ))
        })
}

impl Db {
    /// Insert `entity` if it has no primary key yet, otherwise update it by key.
    ///
    /// Inserts run `before_save`/`after_save` hooks and write the generated id
    /// back into the entity; updates run `before_update`/`after_update`.
    pub fn save<E: Entity>(&self, entity: &mut E) -> OrmResult<()> {
        let meta = self.registry().meta::<E>()?;
        let pk = E::primary_key();
        let key = primary_key(meta, entity)?;

        if is_unsaved(&key) {
            meta.hooks.run(Event::BeforeSave, entity)?;
            let data = meta.fields.values_except(entity, pk);
            let id = self.table(E::table()).insert(data)?;
            if let Some(field) = meta.fields.get(pk) {
                field
                    .set(entity, Value::Integer(id))
                    .map_err(|e| OrmError::hydration(pk, e.to_string()))?;
            }
            meta.hooks.run(Event::AfterSave, entity)?;
        } else {
            meta.hooks.run(Event::BeforeUpdate, entity)?;
            let data = meta.fields.values_except(entity, pk);
            self.table(E::table()).where_(pk, key).update(data)?;
            meta.hooks.run(Event::AfterUpdate, entity)?;
        }
        Ok(())
    }

    /// Save a new entity and return it with its generated key.
    pub fn create<E: Entity>(&self, mut entity: E) -> OrmResult<E> {
        self.save(&mut entity)?;
        Ok(entity)
    }

    /// Delete `entity` by primary key. Unsaved entities are left alone.
    pub fn delete<E: Entity>(&self, entity: &E) -> OrmResult<u64> {
        let meta = self.registry().meta::<E>()?;
        let key = primary_key(meta, entity)?;
        if is_unsaved(&key) {
            return Ok(0);
        }

        meta.hooks.run_before_delete(entity)?;
        let deleted = self
            .table(E::table())
            .where_(E::primary_key(), key)
            .delete()?;
        meta.hooks.run_after_delete(entity)?;
        Ok(deleted)
    }

    /// Delete every row of `E`'s table.
    pub fn destroy_all<E: Entity>(&self) -> OrmResult<u64> {
        self.table(E::table()).delete()
    }

    /// Look up one entity by primary key.
    pub fn find<E: Entity>(&self, id: impl IntoValue) -> OrmResult<Option<E>> {
        self.query::<E>().where_(E::primary_key(), id).one()
    }

    /// Like [`Db::find`], failing with `NotFound` when no row matches.
    pub fn find_or_fail<E: Entity>(&self, id: impl IntoValue) -> OrmResult<E> {
        let id = id.into_value();
        self.find::<E>(id.clone())?.ok_or_else(|| {
            OrmError::not_found(format!("`{}` with {} = {id:?}", E::table(), E::primary_key()))
        })
    }

    /// Look up several entities by primary key, in table order.
    pub fn find_many<E, I, V>(&self, ids: I) -> OrmResult<Vec<E>>
    where
        E: Entity,
        I: IntoIterator<Item = V>,
        V: IntoValue,
    {
        self.query::<E>().in_list(E::primary_key(), ids).get()
    }

    /// Every entity, ordered by `field`.
    pub fn find_all<E: Entity>(&self, field: &str, order: Order) -> OrmResult<Vec<E>> {
        self.query::<E>().order_by(field, order).get()
    }

    /// The `n` most recent entities by primary key.
    pub fn find_last<E: Entity>(&self, n: i64) -> OrmResult<Vec<E>> {
        self.query::<E>().last(n)
    }

    /// Entities matching every `(field, criterion)` pair; list criteria
    /// become `IN`.
    pub fn find_by<E: Entity>(
        &self,
        criteria: &[(&str, impl Into<Criterion> + Clone)],
    ) -> OrmResult<Vec<E>> {
        self.matching::<E>(criteria).get()
    }

    /// Number of entities matching every `(field, criterion)` pair.
    pub fn count_by<E: Entity>(
        &self,
        criteria: &[(&str, impl Into<Criterion> + Clone)],
    ) -> OrmResult<i64> {
        self.matching::<E>(criteria).count()
    }

    fn matching<E: Entity>(
        &self,
        criteria: &[(&str, impl Into<Criterion> + Clone)],
    ) -> Builder<'_, E> {
        criteria
            .iter()
            .fold(self.query::<E>(), |qb, (field, criterion)| {
                let criterion: Criterion = criterion.clone().into();
                match criterion {
                    Criterion::Eq(value) => qb.where_(field, value),
                    Criterion::In(values) => qb.in_list(field, values),
                }
            })
    }

    pub fn count<E: Entity>(&self) -> OrmResult<i64> {
        self.query::<E>().count()
    }

    /// Lazily load the relation `name` into `entity`.
    pub fn load<E: Entity>(&self, entity: &mut E, name: &str) -> OrmResult<()> {
        let meta = self.registry().meta::<E>()?;
        let resolver = meta
            .relations
            .get(name)
            .ok_or_else(|| OrmError::relation_not_found(E::table(), name))?;
        resolver.resolve_one(self, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;
    use crate::test_support::{MockConnection, User, db_with, int, row, text};

    #[test]
    fn save_inserts_unsaved_and_assigns_key() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        let mut user = User {
            name: "alice".to_string(),
            ..User::default()
        };

        db.save(&mut user).unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(
            conn.statements(),
            vec![(
                "INSERT INTO users (name) VALUES (?)".to_string(),
                vec![text("alice")]
            )]
        );
    }

    #[test]
    fn save_updates_by_key() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        let mut user = User {
            id: 5,
            name: "bob".to_string(),
            ..User::default()
        };

        db.save(&mut user).unwrap();

        assert_eq!(
            conn.statements(),
            vec![(
                "UPDATE users SET name = ? WHERE id = ?".to_string(),
                vec![text("bob"), int(5)]
            )]
        );
    }

    #[test]
    fn delete_skips_unsaved() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        assert_eq!(db.delete(&User::default()).unwrap(), 0);
        assert!(conn.statements().is_empty());

        let saved = User {
            id: 3,
            ..User::default()
        };
        assert_eq!(db.delete(&saved).unwrap(), 1);
        assert_eq!(conn.sql_log(), vec!["DELETE FROM users WHERE id = ?"]);
    }

    #[test]
    fn hooks_run_around_save_and_can_abort_delete() {
        let conn = MockConnection::new();
        let mut db = db_with(&conn);
        db.observe(
            Hooks::<User>::new()
                .before_save(|u| {
                    u.name = u.name.trim().to_string();
                    Ok(())
                })
                .after_save(|u| {
                    assert_eq!(u.id, 42);
                    Ok(())
                })
                .before_delete(|_| Err(OrmError::query("users are never deleted"))),
        );

        let user = db
            .create(User {
                name: "  carol ".to_string(),
                ..User::default()
            })
            .unwrap();
        assert_eq!(user.name, "carol");

        assert!(matches!(db.delete(&user), Err(OrmError::Query(_))));
        assert_eq!(conn.sql_log(), vec!["INSERT INTO users (name) VALUES (?)"]);
    }

    #[test]
    fn find_variants() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        conn.push_rows(vec![row([("id", int(1)), ("name", text("a"))])]);

        assert_eq!(db.find::<User>(1).unwrap().map(|u| u.id), Some(1));
        assert!(db.find_or_fail::<User>(2).unwrap_err().is_not_found());

        db.find_by::<User>(&[("name", text("a")), ("id", int(1))]).unwrap();
        db.find_many::<User, _, _>([1, 2]).unwrap();

        assert_eq!(
            conn.sql_log(),
            vec![
                "SELECT * FROM users WHERE id = ? LIMIT 1",
                "SELECT * FROM users WHERE id = ? LIMIT 1",
                "SELECT * FROM users WHERE name = ? AND id = ?",
                "SELECT * FROM users WHERE id IN (?, ?)",
            ]
        );
    }

    #[test]
    fn list_criteria_become_in() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        conn.push_rows(vec![row([("id", int(2)), ("name", text("b"))])]);
        conn.push_rows(vec![row([("total", int(2))])]);

        let found = db
            .find_by::<User>(&[
                ("name", Criterion::from(text("b"))),
                ("id", Criterion::any_of([1i64, 2, 3])),
            ])
            .unwrap();
        let total = db
            .count_by::<User>(&[("id", vec![int(1), int(2)])])
            .unwrap();

        assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(total, 2);
        assert_eq!(
            conn.statements(),
            vec![
                (
                    "SELECT * FROM users WHERE name = ? AND id IN (?, ?, ?)".to_string(),
                    vec![text("b"), int(1), int(2), int(3)]
                ),
                (
                    "SELECT count(*) AS total FROM users WHERE id IN (?, ?)".to_string(),
                    vec![int(1), int(2)]
                ),
            ]
        );
    }

    #[test]
    fn load_unknown_relation() {
        let conn = MockConnection::new();
        let db = db_with(&conn);
        let mut user = User::default();
        let err = db.load(&mut user, "nope").unwrap_err();
        assert!(matches!(err, OrmError::RelationNotFound { .. }));
    }
}
