//! Per-session entity registry.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::entity::{Entity, Fields};
use crate::error::{OrmError, OrmResult};
use crate::hooks::Hooks;
use crate::relation::Relations;
use crate::scope::Scopes;

/// Everything the session knows about one entity type.
///
/// Fields and relation resolvers are built once, at registration, and reused
/// by every query.
pub struct EntityMeta<E> {
    pub(crate) fields: Fields<E>,
    pub(crate) relations: Relations<E>,
    pub(crate) scopes: Scopes<E>,
    pub(crate) hooks: Hooks<E>,
}

impl<E: Entity> EntityMeta<E> {
    fn new() -> Self {
        Self {
            fields: E::fields(),
            relations: E::relations(),
            scopes: E::scopes(),
            hooks: Hooks::default(),
        }
    }

    pub fn fields(&self) -> &Fields<E> {
        &self.fields
    }

    pub fn relations(&self) -> &Relations<E> {
        &self.relations
    }

    pub fn scopes(&self) -> &Scopes<E> {
        &self.scopes
    }

    pub fn hooks(&self) -> &Hooks<E> {
        &self.hooks
    }
}

/// Type-keyed map of [`EntityMeta`].
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `E`. Registering twice keeps the existing entry.
    pub fn register<E: Entity>(&mut self) -> &mut EntityMeta<E> {
        let entry = self
            .entries
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(EntityMeta::<E>::new()));
        match entry.downcast_mut::<EntityMeta<E>>() {
            Some(meta) => meta,
            None => unreachable!("registry entry keyed by TypeId holds a different type"),
        }
    }

    /// Register `E` (if needed) and install its lifecycle hooks.
    pub fn observe<E: Entity>(&mut self, hooks: Hooks<E>) {
        self.register::<E>().hooks = hooks;
    }

    pub fn is_registered<E: Entity>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<E>())
    }

    pub fn meta<E: Entity>(&self) -> OrmResult<&EntityMeta<E>> {
        self.entries
            .get(&TypeId::of::<E>())
            .and_then(|entry| entry.downcast_ref::<EntityMeta<E>>())
            .ok_or_else(|| {
                OrmError::ModelResolution(format!(
                    "entity `{}` (table `{}`) is not registered with this session",
                    type_name::<E>(),
                    E::table()
                ))
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
