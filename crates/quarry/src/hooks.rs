//! Typed per-entity lifecycle hooks.

use crate::error::OrmResult;

type MutHook<E> = Box<dyn Fn(&mut E) -> OrmResult<()>>;
type RefHook<E> = Box<dyn Fn(&E) -> OrmResult<()>>;

/// Lifecycle observers for one entity type.
///
/// A `before_*` hook returning `Err` aborts the operation before any SQL runs.
///
/// ```ignore
/// db.observe(
///     Hooks::<User>::new()
///         .before_save(|u| { u.name = u.name.trim().to_string(); Ok(()) })
///         .after_delete(|u| { tracing::info!(id = u.id, "user removed"); Ok(()) }),
/// );
/// ```
pub struct Hooks<E> {
    before_save: Vec<MutHook<E>>,
    after_save: Vec<MutHook<E>>,
    before_update: Vec<MutHook<E>>,
    after_update: Vec<MutHook<E>>,
    before_delete: Vec<RefHook<E>>,
    after_delete: Vec<RefHook<E>>,
    after_hydrate: Vec<MutHook<E>>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            before_save: Vec::new(),
            after_save: Vec::new(),
            before_update: Vec::new(),
            after_update: Vec::new(),
            before_delete: Vec::new(),
            after_delete: Vec::new(),
            after_hydrate: Vec::new(),
        }
    }
}

/// Lifecycle points that take the entity mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    BeforeSave,
    AfterSave,
    BeforeUpdate,
    AfterUpdate,
    AfterHydrate,
}

impl<E> Hooks<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before a new entity is inserted.
    pub fn before_save(mut self, hook: impl Fn(&mut E) -> OrmResult<()> + 'static) -> Self {
        self.before_save.push(Box::new(hook));
        self
    }

    /// Runs after an insert, once the primary key is assigned.
    pub fn after_save(mut self, hook: impl Fn(&mut E) -> OrmResult<()> + 'static) -> Self {
        self.after_save.push(Box::new(hook));
        self
    }

    pub fn before_update(mut self, hook: impl Fn(&mut E) -> OrmResult<()> + 'static) -> Self {
        self.before_update.push(Box::new(hook));
        self
    }

    pub fn after_update(mut self, hook: impl Fn(&mut E) -> OrmResult<()> + 'static) -> Self {
        self.after_update.push(Box::new(hook));
        self
    }

    pub fn before_delete(mut self, hook: impl Fn(&E) -> OrmResult<()> + 'static) -> Self {
        self.before_delete.push(Box::new(hook));
        self
    }

    pub fn after_delete(mut self, hook: impl Fn(&E) -> OrmResult<()> + 'static) -> Self {
        self.after_delete.push(Box::new(hook));
        self
    }

    /// Runs for every entity built from a row, including eager-loaded children.
    pub fn after_hydrate(mut self, hook: impl Fn(&mut E) -> OrmResult<()> + 'static) -> Self {
        self.after_hydrate.push(Box::new(hook));
        self
    }

    pub(crate) fn run(&self, event: Event, entity: &mut E) -> OrmResult<()> {
        let hooks = match event {
            Event::BeforeSave => &self.before_save,
            Event::AfterSave => &self.after_save,
            Event::BeforeUpdate => &self.before_update,
            Event::AfterUpdate => &self.after_update,
            Event::AfterHydrate => &self.after_hydrate,
        };
        hooks.iter().try_for_each(|hook| hook(entity))
    }

    pub(crate) fn run_before_delete(&self, entity: &E) -> OrmResult<()> {
        self.before_delete.iter().try_for_each(|hook| hook(entity))
    }

    pub(crate) fn run_after_delete(&self, entity: &E) -> OrmResult<()> {
        self.after_delete.iter().try_for_each(|hook| hook(entity))
    }

    pub(crate) fn has_after_hydrate(&self) -> bool {
        !self.after_hydrate.is_empty()
    }
}
