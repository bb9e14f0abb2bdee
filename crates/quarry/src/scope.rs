//! Named query scopes declared per entity type.

use crate::builder::Builder;

/// Refines a typed builder; applied by [`Builder::scope`].
pub type ScopeFn<E> = for<'a> fn(Builder<'a, E>) -> Builder<'a, E>;

/// The scopes declared on `E`, looked up by name.
///
/// ```ignore
/// fn user_scopes() -> Scopes<User> {
///     Scopes::new()
///         .scope("active", |q| q.where_("status", "active"))
///         .scope("newest", |q| q.order_by("id", Order::Desc))
/// }
///
/// let active = db.query::<User>().scope("active").scope("newest").get()?;
/// ```
pub struct Scopes<E> {
    scopes: Vec<(&'static str, ScopeFn<E>)>,
}

impl<E> Default for Scopes<E> {
    fn default() -> Self {
        Self { scopes: Vec::new() }
    }
}

impl<E> Scopes<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`; a later declaration of the same name replaces it.
    pub fn scope(mut self, name: &'static str, apply: ScopeFn<E>) -> Self {
        self.scopes.retain(|(existing, _)| *existing != name);
        self.scopes.push((name, apply));
        self
    }

    pub fn get(&self, name: &str) -> Option<ScopeFn<E>> {
        self.scopes
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, apply)| *apply)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.scopes.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
