use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::injector::{ContainerError, Injector};
use crate::container::Value;

type Thunk = Arc<dyn Fn(&dyn Injector) -> Result<Value, ContainerError> + Send + Sync>;

/// A deferred value, stored in an override map in place of the value itself.
///
/// A [`Lazy`] defers expansion until the resolver consumes the argument slot
/// it occupies, so referencing an expensive or as-yet-unregistered component
/// in a map never forces its activation at map-construction time.
///
/// Expansion is single-level: a [`Lazy`] produced by an expansion is handed
/// through untouched.
#[derive(Clone)]
pub struct Lazy {
    kind: LazyKind,
}

#[derive(Clone)]
enum LazyKind {
    Component(String),
    Thunk(Thunk),
}

impl Lazy {
    /// Defers to the value currently or eventually bound to `name` in the
    /// container that consumes this entry.
    pub fn component(name: impl Into<String>) -> Self {
        Self {
            kind: LazyKind::Component(name.into()),
        }
    }

    /// Defers to an arbitrary computation against the consuming container.
    pub fn thunk<F>(thunk: F) -> Self
    where
        F: Fn(&dyn Injector) -> Result<Value, ContainerError> + Send + Sync + 'static,
    {
        Self {
            kind: LazyKind::Thunk(Arc::new(thunk)),
        }
    }

    pub(crate) fn expand(&self, injector: &dyn Injector) -> Result<Value, ContainerError> {
        match &self.kind {
            LazyKind::Component(name) => injector.get(name),
            LazyKind::Thunk(thunk) => thunk(injector),
        }
    }
}

impl Debug for Lazy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            LazyKind::Component(name) => f.debug_tuple("Lazy::Component").field(name).finish(),
            LazyKind::Thunk(_) => f.write_str("Lazy::Thunk"),
        }
    }
}
