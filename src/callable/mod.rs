mod closure;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::injector::{ContainerError, Injector};
use crate::container::{Managed, Value};

pub use closure::ClosureCallable;

/// Describes one parameter accepted by a [`Callable`].
///
/// Rust offers no runtime introspection of closures, so callables carry an
/// explicit descriptor per parameter: its name, optionally the registry name
/// of its declared type, and optionally a default value that marks the
/// parameter as optional.
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    type_name: Option<String>,
    default: Option<Value>,
}

/// Shorthand for [`ParamSpec::new`].
pub fn param(name: impl Into<String>) -> ParamSpec {
    ParamSpec::new(name)
}

impl ParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
        }
    }

    /// Declares the registry name of this parameter's type.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Marks this parameter optional, falling back to `value` when no other
    /// source can satisfy it.
    pub fn with_default<T: Managed>(mut self, value: T) -> Self {
        let value: Value = Arc::new(value);
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

impl Debug for ParamSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("optional", &self.default.is_some())
            .finish()
    }
}

/// Anything the container can invoke with a resolved argument list.
///
/// A [`Callable`] is the introspection seam of the crate: it exposes its own
/// ordered parameter descriptors, a best-effort source location used in
/// resolution diagnostics, and the invocation itself. The injector is handed
/// to [`invoke`] so a body may fetch further components directly, in
/// addition to the arguments resolved from its descriptors.
///
/// Plain functions and bound methods are covered by [`ClosureCallable`];
/// invokable objects implement the trait themselves. The container treats
/// all of them uniformly.
///
/// [`invoke`]: Callable::invoke
pub trait Callable: Debug + Send + Sync + 'static {
    /// The ordered parameter descriptors of this callable.
    fn parameters(&self) -> &[ParamSpec];

    /// A best-effort source location for diagnostics.
    fn location(&self) -> &str;

    /// Invokes the callable with one argument per descriptor, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency fetched through `injector` fails or
    /// if the body itself fails.
    fn invoke(
        &self,
        injector: &dyn Injector,
        arguments: Vec<Value>,
    ) -> Result<Value, ContainerError>;
}
