use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::container::{Managed, Value};
use crate::util::any::{AsAny, DowncastArc};

/// Read-side view of a container: lookups and pure queries.
///
/// The resolver consumes exactly this surface, which keeps the resolution
/// algorithm testable against a mocked registry view.
#[cfg_attr(test, mockall::automock)]
pub trait Injector: Send + Sync {
    /// Returns the value bound to `name`, activating the component first if
    /// it has not been built yet. Once active, every call returns the same
    /// shared value without re-resolution.
    ///
    /// # Errors
    ///
    /// Fails when `name` holds neither a value nor a registered factory, or
    /// when activation fails.
    fn get(&self, name: &str) -> Result<Value, ContainerError>;

    /// Returns true when `name` holds a value or a registered factory.
    fn has(&self, name: &str) -> bool;

    /// Returns true when `name` already holds a concrete value.
    fn is_active(&self, name: &str) -> bool;
}

/// Typed convenience over [`Injector`].
pub trait TypedInjector: Injector {
    /// Fetches `name` and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Fails like [`Injector::get`], or with a wrong-type error when the
    /// stored value is not a `T`.
    fn get_as<T>(&self, name: &str) -> Result<Arc<T>, ContainerError>
    where
        T: Managed,
    {
        match self.get(name)?.downcast_arc::<T>() {
            Ok(object) => Ok(object),
            Err(value) => Err(ContainerError::WrongType {
                name: name.to_owned(),
                expected: std::any::type_name::<T>(),
                actual: value.as_ref().type_name(),
            }),
        }
    }
}

impl<T> TypedInjector for T where T: Injector + ?Sized {}

#[derive(Clone, Debug, Snafu)]
#[non_exhaustive]
pub enum ContainerError {
    #[snafu(display("no component is registered under the name `{name}`"))]
    #[non_exhaustive]
    NotFound { name: String },
    #[snafu(display("the component `{name}` is already active and can no longer be replaced"))]
    #[non_exhaustive]
    AlreadyActive { name: String },
    #[snafu(display(
        "could not resolve the parameter `{parameter}` of declared type `{}` required by the callable at {location}",
        declared_type.as_deref().unwrap_or("<none>"),
    ))]
    #[non_exhaustive]
    Unresolved {
        parameter: String,
        declared_type: Option<String>,
        location: String,
    },
    #[snafu(display("could not activate the component `{name}` which depends on itself somehow"))]
    #[non_exhaustive]
    CyclicDependency { name: String },
    #[snafu(display("the type `{type_name}` is unknown to the catalog"))]
    #[non_exhaustive]
    TypeNotFound { type_name: String },
    #[snafu(display("the type `{type_name}` is known but cannot be instantiated"))]
    #[non_exhaustive]
    NotConstructible { type_name: String },
    #[snafu(display("the component `{name}` holds a `{actual}` where a `{expected}` was requested"))]
    #[non_exhaustive]
    WrongType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[snafu(display("the callable at {location} failed"))]
    #[non_exhaustive]
    Construction {
        location: String,
        source: Arc<dyn Error + Send + Sync>,
    },
}

impl ContainerError {
    /// Wraps a callable body's own failure with its diagnostic location.
    pub fn construction(
        location: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Construction {
            location: location.into(),
            source: Arc::from(source.into()),
        }
    }
}
