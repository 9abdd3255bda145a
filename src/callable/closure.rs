use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::panic::Location;

use crate::callable::{Callable, ParamSpec};
use crate::container::injector::{ContainerError, Injector};
use crate::container::Value;

type Body = Box<dyn Fn(&dyn Injector, Vec<Value>) -> Result<Value, ContainerError> + Send + Sync>;

/// A [`Callable`] built from a closure and an explicit descriptor list.
///
/// The construction site is captured as the callable's diagnostic location.
pub struct ClosureCallable {
    parameters: Vec<ParamSpec>,
    location: String,
    body: Body,
}

impl ClosureCallable {
    #[track_caller]
    pub fn new<F>(parameters: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(&dyn Injector, Vec<Value>) -> Result<Value, ContainerError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            location: Location::caller().to_string(),
            body: Box::new(body),
        }
    }

    /// A callable with no declared parameters, for bodies that fetch what
    /// they need from the injector directly.
    #[track_caller]
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(&dyn Injector, Vec<Value>) -> Result<Value, ContainerError> + Send + Sync + 'static,
    {
        Self::new(Vec::new(), body)
    }
}

impl Debug for ClosureCallable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClosureCallable")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Callable for ClosureCallable {
    fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn invoke(
        &self,
        injector: &dyn Injector,
        arguments: Vec<Value>,
    ) -> Result<Value, ContainerError> {
        (self.body)(injector, arguments)
    }
}
