use std::collections::HashMap;
use std::sync::Arc;

use crate::callable::ParamSpec;
use crate::container::injector::{ContainerError, Injector};
use crate::container::{Managed, Value};
use crate::lazy::Lazy;
use crate::util::any::DowncastRef;

/// Mixed positional and named argument overrides for one callable.
///
/// Entries keyed by parameter name take precedence over entries keyed by
/// zero-based position for the same slot.
#[derive(Clone, Default)]
pub struct Overrides {
    by_name: HashMap<String, Value>,
    by_index: HashMap<usize, Value>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies `value` for the parameter called `name`.
    pub fn with<T: Managed>(self, name: impl Into<String>, value: T) -> Self {
        let value: Value = Arc::new(value);
        self.with_value(name, value)
    }

    /// Supplies `value` for the parameter at `index`.
    pub fn at<T: Managed>(self, index: usize, value: T) -> Self {
        let value: Value = Arc::new(value);
        self.at_value(index, value)
    }

    /// Like [`Overrides::with`], for an already-erased value.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.by_name.insert(name.into(), value);
        self
    }

    /// Like [`Overrides::at`], for an already-erased value.
    pub fn at_value(mut self, index: usize, value: Value) -> Self {
        self.by_index.insert(index, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_index.is_empty()
    }

    fn for_name(&self, name: &str) -> Option<&Value> {
        self.by_name.get(name)
    }

    fn for_index(&self, index: usize) -> Option<&Value> {
        self.by_index.get(&index)
    }
}

/// Produces one positional argument per descriptor in `parameters`.
///
/// Each parameter is satisfied by the first source that matches: a named
/// override, a positional override, a registry component under the declared
/// type name, a registry component under the parameter name, and finally the
/// declared default. An explicitly supplied override wins even when a
/// registry lookup could have satisfied the slot. A [`Lazy`] selected by any
/// source expands exactly once before it is placed in the argument list.
pub(crate) fn resolve_arguments(
    injector: &dyn Injector,
    parameters: &[ParamSpec],
    overrides: &Overrides,
    location: &str,
) -> Result<Vec<Value>, ContainerError> {
    let mut arguments = Vec::with_capacity(parameters.len());
    for (index, parameter) in parameters.iter().enumerate() {
        arguments.push(resolve_parameter(
            injector, parameter, index, overrides, location,
        )?);
    }
    Ok(arguments)
}

/// Variant for configuration entries: the component's current value is bound
/// to the first declared slot, and the remaining descriptors resolve
/// normally, with positional override keys counted from zero over them.
pub(crate) fn resolve_configuration_arguments(
    injector: &dyn Injector,
    parameters: &[ParamSpec],
    overrides: &Overrides,
    location: &str,
    current: Value,
) -> Result<Vec<Value>, ContainerError> {
    let rest = parameters.get(1..).unwrap_or_default();
    let mut arguments = Vec::with_capacity(rest.len() + 1);
    arguments.push(current);
    arguments.extend(resolve_arguments(injector, rest, overrides, location)?);
    Ok(arguments)
}

fn resolve_parameter(
    injector: &dyn Injector,
    parameter: &ParamSpec,
    index: usize,
    overrides: &Overrides,
    location: &str,
) -> Result<Value, ContainerError> {
    let selected = select_value(injector, parameter, index, overrides, location)?;
    expand_if_deferred(injector, selected)
}

fn select_value(
    injector: &dyn Injector,
    parameter: &ParamSpec,
    index: usize,
    overrides: &Overrides,
    location: &str,
) -> Result<Value, ContainerError> {
    if let Some(value) = overrides.for_name(parameter.name()) {
        return Ok(value.clone());
    }
    if let Some(value) = overrides.for_index(index) {
        return Ok(value.clone());
    }
    if let Some(type_name) = parameter.type_name() {
        if injector.has(type_name) {
            return injector.get(type_name);
        }
    }
    if injector.has(parameter.name()) {
        return injector.get(parameter.name());
    }
    if let Some(default) = parameter.default_value() {
        return Ok(default.clone());
    }
    Err(ContainerError::Unresolved {
        parameter: parameter.name().to_owned(),
        declared_type: parameter.type_name().map(str::to_owned),
        location: location.to_owned(),
    })
}

fn expand_if_deferred(injector: &dyn Injector, selected: Value) -> Result<Value, ContainerError> {
    match selected.downcast_ref::<Lazy>() {
        Some(lazy) => lazy.expand(injector),
        None => Ok(selected),
    }
}
