use std::collections::HashMap;
use std::panic::Location;

use crate::callable::ParamSpec;
use crate::container::injector::ContainerError;
use crate::container::Value;

/// Describes the constructor of one nameable type: its ordered parameter
/// descriptors, a diagnostic location, and whether the type can actually be
/// instantiated (abstract types are describable but not constructible).
#[derive(Debug)]
pub struct ConstructorSpec {
    parameters: Vec<ParamSpec>,
    location: String,
    constructible: bool,
}

impl ConstructorSpec {
    #[track_caller]
    pub fn new(parameters: Vec<ParamSpec>) -> Self {
        Self {
            parameters,
            location: Location::caller().to_string(),
            constructible: true,
        }
    }

    #[track_caller]
    pub fn new_abstract(parameters: Vec<ParamSpec>) -> Self {
        Self {
            parameters,
            location: Location::caller().to_string(),
            constructible: false,
        }
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_constructible(&self) -> bool {
        self.constructible
    }
}

/// The object-construction primitive: maps type names to constructor
/// descriptions and builds instances from resolved argument lists.
///
/// The resolver never consults the catalog; declaring a type name on a
/// parameter only ever triggers a registry lookup by that name.
pub trait TypeCatalog: Send + Sync {
    /// Returns the constructor description for `type_name`, or `None` when
    /// the catalog does not know the type.
    fn describe(&self, type_name: &str) -> Option<&ConstructorSpec>;

    /// Builds an instance of `type_name` from an argument list matching its
    /// constructor descriptors.
    ///
    /// # Errors
    ///
    /// Fails when the type is unknown, not constructible, or its builder
    /// fails.
    fn construct(&self, type_name: &str, arguments: Vec<Value>) -> Result<Value, ContainerError>;
}

type Build = Box<dyn Fn(Vec<Value>) -> Result<Value, ContainerError> + Send + Sync>;

/// Descriptor-table implementation of [`TypeCatalog`].
///
/// Callers enumerate their constructible types explicitly; an entry defined
/// through [`TypeTable::define_abstract`] is describable but refuses
/// construction.
#[derive(Default)]
pub struct TypeTable {
    entries: HashMap<String, TypeEntry>,
}

struct TypeEntry {
    spec: ConstructorSpec,
    build: Option<Build>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    pub fn define<F>(
        mut self,
        type_name: impl Into<String>,
        parameters: Vec<ParamSpec>,
        build: F,
    ) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ContainerError> + Send + Sync + 'static,
    {
        let entry = TypeEntry {
            spec: ConstructorSpec::new(parameters),
            build: Some(Box::new(build)),
        };
        self.entries.insert(type_name.into(), entry);
        self
    }

    #[track_caller]
    pub fn define_abstract(mut self, type_name: impl Into<String>, parameters: Vec<ParamSpec>) -> Self {
        let entry = TypeEntry {
            spec: ConstructorSpec::new_abstract(parameters),
            build: None,
        };
        self.entries.insert(type_name.into(), entry);
        self
    }
}

impl TypeCatalog for TypeTable {
    fn describe(&self, type_name: &str) -> Option<&ConstructorSpec> {
        self.entries.get(type_name).map(|entry| &entry.spec)
    }

    fn construct(&self, type_name: &str, arguments: Vec<Value>) -> Result<Value, ContainerError> {
        let Some(entry) = self.entries.get(type_name) else {
            return Err(ContainerError::TypeNotFound {
                type_name: type_name.to_owned(),
            });
        };
        match &entry.build {
            Some(build) => build(arguments),
            None => Err(ContainerError::NotConstructible {
                type_name: type_name.to_owned(),
            }),
        }
    }
}
