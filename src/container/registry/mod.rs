mod record_map;

use crate::callable::Callable;
use crate::container::injector::ContainerError;
use crate::container::resolver::Overrides;
use crate::container::Value;

pub(super) use record_map::{ConfigurationEntry, FactoryEntry, FactorySource, RecordMap};

/// Mutating half of the container surface.
///
/// Object-safe so providers and embedders can hold the registration surface
/// as a trait object.
pub trait Registrar: Send + Sync {
    /// Binds `name` to a construction recipe without building anything.
    ///
    /// Replaces any previous recipe and clears a raw value stored for the
    /// name. Nothing is constructed until the first [`get`].
    ///
    /// [`get`]: crate::container::injector::Injector::get
    ///
    /// # Errors
    ///
    /// Fails when `name` is already active.
    fn register(
        &self,
        name: &str,
        source: Source,
        overrides: Overrides,
    ) -> Result<(), ContainerError>;

    /// Injects a precomputed value, activating `name` immediately. Pending
    /// configuration entries for `name` drain and apply at this point, since
    /// this is the component's activation.
    ///
    /// # Errors
    ///
    /// Fails when `name` is already active.
    fn set(&self, name: &str, value: Value) -> Result<(), ContainerError>;

    /// Queues a configuration entry, or applies it immediately when `name`
    /// is already active.
    ///
    /// The entry's first declared parameter receives the component value;
    /// the remaining descriptors resolve like any callable's, with
    /// positional override keys counted from zero over those remaining
    /// descriptors. A non-`()` return value replaces the stored component
    /// value.
    ///
    /// # Errors
    ///
    /// Fails when `name` has neither a value nor a registered factory.
    fn configure(
        &self,
        name: &str,
        entry: Box<dyn Callable>,
        overrides: Overrides,
    ) -> Result<(), ContainerError>;

    /// Registers `name` as a lazily-fetched synonym for `target`. The target
    /// is fetched on first use of `name`, not at definition time.
    ///
    /// # Errors
    ///
    /// Fails when `name` is already active.
    fn alias(&self, name: &str, target: &str) -> Result<(), ContainerError>;
}

/// What `register` builds when the component is first requested.
#[derive(Debug)]
pub enum Source {
    /// Invoke this callable as the factory.
    Factory(Box<dyn Callable>),
    /// Construct the named catalog type.
    Type(String),
    /// Construct the component's own name as a catalog type.
    SelfNamed,
}

impl Source {
    pub fn factory(callable: impl Callable) -> Self {
        Self::Factory(Box::new(callable))
    }

    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self::Type(type_name.into())
    }
}
