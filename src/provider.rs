use crate::container::injector::ContainerError;
use crate::container::Container;

/// A packaged set of registrations applied to a container as one unit.
///
/// Providers call back into the container through its public surface; they
/// carry no machinery of their own.
pub trait Provider {
    /// Applies this package's registrations to `container`.
    ///
    /// # Errors
    ///
    /// Propagates any registration failure unchanged.
    fn register(&self, container: &Container) -> Result<(), ContainerError>;
}
