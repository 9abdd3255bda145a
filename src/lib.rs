#![allow(clippy::new_without_default)]

pub mod callable;
pub mod catalog;
pub mod container;
pub mod lazy;
pub mod provider;
mod util;

pub mod prelude {
    pub use crate::callable::{param, Callable, ClosureCallable, ParamSpec};
    pub use crate::catalog::{ConstructorSpec, TypeCatalog, TypeTable};
    pub use crate::container::injector::{ContainerError, Injector, TypedInjector};
    pub use crate::container::registry::{Registrar, Source};
    pub use crate::container::resolver::Overrides;
    pub use crate::container::{
        value, Container, ContainerRef, DowncastArc, DowncastRef, Managed, Value,
    };
    pub use crate::lazy::Lazy;
    pub use crate::provider::Provider;
}
