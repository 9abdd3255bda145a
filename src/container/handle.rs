use std::sync::{Arc, Weak};

use crate::callable::Callable;
use crate::catalog::{TypeCatalog, TypeTable};
use crate::container::core::ContainerCore;
use crate::container::injector::{ContainerError, Injector};
use crate::container::registry::{Registrar, Source};
use crate::container::resolver::Overrides;
use crate::container::Value;
use crate::lazy::Lazy;
use crate::provider::Provider;

/// Names the container pre-activates itself under: its own type name and its
/// two capability names.
const SELF_NAMES: [&str; 3] = ["Container", "Injector", "Registrar"];

/// The public facade: a cloneable handle over the container engine.
///
/// A fresh container stores a [`ContainerRef`] to itself under each of the
/// names in `SELF_NAMES`, pre-activated, so components may depend on the
/// container like on any other component.
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    /// Creates a container with an empty type catalog.
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(TypeTable::new()))
    }

    /// Creates a container that builds catalog types through `catalog`.
    pub fn with_catalog(catalog: Arc<dyn TypeCatalog>) -> Self {
        let core = Arc::new(ContainerCore::new(catalog));
        let container = Self { core };
        container.register_self_handles();
        container
    }

    fn register_self_handles(&self) {
        let value: Value = Arc::new(ContainerRef {
            core: Arc::downgrade(&self.core),
        });
        for name in SELF_NAMES {
            self.core.install_bootstrap(name, Arc::clone(&value));
        }
    }

    /// Resolves `callable`'s own parameters against `overrides` and invokes
    /// it.
    ///
    /// # Errors
    ///
    /// Fails when a parameter cannot be resolved or the callable fails.
    pub fn call(
        &self,
        callable: &dyn Callable,
        overrides: &Overrides,
    ) -> Result<Value, ContainerError> {
        self.core.call(callable, overrides)
    }

    /// Constructs an instance of the catalog type `type_name`, resolving its
    /// constructor parameters against `overrides`.
    ///
    /// # Errors
    ///
    /// Fails when the type is unknown or not constructible, or when a
    /// constructor parameter cannot be resolved.
    pub fn create(
        &self,
        type_name: &str,
        overrides: &Overrides,
    ) -> Result<Value, ContainerError> {
        self.core.construct(type_name, overrides)
    }

    /// Produces a boxed reference to `name`: a [`Lazy`] that fetches the
    /// component only when consumed as an argument, never at call time.
    pub fn lazy_ref(&self, name: &str) -> Lazy {
        Lazy::component(name)
    }

    /// Applies a provider package's registrations to this container.
    ///
    /// # Errors
    ///
    /// Propagates the package's first registration failure.
    pub fn install(&self, provider: &dyn Provider) -> Result<(), ContainerError> {
        provider.register(self)
    }
}

impl Injector for Container {
    fn get(&self, name: &str) -> Result<Value, ContainerError> {
        self.core.get(name)
    }

    fn has(&self, name: &str) -> bool {
        self.core.has(name)
    }

    fn is_active(&self, name: &str) -> bool {
        self.core.is_active(name)
    }
}

impl Registrar for Container {
    fn register(
        &self,
        name: &str,
        source: Source,
        overrides: Overrides,
    ) -> Result<(), ContainerError> {
        self.core.register(name, source, overrides)
    }

    fn set(&self, name: &str, value: Value) -> Result<(), ContainerError> {
        self.core.set(name, value)
    }

    fn configure(
        &self,
        name: &str,
        entry: Box<dyn Callable>,
        overrides: Overrides,
    ) -> Result<(), ContainerError> {
        self.core.configure(name, entry, overrides)
    }

    fn alias(&self, name: &str, target: &str) -> Result<(), ContainerError> {
        self.core.alias(name, target)
    }
}

/// Pre-activated handle stored under the container's own names.
///
/// Holds the engine weakly so the registry does not keep its owner alive.
#[derive(Clone)]
pub struct ContainerRef {
    core: Weak<ContainerCore>,
}

impl ContainerRef {
    /// Returns the owning container, or `None` once it has been dropped.
    pub fn container(&self) -> Option<Container> {
        self.core.upgrade().map(|core| Container { core })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::callable::{param, ClosureCallable};
    use crate::container::injector::TypedInjector;
    use crate::container::value;
    use crate::util::any::DowncastRef;

    use super::*;

    fn int_factory(result: i32) -> ClosureCallable {
        ClosureCallable::from_fn(move |_injector, _arguments| Ok(value(result)))
    }

    #[test]
    fn container_get_fails_when_name_was_never_registered() {
        let container = Container::new();
        assert!(!container.has("missing"));
        assert!(!container.is_active("missing"));
        assert!(matches!(
            container.get("missing"),
            Err(ContainerError::NotFound { .. })
        ));
    }

    #[test]
    fn container_get_returns_the_same_value_on_every_call() {
        let container = Container::new();
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&counter);
            let factory = ClosureCallable::from_fn(move |_injector, _arguments| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(value(String::from("shared")))
            });
            container
                .register("greeting", Source::factory(factory), Overrides::new())
                .unwrap();
        }
        assert!(container.has("greeting"));
        assert!(!container.is_active("greeting"));

        let first = container.get("greeting").unwrap();
        let second = container.get("greeting").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(container.is_active("greeting"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_register_and_set_fail_when_component_is_active() {
        let container = Container::new();
        container
            .register("port", Source::factory(int_factory(8080)), Overrides::new())
            .unwrap();
        let _ = container.get("port").unwrap();

        assert!(matches!(
            container.register("port", Source::factory(int_factory(1)), Overrides::new()),
            Err(ContainerError::AlreadyActive { .. })
        ));
        assert!(matches!(
            container.set("port", value(1i32)),
            Err(ContainerError::AlreadyActive { .. })
        ));
    }

    #[test]
    fn container_call_applies_the_full_resolution_precedence() {
        let container = Container::new();
        container.set("b", value(5i32)).unwrap();
        container
            .register("Gauge", Source::factory(int_factory(7)), Overrides::new())
            .unwrap();

        let callable = ClosureCallable::new(
            vec![
                param("a"),
                param("b"),
                param("c").of_type("Gauge"),
                param("d").with_default(9i32),
            ],
            |_injector, arguments| {
                let a = arguments[0].downcast_ref::<&str>().copied().unwrap_or("?");
                let b = arguments[1].downcast_ref::<i32>().copied().unwrap_or(-1);
                let c = arguments[2].downcast_ref::<i32>().copied().unwrap_or(-1);
                let d = arguments[3].downcast_ref::<i32>().copied().unwrap_or(-1);
                Ok(value(format!("{a}-{b}-{c}-{d}")))
            },
        );
        let overrides = Overrides::new().at(0, "pos0").with("a", "named-a");

        let res = container.call(&callable, &overrides).unwrap();
        assert_eq!(
            res.downcast_ref::<String>().map(String::as_str),
            Some("named-a-5-7-9")
        );
    }

    #[test]
    fn container_lazy_ref_defers_activation_until_consumed() {
        let container = Container::new();
        let activations = Arc::new(AtomicUsize::new(0));
        {
            let activations = Arc::clone(&activations);
            let factory = ClosureCallable::from_fn(move |_injector, _arguments| {
                activations.fetch_add(1, Ordering::SeqCst);
                Ok(value(99i32))
            });
            container
                .register("expensive", Source::factory(factory), Overrides::new())
                .unwrap();
        }

        let overrides = Overrides::new().with("dep", container.lazy_ref("expensive"));
        assert_eq!(activations.load(Ordering::SeqCst), 0);

        let callable = ClosureCallable::new(vec![param("dep")], |_injector, arguments| {
            Ok(arguments.into_iter().next().unwrap_or(value(())))
        });
        let res = container.call(&callable, &overrides).unwrap();
        assert_eq!(res.downcast_ref::<i32>(), Some(&99));
        assert_eq!(activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn container_configure_applies_immediately_when_component_is_active() {
        let container = Container::new();
        container.set("flagged", value(1i32)).unwrap();

        let seen = Arc::new(AtomicBool::new(false));
        let entry = {
            let seen = Arc::clone(&seen);
            ClosureCallable::new(vec![param("flagged")], move |_injector, _arguments| {
                seen.store(true, Ordering::SeqCst);
                Ok(value(()))
            })
        };
        container
            .configure("flagged", Box::new(entry), Overrides::new())
            .unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn container_set_drains_configurations_queued_before_activation() {
        let container = Container::new();
        container
            .register("seed", Source::factory(int_factory(1)), Overrides::new())
            .unwrap();
        let increment = ClosureCallable::new(vec![param("seed")], |_injector, arguments| {
            let current = arguments[0].downcast_ref::<i32>().copied().unwrap_or(0);
            Ok(value(current + 1))
        });
        container
            .configure("seed", Box::new(increment), Overrides::new())
            .unwrap();

        container.set("seed", value(10i32)).unwrap();
        assert_eq!(
            container.get("seed").unwrap().downcast_ref::<i32>(),
            Some(&11)
        );
    }

    #[test]
    fn container_alias_fetches_its_target_lazily() {
        let container = Container::new();
        let activations = Arc::new(AtomicUsize::new(0));
        {
            let activations = Arc::clone(&activations);
            let factory = ClosureCallable::from_fn(move |_injector, _arguments| {
                activations.fetch_add(1, Ordering::SeqCst);
                Ok(value(42i32))
            });
            container
                .register("real", Source::factory(factory), Overrides::new())
                .unwrap();
        }

        container.alias("shortcut", "real").unwrap();
        assert_eq!(activations.load(Ordering::SeqCst), 0);

        let through_alias = container.get("shortcut").unwrap();
        assert_eq!(through_alias.downcast_ref::<i32>(), Some(&42));
        assert_eq!(activations.load(Ordering::SeqCst), 1);

        let direct = container.get("real").unwrap();
        assert!(Arc::ptr_eq(&through_alias, &direct));
    }

    #[test]
    fn container_create_fails_when_type_is_unknown_or_abstract() {
        let catalog = TypeTable::new()
            .define(
                "Logger",
                vec![param("level").with_default(3i32)],
                |arguments| {
                    let level = arguments[0].downcast_ref::<i32>().copied().unwrap_or(0);
                    Ok(value(level))
                },
            )
            .define_abstract("Sink", Vec::new());
        let container = Container::with_catalog(Arc::new(catalog));

        assert!(matches!(
            container.create("Ghost", &Overrides::new()),
            Err(ContainerError::TypeNotFound { .. })
        ));
        assert!(matches!(
            container.create("Sink", &Overrides::new()),
            Err(ContainerError::NotConstructible { .. })
        ));

        let built = container.create("Logger", &Overrides::new()).unwrap();
        assert_eq!(built.downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn container_register_builds_catalog_types_on_first_use() {
        let catalog = TypeTable::new().define(
            "Logger",
            vec![param("level").with_default(3i32)],
            |arguments| {
                let level = arguments[0].downcast_ref::<i32>().copied().unwrap_or(0);
                Ok(value(level))
            },
        );
        let container = Container::with_catalog(Arc::new(catalog));

        container
            .register("Logger", Source::SelfNamed, Overrides::new())
            .unwrap();
        assert_eq!(
            container.get("Logger").unwrap().downcast_ref::<i32>(),
            Some(&3)
        );

        container
            .register(
                "log",
                Source::of_type("Logger"),
                Overrides::new().with("level", 8i32),
            )
            .unwrap();
        assert_eq!(container.get("log").unwrap().downcast_ref::<i32>(), Some(&8));
    }

    #[test]
    fn container_registers_itself_under_its_own_names() {
        let container = Container::new();
        for name in SELF_NAMES {
            assert!(container.is_active(name));
        }

        let this = container.get_as::<ContainerRef>("Injector").unwrap();
        let owner = this.container().expect("the container should still be alive");
        owner.set("port", value(8080i32)).unwrap();
        assert_eq!(
            container.get("port").unwrap().downcast_ref::<i32>(),
            Some(&8080)
        );

        assert!(matches!(
            container.set("Container", value(())),
            Err(ContainerError::AlreadyActive { .. })
        ));
    }

    #[test]
    fn container_get_as_fails_when_types_differ() {
        let container = Container::new();
        container.set("port", value(8080i32)).unwrap();

        assert!(matches!(
            container.get_as::<String>("port"),
            Err(ContainerError::WrongType { .. })
        ));
        assert_eq!(*container.get_as::<i32>("port").unwrap(), 8080);
    }
}
