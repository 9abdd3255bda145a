use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, Sender};
use parking_lot::{RwLock, RwLockWriteGuard};

use crate::callable::{Callable, ClosureCallable};
use crate::catalog::TypeCatalog;
use crate::container::injector::{ContainerError, Injector};
use crate::container::registry::{
    ConfigurationEntry, FactoryEntry, FactorySource, RecordMap, Source,
};
use crate::container::resolver::{self, Overrides};
use crate::container::Value;
use crate::util::any::DowncastRef;

pub(super) struct ContainerCore {
    state: RwLock<SharedComponentData>,
    catalog: Arc<dyn TypeCatalog>,
}

impl ContainerCore {
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            state: RwLock::new(SharedComponentData::new()),
            catalog,
        }
    }

    pub fn register(
        &self,
        name: &str,
        source: Source,
        overrides: Overrides,
    ) -> Result<(), ContainerError> {
        let source = match source {
            Source::Factory(callable) => FactorySource::Callable(Arc::from(callable)),
            Source::Type(type_name) => FactorySource::Type(type_name),
            Source::SelfNamed => FactorySource::Type(name.to_owned()),
        };
        let mut state = self.state.write();
        state
            .records
            .put_factory(name, FactoryEntry::new(source, overrides))
    }

    pub fn set(&self, name: &str, value: Value) -> Result<(), ContainerError> {
        let pending = {
            let mut state = self.state.write();
            if state.records.is_active(name) {
                return Err(ContainerError::AlreadyActive {
                    name: name.to_owned(),
                });
            }
            state.records.put_value(name, value);
            state.records.mark_active(name);
            state.records.drain_configurations(name)
        };
        self.apply_configurations(name, pending)
    }

    pub fn configure(
        &self,
        name: &str,
        entry: Box<dyn Callable>,
        overrides: Overrides,
    ) -> Result<(), ContainerError> {
        let entry = ConfigurationEntry::new(Arc::from(entry), overrides);
        let mut state = self.state.write();
        if state.records.is_active(name) {
            drop(state);
            self.apply_configuration(name, &entry)
        } else {
            state.records.queue_configuration(name, entry)
        }
    }

    pub fn alias(&self, name: &str, target: &str) -> Result<(), ContainerError> {
        let target = target.to_owned();
        let factory = ClosureCallable::from_fn(move |injector, _arguments| injector.get(&target));
        self.register(name, Source::Factory(Box::new(factory)), Overrides::new())
    }

    pub fn call(
        &self,
        callable: &dyn Callable,
        overrides: &Overrides,
    ) -> Result<Value, ContainerError> {
        let arguments =
            resolver::resolve_arguments(self, callable.parameters(), overrides, callable.location())?;
        callable.invoke(self, arguments)
    }

    pub fn construct(
        &self,
        type_name: &str,
        overrides: &Overrides,
    ) -> Result<Value, ContainerError> {
        let spec = match self.catalog.describe(type_name) {
            Some(spec) if spec.is_constructible() => spec,
            Some(_) => {
                return Err(ContainerError::NotConstructible {
                    type_name: type_name.to_owned(),
                })
            }
            None => {
                return Err(ContainerError::TypeNotFound {
                    type_name: type_name.to_owned(),
                })
            }
        };
        let arguments =
            resolver::resolve_arguments(self, spec.parameters(), overrides, spec.location())?;
        self.catalog.construct(type_name, arguments)
    }

    /// Pre-activates `name` with `value` during container bootstrap.
    pub fn install_bootstrap(&self, name: &str, value: Value) {
        let mut state = self.state.write();
        state.records.put_value(name, value);
        state.records.mark_active(name);
    }

    fn get_value(&self, name: &str) -> Result<Value, ContainerError> {
        if let Some(value) = self.try_get_active_value(name) {
            return Ok(value);
        }
        self.get_inactive_value(name)
    }

    fn try_get_active_value(&self, name: &str) -> Option<Value> {
        self.state.read().records.value(name)
    }

    fn get_inactive_value(&self, name: &str) -> Result<Value, ContainerError> {
        let mut state = self.state.write();
        if let Some(value) = state.records.value(name) {
            return Ok(value);
        }

        if let Some(context) = state.activating.get_mut(name) {
            if context.is_activating_on_current_thread() {
                Err(self.stop_activation_on_cyclic_dependency(state, name))
            } else {
                self.wait_for_activated_value(state, name)
            }
        } else {
            match state.records.factory(name) {
                Some(factory) => self.activate_value(state, name, factory),
                None => Err(ContainerError::NotFound {
                    name: name.to_owned(),
                }),
            }
        }
    }

    fn stop_activation_on_cyclic_dependency(
        &self,
        state: RwLockWriteGuard<SharedComponentData>,
        name: &str,
    ) -> ContainerError {
        let err = ContainerError::CyclicDependency {
            name: name.to_owned(),
        };
        self.notify_waiters(state, name, WaitResponse::Error(err.clone()));
        err
    }

    fn wait_for_activated_value(
        &self,
        state: RwLockWriteGuard<SharedComponentData>,
        name: &str,
    ) -> Result<Value, ContainerError> {
        let receiver = self.register_waiter(state, name);
        self.get_value_on_response(receiver, name)
    }

    fn register_waiter(
        &self,
        mut state: RwLockWriteGuard<SharedComponentData>,
        name: &str,
    ) -> Receiver<WaitResponse> {
        let (sender, receiver) = oneshot::channel();
        let Some(context) = state.activating.get_mut(name) else {
            unreachable!("whether the activation is in flight should be checked before calling this method")
        };
        context.register_waiter(sender);
        receiver
    }

    fn get_value_on_response(
        &self,
        receiver: Receiver<WaitResponse>,
        name: &str,
    ) -> Result<Value, ContainerError> {
        match receiver.recv() {
            Ok(WaitResponse::Activated) => {
                let state = self.state.read();
                let Some(value) = state.records.value(name) else {
                    unreachable!("the value should already be stored by the activating thread")
                };
                Ok(value)
            }
            Ok(WaitResponse::Error(err)) => Err(err),
            Err(_) => unreachable!("the peer should send a message"),
        }
    }

    fn activate_value(
        &self,
        mut state: RwLockWriteGuard<SharedComponentData>,
        name: &str,
        factory: FactoryEntry,
    ) -> Result<Value, ContainerError> {
        let on_thread = thread::current().id();
        state
            .activating
            .insert(name.to_owned(), ActivatingContext::new(on_thread));
        drop(state);

        match self.build_value(&factory) {
            Ok(value) => self.finish_activation(name, value),
            Err(err) => {
                let state = self.state.write();
                self.notify_waiters(state, name, WaitResponse::Error(err.clone()));
                Err(err)
            }
        }
    }

    fn build_value(&self, factory: &FactoryEntry) -> Result<Value, ContainerError> {
        match factory.source() {
            FactorySource::Callable(callable) => {
                let arguments = resolver::resolve_arguments(
                    self,
                    callable.parameters(),
                    factory.overrides(),
                    callable.location(),
                )?;
                callable.invoke(self, arguments)
            }
            FactorySource::Type(type_name) => self.construct(type_name, factory.overrides()),
        }
    }

    fn finish_activation(&self, name: &str, value: Value) -> Result<Value, ContainerError> {
        let pending = {
            let mut state = self.state.write();
            state.records.put_value(name, value);
            state.records.mark_active(name);
            state.records.drain_configurations(name)
        };

        // Configuration entries run outside the lock so they may resolve
        // other components.
        match self.apply_configurations(name, pending) {
            Ok(()) => {
                let value = self.stored_value(name)?;
                let state = self.state.write();
                self.notify_waiters(state, name, WaitResponse::Activated);
                Ok(value)
            }
            Err(err) => {
                let state = self.state.write();
                self.notify_waiters(state, name, WaitResponse::Error(err.clone()));
                Err(err)
            }
        }
    }

    fn apply_configurations(
        &self,
        name: &str,
        entries: Vec<ConfigurationEntry>,
    ) -> Result<(), ContainerError> {
        for entry in &entries {
            self.apply_configuration(name, entry)?;
        }
        Ok(())
    }

    fn apply_configuration(
        &self,
        name: &str,
        entry: &ConfigurationEntry,
    ) -> Result<(), ContainerError> {
        let current = self.stored_value(name)?;
        let callable = entry.callable();
        let arguments = resolver::resolve_configuration_arguments(
            self,
            callable.parameters(),
            entry.overrides(),
            callable.location(),
            current,
        )?;
        let result = callable.invoke(self, arguments)?;
        if !result.is::<()>() {
            self.state.write().records.put_value(name, result);
        }
        Ok(())
    }

    fn stored_value(&self, name: &str) -> Result<Value, ContainerError> {
        self.state
            .read()
            .records
            .value(name)
            .ok_or_else(|| ContainerError::NotFound {
                name: name.to_owned(),
            })
    }

    fn notify_waiters(
        &self,
        mut state: RwLockWriteGuard<SharedComponentData>,
        name: &str,
        response: WaitResponse,
    ) {
        if let Some(context) = state.activating.remove(name) {
            drop(state);
            context.notify(response);
        }
    }
}

impl Injector for ContainerCore {
    fn get(&self, name: &str) -> Result<Value, ContainerError> {
        self.get_value(name)
    }

    fn has(&self, name: &str) -> bool {
        self.state.read().records.exists(name)
    }

    fn is_active(&self, name: &str) -> bool {
        self.state.read().records.is_active(name)
    }
}

struct SharedComponentData {
    records: RecordMap,
    activating: HashMap<String, ActivatingContext>,
}

impl SharedComponentData {
    fn new() -> Self {
        Self {
            records: RecordMap::new(),
            activating: HashMap::new(),
        }
    }
}

struct ActivatingContext {
    on_thread: ThreadId,
    waiters: Vec<Sender<WaitResponse>>,
}

impl ActivatingContext {
    fn new(on_thread: ThreadId) -> Self {
        Self {
            on_thread,
            waiters: Vec::new(),
        }
    }

    fn is_activating_on_current_thread(&self) -> bool {
        thread::current().id() == self.on_thread
    }

    fn register_waiter(&mut self, sender: Sender<WaitResponse>) {
        self.waiters.push(sender);
    }

    fn notify(self, response: WaitResponse) {
        for sender in self.waiters {
            let _ = sender.send(response.clone());
        }
    }
}

#[derive(Clone, Debug)]
enum WaitResponse {
    Activated,
    Error(ContainerError),
}
