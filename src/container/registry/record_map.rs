use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use crate::callable::Callable;
use crate::container::injector::ContainerError;
use crate::container::resolver::Overrides;
use crate::container::Value;

/// How an unbuilt component will be produced on first use.
#[derive(Clone)]
pub enum FactorySource {
    Callable(Arc<dyn Callable>),
    Type(String),
}

/// A registered construction recipe and its argument overrides.
#[derive(Clone)]
pub struct FactoryEntry {
    source: FactorySource,
    overrides: Overrides,
}

impl FactoryEntry {
    pub fn new(source: FactorySource, overrides: Overrides) -> Self {
        Self { source, overrides }
    }

    pub fn source(&self) -> &FactorySource {
        &self.source
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }
}

/// A queued post-activation hook and its argument overrides.
#[derive(Clone)]
pub struct ConfigurationEntry {
    callable: Arc<dyn Callable>,
    overrides: Overrides,
}

impl ConfigurationEntry {
    pub fn new(callable: Arc<dyn Callable>, overrides: Overrides) -> Self {
        Self {
            callable,
            overrides,
        }
    }

    pub fn callable(&self) -> &dyn Callable {
        self.callable.as_ref()
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }
}

#[derive(Default)]
struct ComponentRecord {
    value: Option<Value>,
    factory: Option<FactoryEntry>,
    active: bool,
    pending: Vec<ConfigurationEntry>,
}

/// The per-name lifecycle tables, merged into one record per component so
/// the value, the factory, the activation flag and the pending
/// configurations cannot drift apart.
pub struct RecordMap {
    records: HashMap<String, ComponentRecord>,
}

impl RecordMap {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// True when `name` holds a value or a registered factory.
    pub fn exists(&self, name: &str) -> bool {
        self.records
            .get(name)
            .is_some_and(|record| record.value.is_some() || record.factory.is_some())
    }

    /// True when `name` holds a concrete value, however it got there.
    pub fn is_active(&self, name: &str) -> bool {
        self.records
            .get(name)
            .is_some_and(|record| record.active || record.value.is_some())
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.records
            .get(name)
            .and_then(|record| record.value.clone())
    }

    /// Stores a value for `name`. A present factory is kept but superseded:
    /// value lookup short-circuits it from now on.
    pub fn put_value(&mut self, name: &str, value: Value) {
        self.records.entry(name.to_owned()).or_default().value = Some(value);
    }

    /// Stores a construction recipe, clearing any raw value for `name`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is already active.
    pub fn put_factory(&mut self, name: &str, factory: FactoryEntry) -> Result<(), ContainerError> {
        if self.is_active(name) {
            return Err(ContainerError::AlreadyActive {
                name: name.to_owned(),
            });
        }
        let record = self.records.entry(name.to_owned()).or_default();
        record.value = None;
        record.factory = Some(factory);
        Ok(())
    }

    /// Marks `name` active. Irreversible.
    pub fn mark_active(&mut self, name: &str) {
        self.records.entry(name.to_owned()).or_default().active = true;
    }

    pub fn factory(&self, name: &str) -> Option<FactoryEntry> {
        self.records
            .get(name)
            .and_then(|record| record.factory.clone())
    }

    /// Appends a configuration entry for `name`.
    ///
    /// # Errors
    ///
    /// Fails when `name` has neither a value nor a registered factory.
    pub fn queue_configuration(
        &mut self,
        name: &str,
        entry: ConfigurationEntry,
    ) -> Result<(), ContainerError> {
        if !self.exists(name) {
            return Err(ContainerError::NotFound {
                name: name.to_owned(),
            });
        }
        let Some(record) = self.records.get_mut(name) else {
            unreachable!("`exists` should imply the record is present")
        };
        record.pending.push(entry);
        Ok(())
    }

    /// Returns and clears the pending configuration entries for `name`.
    pub fn drain_configurations(&mut self, name: &str) -> Vec<ConfigurationEntry> {
        self.records
            .get_mut(name)
            .map(|record| mem::take(&mut record.pending))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::callable::{param, ClosureCallable};
    use crate::container::value;

    use super::*;

    fn type_factory(type_name: &str) -> FactoryEntry {
        FactoryEntry::new(FactorySource::Type(type_name.to_owned()), Overrides::new())
    }

    fn entry_with_arity(arity: usize) -> ConfigurationEntry {
        let parameters = (0..arity).map(|i| param(format!("p{i}"))).collect();
        let callable = ClosureCallable::new(parameters, |_injector, _arguments| Ok(value(())));
        ConfigurationEntry::new(Arc::new(callable), Overrides::new())
    }

    #[test]
    fn record_map_exists_succeeds_when_value_or_factory_is_present() {
        let mut records = RecordMap::new();
        assert!(!records.exists("db"));
        assert!(!records.is_active("db"));

        records.put_factory("db", type_factory("Database")).unwrap();
        assert!(records.exists("db"));
        assert!(!records.is_active("db"));

        records.put_value("port", value(5432i32));
        assert!(records.exists("port"));
        assert!(records.is_active("port"));
    }

    #[test]
    fn record_map_put_factory_fails_when_record_is_active() {
        let mut records = RecordMap::new();
        records.put_value("db", value(1i32));

        assert!(matches!(
            records.put_factory("db", type_factory("Database")),
            Err(ContainerError::AlreadyActive { .. })
        ));
    }

    #[test]
    fn record_map_put_factory_replaces_a_previous_recipe() {
        let mut records = RecordMap::new();
        records.put_factory("db", type_factory("Sqlite")).unwrap();
        records.put_factory("db", type_factory("Postgres")).unwrap();

        let factory = records.factory("db").unwrap();
        assert!(matches!(
            factory.source(),
            FactorySource::Type(name) if name == "Postgres"
        ));
    }

    #[test]
    fn record_map_queue_configuration_fails_when_record_is_unknown() {
        let mut records = RecordMap::new();
        assert!(matches!(
            records.queue_configuration("ghost", entry_with_arity(1)),
            Err(ContainerError::NotFound { .. })
        ));
    }

    #[test]
    fn record_map_drain_returns_pending_entries_in_order_and_clears_them() {
        let mut records = RecordMap::new();
        records.put_factory("db", type_factory("Database")).unwrap();
        records
            .queue_configuration("db", entry_with_arity(1))
            .unwrap();
        records
            .queue_configuration("db", entry_with_arity(2))
            .unwrap();

        let drained = records.drain_configurations("db");
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].callable().parameters().len(), 1);
        assert_eq!(drained[1].callable().parameters().len(), 2);

        assert!(records.drain_configurations("db").is_empty());
    }
}
