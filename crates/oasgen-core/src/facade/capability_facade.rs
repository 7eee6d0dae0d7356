//! Registry-backed implementation of the container contract.

use super::contract::{ContainerContract, PostProcessor, ValueResolver};
use crate::config::DocumentConfig;
use crate::discovery::TypeHandle;
use crate::error::{GeneratorError, Result};
use crate::metadata::Tag;
use crate::registry::{BeanLookup, Instance};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

/// Satisfies [`ContainerContract`] with nothing but a bean registry.
///
/// Lookup operations delegate to the registry; placeholder and expression
/// resolution return their input unchanged. Every other operation fails with
/// `NotSupported`, so an unexpected call surfaces instead of being skipped.
pub struct CapabilityFacade {
    lookup: Arc<dyn BeanLookup>,
    application_name: String,
    started_at: DateTime<Utc>,
}

impl CapabilityFacade {
    pub fn new(lookup: Arc<dyn BeanLookup>) -> Self {
        Self {
            lookup,
            application_name: DocumentConfig::APPLICATION_NAME.to_string(),
            started_at: Utc::now(),
        }
    }

    fn unsupported<T>(&self, operation: &str) -> Result<T> {
        error!("Container operation '{}' is not supported", operation);
        Err(GeneratorError::NotSupported {
            operation: operation.to_string(),
        })
    }
}

impl ContainerContract for CapabilityFacade {
    fn application_name(&self) -> String {
        self.application_name.clone()
    }

    fn display_name(&self) -> String {
        format!("{} generation container", self.application_name)
    }

    fn startup_date(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn parent(&self) -> Option<&dyn ContainerContract> {
        None
    }

    fn get_bean(&self, name: &str) -> Result<Instance> {
        Ok(self.lookup.descriptor(name)?.instance.clone())
    }

    fn get_bean_of_type(&self, name: &str, expected: &TypeHandle) -> Result<Instance> {
        self.lookup.lookup_by_name(name, expected)
    }

    fn get_type(&self, name: &str) -> Result<TypeHandle> {
        self.lookup.type_of(name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    fn bean_definition_count(&self) -> usize {
        self.lookup.len()
    }

    fn bean_definition_names(&self) -> Vec<String> {
        self.lookup.names()
    }

    fn bean_names_for_type(&self, ty: &TypeHandle) -> Vec<String> {
        self.lookup.lookup_names_by_type(ty)
    }

    fn beans_of_type(&self, ty: &TypeHandle) -> BTreeMap<String, Instance> {
        self.lookup.lookup_all_by_type(ty).into_iter().collect()
    }

    fn beans_with_tag(&self, kind: &str) -> BTreeMap<String, Instance> {
        self.lookup.lookup_with_tag(kind)
    }

    fn is_type_match(&self, name: &str, ty: &TypeHandle) -> Result<bool> {
        Ok(self.lookup.type_of(name)?.is_assignable_to(ty))
    }

    fn aliases(&self, name: &str) -> Result<Vec<String>> {
        self.lookup.aliases(name)
    }

    fn is_singleton(&self, name: &str) -> Result<bool> {
        Ok(self.lookup.descriptor(name)?.is_singleton())
    }

    fn is_prototype(&self, name: &str) -> Result<bool> {
        Ok(self.lookup.descriptor(name)?.is_prototype())
    }

    fn find_tag_on_bean(&self, _name: &str, _kind: &str) -> Result<Option<Arc<Tag>>> {
        self.unsupported("find_tag_on_bean")
    }

    fn resolve_embedded_value(&self, value: &str) -> String {
        value.to_string()
    }

    fn evaluate_expression(&self, expression: &str) -> String {
        expression.to_string()
    }

    fn add_embedded_value_resolver(&self, _resolver: ValueResolver) -> Result<()> {
        self.unsupported("add_embedded_value_resolver")
    }

    fn has_embedded_value_resolver(&self) -> Result<bool> {
        self.unsupported("has_embedded_value_resolver")
    }

    fn create_bean(&self, _ty: &TypeHandle) -> Result<Instance> {
        self.unsupported("create_bean")
    }

    fn autowire_bean(&self, _instance: &Instance) -> Result<()> {
        self.unsupported("autowire_bean")
    }

    fn configure_bean(&self, _instance: Instance, _name: &str) -> Result<Instance> {
        self.unsupported("configure_bean")
    }

    fn initialize_bean(&self, _instance: Instance, _name: &str) -> Result<Instance> {
        self.unsupported("initialize_bean")
    }

    fn apply_post_processors_before_initialization(&self, _instance: Instance, _name: &str) -> Result<Instance> {
        self.unsupported("apply_post_processors_before_initialization")
    }

    fn apply_post_processors_after_initialization(&self, _instance: Instance, _name: &str) -> Result<Instance> {
        self.unsupported("apply_post_processors_after_initialization")
    }

    fn add_post_processor(&self, _processor: PostProcessor) -> Result<()> {
        self.unsupported("add_post_processor")
    }

    fn post_processor_count(&self) -> Result<usize> {
        self.unsupported("post_processor_count")
    }

    fn destroy_bean(&self, _instance: &Instance) -> Result<()> {
        self.unsupported("destroy_bean")
    }

    fn destroy_singletons(&self) -> Result<()> {
        self.unsupported("destroy_singletons")
    }

    fn resolve_dependency(&self, _ty: &TypeHandle, _requesting_bean: Option<&str>) -> Result<Instance> {
        self.unsupported("resolve_dependency")
    }

    fn is_currently_in_creation(&self, _name: &str) -> Result<bool> {
        self.unsupported("is_currently_in_creation")
    }

    fn register_singleton(&self, _name: &str, _instance: Instance) -> Result<()> {
        self.unsupported("register_singleton")
    }

    fn singleton(&self, _name: &str) -> Result<Instance> {
        self.unsupported("singleton")
    }

    fn singleton_names(&self) -> Result<Vec<String>> {
        self.unsupported("singleton_names")
    }

    fn register_alias(&self, _name: &str, _alias: &str) -> Result<()> {
        self.unsupported("register_alias")
    }

    fn register_scope(&self, _scope: &str) -> Result<()> {
        self.unsupported("register_scope")
    }

    fn registered_scope_names(&self) -> Result<Vec<String>> {
        self.unsupported("registered_scope_names")
    }

    fn register_dependent_bean(&self, _name: &str, _dependent: &str) -> Result<()> {
        self.unsupported("register_dependent_bean")
    }

    fn dependencies_for_bean(&self, _name: &str) -> Result<Vec<String>> {
        self.unsupported("dependencies_for_bean")
    }

    fn message(&self, _code: &str, _args: &[String], _locale: &str) -> Result<String> {
        self.unsupported("message")
    }

    fn publish_event(&self, _event: Instance) -> Result<()> {
        self.unsupported("publish_event")
    }

    fn resource(&self, _location: &str) -> Result<PathBuf> {
        self.unsupported("resource")
    }

    fn environment_property(&self, _key: &str) -> Result<Option<String>> {
        self.unsupported("environment_property")
    }
}
