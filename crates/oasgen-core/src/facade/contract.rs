//! The container contract consumed by the document builder.
//!
//! The contract is wide: it covers lookup, but also creation, lifecycle,
//! registration, messaging, events and resources. A generation run only needs the
//! lookup part; see [`CapabilityFacade`](super::CapabilityFacade) for which
//! operations are backed.

use crate::discovery::TypeHandle;
use crate::error::Result;
use crate::metadata::Tag;
use crate::registry::Instance;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Hook run on an instance during initialization.
pub type PostProcessor = Arc<dyn Fn(&str, Instance) -> Result<Instance> + Send + Sync>;

/// Resolver for `${...}` placeholders in configuration values.
pub type ValueResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Full container contract.
pub trait ContainerContract: Send + Sync {
    // Identity

    fn application_name(&self) -> String;

    fn display_name(&self) -> String;

    fn startup_date(&self) -> DateTime<Utc>;

    /// Enclosing container, if any.
    fn parent(&self) -> Option<&dyn ContainerContract>;

    // Lookup

    fn get_bean(&self, name: &str) -> Result<Instance>;

    fn get_bean_of_type(&self, name: &str, expected: &TypeHandle) -> Result<Instance>;

    fn get_type(&self, name: &str) -> Result<TypeHandle>;

    fn contains_bean(&self, name: &str) -> bool;

    fn contains_bean_definition(&self, name: &str) -> bool;

    fn bean_definition_count(&self) -> usize;

    fn bean_definition_names(&self) -> Vec<String>;

    fn bean_names_for_type(&self, ty: &TypeHandle) -> Vec<String>;

    fn beans_of_type(&self, ty: &TypeHandle) -> BTreeMap<String, Instance>;

    fn beans_with_tag(&self, kind: &str) -> BTreeMap<String, Instance>;

    fn is_type_match(&self, name: &str, ty: &TypeHandle) -> Result<bool>;

    fn aliases(&self, name: &str) -> Result<Vec<String>>;

    fn is_singleton(&self, name: &str) -> Result<bool>;

    fn is_prototype(&self, name: &str) -> Result<bool>;

    fn find_tag_on_bean(&self, name: &str, kind: &str) -> Result<Option<Arc<Tag>>>;

    // Value resolution

    fn resolve_embedded_value(&self, value: &str) -> String;

    fn evaluate_expression(&self, expression: &str) -> String;

    fn add_embedded_value_resolver(&self, resolver: ValueResolver) -> Result<()>;

    fn has_embedded_value_resolver(&self) -> Result<bool>;

    // Creation and lifecycle

    fn create_bean(&self, ty: &TypeHandle) -> Result<Instance>;

    fn autowire_bean(&self, instance: &Instance) -> Result<()>;

    fn configure_bean(&self, instance: Instance, name: &str) -> Result<Instance>;

    fn initialize_bean(&self, instance: Instance, name: &str) -> Result<Instance>;

    fn apply_post_processors_before_initialization(&self, instance: Instance, name: &str) -> Result<Instance>;

    fn apply_post_processors_after_initialization(&self, instance: Instance, name: &str) -> Result<Instance>;

    fn add_post_processor(&self, processor: PostProcessor) -> Result<()>;

    fn post_processor_count(&self) -> Result<usize>;

    fn destroy_bean(&self, instance: &Instance) -> Result<()>;

    fn destroy_singletons(&self) -> Result<()>;

    fn resolve_dependency(&self, ty: &TypeHandle, requesting_bean: Option<&str>) -> Result<Instance>;

    fn is_currently_in_creation(&self, name: &str) -> Result<bool>;

    // Registration

    fn register_singleton(&self, name: &str, instance: Instance) -> Result<()>;

    fn singleton(&self, name: &str) -> Result<Instance>;

    fn singleton_names(&self) -> Result<Vec<String>>;

    fn register_alias(&self, name: &str, alias: &str) -> Result<()>;

    fn register_scope(&self, scope: &str) -> Result<()>;

    fn registered_scope_names(&self) -> Result<Vec<String>>;

    fn register_dependent_bean(&self, name: &str, dependent: &str) -> Result<()>;

    fn dependencies_for_bean(&self, name: &str) -> Result<Vec<String>>;

    // Messages, events, resources, environment

    fn message(&self, code: &str, args: &[String], locale: &str) -> Result<String>;

    fn publish_event(&self, event: Instance) -> Result<()>;

    fn resource(&self, location: &str) -> Result<PathBuf>;

    fn environment_property(&self, key: &str) -> Result<Option<String>>;
}
