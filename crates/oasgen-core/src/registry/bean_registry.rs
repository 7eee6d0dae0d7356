//! In-memory registry of named, typed instances.

use super::descriptor::{Bean, BeanDescriptor, Instance};
use crate::discovery::TypeHandle;
use crate::error::{GeneratorError, Result};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::debug;

/// Read side of the registry.
pub trait BeanLookup: Send + Sync {
    /// Descriptor registered under `name` or one of its aliases.
    fn descriptor(&self, name: &str) -> Result<Arc<BeanDescriptor>>;

    fn contains(&self, name: &str) -> bool;

    /// Instance registered under `name`, provided its declared type is assignable
    /// to `expected`.
    fn lookup_by_name(&self, name: &str, expected: &TypeHandle) -> Result<Instance>;

    /// Every bean whose declared type is `ty` or a subtype of it, by name.
    fn lookup_all_by_type(&self, ty: &TypeHandle) -> Vec<(String, Instance)>;

    fn lookup_names_by_type(&self, ty: &TypeHandle) -> Vec<String>;

    /// Every bean whose declared type directly declares a tag of `kind`.
    fn lookup_with_tag(&self, kind: &str) -> BTreeMap<String, Instance>;

    fn type_of(&self, name: &str) -> Result<TypeHandle>;

    fn aliases(&self, name: &str) -> Result<Vec<String>>;

    /// Registered names, sorted.
    fn names(&self) -> Vec<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct RegistryState {
    by_name: HashMap<String, Arc<BeanDescriptor>>,
    by_type: HashMap<TypeHandle, Vec<Arc<BeanDescriptor>>>,
    /// alias -> canonical name
    aliases: HashMap<String, String>,
}

impl RegistryState {
    fn is_taken(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.aliases.contains_key(name)
    }

    fn resolve(&self, name: &str) -> Option<&Arc<BeanDescriptor>> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.by_name.get(canonical)
    }

    fn assignable_to<'a>(&'a self, ty: &'a TypeHandle) -> impl Iterator<Item = &'a Arc<BeanDescriptor>> + 'a {
        self.by_type
            .iter()
            .filter(move |(declared, _)| declared.is_assignable_to(ty))
            .flat_map(|(_, descriptors)| descriptors.iter())
    }
}

/// Registry of beans for one generation run.
///
/// Entries are write-once: a name is never re-registered or removed.
#[derive(Default)]
pub struct BeanRegistry {
    state: RwLock<RegistryState>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Fails with `DuplicateName` if its name or any of its aliases is already
    /// used as a name or alias; the registry is left unchanged then.
    pub fn register(&self, descriptor: BeanDescriptor) -> Result<Arc<BeanDescriptor>> {
        let mut state = self
            .state
            .write()
            .map_err(|e| GeneratorError::Other(format!("Failed to acquire registry lock: {}", e)))?;

        if state.is_taken(&descriptor.name) {
            return Err(GeneratorError::DuplicateName {
                name: descriptor.name,
            });
        }
        if let Some(alias) = descriptor
            .aliases
            .iter()
            .find(|a| **a == descriptor.name || state.is_taken(a))
        {
            return Err(GeneratorError::DuplicateName {
                name: alias.clone(),
            });
        }

        let descriptor = Arc::new(descriptor);
        for alias in &descriptor.aliases {
            state
                .aliases
                .insert(alias.clone(), descriptor.name.clone());
        }
        state
            .by_type
            .entry(descriptor.declared_type.clone())
            .or_default()
            .push(descriptor.clone());
        state
            .by_name
            .insert(descriptor.name.clone(), descriptor.clone());

        debug!(
            "Registered bean {} of type {}",
            descriptor.name, descriptor.declared_type
        );
        Ok(descriptor)
    }

    /// Register a bean under the simple name of its type.
    pub fn register_bean<B: Bean>(&self, bean: Arc<B>) -> Result<Arc<BeanDescriptor>> {
        let name = bean.bean_type().simple_name().to_string();
        self.register(BeanDescriptor::of(name, bean))
    }

    pub fn register_named_bean<B: Bean>(
        &self,
        name: impl Into<String>,
        bean: Arc<B>,
    ) -> Result<Arc<BeanDescriptor>> {
        self.register(BeanDescriptor::of(name, bean))
    }

    /// Typed lookup: like [`BeanLookup::lookup_by_name`], then downcast to `T`.
    pub fn lookup_as<T: Any + Send + Sync>(
        &self,
        name: &str,
        expected: &TypeHandle,
    ) -> Result<Arc<T>> {
        let instance = self.lookup_by_name(name, expected)?;
        downcast_instance(name, instance)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        // Registration validates before it mutates, so a poisoned lock still
        // guards consistent maps.
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Downcast a retained instance to its concrete type.
pub fn downcast_instance<T: Any + Send + Sync>(name: &str, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| GeneratorError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
            actual: "a different concrete type".to_string(),
        })
}

impl BeanLookup for BeanRegistry {
    fn descriptor(&self, name: &str) -> Result<Arc<BeanDescriptor>> {
        self.read()
            .resolve(name)
            .cloned()
            .ok_or_else(|| GeneratorError::NotFound {
                name: name.to_string(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.read().resolve(name).is_some()
    }

    fn lookup_by_name(&self, name: &str, expected: &TypeHandle) -> Result<Instance> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.declared_type.is_assignable_to(expected) {
            return Err(GeneratorError::TypeMismatch {
                name: name.to_string(),
                expected: expected.identifier().to_string(),
                actual: descriptor.declared_type.identifier().to_string(),
            });
        }
        Ok(descriptor.instance.clone())
    }

    fn lookup_all_by_type(&self, ty: &TypeHandle) -> Vec<(String, Instance)> {
        let state = self.read();
        let mut matches: Vec<(String, Instance)> = state
            .assignable_to(ty)
            .map(|d| (d.name.clone(), d.instance.clone()))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        matches
    }

    fn lookup_names_by_type(&self, ty: &TypeHandle) -> Vec<String> {
        let state = self.read();
        let mut names: Vec<String> = state.assignable_to(ty).map(|d| d.name.clone()).collect();
        names.sort();
        names
    }

    fn lookup_with_tag(&self, kind: &str) -> BTreeMap<String, Instance> {
        self.read()
            .by_name
            .values()
            .filter(|d| d.declared_type.declares_tag(kind))
            .map(|d| (d.name.clone(), d.instance.clone()))
            .collect()
    }

    fn type_of(&self, name: &str) -> Result<TypeHandle> {
        Ok(self.descriptor(name)?.declared_type.clone())
    }

    fn aliases(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.descriptor(name)?.aliases.iter().cloned().collect())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    fn len(&self) -> usize {
        self.read().by_name.len()
    }
}
