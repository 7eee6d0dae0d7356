//! Bean descriptors and the [`Bean`] trait.

use crate::discovery::TypeHandle;
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A retained instance; the registry only holds a reference.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Scope label meaning "one shared instance".
pub const SINGLETON_SCOPE: &str = "singleton";
pub const PROTOTYPE_SCOPE: &str = "prototype";

/// A value that knows its declared type.
pub trait Bean: Any + Send + Sync {
    fn bean_type(&self) -> TypeHandle;
}

/// A named, typed registry entry.
#[derive(Clone)]
pub struct BeanDescriptor {
    pub name: String,
    pub instance: Instance,
    pub declared_type: TypeHandle,
    pub aliases: BTreeSet<String>,
    /// `None` means singleton
    pub scope: Option<String>,
}

impl BeanDescriptor {
    pub fn new(name: impl Into<String>, instance: Instance, declared_type: TypeHandle) -> Self {
        Self {
            name: name.into(),
            instance,
            declared_type,
            aliases: BTreeSet::new(),
            scope: None,
        }
    }

    /// Descriptor for a [`Bean`], typed by its own `bean_type`.
    pub fn of<B: Bean>(name: impl Into<String>, bean: Arc<B>) -> Self {
        let declared_type = bean.bean_type();
        Self::new(name, bean, declared_type)
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.scope
            .as_deref()
            .map_or(true, |s| s.is_empty() || s == SINGLETON_SCOPE)
    }

    pub fn is_prototype(&self) -> bool {
        self.scope.as_deref() == Some(PROTOTYPE_SCOPE)
    }
}

impl fmt::Debug for BeanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("aliases", &self.aliases)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
