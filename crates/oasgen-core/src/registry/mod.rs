//! Bean registry: the only stateful store of a generation run.

mod bean_registry;
mod descriptor;

pub use bean_registry::{downcast_instance, BeanLookup, BeanRegistry};
pub use descriptor::{Bean, BeanDescriptor, Instance, PROTOTYPE_SCOPE, SINGLETON_SCOPE};
