//! Type discovery: unit manifests, run-scoped loading and package scanning.

mod loader;
mod scanner;
mod types;

pub use loader::{ManifestDirectory, TypeCatalog, TypeLoader, UnitRegistration, UnitSource};
pub use scanner::{ClassDescriptor, TypeDiscovery};
pub use types::{MethodHandle, MethodManifest, ParameterInfo, TypeHandle, TypeOrigin, UnitManifest};
