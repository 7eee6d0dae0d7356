//! oasgen core - build-time API document generation.
//!
//! Handler types are described by unit manifests (`.unit` JSON files) laid out
//! under a scan root like packages. A generation run discovers the handlers of the
//! requested packages, registers them in a per-run bean registry, corrects
//! ambiguous schema metadata in place, and builds an OpenAPI document through a
//! registry-backed container facade. No application is started.
//!
//! # Example
//!
//! ```rust,ignore
//! use oasgen_core::{Generator, GeneratorProperties};
//!
//! fn main() -> oasgen_core::Result<()> {
//!     let mut properties = GeneratorProperties::new("org.acme.api");
//!     properties.classes_dir = Some("target/api-units".into());
//!
//!     let (outcome, output) = Generator::new(properties).run()?;
//!     println!("{} paths written to {}", outcome.document.paths.len(), output.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod facade;
pub mod metadata;
pub mod registry;

mod generator;
mod output;

pub use config::{GeneratorProperties, OAuth2Properties, ServerProperties};
pub use discovery::{
    ClassDescriptor, ManifestDirectory, MethodHandle, TypeCatalog, TypeDiscovery, TypeHandle,
    TypeLoader, UnitManifest, UnitRegistration,
};
pub use document::{ApiDocument, DocumentBuilder, RouteTable};
pub use error::{GeneratorError, Result};
pub use facade::{CapabilityFacade, ContainerContract};
pub use generator::{GenerationOutcome, Generator, HandlerBean};
pub use metadata::{AttrValue, MetadataOverride, MetadataPatcher, Tag, TagOwner};
pub use output::write_json_atomic;
pub use registry::{Bean, BeanDescriptor, BeanLookup, BeanRegistry, Instance};

// Re-exported so `inventory::submit!` works without a direct dependency.
pub use inventory;
