//! One generation run, end to end.
//!
//! Discovery finds the handler types, each handler is registered under its simple
//! name, the open-object schemas of its methods are patched, its routes are
//! registered as `<Name>HandlerMapping`, and the document is built through the
//! capability facade and customized from the properties.

use crate::config::GeneratorProperties;
use crate::discovery::{
    ClassDescriptor, ManifestDirectory, TypeCatalog, TypeDiscovery, TypeHandle, TypeLoader,
};
use crate::document::{customizers_for, ApiDocument, DocumentBuilder, RouteTable};
use crate::error::Result;
use crate::facade::CapabilityFacade;
use crate::metadata::{kinds, MetadataOverride, MetadataPatcher};
use crate::output::write_json_atomic;
use crate::registry::{Bean, BeanRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Stand-in instance registered for a discovered handler type.
#[derive(Debug, Clone)]
pub struct HandlerBean {
    handle: TypeHandle,
}

impl HandlerBean {
    pub fn new(handle: TypeHandle) -> Self {
        Self { handle }
    }
}

impl Bean for HandlerBean {
    fn bean_type(&self) -> TypeHandle {
        self.handle.clone()
    }
}

/// Result of a generation run.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub document: ApiDocument,
    /// Registered handler names, sorted
    pub handlers: Vec<String>,
    pub overrides: Vec<MetadataOverride>,
}

pub struct Generator {
    properties: GeneratorProperties,
    catalog: Option<Arc<TypeCatalog>>,
}

impl Generator {
    /// Create a generator; unset properties get their defaults.
    pub fn new(mut properties: GeneratorProperties) -> Self {
        properties.apply_defaults(None, None);
        Self {
            properties,
            catalog: None,
        }
    }

    /// Also scan the units of a registration table.
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn properties(&self) -> &GeneratorProperties {
        &self.properties
    }

    /// Build the document without writing it.
    pub fn generate(&self) -> Result<GenerationOutcome> {
        self.properties.validate()?;

        let scan_root = self.properties.scan_root();
        info!(
            "Scanning {} for packages {}",
            scan_root.display(),
            self.properties.packages_to_scan
        );

        let mut loader =
            TypeLoader::new().with_source(Arc::new(ManifestDirectory::new(&scan_root)));
        let mut discovery_catalog = None;
        if let Some(catalog) = &self.catalog {
            loader = loader.with_source(catalog.clone());
            discovery_catalog = Some(catalog.clone());
        }

        let mut discovery = TypeDiscovery::new(&scan_root, &loader);
        if let Some(catalog) = discovery_catalog {
            discovery = discovery.with_catalog(catalog);
        }

        let mut handlers: Vec<ClassDescriptor> = discovery
            .discover_with_any_tag(self.properties.packages(), &kinds::HANDLER_KINDS)?
            .into_iter()
            .collect();
        handlers.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let registry = Arc::new(BeanRegistry::new());
        let patcher = MetadataPatcher::new();
        let schema_type = self.properties.object_schema_type();
        let mut names = Vec::with_capacity(handlers.len());

        for descriptor in &handlers {
            let bean = HandlerBean::new(descriptor.handle.clone());
            let registered = registry.register_bean(Arc::new(bean))?;

            for method in descriptor.handle.methods_in_hierarchy() {
                patcher.override_object_schemas(&method, schema_type)?;
            }

            let table = RouteTable::collect(&registered.name, &descriptor.handle);
            registry
                .register_named_bean(RouteTable::bean_name(&registered.name), Arc::new(table))?;
            names.push(registered.name.clone());
        }

        let facade = CapabilityFacade::new(registry);
        let mut document = DocumentBuilder::new(&facade).build()?;
        for customizer in customizers_for(&self.properties) {
            customizer.customize(&mut document);
        }

        names.sort();
        info!(
            "Generated {} paths from {} handlers ({} metadata overrides)",
            document.paths.len(),
            names.len(),
            patcher.applied().len()
        );

        Ok(GenerationOutcome {
            document,
            handlers: names,
            overrides: patcher.applied(),
        })
    }

    /// Write a generated document to the configured output file.
    pub fn write(&self, outcome: &GenerationOutcome) -> Result<PathBuf> {
        let output = self.properties.output_path();
        write_json_atomic(&output, &outcome.document)?;
        info!("Wrote {}", output.display());
        Ok(output)
    }

    /// Generate and write; nothing is written if generation fails.
    pub fn run(&self) -> Result<(GenerationOutcome, PathBuf)> {
        let outcome = self.generate()?;
        let output = self.write(&outcome)?;
        Ok((outcome, output))
    }
}
