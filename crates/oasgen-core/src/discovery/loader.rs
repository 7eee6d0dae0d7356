//! Run-scoped type loading.
//!
//! A [`TypeLoader`] resolves identifiers to [`TypeHandle`]s by asking its unit
//! sources in order, resolving supertypes recursively and caching every handle.
//! One loader lives exactly as long as one generation run; patched metadata dies
//! with it.

use super::types::{TypeHandle, TypeOrigin, UnitManifest};
use crate::config::ScanConfig;
use crate::error::{GeneratorError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A place unit manifests can be read from.
pub trait UnitSource: Send + Sync {
    /// Short description for diagnostics.
    fn describe(&self) -> String;

    /// Read the manifest of `identifier`.
    ///
    /// Returns `None` when this source does not know the identifier, and
    /// `Some(Err(..))` when it does but the unit cannot be read.
    fn read_unit(&self, identifier: &str) -> Option<Result<(UnitManifest, TypeOrigin)>>;
}

/// Unit manifests stored under a scan root, one file per type.
#[derive(Debug, Clone)]
pub struct ManifestDirectory {
    root: PathBuf,
}

impl ManifestDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `org.acme.Api` -> `<root>/org/acme/Api.unit`
    pub fn unit_path(&self, identifier: &str) -> PathBuf {
        let mut path = identifier
            .split(ScanConfig::PACKAGE_SEPARATOR)
            .fold(self.root.clone(), |path, segment| path.join(segment));
        path.set_extension(ScanConfig::UNIT_EXTENSION);
        path
    }
}

impl UnitSource for ManifestDirectory {
    fn describe(&self) -> String {
        format!("scan root {}", self.root.display())
    }

    fn read_unit(&self, identifier: &str) -> Option<Result<(UnitManifest, TypeOrigin)>> {
        let path = self.unit_path(identifier);
        if !path.is_file() {
            return None;
        }
        Some(read_manifest(identifier, &path).map(|m| (m, TypeOrigin::Manifest(path))))
    }
}

fn read_manifest(identifier: &str, path: &Path) -> Result<UnitManifest> {
    let contents = std::fs::read_to_string(path).map_err(|e| GeneratorError::ClassResolution {
        identifier: identifier.to_string(),
        path: Some(path.to_path_buf()),
        message: format!("unit is unreadable: {}", e),
    })?;

    serde_json::from_str(&contents).map_err(|e| GeneratorError::ClassResolution {
        identifier: identifier.to_string(),
        path: Some(path.to_path_buf()),
        message: format!("unit manifest is malformed: {}", e),
    })
}

/// Link-time registration of a unit, collected with `inventory`.
pub struct UnitRegistration {
    pub identifier: &'static str,
    pub manifest: fn() -> UnitManifest,
}

inventory::collect!(UnitRegistration);

/// Explicit registration table of units.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    units: BTreeMap<String, UnitManifest>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of every unit submitted with `inventory::submit!`.
    pub fn from_inventory() -> Result<Self> {
        let mut catalog = Self::new();
        for registration in inventory::iter::<UnitRegistration>() {
            catalog.register(registration.identifier, (registration.manifest)())?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, identifier: impl Into<String>, manifest: UnitManifest) -> Result<()> {
        let identifier = identifier.into();
        if self.units.contains_key(&identifier) {
            return Err(GeneratorError::unresolved(
                identifier,
                "unit is registered more than once",
            ));
        }
        self.units.insert(identifier, manifest);
        Ok(())
    }

    /// Identifiers in `package` or any of its subpackages, sorted.
    pub fn identifiers_in(&self, package: &str) -> Vec<String> {
        let prefix = format!("{}{}", package, ScanConfig::PACKAGE_SEPARATOR);
        self.units
            .keys()
            .filter(|id| package.is_empty() || id.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl UnitSource for TypeCatalog {
    fn describe(&self) -> String {
        format!("catalog of {} units", self.units.len())
    }

    fn read_unit(&self, identifier: &str) -> Option<Result<(UnitManifest, TypeOrigin)>> {
        self.units
            .get(identifier)
            .map(|m| Ok((m.clone(), TypeOrigin::Catalog)))
    }
}

/// Resolves identifiers to cached type handles.
#[derive(Default)]
pub struct TypeLoader {
    sources: Vec<Arc<dyn UnitSource>>,
    loaded: RwLock<HashMap<String, TypeHandle>>,
}

impl TypeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source; sources are asked in the order they were added.
    pub fn with_source(mut self, source: Arc<dyn UnitSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load `identifier` and, recursively, its supertypes.
    ///
    /// Fails with `ClassResolution` if the unit or any supertype is unknown to
    /// every source, unreadable, malformed, declares a different identifier, or
    /// takes part in a supertype cycle.
    pub fn load(&self, identifier: &str) -> Result<TypeHandle> {
        self.load_resolving(identifier, &mut Vec::new())
    }

    /// Number of types loaded so far.
    pub fn loaded_count(&self) -> usize {
        self.loaded.read().map(|l| l.len()).unwrap_or(0)
    }

    fn cached(&self, identifier: &str) -> Result<Option<TypeHandle>> {
        let loaded = self
            .loaded
            .read()
            .map_err(|e| GeneratorError::Other(format!("Failed to acquire type cache lock: {}", e)))?;
        Ok(loaded.get(identifier).cloned())
    }

    fn load_resolving(&self, identifier: &str, resolving: &mut Vec<String>) -> Result<TypeHandle> {
        if let Some(handle) = self.cached(identifier)? {
            return Ok(handle);
        }

        if resolving.iter().any(|id| id == identifier) {
            let mut chain = resolving.clone();
            chain.push(identifier.to_string());
            return Err(GeneratorError::unresolved(
                identifier,
                format!("cyclic supertype chain: {}", chain.join(" -> ")),
            ));
        }

        let (manifest, origin) = self.read_unit(identifier)?;

        if let Some(declared) = manifest.identifier.as_deref() {
            if declared != identifier {
                return Err(GeneratorError::ClassResolution {
                    identifier: identifier.to_string(),
                    path: match &origin {
                        TypeOrigin::Manifest(path) => Some(path.clone()),
                        _ => None,
                    },
                    message: format!("unit declares identifier {}", declared),
                });
            }
        }

        resolving.push(identifier.to_string());
        let supertypes = manifest
            .supertypes
            .iter()
            .map(|s| self.load_resolving(s, resolving))
            .collect::<Result<Vec<_>>>()?;
        resolving.pop();

        let handle = TypeHandle::from_manifest(identifier, manifest, supertypes, origin);
        debug!("Loaded type {}", identifier);

        let mut loaded = self
            .loaded
            .write()
            .map_err(|e| GeneratorError::Other(format!("Failed to acquire type cache lock: {}", e)))?;
        Ok(loaded
            .entry(identifier.to_string())
            .or_insert(handle)
            .clone())
    }

    fn read_unit(&self, identifier: &str) -> Result<(UnitManifest, TypeOrigin)> {
        for source in &self.sources {
            if let Some(unit) = source.read_unit(identifier) {
                return unit;
            }
        }

        let searched: Vec<String> = self.sources.iter().map(|s| s.describe()).collect();
        Err(GeneratorError::unresolved(
            identifier,
            format!("no unit found (searched: {})", searched.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_unit(root: &Path, identifier: &str, json: &str) {
        let path = ManifestDirectory::new(root).unit_path(identifier);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    fn loader_for(root: &Path) -> TypeLoader {
        TypeLoader::new().with_source(Arc::new(ManifestDirectory::new(root)))
    }

    #[test]
    fn test_unit_path() {
        let dir = ManifestDirectory::new("/scan");
        assert_eq!(
            dir.unit_path("org.acme.UserApi"),
            PathBuf::from("/scan/org/acme/UserApi.unit")
        );
    }

    #[test]
    fn test_load_resolves_supertypes() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(temp_dir.path(), "org.acme.Api", "{}");
        write_unit(
            temp_dir.path(),
            "org.acme.Controller",
            r#"{ "supertypes": ["org.acme.Api"] }"#,
        );

        let loader = loader_for(temp_dir.path());
        let controller = loader.load("org.acme.Controller").unwrap();
        let api = loader.load("org.acme.Api").unwrap();

        assert!(controller.is_assignable_to(&api));
        assert_eq!(loader.loaded_count(), 2);
    }

    #[test]
    fn test_load_returns_cached_handle() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(temp_dir.path(), "org.acme.Api", "{}");

        let loader = loader_for(temp_dir.path());
        let first = loader.load("org.acme.Api").unwrap();
        std::fs::remove_file(ManifestDirectory::new(temp_dir.path()).unit_path("org.acme.Api"))
            .unwrap();
        let second = loader.load("org.acme.Api").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_supertype_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(
            temp_dir.path(),
            "org.acme.Controller",
            r#"{ "supertypes": ["org.elsewhere.Missing"] }"#,
        );

        let err = loader_for(temp_dir.path())
            .load("org.acme.Controller")
            .unwrap_err();
        match err {
            GeneratorError::ClassResolution { identifier, .. } => {
                assert_eq!(identifier, "org.elsewhere.Missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_unit_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(temp_dir.path(), "org.acme.Broken", "{ not json");

        let err = loader_for(temp_dir.path())
            .load("org.acme.Broken")
            .unwrap_err();
        assert!(matches!(err, GeneratorError::ClassResolution { path: Some(_), .. }));
    }

    #[test]
    fn test_identifier_mismatch_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(
            temp_dir.path(),
            "org.acme.Api",
            r#"{ "identifier": "org.other.Api" }"#,
        );

        assert!(loader_for(temp_dir.path()).load("org.acme.Api").is_err());
    }

    #[test]
    fn test_supertype_cycle_is_fatal() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register(
                "org.acme.A",
                UnitManifest {
                    supertypes: vec!["org.acme.B".into()],
                    ..Default::default()
                },
            )
            .unwrap();
        catalog
            .register(
                "org.acme.B",
                UnitManifest {
                    supertypes: vec!["org.acme.A".into()],
                    ..Default::default()
                },
            )
            .unwrap();

        let loader = TypeLoader::new().with_source(Arc::new(catalog));
        let err = loader.load("org.acme.A").unwrap_err();
        assert!(err.to_string().contains("org.acme.A -> org.acme.B -> org.acme.A"));
    }

    #[test]
    fn test_catalog_registration() {
        let mut catalog = TypeCatalog::new();
        catalog
            .register("org.acme.api.UserApi", UnitManifest::default())
            .unwrap();
        catalog
            .register("org.acme.apis.Other", UnitManifest::default())
            .unwrap();

        assert!(catalog
            .register("org.acme.api.UserApi", UnitManifest::default())
            .is_err());
        assert_eq!(
            catalog.identifiers_in("org.acme.api"),
            vec!["org.acme.api.UserApi".to_string()]
        );
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_sources_are_asked_in_order() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(temp_dir.path(), "org.acme.Api", "{}");
        let mut catalog = TypeCatalog::new();
        catalog
            .register("org.acme.Api", UnitManifest::default())
            .unwrap();

        let loader = TypeLoader::new()
            .with_source(Arc::new(ManifestDirectory::new(temp_dir.path())))
            .with_source(Arc::new(catalog));
        let api = loader.load("org.acme.Api").unwrap();
        assert!(matches!(api.origin(), TypeOrigin::Manifest(_)));
    }
}
