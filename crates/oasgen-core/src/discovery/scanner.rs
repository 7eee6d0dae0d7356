//! Package scanning.

use super::loader::{TypeCatalog, TypeLoader};
use super::types::TypeHandle;
use crate::config::ScanConfig;
use crate::error::{GeneratorError, Result};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A discovered type.
///
/// Descriptors compare and hash by identifier.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub identifier: String,
    pub handle: TypeHandle,
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for ClassDescriptor {}

impl Hash for ClassDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Finds the types of a package under a scan root.
pub struct TypeDiscovery<'a> {
    root: PathBuf,
    loader: &'a TypeLoader,
    catalog: Option<Arc<TypeCatalog>>,
}

impl<'a> TypeDiscovery<'a> {
    pub fn new(root: impl Into<PathBuf>, loader: &'a TypeLoader) -> Self {
        Self {
            root: root.into(),
            loader,
            catalog: None,
        }
    }

    /// Also consider the units of a registration table.
    pub fn with_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every unit in `package` and its subpackages found on disk.
    ///
    /// A package without a directory yields an empty set. Any unit that cannot be
    /// resolved aborts the scan.
    pub fn discover(&self, package: &str) -> Result<HashSet<ClassDescriptor>> {
        let package_dir = package
            .split(ScanConfig::PACKAGE_SEPARATOR)
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |dir, segment| dir.join(segment));

        if !package_dir.is_dir() {
            warn!(
                "Package directory {} for package '{}' does not exist",
                package_dir.display(),
                package
            );
            return Ok(HashSet::new());
        }

        let mut found = HashSet::new();
        for entry in WalkDir::new(&package_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| GeneratorError::Io {
                message: format!("Failed to scan {}: {}", package_dir.display(), e),
                path: e.path().map(Path::to_path_buf),
                source: e.into_io_error(),
            })?;

            let path = entry.path();
            let is_unit = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(ScanConfig::UNIT_EXTENSION);
            if !is_unit {
                continue;
            }

            let Some(identifier) = identifier_for(package, &package_dir, path)? else {
                warn!(
                    "Skipping {}: a directory or file name contains '{}'",
                    path.display(),
                    ScanConfig::PACKAGE_SEPARATOR
                );
                continue;
            };
            let handle = self.loader.load(&identifier)?;
            found.insert(ClassDescriptor { identifier, handle });
        }

        debug!("Package '{}' contains {} units", package, found.len());
        Ok(found)
    }

    /// Every unit of the registration table in `package` and its subpackages.
    pub fn discover_catalog(&self, package: &str) -> Result<HashSet<ClassDescriptor>> {
        let Some(catalog) = &self.catalog else {
            return Ok(HashSet::new());
        };

        catalog
            .identifiers_in(package)
            .into_iter()
            .map(|identifier| {
                let handle = self.loader.load(&identifier)?;
                Ok(ClassDescriptor { identifier, handle })
            })
            .collect()
    }

    /// Types of the given packages that directly declare at least one of
    /// `tag_kinds`. Tags inherited from supertypes do not count.
    pub fn discover_with_any_tag<I, S>(
        &self,
        packages: I,
        tag_kinds: &[&str],
    ) -> Result<HashSet<ClassDescriptor>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matching = HashSet::new();

        for package in packages {
            let package = package.as_ref();
            info!("Scanning package {}", package);

            let mut candidates = self.discover(package)?;
            candidates.extend(self.discover_catalog(package)?);

            for descriptor in candidates {
                let found = tag_kinds
                    .iter()
                    .copied()
                    .find(|kind| descriptor.handle.declares_tag(kind));
                if let Some(kind) = found {
                    info!("Found {} on {}", kind, descriptor.identifier);
                    matching.insert(descriptor);
                }
            }
        }

        Ok(matching)
    }
}

/// `package` + subdirectories + file stem, joined with dots.
///
/// `None` when a directory or the file stem contains the package separator;
/// such a unit has no identifier that maps back to its own path.
fn identifier_for(package: &str, package_dir: &Path, path: &Path) -> Result<Option<String>> {
    let not_utf8 = || GeneratorError::ClassResolution {
        identifier: package.to_string(),
        path: Some(path.to_path_buf()),
        message: "unit path is not valid UTF-8".into(),
    };

    let relative = path.strip_prefix(package_dir).map_err(|_| not_utf8())?;
    let mut segments: Vec<&str> = package
        .split(ScanConfig::PACKAGE_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();
    let package_len = segments.len();

    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            segments.push(component.as_os_str().to_str().ok_or_else(not_utf8)?);
        }
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(not_utf8)?;
    segments.push(stem);

    if segments[package_len..]
        .iter()
        .any(|s| s.contains(ScanConfig::PACKAGE_SEPARATOR))
    {
        return Ok(None);
    }

    Ok(Some(segments.join(".")))
}
