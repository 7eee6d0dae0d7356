//! Loaded type and method handles, and the unit manifest format they come from.

use crate::metadata::{Tag, TagOwner, TagStorage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

/// On-disk description of one compiled unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitManifest {
    /// Fully qualified identifier; must match the file location when present
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub methods: Vec<MethodManifest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodManifest {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
    #[serde(default)]
    pub returns: Option<String>,
    /// Compiler-generated bridge or accessor
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl ParameterInfo {
    pub fn tag(&self, kind: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.kind == kind)
    }
}

/// Where a loaded type came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrigin {
    Manifest(PathBuf),
    Catalog,
    Native,
}

struct LoadedType {
    identifier: String,
    supertypes: Vec<TypeHandle>,
    tags: TagStorage,
    methods: Vec<MethodHandle>,
    origin: TypeOrigin,
}

/// Shared handle to a loaded type.
///
/// Handles compare and hash by identifier. Metadata patched through one clone is
/// visible through every other clone.
#[derive(Clone)]
pub struct TypeHandle(Arc<LoadedType>);

impl TypeHandle {
    pub(crate) fn from_manifest(
        identifier: &str,
        manifest: UnitManifest,
        supertypes: Vec<TypeHandle>,
        origin: TypeOrigin,
    ) -> Self {
        let methods = manifest
            .methods
            .into_iter()
            .map(|m| MethodHandle::new(identifier, m))
            .collect();

        TypeHandle(Arc::new(LoadedType {
            identifier: identifier.to_string(),
            supertypes,
            tags: TagStorage::replaceable(manifest.tags),
            methods,
            origin,
        }))
    }

    /// Handle describing a native Rust type.
    ///
    /// The identifier is the Rust path with `.` separators and without generic
    /// arguments. Native handles have no supertypes and frozen metadata.
    pub fn native<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let path = full.split('<').next().unwrap_or(full);
        TypeHandle(Arc::new(LoadedType {
            identifier: path.replace("::", "."),
            supertypes: Vec::new(),
            tags: TagStorage::frozen(Vec::new()),
            methods: Vec::new(),
            origin: TypeOrigin::Native,
        }))
    }

    pub fn identifier(&self) -> &str {
        &self.0.identifier
    }

    /// Identifier without its package.
    pub fn simple_name(&self) -> &str {
        let id = self.identifier();
        id.rsplit_once('.').map_or(id, |(_, simple)| simple)
    }

    pub fn package(&self) -> &str {
        let id = self.identifier();
        id.rsplit_once('.').map_or("", |(package, _)| package)
    }

    pub fn supertypes(&self) -> &[TypeHandle] {
        &self.0.supertypes
    }

    pub fn origin(&self) -> &TypeOrigin {
        &self.0.origin
    }

    /// True if a value of this type can stand where `target` is expected: the
    /// same type, or `target` is a direct or transitive supertype.
    pub fn is_assignable_to(&self, target: &TypeHandle) -> bool {
        self == target || self.supertypes().iter().any(|s| s.is_assignable_to(target))
    }

    /// Whether the tag is declared on this type itself (supertypes don't count).
    pub fn declares_tag(&self, kind: &str) -> bool {
        self.0.tags.contains(kind)
    }

    /// First tag of `kind` on this type or, failing that, on its supertypes
    /// (depth-first, declaration order).
    pub fn find_tag_in_hierarchy(&self, kind: &str) -> Option<Arc<Tag>> {
        self.tag(kind).or_else(|| {
            self.supertypes()
                .iter()
                .find_map(|s| s.find_tag_in_hierarchy(kind))
        })
    }

    pub fn methods(&self) -> &[MethodHandle] {
        &self.0.methods
    }

    /// Methods of this type followed by those of its supertypes. Each type of a
    /// diamond hierarchy contributes once.
    pub fn methods_in_hierarchy(&self) -> Vec<MethodHandle> {
        let mut visited = HashSet::new();
        let mut methods = Vec::new();
        self.collect_methods(&mut visited, &mut methods);
        methods
    }

    fn collect_methods(&self, visited: &mut HashSet<String>, methods: &mut Vec<MethodHandle>) {
        if !visited.insert(self.identifier().to_string()) {
            return;
        }
        methods.extend(self.methods().iter().cloned());
        for supertype in self.supertypes() {
            supertype.collect_methods(visited, methods);
        }
    }
}

impl TagOwner for TypeHandle {
    fn owner_name(&self) -> String {
        self.identifier().to_string()
    }

    fn tag_storage(&self) -> &TagStorage {
        &self.0.tags
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.identifier() == other.identifier()
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier().hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.identifier()).finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

struct LoadedMethod {
    owner: String,
    name: String,
    parameters: Vec<ParameterInfo>,
    returns: Option<String>,
    synthetic: bool,
    tags: TagStorage,
}

/// Shared handle to a method of a loaded type.
#[derive(Clone)]
pub struct MethodHandle(Arc<LoadedMethod>);

impl MethodHandle {
    fn new(owner: &str, manifest: MethodManifest) -> Self {
        MethodHandle(Arc::new(LoadedMethod {
            owner: owner.to_string(),
            name: manifest.name,
            parameters: manifest.parameters,
            returns: manifest.returns,
            synthetic: manifest.synthetic,
            tags: TagStorage::replaceable(manifest.tags),
        }))
    }

    /// Identifier of the declaring type.
    pub fn owner(&self) -> &str {
        &self.0.owner
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.0.parameters
    }

    pub fn returns(&self) -> Option<&str> {
        self.0.returns.as_deref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.0.synthetic
    }

    /// `name(Type1,Type2)`, used to match overriding declarations.
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self
            .parameters()
            .iter()
            .map(|p| p.type_name.as_str())
            .collect();
        format!("{}({})", self.name(), types.join(","))
    }
}

impl TagOwner for MethodHandle {
    fn owner_name(&self) -> String {
        format!("{}#{}", self.owner(), self.name())
    }

    fn tag_storage(&self) -> &TagStorage {
        &self.0.tags
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MethodHandle")
            .field(&self.owner_name())
            .finish()
    }
}
