//! Request mappings collected from handler types.

use crate::discovery::{MethodHandle, TypeHandle};
use crate::metadata::{attr, kinds, Tag, TagOwner};
use crate::registry::Bean;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    /// Methods served by a mapping that does not restrict them.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
    ];

    /// Lowercase name, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
    }

    fn from_shortcut(kind: &str) -> Option<Self> {
        match kind {
            kinds::GET_MAPPING => Some(HttpMethod::Get),
            kinds::POST_MAPPING => Some(HttpMethod::Post),
            kinds::PUT_MAPPING => Some(HttpMethod::Put),
            kinds::PATCH_MAPPING => Some(HttpMethod::Patch),
            kinds::DELETE_MAPPING => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// One (path, method) served by a handler method.
#[derive(Debug, Clone)]
pub struct RouteMapping {
    pub path: String,
    pub method: HttpMethod,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    pub handler_method: MethodHandle,
}

/// Every route of one handler, registered as `<HandlerName>HandlerMapping`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub handler_name: String,
    pub handler_type: TypeHandle,
    pub routes: Vec<RouteMapping>,
}

const MAPPING_KINDS: [&str; 6] = [
    kinds::REQUEST_MAPPING,
    kinds::GET_MAPPING,
    kinds::POST_MAPPING,
    kinds::PUT_MAPPING,
    kinds::PATCH_MAPPING,
    kinds::DELETE_MAPPING,
];

impl RouteTable {
    /// Type under which route tables are registered.
    pub fn table_type() -> TypeHandle {
        TypeHandle::native::<RouteTable>()
    }

    pub fn bean_name(handler_name: &str) -> String {
        format!("{}HandlerMapping", handler_name)
    }

    /// Collect the routes of `handler_type` and its supertypes.
    ///
    /// Synthetic methods are skipped. When two methods map the same path and
    /// method, the one found first (the handler's own) is kept.
    pub fn collect(handler_name: &str, handler_type: &TypeHandle) -> Self {
        let type_mapping = handler_type.find_tag_in_hierarchy(kinds::REQUEST_MAPPING);
        let prefixes = type_mapping
            .as_deref()
            .map(mapping_paths)
            .filter(|paths| !paths.is_empty())
            .unwrap_or_else(|| vec![String::new()]);
        let type_produces = type_mapping
            .as_deref()
            .map(|t| t.strings(attr::PRODUCES))
            .unwrap_or_default();
        let type_consumes = type_mapping
            .as_deref()
            .map(|t| t.strings(attr::CONSUMES))
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut routes = Vec::new();

        for method in handler_type.methods_in_hierarchy() {
            if method.is_synthetic() {
                continue;
            }
            let Some((mapping, methods)) = method_mapping(&method) else {
                continue;
            };

            let mut paths = mapping_paths(&mapping);
            if paths.is_empty() {
                paths.push(String::new());
            }
            let produces = non_empty_or(mapping.strings(attr::PRODUCES), &type_produces);
            let consumes = non_empty_or(mapping.strings(attr::CONSUMES), &type_consumes);

            for prefix in &prefixes {
                for path in &paths {
                    let full_path = join_paths(prefix, path);
                    for http_method in &methods {
                        if !seen.insert((full_path.clone(), *http_method)) {
                            debug!(
                                "Skipping duplicate mapping {} {} on {}",
                                http_method,
                                full_path,
                                method.owner_name()
                            );
                            continue;
                        }
                        routes.push(RouteMapping {
                            path: full_path.clone(),
                            method: *http_method,
                            produces: produces.clone(),
                            consumes: consumes.clone(),
                            handler_method: method.clone(),
                        });
                    }
                }
            }
        }

        debug!("Collected {} routes for {}", routes.len(), handler_name);
        Self {
            handler_name: handler_name.to_string(),
            handler_type: handler_type.clone(),
            routes,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Bean for RouteTable {
    fn bean_type(&self) -> TypeHandle {
        RouteTable::table_type()
    }
}

/// The first mapping tag of a method and the methods it serves.
fn method_mapping(method: &MethodHandle) -> Option<(Tag, Vec<HttpMethod>)> {
    MAPPING_KINDS.iter().find_map(|kind| {
        let tag = method.tag(kind)?;
        let methods = match HttpMethod::from_shortcut(kind) {
            Some(shortcut) => vec![shortcut],
            None => {
                let declared: Vec<HttpMethod> = tag
                    .strings(attr::METHOD)
                    .iter()
                    .filter_map(|m| HttpMethod::parse(m))
                    .collect();
                if declared.is_empty() {
                    HttpMethod::ALL.to_vec()
                } else {
                    declared
                }
            }
        };
        Some((tag.as_ref().clone(), methods))
    })
}

/// `path` and its alias `value`, in that order.
fn mapping_paths(tag: &Tag) -> Vec<String> {
    let mut paths = tag.strings(attr::PATH);
    for value in tag.strings(attr::VALUE) {
        if !paths.contains(&value) {
            paths.push(value);
        }
    }
    paths
}

fn non_empty_or(values: Vec<String>, fallback: &[String]) -> Vec<String> {
    if values.is_empty() {
        fallback.to_vec()
    } else {
        values
    }
}

/// Join two path fragments into `/a/b` form; the empty path is `/`.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{MethodManifest, TypeCatalog, TypeLoader, UnitManifest};
    use std::sync::Arc;

    fn method(name: &str, tags: Vec<Tag>) -> MethodManifest {
        MethodManifest {
            name: name.to_string(),
            tags,
            ..Default::default()
        }
    }

    fn load(units: Vec<(&str, UnitManifest)>, id: &str) -> TypeHandle {
        let mut catalog = TypeCatalog::new();
        for (identifier, manifest) in units {
            catalog.register(identifier, manifest).unwrap();
        }
        TypeLoader::new()
            .with_source(Arc::new(catalog))
            .load(id)
            .unwrap()
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/api/test/object/", "string"), "/api/test/object/string");
        assert_eq!(join_paths("", "/users/{id}"), "/users/{id}");
        assert_eq!(join_paths("api//v1", ""), "/api/v1");
        assert_eq!(join_paths("", ""), "/");
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("delete"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("TRACE"), None);
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_routes_from_interface_mappings() {
        let api = UnitManifest {
            tags: vec![Tag::new(kinds::REQUEST_MAPPING).with(attr::VALUE, "/api/users/")],
            methods: vec![
                method(
                    "list",
                    vec![Tag::new(kinds::GET_MAPPING).with(attr::PRODUCES, "application/json")],
                ),
                method(
                    "create",
                    vec![Tag::new(kinds::REQUEST_MAPPING)
                        .with(attr::METHOD, "POST")
                        .with(attr::PATH, "new")],
                ),
            ],
            ..Default::default()
        };
        let controller = UnitManifest {
            supertypes: vec!["org.acme.UserApi".into()],
            tags: vec![Tag::new(kinds::REST_CONTROLLER)],
            methods: vec![method("list", vec![]), method("create", vec![])],
            ..Default::default()
        };
        let ty = load(
            vec![("org.acme.UserApi", api), ("org.acme.UserController", controller)],
            "org.acme.UserController",
        );

        let table = RouteTable::collect("UserController", &ty);
        let routes: Vec<(String, HttpMethod)> = table
            .routes
            .iter()
            .map(|r| (r.path.clone(), r.method))
            .collect();

        assert_eq!(
            routes,
            vec![
                ("/api/users".to_string(), HttpMethod::Get),
                ("/api/users/new".to_string(), HttpMethod::Post),
            ]
        );
        assert_eq!(table.routes[0].produces, vec!["application/json".to_string()]);
        assert_eq!(table.routes[0].handler_method.owner(), "org.acme.UserApi");
    }

    #[test]
    fn test_unrestricted_mapping_serves_every_method() {
        let unit = UnitManifest {
            methods: vec![method(
                "any",
                vec![Tag::new(kinds::REQUEST_MAPPING).with(attr::VALUE, "/any")],
            )],
            ..Default::default()
        };
        let ty = load(vec![("org.acme.Any", unit)], "org.acme.Any");

        let table = RouteTable::collect("Any", &ty);
        assert_eq!(table.len(), HttpMethod::ALL.len());
    }

    #[test]
    fn test_duplicate_and_synthetic_methods_skipped() {
        let mut bridge = method("list", vec![Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "/x")]);
        bridge.synthetic = true;
        let unit = UnitManifest {
            methods: vec![
                method("list", vec![Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "/items")]),
                method("listAgain", vec![Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "/items")]),
                bridge,
            ],
            ..Default::default()
        };
        let ty = load(vec![("org.acme.Items", unit)], "org.acme.Items");

        let table = RouteTable::collect("Items", &ty);
        assert_eq!(table.len(), 1);
        assert_eq!(table.routes[0].handler_method.name(), "list");
    }

    #[test]
    fn test_route_table_bean_type() {
        let table = RouteTable {
            handler_name: "Items".into(),
            handler_type: RouteTable::table_type(),
            routes: Vec::new(),
        };
        assert_eq!(table.bean_type().simple_name(), "RouteTable");
        assert_eq!(RouteTable::bean_name("Items"), "ItemsHandlerMapping");
        assert!(table.is_empty());
    }
}
