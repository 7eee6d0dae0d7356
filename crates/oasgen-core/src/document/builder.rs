//! Builds an [`ApiDocument`] from the beans of a container.
//!
//! The builder sees the run only through [`ContainerContract`]: it finds handler
//! beans by tag, route tables by type, and resolves every path through the
//! container's placeholder resolution.

use super::model::{
    ApiDocument, MediaTypeObject, OperationObject, ParameterObject, RequestBodyObject,
    ResponseObject, SchemaObject, TagObject,
};
use super::routes::{RouteMapping, RouteTable};
use super::schema;
use crate::discovery::{MethodHandle, TypeHandle};
use crate::error::Result;
use crate::facade::ContainerContract;
use crate::metadata::{attr, kinds, Tag, TagOwner};
use crate::registry::downcast_instance;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// `{name}` segments of a path template.
static PATH_VARIABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").unwrap());

const ANY_MEDIA_TYPE: &str = "*/*";
const JSON_MEDIA_TYPE: &str = "application/json";

type Schemas = BTreeMap<String, SchemaObject>;

pub struct DocumentBuilder<'a> {
    container: &'a dyn ContainerContract,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(container: &'a dyn ContainerContract) -> Self {
        Self { container }
    }

    pub fn build(&self) -> Result<ApiDocument> {
        let mut handlers = BTreeMap::new();
        for kind in kinds::HANDLER_KINDS {
            handlers.extend(self.container.beans_with_tag(kind));
        }
        info!("Building document for {} handlers", handlers.len());

        let mut document = ApiDocument::default();
        let tables = self.container.beans_of_type(&RouteTable::table_type());

        for (bean_name, instance) in tables {
            let table = downcast_instance::<RouteTable>(&bean_name, instance)?;
            if !handlers.contains_key(&table.handler_name) {
                warn!(
                    "Route table {} belongs to {}, which is not a registered handler",
                    bean_name, table.handler_name
                );
                continue;
            }
            let handler_type = self.container.get_type(&table.handler_name)?;

            let group = group_tag(&handler_type);
            if let Some(group) = &group {
                if !document.tags.contains(group) {
                    document.tags.push(group.clone());
                }
            }

            for route in &table.routes {
                let Some(operation) = self.build_operation(
                    &handler_type,
                    route,
                    group.as_ref(),
                    &mut document.components.schemas,
                ) else {
                    continue;
                };

                let path = self.container.resolve_embedded_value(&route.path);
                let item = document.paths.entry(path.clone()).or_default();
                if item.contains_key(route.method.as_str()) {
                    debug!("{} {} is already documented; keeping the first", route.method, path);
                    continue;
                }
                item.insert(route.method.as_str().to_string(), operation);
            }
        }

        info!("Documented {} paths", document.paths.len());
        Ok(document)
    }

    /// Operation for one route; `None` if the operation is hidden.
    fn build_operation(
        &self,
        handler_type: &TypeHandle,
        route: &RouteMapping,
        group: Option<&TagObject>,
        schemas: &mut Schemas,
    ) -> Option<OperationObject> {
        let method = &route.handler_method;
        let operation_tag = operation_tag_for(handler_type, method);

        let mut operation = OperationObject::default();
        if let Some(tag) = &operation_tag {
            if tag.bool_attr(attr::HIDDEN) == Some(true) {
                debug!("Skipping hidden operation {}", method.owner_name());
                return None;
            }
            operation.summary = tag.str_attr(attr::SUMMARY).map(String::from);
            operation.description = tag.str_attr(attr::DESCRIPTION).map(String::from);
            operation.operation_id = tag.str_attr(attr::OPERATION_ID).map(String::from);
            operation.tags = tag.strings(attr::TAGS);
            operation.deprecated = tag.bool_attr(attr::DEPRECATED).unwrap_or(false);
        }

        if operation.operation_id.is_none() {
            operation.operation_id = Some(method.name().to_string());
        }
        if operation.tags.is_empty() {
            if let Some(group) = group {
                operation.tags.push(group.name.clone());
            }
        }

        let resolved_path = self.container.resolve_embedded_value(&route.path);
        operation.parameters =
            build_parameters(operation_tag.as_deref(), method, &resolved_path, schemas);
        operation.request_body = build_request_body(method, &route.consumes, schemas);
        operation.responses =
            build_responses(operation_tag.as_deref(), method, &route.produces, schemas);

        Some(operation)
    }
}

/// The method's own `Operation` tag, else the tag of a method with the same
/// signature elsewhere in the handler hierarchy.
fn operation_tag_for(handler_type: &TypeHandle, method: &MethodHandle) -> Option<Arc<Tag>> {
    method.tag(kinds::OPERATION).or_else(|| {
        let signature = method.signature();
        handler_type
            .methods_in_hierarchy()
            .into_iter()
            .filter(|m| m.signature() == signature)
            .find_map(|m| m.tag(kinds::OPERATION))
    })
}

fn group_tag(handler_type: &TypeHandle) -> Option<TagObject> {
    let tag = handler_type.find_tag_in_hierarchy(kinds::GROUP)?;
    Some(TagObject {
        name: tag.str_attr(attr::NAME)?.to_string(),
        description: tag.str_attr(attr::DESCRIPTION).map(String::from),
    })
}

fn build_parameters(
    operation_tag: Option<&Tag>,
    method: &MethodHandle,
    path: &str,
    schemas: &mut Schemas,
) -> Vec<ParameterObject> {
    let mut parameters: Vec<ParameterObject> = Vec::new();

    if let Some(tag) = operation_tag {
        for declared in tag.tags(attr::PARAMETERS) {
            let Some(name) = declared.str_attr(attr::NAME) else {
                continue;
            };
            let location = declared.str_attr(attr::IN).unwrap_or("query").to_string();
            let required = declared
                .bool_attr(attr::REQUIRED)
                .unwrap_or(location == "path");
            let schema = declared
                .tag_attr(attr::SCHEMA)
                .map(|s| schema::from_schema_tag(s, schemas))
                .unwrap_or_else(|| SchemaObject::of_type("string"));
            push_unique(
                &mut parameters,
                ParameterObject {
                    name: name.to_string(),
                    location,
                    description: declared.str_attr(attr::DESCRIPTION).map(String::from),
                    required,
                    schema: Some(schema),
                },
            );
        }
    }

    for parameter in method.parameters() {
        let (binding, location) = if let Some(tag) = parameter.tag(kinds::PATH_VARIABLE) {
            (tag, "path")
        } else if let Some(tag) = parameter.tag(kinds::REQUEST_PARAM) {
            (tag, "query")
        } else {
            continue;
        };

        let name = binding
            .str_attr(attr::NAME)
            .or_else(|| binding.str_attr(attr::VALUE))
            .unwrap_or(&parameter.name);
        let required = location == "path" || binding.bool_attr(attr::REQUIRED).unwrap_or(true);
        push_unique(
            &mut parameters,
            ParameterObject {
                name: name.to_string(),
                location: location.to_string(),
                description: None,
                required,
                schema: Some(schema::for_type_name(&parameter.type_name, schemas)),
            },
        );
    }

    for captures in PATH_VARIABLE.captures_iter(path) {
        push_unique(
            &mut parameters,
            ParameterObject {
                name: captures[1].to_string(),
                location: "path".to_string(),
                description: None,
                required: true,
                schema: Some(SchemaObject::of_type("string")),
            },
        );
    }

    parameters
}

/// Add a parameter unless one with the same name and location exists.
fn push_unique(parameters: &mut Vec<ParameterObject>, parameter: ParameterObject) {
    let exists = parameters
        .iter()
        .any(|p| p.name == parameter.name && p.location == parameter.location);
    if !exists {
        parameters.push(parameter);
    }
}

fn build_request_body(
    method: &MethodHandle,
    consumes: &[String],
    schemas: &mut Schemas,
) -> Option<RequestBodyObject> {
    let (parameter, binding) = method
        .parameters()
        .iter()
        .find_map(|p| p.tag(kinds::REQUEST_BODY).map(|t| (p, t)))?;

    let schema = schema::for_type_name(&parameter.type_name, schemas);
    let media_types = if consumes.is_empty() {
        vec![JSON_MEDIA_TYPE.to_string()]
    } else {
        consumes.to_vec()
    };

    Some(RequestBodyObject {
        content: media_types
            .into_iter()
            .map(|media| {
                (
                    media,
                    MediaTypeObject {
                        schema: Some(schema.clone()),
                    },
                )
            })
            .collect(),
        required: binding.bool_attr(attr::REQUIRED).unwrap_or(true),
    })
}

fn build_responses(
    operation_tag: Option<&Tag>,
    method: &MethodHandle,
    produces: &[String],
    schemas: &mut Schemas,
) -> BTreeMap<String, ResponseObject> {
    let default_media = produces
        .first()
        .map(String::as_str)
        .unwrap_or(ANY_MEDIA_TYPE);
    let mut responses = BTreeMap::new();

    for declared in operation_tag.map(|t| t.tags(attr::RESPONSES)).unwrap_or_default() {
        let code = declared
            .str_attr(attr::RESPONSE_CODE)
            .unwrap_or("default")
            .to_string();
        let description = declared
            .str_attr(attr::DESCRIPTION)
            .map(String::from)
            .unwrap_or_else(|| default_description(&code).to_string());

        let mut content = BTreeMap::new();
        for declared_content in declared.tags(attr::CONTENT) {
            let media = declared_content
                .str_attr(attr::MEDIA_TYPE)
                .unwrap_or(default_media)
                .to_string();
            let schema = declared_content
                .tag_attr(attr::SCHEMA)
                .map(|s| schema::from_schema_tag(s, schemas));
            content.insert(media, MediaTypeObject { schema });
        }

        responses.insert(code, ResponseObject { description, content });
    }

    if responses.is_empty() {
        let mut content = BTreeMap::new();
        if let Some(returns) = method.returns().filter(|r| !is_void(r)) {
            let schema = schema::for_type_name(returns, schemas);
            let media_types = if produces.is_empty() {
                vec![ANY_MEDIA_TYPE.to_string()]
            } else {
                produces.to_vec()
            };
            for media in media_types {
                content.insert(
                    media,
                    MediaTypeObject {
                        schema: Some(schema.clone()),
                    },
                );
            }
        }
        responses.insert(
            "200".to_string(),
            ResponseObject {
                description: default_description("200").to_string(),
                content,
            },
        );
    }

    responses
}

fn is_void(type_name: &str) -> bool {
    matches!(type_name, "void" | "Void" | "()" | "")
}

fn default_description(code: &str) -> &'static str {
    match code {
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "500" => "Internal Server Error",
        _ => "default response",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{MethodManifest, ParameterInfo, TypeCatalog, TypeLoader, UnitManifest};
    use crate::facade::CapabilityFacade;
    use crate::registry::{Bean, BeanRegistry};

    struct Handler {
        ty: TypeHandle,
    }

    impl Bean for Handler {
        fn bean_type(&self) -> TypeHandle {
            self.ty.clone()
        }
    }

    fn user_controller() -> UnitManifest {
        let get_user = MethodManifest {
            name: "_getUser".into(),
            parameters: vec![ParameterInfo {
                name: "id".into(),
                type_name: "i64".into(),
                tags: vec![Tag::new(kinds::PATH_VARIABLE)],
            }],
            returns: Some("org.acme.model.User".into()),
            synthetic: false,
            tags: vec![Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "{id}")],
        };
        let create_user = MethodManifest {
            name: "createUser".into(),
            parameters: vec![ParameterInfo {
                name: "user".into(),
                type_name: "org.acme.model.User".into(),
                tags: vec![Tag::new(kinds::REQUEST_BODY)],
            }],
            returns: Some("void".into()),
            synthetic: false,
            tags: vec![
                Tag::new(kinds::POST_MAPPING),
                Tag::new(kinds::OPERATION)
                    .with(attr::SUMMARY, "Create a user")
                    .with(
                        attr::RESPONSES,
                        vec![Tag::new(kinds::API_RESPONSE)
                            .with(attr::RESPONSE_CODE, "201")],
                    ),
            ],
        };
        let hidden = MethodManifest {
            name: "internal".into(),
            tags: vec![
                Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "internal"),
                Tag::new(kinds::OPERATION).with(attr::HIDDEN, true),
            ],
            ..Default::default()
        };

        UnitManifest {
            tags: vec![
                Tag::new(kinds::REST_CONTROLLER),
                Tag::new(kinds::REQUEST_MAPPING).with(attr::VALUE, "/users"),
                Tag::new(kinds::GROUP).with(attr::NAME, "users"),
            ],
            methods: vec![get_user, create_user, hidden],
            ..Default::default()
        }
    }

    fn build(units: Vec<(&str, UnitManifest)>, handler: &str) -> ApiDocument {
        let mut catalog = TypeCatalog::new();
        for (id, manifest) in units {
            catalog.register(id, manifest).unwrap();
        }
        let loader = TypeLoader::new().with_source(Arc::new(catalog));
        let ty = loader.load(handler).unwrap();

        let registry = Arc::new(BeanRegistry::new());
        let name = ty.simple_name().to_string();
        registry.register_bean(Arc::new(Handler { ty: ty.clone() })).unwrap();
        registry
            .register_named_bean(RouteTable::bean_name(&name), Arc::new(RouteTable::collect(&name, &ty)))
            .unwrap();

        let facade = CapabilityFacade::new(registry);
        DocumentBuilder::new(&facade).build().unwrap()
    }

    #[test]
    fn test_operations_from_routes() {
        let document = build(
            vec![("org.acme.web.UserController", user_controller())],
            "org.acme.web.UserController",
        );

        let get = document.operation("/users/{id}", "get").unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("_getUser"));
        assert_eq!(get.tags, vec!["users".to_string()]);
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].location, "path");
        assert_eq!(
            get.parameters[0].schema,
            Some(SchemaObject::formatted("integer", "int64"))
        );
        let ok = &get.responses["200"];
        assert_eq!(
            ok.content["*/*"].schema,
            Some(SchemaObject::reference("User"))
        );

        let post = document.operation("/users", "post").unwrap();
        assert_eq!(post.summary.as_deref(), Some("Create a user"));
        assert_eq!(post.responses["201"].description, "Created");
        assert!(post.request_body.as_ref().unwrap().content.contains_key("application/json"));

        assert!(document.operation("/users/internal", "get").is_none());
        assert!(document.components.schemas.contains_key("User"));
        assert_eq!(document.tags[0].name, "users");
    }

    #[test]
    fn test_undeclared_path_variables_are_added() {
        let unit = UnitManifest {
            tags: vec![Tag::new(kinds::CONTROLLER)],
            methods: vec![MethodManifest {
                name: "item".into(),
                tags: vec![Tag::new(kinds::GET_MAPPING).with(attr::VALUE, "/orders/{orderId}/items/{itemId}")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let document = build(vec![("org.acme.Orders", unit)], "org.acme.Orders");

        let operation = document
            .operation("/orders/{orderId}/items/{itemId}", "get")
            .unwrap();
        let names: Vec<&str> = operation.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["orderId", "itemId"]);
        assert!(operation.parameters.iter().all(|p| p.required));
    }

    #[test]
    fn test_operation_tag_found_on_overridden_method() {
        let api = UnitManifest {
            tags: vec![Tag::new(kinds::REQUEST_MAPPING).with(attr::VALUE, "/ping")],
            methods: vec![MethodManifest {
                name: "ping".into(),
                tags: vec![Tag::new(kinds::GET_MAPPING)],
                ..Default::default()
            }],
            ..Default::default()
        };
        let controller = UnitManifest {
            supertypes: vec!["org.acme.PingApi".into()],
            tags: vec![Tag::new(kinds::REST_CONTROLLER)],
            methods: vec![MethodManifest {
                name: "ping".into(),
                tags: vec![Tag::new(kinds::OPERATION).with(attr::OPERATION_ID, "healthPing")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let document = build(
            vec![("org.acme.PingApi", api), ("org.acme.PingController", controller)],
            "org.acme.PingController",
        );

        let operation = document.operation("/ping", "get").unwrap();
        assert_eq!(operation.operation_id.as_deref(), Some("healthPing"));
    }
}
