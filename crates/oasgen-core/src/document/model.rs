//! Serializable API description document.

use crate::config::DocumentConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Path -> lowercase HTTP method -> operation.
pub type Paths = BTreeMap<String, BTreeMap<String, OperationObject>>;

/// Security requirement: scheme name -> scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagObject>,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    /// `x-` extensions, serialized inline
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Default for ApiDocument {
    fn default() -> Self {
        Self {
            openapi: DocumentConfig::OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            security: Vec::new(),
            tags: Vec::new(),
            paths: Paths::new(),
            components: Components::default(),
            extensions: BTreeMap::new(),
        }
    }
}

impl ApiDocument {
    /// Operation at `path` for `method` (lowercase).
    pub fn operation(&self, path: &str, method: &str) -> Option<&OperationObject> {
        self.paths.get(path).and_then(|item| item.get(method))
    }

    /// Every operation, in path order.
    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut OperationObject> {
        self.paths.values_mut().flat_map(|item| item.values_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: DocumentConfig::DEFAULT_TITLE.to_string(),
            version: DocumentConfig::DEFAULT_VERSION.to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerObject {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationObject {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBodyObject>,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseObject>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBodyObject {
    pub content: BTreeMap<String, MediaTypeObject>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseObject {
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaTypeObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTypeObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaObject>>,
}

impl SchemaObject {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::of_type(schema_type)
        }
    }

    pub fn reference(component: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", component)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaObject>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.security_schemes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub flows: OAuthFlows,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthFlow {
    pub authorization_url: String,
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_serialization() {
        let mut document = ApiDocument::default();
        document
            .extensions
            .insert("x-audience".into(), Value::String("internal".into()));
        let mut operation = OperationObject {
            operation_id: Some("listUsers".into()),
            ..Default::default()
        };
        operation.responses.insert(
            "200".into(),
            ResponseObject {
                description: "OK".into(),
                content: BTreeMap::new(),
            },
        );
        document
            .paths
            .entry("/users".into())
            .or_default()
            .insert("get".into(), operation);

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["openapi"], "3.0.1");
        assert_eq!(json["info"]["title"], "OpenAPI definition");
        assert_eq!(json["x-audience"], "internal");
        assert_eq!(json["paths"]["/users"]["get"]["operationId"], "listUsers");
        assert!(json.get("components").is_none());
        assert!(json["paths"]["/users"]["get"].get("deprecated").is_none());
    }

    #[test]
    fn test_schema_reference_serialization() {
        let json = serde_json::to_value(SchemaObject::reference("User")).unwrap();
        assert_eq!(json["$ref"], "#/components/schemas/User");
        assert!(json.get("type").is_none());
    }
}
