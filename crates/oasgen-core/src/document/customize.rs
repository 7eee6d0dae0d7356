//! Post-processing applied to a built document.

use super::model::{
    ApiDocument, OAuthFlow, OAuthFlows, SecurityRequirement, SecurityScheme, ServerObject,
};
use crate::config::{DefaultsConfig, DocumentConfig, GeneratorProperties};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A step that adjusts a built document.
pub trait DocumentCustomizer {
    fn customize(&self, document: &mut ApiDocument);
}

/// Strips one leading `_` from operation ids.
pub struct OperationIdNormalizer;

impl DocumentCustomizer for OperationIdNormalizer {
    fn customize(&self, document: &mut ApiDocument) {
        for operation in document.operations_mut() {
            if let Some(id) = &mut operation.operation_id {
                if let Some(stripped) = id.strip_prefix('_') {
                    debug!("Normalized operation id {}", id);
                    *id = stripped.to_string();
                }
            }
        }
    }
}

/// Replaces the server list.
pub struct ServersCustomizer {
    pub servers: Vec<ServerObject>,
}

impl DocumentCustomizer for ServersCustomizer {
    fn customize(&self, document: &mut ApiDocument) {
        document.servers = self.servers.clone();
    }
}

/// Adds an implicit-flow OAuth2 scheme and requires it globally.
pub struct OAuth2Customizer {
    pub authorization_url: String,
}

impl DocumentCustomizer for OAuth2Customizer {
    fn customize(&self, document: &mut ApiDocument) {
        let name = DocumentConfig::OAUTH2_SCHEME_NAME.to_string();
        document.components.security_schemes.insert(
            name.clone(),
            SecurityScheme {
                scheme_type: "oauth2".to_string(),
                flows: OAuthFlows {
                    implicit: Some(OAuthFlow {
                        authorization_url: self.authorization_url.clone(),
                        scopes: BTreeMap::new(),
                    }),
                },
            },
        );

        let requirement: SecurityRequirement = BTreeMap::from([(name, Vec::new())]);
        if !document.security.contains(&requirement) {
            document.security.push(requirement);
        }
    }
}

/// Adds `x-` extensions; other keys are skipped.
pub struct ExtensionsCustomizer {
    pub extensions: BTreeMap<String, String>,
}

impl DocumentCustomizer for ExtensionsCustomizer {
    fn customize(&self, document: &mut ApiDocument) {
        for (key, value) in &self.extensions {
            if !key.starts_with(DocumentConfig::EXTENSION_PREFIX) {
                warn!("Ignoring extension '{}': names must start with 'x-'", key);
                continue;
            }
            document
                .extensions
                .insert(key.clone(), Value::String(value.clone()));
        }
    }
}

/// Sets title and version when configured.
pub struct InfoCustomizer {
    pub title: Option<String>,
    pub version: Option<String>,
}

impl DocumentCustomizer for InfoCustomizer {
    fn customize(&self, document: &mut ApiDocument) {
        if let Some(title) = &self.title {
            document.info.title = title.clone();
        }
        if let Some(version) = &self.version {
            document.info.version = version.clone();
        }
    }
}

/// Customizers for the given properties, in application order.
pub fn customizers_for(properties: &GeneratorProperties) -> Vec<Box<dyn DocumentCustomizer>> {
    let mut customizers: Vec<Box<dyn DocumentCustomizer>> = vec![
        Box::new(OperationIdNormalizer),
        Box::new(InfoCustomizer {
            title: properties.title.clone(),
            version: properties.api_version.clone(),
        }),
        Box::new(ServersCustomizer {
            servers: properties
                .servers
                .iter()
                .map(|s| ServerObject {
                    url: s.url.clone(),
                    description: s.description.clone(),
                })
                .collect(),
        }),
    ];

    if properties.oauth2.enabled {
        customizers.push(Box::new(OAuth2Customizer {
            authorization_url: properties
                .oauth2
                .authorization_url
                .clone()
                .unwrap_or_else(|| DefaultsConfig::OAUTH2_AUTHORIZATION_URL.to_string()),
        }));
    }

    customizers.push(Box::new(ExtensionsCustomizer {
        extensions: properties.extensions.clone(),
    }));
    customizers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::OperationObject;

    fn document_with_operation(id: &str) -> ApiDocument {
        let mut document = ApiDocument::default();
        document.paths.entry("/items".into()).or_default().insert(
            "get".into(),
            OperationObject {
                operation_id: Some(id.into()),
                ..Default::default()
            },
        );
        document
    }

    #[test]
    fn test_operation_id_normalization() {
        let mut document = document_with_operation("_listItems");
        OperationIdNormalizer.customize(&mut document);
        assert_eq!(
            document.operation("/items", "get").unwrap().operation_id.as_deref(),
            Some("listItems")
        );

        let mut document = document_with_operation("listItems");
        OperationIdNormalizer.customize(&mut document);
        assert_eq!(
            document.operation("/items", "get").unwrap().operation_id.as_deref(),
            Some("listItems")
        );
    }

    #[test]
    fn test_oauth2_scheme_and_requirement() {
        let mut document = ApiDocument::default();
        let customizer = OAuth2Customizer {
            authorization_url: "https://auth.example.com/authorize".into(),
        };
        customizer.customize(&mut document);
        customizer.customize(&mut document);

        let scheme = &document.components.security_schemes["OAuth2"];
        assert_eq!(scheme.scheme_type, "oauth2");
        assert_eq!(
            scheme.flows.implicit.as_ref().unwrap().authorization_url,
            "https://auth.example.com/authorize"
        );
        assert_eq!(document.security.len(), 1);
        assert!(document.security[0].contains_key("OAuth2"));
    }

    #[test]
    fn test_only_x_extensions_are_added() {
        let mut document = ApiDocument::default();
        ExtensionsCustomizer {
            extensions: BTreeMap::from([
                ("x-audience".to_string(), "internal".to_string()),
                ("audience".to_string(), "public".to_string()),
            ]),
        }
        .customize(&mut document);

        assert_eq!(document.extensions.len(), 1);
        assert_eq!(document.extensions["x-audience"], Value::String("internal".into()));
    }

    #[test]
    fn test_customizers_follow_properties() {
        let mut properties = GeneratorProperties::new("org.acme");
        properties.apply_defaults(None, None);
        assert_eq!(customizers_for(&properties).len(), 4);

        properties.oauth2.enabled = true;
        let mut document = ApiDocument::default();
        for customizer in customizers_for(&properties) {
            customizer.customize(&mut document);
        }
        assert_eq!(document.servers[0].url, "/");
        assert_eq!(
            document.components.security_schemes["OAuth2"]
                .flows
                .implicit
                .as_ref()
                .unwrap()
                .authorization_url,
            "http://automatically/replaced/on/runtime"
        );
    }
}
