//! Configuration for oasgen.
//!
//! Constants for scanning and document defaults, plus [`GeneratorProperties`], the
//! user-facing settings of one generation run.

use crate::error::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use url::Url;

/// Scan root layout.
pub struct ScanConfig;

impl ScanConfig {
    /// Extension of unit manifest files.
    pub const UNIT_EXTENSION: &'static str = "unit";
    pub const PACKAGE_SEPARATOR: char = '.';
    pub const PACKAGE_LIST_SEPARATOR: char = ',';
}

/// Defaults applied to unset properties.
pub struct DefaultsConfig;

impl DefaultsConfig {
    pub const BUILD_DIRECTORY: &'static str = "target";
    pub const SCAN_ROOT: &'static str = "target/api-units";
    pub const OUTPUT_FILE_NAME: &'static str = "generated-openapi.json";
    pub const SCHEMA_FOR_OBJECT_CLASS: &'static str = "object";
    pub const SERVER_URL: &'static str = "/";
    pub const OAUTH2_AUTHORIZATION_URL: &'static str = "http://automatically/replaced/on/runtime";
}

/// Document-level constants.
pub struct DocumentConfig;

impl DocumentConfig {
    pub const OPENAPI_VERSION: &'static str = "3.0.1";
    pub const DEFAULT_TITLE: &'static str = "OpenAPI definition";
    pub const DEFAULT_VERSION: &'static str = "v0";
    pub const OAUTH2_SCHEME_NAME: &'static str = "OAuth2";
    pub const EXTENSION_PREFIX: &'static str = "x-";
    pub const APPLICATION_NAME: &'static str = "oasgen";
}

/// A server entry of the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServerProperties {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }
}

/// OAuth2 implicit-flow settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Properties {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub authorization_url: Option<String>,
}

/// Settings of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorProperties {
    /// Comma-separated package names to scan
    #[serde(default)]
    pub packages_to_scan: String,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    /// Scan root holding the unit manifests
    #[serde(default)]
    pub classes_dir: Option<PathBuf>,
    #[serde(default)]
    pub schema_for_object_class: Option<String>,
    #[serde(default)]
    pub servers: Vec<ServerProperties>,
    #[serde(default)]
    pub oauth2: OAuth2Properties,
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
}

impl GeneratorProperties {
    /// Create properties for the given comma-separated package list.
    pub fn new(packages_to_scan: impl Into<String>) -> Self {
        Self {
            packages_to_scan: packages_to_scan.into(),
            ..Default::default()
        }
    }

    /// Load properties from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| GeneratorError::io_with_path(e, path))?;
        serde_json::from_str(&contents).map_err(|e| GeneratorError::Json {
            message: format!("Failed to parse {}: {}", path.display(), e),
            source: Some(e),
        })
    }

    /// Fill every unset value.
    ///
    /// `build_dir` anchors the default output file, `scan_root` the default unit
    /// directory; both fall back to [`DefaultsConfig`].
    pub fn apply_defaults(&mut self, build_dir: Option<&Path>, scan_root: Option<&Path>) {
        if self.output_file.is_none() {
            let build_dir = build_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DefaultsConfig::BUILD_DIRECTORY));
            self.output_file = Some(build_dir.join(DefaultsConfig::OUTPUT_FILE_NAME));
        }

        if self.classes_dir.is_none() {
            self.classes_dir = Some(
                scan_root
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DefaultsConfig::SCAN_ROOT)),
            );
        }

        self.schema_for_object_class = Some(match self.schema_for_object_class.take() {
            Some(value) if !value.trim().is_empty() => value.trim().to_lowercase(),
            _ => DefaultsConfig::SCHEMA_FOR_OBJECT_CLASS.to_string(),
        });

        if self.servers.is_empty() {
            self.servers
                .push(ServerProperties::new(DefaultsConfig::SERVER_URL));
        }

        if self
            .oauth2
            .authorization_url
            .as_deref()
            .map_or(true, |u| u.trim().is_empty())
        {
            self.oauth2.authorization_url =
                Some(DefaultsConfig::OAUTH2_AUTHORIZATION_URL.to_string());
        }
    }

    /// Check the properties for values that would make a run fail later.
    pub fn validate(&self) -> Result<()> {
        if self.packages().is_empty() {
            return Err(GeneratorError::Validation {
                field: "packagesToScan".into(),
                message: "at least one package must be given".into(),
            });
        }

        for package in self.packages() {
            if package
                .split(ScanConfig::PACKAGE_SEPARATOR)
                .any(|segment| segment.is_empty())
            {
                return Err(GeneratorError::Validation {
                    field: "packagesToScan".into(),
                    message: format!("'{}' is not a valid package name", package),
                });
            }
        }

        for server in &self.servers {
            if !server.url.starts_with('/') && Url::parse(&server.url).is_err() {
                return Err(GeneratorError::Validation {
                    field: "servers".into(),
                    message: format!("'{}' is neither a relative path nor a URL", server.url),
                });
            }
        }

        if self.oauth2.enabled {
            let url = self
                .oauth2
                .authorization_url
                .as_deref()
                .unwrap_or(DefaultsConfig::OAUTH2_AUTHORIZATION_URL);
            Url::parse(url).map_err(|e| GeneratorError::Validation {
                field: "oauth2.authorizationUrl".into(),
                message: format!("'{}' is not an absolute URL: {}", url, e),
            })?;
        }

        if let Some(output) = &self.output_file {
            let is_json = output
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if !is_json {
                return Err(GeneratorError::Config {
                    message: format!(
                        "Unsupported output format for {}; only .json is supported",
                        output.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Packages to scan: split on commas, trimmed, blanks and duplicates removed.
    pub fn packages(&self) -> BTreeSet<String> {
        self.packages_to_scan
            .split(ScanConfig::PACKAGE_LIST_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn scan_root(&self) -> PathBuf {
        self.classes_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DefaultsConfig::SCAN_ROOT))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_file.clone().unwrap_or_else(|| {
            Path::new(DefaultsConfig::BUILD_DIRECTORY).join(DefaultsConfig::OUTPUT_FILE_NAME)
        })
    }

    pub fn object_schema_type(&self) -> &str {
        self.schema_for_object_class
            .as_deref()
            .unwrap_or(DefaultsConfig::SCHEMA_FOR_OBJECT_CLASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let mut props = GeneratorProperties::new("org.acme.api");
        props.apply_defaults(Some(Path::new("build")), None);

        assert_eq!(
            props.output_file,
            Some(PathBuf::from("build/generated-openapi.json"))
        );
        assert_eq!(props.scan_root(), PathBuf::from("target/api-units"));
        assert_eq!(props.object_schema_type(), "object");
        assert_eq!(props.servers, vec![ServerProperties::new("/")]);
        assert_eq!(
            props.oauth2.authorization_url.as_deref(),
            Some("http://automatically/replaced/on/runtime")
        );
    }

    #[test]
    fn test_schema_override_lowercased() {
        let mut props = GeneratorProperties::new("org.acme");
        props.schema_for_object_class = Some("  Object ".into());
        props.apply_defaults(None, None);
        assert_eq!(props.object_schema_type(), "object");
    }

    #[test]
    fn test_packages_split_and_deduplicated() {
        let props = GeneratorProperties::new(" org.a , org.b,,org.a ");
        let packages: Vec<_> = props.packages().into_iter().collect();
        assert_eq!(packages, vec!["org.a".to_string(), "org.b".to_string()]);
    }

    #[test]
    fn test_validate_rejects_empty_packages() {
        let props = GeneratorProperties::new(" , ");
        let err = props.validate().unwrap_err();
        assert!(matches!(err, GeneratorError::Validation { .. }));
    }

    #[test]
    fn test_validate_rejects_malformed_package() {
        let props = GeneratorProperties::new("org..acme");
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_yaml_output() {
        let mut props = GeneratorProperties::new("org.acme");
        props.output_file = Some(PathBuf::from("out/openapi.yaml"));
        let err = props.validate().unwrap_err();
        assert!(matches!(err, GeneratorError::Config { .. }));
    }

    #[test]
    fn test_validate_oauth2_url() {
        let mut props = GeneratorProperties::new("org.acme");
        props.oauth2.enabled = true;
        props.oauth2.authorization_url = Some("not a url".into());
        assert!(props.validate().is_err());

        props.oauth2.authorization_url = Some("https://auth.example.com/authorize".into());
        assert!(props.validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("oasgen.json");
        std::fs::write(
            &path,
            r#"{
                "packagesToScan": "org.acme.api",
                "schemaForObjectClass": "OBJECT",
                "oauth2": { "enabled": true },
                "extensions": { "x-audience": "internal" }
            }"#,
        )
        .unwrap();

        let props = GeneratorProperties::from_json_file(&path).unwrap();
        assert_eq!(props.packages_to_scan, "org.acme.api");
        assert!(props.oauth2.enabled);
        assert_eq!(props.extensions.get("x-audience").unwrap(), "internal");
        assert_eq!(props.schema_for_object_class.as_deref(), Some("OBJECT"));
    }
}
