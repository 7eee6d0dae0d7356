//! oasgen - generates an OpenAPI document from unit manifests at build time.
//!
//! Settings come from an optional JSON properties file; command-line flags
//! override individual values.

use anyhow::{bail, Context, Result};
use clap::Parser;
use oasgen_core::{Generator, GeneratorError, GeneratorProperties, ServerProperties};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "oasgen")]
#[command(about = "Generate an OpenAPI document from API unit manifests")]
struct Args {
    /// JSON properties file
    #[arg(long)]
    properties: Option<PathBuf>,

    /// Comma-separated packages to scan
    #[arg(short, long)]
    packages: Option<String>,

    /// Output file (must end in .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scan root holding the unit manifests
    #[arg(long)]
    classes_dir: Option<PathBuf>,

    /// Build directory the default output file is placed in
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Schema type written for open-object schemas
    #[arg(long)]
    schema_for_object_class: Option<String>,

    /// Server URL; may be repeated
    #[arg(long = "server")]
    servers: Vec<String>,

    /// Enable the OAuth2 implicit flow
    #[arg(long)]
    oauth2: bool,

    /// OAuth2 authorization URL (implies --oauth2)
    #[arg(long)]
    oauth2_url: Option<String>,

    /// Document extension as key=value; may be repeated
    #[arg(long = "extension", value_parser = parse_extension)]
    extensions: Vec<(String, String)>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Document version
    #[arg(long)]
    api_version: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_extension(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", value)),
    }
}

/// One-line report of a failed run, naming the error kind.
fn failure_message(err: &GeneratorError) -> String {
    let mut message = format!("Document generation failed [{}]", err.kind());
    if err.is_container_error() {
        message.push_str(": a handler bean could not be registered or looked up");
    }
    message
}

impl Args {
    /// Properties from the file (if any) with flags applied on top.
    fn into_properties(self) -> Result<GeneratorProperties> {
        let mut properties = match &self.properties {
            Some(path) => GeneratorProperties::from_json_file(path)
                .with_context(|| format!("Failed to load properties from {}", path.display()))?,
            None => GeneratorProperties::default(),
        };

        if let Some(packages) = self.packages {
            properties.packages_to_scan = packages;
        }
        if properties.packages_to_scan.trim().is_empty() {
            bail!("No packages to scan; pass --packages or set packagesToScan");
        }

        if self.output.is_some() {
            properties.output_file = self.output;
        }
        if self.classes_dir.is_some() {
            properties.classes_dir = self.classes_dir;
        }
        if self.schema_for_object_class.is_some() {
            properties.schema_for_object_class = self.schema_for_object_class;
        }
        if !self.servers.is_empty() {
            properties.servers = self.servers.into_iter().map(ServerProperties::new).collect();
        }
        if self.oauth2 || self.oauth2_url.is_some() {
            properties.oauth2.enabled = true;
        }
        if self.oauth2_url.is_some() {
            properties.oauth2.authorization_url = self.oauth2_url;
        }
        properties.extensions.extend(self.extensions);
        if self.title.is_some() {
            properties.title = self.title;
        }
        if self.api_version.is_some() {
            properties.api_version = self.api_version;
        }

        properties.apply_defaults(self.build_dir.as_deref(), None);
        Ok(properties)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting oasgen {}", env!("CARGO_PKG_VERSION"));

    let generator = Generator::new(args.into_properties()?);
    let properties = generator.properties();
    info!("Packages: {}", properties.packages_to_scan);
    info!("Scan root: {}", properties.scan_root().display());
    info!("Output: {}", properties.output_path().display());

    let (outcome, output) = match generator.run() {
        Ok(result) => result,
        Err(err) => {
            let message = failure_message(&err);
            error!("{}", message);
            return Err(anyhow::Error::new(err).context(message));
        }
    };

    // Summary on stdout for build scripts
    let summary = serde_json::json!({
        "output": output.display().to_string(),
        "paths": outcome.document.paths.len(),
        "handlers": outcome.handlers,
        "overrides": outcome.overrides.len(),
    });
    println!("{}", summary);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_extension() {
        assert_eq!(
            parse_extension("x-team = payments").unwrap(),
            ("x-team".to_string(), "payments".to_string())
        );
        assert_eq!(
            parse_extension("x-empty=").unwrap(),
            ("x-empty".to_string(), String::new())
        );
        assert!(parse_extension("novalue").is_err());
        assert!(parse_extension("=value").is_err());
    }

    #[test]
    fn test_flags_become_properties() {
        let args = Args::parse_from([
            "oasgen",
            "--packages",
            "org.acme.api,org.acme.admin",
            "--classes-dir",
            "units",
            "--server",
            "https://api.example.com",
            "--oauth2-url",
            "https://auth.example.com/authorize",
            "--extension",
            "x-team=payments",
            "--schema-for-object-class",
            "Map",
        ]);
        let properties = args.into_properties().unwrap();

        assert_eq!(properties.packages().len(), 2);
        assert_eq!(properties.scan_root(), PathBuf::from("units"));
        assert_eq!(properties.servers[0].url, "https://api.example.com");
        assert!(properties.oauth2.enabled);
        assert_eq!(properties.extensions["x-team"], "payments");
        assert_eq!(properties.object_schema_type(), "map");
        assert_eq!(
            properties.output_path(),
            PathBuf::from("target/generated-openapi.json")
        );
    }

    #[test]
    fn test_flags_override_properties_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("oasgen.json");
        std::fs::write(
            &path,
            r#"{ "packagesToScan": "org.file", "title": "From file", "extensions": { "x-a": "1" } }"#,
        )
        .unwrap();

        let args = Args::parse_from([
            "oasgen",
            "--properties",
            path.to_str().unwrap(),
            "--title",
            "From flags",
            "--extension",
            "x-b=2",
        ]);
        let properties = args.into_properties().unwrap();

        assert_eq!(properties.packages_to_scan, "org.file");
        assert_eq!(properties.title.as_deref(), Some("From flags"));
        assert_eq!(properties.extensions.len(), 2);
    }

    #[test]
    fn test_failure_message_names_error_kind() {
        let duplicate = GeneratorError::DuplicateName {
            name: "DataController".into(),
        };
        assert_eq!(
            failure_message(&duplicate),
            "Document generation failed [duplicate_name]: a handler bean could not be registered or looked up"
        );

        let config = GeneratorError::Config {
            message: "only .json is supported".into(),
        };
        assert_eq!(failure_message(&config), "Document generation failed [config]");
    }

    #[test]
    fn test_missing_packages_is_an_error() {
        let args = Args::parse_from(["oasgen"]);
        assert!(args.into_properties().is_err());
    }
}
