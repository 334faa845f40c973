// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Launch Configuration Types
//
// Defines the configuration schema for a launch host, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Site identity (site URL, processing URL handed to containers)
// - Build root for staged mount directories
// - Path translation between the platform host and the execution host
// - Container engine connection
// - File-backed config and entity stores

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "launchkit/v1";
pub const KIND: &str = "LaunchConfig";

/// Top-level Kubernetes-style launch configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfigManifest {
    /// API version (must be "launchkit/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "LaunchConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: LaunchConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable host name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchConfigSpec {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub stores: StoreConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public URL of the platform
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// URL containers use to reach the platform, when it differs from the
    /// public one (e.g. an internal network address)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_url: Option<String>,
}

impl SiteConfig {
    /// Address injected into containers: processing URL, else site URL
    pub fn container_facing_url(&self) -> &str {
        self.processing_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.site_url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            processing_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory under which staged mount directories are allocated
    #[serde(default = "default_build_root")]
    pub build_root: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_root: default_build_root(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Prefix rewrites from platform-host paths to execution-host paths,
    /// tried longest prefix first
    #[serde(default)]
    pub path_translations: Vec<PathTranslation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTranslation {
    pub local_prefix: String,
    pub remote_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to Docker socket
    /// Default: auto-detect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_socket_path: Option<String>,

    /// Address of the execution host as known to the transporter
    #[serde(default = "default_execution_host")]
    pub execution_host: String,

    /// Pull images that are missing locally before launch
    #[serde(default = "default_true")]
    pub autopull: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket_path: None,
            execution_host: default_execution_host(),
            autopull: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root of the file-backed tool configuration store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_root: Option<PathBuf>,

    /// Root of the file-backed entity snapshot store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_site_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_build_root() -> PathBuf {
    std::env::temp_dir().join("launchkit").join("build")
}

fn default_execution_host() -> String {
    "unix:///var/run/docker.sock".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LaunchConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "launchkit-host".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: LaunchConfigSpec::default(),
        }
    }
}

impl LaunchConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. LAUNCHKIT_CONFIG_PATH environment variable
    /// 2. ./launchkit-config.yaml (working directory)
    /// 3. ~/.launchkit/config.yaml (user home)
    /// 4. /etc/launchkit/config.yaml (system, Unix) or C:\ProgramData\Launchkit\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("LAUNCHKIT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./launchkit-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".launchkit").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/launchkit/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Launchkit\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LAUNCHKIT_BUILD_ROOT") {
            if val.trim().is_empty() {
                tracing::warn!("Ignoring empty LAUNCHKIT_BUILD_ROOT");
            } else {
                tracing::info!("Environment override: LAUNCHKIT_BUILD_ROOT={}", val);
                self.spec.build.build_root = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("LAUNCHKIT_PROCESSING_URL") {
            tracing::info!("Environment override: LAUNCHKIT_PROCESSING_URL={}", val);
            self.spec.site.processing_url = Some(val);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.site.site_url.trim().is_empty() {
            anyhow::bail!("spec.site.site_url cannot be empty");
        }

        if !self.spec.build.build_root.is_absolute() {
            anyhow::bail!(
                "spec.build.build_root must be an absolute path: {:?}",
                self.spec.build.build_root
            );
        }

        for translation in &self.spec.transport.path_translations {
            if translation.local_prefix.is_empty() || translation.remote_prefix.is_empty() {
                anyhow::bail!("Path translation prefixes cannot be empty");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = LaunchConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(!manifest.metadata.name.is_empty());
        assert!(manifest.spec.transport.path_translations.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
apiVersion: launchkit/v1
kind: LaunchConfig
metadata:
  name: test-host
spec:
  site:
    site_url: https://xnat.example.org
    processing_url: http://xnat-internal:8080
  build:
    build_root: /data/build
  transport:
    path_translations:
      - local_prefix: /data
        remote_prefix: /mnt/data
  stores:
    config_root: /data/config
"#;
        let manifest = LaunchConfigManifest::from_yaml_str(yaml).unwrap();

        assert_eq!(manifest.metadata.name, "test-host");
        assert_eq!(manifest.spec.site.container_facing_url(), "http://xnat-internal:8080");
        assert_eq!(manifest.spec.build.build_root, PathBuf::from("/data/build"));
        assert_eq!(manifest.spec.transport.path_translations.len(), 1);
        assert!(manifest.spec.runtime.autopull);
        assert!(manifest.spec.stores.entity_root.is_none());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_container_facing_url_falls_back_to_site_url() {
        let mut site = SiteConfig::default();
        site.site_url = "https://xnat.example.org".to_string();
        assert_eq!(site.container_facing_url(), "https://xnat.example.org");

        site.processing_url = Some(" ".to_string());
        assert_eq!(site.container_facing_url(), "https://xnat.example.org");
    }

    #[test]
    fn test_validation() {
        let mut manifest = LaunchConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.build.build_root = PathBuf::from("relative/build");
        assert!(manifest.validate().is_err());
        manifest.spec.build.build_root = PathBuf::from("/data/build");

        manifest.spec.transport.path_translations.push(PathTranslation {
            local_prefix: String::new(),
            remote_prefix: "/mnt".to_string(),
        });
        assert!(manifest.validate().is_err());
    }
}
