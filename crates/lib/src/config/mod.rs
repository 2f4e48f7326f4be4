//! Stack configuration.
//!
//! All settings are resolved once, at startup, into a `StackConfig` that is
//! passed by reference to whatever needs it. Sources, in increasing priority:
//! 1. Built-in defaults
//! 2. A TOML file (`stackpack.toml` unless another path is given)
//! 3. `STACKPACK_*` environment variables
//!
//! `Settings` is the merged, unvalidated view. `StackConfig` additionally
//! requires `project` and `stack`; a missing value fails with
//! `ConfigError::Missing` naming the key.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  ARTIFACT_FILENAME, CONFIG_FILENAME, CONTAINER_ARTIFACT_PATH, CONTAINER_MOUNT_POINT, DEFAULT_DOCKER_BINARY,
  DEFAULT_DOCKERFILE, DEFAULT_GCS_ENDPOINT, DEFAULT_IMAGE_TAG, ENV_PREFIX,
};
use crate::naming::construct_name;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required configuration key '{key}' (set it in the config file or {})", env_var_for(.key))]
  Missing { key: String },

  #[error("failed to read config file {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },
}

/// Settings for the containerized package build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSettings {
  /// Build descriptor, relative to the source directory.
  pub dockerfile: PathBuf,
  /// Tag for the build image.
  pub image_tag: String,
  /// File name of the artifact written into the source directory.
  pub artifact_name: String,
  /// Path of the finished package inside the build image.
  pub container_artifact: String,
  /// Where the source directory is mounted in the copy container.
  pub container_mount: String,
  /// Container runtime executable.
  pub docker_binary: String,
}

impl Default for PackageSettings {
  fn default() -> Self {
    Self {
      dockerfile: PathBuf::from(DEFAULT_DOCKERFILE),
      image_tag: DEFAULT_IMAGE_TAG.to_string(),
      artifact_name: ARTIFACT_FILENAME.to_string(),
      container_artifact: CONTAINER_ARTIFACT_PATH.to_string(),
      container_mount: CONTAINER_MOUNT_POINT.to_string(),
      docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
    }
  }
}

/// Settings for the object storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
  pub bucket: Option<String>,
  pub endpoint: String,
  /// OAuth bearer token sent with object requests, if any.
  pub access_token: Option<String>,
}

impl Default for StorageSettings {
  fn default() -> Self {
    Self {
      bucket: None,
      endpoint: DEFAULT_GCS_ENDPOINT.to_string(),
      access_token: None,
    }
  }
}

impl StorageSettings {
  /// The configured bucket.
  pub fn bucket(&self) -> Result<&str, ConfigError> {
    self
      .bucket
      .as_deref()
      .filter(|b| !b.is_empty())
      .ok_or_else(|| ConfigError::Missing {
        key: "storage.bucket".to_string(),
      })
  }
}

/// Settings merged from the config file and environment, before validation.
///
/// Commands that only build or fetch need nothing beyond the `package` and
/// `storage` sections; anything naming resources converts to a `StackConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
  pub project: Option<String>,
  pub stack: Option<String>,
  pub region: Option<String>,
  pub package: PackageSettings,
  pub storage: StorageSettings,
}

impl Settings {
  /// Read settings from a file and the environment.
  ///
  /// An explicit `path` must exist. Without one, `stackpack.toml` in the
  /// current directory is used when present.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut settings = match path {
      Some(path) => read_file(path)?,
      None => {
        let default_path = Path::new(CONFIG_FILENAME);
        if default_path.exists() {
          read_file(default_path)?
        } else {
          debug!("no config file found, using defaults and environment");
          Settings::default()
        }
      }
    };

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
  }

  /// Validate the stack identity.
  pub fn into_stack_config(self) -> Result<StackConfig, ConfigError> {
    Ok(StackConfig {
      project: require(self.project, "project")?,
      stack: require(self.stack, "stack")?,
      region: self.region.filter(|r| !r.is_empty()),
      package: self.package,
      storage: self.storage,
    })
  }
}

/// Validated stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackConfig {
  pub project: String,
  pub stack: String,
  pub region: Option<String>,
  pub package: PackageSettings,
  pub storage: StorageSettings,
}

impl StackConfig {
  /// Create a configuration with defaults for everything but the identity.
  pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      stack: stack.into(),
      region: None,
      package: PackageSettings::default(),
      storage: StorageSettings::default(),
    }
  }

  /// Load and validate the configuration from a file and the environment.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    Settings::load(path)?.into_stack_config()
  }

  /// Parse a configuration from TOML text, without environment overrides.
  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    parse(content, Path::new("<inline>"))?.into_stack_config()
  }

  /// The configured storage bucket.
  pub fn bucket(&self) -> Result<&str, ConfigError> {
    self.storage.bucket()
  }

  /// Stack-scoped name for a resource, e.g. `myproj-dev-database`.
  pub fn resource_name(&self, resource: &str) -> String {
    construct_name(&self.project, &self.stack, resource)
  }
}

/// Environment variable that overrides a configuration key.
fn env_var_for(key: &str) -> String {
  let suffix = match key {
    "storage.bucket" => "BUCKET",
    "storage.endpoint" => "GCS_ENDPOINT",
    "storage.access_token" => "GCS_TOKEN",
    "package.docker_binary" => "DOCKER",
    other => return format!("{ENV_PREFIX}{}", other.to_uppercase()),
  };
  format!("{ENV_PREFIX}{suffix}")
}

fn require(value: Option<String>, key: &str) -> Result<String, ConfigError> {
  value.filter(|v| !v.is_empty()).ok_or_else(|| ConfigError::Missing { key: key.to_string() })
}

fn read_file(path: &Path) -> Result<Settings, ConfigError> {
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), "loaded config file");
  parse(&content, path)
}

fn parse(content: &str, path: &Path) -> Result<Settings, ConfigError> {
  toml::from_str(content).map_err(|e| ConfigError::Parse {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

/// Overlay `STACKPACK_*` variables onto the file settings.
fn apply_env_overrides(raw: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
  let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

  if let Some(v) = var("PROJECT") {
    raw.project = Some(v);
  }
  if let Some(v) = var("STACK") {
    raw.stack = Some(v);
  }
  if let Some(v) = var("REGION") {
    raw.region = Some(v);
  }
  if let Some(v) = var("BUCKET") {
    raw.storage.bucket = Some(v);
  }
  if let Some(v) = var("GCS_ENDPOINT") {
    raw.storage.endpoint = v;
  }
  if let Some(v) = var("GCS_TOKEN") {
    raw.storage.access_token = Some(v);
  }
  if let Some(v) = var("DOCKER") {
    raw.package.docker_binary = v;
  }
}
