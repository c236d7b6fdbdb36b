//! `workspace.yaml` loading with an optional deep-merged override file.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::workspace::{Vault, Workspace};

/// Workspace configuration file name, looked up at the workspace root.
pub const WORKSPACE_CONFIG_FILE: &str = "workspace.yaml";
/// Environment variable naming an override config file.
pub const DOCTOR_CONFIG_ENV: &str = "OMNI_DOCTOR_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A config file is not valid YAML or does not match the schema.
    #[error("invalid config '{path}': {source}")]
    Yaml {
        /// Offending file.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// Two vaults share a name.
    #[error("duplicate vault name: {0}")]
    DuplicateVault(String),
    /// A vault entry has no name and none can be derived from its path.
    #[error("vault at '{0}' has no name")]
    UnnamedVault(PathBuf),
}

/// Defaults for doctor invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSettings {
    /// Default for the dry-run flag.
    #[serde(default)]
    pub dry_run: bool,
    /// Optional cap on candidates processed per invocation.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    vaults: Vec<RawVault>,
    #[serde(default)]
    doctor: DoctorSettings,
}

#[derive(Debug, Deserialize)]
struct RawVault {
    #[serde(default)]
    name: Option<String>,
    fs_path: PathBuf,
}

impl RawVault {
    fn into_vault(self) -> Result<Vault, ConfigError> {
        let name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.fs_path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
            });
        match name {
            Some(name) => Ok(Vault::new(name, self.fs_path)),
            None => Err(ConfigError::UnnamedVault(self.fs_path)),
        }
    }
}

/// Resolved workspace plus doctor defaults.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Vaults under the workspace root.
    pub workspace: Workspace,
    /// Doctor defaults.
    pub doctor: DoctorSettings,
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

fn read_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    serde_yaml::from_str::<Value>(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    deep_merge(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn resolve_override_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(absolutize(path));
    }
    let raw = std::env::var(DOCTOR_CONFIG_ENV).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(absolutize(Path::new(trimmed)))
    }
}

/// Load `<root>/workspace.yaml`, deep-merging an override file on top.
///
/// The override is `override_file` when given, otherwise the file named by
/// `OMNI_DOCTOR_CONFIG`. A missing `workspace.yaml` yields a workspace with
/// no vaults; a missing override file is an error.
///
/// # Errors
///
/// Returns [`ConfigError`] on unreadable or malformed files and on invalid
/// vault declarations.
pub fn load_workspace_config(
    root: &Path,
    override_file: Option<&Path>,
) -> Result<WorkspaceConfig, ConfigError> {
    let root = absolutize(root);
    let base_path = root.join(WORKSPACE_CONFIG_FILE);
    let mut merged = if base_path.is_file() {
        read_yaml_file(&base_path)?
    } else {
        log::debug!("no {WORKSPACE_CONFIG_FILE} under {}", root.display());
        Value::Mapping(Mapping::new())
    };

    let mut source_path = base_path;
    if let Some(path) = resolve_override_file(override_file) {
        let overlay = read_yaml_file(&path)?;
        deep_merge(&mut merged, overlay);
        source_path = path;
    }

    let raw: RawConfig = if merged.is_null() {
        RawConfig::default()
    } else {
        serde_yaml::from_value(merged).map_err(|source| ConfigError::Yaml {
            path: source_path,
            source,
        })?
    };

    let vaults = raw
        .vaults
        .into_iter()
        .map(RawVault::into_vault)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WorkspaceConfig {
        workspace: Workspace::new(root, vaults)?,
        doctor: raw.doctor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_deep_merge_overrides_scalars_and_keeps_siblings() -> Result<(), serde_yaml::Error> {
        let mut base: Value = serde_yaml::from_str("doctor:\n  dry_run: false\n  limit: 5\n")?;
        let overlay: Value = serde_yaml::from_str("doctor:\n  dry_run: true\n")?;
        deep_merge(&mut base, overlay);
        let settings: DoctorSettings = serde_yaml::from_value(
            base.get("doctor").cloned().unwrap_or(Value::Null),
        )?;
        assert_eq!(
            settings,
            DoctorSettings {
                dry_run: true,
                limit: Some(5)
            }
        );
        Ok(())
    }

    #[test]
    fn test_vault_name_defaults_to_directory_name() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        fs::write(
            tmp.path().join(WORKSPACE_CONFIG_FILE),
            "vaults:\n  - fs_path: notes/main\n  - name: second\n    fs_path: other\n",
        )?;
        let config = load_workspace_config(tmp.path(), None)?;
        let names: Vec<&str> = config
            .workspace
            .vaults()
            .iter()
            .map(|vault| vault.name.as_str())
            .collect();
        assert_eq!(names, vec!["main", "second"]);
        assert_eq!(config.doctor, DoctorSettings::default());
        Ok(())
    }

    #[test]
    fn test_missing_config_yields_empty_workspace() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let config = load_workspace_config(tmp.path(), None)?;
        assert!(config.workspace.vaults().is_empty());
        Ok(())
    }

    #[test]
    fn test_override_file_is_merged() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        fs::write(
            tmp.path().join(WORKSPACE_CONFIG_FILE),
            "vaults:\n  - name: v1\n    fs_path: v1\n",
        )?;
        let overlay = tmp.path().join("override.yaml");
        fs::write(&overlay, "doctor:\n  limit: 2\n")?;
        let config = load_workspace_config(tmp.path(), Some(&overlay))?;
        assert_eq!(config.workspace.vaults().len(), 1);
        assert_eq!(config.doctor.limit, Some(2));
        Ok(())
    }

    #[test]
    fn test_missing_override_file_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let missing = tmp.path().join("nope.yaml");
        let result = load_workspace_config(tmp.path(), Some(&missing));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        Ok(())
    }
}
