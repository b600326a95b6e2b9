//! Build configuration and package descriptor.
//!
//! Both are loaded once per invocation and are immutable afterwards.
//! The build config is YAML with a `version` field checked against
//! [`SUPPORTED_VERSIONS`]; the package descriptor is the `name`/`version`
//! pair of a `package.json`.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Build config versions this crate understands.
pub const SUPPORTED_VERSIONS: &[i64] = &[1];

/// On-disk shape of the build config.
#[derive(Debug, Clone, Default, Deserialize)]
struct BuildConfigFile {
    #[serde(default, rename = "goos")]
    target_os: String,
    #[serde(default, rename = "goarch")]
    target_arch: String,
    #[serde(default)]
    env: Vec<String>,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default, rename = "ldflags")]
    linker_flags: Vec<String>,
    #[serde(default, rename = "binary")]
    output_binary_name: String,
    #[serde(default)]
    version: i64,
}

/// Validated build configuration.
///
/// `env` is keyed by variable name; a repeated name keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub target_os: String,
    pub target_arch: String,
    pub env: BTreeMap<String, String>,
    pub flags: Vec<String>,
    pub linker_flags: Vec<String>,
    pub output_binary_name: String,
}

/// Name and version of the package being packed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parse and validate a YAML build config.
///
/// # Errors
///
/// - `BuildConfigParse` if the bytes are not valid YAML of the expected shape
/// - `UnsupportedVersion` if `version` is not in [`SUPPORTED_VERSIONS`]
/// - `InvalidEnvEntry` if an `env` entry is not exactly `NAME=VALUE`
pub fn load_build_config(bytes: &[u8]) -> Result<ResolvedConfig, ConfigError> {
    let file: BuildConfigFile = serde_yaml::from_slice(bytes)?;
    resolve(file)
}

/// Parse a JSON package descriptor. Fields other than `name` and `version` are ignored.
pub fn load_package_descriptor(bytes: &[u8]) -> Result<PackageDescriptor, ConfigError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read a build config file and delegate to [`load_build_config`].
pub fn build_config_from_file(path: impl AsRef<Path>) -> Result<ResolvedConfig, ConfigError> {
    let bytes = read_file(path.as_ref())?;
    load_build_config(&bytes)
}

/// Read a `package.json` and delegate to [`load_package_descriptor`].
pub fn package_descriptor_from_file(
    path: impl AsRef<Path>,
) -> Result<PackageDescriptor, ConfigError> {
    let bytes = read_file(path.as_ref())?;
    load_package_descriptor(&bytes)
}

fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn resolve(file: BuildConfigFile) -> Result<ResolvedConfig, ConfigError> {
    validate_version(file.version)?;
    let env = parse_env_entries(&file.env)?;

    Ok(ResolvedConfig {
        target_os: file.target_os,
        target_arch: file.target_arch,
        env,
        flags: file.flags,
        linker_flags: file.linker_flags,
        output_binary_name: file.output_binary_name,
    })
}

fn validate_version(version: i64) -> Result<(), ConfigError> {
    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedVersion { version })
    }
}

/// Split each entry on `=`; anything other than exactly two parts fails the whole list.
fn parse_env_entries(entries: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut env = BTreeMap::new();
    for entry in entries {
        let mut parts = entry.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => {
                env.insert(name.to_string(), value.to_string());
            }
            _ => {
                return Err(ConfigError::InvalidEnvEntry {
                    entry: entry.clone(),
                })
            }
        }
    }
    Ok(env)
}
