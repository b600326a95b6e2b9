//! Error types for pack_jail.
//!
//! Every failure aborts the invocation. The categories are:
//! - [`ConfigError`]: the build config or package descriptor could not be loaded
//! - [`Violation`]: a flag or env name is outside the allow-list policy
//! - [`ArgEnvError`]: the operator-supplied `name:value` batch is malformed
//! - [`EncodingError`]: the dry-run transport could not be produced or decoded
//! - [`ExecError`]: the process image could not be replaced

use crate::risky::RiskCategory;
use thiserror::Error;

/// Failure to load or validate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Build config is not valid YAML for the expected shape
    #[error("failed to parse build config: {0}")]
    BuildConfigParse(#[from] serde_yaml::Error),

    /// Package descriptor is not valid JSON for the expected shape
    #[error("failed to parse package descriptor: {0}")]
    PackageParse(#[from] serde_json::Error),

    /// Build config version is not in the supported set
    #[error("version not supported: {version}")]
    UnsupportedVersion { version: i64 },

    /// Env entry does not split into exactly one name and one value
    #[error("invalid environment variable: {entry}")]
    InvalidEnvEntry { entry: String },
}

/// Policy violation detected while synthesizing the command.
///
/// All messages are safe to log: they carry flag strings and env names,
/// never env values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Flag does not start with any allowed argument prefix
    #[error("argument not supported: {arg}")]
    ArgNotAllowed { arg: String },

    /// Env name does not start with any allowed env prefix
    #[error("env variable not allowed: {name}")]
    EnvNameNotAllowed { name: String },

    /// Env name passed the prefix check but is a known hijack vector
    #[error("risky env variable denied ({category}): {name}")]
    EnvNameRisky { name: String, category: RiskCategory },

    /// Policy was built with an empty prefix, which would match anything
    #[error("empty {kind} prefix in allow-list")]
    EmptyPrefix { kind: &'static str },
}

/// Malformed `name:value` batch from the command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgEnvError {
    #[error("invalid env passed via argument: {pair:?}")]
    InvalidPair { pair: String },
}

/// Failure to encode or decode the dry-run transport.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Failure to replace the current process image.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An argv or env entry cannot be passed to execve
    #[error("argument contains NUL byte: {value:?}")]
    NulByte { value: String },

    /// execve itself failed; the original process keeps running
    #[error("failed to exec {path}: {source}")]
    Exec {
        path: String,
        #[source]
        source: nix::errno::Errno,
    },
}

/// Combined error type for the load-synthesize-invoke flow.
#[derive(Debug, Error)]
pub enum PackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Violation(#[from] Violation),

    #[error(transparent)]
    ArgEnv(#[from] ArgEnvError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Dry-run report could not be written
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}
