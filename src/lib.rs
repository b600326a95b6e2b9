//! # pack_jail
//!
//! Trusted command synthesis for `npm pack` in CI.
//!
//! `pack_jail` turns a declarative build config and a `package.json` into the
//! exact argument vector and environment for one `node npm pack ...`
//! invocation, rejecting any flag or env name that is not allow-listed. It
//! then either replaces the current process with that command, or (dry run)
//! reports the filename, argv, and envp as base64-encoded JSON lists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pack_jail::{load_build_config, load_package_descriptor, PackBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_build_config(b"version: 1\nflags: [\"--workspace=packages/a\"]\n")?;
//! let package = load_package_descriptor(br#"{"name": "foo-pkg", "version": "1.2.3"}"#)?;
//!
//! let builder = PackBuilder::new("/usr/bin/node", "/usr/lib/node_modules/npm/bin/npm-cli.js", config, package);
//! let prepared = builder.prepare()?;
//!
//! let report = prepared.report()?;
//! println!("::set-output name=node-command::{}", report.command);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **No shell interpretation**: the command is exec'd as an argv vector
//! - **Fixed subcommand**: argv is always `[node, npm, "pack", flags...]`
//! - **Allowlist-only**: flags and env names must start with a registered prefix
//! - **Fail closed**: one rejected item aborts the whole invocation
//! - **Type-safe API**: only `PreparedInvocation` can exec or report

#[cfg(windows)]
compile_error!(
    "pack_jail does not support Windows. \
     It replaces the current process with execve, which Windows does not provide."
);

mod arg_env;
mod builder;
mod config;
mod error;
mod invoker;
mod output;
mod policy;
mod prepared;
mod risky;

// Public API
pub use arg_env::parse_arg_env;
pub use builder::{PackBuilder, PACK_SUBCOMMAND};
pub use config::{
    build_config_from_file, load_build_config, load_package_descriptor,
    package_descriptor_from_file, PackageDescriptor, ResolvedConfig, SUPPORTED_VERSIONS,
};
pub use error::{ArgEnvError, ConfigError, EncodingError, ExecError, PackError, Violation};
pub use invoker::{dry_run, execute, run, Mode, ReportSink};
pub use output::{
    marshall_list, unmarshall_list, DryRunReport, OutputFormat, COMMAND_OUTPUT, ENV_OUTPUT,
    PACKAGE_NAME_OUTPUT,
};
pub use policy::{
    AllowListPolicy, AllowListPolicyBuilder, DEFAULT_ARG_PREFIXES, DEFAULT_ENV_PREFIXES,
};
pub use prepared::PreparedInvocation;
pub use risky::{
    categorize_risky_env, RiskCategory, RiskyEnvPolicy, RISKY_INTERPRETER, RISKY_LOADER,
    RISKY_TRUST,
};
