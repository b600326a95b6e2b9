//! Command and environment synthesis for `npm pack`.
//!
//! `PackBuilder` turns a resolved config and package descriptor into the
//! output filename, argument vector, and environment vector of a single
//! `node npm pack ...` invocation. Every flag and config env name passes
//! through the [`AllowListPolicy`]; the first rejection aborts the whole list.

use crate::arg_env::parse_arg_env;
use crate::config::{PackageDescriptor, ResolvedConfig};
use crate::error::{ArgEnvError, Violation};
use crate::policy::AllowListPolicy;
use crate::prepared::PreparedInvocation;
use std::collections::BTreeMap;

/// The only subcommand this crate ever runs.
pub const PACK_SUBCOMMAND: &str = "pack";

/// Synthesizer for one `npm pack` invocation.
#[derive(Debug, Clone)]
pub struct PackBuilder {
    node: String,
    npm: String,
    config: ResolvedConfig,
    package: PackageDescriptor,
    policy: AllowListPolicy,
    /// Pairs from the command line; static env lives in `config.env`.
    arg_env: BTreeMap<String, String>,
}

impl PackBuilder {
    /// Create a builder using the default npm allow-list.
    ///
    /// `node` is the interpreter that gets exec'd; `npm` is the npm CLI script it runs.
    pub fn new(
        node: impl Into<String>,
        npm: impl Into<String>,
        config: ResolvedConfig,
        package: PackageDescriptor,
    ) -> Self {
        Self {
            node: node.into(),
            npm: npm.into(),
            config,
            package,
            policy: AllowListPolicy::default(),
            arg_env: BTreeMap::new(),
        }
    }

    /// Replace the allow-list policy.
    pub fn with_policy(mut self, policy: AllowListPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Merge operator-supplied `name:value` pairs.
    ///
    /// These pairs are not checked against the env prefixes. On error the
    /// existing pairs are left untouched.
    pub fn set_arg_env_variables(&mut self, raw: &str) -> Result<(), ArgEnvError> {
        let pairs = parse_arg_env(raw)?;
        for name in pairs.keys() {
            tracing::debug!(name = %name, "arg env");
        }
        self.arg_env.extend(pairs);
        Ok(())
    }

    pub fn arg_env(&self) -> &BTreeMap<String, String> {
        &self.arg_env
    }

    pub fn policy(&self) -> &AllowListPolicy {
        &self.policy
    }

    /// `{name}-{version}.tgz`, as written by `npm pack`.
    ///
    /// Name and version are used verbatim; suspicious values are logged, not rewritten.
    pub fn generate_output_filename(&self) -> String {
        let PackageDescriptor { name, version } = &self.package;
        for (field, value) in [("name", name), ("version", version)] {
            if value.is_empty() || value.contains("..") || value.contains('/') {
                tracing::warn!(field, value = %value, "Package descriptor field used verbatim in filename");
            }
        }
        format!("{name}-{version}.tgz")
    }

    /// Config flags, each checked against the argument prefixes.
    pub fn generate_flags(&self) -> Result<Vec<String>, Violation> {
        let mut flags = Vec::with_capacity(self.config.flags.len());
        for flag in &self.config.flags {
            self.policy.check_argument(flag)?;
            flags.push(flag.clone());
        }
        Ok(flags)
    }

    /// Config env entries as `NAME=VALUE`, sorted by name, each name checked
    /// against the env prefixes.
    pub fn generate_command_env_variables(&self) -> Result<Vec<String>, Violation> {
        let mut env = Vec::with_capacity(self.config.env.len());
        for (name, value) in &self.config.env {
            self.policy.check_env_name(name)?;
            env.push(format!("{name}={value}"));
        }
        Ok(env)
    }

    /// Inherited process environment followed by the command env.
    pub fn generate_env_variables(&self) -> Result<Vec<String>, Violation> {
        self.generate_env_variables_from(inherited_env())
    }

    /// Like [`generate_env_variables`](Self::generate_env_variables) with an
    /// explicit inherited environment. Duplicates are not removed.
    pub fn generate_env_variables_from(
        &self,
        inherited: impl IntoIterator<Item = String>,
    ) -> Result<Vec<String>, Violation> {
        let command_env = self.generate_command_env_variables()?;
        let mut env: Vec<String> = inherited.into_iter().collect();
        env.extend(command_env);
        Ok(env)
    }

    /// `[node, npm, "pack", flags...]`.
    pub fn build_argv(&self) -> Result<Vec<String>, Violation> {
        let flags = self.generate_flags()?;
        let mut argv = Vec::with_capacity(3 + flags.len());
        argv.push(self.node.clone());
        argv.push(self.npm.clone());
        argv.push(PACK_SUBCOMMAND.to_string());
        argv.extend(flags);
        Ok(argv)
    }

    /// Derive filename, argv, and envp against the current process environment.
    ///
    /// This is the ONLY way to create a `PreparedInvocation`.
    pub fn prepare(&self) -> Result<PreparedInvocation, Violation> {
        self.prepare_from(inherited_env())
    }

    /// Derive filename, argv, and envp against an explicit inherited environment.
    pub fn prepare_from(
        &self,
        inherited: impl IntoIterator<Item = String>,
    ) -> Result<PreparedInvocation, Violation> {
        let filename = self.generate_output_filename();
        let argv = self.build_argv()?;
        let envp = self.generate_env_variables_from(inherited)?;

        tracing::debug!(
            flags = argv.len() - 3,
            env = envp.len(),
            "Synthesized pack invocation"
        );

        Ok(PreparedInvocation {
            program: self.node.clone(),
            filename,
            argv,
            envp,
        })
    }
}

/// The current process environment as `NAME=VALUE` strings.
///
/// Entries that are not valid UTF-8 are dropped with a warning.
fn inherited_env() -> Vec<String> {
    std::env::vars_os()
        .filter_map(|(name, value)| match (name.to_str(), value.to_str()) {
            (Some(n), Some(v)) => Some(format!("{n}={v}")),
            _ => {
                tracing::warn!(name = %name.to_string_lossy(), "Dropping non UTF-8 env variable");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risky::RiskyEnvPolicy;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn config_with(flags: &[&str], env: &[(&str, &str)]) -> ResolvedConfig {
        ResolvedConfig {
            flags: s(flags),
            env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..ResolvedConfig::default()
        }
    }

    fn builder(flags: &[&str], env: &[(&str, &str)]) -> PackBuilder {
        PackBuilder::new(
            "/usr/bin/node",
            "/usr/lib/node_modules/npm/bin/npm-cli.js",
            config_with(flags, env),
            PackageDescriptor::new("foo-pkg", "1.2.3"),
        )
    }

    #[test]
    fn test_output_filename() {
        let b = builder(&[], &[]);
        assert_eq!(b.generate_output_filename(), "foo-pkg-1.2.3.tgz");
        // No hidden state
        assert_eq!(b.generate_output_filename(), b.generate_output_filename());
    }

    #[test]
    fn test_output_filename_verbatim() {
        let b = PackBuilder::new(
            "node",
            "npm",
            ResolvedConfig::default(),
            PackageDescriptor::new("@scope/pkg", "1.0.0"),
        );
        assert_eq!(b.generate_output_filename(), "@scope/pkg-1.0.0.tgz");
    }

    #[test]
    fn test_no_flags() {
        assert!(builder(&[], &[]).generate_flags().unwrap().is_empty());
    }

    #[test]
    fn test_allowed_flags_kept_in_order() {
        let b = builder(&["--workspace=b", "--include-workspace-root", "--workspace=a"], &[]);
        assert_eq!(
            b.generate_flags().unwrap(),
            s(&["--workspace=b", "--include-workspace-root", "--workspace=a"])
        );
    }

    #[test]
    fn test_flags_fail_closed() {
        let b = builder(&["--workspace=a", "--ignore-scripts=false"], &[]);
        assert_eq!(
            b.generate_flags(),
            Err(Violation::ArgNotAllowed {
                arg: "--ignore-scripts=false".to_string()
            })
        );
    }

    #[test]
    fn test_command_env_sorted() {
        let b = builder(&[], &[("NODE_Z", "1"), ("NODE_A", "2")]);
        assert_eq!(
            b.generate_command_env_variables().unwrap(),
            s(&["NODE_A=2", "NODE_Z=1"])
        );
    }

    #[test]
    fn test_command_env_fail_closed() {
        let b = builder(&[], &[("NODE_ENV", "production"), ("VAR1", "value1")]);
        assert_eq!(
            b.generate_command_env_variables(),
            Err(Violation::EnvNameNotAllowed {
                name: "VAR1".to_string()
            })
        );
    }

    #[test]
    fn test_command_env_risky_denied_with_strict_policy() {
        let policy = AllowListPolicy::builder()
            .allow_env_prefix("NODE_")
            .risky_env_policy(RiskyEnvPolicy::DenyByDefault)
            .build()
            .unwrap();
        let b = builder(&[], &[("NODE_OPTIONS", "--require=/tmp/x.js")]).with_policy(policy);
        assert!(matches!(
            b.generate_command_env_variables(),
            Err(Violation::EnvNameRisky { .. })
        ));
    }

    #[test]
    fn test_env_inherited_first() {
        let b = builder(&[], &[("NODE_ENV", "production")]);
        let env = b
            .generate_env_variables_from(s(&["PATH=/usr/bin", "NODE_ENV=development"]))
            .unwrap();
        assert_eq!(
            env,
            s(&["PATH=/usr/bin", "NODE_ENV=development", "NODE_ENV=production"])
        );
    }

    #[test]
    fn test_env_includes_process_env() {
        let b = builder(&[], &[]);
        let env = b.generate_env_variables().unwrap();
        assert_eq!(env.len(), inherited_env().len());
    }

    #[test]
    fn test_argv() {
        let b = builder(&["--workspace=a"], &[]);
        assert_eq!(
            b.build_argv().unwrap(),
            s(&[
                "/usr/bin/node",
                "/usr/lib/node_modules/npm/bin/npm-cli.js",
                "pack",
                "--workspace=a"
            ])
        );
    }

    #[test]
    fn test_argv_cannot_smuggle_subcommand() {
        let b = builder(&["publish"], &[]);
        assert!(matches!(b.build_argv(), Err(Violation::ArgNotAllowed { .. })));
    }

    #[test]
    fn test_arg_env_merge() {
        let mut b = builder(&[], &[]);
        b.set_arg_env_variables("VAR1:value1, VAR2:value2").unwrap();
        b.set_arg_env_variables("VAR3:value3").unwrap();
        assert_eq!(b.arg_env().len(), 3);
        assert_eq!(b.arg_env().get("VAR2"), Some(&"value2".to_string()));
    }

    #[test]
    fn test_arg_env_empty_noop() {
        let mut b = builder(&[], &[]);
        b.set_arg_env_variables("").unwrap();
        assert!(b.arg_env().is_empty());
    }

    #[test]
    fn test_arg_env_atomic_on_error() {
        let mut b = builder(&[], &[]);
        b.set_arg_env_variables("VAR0:value0").unwrap();

        let result = b.set_arg_env_variables("VAR1:value1, VAR2=value2");
        assert!(result.is_err());
        assert_eq!(b.arg_env().len(), 1);
        assert!(!b.arg_env().contains_key("VAR1"));
    }

    #[test]
    fn test_arg_env_not_in_envp() {
        let mut b = builder(&[], &[]);
        b.set_arg_env_variables("LD_PRELOAD:/evil.so").unwrap();
        let env = b.generate_env_variables_from(Vec::new()).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn test_prepare() {
        let b = builder(&["--workspace=a"], &[("NODE_ENV", "production")]);
        let prepared = b.prepare_from(s(&["HOME=/root"])).unwrap();

        assert_eq!(prepared.program(), "/usr/bin/node");
        assert_eq!(prepared.filename(), "foo-pkg-1.2.3.tgz");
        assert_eq!(prepared.argv()[2], "pack");
        assert_eq!(prepared.envp(), &s(&["HOME=/root", "NODE_ENV=production"])[..]);
    }

    #[test]
    fn test_prepare_aborts_on_env_violation() {
        let b = builder(&["--workspace=a"], &[("PATH", "/evil")]);
        assert!(matches!(
            b.prepare_from(Vec::new()),
            Err(Violation::EnvNameNotAllowed { .. })
        ));
    }
}
