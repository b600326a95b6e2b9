//! Allow-list policy for flags and environment variable names.
//!
//! `AllowListPolicy` holds two registries of prefixes. A candidate is allowed
//! iff it starts with a registered prefix: the match is anchored at position 0
//! and case-sensitive. Prefixes (rather than exact strings) admit parameterized
//! flags such as `--workspace=<dir>`, so they must stay narrow.

use crate::error::Violation;
use crate::risky::{check_risky_env, RiskyEnvPolicy};
use std::collections::BTreeSet;

/// Argument prefixes accepted for `npm pack` (see `npm pack --help`).
pub const DEFAULT_ARG_PREFIXES: &[&str] = &["--workspace", "--include-workspace-root"];

/// Env name prefixes accepted for the node toolchain.
pub const DEFAULT_ENV_PREFIXES: &[&str] = &["NODE_"];

/// Allow-list policy.
///
/// Immutable once built. Create with `AllowListPolicy::builder()`, or use
/// `AllowListPolicy::default()` for the npm registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListPolicy {
    /// Allowed argument prefixes.
    arg_prefixes: BTreeSet<String>,

    /// Allowed env name prefixes.
    env_prefixes: BTreeSet<String>,

    /// Handling of risky names that pass the prefix check.
    risky_env_policy: RiskyEnvPolicy,
}

impl AllowListPolicy {
    /// Create a new policy builder with empty registries.
    pub fn builder() -> AllowListPolicyBuilder {
        AllowListPolicyBuilder::new()
    }

    /// True iff `candidate` starts with a registered argument prefix.
    pub fn is_allowed_argument(&self, candidate: &str) -> bool {
        has_prefix(&self.arg_prefixes, candidate)
    }

    /// True iff `candidate` starts with a registered env name prefix.
    pub fn is_allowed_env_name(&self, candidate: &str) -> bool {
        has_prefix(&self.env_prefixes, candidate)
    }

    /// Check a flag, returning the violation to abort with.
    pub fn check_argument(&self, arg: &str) -> Result<(), Violation> {
        if self.is_allowed_argument(arg) {
            Ok(())
        } else {
            Err(Violation::ArgNotAllowed {
                arg: arg.to_string(),
            })
        }
    }

    /// Check an env name against the prefixes, then the risky env policy.
    pub fn check_env_name(&self, name: &str) -> Result<(), Violation> {
        if !self.is_allowed_env_name(name) {
            return Err(Violation::EnvNameNotAllowed {
                name: name.to_string(),
            });
        }
        check_risky_env(name, self.risky_env_policy)
    }

    pub fn arg_prefixes(&self) -> impl Iterator<Item = &str> {
        self.arg_prefixes.iter().map(String::as_str)
    }

    pub fn env_prefixes(&self) -> impl Iterator<Item = &str> {
        self.env_prefixes.iter().map(String::as_str)
    }

    pub fn risky_env_policy(&self) -> RiskyEnvPolicy {
        self.risky_env_policy
    }
}

impl Default for AllowListPolicy {
    fn default() -> Self {
        Self {
            arg_prefixes: DEFAULT_ARG_PREFIXES.iter().map(|s| s.to_string()).collect(),
            env_prefixes: DEFAULT_ENV_PREFIXES.iter().map(|s| s.to_string()).collect(),
            risky_env_policy: RiskyEnvPolicy::default(),
        }
    }
}

fn has_prefix(prefixes: &BTreeSet<String>, candidate: &str) -> bool {
    prefixes.iter().any(|p| candidate.starts_with(p.as_str()))
}

/// Builder for `AllowListPolicy`.
#[derive(Debug, Clone, Default)]
pub struct AllowListPolicyBuilder {
    arg_prefixes: Vec<String>,
    env_prefixes: Vec<String>,
    risky_env_policy: RiskyEnvPolicy,
}

impl AllowListPolicyBuilder {
    /// Create a new builder with empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allowed argument prefix.
    pub fn allow_arg_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.arg_prefixes.push(prefix.into());
        self
    }

    /// Add an allowed env name prefix.
    pub fn allow_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefixes.push(prefix.into());
        self
    }

    /// Set the risky env policy.
    pub fn risky_env_policy(mut self, policy: RiskyEnvPolicy) -> Self {
        self.risky_env_policy = policy;
        self
    }

    /// Build the policy.
    ///
    /// # Errors
    ///
    /// Returns `Violation::EmptyPrefix` if any prefix is empty.
    pub fn build(self) -> Result<AllowListPolicy, Violation> {
        if self.arg_prefixes.iter().any(String::is_empty) {
            return Err(Violation::EmptyPrefix { kind: "argument" });
        }
        if self.env_prefixes.iter().any(String::is_empty) {
            return Err(Violation::EmptyPrefix { kind: "env" });
        }

        Ok(AllowListPolicy {
            arg_prefixes: self.arg_prefixes.into_iter().collect(),
            env_prefixes: self.env_prefixes.into_iter().collect(),
            risky_env_policy: self.risky_env_policy,
        })
    }
}
