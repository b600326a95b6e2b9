//! Risky environment variable detection and policy.
//!
//! A prefix allow-list can still admit names that hijack the dynamic loader,
//! the node runtime, or TLS trust (`NODE_` admits `NODE_OPTIONS`). This module
//! classifies such names so the policy can deny them or warn about them.

use crate::error::Violation;

/// Risk category for dangerous environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCategory {
    /// Dynamic loader injection (LD_PRELOAD, DYLD_INSERT_LIBRARIES, etc.)
    Loader,
    /// Interpreter startup hooks (NODE_OPTIONS, NODE_PATH, BASH_ENV, etc.)
    Interpreter,
    /// Weakens TLS or redirects network traffic
    Trust,
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskCategory::Loader => write!(f, "loader"),
            RiskCategory::Interpreter => write!(f, "interpreter"),
            RiskCategory::Trust => write!(f, "trust"),
        }
    }
}

/// Policy for env names that pass the prefix check but are known hijack vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskyEnvPolicy {
    /// Reject risky names even when an allowed prefix matches.
    DenyByDefault,

    /// Accept risky names that match an allowed prefix, but log a warning (default).
    #[default]
    AllowWithWarning,

    /// No special handling; the prefix allow-list is the only control.
    Disabled,
}

/// Name prefixes that configure the dynamic loader.
pub const RISKY_LOADER_PREFIXES: &[&str] = &["LD_", "DYLD_"];

/// Dynamic loader variables.
pub const RISKY_LOADER: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "LD_AUDIT",
    "LD_DEBUG",
    "LD_PROFILE",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "DYLD_FRAMEWORK_PATH",
    "DYLD_FALLBACK_LIBRARY_PATH",
];

/// Variables that make an interpreter load or run extra code at startup.
pub const RISKY_INTERPRETER: &[&str] = &[
    "NODE_OPTIONS",
    "NODE_PATH",
    "NODE_REPL_EXTERNAL_MODULE",
    "NODE_V8_COVERAGE",
    "NPM_CONFIG_SCRIPT_SHELL",
    "NPM_CONFIG_NODE_OPTIONS",
    "PYTHONPATH",
    "PYTHONSTARTUP",
    "PERL5LIB",
    "PERL5OPT",
    "RUBYOPT",
    "BASH_ENV",
    "ENV",
    "SHELLOPTS",
    "PROMPT_COMMAND",
];

/// Variables that weaken TLS verification or redirect traffic.
pub const RISKY_TRUST: &[&str] = &[
    "NODE_TLS_REJECT_UNAUTHORIZED",
    "NODE_EXTRA_CA_CERTS",
    "NPM_CONFIG_REGISTRY",
    "NPM_CONFIG_STRICT_SSL",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "NO_PROXY",
];

/// Check if an env name is risky and return its category.
///
/// Matching ignores ASCII case: npm reads `npm_config_*` and `NPM_CONFIG_*` alike.
pub fn categorize_risky_env(name: &str) -> Option<RiskCategory> {
    let upper = name.to_ascii_uppercase();

    if RISKY_LOADER.contains(&upper.as_str())
        || RISKY_LOADER_PREFIXES.iter().any(|p| upper.starts_with(p))
    {
        return Some(RiskCategory::Loader);
    }

    if RISKY_INTERPRETER.contains(&upper.as_str()) {
        return Some(RiskCategory::Interpreter);
    }

    if RISKY_TRUST.contains(&upper.as_str()) {
        return Some(RiskCategory::Trust);
    }

    None
}

/// Check an env name that already passed the prefix allow-list.
///
/// # Returns
///
/// - `Ok(())` if the name is allowed
/// - `Err(Violation::EnvNameRisky)` if denied
pub fn check_risky_env(name: &str, policy: RiskyEnvPolicy) -> Result<(), Violation> {
    match policy {
        RiskyEnvPolicy::Disabled => Ok(()),
        RiskyEnvPolicy::AllowWithWarning => {
            if let Some(category) = categorize_risky_env(name) {
                tracing::warn!(
                    name = %name,
                    category = %category,
                    "Allowing risky env variable"
                );
            }
            Ok(())
        }
        RiskyEnvPolicy::DenyByDefault => match categorize_risky_env(name) {
            Some(category) => Err(Violation::EnvNameRisky {
                name: name.to_string(),
                category,
            }),
            None => Ok(()),
        },
    }
}
