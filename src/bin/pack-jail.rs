//! pack-jail: run or dry-run a trusted `npm pack` invocation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pack_jail::{
    build_config_from_file, package_descriptor_from_file, run, AllowListPolicy, Mode,
    PackBuilder, ReportSink, ResolvedConfig, RiskyEnvPolicy, DEFAULT_ARG_PREFIXES,
    DEFAULT_ENV_PREFIXES,
};

#[derive(Parser)]
#[command(
    name = "pack-jail",
    version,
    about = "Run `npm pack` with an allow-listed command line and environment"
)]
struct Cli {
    /// Path to the node interpreter that gets exec'd
    #[arg(long, env = "PACK_JAIL_NODE")]
    node: String,
    /// Path to the npm CLI script passed to node
    #[arg(long, env = "PACK_JAIL_NPM")]
    npm: String,
    /// Package descriptor providing name and version
    #[arg(long, default_value = "package.json")]
    package_json: PathBuf,
    /// Versioned build config (YAML); without it no flags or env are added
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extra variables as `NAME1:VALUE1, NAME2:VALUE2`
    #[arg(long, default_value = "")]
    envs: String,
    /// Report filename, command, and env instead of running npm
    #[arg(long)]
    dry: bool,
    /// Append dry-run outputs to this file instead of printing workflow commands
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,
    /// Reject env names like NODE_OPTIONS even when an allowed prefix matches
    #[arg(long)]
    deny_risky_env: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "pack_jail=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run_cli(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pack-jail: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => build_config_from_file(path)
            .with_context(|| format!("loading build config {}", path.display()))?,
        None => ResolvedConfig::default(),
    };
    let package = package_descriptor_from_file(&cli.package_json)
        .with_context(|| format!("loading {}", cli.package_json.display()))?;

    let policy = policy(cli.deny_risky_env).context("building allow-list policy")?;

    let mut builder = PackBuilder::new(cli.node, cli.npm, config, package).with_policy(policy);
    builder
        .set_arg_env_variables(&cli.envs)
        .context("parsing --envs")?;

    let mode = if cli.dry { Mode::DryRun } else { Mode::Execute };
    let sink = match cli.github_output {
        Some(path) if !path.as_os_str().is_empty() => ReportSink::File(path),
        _ => ReportSink::Stdout,
    };

    run(&builder, mode, &sink)?;
    Ok(())
}

fn policy(deny_risky_env: bool) -> Result<AllowListPolicy, pack_jail::Violation> {
    let risky = if deny_risky_env {
        RiskyEnvPolicy::DenyByDefault
    } else {
        RiskyEnvPolicy::AllowWithWarning
    };

    let mut builder = AllowListPolicy::builder().risky_env_policy(risky);
    for prefix in DEFAULT_ARG_PREFIXES {
        builder = builder.allow_arg_prefix(*prefix);
    }
    for prefix in DEFAULT_ENV_PREFIXES {
        builder = builder.allow_env_prefix(*prefix);
    }
    builder.build()
}
