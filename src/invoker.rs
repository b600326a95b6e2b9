//! Dry-run and execute modes.
//!
//! Both modes share the same derivation (`PackBuilder::prepare`); they differ
//! only in what happens to the result. Any error before the final step aborts
//! with nothing reported and nothing exec'd.

use crate::builder::PackBuilder;
use crate::error::PackError;
use crate::output::{DryRunReport, OutputFormat};
use crate::prepared::PreparedInvocation;
use std::convert::Infallible;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// What to do with the prepared invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report filename, argv, and envp without running anything.
    DryRun,
    /// Replace the current process with `node npm pack ...`.
    Execute,
}

/// Where dry-run reports go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportSink {
    /// Workflow commands on stdout (default).
    #[default]
    Stdout,

    /// `name=value` lines appended to a file, such as `$GITHUB_OUTPUT`.
    File(PathBuf),
}

/// Encode a prepared invocation and write the report.
///
/// The report is encoded in full before the first byte is written.
pub fn dry_run<W: Write>(
    prepared: &PreparedInvocation,
    out: &mut W,
    format: OutputFormat,
) -> Result<DryRunReport, PackError> {
    let report = prepared.report()?;
    report.write_to(out, format)?;
    Ok(report)
}

/// Replace the current process with the prepared invocation.
///
/// Only returns on failure.
pub fn execute(prepared: PreparedInvocation) -> Result<Infallible, PackError> {
    Ok(prepared.exec()?)
}

/// Run a builder in the given mode.
///
/// In `Execute` mode this does not return on success.
pub fn run(builder: &PackBuilder, mode: Mode, sink: &ReportSink) -> Result<(), PackError> {
    let prepared = builder.prepare()?;
    tracing::info!(?mode, program = %prepared.program(), "Prepared npm pack invocation");

    match mode {
        Mode::DryRun => {
            match sink {
                ReportSink::Stdout => {
                    let stdout = std::io::stdout();
                    dry_run(&prepared, &mut stdout.lock(), OutputFormat::SetOutput)?;
                }
                ReportSink::File(path) => {
                    let report = prepared.report()?;
                    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                    report.write_to(&mut file, OutputFormat::KeyValue)?;
                }
            }
            Ok(())
        }
        Mode::Execute => match execute(prepared) {
            Ok(never) => match never {},
            Err(e) => Err(e),
        },
    }
}
