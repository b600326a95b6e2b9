//! Prepared invocation ready for reporting or exec.
//!
//! This module contains `PreparedInvocation`, which can only be created
//! by `PackBuilder::prepare()`. This ensures every exec and every dry-run
//! report goes through allow-list validation.

use crate::error::{EncodingError, ExecError};
use crate::output::DryRunReport;
use nix::unistd::execve;
use std::convert::Infallible;
use std::ffi::CString;

/// A validated `npm pack` invocation.
///
/// This type cannot be constructed outside of `pack_jail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInvocation {
    pub(crate) program: String,
    pub(crate) filename: String,
    pub(crate) argv: Vec<String>,
    pub(crate) envp: Vec<String>,
}

impl PreparedInvocation {
    /// Encode the three derived lists for a dry run.
    pub fn report(&self) -> Result<DryRunReport, EncodingError> {
        DryRunReport::encode(&self.filename, &self.argv, &self.envp)
    }

    /// Replace the current process image with the prepared command.
    ///
    /// Never returns on success. On failure the current process continues
    /// and gets the error; there is no retry.
    ///
    /// # Errors
    ///
    /// - `ExecError::NulByte` if the program, an argument, or an env entry contains NUL
    /// - `ExecError::Exec` if execve fails (not found, not permitted, ...)
    pub fn exec(self) -> Result<Infallible, ExecError> {
        let program = to_cstring(&self.program)?;
        let argv = self
            .argv
            .iter()
            .map(|a| to_cstring(a))
            .collect::<Result<Vec<_>, _>>()?;
        let envp = self
            .envp
            .iter()
            .map(|e| to_cstring(e))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            program = %self.program,
            argv = ?self.argv,
            env = self.envp.len(),
            "Replacing process image"
        );

        execve(&program, &argv, &envp).map_err(|source| ExecError::Exec {
            path: self.program,
            source,
        })
    }

    /// Get the program passed to execve.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the output filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Get the arguments, including argv[0].
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Get the environment.
    pub fn envp(&self) -> &[String] {
        &self.envp
    }
}

fn to_cstring(value: &str) -> Result<CString, ExecError> {
    CString::new(value).map_err(|_| ExecError::NulByte {
        value: value.replace('\0', "\\0"),
    })
}
