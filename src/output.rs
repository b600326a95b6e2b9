//! Dry-run report encoding.
//!
//! Each derived list is serialized as a JSON array of strings and then base64
//! encoded (standard alphabet, padded), so a pipeline can capture it as one
//! opaque token without re-parsing shell quoting.

use crate::error::EncodingError;
use base64::{engine::general_purpose, Engine as _};
use std::io::Write;

/// Report channel carrying the output filename.
pub const PACKAGE_NAME_OUTPUT: &str = "node-package-name";

/// Report channel carrying the argument vector.
pub const COMMAND_OUTPUT: &str = "node-command";

/// Report channel carrying the environment vector.
pub const ENV_OUTPUT: &str = "node-env";

/// Encode a list of strings as `base64(json_array)`.
pub fn marshall_list<S: AsRef<str>>(items: &[S]) -> Result<String, EncodingError> {
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    let json = serde_json::to_vec(&items)?;
    Ok(general_purpose::STANDARD.encode(json))
}

/// Decode a token produced by [`marshall_list`].
///
/// Any valid JSON array of strings is accepted, regardless of formatting.
pub fn unmarshall_list(token: &str) -> Result<Vec<String>, EncodingError> {
    let json = general_purpose::STANDARD.decode(token)?;
    Ok(serde_json::from_slice(&json)?)
}

/// How report lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Legacy workflow command on stdout: `::set-output name=<channel>::<token>`.
    #[default]
    SetOutput,

    /// `<channel>=<token>` lines, as appended to a `$GITHUB_OUTPUT` file.
    KeyValue,
}

/// The three encoded dry-run tokens.
///
/// Built in full before anything is written, so a failure leaves no partial report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunReport {
    pub package_name: String,
    pub command: String,
    pub env: String,
}

impl DryRunReport {
    /// Encode the filename, argv, and envp into a report.
    pub fn encode(filename: &str, argv: &[String], envp: &[String]) -> Result<Self, EncodingError> {
        Ok(Self {
            package_name: marshall_list(&[filename])?,
            command: marshall_list(argv)?,
            env: marshall_list(envp)?,
        })
    }

    /// Channel name and token pairs, in report order.
    pub fn channels(&self) -> [(&'static str, &str); 3] {
        [
            (PACKAGE_NAME_OUTPUT, self.package_name.as_str()),
            (COMMAND_OUTPUT, self.command.as_str()),
            (ENV_OUTPUT, self.env.as_str()),
        ]
    }

    /// Write all three channels.
    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> std::io::Result<()> {
        let mut buf = String::new();
        for (name, token) in self.channels() {
            match format {
                OutputFormat::SetOutput => {
                    buf.push_str(&format!("::set-output name={name}::{token}\n"))
                }
                OutputFormat::KeyValue => buf.push_str(&format!("{name}={token}\n")),
            }
        }
        out.write_all(buf.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_arg() {
        assert_eq!(marshall_list(&["--arg"]).unwrap(), "WyItLWFyZyJd");
    }

    #[test]
    fn test_list_args() {
        let args = s(&[
            "/usr/lib/google-golang/bin/go",
            "build",
            "-mod=vendor",
            "-trimpath",
            "-tags=netgo",
            "-ldflags=-X main.gitVersion=v1.2.3 -X main.gitSomething=somthg",
        ]);
        assert_eq!(
            marshall_list(&args).unwrap(),
            "WyIvdXNyL2xpYi9nb29nbGUtZ29sYW5nL2Jpbi9nbyIsImJ1aWxkIiwiLW1vZD12ZW5kb3IiLCItdHJpbXBhdGgiLCItdGFncz1uZXRnbyIsIi1sZGZsYWdzPS1YIG1haW4uZ2l0VmVyc2lvbj12MS4yLjMgLVggbWFpbi5naXRTb21ldGhpbmc9c29tdGhnIl0="
        );
    }

    #[test]
    fn test_empty_list() {
        let empty: [&str; 0] = [];
        let token = marshall_list(&empty).unwrap();
        assert_eq!(token, "W10=");
        assert!(unmarshall_list(&token).unwrap().is_empty());
    }

    #[test]
    fn test_special_characters_survive() {
        let items = s(&["A=B", "with space", "quote\"d", "back\\slash", "ünï"]);
        let token = marshall_list(&items).unwrap();
        assert_eq!(unmarshall_list(&token).unwrap(), items);
    }

    #[test]
    fn test_decoder_ignores_json_formatting() {
        let token = general_purpose::STANDARD.encode("[ \"a\" ,\n \"b\" ]");
        assert_eq!(unmarshall_list(&token).unwrap(), s(&["a", "b"]));
    }

    #[test]
    fn test_decoder_rejects_garbage() {
        assert!(matches!(
            unmarshall_list("not base64!"),
            Err(EncodingError::Base64(_))
        ));
        let not_list = general_purpose::STANDARD.encode("{\"a\": 1}");
        assert!(matches!(unmarshall_list(&not_list), Err(EncodingError::Json(_))));
    }

    #[test]
    fn test_report_set_output_format() {
        let report = DryRunReport::encode("foo-1.0.0.tgz", &s(&["--arg"]), &[]).unwrap();
        let mut out = Vec::new();
        report.write_to(&mut out, OutputFormat::SetOutput).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("::set-output name=node-package-name::"));
        assert_eq!(lines[1], "::set-output name=node-command::WyItLWFyZyJd");
        assert_eq!(lines[2], "::set-output name=node-env::W10=");
    }

    #[test]
    fn test_report_key_value_format() {
        let report = DryRunReport::encode("foo-1.0.0.tgz", &s(&["--arg"]), &[]).unwrap();
        let mut out = Vec::new();
        report.write_to(&mut out, OutputFormat::KeyValue).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("node-command=WyItLWFyZyJd\n"));
        assert!(text.contains("node-env=W10=\n"));
    }

    #[test]
    fn test_filename_uses_list_transport() {
        let report = DryRunReport::encode("foo-pkg-1.2.3.tgz", &[], &[]).unwrap();
        assert_eq!(
            unmarshall_list(&report.package_name).unwrap(),
            s(&["foo-pkg-1.2.3.tgz"])
        );
    }
}
