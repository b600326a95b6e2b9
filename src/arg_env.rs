//! Parsing of operator-supplied env pairs.
//!
//! The command line carries extra variables as `NAME1:VALUE1, NAME2:VALUE2`.
//! A colon separates name from value so the channel cannot be confused with
//! shell `NAME=VALUE` assignment.

use crate::error::ArgEnvError;
use std::collections::BTreeMap;

/// Parse a comma-separated list of `name:value` pairs.
///
/// # Rules
///
/// - Empty input yields an empty map
/// - Each element is trimmed of surrounding spaces, then must split on `:`
///   into exactly two parts; name and value are trimmed again
/// - A repeated name keeps its last value
///
/// The batch is atomic: the first malformed element fails the whole call.
pub fn parse_arg_env(raw: &str) -> Result<BTreeMap<String, String>, ArgEnvError> {
    let mut pairs = BTreeMap::new();
    if raw.is_empty() {
        return Ok(pairs);
    }

    for element in raw.split(',') {
        let element = element.trim_matches(' ');
        let mut parts = element.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => {
                pairs.insert(
                    name.trim_matches(' ').to_string(),
                    value.trim_matches(' ').to_string(),
                );
            }
            _ => {
                return Err(ArgEnvError::InvalidPair {
                    pair: element.to_string(),
                })
            }
        }
    }

    Ok(pairs)
}
