//! Environment merging for operations
//!
//! The ambient environment is passed in as an explicit snapshot; nothing here
//! reads or writes process-global state except [`ambient_snapshot`]. Entries
//! are kept as `OsString` so values that are not valid UTF-8 still reach the
//! steps unchanged.

use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};

/// Variables that indicate a CI provider
const CI_VARIABLES: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "NODE_NAME"];

/// Take a snapshot of the current process environment
pub fn ambient_snapshot() -> Vec<(OsString, OsString)> {
    env::vars_os().collect()
}

/// Merge an ambient snapshot with operation overrides into `KEY=VALUE` entries.
///
/// Overrides are appended after every ambient entry. A key present in both
/// appears twice and the later (override) entry wins when the list is applied.
/// Overrides are emitted in key order so the list is stable across runs.
pub fn build_environment(
    ambient: &[(OsString, OsString)],
    overrides: &HashMap<String, String>,
) -> Vec<OsString> {
    let mut keys: Vec<&String> = overrides.keys().collect();
    keys.sort();

    ambient
        .iter()
        .map(|(k, v)| join_entry(k, v))
        .chain(
            keys.into_iter()
                .map(|k| join_entry(OsStr::new(k), OsStr::new(&overrides[k]))),
        )
        .collect()
}

fn join_entry(key: &OsStr, value: &OsStr) -> OsString {
    let mut entry = OsString::with_capacity(key.len() + value.len() + 1);
    entry.push(key);
    entry.push("=");
    entry.push(value);
    entry
}

/// Split a `KEY=VALUE` entry at the first `=`
#[cfg(unix)]
pub fn parse_entry(entry: &OsStr) -> Option<(&OsStr, &OsStr)> {
    use std::os::unix::ffi::OsStrExt;

    let bytes = entry.as_bytes();
    match bytes.iter().position(|b| *b == b'=') {
        Some(split) if split > 0 => Some((
            OsStr::from_bytes(&bytes[..split]),
            OsStr::from_bytes(&bytes[split + 1..]),
        )),
        _ => None,
    }
}

/// Split a `KEY=VALUE` entry at the first `=`
#[cfg(not(unix))]
pub fn parse_entry(entry: &OsStr) -> Option<(&OsStr, &OsStr)> {
    match entry.to_str()?.split_once('=') {
        Some((key, value)) if !key.is_empty() => Some((OsStr::new(key), OsStr::new(value))),
        _ => None,
    }
}

/// Check a snapshot for known CI provider variables
pub fn is_running_in_ci(ambient: &[(OsString, OsString)]) -> bool {
    ambient.iter().any(|(k, v)| {
        !v.is_empty() && CI_VARIABLES.iter().any(|name| k.as_os_str() == OsStr::new(name))
    })
}
