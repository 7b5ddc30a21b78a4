//! Environment variables requested by registry items
//!
//! Variables are appended to the project's env file. Keys that are already
//! defined keep their current value.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const ENV_FILES: &[&str] = &[".env.local", ".env"];

/// The env file to update: the first of `.env.local` and `.env` that exists,
/// or a new `.env.local`
pub fn env_file(root: &Path) -> PathBuf {
    ENV_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| root.join(ENV_FILES[0]))
}

fn defined_keys(content: &str) -> HashSet<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, _) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then_some(key)
        })
        .collect()
}

fn format_value(value: &str) -> String {
    if value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\\\"").replace('\n', "\\n"))
    } else if value.contains(char::is_whitespace) || value.contains('#') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Append the variables of `vars` that `existing` does not define yet
pub fn merge_env(existing: &str, vars: &IndexMap<String, String>) -> String {
    let defined = defined_keys(existing);
    let missing: Vec<String> = vars
        .iter()
        .filter(|(key, _)| !defined.contains(key.as_str()))
        .map(|(key, value)| format!("{}={}", key, format_value(value)))
        .collect();

    let mut output = existing.to_string();
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    if missing.is_empty() {
        return output;
    }
    if !output.is_empty() {
        output.push('\n');
    }
    for line in missing {
        output.push_str(&line);
        output.push('\n');
    }
    output
}
