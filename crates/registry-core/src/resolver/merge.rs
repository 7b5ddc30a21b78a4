//! Aggregation helpers for resolved items

use crate::schema::CssVars;
use indexmap::IndexMap;
use serde_json::Value;

/// Merge `source` into `target` leaf by leaf; later values win, unrelated
/// keys survive
pub fn merge_css_vars(target: &mut CssVars, source: &CssVars) {
    for (mode, vars) in source {
        let slot = target.entry(mode.clone()).or_default();
        for (name, value) in vars {
            slot.insert(name.clone(), value.clone());
        }
    }
}

/// Deep-merge JSON objects; arrays are unioned, scalars replaced
pub fn merge_json(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for value in source {
                if !target.contains(value) {
                    target.push(value.clone());
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Package list where the first pinned version of a package wins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSet {
    packages: IndexMap<String, Option<String>>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `name` or `name@version` spec
    pub fn add(&mut self, spec: &str) {
        let (name, version) = split_package_spec(spec);
        if name.is_empty() {
            return;
        }
        match self.packages.get_mut(name) {
            Some(existing) => {
                if existing.is_none() {
                    *existing = version.map(str::to_string);
                }
            }
            None => {
                self.packages
                    .insert(name.to_string(), version.map(str::to_string));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Specs in first-seen order
    pub fn to_specs(&self) -> Vec<String> {
        self.packages
            .iter()
            .map(|(name, version)| match version {
                Some(version) => format!("{}@{}", name, version),
                None => name.clone(),
            })
            .collect()
    }
}

/// Split `@scope/name@1.2.3` into name and version; the leading `@` of a
/// scope is not a separator
pub fn split_package_spec(spec: &str) -> (&str, Option<&str>) {
    let spec = spec.trim();
    match spec.rfind('@') {
        Some(pos) if pos > 0 => {
            let version = &spec[pos + 1..];
            (&spec[..pos], (!version.is_empty()).then_some(version))
        }
        _ => (spec, None),
    }
}
