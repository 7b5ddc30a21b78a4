use super::{
    Aliases, ConfigSource, PartialConfig, ProjectConfig, ResolvedPaths, DEFAULT_BASE_COLOR,
    DEFAULT_ICON_LIBRARY, DEFAULT_STYLE, DEFAULT_TAILWIND_CONFIG, DEFAULT_TAILWIND_CSS,
};
use crate::error::ConfigError;
use crate::project::{self, TailwindVersion, TsPaths};
use crate::registry::{expand_env, RegistryEndpoint, RegistryMap, DEFAULT_REGISTRY_URL};
use crate::schema::{ProjectManifest, RegistryManifest, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds a [`ProjectConfig`] from the configuration layers of a project
#[derive(Debug, Clone)]
pub struct ConfigReconciler {
    default_registry_url: String,
    registry_defaults: Option<PartialConfig>,
}

impl Default for ConfigReconciler {
    fn default() -> Self {
        Self {
            default_registry_url: DEFAULT_REGISTRY_URL.to_string(),
            registry_defaults: None,
        }
    }
}

impl ConfigReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL of the built-in registry
    pub fn default_registry_url(mut self, url: impl Into<String>) -> Self {
        self.default_registry_url = url.into();
        self
    }

    /// Defaults published by a registry, layered under the manifest
    pub fn registry_defaults(mut self, defaults: Option<PartialConfig>) -> Self {
        self.registry_defaults = defaults;
        self
    }

    /// Reconcile using the process environment for `${VAR}` expansion
    pub fn resolve(&self, root: &Path) -> Result<ProjectConfig, ConfigError> {
        self.resolve_with_env(root, |name| std::env::var(name).ok())
    }

    pub fn resolve_with_env<F>(&self, root: &Path, lookup: F) -> Result<ProjectConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest = read_manifest(root)?;

        let mut layered = project_defaults(root);
        if let Some(defaults) = &self.registry_defaults {
            layered = layered.merge(defaults.clone());
        }
        let source = match manifest {
            Some((path, manifest)) => {
                layered = layered.merge(PartialConfig::from(manifest));
                ConfigSource::Manifest(path)
            }
            None => {
                debug!(root = %root.display(), "no manifest found, using shadow config");
                ConfigSource::Shadow
            }
        };

        self.finalize(root, layered, source, &lookup)
    }

    fn finalize<F>(
        &self,
        root: &Path,
        layered: PartialConfig,
        source: ConfigSource,
        lookup: &F,
    ) -> Result<ProjectConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = root.join(MANIFEST_FILE);
        let style = layered.style.unwrap_or_else(|| DEFAULT_STYLE.to_string());
        if style.trim().is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: manifest_path,
                reason: "style must not be empty".to_string(),
            });
        }

        let tailwind_config = layered
            .tailwind_config
            .unwrap_or_else(|| DEFAULT_TAILWIND_CONFIG.to_string());
        let tailwind_css = layered
            .tailwind_css
            .unwrap_or_else(|| DEFAULT_TAILWIND_CSS.to_string());
        let tailwind_version = project::detect_tailwind_version(root).unwrap_or(
            if tailwind_config.is_empty() {
                TailwindVersion::V4
            } else {
                TailwindVersion::V3
            },
        );

        let defaults = PartialConfig::defaults().aliases;
        let pick = |value: Option<String>, fallback: Option<String>| {
            value.or(fallback).unwrap_or_default()
        };
        let aliases = Aliases {
            components: pick(layered.aliases.components, defaults.components),
            ui: pick(layered.aliases.ui, defaults.ui),
            utils: pick(layered.aliases.utils, defaults.utils),
            hooks: pick(layered.aliases.hooks, defaults.hooks),
            lib: pick(layered.aliases.lib, defaults.lib),
        };

        let ts_paths = project::load_ts_paths(root);
        let has_src = project::has_src_dir(root);
        let resolve = |alias: &str| resolve_alias(root, alias, ts_paths.as_ref(), has_src);
        let resolved_paths = ResolvedPaths {
            cwd: root.to_path_buf(),
            components: resolve(&aliases.components),
            ui: resolve(&aliases.ui),
            utils: resolve(&aliases.utils),
            hooks: resolve(&aliases.hooks),
            lib: resolve(&aliases.lib),
            tailwind_css: project::normalize(&root.join(&tailwind_css)),
            tailwind_config: project::normalize(&root.join(&tailwind_config)),
        };

        let mut registries = RegistryMap::with_default(&self.default_registry_url);
        for (namespace, entry) in &layered.registries {
            registries.insert(namespace.clone(), build_endpoint(entry, lookup));
        }

        Ok(ProjectConfig {
            style,
            base_color: layered
                .base_color
                .unwrap_or_else(|| DEFAULT_BASE_COLOR.to_string()),
            css_variables: layered.css_variables.unwrap_or(true),
            tailwind_config,
            tailwind_css,
            tailwind_prefix: layered.tailwind_prefix.unwrap_or_default(),
            tailwind_version,
            aliases,
            resolved_paths,
            icon_library: layered
                .icon_library
                .unwrap_or_else(|| DEFAULT_ICON_LIBRARY.to_string()),
            rtl: layered.rtl.unwrap_or(false),
            rsc: layered.rsc.unwrap_or(false),
            tsx: layered.tsx.unwrap_or(true),
            registries,
            source,
        })
    }
}

/// Reconcile the configuration of the project at `root`
pub fn resolve_config(root: &Path) -> Result<ProjectConfig, ConfigError> {
    ConfigReconciler::new().resolve(root)
}

/// Reconcile with a registry-supplied defaults layer under the manifest
pub fn resolve_config_with_defaults(
    root: &Path,
    registry_defaults: Option<PartialConfig>,
) -> Result<ProjectConfig, ConfigError> {
    ConfigReconciler::new()
        .registry_defaults(registry_defaults)
        .resolve(root)
}

/// Persist a configuration layer as the project's `components.json`
pub fn write_manifest(root: &Path, config: &PartialConfig) -> Result<PathBuf, ConfigError> {
    let path = root.join(MANIFEST_FILE);
    let manifest = ProjectManifest::from(config);
    let mut json =
        serde_json::to_string_pretty(&manifest).map_err(|e| ConfigError::InvalidConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    json.push('\n');
    std::fs::write(&path, json).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "wrote manifest");
    Ok(path)
}

/// Built-in defaults, with the Tailwind CSS file located on disk when possible
fn project_defaults(root: &Path) -> PartialConfig {
    let mut defaults = PartialConfig::defaults();
    if let Some(css) = project::find_tailwind_css(root) {
        defaults.tailwind_css = Some(css.to_string_lossy().replace('\\', "/"));
    }
    defaults
}

fn read_manifest(root: &Path) -> Result<Option<(PathBuf, ProjectManifest)>, ConfigError> {
    let path = root.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Some((path, ProjectManifest::default())));
    }
    let manifest = ProjectManifest::from_json(content.as_bytes())
        .map_err(|reason| ConfigError::InvalidConfig {
            path: path.clone(),
            reason,
        })?;
    Ok(Some((path, manifest)))
}

/// Map an import alias to an absolute path
fn resolve_alias(root: &Path, alias: &str, ts_paths: Option<&TsPaths>, has_src: bool) -> PathBuf {
    if let Some(path) = ts_paths.and_then(|paths| paths.resolve(alias)) {
        return path;
    }
    for prefix in ["@/", "~/"] {
        if let Some(rest) = alias.strip_prefix(prefix) {
            let base = if ts_paths.is_none() && has_src {
                root.join("src")
            } else {
                root.to_path_buf()
            };
            return project::normalize(&base.join(rest));
        }
    }
    project::normalize(&root.join(alias))
}

fn build_endpoint<F>(entry: &RegistryManifest, lookup: &F) -> RegistryEndpoint
where
    F: Fn(&str) -> Option<String>,
{
    match entry {
        RegistryManifest::Url(url) => RegistryEndpoint::new(expand_env(url, lookup)),
        RegistryManifest::Detailed(entry) => {
            let mut endpoint = RegistryEndpoint::new(expand_env(&entry.url, lookup));
            endpoint.index = entry.index.as_deref().map(|index| expand_env(index, lookup));
            endpoint.headers = entry
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), expand_env(value, lookup)))
                .collect();
            endpoint.params = entry
                .params
                .iter()
                .map(|(name, value)| (name.clone(), expand_env(value, lookup)))
                .collect();
            endpoint
        }
    }
}
