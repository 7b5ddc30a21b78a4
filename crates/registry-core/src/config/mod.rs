//! Project configuration
//!
//! Configuration is built from explicit layers, each a [`PartialConfig`]:
//! built-in defaults, then defaults published by a registry, then the
//! project's `components.json`. Later layers win field by field. The result
//! is an immutable [`ProjectConfig`] with every alias resolved to a path.

mod resolve;

pub use resolve::{resolve_config, resolve_config_with_defaults, write_manifest, ConfigReconciler};

use crate::project::TailwindVersion;
use crate::registry::RegistryMap;
use crate::schema::{AliasesManifest, ProjectManifest, RegistryManifest, TailwindManifest};
use indexmap::IndexMap;
use std::path::PathBuf;

pub const DEFAULT_STYLE: &str = "new-york";
pub const DEFAULT_BASE_COLOR: &str = "neutral";
pub const DEFAULT_TAILWIND_CSS: &str = "app/globals.css";
pub const DEFAULT_TAILWIND_CONFIG: &str = "tailwind.config.ts";
pub const DEFAULT_ICON_LIBRARY: &str = "lucide";
pub const MANIFEST_SCHEMA_URL: &str = "https://ui.shadcn.com/schema.json";

/// Import specifiers the project uses for each install location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aliases {
    pub components: String,
    pub ui: String,
    pub utils: String,
    pub hooks: String,
    pub lib: String,
}

/// Absolute filesystem locations behind the aliases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub cwd: PathBuf,
    pub components: PathBuf,
    pub ui: PathBuf,
    /// Module path of the `cn` helper, without extension
    pub utils: PathBuf,
    pub hooks: PathBuf,
    pub lib: PathBuf,
    pub tailwind_css: PathBuf,
    pub tailwind_config: PathBuf,
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this `components.json`
    Manifest(PathBuf),
    /// No manifest on disk; built from defaults only
    Shadow,
}

/// Fully reconciled project configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub style: String,
    pub base_color: String,
    pub css_variables: bool,
    pub tailwind_config: String,
    pub tailwind_css: String,
    pub tailwind_prefix: String,
    pub tailwind_version: TailwindVersion,
    pub aliases: Aliases,
    pub resolved_paths: ResolvedPaths,
    pub icon_library: String,
    pub rtl: bool,
    pub rsc: bool,
    pub tsx: bool,
    pub registries: RegistryMap,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAliases {
    pub components: Option<String>,
    pub ui: Option<String>,
    pub utils: Option<String>,
    pub hooks: Option<String>,
    pub lib: Option<String>,
}

/// One configuration layer; `None` means "not set by this layer"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialConfig {
    pub style: Option<String>,
    pub base_color: Option<String>,
    pub css_variables: Option<bool>,
    pub tailwind_config: Option<String>,
    pub tailwind_css: Option<String>,
    pub tailwind_prefix: Option<String>,
    pub aliases: PartialAliases,
    pub icon_library: Option<String>,
    pub rtl: Option<bool>,
    pub rsc: Option<bool>,
    pub tsx: Option<bool>,
    pub registries: IndexMap<String, RegistryManifest>,
}

impl PartialConfig {
    /// The built-in defaults layer
    pub fn defaults() -> Self {
        Self {
            style: Some(DEFAULT_STYLE.to_string()),
            base_color: Some(DEFAULT_BASE_COLOR.to_string()),
            css_variables: Some(true),
            tailwind_config: Some(DEFAULT_TAILWIND_CONFIG.to_string()),
            tailwind_css: Some(DEFAULT_TAILWIND_CSS.to_string()),
            tailwind_prefix: Some(String::new()),
            aliases: PartialAliases {
                components: Some("@/components".to_string()),
                ui: Some("@/components/ui".to_string()),
                utils: Some("@/lib/utils".to_string()),
                hooks: Some("@/hooks".to_string()),
                lib: Some("@/lib".to_string()),
            },
            icon_library: Some(DEFAULT_ICON_LIBRARY.to_string()),
            rtl: Some(false),
            rsc: Some(false),
            tsx: Some(true),
            registries: IndexMap::new(),
        }
    }

    /// Layer `over` on top of `self`; fields set in `over` win
    pub fn merge(self, over: PartialConfig) -> PartialConfig {
        let mut registries = self.registries;
        registries.extend(over.registries);
        PartialConfig {
            style: over.style.or(self.style),
            base_color: over.base_color.or(self.base_color),
            css_variables: over.css_variables.or(self.css_variables),
            tailwind_config: over.tailwind_config.or(self.tailwind_config),
            tailwind_css: over.tailwind_css.or(self.tailwind_css),
            tailwind_prefix: over.tailwind_prefix.or(self.tailwind_prefix),
            aliases: PartialAliases {
                components: over.aliases.components.or(self.aliases.components),
                ui: over.aliases.ui.or(self.aliases.ui),
                utils: over.aliases.utils.or(self.aliases.utils),
                hooks: over.aliases.hooks.or(self.aliases.hooks),
                lib: over.aliases.lib.or(self.aliases.lib),
            },
            icon_library: over.icon_library.or(self.icon_library),
            rtl: over.rtl.or(self.rtl),
            rsc: over.rsc.or(self.rsc),
            tsx: over.tsx.or(self.tsx),
            registries,
        }
    }
}

impl From<ProjectManifest> for PartialConfig {
    fn from(manifest: ProjectManifest) -> Self {
        let tailwind = manifest.tailwind.unwrap_or_default();
        let aliases = manifest.aliases.unwrap_or_default();
        Self {
            style: manifest.style,
            base_color: tailwind.base_color,
            css_variables: tailwind.css_variables,
            tailwind_config: tailwind.config,
            tailwind_css: tailwind.css,
            tailwind_prefix: tailwind.prefix,
            aliases: PartialAliases {
                components: aliases.components,
                ui: aliases.ui,
                utils: aliases.utils,
                hooks: aliases.hooks,
                lib: aliases.lib,
            },
            icon_library: manifest.icon_library,
            rtl: manifest.rtl,
            rsc: manifest.rsc,
            tsx: manifest.tsx,
            registries: manifest.registries.unwrap_or_default(),
        }
    }
}

impl From<&PartialConfig> for ProjectManifest {
    fn from(config: &PartialConfig) -> Self {
        let aliases = &config.aliases;
        ProjectManifest {
            schema: Some(MANIFEST_SCHEMA_URL.to_string()),
            style: config.style.clone(),
            rsc: config.rsc,
            tsx: config.tsx,
            tailwind: Some(TailwindManifest {
                config: config.tailwind_config.clone(),
                css: config.tailwind_css.clone(),
                base_color: config.base_color.clone(),
                css_variables: config.css_variables,
                prefix: config.tailwind_prefix.clone(),
            }),
            aliases: Some(AliasesManifest {
                components: aliases.components.clone(),
                ui: aliases.ui.clone(),
                utils: aliases.utils.clone(),
                hooks: aliases.hooks.clone(),
                lib: aliases.lib.clone(),
            }),
            icon_library: config.icon_library.clone(),
            rtl: config.rtl,
            registries: (!config.registries.is_empty()).then(|| config.registries.clone()),
        }
    }
}

/// Shadow configuration for a project that does not exist on disk
#[cfg(test)]
pub(crate) fn test_config() -> ProjectConfig {
    ConfigReconciler::new()
        .resolve_with_env(std::path::Path::new("/uikit-test-project"), |_| None)
        .expect("shadow config")
}
