//! The add workflow: resolve, transform, write, update project files
//!
//! Every stage runs to completion before the next starts, so a caller can
//! stop between stages through [`Confirm`] without leaving partial writes.

use crate::config::{ConfigReconciler, ConfigSource, ProjectConfig};
use crate::project::detect_framework;
use crate::registry::{FetchClient, RegistryClient, DEFAULT_REGISTRY};
use crate::resolver::{resolve_tree, ResolvedTree};
use crate::schema::FontSpec;
use crate::transform::Pipeline;
use crate::updater::{
    apply_font_requirements, plan_css_update, plan_env_update, plan_layout_update,
    plan_tailwind_config_update,
};
use crate::writer::{
    prepare_files, FileReport, PreparedFile, WriteOptions, WriteOutcome, WriteReport, Writer,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AddRequest {
    /// Project root
    pub cwd: PathBuf,
    /// References as typed by the user
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub overwrite: bool,
    pub dry_run: bool,
    /// Base URL of the built-in registry, when overridden
    pub registry_url: Option<String>,
}

/// Points at which the workflow asks before continuing
#[derive(Debug)]
pub enum Checkpoint<'a> {
    /// Items resolved, nothing touched yet
    Resolved(&'a ResolvedTree),
    /// Files placed and transformed, about to be written
    Prepared(&'a [PreparedFile]),
}

/// Decides whether the workflow continues past a checkpoint
pub trait Confirm {
    fn confirm(&mut self, checkpoint: &Checkpoint<'_>) -> Result<bool>;
}

/// Continues at every checkpoint (`--yes`)
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _checkpoint: &Checkpoint<'_>) -> Result<bool> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureSummary {
    pub reference: String,
    pub kind: String,
    pub message: String,
}

/// Everything the add workflow did, or would have done
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSummary {
    /// Resolved item names in install order
    pub items: Vec<String>,
    pub files: WriteReport,
    /// Stylesheet, env file, Tailwind config and layout changes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<FileReport>,
    /// Packages for the caller to install
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub fonts: Vec<FontSpec>,
    pub docs: Vec<String>,
    pub warnings: Vec<String>,
    pub failures: Vec<FailureSummary>,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl AddSummary {
    fn from_tree(tree: &ResolvedTree, dry_run: bool) -> Self {
        Self {
            items: tree.names().into_iter().map(str::to_string).collect(),
            dependencies: tree.dependencies.clone(),
            dev_dependencies: tree.dev_dependencies.clone(),
            fonts: tree.fonts.clone(),
            docs: tree.docs.clone(),
            warnings: tree.warnings.clone(),
            failures: tree
                .failures
                .iter()
                .map(|f| FailureSummary {
                    reference: f.reference.clone(),
                    kind: f.error.kind().to_string(),
                    message: f.error.to_string(),
                })
                .collect(),
            dry_run,
            ..Default::default()
        }
    }

    /// At least one item resolved and the run was not cancelled. Partial
    /// writes count; a run in which every file failed does not.
    pub fn is_success(&self) -> bool {
        let all_failed = !self.files.files.is_empty()
            && self
                .files
                .files
                .iter()
                .all(|f| matches!(f.outcome, WriteOutcome::Failed(_)));
        !self.items.is_empty() && !self.cancelled && !all_failed
    }
}

fn reconciler(options: &AddOptions) -> ConfigReconciler {
    match &options.registry_url {
        Some(url) => ConfigReconciler::new().default_registry_url(url.clone()),
        None => ConfigReconciler::new(),
    }
}

/// Reconcile the project configuration. Projects without a manifest pick up
/// the defaults the built-in registry publishes, when it publishes any.
pub async fn load_config(
    cwd: &std::path::Path,
    fetcher: Arc<dyn FetchClient>,
    options: &AddOptions,
) -> Result<ProjectConfig> {
    let config = reconciler(options)
        .resolve(cwd)
        .context("Failed to load project configuration")?;
    if config.source != ConfigSource::Shadow {
        return Ok(config);
    }

    let client = RegistryClient::new(fetcher, config.registries.clone(), config.style.clone());
    match client.fetch_registry_defaults(DEFAULT_REGISTRY).await {
        Some(defaults) => reconciler(options)
            .registry_defaults(Some(defaults))
            .resolve(cwd)
            .context("Failed to apply registry defaults"),
        None => Ok(config),
    }
}

/// Add the requested items to the project at `request.cwd`
pub async fn add_components(
    request: &AddRequest,
    fetcher: Arc<dyn FetchClient>,
    options: &AddOptions,
    confirm: &mut dyn Confirm,
) -> Result<AddSummary> {
    let config = load_config(&request.cwd, fetcher.clone(), options).await?;
    let client = RegistryClient::new(fetcher, config.registries.clone(), config.style.clone());

    let framework = detect_framework(&config.resolved_paths.cwd);
    let mut tree = resolve_tree(&client, &request.components).await;
    apply_font_requirements(&mut tree, framework);
    let mut summary = AddSummary::from_tree(&tree, options.dry_run);
    if tree.is_empty() {
        warn!("nothing was resolved");
        return Ok(summary);
    }
    if !confirm.confirm(&Checkpoint::Resolved(&tree))? {
        summary.cancelled = true;
        return Ok(summary);
    }

    let prepared = prepare_files(&tree, &config, &Pipeline::standard());
    summary.warnings.extend(prepared.rejected);
    if !confirm.confirm(&Checkpoint::Prepared(&prepared.files))? {
        summary.cancelled = true;
        return Ok(summary);
    }

    let writer = Writer::new(&config.resolved_paths.cwd);
    summary.files = writer
        .write(
            &prepared.files,
            WriteOptions {
                overwrite: options.overwrite,
                dry_run: options.dry_run,
            },
        )
        .await;

    let plans = [
        ("the stylesheet", plan_css_update(&config, &tree).await),
        ("environment variables", plan_env_update(&config, &tree).await),
        ("the Tailwind config", plan_tailwind_config_update(&config, &tree).await),
        ("fonts", plan_layout_update(&config, &tree, framework).await),
    ];
    for (target, plan) in plans {
        match plan {
            Ok(Some(update)) => summary
                .updates
                .push(writer.write_update(&update.path, &update.content, options.dry_run).await),
            Ok(None) => {}
            Err(e) => summary
                .warnings
                .push(format!("Could not update {}: {:#}", target, e)),
        }
    }

    info!(items = summary.items.len(), written = summary.files.written(), "add finished");
    Ok(summary)
}
