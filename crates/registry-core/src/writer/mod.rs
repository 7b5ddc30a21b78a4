//! Placing transformed registry files into the project
//!
//! [`prepare_files`] decides where every file of a resolved tree goes and
//! runs the transform pipeline over it. [`Writer`] then puts the prepared
//! files on disk, one independent outcome per file.

use crate::config::ProjectConfig;
use crate::resolver::ResolvedTree;
use crate::schema::{ItemType, RegistryItem, RegistryItemFile};
use crate::transform::{source_tailwind_version, Pipeline, TransformContext};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Registry folders that name where a file's project-relative part begins
const ROOT_FOLDERS: &[&str] = &["ui", "lib", "hooks", "components", "blocks"];

/// A file ready to be written: final location and final content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFile {
    /// Name of the item that ships the file
    pub item: String,
    /// Path of the file inside the registry item
    pub source_path: String,
    pub target: PathBuf,
    pub content: String,
}

/// Files prepared from a tree, plus the ones that could not be placed
#[derive(Debug, Default)]
pub struct PreparedSet {
    pub files: Vec<PreparedFile>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub overwrite: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The file exists with different content and overwriting is off
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum WriteOutcome {
    Written,
    Overwritten,
    /// Identical content already on disk
    Unchanged,
    /// Dry run: the file would have been written
    WouldWrite,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: WriteOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub files: Vec<FileReport>,
}

impl WriteReport {
    fn count(&self, pred: impl Fn(&WriteOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    /// Files written, overwritten or (in a dry run) that would be
    pub fn written(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                WriteOutcome::Written | WriteOutcome::Overwritten | WriteOutcome::WouldWrite
            )
        })
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Where a registry file belongs in the project.
///
/// An explicit `target` wins (`~/` and relative paths are taken from the
/// project root). Otherwise the file type picks the directory, keeping the
/// sub-path below the registry folder the file was published in.
pub fn target_path(
    item: &RegistryItem,
    file: &RegistryItemFile,
    config: &ProjectConfig,
) -> Result<PathBuf, String> {
    let root = &config.resolved_paths.cwd;

    if let Some(target) = file.target.as_deref().filter(|t| !t.trim().is_empty()) {
        let relative = target
            .strip_prefix("~/")
            .unwrap_or(target)
            .trim_start_matches('/');
        check_relative(relative, &item.name)?;
        return Ok(root.join(relative));
    }

    check_relative(&file.path, &item.name)?;
    let paths = &config.resolved_paths;
    let file_type = file.file_type.unwrap_or(item.item_type);
    let dir = match file_type {
        ItemType::Ui => &paths.ui,
        ItemType::Lib => &paths.lib,
        ItemType::Hook => &paths.hooks,
        ItemType::Block
        | ItemType::Component
        | ItemType::Page
        | ItemType::Example
        | ItemType::Internal => &paths.components,
        ItemType::Style | ItemType::Theme | ItemType::File | ItemType::Item | ItemType::Font => {
            return Ok(root.join(&file.path))
        }
    };
    Ok(dir.join(sub_path(&file.path)))
}

fn check_relative(path: &str, item: &str) -> Result<(), String> {
    if path.split(['/', '\\']).any(|seg| seg == "..") {
        return Err(format!(
            "file '{}' of item '{}' would be written outside the project",
            path, item
        ));
    }
    Ok(())
}

/// Part of a registry path below its first root folder, or the file name
fn sub_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.iter().position(|seg| ROOT_FOLDERS.contains(seg)) {
        Some(idx) if idx + 1 < segments.len() => segments[idx + 1..].join("/"),
        _ => segments.last().map(|s| s.to_string()).unwrap_or_default(),
    }
}

/// Place and transform every file of `tree`
pub fn prepare_files(tree: &ResolvedTree, config: &ProjectConfig, pipeline: &Pipeline) -> PreparedSet {
    let mut prepared = PreparedSet::default();

    for resolved in &tree.items {
        let item = &resolved.item;
        let source_tailwind = source_tailwind_version(item, &config.style);

        for file in &item.files {
            let target = match target_path(item, file, config) {
                Ok(target) => target,
                Err(reason) => {
                    warn!(item = %item.name, path = %file.path, %reason, "rejecting file");
                    prepared.rejected.push(reason);
                    continue;
                }
            };
            let ctx = TransformContext {
                config,
                tree,
                path: &target,
                source_tailwind,
            };
            let content = pipeline.run(&file.content, &ctx);
            prepared.files.push(PreparedFile {
                item: item.name.clone(),
                source_path: file.path.clone(),
                target,
                content,
            });
        }
    }

    prepared
}

/// Writes prepared files under a project root
pub struct Writer {
    root: PathBuf,
}

impl Writer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write every file; a failing file never stops the others
    pub async fn write(&self, files: &[PreparedFile], options: WriteOptions) -> WriteReport {
        let mut report = WriteReport::default();
        for file in files {
            let outcome = self
                .write_one(&file.target, &file.content, options.overwrite, options.dry_run)
                .await;
            report.files.push(FileReport {
                path: self.display_path(&file.target),
                outcome,
            });
        }
        info!(
            written = report.written(),
            unchanged = report.unchanged(),
            skipped = report.skipped(),
            failed = report.failed(),
            "finished writing files"
        );
        report
    }

    /// Write an updated project file; it always replaces the old content
    pub async fn write_update(&self, path: &Path, content: &str, dry_run: bool) -> FileReport {
        FileReport {
            path: self.display_path(path),
            outcome: self.write_one(path, content, true, dry_run).await,
        }
    }

    async fn write_one(&self, target: &Path, content: &str, overwrite: bool, dry_run: bool) -> WriteOutcome {
        let exists = match fs::read(target).await {
            Ok(existing) if existing == content.as_bytes() => return WriteOutcome::Unchanged,
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return WriteOutcome::Failed(format!("could not read existing file: {}", e)),
        };

        if exists && !overwrite {
            debug!(path = %target.display(), "skipping existing file");
            return WriteOutcome::Skipped(SkipReason::Conflict);
        }
        if dry_run {
            return WriteOutcome::WouldWrite;
        }

        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                return WriteOutcome::Failed(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ));
            }
        }
        match fs::write(target, content).await {
            Ok(()) if exists => WriteOutcome::Overwritten,
            Ok(()) => WriteOutcome::Written,
            Err(e) => WriteOutcome::Failed(format!("failed to write file: {}", e)),
        }
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
