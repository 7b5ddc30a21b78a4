//! Charm-style CLI prompts using cliclack

use crate::config::{PartialConfig, DEFAULT_BASE_COLOR, DEFAULT_ICON_LIBRARY, DEFAULT_STYLE};
use crate::install::{add_components, AddOptions, AddRequest, AddSummary, Checkpoint, Confirm};
use crate::product::ProductConfig;
use crate::registry::FetchClient;
use crate::report::{counts_line, file_line};
use crate::writer::{PreparedFile, WriteOutcome};
use anyhow::Result;
use cliclack::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;

const STYLES: &[(&str, &str)] = &[
    ("new-york", "New York"),
    ("default", "Default"),
    ("base-nova", "Base Nova"),
];

const BASE_COLORS: &[&str] = &["neutral", "gray", "zinc", "stone", "slate"];

const ICON_LIBRARIES: &[&str] = &["lucide", "tabler", "phosphor", "hugeicons"];

/// Arguments for the add command
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    /// Project root
    pub cwd: PathBuf,

    /// Components to add
    pub components: Vec<String>,

    /// Replace files that differ from the registry version
    pub overwrite: bool,

    /// Report what would be written without touching the project
    pub dry_run: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Arguments for the init command; unset values are prompted for
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub style: Option<String>,
    pub base_color: Option<String>,
    pub icon_library: Option<String>,
    pub yes: bool,
}

/// Cliclack confirmations between workflow stages.
///
/// Owns the progress spinner so prompts never draw over it.
pub struct PromptConfirm {
    spinner: Option<ProgressBar>,
    overwrite: bool,
    yes: bool,
}

impl PromptConfirm {
    pub fn new(overwrite: bool, yes: bool) -> Self {
        let mut confirm = Self {
            spinner: None,
            overwrite,
            yes,
        };
        confirm.resume("Resolving components...");
        confirm
    }

    fn resume(&mut self, message: &str) {
        let spinner = cliclack::spinner();
        spinner.start(message);
        self.spinner = Some(spinner);
    }

    fn finish(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        }
    }
}

/// Prepared files whose target exists with different content
fn changed_on_disk(files: &[PreparedFile]) -> usize {
    files
        .iter()
        .filter(|f| {
            std::fs::read_to_string(&f.target)
                .map(|current| current != f.content)
                .unwrap_or(false)
        })
        .count()
}

impl Confirm for PromptConfirm {
    fn confirm(&mut self, checkpoint: &Checkpoint<'_>) -> Result<bool> {
        match checkpoint {
            Checkpoint::Resolved(tree) => {
                self.finish(&format!("Resolved {} item(s)", tree.items.len()));
                for warning in &tree.warnings {
                    cliclack::log::warning(warning)?;
                }
                cliclack::note("Components", tree.names().join("\n"))?;
                let proceed = self.yes
                    || cliclack::confirm("Add these components?")
                        .initial_value(true)
                        .interact()?;
                if proceed {
                    self.resume("Preparing files...");
                }
                Ok(proceed)
            }
            Checkpoint::Prepared(files) => {
                let changed = changed_on_disk(files);
                self.finish(&format!("Prepared {} file(s)", files.len()));
                if changed == 0 {
                    self.resume("Writing files...");
                    return Ok(true);
                }

                let proceed = if !self.overwrite {
                    cliclack::log::warning(format!(
                        "{} file(s) already exist and will be skipped (use --overwrite to replace them)",
                        changed
                    ))?;
                    true
                } else {
                    self.yes
                        || cliclack::confirm(format!("Overwrite {} existing file(s)?", changed))
                            .initial_value(false)
                            .interact()?
                };
                if proceed {
                    self.resume("Writing files...");
                }
                Ok(proceed)
            }
        }
    }
}

/// Run the add workflow with interactive prompts
pub async fn run_add<C: ProductConfig>(
    product: &C,
    fetcher: Arc<dyn FetchClient>,
    args: AddArgs,
) -> Result<AddSummary> {
    cliclack::intro(product.display_name())?;
    if args.dry_run {
        cliclack::log::info("Dry run: no files will be written")?;
    }

    let request = AddRequest {
        cwd: args.cwd.clone(),
        components: args.components.clone(),
    };
    let options = AddOptions {
        overwrite: args.overwrite,
        dry_run: args.dry_run,
        registry_url: Some(product.registry_url()),
    };

    let mut confirm = PromptConfirm::new(args.overwrite, args.yes);
    let result = add_components(&request, fetcher, &options, &mut confirm).await;
    confirm.finish("Done");
    let summary = result?;

    print_summary(product, &summary)?;
    Ok(summary)
}

fn print_summary<C: ProductConfig>(product: &C, summary: &AddSummary) -> Result<()> {
    for failure in &summary.failures {
        cliclack::log::error(format!("{}: {}", failure.reference, failure.message))?;
    }
    if summary.cancelled {
        cliclack::outro_cancel("Cancelled, no files were written.")?;
        return Ok(());
    }
    if summary.items.is_empty() {
        cliclack::outro_cancel("Nothing to add.")?;
        return Ok(());
    }

    for warning in summary.warnings.iter().filter(|w| !w.is_empty()) {
        cliclack::log::warning(warning)?;
    }
    for file in summary.files.files.iter().chain(summary.updates.iter()) {
        let line = file_line(file);
        match file.outcome {
            WriteOutcome::Failed(_) => cliclack::log::error(line)?,
            WriteOutcome::Skipped(_) => cliclack::log::warning(line)?,
            WriteOutcome::Unchanged => cliclack::log::remark(line)?,
            _ => cliclack::log::success(line)?,
        }
    }
    for doc in &summary.docs {
        cliclack::note("Docs", doc)?;
    }

    let steps = product.next_steps(summary);
    if !steps.is_empty() {
        println!();
        println!("  {}", console::style("Next steps").bold());
        println!();
        for (i, step) in steps.iter().enumerate() {
            println!("  {}.  {}", console::style(i + 1).dim(), step);
        }
    }

    cliclack::outro(counts_line(summary))?;
    Ok(())
}

/// Ask for the values `init` needs, falling back to defaults with `--yes`
pub fn prompt_init<C: ProductConfig>(product: &C, args: &InitArgs) -> Result<PartialConfig> {
    cliclack::intro(product.display_name())?;

    let style = match &args.style {
        Some(style) => style.clone(),
        None if args.yes => DEFAULT_STYLE.to_string(),
        None => {
            let mut select = cliclack::select("Which style would you like to use?");
            for (value, label) in STYLES {
                select = select.item(value.to_string(), *label, "");
            }
            select.initial_value(DEFAULT_STYLE.to_string()).interact()?
        }
    };

    let base_color = match &args.base_color {
        Some(color) => color.clone(),
        None if args.yes => DEFAULT_BASE_COLOR.to_string(),
        None => {
            let mut select = cliclack::select("Which color would you like to use as the base color?");
            for color in BASE_COLORS {
                select = select.item(color.to_string(), *color, "");
            }
            select.initial_value(DEFAULT_BASE_COLOR.to_string()).interact()?
        }
    };

    let icon_library = match &args.icon_library {
        Some(library) => library.clone(),
        None if args.yes => DEFAULT_ICON_LIBRARY.to_string(),
        None => {
            let mut select = cliclack::select("Which icon library would you like to use?");
            for library in ICON_LIBRARIES {
                select = select.item(library.to_string(), *library, "");
            }
            select.initial_value(DEFAULT_ICON_LIBRARY.to_string()).interact()?
        }
    };

    Ok(PartialConfig {
        style: Some(style),
        base_color: Some(base_color),
        icon_library: Some(icon_library),
        ..PartialConfig::defaults()
    })
}
