//! uikit CLI - Add registry components to a project

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use registry_core::config::write_manifest;
use registry_core::registry::{FetchClient, FetchSettings, RegistryFetcher, DEFAULT_REGISTRY};
use registry_core::schema::MANIFEST_FILE;
use registry_core::tui::{prompt_init, AddArgs, InitArgs};
use registry_core::{
    add_components, load_config, report, resolve_tree, search_registries, AddOptions, AddRequest,
    AutoConfirm, ProductConfig, RegistryClient, SearchOptions,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// uikit product configuration
#[derive(Clone)]
pub struct UikitConfig;

impl ProductConfig for UikitConfig {
    fn name(&self) -> &'static str {
        "uikit"
    }

    fn display_name(&self) -> &'static str {
        "uikit"
    }

    fn default_registry_url(&self) -> &'static str {
        registry_core::registry::DEFAULT_REGISTRY_URL
    }

    fn registry_url_env(&self) -> &'static str {
        "REGISTRY_URL"
    }

    fn docs_url(&self) -> &'static str {
        "https://ui.shadcn.com/docs/cli"
    }

    fn cli_description(&self) -> &'static str {
        "Add components from JSON registries to your project"
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "uikit")]
#[command(about = "Add components from JSON registries to your project")]
#[command(version)]
pub struct Args {
    /// Set log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add components and their dependencies to the project
    Add(CliAddArgs),
    /// Search registry indexes
    #[command(alias = "list")]
    Search(SearchArgs),
    /// Print resolved registry items as JSON
    View(ViewArgs),
    /// Write a components.json for the project
    Init(CliInitArgs),
}

#[derive(Parser, Debug)]
pub struct CliAddArgs {
    /// Components to add (names, @registry/name, URLs or local paths)
    #[arg(required = true)]
    pub components: Vec<String>,

    /// Overwrite existing files
    #[arg(short, long)]
    pub overwrite: bool,

    /// Show what would be written without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Project directory
    #[arg(short, long)]
    pub cwd: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Registries to search (@namespace or index URL)
    pub registries: Vec<String>,

    /// Filter items by name or description
    #[arg(short, long)]
    pub query: Option<String>,

    /// Maximum number of items to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of items to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Project directory
    #[arg(short, long)]
    pub cwd: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ViewArgs {
    /// Items to resolve
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Project directory
    #[arg(short, long)]
    pub cwd: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CliInitArgs {
    /// Style to install components in
    #[arg(short, long)]
    pub style: Option<String>,

    /// Base color for the theme
    #[arg(short, long = "base-color")]
    pub base_color: Option<String>,

    /// Icon library used by components
    #[arg(short, long = "icon-library")]
    pub icon_library: Option<String>,

    /// Replace an existing components.json
    #[arg(short, long)]
    pub force: bool,

    /// Project directory
    #[arg(short, long)]
    pub cwd: Option<PathBuf>,

    /// Use defaults for anything not given on the command line
    #[arg(short, long)]
    pub yes: bool,
}

fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn project_dir(cwd: Option<PathBuf>) -> Result<PathBuf> {
    let current = std::env::current_dir().context("Failed to read the current directory")?;
    let dir = match cwd {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => current.join(dir),
        None => current,
    };
    if !dir.is_dir() {
        bail!("Project directory does not exist: {}", dir.display());
    }
    Ok(dir)
}

fn fetcher(product: &UikitConfig, cwd: &Path) -> Result<Arc<dyn FetchClient>> {
    let settings = FetchSettings::new(product.user_agent(), cwd.to_path_buf());
    Ok(Arc::new(RegistryFetcher::new(&settings)?))
}

fn options(product: &UikitConfig) -> AddOptions {
    AddOptions {
        registry_url: Some(product.registry_url()),
        ..Default::default()
    }
}

async fn client(product: &UikitConfig, cwd: &Path) -> Result<RegistryClient> {
    let fetcher = fetcher(product, cwd)?;
    let config = load_config(cwd, fetcher.clone(), &options(product)).await?;
    Ok(RegistryClient::new(fetcher, config.registries, config.style))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

async fn run_add(product: &UikitConfig, args: CliAddArgs) -> Result<bool> {
    let cwd = project_dir(args.cwd)?;
    let fetcher = fetcher(product, &cwd)?;

    let summary = if args.yes || !console::user_attended() {
        let request = AddRequest {
            cwd,
            components: args.components,
        };
        let options = AddOptions {
            overwrite: args.overwrite,
            dry_run: args.dry_run,
            ..options(product)
        };
        let summary = add_components(&request, fetcher, &options, &mut AutoConfirm).await?;
        report::print_summary(&summary);
        summary
    } else {
        let add_args = AddArgs {
            cwd,
            components: args.components,
            overwrite: args.overwrite,
            dry_run: args.dry_run,
            yes: args.yes,
        };
        registry_core::run_add(product, fetcher, add_args).await?
    };

    Ok(summary.is_success())
}

async fn run_search(product: &UikitConfig, args: SearchArgs) -> Result<bool> {
    let cwd = project_dir(args.cwd)?;
    let client = client(product, &cwd).await?;
    let registries = if args.registries.is_empty() {
        vec![DEFAULT_REGISTRY.to_string()]
    } else {
        args.registries
    };

    let options = SearchOptions {
        query: args.query,
        limit: args.limit,
        offset: args.offset,
    };
    let results = search_registries(&client, &registries, &options).await?;
    print_json(&results)?;
    Ok(true)
}

async fn run_view(product: &UikitConfig, args: ViewArgs) -> Result<bool> {
    let cwd = project_dir(args.cwd)?;
    let client = client(product, &cwd).await?;
    let tree = resolve_tree(&client, &args.names).await;

    for failure in &tree.failures {
        eprintln!("{} {}: {}", "Error:".red().bold(), failure.reference, failure.error);
    }
    for warning in &tree.warnings {
        eprintln!("{} {}", "Warning:".yellow(), warning);
    }
    print_json(&tree.items)?;
    Ok(!tree.is_empty())
}

fn run_init(product: &UikitConfig, args: CliInitArgs) -> Result<bool> {
    let cwd = project_dir(args.cwd)?;
    let manifest = cwd.join(MANIFEST_FILE);
    if manifest.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to replace it.",
            manifest.display()
        );
    }

    let init_args = InitArgs {
        style: args.style,
        base_color: args.base_color,
        icon_library: args.icon_library,
        yes: args.yes || !console::user_attended(),
    };
    let config = prompt_init(product, &init_args)?;
    let path = write_manifest(&cwd, &config)?;
    cliclack::outro(format!("Wrote {}", path.display()))?;
    Ok(true)
}

async fn run(args: Args) -> Result<bool> {
    let product = UikitConfig;
    debug!(command = ?args.command, "starting");

    match args.command {
        Command::Add(add_args) => run_add(&product, add_args).await,
        Command::Search(search_args) => run_search(&product, search_args).await,
        Command::View(view_args) => run_view(&product, view_args).await,
        Command::Init(init_args) => run_init(&product, init_args),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    initialize_tracing(args.log_level);

    let result = run(args).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
