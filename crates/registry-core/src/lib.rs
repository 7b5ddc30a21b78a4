//! Registry Core - Shared library for component registry CLIs
//!
//! This library resolves components published in JSON registries, rewrites
//! their source for the target project and installs them. It is designed to be
//! used by CLI binaries that share the same workflow but have different
//! product configurations.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Schemas, registry fetching, dependency
//!   resolution, config reconciliation, source transforms, file writing
//! - **Layer 2: Workflow Orchestration** - `ProductConfig` trait and the
//!   `add_components` workflow with its `Confirm` checkpoints
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use registry_core::{add_components, AddOptions, AddRequest, AutoConfirm};
//! use registry_core::registry::{FetchSettings, RegistryFetcher};
//! use std::sync::Arc;
//!
//! let fetcher = RegistryFetcher::new(&FetchSettings::new("my-cli", cwd.clone()))?;
//! let request = AddRequest { cwd, components: vec!["button".into()] };
//! let summary =
//!     add_components(&request, Arc::new(fetcher), &AddOptions::default(), &mut AutoConfirm)
//!         .await?;
//! ```

pub mod config;
pub mod error;
pub mod install;
pub mod product;
pub mod project;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod transform;
pub mod updater;
pub mod writer;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{resolve_config, ConfigReconciler, PartialConfig, ProjectConfig};
pub use error::{ConfigError, RegistryError};
pub use install::{
    add_components, load_config, AddOptions, AddRequest, AddSummary, AutoConfirm, Checkpoint,
    Confirm,
};
pub use product::ProductConfig;
pub use registry::{search_registries, RegistryClient, SearchOptions, SearchResults};
pub use resolver::{resolve_tree, ResolvedTree};
pub use schema::{RegistryIndex, RegistryItem};
pub use transform::Pipeline;
pub use writer::{WriteOptions, WriteOutcome, WriteReport, Writer};

#[cfg(feature = "tui")]
pub use tui::run_add;
