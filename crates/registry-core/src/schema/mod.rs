//! Typed descriptors for every external JSON payload
//!
//! This module provides:
//! - Registry item descriptors (RegistryItem, RegistryItemFile, ItemType)
//! - Registry index summaries (RegistryIndex, IndexEntry)
//! - The project manifest (ProjectManifest)
//!
//! Each payload has exactly one type. Registry payloads ignore fields they do
//! not use; the project manifest rejects unknown fields.

pub mod index;
pub mod item;
pub mod manifest;

pub use index::{IndexEntry, RegistryIndex};
pub use item::{CssRules, CssVars, FontSpec, ItemMeta, ItemType, RegistryItem, RegistryItemFile};
pub use manifest::{
    AliasesManifest, ProjectManifest, RegistryManifest, RegistryManifestEntry, TailwindManifest,
    MANIFEST_FILE,
};
