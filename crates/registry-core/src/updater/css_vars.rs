//! Upserting registry CSS variables into the project stylesheet
//!
//! Tailwind 3 projects keep variables in `:root`/`.dark` rules inside
//! `@layer base`. Tailwind 4 projects use top-level `:root`/`.dark` rules and
//! an `@theme inline` block. Existing declarations are updated in place, new
//! ones appended to their rule, and everything else is left as it was.

use super::stylesheet::{ensure_block, find_block, upsert_declarations};
use crate::project::TailwindVersion;
use crate::schema::CssVars;
use indexmap::IndexMap;

const BASE_LAYER: &str = "@layer base";
const THEME_BLOCK: &str = "@theme inline";

/// Merge `vars` into `css` for the given Tailwind version
pub fn update_css_vars(css: &str, vars: &CssVars, version: TailwindVersion) -> String {
    let mut output = css.to_string();
    for (mode, values) in vars {
        if values.is_empty() {
            continue;
        }
        let path = block_path(mode, version);
        output = ensure_block(output, &path);
        let indent = "  ".repeat(path.len());
        let properties: IndexMap<String, String> = values
            .iter()
            .map(|(name, value)| (format!("--{}", name.trim_start_matches("--")), value.clone()))
            .collect();
        if let Some(block) = find_block(&output, &path) {
            output = upsert_declarations(&output, &block, &properties, &indent);
        }
    }
    output
}

/// Where a mode's variables live
fn block_path(mode: &str, version: TailwindVersion) -> Vec<String> {
    let selector = match mode {
        "light" => ":root".to_string(),
        "theme" if version == TailwindVersion::V3 => ":root".to_string(),
        "theme" => THEME_BLOCK.to_string(),
        other => format!(".{}", other),
    };
    match version {
        TailwindVersion::V3 => vec![BASE_LAYER.to_string(), selector],
        TailwindVersion::V4 => vec![selector],
    }
}
