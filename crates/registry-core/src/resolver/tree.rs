//! The resolved, de-duplicated and ordered set of items to install

use super::merge::{merge_css_vars, merge_json, PackageSet};
use crate::error::RegistryError;
use crate::registry::ItemRef;
use crate::schema::{CssRules, CssVars, FontSpec, RegistryItem};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// An item together with the reference it was resolved from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    #[serde(skip)]
    pub reference: ItemRef,
    #[serde(flatten)]
    pub item: RegistryItem,
}

/// A directly requested name that could not be resolved
#[derive(Debug)]
pub struct ResolveFailure {
    pub reference: String,
    pub error: RegistryError,
}

/// Outcome of dependency resolution
#[derive(Debug, Default)]
pub struct ResolvedTree {
    /// Leaves first; every item appears after all of its dependencies
    pub items: Vec<ResolvedItem>,
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub css_vars: CssVars,
    /// Stylesheet rules keyed by selector or at-rule
    pub css: CssRules,
    /// Later items win for the same key
    pub env_vars: IndexMap<String, String>,
    pub tailwind: Option<Value>,
    pub fonts: Vec<FontSpec>,
    pub docs: Vec<String>,
    pub warnings: Vec<String>,
    pub failures: Vec<ResolveFailure>,
}

impl ResolvedTree {
    /// Build a tree from items already in install order, aggregating their
    /// packages, styles, env vars, Tailwind config, fonts and docs
    pub fn from_ordered(items: Vec<ResolvedItem>) -> Self {
        let mut dependencies = PackageSet::new();
        let mut dev_dependencies = PackageSet::new();
        let mut css_vars = CssVars::new();
        let mut css = CssRules::new();
        let mut env_vars = IndexMap::new();
        let mut tailwind: Option<Value> = None;
        let mut fonts: Vec<FontSpec> = Vec::new();
        let mut docs: Vec<String> = Vec::new();

        for ResolvedItem { item, .. } in &items {
            item.dependencies.iter().for_each(|d| dependencies.add(d));
            item.dev_dependencies
                .iter()
                .for_each(|d| dev_dependencies.add(d));
            merge_css_vars(&mut css_vars, &item.css_vars);
            for (selector, rules) in &item.css {
                match css.get_mut(selector) {
                    Some(existing) => merge_json(existing, rules),
                    None => {
                        css.insert(selector.clone(), rules.clone());
                    }
                }
            }
            env_vars.extend(item.env_vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            if let Some(fragment) = &item.tailwind {
                match tailwind.as_mut() {
                    Some(existing) => merge_json(existing, fragment),
                    None => tailwind = Some(fragment.clone()),
                }
            }
            for font in &item.fonts {
                if !fonts.iter().any(|f| f.family == font.family) {
                    fonts.push(font.clone());
                }
            }
            if let Some(doc) = item.docs_text() {
                if !docs.iter().any(|d| d == doc) {
                    docs.push(doc.to_string());
                }
            }
        }

        Self {
            items,
            dependencies: dependencies.to_specs(),
            dev_dependencies: dev_dependencies.to_specs(),
            css_vars,
            css,
            env_vars,
            tailwind,
            fonts,
            docs,
            warnings: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of the resolved items, in install order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.item.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolved(value: Value) -> ResolvedItem {
        let item: RegistryItem = serde_json::from_value(value).unwrap();
        ResolvedItem {
            reference: ItemRef::registry("@shadcn", item.name.clone()),
            item,
        }
    }

    #[test]
    fn test_aggregates_in_install_order() {
        let tree = ResolvedTree::from_ordered(vec![
            resolved(json!({
                "name": "utils", "type": "registry:lib",
                "files": [{ "path": "lib/utils.ts", "content": "" }],
                "dependencies": ["clsx@2.0.0", "tailwind-merge"],
                "cssVars": { "light": { "radius": "0.5rem", "background": "white" } },
                "fonts": [{ "family": "Inter", "import": "Inter", "variable": "--font-sans" }],
                "css": { "@layer base": { "body": { "color": "black" } } },
                "envVars": { "API_URL": "http://localhost", "TOKEN": "" }
            })),
            resolved(json!({
                "name": "button", "type": "registry:ui",
                "files": [{ "path": "ui/button.tsx", "content": "" }],
                "dependencies": ["clsx@1.0.0", "@radix-ui/react-slot"],
                "cssVars": { "light": { "radius": "1rem" } },
                "tailwind": { "config": { "plugins": ["animate"] } },
                "fonts": [{ "family": "Inter", "import": "Inter", "variable": "--font-other" }],
                "docs": "Button docs",
                "css": { "@layer base": { "body": { "margin": "0" } }, ".btn": "color: red" },
                "envVars": { "API_URL": "https://api.example.com" }
            })),
        ]);

        assert_eq!(tree.names(), vec!["utils", "button"]);
        assert_eq!(
            tree.dependencies,
            vec!["clsx@2.0.0", "tailwind-merge", "@radix-ui/react-slot"]
        );
        assert_eq!(tree.css_vars["light"]["radius"], "1rem");
        assert_eq!(tree.css_vars["light"]["background"], "white");
        assert_eq!(tree.fonts.len(), 1);
        assert_eq!(tree.fonts[0].variable, "--font-sans");
        assert_eq!(tree.docs, vec!["Button docs"]);
        assert_eq!(tree.tailwind, Some(json!({ "config": { "plugins": ["animate"] } })));
        assert_eq!(
            tree.css["@layer base"],
            json!({ "body": { "color": "black", "margin": "0" } })
        );
        assert_eq!(tree.css[".btn"], json!("color: red"));
        assert_eq!(tree.env_vars["API_URL"], "https://api.example.com");
        assert_eq!(tree.env_vars["TOKEN"], "");
    }
}
