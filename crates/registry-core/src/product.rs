//! Product configuration trait for CLI binaries
//!
//! A binary built on this crate describes itself through [`ProductConfig`]:
//! its identity, where its built-in registry lives and what to tell the user
//! once components were added.

use crate::install::AddSummary;

/// Configuration trait for CLI products
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for the CLI command and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Base URL of the built-in `@shadcn`-style registry
    fn default_registry_url(&self) -> &'static str;

    /// Environment variable overriding the built-in registry URL
    fn registry_url_env(&self) -> &'static str;

    /// URL for product documentation
    fn docs_url(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Package manager used in the suggested install commands
    fn package_manager(&self) -> &'static str {
        "npm"
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> String {
        format!("{}/{}", self.name(), env!("CARGO_PKG_VERSION"))
    }

    /// The built-in registry URL, unless overridden through the environment
    fn registry_url(&self) -> String {
        std::env::var(self.registry_url_env())
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.default_registry_url().to_string())
    }

    /// Instructions shown after a successful add
    fn next_steps(&self, summary: &AddSummary) -> Vec<String> {
        let pm = self.package_manager();
        let mut steps = Vec::new();
        if !summary.dependencies.is_empty() {
            steps.push(format!("{} install {}", pm, summary.dependencies.join(" ")));
        }
        if !summary.dev_dependencies.is_empty() {
            steps.push(format!(
                "{} install -D {}",
                pm,
                summary.dev_dependencies.join(" ")
            ));
        }
        for font in &summary.fonts {
            steps.push(format!(
                "Load the {} font ({}) and bind it to {}",
                font.family, font.provider, font.variable
            ));
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FontSpec;

    #[derive(Clone)]
    struct TestProduct;

    impl ProductConfig for TestProduct {
        fn name(&self) -> &'static str {
            "test-cli"
        }

        fn display_name(&self) -> &'static str {
            "Test CLI"
        }

        fn default_registry_url(&self) -> &'static str {
            "https://registry.test/r"
        }

        fn registry_url_env(&self) -> &'static str {
            "TEST_CLI_REGISTRY_URL_UNSET"
        }

        fn docs_url(&self) -> &'static str {
            "https://registry.test/docs"
        }

        fn cli_description(&self) -> &'static str {
            "Test"
        }
    }

    #[test]
    fn test_defaults() {
        let product = TestProduct;
        assert!(product.user_agent().starts_with("test-cli/"));
        assert_eq!(product.registry_url(), "https://registry.test/r");
    }

    #[test]
    fn test_next_steps() {
        let summary = AddSummary {
            dependencies: vec!["clsx".to_string(), "@radix-ui/react-slot".to_string()],
            dev_dependencies: vec!["tw-animate-css".to_string()],
            fonts: vec![FontSpec {
                family: "Inter".to_string(),
                provider: "google".to_string(),
                import: "Inter".to_string(),
                variable: "--font-sans".to_string(),
                weight: Vec::new(),
                subsets: Vec::new(),
            }],
            ..Default::default()
        };
        assert_eq!(
            TestProduct.next_steps(&summary),
            vec![
                "npm install clsx @radix-ui/react-slot",
                "npm install -D tw-animate-css",
                "Load the Inter font (google) and bind it to --font-sans",
            ]
        );
        assert!(TestProduct.next_steps(&AddSummary::default()).is_empty());
    }
}
