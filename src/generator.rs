use crate::ast::Node;
use crate::css::CssFormatter;
use crate::design_system::DesignSystem;
use crate::stylesheet::Stylesheet;
use crate::theme::ThemeOptions;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub minify: bool,
    /// Emit only the theme variables the output references.
    pub tree_shake: bool,
    /// Extra theme variables applied after the stylesheet's `@theme` blocks.
    pub variables: Vec<(String, String)>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            minify: false,
            tree_shake: true,
            variables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub css: CssOutput,
    pub class_count: usize,
    /// Distinct candidates that produced no CSS, sorted.
    pub invalid: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssOutput(String);

impl CssOutput {
    pub fn new(css: String) -> Self {
        Self(css)
    }
}

impl Deref for CssOutput {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CssOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<String> for CssOutput {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<CssOutput> for String {
    fn from(value: CssOutput) -> Self {
        value.0
    }
}

/// CSS for `candidates` against the default theme extended by `theme_css`:
/// the tree-shaken theme block followed by one rule per valid candidate.
pub fn generate<S: AsRef<str>>(candidates: &[S], theme_css: &str) -> String {
    generate_with_config(candidates, theme_css, &GeneratorConfig::default())
        .css
        .into()
}

pub fn generate_with_config<S: AsRef<str>>(
    candidates: &[S],
    theme_css: &str,
    config: &GeneratorConfig,
) -> GenerationResult {
    let mut stylesheet = Stylesheet::with_default_theme(theme_css);
    for (name, value) in &config.variables {
        stylesheet.theme.add(name.as_str(), value.as_str(), ThemeOptions::default());
    }
    let design_system = stylesheet.into_design_system();
    generate_with_design_system(&design_system, candidates, config)
}

/// Generates a document from an existing design system, reusing its caches.
pub fn generate_with_design_system<S: AsRef<str>>(
    design_system: &DesignSystem,
    candidates: &[S],
    config: &GeneratorConfig,
) -> GenerationResult {
    let mut seen = BTreeSet::new();
    let mut invalid = BTreeSet::new();
    let mut ordered = Vec::new();

    for candidate in candidates {
        let raw = candidate.as_ref().trim();
        if raw.is_empty() || !seen.insert(raw) {
            continue;
        }
        match design_system.sort_key(raw) {
            Some(key) => ordered.push((key, raw)),
            None => {
                invalid.insert(raw.to_string());
            }
        }
    }
    ordered.sort();

    let mut rules = Vec::<Node>::new();
    let mut class_count = 0;
    for (_, raw) in ordered {
        match design_system.candidate_nodes(raw) {
            Some(nodes) => {
                rules.extend(nodes.iter().cloned());
                class_count += 1;
            }
            None => {
                invalid.insert(raw.to_string());
            }
        }
    }

    // Theme usage is only known once every rule has been compiled.
    let mut document = design_system.theme().to_nodes(config.tree_shake);
    document.extend(rules);
    let css = CssFormatter::new().minify(config.minify).print(&document);

    info!(
        classes = class_count,
        invalid = invalid.len(),
        bytes = css.len(),
        "generated css"
    );

    GenerationResult {
        css: CssOutput::new(css),
        class_count,
        invalid: invalid.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{GeneratorConfig, generate, generate_with_config};

    #[test]
    fn emits_theme_then_sorted_utilities() {
        let css = generate(&["p-4", "flex", "p-4"], "");
        assert_eq!(
            css,
            ":root, :host {\n  --spacing: 0.25rem;\n}\n\n\
             .flex {\n  display: flex;\n}\n\n\
             .p-4 {\n  padding: calc(var(--spacing) * 4);\n}"
        );
    }

    #[test]
    fn counts_valid_classes_and_reports_invalid_ones() {
        let result = generate_with_config(
            &["flex", "nope", "bg-unknown-500", "flex"],
            "",
            &GeneratorConfig::default(),
        );
        assert_eq!(result.class_count, 1);
        assert_eq!(result.invalid, vec!["bg-unknown-500".to_string(), "nope".to_string()]);
        assert_eq!(result.css.to_string(), ".flex {\n  display: flex;\n}");
    }

    #[test]
    fn minified_output() {
        let config = GeneratorConfig {
            minify: true,
            ..GeneratorConfig::default()
        };
        let result = generate_with_config(&["flex", "block"], "", &config);
        assert!(result.css.ends_with(".block{display:block}.flex{display:flex}"));
        assert!(!result.css.contains('\n'));
    }

    #[test]
    fn config_variables_extend_the_theme() {
        let config = GeneratorConfig {
            variables: vec![("--color-brand-500".to_string(), "#3b82f6".to_string())],
            ..GeneratorConfig::default()
        };
        let result = generate_with_config(&["text-brand-500"], "", &config);
        assert!(result.css.contains("--color-brand-500: #3b82f6;"));
        assert!(result.css.contains(".text-brand-500 {\n  color: var(--color-brand-500);\n}"));
    }

    #[test]
    fn disabled_tree_shaking_emits_every_variable() {
        let config = GeneratorConfig {
            tree_shake: false,
            ..GeneratorConfig::default()
        };
        let result = generate_with_config(&["flex"], "@theme { --*: initial; --color-a: red; }", &config);
        assert_eq!(
            &*result.css,
            ":root, :host {\n  --color-a: red;\n}\n\n.flex {\n  display: flex;\n}"
        );
    }
}
