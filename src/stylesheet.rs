use crate::ast::Node;
use crate::candidate::{CandidateModifier, CandidateValue};
use crate::design_system::DesignSystem;
use crate::theme::{Theme, ThemeOptions};
use crate::utilities::{UtilityArgs, Utilities, default_utilities};
use crate::variants::{Variants, default_variants};
use tracing::{trace, warn};

const DEFAULT_THEME: &str = include_str!("default_theme.css");

/// A `@custom-variant` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomVariant {
    /// `@custom-variant name (selector-or-at-rule);`
    Selector { name: String, selector: String },
    /// `@custom-variant name { ... @slot; ... }`
    Template { name: String, nodes: Vec<Node> },
}

/// A `@utility` definition. Names ending in `-*` are functional and resolve
/// `--value(...)` / `--modifier(...)` in their declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomUtility {
    pub name: String,
    pub nodes: Vec<Node>,
}

/// The directives of a stylesheet that configure a design system.
#[derive(Debug, Default)]
pub struct Stylesheet {
    pub theme: Theme,
    pub custom_variants: Vec<CustomVariant>,
    pub custom_utilities: Vec<CustomUtility>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `css` on top of the built-in theme.
    pub fn with_default_theme(css: &str) -> Self {
        let mut stylesheet = Self::new();
        stylesheet.load(DEFAULT_THEME);
        stylesheet.load(css);
        stylesheet
    }

    /// Applies the top-level directives in `css`. Later declarations override
    /// earlier ones; anything else in the stylesheet is ignored.
    pub fn load(&mut self, css: &str) {
        let css = strip_comments(css);
        for item in parse_items(&css) {
            match item {
                Item::Block { prelude, body } => {
                    if let Some(flags) = directive(&prelude, "@theme") {
                        self.load_theme_block(flags, &body);
                    } else if let Some(name) = directive(&prelude, "@custom-variant") {
                        self.add_template_variant(name, &body);
                    } else if let Some(name) = directive(&prelude, "@utility") {
                        self.add_utility(name, &body);
                    } else {
                        trace!(prelude = prelude.as_str(), "ignoring top-level block");
                    }
                }
                Item::Statement(text) => {
                    if let Some(rest) = directive(&text, "@custom-variant") {
                        self.add_selector_variant(rest);
                    } else {
                        trace!(statement = text.as_str(), "ignoring top-level statement");
                    }
                }
                Item::Declaration { property, .. } => {
                    trace!(property = property.as_str(), "ignoring top-level declaration");
                }
            }
        }
    }

    fn load_theme_block(&mut self, flags: &str, body: &str) {
        let mut options = ThemeOptions::default();
        for flag in flags.split_whitespace() {
            match flag {
                "inline" => options.inline = true,
                "static" => options.always_emit = true,
                "reference" => options.reference = true,
                "default" => {}
                other => warn!(flag = other, "unknown @theme option"),
            }
        }

        for item in parse_items(body) {
            match item {
                Item::Declaration { property, value } if property.starts_with("--") => {
                    if value == "initial" {
                        if property == "--*" {
                            self.theme.clear();
                        } else if let Some(namespace) = property
                            .strip_prefix("--")
                            .and_then(|rest| rest.strip_suffix("-*"))
                        {
                            self.theme.clear_namespace(namespace);
                        } else {
                            self.theme.remove(&property);
                        }
                        continue;
                    }
                    self.theme.add(property, value, options);
                }
                Item::Block { prelude, body } => match directive(&prelude, "@keyframes") {
                    Some(name) if !name.is_empty() => {
                        let node = Node::rule(prelude.as_str(), parse_nodes(&body));
                        self.theme.add_keyframes(name, node);
                    }
                    _ => warn!(prelude = prelude.as_str(), "unsupported block inside @theme"),
                },
                Item::Declaration { property, .. } => {
                    warn!(property = property.as_str(), "@theme only accepts custom properties");
                }
                Item::Statement(text) => {
                    warn!(statement = text.as_str(), "unsupported statement inside @theme");
                }
            }
        }
    }

    fn add_selector_variant(&mut self, rest: &str) {
        let name_end = rest
            .find(|ch: char| ch.is_whitespace() || ch == '(')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let template = rest[name_end..].trim();
        let selector = template
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(template)
            .trim();
        if name.is_empty() || selector.is_empty() {
            warn!(definition = rest, "malformed @custom-variant");
            return;
        }
        self.custom_variants.push(CustomVariant::Selector {
            name: name.to_string(),
            selector: selector.to_string(),
        });
    }

    fn add_template_variant(&mut self, name: &str, body: &str) {
        let nodes = parse_nodes(body);
        if name.is_empty() || !contains_slot(&nodes) {
            warn!(name, "@custom-variant block without @slot");
            return;
        }
        self.custom_variants.push(CustomVariant::Template {
            name: name.to_string(),
            nodes,
        });
    }

    fn add_utility(&mut self, name: &str, body: &str) {
        let root = name.strip_suffix("-*").unwrap_or(name);
        let valid = !root.is_empty()
            && root
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            warn!(name, "invalid @utility name");
            return;
        }
        self.custom_utilities.push(CustomUtility {
            name: name.to_string(),
            nodes: parse_nodes(body),
        });
    }

    /// Seals the theme and the built-in registries extended with this
    /// stylesheet's definitions.
    pub fn into_design_system(self) -> DesignSystem {
        let mut utilities = default_utilities();
        for utility in self.custom_utilities {
            register_custom_utility(&mut utilities, utility);
        }
        let mut variants = default_variants(&self.theme);
        for variant in self.custom_variants {
            register_custom_variant(&mut variants, variant);
        }
        DesignSystem::new(self.theme, utilities, variants)
    }
}

/// Builds a design system from the default theme plus `css`.
pub fn load_design_system(css: &str) -> DesignSystem {
    Stylesheet::with_default_theme(css).into_design_system()
}

fn register_custom_variant(variants: &mut Variants, variant: CustomVariant) {
    match variant {
        CustomVariant::Selector { name, selector } => variants.selector_variant(&name, selector),
        CustomVariant::Template { name, nodes } => {
            variants.static_variant(&name, move |body| fill_slot(&nodes, &body));
        }
    }
}

fn register_custom_utility(utilities: &mut Utilities, utility: CustomUtility) {
    let CustomUtility { name, nodes } = utility;
    match name.strip_suffix("-*") {
        Some(root) => {
            utilities.functional(root, move |theme, args| expand_functional_utility(&nodes, theme, args));
        }
        None => utilities.static_utility(&name, move || nodes.clone()),
    }
}

fn contains_slot(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Rule { selector, children } => selector == "@slot" || contains_slot(children),
        Node::Declaration { .. } => false,
    })
}

fn fill_slot(template: &[Node], body: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(template.len());
    for node in template {
        match node {
            Node::Rule { selector, .. } if selector == "@slot" => out.extend(body.iter().cloned()),
            Node::Rule { selector, children } => {
                out.push(Node::rule(selector.as_str(), fill_slot(children, body)));
            }
            Node::Declaration { .. } => out.push(node.clone()),
        }
    }
    out
}

#[derive(Debug, Default)]
struct Expansion {
    uses_functions: bool,
    resolved: bool,
}

fn expand_functional_utility(template: &[Node], theme: &Theme, args: &UtilityArgs<'_>) -> Option<Vec<Node>> {
    let modifier = args.modifier.map(modifier_as_value);
    let mut expansion = Expansion::default();
    let nodes = expand_nodes(template, theme, args.value, modifier.as_ref(), &mut expansion);
    if (expansion.uses_functions && !expansion.resolved) || nodes.is_empty() {
        return None;
    }
    Some(nodes)
}

fn expand_nodes(
    template: &[Node],
    theme: &Theme,
    value: Option<&CandidateValue>,
    modifier: Option<&CandidateValue>,
    expansion: &mut Expansion,
) -> Vec<Node> {
    let mut out = Vec::new();
    for node in template {
        match node {
            Node::Declaration {
                property,
                value: template_value,
                important,
            } => {
                if !template_value.contains("--value(") && !template_value.contains("--modifier(") {
                    out.push(node.clone());
                    continue;
                }
                expansion.uses_functions = true;
                // A declaration whose functions do not resolve is dropped.
                let Some(resolved) = replace_named_function(template_value, "--value(", value, theme)
                    .and_then(|resolved| replace_named_function(&resolved, "--modifier(", modifier, theme))
                else {
                    continue;
                };
                expansion.resolved = true;
                out.push(Node::Declaration {
                    property: property.clone(),
                    value: resolved,
                    important: *important,
                });
            }
            Node::Rule { selector, children } => {
                let children = expand_nodes(children, theme, value, modifier, expansion);
                if !children.is_empty() {
                    out.push(Node::rule(selector.as_str(), children));
                }
            }
        }
    }
    out
}

fn modifier_as_value(modifier: &CandidateModifier) -> CandidateValue {
    match modifier {
        CandidateModifier::Named { value } => CandidateValue::named(value),
        CandidateModifier::Arbitrary { value } => CandidateValue::Arbitrary {
            value: value.clone(),
            data_type: None,
        },
    }
}

fn replace_named_function(
    input: &str,
    fn_prefix: &str,
    token: Option<&CandidateValue>,
    theme: &Theme,
) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0usize;
    while let Some(rel) = input[cursor..].find(fn_prefix) {
        let token = token?;
        let start = cursor + rel;
        out.push_str(&input[cursor..start]);
        let args_start = start + fn_prefix.len();
        let mut depth = 1usize;
        let mut idx = args_start;
        while idx < input.len() {
            let Some(ch) = input[idx..].chars().next() else {
                break;
            };
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            idx += ch.len_utf8();
        }
        if idx >= input.len() {
            return None;
        }
        let replacement = split_value_function_args(&input[args_start..idx])
            .iter()
            .find_map(|arg| resolve_value_function_arg(arg, token, theme))?;
        out.push_str(&replacement);
        cursor = idx + 1;
    }
    out.push_str(&input[cursor..]);
    Some(out)
}

fn split_value_function_args(raw: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (idx, ch) in raw.char_indices() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(raw[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    args.push(raw[start..].trim());
    args.retain(|arg| !arg.is_empty());
    args
}

/// Resolves one `--value(...)` alternative: a quoted literal, a theme
/// namespace (`--tab-size-*`), a bracketed type for arbitrary values
/// (`[integer]`, `[*]`) or a bare type for named values.
fn resolve_value_function_arg(arg: &str, token: &CandidateValue, theme: &Theme) -> Option<String> {
    if let Some(literal) = arg
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
    {
        return (token.as_named() == Some(literal)).then(|| literal.to_string());
    }

    if let Some(namespace) = arg.strip_suffix("-*").filter(|ns| ns.starts_with("--")) {
        return theme.resolve_value(token.as_named()?, &[namespace]);
    }

    if let Some(type_name) = arg.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let type_name = type_name.trim();
        return match token {
            CandidateValue::Arbitrary { value, data_type } => {
                let accepted = type_name == "*"
                    || data_type.as_deref() == Some(type_name)
                    || (data_type.is_none() && validate_value_for_type(value, type_name));
                accepted.then(|| value.clone())
            }
            CandidateValue::CssVariable { name } if type_name == "*" => Some(format!("var({})", name)),
            _ => None,
        };
    }

    let named = token.as_named()?;
    validate_value_for_type(named, arg).then(|| named.to_string())
}

fn validate_value_for_type(value: &str, type_name: &str) -> bool {
    match type_name {
        "integer" => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
        "number" => value.parse::<f64>().is_ok_and(f64::is_finite),
        "percentage" => value
            .strip_suffix('%')
            .is_some_and(|n| !n.is_empty() && n.parse::<f64>().is_ok()),
        "ratio" => value.split_once('/').is_some_and(|(numerator, denominator)| {
            validate_value_for_type(numerator.trim(), "integer")
                && validate_value_for_type(denominator.trim(), "integer")
        }),
        "*" => !value.is_empty(),
        _ => false,
    }
}

/// `@keyword rest` → `Some(rest)`; the keyword must be followed by whitespace
/// or the end of the prelude.
fn directive<'a>(prelude: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = prelude.strip_prefix(keyword)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Declaration { property: String, value: String },
    Statement(String),
    Block { prelude: String, body: String },
}

/// Parses a block body into nodes. `@slot;` becomes an empty `@slot` rule.
pub fn parse_nodes(css: &str) -> Vec<Node> {
    parse_items(css)
        .into_iter()
        .filter_map(|item| match item {
            Item::Declaration { property, value } => {
                let (value, important) = match value.strip_suffix("!important") {
                    Some(value) => (value.trim_end().to_string(), true),
                    None => (value, false),
                };
                Some(Node::Declaration {
                    property,
                    value,
                    important,
                })
            }
            Item::Statement(text) if text == "@slot" => Some(Node::rule("@slot", Vec::new())),
            Item::Statement(_) => None,
            Item::Block { prelude, body } => Some(Node::rule(prelude, parse_nodes(&body))),
        })
        .collect()
}

/// Splits CSS into top-level declarations, `;`-terminated at-rule statements
/// and `{}` blocks.
fn parse_items(css: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut start = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut idx = 0usize;

    while idx < css.len() {
        let Some(ch) = css[idx..].chars().next() else {
            break;
        };
        let size = ch.len_utf8();

        if escaped {
            escaped = false;
            idx += size;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            idx += size;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            idx += size;
            continue;
        }

        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '{' if paren_depth == 0 => {
                let Some(close_idx) = find_matching_brace(css, idx) else {
                    warn!("unterminated block in stylesheet");
                    return items;
                };
                items.push(Item::Block {
                    prelude: css[start..idx].split_whitespace().collect::<Vec<_>>().join(" "),
                    body: css[idx + 1..close_idx].to_string(),
                });
                idx = close_idx + 1;
                start = idx;
                continue;
            }
            ';' if paren_depth == 0 => {
                push_segment(&mut items, &css[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
        idx += size;
    }

    if start < css.len() {
        push_segment(&mut items, &css[start..]);
    }
    items
}

fn push_segment(items: &mut Vec<Item>, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if segment.starts_with('@') {
        items.push(Item::Statement(segment.to_string()));
        return;
    }
    if let Some((property, value)) = segment.split_once(':') {
        let property = property.trim();
        let value = value.trim();
        if !property.is_empty() && !value.is_empty() {
            items.push(Item::Declaration {
                property: property.to_string(),
                value: value.to_string(),
            });
        }
    }
}

fn find_matching_brace(css: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (rel_idx, ch) in css[open_idx..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_idx + rel_idx);
                }
            }
            _ => {}
        }
    }

    None
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for inner in chars.by_ref() {
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        }
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{CustomVariant, Stylesheet, load_design_system, parse_nodes, strip_comments};
    use crate::ast::Node;

    #[test]
    fn parses_theme_blocks_with_options() {
        let mut stylesheet = Stylesheet::new();
        stylesheet.load(
            "@theme { --color-brand: #ff0066; /* primary */ --spacing: 4px; }\n\
             @theme inline { --font-body: Inter, sans-serif; }\n\
             @theme static reference { --radius-pill: 9999px; }",
        );
        let theme = &stylesheet.theme;
        assert_eq!(theme.get("--color-brand").map(|e| e.value.as_str()), Some("#ff0066"));
        assert!(theme.get("--font-body").is_some_and(|e| e.options.inline));
        assert!(
            theme
                .get("--radius-pill")
                .is_some_and(|e| e.options.always_emit && e.options.reference)
        );
    }

    #[test]
    fn initial_resets_theme_and_namespaces() {
        let mut stylesheet = Stylesheet::new();
        stylesheet.load(
            "@theme { --color-red: red; --color-blue: blue; --spacing: 4px; --font-body: serif; }\n\
             @theme { --color-*: initial; --font-body: initial; --color-green: green; }",
        );
        let theme = &stylesheet.theme;
        assert!(!theme.contains("--color-red"));
        assert!(!theme.contains("--font-body"));
        assert!(theme.contains("--color-green"));
        assert!(theme.contains("--spacing"));

        stylesheet.load("@theme { --*: initial; --color-only: black; }");
        assert_eq!(stylesheet.theme.entries().len(), 1);
    }

    #[test]
    fn theme_keyframes_become_nodes() {
        let mut stylesheet = Stylesheet::new();
        stylesheet.load("@theme { --animate-spin: spin 1s linear infinite; @keyframes spin { to { transform: rotate(360deg); } } }");
        assert_eq!(
            stylesheet.theme.keyframes()[0].node,
            Node::rule(
                "@keyframes spin",
                vec![Node::rule("to", vec![Node::decl("transform", "rotate(360deg)")])]
            )
        );
    }

    #[test]
    fn custom_variants_in_both_forms() {
        let mut stylesheet = Stylesheet::new();
        stylesheet.load(
            "@custom-variant theme-midnight (&:where([data-theme=midnight] *));\n\
             @custom-variant pointer-fine { @media (pointer: fine) { &:hover { @slot; } } }\n\
             @custom-variant broken { &:hover { color: red; } }",
        );
        assert_eq!(stylesheet.custom_variants.len(), 2);
        assert_eq!(
            stylesheet.custom_variants[0],
            CustomVariant::Selector {
                name: "theme-midnight".to_string(),
                selector: "&:where([data-theme=midnight] *)".to_string(),
            }
        );

        let ds = stylesheet.into_design_system();
        assert_eq!(
            ds.candidates_to_css(&["theme-midnight:flex", "pointer-fine:flex"]),
            vec![
                Some(".theme-midnight\\:flex:where([data-theme=midnight] *) {\n  display: flex;\n}".to_string()),
                Some("@media (pointer: fine) {\n  .pointer-fine\\:flex:hover {\n    display: flex;\n  }\n}".to_string()),
            ]
        );
    }

    #[test]
    fn static_and_functional_custom_utilities() {
        let ds = load_design_system(
            "@theme { --tab-size-github: 8; }\n\
             @utility content-auto { content-visibility: auto; }\n\
             @utility tab-* { tab-size: --value(--tab-size-*, integer, [integer]); }",
        );
        assert_eq!(
            ds.candidates_to_css(&["content-auto", "tab-github", "tab-4", "tab-[12]", "tab-wide"]),
            vec![
                Some(".content-auto {\n  content-visibility: auto;\n}".to_string()),
                Some(".tab-github {\n  tab-size: var(--tab-size-github);\n}".to_string()),
                Some(".tab-4 {\n  tab-size: 4;\n}".to_string()),
                Some(".tab-\\[12\\] {\n  tab-size: 12;\n}".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn parses_nested_blocks_and_important() {
        assert_eq!(
            parse_nodes("color: red !important; &:hover { color: blue; } @slot;"),
            vec![
                Node::Declaration {
                    property: "color".to_string(),
                    value: "red".to_string(),
                    important: true,
                },
                Node::rule("&:hover", vec![Node::decl("color", "blue")]),
                Node::rule("@slot", vec![]),
            ]
        );
    }

    #[test]
    fn comments_are_stripped_outside_strings() {
        assert_eq!(strip_comments("a /* x */ b '/* kept */'"), "a  b '/* kept */'");
    }
}
