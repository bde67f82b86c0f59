use crate::ast::Node;

/// Renders nodes as indented CSS; top-level blocks are separated by a blank line.
pub fn to_css(nodes: &[Node]) -> String {
    CssFormatter::new().print(nodes)
}

pub fn to_css_minified(nodes: &[Node]) -> String {
    CssFormatter::new().minify(true).print(nodes)
}

/// A pre-grouped style rule: declarations plus nested rules whose selectors
/// are relative to this one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
    pub rules: Vec<StyleRule>,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn declaration(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.push((property.into(), value.into()));
        self
    }

    pub fn nested(mut self, rule: StyleRule) -> Self {
        self.rules.push(rule);
        self
    }

    fn into_node(self) -> Node {
        let mut children = self
            .declarations
            .into_iter()
            .map(|(property, value)| Node::decl(property, value))
            .collect::<Vec<_>>();
        children.extend(self.rules.into_iter().map(StyleRule::into_node));
        Node::rule(self.selector, children)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CssFormatter {
    minify: bool,
    important: bool,
}

impl CssFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Forces `!important` on every printed declaration.
    pub fn important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    pub fn format(&self, rules: &[StyleRule]) -> String {
        let nodes = rules
            .iter()
            .cloned()
            .map(StyleRule::into_node)
            .collect::<Vec<_>>();
        self.print(&nodes)
    }

    pub fn print(&self, nodes: &[Node]) -> String {
        let mut blocks = Vec::new();
        flatten(None, nodes, self.important, &mut blocks);
        let rendered = blocks
            .iter()
            .map(|block| self.render(block, 0))
            .collect::<Vec<_>>();
        if self.minify {
            rendered.join("")
        } else {
            rendered.join("\n\n")
        }
    }

    fn render(&self, block: &Block<'_>, depth: usize) -> String {
        let indent = if self.minify {
            String::new()
        } else {
            "  ".repeat(depth)
        };
        match block {
            Block::Declarations(declarations) => self.render_declarations(declarations, depth),
            Block::Style {
                selector,
                declarations,
            } => {
                if self.minify {
                    format!("{}{{{}}}", selector, self.render_declarations(declarations, 0))
                } else {
                    format!(
                        "{}{} {{\n{}\n{}}}",
                        indent,
                        selector,
                        self.render_declarations(declarations, depth + 1),
                        indent
                    )
                }
            }
            Block::At {
                prelude,
                declarations,
                blocks,
            } => {
                let mut inner = Vec::new();
                if !declarations.is_empty() {
                    inner.push(self.render_declarations(declarations, depth + 1));
                }
                inner.extend(blocks.iter().map(|block| self.render(block, depth + 1)));
                if self.minify {
                    format!("{}{{{}}}", prelude, inner.join(""))
                } else {
                    format!("{}{} {{\n{}\n{}}}", indent, prelude, inner.join("\n"), indent)
                }
            }
        }
    }

    fn render_declarations(&self, declarations: &[Declaration<'_>], depth: usize) -> String {
        if self.minify {
            return declarations
                .iter()
                .map(|decl| {
                    let suffix = if decl.important { "!important" } else { "" };
                    format!("{}:{}{}", decl.property, decl.value, suffix)
                })
                .collect::<Vec<_>>()
                .join(";");
        }

        let indent = "  ".repeat(depth);
        declarations
            .iter()
            .map(|decl| {
                let suffix = if decl.important { " !important" } else { "" };
                format!("{}{}: {}{};", indent, decl.property, decl.value, suffix)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration<'a> {
    property: &'a str,
    value: &'a str,
    important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block<'a> {
    Declarations(Vec<Declaration<'a>>),
    Style {
        selector: String,
        declarations: Vec<Declaration<'a>>,
    },
    At {
        prelude: &'a str,
        declarations: Vec<Declaration<'a>>,
        blocks: Vec<Block<'a>>,
    },
}

/// Flattens `children` of the rule selected by `parent` into printable blocks.
/// Own declarations come first, then nested rules in source order.
fn flatten<'a>(parent: Option<&str>, children: &'a [Node], important: bool, out: &mut Vec<Block<'a>>) {
    let declarations = collect_declarations(children, important);
    if !declarations.is_empty() {
        match parent {
            Some(selector) => out.push(Block::Style {
                selector: selector.to_string(),
                declarations,
            }),
            None => out.push(Block::Declarations(declarations)),
        }
    }

    for node in children {
        let Node::Rule {
            selector,
            children: nested,
        } = node
        else {
            continue;
        };

        if selector.starts_with('@') {
            if parent.is_some() && is_conditional_at_rule(selector) {
                let mut inner = Vec::new();
                flatten(parent, nested, important, &mut inner);
                if !inner.is_empty() {
                    out.push(Block::At {
                        prelude: selector.as_str(),
                        declarations: Vec::new(),
                        blocks: inner,
                    });
                }
                continue;
            }

            let own = collect_declarations(nested, important);
            // At the top level, or for non-conditional at-rules, nested
            // selectors start a fresh scope.
            let mut inner = Vec::new();
            for child in nested {
                if matches!(child, Node::Rule { .. }) {
                    flatten(None, std::slice::from_ref(child), important, &mut inner);
                }
            }
            if own.is_empty() && inner.is_empty() {
                continue;
            }
            out.push(Block::At {
                prelude: selector.as_str(),
                declarations: own,
                blocks: inner,
            });
            continue;
        }

        let resolved = match parent {
            Some(parent) => resolve_selector(parent, selector),
            None => selector.clone(),
        };
        flatten(Some(&resolved), nested, important, out);
    }
}

fn collect_declarations(children: &[Node], important: bool) -> Vec<Declaration<'_>> {
    children
        .iter()
        .filter_map(|node| match node {
            Node::Declaration {
                property,
                value,
                important: node_important,
            } => Some(Declaration {
                property,
                value,
                important: *node_important || important,
            }),
            Node::Rule { .. } => None,
        })
        .collect()
}

fn is_conditional_at_rule(selector: &str) -> bool {
    let name = selector
        .split(|ch: char| ch.is_whitespace() || ch == '(')
        .next()
        .unwrap_or_default();
    matches!(
        name,
        "@media" | "@supports" | "@container" | "@layer" | "@starting-style" | "@scope"
    )
}

/// Resolves a nested selector against its parent. Each unescaped `&` is
/// replaced by the parent; a selector without `&` becomes a descendant of it.
/// Both sides may be selector lists.
pub fn resolve_selector(parent: &str, child: &str) -> String {
    let parents = split_selector_list(parent);
    let children = split_selector_list(child);
    let mut resolved = Vec::with_capacity(parents.len() * children.len());

    for child in &children {
        for parent in &parents {
            resolved.push(substitute_parent(child, parent));
        }
    }

    resolved.join(", ")
}

fn substitute_parent(child: &str, parent: &str) -> String {
    let mut out = String::with_capacity(child.len() + parent.len());
    let mut chars = child.chars();
    let mut replaced = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                out.push(ch);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '&' => {
                out.push_str(parent);
                replaced = true;
            }
            _ => out.push(ch),
        }
    }

    if replaced {
        out
    } else {
        format!("{} {}", parent, child)
    }
}

/// Splits a selector list on top-level commas, leaving commas inside
/// `:is(...)`, `:where(...)`, attribute selectors and strings alone.
pub fn split_selector_list(selector: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0usize;

    for (idx, ch) in selector.char_indices() {
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
            '"' | '\'' => quote = Some(ch),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            ',' if paren_depth == 0 && bracket_depth == 0 => {
                let part = selector[start..idx].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }

    let last = selector[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::{CssFormatter, StyleRule, resolve_selector, split_selector_list, to_css, to_css_minified};
    use crate::ast::Node;

    #[test]
    fn prints_single_rule() {
        let nodes = vec![Node::rule(".flex", vec![Node::decl("display", "flex")])];
        assert_eq!(to_css(&nodes), ".flex {\n  display: flex;\n}");
    }

    #[test]
    fn nested_selector_list_gets_parent_on_every_member() {
        let rule = StyleRule::new(".parent")
            .nested(StyleRule::new("h1, h2, h3").declaration("color", "red"));
        assert_eq!(
            CssFormatter::new().format(&[rule]),
            ".parent h1, .parent h2, .parent h3 {\n  color: red;\n}"
        );
    }

    #[test]
    fn pseudo_class_arguments_are_not_split() {
        let rule = StyleRule::new(".p").nested(StyleRule::new(":where(a, b)").declaration("color", "red"));
        assert_eq!(
            CssFormatter::new().format(&[rule]),
            ".p :where(a, b) {\n  color: red;\n}"
        );
        assert_eq!(
            split_selector_list(":not(.a, .b), [data-x=\"a,b\"], .c"),
            vec![":not(.a, .b)", "[data-x=\"a,b\"]", ".c"]
        );
    }

    #[test]
    fn ampersand_is_replaced_with_parent() {
        assert_eq!(resolve_selector(".btn", "&:hover"), ".btn:hover");
        assert_eq!(
            resolve_selector(".btn", "&:is(:where(.group):hover *)"),
            ".btn:is(:where(.group):hover *)"
        );
        assert_eq!(
            resolve_selector(".a, .b", "&:hover, & > p"),
            ".a:hover, .b:hover, .a > p, .b > p"
        );
        assert_eq!(resolve_selector(".x", ".y\\&z"), ".x .y\\&z");
    }

    #[test]
    fn own_declarations_print_before_nested_rules() {
        let nodes = vec![Node::rule(
            ".card",
            vec![
                Node::rule("&:hover", vec![Node::decl("color", "blue")]),
                Node::decl("color", "red"),
            ],
        )];
        assert_eq!(
            to_css(&nodes),
            ".card {\n  color: red;\n}\n\n.card:hover {\n  color: blue;\n}"
        );
    }

    #[test]
    fn conditional_at_rules_hoist_around_parent() {
        let nodes = vec![Node::rule(
            ".md\\:p-4",
            vec![Node::rule(
                "@media (width >= 48rem)",
                vec![Node::rule("&:hover", vec![Node::decl("padding", "1rem")])],
            )],
        )];
        assert_eq!(
            to_css(&nodes),
            "@media (width >= 48rem) {\n  .md\\:p-4:hover {\n    padding: 1rem;\n  }\n}"
        );
    }

    #[test]
    fn keyframes_reset_selector_scope() {
        let nodes = vec![Node::rule(
            "@keyframes spin",
            vec![Node::rule("to", vec![Node::decl("transform", "rotate(360deg)")])],
        )];
        assert_eq!(
            to_css(&nodes),
            "@keyframes spin {\n  to {\n    transform: rotate(360deg);\n  }\n}"
        );
    }

    #[test]
    fn empty_rules_are_omitted() {
        let nodes = vec![
            Node::rule(".a", vec![Node::rule("&:hover", vec![])]),
            Node::rule(".b", vec![Node::decl("color", "red")]),
            Node::rule(".c", vec![Node::rule("@media print", vec![])]),
        ];
        assert_eq!(to_css(&nodes), ".b {\n  color: red;\n}");
    }

    #[test]
    fn important_from_node_or_formatter() {
        let nodes = vec![Node::rule(
            ".x",
            vec![
                Node::Declaration {
                    property: "color".to_string(),
                    value: "red".to_string(),
                    important: true,
                },
                Node::decl("margin", "0"),
            ],
        )];
        assert_eq!(
            to_css(&nodes),
            ".x {\n  color: red !important;\n  margin: 0;\n}"
        );
        assert_eq!(
            CssFormatter::new().important(true).print(&nodes),
            ".x {\n  color: red !important;\n  margin: 0 !important;\n}"
        );
    }

    #[test]
    fn minified_output_has_no_whitespace_between_blocks() {
        let nodes = vec![
            Node::rule(".a", vec![Node::decl("color", "red"), Node::decl("margin", "0")]),
            Node::rule(
                ".b",
                vec![Node::rule("@media print", vec![Node::decl("display", "none")])],
            ),
        ];
        assert_eq!(
            to_css_minified(&nodes),
            ".a{color:red;margin:0}@media print{.b{display:none}}"
        );
    }
}
