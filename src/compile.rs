use crate::ast::{Node, mark_important};
use crate::candidate::{Candidate, CandidateModifier};
use crate::theme::{Theme, with_alpha};
use crate::utilities::{UtilityArgs, Utilities};
use crate::variants::Variants;

/// How `!` markers on a candidate are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompileFlags {
    /// Ignore `!`, as `@apply` does.
    None,
    #[default]
    RespectImportant,
}

/// Compiles one candidate interpretation into nodes nested under `&`.
///
/// Returns `None` when the utility produces nothing or a variant cannot apply.
pub fn compile_candidate(
    candidate: &Candidate,
    flags: CompileFlags,
    theme: &Theme,
    utilities: &Utilities,
    variants: &Variants,
) -> Option<Vec<Node>> {
    let mut nodes = match candidate {
        Candidate::Static { root, .. } => utilities.compile_static(root)?,
        Candidate::Functional {
            root,
            value,
            modifier,
            ..
        } => {
            let args = UtilityArgs {
                value: value.as_ref(),
                modifier: modifier.as_ref(),
            };
            utilities.compile_functional(root, theme, &args)?
        }
        Candidate::ArbitraryProperty {
            property,
            value,
            modifier,
            ..
        } => {
            let value = match modifier {
                Some(CandidateModifier::Named { value: alpha })
                    if alpha.chars().all(|ch| ch.is_ascii_digit()) =>
                {
                    with_alpha(value, &format!("{}%", alpha))
                }
                Some(modifier) => with_alpha(value, modifier.value()),
                None => value.clone(),
            };
            vec![Node::decl(property.as_str(), value)]
        }
    };

    if nodes.is_empty() {
        return None;
    }
    if flags == CompileFlags::RespectImportant && candidate.important() {
        mark_important(&mut nodes);
    }

    // Innermost variant first, so the leftmost prefix ends up outermost.
    for variant in candidate.variants().iter().rev() {
        nodes = variants.apply(variant, nodes)?;
    }
    Some(nodes)
}

/// Wraps compiled nodes in the class selector for `raw`.
pub fn wrap_in_class(raw: &str, nodes: Vec<Node>) -> Node {
    Node::rule(format!(".{}", escape_selector(raw)), nodes)
}

/// Escapes a class name for use in a selector.
pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for (idx, ch) in class.chars().enumerate() {
        match ch {
            '0'..='9' if idx == 0 => {
                escaped.push_str(&format!("\\{:x} ", ch as u32));
            }
            '-' | '_' => escaped.push(ch),
            ' ' => escaped.push_str("\\ "),
            _ if ch.is_ascii_punctuation() => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::{CompileFlags, compile_candidate, escape_selector, wrap_in_class};
    use crate::ast::Node;
    use crate::candidate::parse_candidate;
    use crate::theme::{Theme, ThemeOptions};
    use crate::utilities::default_utilities;
    use crate::variants::default_variants;

    fn compile(raw: &str, flags: CompileFlags) -> Option<Vec<Node>> {
        let mut theme = Theme::new();
        theme.add("--spacing", "0.25rem", ThemeOptions::default());
        theme.add("--breakpoint-md", "48rem", ThemeOptions::default());
        let utilities = default_utilities();
        let variants = default_variants(&theme);
        let candidates = parse_candidate(raw, &utilities, &mut |segment| variants.parse(segment));
        candidates
            .iter()
            .find_map(|candidate| compile_candidate(candidate, flags, &theme, &utilities, &variants))
    }

    #[test]
    fn escapes_class_names() {
        assert_eq!(escape_selector("hover:bg-[#fff]"), "hover\\:bg-\\[\\#fff\\]");
        assert_eq!(escape_selector("w-1/2"), "w-1\\/2");
        assert_eq!(escape_selector("2xl:p-4"), "\\32 xl\\:p-4");
        assert_eq!(escape_selector("p-2.5"), "p-2\\.5");
    }

    #[test]
    fn nests_variants_leftmost_outermost() {
        assert_eq!(
            compile("md:hover:p-4", CompileFlags::RespectImportant),
            Some(vec![Node::rule(
                "@media (width >= 48rem)",
                vec![Node::rule(
                    "&:hover",
                    vec![Node::decl("padding", "calc(var(--spacing) * 4)")]
                )]
            )])
        );
    }

    #[test]
    fn important_depends_on_flags() {
        let important = compile("flex!", CompileFlags::RespectImportant);
        assert_eq!(
            important,
            Some(vec![Node::Declaration {
                property: "display".to_string(),
                value: "flex".to_string(),
                important: true,
            }])
        );
        assert_eq!(compile("flex!", CompileFlags::None), Some(vec![Node::decl("display", "flex")]));
    }

    #[test]
    fn arbitrary_properties_take_alpha_modifiers() {
        assert_eq!(
            compile("[color:red]/50", CompileFlags::RespectImportant),
            Some(vec![Node::decl("color", "color-mix(in oklab, red 50%, transparent)")])
        );
    }

    #[test]
    fn unresolvable_values_compile_to_nothing() {
        assert_eq!(compile("bg-nope-500", CompileFlags::RespectImportant), None);
    }

    #[test]
    fn wraps_in_escaped_class() {
        assert_eq!(
            wrap_in_class("p-1/2", vec![]),
            Node::rule(".p-1\\/2", vec![])
        );
    }
}
