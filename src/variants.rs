use crate::ast::Node;
use crate::candidate::{decode_arbitrary_value, decode_selector_value, split_top_level};
use crate::css::resolve_selector;
use crate::theme::Theme;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantValue {
    Named(String),
    Arbitrary(String),
}

/// A parsed variant prefix such as `hover`, `md`, `data-[state=open]` or
/// `group-hover/item`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    Arbitrary {
        selector: String,
    },
    Static {
        root: String,
    },
    Functional {
        root: String,
        value: Option<VariantValue>,
        modifier: Option<String>,
    },
    Compound {
        root: String,
        modifier: Option<String>,
        variant: Box<Variant>,
    },
}

impl Variant {
    pub fn root(&self) -> Option<&str> {
        match self {
            Variant::Arbitrary { .. } => None,
            Variant::Static { root }
            | Variant::Functional { root, .. }
            | Variant::Compound { root, .. } => Some(root),
        }
    }
}

type StaticVariant = Box<dyn Fn(Vec<Node>) -> Vec<Node>>;
type FunctionalVariant = Box<dyn Fn(Option<&VariantValue>, Option<&str>, Vec<Node>) -> Option<Vec<Node>>>;
type CompoundVariant = Box<dyn Fn(&str, Option<&str>) -> Option<String>>;

/// Registry of variants keyed by root, in registration (sort) order.
#[derive(Default)]
pub struct Variants {
    statics: HashMap<String, (usize, StaticVariant)>,
    functionals: HashMap<String, (usize, FunctionalVariant)>,
    compounds: HashMap<String, (usize, CompoundVariant)>,
    next_order: usize,
}

impl fmt::Debug for Variants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut roots = self
            .statics
            .keys()
            .chain(self.functionals.keys())
            .chain(self.compounds.keys())
            .collect::<Vec<_>>();
        roots.sort();
        f.debug_struct("Variants").field("roots", &roots).finish()
    }
}

impl Variants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn static_variant(&mut self, root: &str, apply: impl Fn(Vec<Node>) -> Vec<Node> + 'static) {
        let order = self.bump_order();
        self.statics.insert(root.to_string(), (order, Box::new(apply)));
    }

    /// Shorthand for a static variant that nests its input under `selector`,
    /// which is either a selector using `&` or an at-rule prelude.
    pub fn selector_variant(&mut self, root: &str, selector: impl Into<String>) {
        let selector = selector.into();
        self.static_variant(root, move |nodes| vec![Node::rule(selector.clone(), nodes)]);
    }

    pub fn functional(
        &mut self,
        root: &str,
        apply: impl Fn(Option<&VariantValue>, Option<&str>, Vec<Node>) -> Option<Vec<Node>> + 'static,
    ) {
        let order = self.bump_order();
        self.functionals
            .insert(root.to_string(), (order, Box::new(apply)));
    }

    /// A compound variant receives the selector of the variant it wraps (for
    /// `group-hover`, `&:hover`) and returns its own.
    pub fn compound(&mut self, root: &str, apply: impl Fn(&str, Option<&str>) -> Option<String> + 'static) {
        let order = self.bump_order();
        self.compounds
            .insert(root.to_string(), (order, Box::new(apply)));
    }

    fn bump_order(&mut self) -> usize {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    pub fn has(&self, root: &str) -> bool {
        self.statics.contains_key(root)
            || self.functionals.contains_key(root)
            || self.compounds.contains_key(root)
    }

    /// Sort position of a parsed variant. Arbitrary variants sort last.
    pub fn order(&self, variant: &Variant) -> usize {
        let found = match variant {
            Variant::Arbitrary { .. } => None,
            Variant::Static { root } => self.statics.get(root).map(|(order, _)| *order),
            Variant::Functional { root, .. } => self.functionals.get(root).map(|(order, _)| *order),
            Variant::Compound { root, .. } => self.compounds.get(root).map(|(order, _)| *order),
        };
        found.unwrap_or(self.next_order)
    }

    /// Parses a single variant segment (no `:`). Returns `None` for unknown
    /// roots or malformed values.
    pub fn parse(&self, raw: &str) -> Option<Variant> {
        if raw.is_empty() {
            return None;
        }

        if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let selector = decode_selector_value(inner);
            let selector = selector.trim();
            if selector.is_empty() || !(selector.contains('&') || selector.starts_with('@')) {
                return None;
            }
            return Some(Variant::Arbitrary {
                selector: selector.to_string(),
            });
        }

        if self.statics.contains_key(raw) {
            return Some(Variant::Static {
                root: raw.to_string(),
            });
        }

        let (base, modifier) = match split_top_level(raw, '/').as_slice() {
            [base] => (*base, None),
            [base, modifier] if !modifier.is_empty() => (*base, Some(modifier.to_string())),
            _ => return None,
        };

        if self.functionals.contains_key(base) {
            return Some(Variant::Functional {
                root: base.to_string(),
                value: None,
                modifier,
            });
        }

        for (idx, _) in base.match_indices('-').collect::<Vec<_>>().into_iter().rev() {
            if idx == 0 || idx + 1 >= base.len() {
                continue;
            }
            let root = &base[..idx];
            let rest = &base[idx + 1..];

            if self.functionals.contains_key(root) {
                let value = parse_variant_value(rest)?;
                return Some(Variant::Functional {
                    root: root.to_string(),
                    value: Some(value),
                    modifier,
                });
            }

            if self.compounds.contains_key(root) {
                let inner = match compound_selector(rest) {
                    Some(selector) => Variant::Arbitrary { selector },
                    None => self.parse(rest)?,
                };
                return Some(Variant::Compound {
                    root: root.to_string(),
                    modifier,
                    variant: Box::new(inner),
                });
            }
        }

        None
    }

    /// Wraps `nodes` in the given variant. `None` when the variant cannot
    /// apply (an unknown breakpoint, a compound around an at-rule variant).
    pub fn apply(&self, variant: &Variant, nodes: Vec<Node>) -> Option<Vec<Node>> {
        match variant {
            Variant::Arbitrary { selector } => Some(vec![Node::rule(selector.as_str(), nodes)]),
            Variant::Static { root } => {
                let (_, apply) = self.statics.get(root)?;
                Some(apply(nodes))
            }
            Variant::Functional {
                root,
                value,
                modifier,
            } => {
                let (_, apply) = self.functionals.get(root)?;
                apply(value.as_ref(), modifier.as_deref(), nodes)
            }
            Variant::Compound {
                root,
                modifier,
                variant,
            } => {
                let (_, apply) = self.compounds.get(root)?;
                let inner = self.selector_of(variant)?;
                let selector = apply(&inner, modifier.as_deref())?;
                Some(vec![Node::rule(selector, nodes)])
            }
        }
    }

    /// The style selector a variant nests under, found by applying it to an
    /// empty body. Variants that emit at-rules or declarations have none.
    fn selector_of(&self, variant: &Variant) -> Option<String> {
        match self.apply(variant, Vec::new())?.as_slice() {
            [Node::Rule { selector, children }]
                if children.is_empty() && !selector.starts_with('@') && selector.contains('&') =>
            {
                Some(selector.clone())
            }
            _ => None,
        }
    }
}

/// A bracketed selector wrapped by a compound, such as `has-[>img]`. It is
/// relative to the element, so a missing `&` is prepended.
fn compound_selector(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let selector = decode_selector_value(inner);
    let selector = selector.trim();
    if selector.is_empty() || selector.starts_with('@') {
        return None;
    }
    if selector.contains('&') {
        Some(selector.to_string())
    } else {
        Some(format!("&{}", selector))
    }
}

fn parse_variant_value(raw: &str) -> Option<VariantValue> {
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        if inner.is_empty() {
            return None;
        }
        return Some(VariantValue::Arbitrary(decode_arbitrary_value(inner)));
    }
    if raw.contains(['[', ']', '(', ')']) {
        return None;
    }
    Some(VariantValue::Named(raw.to_string()))
}

/// The built-in variant set. Breakpoints come from `--breakpoint-*` in
/// `theme`, ordered by length.
pub fn default_variants(theme: &Theme) -> Variants {
    let mut variants = Variants::new();

    variants.selector_variant("*", ":is(& > *)");
    variants.selector_variant("**", ":is(& *)");

    variants.compound("not", |selector, _| {
        let inner = match selector.strip_prefix('&') {
            Some(rest) if !rest.is_empty() && !rest.contains('&') => rest.to_string(),
            _ => resolve_selector("*", selector),
        };
        Some(format!("&:not({})", inner))
    });
    variants.compound("group", |selector, modifier| {
        let group = match modifier {
            Some(name) => format!(":where(.group\\/{})", name),
            None => ":where(.group)".to_string(),
        };
        Some(format!("&:is({} *)", resolve_selector(&group, selector)))
    });
    variants.compound("peer", |selector, modifier| {
        let peer = match modifier {
            Some(name) => format!(":where(.peer\\/{})", name),
            None => ":where(.peer)".to_string(),
        };
        Some(format!("&:is({} ~ *)", resolve_selector(&peer, selector)))
    });
    variants.compound("has", |selector, _| {
        Some(format!("&:has({})", resolve_selector("*", selector)))
    });

    for (root, pseudo) in [
        ("first-letter", "&::first-letter"),
        ("first-line", "&::first-line"),
        ("marker", "& *::marker, &::marker"),
        ("selection", "& *::selection, &::selection"),
        ("file", "&::file-selector-button"),
        ("placeholder", "&::placeholder"),
        ("backdrop", "&::backdrop"),
    ] {
        variants.selector_variant(root, pseudo);
    }
    for (root, pseudo) in [("before", "&::before"), ("after", "&::after")] {
        variants.static_variant(root, move |mut nodes| {
            nodes.insert(0, Node::decl("content", "var(--tw-content)"));
            vec![Node::rule(pseudo, nodes)]
        });
    }

    for (root, pseudo) in [
        ("first", "&:first-child"),
        ("last", "&:last-child"),
        ("only", "&:only-child"),
        ("odd", "&:nth-child(odd)"),
        ("even", "&:nth-child(even)"),
        ("first-of-type", "&:first-of-type"),
        ("last-of-type", "&:last-of-type"),
        ("only-of-type", "&:only-of-type"),
        ("visited", "&:visited"),
        ("target", "&:target"),
        ("open", "&:is([open], :popover-open, :open)"),
        ("default", "&:default"),
        ("checked", "&:checked"),
        ("indeterminate", "&:indeterminate"),
        ("placeholder-shown", "&:placeholder-shown"),
        ("autofill", "&:autofill"),
        ("optional", "&:optional"),
        ("required", "&:required"),
        ("valid", "&:valid"),
        ("invalid", "&:invalid"),
        ("in-range", "&:in-range"),
        ("out-of-range", "&:out-of-range"),
        ("read-only", "&:read-only"),
        ("empty", "&:empty"),
        ("focus-within", "&:focus-within"),
        ("hover", "&:hover"),
        ("focus", "&:focus"),
        ("focus-visible", "&:focus-visible"),
        ("active", "&:active"),
        ("enabled", "&:enabled"),
        ("disabled", "&:disabled"),
        ("inert", "&:is([inert], [inert] *)"),
    ] {
        variants.selector_variant(root, pseudo);
    }

    variants.functional("nth", |value, _, nodes| {
        let value = match value? {
            VariantValue::Named(value) if value.chars().all(|ch| ch.is_ascii_digit()) => value.clone(),
            VariantValue::Named(_) => return None,
            VariantValue::Arbitrary(value) => value.clone(),
        };
        Some(vec![Node::rule(format!("&:nth-child({})", value), nodes)])
    });
    variants.functional("data", |value, _, nodes| {
        let attribute = match value? {
            VariantValue::Named(name) => format!("data-{}", name),
            VariantValue::Arbitrary(expression) => format!("data-{}", expression),
        };
        Some(vec![Node::rule(format!("&[{}]", attribute), nodes)])
    });
    variants.functional("aria", |value, _, nodes| {
        let attribute = match value? {
            VariantValue::Named(name) => format!("aria-{}=\"true\"", name),
            VariantValue::Arbitrary(expression) => format!("aria-{}", expression),
        };
        Some(vec![Node::rule(format!("&[{}]", attribute), nodes)])
    });
    variants.functional("supports", |value, _, nodes| {
        let condition = match value? {
            VariantValue::Named(property) => format!("({}: var(--tw))", property),
            VariantValue::Arbitrary(condition) if condition.contains(':') && !condition.starts_with('(') => {
                format!("({})", condition)
            }
            VariantValue::Arbitrary(condition) => condition.clone(),
        };
        Some(vec![Node::rule(format!("@supports {}", condition), nodes)])
    });

    variants.selector_variant("motion-safe", "@media (prefers-reduced-motion: no-preference)");
    variants.selector_variant("motion-reduce", "@media (prefers-reduced-motion: reduce)");
    variants.selector_variant("contrast-more", "@media (prefers-contrast: more)");
    variants.selector_variant("contrast-less", "@media (prefers-contrast: less)");

    let breakpoints = sorted_breakpoints(theme);
    {
        let breakpoints = breakpoints.clone();
        variants.functional("max", move |value, _, nodes| {
            let width = breakpoint_width(&breakpoints, value?)?;
            Some(vec![Node::rule(format!("@media (width < {})", width), nodes)])
        });
    }
    for (name, width) in &breakpoints {
        variants.selector_variant(name, format!("@media (width >= {})", width));
    }
    {
        let breakpoints = breakpoints.clone();
        variants.functional("min", move |value, _, nodes| {
            let width = breakpoint_width(&breakpoints, value?)?;
            Some(vec![Node::rule(format!("@media (width >= {})", width), nodes)])
        });
    }

    variants.selector_variant("portrait", "@media (orientation: portrait)");
    variants.selector_variant("landscape", "@media (orientation: landscape)");
    variants.selector_variant("ltr", "&:where(:dir(ltr), [dir=\"ltr\"], [dir=\"ltr\"] *)");
    variants.selector_variant("rtl", "&:where(:dir(rtl), [dir=\"rtl\"], [dir=\"rtl\"] *)");
    variants.selector_variant("dark", "@media (prefers-color-scheme: dark)");
    variants.selector_variant("starting", "@starting-style");
    variants.selector_variant("print", "@media print");

    variants
}

fn breakpoint_width(breakpoints: &[(String, String)], value: &VariantValue) -> Option<String> {
    match value {
        VariantValue::Named(name) => breakpoints
            .iter()
            .find(|(breakpoint, _)| breakpoint == name)
            .map(|(_, width)| width.clone()),
        VariantValue::Arbitrary(width) => Some(width.clone()),
    }
}

fn sorted_breakpoints(theme: &Theme) -> Vec<(String, String)> {
    let mut breakpoints = theme.namespace("breakpoint");
    sort_breakpoints_by_length(&mut breakpoints);
    breakpoints
}

fn sort_breakpoints_by_length(breakpoints: &mut [(String, String)]) {
    breakpoints.sort_by(|(left_name, left_value), (right_name, right_value)| {
        match (parse_length_value(left_value), parse_length_value(right_value)) {
            (Some((left_number, left_unit)), Some((right_number, right_unit)))
                if left_unit == right_unit =>
            {
                left_number
                    .partial_cmp(&right_number)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| left_name.cmp(right_name))
            }
            _ => left_name.cmp(right_name),
        }
    });
}

fn parse_length_value(raw: &str) -> Option<(f64, String)> {
    let raw = raw.trim();
    let split_idx = raw
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.'))
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    if split_idx == 0 {
        return None;
    }
    let number = raw[..split_idx].parse::<f64>().ok()?;
    Some((number, raw[split_idx..].to_string()))
}
