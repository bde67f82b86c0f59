use crate::utilities::Utilities;
use crate::variants::Variant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateValue {
    /// Bare token such as `4` or `red-500`; `fraction` is set for `1/2`.
    Named {
        value: String,
        fraction: Option<String>,
    },
    /// Bracketed literal with underscores decoded to spaces.
    Arbitrary {
        value: String,
        data_type: Option<String>,
    },
    /// `(--name)`, compiled to `var(--name)`.
    CssVariable { name: String },
}

impl CandidateValue {
    pub fn named(value: &str) -> Self {
        CandidateValue::Named {
            value: value.to_string(),
            fraction: value.contains('/').then(|| value.to_string()),
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            CandidateValue::Named { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn fraction(&self) -> Option<&str> {
        match self {
            CandidateValue::Named { fraction, .. } => fraction.as_deref(),
            _ => None,
        }
    }

    /// The CSS text for arbitrary and variable values.
    pub fn literal(&self) -> Option<String> {
        match self {
            CandidateValue::Named { .. } => None,
            CandidateValue::Arbitrary { value, .. } => Some(value.clone()),
            CandidateValue::CssVariable { name } => Some(format!("var({})", name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateModifier {
    Named { value: String },
    Arbitrary { value: String },
}

impl CandidateModifier {
    pub fn value(&self) -> &str {
        match self {
            CandidateModifier::Named { value } | CandidateModifier::Arbitrary { value } => value,
        }
    }
}

/// A parsed class name. Variants are stored outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Candidate {
    Static {
        root: String,
        variants: Vec<Variant>,
        important: bool,
        raw: String,
    },
    Functional {
        root: String,
        value: Option<CandidateValue>,
        modifier: Option<CandidateModifier>,
        variants: Vec<Variant>,
        important: bool,
        raw: String,
    },
    ArbitraryProperty {
        property: String,
        value: String,
        modifier: Option<CandidateModifier>,
        variants: Vec<Variant>,
        important: bool,
        raw: String,
    },
}

impl Candidate {
    pub fn raw(&self) -> &str {
        match self {
            Candidate::Static { raw, .. }
            | Candidate::Functional { raw, .. }
            | Candidate::ArbitraryProperty { raw, .. } => raw,
        }
    }

    pub fn important(&self) -> bool {
        match self {
            Candidate::Static { important, .. }
            | Candidate::Functional { important, .. }
            | Candidate::ArbitraryProperty { important, .. } => *important,
        }
    }

    pub fn variants(&self) -> &[Variant] {
        match self {
            Candidate::Static { variants, .. }
            | Candidate::Functional { variants, .. }
            | Candidate::ArbitraryProperty { variants, .. } => variants,
        }
    }

    pub fn root(&self) -> Option<&str> {
        match self {
            Candidate::Static { root, .. } | Candidate::Functional { root, .. } => Some(root),
            Candidate::ArbitraryProperty { .. } => None,
        }
    }
}

const DATA_TYPES: &[&str] = &[
    "color",
    "length",
    "percentage",
    "number",
    "integer",
    "url",
    "image",
    "position",
    "bg-size",
    "line-width",
    "family-name",
    "absolute-size",
    "relative-size",
    "angle",
    "ratio",
    "vector",
    "any",
];

/// Parses a class name into every structural interpretation the registries
/// allow. Unknown utilities or variants yield an empty list.
pub fn parse_candidate(
    input: &str,
    utilities: &Utilities,
    parse_variant: &mut dyn FnMut(&str) -> Option<Variant>,
) -> Vec<Candidate> {
    let segments = split_top_level(input, ':');
    let Some((base, variant_segments)) = segments.split_last() else {
        return Vec::new();
    };

    let mut variants = Vec::with_capacity(variant_segments.len());
    for segment in variant_segments {
        if segment.is_empty() {
            return Vec::new();
        }
        match parse_variant(segment) {
            Some(variant) => variants.push(variant),
            None => return Vec::new(),
        }
    }

    let (base, important) = strip_important(base);
    if base.is_empty() {
        return Vec::new();
    }

    if base.starts_with('[') {
        return parse_arbitrary_property(base)
            .map(|(property, value, modifier)| Candidate::ArbitraryProperty {
                property,
                value,
                modifier,
                variants,
                important,
                raw: input.to_string(),
            })
            .into_iter()
            .collect();
    }

    let mut candidates = Vec::new();
    if utilities.has_static(base) {
        candidates.push(Candidate::Static {
            root: base.to_string(),
            variants: variants.clone(),
            important,
            raw: input.to_string(),
        });
    }

    if let Some(parsed) = parse_functional(base, utilities) {
        candidates.push(Candidate::Functional {
            root: parsed.root.to_string(),
            value: parsed.value,
            modifier: parsed.modifier,
            variants,
            important,
            raw: input.to_string(),
        });
    }

    candidates
}

fn strip_important(base: &str) -> (&str, bool) {
    if let Some(rest) = base.strip_prefix('!') {
        return (rest, true);
    }
    if let Some(rest) = base.strip_suffix('!') {
        return (rest, true);
    }
    (base, false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FunctionalParts<'a> {
    root: &'a str,
    value: Option<CandidateValue>,
    modifier: Option<CandidateModifier>,
}

fn parse_functional<'a>(base: &'a str, utilities: &Utilities) -> Option<FunctionalParts<'a>> {
    if let Some(slash) = last_top_level(base, '/') {
        let suffix = &base[slash + 1..];
        // A digits-only suffix belongs to a fraction value (`w-1/2`).
        if !is_purely_numeric(suffix) {
            let modifier = parse_modifier(suffix)?;
            let (root, value) = parse_root_and_value(&base[..slash], utilities)?;
            return Some(FunctionalParts {
                root,
                value,
                modifier: Some(modifier),
            });
        }
    }

    let (root, value) = parse_root_and_value(base, utilities)?;
    Some(FunctionalParts {
        root,
        value,
        modifier: None,
    })
}

fn parse_root_and_value<'a>(
    input: &'a str,
    utilities: &Utilities,
) -> Option<(&'a str, Option<CandidateValue>)> {
    if input.is_empty() {
        return None;
    }
    if utilities.has_functional(input) {
        return Some((input, None));
    }

    if input.ends_with(')') {
        if let Some(idx) = input.find("-(") {
            let root = &input[..idx];
            let open = idx + 1;
            let interior = &input[open + 1..input.len() - 1];
            if utilities.has_functional(root)
                && find_matching_paren(input, open) == Some(input.len() - 1)
                && interior.starts_with("--")
                && interior.len() > 2
            {
                return Some((
                    root,
                    Some(CandidateValue::CssVariable {
                        name: interior.to_string(),
                    }),
                ));
            }
        }
    }

    for idx in top_level_positions(input, '-').into_iter().rev() {
        if idx == 0 {
            continue;
        }
        let root = &input[..idx];
        if !utilities.has_functional(root) {
            continue;
        }
        // The longest registered root decides; an invalid value does not fall
        // back to a shorter one.
        let value = parse_value(&input[idx + 1..])?;
        return Some((root, Some(value)));
    }

    None
}

fn parse_value(raw: &str) -> Option<CandidateValue> {
    if raw.is_empty() {
        return None;
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        if inner.is_empty() || find_matching_bracket(raw, 0) != Some(raw.len() - 1) {
            return None;
        }
        let (data_type, inner) = match inner.split_once(':') {
            Some((hint, rest)) if DATA_TYPES.contains(&hint) => (Some(hint.to_string()), rest),
            _ => (None, inner),
        };
        if inner.is_empty() {
            return None;
        }
        return Some(CandidateValue::Arbitrary {
            value: decode_arbitrary_value(inner),
            data_type,
        });
    }

    if raw.contains(['[', ']', '(', ')']) {
        return None;
    }
    Some(CandidateValue::named(raw))
}

fn parse_modifier(raw: &str) -> Option<CandidateModifier> {
    if raw.is_empty() {
        return None;
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        if inner.is_empty() {
            return None;
        }
        return Some(CandidateModifier::Arbitrary {
            value: decode_arbitrary_value(inner),
        });
    }
    if let Some(inner) = raw.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        if !inner.starts_with("--") || inner.len() <= 2 {
            return None;
        }
        return Some(CandidateModifier::Arbitrary {
            value: format!("var({})", inner),
        });
    }
    if raw.contains(['[', ']', '(', ')']) {
        return None;
    }
    Some(CandidateModifier::Named {
        value: raw.to_string(),
    })
}

fn parse_arbitrary_property(base: &str) -> Option<(String, String, Option<CandidateModifier>)> {
    let close = find_matching_bracket(base, 0)?;
    let inner = &base[1..close];
    let rest = &base[close + 1..];
    let modifier = match rest.strip_prefix('/') {
        Some(raw) => Some(parse_modifier(raw)?),
        None if rest.is_empty() => None,
        None => return None,
    };

    let (property, value) = inner.split_once(':')?;
    let valid_property = property.starts_with("--")
        || (!property.is_empty()
            && property
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch == '-'));
    if !valid_property || value.is_empty() {
        return None;
    }
    Some((property.to_string(), decode_arbitrary_value(value), modifier))
}

fn is_purely_numeric(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|ch| ch.is_ascii_digit())
}

/// Splits on `separator` outside brackets and parentheses.
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;
    for idx in top_level_positions(input, separator) {
        parts.push(&input[start..idx]);
        start = idx + separator.len_utf8();
    }
    parts.push(&input[start..]);
    parts
}

fn last_top_level(input: &str, target: char) -> Option<usize> {
    top_level_positions(input, target).last().copied()
}

fn top_level_positions(input: &str, target: char) -> Vec<usize> {
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut positions = Vec::new();

    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if ch == target && paren_depth == 0 && bracket_depth == 0 => positions.push(idx),
            _ => {}
        }
    }

    positions
}

fn find_matching_paren(input: &str, open: usize) -> Option<usize> {
    find_matching(input, open, '(', ')')
}

fn find_matching_bracket(input: &str, open: usize) -> Option<usize> {
    find_matching(input, open, '[', ']')
}

fn find_matching(input: &str, open_idx: usize, open: char, close: char) -> Option<usize> {
    if !input[open_idx..].starts_with(open) {
        return None;
    }
    let mut depth = 0usize;
    for (rel, ch) in input[open_idx..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(open_idx + rel);
            }
        }
    }
    None
}

/// Decodes an arbitrary value: `_` becomes a space, `\_` a literal
/// underscore, and `url(...)` contents are left alone. Math functions get
/// spaces around their binary operators.
pub fn decode_arbitrary_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut idx = 0usize;
    let mut quote: Option<char> = None;
    let mut paren_depth = 0usize;
    let mut url_depth: Option<usize> = None;

    while idx < raw.len() {
        if quote.is_none() && starts_with_url_function(raw, idx) {
            out.push_str("url(");
            idx += "url(".len();
            paren_depth += 1;
            url_depth = Some(paren_depth);
            continue;
        }

        let Some(ch) = raw[idx..].chars().next() else {
            break;
        };
        let size = ch.len_utf8();

        if ch == '\\' {
            let next_idx = idx + size;
            if let Some(next) = raw[next_idx..].chars().next() {
                if next == '_' {
                    out.push('_');
                } else {
                    out.push('\\');
                    out.push(next);
                }
                idx = next_idx + next.len_utf8();
                continue;
            }
            out.push('\\');
            idx += size;
            continue;
        }

        if quote.is_none() {
            match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => paren_depth += 1,
                ')' => {
                    if url_depth == Some(paren_depth) {
                        url_depth = None;
                    }
                    paren_depth = paren_depth.saturating_sub(1);
                }
                _ => {}
            }
        } else if quote == Some(ch) {
            quote = None;
        }

        if ch == '_' && url_depth.is_none() {
            out.push(' ');
        } else {
            out.push(ch);
        }
        idx += size;
    }

    add_whitespace_around_math_operators(&out)
}

/// Decodes a bracketed selector. Only underscores are rewritten, so math
/// inside `@container` or `:nth-child` queries is left as written.
pub fn decode_selector_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('_') => out.push('_'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '_' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

fn starts_with_url_function(raw: &str, idx: usize) -> bool {
    raw[idx..]
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("url("))
}

const MATH_FUNCTIONS: &[&str] = &["calc", "min", "max", "clamp", "round", "mod", "rem"];

fn add_whitespace_around_math_operators(value: &str) -> String {
    if !MATH_FUNCTIONS
        .iter()
        .any(|name| value.contains(&format!("{}(", name)))
    {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 8);
    // Whether each open parenthesis is a math context.
    let mut contexts: Vec<bool> = Vec::new();
    let mut chars = value.chars().peekable();
    let mut prev_non_ws: Option<char> = None;

    while let Some(ch) = chars.next() {
        match ch {
            '(' => {
                let name = trailing_identifier(&out);
                let is_math = if name.is_empty() {
                    contexts.last().copied().unwrap_or(false)
                } else {
                    MATH_FUNCTIONS.contains(&name)
                };
                contexts.push(is_math);
                out.push(ch);
            }
            ')' => {
                contexts.pop();
                out.push(ch);
            }
            '+' | '-' | '*' | '/' if contexts.last().copied().unwrap_or(false) => {
                let unary = matches!(ch, '+' | '-')
                    && prev_non_ws.is_none_or(|prev| matches!(prev, '(' | '+' | '-' | '*' | '/' | ','));
                if unary {
                    out.push(ch);
                } else {
                    while out.ends_with(' ') {
                        out.pop();
                    }
                    out.push(' ');
                    out.push(ch);
                    out.push(' ');
                    while matches!(chars.peek(), Some(next) if next.is_whitespace()) {
                        chars.next();
                    }
                }
            }
            _ => out.push(ch),
        }
        if !ch.is_whitespace() {
            prev_non_ws = Some(ch);
        }
    }

    out
}

fn trailing_identifier(out: &str) -> &str {
    let start = out
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_alphanumeric() || *ch == '-')
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(out.len());
    &out[start..]
}

#[cfg(test)]
mod tests {
    use super::{
        Candidate, CandidateModifier, CandidateValue, decode_arbitrary_value, decode_selector_value, parse_candidate,
        split_top_level,
    };
    use crate::utilities::Utilities;
    use crate::variants::Variant;

    fn utilities() -> Utilities {
        let mut utilities = Utilities::new();
        for root in ["flex", "hidden", "underline"] {
            utilities.static_utility(root, Vec::new);
        }
        for root in ["p", "w", "bg", "rounded", "rounded-t", "-m", "grid-cols", "text"] {
            utilities.functional(root, |_, _| None);
        }
        utilities
    }

    fn parse(input: &str) -> Vec<Candidate> {
        let utilities = utilities();
        parse_candidate(input, &utilities, &mut |variant| match variant {
            "hover" | "md" => Some(Variant::Static {
                root: variant.to_string(),
            }),
            _ => None,
        })
    }

    fn functional(input: &str) -> (String, Option<CandidateValue>, Option<CandidateModifier>) {
        match parse(input).into_iter().next() {
            Some(Candidate::Functional {
                root,
                value,
                modifier,
                ..
            }) => (root, value, modifier),
            other => panic!("expected functional candidate for {input}, got {other:?}"),
        }
    }

    #[test]
    fn parses_static_roots_with_important_markers() {
        for input in ["flex", "flex!", "!flex"] {
            let parsed = parse(input);
            assert_eq!(
                parsed,
                vec![Candidate::Static {
                    root: "flex".to_string(),
                    variants: vec![],
                    important: input != "flex",
                    raw: input.to_string(),
                }]
            );
        }
        assert!(parse("!flex!").is_empty());
    }

    #[test]
    fn parses_named_values() {
        let (root, value, modifier) = functional("p-4");
        assert_eq!(root, "p");
        assert_eq!(value, Some(CandidateValue::named("4")));
        assert_eq!(modifier, None);

        let (root, value, _) = functional("bg-red-500");
        assert_eq!(root, "bg");
        assert_eq!(value.and_then(|v| v.as_named().map(str::to_string)).as_deref(), Some("red-500"));
    }

    #[test]
    fn longest_root_wins() {
        let (root, value, _) = functional("rounded-t-lg");
        assert_eq!(root, "rounded-t");
        assert_eq!(value, Some(CandidateValue::named("lg")));

        let (root, value, _) = functional("rounded-t");
        assert_eq!(root, "rounded-t");
        assert_eq!(value, None);

        let (root, value, _) = functional("grid-cols-3");
        assert_eq!(root, "grid-cols");
        assert_eq!(value, Some(CandidateValue::named("3")));
    }

    #[test]
    fn fractions_are_not_modifiers() {
        let (root, value, modifier) = functional("w-1/2");
        assert_eq!(root, "w");
        assert_eq!(
            value,
            Some(CandidateValue::Named {
                value: "1/2".to_string(),
                fraction: Some("1/2".to_string()),
            })
        );
        assert_eq!(modifier, None);

        let (_, value, modifier) = functional("bg-red-500/50");
        assert_eq!(value.as_ref().and_then(CandidateValue::fraction), Some("red-500/50"));
        assert_eq!(modifier, None);
    }

    #[test]
    fn non_numeric_suffixes_are_modifiers() {
        let (_, value, modifier) = functional("bg-red-500/[0.5]");
        assert_eq!(value, Some(CandidateValue::named("red-500")));
        assert_eq!(
            modifier,
            Some(CandidateModifier::Arbitrary {
                value: "0.5".to_string()
            })
        );

        let (_, _, modifier) = functional("bg-red-500/(--alpha)");
        assert_eq!(modifier.as_ref().map(CandidateModifier::value), Some("var(--alpha)"));

        let (_, _, modifier) = functional("text-sm/loose");
        assert_eq!(
            modifier,
            Some(CandidateModifier::Named {
                value: "loose".to_string()
            })
        );

        let (_, value, modifier) = functional("bg-[#fff]/75%");
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("#fff"));
        assert_eq!(modifier.as_ref().map(CandidateModifier::value), Some("75%"));

        // Digits-only suffixes stay fractions even after a bracketed value.
        assert!(parse("bg-[#fff]/50").is_empty());
    }

    #[test]
    fn arbitrary_values_decode_underscores_once() {
        let (_, value, _) = functional("p-[calc(1rem_+_2px)]");
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("calc(1rem + 2px)"));

        let (_, value, _) = functional("bg-[url(/img/a_b.png)]");
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("url(/img/a_b.png)"));

        let (_, value, _) = functional("w-[a__b]");
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("a  b"));

        let (_, value, _) = functional("w-[a\\_b]");
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("a_b"));
    }

    #[test]
    fn arbitrary_values_keep_type_hints() {
        let (_, value, _) = functional("bg-[color:var(--brand)]");
        assert_eq!(
            value,
            Some(CandidateValue::Arbitrary {
                value: "var(--brand)".to_string(),
                data_type: Some("color".to_string()),
            })
        );
        let (_, value, _) = functional("rounded-t-[2px]");
        assert!(matches!(
            value,
            Some(CandidateValue::Arbitrary { data_type: None, .. })
        ));
    }

    #[test]
    fn parses_css_variable_values() {
        let (root, value, _) = functional("bg-(--my-color)");
        assert_eq!(root, "bg");
        assert_eq!(
            value,
            Some(CandidateValue::CssVariable {
                name: "--my-color".to_string()
            })
        );
        assert_eq!(value.and_then(|v| v.literal()).as_deref(), Some("var(--my-color)"));
        assert!(parse("bg-(my-color)").is_empty());
    }

    #[test]
    fn negative_roots_are_registered_roots() {
        let (root, value, _) = functional("-m-4");
        assert_eq!(root, "-m");
        assert_eq!(value, Some(CandidateValue::named("4")));
    }

    #[test]
    fn rejects_invalid_candidates() {
        for input in ["p-", "bogus-xyz", "", "p-[]", "p-4)", "hover:", ":flex", "focus:flex", "bg-red/"] {
            assert!(parse(input).is_empty(), "{input} should be invalid");
        }
    }

    #[test]
    fn parses_variants_outermost_first() {
        let parsed = parse("md:hover:p-4!");
        assert_eq!(parsed.len(), 1);
        let candidate = &parsed[0];
        assert!(candidate.important());
        assert_eq!(candidate.raw(), "md:hover:p-4!");
        assert_eq!(
            candidate.variants(),
            &[
                Variant::Static {
                    root: "md".to_string()
                },
                Variant::Static {
                    root: "hover".to_string()
                },
            ]
        );
    }

    #[test]
    fn parses_arbitrary_properties() {
        let parsed = parse("[mask-type:luminance]");
        assert_eq!(
            parsed,
            vec![Candidate::ArbitraryProperty {
                property: "mask-type".to_string(),
                value: "luminance".to_string(),
                modifier: None,
                variants: vec![],
                important: false,
                raw: "[mask-type:luminance]".to_string(),
            }]
        );
        assert!(parse("[Mask:x]").is_empty());
        assert!(parse("[--gap:calc(1px_*_2)]")
            .first()
            .is_some_and(|c| matches!(c, Candidate::ArbitraryProperty { value, .. } if value == "calc(1px * 2)")));
    }

    #[test]
    fn static_and_functional_interpretations_coexist() {
        let mut utilities = utilities();
        utilities.functional("flex", |_, _| None);
        let parsed = parse_candidate("flex", &utilities, &mut |_| None);
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0], Candidate::Static { .. }));
        assert!(matches!(parsed[1], Candidate::Functional { value: None, .. }));
    }

    #[test]
    fn splits_variants_outside_brackets() {
        assert_eq!(
            split_top_level("[&:hover]:bg-[url(a:b)]", ':'),
            vec!["[&:hover]", "bg-[url(a:b)]"]
        );
    }

    #[test]
    fn math_operators_are_spaced_outside_variables() {
        assert_eq!(decode_arbitrary_value("calc(100%-var(--my-gap))"), "calc(100% - var(--my-gap))");
        assert_eq!(decode_arbitrary_value("min(1rem,-2px*3)"), "min(1rem,-2px * 3)");
        assert_eq!(decode_arbitrary_value("#0088cc"), "#0088cc");
    }

    #[test]
    fn selector_decoding_only_touches_underscores() {
        assert_eq!(decode_selector_value("&_p:nth-child(2n-1)"), "& p:nth-child(2n-1)");
        assert_eq!(decode_selector_value("&.a\\_b"), "&.a_b");
        assert_eq!(decode_selector_value("&[data-x=\\31]"), "&[data-x=\\31]");
    }
}
