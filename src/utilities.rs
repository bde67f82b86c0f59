use crate::ast::Node;
use crate::candidate::{CandidateModifier, CandidateValue};
use crate::theme::{Theme, replace_alpha, with_alpha};
use std::collections::HashMap;
use std::fmt;

/// The value and modifier of a functional candidate, handed to generators.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtilityArgs<'a> {
    pub value: Option<&'a CandidateValue>,
    pub modifier: Option<&'a CandidateModifier>,
}

type StaticUtility = Box<dyn Fn() -> Vec<Node>>;
type FunctionalUtility = Box<dyn Fn(&Theme, &UtilityArgs<'_>) -> Option<Vec<Node>>>;

/// Registry of utility generators keyed by root.
///
/// A root may be registered both statically and functionally; the candidate
/// parser then yields both interpretations. Registration order doubles as the
/// utility sort order.
#[derive(Default)]
pub struct Utilities {
    statics: HashMap<String, (usize, StaticUtility)>,
    functionals: HashMap<String, (usize, FunctionalUtility)>,
    next_order: usize,
}

impl fmt::Debug for Utilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut statics = self.statics.keys().collect::<Vec<_>>();
        let mut functionals = self.functionals.keys().collect::<Vec<_>>();
        statics.sort();
        functionals.sort();
        f.debug_struct("Utilities")
            .field("statics", &statics)
            .field("functionals", &functionals)
            .finish()
    }
}

impl Utilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn static_utility(&mut self, root: &str, generate: impl Fn() -> Vec<Node> + 'static) {
        let order = self.bump_order();
        self.statics
            .insert(root.to_string(), (order, Box::new(generate)));
    }

    pub fn functional(
        &mut self,
        root: &str,
        generate: impl Fn(&Theme, &UtilityArgs<'_>) -> Option<Vec<Node>> + 'static,
    ) {
        let order = self.bump_order();
        self.functionals
            .insert(root.to_string(), (order, Box::new(generate)));
    }

    fn bump_order(&mut self) -> usize {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    pub fn has_static(&self, root: &str) -> bool {
        self.statics.contains_key(root)
    }

    pub fn has_functional(&self, root: &str) -> bool {
        self.functionals.contains_key(root)
    }

    pub fn compile_static(&self, root: &str) -> Option<Vec<Node>> {
        let (_, generate) = self.statics.get(root)?;
        Some(generate())
    }

    pub fn compile_functional(&self, root: &str, theme: &Theme, args: &UtilityArgs<'_>) -> Option<Vec<Node>> {
        let (_, generate) = self.functionals.get(root)?;
        generate(theme, args)
    }

    /// Registration index of `root`, the earlier one when registered twice.
    pub fn order(&self, root: &str) -> Option<usize> {
        let static_order = self.statics.get(root).map(|(order, _)| *order);
        let functional_order = self.functionals.get(root).map(|(order, _)| *order);
        match (static_order, functional_order) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn len(&self) -> usize {
        self.next_order
    }

    pub fn is_empty(&self) -> bool {
        self.next_order == 0
    }
}

type Declarations = &'static [(&'static str, &'static str)];
type Properties = &'static [&'static str];

fn declarations(pairs: Declarations) -> Vec<Node> {
    pairs
        .iter()
        .map(|(property, value)| Node::decl(*property, *value))
        .collect()
}

fn register_statics(utilities: &mut Utilities, table: &[(&str, Declarations)]) {
    for (root, pairs) in table {
        let pairs = *pairs;
        utilities.static_utility(root, move || declarations(pairs));
    }
}

fn each(properties: &[&str], value: &str) -> Vec<Node> {
    properties
        .iter()
        .map(|property| Node::decl(*property, value))
        .collect()
}

/// The built-in utility set.
pub fn default_utilities() -> Utilities {
    let mut utilities = Utilities::new();
    register_layout(&mut utilities);
    register_spacing(&mut utilities);
    register_sizing(&mut utilities);
    register_flex_and_grid(&mut utilities);
    register_typography(&mut utilities);
    register_colors(&mut utilities);
    register_borders(&mut utilities);
    register_effects(&mut utilities);
    utilities
}

fn register_layout(utilities: &mut Utilities) {
    register_statics(
        utilities,
        &[
            ("sr-only", &[
                ("position", "absolute"),
                ("width", "1px"),
                ("height", "1px"),
                ("padding", "0"),
                ("margin", "-1px"),
                ("overflow", "hidden"),
                ("clip-path", "inset(50%)"),
                ("white-space", "nowrap"),
                ("border-width", "0"),
            ]),
            ("not-sr-only", &[
                ("position", "static"),
                ("width", "auto"),
                ("height", "auto"),
                ("padding", "0"),
                ("margin", "0"),
                ("overflow", "visible"),
                ("clip-path", "none"),
                ("white-space", "normal"),
            ]),
            ("pointer-events-none", &[("pointer-events", "none")]),
            ("pointer-events-auto", &[("pointer-events", "auto")]),
            ("visible", &[("visibility", "visible")]),
            ("invisible", &[("visibility", "hidden")]),
            ("collapse", &[("visibility", "collapse")]),
            ("static", &[("position", "static")]),
            ("fixed", &[("position", "fixed")]),
            ("absolute", &[("position", "absolute")]),
            ("relative", &[("position", "relative")]),
            ("sticky", &[("position", "sticky")]),
        ],
    );

    let insets: &[(&str, Properties)] = &[
        ("inset", &["inset"]),
        ("inset-x", &["inset-inline"]),
        ("inset-y", &["inset-block"]),
        ("start", &["inset-inline-start"]),
        ("end", &["inset-inline-end"]),
        ("top", &["top"]),
        ("right", &["right"]),
        ("bottom", &["bottom"]),
        ("left", &["left"]),
    ];
    for &(root, properties) in insets {
        for negative in [false, true] {
            let name = if negative { format!("-{}", root) } else { root.to_string() };
            utilities.functional(&name, move |theme, args| {
                if args.modifier.is_some() {
                    return None;
                }
                let value = args.value?;
                let resolved = match value.as_named() {
                    Some("auto") if !negative => "auto".to_string(),
                    Some("full") => "100%".to_string(),
                    _ => match value.fraction() {
                        Some(fraction) => fraction_percentage(fraction)?,
                        None => spacing_value(theme, value)?,
                    },
                };
                let resolved = if negative { negate(&resolved) } else { resolved };
                Some(each(properties, &resolved))
            });
        }
    }

    for negative in [false, true] {
        let name = if negative { "-z" } else { "z" };
        utilities.functional(name, move |_, args| {
            if args.modifier.is_some() {
                return None;
            }
            let value = match args.value? {
                CandidateValue::Named { value, .. } if value == "auto" && !negative => value.clone(),
                CandidateValue::Named { value, .. } if is_integer(value) => value.clone(),
                CandidateValue::Named { .. } => return None,
                other => other.literal()?,
            };
            let value = if negative { negate(&value) } else { value };
            Some(vec![Node::decl("z-index", value)])
        });
    }

    register_statics(
        utilities,
        &[
            ("block", &[("display", "block")]),
            ("inline-block", &[("display", "inline-block")]),
            ("inline", &[("display", "inline")]),
            ("flex", &[("display", "flex")]),
            ("inline-flex", &[("display", "inline-flex")]),
            ("grid", &[("display", "grid")]),
            ("inline-grid", &[("display", "inline-grid")]),
            ("table", &[("display", "table")]),
            ("contents", &[("display", "contents")]),
            ("flow-root", &[("display", "flow-root")]),
            ("hidden", &[("display", "none")]),
            ("overflow-auto", &[("overflow", "auto")]),
            ("overflow-hidden", &[("overflow", "hidden")]),
            ("overflow-clip", &[("overflow", "clip")]),
            ("overflow-visible", &[("overflow", "visible")]),
            ("overflow-scroll", &[("overflow", "scroll")]),
        ],
    );
}

fn register_spacing(utilities: &mut Utilities) {
    let paddings: &[(&str, Properties)] = &[
        ("p", &["padding"]),
        ("px", &["padding-inline"]),
        ("py", &["padding-block"]),
        ("pt", &["padding-top"]),
        ("pr", &["padding-right"]),
        ("pb", &["padding-bottom"]),
        ("pl", &["padding-left"]),
        ("ps", &["padding-inline-start"]),
        ("pe", &["padding-inline-end"]),
        ("gap", &["gap"]),
        ("gap-x", &["column-gap"]),
        ("gap-y", &["row-gap"]),
    ];
    for &(root, properties) in paddings {
        utilities.functional(root, move |theme, args| {
            if args.modifier.is_some() {
                return None;
            }
            let value = spacing_value(theme, args.value?)?;
            Some(each(properties, &value))
        });
    }

    let margins: &[(&str, Properties)] = &[
        ("m", &["margin"]),
        ("mx", &["margin-inline"]),
        ("my", &["margin-block"]),
        ("mt", &["margin-top"]),
        ("mr", &["margin-right"]),
        ("mb", &["margin-bottom"]),
        ("ml", &["margin-left"]),
        ("ms", &["margin-inline-start"]),
        ("me", &["margin-inline-end"]),
    ];
    for &(root, properties) in margins {
        for negative in [false, true] {
            let name = if negative { format!("-{}", root) } else { root.to_string() };
            utilities.functional(&name, move |theme, args| {
                if args.modifier.is_some() {
                    return None;
                }
                let value = args.value?;
                let resolved = match value.as_named() {
                    Some("auto") if !negative => "auto".to_string(),
                    _ => spacing_value(theme, value)?,
                };
                let resolved = if negative { negate(&resolved) } else { resolved };
                Some(each(properties, &resolved))
            });
        }
    }
}

fn register_sizing(utilities: &mut Utilities) {
    let sizes: &[(&str, Properties, Axis)] = &[
        ("w", &["width"], Axis::Inline),
        ("h", &["height"], Axis::Block),
        ("size", &["width", "height"], Axis::Both),
        ("min-w", &["min-width"], Axis::Inline),
        ("max-w", &["max-width"], Axis::Inline),
        ("min-h", &["min-height"], Axis::Block),
        ("max-h", &["max-height"], Axis::Block),
        ("basis", &["flex-basis"], Axis::Both),
    ];
    for &(root, properties, axis) in sizes {
        utilities.functional(root, move |theme, args| {
            if args.modifier.is_some() {
                return None;
            }
            let value = sizing_value(theme, args.value?, axis)?;
            Some(each(properties, &value))
        });
    }

    utilities.functional("aspect", |theme, args| {
        let value = match args.value? {
            CandidateValue::Named { value, fraction } => match value.as_str() {
                "auto" => "auto".to_string(),
                "square" => "1 / 1".to_string(),
                _ => match fraction {
                    Some(fraction) => {
                        let (numerator, denominator) = fraction.split_once('/')?;
                        format!("{} / {}", numerator, denominator)
                    }
                    None => theme.resolve_value(value, &["--aspect"])?,
                },
            },
            other => other.literal()?,
        };
        Some(vec![Node::decl("aspect-ratio", value)])
    });
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    Inline,
    Block,
    Both,
}

fn sizing_value(theme: &Theme, value: &CandidateValue, axis: Axis) -> Option<String> {
    let Some(named) = value.as_named() else {
        return value.literal();
    };
    if let Some(fraction) = value.fraction() {
        return fraction_percentage(fraction);
    }
    let keyword = match named {
        "auto" => Some("auto"),
        "full" => Some("100%"),
        "min" => Some("min-content"),
        "max" => Some("max-content"),
        "fit" => Some("fit-content"),
        "none" => Some("none"),
        "screen" => match axis {
            Axis::Inline => Some("100vw"),
            Axis::Block => Some("100vh"),
            Axis::Both => None,
        },
        _ => None,
    };
    if let Some(keyword) = keyword {
        return Some(keyword.to_string());
    }
    spacing_value(theme, value).or_else(|| theme.resolve_value(named, &["--container"]))
}

fn register_flex_and_grid(utilities: &mut Utilities) {
    register_statics(
        utilities,
        &[
            ("flex-row", &[("flex-direction", "row")]),
            ("flex-row-reverse", &[("flex-direction", "row-reverse")]),
            ("flex-col", &[("flex-direction", "column")]),
            ("flex-col-reverse", &[("flex-direction", "column-reverse")]),
            ("flex-wrap", &[("flex-wrap", "wrap")]),
            ("flex-wrap-reverse", &[("flex-wrap", "wrap-reverse")]),
            ("flex-nowrap", &[("flex-wrap", "nowrap")]),
            ("grow", &[("flex-grow", "1")]),
            ("shrink", &[("flex-shrink", "1")]),
            ("items-start", &[("align-items", "flex-start")]),
            ("items-end", &[("align-items", "flex-end")]),
            ("items-center", &[("align-items", "center")]),
            ("items-baseline", &[("align-items", "baseline")]),
            ("items-stretch", &[("align-items", "stretch")]),
            ("justify-start", &[("justify-content", "flex-start")]),
            ("justify-end", &[("justify-content", "flex-end")]),
            ("justify-center", &[("justify-content", "center")]),
            ("justify-between", &[("justify-content", "space-between")]),
            ("justify-around", &[("justify-content", "space-around")]),
            ("justify-evenly", &[("justify-content", "space-evenly")]),
            ("self-auto", &[("align-self", "auto")]),
            ("self-start", &[("align-self", "flex-start")]),
            ("self-end", &[("align-self", "flex-end")]),
            ("self-center", &[("align-self", "center")]),
            ("self-stretch", &[("align-self", "stretch")]),
            ("col-span-full", &[("grid-column", "1 / -1")]),
        ],
    );

    utilities.functional("flex", |_, args| {
        let value = match args.value? {
            CandidateValue::Named { value, fraction } => match (value.as_str(), fraction) {
                (_, Some(fraction)) => fraction_percentage(fraction)?,
                ("auto", _) => "auto".to_string(),
                ("initial", _) => "0 auto".to_string(),
                ("none", _) => "none".to_string(),
                (number, _) if is_integer(number) => number.to_string(),
                _ => return None,
            },
            other => other.literal()?,
        };
        Some(vec![Node::decl("flex", value)])
    });

    for (root, property) in [("grow", "flex-grow"), ("shrink", "flex-shrink")] {
        utilities.functional(root, move |_, args| {
            let value = integer_or_literal(args.value?)?;
            Some(vec![Node::decl(property, value)])
        });
    }

    for negative in [false, true] {
        let name = if negative { "-order" } else { "order" };
        utilities.functional(name, move |_, args| {
            let value = match args.value? {
                CandidateValue::Named { value, .. } if !negative => match value.as_str() {
                    "first" => "-9999".to_string(),
                    "last" => "9999".to_string(),
                    "none" => "0".to_string(),
                    number if is_integer(number) => number.to_string(),
                    _ => return None,
                },
                other => integer_or_literal(other)?,
            };
            let value = if negative { negate(&value) } else { value };
            Some(vec![Node::decl("order", value)])
        });
    }

    utilities.functional("grid-cols", |_, args| {
        let value = match args.value? {
            CandidateValue::Named { value, .. } => match value.as_str() {
                "none" => "none".to_string(),
                "subgrid" => "subgrid".to_string(),
                count if is_integer(count) => format!("repeat({}, minmax(0, 1fr))", count),
                _ => return None,
            },
            other => other.literal()?,
        };
        Some(vec![Node::decl("grid-template-columns", value)])
    });

    utilities.functional("col-span", |_, args| {
        let value = integer_or_literal(args.value?)?;
        Some(vec![Node::decl("grid-column", format!("span {} / span {}", value, value))])
    });
}

fn register_typography(utilities: &mut Utilities) {
    register_statics(
        utilities,
        &[
            ("uppercase", &[("text-transform", "uppercase")]),
            ("lowercase", &[("text-transform", "lowercase")]),
            ("capitalize", &[("text-transform", "capitalize")]),
            ("normal-case", &[("text-transform", "none")]),
            ("underline", &[("text-decoration-line", "underline")]),
            ("overline", &[("text-decoration-line", "overline")]),
            ("line-through", &[("text-decoration-line", "line-through")]),
            ("no-underline", &[("text-decoration-line", "none")]),
            ("italic", &[("font-style", "italic")]),
            ("not-italic", &[("font-style", "normal")]),
            ("text-left", &[("text-align", "left")]),
            ("text-center", &[("text-align", "center")]),
            ("text-right", &[("text-align", "right")]),
            ("text-justify", &[("text-align", "justify")]),
            ("text-start", &[("text-align", "start")]),
            ("text-end", &[("text-align", "end")]),
            ("truncate", &[
                ("overflow", "hidden"),
                ("text-overflow", "ellipsis"),
                ("white-space", "nowrap"),
            ]),
            ("whitespace-normal", &[("white-space", "normal")]),
            ("whitespace-nowrap", &[("white-space", "nowrap")]),
            ("whitespace-pre", &[("white-space", "pre")]),
            ("content-none", &[("--tw-content", "none"), ("content", "none")]),
        ],
    );

    utilities.functional("text", |theme, args| {
        match args.value? {
            CandidateValue::Named { value, fraction } => {
                let (name, fraction_line_height) = match fraction {
                    Some(fraction) if args.modifier.is_none() => match fraction.rsplit_once('/') {
                        Some((name, line_height)) => (name, Some(line_height)),
                        None => (value.as_str(), None),
                    },
                    _ => (value.as_str(), None),
                };
                if let Some(size) = theme.resolve_value(name, &["--text"]) {
                    let line_height = match (args.modifier, fraction_line_height) {
                        (Some(modifier), _) => Some(line_height_modifier(theme, modifier)?),
                        (None, Some(line_height)) => Some(leading_value(theme, line_height)?),
                        (None, None) => theme.resolve_nested(name, &["--text"], "line-height"),
                    };
                    let mut nodes = vec![Node::decl("font-size", size)];
                    if let Some(line_height) = line_height {
                        nodes.push(Node::decl("line-height", line_height));
                    }
                    return Some(nodes);
                }
                let color = color_value(theme, args)?;
                Some(vec![Node::decl("color", color)])
            }
            CandidateValue::Arbitrary { value, data_type } => {
                let is_size = match data_type.as_deref() {
                    Some("length" | "percentage" | "absolute-size" | "relative-size") => true,
                    Some(_) => false,
                    None => is_length_like(value),
                };
                if !is_size {
                    let color = color_value(theme, args)?;
                    return Some(vec![Node::decl("color", color)]);
                }
                let mut nodes = vec![Node::decl("font-size", value.as_str())];
                if let Some(modifier) = args.modifier {
                    nodes.push(Node::decl("line-height", line_height_modifier(theme, modifier)?));
                }
                Some(nodes)
            }
            CandidateValue::CssVariable { .. } => {
                let color = color_value(theme, args)?;
                Some(vec![Node::decl("color", color)])
            }
        }
    });

    utilities.functional("font", |theme, args| {
        if args.modifier.is_some() {
            return None;
        }
        match args.value? {
            CandidateValue::Named { value, .. } => {
                if let Some(weight) = theme.resolve_value(value, &["--font-weight"]) {
                    return Some(vec![Node::decl("font-weight", weight)]);
                }
                let family = theme.resolve_value(value, &["--font"])?;
                Some(vec![Node::decl("font-family", family)])
            }
            CandidateValue::Arbitrary { value, data_type } => {
                let is_weight = match data_type.as_deref() {
                    Some("number") => true,
                    Some(_) => false,
                    None => is_number(value),
                };
                let property = if is_weight { "font-weight" } else { "font-family" };
                Some(vec![Node::decl(property, value.as_str())])
            }
            CandidateValue::CssVariable { name } => {
                Some(vec![Node::decl("font-family", format!("var({})", name))])
            }
        }
    });

    utilities.functional("leading", |theme, args| {
        if args.modifier.is_some() {
            return None;
        }
        let value = match args.value? {
            CandidateValue::Named { value, .. } => leading_value(theme, value)?,
            other => other.literal()?,
        };
        Some(vec![Node::decl("line-height", value)])
    });

    for negative in [false, true] {
        let name = if negative { "-tracking" } else { "tracking" };
        utilities.functional(name, move |theme, args| {
            if args.modifier.is_some() {
                return None;
            }
            let value = match args.value? {
                CandidateValue::Named { value, .. } => theme.resolve_value(value, &["--tracking"])?,
                other => other.literal()?,
            };
            let value = if negative { negate(&value) } else { value };
            Some(vec![Node::decl("letter-spacing", value)])
        });
    }

    utilities.functional("content", |_, args| {
        let value = match args.value? {
            CandidateValue::Named { .. } => return None,
            other => other.literal()?,
        };
        Some(vec![
            Node::decl("--tw-content", value),
            Node::decl("content", "var(--tw-content)"),
        ])
    });
}

fn register_colors(utilities: &mut Utilities) {
    utilities.functional("bg", |theme, args| {
        let value = args.value?;
        if let CandidateValue::Arbitrary { value, data_type } = value {
            let is_image = match data_type.as_deref() {
                Some("url" | "image") => true,
                Some(_) => false,
                None => value.starts_with("url(") || value.contains("gradient("),
            };
            if is_image {
                return Some(vec![Node::decl("background-image", value.as_str())]);
            }
        }
        if value.as_named() == Some("none") {
            return Some(vec![Node::decl("background-image", "none")]);
        }
        let color = color_value(theme, args)?;
        Some(vec![Node::decl("background-color", color)])
    });

    for (root, property) in [
        ("accent", "accent-color"),
        ("caret", "caret-color"),
        ("fill", "fill"),
    ] {
        utilities.functional(root, move |theme, args| {
            let color = color_value(theme, args)?;
            Some(vec![Node::decl(property, color)])
        });
    }

    for (root, color_property, width_property) in [
        ("stroke", "stroke", "stroke-width"),
        ("decoration", "text-decoration-color", "text-decoration-thickness"),
        ("outline", "outline-color", "outline-width"),
    ] {
        utilities.functional(root, move |theme, args| {
            if let Some(width) = width_value(args) {
                let width = if root == "stroke" {
                    width.trim_end_matches("px").to_string()
                } else {
                    width
                };
                return Some(vec![Node::decl(width_property, width)]);
            }
            let color = color_value(theme, args)?;
            Some(vec![Node::decl(color_property, color)])
        });
    }

    register_statics(
        utilities,
        &[
            ("outline", &[("outline-style", "solid"), ("outline-width", "1px")]),
            ("outline-none", &[("outline", "2px solid transparent"), ("outline-offset", "2px")]),
        ],
    );
}

fn register_borders(utilities: &mut Utilities) {
    let sides: &[(&str, Properties, Properties)] = &[
        ("border", &["border-width"], &["border-color"]),
        ("border-x", &["border-inline-width"], &["border-inline-color"]),
        ("border-y", &["border-block-width"], &["border-block-color"]),
        ("border-t", &["border-top-width"], &["border-top-color"]),
        ("border-r", &["border-right-width"], &["border-right-color"]),
        ("border-b", &["border-bottom-width"], &["border-bottom-color"]),
        ("border-l", &["border-left-width"], &["border-left-color"]),
    ];
    for &(root, width_properties, color_properties) in sides {
        utilities.static_utility(root, move || {
            let mut nodes = vec![Node::decl("border-style", "solid")];
            nodes.extend(each(width_properties, "1px"));
            nodes
        });
        utilities.functional(root, move |theme, args| {
            if let Some(width) = width_value(args) {
                let mut nodes = vec![Node::decl("border-style", "solid")];
                nodes.extend(each(width_properties, &width));
                return Some(nodes);
            }
            let color = color_value(theme, args)?;
            Some(each(color_properties, &color))
        });
    }

    register_statics(
        utilities,
        &[
            ("border-solid", &[("border-style", "solid")]),
            ("border-dashed", &[("border-style", "dashed")]),
            ("border-dotted", &[("border-style", "dotted")]),
            ("border-double", &[("border-style", "double")]),
            ("border-none", &[("border-style", "none")]),
        ],
    );

    let radii: &[(&str, Properties)] = &[
        ("rounded", &["border-radius"]),
        ("rounded-t", &["border-top-left-radius", "border-top-right-radius"]),
        ("rounded-r", &["border-top-right-radius", "border-bottom-right-radius"]),
        ("rounded-b", &["border-bottom-right-radius", "border-bottom-left-radius"]),
        ("rounded-l", &["border-top-left-radius", "border-bottom-left-radius"]),
        ("rounded-tl", &["border-top-left-radius"]),
        ("rounded-tr", &["border-top-right-radius"]),
        ("rounded-br", &["border-bottom-right-radius"]),
        ("rounded-bl", &["border-bottom-left-radius"]),
    ];
    for &(root, properties) in radii {
        utilities.functional(root, move |theme, args| {
            if args.modifier.is_some() {
                return None;
            }
            let value = match args.value {
                None => theme
                    .resolve_value("", &["--radius"])
                    .unwrap_or_else(|| "0.25rem".to_string()),
                Some(CandidateValue::Named { value, .. }) => match value.as_str() {
                    "none" => "0".to_string(),
                    "full" => "calc(infinity * 1px)".to_string(),
                    _ => theme.resolve_value(value, &["--radius"])?,
                },
                Some(other) => other.literal()?,
            };
            Some(each(properties, &value))
        });
    }
}

fn register_effects(utilities: &mut Utilities) {
    utilities.functional("opacity", |theme, args| {
        if args.modifier.is_some() {
            return None;
        }
        let value = match args.value? {
            CandidateValue::Named { value, .. } if is_number(value) => format!("{}%", value),
            CandidateValue::Named { value, .. } => theme.resolve_value(value, &["--opacity"])?,
            other => other.literal()?,
        };
        Some(vec![Node::decl("opacity", value)])
    });

    utilities.functional("shadow", |theme, args| {
        if args.modifier.is_some() {
            return None;
        }
        let value = match args.value {
            None => theme.resolve_value("", &["--shadow"])?,
            Some(CandidateValue::Named { value, .. }) if value == "none" => "0 0 #0000".to_string(),
            Some(CandidateValue::Named { value, .. }) => theme.resolve_value(value, &["--shadow"])?,
            Some(other) => other.literal()?,
        };
        Some(vec![Node::decl("box-shadow", value)])
    });

    utilities.functional("animate", |theme, args| {
        if args.modifier.is_some() {
            return None;
        }
        let value = match args.value? {
            CandidateValue::Named { value, .. } if value == "none" => "none".to_string(),
            CandidateValue::Named { value, .. } => theme.resolve_value(value, &["--animate"])?,
            other => other.literal()?,
        };
        Some(vec![Node::decl("animation", value)])
    });

    utilities.functional("duration", |_, args| {
        if args.modifier.is_some() {
            return None;
        }
        let value = match args.value? {
            CandidateValue::Named { value, .. } if is_integer(value) => format!("{}ms", value),
            CandidateValue::Named { .. } => return None,
            other => other.literal()?,
        };
        Some(vec![Node::decl("transition-duration", value)])
    });
}

/// Spacing scale value: `px`, an explicit `--spacing-*` key, or a multiple of
/// `--spacing`.
fn spacing_value(theme: &Theme, value: &CandidateValue) -> Option<String> {
    match value {
        CandidateValue::Named { value, fraction: None } => {
            if value == "px" {
                return Some("1px".to_string());
            }
            if let Some(resolved) = theme.resolve_value(value, &["--spacing"]) {
                return Some(resolved);
            }
            if is_number(value) && theme.contains("--spacing") {
                return Some(format!("calc(var(--spacing) * {})", value));
            }
            None
        }
        CandidateValue::Named { .. } => None,
        other => other.literal(),
    }
}

/// A colour from the theme or a literal, with the modifier (or the digits of a
/// `red-500/50` fraction) applied as opacity.
fn color_value(theme: &Theme, args: &UtilityArgs<'_>) -> Option<String> {
    let (color, fraction_alpha) = match args.value? {
        CandidateValue::Named { value, fraction } => {
            let (name, alpha) = match fraction {
                Some(fraction) if args.modifier.is_none() => {
                    let (name, alpha) = fraction.rsplit_once('/')?;
                    (name, Some(format!("{}%", alpha)))
                }
                Some(_) => return None,
                None => (value.as_str(), None),
            };
            let color = match name {
                "inherit" => "inherit".to_string(),
                "current" => "currentColor".to_string(),
                "transparent" => "transparent".to_string(),
                _ => theme.resolve_value(name, &["--color"])?,
            };
            (color, alpha)
        }
        CandidateValue::Arbitrary { value, data_type } => {
            let accepted = match data_type.as_deref() {
                Some("color") => true,
                Some(_) => false,
                None => is_color_like_value(value),
            };
            if !accepted {
                return None;
            }
            (value.clone(), None)
        }
        CandidateValue::CssVariable { name } => (format!("var({})", name), None),
    };

    let alpha = match args.modifier {
        Some(modifier) => Some(alpha_modifier(theme, modifier)?),
        None => fraction_alpha,
    };
    Some(match alpha {
        // A literal colour's own alpha channel is overridden.
        Some(alpha) if matches!(args.value, Some(CandidateValue::Arbitrary { .. })) => {
            replace_alpha(&color, &alpha)
        }
        Some(alpha) => with_alpha(&color, &alpha),
        None => color,
    })
}

fn alpha_modifier(theme: &Theme, modifier: &CandidateModifier) -> Option<String> {
    match modifier {
        CandidateModifier::Named { value } if is_number(value) => Some(format!("{}%", value)),
        CandidateModifier::Named { value } if value.strip_suffix('%').is_some_and(is_number) => {
            Some(value.clone())
        }
        CandidateModifier::Named { value } => theme.resolve_value(value, &["--opacity"]),
        CandidateModifier::Arbitrary { value } => Some(value.clone()),
    }
}

fn line_height_modifier(theme: &Theme, modifier: &CandidateModifier) -> Option<String> {
    match modifier {
        CandidateModifier::Named { value } => leading_value(theme, value),
        CandidateModifier::Arbitrary { value } => Some(value.clone()),
    }
}

fn leading_value(theme: &Theme, value: &str) -> Option<String> {
    if value == "none" {
        return Some("1".to_string());
    }
    if let Some(resolved) = theme.resolve_value(value, &["--leading"]) {
        return Some(resolved);
    }
    if is_number(value) && theme.contains("--spacing") {
        return Some(format!("calc(var(--spacing) * {})", value));
    }
    None
}

/// Width interpretation for utilities that take either a width or a colour:
/// bare integers become pixels, arbitrary lengths pass through.
fn width_value(args: &UtilityArgs<'_>) -> Option<String> {
    if args.modifier.is_some() {
        return None;
    }
    match args.value? {
        CandidateValue::Named { value, fraction: None } if is_integer(value) => {
            Some(format!("{}px", value))
        }
        CandidateValue::Arbitrary { value, data_type } => match data_type.as_deref() {
            Some("length" | "line-width" | "number") => Some(value.clone()),
            Some(_) => None,
            None => is_length_like(value).then(|| value.clone()),
        },
        _ => None,
    }
}

fn integer_or_literal(value: &CandidateValue) -> Option<String> {
    match value {
        CandidateValue::Named { value, .. } => is_integer(value).then(|| value.clone()),
        other => other.literal(),
    }
}

fn fraction_percentage(fraction: &str) -> Option<String> {
    let (numerator, denominator) = fraction.split_once('/')?;
    if !is_integer(numerator) || !is_integer(denominator) || denominator.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(format!("calc({}/{} * 100%)", numerator, denominator))
}

fn negate(value: &str) -> String {
    if let Some(rest) = value.strip_prefix('-') {
        return rest.to_string();
    }
    if value.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.') {
        return format!("-{}", value);
    }
    if let Some(multiplier) = value
        .strip_prefix("calc(var(--spacing) * ")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return format!("calc(var(--spacing) * -{})", multiplier);
    }
    format!("calc({} * -1)", value)
}

fn is_integer(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|ch| ch.is_ascii_digit())
}

fn is_number(raw: &str) -> bool {
    if raw.is_empty() || raw.starts_with('.') || raw.ends_with('.') {
        return false;
    }
    let mut seen_dot = false;
    for ch in raw.chars() {
        if ch == '.' {
            if seen_dot {
                return false;
            }
            seen_dot = true;
            continue;
        }
        if !ch.is_ascii_digit() {
            return false;
        }
    }
    true
}

fn is_length_like(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    raw.starts_with(|ch: char| ch.is_ascii_digit() || ch == '.')
        || lower.starts_with("calc(")
        || lower.starts_with("min(")
        || lower.starts_with("max(")
        || lower.starts_with("clamp(")
}

fn is_color_like_value(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    raw.starts_with('#')
        || [
            "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch(", "color(",
            "color-mix(", "var(",
        ]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
        || matches!(lower.as_str(), "currentcolor" | "transparent" | "inherit")
        || (!lower.is_empty() && lower.chars().all(|ch| ch.is_ascii_lowercase()))
}
