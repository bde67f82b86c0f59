use crate::ast::Node;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeOptions {
    /// Utilities receive the raw value instead of a `var()` reference.
    pub inline: bool,
    /// Emitted even when no generated CSS references it.
    pub always_emit: bool,
    /// Resolvable but never emitted.
    pub reference: bool,
}

impl ThemeOptions {
    pub const INLINE: Self = Self {
        inline: true,
        always_emit: false,
        reference: false,
    };
    pub const STATIC: Self = Self {
        inline: false,
        always_emit: true,
        reference: false,
    };
    pub const REFERENCE: Self = Self {
        inline: false,
        always_emit: false,
        reference: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEntry {
    pub name: String,
    pub value: String,
    pub options: ThemeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyframes {
    pub name: String,
    pub node: Node,
}

/// Design tokens keyed by CSS custom property name.
///
/// Entries keep their first insertion position so emitted output follows the
/// order in which the theme was declared. The used-variable set only grows.
#[derive(Debug, Default)]
pub struct Theme {
    entries: Vec<ThemeEntry>,
    index: BTreeMap<String, usize>,
    keyframes: Vec<Keyframes>,
    used: RefCell<BTreeSet<String>>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>, options: ThemeOptions) {
        let name = name.into();
        let value = value.into();
        if let Some(&idx) = self.index.get(&name) {
            let entry = &mut self.entries[idx];
            entry.value = value;
            entry.options = options;
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(ThemeEntry {
            name,
            value,
            options,
        });
    }

    pub fn add_keyframes(&mut self, name: impl Into<String>, node: Node) {
        let name = name.into();
        self.keyframes.retain(|existing| existing.name != name);
        self.keyframes.push(Keyframes { name, node });
    }

    /// Drops every entry. Keyframes go too, mirroring `--*: initial`.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.keyframes.clear();
    }

    /// Drops `--{namespace}-*` entries (and a bare `--{namespace}` default).
    pub fn clear_namespace(&mut self, namespace: &str) {
        let bare = format!("--{}", namespace);
        let prefix = format!("--{}-", namespace);
        self.entries
            .retain(|entry| entry.name != bare && !entry.name.starts_with(&prefix));
        self.reindex();
        if namespace == "animate" {
            self.keyframes.clear();
        }
    }

    pub fn remove(&mut self, name: &str) {
        if self.index.remove(name).is_some() {
            self.entries.retain(|entry| entry.name != name);
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.name.clone(), idx))
            .collect();
    }

    pub fn get(&self, name: &str) -> Option<&ThemeEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn entries(&self) -> &[ThemeEntry] {
        &self.entries
    }

    pub fn keyframes(&self) -> &[Keyframes] {
        &self.keyframes
    }

    /// Entries under `--{namespace}-` as `(suffix, value)` pairs, excluding
    /// nested keys such as `--text-sm--line-height`.
    pub fn namespace(&self, namespace: &str) -> Vec<(String, String)> {
        let prefix = format!("--{}-", namespace);
        self.entries
            .iter()
            .filter_map(|entry| {
                let suffix = entry.name.strip_prefix(&prefix)?;
                if suffix.is_empty() || suffix.contains("--") {
                    return None;
                }
                Some((unescape_key(suffix), entry.value.clone()))
            })
            .collect()
    }

    /// Resolves a theme path such as `--color-red-500 / 50%` or the dotted
    /// `colors.red.500`. Returns `None` when the variable does not exist.
    pub fn resolve(&self, path: &str, force_inline: bool) -> Option<String> {
        let (path, modifier) = match path.rfind('/') {
            Some(idx) => (path[..idx].trim(), Some(path[idx + 1..].trim())),
            None => (path.trim(), None),
        };
        let name = normalize_theme_path(path)?;
        let entry = self.get(&name)?;
        let value = if force_inline || entry.options.inline {
            entry.value.clone()
        } else {
            format!("var({})", entry.name)
        };

        match modifier {
            Some(alpha) if !alpha.is_empty() => Some(with_alpha(&value, alpha)),
            _ => Some(value),
        }
    }

    /// Looks `value` up in each namespace in turn, e.g. `red-500` against
    /// `["--background-color", "--color"]`.
    pub fn resolve_value(&self, value: &str, namespaces: &[&str]) -> Option<String> {
        let entry = self.lookup(value, namespaces, None)?;
        Some(self.reference(entry))
    }

    /// Like [`Theme::resolve_value`] but for nested keys such as
    /// `--text-sm--line-height`.
    pub fn resolve_nested(&self, value: &str, namespaces: &[&str], suffix: &str) -> Option<String> {
        let entry = self.lookup(value, namespaces, Some(suffix))?;
        Some(self.reference(entry))
    }

    fn lookup(&self, value: &str, namespaces: &[&str], suffix: Option<&str>) -> Option<&ThemeEntry> {
        let escaped = escape_key(value);
        for namespace in namespaces {
            for key in [value, escaped.as_str()] {
                let mut name = if key.is_empty() {
                    (*namespace).to_string()
                } else {
                    format!("{}-{}", namespace, key)
                };
                if let Some(suffix) = suffix {
                    name.push_str("--");
                    name.push_str(suffix);
                }
                if let Some(entry) = self.get(&name) {
                    return Some(entry);
                }
            }
        }
        None
    }

    fn reference(&self, entry: &ThemeEntry) -> String {
        if entry.options.inline {
            // Inline values leave no `var()` behind to track.
            self.mark_used(&entry.name);
            entry.value.clone()
        } else {
            format!("var({})", entry.name)
        }
    }

    pub fn mark_used(&self, name: &str) {
        if self.used.borrow().contains(name) {
            return;
        }
        self.used.borrow_mut().insert(name.to_string());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.borrow().contains(name)
    }

    pub fn used_variables(&self) -> BTreeSet<String> {
        self.used.borrow().clone()
    }

    /// Entries that belong in the emitted `:root` block. In tree-shaken mode
    /// that is static entries, used entries, and everything they reference.
    pub fn emitted_entries(&self, tree_shake: bool) -> Vec<&ThemeEntry> {
        let emittable = |entry: &ThemeEntry| {
            !entry.options.reference && !entry.options.inline && entry.value != "initial"
        };
        if !tree_shake {
            return self.entries.iter().filter(|entry| emittable(entry)).collect();
        }

        let used = self.used.borrow();
        let mut included = BTreeSet::<usize>::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.options.always_emit || used.contains(&entry.name) {
                included.insert(idx);
            }
        }

        loop {
            let mut changed = false;
            let current = included.iter().copied().collect::<Vec<_>>();
            for idx in current {
                for referenced in extract_variable_names(&self.entries[idx].value) {
                    if let Some(&referenced_idx) = self.index.get(&referenced) {
                        if included.insert(referenced_idx) {
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        self.entries
            .iter()
            .enumerate()
            .filter(|(idx, entry)| included.contains(idx) && emittable(entry))
            .map(|(_, entry)| entry)
            .collect()
    }

    /// The `:root, :host` block followed by keyframes named by emitted
    /// `--animate-*` values.
    pub fn to_nodes(&self, tree_shake: bool) -> Vec<Node> {
        let entries = self.emitted_entries(tree_shake);
        let mut nodes = Vec::new();
        if !entries.is_empty() {
            nodes.push(Node::rule(
                ":root, :host",
                entries
                    .iter()
                    .map(|entry| Node::decl(entry.name.as_str(), entry.value.as_str()))
                    .collect(),
            ));
        }

        let animation_names = if tree_shake {
            let mut names = BTreeSet::new();
            for entry in &entries {
                if entry.name.starts_with("--animate-") {
                    names.extend(parse_animation_names(&entry.value));
                }
            }
            // Inline animations never reach `:root` but still need keyframes.
            for entry in &self.entries {
                if entry.options.inline
                    && entry.name.starts_with("--animate-")
                    && self.is_used(&entry.name)
                {
                    names.extend(parse_animation_names(&entry.value));
                }
            }
            Some(names)
        } else {
            None
        };

        nodes.extend(
            self.keyframes
                .iter()
                .filter(|keyframes| {
                    animation_names
                        .as_ref()
                        .is_none_or(|names| names.contains(&keyframes.name))
                })
                .map(|keyframes| keyframes.node.clone()),
        );
        nodes
    }
}

/// Applies an opacity to a colour value.
///
/// Numeric alphas are fractions (`0.5` → `50%`); `100%` leaves the value
/// untouched.
pub fn with_alpha(value: &str, alpha: &str) -> String {
    let alpha = alpha.trim();
    if alpha.is_empty() {
        return value.to_string();
    }
    let alpha = match alpha.parse::<f64>() {
        Ok(number) if number.is_finite() => format!("{}%", format_number(number * 100.0)),
        _ => alpha.to_string(),
    };
    if alpha == "100%" {
        return value.to_string();
    }
    format!("color-mix(in oklab, {} {}, transparent)", value, alpha)
}

static TRAILING_ALPHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*/\s*[0-9]*\.?[0-9]+%?\s*\)$").expect("valid trailing alpha regex")
});

/// Replaces the alpha channel of a colour function instead of combining with
/// it: `rgb(0 0 0 / 25%)` with `50%` mixes `rgb(0 0 0)` at 50%.
pub fn replace_alpha(value: &str, alpha: &str) -> String {
    let stripped = TRAILING_ALPHA.replace(value, ")");
    with_alpha(&stripped, alpha)
}

pub fn format_number(number: f64) -> String {
    let rounded = (number * 1_000_000.0).round() / 1_000_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

/// Names referenced through `var(--name)` in `css`, in order of appearance.
pub fn extract_variable_names(css: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut cursor = 0usize;

    while let Some(rel) = css[cursor..].find("var(") {
        let mut name_start = cursor + rel + "var(".len();
        while let Some(ch) = css[name_start..].chars().next() {
            if !ch.is_whitespace() {
                break;
            }
            name_start += ch.len_utf8();
        }

        if css[name_start..].starts_with("--") {
            let mut end = name_start;
            while let Some(ch) = css[end..].chars().next() {
                if ch == ',' || ch == ')' || ch.is_whitespace() {
                    break;
                }
                end += ch.len_utf8();
            }
            vars.push(css[name_start..end].to_string());
        }

        cursor += rel + "var(".len();
    }

    vars
}

fn parse_animation_names(value: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for entry in split_top_level_commas(value) {
        let Some(first) = entry.split_whitespace().next() else {
            continue;
        };
        if first != "none" && !first.contains('(') {
            names.insert(first.to_string());
        }
    }
    names
}

fn split_top_level_commas(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in value.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(value[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < value.len() {
        parts.push(value[start..].trim());
    }
    parts
}

fn escape_key(key: &str) -> String {
    key.replace('.', "\\.")
}

fn unescape_key(key: &str) -> String {
    key.replace("\\.", ".")
}

fn normalize_theme_path(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    if path.starts_with("--") {
        return Some(path.to_string());
    }

    let mut segments = path.split('.').filter(|segment| !segment.is_empty());
    let first = segments.next()?;
    let namespace = match first {
        "colors" => "color".to_string(),
        "screens" => "breakpoint".to_string(),
        "fontSize" => "text".to_string(),
        "fontFamily" => "font".to_string(),
        "borderRadius" => "radius".to_string(),
        "lineHeight" => "leading".to_string(),
        "letterSpacing" => "tracking".to_string(),
        "boxShadow" => "shadow".to_string(),
        "animation" => "animate".to_string(),
        other => kebab_case(other),
    };
    let mut name = format!("--{}", namespace);
    for segment in segments {
        if segment == "DEFAULT" {
            continue;
        }
        name.push('-');
        name.push_str(&escape_key(segment));
    }
    Some(name)
}

fn kebab_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
