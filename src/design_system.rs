use crate::ast::{Node, mark_important, walk_declarations};
use crate::cache::Cache;
use crate::candidate::{Candidate, parse_candidate};
use crate::compile::{CompileFlags, compile_candidate, wrap_in_class};
use crate::css::to_css;
use crate::theme::{Theme, extract_variable_names};
use crate::utilities::{Utilities, default_utilities};
use crate::variants::{Variant, Variants, default_variants};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("cannot apply unknown utility class `{0}`")]
    UnknownUtility(String),
}

/// Document position of a utility: variant registration order (outermost
/// first), then utility registration order, then the class name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    variants: Vec<usize>,
    utility: usize,
    raw: String,
}

/// Owns the theme and the sealed registries, and memoizes every stage from
/// class name to CSS text.
///
/// All caches grow monotonically for the lifetime of the value. Interior
/// mutability makes this type `!Sync`; build one per thread or request.
#[derive(Debug)]
pub struct DesignSystem {
    theme: Theme,
    utilities: Utilities,
    variants: Variants,
    variant_cache: Cache<String, Option<Variant>>,
    candidate_cache: Cache<String, Rc<[Candidate]>>,
    ast_cache: Cache<(CompileFlags, Candidate), Rc<Vec<Node>>>,
    variable_cache: Cache<String, Rc<BTreeSet<String>>>,
    invalid: RefCell<BTreeSet<String>>,
}

impl DesignSystem {
    pub fn new(theme: Theme, utilities: Utilities, variants: Variants) -> Self {
        Self {
            theme,
            utilities,
            variants,
            variant_cache: Cache::new(),
            candidate_cache: Cache::new(),
            ast_cache: Cache::new(),
            variable_cache: Cache::new(),
            invalid: RefCell::new(BTreeSet::new()),
        }
    }

    /// A design system with the built-in utilities and variants.
    pub fn from_theme(theme: Theme) -> Self {
        let variants = default_variants(&theme);
        Self::new(theme, default_utilities(), variants)
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn utilities(&self) -> &Utilities {
        &self.utilities
    }

    pub fn variants(&self) -> &Variants {
        &self.variants
    }

    pub fn parse_variant(&self, raw: &str) -> Option<Variant> {
        self.variant_cache.get_or_compute(raw, |raw: &str| {
            trace!(variant = raw, "parsing variant");
            self.variants.parse(raw)
        })
    }

    /// Every interpretation of `raw`; empty when it is not a known utility.
    pub fn parse_candidate(&self, raw: &str) -> Rc<[Candidate]> {
        self.candidate_cache.get_or_compute(raw, |raw: &str| {
            trace!(candidate = raw, "parsing candidate");
            let parsed = parse_candidate(raw, &self.utilities, &mut |segment| self.parse_variant(segment));
            if parsed.is_empty() {
                debug!(candidate = raw, "candidate did not parse");
                self.mark_invalid(raw);
            }
            Rc::from(parsed)
        })
    }

    /// The AST for one interpretation: a single rule for the escaped class
    /// selector, or an empty list when the utility produced nothing. Repeated
    /// calls return the same allocation.
    pub fn compile_ast_nodes(&self, candidate: &Candidate, flags: CompileFlags) -> Rc<Vec<Node>> {
        let key = (flags, candidate.clone());
        self.ast_cache.get_or_compute(&key, |(flags, candidate)| {
            trace!(candidate = candidate.raw(), ?flags, "compiling candidate");
            let nodes = compile_candidate(candidate, *flags, &self.theme, &self.utilities, &self.variants)
                .map(|nodes| vec![wrap_in_class(candidate.raw(), nodes)])
                .unwrap_or_default();
            Rc::new(nodes)
        })
    }

    /// CSS for each name in order, `None` for names that do not compile.
    /// One bad name never affects the others.
    pub fn candidates_to_css<S: AsRef<str>>(&self, names: &[S]) -> Vec<Option<String>> {
        names
            .iter()
            .map(|name| self.candidate_to_css(name.as_ref()))
            .collect()
    }

    fn candidate_to_css(&self, raw: &str) -> Option<String> {
        let nodes = self.candidate_nodes(raw)?;
        Some(to_css(&nodes))
    }

    /// The compiled rule for `raw` with its theme variables marked as used.
    pub fn candidate_nodes(&self, raw: &str) -> Option<Rc<Vec<Node>>> {
        if self.is_invalid(raw) {
            return None;
        }
        let nodes = self.compile_raw(raw, CompileFlags::RespectImportant)?;
        walk_declarations(&nodes, &mut |_, value| {
            self.track_used_variables(value);
        });
        Some(nodes)
    }

    /// First interpretation of `raw` that produces output.
    fn compile_raw(&self, raw: &str, flags: CompileFlags) -> Option<Rc<Vec<Node>>> {
        let candidates = self.parse_candidate(raw);
        if candidates.is_empty() {
            return None;
        }
        for candidate in candidates.iter() {
            let nodes = self.compile_ast_nodes(candidate, flags);
            if !nodes.is_empty() {
                return Some(nodes);
            }
        }
        debug!(candidate = raw, "candidate compiled to nothing");
        self.mark_invalid(raw);
        None
    }

    /// Records `var(--*)` references in `css` as used by the theme. Each
    /// distinct text is scanned once.
    pub fn track_used_variables(&self, css: &str) -> Rc<BTreeSet<String>> {
        self.variable_cache.get_or_compute(css, |css: &str| {
            let names = extract_variable_names(css).into_iter().collect::<BTreeSet<_>>();
            for name in &names {
                self.theme.mark_used(name);
            }
            Rc::new(names)
        })
    }

    /// Expands a whitespace-separated class list under `selector`, the way
    /// `@apply` does: `!` markers are ignored, and a `!important` token marks
    /// every declaration.
    pub fn apply(&self, selector: &str, classes: &str) -> Result<Node, ApplyError> {
        let mut important = false;
        let mut children = Vec::new();

        for class in classes.split_whitespace() {
            if class == "!important" {
                important = true;
                continue;
            }
            if self.is_invalid(class) {
                return Err(ApplyError::UnknownUtility(class.to_string()));
            }
            let nodes = self
                .compile_raw(class, CompileFlags::None)
                .ok_or_else(|| ApplyError::UnknownUtility(class.to_string()))?;
            for node in nodes.iter() {
                if let Node::Rule { children: inner, .. } = node {
                    children.extend(inner.iter().cloned());
                }
            }
        }

        if important {
            mark_important(&mut children);
        }
        walk_declarations(&children, &mut |_, value| {
            self.track_used_variables(value);
        });
        Ok(Node::rule(selector, children))
    }

    /// The `:root, :host` block and referenced keyframes.
    pub fn theme_css(&self, tree_shake: bool) -> String {
        to_css(&self.theme.to_nodes(tree_shake))
    }

    pub fn sort_key(&self, raw: &str) -> Option<SortKey> {
        let candidates = self.parse_candidate(raw);
        let candidate = candidates.first()?;
        let variants = candidate
            .variants()
            .iter()
            .map(|variant| self.variants.order(variant))
            .collect();
        let utility = candidate
            .root()
            .and_then(|root| self.utilities.order(root))
            .unwrap_or(self.utilities.len());
        Some(SortKey {
            variants,
            utility,
            raw: raw.to_string(),
        })
    }

    pub fn is_invalid(&self, raw: &str) -> bool {
        self.invalid.borrow().contains(raw)
    }

    pub fn invalid_candidates(&self) -> Vec<String> {
        self.invalid.borrow().iter().cloned().collect()
    }

    fn mark_invalid(&self, raw: &str) {
        if !self.is_invalid(raw) {
            self.invalid.borrow_mut().insert(raw.to_string());
        }
    }

    /// Cache misses for the candidate and AST caches, for diagnostics.
    pub fn cache_misses(&self) -> (usize, usize) {
        (self.candidate_cache.misses(), self.ast_cache.misses())
    }
}
