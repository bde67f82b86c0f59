//! Utility-class CSS compiler core.
//!
//! Class names such as `hover:bg-red-500/50` are parsed into candidates,
//! compiled against a theme and a registry of utilities and variants, and
//! printed as CSS. A [`DesignSystem`] memoizes every stage.

pub mod ast;
pub mod cache;
pub mod candidate;
pub mod compile;
pub mod config;
pub mod css;
pub mod design_system;
pub mod generator;
pub mod stylesheet;
pub mod theme;
pub mod utilities;
pub mod variants;

pub use ast::Node;
pub use candidate::{Candidate, CandidateModifier, CandidateValue};
pub use compile::CompileFlags;
pub use css::{CssFormatter, StyleRule, to_css, to_css_minified};
pub use design_system::{ApplyError, DesignSystem, SortKey};
pub use generator::{GenerationResult, GeneratorConfig, generate, generate_with_config};
pub use stylesheet::{Stylesheet, load_design_system};
pub use theme::{Theme, ThemeOptions};
pub use utilities::{Utilities, UtilityArgs};
pub use variants::{Variant, VariantValue, Variants};
