use ironwind::config;
use ironwind::{CompileFlags, DesignSystem, GeneratorConfig, Node, generate, generate_with_config, load_design_system};

#[test]
fn nests_breakpoint_and_pseudo_class_variants() {
    let css = generate(&["md:hover:bg-blue-500"], "");
    assert_eq!(
        css,
        ":root, :host {\n  --color-blue-500: oklch(62.3% 0.214 259.815);\n}\n\n\
         @media (width >= 48rem) {\n  .md\\:hover\\:bg-blue-500:hover {\n    background-color: var(--color-blue-500);\n  }\n}"
    );
}

#[test]
fn plain_utilities_sort_before_variant_utilities() {
    let css = generate(&["hover:flex", "flex"], "");
    assert_eq!(
        css,
        ".flex {\n  display: flex;\n}\n\n.hover\\:flex:hover {\n  display: flex;\n}"
    );
}

#[test]
fn colour_opacity_from_modifier_and_fraction() {
    let css = generate(&["bg-red-500/50", "text-[#0088cc]/[0.25]"], "");
    assert!(css.contains(
        ".bg-red-500\\/50 {\n  background-color: color-mix(in oklab, var(--color-red-500) 50%, transparent);\n}"
    ));
    assert!(css.contains("color: color-mix(in oklab, #0088cc 25%, transparent);"));
}

#[test]
fn animations_pull_in_their_keyframes() {
    let css = generate(&["animate-spin"], "");
    assert!(css.contains("--animate-spin: spin 1s linear infinite;"));
    assert!(css.contains("@keyframes spin {\n  to {\n    transform: rotate(360deg);\n  }\n}"));
    assert!(!css.contains("@keyframes ping"));
}

#[test]
fn inline_animations_pull_in_their_keyframes() {
    let css = generate(
        &["animate-wiggle"],
        "@theme inline { --animate-wiggle: wiggle 1s infinite; @keyframes wiggle { to { opacity: 0; } } }",
    );
    assert!(css.contains(".animate-wiggle {\n  animation: wiggle 1s infinite;\n}"));
    assert!(css.contains("@keyframes wiggle {"));
    assert!(!css.contains("--animate-wiggle"));
}

#[test]
fn stylesheet_directives_feed_generation() {
    let theme_css = r#"
        @theme {
            --color-*: initial;
            --color-ink: #111;
        }
        @custom-variant hocus (&:hover, &:focus);
        @utility card { border-radius: 1rem; padding: 2rem; }
    "#;
    let css = generate(&["hocus:text-ink", "card", "bg-red-500"], theme_css);
    assert!(css.contains("--color-ink: #111;"));
    assert!(css.contains(".hocus\\:text-ink:hover, .hocus\\:text-ink:focus {\n  color: var(--color-ink);\n}"));
    assert!(css.contains(".card {\n  border-radius: 1rem;\n  padding: 2rem;\n}"));
    assert!(!css.contains("bg-red-500"));
}

#[test]
fn compound_variants_accept_bracketed_selectors() {
    let css = generate(&["has-[>img]:flex", "group-[.is-open]:flex", "not-[.x]:flex"], "");
    assert!(css.contains(".has-\\[\\>img\\]\\:flex:has(*>img) {\n  display: flex;\n}"));
    assert!(css.contains(".group-\\[\\.is-open\\]\\:flex:is(:where(.group).is-open *) {"));
    assert!(css.contains(".not-\\[\\.x\\]\\:flex:not(.x) {"));
}

#[test]
fn config_file_drives_output_options() {
    let config = config::from_str(
        r##"
[theme.colors.brand]
500 = "#3b82f6"

[output]
minify = true
"##,
    )
    .expect("config should parse");
    let result = generate_with_config(&["bg-brand-500"], "", &config.generator_config());
    assert_eq!(
        result.css.to_string(),
        ":root, :host{--color-brand-500:#3b82f6}.bg-brand-500{background-color:var(--color-brand-500)}"
    );
    assert_eq!(result.class_count, 1);
}

#[test]
fn important_is_ignored_when_applying() {
    let ds = load_design_system("");
    let candidates = ds.parse_candidate("p-2!");
    let respected = ds.compile_ast_nodes(&candidates[0], CompileFlags::RespectImportant);
    let ignored = ds.compile_ast_nodes(&candidates[0], CompileFlags::None);
    assert_ne!(respected, ignored);
    assert_eq!(
        *ignored,
        vec![Node::rule(".p-2\\!", vec![Node::decl("padding", "calc(var(--spacing) * 2)")])]
    );
}

#[test]
fn one_design_system_serves_many_batches() {
    let ds: DesignSystem = load_design_system("");
    let first = ds.candidates_to_css(&["flex", "w-1/2", "-mt-4"]);
    let second = ds.candidates_to_css(&["w-1/2", "nope"]);
    assert_eq!(first[1], second[0]);
    assert_eq!(second[1], None);
    assert_eq!(
        first[2].as_deref(),
        Some(".-mt-4 {\n  margin-top: calc(var(--spacing) * -4);\n}")
    );
    let result = generate_with_config(&["flex"], "", &GeneratorConfig::default());
    assert_eq!(result.css.to_string(), first[0].clone().unwrap_or_default());
}
