//! End-to-end CSS Modules tests: scoping, composes, the exports manifest,
//! and the cross-module placeholder protocol.

use calico_css::prelude::*;

fn module_options(pattern: &str) -> ParserOptions {
    ParserOptions {
        filename: "button.module.css".into(),
        css_modules: true,
        css_modules_pattern: Some(pattern.into()),
        ..ParserOptions::default()
    }
}

fn compile_module(css: &str, options: ParserOptions, minify: bool) -> ToCssResult {
    let mut sheet = StyleSheet::parse(css, options).expect("parse failed");
    sheet
        .transform(&TransformOptions::default())
        .expect("transform failed");
    sheet
        .to_css(PrinterOptions {
            minify,
            ..PrinterOptions::default()
        })
        .expect("print failed")
}

#[test]
fn test_scoped_classes_and_exports() {
    let result = compile_module(
        ".a { color: red }\n.b { composes: a; margin: 0 }",
        module_options("p_[local]"),
        true,
    );

    assert_eq!(result.code, ".p_a{color:red}.p_b{margin:0}");
    assert!(!result.code.contains("composes"));

    assert_eq!(result.exports.len(), 2);
    let a = &result.exports[0];
    assert_eq!((a.original.as_str(), a.name.as_str()), ("a", "p_a"));
    assert!(a.composes.is_empty());
    let b = &result.exports[1];
    assert_eq!((b.original.as_str(), b.name.as_str()), ("b", "p_b"));
    assert_eq!(
        b.composes,
        vec![CssModuleReference::Local { name: "p_a".into() }]
    );
}

#[test]
fn test_composes_from_dependency() {
    let result = compile_module(
        ".b { composes: base from \"./base.css\"; color: red }",
        module_options("p_[local]"),
        true,
    );
    let b = result.exports.iter().find(|e| e.original == "b").unwrap();
    assert_eq!(
        b.composes,
        vec![CssModuleReference::Dependency {
            name: "base".into(),
            specifier: "./base.css".into(),
        }]
    );
    // The dependency also surfaces as a reference for the bundler to resolve.
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].specifier, "./base.css");
    assert_eq!(result.references[0].name, "base");
}

#[test]
fn test_composes_global() {
    let result = compile_module(
        ".b { composes: theme from global; color: red }",
        module_options("p_[local]"),
        true,
    );
    let b = result.exports.iter().find(|e| e.original == "b").unwrap();
    assert_eq!(
        b.composes,
        vec![CssModuleReference::Global {
            name: "theme".into()
        }]
    );
}

#[test]
fn test_undefined_composes_warns_and_falls_back_to_global() {
    let mut sheet = StyleSheet::parse(
        ".b { composes: missing; color: red }",
        module_options("p_[local]"),
    )
    .unwrap();
    sheet.transform(&TransformOptions::default()).unwrap();
    assert!(sheet
        .warnings()
        .iter()
        .any(|w| w.to_string().contains("missing")));
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .unwrap();
    let b = result.exports.iter().find(|e| e.original == "b").unwrap();
    assert_eq!(
        b.composes,
        vec![CssModuleReference::Global {
            name: "missing".into()
        }]
    );
}

#[test]
fn test_keyframes_and_animation_scoped_together() {
    let result = compile_module(
        "@keyframes spin { from { rotate: 0deg } to { rotate: 360deg } }\n\
         .s { animation: spin 1s linear }",
        module_options("p_[local]"),
        true,
    );
    assert!(result.code.contains("@keyframes p_spin"));
    assert!(result.code.contains("animation:p_spin 1s linear"));
    let spin = result.exports.iter().find(|e| e.original == "spin").unwrap();
    assert_eq!(spin.name, "p_spin");
}

#[test]
fn test_global_selector_contents_stay_unscoped() {
    let result = compile_module(
        ":global(.reset) { margin: 0 }\n.local { color: red }",
        module_options("p_[local]"),
        true,
    );
    assert!(result.code.contains(".reset{margin:0}"));
    assert!(result.code.contains(".p_local"));
    assert!(result.exports.iter().all(|e| e.original != "reset"));
}

#[test]
fn test_global_class_sharing_a_local_name_stays_unscoped() {
    let result = compile_module(
        ":global(.foo) { margin: 0 }\n.foo { color: red }",
        module_options("p_[local]"),
        true,
    );
    assert!(result.code.contains(".foo{margin:0}"));
    assert!(result.code.contains(".p_foo{color:red}"));
}

#[test]
fn test_exports_preserve_declaration_order() {
    let result = compile_module(
        ".zebra { color: red }\n.apple { color: blue }",
        module_options("p_[local]"),
        true,
    );
    let originals: Vec<&str> = result.exports.iter().map(|e| e.original.as_str()).collect();
    assert_eq!(originals, vec!["zebra", "apple"]);
}

#[test]
fn test_dashed_ident_scoping() {
    let options = ParserOptions {
        css_modules_dashed_idents: true,
        ..module_options("p_[local]")
    };
    let result = compile_module(
        ":root { --accent: red }\n.a { color: var(--accent) }",
        options,
        true,
    );
    assert!(result.code.contains("--p_accent:red"));
    assert!(result.code.contains("var(--p_accent)"));
}

#[test]
fn test_var_from_records_placeholder() {
    let result = compile_module(
        ".a { color: var(--accent from \"./theme.module.css\") }",
        module_options("p_[local]"),
        true,
    );
    assert_eq!(result.references.len(), 1);
    let reference = &result.references[0];
    assert_eq!(reference.specifier, "./theme.module.css");
    assert_eq!(reference.name, "--accent");
    assert!(result
        .code
        .contains(&format!("var(--{})", reference.placeholder)));
}

#[test]
fn test_var_from_placeholder_is_stable_per_reference() {
    let result = compile_module(
        ".a { color: var(--accent from \"./theme.css\") }\n\
         .b { background: var(--accent from \"./theme.css\") }",
        module_options("p_[local]"),
        true,
    );
    // Same (specifier, name) pair resolves to one placeholder.
    assert_eq!(result.references.len(), 1);
}

#[test]
fn test_default_pattern_is_deterministic() {
    let css = ".card { color: red }";
    let options = || ParserOptions {
        filename: "card.module.css".into(),
        css_modules: true,
        ..ParserOptions::default()
    };
    let first = compile_module(css, options(), true);
    let second = compile_module(css, options(), true);
    assert_eq!(first.code, second.code);
    assert_eq!(first.exports, second.exports);

    let card = &first.exports[0];
    assert_eq!(card.original, "card");
    // Default pattern is [hash]_[local]; the hash starts with a letter so
    // the result is always a valid identifier.
    assert!(card.name.starts_with('x'));
    assert!(card.name.ends_with("_card"));
}

#[test]
fn test_different_files_get_different_names() {
    let compile_as = |filename: &str| {
        compile_module(
            ".a { color: red }",
            ParserOptions {
                filename: filename.into(),
                css_modules: true,
                ..ParserOptions::default()
            },
            true,
        )
    };
    let one = compile_as("one.module.css");
    let two = compile_as("two.module.css");
    assert_ne!(one.exports[0].name, two.exports[0].name);
}

#[test]
fn test_name_pattern_uses_file_stem() {
    let result = compile_module(
        ".primary { color: red }",
        ParserOptions {
            filename: "src/button.module.css".into(),
            css_modules: true,
            css_modules_pattern: Some("[name]__[local]".into()),
            ..ParserOptions::default()
        },
        true,
    );
    assert_eq!(result.exports[0].name, "button__primary");
}

#[test]
fn test_invalid_pattern_fails_transform() {
    let mut sheet = StyleSheet::parse(
        ".a { color: red }",
        ParserOptions {
            css_modules: true,
            css_modules_pattern: Some("[bogus]".into()),
            ..ParserOptions::default()
        },
    )
    .unwrap();
    let err = sheet.transform(&TransformOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Pattern(_)));
}

#[test]
fn test_unused_class_removed_but_composed_target_survives() {
    let mut sheet = StyleSheet::parse(
        ".base { color: red }\n.used { composes: base }\n.dead { color: blue }",
        module_options("p_[local]"),
    )
    .unwrap();
    sheet
        .transform(&TransformOptions {
            unused_symbols: ["base".to_string(), "dead".to_string()]
                .into_iter()
                .collect(),
            ..TransformOptions::default()
        })
        .unwrap();
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .unwrap();
    // .base is composed by a surviving class, so it is revived; .dead goes.
    assert!(result.code.contains(".p_base"));
    assert!(result.code.contains(".p_used"));
    assert!(!result.code.contains("dead"));
}

#[test]
fn test_manifest_serializes_to_json() {
    let result = compile_module(
        ".b { composes: base from \"./base.css\"; color: red }",
        module_options("p_[local]"),
        true,
    );
    let json = serde_json::to_string(&result.exports).expect("manifest serializes");
    assert!(json.contains("\"type\":\"dependency\""));
    assert!(json.contains("\"specifier\":\"./base.css\""));
}
