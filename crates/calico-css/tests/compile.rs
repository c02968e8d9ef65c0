//! End-to-end compile pipeline tests: parse, transform, print.

use std::collections::HashMap;
use std::io::Write;

use calico_css::prelude::*;
use calico_css::targets::version;

/// Route recovery warnings through the test writer so failures show them.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

fn compile(css: &str, targets: Option<&str>, minify: bool) -> ToCssResult {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default()).expect("parse failed");
    sheet
        .transform(&TransformOptions {
            targets: targets.map(|q| Browsers::from_query(q).expect("bad query")),
            ..TransformOptions::default()
        })
        .expect("transform failed");
    sheet
        .to_css(PrinterOptions {
            minify,
            ..PrinterOptions::default()
        })
        .expect("print failed")
}

#[test]
fn test_roundtrip_without_transform() {
    let sheet = StyleSheet::parse(
        "@media (min-width: 600px) {\n  .a {\n    color: red;\n  }\n}\n",
        ParserOptions::default(),
    )
    .unwrap();
    let result = sheet.to_css(PrinterOptions::default()).unwrap();
    assert_eq!(
        result.code,
        "@media (min-width: 600px) {\n  .a {\n    color: red;\n  }\n}\n"
    );
}

#[test]
fn test_unknown_constructs_are_preserved() {
    let result = compile(
        "@font-face { font-family: Test; src: url(\"t.woff2\") }\n.a { scrollbar-gutter: stable both-edges }",
        None,
        true,
    );
    assert!(result.code.contains("@font-face"));
    assert!(result.code.contains("scrollbar-gutter:stable both-edges"));
}

#[test]
fn test_color_downlevel_for_old_targets() {
    let result = compile(
        ".a { color: oklch(0.628 0.258 29.23) }",
        Some("safari >= 12"),
        true,
    );
    // oklch(0.628 0.258 29.23) is sRGB red.
    assert!(!result.code.contains("oklch"));
    assert!(result.code.starts_with(".a{color:#f"));
}

#[test]
fn test_modern_targets_keep_modern_colors() {
    let result = compile(
        ".a { color: oklch(0.628 0.258 29.23) }",
        Some("chrome >= 120"),
        true,
    );
    assert!(result.code.contains("oklch("));
}

#[test]
fn test_vendor_prefixes_precede_original() {
    let result = compile(".a { user-select: none }", Some("ie 11"), true);
    let webkit = result.code.find("-webkit-user-select").unwrap();
    let unprefixed = result.code.rfind("user-select").unwrap();
    assert!(webkit < unprefixed);
}

#[test]
fn test_placeholder_rules_duplicated() {
    let result = compile("input::placeholder { color: gray }", Some("ie 11"), false);
    assert!(result.code.contains("::-webkit-input-placeholder"));
    assert!(result.code.contains("::-moz-placeholder"));
    assert!(result.code.contains(":-ms-input-placeholder"));
    // Standard form last so it wins when supported.
    let standard = result.code.rfind("input::placeholder").unwrap();
    assert!(result.code.find("::-webkit-input-placeholder").unwrap() < standard);
}

#[test]
fn test_unclosed_block_is_a_parse_error() {
    let err = StyleSheet::parse(".a{", ParserOptions::default()).unwrap_err();
    match err {
        Error::Parse { line, column, .. } => {
            assert_eq!((line, column), (1, 3));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_malformed_rule_recovers_with_warning() {
    init_logging();
    let sheet = StyleSheet::parse(
        ".ok { color: red }\n!!! { color: green }\n.also-ok { margin: 0 }",
        ParserOptions::default(),
    )
    .unwrap();
    assert!(!sheet.warnings().is_empty());
    let result = sheet.to_css(PrinterOptions::default()).unwrap();
    assert!(result.code.contains(".ok"));
    assert!(result.code.contains(".also-ok"));
}

#[test]
fn test_minify_merges_adjacent_rules_only() {
    let result = compile(
        ".a { color: red } .b { color: red } .x { margin: 0 } .c { color: red }",
        None,
        true,
    );
    assert_eq!(result.code, ".a,.b{color:red}.x{margin:0}.c{color:red}");
}

#[test]
fn test_important_survives_minify() {
    let result = compile(".a { color: red !important }", None, true);
    assert_eq!(result.code, ".a{color:red!important}");
}

#[test]
fn test_pseudo_class_substitution() {
    let sheet = StyleSheet::parse(".a:hover { color: red }", ParserOptions::default()).unwrap();
    let mut pseudo_classes = HashMap::new();
    pseudo_classes.insert("hover".to_string(), ".is-hover".to_string());
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            pseudo_classes,
            ..PrinterOptions::default()
        })
        .unwrap();
    assert_eq!(result.code, ".a.is-hover{color:red}");
}

#[test]
fn test_source_map_points_at_rules() {
    let sheet = StyleSheet::parse(
        ".a { color: red }\n.b { margin: 0 }",
        ParserOptions {
            filename: "in.css".into(),
            ..ParserOptions::default()
        },
    )
    .unwrap();
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: true,
            ..PrinterOptions::default()
        })
        .unwrap();
    let map = result.map.unwrap();
    assert!(map.contains("\"sources\":[\"in.css\"]"));
    assert!(map.contains("\"sourcesContent\":[\".a { color: red }"));
    // Minified output is a single line, so every mapping lands on line 0.
    assert!(!map.contains("\"mappings\":\"\""));
}

#[test]
fn test_unused_symbol_elimination() {
    let mut sheet = StyleSheet::parse(
        ".keep { color: red } .drop { color: blue }",
        ParserOptions::default(),
    )
    .unwrap();
    sheet
        .transform(&TransformOptions {
            unused_symbols: ["drop".to_string()].into_iter().collect(),
            ..TransformOptions::default()
        })
        .unwrap();
    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .unwrap();
    assert_eq!(result.code, ".keep{color:red}");
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, ".a {{ color: red }}").unwrap();

    let sheet = StyleSheet::from_file(file.path(), ParserOptions::default()).unwrap();
    assert_eq!(sheet.filename, file.path().display().to_string());
    let result = sheet.to_css(PrinterOptions::default()).unwrap();
    assert!(result.code.contains("color: red"));
}

#[test]
fn test_from_file_missing_path_is_io_error() {
    let err =
        StyleSheet::from_file("/nonexistent/styles.css", ParserOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_target_query_forms() {
    init_logging();
    let targets = Browsers::from_query("chrome >= 100, not ie").unwrap();
    assert_eq!(targets.chrome, Some(version(100, 0, 0)));
    assert_eq!(targets.ie, None);

    assert!(Browsers::from_query("made-up-browser 9").is_err());
}

#[test]
fn test_hsl_is_left_alone() {
    // hsl() is legacy-safe; no conversion even for old targets.
    let result = compile(".a { color: hsl(120, 50%, 40%) }", Some("ie 11"), true);
    assert!(result.code.contains("hsl("));
}
