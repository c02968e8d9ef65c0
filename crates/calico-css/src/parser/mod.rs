//! The CSS parser.
//!
//! Tokenizes the input first to surface lexical diagnostics, then drives
//! `cssparser` over the same buffer to build the rule tree. Parse errors in
//! individual rules and declarations are recovered: the offending construct
//! is skipped with a warning and parsing continues. The one fatal syntax
//! error is a block left open at end of input.

mod selector;
mod value;

use std::fmt;

use cssparser::{Delimiter, Parser, ParserInput, Token};

use crate::error::{line_col, Error, Result};
use crate::rules::keyframes::{Keyframe, KeyframeSelector, KeyframesRule};
use crate::rules::style::{Declaration, StyleRule};
use crate::rules::{CssRule, ImportRule, Location, MediaRule, SupportsRule, UnknownAtRule};
use crate::tokenizer::{tokenize, SpannedToken, Token as OwnedToken};
use crate::values::{TokenOrValue, Value};
use crate::vendor_prefix::VendorPrefix;

type CssParseError<'i> = cssparser::ParseError<'i, ()>;

/// Options controlling parsing.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// The stylesheet filename, used in diagnostics, source maps, and
    /// scoped-name generation.
    pub filename: String,
    /// Enable CSS Modules semantics: class and keyframes names become local
    /// bindings, and `composes` is recognized.
    pub css_modules: bool,
    /// Scoped-name pattern. Defaults to `[hash]_[local]` when unset.
    pub css_modules_pattern: Option<String>,
    /// Also scope `--dashed` identifiers (custom properties).
    pub css_modules_dashed_idents: bool,
}

/// A recoverable diagnostic produced while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.column)
    }
}

fn location(input: &Parser<'_, '_>) -> Location {
    let loc = input.current_source_location();
    // cssparser lines are 0-indexed, columns 1-indexed.
    Location::new(loc.line + 1, loc.column)
}

/// Parse a stylesheet into a rule list plus recoverable warnings.
pub(crate) fn parse_stylesheet(
    source: &str,
    options: &ParserOptions,
) -> Result<(Vec<CssRule>, Vec<Warning>)> {
    // A lexical pre-pass catches structural problems cssparser papers over
    // (it silently closes open blocks at end of input).
    let stream = tokenize(source);
    if let Some(span) = stream.unclosed_block() {
        let (line, column) = line_col(source, span.start as usize);
        return Err(Error::parse("unclosed block", line, column));
    }
    let mut warnings: Vec<Warning> = stream
        .warnings()
        .iter()
        .map(|w| {
            let (line, column) = line_col(source, w.span.start as usize);
            Warning {
                message: w.to_string(),
                line,
                column,
            }
        })
        .collect();

    let mut parser_input = ParserInput::new(source);
    let mut parser = Parser::new(&mut parser_input);
    let rules = parse_rule_list(&mut parser, options, &mut warnings, true);
    Ok((rules, warnings))
}

fn parse_rule_list(
    input: &mut Parser<'_, '_>,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
    top_level: bool,
) -> Vec<CssRule> {
    let mut rules = Vec::new();
    loop {
        input.skip_whitespace();
        if input.is_exhausted() {
            break;
        }

        let loc = location(input);
        let state = input.state();
        let token = match input.next() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            // Legacy HTML comment delimiters are allowed between top-level
            // rules.
            Token::CDO | Token::CDC if top_level => continue,
            Token::AtKeyword(name) => {
                let name = name.to_string();
                match parse_at_rule(input, &name, loc, options, warnings) {
                    Ok(rule) => rules.push(rule),
                    Err(message) => {
                        warn(warnings, message, loc);
                        skip_to_next_rule(input);
                    }
                }
            }
            _ => {
                input.reset(&state);
                match parse_style_rule(input, loc, options, warnings) {
                    Ok(rule) => rules.push(rule),
                    Err(message) => {
                        warn(warnings, message, loc);
                        skip_to_next_rule(input);
                    }
                }
            }
        }
    }
    rules
}

fn warn(warnings: &mut Vec<Warning>, message: String, loc: Location) {
    tracing::warn!(line = loc.line, column = loc.column, "{message}");
    warnings.push(Warning {
        message,
        line: loc.line,
        column: loc.column,
    });
}

/// Skip past the current malformed rule: through its block if it has one,
/// or past the next semicolon.
fn skip_to_next_rule(input: &mut Parser<'_, '_>) {
    loop {
        match input.next() {
            Ok(Token::CurlyBracketBlock) => {
                let _ = input.parse_nested_block(|nested| {
                    while nested.next().is_ok() {}
                    Ok::<_, CssParseError<'_>>(())
                });
                return;
            }
            Ok(Token::Semicolon) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

fn parse_at_rule(
    input: &mut Parser<'_, '_>,
    name: &str,
    loc: Location,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<CssRule, String> {
    let (prefix, base) = VendorPrefix::split(name);
    match base.to_ascii_lowercase().as_str() {
        "media" => {
            let query = parse_prelude(input)
                .map_err(|_| "invalid @media prelude".to_string())?;
            let rules = parse_block_rules(input, options, warnings)
                .map_err(|_| "expected '{' after @media prelude".to_string())?;
            Ok(CssRule::Media(MediaRule { query, rules, loc }))
        }
        "supports" => {
            let condition = parse_prelude(input)
                .map_err(|_| "invalid @supports prelude".to_string())?;
            let rules = parse_block_rules(input, options, warnings)
                .map_err(|_| "expected '{' after @supports prelude".to_string())?;
            Ok(CssRule::Supports(SupportsRule {
                condition,
                rules,
                loc,
            }))
        }
        "keyframes" => parse_keyframes(input, prefix, loc, options, warnings)
            .map_err(|_| "invalid @keyframes rule".to_string()),
        "import" => parse_import(input, loc).map_err(|_| "invalid @import rule".to_string()),
        _ => parse_unknown_at_rule(input, name, loc)
            .map_err(|_| format!("invalid @{name} rule")),
    }
}

/// Raw tokens up to the opening `{` of an at-rule.
fn parse_prelude<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<crate::values::TokenList, CssParseError<'i>> {
    input.parse_until_before(Delimiter::CurlyBracketBlock, value::parse_token_list)
}

fn parse_block_rules<'i>(
    input: &mut Parser<'i, '_>,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<Vec<CssRule>, CssParseError<'i>> {
    match input.next() {
        Ok(Token::CurlyBracketBlock) => input.parse_nested_block(|nested| {
            Ok(parse_rule_list(nested, options, warnings, false))
        }),
        _ => Err(input.new_custom_error(())),
    }
}

fn parse_style_rule(
    input: &mut Parser<'_, '_>,
    loc: Location,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<CssRule, String> {
    let selectors = input
        .parse_until_before(Delimiter::CurlyBracketBlock, selector::parse_selector_list)
        .map_err(|_| "invalid selector".to_string())?;

    let declarations = match input.next() {
        Ok(Token::CurlyBracketBlock) => input
            .parse_nested_block(|nested| {
                Ok::<_, CssParseError<'_>>(parse_declarations(nested, options, warnings))
            })
            .map_err(|_| "invalid declaration block".to_string())?,
        _ => return Err("expected '{' after selector".to_string()),
    };

    Ok(CssRule::Style(StyleRule {
        selectors,
        declarations,
        loc,
    }))
}

fn parse_declarations(
    input: &mut Parser<'_, '_>,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    loop {
        input.skip_whitespace();
        while input.try_parse(Parser::expect_semicolon).is_ok() {
            input.skip_whitespace();
        }
        if input.is_exhausted() {
            break;
        }

        let loc = location(input);
        let result = input.parse_until_after(Delimiter::Semicolon, |i| {
            parse_declaration(i, loc, options).map_err(|_| i.new_custom_error::<(), ()>(()))
        });
        match result {
            Ok(declaration) => declarations.push(declaration),
            Err(_) => warn(warnings, "invalid declaration".to_string(), loc),
        }
    }
    declarations
}

fn parse_declaration<'i>(
    input: &mut Parser<'i, '_>,
    loc: Location,
    options: &ParserOptions,
) -> std::result::Result<Declaration, CssParseError<'i>> {
    let start = input.position().byte_index();
    let name = input.expect_ident()?.to_string();
    input.expect_colon()?;
    input.skip_whitespace();

    let is_custom = name.starts_with("--");
    let property = if is_custom {
        name
    } else {
        name.to_ascii_lowercase()
    };

    if is_custom {
        // Custom property values are raw token runs, preserved verbatim.
        let mut tokens = input.parse_until_before(Delimiter::Bang, value::parse_token_list)?;
        let important = parse_important(input)?;
        // A custom property must not be empty.
        if tokens.is_empty() {
            return Err(input.new_custom_error(()));
        }
        strip_trailing_whitespace(&mut tokens);
        return Ok(Declaration {
            property,
            value: Value::Tokens(tokens),
            important,
            loc,
        });
    }

    if property == "composes" && options.css_modules {
        let composes = value::parse_composes(input, start)?;
        return Ok(Declaration {
            property,
            value: Value::Composes(composes),
            important: false,
            loc,
        });
    }

    let value =
        input.parse_until_before(Delimiter::Bang, value::parse_declaration_value)?;
    let important = parse_important(input)?;
    Ok(Declaration {
        property,
        value,
        important,
        loc,
    })
}

fn parse_important<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<bool, CssParseError<'i>> {
    if input.is_exhausted() {
        return Ok(false);
    }
    input.expect_delim('!')?;
    input.expect_ident_matching("important")?;
    input.skip_whitespace();
    if !input.is_exhausted() {
        return Err(input.new_custom_error(()));
    }
    Ok(true)
}

fn strip_trailing_whitespace(tokens: &mut crate::values::TokenList) {
    while matches!(
        tokens.0.last(),
        Some(TokenOrValue::Token(SpannedToken {
            token: OwnedToken::WhiteSpace(_),
            ..
        }))
    ) {
        tokens.0.pop();
    }
}

fn parse_keyframes<'i>(
    input: &mut Parser<'i, '_>,
    vendor_prefix: VendorPrefix,
    loc: Location,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<CssRule, CssParseError<'i>> {
    let location = input.current_source_location();
    let name = match input.next()? {
        Token::Ident(name) => name.to_string(),
        Token::QuotedString(name) => name.to_string(),
        _ => return Err(location.new_custom_error(())),
    };

    match input.next() {
        Ok(Token::CurlyBracketBlock) => {}
        _ => return Err(input.new_custom_error(())),
    }
    let keyframes = input.parse_nested_block(|nested| {
        Ok::<_, CssParseError<'_>>(parse_keyframe_list(nested, options, warnings))
    })?;

    Ok(CssRule::Keyframes(KeyframesRule {
        name,
        keyframes,
        vendor_prefix,
        loc,
    }))
}

fn parse_keyframe_list(
    input: &mut Parser<'_, '_>,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> Vec<Keyframe> {
    let mut keyframes = Vec::new();
    loop {
        input.skip_whitespace();
        if input.is_exhausted() {
            break;
        }
        let loc = location(input);
        match parse_keyframe(input, loc, options, warnings) {
            Ok(keyframe) => keyframes.push(keyframe),
            Err(_) => {
                warn(warnings, "invalid keyframe".to_string(), loc);
                skip_to_next_rule(input);
            }
        }
    }
    keyframes
}

fn parse_keyframe<'i>(
    input: &mut Parser<'i, '_>,
    loc: Location,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<Keyframe, CssParseError<'i>> {
    let mut selectors = vec![parse_keyframe_selector(input)?];
    while input.try_parse(Parser::expect_comma).is_ok() {
        selectors.push(parse_keyframe_selector(input)?);
    }

    match input.next() {
        Ok(Token::CurlyBracketBlock) => {}
        _ => return Err(input.new_custom_error(())),
    }
    let declarations = input.parse_nested_block(|nested| {
        Ok::<_, CssParseError<'_>>(parse_declarations(nested, options, warnings))
    })?;

    Ok(Keyframe {
        selectors,
        declarations,
        loc,
    })
}

fn parse_keyframe_selector<'i>(
    input: &mut Parser<'i, '_>,
) -> std::result::Result<KeyframeSelector, CssParseError<'i>> {
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Ident(name) if name.eq_ignore_ascii_case("from") => Ok(KeyframeSelector::From),
        Token::Ident(name) if name.eq_ignore_ascii_case("to") => Ok(KeyframeSelector::To),
        Token::Percentage { unit_value, .. } => Ok(KeyframeSelector::Percentage(unit_value)),
        _ => Err(location.new_custom_error(())),
    }
}

fn parse_import<'i>(
    input: &mut Parser<'i, '_>,
    loc: Location,
) -> std::result::Result<CssRule, CssParseError<'i>> {
    let location = input.current_source_location();
    let url = match input.next()?.clone() {
        Token::QuotedString(url) | Token::UnquotedUrl(url) => url.to_string(),
        Token::Function(name) if name.eq_ignore_ascii_case("url") => {
            input.parse_nested_block(|nested| {
                Ok::<_, CssParseError<'_>>(nested.expect_string()?.to_string())
            })?
        }
        _ => return Err(location.new_custom_error(())),
    };
    let media = input.parse_until_before(Delimiter::Semicolon, value::parse_token_list)?;
    let _ = input.try_parse(Parser::expect_semicolon);
    Ok(CssRule::Import(ImportRule { url, media, loc }))
}

fn parse_unknown_at_rule<'i>(
    input: &mut Parser<'i, '_>,
    name: &str,
    loc: Location,
) -> std::result::Result<CssRule, CssParseError<'i>> {
    let prelude = input.parse_until_before(
        Delimiter::Semicolon | Delimiter::CurlyBracketBlock,
        value::parse_token_list,
    )?;
    let block = match input.next() {
        Ok(Token::CurlyBracketBlock) => {
            Some(input.parse_nested_block(value::parse_token_list)?)
        }
        Ok(Token::Semicolon) | Err(_) => None,
        Ok(_) => return Err(input.new_custom_error(())),
    };
    Ok(CssRule::Unknown(UnknownAtRule {
        name: name.to_string(),
        prelude,
        block,
        loc,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{Component, PseudoClass};
    use crate::values::CssColor;

    fn parse(css: &str) -> (Vec<CssRule>, Vec<Warning>) {
        parse_stylesheet(css, &ParserOptions::default()).expect("stylesheet should parse")
    }

    fn parse_modules(css: &str) -> (Vec<CssRule>, Vec<Warning>) {
        let options = ParserOptions {
            css_modules: true,
            ..ParserOptions::default()
        };
        parse_stylesheet(css, &options).expect("stylesheet should parse")
    }

    #[test]
    fn simple_rule() {
        let (rules, warnings) = parse(".a { color: red; }");
        assert!(warnings.is_empty());
        match &rules[0] {
            CssRule::Style(rule) => {
                assert_eq!(rule.declarations.len(), 1);
                assert_eq!(rule.declarations[0].property, "color");
                assert_eq!(rule.loc, Location::new(1, 1));
            }
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_block_is_fatal() {
        let err = parse_stylesheet(".a{", &ParserOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn bad_rule_is_skipped_with_warning() {
        let (rules, warnings) = parse(". { color: red; }\n.ok { color: blue; }");
        assert_eq!(rules.len(), 1);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn bad_declaration_is_skipped() {
        let (rules, warnings) = parse(".a { color red; margin: 0 }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert_eq!(rule.declarations.len(), 1);
                assert_eq!(rule.declarations[0].property, "margin");
            }
            other => panic!("expected style rule, got {other:?}"),
        }
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn important_flag() {
        let (rules, _) = parse(".a { color: red !important }");
        match &rules[0] {
            CssRule::Style(rule) => assert!(rule.declarations[0].important),
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn media_rule_nests() {
        let (rules, _) = parse("@media (min-width: 600px) { .a { color: red } }");
        match &rules[0] {
            CssRule::Media(media) => {
                assert_eq!(media.rules.len(), 1);
                assert!(!media.query.is_empty());
            }
            other => panic!("expected media rule, got {other:?}"),
        }
    }

    #[test]
    fn keyframes_rule() {
        let (rules, _) =
            parse("@keyframes spin { from { opacity: 0 } 50% { opacity: 0.5 } to { opacity: 1 } }");
        match &rules[0] {
            CssRule::Keyframes(kf) => {
                assert_eq!(kf.name, "spin");
                assert_eq!(kf.keyframes.len(), 3);
                assert_eq!(kf.vendor_prefix, VendorPrefix::None);
            }
            other => panic!("expected keyframes, got {other:?}"),
        }
    }

    #[test]
    fn prefixed_keyframes() {
        let (rules, _) = parse("@-webkit-keyframes spin { }");
        match &rules[0] {
            CssRule::Keyframes(kf) => assert_eq!(kf.vendor_prefix, VendorPrefix::WebKit),
            other => panic!("expected keyframes, got {other:?}"),
        }
    }

    #[test]
    fn import_rule() {
        let (rules, _) = parse("@import \"base.css\" screen;");
        match &rules[0] {
            CssRule::Import(import) => {
                assert_eq!(import.url, "base.css");
                assert!(!import.media.is_empty());
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn unknown_at_rule_is_carried() {
        let (rules, warnings) = parse("@font-face { font-family: X; src: url(\"x.woff2\") }");
        assert!(warnings.is_empty());
        match &rules[0] {
            CssRule::Unknown(rule) => {
                assert_eq!(rule.name, "font-face");
                assert!(rule.block.is_some());
            }
            other => panic!("expected unknown at-rule, got {other:?}"),
        }
    }

    #[test]
    fn composes_requires_modules_flag() {
        let (rules, _) = parse_modules(".b { composes: a; color: red }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert!(matches!(rule.declarations[0].value, Value::Composes(_)));
            }
            other => panic!("expected style rule, got {other:?}"),
        }

        // Without the flag, composes is an ordinary unknown declaration.
        let (rules, _) = parse(".b { composes: a }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert!(!matches!(rule.declarations[0].value, Value::Composes(_)));
            }
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn custom_property_preserved() {
        let (rules, _) = parse(":root { --Main-Color: #abcdef }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert_eq!(rule.declarations[0].property, "--Main-Color");
                assert!(matches!(rule.declarations[0].value, Value::Tokens(_)));
            }
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn modern_color_parses_typed() {
        let (rules, _) = parse(".a { color: oklch(0.7 0.1 150) }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert!(matches!(
                    rule.declarations[0].value,
                    Value::Color(CssColor::Oklch { .. })
                ));
            }
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn global_pseudo_parses() {
        let (rules, _) = parse_modules(":global(.raw) { color: red }");
        match &rules[0] {
            CssRule::Style(rule) => {
                assert!(matches!(
                    rule.selectors.0[0].components[0],
                    Component::PseudoClass(PseudoClass::Global(_))
                ));
            }
            other => panic!("expected style rule, got {other:?}"),
        }
    }

    #[test]
    fn cdo_cdc_skipped_at_top_level() {
        let (rules, warnings) = parse("<!-- .a { color: red } -->");
        assert_eq!(rules.len(), 1);
        assert!(warnings.is_empty());
    }
}
