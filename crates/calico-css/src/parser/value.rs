//! Declaration value parsing.
//!
//! Values the compiler models (colors, `var()`, `composes`, single
//! dimensions and keywords) are parsed into typed [`Value`] nodes. Anything
//! else is captured as a raw token run and reprinted untouched. Colors and
//! `var()` references are recognized inside raw runs too, so downleveling
//! and module resolution reach shorthand values.

use cssparser::{Parser, Token};

use crate::tokenizer::{Span, SpannedToken, Token as OwnedToken};
use crate::values::{
    Composes, ComposesFrom, CssColor, Function, Length, Rgba, TokenList, TokenOrValue, Value,
    VarReference,
};

type ParseError<'i> = cssparser::ParseError<'i, ()>;

/// Parse a full (already delimited) declaration value.
pub(crate) fn parse_declaration_value<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Value, ParseError<'i>> {
    if let Ok(value) = input.try_parse(parse_typed_value) {
        return Ok(value);
    }
    Ok(Value::Tokens(parse_token_list(input)?))
}

/// Parse a comma-separated list of single component values. Fails if the
/// value has structure this grammar does not model, in which case the caller
/// falls back to a raw token run.
fn parse_typed_value<'i>(input: &mut Parser<'i, '_>) -> Result<Value, ParseError<'i>> {
    let mut items = vec![parse_component(input)?];
    while input.try_parse(Parser::expect_comma).is_ok() {
        items.push(parse_component(input)?);
    }
    input.skip_whitespace();
    if !input.is_exhausted() {
        return Err(input.new_custom_error(()));
    }
    Ok(if items.len() == 1 {
        items.pop().unwrap()
    } else {
        Value::List(items)
    })
}

fn parse_component<'i>(input: &mut Parser<'i, '_>) -> Result<Value, ParseError<'i>> {
    let start = input.position().byte_index();
    let location = input.current_source_location();
    let token = input.next()?.clone();
    Ok(match token {
        Token::Ident(name) if name.starts_with("--") => Value::DashedIdent(name.to_string()),
        Token::Ident(name) => Value::Ident(name.to_string()),
        Token::Hash(value) | Token::IDHash(value) => match CssColor::parse_hash(&value) {
            Some(color) => Value::Color(color),
            None => return Err(location.new_custom_error(())),
        },
        Token::QuotedString(value) => Value::String(value.to_string()),
        Token::UnquotedUrl(url) => Value::Url(url.to_string()),
        Token::Number { value, .. } => Value::Number(value),
        Token::Percentage { unit_value, .. } => Value::Percentage(unit_value),
        Token::Dimension { value, unit, .. } => Value::Length(Length::new(value, &unit)),
        Token::Function(name) => {
            let name = name.to_string();
            if name.eq_ignore_ascii_case("var") {
                let mut var =
                    input.parse_nested_block(|nested| parse_var_reference(nested, start))?;
                var.span = Span::new(start, input.position().byte_index());
                Value::Var(var)
            } else if name.eq_ignore_ascii_case("url") {
                let url = input.parse_nested_block(|nested| {
                    Ok::<_, ParseError<'i>>(nested.expect_string()?.to_string())
                })?;
                Value::Url(url)
            } else if is_color_function(&name) {
                let color =
                    input.parse_nested_block(|nested| parse_color_function(&name, nested))?;
                Value::Color(color)
            } else {
                let arguments = input.parse_nested_block(parse_token_list)?;
                Value::Function(Function { name, arguments })
            }
        }
        _ => return Err(location.new_custom_error(())),
    })
}

/// Parse a raw token run until the current delimiter or block end.
pub(crate) fn parse_token_list<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<TokenList, ParseError<'i>> {
    let mut list = TokenList::default();
    loop {
        let start = input.position().byte_index();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };
        let span = Span::new(start, input.position().byte_index());

        match &token {
            Token::Function(name) if name.eq_ignore_ascii_case("var") => {
                let mut var =
                    input.parse_nested_block(|nested| parse_var_reference(nested, start))?;
                var.span = Span::new(start, input.position().byte_index());
                list.0.push(TokenOrValue::Var(var));
                continue;
            }
            Token::Function(name) if is_color_function(name) => {
                let name = name.to_string();
                if let Ok(color) = input
                    .try_parse(|i| i.parse_nested_block(|n| parse_color_function(&name, n)))
                {
                    list.0.push(TokenOrValue::Color(color));
                    continue;
                }
            }
            Token::Hash(value) | Token::IDHash(value) => {
                if let Some(color) = CssColor::parse_hash(value) {
                    list.0.push(TokenOrValue::Color(color));
                    continue;
                }
            }
            _ => {}
        }

        if let Some(owned) = OwnedToken::from_css(&token) {
            let is_block = owned.is_block_start();
            let close = match owned {
                OwnedToken::CurlyBracketBlock => OwnedToken::CloseCurlyBracket,
                OwnedToken::SquareBracketBlock => OwnedToken::CloseSquareBracket,
                _ => OwnedToken::CloseParenthesis,
            };
            list.0.push(TokenOrValue::Token(SpannedToken { token: owned, span }));
            if is_block {
                let nested = input.parse_nested_block(parse_token_list)?;
                list.0.extend(nested.0);
                let end = input.position().byte_index();
                list.0.push(TokenOrValue::Token(SpannedToken {
                    token: close,
                    span: Span::new(end.saturating_sub(1), end),
                }));
            }
        }
    }
    trim_whitespace(&mut list);
    Ok(list)
}

fn trim_whitespace(list: &mut TokenList) {
    let is_ws = |item: &TokenOrValue| {
        matches!(
            item,
            TokenOrValue::Token(SpannedToken {
                token: OwnedToken::WhiteSpace(_),
                ..
            })
        )
    };
    while list.0.last().is_some_and(is_ws) {
        list.0.pop();
    }
    if list.0.first().is_some_and(is_ws) {
        list.0.remove(0);
    }
}

/// Parse the contents of a `var(...)` block.
fn parse_var_reference<'i>(
    input: &mut Parser<'i, '_>,
    start: usize,
) -> Result<VarReference, ParseError<'i>> {
    let location = input.current_source_location();
    let name = input.expect_ident()?.to_string();
    if !name.starts_with("--") {
        return Err(location.new_custom_error(()));
    }
    let mut from = None;
    if input
        .try_parse(|i| i.expect_ident_matching("from"))
        .is_ok()
    {
        from = Some(input.expect_string()?.to_string());
    }
    let mut fallback = None;
    if input.try_parse(Parser::expect_comma).is_ok() {
        let tokens = parse_token_list(input)?;
        if !tokens.is_empty() {
            fallback = Some(tokens);
        }
    }
    Ok(VarReference {
        name,
        from,
        fallback,
        span: Span::new(start, start),
    })
}

/// Parse a `composes` declaration value.
pub(crate) fn parse_composes<'i>(
    input: &mut Parser<'i, '_>,
    start: usize,
) -> Result<Composes, ParseError<'i>> {
    let location = input.current_source_location();
    let mut names = Vec::new();
    let mut from = None;
    loop {
        if input.is_exhausted() {
            break;
        }
        let ident = input.expect_ident()?.to_string();
        if ident.eq_ignore_ascii_case("from") {
            let token = input.next()?.clone();
            from = Some(match token {
                Token::QuotedString(specifier) => ComposesFrom::File(specifier.to_string()),
                Token::Ident(keyword) if keyword.eq_ignore_ascii_case("global") => {
                    ComposesFrom::Global
                }
                _ => return Err(location.new_custom_error(())),
            });
            break;
        }
        names.push(ident);
    }
    input.skip_whitespace();
    if names.is_empty() || !input.is_exhausted() {
        return Err(location.new_custom_error(()));
    }
    Ok(Composes {
        names,
        from,
        span: Span::new(start, start),
    })
}

fn is_color_function(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "rgb" | "rgba" | "hsl" | "hsla" | "hwb" | "lab" | "lch" | "oklab" | "oklch" | "color"
    )
}

/// Parse the contents of a color function block.
pub(crate) fn parse_color_function<'i>(
    name: &str,
    input: &mut Parser<'i, '_>,
) -> Result<CssColor, ParseError<'i>> {
    match name.to_ascii_lowercase().as_str() {
        "rgb" | "rgba" => parse_rgb(input),
        "hsl" | "hsla" => parse_hsl(input),
        "hwb" => {
            let h = parse_hue(input)?;
            let w = input.expect_percentage()?;
            let b = input.expect_percentage()?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Hwb { h, w, b, alpha })
        }
        "lab" => {
            let l = parse_number_or_percentage(input, 100.0)?;
            let a = input.expect_number()?;
            let b = input.expect_number()?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Lab { l, a, b, alpha })
        }
        "lch" => {
            let l = parse_number_or_percentage(input, 100.0)?;
            let c = input.expect_number()?;
            let h = parse_hue(input)?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Lch { l, c, h, alpha })
        }
        "oklab" => {
            let l = parse_number_or_percentage(input, 1.0)?;
            let a = input.expect_number()?;
            let b = input.expect_number()?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Oklab { l, a, b, alpha })
        }
        "oklch" => {
            let l = parse_number_or_percentage(input, 1.0)?;
            let c = input.expect_number()?;
            let h = parse_hue(input)?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Oklch { l, c, h, alpha })
        }
        "color" => {
            // Only the srgb color space is modeled; other spaces fall back
            // to a raw token run.
            input.expect_ident_matching("srgb")?;
            let r = parse_number_or_percentage(input, 1.0)?;
            let g = parse_number_or_percentage(input, 1.0)?;
            let b = parse_number_or_percentage(input, 1.0)?;
            let alpha = parse_alpha(input)?;
            Ok(CssColor::Rgba(Rgba::from_floats(r, g, b, alpha)))
        }
        _ => Err(input.new_custom_error(())),
    }
}

fn parse_rgb<'i>(input: &mut Parser<'i, '_>) -> Result<CssColor, ParseError<'i>> {
    let r = parse_rgb_channel(input)?;
    let _ = input.try_parse(Parser::expect_comma);
    let g = parse_rgb_channel(input)?;
    let _ = input.try_parse(Parser::expect_comma);
    let b = parse_rgb_channel(input)?;
    let alpha = parse_alpha(input)?;
    Ok(CssColor::Rgba(Rgba::from_floats(r, g, b, alpha)))
}

fn parse_rgb_channel<'i>(input: &mut Parser<'i, '_>) -> Result<f32, ParseError<'i>> {
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Number { value, .. } => Ok(value / 255.0),
        Token::Percentage { unit_value, .. } => Ok(unit_value),
        _ => Err(location.new_custom_error(())),
    }
}

fn parse_hsl<'i>(input: &mut Parser<'i, '_>) -> Result<CssColor, ParseError<'i>> {
    let h = parse_hue(input)?;
    let _ = input.try_parse(Parser::expect_comma);
    let s = input.expect_percentage()?;
    let _ = input.try_parse(Parser::expect_comma);
    let l = input.expect_percentage()?;
    let alpha = parse_alpha(input)?;
    Ok(CssColor::Hsl { h, s, l, alpha })
}

/// Parse a hue as a number of degrees or an angle dimension.
fn parse_hue<'i>(input: &mut Parser<'i, '_>) -> Result<f32, ParseError<'i>> {
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Number { value, .. } => Ok(value),
        Token::Dimension { value, unit, .. } => match unit.to_ascii_lowercase().as_str() {
            "deg" => Ok(value),
            "grad" => Ok(value * 360.0 / 400.0),
            "rad" => Ok(value.to_degrees()),
            "turn" => Ok(value * 360.0),
            _ => Err(location.new_custom_error(())),
        },
        _ => Err(location.new_custom_error(())),
    }
}

/// A number, or a percentage rescaled so `100%` maps to `scale`.
fn parse_number_or_percentage<'i>(
    input: &mut Parser<'i, '_>,
    scale: f32,
) -> Result<f32, ParseError<'i>> {
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Number { value, .. } => Ok(value),
        Token::Percentage { unit_value, .. } => Ok(unit_value * scale),
        _ => Err(location.new_custom_error(())),
    }
}

/// An optional trailing alpha, after either a comma or a slash.
fn parse_alpha<'i>(input: &mut Parser<'i, '_>) -> Result<f32, ParseError<'i>> {
    let has_separator = input.try_parse(Parser::expect_comma).is_ok()
        || input.try_parse(|i| i.expect_delim('/')).is_ok();
    if !has_separator {
        input.skip_whitespace();
        if !input.is_exhausted() {
            return Err(input.new_custom_error(()));
        }
        return Ok(1.0);
    }
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Number { value, .. } => Ok(value.clamp(0.0, 1.0)),
        Token::Percentage { unit_value, .. } => Ok(unit_value.clamp(0.0, 1.0)),
        _ => Err(location.new_custom_error(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn parse_value(css: &str) -> Value {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        parse_declaration_value(&mut parser).expect("value should parse")
    }

    #[test]
    fn keyword_value() {
        assert_eq!(parse_value("flex"), Value::Ident("flex".into()));
    }

    #[test]
    fn hex_color_value() {
        assert_eq!(
            parse_value("#ff0000"),
            Value::Color(CssColor::Rgba(Rgba::new(255, 0, 0, 1.0)))
        );
    }

    #[test]
    fn legacy_and_modern_rgb() {
        assert_eq!(
            parse_value("rgb(255, 0, 0)"),
            Value::Color(CssColor::Rgba(Rgba::new(255, 0, 0, 1.0)))
        );
        assert_eq!(
            parse_value("rgb(255 0 0 / 0.5)"),
            Value::Color(CssColor::Rgba(Rgba::new(255, 0, 0, 0.5)))
        );
    }

    #[test]
    fn oklch_value() {
        match parse_value("oklch(0.7 0.1 150deg)") {
            Value::Color(CssColor::Oklch { l, c, h, alpha }) => {
                assert_eq!((l, c, h, alpha), (0.7, 0.1, 150.0, 1.0));
            }
            other => panic!("expected oklch, got {other:?}"),
        }
    }

    #[test]
    fn color_function_unknown_space_falls_back() {
        match parse_value("color(display-p3 1 0 0)") {
            Value::Tokens(_) => {}
            other => panic!("expected raw tokens, got {other:?}"),
        }
    }

    #[test]
    fn var_reference() {
        match parse_value("var(--main, blue)") {
            Value::Var(var) => {
                assert_eq!(var.name, "--main");
                assert!(var.from.is_none());
                assert!(var.fallback.is_some());
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn var_from_specifier() {
        match parse_value("var(--accent from \"./theme.css\")") {
            Value::Var(var) => {
                assert_eq!(var.name, "--accent");
                assert_eq!(var.from.as_deref(), Some("./theme.css"));
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn shorthand_falls_back_to_tokens_with_typed_color() {
        match parse_value("1px solid lab(52% 40 59)") {
            Value::Tokens(tokens) => {
                assert!(tokens
                    .0
                    .iter()
                    .any(|t| matches!(t, TokenOrValue::Color(CssColor::Lab { .. }))));
            }
            other => panic!("expected raw tokens, got {other:?}"),
        }
    }

    #[test]
    fn composes_forms() {
        let parse = |css: &str| {
            let mut input = ParserInput::new(css);
            let mut parser = Parser::new(&mut input);
            // The parse error borrows the closure-local input.
            parse_composes(&mut parser, 0).map_err(|_| ())
        };
        let plain = parse("a b").unwrap();
        assert_eq!(plain.names, vec!["a", "b"]);
        assert_eq!(plain.from, None);

        let global = parse("a from global").unwrap();
        assert_eq!(global.from, Some(ComposesFrom::Global));

        let file = parse("x from \"./other.css\"").unwrap();
        assert_eq!(file.from, Some(ComposesFrom::File("./other.css".into())));

        assert!(parse("").is_err());
    }

    #[test]
    fn comma_list() {
        match parse_value("serif, sans-serif") {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }
}
