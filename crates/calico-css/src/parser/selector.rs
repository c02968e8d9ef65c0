//! Selector parsing.
//!
//! Parses a selector list up to the opening `{` of a rule. Whitespace is
//! significant here (descendant combinators), so this is the one place the
//! parser walks tokens with `next_including_whitespace`.

use cssparser::{Parser, Token};

use crate::selector::{
    AttrOperator, AttrSelector, Combinator, Component, PseudoClass, PseudoElement, Selector,
    SelectorList, TypeSelector,
};
use crate::vendor_prefix::VendorPrefix;

type ParseError<'i> = cssparser::ParseError<'i, ()>;

/// Parse a comma-separated selector list.
pub(crate) fn parse_selector_list<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<SelectorList, ParseError<'i>> {
    let mut selectors = vec![parse_selector(input)?];
    while input.try_parse(Parser::expect_comma).is_ok() {
        selectors.push(parse_selector(input)?);
    }
    input.skip_whitespace();
    if !input.is_exhausted() {
        return Err(input.new_custom_error(()));
    }
    Ok(SelectorList(selectors))
}

fn parse_selector<'i>(input: &mut Parser<'i, '_>) -> Result<Selector, ParseError<'i>> {
    let mut components: Vec<Component> = Vec::new();
    let mut pending_whitespace = false;

    input.skip_whitespace();
    loop {
        let state = input.state();
        let location = input.current_source_location();
        let token = match input.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        // Whitespace becomes a descendant combinator only if a compound
        // selector follows and no explicit combinator intervenes.
        let component = match token {
            Token::WhiteSpace(_) => {
                pending_whitespace = !components.is_empty();
                continue;
            }
            Token::Comma => {
                // Selector list separator belongs to the caller.
                input.reset(&state);
                break;
            }
            Token::Delim('>') => explicit_combinator(&mut pending_whitespace, Combinator::Child),
            Token::Delim('+') => {
                explicit_combinator(&mut pending_whitespace, Combinator::NextSibling)
            }
            Token::Delim('~') => {
                explicit_combinator(&mut pending_whitespace, Combinator::LaterSibling)
            }
            Token::Delim('*') => {
                flush_descendant(&mut components, &mut pending_whitespace);
                Component::Type(TypeSelector::Universal)
            }
            Token::Ident(name) => {
                flush_descendant(&mut components, &mut pending_whitespace);
                Component::Type(TypeSelector::Name(name.to_string()))
            }
            Token::IDHash(id) => {
                flush_descendant(&mut components, &mut pending_whitespace);
                Component::Id(id.to_string())
            }
            Token::Delim('.') => {
                flush_descendant(&mut components, &mut pending_whitespace);
                let name = match input.next_including_whitespace() {
                    Ok(Token::Ident(name)) => name.to_string(),
                    _ => return Err(location.new_custom_error(())),
                };
                Component::Class(name)
            }
            Token::Colon => {
                flush_descendant(&mut components, &mut pending_whitespace);
                parse_pseudo(input)?
            }
            Token::SquareBracketBlock => {
                flush_descendant(&mut components, &mut pending_whitespace);
                Component::Attribute(input.parse_nested_block(parse_attribute)?)
            }
            _ => return Err(location.new_custom_error(())),
        };
        components.push(component);
    }

    if components.is_empty() {
        return Err(input.new_custom_error(()));
    }
    if matches!(components.last(), Some(Component::Combinator(_))) {
        return Err(input.new_custom_error(()));
    }
    Ok(Selector::new(components))
}

fn explicit_combinator(pending_whitespace: &mut bool, combinator: Combinator) -> Component {
    *pending_whitespace = false;
    Component::Combinator(combinator)
}

fn flush_descendant(components: &mut Vec<Component>, pending_whitespace: &mut bool) {
    if *pending_whitespace {
        if !matches!(components.last(), Some(Component::Combinator(_)) | None) {
            components.push(Component::Combinator(Combinator::Descendant));
        }
        *pending_whitespace = false;
    }
}

/// Parse a pseudo-class or pseudo-element after an initial `:`.
fn parse_pseudo<'i>(input: &mut Parser<'i, '_>) -> Result<Component, ParseError<'i>> {
    let location = input.current_source_location();
    let token = input.next_including_whitespace()?.clone();
    Ok(match token {
        // A second colon introduces a pseudo-element.
        Token::Colon => {
            let name = match input.next_including_whitespace() {
                Ok(Token::Ident(name)) => name.to_string(),
                _ => return Err(location.new_custom_error(())),
            };
            Component::PseudoElement(parse_pseudo_element(&name))
        }
        Token::Ident(name) => {
            let name = name.to_string();
            let pseudo = match name.to_ascii_lowercase().as_str() {
                "hover" => PseudoClass::Hover,
                "active" => PseudoClass::Active,
                "focus" => PseudoClass::Focus,
                "focus-visible" => PseudoClass::FocusVisible,
                "focus-within" => PseudoClass::FocusWithin,
                "fullscreen" => PseudoClass::Fullscreen(VendorPrefix::None),
                "-webkit-full-screen" => PseudoClass::Fullscreen(VendorPrefix::WebKit),
                "-moz-full-screen" => PseudoClass::Fullscreen(VendorPrefix::Moz),
                "-ms-fullscreen" => PseudoClass::Fullscreen(VendorPrefix::Ms),
                // Legacy single-colon pseudo-element syntax.
                "before" => return Ok(Component::PseudoElement(PseudoElement::Before)),
                "after" => return Ok(Component::PseudoElement(PseudoElement::After)),
                "first-line" => return Ok(Component::PseudoElement(PseudoElement::FirstLine)),
                "first-letter" => return Ok(Component::PseudoElement(PseudoElement::FirstLetter)),
                "-ms-input-placeholder" => {
                    return Ok(Component::PseudoElement(PseudoElement::Placeholder(
                        VendorPrefix::Ms,
                    )));
                }
                _ => PseudoClass::Custom(name),
            };
            Component::PseudoClass(pseudo)
        }
        Token::Function(name) => {
            let name = name.to_string();
            let pseudo = match name.to_ascii_lowercase().as_str() {
                "not" => {
                    let selectors = input.parse_nested_block(|nested| {
                        let mut selectors = vec![parse_selector(nested)?];
                        while nested.try_parse(Parser::expect_comma).is_ok() {
                            selectors.push(parse_selector(nested)?);
                        }
                        Ok::<_, ParseError<'i>>(selectors)
                    })?;
                    PseudoClass::Not(selectors)
                }
                "global" => {
                    let inner = input.parse_nested_block(parse_selector)?;
                    PseudoClass::Global(Box::new(inner))
                }
                "local" => {
                    let inner = input.parse_nested_block(parse_selector)?;
                    PseudoClass::Local(Box::new(inner))
                }
                _ => {
                    let arguments =
                        input.parse_nested_block(super::value::parse_token_list)?;
                    PseudoClass::CustomFunction {
                        name,
                        arguments: crate::printer::ToCss::to_css_string(&arguments),
                    }
                }
            };
            Component::PseudoClass(pseudo)
        }
        _ => return Err(location.new_custom_error(())),
    })
}

fn parse_pseudo_element(name: &str) -> PseudoElement {
    match name.to_ascii_lowercase().as_str() {
        "before" => PseudoElement::Before,
        "after" => PseudoElement::After,
        "first-line" => PseudoElement::FirstLine,
        "first-letter" => PseudoElement::FirstLetter,
        "selection" => PseudoElement::Selection,
        "placeholder" => PseudoElement::Placeholder(VendorPrefix::None),
        "-webkit-input-placeholder" => PseudoElement::Placeholder(VendorPrefix::WebKit),
        "-moz-placeholder" => PseudoElement::Placeholder(VendorPrefix::Moz),
        "-ms-input-placeholder" => PseudoElement::Placeholder(VendorPrefix::Ms),
        _ => PseudoElement::Custom(name.to_string()),
    }
}

/// Parse the contents of an attribute selector block.
fn parse_attribute<'i>(input: &mut Parser<'i, '_>) -> Result<AttrSelector, ParseError<'i>> {
    let name = input.expect_ident()?.to_string();

    let location = input.current_source_location();
    let operator = match input.next() {
        Err(_) => {
            return Ok(AttrSelector {
                name,
                matcher: None,
                case_insensitive: false,
            });
        }
        Ok(Token::Delim('=')) => AttrOperator::Equal,
        Ok(Token::IncludeMatch) => AttrOperator::Includes,
        Ok(Token::DashMatch) => AttrOperator::DashMatch,
        Ok(Token::PrefixMatch) => AttrOperator::Prefix,
        Ok(Token::SuffixMatch) => AttrOperator::Suffix,
        Ok(Token::SubstringMatch) => AttrOperator::Substring,
        Ok(_) => return Err(location.new_custom_error(())),
    };

    let location = input.current_source_location();
    let value = match input.next() {
        Ok(Token::QuotedString(value)) | Ok(Token::Ident(value)) => value.to_string(),
        _ => return Err(location.new_custom_error(())),
    };

    let case_insensitive = input
        .try_parse(|i| i.expect_ident_matching("i"))
        .is_ok();
    Ok(AttrSelector {
        name,
        matcher: Some((operator, value)),
        case_insensitive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn parse(css: &str) -> SelectorList {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        parse_selector_list(&mut parser).expect("selector should parse")
    }

    fn roundtrip(css: &str) -> String {
        use crate::printer::ToCss;
        parse(css).to_css_string()
    }

    #[test]
    fn compound_and_combinators() {
        assert_eq!(roundtrip("a.b:hover > span"), "a.b:hover > span");
        assert_eq!(roundtrip(".a .b"), ".a .b");
        assert_eq!(roundtrip(".a.b"), ".a.b");
        assert_eq!(roundtrip("ul ~ li + a"), "ul ~ li + a");
    }

    #[test]
    fn selector_list() {
        let list = parse(".a, .b");
        assert_eq!(list.0.len(), 2);
    }

    #[test]
    fn pseudo_elements() {
        assert_eq!(roundtrip("p::before"), "p::before");
        // Legacy single-colon form is normalized.
        assert_eq!(roundtrip("p:before"), "p::before");
        assert_eq!(roundtrip("input::placeholder"), "input::placeholder");
    }

    #[test]
    fn global_and_local_wrappers() {
        let list = parse(":global(.foo)");
        assert!(matches!(
            list.0[0].components[0],
            Component::PseudoClass(PseudoClass::Global(_))
        ));
    }

    #[test]
    fn not_with_list() {
        let list = parse(".a:not(.b, .c)");
        match &list.0[0].components[1] {
            Component::PseudoClass(PseudoClass::Not(inner)) => assert_eq!(inner.len(), 2),
            other => panic!("expected :not, got {other:?}"),
        }
    }

    #[test]
    fn attribute_forms() {
        assert_eq!(roundtrip("[disabled]"), "[disabled]");
        assert_eq!(roundtrip("[href^=\"https:\"]"), "[href^=\"https:\"]");
        assert_eq!(roundtrip("[lang|=en]"), "[lang|=\"en\"]");
    }

    #[test]
    fn unknown_pseudo_is_carried() {
        assert_eq!(roundtrip("li:first-of-type"), "li:first-of-type");
        assert_eq!(roundtrip("li:nth-child(2n+1)"), "li:nth-child(2n+1)");
    }

    #[test]
    fn rejects_malformed() {
        let mut input = ParserInput::new(". {}");
        let mut parser = Parser::new(&mut input);
        assert!(parse_selector_list(&mut parser).is_err());
    }
}
