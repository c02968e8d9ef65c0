//! CSS tokenization on top of the `cssparser` crate.
//!
//! The tokenizer produces a flat stream of owned, byte-spanned tokens in a
//! single pass over the input. Block contents are included in the stream
//! between block-start and block-close tokens. Lexical anomalies (bad
//! strings, bad URLs) produce a best-effort token plus a [`TokenWarning`]
//! rather than aborting the scan; the parser decides whether to escalate.

use cssparser::{Parser, ParserInput};

/// A byte range within the immutable input buffer.
///
/// Spans are never mutated after a token is produced; diagnostics and source
/// maps derive line/column information from them on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first byte of the token.
    pub start: u32,
    /// Length of the token in bytes.
    pub len: u32,
}

impl Span {
    /// Create a span from a start/end byte offset pair.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            len: end.saturating_sub(start) as u32,
        }
    }

    /// Byte offset one past the last byte of the token.
    pub fn end(&self) -> usize {
        (self.start + self.len) as usize
    }
}

/// An owned CSS token.
///
/// This mirrors the `cssparser` token set but owns its text, so token lists
/// can outlive the input borrow. Tokens the value grammar does not otherwise
/// model are stored verbatim and reprinted verbatim, which guarantees the
/// parser never needs to represent unknown CSS as failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier.
    Ident(String),
    /// An `@keyword` token, without the `@`.
    AtKeyword(String),
    /// A `#name` token that is not a valid hash id.
    Hash(String),
    /// A `#name` token that is a valid hash id.
    IdHash(String),
    /// A quoted string, without the quotes.
    String(String),
    /// An unquoted `url(...)` token, holding the URL itself.
    Url(String),
    /// A single-character delimiter.
    Delim(char),
    /// A numeric literal.
    Number {
        value: f32,
        int_value: Option<i32>,
        has_sign: bool,
    },
    /// A percentage. `unit_value` is the value divided by 100.
    Percentage { unit_value: f32, has_sign: bool },
    /// A dimension: a number with a unit suffix.
    Dimension {
        value: f32,
        int_value: Option<i32>,
        has_sign: bool,
        unit: String,
    },
    /// A run of whitespace.
    WhiteSpace(String),
    /// A comment, without the delimiters.
    Comment(String),
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `<!--`
    CDO,
    /// `-->`
    CDC,
    /// A `name(` token. Arguments follow until the matching close paren.
    Function(String),
    /// `(`
    ParenthesisBlock,
    /// `[`
    SquareBracketBlock,
    /// `{`
    CurlyBracketBlock,
    /// `)`
    CloseParenthesis,
    /// `]`
    CloseSquareBracket,
    /// `}`
    CloseCurlyBracket,
}

impl Token {
    /// Convert a borrowed `cssparser` token into an owned token.
    pub(crate) fn from_css(token: &cssparser::Token<'_>) -> Option<Token> {
        use cssparser::Token as T;
        Some(match token {
            T::Ident(s) => Token::Ident(s.to_string()),
            T::AtKeyword(s) => Token::AtKeyword(s.to_string()),
            T::Hash(s) => Token::Hash(s.to_string()),
            T::IDHash(s) => Token::IdHash(s.to_string()),
            T::QuotedString(s) | T::BadString(s) => Token::String(s.to_string()),
            T::UnquotedUrl(s) | T::BadUrl(s) => Token::Url(s.to_string()),
            T::Delim(c) => Token::Delim(*c),
            T::Number {
                value,
                int_value,
                has_sign,
            } => Token::Number {
                value: *value,
                int_value: *int_value,
                has_sign: *has_sign,
            },
            T::Percentage {
                unit_value,
                has_sign,
                ..
            } => Token::Percentage {
                unit_value: *unit_value,
                has_sign: *has_sign,
            },
            T::Dimension {
                value,
                int_value,
                has_sign,
                unit,
            } => Token::Dimension {
                value: *value,
                int_value: *int_value,
                has_sign: *has_sign,
                unit: unit.to_string(),
            },
            T::WhiteSpace(s) => Token::WhiteSpace(s.to_string()),
            T::Comment(s) => Token::Comment(s.to_string()),
            T::Colon => Token::Colon,
            T::Semicolon => Token::Semicolon,
            T::Comma => Token::Comma,
            T::CDO => Token::CDO,
            T::CDC => Token::CDC,
            T::Function(s) => Token::Function(s.to_string()),
            T::ParenthesisBlock => Token::ParenthesisBlock,
            T::SquareBracketBlock => Token::SquareBracketBlock,
            T::CurlyBracketBlock => Token::CurlyBracketBlock,
            T::CloseParenthesis => Token::CloseParenthesis,
            T::CloseSquareBracket => Token::CloseSquareBracket,
            T::CloseCurlyBracket => Token::CloseCurlyBracket,
            _ => return None,
        })
    }

    /// Whether this token opens a nested block.
    pub fn is_block_start(&self) -> bool {
        matches!(
            self,
            Token::Function(_)
                | Token::ParenthesisBlock
                | Token::SquareBracketBlock
                | Token::CurlyBracketBlock
        )
    }
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Recoverable lexical anomaly kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenWarningKind {
    /// A string literal was terminated by a newline or end of input.
    UnterminatedString,
    /// A `url(...)` token contained an invalid character.
    BadUrl,
    /// A block was still open at end of input.
    UnclosedBlock,
}

/// A recoverable lexical diagnostic.
///
/// Warnings are accumulated and surfaced alongside a successful result; they
/// never abort tokenization on their own.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWarning {
    pub kind: TokenWarningKind,
    pub span: Span,
}

impl std::fmt::Display for TokenWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self.kind {
            TokenWarningKind::UnterminatedString => "unterminated string",
            TokenWarningKind::BadUrl => "invalid url token",
            TokenWarningKind::UnclosedBlock => "unclosed block at end of input",
        };
        write!(f, "{} at byte offset {}", msg, self.span.start)
    }
}

/// The result of tokenizing an input buffer.
#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<SpannedToken>,
    warnings: Vec<TokenWarning>,
}

impl TokenStream {
    /// The tokens, in source order.
    pub fn tokens(&self) -> &[SpannedToken] {
        &self.tokens
    }

    /// Lexical warnings accumulated during the scan.
    pub fn warnings(&self) -> &[TokenWarning] {
        &self.warnings
    }

    /// Consume the stream, returning tokens and warnings.
    pub fn into_parts(self) -> (Vec<SpannedToken>, Vec<TokenWarning>) {
        (self.tokens, self.warnings)
    }

    /// The span of the deepest block left open at end of input, if any.
    ///
    /// A structurally unclosed top-level block is the one lexical condition
    /// the parser escalates to a fatal error.
    pub fn unclosed_block(&self) -> Option<Span> {
        self.warnings
            .iter()
            .rev()
            .find(|w| w.kind == TokenWarningKind::UnclosedBlock)
            .map(|w| w.span)
    }

    /// Iterate over the tokens.
    pub fn iter(&self) -> impl Iterator<Item = &SpannedToken> {
        self.tokens.iter()
    }
}

/// Tokenize `input` in a single pass.
///
/// Comments and whitespace are included in the stream so callers can
/// reconstruct raw text runs exactly. Restartable only by re-invocation on
/// the same buffer.
pub fn tokenize(input: &str) -> TokenStream {
    let mut stream = TokenStream::default();
    let mut parser_input = ParserInput::new(input);
    let mut parser = Parser::new(&mut parser_input);
    scan(&mut parser, input, &mut stream);
    stream
}

fn scan<'i>(parser: &mut Parser<'i, '_>, input: &str, stream: &mut TokenStream) {
    loop {
        let start = parser.position().byte_index();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };
        let end = parser.position().byte_index();
        let span = Span::new(start, end);

        match &token {
            cssparser::Token::BadString(_) => {
                stream.warnings.push(TokenWarning {
                    kind: TokenWarningKind::UnterminatedString,
                    span,
                });
            }
            cssparser::Token::BadUrl(_) => {
                stream.warnings.push(TokenWarning {
                    kind: TokenWarningKind::BadUrl,
                    span,
                });
            }
            _ => {}
        }

        if let Some(owned) = Token::from_css(&token) {
            let is_block = owned.is_block_start();
            stream.tokens.push(SpannedToken { token: owned, span });

            if is_block {
                let _ = parser.parse_nested_block(
                    |nested| -> Result<(), cssparser::ParseError<'i, ()>> {
                        scan(nested, input, stream);
                        Ok(())
                    },
                );
                let close_pos = parser.position().byte_index();
                // cssparser implicitly closes blocks at end of input; detect
                // that case by checking for the literal close delimiter.
                let close = match token {
                    cssparser::Token::CurlyBracketBlock => (b'}', Token::CloseCurlyBracket),
                    cssparser::Token::SquareBracketBlock => (b']', Token::CloseSquareBracket),
                    _ => (b')', Token::CloseParenthesis),
                };
                let closed =
                    close_pos > 0 && input.as_bytes().get(close_pos - 1) == Some(&close.0);
                if closed {
                    stream.tokens.push(SpannedToken {
                        token: close.1,
                        span: Span::new(close_pos.saturating_sub(1), close_pos),
                    });
                } else {
                    stream.warnings.push(TokenWarning {
                        kind: TokenWarningKind::UnclosedBlock,
                        span,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(stream: &TokenStream) -> Vec<Token> {
        stream
            .tokens()
            .iter()
            .map(|t| t.token.clone())
            .filter(|t| !matches!(t, Token::WhiteSpace(_)))
            .collect()
    }

    #[test]
    fn tokenize_simple_rule() {
        let stream = tokenize(".foo { color: red; }");
        let tokens = kinds(&stream);
        assert_eq!(tokens[0], Token::Delim('.'));
        assert_eq!(tokens[1], Token::Ident("foo".into()));
        assert_eq!(tokens[2], Token::CurlyBracketBlock);
        assert_eq!(tokens[3], Token::Ident("color".into()));
        assert_eq!(tokens[4], Token::Colon);
        assert_eq!(tokens[5], Token::Ident("red".into()));
        assert_eq!(tokens[6], Token::Semicolon);
        assert_eq!(tokens[7], Token::CloseCurlyBracket);
        assert!(stream.warnings().is_empty());
    }

    #[test]
    fn tokenize_numbers_and_dimensions() {
        let stream = tokenize("a{width:10.5px;opacity:.5;margin:-1em}");
        let tokens = kinds(&stream);
        assert!(tokens.iter().any(|t| matches!(
            t,
            Token::Dimension { value, unit, .. } if *value == 10.5 && unit == "px"
        )));
        assert!(tokens.iter().any(|t| matches!(
            t,
            Token::Number { value, .. } if *value == 0.5
        )));
        assert!(tokens.iter().any(|t| matches!(
            t,
            Token::Dimension { value, has_sign, .. } if *value == -1.0 && *has_sign
        )));
    }

    #[test]
    fn spans_index_into_input() {
        let input = ".foo{color:red}";
        let stream = tokenize(input);
        for t in stream.tokens() {
            assert!(t.span.end() <= input.len());
        }
        let foo = &stream.tokens()[1];
        assert_eq!(&input[foo.span.start as usize..foo.span.end()], "foo");
    }

    #[test]
    fn unterminated_string_warns_but_continues() {
        let stream = tokenize(".a{content:\"oops\n}.b{color:red}");
        assert!(stream
            .warnings()
            .iter()
            .any(|w| w.kind == TokenWarningKind::UnterminatedString));
        // Scan kept going past the bad string.
        assert!(stream
            .tokens()
            .iter()
            .any(|t| t.token == Token::Ident("red".into())));
    }

    #[test]
    fn unclosed_block_detected() {
        let stream = tokenize(".a{");
        assert!(stream.unclosed_block().is_some());

        let stream = tokenize(".a{}");
        assert!(stream.unclosed_block().is_none());
    }

    #[test]
    fn nested_blocks_are_flattened() {
        let stream = tokenize("@media (min-width: 100px) { .a { color: red } }");
        let tokens = kinds(&stream);
        assert_eq!(tokens[0], Token::AtKeyword("media".into()));
        let closes = tokens
            .iter()
            .filter(|t| **t == Token::CloseCurlyBracket)
            .count();
        assert_eq!(closes, 2);
    }
}
