//! The declaration value model.
//!
//! Declaration values are parsed into a small typed grammar where the
//! compiler needs structure (colors for downleveling, `var()` for module
//! references, `composes` for scoping) and kept as raw token runs everywhere
//! else. Raw runs reprint canonically, so unknown properties pass through a
//! compile untouched.

pub mod color;
pub mod length;

use std::fmt;

pub use color::{CssColor, Rgba};
pub use length::{Length, LengthUnit};

use crate::error::Result;
use crate::printer::{Printer, ToCss};
use crate::tokenizer::{Span, SpannedToken, Token};

/// A parsed declaration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A color in any supported syntax.
    Color(CssColor),
    /// A dimension with a length unit.
    Length(Length),
    /// A percentage, stored as the unit value (`50%` is `0.5`).
    Percentage(f32),
    /// A unitless number.
    Number(f32),
    /// A plain identifier keyword.
    Ident(String),
    /// A `--dashed` identifier.
    DashedIdent(String),
    /// A quoted string, without the quotes.
    String(String),
    /// A `url(...)` value, holding the URL itself.
    Url(String),
    /// A function the value grammar does not model specially.
    Function(Function),
    /// A `var()` reference.
    Var(VarReference),
    /// A `composes` declaration value.
    Composes(Composes),
    /// A comma-separated list.
    List(Vec<Value>),
    /// A raw token run, reprinted canonically.
    Tokens(TokenList),
}

/// An unmodeled function call: the name plus its raw argument tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub arguments: TokenList,
}

/// A `var(--name)` reference, optionally importing from another module via
/// the `from` clause, optionally with a fallback token run.
#[derive(Debug, Clone, PartialEq)]
pub struct VarReference {
    /// The custom property name, including the `--` prefix.
    pub name: String,
    /// The specifier of the module the variable comes from, if any.
    pub from: Option<String>,
    pub fallback: Option<TokenList>,
    pub span: Span,
}

/// A `composes` declaration value.
#[derive(Debug, Clone, PartialEq)]
pub struct Composes {
    /// The class names being composed.
    pub names: Vec<String>,
    pub from: Option<ComposesFrom>,
    pub span: Span,
}

/// The source named by a `composes ... from` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposesFrom {
    /// `from global`: the names are unscoped.
    Global,
    /// `from "specifier"`: the names come from another module.
    File(String),
}

/// A run of raw tokens, possibly containing `var()` references that must be
/// resolved or rewritten during printing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenList(pub Vec<TokenOrValue>);

#[derive(Debug, Clone, PartialEq)]
pub enum TokenOrValue {
    Token(SpannedToken),
    Var(VarReference),
    /// A color recognized inside a raw run, kept typed so downleveling
    /// reaches shorthand values.
    Color(CssColor),
}

impl TokenList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the run contains nothing but whitespace and comments.
    pub fn is_whitespace(&self) -> bool {
        self.0.iter().all(|t| {
            matches!(
                t,
                TokenOrValue::Token(SpannedToken {
                    token: Token::WhiteSpace(_) | Token::Comment(_),
                    ..
                })
            )
        })
    }
}

impl ToCss for Value {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            Value::Color(color) => color.to_css(dest),
            Value::Length(length) => length.to_css(dest),
            Value::Percentage(unit_value) => {
                dest.write_number(unit_value * 100.0)?;
                dest.write_char('%')
            }
            Value::Number(value) => dest.write_number(*value),
            Value::Ident(name) => dest.write_ident(name),
            Value::DashedIdent(name) => dest.write_dashed_ident(name),
            Value::String(value) => dest.write_string_literal(value),
            Value::Url(url) => {
                dest.write_str("url(")?;
                dest.write_str(url)?;
                dest.write_char(')')
            }
            Value::Function(func) => func.to_css(dest),
            Value::Var(var) => var.to_css(dest),
            Value::Composes(composes) => composes.to_css(dest),
            Value::List(values) => {
                let mut first = true;
                for value in values {
                    if !first {
                        dest.delim(',', false)?;
                    }
                    first = false;
                    value.to_css(dest)?;
                }
                Ok(())
            }
            Value::Tokens(tokens) => tokens.to_css(dest),
        }
    }
}

impl ToCss for Function {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.write_ident(&self.name)?;
        dest.write_char('(')?;
        self.arguments.to_css(dest)?;
        dest.write_char(')')
    }
}

impl ToCss for VarReference {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.write_str("var(")?;
        match &self.from {
            Some(specifier) => {
                // Cross-module references print as a stable placeholder that
                // the host bundler substitutes once the dependency compiles.
                let placeholder = dest.variable_placeholder(&self.name, specifier, self.span);
                dest.write_str("--")?;
                dest.write_str(&placeholder)?;
            }
            None => dest.write_dashed_ident(&self.name)?,
        }
        if let Some(fallback) = &self.fallback {
            dest.delim(',', false)?;
            fallback.to_css(dest)?;
        }
        dest.write_char(')')
    }
}

impl ToCss for Composes {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        // Only reached when composes survives to output (modules disabled or
        // an untransformed sheet is printed). Reprint author syntax.
        let mut first = true;
        for name in &self.names {
            if !first {
                dest.write_char(' ')?;
            }
            first = false;
            dest.write_ident(name)?;
        }
        match &self.from {
            Some(ComposesFrom::Global) => dest.write_str(" from global")?,
            Some(ComposesFrom::File(specifier)) => {
                dest.write_str(" from ")?;
                dest.write_string_literal(specifier)?;
            }
            None => {}
        }
        Ok(())
    }
}

impl ToCss for TokenList {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        for item in &self.0 {
            match item {
                TokenOrValue::Token(spanned) => spanned.token.to_css(dest)?,
                TokenOrValue::Var(var) => var.to_css(dest)?,
                TokenOrValue::Color(color) => color.to_css(dest)?,
            }
        }
        Ok(())
    }
}

fn write_sign<W: fmt::Write>(value: f32, has_sign: bool, dest: &mut Printer<'_, W>) -> Result<()> {
    // write_number does not reproduce an explicit leading plus.
    if has_sign && value >= 0.0 {
        dest.write_char('+')?;
    }
    Ok(())
}

impl ToCss for Token {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            Token::Ident(name) => dest.write_ident(name),
            Token::AtKeyword(name) => {
                dest.write_char('@')?;
                dest.write_ident(name)
            }
            Token::Hash(value) => {
                dest.write_char('#')?;
                dest.write_str(value)
            }
            Token::IdHash(value) => {
                dest.write_char('#')?;
                dest.write_ident(value)
            }
            Token::String(value) => dest.write_string_literal(value),
            Token::Url(url) => {
                dest.write_str("url(")?;
                dest.write_str(url)?;
                dest.write_char(')')
            }
            Token::Delim(c) => dest.write_char(*c),
            Token::Number {
                value, has_sign, ..
            } => {
                write_sign(*value, *has_sign, dest)?;
                dest.write_number(*value)
            }
            Token::Percentage {
                unit_value,
                has_sign,
            } => {
                write_sign(*unit_value, *has_sign, dest)?;
                dest.write_number(unit_value * 100.0)?;
                dest.write_char('%')
            }
            Token::Dimension {
                value,
                unit,
                has_sign,
                ..
            } => {
                write_sign(*value, *has_sign, dest)?;
                dest.write_number(*value)?;
                dest.write_str(unit)
            }
            Token::WhiteSpace(text) => {
                if dest.minify {
                    dest.write_char(' ')
                } else {
                    dest.write_str(text)
                }
            }
            Token::Comment(text) => {
                if !dest.minify {
                    dest.write_str("/*")?;
                    dest.write_str(text)?;
                    dest.write_str("*/")?;
                }
                Ok(())
            }
            Token::Colon => dest.write_char(':'),
            Token::Semicolon => dest.write_char(';'),
            Token::Comma => dest.delim(',', false),
            Token::CDO => dest.write_str("<!--"),
            Token::CDC => dest.write_str("-->"),
            Token::Function(name) => {
                dest.write_ident(name)?;
                dest.write_char('(')
            }
            Token::ParenthesisBlock => dest.write_char('('),
            Token::SquareBracketBlock => dest.write_char('['),
            Token::CurlyBracketBlock => dest.write_char('{'),
            Token::CloseParenthesis => dest.write_char(')'),
            Token::CloseSquareBracket => dest.write_char(']'),
            Token::CloseCurlyBracket => dest.write_char('}'),
        }
    }
}
