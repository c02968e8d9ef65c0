//! The rule tree.
//!
//! Rules own their data; nothing borrows from the source buffer after
//! parsing. At-rules the compiler does not model keep their prelude and body
//! as raw token runs and reprint them untouched.

pub mod keyframes;
pub mod style;
pub mod stylesheet;

use std::fmt;

use crate::error::Result;
use crate::printer::{Printer, ToCss};
use crate::values::TokenList;

pub use keyframes::{Keyframe, KeyframeSelector, KeyframesRule};
pub use style::{Declaration, StyleRule};
pub use stylesheet::{StyleSheet, ToCssResult};

/// A 1-indexed source position, captured at the first token of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A top-level or nested CSS rule.
#[derive(Debug, Clone, PartialEq)]
pub enum CssRule {
    Style(StyleRule),
    Media(MediaRule),
    Supports(SupportsRule),
    Keyframes(KeyframesRule),
    Import(ImportRule),
    /// An at-rule the compiler does not model, carried verbatim.
    Unknown(UnknownAtRule),
}

impl CssRule {
    pub fn location(&self) -> Location {
        match self {
            CssRule::Style(rule) => rule.loc,
            CssRule::Media(rule) => rule.loc,
            CssRule::Supports(rule) => rule.loc,
            CssRule::Keyframes(rule) => rule.loc,
            CssRule::Import(rule) => rule.loc,
            CssRule::Unknown(rule) => rule.loc,
        }
    }
}

/// An `@media` rule. The query is kept as a raw token run.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    pub query: TokenList,
    pub rules: Vec<CssRule>,
    pub loc: Location,
}

/// An `@supports` rule. The condition is kept as a raw token run.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportsRule {
    pub condition: TokenList,
    pub rules: Vec<CssRule>,
    pub loc: Location,
}

/// An `@import` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    /// The import specifier, without url() wrapping.
    pub url: String,
    /// Media query tokens following the specifier, if any.
    pub media: TokenList,
    pub loc: Location,
}

/// An unmodeled at-rule: name plus raw prelude, with an optional raw block.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownAtRule {
    pub name: String,
    pub prelude: TokenList,
    pub block: Option<TokenList>,
    pub loc: Location,
}

impl ToCss for CssRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            CssRule::Style(rule) => rule.to_css(dest),
            CssRule::Media(rule) => rule.to_css(dest),
            CssRule::Supports(rule) => rule.to_css(dest),
            CssRule::Keyframes(rule) => rule.to_css(dest),
            CssRule::Import(rule) => rule.to_css(dest),
            CssRule::Unknown(rule) => rule.to_css(dest),
        }
    }
}

pub(crate) fn write_nested_rules<W: fmt::Write>(
    rules: &[CssRule],
    dest: &mut Printer<'_, W>,
) -> Result<()> {
    dest.whitespace()?;
    dest.write_char('{')?;
    dest.indent();
    let mut first = true;
    for rule in rules {
        if first {
            first = false;
        } else if !dest.minify {
            dest.write_char('\n')?;
        }
        dest.newline()?;
        rule.to_css(dest)?;
    }
    dest.dedent();
    dest.newline()?;
    dest.write_char('}')
}

impl ToCss for MediaRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        dest.write_str("@media ")?;
        self.query.to_css(dest)?;
        write_nested_rules(&self.rules, dest)
    }
}

impl ToCss for SupportsRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        dest.write_str("@supports ")?;
        self.condition.to_css(dest)?;
        write_nested_rules(&self.rules, dest)
    }
}

impl ToCss for ImportRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        dest.write_str("@import ")?;
        dest.write_string_literal(&self.url)?;
        if !self.media.is_empty() && !self.media.is_whitespace() {
            dest.write_char(' ')?;
            self.media.to_css(dest)?;
        }
        dest.write_char(';')
    }
}

impl ToCss for UnknownAtRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        dest.write_char('@')?;
        dest.write_ident(&self.name)?;
        if !self.prelude.is_empty() && !self.prelude.is_whitespace() {
            dest.write_char(' ')?;
            self.prelude.to_css(dest)?;
        }
        match &self.block {
            Some(block) => {
                dest.whitespace()?;
                dest.write_char('{')?;
                block.to_css(dest)?;
                dest.write_char('}')
            }
            None => dest.write_char(';'),
        }
    }
}
