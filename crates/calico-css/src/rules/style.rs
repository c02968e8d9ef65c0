//! Style rules and declarations.

use std::fmt;

use super::Location;
use crate::error::Result;
use crate::printer::{Printer, ToCss};
use crate::selector::SelectorList;
use crate::values::Value;

/// A qualified rule: a selector list and its declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selectors: SelectorList,
    pub declarations: Vec<Declaration>,
    pub loc: Location,
}

impl StyleRule {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// A single property declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name as authored, lowercased for known properties.
    /// Custom properties keep their `--` prefix and exact case.
    pub property: String,
    pub value: Value,
    pub important: bool,
    pub loc: Location,
}

impl Declaration {
    /// Whether this declares a custom property.
    pub fn is_custom(&self) -> bool {
        self.property.starts_with("--")
    }

    /// Equality ignoring source position, used when merging rules.
    pub fn same_as(&self, other: &Declaration) -> bool {
        self.property == other.property
            && self.important == other.important
            && self.value == other.value
    }
}

impl ToCss for StyleRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        self.selectors.to_css(dest)?;
        write_declaration_block(&self.declarations, dest)
    }
}

pub(crate) fn write_declaration_block<W: fmt::Write>(
    declarations: &[Declaration],
    dest: &mut Printer<'_, W>,
) -> Result<()> {
    dest.whitespace()?;
    dest.write_char('{')?;
    dest.indent();
    let len = declarations.len();
    for (i, declaration) in declarations.iter().enumerate() {
        dest.newline()?;
        declaration.to_css(dest)?;
        if i + 1 < len || !dest.minify {
            dest.write_char(';')?;
        }
    }
    dest.dedent();
    dest.newline()?;
    dest.write_char('}')
}

impl ToCss for Declaration {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        if self.is_custom() {
            dest.write_dashed_ident(&self.property)?;
        } else {
            dest.write_str(&self.property)?;
        }
        dest.write_char(':')?;
        dest.whitespace()?;
        self.value.to_css(dest)?;
        if self.important {
            dest.whitespace()?;
            dest.write_str("!important")?;
        }
        Ok(())
    }
}
