//! `@keyframes` rules.

use std::fmt;

use super::style::{Declaration, write_declaration_block};
use super::Location;
use crate::error::Result;
use crate::printer::{Printer, ToCss};
use crate::vendor_prefix::VendorPrefix;

/// An `@keyframes` rule, possibly vendor-prefixed.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframesRule {
    /// The animation name. Subject to CSS Modules scoping.
    pub name: String,
    pub keyframes: Vec<Keyframe>,
    pub vendor_prefix: VendorPrefix,
    pub loc: Location,
}

/// One keyframe block.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub selectors: Vec<KeyframeSelector>,
    pub declarations: Vec<Declaration>,
    pub loc: Location,
}

/// A keyframe selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyframeSelector {
    From,
    To,
    /// An offset, stored as the unit value (`50%` is `0.5`).
    Percentage(f32),
}

impl ToCss for KeyframeSelector {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            // "0%" is shorter than "from".
            KeyframeSelector::From if dest.minify => dest.write_str("0%"),
            KeyframeSelector::From => dest.write_str("from"),
            KeyframeSelector::To => dest.write_str("to"),
            KeyframeSelector::Percentage(unit_value) => {
                dest.write_number(unit_value * 100.0)?;
                dest.write_char('%')
            }
        }
    }
}

impl ToCss for Keyframe {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                dest.delim(',', false)?;
            }
            selector.to_css(dest)?;
        }
        write_declaration_block(&self.declarations, dest)
    }
}

impl ToCss for KeyframesRule {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.add_mapping(self.loc);
        dest.write_char('@')?;
        dest.write_str(self.vendor_prefix.as_str())?;
        dest.write_str("keyframes ")?;
        dest.write_keyframes_name(&self.name)?;
        dest.whitespace()?;
        dest.write_char('{')?;
        dest.indent();
        for keyframe in &self.keyframes {
            dest.newline()?;
            keyframe.to_css(dest)?;
        }
        dest.dedent();
        dest.newline()?;
        dest.write_char('}')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    #[test]
    fn keyframes_rule_prints() {
        let rule = KeyframesRule {
            name: "spin".into(),
            vendor_prefix: VendorPrefix::None,
            keyframes: vec![Keyframe {
                selectors: vec![KeyframeSelector::From, KeyframeSelector::Percentage(0.5)],
                declarations: vec![Declaration {
                    property: "opacity".into(),
                    value: Value::Number(0.0),
                    important: false,
                    loc: Location::default(),
                }],
                loc: Location::default(),
            }],
            loc: Location::default(),
        };
        assert_eq!(
            rule.to_css_string(),
            "@keyframes spin {\n  from, 50% {\n    opacity: 0;\n  }\n}"
        );
    }

    #[test]
    fn prefixed_keyframes_name() {
        let rule = KeyframesRule {
            name: "spin".into(),
            vendor_prefix: VendorPrefix::WebKit,
            keyframes: vec![],
            loc: Location::default(),
        };
        assert!(rule.to_css_string().starts_with("@-webkit-keyframes spin"));
    }
}
