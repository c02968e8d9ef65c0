//! Selector type definitions.
//!
//! Selectors are stored as a flat, ordered sequence of compound-selector
//! components with combinators in between. Closed sum types with exhaustive
//! matching keep the printer and transformer honest when variants are added.

use std::fmt;

use crate::error::Result;
use crate::printer::{Printer, ToCss};
use crate::vendor_prefix::VendorPrefix;

/// A comma-separated selector list, as written before a declaration block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectorList(pub Vec<Selector>);

/// A complete CSS selector (e.g. `.card:hover > a.label`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Components in source order. Combinators appear between compound
    /// selector runs.
    pub components: Vec<Component>,
}

impl Selector {
    /// Create a selector from components.
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Iterate over every class name in this selector, including those
    /// nested inside functional pseudo-classes.
    pub fn class_names(&self) -> Vec<&str> {
        let mut out = vec![];
        collect_class_names(&self.components, &mut out);
        out
    }

    /// Class names this selector matches on directly, excluding functional
    /// pseudo-class arguments. `.live:not(.dead)` owns only `live`; the
    /// `:not()` argument is a condition on other elements, not a use of the
    /// class itself.
    pub fn owned_class_names(&self) -> Vec<&str> {
        let mut out = vec![];
        collect_owned_class_names(&self.components, &mut out);
        out
    }
}

fn collect_class_names<'a>(components: &'a [Component], out: &mut Vec<&'a str>) {
    for component in components {
        match component {
            Component::Class(name) => out.push(name.as_str()),
            Component::PseudoClass(PseudoClass::Local(inner)) => {
                collect_class_names(&inner.components, out);
            }
            Component::PseudoClass(PseudoClass::Not(list)) => {
                for selector in list {
                    collect_class_names(&selector.components, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_owned_class_names<'a>(components: &'a [Component], out: &mut Vec<&'a str>) {
    for component in components {
        match component {
            Component::Class(name) => out.push(name.as_str()),
            Component::PseudoClass(PseudoClass::Local(inner)) => {
                collect_owned_class_names(&inner.components, out);
            }
            _ => {}
        }
    }
}

/// A single selector component.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// A type or universal selector.
    Type(TypeSelector),
    /// An ID selector (`#id`).
    Id(String),
    /// A class selector (`.class`). Subject to CSS Modules scoping.
    Class(String),
    /// A pseudo-class (`:hover`).
    PseudoClass(PseudoClass),
    /// A pseudo-element (`::before`).
    PseudoElement(PseudoElement),
    /// An attribute selector (`[href^="https:"]`).
    Attribute(AttrSelector),
    /// A combinator between compound selectors.
    Combinator(Combinator),
}

/// Type selector.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSelector {
    /// The universal selector (`*`).
    Universal,
    /// A named element type.
    Name(String),
}

/// Combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Descendant combinator (whitespace).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Next-sibling combinator (`+`).
    NextSibling,
    /// Later-sibling combinator (`~`).
    LaterSibling,
}

/// Pseudo-class selectors.
///
/// The identifier of a modeled pseudo-class may be substituted at print time
/// through the printer's rename map; unmodeled pseudo-classes are carried
/// verbatim in `Custom`.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    /// `:fullscreen`, possibly downleveled to a prefixed form.
    Fullscreen(VendorPrefix),
    /// `:not(...)`.
    Not(Vec<Selector>),
    /// `:global(...)` — CSS Modules scope escape; contents print unscoped.
    Global(Box<Selector>),
    /// `:local(...)` — CSS Modules explicit local scope.
    Local(Box<Selector>),
    /// An unmodeled pseudo-class, carried verbatim.
    Custom(String),
    /// An unmodeled functional pseudo-class with raw argument text.
    CustomFunction { name: String, arguments: String },
}

impl PseudoClass {
    /// The canonical name used for print-time substitution lookups.
    pub fn name(&self) -> Option<&str> {
        match self {
            PseudoClass::Hover => Some("hover"),
            PseudoClass::Active => Some("active"),
            PseudoClass::Focus => Some("focus"),
            PseudoClass::FocusVisible => Some("focus-visible"),
            PseudoClass::FocusWithin => Some("focus-within"),
            PseudoClass::Fullscreen(VendorPrefix::None) => Some("fullscreen"),
            PseudoClass::Custom(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Pseudo-element selectors.
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoElement {
    Before,
    After,
    FirstLine,
    FirstLetter,
    Selection,
    /// `::placeholder`, possibly downleveled to a prefixed form.
    Placeholder(VendorPrefix),
    /// An unmodeled pseudo-element, carried verbatim.
    Custom(String),
}

/// An attribute selector.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
    /// The attribute name.
    pub name: String,
    /// Match operator and expected value, if any.
    pub matcher: Option<(AttrOperator, String)>,
    /// Whether an `i` case-insensitivity flag was present.
    pub case_insensitive: bool,
}

/// Attribute selector match operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `=`
    Equal,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

impl AttrOperator {
    fn as_str(&self) -> &'static str {
        match self {
            AttrOperator::Equal => "=",
            AttrOperator::Includes => "~=",
            AttrOperator::DashMatch => "|=",
            AttrOperator::Prefix => "^=",
            AttrOperator::Suffix => "$=",
            AttrOperator::Substring => "*=",
        }
    }
}

impl ToCss for SelectorList {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        for (i, selector) in self.0.iter().enumerate() {
            if i > 0 {
                dest.delim(',', false)?;
            }
            selector.to_css(dest)?;
        }
        Ok(())
    }
}

impl ToCss for Selector {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        for component in &self.components {
            component.to_css(dest)?;
        }
        Ok(())
    }
}

impl ToCss for Component {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            Component::Type(TypeSelector::Universal) => dest.write_char('*'),
            Component::Type(TypeSelector::Name(name)) => dest.write_ident(name),
            Component::Id(id) => {
                dest.write_char('#')?;
                dest.write_ident(id)
            }
            Component::Class(name) => {
                dest.write_char('.')?;
                dest.write_scoped_class(name)
            }
            Component::PseudoClass(pseudo) => pseudo.to_css(dest),
            Component::PseudoElement(pseudo) => pseudo.to_css(dest),
            Component::Attribute(attr) => attr.to_css(dest),
            Component::Combinator(combinator) => combinator.to_css(dest),
        }
    }
}

impl ToCss for Combinator {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            Combinator::Descendant => dest.write_char(' '),
            Combinator::Child => dest.delim('>', true),
            Combinator::NextSibling => dest.delim('+', true),
            Combinator::LaterSibling => dest.delim('~', true),
        }
    }
}

impl ToCss for PseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        // Print-time-only substitution for configured pseudo-classes.
        if let Some(name) = self.name()
            && let Some(replacement) = dest.pseudo_class_replacement(name)
        {
            return dest.write_str(replacement);
        }

        match self {
            PseudoClass::Hover => dest.write_str(":hover"),
            PseudoClass::Active => dest.write_str(":active"),
            PseudoClass::Focus => dest.write_str(":focus"),
            PseudoClass::FocusVisible => dest.write_str(":focus-visible"),
            PseudoClass::FocusWithin => dest.write_str(":focus-within"),
            PseudoClass::Fullscreen(prefix) => match prefix {
                VendorPrefix::None => dest.write_str(":fullscreen"),
                VendorPrefix::WebKit => dest.write_str(":-webkit-full-screen"),
                VendorPrefix::Moz => dest.write_str(":-moz-full-screen"),
                VendorPrefix::Ms => dest.write_str(":-ms-fullscreen"),
                VendorPrefix::O => dest.write_str(":fullscreen"),
            },
            PseudoClass::Not(selectors) => {
                dest.write_str(":not(")?;
                for (i, selector) in selectors.iter().enumerate() {
                    if i > 0 {
                        dest.delim(',', false)?;
                    }
                    selector.to_css(dest)?;
                }
                dest.write_char(')')
            }
            // Scope wrappers are erased on output; only their contents print.
            // Global contents stay as authored even when a local binding
            // shares the name.
            PseudoClass::Global(inner) => {
                let saved = dest.set_unscoped(true);
                let result = inner.to_css(dest);
                dest.set_unscoped(saved);
                result
            }
            PseudoClass::Local(inner) => inner.to_css(dest),
            PseudoClass::Custom(name) => {
                dest.write_char(':')?;
                dest.write_ident(name)
            }
            PseudoClass::CustomFunction { name, arguments } => {
                dest.write_char(':')?;
                dest.write_ident(name)?;
                dest.write_char('(')?;
                dest.write_str(arguments)?;
                dest.write_char(')')
            }
        }
    }
}

impl ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match self {
            PseudoElement::Before => dest.write_str("::before"),
            PseudoElement::After => dest.write_str("::after"),
            PseudoElement::FirstLine => dest.write_str("::first-line"),
            PseudoElement::FirstLetter => dest.write_str("::first-letter"),
            PseudoElement::Selection => dest.write_str("::selection"),
            PseudoElement::Placeholder(prefix) => match prefix {
                VendorPrefix::None => dest.write_str("::placeholder"),
                VendorPrefix::WebKit => dest.write_str("::-webkit-input-placeholder"),
                VendorPrefix::Moz => dest.write_str("::-moz-placeholder"),
                // IE exposes placeholder styling as a pseudo-class.
                VendorPrefix::Ms => dest.write_str(":-ms-input-placeholder"),
                VendorPrefix::O => dest.write_str("::placeholder"),
            },
            PseudoElement::Custom(name) => {
                dest.write_str("::")?;
                dest.write_ident(name)
            }
        }
    }
}

impl ToCss for AttrSelector {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        dest.write_char('[')?;
        dest.write_ident(&self.name)?;
        if let Some((op, value)) = &self.matcher {
            dest.write_str(op.as_str())?;
            dest.write_string_literal(value)?;
            if self.case_insensitive {
                dest.write_str(" i")?;
            }
        }
        dest.write_char(']')
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::ToCss;

    #[test]
    fn selector_display() {
        let selector = Selector::new(vec![
            Component::Type(TypeSelector::Name("a".into())),
            Component::Class("primary".into()),
            Component::PseudoClass(PseudoClass::Hover),
            Component::Combinator(Combinator::Child),
            Component::Type(TypeSelector::Name("span".into())),
        ]);
        assert_eq!(selector.to_string(), "a.primary:hover > span");
    }

    #[test]
    fn attribute_selector_display() {
        let selector = Selector::new(vec![Component::Attribute(AttrSelector {
            name: "href".into(),
            matcher: Some((AttrOperator::Prefix, "https:".into())),
            case_insensitive: false,
        })]);
        assert_eq!(selector.to_css_string(), "[href^=\"https:\"]");
    }

    #[test]
    fn global_wrapper_is_erased() {
        let selector = Selector::new(vec![Component::PseudoClass(PseudoClass::Global(
            Box::new(Selector::new(vec![Component::Class("foo".into())])),
        ))]);
        assert_eq!(selector.to_css_string(), ".foo");
    }

    #[test]
    fn class_names_traverses_wrappers() {
        let selector = Selector::new(vec![
            Component::Class("a".into()),
            Component::PseudoClass(PseudoClass::Not(vec![Selector::new(vec![
                Component::Class("b".into()),
            ])])),
        ]);
        assert_eq!(selector.class_names(), vec!["a", "b"]);
    }

    #[test]
    fn owned_class_names_skip_not_arguments() {
        let selector = Selector::new(vec![
            Component::Class("a".into()),
            Component::PseudoClass(PseudoClass::Not(vec![Selector::new(vec![
                Component::Class("b".into()),
            ])])),
        ]);
        assert_eq!(selector.owned_class_names(), vec!["a"]);
    }
}
