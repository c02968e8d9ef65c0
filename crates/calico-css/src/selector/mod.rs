//! Selector data model.

mod types;

pub use types::{
    AttrOperator, AttrSelector, Combinator, Component, PseudoClass, PseudoElement, Selector,
    SelectorList, TypeSelector,
};
