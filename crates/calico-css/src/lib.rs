//! CSS stylesheet compiler.
//!
//! Parses CSS into an owned rule tree, transforms it for a set of target
//! browsers, and serializes it back out, featuring:
//!
//! - **Parsing**: error-recovering parser over the `cssparser` tokenizer
//! - **Downleveling**: modern color spaces to sRGB, vendor prefix fallbacks
//! - **CSS Modules**: scoped class names, `composes`, an exports manifest
//! - **Dead code elimination**: drop rules for unused exports
//! - **Printing**: pretty or minified output, with source maps
//!
//! # Example
//!
//! ```
//! use calico_css::prelude::*;
//!
//! let mut sheet = StyleSheet::parse(
//!     ".card { color: oklch(0.6 0.15 250) }",
//!     ParserOptions::default(),
//! )?;
//! sheet.transform(&TransformOptions {
//!     targets: Some(Browsers::from_query("safari >= 12")?),
//!     ..TransformOptions::default()
//! })?;
//! let result = sheet.to_css(PrinterOptions::default())?;
//! assert!(!result.code.contains("oklch"));
//! # Ok::<(), calico_css::Error>(())
//! ```

pub mod compat;
pub mod css_modules;
pub mod parser;
pub mod printer;
pub mod rules;
pub mod selector;
pub mod sourcemap;
pub mod targets;
pub mod tokenizer;
pub mod transform;
pub mod values;
pub mod vendor_prefix;

mod error;

pub use error::{Error, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::css_modules::{CssModuleExport, CssModuleReference, Placeholder};
    pub use crate::parser::ParserOptions;
    pub use crate::printer::{PrinterOptions, ToCss};
    pub use crate::rules::{CssRule, StyleSheet, ToCssResult};
    pub use crate::targets::Browsers;
    pub use crate::transform::TransformOptions;
    pub use crate::{Error, Result};
}
