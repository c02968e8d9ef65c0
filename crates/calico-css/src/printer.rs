//! The CSS serializer.
//!
//! [`Printer`] wraps a `fmt::Write` sink and tracks the generated position
//! so rules can record source map entries as they print. It also carries the
//! print-time context the node types cannot know about on their own: the
//! CSS Modules scope table, the pseudo-class rename map, and the placeholder
//! log for cross-module references.

use std::collections::HashMap;
use std::fmt;

use cssparser::{serialize_identifier, serialize_string};

use crate::css_modules::{placeholder_name, BindingKind, LocalScope, Placeholder};
use crate::error::Result;
use crate::rules::Location;
use crate::sourcemap::SourceMap;
use crate::tokenizer::Span;

/// Options controlling serialization.
#[derive(Debug, Default)]
pub struct PrinterOptions {
    /// Emit compact output: no indentation, no optional whitespace.
    pub minify: bool,
    /// Generate a source map alongside the CSS.
    pub source_map: bool,
    /// Print-time pseudo-class substitution, e.g. `hover` to `.is-hover`.
    /// Keys are unprefixed pseudo-class names without the leading colon.
    pub pseudo_classes: HashMap<String, String>,
}

/// A serialization sink with position tracking and print-time context.
pub struct Printer<'a, W: fmt::Write> {
    dest: &'a mut W,
    /// 0-indexed generated line.
    pub line: u32,
    /// 0-indexed generated column, in characters.
    pub col: u32,
    pub minify: bool,
    indent_level: u32,
    source_map: Option<&'a mut SourceMap>,
    scope: Option<&'a LocalScope>,
    /// Set while serializing `:global(...)` contents, which must print as
    /// authored even when a local binding shares the name.
    unscoped: bool,
    pseudo_classes: Option<&'a HashMap<String, String>>,
    placeholders: Vec<Placeholder>,
}

impl<'a, W: fmt::Write> Printer<'a, W> {
    pub fn new(dest: &'a mut W, minify: bool) -> Self {
        Printer {
            dest,
            line: 0,
            col: 0,
            minify,
            indent_level: 0,
            source_map: None,
            scope: None,
            unscoped: false,
            pseudo_classes: None,
            placeholders: Vec::new(),
        }
    }

    pub fn with_source_map(mut self, source_map: &'a mut SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    pub fn with_scope(mut self, scope: &'a LocalScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_pseudo_classes(mut self, map: &'a HashMap<String, String>) -> Self {
        if !map.is_empty() {
            self.pseudo_classes = Some(map);
        }
        self
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.dest.write_str(s)?;
        for c in s.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        Ok(())
    }

    pub fn write_char(&mut self, c: char) -> Result<()> {
        self.dest.write_char(c)?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Ok(())
    }

    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        let formatted = args.to_string();
        self.write_str(&formatted)
    }

    /// A single optional space, elided under minification.
    pub fn whitespace(&mut self) -> Result<()> {
        if !self.minify {
            self.write_char(' ')?;
        }
        Ok(())
    }

    /// A delimiter with optional whitespace before and after.
    pub fn delim(&mut self, delim: char, ws_before: bool) -> Result<()> {
        if ws_before {
            self.whitespace()?;
        }
        self.write_char(delim)?;
        self.whitespace()
    }

    /// A newline followed by the current indentation, elided under
    /// minification.
    pub fn newline(&mut self) -> Result<()> {
        if self.minify {
            return Ok(());
        }
        self.write_char('\n')?;
        for _ in 0..self.indent_level {
            self.write_str("  ")?;
        }
        Ok(())
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Record a source map entry tying the current generated position to an
    /// original (1-indexed) location.
    pub fn add_mapping(&mut self, loc: Location) {
        let (line, col) = (self.line, self.col);
        if let Some(map) = &mut self.source_map {
            map.add_mapping(
                line,
                col,
                loc.line.saturating_sub(1),
                loc.column.saturating_sub(1),
            );
        }
    }

    /// Write an identifier, escaping as needed.
    pub fn write_ident(&mut self, ident: &str) -> Result<()> {
        let mut escaped = String::with_capacity(ident.len());
        serialize_identifier(ident, &mut escaped)?;
        self.write_str(&escaped)
    }

    /// Write a quoted string literal.
    pub fn write_string_literal(&mut self, value: &str) -> Result<()> {
        let mut quoted = String::with_capacity(value.len() + 2);
        serialize_string(value, &mut quoted)?;
        self.write_str(&quoted)
    }

    /// Write a number with minimal digits.
    pub fn write_number(&mut self, value: f32) -> Result<()> {
        if value == 0.0 {
            return self.write_char('0');
        }
        if value.fract() == 0.0 && value.abs() < 1e10 {
            return self.write_fmt(format_args!("{}", value as i64));
        }
        let mut formatted = format!("{:.5}", value);
        while formatted.ends_with('0') {
            formatted.pop();
        }
        if formatted.ends_with('.') {
            formatted.pop();
        }
        if self.minify {
            // ".5" parses the same as "0.5".
            if let Some(rest) = formatted.strip_prefix("0.") {
                return self.write_fmt(format_args!(".{rest}"));
            }
            if let Some(rest) = formatted.strip_prefix("-0.") {
                return self.write_fmt(format_args!("-.{rest}"));
            }
        }
        self.write_str(&formatted)
    }

    /// Write a class name, applying the scope table when one is installed.
    /// Names without a local binding print as authored.
    pub fn write_scoped_class(&mut self, name: &str) -> Result<()> {
        self.write_scoped(name, BindingKind::Class)
    }

    /// Write a keyframes (animation) name, applying the scope table.
    pub fn write_keyframes_name(&mut self, name: &str) -> Result<()> {
        self.write_scoped(name, BindingKind::Keyframes)
    }

    /// Suppress scoped-name substitution, returning the previous state so
    /// nested wrappers restore correctly.
    pub(crate) fn set_unscoped(&mut self, unscoped: bool) -> bool {
        std::mem::replace(&mut self.unscoped, unscoped)
    }

    fn write_scoped(&mut self, name: &str, kind: BindingKind) -> Result<()> {
        if self.unscoped {
            return self.write_ident(name);
        }
        let scoped = self
            .scope
            .and_then(|scope| scope.get(name, kind))
            .map(str::to_owned);
        match scoped {
            Some(scoped) => self.write_ident(&scoped),
            None => self.write_ident(name),
        }
    }

    /// Write a `--dashed` identifier, applying the scope table to the part
    /// after the dashes.
    pub fn write_dashed_ident(&mut self, ident: &str) -> Result<()> {
        let local = ident.strip_prefix("--").unwrap_or(ident);
        self.write_str("--")?;
        self.write_scoped(local, BindingKind::DashedIdent)
    }

    /// The configured substitution for a pseudo-class, if any.
    pub fn pseudo_class_replacement(&self, name: &str) -> Option<&'a str> {
        self.pseudo_classes?.get(name).map(String::as_str)
    }

    /// Record a cross-module variable reference and return the placeholder
    /// identifier to print in its place. Stable per (specifier, name) pair.
    pub fn variable_placeholder(&mut self, name: &str, specifier: &str, span: Span) -> String {
        let placeholder = placeholder_name(specifier, name, span);
        if !self.placeholders.iter().any(|p| p.placeholder == placeholder) {
            self.placeholders.push(Placeholder {
                placeholder: placeholder.clone(),
                specifier: specifier.to_string(),
                name: name.to_string(),
            });
        }
        placeholder
    }

    /// Record a placeholder for a dependency `composes` reference.
    pub(crate) fn record_placeholder(&mut self, placeholder: Placeholder) {
        if !self
            .placeholders
            .iter()
            .any(|p| p.placeholder == placeholder.placeholder)
        {
            self.placeholders.push(placeholder);
        }
    }

    /// The placeholders recorded during printing, in first-use order.
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub(crate) fn take_placeholders(&mut self) -> Vec<Placeholder> {
        std::mem::take(&mut self.placeholders)
    }
}

/// Serialization to CSS text.
pub trait ToCss {
    /// Serialize `self` to the printer.
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()>;

    /// Serialize to a standalone string with default (non-minified) options.
    fn to_css_string(&self) -> String {
        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false);
        // Infallible for an in-memory sink unless a node is unprintable,
        // which is a bug worth surfacing loudly in tests.
        self.to_css(&mut printer)
            .expect("serialization to a string failed");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css_modules::{LocalScope, Pattern};

    #[test]
    fn tracks_position() {
        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false);
        printer.write_str(".a {\n").unwrap();
        assert_eq!((printer.line, printer.col), (1, 0));
        printer.write_str("  color: red").unwrap();
        assert_eq!((printer.line, printer.col), (1, 12));
    }

    #[test]
    fn number_formatting() {
        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false);
        printer.write_number(12.0).unwrap();
        printer.write_char(' ').unwrap();
        printer.write_number(0.5).unwrap();
        printer.write_char(' ').unwrap();
        printer.write_number(1.25).unwrap();
        assert_eq!(out, "12 0.5 1.25");
    }

    #[test]
    fn minified_number_drops_leading_zero() {
        let mut out = String::new();
        let mut printer = Printer::new(&mut out, true);
        printer.write_number(0.5).unwrap();
        printer.write_char(' ').unwrap();
        printer.write_number(-0.25).unwrap();
        assert_eq!(out, ".5 -.25");
    }

    #[test]
    fn ident_escaping() {
        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false);
        printer.write_ident("2col").unwrap();
        assert_eq!(out, "\\32 col");
    }

    #[test]
    fn scoped_class_lookup() {
        let pattern = Pattern::parse("p_[local]").unwrap();
        let mut scope = LocalScope::new();
        scope.add_local(&pattern, "a.css", "foo", BindingKind::Class);

        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false).with_scope(&scope);
        printer.write_scoped_class("foo").unwrap();
        printer.write_char(' ').unwrap();
        printer.write_scoped_class("unbound").unwrap();
        assert_eq!(out, "p_foo unbound");
    }

    #[test]
    fn unscoped_context_ignores_bindings() {
        let pattern = Pattern::parse("p_[local]").unwrap();
        let mut scope = LocalScope::new();
        scope.add_local(&pattern, "a.css", "foo", BindingKind::Class);

        let mut out = String::new();
        let mut printer = Printer::new(&mut out, false).with_scope(&scope);
        let saved = printer.set_unscoped(true);
        printer.write_scoped_class("foo").unwrap();
        printer.set_unscoped(saved);
        printer.write_char(' ').unwrap();
        printer.write_scoped_class("foo").unwrap();
        assert_eq!(out, "foo p_foo");
    }
}
