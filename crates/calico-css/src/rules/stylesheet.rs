//! The stylesheet: parse, transform, serialize.

use std::path::Path;

use super::style::{write_declaration_block, StyleRule};
use super::CssRule;
use crate::css_modules::{
    placeholder_name, CssModuleExport, CssModuleReference, LocalScope, Placeholder,
};
use crate::error::{Error, Result};
use crate::parser::{parse_stylesheet, ParserOptions, Warning};
use crate::printer::{Printer, PrinterOptions, ToCss};
use crate::sourcemap::SourceMap;
use crate::tokenizer::Span;
use crate::transform::{self, TransformOptions};

/// A parsed stylesheet.
///
/// The pipeline is parse, optionally transform (at most once), then print.
/// Printing never mutates the sheet, so one transformed sheet can be
/// serialized multiple times with different printer options.
#[derive(Debug)]
pub struct StyleSheet {
    /// The filename, as given in the parser options.
    pub filename: String,
    /// Top-level rules in source order.
    pub rules: Vec<CssRule>,
    source: String,
    options: ParserOptions,
    local_scope: Option<LocalScope>,
    warnings: Vec<Warning>,
}

/// The output of serializing a stylesheet.
#[derive(Debug)]
pub struct ToCssResult {
    /// The generated CSS.
    pub code: String,
    /// The source map JSON, when requested.
    pub map: Option<String>,
    /// The CSS Modules exports manifest. Empty unless modules are enabled.
    pub exports: Vec<CssModuleExport>,
    /// Cross-module references left as placeholders in `code`.
    pub references: Vec<Placeholder>,
}

impl StyleSheet {
    /// Parse a stylesheet from a string.
    pub fn parse(source: &str, options: ParserOptions) -> Result<StyleSheet> {
        let (rules, warnings) = parse_stylesheet(source, &options)?;
        Ok(StyleSheet {
            filename: options.filename.clone(),
            rules,
            source: source.to_string(),
            options,
            local_scope: None,
            warnings,
        })
    }

    /// Read and parse a stylesheet from disk. The path becomes the filename
    /// unless the options already set one.
    pub fn from_file(path: impl AsRef<Path>, mut options: ParserOptions) -> Result<StyleSheet> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        if options.filename.is_empty() {
            options.filename = path.display().to_string();
        }
        StyleSheet::parse(&source, options)
    }

    /// Recoverable diagnostics accumulated so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The CSS Modules scope table, once [`StyleSheet::transform`] has run.
    pub fn local_scope(&self) -> Option<&LocalScope> {
        self.local_scope.as_ref()
    }

    /// Transform the sheet in place: downlevel for target browsers, remove
    /// unused rules, and resolve CSS Modules.
    pub fn transform(&mut self, options: &TransformOptions) -> Result<()> {
        self.local_scope = transform::apply(
            &mut self.rules,
            &self.options,
            options,
            &mut self.warnings,
        )?;
        Ok(())
    }

    /// Serialize to CSS text, plus the source map, exports manifest, and
    /// placeholder references.
    pub fn to_css(&self, options: PrinterOptions) -> Result<ToCssResult> {
        let mut code = String::new();
        let mut map = options
            .source_map
            .then(|| SourceMap::new(self.filename.clone(), self.source.clone()));

        let references = {
            let mut printer = Printer::new(&mut code, options.minify);
            if let Some(map) = &mut map {
                printer = printer.with_source_map(map);
            }
            if let Some(scope) = &self.local_scope {
                printer = printer.with_scope(scope);
            }
            printer = printer.with_pseudo_classes(&options.pseudo_classes);
            self.write_rules(&mut printer)?;
            // Dependency composes are cross-module references too; the
            // bundler resolves them alongside the var() placeholders.
            if let Some(scope) = &self.local_scope {
                for export in scope.exports() {
                    for reference in &export.composes {
                        if let CssModuleReference::Dependency { name, specifier } = reference {
                            printer.record_placeholder(Placeholder {
                                placeholder: placeholder_name(specifier, name, Span::default()),
                                specifier: specifier.clone(),
                                name: name.clone(),
                            });
                        }
                    }
                }
            }
            printer.take_placeholders()
        };

        let map = match map {
            Some(map) => Some(map.to_json()?),
            None => None,
        };
        let exports = self
            .local_scope
            .as_ref()
            .map(LocalScope::exports)
            .unwrap_or_default();
        Ok(ToCssResult {
            code,
            map,
            exports,
            references,
        })
    }

    fn write_rules<W: std::fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        let mut first = true;
        let mut i = 0;
        while i < self.rules.len() {
            // Under minification, adjacent style rules with identical
            // declaration blocks collapse into one rule with a combined
            // selector list.
            let group_end = if dest.minify {
                self.merge_group_end(i)
            } else {
                i + 1
            };

            if dest.minify
                && self.local_scope.is_none()
                && matches!(&self.rules[i], CssRule::Style(rule) if rule.is_empty())
            {
                i = group_end;
                continue;
            }

            if !first {
                dest.newline()?;
                if !dest.minify {
                    dest.write_char('\n')?;
                }
            }
            first = false;

            if group_end > i + 1 {
                self.write_merged(i, group_end, dest)?;
            } else {
                self.rules[i].to_css(dest)?;
            }
            i = group_end;
        }
        if !first && !dest.minify {
            dest.write_char('\n')?;
        }
        Ok(())
    }

    /// The end of the run of adjacent style rules starting at `start` that
    /// share identical declarations.
    fn merge_group_end(&self, start: usize) -> usize {
        let CssRule::Style(base) = &self.rules[start] else {
            return start + 1;
        };
        let mut end = start + 1;
        while end < self.rules.len() {
            match &self.rules[end] {
                CssRule::Style(next) if same_declarations(base, next) => end += 1,
                _ => break,
            }
        }
        end
    }

    fn write_merged<W: std::fmt::Write>(
        &self,
        start: usize,
        end: usize,
        dest: &mut Printer<'_, W>,
    ) -> Result<()> {
        let CssRule::Style(base) = &self.rules[start] else {
            return Err(Error::print("merge group must start with a style rule"));
        };
        dest.add_mapping(base.loc);
        let mut first = true;
        for rule in &self.rules[start..end] {
            let CssRule::Style(rule) = rule else {
                return Err(Error::print("merge group must contain style rules"));
            };
            for selector in &rule.selectors.0 {
                if !first {
                    dest.delim(',', false)?;
                }
                first = false;
                selector.to_css(dest)?;
            }
        }
        write_declaration_block(&base.declarations, dest)
    }
}

fn same_declarations(a: &StyleRule, b: &StyleRule) -> bool {
    a.declarations.len() == b.declarations.len()
        && a.declarations
            .iter()
            .zip(&b.declarations)
            .all(|(a, b)| a.same_as(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minified(css: &str) -> String {
        let sheet = StyleSheet::parse(css, ParserOptions::default()).unwrap();
        sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .unwrap()
            .code
    }

    #[test]
    fn pretty_output_round_trips() {
        let sheet = StyleSheet::parse(
            ".a { color: red; }\n\n.b { margin: 0; }\n",
            ParserOptions::default(),
        )
        .unwrap();
        let result = sheet.to_css(PrinterOptions::default()).unwrap();
        assert_eq!(result.code, ".a {\n  color: red;\n}\n\n.b {\n  margin: 0;\n}\n");
    }

    #[test]
    fn minified_output() {
        assert_eq!(
            minified(".a { color: red; margin: 0 }"),
            ".a{color:red;margin:0}"
        );
    }

    #[test]
    fn adjacent_identical_rules_merge_under_minify() {
        assert_eq!(
            minified(".a { color: red } .b { color: red }"),
            ".a,.b{color:red}"
        );
    }

    #[test]
    fn non_adjacent_rules_do_not_merge() {
        assert_eq!(
            minified(".a { color: red } .x { margin: 0 } .b { color: red }"),
            ".a{color:red}.x{margin:0}.b{color:red}"
        );
    }

    #[test]
    fn empty_rules_dropped_under_minify() {
        assert_eq!(minified(".a { } .b { color: red }"), ".b{color:red}");
    }

    #[test]
    fn source_map_is_emitted() {
        let sheet = StyleSheet::parse(
            ".a { color: red }",
            ParserOptions {
                filename: "input.css".into(),
                ..ParserOptions::default()
            },
        )
        .unwrap();
        let result = sheet
            .to_css(PrinterOptions {
                source_map: true,
                ..PrinterOptions::default()
            })
            .unwrap();
        let map = result.map.expect("source map requested");
        assert!(map.contains("\"version\":3"));
        assert!(map.contains("input.css"));
    }
}
