//! CSS Modules support: scoped names, the exports manifest, and the
//! placeholder protocol for cross-module references.
//!
//! Scoping is deterministic. A compiled name depends only on the configured
//! pattern, the stylesheet filename, and the original identifier, so repeated
//! compiles of the same input produce identical output.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::tokenizer::Span;

/// A compiled scoped-name pattern.
///
/// Patterns are written with bracketed placeholders, for example
/// `"[hash]_[local]"`. Unknown placeholders are a configuration error.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    /// `[name]`: the stylesheet file stem.
    Name,
    /// `[local]`: the original identifier.
    Local,
    /// `[hash]`: a deterministic hash of filename and identifier.
    Hash,
}

impl Default for Pattern {
    fn default() -> Self {
        // Matches the common bundler default of hash-qualified local names.
        Pattern {
            segments: vec![Segment::Hash, Segment::Literal("_".into()), Segment::Local],
        }
    }
}

impl Pattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Pattern> {
        let mut segments = Vec::new();
        let mut rest = pattern;
        while !rest.is_empty() {
            match rest.find('[') {
                Some(open) => {
                    if open > 0 {
                        segments.push(Segment::Literal(rest[..open].into()));
                    }
                    let close = rest[open..]
                        .find(']')
                        .map(|i| open + i)
                        .ok_or_else(|| Error::pattern(format!("unclosed '[' in \"{pattern}\"")))?;
                    let segment = match &rest[open + 1..close] {
                        "name" => Segment::Name,
                        "local" => Segment::Local,
                        "hash" => Segment::Hash,
                        other => {
                            return Err(Error::pattern(format!(
                                "unknown placeholder \"[{other}]\" in \"{pattern}\""
                            )));
                        }
                    };
                    segments.push(segment);
                    rest = &rest[close + 1..];
                }
                None => {
                    segments.push(Segment::Literal(rest.into()));
                    break;
                }
            }
        }
        if segments.is_empty() {
            return Err(Error::pattern("pattern is empty"));
        }
        Ok(Pattern { segments })
    }

    /// Expand the pattern for one identifier.
    pub fn expand(&self, filename: &str, local: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(file_stem(filename)),
                Segment::Local => out.push_str(local),
                Segment::Hash => out.push_str(&hash_ident(filename, local)),
            }
        }
        out
    }
}

fn file_stem(filename: &str) -> &str {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    base.split('.').next().unwrap_or(base)
}

/// Deterministic FNV-1a hash of filename and identifier, rendered in base 36
/// and prefixed so the result always starts with a letter.
pub fn hash_ident(filename: &str, local: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in filename.bytes().chain([0u8]).chain(local.bytes()) {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    // All 64 bits feed the name; base 36 of a u64 needs at most 13 digits.
    let mut digits = [0u8; 13];
    let mut value = hash;
    let mut i = digits.len();
    loop {
        i -= 1;
        let d = (value % 36) as u8;
        digits[i] = if d < 10 { b'0' + d } else { b'a' + d - 10 };
        value /= 36;
        if value == 0 {
            break;
        }
    }
    let mut out = String::with_capacity(1 + digits.len() - i);
    out.push('x');
    out.push_str(std::str::from_utf8(&digits[i..]).unwrap_or(""));
    out
}

/// What kind of identifier a local binding scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Class,
    Keyframes,
    DashedIdent,
}

/// A reference from a compiled name to another name it composes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CssModuleReference {
    /// A compiled name from this stylesheet.
    Local { name: String },
    /// An unscoped global name.
    Global { name: String },
    /// A name exported by another module.
    Dependency { name: String, specifier: String },
}

/// One entry in the exports manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssModuleExport {
    /// The identifier as authored.
    pub original: String,
    /// The compiled scoped name.
    pub name: String,
    /// Names this export composes, in composition order.
    pub composes: Vec<CssModuleReference>,
}

/// A placeholder recorded during printing for a value that can only be
/// resolved once a dependency module has compiled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    /// The synthetic name that appears in the output CSS.
    pub placeholder: String,
    /// The dependency module specifier.
    pub specifier: String,
    /// The original identifier within the dependency.
    pub name: String,
}

#[derive(Debug, Clone)]
struct Binding {
    original: String,
    scoped: String,
    kind: BindingKind,
    composes: Vec<CssModuleReference>,
}

/// The table of local bindings for one stylesheet.
///
/// Bindings are appended during transformation and frozen before printing;
/// the printer only reads the table.
#[derive(Debug, Default)]
pub struct LocalScope {
    bindings: Vec<Binding>,
    by_original: HashMap<(String, BindingKind), usize>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a local identifier, returning its scoped name. Idempotent:
    /// registering the same identifier twice returns the same name.
    pub fn add_local(
        &mut self,
        pattern: &Pattern,
        filename: &str,
        original: &str,
        kind: BindingKind,
    ) -> String {
        let key = (original.to_string(), kind);
        if let Some(&index) = self.by_original.get(&key) {
            return self.bindings[index].scoped.clone();
        }
        let scoped = pattern.expand(filename, original);
        self.bindings.push(Binding {
            original: original.to_string(),
            scoped: scoped.clone(),
            kind,
            composes: Vec::new(),
        });
        self.by_original.insert(key, self.bindings.len() - 1);
        scoped
    }

    /// Look up the scoped name for an identifier, if it was registered.
    pub fn get(&self, original: &str, kind: BindingKind) -> Option<&str> {
        self.by_original
            .get(&(original.to_string(), kind))
            .map(|&i| self.bindings[i].scoped.as_str())
    }

    /// Attach a composed reference to an existing binding.
    pub fn add_composes(&mut self, original: &str, kind: BindingKind, re: CssModuleReference) {
        if let Some(&index) = self.by_original.get(&(original.to_string(), kind))
            && !self.bindings[index].composes.contains(&re)
        {
            self.bindings[index].composes.push(re);
        }
    }

    /// Whether any bindings were registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Build the exports manifest, in source declaration order.
    pub fn exports(&self) -> Vec<CssModuleExport> {
        self.bindings
            .iter()
            .map(|b| CssModuleExport {
                original: b.original.clone(),
                name: b.scoped.clone(),
                composes: b.composes.clone(),
            })
            .collect()
    }

    /// Scoped names of every binding of the given kind.
    pub fn names_of_kind(&self, kind: BindingKind) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .filter(move |b| b.kind == kind)
            .map(|b| b.scoped.as_str())
    }
}

/// Derive the synthetic placeholder identifier for a dependency reference.
///
/// The span of the referencing token feeds the hash so distinct references
/// to the same dependency name stay distinguishable to the bundler only by
/// specifier and name, not position. Placeholders are plain identifiers.
pub fn placeholder_name(specifier: &str, name: &str, _span: Span) -> String {
    format!("{}_{}", hash_ident(specifier, name), sanitize(name))
}

fn sanitize(name: &str) -> String {
    name.trim_start_matches('-')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
