//! Source map generation (source map v3, base64 VLQ mappings).

use serde::Serialize;

use crate::error::Result;

/// A mapping from a generated position to an original position.
/// All positions are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mapping {
    generated_line: u32,
    generated_column: u32,
    original_line: u32,
    original_column: u32,
}

/// An in-progress source map for a single input file.
///
/// The printer appends mappings in generated order while it writes; the map
/// is serialized to JSON once printing completes.
#[derive(Debug)]
pub struct SourceMap {
    source: String,
    source_content: String,
    mappings: Vec<Mapping>,
}

#[derive(Serialize)]
struct SourceMapJson<'a> {
    version: u8,
    sources: Vec<&'a str>,
    #[serde(rename = "sourcesContent")]
    sources_content: Vec<&'a str>,
    names: Vec<&'a str>,
    mappings: String,
}

impl SourceMap {
    pub fn new(source: impl Into<String>, source_content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_content: source_content.into(),
            mappings: Vec::new(),
        }
    }

    /// Record a mapping. Positions are 0-indexed.
    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        original_line: u32,
        original_column: u32,
    ) {
        let mapping = Mapping {
            generated_line,
            generated_column,
            original_line,
            original_column,
        };
        // The printer emits mappings in generated order; drop duplicates for
        // the same generated position.
        if self.mappings.last() != Some(&mapping) {
            self.mappings.push(mapping);
        }
    }

    /// Serialize to source map v3 JSON.
    pub fn to_json(&self) -> Result<String> {
        let json = SourceMapJson {
            version: 3,
            sources: vec![self.source.as_str()],
            sources_content: vec![self.source_content.as_str()],
            names: vec![],
            mappings: self.serialize_mappings(),
        };
        serde_json::to_string(&json)
            .map_err(|e| crate::error::Error::print(format!("source map serialization: {e}")))
    }

    fn serialize_mappings(&self) -> String {
        let mut out = String::new();
        let mut line = 0u32;
        let mut prev_generated_column = 0i64;
        let mut prev_original_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut first_in_line = true;

        for mapping in &self.mappings {
            while line < mapping.generated_line {
                out.push(';');
                line += 1;
                prev_generated_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            encode_vlq(mapping.generated_column as i64 - prev_generated_column, &mut out);
            // Single source file, so the source index delta is always 0.
            encode_vlq(0, &mut out);
            encode_vlq(mapping.original_line as i64 - prev_original_line, &mut out);
            encode_vlq(mapping.original_column as i64 - prev_original_column, &mut out);

            prev_generated_column = mapping.generated_column as i64;
            prev_original_line = mapping.original_line as i64;
            prev_original_column = mapping.original_column as i64;
        }
        out
    }
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(value: i64, out: &mut String) {
    // Sign bit goes in the low bit of the first digit.
    let mut rest = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (rest & 0x1f) as u8;
        rest >>= 5;
        if rest != 0 {
            digit |= 0x20;
        }
        out.push(BASE64[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}
