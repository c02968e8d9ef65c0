//! Target browser resolution.
//!
//! Converts a human compatibility query (a comma-separated, browserslist-style
//! clause list) into a [`Browsers`] profile: the minimum supported version per
//! engine. Resolution is deterministic — it consults only the built-in release
//! table, never the network or the environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Encode a browser version as `major << 16 | minor << 8 | patch`.
pub const fn version(major: u32, minor: u32, patch: u32) -> u32 {
    (major & 0xff) << 16 | (minor & 0xff) << 8 | (patch & 0xff)
}

/// The minimum supported version per browser engine.
///
/// `None` means the browser is not part of the target set and places no
/// constraint on transformation. Immutable once built; the transformer only
/// reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Browsers {
    pub android: Option<u32>,
    pub chrome: Option<u32>,
    pub edge: Option<u32>,
    pub firefox: Option<u32>,
    pub ie: Option<u32>,
    pub ios_saf: Option<u32>,
    pub opera: Option<u32>,
    pub safari: Option<u32>,
    pub samsung: Option<u32>,
}

/// Latest known major release per browser. Static data, externally
/// maintained; used by `last N versions` clauses.
const LATEST: &[(&str, u32)] = &[
    ("android", 127),
    ("chrome", 127),
    ("edge", 127),
    ("firefox", 128),
    ("ios_saf", 17),
    ("opera", 112),
    ("safari", 17),
    ("samsung", 25),
];

impl Browsers {
    /// Resolve a compatibility query into a browser profile.
    ///
    /// The query is a comma-separated list of clauses. Supported clauses:
    ///
    /// - `defaults` / `modern` — named aggregate sets
    /// - `<browser> >= <version>`, `<browser> > <version>`,
    ///   `<browser> <version>` — version constraints
    /// - `last <n> versions` — the n most recent major releases of every
    ///   browser in the release table
    /// - `not <browser> ...` — removes the named browser from the profile
    ///
    /// An unrecognized clause is skipped with a warning. If no clause
    /// resolves at all, the query fails with [`Error::TargetQuery`].
    pub fn from_query(query: &str) -> Result<Browsers> {
        let mut browsers = Browsers::default();
        let mut resolved = 0usize;

        for clause in query.split(',') {
            let clause = clause.trim().to_ascii_lowercase();
            if clause.is_empty() {
                continue;
            }
            if resolve_clause(&clause, &mut browsers) {
                resolved += 1;
            } else {
                tracing::warn!("ignoring unrecognized target clause: {:?}", clause);
            }
        }

        if resolved == 0 {
            return Err(Error::target_query(query.trim().to_string()));
        }
        Ok(browsers)
    }

    /// Iterate over the browsers present in this profile.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        [
            ("android", self.android),
            ("chrome", self.chrome),
            ("edge", self.edge),
            ("firefox", self.firefox),
            ("ie", self.ie),
            ("ios_saf", self.ios_saf),
            ("opera", self.opera),
            ("safari", self.safari),
            ("samsung", self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<u32>> {
        match name {
            "android" => Some(&mut self.android),
            "chrome" | "and_chr" => Some(&mut self.chrome),
            "edge" => Some(&mut self.edge),
            "firefox" | "ff" | "and_ff" => Some(&mut self.firefox),
            "ie" => Some(&mut self.ie),
            "ios_saf" | "ios" => Some(&mut self.ios_saf),
            "opera" => Some(&mut self.opera),
            "safari" => Some(&mut self.safari),
            "samsung" => Some(&mut self.samsung),
            _ => None,
        }
    }

    /// Lower the minimum version for `name`, union-style: the loosest clause
    /// wins, so the resulting profile supports every queried environment.
    fn set_min(&mut self, name: &str, v: u32) -> bool {
        match self.slot(name) {
            Some(slot) => {
                *slot = Some(match *slot {
                    Some(existing) => existing.min(v),
                    None => v,
                });
                true
            }
            None => false,
        }
    }
}

fn resolve_clause(clause: &str, browsers: &mut Browsers) -> bool {
    if let Some(rest) = clause.strip_prefix("not ") {
        // Exclusion: drop the named browser from the accumulated profile.
        let name = rest.trim().split_whitespace().next().unwrap_or("");
        return match browsers.slot(name) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        };
    }

    match clause {
        "defaults" => {
            browsers.set_min("chrome", version(109, 0, 0));
            browsers.set_min("edge", version(126, 0, 0));
            browsers.set_min("firefox", version(115, 0, 0));
            browsers.set_min("ios_saf", version(15, 6, 0));
            browsers.set_min("safari", version(15, 6, 0));
            browsers.set_min("opera", version(102, 0, 0));
            browsers.set_min("samsung", version(23, 0, 0));
            return true;
        }
        "modern" => {
            browsers.set_min("chrome", version(120, 0, 0));
            browsers.set_min("edge", version(120, 0, 0));
            browsers.set_min("firefox", version(121, 0, 0));
            browsers.set_min("ios_saf", version(17, 0, 0));
            browsers.set_min("safari", version(17, 0, 0));
            browsers.set_min("opera", version(106, 0, 0));
            return true;
        }
        _ => {}
    }

    // last N versions
    if let Some(rest) = clause.strip_prefix("last ") {
        if let Some(n) = rest
            .strip_suffix(" versions")
            .or_else(|| rest.strip_suffix(" version"))
            .and_then(|n| n.trim().parse::<u32>().ok())
        {
            for (name, latest) in LATEST {
                let major = latest.saturating_sub(n.saturating_sub(1)).max(1);
                browsers.set_min(name, version(major, 0, 0));
            }
            return true;
        }
        return false;
    }

    // <browser> [op] <version>
    let mut parts = clause.split_whitespace();
    let name = match parts.next() {
        Some(n) => n,
        None => return false,
    };
    let (op, ver) = match (parts.next(), parts.next()) {
        (Some(op @ (">=" | ">" | "=")), Some(v)) => (op, v),
        (Some(v), None) => ("=", v),
        _ => return false,
    };
    let Some(mut encoded) = parse_version(ver) else {
        return false;
    };
    if op == ">" {
        // Exclusive bound: the next major release.
        encoded = version((encoded >> 16) + 1, 0, 0);
    }
    browsers.set_min(name, encoded)
}

fn parse_version(s: &str) -> Option<u32> {
    let mut iter = s.split('.');
    let major = iter.next()?.parse::<u32>().ok()?;
    let minor = match iter.next() {
        Some(m) => m.parse::<u32>().ok()?,
        None => 0,
    };
    let patch = match iter.next() {
        Some(p) => p.parse::<u32>().ok()?,
        None => 0,
    };
    if iter.next().is_some() {
        return None;
    }
    Some(version(major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_version_clause() {
        let b = Browsers::from_query("chrome >= 90").unwrap();
        assert_eq!(b.chrome, Some(version(90, 0, 0)));
        assert_eq!(b.firefox, None);
    }

    #[test]
    fn union_takes_minimum() {
        let b = Browsers::from_query("chrome >= 90, chrome >= 60").unwrap();
        assert_eq!(b.chrome, Some(version(60, 0, 0)));
    }

    #[test]
    fn dotted_versions() {
        let b = Browsers::from_query("safari >= 15.4, ios_saf 12.2").unwrap();
        assert_eq!(b.safari, Some(version(15, 4, 0)));
        assert_eq!(b.ios_saf, Some(version(12, 2, 0)));
    }

    #[test]
    fn exclusive_bound_rounds_up() {
        let b = Browsers::from_query("firefox > 100").unwrap();
        assert_eq!(b.firefox, Some(version(101, 0, 0)));
    }

    #[test]
    fn not_clause_removes_browser() {
        let b = Browsers::from_query("defaults, not ie, not samsung").unwrap();
        assert_eq!(b.ie, None);
        assert_eq!(b.samsung, None);
        assert!(b.chrome.is_some());
    }

    #[test]
    fn unknown_clause_is_skipped() {
        let b = Browsers::from_query("chrome >= 90, cover 99.5%").unwrap();
        assert_eq!(b.chrome, Some(version(90, 0, 0)));
    }

    #[test]
    fn fully_unresolvable_query_fails() {
        let err = Browsers::from_query("cover 99.5%").unwrap_err();
        assert!(matches!(err, Error::TargetQuery(_)));
    }

    #[test]
    fn deterministic() {
        let a = Browsers::from_query("defaults, not ie").unwrap();
        let b = Browsers::from_query("defaults, not ie").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn last_versions() {
        let b = Browsers::from_query("last 2 versions").unwrap();
        assert_eq!(b.chrome, Some(version(126, 0, 0)));
        assert_eq!(b.firefox, Some(version(127, 0, 0)));
        // ie is not in the release table
        assert_eq!(b.ie, None);
    }
}
