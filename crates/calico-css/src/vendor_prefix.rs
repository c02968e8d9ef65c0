//! Vendor prefixes.

use std::fmt;

/// A vendor prefix, such as `-webkit-` or `-moz-`.
///
/// Downleveling materializes prefixed duplicates as sibling declarations or
/// rules rather than flag sets, so a single prefix per node is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VendorPrefix {
    /// No vendor prefix.
    #[default]
    None,
    /// The `-webkit-` prefix.
    WebKit,
    /// The `-moz-` prefix.
    Moz,
    /// The `-ms-` prefix.
    Ms,
    /// The `-o-` prefix.
    O,
}

impl VendorPrefix {
    /// Returns a vendor prefix from a prefix string (without dashes).
    pub fn from_str(s: &str) -> Option<VendorPrefix> {
        match s {
            "webkit" => Some(VendorPrefix::WebKit),
            "moz" => Some(VendorPrefix::Moz),
            "ms" => Some(VendorPrefix::Ms),
            "o" => Some(VendorPrefix::O),
            _ => None,
        }
    }

    /// The prefix text, including both dashes. Empty for `None`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorPrefix::None => "",
            VendorPrefix::WebKit => "-webkit-",
            VendorPrefix::Moz => "-moz-",
            VendorPrefix::Ms => "-ms-",
            VendorPrefix::O => "-o-",
        }
    }

    /// Strip a leading vendor prefix from an identifier, if present.
    pub fn split(ident: &str) -> (VendorPrefix, &str) {
        for prefix in [
            VendorPrefix::WebKit,
            VendorPrefix::Moz,
            VendorPrefix::Ms,
            VendorPrefix::O,
        ] {
            if let Some(rest) = ident.strip_prefix(prefix.as_str()) {
                return (prefix, rest);
            }
        }
        (VendorPrefix::None, ident)
    }
}

impl fmt::Display for VendorPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prefixed_ident() {
        assert_eq!(
            VendorPrefix::split("-webkit-user-select"),
            (VendorPrefix::WebKit, "user-select")
        );
        assert_eq!(VendorPrefix::split("color"), (VendorPrefix::None, "color"));
    }

    #[test]
    fn prefix_text() {
        assert_eq!(VendorPrefix::Moz.as_str(), "-moz-");
        assert_eq!(VendorPrefix::None.as_str(), "");
    }
}
