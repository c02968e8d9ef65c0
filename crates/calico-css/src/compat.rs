//! Browser compatibility data.
//!
//! A static table mapping syntax features to the minimum browser versions
//! that support them. The transformer consults this read-only to decide
//! whether a construct must be downleveled for the current target profile.
//! Version numbers are encoded with [`crate::targets::version`].

use crate::targets::{Browsers, version};

/// A syntax feature that may require downleveling for older targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// `lab()` and `lch()` color functions.
    LabColors,
    /// `oklab()` and `oklch()` color functions.
    OklabColors,
    /// The `color()` function with a color space argument.
    ColorFunction,
    /// The `hwb()` color function.
    HwbColors,
    /// 8- and 4-digit hex colors with alpha.
    HexAlphaColors,
    /// Unprefixed `user-select`.
    UserSelect,
    /// Unprefixed `appearance`.
    Appearance,
    /// Unprefixed `backdrop-filter`.
    BackdropFilter,
    /// Unprefixed `tab-size`.
    TabSize,
    /// Unprefixed `text-size-adjust`.
    TextSizeAdjust,
    /// Unprefixed `mask-image` and friends.
    MaskImage,
    /// The unprefixed `::placeholder` pseudo-element.
    PlaceholderPseudoElement,
    /// The unprefixed `:fullscreen` pseudo-class.
    FullscreenPseudoClass,
}

/// Per-browser minimum versions for one feature. `None` means the feature
/// is not supported unprefixed in any version of that browser.
struct Support {
    android: Option<u32>,
    chrome: Option<u32>,
    edge: Option<u32>,
    firefox: Option<u32>,
    ie: Option<u32>,
    ios_saf: Option<u32>,
    opera: Option<u32>,
    safari: Option<u32>,
    samsung: Option<u32>,
}

const UNSUPPORTED: Support = Support {
    android: None,
    chrome: None,
    edge: None,
    firefox: None,
    ie: None,
    ios_saf: None,
    opera: None,
    safari: None,
    samsung: None,
};

impl Feature {
    fn support(&self) -> Support {
        match self {
            Feature::LabColors => Support {
                chrome: Some(version(111, 0, 0)),
                edge: Some(version(111, 0, 0)),
                firefox: Some(version(113, 0, 0)),
                ios_saf: Some(version(15, 0, 0)),
                opera: Some(version(97, 0, 0)),
                safari: Some(version(15, 0, 0)),
                android: Some(version(111, 0, 0)),
                samsung: Some(version(22, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::OklabColors => Support {
                chrome: Some(version(111, 0, 0)),
                edge: Some(version(111, 0, 0)),
                firefox: Some(version(113, 0, 0)),
                ios_saf: Some(version(15, 4, 0)),
                opera: Some(version(97, 0, 0)),
                safari: Some(version(15, 4, 0)),
                android: Some(version(111, 0, 0)),
                samsung: Some(version(22, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::ColorFunction => Support {
                chrome: Some(version(111, 0, 0)),
                edge: Some(version(111, 0, 0)),
                firefox: Some(version(113, 0, 0)),
                ios_saf: Some(version(15, 0, 0)),
                opera: Some(version(97, 0, 0)),
                safari: Some(version(15, 0, 0)),
                android: Some(version(111, 0, 0)),
                samsung: Some(version(22, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::HwbColors => Support {
                chrome: Some(version(101, 0, 0)),
                edge: Some(version(101, 0, 0)),
                firefox: Some(version(96, 0, 0)),
                ios_saf: Some(version(15, 0, 0)),
                opera: Some(version(87, 0, 0)),
                safari: Some(version(15, 0, 0)),
                android: Some(version(101, 0, 0)),
                samsung: Some(version(19, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::HexAlphaColors => Support {
                chrome: Some(version(62, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(49, 0, 0)),
                ios_saf: Some(version(9, 3, 0)),
                opera: Some(version(49, 0, 0)),
                safari: Some(version(10, 0, 0)),
                android: Some(version(62, 0, 0)),
                samsung: Some(version(8, 2, 0)),
                ..UNSUPPORTED
            },
            Feature::UserSelect => Support {
                chrome: Some(version(54, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(69, 0, 0)),
                opera: Some(version(41, 0, 0)),
                android: Some(version(54, 0, 0)),
                samsung: Some(version(6, 2, 0)),
                ..UNSUPPORTED
            },
            Feature::Appearance => Support {
                chrome: Some(version(84, 0, 0)),
                edge: Some(version(84, 0, 0)),
                firefox: Some(version(80, 0, 0)),
                ios_saf: Some(version(15, 4, 0)),
                opera: Some(version(73, 0, 0)),
                safari: Some(version(15, 4, 0)),
                android: Some(version(84, 0, 0)),
                samsung: Some(version(14, 2, 0)),
                ..UNSUPPORTED
            },
            Feature::BackdropFilter => Support {
                chrome: Some(version(76, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(103, 0, 0)),
                ios_saf: Some(version(18, 0, 0)),
                opera: Some(version(63, 0, 0)),
                safari: Some(version(18, 0, 0)),
                android: Some(version(76, 0, 0)),
                samsung: Some(version(12, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::TabSize => Support {
                chrome: Some(version(21, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(91, 0, 0)),
                ios_saf: Some(version(7, 0, 0)),
                opera: Some(version(15, 0, 0)),
                safari: Some(version(7, 0, 0)),
                android: Some(version(21, 0, 0)),
                samsung: Some(version(1, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::TextSizeAdjust => Support {
                chrome: Some(version(54, 0, 0)),
                edge: Some(version(79, 0, 0)),
                opera: Some(version(41, 0, 0)),
                android: Some(version(54, 0, 0)),
                samsung: Some(version(6, 2, 0)),
                ..UNSUPPORTED
            },
            Feature::MaskImage => Support {
                chrome: Some(version(120, 0, 0)),
                edge: Some(version(120, 0, 0)),
                firefox: Some(version(53, 0, 0)),
                ios_saf: Some(version(15, 4, 0)),
                opera: Some(version(106, 0, 0)),
                safari: Some(version(15, 4, 0)),
                android: Some(version(120, 0, 0)),
                samsung: Some(version(25, 0, 0)),
                ..UNSUPPORTED
            },
            Feature::PlaceholderPseudoElement => Support {
                chrome: Some(version(57, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(51, 0, 0)),
                ios_saf: Some(version(10, 3, 0)),
                opera: Some(version(44, 0, 0)),
                safari: Some(version(10, 1, 0)),
                android: Some(version(57, 0, 0)),
                samsung: Some(version(7, 2, 0)),
                ..UNSUPPORTED
            },
            Feature::FullscreenPseudoClass => Support {
                chrome: Some(version(71, 0, 0)),
                edge: Some(version(79, 0, 0)),
                firefox: Some(version(64, 0, 0)),
                opera: Some(version(58, 0, 0)),
                safari: Some(version(16, 4, 0)),
                android: Some(version(71, 0, 0)),
                samsung: Some(version(10, 1, 0)),
                ..UNSUPPORTED
            },
        }
    }

    /// Whether every browser in the target profile supports this feature.
    pub fn is_compatible(&self, targets: Browsers) -> bool {
        let support = self.support();
        for (name, min_target) in targets.iter() {
            let supported_since = match name {
                "android" => support.android,
                "chrome" => support.chrome,
                "edge" => support.edge,
                "firefox" => support.firefox,
                "ie" => support.ie,
                "ios_saf" => support.ios_saf,
                "opera" => support.opera,
                "safari" => support.safari,
                "samsung" => support.samsung,
                _ => None,
            };
            match supported_since {
                Some(since) if min_target >= since => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Browsers;

    #[test]
    fn modern_targets_support_oklch() {
        let targets = Browsers::from_query("chrome >= 120").unwrap();
        assert!(Feature::OklabColors.is_compatible(targets));
    }

    #[test]
    fn old_safari_needs_lab_downlevel() {
        let targets = Browsers::from_query("safari >= 13").unwrap();
        assert!(!Feature::LabColors.is_compatible(targets));
    }

    #[test]
    fn ie_supports_nothing_modern() {
        let targets = Browsers::from_query("ie 11").unwrap();
        assert!(!Feature::HexAlphaColors.is_compatible(targets));
        assert!(!Feature::UserSelect.is_compatible(targets));
    }

    #[test]
    fn empty_profile_is_always_compatible() {
        assert!(Feature::LabColors.is_compatible(Browsers::default()));
    }
}
