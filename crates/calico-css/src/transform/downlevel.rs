//! Browser downleveling: modern color syntax conversion and vendor prefix
//! materialization.
//!
//! Downleveling is best-effort. A construct the target profile already
//! supports is left untouched, and one the compiler cannot rewrite is kept
//! as authored rather than dropped.

use crate::compat::Feature;
use crate::rules::style::{Declaration, StyleRule};
use crate::rules::CssRule;
use crate::selector::{Component, PseudoClass, PseudoElement, Selector};
use crate::targets::Browsers;
use crate::values::{CssColor, TokenOrValue, Value};
use crate::vendor_prefix::VendorPrefix;

/// Properties that need vendor-prefixed duplicates for some targets.
const PREFIX_TABLE: &[(&str, Feature, &[VendorPrefix])] = &[
    (
        "user-select",
        Feature::UserSelect,
        &[VendorPrefix::WebKit, VendorPrefix::Moz, VendorPrefix::Ms],
    ),
    (
        "appearance",
        Feature::Appearance,
        &[VendorPrefix::WebKit, VendorPrefix::Moz],
    ),
    (
        "backdrop-filter",
        Feature::BackdropFilter,
        &[VendorPrefix::WebKit],
    ),
    (
        "text-size-adjust",
        Feature::TextSizeAdjust,
        &[VendorPrefix::WebKit, VendorPrefix::Ms],
    ),
    ("tab-size", Feature::TabSize, &[VendorPrefix::Moz]),
    ("mask", Feature::MaskImage, &[VendorPrefix::WebKit]),
    ("mask-image", Feature::MaskImage, &[VendorPrefix::WebKit]),
];

/// Rewrite a rule list in place for the target profile.
pub(crate) fn downlevel_rules(rules: &mut Vec<CssRule>, targets: Browsers) {
    let mut i = 0;
    while i < rules.len() {
        match &mut rules[i] {
            CssRule::Style(rule) => {
                downlevel_declarations(&mut rule.declarations, targets);
                prefix_declarations(&mut rule.declarations, targets);

                let prefixed = prefixed_selector_rules(rule, targets);
                if !prefixed.is_empty() {
                    let count = prefixed.len();
                    // Prefixed fallbacks go before the unprefixed original so
                    // the cascade prefers the standard form.
                    for (offset, clone) in prefixed.into_iter().enumerate() {
                        rules.insert(i + offset, CssRule::Style(clone));
                    }
                    i += count;
                }
            }
            CssRule::Media(media) => downlevel_rules(&mut media.rules, targets),
            CssRule::Supports(supports) => downlevel_rules(&mut supports.rules, targets),
            CssRule::Keyframes(keyframes) => {
                for keyframe in &mut keyframes.keyframes {
                    downlevel_declarations(&mut keyframe.declarations, targets);
                    prefix_declarations(&mut keyframe.declarations, targets);
                }
            }
            CssRule::Import(_) | CssRule::Unknown(_) => {}
        }
        i += 1;
    }
}

fn downlevel_declarations(declarations: &mut [Declaration], targets: Browsers) {
    for declaration in declarations {
        downlevel_value(&mut declaration.value, targets);
    }
}

fn downlevel_value(value: &mut Value, targets: Browsers) {
    match value {
        Value::Color(color) => downlevel_color(color, targets),
        Value::List(items) => {
            for item in items {
                downlevel_value(item, targets);
            }
        }
        Value::Function(function) => downlevel_token_list(&mut function.arguments, targets),
        Value::Tokens(tokens) => downlevel_token_list(tokens, targets),
        Value::Var(var) => {
            if let Some(fallback) = &mut var.fallback {
                downlevel_token_list(fallback, targets);
            }
        }
        _ => {}
    }
}

fn downlevel_token_list(tokens: &mut crate::values::TokenList, targets: Browsers) {
    for item in &mut tokens.0 {
        match item {
            TokenOrValue::Color(color) => downlevel_color(color, targets),
            TokenOrValue::Var(var) => {
                if let Some(fallback) = &mut var.fallback {
                    downlevel_token_list(fallback, targets);
                }
            }
            TokenOrValue::Token(_) => {}
        }
    }
}

fn downlevel_color(color: &mut CssColor, targets: Browsers) {
    if let Some(feature) = color.feature()
        && !feature.is_compatible(targets)
    {
        tracing::debug!(?feature, "converting color to srgb for target profile");
        color.downlevel();
    }
}

/// Insert vendor-prefixed duplicates before declarations the targets need
/// them for.
fn prefix_declarations(declarations: &mut Vec<Declaration>, targets: Browsers) {
    let mut i = 0;
    while i < declarations.len() {
        let declaration = &declarations[i];
        let prefixes = PREFIX_TABLE.iter().find_map(|(property, feature, prefixes)| {
            (declaration.property == *property && !feature.is_compatible(targets))
                .then_some(*prefixes)
        });
        if let Some(prefixes) = prefixes {
            // Skip if an earlier pass (or the author) already prefixed it.
            let already = declarations.iter().any(|d| {
                prefixes
                    .iter()
                    .any(|p| d.property == format!("{}{}", p.as_str(), declarations[i].property))
            });
            if !already {
                let original = declarations[i].clone();
                for (offset, prefix) in prefixes.iter().enumerate() {
                    let mut clone = original.clone();
                    clone.property = format!("{}{}", prefix.as_str(), original.property);
                    declarations.insert(i + offset, clone);
                }
                i += prefixes.len();
            }
        }
        i += 1;
    }
}

/// Build prefixed sibling rules for selectors the targets cannot parse
/// unprefixed. Selectors with an unsupported pseudo in a group must be
/// split out because one unrecognized selector invalidates the whole rule.
fn prefixed_selector_rules(rule: &StyleRule, targets: Browsers) -> Vec<StyleRule> {
    let needs_placeholder = !Feature::PlaceholderPseudoElement.is_compatible(targets)
        && rule
            .selectors
            .0
            .iter()
            .any(|s| selector_has_placeholder(s));
    let needs_fullscreen = !Feature::FullscreenPseudoClass.is_compatible(targets)
        && rule.selectors.0.iter().any(|s| selector_has_fullscreen(s));

    let mut out = Vec::new();
    if needs_placeholder {
        for prefix in [VendorPrefix::WebKit, VendorPrefix::Moz, VendorPrefix::Ms] {
            out.push(replace_pseudos(rule, Some(prefix), None));
        }
    }
    if needs_fullscreen {
        for prefix in [VendorPrefix::WebKit, VendorPrefix::Moz, VendorPrefix::Ms] {
            out.push(replace_pseudos(rule, None, Some(prefix)));
        }
    }
    out
}

fn selector_has_placeholder(selector: &Selector) -> bool {
    selector.components.iter().any(|c| {
        matches!(
            c,
            Component::PseudoElement(PseudoElement::Placeholder(VendorPrefix::None))
        )
    })
}

fn selector_has_fullscreen(selector: &Selector) -> bool {
    selector.components.iter().any(|c| {
        matches!(
            c,
            Component::PseudoClass(PseudoClass::Fullscreen(VendorPrefix::None))
        )
    })
}

fn replace_pseudos(
    rule: &StyleRule,
    placeholder: Option<VendorPrefix>,
    fullscreen: Option<VendorPrefix>,
) -> StyleRule {
    let mut clone = rule.clone();
    // Only the selectors that mention the pseudo move into the prefixed
    // duplicate; the rest stay with the original rule.
    clone.selectors.0.retain(|s| {
        (placeholder.is_some() && selector_has_placeholder(s))
            || (fullscreen.is_some() && selector_has_fullscreen(s))
    });
    for selector in &mut clone.selectors.0 {
        for component in &mut selector.components {
            match component {
                Component::PseudoElement(PseudoElement::Placeholder(p))
                    if *p == VendorPrefix::None =>
                {
                    if let Some(prefix) = placeholder {
                        *p = prefix;
                    }
                }
                Component::PseudoClass(PseudoClass::Fullscreen(p))
                    if *p == VendorPrefix::None =>
                {
                    if let Some(prefix) = fullscreen {
                        *p = prefix;
                    }
                }
                _ => {}
            }
        }
    }
    clone
}
