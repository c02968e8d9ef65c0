//! Stylesheet transformation: downleveling, CSS Modules resolution, and
//! unused-rule elimination.
//!
//! Transformation is destructive and runs at most once per stylesheet,
//! between parsing and printing. Order matters: downleveling and dead-code
//! elimination operate on authored names, so module resolution (which
//! installs the scoped-name table) runs last.

mod downlevel;

use std::collections::HashSet;

use crate::css_modules::{BindingKind, CssModuleReference, LocalScope, Pattern};
use crate::error::Result;
use crate::parser::{ParserOptions, Warning};
use crate::rules::style::StyleRule;
use crate::rules::{CssRule, Location};
use crate::selector::{Component, Selector};
use crate::targets::Browsers;
use crate::tokenizer::Token;
use crate::values::{ComposesFrom, TokenOrValue, Value};

/// Options controlling transformation.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Target browser profile. When unset, no downleveling happens.
    pub targets: Option<Browsers>,
    /// Exported names (classes, keyframes) the consumer never references.
    /// Rules reachable only through these are removed.
    pub unused_symbols: HashSet<String>,
}

/// Run the full transform pipeline over a parsed rule list.
pub(crate) fn apply(
    rules: &mut Vec<CssRule>,
    parser_options: &ParserOptions,
    options: &TransformOptions,
    warnings: &mut Vec<Warning>,
) -> Result<Option<LocalScope>> {
    if let Some(targets) = options.targets {
        downlevel::downlevel_rules(rules, targets);
    }
    if !options.unused_symbols.is_empty() {
        remove_unused(rules, &options.unused_symbols);
    }
    if parser_options.css_modules {
        let scope = resolve_modules(rules, parser_options, warnings)?;
        return Ok(Some(scope));
    }
    Ok(None)
}

fn resolve_modules(
    rules: &mut Vec<CssRule>,
    options: &ParserOptions,
    warnings: &mut Vec<Warning>,
) -> Result<LocalScope> {
    let pattern = match &options.css_modules_pattern {
        Some(pattern) => Pattern::parse(pattern)?,
        None => Pattern::default(),
    };
    let mut scope = LocalScope::new();
    register_bindings(rules, &pattern, options, &mut scope);
    resolve_references(rules, &mut scope, warnings);
    Ok(scope)
}

/// First pass: every class, keyframes name, and (optionally) custom property
/// defined in this file becomes a local binding.
fn register_bindings(
    rules: &[CssRule],
    pattern: &Pattern,
    options: &ParserOptions,
    scope: &mut LocalScope,
) {
    let filename = options.filename.as_str();
    for rule in rules {
        match rule {
            CssRule::Style(rule) => {
                for selector in &rule.selectors.0 {
                    for class in selector.class_names() {
                        scope.add_local(pattern, filename, class, BindingKind::Class);
                    }
                }
                if options.css_modules_dashed_idents {
                    for declaration in &rule.declarations {
                        if let Some(local) = declaration.property.strip_prefix("--") {
                            scope.add_local(pattern, filename, local, BindingKind::DashedIdent);
                        }
                    }
                }
            }
            CssRule::Keyframes(rule) => {
                scope.add_local(pattern, filename, &rule.name, BindingKind::Keyframes);
            }
            CssRule::Media(media) => register_bindings(&media.rules, pattern, options, scope),
            CssRule::Supports(supports) => {
                register_bindings(&supports.rules, pattern, options, scope)
            }
            CssRule::Import(_) | CssRule::Unknown(_) => {}
        }
    }
}

/// Second pass: resolve `composes` into manifest references and rewrite
/// animation names to their scoped forms.
fn resolve_references(
    rules: &mut Vec<CssRule>,
    scope: &mut LocalScope,
    warnings: &mut Vec<Warning>,
) {
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                resolve_style_rule(style, scope, warnings);
            }
            CssRule::Media(media) => {
                resolve_references(&mut media.rules, scope, warnings)
            }
            CssRule::Supports(supports) => {
                resolve_references(&mut supports.rules, scope, warnings)
            }
            CssRule::Keyframes(_) | CssRule::Import(_) | CssRule::Unknown(_) => {}
        }
    }
}

fn resolve_style_rule(rule: &mut StyleRule, scope: &mut LocalScope, warnings: &mut Vec<Warning>) {
    let composes_targets = composes_targets(&rule.selectors.0);

    let mut kept = Vec::with_capacity(rule.declarations.len());
    for mut declaration in rule.declarations.drain(..) {
        if let Value::Composes(composes) = &declaration.value {
            match &composes_targets {
                Some(targets) => {
                    for name in &composes.names {
                        let reference = match &composes.from {
                            None => match scope.get(name, BindingKind::Class) {
                                Some(scoped) => CssModuleReference::Local {
                                    name: scoped.to_string(),
                                },
                                None => {
                                    warn(
                                        warnings,
                                        format!(
                                            "composes references undefined class \"{name}\", \
                                             treating as global"
                                        ),
                                        declaration.loc,
                                    );
                                    CssModuleReference::Global { name: name.clone() }
                                }
                            },
                            Some(ComposesFrom::Global) => {
                                CssModuleReference::Global { name: name.clone() }
                            }
                            Some(ComposesFrom::File(specifier)) => {
                                CssModuleReference::Dependency {
                                    name: name.clone(),
                                    specifier: specifier.clone(),
                                }
                            }
                        };
                        for target in targets {
                            scope.add_composes(target, BindingKind::Class, reference.clone());
                        }
                    }
                }
                None => {
                    warn(
                        warnings,
                        "composes is only valid on a single class selector".to_string(),
                        declaration.loc,
                    );
                }
            }
            // The declaration itself never reaches the output; composition
            // is expressed through the exports manifest.
            continue;
        }

        if matches!(declaration.property.as_str(), "animation" | "animation-name") {
            rewrite_animation_names(&mut declaration.value, scope);
        }
        kept.push(declaration);
    }
    rule.declarations = kept;
}

/// The classes a `composes` declaration attaches to: every selector in the
/// rule must be a bare class selector.
fn composes_targets(selectors: &[Selector]) -> Option<Vec<String>> {
    let mut targets = Vec::with_capacity(selectors.len());
    for selector in selectors {
        match selector.components.as_slice() {
            [Component::Class(name)] => targets.push(name.clone()),
            _ => return None,
        }
    }
    if targets.is_empty() { None } else { Some(targets) }
}

/// Rewrite animation name idents that match a local keyframes binding.
fn rewrite_animation_names(value: &mut Value, scope: &LocalScope) {
    match value {
        Value::Ident(name) => {
            if let Some(scoped) = scope.get(name, BindingKind::Keyframes) {
                *name = scoped.to_string();
            }
        }
        Value::List(items) => {
            for item in items {
                rewrite_animation_names(item, scope);
            }
        }
        Value::Tokens(tokens) => {
            for item in &mut tokens.0 {
                if let TokenOrValue::Token(spanned) = item
                    && let Token::Ident(name) = &mut spanned.token
                    && let Some(scoped) = scope.get(name, BindingKind::Keyframes)
                {
                    *name = scoped.to_string();
                }
            }
        }
        _ => {}
    }
}

fn warn(warnings: &mut Vec<Warning>, message: String, loc: Location) {
    tracing::warn!(line = loc.line, column = loc.column, "{message}");
    warnings.push(Warning {
        message,
        line: loc.line,
        column: loc.column,
    });
}

/// Remove rules reachable only through unused exported names.
///
/// A class listed in `unused` is revived if a surviving rule composes it,
/// so elimination iterates to a fixpoint before pruning.
fn remove_unused(rules: &mut Vec<CssRule>, unused: &HashSet<String>) {
    let mut revived: HashSet<String> = HashSet::new();
    loop {
        let mut changed = false;
        collect_composed(rules, unused, &mut revived, &mut changed);
        if !changed {
            break;
        }
    }

    prune_rules(rules, unused, &revived);

    // Keyframes referenced by surviving animation declarations stay, no
    // matter what the unused list says.
    let mut referenced = HashSet::new();
    collect_animation_names(rules, &mut referenced);
    rules.retain(|rule| match rule {
        CssRule::Keyframes(kf) => {
            !unused.contains(&kf.name) || revived.contains(&kf.name) || referenced.contains(&kf.name)
        }
        _ => true,
    });
}

fn selector_is_dead(selector: &Selector, unused: &HashSet<String>, revived: &HashSet<String>) -> bool {
    // Only subject-position classes count. A class inside `:not()` is a
    // condition on other elements, so it cannot kill the rule.
    selector
        .owned_class_names()
        .iter()
        .any(|class| unused.contains(*class) && !revived.contains(*class))
}

fn collect_composed(
    rules: &[CssRule],
    unused: &HashSet<String>,
    revived: &mut HashSet<String>,
    changed: &mut bool,
) {
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                let live = style
                    .selectors
                    .0
                    .iter()
                    .any(|s| !selector_is_dead(s, unused, revived));
                if !live {
                    continue;
                }
                for declaration in &style.declarations {
                    if let Value::Composes(composes) = &declaration.value
                        && composes.from.is_none()
                    {
                        for name in &composes.names {
                            if unused.contains(name) && revived.insert(name.clone()) {
                                *changed = true;
                            }
                        }
                    }
                }
            }
            CssRule::Media(media) => collect_composed(&media.rules, unused, revived, changed),
            CssRule::Supports(supports) => {
                collect_composed(&supports.rules, unused, revived, changed)
            }
            _ => {}
        }
    }
}

fn prune_rules(rules: &mut Vec<CssRule>, unused: &HashSet<String>, revived: &HashSet<String>) {
    rules.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            style
                .selectors
                .0
                .retain(|s| !selector_is_dead(s, unused, revived));
            !style.selectors.0.is_empty()
        }
        CssRule::Media(media) => {
            prune_rules(&mut media.rules, unused, revived);
            !media.rules.is_empty()
        }
        CssRule::Supports(supports) => {
            prune_rules(&mut supports.rules, unused, revived);
            !supports.rules.is_empty()
        }
        _ => true,
    });
}

fn collect_animation_names(rules: &[CssRule], out: &mut HashSet<String>) {
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                for declaration in &style.declarations {
                    if matches!(
                        declaration.property.as_str(),
                        "animation" | "animation-name"
                    ) {
                        collect_idents(&declaration.value, out);
                    }
                }
            }
            CssRule::Media(media) => collect_animation_names(&media.rules, out),
            CssRule::Supports(supports) => collect_animation_names(&supports.rules, out),
            _ => {}
        }
    }
}

fn collect_idents(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::Ident(name) => {
            out.insert(name.clone());
        }
        Value::List(items) => {
            for item in items {
                collect_idents(item, out);
            }
        }
        Value::Tokens(tokens) => {
            for item in &tokens.0 {
                if let TokenOrValue::Token(spanned) = item
                    && let Token::Ident(name) = &spanned.token
                {
                    out.insert(name.clone());
                }
            }
        }
        _ => {}
    }
}
