//! Failure message templates.
//!
//! Templates are plain strings with `{name}` placeholders, keyed by
//! [`FailureKind`] and optionally by locale tag. Rendering substitutes the
//! built-in variables (`field`, `sheet`, `address`, `raw`, `target`) plus any
//! failure-specific variables such as `pattern` or `candidates`; unresolved
//! placeholders are left intact so a missing variable is visible, not silent.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::report::{ConversionFailure, FailureKind};

type TemplateSet = FxHashMap<FailureKind, String>;

static BUILTIN: Lazy<TemplateSet> = Lazy::new(|| {
    let mut set = TemplateSet::default();
    set.insert(
        FailureKind::Parse,
        "field `{field}` at {sheet}!{address}: cannot convert `{raw}` to {target}".to_string(),
    );
    set.insert(
        FailureKind::LabelNotFound,
        "field `{field}`: label `{raw}` not found on sheet `{sheet}`".to_string(),
    );
    set.insert(
        FailureKind::OutOfBounds,
        "field `{field}`: position lies outside the grid on sheet `{sheet}`".to_string(),
    );
    set
});

/// Kind-keyed message templates with per-locale overlays.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    default: TemplateSet,
    by_locale: FxHashMap<String, TemplateSet>,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            default: BUILTIN.clone(),
            by_locale: FxHashMap::default(),
        }
    }
}

impl MessageTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default template for one failure kind.
    pub fn set(&mut self, kind: FailureKind, template: impl Into<String>) -> &mut Self {
        self.default.insert(kind, template.into());
        self
    }

    /// Add a localized template. Lookup falls back from the exact tag to the
    /// primary subtag (`ja-JP` -> `ja`) and finally to the default set.
    pub fn set_localized(
        &mut self,
        locale: impl Into<String>,
        kind: FailureKind,
        template: impl Into<String>,
    ) -> &mut Self {
        self.by_locale
            .entry(locale.into())
            .or_default()
            .insert(kind, template.into());
        self
    }

    fn lookup(&self, kind: FailureKind, locale: Option<&str>) -> Option<&str> {
        if let Some(tag) = locale {
            if let Some(t) = self.by_locale.get(tag).and_then(|set| set.get(&kind)) {
                return Some(t);
            }
            if let Some((primary, _)) = tag.split_once('-')
                && let Some(t) = self.by_locale.get(primary).and_then(|set| set.get(&kind))
            {
                return Some(t);
            }
        }
        self.default.get(&kind).map(String::as_str)
    }

    /// Render one failure.
    pub fn render(&self, failure: &ConversionFailure, locale: Option<&str>) -> String {
        match self.lookup(failure.kind, locale) {
            Some(template) => substitute(template, failure),
            // No template anywhere: fall back to the failure's Display form.
            None => failure.to_string(),
        }
    }
}

fn substitute(template: &str, failure: &ConversionFailure) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match resolve(name, failure) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve(name: &str, failure: &ConversionFailure) -> Option<String> {
    match name {
        "field" => Some(failure.field.clone()),
        "sheet" => Some(failure.sheet.clone()),
        "address" => failure.address.map(|a| a.to_string()),
        "raw" => Some(failure.raw.clone()),
        "target" => Some(failure.target.clone()),
        _ => failure.var_value(name).map(str::to_string),
    }
}
