//! Bidirectional cell converters.
//!
//! A [`Converter`] turns raw cell content into a typed [`CellValue`] and back.
//! Reading prefers the native fast path (`from_cell`) when the stored value
//! already has the target type, then falls back to text parsing; writing
//! formats or emits a native typed cell. The [`Pipeline`] wraps a converter
//! with the per-field trim/default/formula/style behavior shared by every
//! binding kind.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetbind_common::CellValue;
use sheetbind_grid::{CellData, StyleOptions};
use sheetbind_spec::{ConvertOptions, FieldType};

use crate::error::ConfigError;

mod boolean;
mod numeric;
mod temporal;
mod text;

pub use boolean::BoolConverter;
pub use numeric::{FloatConverter, IntConverter};
pub use temporal::{TemporalConverter, TemporalKind, TimeZoneSpec};
pub use text::{EnumConverter, TextConverter};

/// Why a raw input failed to convert. The processor attaches field path and
/// address before this reaches the report.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub raw: String,
    /// Template variables (e.g. `pattern`, `candidates`) for error messages.
    pub vars: Vec<(String, String)>,
}

impl ParseFailure {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            vars: Vec::new(),
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }
}

/// One scalar type's bidirectional conversion.
pub trait Converter: Send + Sync {
    /// Target type name used in error messages.
    fn target(&self) -> &'static str;

    /// Native fast path: the coerced value when the stored cell value already
    /// carries the target type, `None` to fall through to text parsing.
    fn from_cell(&self, value: &CellValue) -> Option<CellValue>;

    /// Parse non-empty text into the target type.
    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure>;

    /// Format a typed value as text.
    fn format(&self, value: &CellValue) -> String;

    /// Cell value written on save. Defaults to the typed value itself, so
    /// numeric and temporal converters write native cells.
    fn to_cell(&self, value: &CellValue) -> CellValue {
        value.clone()
    }

    /// Number-format pattern applied to the written cell's style.
    fn grid_pattern(&self) -> Option<&str> {
        None
    }

    /// Value substituted when the input is absent (blank cell, no default).
    /// Non-nullable booleans coerce absence to `false` this way.
    fn absent_value(&self) -> Option<CellValue> {
        None
    }
}

/// Factory for a custom converter, keyed by field-type name.
pub type ConverterFactory =
    dyn Fn(&ConvertOptions) -> Result<Box<dyn Converter>, String> + Send + Sync;

/// Builds converters for field types. The built-in scalar set is always
/// available; custom factories registered under a type name take precedence.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    custom: FxHashMap<String, Arc<ConverterFactory>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom factory for `type_name`, shadowing any built-in.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&ConvertOptions) -> Result<Box<dyn Converter>, String> + Send + Sync + 'static,
    {
        self.custom.insert(type_name.into(), Arc::new(factory));
    }

    /// Build the converter for one field. `field` is only used in errors.
    pub fn build(
        &self,
        field: &str,
        ty: &FieldType,
        opts: &ConvertOptions,
    ) -> Result<Box<dyn Converter>, ConfigError> {
        if let Some(factory) = self.custom.get(ty.name()) {
            return factory(opts).map_err(|message| ConfigError::InvalidConverterOptions {
                field: field.to_string(),
                message,
            });
        }
        match ty {
            FieldType::Text => Ok(Box::new(TextConverter)),
            FieldType::Bool => Ok(Box::new(BoolConverter::from_options(opts))),
            FieldType::Int => Ok(Box::new(IntConverter::from_options(opts))),
            FieldType::Float => Ok(Box::new(FloatConverter::from_options(opts))),
            FieldType::Date => TemporalConverter::from_options(field, TemporalKind::Date, opts)
                .map(|c| Box::new(c) as Box<dyn Converter>),
            FieldType::DateTime => {
                TemporalConverter::from_options(field, TemporalKind::DateTime, opts)
                    .map(|c| Box::new(c) as Box<dyn Converter>)
            }
            FieldType::Time => TemporalConverter::from_options(field, TemporalKind::Time, opts)
                .map(|c| Box::new(c) as Box<dyn Converter>),
            FieldType::Enum(e) => Ok(Box::new(EnumConverter::from_options(&e.variants, opts))),
            other => Err(ConfigError::NoConverter {
                field: field.to_string(),
                target: other.name().to_string(),
            }),
        }
    }
}

/// Per-field conversion pipeline: converter plus trim/default/formula/style.
///
/// Reading: native fast path, then text, trim, default substitution, parse.
/// Writing: default substitution, then formula-primary | value | formula |
/// blank, then style.
pub(crate) struct Pipeline {
    conv: Box<dyn Converter>,
    trim: bool,
    default_value: Option<CellValue>,
    formula: Option<String>,
    formula_primary: bool,
    style: Option<StyleOptions>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("target", &self.conv.target())
            .field("trim", &self.trim)
            .field("default_value", &self.default_value)
            .field("formula", &self.formula)
            .field("formula_primary", &self.formula_primary)
            .field("style", &self.style)
            .finish()
    }
}

impl Pipeline {
    pub(crate) fn build(
        field: &str,
        ty: &FieldType,
        opts: &ConvertOptions,
        registry: &ConverterRegistry,
    ) -> Result<Self, ConfigError> {
        let conv = registry.build(field, ty, opts)?;

        // The default literal goes through the same parse as cell text, with
        // the field's trim flag applied, so an unparseable default is a
        // configuration error caught before any pass runs.
        let default_value = match &opts.default {
            Some(literal) => {
                let text = if opts.trim { literal.trim() } else { literal.as_str() };
                let parsed = conv.parse(text).map_err(|_| ConfigError::InvalidDefault {
                    field: field.to_string(),
                    literal: literal.clone(),
                    target: conv.target().to_string(),
                })?;
                Some(parsed)
            }
            None => None,
        };

        let style = StyleOptions {
            wrap_text: opts.wrap_text,
            shrink_to_fit: opts.shrink_to_fit,
            number_format: opts
                .grid_pattern
                .clone()
                .or_else(|| conv.grid_pattern().map(str::to_string)),
        };
        let style = if style.is_default() { None } else { Some(style) };

        Ok(Self {
            conv,
            trim: opts.trim,
            default_value,
            formula: opts.formula.clone(),
            formula_primary: opts.formula_primary,
            style,
        })
    }

    pub(crate) fn target(&self) -> &'static str {
        self.conv.target()
    }

    pub(crate) fn default_value(&self) -> Option<&CellValue> {
        self.default_value.as_ref()
    }

    pub(crate) fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub(crate) fn formula_primary(&self) -> bool {
        self.formula_primary
    }

    pub(crate) fn style(&self) -> Option<&StyleOptions> {
        self.style.as_ref()
    }

    /// Read one cell's content into a typed value. `Ok(None)` means the field
    /// stays absent (blank input with no default and no absence coercion).
    pub(crate) fn read(&self, cell: Option<&CellData>) -> Result<Option<CellValue>, ParseFailure> {
        if let Some(cell) = cell {
            if let Some(stored) = &cell.value
                && let Some(native) = self.conv.from_cell(stored)
            {
                return Ok(Some(native));
            }
            let text = cell.text();
            let text = if self.trim { text.trim() } else { text.as_str() };
            if !text.is_empty() {
                return self.conv.parse(text).map(Some);
            }
        }
        Ok(self
            .default_value
            .clone()
            .or_else(|| self.conv.absent_value()))
    }

    /// Value to write on save, after default/absence substitution.
    pub(crate) fn outgoing(&self, value: Option<&CellValue>) -> Option<CellValue> {
        let value = match value {
            Some(v) => Some(v.clone()),
            None => self
                .default_value
                .clone()
                .or_else(|| self.conv.absent_value()),
        };
        value.map(|v| self.conv.to_cell(&v))
    }
}
