//! Recoverable per-cell failures and the pass report that collects them.

use core::fmt;

use sheetbind_common::CellAddress;
use tracing::warn;

use crate::error::BindError;
use crate::message::MessageTemplates;

/// What went wrong at one position. Selects the message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Raw cell text does not parse as the target type.
    Parse,
    /// A labelled binding's label text was not found on the sheet.
    LabelNotFound,
    /// A directional offset or region step left the grid.
    OutOfBounds,
}

impl FailureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::Parse => "parse",
            FailureKind::LabelNotFound => "label_not_found",
            FailureKind::OutOfBounds => "out_of_bounds",
        }
    }
}

/// One recoverable failure, carrying enough context to render a message:
/// the field path (`order.items[2].qty`), the cell involved, the raw input,
/// the target type, and kind-specific template variables such as the
/// configured patterns or the accepted candidate values.
#[derive(Debug, Clone)]
pub struct ConversionFailure {
    pub field: String,
    pub sheet: String,
    pub address: Option<CellAddress>,
    pub kind: FailureKind,
    pub raw: String,
    pub target: String,
    vars: Vec<(String, String)>,
}

impl ConversionFailure {
    pub fn new(
        field: impl Into<String>,
        sheet: impl Into<String>,
        kind: FailureKind,
        target: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            sheet: sheet.into(),
            address: None,
            kind,
            raw: String::new(),
            target: target.into(),
            vars: Vec::new(),
        }
    }

    pub fn at(mut self, address: CellAddress) -> Self {
        self.address = Some(address);
        self
    }

    pub fn raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }

    /// Named template variables beyond the built-in field/address/raw/target.
    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    pub fn var_value(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field `{}`", self.field)?;
        if let Some(addr) = self.address {
            write!(f, " at {}!{}", self.sheet, addr)?;
        } else {
            write!(f, " on sheet `{}`", self.sheet)?;
        }
        match self.kind {
            FailureKind::Parse => {
                write!(f, ": cannot convert `{}` to {}", self.raw, self.target)
            }
            FailureKind::LabelNotFound => {
                write!(f, ": label `{}` not found", self.raw)
            }
            FailureKind::OutOfBounds => {
                write!(f, ": position lies outside the grid")
            }
        }
    }
}

/// Accumulated failures of one load or save pass.
#[derive(Debug, Default)]
pub struct BindingReport {
    failures: Vec<ConversionFailure>,
}

impl BindingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[ConversionFailure] {
        &self.failures
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionFailure> {
        self.failures.iter()
    }

    /// Render every failure through the template set for `locale`.
    pub fn render(&self, templates: &MessageTemplates, locale: Option<&str>) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| templates.render(f, locale))
            .collect()
    }

    fn push(&mut self, failure: ConversionFailure) {
        self.failures.push(failure);
    }
}

/// Failure funnel threaded through a pass: either accumulates into the report
/// or aborts on the first failure, per `continue_on_error`.
pub(crate) struct FailureSink<'a> {
    report: &'a mut BindingReport,
    continue_on_error: bool,
}

impl<'a> FailureSink<'a> {
    pub(crate) fn new(report: &'a mut BindingReport, continue_on_error: bool) -> Self {
        Self {
            report,
            continue_on_error,
        }
    }

    pub(crate) fn push(&mut self, failure: ConversionFailure) -> Result<(), BindError> {
        warn!(
            field = %failure.field,
            kind = failure.kind.name(),
            raw = %failure.raw,
            "conversion failure"
        );
        if self.continue_on_error {
            self.report.push(failure);
            Ok(())
        } else {
            Err(BindError::Aborted(Box::new(failure)))
        }
    }
}
