//! Pass orchestration: sheet gating, field verification, and report handling.

use sheetbind_grid::{GridReader, GridWriter};
use tracing::debug;

use crate::binding::MappingBindings;
use crate::error::{BindError, ConfigError};
use crate::message::MessageTemplates;
use crate::process::{LoadPass, SavePass};
use crate::record::{DynRecord, RecordAccess};
use crate::report::{BindingReport, FailureSink};

/// Pass behavior knobs.
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    /// Accumulate recoverable failures into the report instead of aborting on
    /// the first one. Off by default.
    pub continue_on_error: bool,
    /// Locale tag for rendered failure messages.
    pub locale: Option<String>,
}

/// Executes load and save passes for one resolved mapping.
pub struct Binder<'a> {
    bindings: &'a MappingBindings,
    options: BindOptions,
    templates: MessageTemplates,
}

impl<'a> Binder<'a> {
    pub fn new(bindings: &'a MappingBindings) -> Self {
        Self {
            bindings,
            options: BindOptions::default(),
            templates: MessageTemplates::default(),
        }
    }

    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Render a pass report with this binder's templates and locale.
    pub fn render_report(&self, report: &BindingReport) -> Vec<String> {
        report.render(&self.templates, self.options.locale.as_deref())
    }

    /// Load `record_name` from the grid into a fresh dynamic record.
    pub fn load<G: GridReader>(
        &self,
        grid: &G,
        record_name: &str,
    ) -> Result<(DynRecord, BindingReport), BindError> {
        let mut record = DynRecord::new();
        let report = self.load_into(grid, record_name, &mut record)?;
        Ok((record, report))
    }

    /// Load `record_name` into a caller-provided record.
    pub fn load_into<G: GridReader>(
        &self,
        grid: &G,
        record_name: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<BindingReport, BindError> {
        let (index, sheet) = self.target(record_name)?;
        if !grid.has_sheet(&sheet) {
            return Err(BindError::MissingSheet {
                record: record_name.to_string(),
                sheet,
            });
        }
        self.verify_fields(index, &*record)?;
        debug!(record = record_name, sheet = %sheet, "load pass");

        let mut report = BindingReport::new();
        {
            let sink = FailureSink::new(&mut report, self.options.continue_on_error);
            let mut pass = LoadPass {
                bindings: self.bindings,
                grid: grid as &dyn GridReader,
                sink,
            };
            pass.run(index, &sheet, record)?;
        }
        debug!(
            record = record_name,
            failures = report.len(),
            "load pass complete"
        );
        Ok(report)
    }

    /// Save a record into the grid.
    pub fn save<G: GridReader + GridWriter>(
        &self,
        grid: &mut G,
        record_name: &str,
        record: &dyn RecordAccess,
    ) -> Result<BindingReport, BindError> {
        let (index, sheet) = self.target(record_name)?;
        if !grid.has_sheet(&sheet) {
            return Err(BindError::MissingSheet {
                record: record_name.to_string(),
                sheet,
            });
        }
        self.verify_fields(index, record)?;
        debug!(record = record_name, sheet = %sheet, "save pass");

        let mut report = BindingReport::new();
        {
            let sink = FailureSink::new(&mut report, self.options.continue_on_error);
            let mut pass = SavePass {
                bindings: self.bindings,
                grid,
                sink,
            };
            pass.run(index, &sheet, record)?;
        }
        debug!(
            record = record_name,
            failures = report.len(),
            "save pass complete"
        );
        Ok(report)
    }

    fn target(&self, record_name: &str) -> Result<(usize, String), BindError> {
        let index = self
            .bindings
            .record_index(record_name)
            .ok_or_else(|| ConfigError::UnknownMapping(record_name.to_string()))?;
        let sheet = self
            .bindings
            .bound(index)
            .sheet
            .clone()
            .ok_or_else(|| ConfigError::MissingTargetSheet {
                record: record_name.to_string(),
            })?;
        Ok((index, sheet))
    }

    /// Upfront check that the record type declares every mapped field, so a
    /// mapping/record mismatch is a configuration error, not a silent skip.
    fn verify_fields(&self, index: usize, record: &dyn RecordAccess) -> Result<(), BindError> {
        for field in &self.bindings.bound(index).fields {
            if !record.has_field(&field.name) {
                return Err(ConfigError::UnknownField {
                    field: field.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}
