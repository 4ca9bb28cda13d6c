use crate::error::GridError;
use serde::{Deserialize, Serialize};
use sheetbind_common::{CellAddress, CellValue, Region};

/// Contents of one stored cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellData {
    #[serde(default)]
    pub value: Option<CellValue>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub style: Option<StyleOptions>,
}

impl CellData {
    pub fn from_value(value: CellValue) -> Self {
        Self {
            value: Some(value),
            formula: None,
            style: None,
        }
    }

    /// Structurally blank: no value (or a blank one) and no formula.
    pub fn is_blank(&self) -> bool {
        self.value.as_ref().is_none_or(|v| v.is_blank())
            && self.formula.as_ref().is_none_or(|f| f.is_empty())
    }

    /// Textual form of the stored value; formulas are opaque and yield their text.
    pub fn text(&self) -> String {
        match &self.value {
            Some(v) => v.as_text(),
            None => String::new(),
        }
    }
}

/// Per-cell presentation options the engine may set on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    #[serde(default)]
    pub wrap_text: bool,
    #[serde(default)]
    pub shrink_to_fit: bool,
    #[serde(default)]
    pub number_format: Option<String>,
}

impl StyleOptions {
    pub fn is_default(&self) -> bool {
        !self.wrap_text && !self.shrink_to_fit && self.number_format.is_none()
    }
}

/// Read capability over a grid document.
pub trait GridReader {
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|s| s == sheet)
    }

    /// Contents of one cell, `None` when nothing is stored there.
    fn read_cell(&self, sheet: &str, addr: CellAddress) -> Result<Option<CellData>, GridError>;

    /// Textual content of a cell; unstored cells read as the empty string.
    fn cell_text(&self, sheet: &str, addr: CellAddress) -> Result<String, GridError> {
        Ok(self
            .read_cell(sheet, addr)?
            .map(|c| c.text())
            .unwrap_or_default())
    }

    /// Structural blankness of a position (unstored, or blank contents).
    fn is_blank(&self, sheet: &str, addr: CellAddress) -> Result<bool, GridError> {
        Ok(self
            .read_cell(sheet, addr)?
            .is_none_or(|c| c.is_blank()))
    }

    /// The merged region covering `addr`, if any.
    fn merged_region(&self, sheet: &str, addr: CellAddress) -> Result<Option<Region>, GridError>;

    /// Greatest (row, col) holding data, `None` for an empty sheet.
    fn sheet_bounds(&self, sheet: &str) -> Result<Option<(u32, u32)>, GridError>;
}

/// Write capability over a grid document. Regions grow implicitly on write.
pub trait GridWriter {
    fn write_value(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        value: CellValue,
    ) -> Result<(), GridError>;

    fn write_formula(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        formula: String,
    ) -> Result<(), GridError>;

    fn clear_cell(&mut self, sheet: &str, addr: CellAddress) -> Result<(), GridError>;

    fn set_style(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        style: StyleOptions,
    ) -> Result<(), GridError>;
}
