use crate::error::GridError;
use crate::traits::{CellData, GridReader, GridWriter, StyleOptions};
use sheetbind_common::{CellAddress, CellValue, Region};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub(crate) struct MemorySheet {
    pub(crate) cells: BTreeMap<(u32, u32), CellData>,
    pub(crate) merged: Vec<Region>,
}

/// BTreeMap-backed grid document. Sheets are created implicitly on write;
/// reads of unknown sheets fail with [`GridError::UnknownSheet`].
#[derive(Debug, Default, Clone)]
pub struct MemoryGrid {
    sheets: BTreeMap<String, MemorySheet>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, name: &str) {
        self.sheets.entry(name.to_string()).or_default();
    }

    /// Register a merged region. Overlapping regions are rejected because a
    /// position could not then resolve to a single anchor.
    pub fn add_merged_region(&mut self, sheet: &str, region: Region) -> Result<(), GridError> {
        let entry = self.sheets.entry(sheet.to_string()).or_default();
        if entry.merged.iter().any(|m| m.overlaps(&region)) {
            return Err(GridError::OverlappingMerge {
                sheet: sheet.to_string(),
                region,
            });
        }
        entry.merged.push(region);
        Ok(())
    }

    pub fn merged_regions(&self, sheet: &str) -> &[Region] {
        self.sheets
            .get(sheet)
            .map(|s| s.merged.as_slice())
            .unwrap_or(&[])
    }

    /// Fixture helper: store a text value at an A1 address.
    pub fn set_text(&mut self, sheet: &str, a1: &str, text: &str) {
        let addr = CellAddress::parse_a1(a1).expect("fixture address must parse");
        self.set(sheet, addr, CellValue::Text(text.to_string()));
    }

    /// Fixture helper: store any value.
    pub fn set(&mut self, sheet: &str, addr: CellAddress, value: CellValue) {
        self.cell_mut(sheet, addr).value = Some(value);
    }

    fn cell_mut(&mut self, sheet: &str, addr: CellAddress) -> &mut CellData {
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .cells
            .entry((addr.row, addr.col))
            .or_default()
    }

    pub(crate) fn sheets(&self) -> &BTreeMap<String, MemorySheet> {
        &self.sheets
    }

    pub(crate) fn sheets_mut(&mut self) -> &mut BTreeMap<String, MemorySheet> {
        &mut self.sheets
    }
}

impl GridReader for MemoryGrid {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheets.contains_key(sheet)
    }

    fn read_cell(&self, sheet: &str, addr: CellAddress) -> Result<Option<CellData>, GridError> {
        let store = self
            .sheets
            .get(sheet)
            .ok_or_else(|| GridError::UnknownSheet(sheet.to_string()))?;
        Ok(store.cells.get(&(addr.row, addr.col)).cloned())
    }

    fn merged_region(&self, sheet: &str, addr: CellAddress) -> Result<Option<Region>, GridError> {
        let store = self
            .sheets
            .get(sheet)
            .ok_or_else(|| GridError::UnknownSheet(sheet.to_string()))?;
        Ok(store.merged.iter().find(|m| m.contains(addr)).copied())
    }

    fn sheet_bounds(&self, sheet: &str) -> Result<Option<(u32, u32)>, GridError> {
        let store = self
            .sheets
            .get(sheet)
            .ok_or_else(|| GridError::UnknownSheet(sheet.to_string()))?;
        let mut bounds: Option<(u32, u32)> = None;
        for (row, col) in store.cells.keys() {
            let entry = bounds.get_or_insert((0, 0));
            entry.0 = entry.0.max(*row);
            entry.1 = entry.1.max(*col);
        }
        Ok(bounds)
    }
}

impl GridWriter for MemoryGrid {
    fn write_value(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        value: CellValue,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(sheet, addr);
        cell.value = Some(value);
        cell.formula = None;
        Ok(())
    }

    fn write_formula(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        formula: String,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(sheet, addr);
        cell.formula = Some(formula);
        cell.value = None;
        Ok(())
    }

    fn clear_cell(&mut self, sheet: &str, addr: CellAddress) -> Result<(), GridError> {
        if let Some(store) = self.sheets.get_mut(sheet) {
            if let Some(cell) = store.cells.get_mut(&(addr.row, addr.col)) {
                cell.value = None;
                cell.formula = None;
            }
        }
        Ok(())
    }

    fn set_style(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        style: StyleOptions,
    ) -> Result<(), GridError> {
        self.cell_mut(sheet, addr).style = Some(style);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let mut grid = MemoryGrid::new();
        let addr = CellAddress::parse_a1("B2").unwrap();
        grid.write_value("Data", addr, CellValue::Int(7)).unwrap();

        let cell = grid.read_cell("Data", addr).unwrap().unwrap();
        assert_eq!(cell.value, Some(CellValue::Int(7)));
        assert_eq!(grid.cell_text("Data", addr).unwrap(), "7");
        assert!(!grid.is_blank("Data", addr).unwrap());
    }

    #[test]
    fn unknown_sheet_read_fails() {
        let grid = MemoryGrid::new();
        let err = grid
            .read_cell("Nope", CellAddress::new(0, 0))
            .expect_err("read of unknown sheet must fail");
        assert!(matches!(err, GridError::UnknownSheet(s) if s == "Nope"));
    }

    #[test]
    fn formula_cell_is_not_blank() {
        let mut grid = MemoryGrid::new();
        let addr = CellAddress::new(0, 0);
        grid.write_formula("Data", addr, "SUM(A2:A5)".into())
            .unwrap();
        assert!(!grid.is_blank("Data", addr).unwrap());
        // Pass-through: the formula text is opaque, not evaluated.
        assert_eq!(grid.cell_text("Data", addr).unwrap(), "");
    }

    #[test]
    fn merged_region_lookup_and_overlap() {
        let mut grid = MemoryGrid::new();
        let region = Region::parse_a1("B2:C3").unwrap();
        grid.add_merged_region("Data", region).unwrap();

        let hit = grid
            .merged_region("Data", CellAddress::parse_a1("C3").unwrap())
            .unwrap();
        assert_eq!(hit, Some(region));
        assert_eq!(
            grid.merged_region("Data", CellAddress::parse_a1("A1").unwrap())
                .unwrap(),
            None
        );

        let overlapping = Region::parse_a1("C3:D4").unwrap();
        assert!(matches!(
            grid.add_merged_region("Data", overlapping),
            Err(GridError::OverlappingMerge { .. })
        ));
    }

    #[test]
    fn bounds_track_writes() {
        let mut grid = MemoryGrid::new();
        grid.add_sheet("Data");
        assert_eq!(grid.sheet_bounds("Data").unwrap(), None);
        grid.set_text("Data", "D5", "x");
        assert_eq!(grid.sheet_bounds("Data").unwrap(), Some((4, 3)));
    }
}
