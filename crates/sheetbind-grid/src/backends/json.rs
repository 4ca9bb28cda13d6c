//! JSON fixture backend.
//!
//! Stores a grid document as a small versioned JSON file so tests and examples
//! can round-trip grids without a spreadsheet file format.

use crate::error::GridError;
use crate::memory::MemoryGrid;
use crate::traits::{CellData, StyleOptions};
use serde::{Deserialize, Serialize};
use sheetbind_common::{CellAddress, CellValue, Region};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonGrid {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sheets: BTreeMap<String, JsonSheet>,
}

fn default_version() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonSheet {
    #[serde(default)]
    cells: Vec<JsonCell>,
    /// Merged regions as `A1:B2` strings.
    #[serde(default)]
    merged: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonCell {
    row: u32,
    col: u32,
    #[serde(default)]
    value: Option<JsonValue>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<StyleOptions>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum JsonValue {
    Int(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    Date(String),
    DateTime(String),
    Time(String),
    Empty,
}

/// Adapter between the JSON fixture document and [`MemoryGrid`].
pub struct JsonGridAdapter {
    data: JsonGrid,
    path: Option<PathBuf>,
}

impl Default for JsonGridAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonGridAdapter {
    pub fn new() -> Self {
        Self {
            data: JsonGrid::default(),
            path: None,
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let data: JsonGrid = serde_json::from_reader(reader)?;
        Ok(Self {
            data,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn open_str(text: &str) -> Result<Self, GridError> {
        let data: JsonGrid = serde_json::from_str(text)?;
        Ok(Self { data, path: None })
    }

    pub fn to_json_string(&self) -> Result<String, GridError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Write the document back to the path it was opened from, if any.
    pub fn save(&self) -> Result<(), GridError> {
        if let Some(path) = &self.path {
            let mut file = File::create(path)?;
            let s = serde_json::to_string_pretty(&self.data)?;
            file.write_all(s.as_bytes())?;
        }
        Ok(())
    }

    /// Materialize the document as a [`MemoryGrid`].
    pub fn to_memory(&self) -> Result<MemoryGrid, GridError> {
        let mut grid = MemoryGrid::new();
        for (name, sheet) in &self.data.sheets {
            grid.add_sheet(name);
            for cell in &sheet.cells {
                let addr = CellAddress::try_new(cell.row, cell.col)?;
                let data = CellData {
                    value: cell.value.as_ref().map(json_to_value).transpose()?,
                    formula: cell.formula.clone(),
                    style: cell.style.clone(),
                };
                *grid
                    .sheets_mut()
                    .get_mut(name)
                    .expect("sheet was just created")
                    .cells
                    .entry((addr.row, addr.col))
                    .or_default() = data;
            }
            for merged in &sheet.merged {
                let region = Region::parse_a1(merged)?;
                grid.add_merged_region(name, region)?;
            }
        }
        Ok(grid)
    }

    /// Replace the document's contents from a [`MemoryGrid`].
    pub fn from_memory(grid: &MemoryGrid) -> Self {
        let mut data = JsonGrid {
            version: default_version(),
            sheets: BTreeMap::new(),
        };
        for (name, sheet) in grid.sheets() {
            let cells = sheet
                .cells
                .iter()
                .map(|((row, col), cell)| JsonCell {
                    row: *row,
                    col: *col,
                    value: cell.value.as_ref().map(value_to_json),
                    formula: cell.formula.clone(),
                    style: cell.style.clone(),
                })
                .collect();
            let merged = sheet.merged.iter().map(|m| m.to_string()).collect();
            data.sheets
                .insert(name.clone(), JsonSheet { cells, merged });
        }
        Self { data, path: None }
    }

    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

fn value_to_json(v: &CellValue) -> JsonValue {
    match v {
        CellValue::Int(i) => JsonValue::Int(*i),
        CellValue::Number(n) => JsonValue::Number(*n),
        CellValue::Text(s) => JsonValue::Text(s.clone()),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Date(d) => JsonValue::Date(d.to_string()),
        CellValue::DateTime(dt) => JsonValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        CellValue::Time(t) => JsonValue::Time(t.to_string()),
        CellValue::Empty => JsonValue::Empty,
    }
}

fn json_to_value(v: &JsonValue) -> Result<CellValue, GridError> {
    Ok(match v {
        JsonValue::Int(i) => CellValue::Int(*i),
        JsonValue::Number(n) => CellValue::Number(*n),
        JsonValue::Text(s) => CellValue::Text(s.clone()),
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Date(s) => CellValue::Date(
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| GridError::Document(format!("bad date `{s}`: {e}")))?,
        ),
        JsonValue::DateTime(s) => CellValue::DateTime(
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map_err(|e| GridError::Document(format!("bad datetime `{s}`: {e}")))?,
        ),
        JsonValue::Time(s) => CellValue::Time(
            chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map_err(|e| GridError::Document(format!("bad time `{s}`: {e}")))?,
        ),
        JsonValue::Empty => CellValue::Empty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{GridReader, GridWriter};

    #[test]
    fn memory_roundtrip() {
        let mut grid = MemoryGrid::new();
        grid.set_text("Data", "A1", "hello");
        grid.write_value(
            "Data",
            CellAddress::parse_a1("B2").unwrap(),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2017, 8, 20).unwrap()),
        )
        .unwrap();
        grid.add_merged_region("Data", Region::parse_a1("C1:D2").unwrap())
            .unwrap();

        let adapter = JsonGridAdapter::from_memory(&grid);
        let text = adapter.to_json_string().unwrap();
        let reloaded = JsonGridAdapter::open_str(&text).unwrap().to_memory().unwrap();

        assert_eq!(reloaded.cell_text("Data", CellAddress::new(0, 0)).unwrap(), "hello");
        assert_eq!(
            reloaded
                .read_cell("Data", CellAddress::parse_a1("B2").unwrap())
                .unwrap()
                .unwrap()
                .value,
            Some(CellValue::Date(
                chrono::NaiveDate::from_ymd_opt(2017, 8, 20).unwrap()
            ))
        );
        assert_eq!(
            reloaded
                .merged_region("Data", CellAddress::parse_a1("D2").unwrap())
                .unwrap(),
            Some(Region::parse_a1("C1:D2").unwrap())
        );
    }

    #[test]
    fn malformed_date_is_a_document_error() {
        let doc = r#"{
            "sheets": {
                "Data": {
                    "cells": [
                        { "row": 0, "col": 0, "value": { "type": "date", "value": "20-08-2017" } }
                    ]
                }
            }
        }"#;
        let err = JsonGridAdapter::open_str(doc)
            .unwrap()
            .to_memory()
            .expect_err("bad date literal must fail");
        assert!(matches!(err, GridError::Document(_)));
    }

    #[test]
    fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.json");

        let mut grid = MemoryGrid::new();
        grid.set_text("Data", "A1", "persisted");
        JsonGridAdapter::from_memory(&grid)
            .with_path(&path)
            .save()
            .unwrap();

        let reloaded = JsonGridAdapter::open_path(&path).unwrap().to_memory().unwrap();
        assert_eq!(
            reloaded.cell_text("Data", CellAddress::new(0, 0)).unwrap(),
            "persisted"
        );
    }
}
