//! Table-region processing: header matching plus per-row sub-records.

use sheetbind_common::{CellAddress, CellValue, COL_MAX, ROW_MAX};
use sheetbind_grid::{GridReader, GridWriter};

use crate::convert::Pipeline;
use crate::error::BindError;
use crate::record::{DynRecord, FieldValue, RecordAccess};
use crate::report::{ConversionFailure, FailureKind};

use super::{parse_failure, LoadPass, SavePass};

/// One column of a table, resolved against the sheet's header row.
struct ResolvedColumn<'a> {
    field: &'a str,
    pipeline: &'a Pipeline,
    col: u32,
}

/// Read the header row rightward from `origin` until the first blank cell.
fn read_headers(
    grid: &dyn GridReader,
    sheet: &str,
    origin: CellAddress,
) -> Result<Vec<(String, u32)>, BindError> {
    let mut headers = Vec::new();
    let mut col = origin.col;
    loop {
        let addr = CellAddress {
            row: origin.row,
            col,
        };
        if grid.is_blank(sheet, addr)? {
            break;
        }
        headers.push((grid.cell_text(sheet, addr)?.trim().to_string(), col));
        if col == COL_MAX {
            break;
        }
        col += 1;
    }
    Ok(headers)
}

/// Match each column-bound field of the sub-mapping to a header position.
/// Missing headers are recoverable failures; the column is skipped.
fn resolve_columns<'a, F>(
    grid: &dyn GridReader,
    bindings: &'a crate::binding::MappingBindings,
    mapping: usize,
    sheet: &str,
    origin: CellAddress,
    path: &str,
    mut on_missing: F,
) -> Result<Vec<ResolvedColumn<'a>>, BindError>
where
    F: FnMut(ConversionFailure) -> Result<(), BindError>,
{
    let headers = read_headers(grid, sheet, origin)?;
    let sub = bindings.bound(mapping);
    let mut columns = Vec::new();
    for (field, header, pipeline) in sub.column_fields() {
        match headers.iter().find(|(text, _)| text == header.trim()) {
            Some((_, col)) => columns.push(ResolvedColumn {
                field: &field.name,
                pipeline,
                col: *col,
            }),
            None => {
                on_missing(
                    ConversionFailure::new(
                        format!("{path}.{}", field.name),
                        sheet,
                        FailureKind::LabelNotFound,
                        pipeline.target(),
                    )
                    .raw(header)
                    .at(origin),
                )?;
            }
        }
    }
    Ok(columns)
}

impl LoadPass<'_, '_> {
    pub(super) fn load_table(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        mapping: usize,
        count: Option<u32>,
        path: &str,
        field: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<(), BindError> {
        let sink = &mut self.sink;
        let columns = resolve_columns(
            self.grid,
            self.bindings,
            mapping,
            sheet,
            origin,
            path,
            |failure| sink.push(failure),
        )?;
        if columns.is_empty() {
            record.set(field, FieldValue::Rows(Vec::new()));
            return Ok(());
        }

        let mut rows = Vec::new();
        let mut row = origin.row + 1;
        let mut index = 0u32;
        loop {
            if let Some(n) = count
                && index >= n
            {
                break;
            }
            if row > ROW_MAX {
                break;
            }
            // Open tables end at the first row where every mapped column is
            // structurally blank.
            if count.is_none() {
                let mut all_blank = true;
                for column in &columns {
                    let addr = CellAddress {
                        row,
                        col: column.col,
                    };
                    if !self.grid.is_blank(sheet, addr)? {
                        all_blank = false;
                        break;
                    }
                }
                if all_blank {
                    break;
                }
            }

            let mut sub_record = DynRecord::new();
            for column in &columns {
                let addr = CellAddress {
                    row,
                    col: column.col,
                };
                let item_path = format!("{path}[{index}].{}", column.field);
                let cell = self.grid.read_cell(sheet, addr)?;
                match column.pipeline.read(cell.as_ref()) {
                    Ok(Some(value)) => sub_record.set(column.field, FieldValue::Value(value)),
                    Ok(None) => {}
                    Err(failure) => {
                        self.sink.push(parse_failure(
                            &item_path,
                            sheet,
                            addr,
                            column.pipeline.target(),
                            failure,
                        ))?;
                    }
                }
            }
            rows.push(sub_record);
            row += 1;
            index += 1;
        }
        record.set(field, FieldValue::Rows(rows));
        Ok(())
    }
}

impl<G: GridReader + GridWriter> SavePass<'_, '_, G> {
    pub(super) fn save_table(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        mapping: usize,
        count: Option<u32>,
        path: &str,
        rows: Option<&[DynRecord]>,
    ) -> Result<(), BindError> {
        let sink = &mut self.sink;
        let columns = resolve_columns(
            &*self.grid,
            self.bindings,
            mapping,
            sheet,
            origin,
            path,
            |failure| sink.push(failure),
        )?;
        if columns.is_empty() {
            return Ok(());
        }

        let rows = rows.unwrap_or(&[]);
        // Fixed counts write exactly `count` rows; short input blanks the
        // remainder. Open tables write one row per record and leave whatever
        // follows untouched.
        let total = count.map(|n| n as usize).unwrap_or(rows.len());
        for index in 0..total {
            let row = origin.row + 1 + index as u32;
            if row > ROW_MAX {
                self.sink.push(
                    ConversionFailure::new(
                        format!("{path}[{index}]"),
                        sheet,
                        FailureKind::OutOfBounds,
                        "rows",
                    ),
                )?;
                break;
            }
            let record = rows.get(index);
            for column in &columns {
                let addr = CellAddress {
                    row,
                    col: column.col,
                };
                let value: Option<&CellValue> = record
                    .and_then(|r| r.value(column.field))
                    .filter(|v| !matches!(v, CellValue::Empty));
                self.save_scalar(sheet, addr, column.pipeline, value)?;
            }
        }
        Ok(())
    }
}
