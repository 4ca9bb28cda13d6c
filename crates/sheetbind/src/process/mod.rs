//! Pass execution: walking a bound mapping over a grid in either direction.
//!
//! A load pass reads cells into a record; a save pass writes a record into
//! cells. Both dispatch on the bound binding kind and funnel recoverable
//! failures through the pass sink, so `continue_on_error` behaves identically
//! everywhere.

mod array;
mod table;

use sheetbind_common::{CellAddress, CellValue, Direction};
use sheetbind_grid::{GridReader, GridWriter};
use tracing::trace;

use crate::binding::{BoundKind, MappingBindings};
use crate::convert::{ParseFailure, Pipeline};
use crate::error::BindError;
use crate::record::{DynRecord, FieldValue, RecordAccess};
use crate::report::{ConversionFailure, FailureKind, FailureSink};
use crate::resolver::{self, LabelMatcher};

/// Origin of a top-level pass; nested passes shift it.
pub(crate) const TOP_LEFT: CellAddress = CellAddress { row: 0, col: 0 };

pub(crate) struct LoadPass<'a, 'r> {
    pub(crate) bindings: &'a MappingBindings,
    pub(crate) grid: &'a dyn GridReader,
    pub(crate) sink: FailureSink<'r>,
}

impl LoadPass<'_, '_> {
    pub(crate) fn run(
        &mut self,
        record_index: usize,
        sheet: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<(), BindError> {
        let path = self.bindings.bound(record_index).name.clone();
        self.load_record(record_index, sheet, TOP_LEFT, &path, record)
    }

    fn load_record(
        &mut self,
        record_index: usize,
        sheet: &str,
        origin: CellAddress,
        path: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<(), BindError> {
        let bound = self.bindings.bound(record_index);
        for field in &bound.fields {
            let field_path = format!("{path}.{}", field.name);
            trace!(field = %field_path, "load field");
            match &field.kind {
                BoundKind::Cell { addr, pipeline } => {
                    let Some(addr) = self.shifted(origin, *addr, &field_path, sheet, pipeline)?
                    else {
                        continue;
                    };
                    self.load_scalar(sheet, addr, pipeline, &field_path, &field.name, record)?;
                }
                BoundKind::Labelled {
                    matcher,
                    direction,
                    offset,
                    within,
                    pipeline,
                } => {
                    let within = match within {
                        Some(region) => Some(shift_region(*region, origin)),
                        None => None,
                    };
                    let Some(addr) = self.resolve_labelled(
                        sheet,
                        matcher,
                        *direction,
                        *offset,
                        within,
                        &field_path,
                        pipeline,
                    )?
                    else {
                        continue;
                    };
                    self.load_scalar(sheet, addr, pipeline, &field_path, &field.name, record)?;
                }
                BoundKind::Array {
                    origin: region_origin,
                    axis,
                    count,
                    shape,
                    pipeline,
                } => {
                    let Some(start) =
                        self.shifted(origin, *region_origin, &field_path, sheet, pipeline)?
                    else {
                        continue;
                    };
                    self.load_array(
                        sheet,
                        start,
                        *axis,
                        *count,
                        *shape,
                        pipeline,
                        &field_path,
                        &field.name,
                        record,
                    )?;
                }
                BoundKind::Table {
                    origin: table_origin,
                    mapping,
                    count,
                } => {
                    let start = match table_origin.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink.push(out_of_bounds(&field_path, sheet, "rows"))?;
                            continue;
                        }
                    };
                    self.load_table(
                        sheet,
                        start,
                        *mapping,
                        *count,
                        &field_path,
                        &field.name,
                        record,
                    )?;
                }
                BoundKind::Column { .. } => {
                    // Column fields only have meaning inside a table region;
                    // a direct pass over the mapping leaves them untouched.
                    continue;
                }
                BoundKind::Nested {
                    origin: nested_origin,
                    mapping,
                } => {
                    let shifted = match nested_origin.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink.push(out_of_bounds(&field_path, sheet, "record"))?;
                            continue;
                        }
                    };
                    let mut sub = DynRecord::new();
                    self.load_record(*mapping, sheet, shifted, &field_path, &mut sub)?;
                    record.set(&field.name, FieldValue::Record(sub));
                }
            }
        }
        Ok(())
    }

    fn load_scalar(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        pipeline: &Pipeline,
        path: &str,
        field: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<(), BindError> {
        let addr = resolve_anchor(self.grid, sheet, addr)?;
        let cell = self.grid.read_cell(sheet, addr)?;
        match pipeline.read(cell.as_ref()) {
            Ok(Some(value)) => record.set(field, FieldValue::Value(value)),
            Ok(None) => record.clear(field),
            Err(failure) => {
                self.sink
                    .push(parse_failure(path, sheet, addr, pipeline.target(), failure))?;
            }
        }
        Ok(())
    }

    fn resolve_labelled(
        &mut self,
        sheet: &str,
        matcher: &LabelMatcher,
        direction: Direction,
        offset: u32,
        within: Option<sheetbind_common::Region>,
        path: &str,
        pipeline: &Pipeline,
    ) -> Result<Option<CellAddress>, BindError> {
        let Some(label_addr) = resolver::find_label(self.grid, sheet, matcher, within)? else {
            self.sink.push(
                ConversionFailure::new(path, sheet, FailureKind::LabelNotFound, pipeline.target())
                    .raw(matcher.describe()),
            )?;
            return Ok(None);
        };
        match resolver::offset_from(label_addr, direction, offset) {
            Some(addr) => Ok(Some(addr)),
            None => {
                self.sink.push(
                    out_of_bounds(path, sheet, pipeline.target())
                        .at(label_addr)
                        .var("label", matcher.describe().to_string()),
                )?;
                Ok(None)
            }
        }
    }

    fn shifted(
        &mut self,
        origin: CellAddress,
        addr: CellAddress,
        path: &str,
        sheet: &str,
        pipeline: &Pipeline,
    ) -> Result<Option<CellAddress>, BindError> {
        match addr.offset(origin.row as i64, origin.col as i64) {
            Ok(addr) => Ok(Some(addr)),
            Err(_) => {
                self.sink
                    .push(out_of_bounds(path, sheet, pipeline.target()))?;
                Ok(None)
            }
        }
    }
}

pub(crate) struct SavePass<'a, 'r, G: GridReader + GridWriter> {
    pub(crate) bindings: &'a MappingBindings,
    pub(crate) grid: &'a mut G,
    pub(crate) sink: FailureSink<'r>,
}

impl<G: GridReader + GridWriter> SavePass<'_, '_, G> {
    pub(crate) fn run(
        &mut self,
        record_index: usize,
        sheet: &str,
        record: &dyn RecordAccess,
    ) -> Result<(), BindError> {
        let path = self.bindings.bound(record_index).name.clone();
        self.save_record(record_index, sheet, TOP_LEFT, &path, record)
    }

    fn save_record(
        &mut self,
        record_index: usize,
        sheet: &str,
        origin: CellAddress,
        path: &str,
        record: &dyn RecordAccess,
    ) -> Result<(), BindError> {
        let bound = self.bindings.bound(record_index);
        for field in &bound.fields {
            let field_path = format!("{path}.{}", field.name);
            trace!(field = %field_path, "save field");
            match &field.kind {
                BoundKind::Cell { addr, pipeline } => {
                    let shifted = match addr.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink
                                .push(out_of_bounds(&field_path, sheet, pipeline.target()))?;
                            continue;
                        }
                    };
                    let value = record.get(&field.name).and_then(FieldValue::as_value);
                    self.save_scalar(sheet, shifted, pipeline, value)?;
                }
                BoundKind::Labelled {
                    matcher,
                    direction,
                    offset,
                    within,
                    pipeline,
                } => {
                    let within = within.as_ref().map(|region| shift_region(*region, origin));
                    let Some(label_addr) =
                        resolver::find_label(&*self.grid, sheet, matcher, within)?
                    else {
                        self.sink.push(
                            ConversionFailure::new(
                                &field_path,
                                sheet,
                                FailureKind::LabelNotFound,
                                pipeline.target(),
                            )
                            .raw(matcher.describe()),
                        )?;
                        continue;
                    };
                    let Some(addr) = resolver::offset_from(label_addr, *direction, *offset) else {
                        self.sink.push(
                            out_of_bounds(&field_path, sheet, pipeline.target()).at(label_addr),
                        )?;
                        continue;
                    };
                    let value = record.get(&field.name).and_then(FieldValue::as_value);
                    self.save_scalar(sheet, addr, pipeline, value)?;
                }
                BoundKind::Array {
                    origin: region_origin,
                    axis,
                    count,
                    shape: _,
                    pipeline,
                } => {
                    let start = match region_origin.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink
                                .push(out_of_bounds(&field_path, sheet, pipeline.target()))?;
                            continue;
                        }
                    };
                    self.save_array(
                        sheet,
                        start,
                        *axis,
                        *count,
                        pipeline,
                        &field_path,
                        record.get(&field.name).and_then(FieldValue::as_list),
                    )?;
                }
                BoundKind::Table {
                    origin: table_origin,
                    mapping,
                    count,
                } => {
                    let start = match table_origin.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink.push(out_of_bounds(&field_path, sheet, "rows"))?;
                            continue;
                        }
                    };
                    self.save_table(
                        sheet,
                        start,
                        *mapping,
                        *count,
                        &field_path,
                        record.get(&field.name).and_then(FieldValue::as_rows),
                    )?;
                }
                BoundKind::Column { .. } => continue,
                BoundKind::Nested {
                    origin: nested_origin,
                    mapping,
                } => {
                    let shifted = match nested_origin.offset(origin.row as i64, origin.col as i64) {
                        Ok(addr) => addr,
                        Err(_) => {
                            self.sink.push(out_of_bounds(&field_path, sheet, "record"))?;
                            continue;
                        }
                    };
                    // An absent sub-record writes nothing; existing cells keep
                    // their content.
                    if let Some(sub) = record.get(&field.name).and_then(FieldValue::as_record) {
                        self.save_record(*mapping, sheet, shifted, &field_path, sub)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Write one cell: default substitution, then formula-primary | value |
    /// formula | blank, then style.
    fn save_scalar(
        &mut self,
        sheet: &str,
        addr: CellAddress,
        pipeline: &Pipeline,
        value: Option<&CellValue>,
    ) -> Result<(), BindError> {
        let addr = resolve_anchor(&*self.grid, sheet, addr)?;
        let outgoing = pipeline.outgoing(value);
        if pipeline.formula_primary()
            && let Some(formula) = pipeline.formula()
        {
            self.grid.write_formula(sheet, addr, formula.to_string())?;
        } else if let Some(value) = outgoing {
            self.grid.write_value(sheet, addr, value)?;
        } else if let Some(formula) = pipeline.formula() {
            self.grid.write_formula(sheet, addr, formula.to_string())?;
        } else {
            self.grid.clear_cell(sheet, addr)?;
        }
        if let Some(style) = pipeline.style() {
            self.grid.set_style(sheet, addr, style.clone())?;
        }
        Ok(())
    }
}

/// Anchor resolution for a single position: a cell inside a merged region
/// reads and writes through the region's top-left cell.
fn resolve_anchor(
    grid: &dyn GridReader,
    sheet: &str,
    addr: CellAddress,
) -> Result<CellAddress, sheetbind_grid::GridError> {
    Ok(grid
        .merged_region(sheet, addr)?
        .map(|region| region.anchor())
        .unwrap_or(addr))
}

fn shift_region(
    region: sheetbind_common::Region,
    origin: CellAddress,
) -> sheetbind_common::Region {
    region
        .offset(origin.row as i64, origin.col as i64)
        .unwrap_or(region)
}

fn parse_failure(
    path: &str,
    sheet: &str,
    addr: CellAddress,
    target: &str,
    failure: ParseFailure,
) -> ConversionFailure {
    let mut out = ConversionFailure::new(path, sheet, FailureKind::Parse, target)
        .at(addr)
        .raw(failure.raw);
    for (name, value) in failure.vars {
        out = out.var(name, value);
    }
    out
}

fn out_of_bounds(path: &str, sheet: &str, target: &str) -> ConversionFailure {
    ConversionFailure::new(path, sheet, FailureKind::OutOfBounds, target)
}
