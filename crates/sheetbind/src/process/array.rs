//! Array-region item processing.

use std::collections::HashSet;

use sheetbind_common::{Axis, CellAddress, CellValue};
use sheetbind_grid::{GridReader, GridWriter};

use crate::binding::ContainerShape;
use crate::convert::Pipeline;
use crate::error::BindError;
use crate::record::{FieldValue, RecordAccess};
use crate::resolver::RegionCursor;

use super::{out_of_bounds, parse_failure, LoadPass, SavePass};

impl LoadPass<'_, '_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn load_array(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        axis: Axis,
        count: Option<u32>,
        shape: ContainerShape,
        pipeline: &Pipeline,
        path: &str,
        field: &str,
        record: &mut dyn RecordAccess,
    ) -> Result<(), BindError> {
        let mut items = Vec::new();
        let mut cursor = RegionCursor::new(self.grid, sheet, origin, axis);
        let mut index = 0u32;
        loop {
            if let Some(n) = count
                && index >= n
            {
                break;
            }
            let Some(anchor) = cursor.advance()? else {
                // Counted region runs off the grid edge.
                if count.is_some() {
                    self.sink
                        .push(out_of_bounds(&format!("{path}[{index}]"), sheet, pipeline.target()))?;
                }
                break;
            };
            let cell = self.grid.read_cell(sheet, anchor)?;
            let blank = cell.as_ref().is_none_or(|c| c.is_blank());
            if count.is_none() && blank {
                // Open region: first structurally blank position terminates.
                break;
            }
            let item_path = format!("{path}[{index}]");
            match pipeline.read(cell.as_ref()) {
                Ok(Some(value)) => items.push(value),
                // Blank item inside a counted region holds its position.
                Ok(None) => items.push(CellValue::Empty),
                Err(failure) => {
                    self.sink.push(parse_failure(
                        &item_path,
                        sheet,
                        anchor,
                        pipeline.target(),
                        failure,
                    ))?;
                    items.push(CellValue::Empty);
                }
            }
            index += 1;
        }

        let items = match shape {
            ContainerShape::List | ContainerShape::Array { .. } => items,
            ContainerShape::Set => dedup_first_occurrence(items),
        };
        record.set(field, FieldValue::List(items));
        Ok(())
    }
}

impl<G: GridReader + GridWriter> SavePass<'_, '_, G> {
    pub(super) fn save_array(
        &mut self,
        sheet: &str,
        origin: CellAddress,
        axis: Axis,
        count: Option<u32>,
        pipeline: &Pipeline,
        path: &str,
        items: Option<&[CellValue]>,
    ) -> Result<(), BindError> {
        let items = items.unwrap_or(&[]);
        // Fixed counts write exactly `count` positions; open regions write one
        // position per item. Either way positions come from the same cursor
        // walk, so merged spans consume one item each.
        let total = count.map(|n| n as usize).unwrap_or(items.len());
        let mut positions = Vec::with_capacity(total);
        {
            let mut cursor = RegionCursor::new(&*self.grid, sheet, origin, axis);
            for _ in 0..total {
                match cursor.advance()? {
                    Some(anchor) => positions.push(anchor),
                    None => break,
                }
            }
        }
        if positions.len() < total {
            self.sink.push(out_of_bounds(
                &format!("{path}[{}]", positions.len()),
                sheet,
                pipeline.target(),
            ))?;
        }
        for (index, addr) in positions.iter().enumerate() {
            let value = items.get(index).filter(|v| !matches!(v, CellValue::Empty));
            self.save_scalar(sheet, *addr, pipeline, value)?;
        }
        Ok(())
    }
}

/// First occurrence wins; later equal values are dropped.
fn dedup_first_occurrence(items: Vec<CellValue>) -> Vec<CellValue> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
