//! Position resolution: label search, directional offsets, and region cursors.

use regex::Regex;
use sheetbind_common::{Axis, CellAddress, Direction, Region};
use sheetbind_grid::{GridError, GridReader};

/// Compiled matcher for a labelled binding's label text.
#[derive(Debug, Clone)]
pub(crate) enum LabelMatcher {
    /// Exact match against the trimmed cell text.
    Text(String),
    /// Anchored regular expression over the trimmed cell text.
    Pattern(Regex),
}

impl LabelMatcher {
    pub(crate) fn matches(&self, cell_text: &str) -> bool {
        let trimmed = cell_text.trim();
        match self {
            LabelMatcher::Text(label) => trimmed == label,
            LabelMatcher::Pattern(re) => re.is_match(trimmed),
        }
    }

    /// Label text for error messages.
    pub(crate) fn describe(&self) -> &str {
        match self {
            LabelMatcher::Text(label) => label,
            LabelMatcher::Pattern(re) => re.as_str(),
        }
    }
}

/// Scan the sheet row-major for the first cell whose trimmed text matches.
/// The search covers `within` when given, otherwise the sheet's used bounds.
pub(crate) fn find_label(
    grid: &dyn GridReader,
    sheet: &str,
    matcher: &LabelMatcher,
    within: Option<Region>,
) -> Result<Option<CellAddress>, GridError> {
    let region = match within {
        Some(region) => region,
        None => match grid.sheet_bounds(sheet)? {
            Some((max_row, max_col)) => Region {
                start: CellAddress { row: 0, col: 0 },
                end: CellAddress {
                    row: max_row,
                    col: max_col,
                },
            },
            None => return Ok(None),
        },
    };
    for addr in region.iter() {
        let text = grid.cell_text(sheet, addr)?;
        if !text.is_empty() && matcher.matches(&text) {
            return Ok(Some(addr));
        }
    }
    Ok(None)
}

/// Step from a label cell to its value cell. `None` when the offset leaves
/// the grid, which the caller reports as an out-of-bounds failure.
pub(crate) fn offset_from(
    label: CellAddress,
    direction: Direction,
    offset: u32,
) -> Option<CellAddress> {
    label.step(direction, offset as i64).ok()
}

/// Walks item positions of a directional region, one anchor per item.
///
/// A position covered by a merged region resolves to the region's anchor and
/// the cursor then skips the rest of the merged span along the axis, so a
/// merged cell counts as a single item.
pub(crate) struct RegionCursor<'g> {
    grid: &'g dyn GridReader,
    sheet: &'g str,
    axis: Axis,
    next: Option<CellAddress>,
}

impl<'g> RegionCursor<'g> {
    pub(crate) fn new(grid: &'g dyn GridReader, sheet: &'g str, origin: CellAddress, axis: Axis) -> Self {
        Self {
            grid,
            sheet,
            axis,
            next: Some(origin),
        }
    }

    /// Anchor of the next item, advancing past its merged span (if any).
    /// `Ok(None)` once the cursor has walked off the grid.
    pub(crate) fn advance(&mut self) -> Result<Option<CellAddress>, GridError> {
        let Some(position) = self.next else {
            return Ok(None);
        };
        let merged = self.grid.merged_region(self.sheet, position)?;
        let (anchor, span_end) = match merged {
            Some(region) => (region.anchor(), region.end),
            None => (position, position),
        };
        self.next = match self.axis {
            Axis::Down => CellAddress::try_new(span_end.row + 1, position.col).ok(),
            Axis::Right => CellAddress::try_new(position.row, span_end.col + 1).ok(),
        };
        Ok(Some(anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetbind_common::CellValue;
    use sheetbind_grid::MemoryGrid;

    fn grid_with_labels() -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.set_text("S", "A1", "Title");
        grid.set_text("S", "B3", "  Issued  ");
        grid.set_text("S", "C3", "2017-08-20");
        grid
    }

    #[test]
    fn label_matches_trimmed_text() {
        let grid = grid_with_labels();
        let found = find_label(
            &grid,
            "S",
            &LabelMatcher::Text("Issued".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(found, Some(CellAddress::new(2, 1)));
    }

    #[test]
    fn label_search_respects_within() {
        let grid = grid_with_labels();
        let within = Region::parse_a1("A1:A2").unwrap();
        let found = find_label(
            &grid,
            "S",
            &LabelMatcher::Text("Issued".to_string()),
            Some(within),
        )
        .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn regex_matcher_is_anchored_by_caller() {
        let grid = grid_with_labels();
        let matcher = LabelMatcher::Pattern(Regex::new("^Iss.*$").unwrap());
        let found = find_label(&grid, "S", &matcher, None).unwrap();
        assert_eq!(found, Some(CellAddress::new(2, 1)));
    }

    #[test]
    fn offset_out_of_bounds_is_none() {
        assert_eq!(offset_from(CellAddress::new(0, 0), Direction::Up, 1), None);
        assert_eq!(
            offset_from(CellAddress::new(2, 1), Direction::Right, 1),
            Some(CellAddress::new(2, 2))
        );
    }

    #[test]
    fn cursor_steps_one_cell_at_a_time() {
        let mut grid = MemoryGrid::new();
        grid.add_sheet("S");
        let mut cursor = RegionCursor::new(&grid, "S", CellAddress::new(1, 3), Axis::Down);
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(1, 3)));
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(2, 3)));
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(3, 3)));
    }

    #[test]
    fn cursor_anchors_and_skips_merged_spans() {
        let mut grid = MemoryGrid::new();
        grid.set("S", CellAddress::new(0, 0), CellValue::Text("a".into()));
        grid.add_merged_region("S", Region::parse_a1("A2:A4").unwrap())
            .unwrap();

        let mut cursor = RegionCursor::new(&grid, "S", CellAddress::new(0, 0), Axis::Down);
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(0, 0)));
        // A2:A4 is one item, anchored at A2.
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(1, 0)));
        assert_eq!(cursor.advance().unwrap(), Some(CellAddress::new(4, 0)));
    }

    #[test]
    fn cursor_ends_at_grid_edge() {
        let mut grid = MemoryGrid::new();
        grid.add_sheet("S");
        let last = CellAddress::new(sheetbind_common::ROW_MAX, 0);
        let mut cursor = RegionCursor::new(&grid, "S", last, Axis::Down);
        assert_eq!(cursor.advance().unwrap(), Some(last));
        assert_eq!(cursor.advance().unwrap(), None);
    }
}
