//! Grid layout model for the dashboard panels.
//!
//! Dragging and resizing happen in an external grid widget. This module owns
//! the cell model, re-establishes the cell invariants every time the widget
//! reports a new arrangement, and converts grid units into pixel rectangles
//! for rasterization.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Number of columns in the dashboard grid.
pub const GRID_COLUMNS: u32 = 12;
/// Height of a single grid row in pixels.
pub const ROW_HEIGHT_PX: u32 = 40;
/// Gap between neighbouring cells in pixels, both horizontally and vertically.
pub const CELL_MARGIN_PX: u32 = 16;
/// Padding between the grid edge and the outermost cells.
pub const CONTAINER_PADDING_PX: u32 = 16;
/// Fixed width of the grid container in pixels.
pub const GRID_WIDTH_PX: u32 = 1200;
/// Rows a layout may extend to; cells below are pulled back up.
pub const MAX_GRID_ROWS: u32 = 96;

/// The fixed set of panels shown on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CellKind {
    Text,
    Line,
    Bar,
    Pie,
    Table,
}

impl CellKind {
    /// All panel kinds in the order they are laid out by default.
    pub const ALL: [CellKind; 5] = [
        CellKind::Text,
        CellKind::Line,
        CellKind::Bar,
        CellKind::Pie,
        CellKind::Table,
    ];

    /// Identifier used by the grid widget for this panel.
    pub fn id(self) -> &'static str {
        match self {
            CellKind::Text => "text",
            CellKind::Line => "line",
            CellKind::Bar => "bar",
            CellKind::Pie => "pie",
            CellKind::Table => "table",
        }
    }

    /// Smallest span `(min_w, min_h)` the panel may be resized to.
    pub fn minimum_span(self) -> (u32, u32) {
        match self {
            CellKind::Text => (6, 4),
            _ => (4, 5),
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CellKind {
    type Err = LayoutError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        CellKind::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| LayoutError::UnknownCell(id.to_string()))
    }
}

impl TryFrom<String> for CellKind {
    type Error = LayoutError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        id.parse()
    }
}

impl From<CellKind> for String {
    fn from(kind: CellKind) -> Self {
        kind.id().to_string()
    }
}

/// Position and span of a panel in grid units.
///
/// Field names follow the grid widget's wire format so cells reported by the
/// widget deserialize directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    #[serde(rename = "i")]
    pub id: CellKind,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub min_w: u32,
    #[serde(default)]
    pub min_h: u32,
}

impl GridCell {
    /// Creates a cell with the panel's fixed minimum span.
    pub fn new(id: CellKind, x: u32, y: u32, w: u32, h: u32) -> Self {
        let (min_w, min_h) = id.minimum_span();
        Self {
            id,
            x,
            y,
            w,
            h,
            min_w,
            min_h,
        }
    }

    /// Returns whether the cell satisfies its span, column and row invariants.
    pub fn is_valid(&self) -> bool {
        self.w >= self.min_w
            && self.h >= self.min_h
            && self.x.saturating_add(self.w) <= GRID_COLUMNS
            && self.bottom() <= MAX_GRID_ROWS
    }

    /// First grid row below this cell.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    fn normalized(mut self) -> Self {
        let (min_w, min_h) = self.id.minimum_span();
        self.min_w = min_w;
        self.min_h = min_h;
        self.w = self.w.clamp(min_w, GRID_COLUMNS);
        self.h = self.h.clamp(min_h, MAX_GRID_ROWS);
        self.x = self.x.min(GRID_COLUMNS - self.w);
        self.y = self.y.min(MAX_GRID_ROWS - self.h);
        self
    }
}

/// Pixel rectangle of a cell relative to the grid container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Errors reported when the grid widget hands back an unusable arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The same panel appeared more than once.
    DuplicateCell(CellKind),
    /// A panel of the dashboard was not part of the reported layout.
    MissingCell(CellKind),
    /// A cell identifier did not name any dashboard panel.
    UnknownCell(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCell(kind) => write!(f, "Layout contains panel '{kind}' more than once"),
            Self::MissingCell(kind) => write!(f, "Layout is missing panel '{kind}'"),
            Self::UnknownCell(id) => write!(f, "Layout refers to unknown panel '{id}'"),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Narrow seam to the drag/resize widget: given the current cells, returns the
/// arrangement after user interaction.
pub trait LayoutEngine {
    fn layout(&mut self, cells: &[GridCell]) -> Vec<GridCell>;
}

/// Layout engine for hosts without an interactive widget; keeps cells as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticLayoutEngine;

impl LayoutEngine for StaticLayoutEngine {
    fn layout(&mut self, cells: &[GridCell]) -> Vec<GridCell> {
        cells.to_vec()
    }
}

/// The dashboard grid: its cells plus the fixed pixel metrics of the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridLayout {
    cells: Vec<GridCell>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            cells: vec![
                GridCell::new(CellKind::Text, 0, 0, 12, 6),
                GridCell::new(CellKind::Line, 0, 6, 6, 6),
                GridCell::new(CellKind::Bar, 6, 6, 6, 6),
                GridCell::new(CellKind::Pie, 0, 12, 6, 6),
                GridCell::new(CellKind::Table, 6, 12, 6, 6),
            ],
        }
    }
}

impl GridLayout {
    /// Builds a layout from arbitrary cells, enforcing the invariants.
    pub fn from_cells(cells: &[GridCell]) -> Result<Self, LayoutError> {
        let mut layout = Self::default();
        layout.apply_change(cells)?;
        Ok(layout)
    }

    /// Returns the cells in their stored order.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Returns the cell for the given panel.
    pub fn cell(&self, kind: CellKind) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.id == kind)
    }

    /// Accepts an arrangement reported by the grid widget.
    ///
    /// Every panel must appear exactly once. Spans are clamped to the panel's
    /// minimums and to the grid bounds, and cells are shifted left or up so
    /// none overflows the last column or [`MAX_GRID_ROWS`]. The stored layout is left untouched when an
    /// error is returned.
    pub fn apply_change(&mut self, cells: &[GridCell]) -> Result<&[GridCell], LayoutError> {
        let mut seen = BTreeSet::new();
        let mut next = Vec::with_capacity(cells.len());

        for cell in cells {
            if !seen.insert(cell.id) {
                return Err(LayoutError::DuplicateCell(cell.id));
            }
            let normalized = cell.normalized();
            if normalized != *cell {
                warn!(
                    "Adjusted panel '{}' from {}x{} at ({}, {}) to {}x{} at ({}, {})",
                    cell.id,
                    cell.w,
                    cell.h,
                    cell.x,
                    cell.y,
                    normalized.w,
                    normalized.h,
                    normalized.x,
                    normalized.y
                );
            }
            next.push(normalized);
        }

        if let Some(missing) = CellKind::ALL.iter().find(|kind| !seen.contains(*kind)) {
            return Err(LayoutError::MissingCell(*missing));
        }

        debug!("Applied layout change for {} panels", next.len());
        self.cells = next;
        Ok(&self.cells)
    }

    /// Runs a layout engine over the current cells and applies the result.
    pub fn relayout(&mut self, engine: &mut dyn LayoutEngine) -> Result<&[GridCell], LayoutError> {
        let proposed = engine.layout(&self.cells);
        self.apply_change(&proposed)
    }

    /// Number of grid rows occupied by the layout.
    pub fn rows(&self) -> u32 {
        self.cells.iter().map(GridCell::bottom).max().unwrap_or(0)
    }

    /// Width of one grid column in pixels.
    pub fn column_width_px(&self) -> f64 {
        let gaps = CELL_MARGIN_PX * (GRID_COLUMNS - 1) + 2 * CONTAINER_PADDING_PX;
        f64::from(GRID_WIDTH_PX - gaps) / f64::from(GRID_COLUMNS)
    }

    /// Pixel rectangle of a cell inside the grid container.
    pub fn cell_rect(&self, cell: &GridCell) -> CellRect {
        let column = self.column_width_px();
        let margin = f64::from(CELL_MARGIN_PX);
        let padding = f64::from(CONTAINER_PADDING_PX);
        let row = f64::from(ROW_HEIGHT_PX);

        let left = ((column + margin) * f64::from(cell.x) + padding).round();
        let top = ((row + margin) * f64::from(cell.y) + padding).round();
        let width = (column * f64::from(cell.w) + f64::from(cell.w.saturating_sub(1)) * margin).round();
        let height = (row * f64::from(cell.h) + f64::from(cell.h.saturating_sub(1)) * margin).round();

        CellRect {
            left: left as u32,
            top: top as u32,
            width: width as u32,
            height: height as u32,
        }
    }

    /// Size of the grid container in pixels as `(width, height)`.
    pub fn container_size_px(&self) -> (u32, u32) {
        let rows = self.rows();
        let height = rows * ROW_HEIGHT_PX
            + rows.saturating_sub(1) * CELL_MARGIN_PX
            + 2 * CONTAINER_PADDING_PX;
        (GRID_WIDTH_PX, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShoveRight;

    impl LayoutEngine for ShoveRight {
        fn layout(&mut self, cells: &[GridCell]) -> Vec<GridCell> {
            cells
                .iter()
                .map(|cell| GridCell {
                    x: cell.x + 9,
                    w: 1,
                    h: 1,
                    min_w: 0,
                    min_h: 0,
                    ..*cell
                })
                .collect()
        }
    }

    #[test]
    fn default_layout_is_valid() {
        let layout = GridLayout::default();
        assert_eq!(layout.cells().len(), 5);
        assert!(layout.cells().iter().all(GridCell::is_valid));
        assert_eq!(layout.rows(), 18);
    }

    #[test]
    fn layout_change_restores_invariants() {
        let mut layout = GridLayout::default();
        layout.relayout(&mut ShoveRight).expect("relayout");

        for cell in layout.cells() {
            assert!(cell.w >= cell.min_w, "{cell:?}");
            assert!(cell.h >= cell.min_h, "{cell:?}");
            assert!(cell.x + cell.w <= GRID_COLUMNS, "{cell:?}");
            assert_eq!((cell.min_w, cell.min_h), cell.id.minimum_span());
        }

        let text = layout.cell(CellKind::Text).expect("text cell");
        assert_eq!((text.x, text.w), (6, 6));
    }

    #[test]
    fn oversized_span_is_clamped_to_columns() {
        let mut cells = GridLayout::default().cells().to_vec();
        cells[1].w = 40;
        cells[1].x = 3;
        let layout = GridLayout::from_cells(&cells).expect("layout");
        let line = layout.cell(CellKind::Line).expect("line cell");
        assert_eq!((line.x, line.w), (0, GRID_COLUMNS));
    }

    #[test]
    fn extreme_coordinates_are_pulled_back_into_the_grid() {
        let mut cells = GridLayout::default().cells().to_vec();
        cells[1].x = u32::MAX;
        cells[2].y = u32::MAX - 1;
        cells[3].h = u32::MAX;
        assert!(!cells[1].is_valid());
        assert!(!cells[2].is_valid());

        let layout = GridLayout::from_cells(&cells).expect("layout");
        for cell in layout.cells() {
            assert!(cell.is_valid(), "{cell:?}");
            assert!(u64::from(cell.x) + u64::from(cell.w) <= u64::from(GRID_COLUMNS));
        }
        let line = layout.cell(CellKind::Line).expect("line cell");
        assert_eq!((line.x, line.w), (GRID_COLUMNS - 6, 6));
        assert_eq!(layout.rows(), MAX_GRID_ROWS);

        let (_, height) = layout.container_size_px();
        assert_eq!(
            height,
            MAX_GRID_ROWS * ROW_HEIGHT_PX + (MAX_GRID_ROWS - 1) * CELL_MARGIN_PX + 2 * CONTAINER_PADDING_PX
        );
    }

    #[test]
    fn rejects_duplicate_and_missing_cells() {
        let mut cells = GridLayout::default().cells().to_vec();
        cells.push(cells[0]);
        assert_eq!(
            GridLayout::from_cells(&cells),
            Err(LayoutError::DuplicateCell(CellKind::Text))
        );

        let binding = GridLayout::default();
        let cells = &binding.cells()[..4];
        assert_eq!(
            GridLayout::from_cells(cells),
            Err(LayoutError::MissingCell(CellKind::Table))
        );
    }

    #[test]
    fn parses_widget_identifiers() {
        assert_eq!("pie".parse::<CellKind>(), Ok(CellKind::Pie));
        assert_eq!(
            "chart".parse::<CellKind>(),
            Err(LayoutError::UnknownCell("chart".to_string()))
        );
    }

    #[test]
    fn failed_change_keeps_previous_layout() {
        let mut layout = GridLayout::default();
        let before = layout.clone();
        assert!(layout.apply_change(&[]).is_err());
        assert_eq!(layout, before);
    }

    #[test]
    fn cell_geometry_matches_widget_formula() {
        let layout = GridLayout::default();
        let text = layout.cell(CellKind::Text).copied().expect("text cell");
        let rect = layout.cell_rect(&text);
        assert_eq!(rect.left, CONTAINER_PADDING_PX);
        assert_eq!(rect.top, CONTAINER_PADDING_PX);
        assert_eq!(rect.width, GRID_WIDTH_PX - 2 * CONTAINER_PADDING_PX);
        assert_eq!(rect.height, 6 * ROW_HEIGHT_PX + 5 * CELL_MARGIN_PX);

        let bar = layout.cell(CellKind::Bar).copied().expect("bar cell");
        let rect = layout.cell_rect(&bar);
        assert_eq!(rect.top, 6 * (ROW_HEIGHT_PX + CELL_MARGIN_PX) + CONTAINER_PADDING_PX);

        assert_eq!(layout.container_size_px(), (1200, 18 * 40 + 17 * 16 + 32));
    }
}
