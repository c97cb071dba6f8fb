//! In-process rasterizer that paints the dashboard grid into a bitmap.
//!
//! The output mimics the on-screen dashboard: a white page, one tinted panel
//! per grid cell and simple vector-style drawings of the charts and table.
//! Glyphs are not rasterized; text is represented by neutral line bars.

use image::{Rgb, RgbImage};
use log::debug;

use crate::content::ReportContent;
use crate::layout::{CellKind, CellRect, GridLayout};
use crate::surface::{RasterizeError, RenderedSurface, Rasterizer};

/// Device pixels per layout pixel used when capturing the dashboard.
pub const DEFAULT_CAPTURE_SCALE: u32 = 2;
/// White space around the grid inside the captured container.
pub const DEFAULT_PAGE_PADDING_PX: u32 = 32;

const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
const GRID_LINE: [u8; 3] = [0xe0, 0xe7, 0xff];
const AXIS: [u8; 3] = [0xd1, 0xd5, 0xdb];
const TEXT_BAR: [u8; 3] = [0xd1, 0xd5, 0xdb];
const HEADING_BAR: [u8; 3] = [0x6b, 0x72, 0x80];
const LINE_STROKE: [u8; 3] = [0x10, 0xb9, 0x81];
const BAR_FILL: [u8; 3] = [0x8b, 0x5c, 0xf6];
const MARGIN_TEXT: [u8; 3] = [0x16, 0xa3, 0x4a];
const TABLE_HEAD: [u8; 3] = [0xf8, 0xfa, 0xfc];
const TABLE_RULE: [u8; 3] = [0xe2, 0xe8, 0xf0];
const TABLE_DIVIDER: [u8; 3] = [0xf1, 0xf5, 0xf9];

const PANEL_PADDING: f64 = 24.0;
const PANEL_HEADER: f64 = 48.0;
const INNER_PADDING: f64 = 16.0;

struct PanelPalette {
    background: [u8; 3],
    border: [u8; 3],
    accent: [u8; 3],
}

fn palette(kind: CellKind) -> PanelPalette {
    match kind {
        CellKind::Text => PanelPalette {
            background: [0xef, 0xf6, 0xff],
            border: [0xbf, 0xdb, 0xfe],
            accent: [0x25, 0x63, 0xeb],
        },
        CellKind::Line => PanelPalette {
            background: [0xf0, 0xfd, 0xf4],
            border: [0xbb, 0xf7, 0xd0],
            accent: [0x16, 0xa3, 0x4a],
        },
        CellKind::Bar => PanelPalette {
            background: [0xfa, 0xf5, 0xff],
            border: [0xe9, 0xd5, 0xff],
            accent: [0x93, 0x33, 0xea],
        },
        CellKind::Pie => PanelPalette {
            background: [0xff, 0xf7, 0xed],
            border: [0xfe, 0xd7, 0xaa],
            accent: [0xea, 0x58, 0x0c],
        },
        CellKind::Table => PanelPalette {
            background: [0xf8, 0xfa, 0xfc],
            border: [0xe2, 0xe8, 0xf0],
            accent: [0x47, 0x55, 0x69],
        },
    }
}

/// Axis-aligned box in layout pixels.
#[derive(Clone, Copy, Debug)]
struct Frame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Frame {
    fn inset(self, amount: f64) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            w: (self.w - 2.0 * amount).max(0.0),
            h: (self.h - 2.0 * amount).max(0.0),
        }
    }

    fn right(self) -> f64 {
        self.x + self.w
    }

    fn bottom(self) -> f64 {
        self.y + self.h
    }
}

/// Drawing surface addressed in layout pixels and stored at device scale.
struct Canvas {
    image: RgbImage,
    scale: f64,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width * scale, height * scale, Rgb(WHITE)),
            scale: f64::from(scale),
        }
    }

    fn device_span(&self, start: f64, end: f64, limit: u32) -> (u32, u32) {
        let from = (start * self.scale).round().clamp(0.0, f64::from(limit)) as u32;
        let to = (end * self.scale).round().clamp(0.0, f64::from(limit)) as u32;
        (from, to)
    }

    fn fill_rect(&mut self, frame: Frame, color: [u8; 3]) {
        let (x0, x1) = self.device_span(frame.x, frame.right(), self.image.width());
        let (y0, y1) = self.device_span(frame.y, frame.bottom(), self.image.height());
        for y in y0..y1 {
            for x in x0..x1 {
                self.image.put_pixel(x, y, Rgb(color));
            }
        }
    }

    fn stroke_rect(&mut self, frame: Frame, thickness: f64, color: [u8; 3]) {
        let Frame { x, y, w, h } = frame;
        self.fill_rect(Frame { x, y, w, h: thickness }, color);
        self.fill_rect(Frame { x, y: y + h - thickness, w, h: thickness }, color);
        self.fill_rect(Frame { x, y, w: thickness, h }, color);
        self.fill_rect(Frame { x: x + w - thickness, y, w: thickness, h }, color);
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: [u8; 3]) {
        self.fill_where(
            Frame {
                x: cx - radius,
                y: cy - radius,
                w: 2.0 * radius,
                h: 2.0 * radius,
            },
            color,
            |px, py| (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius,
        );
    }

    fn draw_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: [u8; 3]) {
        let length = ((to.0 - from.0).powi(2) + (to.1 - from.1).powi(2)).sqrt();
        let steps = (length * self.scale).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            let x = from.0 + (to.0 - from.0) * t;
            let y = from.1 + (to.1 - from.1) * t;
            self.fill_circle(x, y, width / 2.0, color);
        }
    }

    /// Fills the pixels of `frame` whose centre (in layout pixels) satisfies `inside`.
    fn fill_where<F>(&mut self, frame: Frame, color: [u8; 3], inside: F)
    where
        F: Fn(f64, f64) -> bool,
    {
        let (x0, x1) = self.device_span(frame.x, frame.right(), self.image.width());
        let (y0, y1) = self.device_span(frame.y, frame.bottom(), self.image.height());
        for y in y0..y1 {
            for x in x0..x1 {
                let px = (f64::from(x) + 0.5) / self.scale;
                let py = (f64::from(y) + 0.5) / self.scale;
                if inside(px, py) {
                    self.image.put_pixel(x, y, Rgb(color));
                }
            }
        }
    }
}

/// Paints the dashboard grid with the static report content.
#[derive(Clone, Copy, Debug)]
pub struct DashboardRasterizer {
    scale: u32,
    page_padding_px: u32,
}

impl Default for DashboardRasterizer {
    fn default() -> Self {
        Self {
            scale: DEFAULT_CAPTURE_SCALE,
            page_padding_px: DEFAULT_PAGE_PADDING_PX,
        }
    }
}

impl DashboardRasterizer {
    /// Creates a rasterizer with the default capture scale and padding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of device pixels per layout pixel.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the white space painted around the grid.
    pub fn with_page_padding(mut self, padding_px: u32) -> Self {
        self.page_padding_px = padding_px;
        self
    }

    /// Device pixel size of the capture for the given layout.
    pub fn output_size(&self, layout: &GridLayout) -> (u32, u32) {
        let (width, height) = layout.container_size_px();
        let padding = 2 * self.page_padding_px;
        ((width + padding) * self.scale, (height + padding) * self.scale)
    }

    fn panel_frame(&self, rect: CellRect) -> Frame {
        let padding = f64::from(self.page_padding_px);
        Frame {
            x: f64::from(rect.left) + padding,
            y: f64::from(rect.top) + padding,
            w: f64::from(rect.width),
            h: f64::from(rect.height),
        }
    }
}

impl Rasterizer for DashboardRasterizer {
    fn rasterize(
        &self,
        layout: &GridLayout,
        content: &ReportContent,
    ) -> Result<RenderedSurface, RasterizeError> {
        let (device_width, device_height) = self.output_size(layout);
        if device_width == 0 || device_height == 0 || layout.rows() == 0 {
            return Err(RasterizeError::EmptyView);
        }

        let (width, height) = layout.container_size_px();
        let padding = 2 * self.page_padding_px;
        let mut canvas = Canvas::new(width + padding, height + padding, self.scale);

        for cell in layout.cells() {
            let frame = self.panel_frame(layout.cell_rect(cell));
            let colors = palette(cell.id);
            canvas.fill_rect(frame, colors.background);
            canvas.stroke_rect(frame, 1.0, colors.border);

            let header = frame.inset(PANEL_PADDING);
            canvas.fill_rect(Frame { w: 32.0, h: 32.0, ..header }, colors.accent);
            canvas.fill_rect(
                Frame {
                    x: header.x + 44.0,
                    y: header.y + 10.0,
                    w: (header.w - 44.0).clamp(0.0, 180.0),
                    h: 12.0,
                },
                HEADING_BAR,
            );

            let body = Frame {
                x: header.x,
                y: header.y + PANEL_HEADER,
                w: header.w,
                h: (header.h - PANEL_HEADER).max(0.0),
            };
            canvas.fill_rect(body, WHITE);
            canvas.stroke_rect(body, 1.0, colors.border);
            let inner = body.inset(INNER_PADDING);

            match cell.id {
                CellKind::Text => paint_summary(&mut canvas, inner, content),
                CellKind::Line => paint_line_chart(&mut canvas, inner, content),
                CellKind::Bar => paint_bar_chart(&mut canvas, inner, content),
                CellKind::Pie => paint_pie_chart(&mut canvas, inner, content),
                CellKind::Table => paint_table(&mut canvas, body, content),
            }
        }

        debug!(
            "Rasterized dashboard at {}x{} device pixels",
            canvas.image.width(),
            canvas.image.height()
        );
        Ok(RenderedSurface::new(canvas.image))
    }
}

fn paint_summary(canvas: &mut Canvas, area: Frame, content: &ReportContent) {
    const CHAR_WIDTH: f64 = 7.0;
    const LINE_HEIGHT: f64 = 22.0;

    let chars_per_line = (area.w / CHAR_WIDTH).floor().max(1.0) as usize;
    let mut line = 0usize;
    let mut current = 0usize;
    let mut widths = Vec::new();
    for word in content.summary.split_whitespace() {
        let needed = if current == 0 { word.len() } else { current + 1 + word.len() };
        if needed > chars_per_line && current > 0 {
            widths.push(current);
            current = word.len();
        } else {
            current = needed;
        }
    }
    if current > 0 {
        widths.push(current);
    }

    for width in widths {
        let y = area.y + line as f64 * LINE_HEIGHT;
        if y + 10.0 > area.bottom() {
            break;
        }
        canvas.fill_rect(
            Frame {
                x: area.x,
                y: y + 6.0,
                w: (width as f64 * CHAR_WIDTH).min(area.w),
                h: 8.0,
            },
            TEXT_BAR,
        );
        line += 1;
    }
}

fn paint_axes(canvas: &mut Canvas, plot: Frame) {
    for step in 0..=4 {
        let y = plot.y + plot.h * f64::from(step) / 4.0;
        canvas.fill_rect(Frame { x: plot.x, y, w: plot.w, h: 1.0 }, GRID_LINE);
    }
    canvas.fill_rect(Frame { x: plot.x, y: plot.y, w: 1.0, h: plot.h }, AXIS);
    canvas.fill_rect(Frame { x: plot.x, y: plot.bottom(), w: plot.w, h: 1.0 }, AXIS);
}

fn plot_frame(area: Frame) -> Frame {
    Frame {
        x: area.x + 48.0,
        y: area.y + 8.0,
        w: (area.w - 56.0).max(0.0),
        h: (area.h - 32.0).max(0.0),
    }
}

fn paint_line_chart(canvas: &mut Canvas, area: Frame, content: &ReportContent) {
    let plot = plot_frame(area);
    paint_axes(canvas, plot);

    let series = &content.line_series;
    if series.is_empty() {
        return;
    }
    let min = series.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max = series.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let span = (max - min).max(f64::EPSILON);
    let low = min - span * 0.1;
    let high = max + span * 0.1;

    let step = if series.len() > 1 {
        plot.w / (series.len() - 1) as f64
    } else {
        0.0
    };
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let x = plot.x + step * index as f64;
            let y = plot.bottom() - (point.value - low) / (high - low) * plot.h;
            (x, y)
        })
        .collect();

    for pair in points.windows(2) {
        canvas.draw_line(pair[0], pair[1], 3.0, LINE_STROKE);
    }
    for (x, y) in points {
        canvas.fill_circle(x, y, 4.0, LINE_STROKE);
    }
}

fn paint_bar_chart(canvas: &mut Canvas, area: Frame, content: &ReportContent) {
    let plot = plot_frame(area);
    paint_axes(canvas, plot);

    let series = &content.bar_series;
    let max = series.iter().map(|p| p.value).fold(0.0, f64::max);
    if series.is_empty() || max <= 0.0 {
        return;
    }

    let slot = plot.w / series.len() as f64;
    for (index, point) in series.iter().enumerate() {
        let height = point.value / max * plot.h * 0.9;
        canvas.fill_rect(
            Frame {
                x: plot.x + slot * index as f64 + slot * 0.1,
                y: plot.bottom() - height,
                w: slot * 0.8,
                h: height,
            },
            BAR_FILL,
        );
    }
}

fn paint_pie_chart(canvas: &mut Canvas, area: Frame, content: &ReportContent) {
    use std::f64::consts::{FRAC_PI_2, TAU};

    let cx = area.x + area.w / 2.0;
    let cy = area.y + area.h / 2.0;
    let radius = 0.7 * area.w.min(area.h) / 2.0;
    if radius <= 0.0 {
        return;
    }

    let mut start = 0.0;
    for (slice, fraction) in content.pie_slices.iter().zip(content.pie_fractions()) {
        let end = start + fraction * TAU;
        canvas.fill_where(
            Frame {
                x: cx - radius,
                y: cy - radius,
                w: 2.0 * radius,
                h: 2.0 * radius,
            },
            slice.color,
            |px, py| {
                let dx = px - cx;
                let dy = py - cy;
                if dx * dx + dy * dy > radius * radius {
                    return false;
                }
                // Clockwise from twelve o'clock.
                let angle = (dy.atan2(dx) + FRAC_PI_2).rem_euclid(TAU);
                angle >= start && angle < end
            },
        );
        start = end;
    }
}

fn paint_table(canvas: &mut Canvas, body: Frame, content: &ReportContent) {
    const ROW_HEIGHT: f64 = 44.0;
    const CELL_PADDING: f64 = 16.0;
    const CHAR_WIDTH: f64 = 7.0;

    let columns = content.table_columns.len().max(1) as f64;
    let column_width = body.w / columns;

    let head = Frame { h: ROW_HEIGHT.min(body.h), ..body };
    canvas.fill_rect(head, TABLE_HEAD);
    canvas.fill_rect(Frame { y: head.bottom(), h: 1.0, ..head }, TABLE_RULE);

    let bar = |canvas: &mut Canvas, row_top: f64, column: usize, len: usize, color: [u8; 3]| {
        let x = body.x + column_width * column as f64 + CELL_PADDING;
        let width = (len as f64 * CHAR_WIDTH).min(column_width - 2.0 * CELL_PADDING).max(0.0);
        if row_top + ROW_HEIGHT <= body.bottom() {
            canvas.fill_rect(Frame { x, y: row_top + 18.0, w: width, h: 8.0 }, color);
        }
    };

    for (column, name) in content.table_columns.iter().enumerate() {
        bar(canvas, head.y, column, name.len(), HEADING_BAR);
    }

    for (index, row) in content.table_rows.iter().enumerate() {
        let top = head.bottom() + ROW_HEIGHT * index as f64;
        if top + ROW_HEIGHT > body.bottom() {
            break;
        }
        if index > 0 {
            canvas.fill_rect(Frame { x: body.x, y: top, w: body.w, h: 1.0 }, TABLE_DIVIDER);
        }
        bar(canvas, top, 0, row.year.len(), HEADING_BAR);
        bar(canvas, top, 1, row.revenue.len(), TEXT_BAR);
        bar(canvas, top, 2, row.profit.len(), TEXT_BAR);
        bar(canvas, top, 3, row.margin.len(), MARGIN_TEXT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_matches_grid_geometry_at_capture_scale() {
        let layout = GridLayout::default();
        let rasterizer = DashboardRasterizer::new();
        let surface = rasterizer
            .rasterize(&layout, &ReportContent::default())
            .expect("rasterize");

        let (width, height) = layout.container_size_px();
        assert_eq!(
            surface.dimensions(),
            ((width + 64) * 2, (height + 64) * 2)
        );
        assert_eq!(surface.dimensions(), rasterizer.output_size(&layout));
    }

    #[test]
    fn panels_are_painted_with_their_tint() {
        let layout = GridLayout::default();
        let surface = DashboardRasterizer::new()
            .with_scale(1)
            .rasterize(&layout, &ReportContent::default())
            .expect("rasterize");

        let text = layout.cell_rect(layout.cell(CellKind::Text).expect("text cell"));
        let x = text.left + DEFAULT_PAGE_PADDING_PX + 4;
        let y = text.top + DEFAULT_PAGE_PADDING_PX + 4;
        assert_eq!(surface.pixels().get_pixel(x, y), &Rgb(palette(CellKind::Text).background));
        assert_eq!(surface.pixels().get_pixel(0, 0), &Rgb(WHITE));
    }

    #[test]
    fn zero_scale_is_an_empty_view() {
        let err = DashboardRasterizer::new()
            .with_scale(0)
            .rasterize(&GridLayout::default(), &ReportContent::default())
            .unwrap_err();
        assert!(matches!(err, RasterizeError::EmptyView));
    }
}
