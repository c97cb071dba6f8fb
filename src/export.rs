//! Paginated PDF export of a rasterized dashboard.
//!
//! The snapshot is placed on A4 pages according to a [`PagePlan`]; every page
//! repeats a centered two-line header drawn with the PDF base-14 Helvetica
//! faces, so exporting never depends on font files.

use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use log::{debug, info};
use printpdf::{
    Color, Image, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Rgb,
};

use crate::content::{ReportContent, LABEL_PREFIX, REPORT_TITLE};
use crate::fonts::builtin::HeaderFace;
use crate::layout::GridLayout;
use crate::pagination::{self, PageGeometry, PagePlan, PaginationError};
use crate::session::{ReportSession, SessionStatus};
use crate::surface::{RasterizeError, RenderedSurface, Rasterizer};

const MM_PER_INCH: f64 = 25.4;
const DEFAULT_TITLE_SIZE_PT: f64 = 18.0;
const DEFAULT_LABEL_SIZE_PT: f64 = 14.0;
const LAYER_NAME: &str = "Report";

/// Failures of the export pipeline.
#[derive(Debug)]
pub enum ExportError {
    /// Exporting requires a session whose report is ready.
    NotReady(SessionStatus),
    /// The view could not be rendered to a bitmap.
    Rasterization(RasterizeError),
    /// The page geometry cannot hold any content.
    Pagination(PaginationError),
    /// Assembling or serializing the PDF failed.
    Serialization(Error),
    /// Writing the exported file failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady(status) => {
                write!(f, "Cannot export while the report is {status}")
            }
            Self::Rasterization(err) => write!(f, "Failed to capture the dashboard: {err}"),
            Self::Pagination(err) => write!(f, "Failed to lay out export pages: {err}"),
            Self::Serialization(err) => write!(f, "Failed to assemble the PDF: {err}"),
            Self::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotReady(_) => None,
            Self::Rasterization(err) => Some(err),
            Self::Pagination(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<RasterizeError> for ExportError {
    fn from(err: RasterizeError) -> Self {
        Self::Rasterization(err)
    }
}

impl From<PaginationError> for ExportError {
    fn from(err: PaginationError) -> Self {
        Self::Pagination(err)
    }
}

/// A serialized export ready to be saved.
#[derive(Clone, Debug)]
pub struct ExportedPdf {
    /// Suggested file name, derived from the sanitized label.
    pub file_name: String,
    /// Complete PDF bytes.
    pub bytes: Vec<u8>,
    /// The page layout that produced the document.
    pub plan: PagePlan,
}

impl ExportedPdf {
    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.plan.page_count()
    }

    /// Writes the document into `directory` under [`ExportedPdf::file_name`].
    pub fn write_to_dir(&self, directory: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let path = directory.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        info!(
            "Wrote {} ({} pages, {} bytes)",
            path.display(),
            self.page_count(),
            self.bytes.len()
        );
        Ok(path)
    }
}

/// Turns rendered snapshots into paginated PDFs.
#[derive(Clone, Debug)]
pub struct PdfExporter {
    geometry: PageGeometry,
    title: String,
    label_prefix: String,
    title_size_pt: f64,
    label_size_pt: f64,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::a4_portrait(),
            title: REPORT_TITLE.to_string(),
            label_prefix: LABEL_PREFIX.to_string(),
            title_size_pt: DEFAULT_TITLE_SIZE_PT,
            label_size_pt: DEFAULT_LABEL_SIZE_PT,
        }
    }
}

impl PdfExporter {
    /// Creates an exporter for A4 portrait pages with the default header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page geometry and returns the updated exporter.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Sets the header title and returns the updated exporter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the text printed before the label on the second header line.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Lays out `surface` over as many pages as needed and serializes the result.
    pub fn export(&self, surface: &RenderedSurface, label: &str) -> Result<ExportedPdf, ExportError> {
        let mut bytes = Vec::new();
        let plan = self.write_pdf(surface, label, &mut bytes)?;
        let file_name = pagination::report_file_name(label);

        info!(
            "Exported '{}' as {} ({} pages, {} bytes)",
            label,
            file_name,
            plan.page_count(),
            bytes.len()
        );

        Ok(ExportedPdf {
            file_name,
            bytes,
            plan,
        })
    }

    /// Lays out `surface` and streams the serialized PDF into `writer`.
    pub fn write_pdf<W: Write>(
        &self,
        surface: &RenderedSurface,
        label: &str,
        writer: W,
    ) -> Result<PagePlan, ExportError> {
        let plan = pagination::plan_pages(surface.width(), surface.height(), &self.geometry)?;
        let document = self
            .render(surface, label, &plan)
            .map_err(ExportError::Serialization)?;
        serialize(document, writer).map_err(ExportError::Serialization)?;
        Ok(plan)
    }

    fn render(
        &self,
        surface: &RenderedSurface,
        label: &str,
        plan: &PagePlan,
    ) -> Result<PdfDocumentReference, Error> {
        let geometry = &self.geometry;
        let (document, first_page, first_layer) = PdfDocument::new(
            self.title.as_str(),
            Mm(geometry.page_width_mm),
            Mm(geometry.page_height_mm),
            LAYER_NAME,
        );

        let fonts = HeaderFonts::load(&document)?;
        let label_line = format!("{}{}", self.label_prefix, label);
        let image = (!plan.is_blank()).then(|| surface.to_dynamic_image());

        for placement in &plan.pages {
            let layer = if placement.index == 0 {
                document.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = document.add_page(
                    Mm(geometry.page_width_mm),
                    Mm(geometry.page_height_mm),
                    LAYER_NAME,
                );
                document.get_page(page).get_layer(layer)
            };

            if let (Some(offset_mm), Some(image)) = (placement.image_offset_mm, image.as_ref()) {
                // printpdf measures from the bottom-left corner of the page.
                let bottom_mm = geometry.page_height_mm - (offset_mm + plan.scaled_height_mm);
                let dpi = f64::from(surface.width()) * MM_PER_INCH / plan.scaled_width_mm;
                debug!(
                    "Page {}: snapshot top at {:.2}mm, bottom edge at {:.2}mm",
                    placement.index + 1,
                    offset_mm,
                    bottom_mm
                );
                Image::from_dynamic_image(image).add_to_layer(
                    layer.clone(),
                    Some(Mm(0.0)),
                    Some(Mm(bottom_mm)),
                    None,
                    None,
                    None,
                    Some(dpi),
                );
                // Continuation pages shift the snapshot up into the header band.
                self.clear_header_band(&layer);
            }

            self.draw_header(&layer, &fonts, &label_line);
        }

        Ok(document)
    }

    fn clear_header_band(&self, layer: &PdfLayerReference) {
        let geometry = &self.geometry;
        let top = geometry.page_height_mm;
        let bottom = top - geometry.header_height_mm;
        let corners = [
            (0.0, bottom),
            (geometry.page_width_mm, bottom),
            (geometry.page_width_mm, top),
            (0.0, top),
        ];
        layer.set_fill_color(white());
        layer.add_shape(Line {
            points: corners
                .iter()
                .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed: true,
            has_fill: true,
            has_stroke: false,
            is_clipping_path: false,
        });
    }

    fn draw_header(&self, layer: &PdfLayerReference, fonts: &HeaderFonts, label_line: &str) {
        let geometry = &self.geometry;
        let lines = [
            (
                self.title.as_str(),
                HeaderFace::Bold,
                &fonts.bold,
                self.title_size_pt,
                geometry.title_baseline_mm,
            ),
            (
                label_line,
                HeaderFace::Regular,
                &fonts.regular,
                self.label_size_pt,
                geometry.label_baseline_mm,
            ),
        ];

        layer.set_fill_color(black());
        for (text, face, font, size, baseline) in lines {
            let text = printable_text(text);
            let width = face.text_width_mm(&text, size);
            let x = geometry.center_x_mm() - width / 2.0;
            let y = geometry.page_height_mm - baseline;
            layer.use_text(text, size, Mm(x), Mm(y), font);
        }
    }
}

struct HeaderFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl HeaderFonts {
    fn load(document: &PdfDocumentReference) -> Result<Self, Error> {
        let load = |face: HeaderFace| {
            document.add_builtin_font(face.builtin()).map_err(|err| {
                Error::new(
                    format!("Failed to register built-in font {:?}: {}", face, err),
                    ErrorKind::InvalidData,
                )
            })
        };
        Ok(Self {
            regular: load(HeaderFace::Regular)?,
            bold: load(HeaderFace::Bold)?,
        })
    }
}

/// Base-14 fonts only cover single-byte text; other characters become `?`.
fn printable_text(text: &str) -> String {
    text.chars()
        .map(|ch| if ch == ' ' || ch.is_ascii_graphic() { ch } else { '?' })
        .collect()
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn serialize<W: Write>(document: PdfDocumentReference, writer: W) -> Result<(), Error> {
    let mut writer = BufWriter::new(writer);
    document.save(&mut writer).map_err(|err| {
        Error::new(
            format!("Failed to serialize PDF document: {}", err),
            ErrorKind::InvalidData,
        )
    })?;
    writer
        .flush()
        .map_err(|err| Error::new("Failed to flush serialized PDF document", err))
}

/// Captures the current dashboard view and exports it for a ready session.
pub fn export_view(
    session: &ReportSession,
    layout: &GridLayout,
    content: &ReportContent,
    rasterizer: &dyn Rasterizer,
    exporter: &PdfExporter,
) -> Result<ExportedPdf, ExportError> {
    if session.status() != SessionStatus::Ready {
        return Err(ExportError::NotReady(session.status()));
    }
    let surface = rasterizer.rasterize(layout, content)?;
    debug!(
        "Captured dashboard for '{}' at {}x{}",
        session.label(),
        surface.width(),
        surface.height()
    );
    exporter.export(&surface, session.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_text_replaces_unencodable_characters() {
        assert_eq!(printable_text("Company: Tesla, Inc."), "Company: Tesla, Inc.");
        assert_eq!(printable_text("Caf\u{e9}\tX"), "Caf??X");
    }

    #[test]
    fn export_requires_a_ready_session() {
        let err = export_view(
            &ReportSession::default(),
            &GridLayout::default(),
            &ReportContent::default(),
            &crate::raster::DashboardRasterizer::new(),
            &PdfExporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NotReady(SessionStatus::Idle)));
    }
}
