//! Core entry point for the dashboard_report crate.
//!
//! A [`session::SessionController`] tracks the label a report is generated
//! for, [`layout::GridLayout`] holds the arrangement of the dashboard cells,
//! and [`export`] captures the rendered dashboard into a paginated PDF.

pub mod content;
pub mod document;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod pagination;
pub mod raster;
pub mod session;
pub mod surface;

pub use content::ReportContent;
pub use export::{export_view, ExportError, ExportedPdf, PdfExporter};
pub use layout::{CellKind, GridCell, GridLayout, LayoutEngine, LayoutError};
pub use pagination::{plan_pages, PageGeometry, PagePlan};
pub use raster::DashboardRasterizer;
pub use session::{ReportSession, SessionConfig, SessionController, SessionError, SessionStatus};
pub use surface::{RasterizeError, Rasterizer, RenderedSurface};
