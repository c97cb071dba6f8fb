//! Page planning for exporting a tall snapshot onto fixed-size pages.
//!
//! The snapshot is scaled to the full page width. Every page reserves a band
//! at the top for the header; the rest of the page shows the snapshot drawn in
//! full but shifted up by one content height per page, so the page boundary
//! clips it to the right vertical slice.

use std::fmt;

use log::debug;

/// A4 portrait width in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// A4 portrait height in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Vertical band reserved for the page header.
pub const DEFAULT_HEADER_HEIGHT_MM: f64 = 30.0;
/// Baseline of the header title, measured from the top of the page.
pub const DEFAULT_TITLE_BASELINE_MM: f64 = 15.0;
/// Baseline of the header label line, measured from the top of the page.
pub const DEFAULT_LABEL_BASELINE_MM: f64 = 23.0;

/// Page size and header placement used for an export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub header_height_mm: f64,
    pub title_baseline_mm: f64,
    pub label_baseline_mm: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_portrait()
    }
}

impl PageGeometry {
    /// A4 portrait with the default two-line header.
    pub fn a4_portrait() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            header_height_mm: DEFAULT_HEADER_HEIGHT_MM,
            title_baseline_mm: DEFAULT_TITLE_BASELINE_MM,
            label_baseline_mm: DEFAULT_LABEL_BASELINE_MM,
        }
    }

    /// Sets the page size and returns the updated geometry.
    pub fn with_page_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.page_width_mm = width_mm;
        self.page_height_mm = height_mm;
        self
    }

    /// Sets the header band height and returns the updated geometry.
    pub fn with_header_height(mut self, header_height_mm: f64) -> Self {
        self.header_height_mm = header_height_mm;
        self
    }

    /// Vertical space left for the snapshot below the header.
    pub fn content_height_mm(&self) -> f64 {
        self.page_height_mm - self.header_height_mm
    }

    /// Horizontal centre of the page, where header lines are anchored.
    pub fn center_x_mm(&self) -> f64 {
        self.page_width_mm / 2.0
    }
}

/// Errors for geometries that cannot hold any content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaginationError {
    /// The header band leaves no room for content on the page.
    HeaderExceedsPage {
        header_height_mm: f64,
        page_height_mm: f64,
    },
    /// The page has no usable width.
    InvalidPageWidth(f64),
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderExceedsPage {
                header_height_mm,
                page_height_mm,
            } => write!(
                f,
                "Header height {header_height_mm}mm leaves no content space on a {page_height_mm}mm page"
            ),
            Self::InvalidPageWidth(width) => write!(f, "Page width {width}mm is not usable"),
        }
    }
}

impl std::error::Error for PaginationError {}

/// Where the snapshot goes on one page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PagePlacement {
    /// Zero-based page index.
    pub index: usize,
    /// Distance from the top of the page to the top edge of the snapshot.
    /// `None` when the page carries only the header.
    pub image_offset_mm: Option<f64>,
}

/// The computed layout of an export.
#[derive(Clone, Debug, PartialEq)]
pub struct PagePlan {
    pub scaled_width_mm: f64,
    pub scaled_height_mm: f64,
    pub content_height_mm: f64,
    pub pages: Vec<PagePlacement>,
}

impl PagePlan {
    /// Number of pages in the document; always at least one.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether the plan places no image at all.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.image_offset_mm.is_none())
    }
}

/// Plans the pages needed for a `source_width` x `source_height` pixel snapshot.
///
/// A snapshot without pixels yields a single header-only page.
pub fn plan_pages(
    source_width: u32,
    source_height: u32,
    geometry: &PageGeometry,
) -> Result<PagePlan, PaginationError> {
    if !(geometry.page_width_mm > 0.0) {
        return Err(PaginationError::InvalidPageWidth(geometry.page_width_mm));
    }
    let content_height_mm = geometry.content_height_mm();
    if !(content_height_mm > 0.0) {
        return Err(PaginationError::HeaderExceedsPage {
            header_height_mm: geometry.header_height_mm,
            page_height_mm: geometry.page_height_mm,
        });
    }

    if source_width == 0 || source_height == 0 {
        debug!("Empty snapshot ({source_width}x{source_height}); planning a header-only page");
        return Ok(PagePlan {
            scaled_width_mm: 0.0,
            scaled_height_mm: 0.0,
            content_height_mm,
            pages: vec![PagePlacement {
                index: 0,
                image_offset_mm: None,
            }],
        });
    }

    let scaled_height_mm =
        f64::from(source_height) * geometry.page_width_mm / f64::from(source_width);

    let page_count = if scaled_height_mm <= content_height_mm {
        1
    } else {
        ((scaled_height_mm / content_height_mm).ceil() as usize).max(1)
    };

    let pages = (0..page_count)
        .map(|index| PagePlacement {
            index,
            image_offset_mm: Some(geometry.header_height_mm - index as f64 * content_height_mm),
        })
        .collect();

    debug!(
        "Planned {page_count} page(s) for {source_width}x{source_height}px snapshot \
         ({scaled_height_mm:.2}mm tall, {content_height_mm:.2}mm per page)"
    );

    Ok(PagePlan {
        scaled_width_mm: geometry.page_width_mm,
        scaled_height_mm,
        content_height_mm,
        pages,
    })
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

/// File name used for an exported report, e.g. `Tesla_report.pdf`.
pub fn report_file_name(label: &str) -> String {
    format!("{}_report.pdf", sanitize_label(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> PageGeometry {
        PageGeometry::a4_portrait()
    }

    #[test]
    fn square_snapshot_fits_on_one_page() {
        let plan = plan_pages(1200, 1200, &a4()).expect("plan");
        assert_eq!(plan.scaled_height_mm, 210.0);
        assert_eq!(plan.content_height_mm, 267.0);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.pages[0].image_offset_mm, Some(30.0));
    }

    #[test]
    fn tall_snapshot_spans_four_pages() {
        let plan = plan_pages(1000, 4000, &a4()).expect("plan");
        assert_eq!(plan.scaled_height_mm, 840.0);
        assert_eq!(plan.page_count(), 4);

        let offsets: Vec<f64> = plan
            .pages
            .iter()
            .map(|page| page.image_offset_mm.expect("image on every page"))
            .collect();
        assert_eq!(offsets, vec![30.0, -237.0, -504.0, -771.0]);
    }

    #[test]
    fn exact_fit_is_a_single_page() {
        // 267mm tall once scaled to 210mm wide.
        let plan = plan_pages(210, 267, &a4()).expect("plan");
        assert_eq!(plan.scaled_height_mm, plan.content_height_mm);
        assert_eq!(plan.page_count(), 1);
    }

    #[test]
    fn just_over_one_page_needs_two() {
        let plan = plan_pages(210, 268, &a4()).expect("plan");
        assert_eq!(plan.page_count(), 2);
    }

    #[test]
    fn zero_sized_snapshot_gets_a_blank_page() {
        for (width, height) in [(0, 100), (100, 0), (0, 0)] {
            let plan = plan_pages(width, height, &a4()).expect("plan");
            assert_eq!(plan.page_count(), 1);
            assert!(plan.is_blank());
        }
    }

    #[test]
    fn header_taller_than_page_is_rejected() {
        let geometry = a4().with_header_height(297.0);
        assert!(matches!(
            plan_pages(100, 100, &geometry),
            Err(PaginationError::HeaderExceedsPage { .. })
        ));
    }

    #[test]
    fn file_names_replace_non_alphanumerics() {
        assert_eq!(
            report_file_name("Tesla, Inc. (NASDAQ)"),
            "Tesla__Inc___NASDAQ__report.pdf"
        );
        assert_eq!(report_file_name("Reliance Industries"), "Reliance_Industries_report.pdf");
        assert_eq!(sanitize_label("Caf\u{e9} 24/7"), "Caf__24_7");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for label in ["Tesla, Inc. (NASDAQ)", "Apple Inc", "", "__", "\u{20b9} crores"] {
            let once = sanitize_label(label);
            assert_eq!(sanitize_label(&once), once);
        }
    }
}
