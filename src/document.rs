//! Text-native summary document built with `genpdf`.
//!
//! Unlike the paginated snapshot export, the summary lays the report content
//! out as real text and tables, so it needs the font family from
//! [`crate::fonts`]. Every page carries the same two-line report header as the
//! export and a page number in the footer.

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::error::{Error, ErrorKind};
use genpdf::render::Area;
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Context, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::{debug, info};

use crate::content::{self, ReportContent, SeriesPoint, REPORT_TITLE};
use crate::fonts;
use crate::pagination::sanitize_label;

const PAGE_MARGIN_MM: f64 = 15.0;
const FOOTER_HEIGHT_MM: f64 = 10.0;
const TITLE_SIZE: u8 = 18;
const HEADING_SIZE: u8 = 14;

/// A rendered summary document.
#[derive(Clone, Debug)]
pub struct SummaryPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// File name of the summary document for `label`.
pub fn summary_file_name(label: &str) -> String {
    format!("{}_summary.pdf", sanitize_label(label))
}

/// Repeats the report header at the top of every page and numbers the pages.
struct ReportPageDecorator {
    page: usize,
    margins: Margins,
    title: String,
    label_line: String,
}

impl ReportPageDecorator {
    fn new(title: &str, label: &str, margins: Margins) -> Self {
        Self {
            page: 0,
            margins,
            title: title.to_string(),
            label_line: content::label_line(label),
        }
    }

    fn header(&self) -> LinearLayout {
        let mut header = LinearLayout::vertical();
        header.push(centered(
            &self.title,
            Style::new().bold().with_font_size(TITLE_SIZE),
        ));
        header.push(centered(
            &self.label_line,
            Style::new().with_font_size(HEADING_SIZE),
        ));
        header.push(Break::new(1));
        header
    }
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        let header = self.header().render(context, area.clone(), style)?;
        area.add_offset(Position::new(0, header.size.height));

        let footer_height = Mm::from(FOOTER_HEIGHT_MM);
        let available = area.size().height;
        if footer_height >= available {
            return Err(Error::new(
                "Report header leaves no room for the page body",
                ErrorKind::PageSizeExceeded,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - footer_height));
        let mut page_number = Paragraph::new(format!("Page {}", self.page));
        page_number.set_alignment(Alignment::Right);
        page_number.render(context, footer_area, style)?;

        area.set_height(available - footer_height);
        debug!("Decorated summary page {}", self.page);
        Ok(area)
    }
}

/// Summary document for one report label.
#[derive(Clone, Debug)]
pub struct SummaryDocument {
    label: String,
    title: String,
    paper_size: Size,
    margins: Margins,
}

impl SummaryDocument {
    /// A4 summary with the default report title.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            title: REPORT_TITLE.to_string(),
            paper_size: PaperSize::A4.into(),
            margins: Margins::from(PAGE_MARGIN_MM),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = paper_size.into();
        self
    }

    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = margins.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lays out `content` into a document using the default font family.
    pub fn build(&self, content: &ReportContent) -> Result<genpdf::Document, Error> {
        let mut document = genpdf::Document::new(fonts::default_font_family()?);
        document.set_title(format!("{} - {}", self.title, self.label));
        document.set_paper_size(self.paper_size);
        document.set_page_decorator(ReportPageDecorator::new(
            &self.title,
            &self.label,
            self.margins,
        ));

        document.push(heading(content.summary_heading));
        document.push(Paragraph::new(content.summary));
        document.push(Break::new(1));

        document.push(heading(content.line_heading));
        document.push(series_table("Month", "Price", &content.line_series)?);
        document.push(Break::new(1));

        document.push(heading(content.bar_heading));
        document.push(series_table("Year", "Revenue", &content.bar_series)?);
        document.push(Break::new(1));

        document.push(heading(content.pie_heading));
        document.push(segment_table(content)?);
        document.push(Break::new(1));

        document.push(heading(content.table_heading));
        document.push(financial_table(content)?);

        Ok(document)
    }

    /// Builds and serializes the document.
    pub fn render(&self, content: &ReportContent) -> Result<SummaryPdf, Error> {
        let mut bytes = Vec::new();
        self.build(content)?.render(&mut bytes)?;

        let file_name = summary_file_name(&self.label);
        info!("Rendered summary {} ({} bytes)", file_name, bytes.len());
        Ok(SummaryPdf { file_name, bytes })
    }
}

/// Builds the text summary document for `label` without rendering it.
pub fn summary_document(label: &str, content: &ReportContent) -> Result<genpdf::Document, Error> {
    SummaryDocument::new(label).build(content)
}

/// Renders the text summary document for `label`.
pub fn render_summary(label: &str, content: &ReportContent) -> Result<SummaryPdf, Error> {
    SummaryDocument::new(label).render(content)
}

fn centered(text: &str, style: Style) -> Paragraph {
    let mut paragraph = Paragraph::new(StyledString::new(text.to_string(), style));
    paragraph.set_alignment(Alignment::Center);
    paragraph
}

fn heading(text: &str) -> Paragraph {
    Paragraph::new(StyledString::new(
        text.to_string(),
        Style::new().bold().with_font_size(HEADING_SIZE),
    ))
}

fn framed_table(weights: Vec<usize>, header: &[&str]) -> Result<TableLayout, Error> {
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    let mut row = table.row();
    for column in header {
        row = row.element(
            Paragraph::new(StyledString::new(column.to_string(), Style::new().bold())).padded(1),
        );
    }
    row.push()?;
    Ok(table)
}

fn series_table(
    label_header: &str,
    value_header: &str,
    series: &[SeriesPoint],
) -> Result<TableLayout, Error> {
    let mut table = framed_table(vec![1, 1], &[label_header, value_header])?;
    for point in series {
        table
            .row()
            .element(Paragraph::new(point.name).padded(1))
            .element(Paragraph::new(format!("{:.0}", point.value)).padded(1))
            .push()?;
    }
    Ok(table)
}

fn segment_table(content: &ReportContent) -> Result<TableLayout, Error> {
    let mut table = framed_table(vec![2, 1], &["Segment", "Share"])?;
    for (slice, fraction) in content.pie_slices.iter().zip(content.pie_fractions()) {
        table
            .row()
            .element(Paragraph::new(slice.name).padded(1))
            .element(Paragraph::new(format!("{:.0}%", fraction * 100.0)).padded(1))
            .push()?;
    }
    Ok(table)
}

fn financial_table(content: &ReportContent) -> Result<TableLayout, Error> {
    let mut table = framed_table(vec![1, 2, 2, 1], &content.table_columns)?;
    for row in &content.table_rows {
        table
            .row()
            .element(Paragraph::new(row.year).padded(1))
            .element(Paragraph::new(row.revenue).padded(1))
            .element(Paragraph::new(row.profit).padded(1))
            .element(Paragraph::new(row.margin).padded(1))
            .push()?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_file_name_is_sanitized() {
        assert_eq!(summary_file_name("Apple Inc."), "Apple_Inc__summary.pdf");
    }

    #[test]
    fn decorator_carries_the_export_header_lines() {
        let decorator = ReportPageDecorator::new(REPORT_TITLE, "Tesla", Margins::from(10.0));
        assert_eq!(decorator.title, "Custom Report");
        assert_eq!(decorator.label_line, "Company: Tesla");
        assert_eq!(decorator.page, 0);
    }

    #[test]
    fn summary_keeps_its_label_and_title() {
        let summary = SummaryDocument::new("Google").with_title("Quarterly Review");
        assert_eq!(summary.label(), "Google");
        assert_eq!(summary.title, "Quarterly Review");
    }
}
