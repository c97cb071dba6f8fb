//! Static report content rendered into every dashboard.
//!
//! The dashboard does not analyse anything: the summary, chart series and
//! financial table below are fixed and independent of the label the user
//! submitted.

/// A labelled point of a line or bar chart series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesPoint {
    /// Category shown on the x axis.
    pub name: &'static str,
    /// Plotted value.
    pub value: f64,
}

/// A single wedge of the segment pie chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieSlice {
    /// Segment name.
    pub name: &'static str,
    /// Share of the whole, in the same unit as the other slices.
    pub value: f64,
    /// Fill colour as RGB.
    pub color: [u8; 3],
}

/// One row of the financial summary table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinancialRow {
    pub year: &'static str,
    pub revenue: &'static str,
    pub profit: &'static str,
    pub margin: &'static str,
}

/// Everything the dashboard panels display.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportContent {
    pub title: &'static str,
    pub summary_heading: &'static str,
    pub summary: &'static str,
    pub line_heading: &'static str,
    pub line_series: Vec<SeriesPoint>,
    pub bar_heading: &'static str,
    pub bar_series: Vec<SeriesPoint>,
    pub pie_heading: &'static str,
    pub pie_slices: Vec<PieSlice>,
    pub table_heading: &'static str,
    pub table_columns: [&'static str; 4],
    pub table_rows: Vec<FinancialRow>,
}

/// Title printed at the top of every exported page.
pub const REPORT_TITLE: &str = "Custom Report";

/// Text placed before the label on the second header line.
pub const LABEL_PREFIX: &str = "Company: ";

/// Second header line naming what the report was generated for.
pub fn label_line(label: &str) -> String {
    format!("{}{}", LABEL_PREFIX, label)
}

const SUMMARY: &str = "Reliance Industries Limited (RIL) is an Indian multinational company headquartered in Mumbai, India. RIL's diverse businesses include energy, petrochemicals, natural gas, retail, telecommunications, mass media, and textiles. The company has shown consistent growth strong fundamentals and market leadership position.";

impl Default for ReportContent {
    fn default() -> Self {
        Self {
            title: REPORT_TITLE,
            summary_heading: "Executive Summary",
            summary: SUMMARY,
            line_heading: "Stock Price Trend",
            line_series: vec![
                SeriesPoint { name: "Jan", value: 2000.0 },
                SeriesPoint { name: "Feb", value: 2150.0 },
                SeriesPoint { name: "Mar", value: 2300.0 },
                SeriesPoint { name: "Apr", value: 2450.0 },
                SeriesPoint { name: "May", value: 2380.0 },
                SeriesPoint { name: "Jun", value: 2600.0 },
            ],
            bar_heading: "Revenue Growth (Rs Crores)",
            bar_series: vec![
                SeriesPoint { name: "2019", value: 659_651.0 },
                SeriesPoint { name: "2020", value: 539_238.0 },
                SeriesPoint { name: "2021", value: 699_962.0 },
                SeriesPoint { name: "2022", value: 792_756.0 },
            ],
            pie_heading: "Business Segments",
            pie_slices: vec![
                PieSlice { name: "Retail", value: 35.0, color: [0x3b, 0x82, 0xf6] },
                PieSlice { name: "Oil & Gas", value: 40.0, color: [0x10, 0xb9, 0x81] },
                PieSlice { name: "Telecom", value: 25.0, color: [0xf5, 0x9e, 0x0b] },
            ],
            table_heading: "Financial Summary",
            table_columns: ["Year", "Revenue", "Profit", "Margin"],
            table_rows: vec![
                FinancialRow {
                    year: "2021",
                    revenue: "Rs 5,39,238 Cr",
                    profit: "Rs 53,739 Cr",
                    margin: "9.96%",
                },
                FinancialRow {
                    year: "2022",
                    revenue: "Rs 6,99,962 Cr",
                    profit: "Rs 60,705 Cr",
                    margin: "8.67%",
                },
                FinancialRow {
                    year: "2023",
                    revenue: "Rs 7,92,756 Cr",
                    profit: "Rs 75,476 Cr",
                    margin: "9.52%",
                },
            ],
        }
    }
}

impl ReportContent {
    /// Returns the share of each pie slice as a fraction of the total.
    pub fn pie_fractions(&self) -> Vec<f64> {
        let total: f64 = self.pie_slices.iter().map(|slice| slice.value).sum();
        if total <= 0.0 {
            return vec![0.0; self.pie_slices.len()];
        }
        self.pie_slices
            .iter()
            .map(|slice| slice.value / total)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ReportContent;

    #[test]
    fn pie_fractions_sum_to_one() {
        let content = ReportContent::default();
        let total: f64 = content.pie_fractions().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_content_matches_dashboard_panels() {
        let content = ReportContent::default();
        assert_eq!(content.line_series.len(), 6);
        assert_eq!(content.bar_series.len(), 4);
        assert_eq!(content.pie_slices.len(), 3);
        assert_eq!(content.table_rows.len(), 3);
    }
}
