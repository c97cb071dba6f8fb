//! Advance widths of the PDF base-14 Helvetica faces.
//!
//! Values are the standard AFM widths in 1/1000 em for the printable ASCII
//! range `0x20..=0x7e`. Characters outside that range are measured with the
//! width of `n`.

use printpdf::BuiltinFont;

const POINTS_PER_MM: f64 = 72.0 / 25.4;
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Base-14 faces used for exported page headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFace {
    Regular,
    Bold,
}

impl HeaderFace {
    /// The matching `printpdf` built-in font.
    pub fn builtin(self) -> BuiltinFont {
        match self {
            HeaderFace::Regular => BuiltinFont::Helvetica,
            HeaderFace::Bold => BuiltinFont::HelveticaBold,
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            HeaderFace::Regular => &HELVETICA,
            HeaderFace::Bold => &HELVETICA_BOLD,
        }
    }

    fn advance(self, ch: char) -> u16 {
        let code = ch as u32;
        if (0x20..=0x7e).contains(&code) {
            self.widths()[(code - 0x20) as usize]
        } else {
            FALLBACK_WIDTH
        }
    }

    /// Width of `text` in millimetres at `font_size_pt`.
    pub fn text_width_mm(self, text: &str, font_size_pt: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| u32::from(self.advance(ch))).sum();
        f64::from(units) / 1000.0 * font_size_pt / POINTS_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::HeaderFace;

    #[test]
    fn measures_known_strings() {
        // "Hi" = 722 + 222 units at 10pt.
        let width = HeaderFace::Regular.text_width_mm("Hi", 10.0);
        assert!((width - 0.944 * 10.0 * 25.4 / 72.0).abs() < 1e-9);
    }

    #[test]
    fn bold_is_wider_than_regular() {
        let text = "Custom Report";
        assert!(
            HeaderFace::Bold.text_width_mm(text, 18.0)
                > HeaderFace::Regular.text_width_mm(text, 18.0)
        );
    }

    #[test]
    fn non_ascii_uses_fallback_width() {
        assert_eq!(
            HeaderFace::Regular.text_width_mm("\u{20b9}", 12.0),
            HeaderFace::Regular.text_width_mm("n", 12.0)
        );
    }
}
