use dashboard_report::content::ReportContent;
use dashboard_report::document::{render_summary, summary_document};
use dashboard_report::fonts;
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "bundled fonts missing. Set DASHBOARD_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn render_sample_summary() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let bytes = render_summary("Tesla", &ReportContent::default())
        .expect("render summary pdf")
        .bytes;
    Some(bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if !data[index..].starts_with(tag) {
                index += 1;
                continue;
            }
            let mut cursor = index + tag.len();
            while cursor < data.len() && data[cursor] != terminator {
                let byte = data[cursor];
                if terminator == b')' || !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                    data[cursor] = b'0';
                }
                cursor += 1;
            }
            index = cursor;
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(start_pos) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [&b"/CreationDate("[..], b"/ModDate(", b"/Producer("] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for element in [
        "xmp:CreateDate",
        "xmp:ModifyDate",
        "xmp:MetadataDate",
        "xmpMM:DocumentID",
        "xmpMM:InstanceID",
        "xmpMM:VersionID",
    ] {
        let start = format!("<{}>", element);
        let end = format!("</{}>", element);
        scrub_xml(&mut normalized, start.as_bytes(), end.as_bytes());
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_non_empty_summary() {
    let Some(bytes) = render_sample_summary() else {
        eprintln!("Skipping renders_non_empty_summary: {}", SKIP_HINT);
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "summary should be a PDF document");
}

#[test]
fn summary_rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_summary(), render_sample_summary()) else {
        eprintln!("Skipping summary_rendering_is_deterministic: {}", SKIP_HINT);
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "summary renders must be deterministic after metadata normalization"
    );
}

#[test]
fn missing_fonts_are_reported_as_errors() {
    if fonts::default_font_family().is_ok() {
        return;
    }
    let err = summary_document("Tesla", &ReportContent::default())
        .err()
        .expect("building without fonts fails");
    assert!(fonts::fonts_missing(&err), "unexpected error: {}", err);
}
