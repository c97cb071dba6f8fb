//! Font lookup for the text summary document and metrics for exported headers.
//!
//! The summary document needs a TrueType family on disk; the paginated image
//! export only uses the PDF base-14 fonts and their [`builtin`] metrics.

pub mod builtin;

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Overrides the directory searched for the bundled family.
pub const FONTS_DIR_ENV: &str = "DASHBOARD_REPORT_FONTS_DIR";

/// Overrides the directory searched for the Windows fallback family.
pub const WINDOWS_FONTS_DIR_ENV: &str = "DASHBOARD_REPORT_WINDOWS_FONTS_DIR";

const FALLBACK_FAMILY_NAME: &str = "Arial";

// Regular, bold, italic, bold italic.
const BUNDLED_FILES: [&str; 4] = [
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];
const FALLBACK_FILES: [&str; 4] = ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"];

/// Directory inside the crate where the bundled family is expected.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// A directory that may hold a complete font family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    /// The bundled Roboto family.
    Bundled(PathBuf),
    /// Arial from a Windows font directory.
    WindowsFallback(PathBuf),
}

impl FontSource {
    pub fn directory(&self) -> &Path {
        match self {
            FontSource::Bundled(dir) | FontSource::WindowsFallback(dir) => dir,
        }
    }

    pub fn family_name(&self) -> &'static str {
        match self {
            FontSource::Bundled(_) => DEFAULT_FONT_FAMILY_NAME,
            FontSource::WindowsFallback(_) => FALLBACK_FAMILY_NAME,
        }
    }

    fn file_names(&self) -> &'static [&'static str; 4] {
        match self {
            FontSource::Bundled(_) => &BUNDLED_FILES,
            FontSource::WindowsFallback(_) => &FALLBACK_FILES,
        }
    }

    fn missing_files(&self) -> Vec<&'static str> {
        self.file_names()
            .iter()
            .copied()
            .filter(|name| !self.directory().join(name).is_file())
            .collect()
    }

    /// Loads the four faces of the family.
    pub fn load(&self) -> Result<FontFamily<FontData>, Error> {
        let directory = self.directory();
        let wrap = |err: Error| {
            Error::new(
                format!(
                    "Failed to load font family '{}' from {}: {}",
                    self.family_name(),
                    directory.display(),
                    err
                ),
                io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
            )
        };

        match self {
            FontSource::Bundled(_) => {
                fonts::from_files(directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(wrap)
            }
            FontSource::WindowsFallback(_) => {
                let [regular, bold, italic, bold_italic] = FALLBACK_FILES
                    .map(|name| FontData::load(directory.join(name), None));
                Ok(FontFamily {
                    regular: regular.map_err(wrap)?,
                    bold: bold.map_err(wrap)?,
                    italic: italic.map_err(wrap)?,
                    bold_italic: bold_italic.map_err(wrap)?,
                })
            }
        }
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Every location searched, in priority order.
fn search_sources() -> Vec<FontSource> {
    let mut bundled = Vec::new();
    bundled.extend(env_path(FONTS_DIR_ENV));
    if let Some(bin_dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        bundled.push(bin_dir.join("assets/fonts"));
    }
    bundled.push(bundled_fonts_source_dir());

    let mut fallback = Vec::new();
    fallback.extend(env_path(WINDOWS_FONTS_DIR_ENV));
    if cfg!(windows) {
        for var in ["WINDIR", "SystemRoot"] {
            fallback.extend(env_path(var).map(|root| root.join("Fonts")));
        }
    }

    let mut sources: Vec<FontSource> = Vec::new();
    for source in bundled
        .into_iter()
        .map(FontSource::Bundled)
        .chain(fallback.into_iter().map(FontSource::WindowsFallback))
    {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Finds the first location holding a complete family.
///
/// Fails with an I/O `NotFound` kind listing every location checked.
pub fn locate_font_source() -> Result<FontSource, Error> {
    let mut attempts = Vec::new();

    for source in search_sources() {
        let directory = source.directory();
        if !directory.is_dir() {
            attempts.push(format!("{} (directory missing)", directory.display()));
            continue;
        }
        let missing = source.missing_files();
        if missing.is_empty() {
            debug!(
                "Using {} fonts from {}",
                source.family_name(),
                directory.display()
            );
            return Ok(source);
        }
        attempts.push(format!(
            "{} (missing [{}])",
            directory.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate font directory. Checked: {}. Set {} to a directory containing the {} family.",
            attempts.join(", "),
            FONTS_DIR_ENV,
            DEFAULT_FONT_FAMILY_NAME
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

/// Returns whether `err` means the font files could not be found or read.
pub fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if matches!(io_err.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
    )
}

/// Loads the bundled Roboto family, or Arial from a Windows font directory
/// when the bundled files are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let source = locate_font_source()?;
    if let FontSource::WindowsFallback(dir) = &source {
        warn!(
            "Bundled {} fonts unavailable; falling back to {} from {}",
            DEFAULT_FONT_FAMILY_NAME,
            FALLBACK_FAMILY_NAME,
            dir.display()
        );
    }
    source.load()
}

/// Indicates whether any search location holds a complete family.
pub fn default_fonts_available() -> bool {
    locate_font_source().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_source_is_always_searched() {
        let expected = FontSource::Bundled(bundled_fonts_source_dir());
        assert!(search_sources().contains(&expected));
    }

    #[test]
    fn empty_directory_reports_every_missing_file() {
        let source = FontSource::WindowsFallback(env::temp_dir().join("no-such-font-dir"));
        assert_eq!(source.missing_files(), FALLBACK_FILES.to_vec());
        assert_eq!(source.family_name(), "Arial");
    }

    #[test]
    fn not_found_errors_count_as_missing_fonts() {
        let missing = Error::new("gone", io::Error::new(io::ErrorKind::NotFound, "gone"));
        let corrupt = Error::new("bad", ErrorKind::InvalidData);
        assert!(fonts_missing(&missing));
        assert!(!fonts_missing(&corrupt));
    }
}
