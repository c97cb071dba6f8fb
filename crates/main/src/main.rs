use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dashboard_report::content::ReportContent;
use dashboard_report::document;
use dashboard_report::export::{export_view, PdfExporter};
use dashboard_report::fonts;
use dashboard_report::layout::{GridCell, GridLayout};
use dashboard_report::pagination::{plan_pages, PageGeometry};
use dashboard_report::raster::DashboardRasterizer;
use dashboard_report::session::{SessionConfig, SessionController, SUGGESTIONS};
use log::debug;

/// Generates dashboard reports and exports them as paginated PDFs.
///
/// Logging is controlled with `RUST_LOG`. The `summary` command needs the
/// bundled font family under `assets/fonts` or `DASHBOARD_REPORT_FONTS_DIR`.
#[derive(Parser)]
#[command(author, version, about = "Dashboard report generator and PDF exporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the report for a label and export the dashboard to `<label>_report.pdf`.
    Generate(GenerateArgs),

    /// Print the page plan for a snapshot of the given pixel size.
    Plan {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },

    /// Write the text summary document to `<label>_summary.pdf`.
    Summary {
        label: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// List the suggested labels.
    Suggestions,
}

#[derive(Args)]
struct GenerateArgs {
    label: String,

    /// Directory the PDF is written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Overrides the generation delay in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// JSON array of grid cells applied as a layout change before export.
    #[arg(long)]
    layout_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => generate(args).await,
        Commands::Plan { width, height } => plan(width, height),
        Commands::Summary { label, out } => summary(&label, &out),
        Commands::Suggestions => {
            for (index, label) in SUGGESTIONS.iter().enumerate() {
                println!("{}. {}", index + 1, label);
            }
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

async fn generate(args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut config = SessionConfig::from_env();
    if let Some(millis) = args.delay_ms {
        config = config.with_generation_delay(Duration::from_millis(millis));
    }

    let mut layout = GridLayout::default();
    if let Some(path) = &args.layout_json {
        layout = load_layout(path)?;
    }

    let mut session = SessionController::new(config);
    session.submit(&args.label)?;
    println!(
        "Generating report for '{}' ({} ms)...",
        session.label(),
        config.generation_delay.as_millis()
    );
    let ready = session.wait_until_ready().await?;

    let exported = export_view(
        &ready,
        &layout,
        &ReportContent::default(),
        &DashboardRasterizer::new(),
        &PdfExporter::new(),
    )?;

    fs::create_dir_all(&args.out)?;
    let path = exported.write_to_dir(&args.out)?;
    println!(
        "Wrote {} ({} page(s), {} bytes)",
        path.display(),
        exported.page_count(),
        exported.bytes.len()
    );
    Ok(())
}

fn load_layout(path: &Path) -> Result<GridLayout, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    let cells: Vec<GridCell> = serde_json::from_str(&raw)?;
    debug!("Loaded {} cells from {}", cells.len(), path.display());

    Ok(GridLayout::from_cells(&cells)?)
}

fn plan(width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let plan = plan_pages(width, height, &PageGeometry::a4_portrait())?;
    println!(
        "{}x{} px -> {:.2} mm tall, {:.2} mm per page, {} page(s)",
        width,
        height,
        plan.scaled_height_mm,
        plan.content_height_mm,
        plan.page_count()
    );
    for page in &plan.pages {
        match page.image_offset_mm {
            Some(offset) => println!("  page {}: image top at {:.2} mm", page.index + 1, offset),
            None => println!("  page {}: header only", page.index + 1),
        }
    }
    Ok(())
}

fn summary(label: &str, out: &Path) -> Result<(), Box<dyn Error>> {
    let label = label.trim();
    if label.is_empty() {
        return Err("Enter a company or topic to generate a summary".into());
    }

    let rendered = match document::render_summary(label, &ReportContent::default()) {
        Ok(rendered) => rendered,
        Err(err) => {
            if fonts::fonts_missing(&err) {
                eprintln!(
                    "Fonts not found. Copy the Roboto family to {} or set {}.",
                    fonts::bundled_fonts_source_dir().display(),
                    fonts::FONTS_DIR_ENV
                );
            }
            return Err(err.into());
        }
    };

    fs::create_dir_all(out)?;
    let path = out.join(&rendered.file_name);
    fs::write(&path, &rendered.bytes)?;
    println!("Wrote {} ({} bytes)", path.display(), rendered.bytes.len());
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
