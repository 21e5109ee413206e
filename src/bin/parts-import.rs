//! CLI binary for fabparts-import.
//!
//! A thin shim over the library crate that maps CLI flags to `ImportConfig`
//! and prints the recovered part records.

use anyhow::{Context, Result};
use clap::Parser;
use fabparts_import::{
    extract, import_file, pipeline::input::resolve_input, ExtractionPhase, ImportConfig,
    ImportOutput, ImportProgressCallback, MeasurePoint, MeasureType, ParsedPartRecord,
    ProgressCallback, RollSpec,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the extractor's current status line and switches to a
/// page counter once the page total is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening file…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ImportProgressCallback for CliProgressCallback {
    fn on_status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn on_extraction_start(&self, total_pages: usize, phase: ExtractionPhase) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos:>3}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        self.bar.set_style(style);
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(phase.to_string());
        if phase == ExtractionPhase::Ocr {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Little embedded text; running OCR on {total_pages} page(s)…"))
            ));
        }
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize, _phase: ExtractionPhase) {
        self.bar.set_position(page_num.saturating_sub(1) as u64);
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg)
        ));
    }

    fn on_extraction_complete(&self, line_count: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} lines extracted", green("✔"), bold(&line_count.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Import a purchase order and print a summary table
  parts-import PO-4411.pdf

  # Structured output for another tool
  parts-import --json parts-list.csv > parts.json

  # Show the reconstructed lines instead of parsing them
  parts-import --lines scan.pdf

  # Force OCR for a sparse text layer, at a higher render scale
  parts-import --min-chars 200 --ocr-scale 3 scan.pdf

  # Import from a URL
  parts-import https://example.com/orders/PO-12.pdf

SUPPORTED INPUTS:
  .pdf           native text layer, or OCR when the text layer is too sparse
  .txt / .text   lines used verbatim
  .csv           rows read as tab-separated columns

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (OCR only)
  ANTHROPIC_API_KEY       Anthropic API key (OCR only)
  EDGEQUAKE_LLM_PROVIDER  Override OCR provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override OCR model ID
  PDFIUM_LIB_PATH         Directory containing the pdfium library
"#;

/// Recover fabrication part records from purchase orders and parts lists.
#[derive(Parser, Debug)]
#[command(
    name = "parts-import",
    version,
    about = "Recover fabrication part records from purchase orders and parts lists",
    long_about = "Read a purchase order or parts list (native PDF, scanned PDF, text or CSV) \
and print the part records found in it, each tagged with a confidence level for review.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL (.pdf, .txt, .text, .csv).
    input: String,

    /// Output records as JSON (ImportOutput) instead of a table.
    #[arg(long, env = "PARTS_IMPORT_JSON")]
    json: bool,

    /// Print the extracted lines and stop before parsing.
    #[arg(long)]
    lines: bool,

    /// Vertical tolerance (points) for grouping text into one line.
    #[arg(long, env = "PARTS_IMPORT_LINE_TOLERANCE", default_value_t = 5.0)]
    line_tolerance: f32,

    /// Horizontal gap (points) treated as a column break.
    #[arg(long, env = "PARTS_IMPORT_COLUMN_GAP", default_value_t = 20.0)]
    column_gap: f32,

    /// Minimum non-whitespace characters per page before OCR is used.
    #[arg(long, env = "PARTS_IMPORT_MIN_CHARS", default_value_t = 20)]
    min_chars: usize,

    /// Render scale for OCR pages (2–6).
    #[arg(long, env = "PARTS_IMPORT_OCR_SCALE", default_value_t = 2.0)]
    ocr_scale: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PARTS_IMPORT_PASSWORD")]
    password: Option<String>,

    /// OCR provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PARTS_IMPORT_PROVIDER")]
    provider: Option<String>,

    /// OCR vision model ID (default: gpt-4.1-nano).
    #[arg(long, env = "PARTS_IMPORT_MODEL")]
    model: Option<String>,

    /// Retries per page when OCR fails.
    #[arg(long, env = "PARTS_IMPORT_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PARTS_IMPORT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "PARTS_IMPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PARTS_IMPORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PARTS_IMPORT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ImportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let file = resolve_input(&cli.input, config.download_timeout_secs)
        .await
        .with_context(|| format!("Failed to open {}", cli.input))?;

    // ── Lines-only mode ──────────────────────────────────────────────────
    if cli.lines {
        let extraction = extract(&file, &config).await.context("Extraction failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&extraction).context("Failed to serialise lines")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for line in &extraction.lines {
                writeln!(handle, "{:>3}:{:<4} {}", line.page, line.index, line.text)
                    .context("Failed to write to stdout")?;
            }
        }
        return Ok(());
    }

    // ── Run import ───────────────────────────────────────────────────────
    let output = import_file(&file, &config).await.context("Import failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    print_table(&output.records).context("Failed to write to stdout")?;
    if !cli.quiet {
        print_summary(&output);
    }
    Ok(())
}

/// Map CLI args to `ImportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ImportConfig> {
    let mut builder = ImportConfig::builder()
        .line_tolerance(cli.line_tolerance)
        .column_gap(cli.column_gap)
        .min_chars_per_page(cli.min_chars)
        .ocr_scale(cli.ocr_scale)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn roll_label(spec: &RollSpec) -> String {
    let Some(value) = spec.value else {
        return String::new();
    };
    let reference = match (spec.measure_point, spec.measure_type) {
        (MeasurePoint::Inside, MeasureType::Diameter) => "ID",
        (MeasurePoint::Outside, MeasureType::Diameter) => "OD",
        (MeasurePoint::Inside, MeasureType::Radius) => "IR",
        (MeasurePoint::Outside, MeasureType::Radius) => "OR",
        (MeasurePoint::Centerline, MeasureType::Diameter) => "CLD",
        (MeasurePoint::Centerline, MeasureType::Radius) => "CLR",
    };
    format!("{value}\" {reference}")
}

fn print_table(records: &[ParsedPartRecord]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if records.is_empty() {
        writeln!(
            out,
            "No parts could be extracted. Try a different file or add the parts manually."
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "{:>4}  {:<11} {:>8}  {:<9} {:>9} {:>9}  {:<14} {:<6}  INSTRUCTIONS",
        "QTY", "TYPE", "THK", "MATERIAL", "WIDTH", "LENGTH", "ROLL", "CONF"
    )?;
    for r in records {
        writeln!(
            out,
            "{:>4}  {:<11} {:>8}  {:<9} {:>9} {:>9}  {:<14} {:<6}  {}",
            r.quantity,
            r.part_type.as_str(),
            r.thickness,
            r.material,
            r.width,
            r.length,
            roll_label(&r.roll_spec),
            r.confidence.to_string(),
            r.special_instructions
        )?;
    }
    Ok(())
}

fn print_summary(output: &ImportOutput) {
    let report = &output.extraction;
    let strategy = output
        .strategy
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    eprintln!(
        "{}  {} record(s)  via {}  {}",
        if report.failed_pages.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&output.records.len().to_string()),
        strategy,
        dim(&format!(
            "{} page(s), {} line(s), {}ms extract + {}ms parse",
            report.page_count, report.line_count, report.duration_ms, output.parse_duration_ms
        )),
    );
    for failure in &report.failed_pages {
        eprintln!("   {} {}", red("✗"), failure);
    }
}
