//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use printarea_core::diagnostics::Diagnostic;
use printarea_core::{
    error_page, extract_region, AssembledDocument, BackendKind, Disposition, HtmlBackend, Pipeline, RegionSelector,
    RenderBackend, RenderRequest, RequestTracker, Settings,
};
use printarea_pdf::TypstBackend;

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Render backend selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Tagged PDF via Typst
    Pdf,
    /// Assembled HTML page
    Html,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Pdf => BackendKind::Pdf,
            BackendArg::Html => BackendKind::Html,
        }
    }
}

#[derive(Parser)]
#[command(name = "printarea")]
#[command(author, version, about = "Print the printable region of a web page as an accessible PDF", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the printable region of an HTML file
    Render {
        /// Input HTML page or fragment
        input: PathBuf,

        /// Document title (default: input file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Region selector: class name or id, `.class` or `#id`
        #[arg(short, long)]
        selector: Option<String>,

        /// Output file (default: sanitized title next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output backend
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// Mark the output for download instead of inline viewing
        #[arg(long)]
        download: bool,
    },

    /// Print the printable region of an HTML page
    Extract {
        /// Input HTML page
        input: PathBuf,

        /// Region selector: class name or id, `.class` or `#id`
        #[arg(short, long)]
        selector: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the assembled accessible HTML without rendering
    Normalize {
        /// Input HTML page or fragment
        input: PathBuf,

        /// Document title (default: input file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Region selector: class name or id, `.class` or `#id`
        #[arg(short, long)]
        selector: Option<String>,
    },

    /// Show the outline, image alternative texts and links of the document
    Outline {
        /// Input HTML page or fragment
        input: PathBuf,

        /// Document title (default: input file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Region selector: class name or id, `.class` or `#id`
        #[arg(short, long)]
        selector: Option<String>,
    },

    /// Report degradations and heading hierarchy issues
    Check {
        /// Input HTML page or fragment
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Region selector: class name or id, `.class` or `#id`
        #[arg(short, long)]
        selector: Option<String>,

        /// Exit with an error code if any issue is found
        #[arg(long)]
        strict: bool,
    },
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let mut settings =
        Settings::discover(cli.config.as_deref(), &cwd).context("Failed to load configuration")?;

    match cli.command {
        Commands::Render {
            input,
            title,
            selector,
            output,
            backend,
            download,
        } => {
            apply_overrides(&mut settings, selector, backend, download);
            render_command(&input, output.as_deref(), title.as_deref(), &settings)?;
        }
        Commands::Extract {
            input,
            selector,
            output,
        } => {
            apply_overrides(&mut settings, selector, None, false);
            extract_command(&input, output.as_deref(), &settings)?;
        }
        Commands::Normalize {
            input,
            title,
            selector,
        } => {
            apply_overrides(&mut settings, selector, None, false);
            let html = normalize_command(&input, title.as_deref(), &settings)?;
            print!("{}", html);
        }
        Commands::Outline {
            input,
            title,
            format,
            selector,
        } => {
            apply_overrides(&mut settings, selector, None, false);
            outline_command(&input, title.as_deref(), format, &settings)?;
        }
        Commands::Check {
            input,
            format,
            selector,
            strict,
        } => {
            apply_overrides(&mut settings, selector, None, false);
            let diagnostics = check_command(&input, format, &settings)?;
            if strict && !diagnostics.is_empty() {
                anyhow::bail!("{} issue(s) found in {}", diagnostics.len(), input.display());
            }
        }
    }

    Ok(())
}

/// Install the stderr tracing subscriber; `log` records are bridged
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Apply command-line flags over configured values
pub fn apply_overrides(
    settings: &mut Settings,
    selector: Option<String>,
    backend: Option<BackendArg>,
    download: bool,
) {
    if let Some(selector) = selector {
        settings.region.selector = selector;
    }
    if let Some(backend) = backend {
        settings.output.backend = backend.into();
    }
    if download {
        settings.output.disposition = Disposition::Download;
    }
}

/// Backend for the configured output kind
pub fn backend_for(settings: &Settings) -> Box<dyn RenderBackend> {
    match settings.output.backend {
        BackendKind::Pdf => Box::new(TypstBackend::new(&settings.pdf)),
        BackendKind::Html => Box::new(HtmlBackend),
    }
}

fn read_input(input: &Path) -> Result<String> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn build_request(input: &Path, title: Option<&str>, settings: &Settings) -> Result<RenderRequest> {
    let content = read_input(input)?;
    let title = match title {
        Some(title) => title.to_string(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Ok(
        RenderRequest::new(input.display().to_string(), title, content)
            .with_selector(RegionSelector::new(&settings.region.selector))
            .with_disposition(settings.output.disposition),
    )
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        tracing::warn!("{}", diagnostic);
    }
}

/// Execute the render command
///
/// On failure an error page is written next to the output path and the
/// error is returned. Returns the path of the written document.
pub fn render_command(
    input: &Path,
    output: Option<&Path>,
    title: Option<&str>,
    settings: &Settings,
) -> Result<PathBuf> {
    let request = build_request(input, title, settings)?;
    let pipeline = Pipeline::new(settings.clone(), backend_for(settings));
    tracing::info!(
        "Rendering {} with the {} backend",
        input.display(),
        pipeline.backend().name()
    );

    let mut tracker = RequestTracker::new();
    let outcome = match pipeline.run_tracked(&request, &mut tracker) {
        Ok(outcome) => outcome,
        Err(err) => {
            let error_path = match output {
                Some(path) => path.with_extension("error.html"),
                None => input.with_extension("error.html"),
            };
            fs::write(&error_path, error_page(&err)).with_context(|| {
                format!("Failed to write error page: {}", error_path.display())
            })?;
            tracing::error!("Error page written to {}", error_path.display());
            return Err(anyhow::Error::new(err).context(format!(
                "Failed to render {} (state {:?})",
                input.display(),
                tracker.state()
            )));
        }
    };
    report_diagnostics(&outcome.report.diagnostics);

    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&outcome.document.filename),
    };
    fs::write(&output_path, &outcome.document.bytes)
        .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;

    println!("  Created: {}", output_path.display());
    println!("  Content-Type: {}", outcome.document.media_type);
    println!("  Content-Disposition: {}", outcome.document.content_disposition());
    println!(
        "  {} heading(s) inserted, {} image(s) described, {} link(s) labelled, {} table(s)",
        outcome.report.headings_inserted,
        outcome.report.annotation.images_described,
        outcome.report.annotation.links_labelled,
        outcome.report.annotation.tables
    );

    Ok(output_path)
}

/// Execute the extract command
pub fn extract_command(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<()> {
    let page = read_input(input)?;
    let selector = RegionSelector::new(&settings.region.selector);
    let region = extract_region(&page, &selector);
    if region.is_full_document() {
        tracing::warn!(
            "Selector '{}' matched nothing in {}, using the full page",
            settings.region.selector,
            input.display()
        );
    }

    match output {
        Some(path) => {
            fs::write(path, region.html())
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            println!("  Created: {}", path.display());
        }
        None => println!("{}", region.html()),
    }
    Ok(())
}

/// Execute the normalize command, returning the assembled HTML page
pub fn normalize_command(input: &Path, title: Option<&str>, settings: &Settings) -> Result<String> {
    let assembled = assemble_input(input, title, settings)
        .with_context(|| format!("Failed to normalize {}", input.display()))?;
    Ok(assembled.to_html())
}

/// Execute the outline command
///
/// Prints the heading outline, image alternative texts and link labels the
/// PDF will carry, and returns the assembled document.
pub fn outline_command(
    input: &Path,
    title: Option<&str>,
    format: OutputFormat,
    settings: &Settings,
) -> Result<AssembledDocument> {
    let assembled = assemble_input(input, title, settings)
        .with_context(|| format!("Failed to outline {}", input.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "title": assembled.title,
                "language": assembled.language,
                "outline": assembled.outline,
                "images": assembled.images,
                "links": assembled.links,
            });
            let json = serde_json::to_string_pretty(&json)
                .context("Failed to serialize outline to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", outline_text(&assembled)),
    }

    Ok(assembled)
}

/// Plain-text rendering of an assembled document's structure
pub fn outline_text(assembled: &AssembledDocument) -> String {
    let mut out = format!("Outline of {}\n", assembled.title);
    for entry in &assembled.outline {
        let indent = "  ".repeat(usize::from(entry.level));
        if entry.synthetic {
            out.push_str(&format!("{}h{} (inserted)\n", indent, entry.level));
        } else {
            out.push_str(&format!("{}h{} {}\n", indent, entry.level, entry.title));
        }
    }

    if !assembled.images.is_empty() {
        out.push_str("Images\n");
        for image in &assembled.images {
            if image.decorative {
                out.push_str(&format!("  {} (decorative)\n", image.src));
            } else {
                out.push_str(&format!("  {}: {}\n", image.src, image.alt));
            }
        }
    }

    if !assembled.links.is_empty() {
        out.push_str("Links\n");
        for link in &assembled.links {
            out.push_str(&format!("  {} -> {}\n", link.label, link.href));
        }
    }
    out
}

fn assemble_input(
    input: &Path,
    title: Option<&str>,
    settings: &Settings,
) -> Result<AssembledDocument> {
    let request = build_request(input, title, settings)?;
    let pipeline = Pipeline::new(settings.clone(), Box::new(HtmlBackend));
    let prepared = pipeline.prepare(&request, &mut RequestTracker::new())?;
    report_diagnostics(&prepared.report.diagnostics);
    Ok(prepared.assembled)
}

/// Execute the check command
pub fn check_command(
    input: &Path,
    format: OutputFormat,
    settings: &Settings,
) -> Result<Vec<Diagnostic>> {
    let request = build_request(input, None, settings)?;
    let pipeline = Pipeline::new(settings.clone(), Box::new(HtmlBackend));
    let prepared = pipeline
        .prepare(&request, &mut RequestTracker::new())
        .with_context(|| format!("Failed to check {}", input.display()))?;
    let diagnostics = prepared.report.diagnostics;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&diagnostics)
                .context("Failed to serialize diagnostics to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                println!("✓ No issues found in {}", input.display());
            } else {
                for diag in &diagnostics {
                    println!("{}", diag);
                    println!();
                }
                let warning_count = diagnostics.iter().filter(|d| d.is_warning()).count();
                println!("Found {} warning(s)", warning_count);
            }
        }
    }

    Ok(diagnostics)
}
