use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use bionic_reader::app::domain::PageEvent;
use bionic_reader::app::infrastructure::logging::init_logging;
use bionic_reader::app::services::markup::{is_markdown_file, parse_document, render_markdown, serialize_document};
use bionic_reader::{BionicConfig, BionicPage, Command, JsonPreferenceStore, Result};

/// Apply bionic reading to an HTML or Markdown file.
#[derive(Parser, Debug)]
#[command(name = "bionic-reader", version, about, long_about = None)]
struct Cli {
    /// HTML or Markdown file to read
    input: PathBuf,

    /// Engine config file (JSON); defaults to the per-user config
    #[arg(long)]
    config: Option<PathBuf>,

    /// User options file (JSON); defaults to the per-user options
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Viewport height in pixels
    #[arg(long)]
    viewport_height: Option<f64>,

    /// Scroll to this offset and render; may be repeated
    #[arg(long = "scroll", value_name = "PX")]
    scroll: Vec<f64>,

    /// Start bionic reading even when autouse is off
    #[arg(long)]
    force: bool,

    /// Switch to the alternate font color after rendering
    #[arg(long)]
    toggle_font_color: bool,

    /// Deliver an inbound message such as '{"type":"toggle"}' after the scrolls; may be repeated
    #[arg(long = "message", value_name = "JSON")]
    messages: Vec<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging("bionic_reader=info");
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bionic-reader failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BionicConfig::load_from(path)?,
        None => BionicConfig::load(),
    };

    let source = fs::read_to_string(&cli.input)?;
    let html = if is_markdown_file(&cli.input.to_string_lossy()) {
        render_markdown(&source)
    } else {
        source
    };
    let mut document = parse_document(&html)?;
    if let Some(height) = cli.viewport_height {
        document.resize(height);
    }

    let store = match &cli.prefs {
        Some(path) => JsonPreferenceStore::new(path),
        None => JsonPreferenceStore::open_default(),
    };
    tracing::debug!(prefs = %store.path().display(), "using user options");

    let mut page = BionicPage::new(document, config, Box::new(store));
    page.on_page_load();
    if cli.force {
        page.dispatch(Command::StartBionic, Instant::now());
    }
    for top in cli.scroll {
        page.handle_event(PageEvent::Scroll { top }, Instant::now());
        page.flush();
    }
    if cli.toggle_font_color {
        page.dispatch(Command::ToggleFontColor, Instant::now());
    }
    for message in &cli.messages {
        let reply = page.handle_message(message, Instant::now())?;
        tracing::debug!(reply = %reply.message, "message handled");
        page.flush();
    }
    tracing::info!(
        phase = ?page.phase(),
        font_color = %page.state().font_color,
        passes = page.render_passes(),
        "page finished"
    );

    let out = serialize_document(page.document());
    match cli.output {
        Some(path) => {
            fs::write(&path, out)?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{out}"),
    }
    Ok(())
}
