use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use pdf_viewer_engine::HostBridge;
use pdf_viewer_engine::Viewer;
use pdf_viewer_engine::host::FileHostServices;
use pdf_viewer_engine::logging;
use pdf_viewer_engine::panic_handler;
use pdf_viewer_engine::pdf::MupdfParser;

/// PDF viewer engine speaking newline-delimited JSON on stdin/stdout
#[derive(Parser, Debug)]
#[command(name = "pdf-viewer-host", version, about)]
struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, default_value = "pdf-viewer-host.log")]
    log_file: PathBuf,

    /// Overrides `log_level` from the settings file
    #[arg(long, value_parser = parse_level)]
    log_level: Option<LevelFilter>,

    /// Directory that receives downloaded documents
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Document to open at startup: a path, file:// or http(s):// URL
    document: Option<String>,
}

fn parse_level(value: &str) -> std::result::Result<LevelFilter, String> {
    LevelFilter::from_str(value).map_err(|_| format!("unknown log level {value:?}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file {:?}", args.log_file))?;
    let settings = logging::init_with_settings(log_file, args.log_level, args.config.as_deref())?;
    panic_handler::initialize_panic_handler();

    info!("Starting pdf-viewer-host");
    info!("Settings: {settings:?}");

    let download_dir = args
        .download_dir
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    info!("Downloads go to {download_dir:?}");

    let viewer =
        Viewer::new(settings, MupdfParser).with_host(FileHostServices::new(download_dir));
    let mut bridge = HostBridge::new(viewer);
    bridge.viewer_mut().initialize();

    if let Some(document) = args.document.as_deref() {
        bridge.viewer_mut().load_from_url(document);
    }

    let result = bridge.run(io::stdin().lock(), io::stdout().lock());

    info!("Shutting down pdf-viewer-host");
    result
}
