mod app;
mod fixture;
mod renderer;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::executor::block_on;
use photogrid_core::{NoopHost, Timeline, TimelineOptions};
use photogrid_protocol::Viewport;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::fixture::FixtureApi;

#[derive(Parser)]
#[command(name = "photogrid")]
#[command(about = "Browse a photo timeline in the terminal", long_about = None)]
struct Cli {
    /// Library file with the section catalog and every section's segments
    library: PathBuf,

    /// JSON file with layout options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Write log output to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the laid-out grid items as JSON and exit
    #[arg(long)]
    dump: bool,

    /// Container width used by --dump
    #[arg(long, default_value_t = 1000.0)]
    width: f64,

    /// Container height used by --dump
    #[arg(long, default_value_t = 800.0)]
    height: f64,
}

fn init_tracing(log_file: Option<&Path>, dump: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None if dump => builder.with_writer(std::io::stderr).init(),
        // the terminal UI owns the screen
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<TimelineOptions> {
    let Some(path) = path else {
        return Ok(TimelineOptions::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read options {}", path.display()))?;
    Ok(TimelineOptions::from_json_str(&json)?)
}

/// Lay out the first screen and print its grid items.
fn dump(options: TimelineOptions, api: FixtureApi, viewport: Viewport) -> Result<()> {
    let timeline = Timeline::new(options, Rc::new(api), NoopHost);
    block_on(async {
        timeline.initialize(viewport).await?;
        timeline.on_scroll_change(0.0, false).await
    })?;
    let visible = timeline.visible_items();
    info!(
        items = visible.len(),
        height = timeline.timeline_height(),
        "first screen laid out"
    );

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &timeline.items()[visible.as_range()])?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref(), cli.dump)?;

    let options = load_options(cli.options.as_deref())?;
    let api = FixtureApi::from_path(&cli.library)?;

    if cli.dump {
        return dump(options, api, Viewport::new(cli.width, cli.height));
    }
    let mut app = App::new(options, api);
    renderer::render_tui(&mut app)
}
