//! slidesmith-preview: walk a Beamer document page by page and write the
//! baseline and every improvement variant of each page as PNG files.
//!
//! Output files are named `<unit>_<page>_org.png` for the baseline and
//! `<unit>_<page>_<category><generation>.png` for variants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{select, RecvError};
use tracing::{info, warn};

use slidesmith_compute::{Document, OutputSink, RasterImage, RenderedVariant, SinkReceivers};
use slidesmith_core::config::load_dotenv;
use slidesmith_core::BeautifierConfig;

// ── CLI ─────────────────────────────────────────────────────────────

/// Preview every improvement the scheduler produces for a document.
#[derive(Parser, Debug)]
#[command(name = "slidesmith-preview", version, about)]
struct Cli {
    /// Beamer source file.
    input: PathBuf,

    /// Path to a slidesmith.toml config file.
    #[arg(long, env = "SLIDESMITH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the PNG files are written to.
    #[arg(long, short, default_value = "slidesmith-preview")]
    output: PathBuf,

    /// Seconds without a new variant before giving up on a page whose
    /// variants are still being compiled.
    #[arg(long, env = "SLIDESMITH_IDLE_TIMEOUT", default_value_t = 20)]
    idle_timeout: u64,

    /// Also write the document with the first palette applied to this path.
    #[arg(long)]
    save: Option<PathBuf>,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match BeautifierConfig::from_file(path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded slidesmith config");
                cfg
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load config, using defaults");
                BeautifierConfig::from_env()
            }
        },
        None => BeautifierConfig::from_env(),
    };

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut document = Document::open(&cli.input, &config)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let idle = Duration::from_secs(cli.idle_timeout);

    let mut pages = 0usize;
    loop {
        let (sink, receivers) = OutputSink::channels();
        let Some(baseline) = document.next_page(sink)? else {
            break;
        };
        let Some((unit, page)) = document.position() else {
            break;
        };
        pages += 1;
        write_png(&cli.output, &format!("{unit}_{page}_org"), &baseline)?;
        let variants = collect_variants(&cli.output, &receivers, idle)?;
        info!(unit, page, variants, "Page previewed");
    }

    if let Some(path) = &cli.save {
        if !document.scheduler().wait_finished(idle)? {
            warn!("walker still busy, saving with the variants generated so far");
        }
        if let Some(global) = document.scheduler().unit(0).map(|unit| unit.global_improvements()) {
            if global.all_variants().is_empty() {
                warn!("no palette variants available, saving unchanged colors");
            } else {
                global.select_alternative(1)?;
            }
        }
        let saved = document.save(path)?;
        info!(path = %saved.display(), "improved document written");
    }

    document.close();
    info!(pages, output = %cli.output.display(), "preview complete");
    Ok(())
}

/// Write deliveries as they arrive until the scheduler reports the page's
/// task done, or none comes for `idle`.
fn collect_variants(dir: &Path, receivers: &SinkReceivers, idle: Duration) -> anyhow::Result<usize> {
    let mut written = 0;
    loop {
        let received: Result<RenderedVariant, RecvError> = select! {
            recv(receivers.local) -> v => v,
            recv(receivers.background) -> v => v,
            recv(receivers.global) -> v => v,
            recv(receivers.done) -> _ => {
                // Every delivery is sent before the completion signal.
                let rest = receivers
                    .local
                    .try_iter()
                    .chain(receivers.background.try_iter())
                    .chain(receivers.global.try_iter());
                for variant in rest {
                    write_variant(dir, &variant)?;
                    written += 1;
                }
                return Ok(written);
            },
            default(idle) => return Ok(written),
        };
        let Ok(variant) = received else {
            return Ok(written);
        };
        write_variant(dir, &variant)?;
        written += 1;
    }
}

fn write_variant(dir: &Path, variant: &RenderedVariant) -> anyhow::Result<()> {
    let name = format!(
        "{}_{}_{}{}",
        variant.unit,
        variant.page,
        variant.category.prefix(),
        variant.generation
    );
    write_png(dir, &name, &variant.image)
}

fn write_png(dir: &Path, name: &str, image: &RasterImage) -> anyhow::Result<()> {
    let path = dir.join(format!("{name}.png"));
    image
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))
}
