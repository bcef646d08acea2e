use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use validator::Validate;

use otaku_card::{
    models::NewCard,
    render::{export_png, render_preview, DimensionPreset, ExportOptions, Theme},
    validation::field_violations,
};

/// Render a card JSON file to PNG (or SVG) without running the server.
#[derive(Parser, Debug)]
#[command(name = "render_card", version)]
struct Args {
    /// Card JSON, as returned by GET /api/cards/:id
    input: PathBuf,

    /// Output file. Defaults to the input path with a .png/.svg extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// classic, sakura or midnight
    #[arg(long, default_value = "classic")]
    theme: String,

    /// standard or compact
    #[arg(long, default_value = "standard")]
    preset: String,

    /// Upscale factor for PNG output (1-4)
    #[arg(long, default_value_t = 2)]
    scale: u32,

    /// Write the on-screen SVG instead of a PNG
    #[arg(long)]
    svg: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("otaku_card=info")),
        )
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let card: NewCard = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a card JSON document", args.input.display()))?;

    if let Err(errors) = card.validate() {
        for v in field_violations(&errors) {
            tracing::warn!("{}: {}", v.field, v.message);
        }
    }

    let theme = Theme::by_name(&args.theme)
        .with_context(|| format!("Unknown theme: {}", args.theme))?;
    let preset = DimensionPreset::parse(&args.preset)
        .with_context(|| format!("Unknown preset: {}", args.preset))?;

    let mut layout = render_preview(&card, &theme, preset);
    let extension = if args.svg { "svg" } else { "png" };
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension(extension));

    if args.svg {
        std::fs::write(&output, layout.to_svg())
            .with_context(|| format!("Failed to write {}", output.display()))?;
    } else {
        let exported = export_png(&mut layout, &card.username, &ExportOptions::with_scale(args.scale))?;
        std::fs::write(&output, &exported.png)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("{}x{} {}", exported.width, exported.height, exported.file_name);
    }

    println!("Wrote {}", output.display());
    Ok(())
}
