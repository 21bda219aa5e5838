//! Render a saved mitori session to a PNG image.
//!
//! Loads a session `.json` snapshot, restores the workspace, and
//! renders it in the non-interactive view mode so the output carries
//! the reference lines and distance labels. Useful for sharing a
//! measured-up reference without opening the web app.

use std::path::PathBuf;

use clap::Parser;
use mitori_engine::render::pixmap_to_rgba_image;
use mitori_engine::{Mode, SessionState, Workspace};

/// Render a mitori session file to a PNG image.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input session file (.json).
    input: PathBuf,

    /// Output image path (PNG recommended).
    #[arg(short, long)]
    output: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Render the bare image without the grid overlay.
    #[arg(long)]
    plain: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    eprintln!("Reading session from {}", args.input.display());
    let json = std::fs::read_to_string(&args.input)?;
    let state: SessionState = serde_json::from_str(&json)?;

    let mut workspace = Workspace::new();
    workspace.resize_canvas(args.width, args.height);
    workspace.import_session(&state)?;

    // A shared view renders the grid without interactivity; --plain
    // drops the overlay entirely.
    workspace.set_mode(if args.plain { Mode::Image } else { Mode::Const });

    if let Some((width, height)) = workspace.dimensions() {
        eprintln!(
            "Restored image {width}x{height}, {} grid points",
            workspace.grid_points().len(),
        );
    }

    let frame = workspace.render()?;
    let rgba = pixmap_to_rgba_image(&frame);

    eprintln!("Saving to {}", args.output.display());
    rgba.save(&args.output)?;

    eprintln!("Done.");
    Ok(())
}
