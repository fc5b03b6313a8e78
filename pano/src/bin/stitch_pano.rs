//cargo run --release --bin stitch_pano -- image1.jpg image2.jpg image3.jpg
use clap::{Parser, ValueEnum};
use std::error::Error;
use std::path::PathBuf;

use pano::{pipeline::DEFAULT_OUTPUT, OpenCvStitcher, PanoramaConfig, StitchMode};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Photos taken by rotating the camera
    Panorama,
    /// Flat subjects photographed piece by piece
    Scans,
}

impl From<ModeArg> for StitchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Panorama => StitchMode::Panorama,
            ModeArg::Scans => StitchMode::Scans,
        }
    }
}

/// Stitch overlapping photos in to a panorama.
#[derive(Debug, Parser)]
#[command(name = "stitch_pano", version, about)]
struct Args {
    /// Input images in order. Defaults to image1.jpg ... image7.jpg.
    images: Vec<PathBuf>,

    /// Where to write the panorama.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Do not show the inputs and result in a window.
    #[arg(long)]
    no_display: bool,

    /// Stitching model.
    #[arg(long, value_enum, default_value_t = ModeArg::Panorama)]
    mode: ModeArg,
}

impl Args {
    fn into_config(self) -> PanoramaConfig {
        let defaults = PanoramaConfig::default();
        PanoramaConfig {
            inputs: if self.images.is_empty() { defaults.inputs } else { self.images },
            output: self.output,
            display: !self.no_display,
            mode: self.mode.into(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = try_main() {
        println!("Error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let config = Args::parse().into_config();
    let mut stitcher = OpenCvStitcher::new(config.mode);
    pano::run(&config, &mut stitcher, &mut std::io::stdout())?;
    Ok(())
}
