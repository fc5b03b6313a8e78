use std::io::Write;
use std::path::PathBuf;

use image::imagebuffer::RgbImage;
use tracing::{info, warn};

use crate::error::PanoError;
use crate::loader::load_images;
use crate::present::{display_result, save_panorama};
use crate::stitcher::{stitch, StitchMode, Stitcher};

pub const DEFAULT_OUTPUT: &str = "panorama.jpg";

#[derive(Clone, Debug)]
pub struct PanoramaConfig {
    /* Input photos, in the order they are handed to the engine */
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /* Show the inputs and the result in a window before saving */
    pub display: bool,
    pub mode: StitchMode,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            inputs: (1..=7).map(|i| PathBuf::from(format!("image{i}.jpg"))).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            display: true,
            mode: StitchMode::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub image_count: usize,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
}

/* Load -> stitch -> (display) -> save.
 * Progress messages for the user go to `out`, diagnostics go to the log. */
pub fn run<S, W>(config: &PanoramaConfig, stitcher: &mut S, out: &mut W) -> Result<PipelineOutcome, PanoError>
where
    S: Stitcher + ?Sized,
    W: Write,
{
    run_with_display(config, stitcher, out, display_result)
}

/* Same as run, with the window replaced by `display`.
 * A display failure never costs the panorama, it is logged and the save goes ahead. */
pub fn run_with_display<S, W, D>(
    config: &PanoramaConfig,
    stitcher: &mut S,
    out: &mut W,
    mut display: D,
) -> Result<PipelineOutcome, PanoError>
where
    S: Stitcher + ?Sized,
    W: Write,
    D: FnMut(&[RgbImage], &RgbImage) -> Result<(), PanoError>,
{
    let images = load_images(&config.inputs)?;

    /* Progress output is best effort, a closed stdout must not fail the run */
    writeln!(out, "Stitching {} images...", images.len()).ok();
    let panorama = stitch(stitcher, &images)?;
    info!("Panorama is {}x{}", panorama.width, panorama.height);

    if config.display {
        if let Err(err) = display(&images, &panorama) {
            warn!("Could not display the result: {}", err);
        }
    }

    let (width, height) = (panorama.width, panorama.height);
    save_panorama(panorama, &config.output)?;
    writeln!(out, "Panorama saved as '{}'", config.output.display()).ok();

    Ok(PipelineOutcome {
        image_count: images.len(),
        output: config.output.clone(),
        width,
        height,
    })
}
