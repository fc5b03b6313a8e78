use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imagebuffer::RgbImage;
use opencv::{prelude::*, self as cv};
use tracing::{debug, info};

use crate::error::PanoError;
use crate::raw::{is_raw_file, read_raw_image};
use crate::utils::mat_to_image;

/* Decodes one file in its storage (BGR) order, None if it holds no image data */
fn decode(path: &Path) -> Option<RgbImage> {
    if is_raw_file(path) {
        return read_raw_image(path)
            .map_err(|err| debug!("rawloader could not decode {}: {}", path.display(), err))
            .ok();
    }
    let mat = cv::imgcodecs::imread(path.to_str()?, cv::imgcodecs::IMREAD_COLOR).ok()?;
    if mat.rows() <= 0 || mat.cols() <= 0 {
        return None;
    }
    mat_to_image(&mat).ok()
}

/* Reads one image and converts it to canonical RGB order */
pub fn load_image(path: &Path) -> Result<RgbImage, PanoError> {
    let mut image = decode(path)
        .filter(|image| !image.is_empty())
        .ok_or_else(|| PanoError::SourceUnreadable(path.to_path_buf()))?;
    image.reverse_channels();
    debug!("Loaded {} ({}x{})", path.display(), image.width, image.height);
    Ok(image)
}

/* Reads all images in order. The first unreadable path aborts the whole
 * load, later paths are not opened */
pub fn load_images(paths: &[PathBuf]) -> Result<Vec<RgbImage>, PanoError> {
    let start = Instant::now();
    let images = paths.iter()
        .map(|path| load_image(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!("{} images were loaded in {:.1?} seconds", images.len(), start.elapsed().as_secs_f64());
    Ok(images)
}
