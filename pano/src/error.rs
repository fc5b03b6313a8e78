use std::path::PathBuf;

use image::imagebuffer::RgbImage;
use thiserror::Error;

use crate::stitcher::StitchStatus;

#[derive(Error, Debug)]
pub enum PanoError {
    /* An input could not be decoded as an image */
    #[error("Could not read image: {}", .0.display())]
    SourceUnreadable(PathBuf),

    #[error("Stitching failed: {0}")]
    StitchFailed(StitchStatus),

    /* The raster travels with the error so the caller can try another destination */
    #[error("Could not write panorama to {}", .path.display())]
    OutputWriteFailed { path: PathBuf, panorama: RgbImage },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

impl PanoError {
    /* Gives back the unsaved panorama of a failed write */
    pub fn into_panorama(self) -> Option<RgbImage> {
        match self {
            PanoError::OutputWriteFailed { panorama, .. } => Some(panorama),
            _ => None,
        }
    }
}
