use opencv::{prelude::*, self as cv};
use image::imagebuffer::ImageBuffer;
use std::error::Error;
use std::path::Path;

use crate::utils::*;

/* File extensions handed to rawloader instead of opencv */
const RAW_EXTENSIONS: [&str; 10] = ["cr2", "cr3", "nef", "arw", "dng", "orf", "rw2", "raf", "pef", "srw"];

pub fn is_raw_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| RAW_EXTENSIONS.iter().any(|raw| raw.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/* OpenCV names bayer patterns after the second row, so RGGB is "BayerBG" */
fn demosaic_code(cfa_name: &str) -> Option<i32> {
    match cfa_name {
        "RGGB" => Some(cv::imgproc::COLOR_BayerBG2BGR),
        "BGGR" => Some(cv::imgproc::COLOR_BayerRG2BGR),
        "GRBG" => Some(cv::imgproc::COLOR_BayerGB2BGR),
        "GBRG" => Some(cv::imgproc::COLOR_BayerGR2BGR),
        _ => None
    }
}

/* Black/white level normalisation and 2.2 gamma, as u8 */
#[inline]
fn encode_u8(value: u16, black: f32, white: f32) -> u8 {
    let linear = (value as f32 - black) / (white - black);
    (linear.clamp(0.0, 1.0).powf(1.0/2.2) * 255.0).round() as u8
}

/* Demosaics a single channel bayer frame, crops is top right bottom left.
 * Output is 8 bit BGR (storage order). */
fn develop_bayer(
    width: usize, height: usize, crops: [usize; 4],
    code: i32, black: f32, white: f32,
    raw_data: &[u16]
) -> Result<ImageBuffer<3,u8>, Box<dyn Error>>
{
    let [crop_top, crop_right, crop_bottom, crop_left] = crops;
    if white <= black {
        return Err("Invalid black and white levels".into());
    }
    if raw_data.len() != width * height {
        return Err("Raw data does not match image size".into());
    }

    /* Make cropped cv_image pointing to the raw data */
    let raw_image = make_cv_image_crop(width, height, crop_top, crop_right, crop_bottom, crop_left, raw_data)?;

    let mut dcv = cv::core::Mat::default();
    cv::imgproc::demosaicing(&raw_image, &mut dcv, code, 3)?;
    drop(raw_image);

    let mut as_u8 = Vec::with_capacity((dcv.rows() * dcv.cols() * 3) as usize);
    for y in 0..dcv.rows() {
        let row = dcv.row(y)?;
        as_u8.extend(row.data_bytes()?
            .chunks_exact(2)
            .map(|b| encode_u8(u16::from_ne_bytes([b[0], b[1]]), black, white)));
    }

    Ok(ImageBuffer::new_with_data(dcv.cols() as usize, dcv.rows() as usize, as_u8))
}

/* Decodes a camera raw file to an 8 bit image in BGR (storage) order */
pub fn read_raw_image(file_path: &Path) -> Result<ImageBuffer<3,u8>, Box<dyn Error>>
{
    let raw = rawloader::decode_file(file_path)?;
    let (bl, wl) = (raw.blacklevels[0] as f32, raw.whitelevels[0] as f32);
    let [crop_top, _, _, crop_left] = raw.crops; /* Top right bottom left */

    match (&raw.data, raw.cpp) {
        (rawloader::RawImageData::Integer(raw_data), 1) => {
            /* Cropping moves the origin, so the pattern has to be shifted too */
            let cfa = raw.cfa.shift(crop_left, crop_top);
            let code = demosaic_code(&cfa.name).ok_or_else(|| format!("Unsupported CFA pattern {}", cfa.name))?;
            develop_bayer(raw.width, raw.height, raw.crops, code, bl, wl, raw_data)
        }
        (rawloader::RawImageData::Integer(_), 3) => Err("3 channel raws not yet supported".into()),
        (rawloader::RawImageData::Integer(_), _cpp) => Err("Invalid components per pixel number".into()),
        (rawloader::RawImageData::Float(_), _) => Err("Floating point raw files are not supported".into())
    }
}
