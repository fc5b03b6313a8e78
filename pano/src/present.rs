use std::path::Path;

use image::imagebuffer::RgbImage;
use opencv::{prelude::*, self as cv};
use tracing::debug;

use crate::error::PanoError;
use crate::utils::{image_to_mat, mat_to_image};

/* Overview layout */
const CANVAS_WIDTH: i32 = 1800;
const MARGIN: i32 = 10;
const LABEL_HEIGHT: i32 = 30;
/* Thumbnails per row, further inputs wrap on to new rows */
const MAX_COLUMNS: usize = 7;

/* Writes the panorama in the file's native (BGR) order.
 * On failure the panorama is returned inside the error. */
pub fn save_panorama(panorama: RgbImage, path: &Path) -> Result<(), PanoError> {
    let written = write_bgr(&panorama, path);
    match written {
        Ok(true) => {
            debug!("Wrote {}x{} panorama to {}", panorama.width, panorama.height, path.display());
            Ok(())
        }
        Ok(false) => Err(PanoError::OutputWriteFailed { path: path.to_path_buf(), panorama }),
        Err(err) => {
            debug!("imwrite raised an error: {}", err);
            Err(PanoError::OutputWriteFailed { path: path.to_path_buf(), panorama })
        }
    }
}

fn write_bgr(panorama: &RgbImage, path: &Path) -> cv::Result<bool> {
    let file_name = path.to_str()
        .ok_or_else(|| cv::Error::new(cv::core::StsBadArg, "Output path is not valid UTF-8".to_string()))?;
    let bgr = image_to_mat(&panorama.with_reversed_channels())?;
    cv::imgcodecs::imwrite(file_name, &bgr, &cv::core::Vector::new())
}

/* Resizes to fit inside the box, keeping the aspect ratio */
fn fit(image: &cv::core::Mat, max_width: i32, max_height: i32) -> cv::Result<cv::core::Mat> {
    let scale = (max_width as f64 / image.cols() as f64).min(max_height as f64 / image.rows() as f64);
    let size = cv::core::Size::new(
        ((image.cols() as f64 * scale) as i32).max(1),
        ((image.rows() as f64 * scale) as i32).max(1),
    );
    let mut resized = cv::core::Mat::default();
    cv::imgproc::resize(image, &mut resized, size, 0., 0., cv::imgproc::INTER_AREA)?;
    Ok(resized)
}

fn paste(canvas: &mut cv::core::Mat, image: &cv::core::Mat, x: i32, y: i32) -> cv::Result<()> {
    let rect = cv::core::Rect::new(x, y, image.cols(), image.rows());
    let mut region = cv::core::Mat::roi(canvas, rect)?;
    image.copy_to(&mut region)
}

fn label(canvas: &mut cv::core::Mat, text: &str, x: i32, y: i32) -> cv::Result<()> {
    cv::imgproc::put_text(
        canvas, text, cv::core::Point::new(x, y + LABEL_HEIGHT - 8),
        cv::imgproc::FONT_HERSHEY_SIMPLEX, 0.7,
        cv::core::Scalar::new(0., 0., 0., 0.), 2, cv::imgproc::LINE_AA, false,
    )
}

/* Builds a single view: the inputs as labelled thumbnails on top,
 * the panorama beneath across the full width */
pub fn compose_overview(images: &[RgbImage], panorama: &RgbImage) -> Result<RgbImage, PanoError> {
    let columns = images.len().clamp(1, MAX_COLUMNS);
    let thumb_width = (CANVAS_WIDTH - MARGIN) / columns as i32 - MARGIN;
    let thumbs = images.iter()
        .map(|image| fit(&image_to_mat(image)?, thumb_width, CANVAS_WIDTH))
        .collect::<cv::Result<Vec<_>>>()?;
    let thumb_height = thumbs.iter().map(|t| t.rows()).max().unwrap_or(0);
    let row_pitch = LABEL_HEIGHT + thumb_height + MARGIN;
    let thumb_rows = ((thumbs.len() + columns - 1) / columns) as i32;

    let pano = fit(&image_to_mat(panorama)?, CANVAS_WIDTH - 2 * MARGIN, i32::MAX)?;

    let top_height = thumb_rows * row_pitch;
    let height = MARGIN + top_height + LABEL_HEIGHT + pano.rows() + MARGIN;
    let mut canvas = cv::core::Mat::new_rows_cols_with_default(
        height, CANVAS_WIDTH, cv::core::CV_8UC3, cv::core::Scalar::all(255.)
    )?;

    for (i, thumb) in thumbs.iter().enumerate() {
        let x = MARGIN + (i % columns) as i32 * (thumb_width + MARGIN);
        let y = MARGIN + (i / columns) as i32 * row_pitch;
        label(&mut canvas, &format!("Image {}", i + 1), x, y)?;
        paste(&mut canvas, thumb, x, y + LABEL_HEIGHT)?;
    }

    let pano_y = MARGIN + top_height;
    label(&mut canvas, "Panorama", MARGIN, pano_y)?;
    paste(&mut canvas, &pano, MARGIN, pano_y + LABEL_HEIGHT)?;

    Ok(mat_to_image(&canvas)?)
}

/* Shows the overview in a window and waits for a key press */
pub fn display_result(images: &[RgbImage], panorama: &RgbImage) -> Result<(), PanoError> {
    let overview = compose_overview(images, panorama)?;
    /* highgui expects BGR */
    let view = image_to_mat(&overview.with_reversed_channels())?;

    let win = "Panorama";
    cv::highgui::named_window(win, cv::highgui::WINDOW_NORMAL)?;
    cv::highgui::imshow(win, &view)?;
    cv::highgui::wait_key(0)?;
    cv::highgui::destroy_window(win)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: usize, height: usize, rgb: [u8; 3]) -> RgbImage {
        RgbImage::new_with_data(width, height, rgb.iter().copied().cycle().take(width * height * 3).collect())
    }

    #[test]
    fn overview_puts_panorama_below_thumbnails() {
        let images = vec![solid(40, 30, [255, 0, 0]), solid(40, 30, [0, 255, 0])];
        let panorama = solid(90, 30, [0, 0, 255]);
        let overview = compose_overview(&images, &panorama).unwrap();

        assert_eq!(overview.width, CANVAS_WIDTH as usize);
        /* The panorama is scaled to the canvas width, so it is the bottom band */
        let pano_height = (30.0 * ((CANVAS_WIDTH - 2 * MARGIN) as f64 / 90.0)) as usize;
        let y = overview.height - MARGIN as usize - pano_height / 2;
        assert_eq!(overview.pixel(CANVAS_WIDTH as usize / 2, y), Some(&[0u8, 0, 255][..]));

        /* Centre of the first thumbnail is red */
        let thumb_width = ((CANVAS_WIDTH - MARGIN) / 2 - MARGIN) as usize;
        let thumb_height = thumb_width * 30 / 40;
        let x = MARGIN as usize + thumb_width / 2;
        let y = (MARGIN + LABEL_HEIGHT) as usize + thumb_height / 2;
        assert_eq!(overview.pixel(x, y), Some(&[255u8, 0, 0][..]));
    }

    #[test]
    fn many_inputs_wrap_on_to_extra_rows() {
        let images: Vec<_> = (0..200).map(|i| solid(16, 12, [i as u8, 0, 0])).collect();
        let panorama = solid(400, 20, [0, 0, 255]);
        let overview = compose_overview(&images, &panorama).unwrap();

        assert_eq!(overview.width, CANVAS_WIDTH as usize);
        let thumb_width = (CANVAS_WIDTH - MARGIN) / MAX_COLUMNS as i32 - MARGIN;
        let thumb_height = thumb_width * 12 / 16;
        let rows = (200 + MAX_COLUMNS - 1) / MAX_COLUMNS;
        let row_pitch = (LABEL_HEIGHT + thumb_height + MARGIN) as usize;

        /* Centre of the last thumbnail (index 199: last row, column 199 % 7) */
        let x = MARGIN as usize + (199 % MAX_COLUMNS) * (thumb_width + MARGIN) as usize + thumb_width as usize / 2;
        let y = MARGIN as usize + (rows - 1) * row_pitch + LABEL_HEIGHT as usize + thumb_height as usize / 2;
        assert_eq!(overview.pixel(x, y), Some(&[199u8, 0, 0][..]));
        assert!(overview.height > rows * row_pitch);
    }
}
