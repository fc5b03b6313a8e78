use opencv::{prelude::*, self as cv,};
use image::imagebuffer::ImageBuffer;

fn unsupported(message: &str) -> cv::Error {
    cv::Error::new(cv::core::StsUnsupportedFormat, message.to_string())
}

/* Creates an opencv image that uses provided memory slice.
 * The Mat does not own the memory and nothing ties it to the lifetime of `data`,
 * so it stays crate private and callers drop it before `data`. */
pub(crate) fn make_cv_image_crop<T>(
    width: usize, height: usize,
    crop_top: usize, crop_right: usize,
    crop_bottom: usize, crop_left: usize,
    data: &[T]
) -> cv::Result<cv::core::Mat> {
    if width == 0 || height == 0 || crop_left + crop_right >= width || crop_top + crop_bottom >= height {
        return Err(unsupported("Empty image"));
    }
    let elements_per_pixel = data.len() / (width * height);
    let element_size = std::mem::size_of::<T>();
    let image_type = match (element_size, elements_per_pixel) {
        (1, 1) => cv::core::CV_8UC1, (1, 3) => cv::core::CV_8UC3,
        (2, 1) => cv::core::CV_16UC1, (2, 3) => cv::core::CV_16UC3,
        (4, 1) => cv::core::CV_32FC1, (4, 3) => cv::core::CV_32FC3,
        _ => return Err(unsupported("Unknown image format"))
    };
    let start = (crop_top*width + crop_left) * elements_per_pixel;
    let (_, data) = data.split_at(start);
    let row_bytes = width * element_size * elements_per_pixel;
    unsafe {
        cv::core::Mat::new_rows_cols_with_data(
            (height - crop_bottom - crop_top) as i32,
            (width - crop_left - crop_right) as i32, image_type,
            data.as_ptr() as *mut std::os::raw::c_void,
            row_bytes
        )
    }
}

pub(crate) fn make_cv_image<T>(width: usize, height: usize, data: &[T]) -> cv::Result<cv::core::Mat> {
    make_cv_image_crop(width, height, 0, 0, 0, 0, data)
}

/* Copies an 8 bit 3 channel image in to a Mat that owns its memory.
 * Channel order is kept as is. */
pub fn image_to_mat(image: &ImageBuffer<3,u8>) -> cv::Result<cv::core::Mat> {
    make_cv_image(image.width, image.height, &image.data)?.try_clone()
}

/* Copies an 8 bit 3 channel Mat in to an image buffer, channel order is kept as is */
pub fn mat_to_image(mat: &cv::core::Mat) -> cv::Result<ImageBuffer<3,u8>> {
    if mat.typ() != cv::core::CV_8UC3 {
        return Err(unsupported("Expected an 8 bit 3 channel image"));
    }
    let (width, height) = (mat.cols() as usize, mat.rows() as usize);
    let mut data = Vec::with_capacity(width * height * 3);
    /* Copy row by row, a single row is always continuous */
    for y in 0..mat.rows() {
        data.extend_from_slice(mat.row(y)?.data_bytes()?);
    }
    Ok(ImageBuffer::new_with_data(width, height, data))
}
