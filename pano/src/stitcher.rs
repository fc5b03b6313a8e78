use std::fmt;
use std::time::Instant;

use image::imagebuffer::RgbImage;
use opencv::{prelude::*, self as cv};
use tracing::{info, warn};

use crate::error::PanoError;
use crate::utils::{image_to_mat, mat_to_image};

/* Non-success status reported by a stitching engine */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StitchStatus {
    NeedMoreImages,
    HomographyEstimationFailed,
    CameraParamsAdjustFailed,
    /* Any other status code, kept for diagnostics */
    Unknown(i32),
}

impl StitchStatus {
    /* Engine status codes, as used by OpenCV's Stitcher */
    pub const OK_CODE: i32 = 0;
    pub const NEED_MORE_IMAGES_CODE: i32 = 1;
    pub const HOMOGRAPHY_EST_FAIL_CODE: i32 = 2;
    pub const CAMERA_PARAMS_ADJUST_FAIL_CODE: i32 = 3;

    /* None means success */
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::OK_CODE => None,
            Self::NEED_MORE_IMAGES_CODE => Some(Self::NeedMoreImages),
            Self::HOMOGRAPHY_EST_FAIL_CODE => Some(Self::HomographyEstimationFailed),
            Self::CAMERA_PARAMS_ADJUST_FAIL_CODE => Some(Self::CameraParamsAdjustFailed),
            other => Some(Self::Unknown(other)),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::NeedMoreImages => Self::NEED_MORE_IMAGES_CODE,
            Self::HomographyEstimationFailed => Self::HOMOGRAPHY_EST_FAIL_CODE,
            Self::CameraParamsAdjustFailed => Self::CAMERA_PARAMS_ADJUST_FAIL_CODE,
            Self::Unknown(code) => *code,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::NeedMoreImages => "Not enough images for stitching".to_string(),
            Self::HomographyEstimationFailed => "Homography estimation failed".to_string(),
            Self::CameraParamsAdjustFailed => "Camera parameter adjustment failed".to_string(),
            Self::Unknown(code) => format!("Unknown error (code: {code})"),
        }
    }
}

impl fmt::Display for StitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/* Why an engine produced no panorama: either it ran and reported a status,
 * or it faulted before it could report one */
#[derive(Debug)]
pub enum StitchFailure {
    Status(StitchStatus),
    Engine(cv::Error),
}

impl From<StitchStatus> for StitchFailure {
    fn from(status: StitchStatus) -> Self {
        StitchFailure::Status(status)
    }
}

impl From<cv::Error> for StitchFailure {
    fn from(err: cv::Error) -> Self {
        StitchFailure::Engine(err)
    }
}

/* A panorama engine. Images come in and go out in canonical RGB order */
pub trait Stitcher {
    fn stitch(&mut self, images: &[RgbImage]) -> Result<RgbImage, StitchFailure>;
}

/* Runs the engine exactly once, the panorama is passed through untouched */
pub fn stitch<S: Stitcher + ?Sized>(stitcher: &mut S, images: &[RgbImage]) -> Result<RgbImage, PanoError> {
    let start = Instant::now();
    let result = stitcher.stitch(images);
    info!("Stitcher finished in {:.1?} seconds", start.elapsed().as_secs_f64());
    result.map_err(|failure| match failure {
        StitchFailure::Status(status) => PanoError::StitchFailed(status),
        StitchFailure::Engine(err) => {
            warn!("Stitching engine raised an error: {}", err);
            PanoError::OpenCv(err)
        }
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StitchMode {
    /* Photos taken by rotating the camera, spherical projection */
    #[default]
    Panorama,
    /* Flat subjects such as scanned documents, affine model */
    Scans,
}

impl StitchMode {
    fn to_cv(self) -> cv::stitching::Stitcher_Mode {
        match self {
            StitchMode::Panorama => cv::stitching::Stitcher_Mode::PANORAMA,
            StitchMode::Scans => cv::stitching::Stitcher_Mode::SCANS,
        }
    }
}

/* Stitcher backed by cv::Stitcher */
pub struct OpenCvStitcher {
    mode: StitchMode,
}

impl OpenCvStitcher {
    pub fn new(mode: StitchMode) -> Self {
        Self { mode }
    }
}

impl Stitcher for OpenCvStitcher {
    fn stitch(&mut self, images: &[RgbImage]) -> Result<RgbImage, StitchFailure> {
        let mut stitcher = cv::stitching::Stitcher::create(self.mode.to_cv())?;
        let mut cv_images = cv::core::Vector::<cv::core::Mat>::new();
        for image in images {
            cv_images.push(image_to_mat(image)?);
        }

        let mut panorama = cv::core::Mat::default();
        let code = stitcher.stitch(&cv_images, &mut panorama)? as i32;
        if let Some(status) = StitchStatus::from_code(code) {
            return Err(status.into());
        }
        Ok(mat_to_image(&panorama)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStitcher {
        result: Result<RgbImage, StitchStatus>,
        calls: usize,
    }

    impl Stitcher for FixedStitcher {
        fn stitch(&mut self, _images: &[RgbImage]) -> Result<RgbImage, StitchFailure> {
            self.calls += 1;
            Ok(self.result.clone()?)
        }
    }

    /* Engine that faults instead of reporting a status */
    struct FaultyStitcher;

    impl Stitcher for FaultyStitcher {
        fn stitch(&mut self, _images: &[RgbImage]) -> Result<RgbImage, StitchFailure> {
            Err(cv::Error::new(cv::core::StsNoMem, "out of memory".to_string()).into())
        }
    }

    fn failing(status: StitchStatus) -> FixedStitcher {
        FixedStitcher { result: Err(status), calls: 0 }
    }

    #[test]
    fn message_table_is_exact() {
        let cases = [
            (1, "Stitching failed: Not enough images for stitching"),
            (2, "Stitching failed: Homography estimation failed"),
            (3, "Stitching failed: Camera parameter adjustment failed"),
        ];
        for (code, message) in cases {
            let status = StitchStatus::from_code(code).unwrap();
            let err = stitch(&mut failing(status), &[]).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn unknown_code_keeps_raw_value() {
        let status = StitchStatus::from_code(42).unwrap();
        assert_eq!(status, StitchStatus::Unknown(42));
        assert_eq!(status.code(), 42);
        let err = stitch(&mut failing(status), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Stitching failed: Unknown error (code: 42)");
    }

    #[test]
    fn codes_round_trip() {
        assert_eq!(StitchStatus::from_code(0), None);
        for code in 1..=3 {
            assert_eq!(StitchStatus::from_code(code).unwrap().code(), code);
        }
        assert!(matches!(StitchStatus::from_code(7), Some(StitchStatus::Unknown(7))));
    }

    #[test]
    fn engine_faults_stay_out_of_the_status_space() {
        let err = stitch(&mut FaultyStitcher, &[RgbImage::new(2, 2)]).unwrap_err();
        match err {
            PanoError::OpenCv(err) => assert_eq!(err.code, cv::core::StsNoMem),
            other => panic!("expected an OpenCV error, got {other:?}"),
        }
    }

    #[test]
    fn success_is_passed_through_once() {
        let panorama = RgbImage::new_with_data(2, 1, vec![1, 2, 3, 4, 5, 6]);
        let mut engine = FixedStitcher { result: Ok(panorama.clone()), calls: 0 };
        let inputs = vec![RgbImage::new(1, 1), RgbImage::new(1, 1)];
        let result = stitch(&mut engine, &inputs).unwrap();
        assert_eq!(result.data, panorama.data);
        assert_eq!(engine.calls, 1);
    }

    #[test]
    fn failures_are_not_retried() {
        let mut engine = failing(StitchStatus::HomographyEstimationFailed);
        let err = stitch(&mut engine, &[RgbImage::new(4, 4)]).unwrap_err();
        assert!(matches!(err, PanoError::StitchFailed(StitchStatus::HomographyEstimationFailed)));
        assert_eq!(engine.calls, 1);
    }

    #[test]
    fn opencv_needs_more_than_one_image() {
        let mut engine = OpenCvStitcher::new(StitchMode::Panorama);
        let single = RgbImage::new_with_data(64, 48, vec![128; 64 * 48 * 3]);
        assert!(matches!(
            engine.stitch(&[single]),
            Err(StitchFailure::Status(StitchStatus::NeedMoreImages))
        ));
    }
}
