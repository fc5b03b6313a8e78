/* Modules */

/* Error type shared by the whole pipeline */
pub mod error;
/* Reading and validating input photos */
pub mod loader;
pub mod raw;
/* The stitching engine and its status codes */
pub mod stitcher;
/* Showing and saving the result */
pub mod present;
/* Main driver code is in here */
pub mod pipeline;

/* opencv conversion helpers used throughout */
pub mod utils;

pub use error::PanoError;
pub use pipeline::{run, PanoramaConfig, PipelineOutcome};
pub use stitcher::{OpenCvStitcher, StitchFailure, StitchMode, StitchStatus, Stitcher};
