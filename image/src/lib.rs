/* In-memory raster images */
pub mod imagebuffer;
