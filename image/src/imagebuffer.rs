use rayon::prelude::*;

/* Interleaved raster, pixels stored row by row with NCHANNELS values each */
#[derive(Clone,Default,PartialEq,Eq)]
pub struct ImageBuffer<const NCHANNELS: usize, T> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<T>,
}

/* 8 bit colour image in the pipeline's canonical (red, green, blue) order */
pub type RgbImage = ImageBuffer<3,u8>;

impl<const NCHANNELS: usize, T> ImageBuffer<NCHANNELS, T>
{
    #[inline]
    pub fn new(width: usize, height: usize) -> Self where T: Default + Copy {
        Self { width, height, data: vec![T::default(); width*height*NCHANNELS] }
    }

    #[inline]
    pub fn new_with_data(width: usize, height: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), width * height * NCHANNELS);
        Self { width, height, data }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x < self.width && y < self.height {
            let start = (y * self.width + x) * NCHANNELS;
            Some(&self.data[start..start+NCHANNELS])
        } else {
            None
        }
    }

    /* Reverses the channel order of every pixel in place.
     * For 3 channel images this swaps RGB <-> BGR, and applying it twice is a no-op. */
    pub fn reverse_channels(&mut self) where T: Send {
        self.data.par_chunks_exact_mut(NCHANNELS).for_each(|pix| pix.reverse());
    }

    /* Same as reverse_channels, but leaves self untouched */
    pub fn with_reversed_channels(&self) -> Self where T: Clone + Send {
        let mut result = self.clone();
        result.reverse_channels();
        result
    }
}

/* Pixel data is left out, it can be many megabytes */
impl<const NCHANNELS: usize, T> std::fmt::Debug for ImageBuffer<NCHANNELS, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &NCHANNELS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_channels_swaps_red_and_blue() {
        let mut image = RgbImage::new_with_data(2, 1, vec![10, 20, 30, 40, 50, 60]);
        image.reverse_channels();
        assert_eq!(image.data, vec![30, 20, 10, 60, 50, 40]);
    }

    #[test]
    fn reverse_channels_twice_is_identity() {
        let data: Vec<u8> = (0..4*3*3).map(|x| (x * 7 % 251) as u8).collect();
        let original = RgbImage::new_with_data(4, 3, data);
        let round_trip = original.with_reversed_channels().with_reversed_channels();
        assert_eq!(round_trip, original);
    }

    #[test]
    fn pixel_indexing() {
        let image = RgbImage::new_with_data(2, 2, (0..12).collect());
        assert_eq!(image.pixel(1, 1), Some(&[9u8, 10, 11][..]));
        assert_eq!(image.pixel(2, 0), None);
        assert!(!image.is_empty());
        assert!(RgbImage::new(0, 5).is_empty());
    }

    #[test]
    fn debug_output_omits_pixels() {
        let image = RgbImage::new(3, 2);
        assert_eq!(format!("{:?}", image), "ImageBuffer { width: 3, height: 2, channels: 3 }");
    }
}
