use image::{imageops, imageops::FilterType, RgbImage};

use crate::error::{AppError, Result};

/// Per-channel ImageNet mean (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel ImageNet standard deviation (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Image preprocessing pipeline feeding a network.
///
/// The classifier and the feature extractor were trained with different
/// pipelines, so each keeps its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Resize to `size`×`size`, ignoring aspect ratio
    Stretch {
        /// Output side length
        size: u32,
    },
    /// Resize the shorter side to `resize`, then take the central `crop`×`crop` square
    CenterCrop {
        /// Target length of the shorter side
        resize: u32,
        /// Output side length
        crop: u32,
    },
}

impl Pipeline {
    /// Pipeline used by the flower classifier
    pub const CLASSIFIER: Self = Self::Stretch { size: 224 };
    /// Pipeline used by the embedding extractor
    pub const EMBEDDER: Self = Self::CenterCrop {
        resize: 256,
        crop: 224,
    };

    /// Side length of the square image this pipeline produces
    pub fn output_side(&self) -> u32 {
        match *self {
            Self::Stretch { size } => size,
            Self::CenterCrop { crop, .. } => crop,
        }
    }

    /// Decode `bytes` and produce a normalized CHW buffer of `3 * side * side` floats
    pub fn run(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let rgb = decode_rgb(bytes)?;
        let resized = match *self {
            Self::Stretch { size } => imageops::resize(&rgb, size, size, FilterType::Triangle),
            Self::CenterCrop { resize, crop } => center_crop(&resize_shorter_side(&rgb, resize), crop),
        };

        let side = self.output_side();
        if resized.dimensions() != (side, side) {
            return Err(AppError::InvalidInput(format!(
                "preprocessed image is {}x{}, expected {}x{}",
                resized.width(),
                resized.height(),
                side,
                side
            )));
        }

        Ok(to_normalized_chw(&resized))
    }
}

/// Decode arbitrary image bytes into an 8-bit RGB grid
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(AppError::InvalidInput("image has no pixels".to_string()));
    }
    Ok(img.to_rgb8())
}

/// Resize so the shorter side equals `size`, keeping the aspect ratio
pub fn resize_shorter_side(img: &RgbImage, size: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let (w, h) = if width <= height {
        (size, scale(height, size, width))
    } else {
        (scale(width, size, height), size)
    };
    imageops::resize(img, w, h, FilterType::Triangle)
}

fn scale(long: u32, size: u32, short: u32) -> u32 {
    ((u64::from(long) * u64::from(size)) / u64::from(short)).max(1) as u32
}

/// Take the central `size`×`size` square
pub fn center_crop(img: &RgbImage, size: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let x = crop_offset(width, size);
    let y = crop_offset(height, size);
    imageops::crop_imm(img, x, y, size.min(width), size.min(height)).to_image()
}

/// `(len - size) / 2` rounded half to even, as torchvision's `CenterCrop` does
fn crop_offset(len: u32, size: u32) -> u32 {
    let diff = len.saturating_sub(size);
    let half = diff / 2;
    if diff % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

/// Scale to [0, 1], normalize with ImageNet statistics, and lay out channels first
pub fn to_normalized_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0f32; 3 * plane];

    for (i, pixel) in img.pixels().enumerate() {
        for c in 0..3 {
            let value = f32::from(pixel[c]) / 255.0;
            data[c * plane + i] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_resize_shorter_side() {
        let portrait = RgbImage::new(100, 300);
        assert_eq!(resize_shorter_side(&portrait, 256).dimensions(), (256, 768));

        let landscape = RgbImage::new(640, 480);
        assert_eq!(resize_shorter_side(&landscape, 256).dimensions(), (341, 256));
    }

    #[test]
    fn test_center_crop_takes_middle() {
        let mut img = RgbImage::new(5, 3);
        img.put_pixel(2, 1, Rgb([9, 9, 9]));
        let cropped = center_crop(&img, 1);
        assert_eq!(cropped.dimensions(), (1, 1));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_crop_offset_rounds_half_to_even() {
        assert_eq!(crop_offset(343, 224), 60);
        assert_eq!(crop_offset(341, 224), 58);
        assert_eq!(crop_offset(256, 224), 16);
        assert_eq!(crop_offset(100, 224), 0);
    }

    #[test]
    fn test_center_crop_odd_margin() {
        let mut img = RgbImage::new(343, 224);
        img.put_pixel(60, 0, Rgb([9, 9, 9]));
        let cropped = center_crop(&img, 224);
        assert_eq!(cropped.dimensions(), (224, 224));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_pipelines_produce_expected_length() {
        let bytes = png(40, 90, [10, 200, 30]);
        for pipeline in [Pipeline::CLASSIFIER, Pipeline::EMBEDDER] {
            let data = pipeline.run(&bytes).unwrap();
            let side = pipeline.output_side() as usize;
            assert_eq!(data.len(), 3 * side * side);
        }
    }

    #[test]
    fn test_normalization_is_channel_first() {
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 255]));
        let data = to_normalized_chw(&img);
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!(data[..4].iter().all(|v| (v - red).abs() < 1e-6));
        assert!(data[4..8].iter().all(|v| (v - green).abs() < 1e-6));
    }

    #[test]
    fn test_undecodable_bytes_fail() {
        let err = Pipeline::CLASSIFIER.run(b"not an image").unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }
}
