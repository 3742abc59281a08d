/// 8-bit raster value type shared by every cipher pipeline.
///
/// An `Image` is either rank 2 (H×W grayscale) or rank 3 (H×W×C with
/// C ∈ {1, 3}), stored row-major with interleaved channels. The rank is part
/// of the shape: an H×W×1 image stays rank 3 through encrypt and decrypt.
use crate::error::{CipherError, Result};
use image::{DynamicImage, GrayImage, RgbImage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    height: usize,
    width: usize,
    channels: usize,
    channel_axis: bool,
    data: Vec<u8>,
}

impl Image {
    /// Rank-2 grayscale image.
    pub fn gray(height: usize, width: usize, data: Vec<u8>) -> Result<Self> {
        Self::build(height, width, 1, false, data)
    }

    /// Rank-3 image with an explicit channel axis (1 or 3 channels).
    pub fn with_channels(
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        Self::build(height, width, channels, true, data)
    }

    /// Build from a shape slice: `[H, W]` or `[H, W, C]`.
    pub fn from_shape(shape: &[usize], data: Vec<u8>) -> Result<Self> {
        match *shape {
            [h, w] => Self::gray(h, w, data),
            [h, w, c] => Self::with_channels(h, w, c, data),
            _ => Err(CipherError::InvalidImage(format!(
                "image must be 2D (grayscale) or 3D (color), got {}D",
                shape.len()
            ))),
        }
    }

    /// Build from higher-precision samples, clamping into `[0, 255]` and
    /// truncating toward zero. NaN samples become 0. This is lossy on purpose.
    pub fn from_f64_clamped(shape: &[usize], samples: &[f64]) -> Result<Self> {
        let data = samples.iter().map(|&v| clamp_sample(v)).collect();
        Self::from_shape(shape, data)
    }

    fn build(
        height: usize,
        width: usize,
        channels: usize,
        channel_axis: bool,
        data: Vec<u8>,
    ) -> Result<Self> {
        let image = Self { height, width, channels, channel_axis, data };
        image.validate()?;
        Ok(image)
    }

    /// Re-check every shape invariant. Pipelines call this before any
    /// numeric work.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(CipherError::InvalidImage("image is empty".into()));
        }
        if self.channels != 1 && self.channels != 3 {
            return Err(CipherError::InvalidImage(format!(
                "color image must have 1 or 3 channels, got {}",
                self.channels
            )));
        }
        if !self.channel_axis && self.channels != 1 {
            return Err(CipherError::InvalidImage("2D image cannot carry channels".into()));
        }
        let expected = self
            .height
            .checked_mul(self.width)
            .and_then(|n| n.checked_mul(self.channels))
            .ok_or_else(|| CipherError::InvalidImage("image dimensions overflow".into()))?;
        if self.data.len() != expected {
            return Err(CipherError::InvalidImage(format!(
                "expected {} samples for shape {:?}, got {}",
                expected,
                self.shape(),
                self.data.len()
            )));
        }
        Ok(())
    }

    pub fn shape(&self) -> Vec<usize> {
        if self.channel_axis {
            vec![self.height, self.width, self.channels]
        } else {
            vec![self.height, self.width]
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn has_channel_axis(&self) -> bool {
        self.channel_axis
    }

    pub fn is_square(&self) -> bool {
        self.height == self.width
    }

    /// Number of pixels per channel plane.
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Same shape, new samples. `data` must have the same length.
    pub(crate) fn with_data(&self, data: Vec<u8>) -> Image {
        debug_assert_eq!(data.len(), self.data.len());
        Image {
            height: self.height,
            width: self.width,
            channels: self.channels,
            channel_axis: self.channel_axis,
            data,
        }
    }

    /// Split into `C` row-major planes of `H*W` samples each.
    pub(crate) fn to_planes(&self) -> Vec<Vec<u8>> {
        let c = self.channels;
        if c == 1 {
            return vec![self.data.clone()];
        }
        (0..c)
            .map(|ch| self.data.iter().skip(ch).step_by(c).copied().collect())
            .collect()
    }

    /// Interleave planes back into an image shaped like `self`.
    pub(crate) fn from_planes(&self, planes: Vec<Vec<u8>>) -> Image {
        let c = self.channels;
        debug_assert_eq!(planes.len(), c);
        if c == 1 {
            if let Some(plane) = planes.into_iter().next() {
                return self.with_data(plane);
            }
            return self.clone();
        }
        let mut data = vec![0u8; self.data.len()];
        for (ch, plane) in planes.iter().enumerate() {
            for (i, &v) in plane.iter().enumerate() {
                data[i * c + ch] = v;
            }
        }
        self.with_data(data)
    }

    /// Convert to an `image` crate buffer for container encoding.
    pub fn into_dynamic(self) -> DynamicImage {
        let (w, h) = (self.width as u32, self.height as u32);
        match self.channels {
            3 => RgbImage::from_raw(w, h, self.data)
                .map(DynamicImage::ImageRgb8)
                .unwrap_or_else(|| DynamicImage::new_rgb8(w, h)),
            _ => GrayImage::from_raw(w, h, self.data)
                .map(DynamicImage::ImageLuma8)
                .unwrap_or_else(|| DynamicImage::new_luma8(w, h)),
        }
    }
}

fn clamp_sample(v: f64) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.clamp(0.0, 255.0) as u8
    }
}

impl TryFrom<&DynamicImage> for Image {
    type Error = CipherError;

    /// 8-bit luma and RGB buffers are taken as-is. 16-bit and float buffers
    /// are clamped sample-wise into `[0, 255]`. Buffers with an alpha channel
    /// are rejected.
    fn try_from(img: &DynamicImage) -> Result<Self> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        match img {
            DynamicImage::ImageLuma8(buf) => Image::gray(h, w, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => Image::with_channels(h, w, 3, buf.as_raw().clone()),
            DynamicImage::ImageLuma16(buf) => {
                Image::gray(h, w, buf.as_raw().iter().map(|&v| clamp_sample(v as f64)).collect())
            }
            DynamicImage::ImageRgb16(buf) => Image::with_channels(
                h,
                w,
                3,
                buf.as_raw().iter().map(|&v| clamp_sample(v as f64)).collect(),
            ),
            DynamicImage::ImageRgb32F(buf) => Image::with_channels(
                h,
                w,
                3,
                buf.as_raw().iter().map(|&v| clamp_sample(v as f64)).collect(),
            ),
            other => Err(CipherError::InvalidImage(format!(
                "unsupported pixel layout {:?}; expected 1 or 3 channels",
                other.color()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_preserves_rank() {
        let gray = Image::gray(2, 3, vec![0; 6]).unwrap();
        assert_eq!(gray.shape(), vec![2, 3]);
        assert!(!gray.has_channel_axis());

        let single = Image::with_channels(2, 3, 1, vec![0; 6]).unwrap();
        assert_eq!(single.shape(), vec![2, 3, 1]);
        assert!(single.has_channel_axis());
        assert_ne!(gray, single);
        assert_eq!(single.into_bytes(), gray.into_bytes());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(matches!(Image::from_shape(&[0, 4], vec![]), Err(CipherError::InvalidImage(_))));
        assert!(matches!(Image::from_shape(&[4], vec![0; 4]), Err(CipherError::InvalidImage(_))));
        assert!(matches!(
            Image::from_shape(&[2, 2, 2], vec![0; 8]),
            Err(CipherError::InvalidImage(_))
        ));
        assert!(matches!(
            Image::from_shape(&[2, 2, 4], vec![0; 16]),
            Err(CipherError::InvalidImage(_))
        ));
        assert!(matches!(
            Image::from_shape(&[2, 2], vec![0; 5]),
            Err(CipherError::InvalidImage(_))
        ));
        assert!(matches!(
            Image::from_shape(&[2, 3, 4, 1], vec![0; 24]),
            Err(CipherError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_planes_roundtrip() {
        let data: Vec<u8> = (0..18).collect();
        let img = Image::with_channels(2, 3, 3, data).unwrap();
        let planes = img.to_planes();
        assert_eq!(planes.len(), 3);
        assert_eq!(planes[0], vec![0, 3, 6, 9, 12, 15]);
        assert_eq!(planes[2], vec![2, 5, 8, 11, 14, 17]);
        assert_eq!(img.from_planes(planes), img);
    }

    #[test]
    fn test_clamped_samples_are_lossy() {
        let img = Image::from_f64_clamped(&[1, 4], &[-3.0, 12.7, 255.9, 1e6]).unwrap();
        assert_eq!(img.as_bytes(), &[0, 12, 255, 255]);
    }

    #[test]
    fn test_dynamic_image_conversion() {
        let mut rgb = RgbImage::new(4, 2);
        rgb.put_pixel(3, 1, image::Rgb([1, 2, 3]));
        let dynamic = DynamicImage::ImageRgb8(rgb);

        let img = Image::try_from(&dynamic).unwrap();
        assert_eq!(img.shape(), vec![2, 4, 3]);
        assert_eq!(&img.as_bytes()[21..24], &[1, 2, 3]);

        let back = img.into_dynamic();
        assert_eq!(back.to_rgb8().get_pixel(3, 1).0, [1, 2, 3]);
    }

    #[test]
    fn test_alpha_is_rejected() {
        let rgba = DynamicImage::new_rgba8(2, 2);
        assert!(matches!(Image::try_from(&rgba), Err(CipherError::InvalidImage(_))));
    }
}
