//! Dense, interleaved, multi-channel image buffer.

use super::MatError;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Element type of the samples stored in a [`Mat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Unsigned 8-bit samples, saturating arithmetic.
    U8,
    /// 32-bit floating point samples.
    F32,
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::U8 => write!(f, "u8"),
            Depth::F32 => write!(f, "f32"),
        }
    }
}

/// Sample storage for a [`Mat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "depth", content = "samples", rename_all = "lowercase")]
pub enum MatData {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

impl MatData {
    /// Element type of the storage.
    pub fn depth(&self) -> Depth {
        match self {
            MatData::U8(_) => Depth::U8,
            MatData::F32(_) => Depth::F32,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            MatData::U8(v) => v.len(),
            MatData::F32(v) => v.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zeros(depth: Depth, len: usize) -> Self {
        match depth {
            Depth::U8 => MatData::U8(vec![0; len]),
            Depth::F32 => MatData::F32(vec![0.0; len]),
        }
    }
}

/// Element types a [`Mat`] can hold, as seen by the pixel kernels.
pub(crate) trait Sample: Copy + Default + Send + Sync + 'static {
    /// Value of a fully opaque alpha channel.
    const OPAQUE: Self;

    fn to_f32(self) -> f32;

    /// Converts back, rounding and saturating for integer types.
    fn from_f32(value: f32) -> Self;

    /// Maps the sample into the nominal [0, 1] intensity range.
    fn to_unit(self) -> f32;

    /// Encodes a CIE L*a*b* triple in this depth's Lab convention.
    fn encode_lab(lab: [f32; 3]) -> [Self; 3];
}

impl Sample for u8 {
    const OPAQUE: Self = 255;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn from_f32(value: f32) -> Self {
        saturate_u8(value)
    }

    fn to_unit(self) -> f32 {
        self as f32 / 255.0
    }

    fn encode_lab(lab: [f32; 3]) -> [Self; 3] {
        [
            saturate_u8(lab[0] * 255.0 / 100.0),
            saturate_u8(lab[1] + 128.0),
            saturate_u8(lab[2] + 128.0),
        ]
    }
}

impl Sample for f32 {
    const OPAQUE: Self = 1.0;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(value: f32) -> Self {
        value
    }

    fn to_unit(self) -> f32 {
        self
    }

    fn encode_lab(lab: [f32; 3]) -> [Self; 3] {
        lab
    }
}

/// Rounds to nearest and clamps into `0..=255`. NaN maps to 0.
pub(crate) fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// A 2D image with one or more interleaved channels.
///
/// Samples live behind an [`Arc`], so cloning a `Mat` is cheap and every
/// consumer of a node output sees the same read-only buffer. Mutation goes
/// through [`Mat::data_mut`], which copies the samples first if they are
/// shared.
///
/// The default value is the empty matrix (0x0). Every other constructor
/// rejects zero-sized images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mat {
    width: u32,
    height: u32,
    channels: usize,
    data: Arc<MatData>,
}

impl Default for Mat {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 1,
            data: Arc::new(MatData::U8(Vec::new())),
        }
    }
}

impl Mat {
    /// Create a matrix from existing samples.
    pub fn from_data(
        width: u32,
        height: u32,
        channels: usize,
        data: MatData,
    ) -> Result<Self, MatError> {
        let expected = Self::sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(MatError::InvalidDimensions {
                width,
                height,
                channels,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data: Arc::new(data),
        })
    }

    /// Create an 8-bit matrix.
    pub fn from_u8(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self, MatError> {
        Self::from_data(width, height, channels, MatData::U8(data))
    }

    /// Create a 32-bit float matrix.
    pub fn from_f32(width: u32, height: u32, channels: usize, data: Vec<f32>) -> Result<Self, MatError> {
        Self::from_data(width, height, channels, MatData::F32(data))
    }

    /// Create a zero-filled matrix.
    pub fn zeros(width: u32, height: u32, channels: usize, depth: Depth) -> Result<Self, MatError> {
        let len = Self::sample_count(width, height, channels)?;
        Self::from_data(width, height, channels, MatData::zeros(depth, len))
    }

    /// Create a matrix with every sample set to `value`.
    pub fn filled(
        width: u32,
        height: u32,
        channels: usize,
        depth: Depth,
        value: f32,
    ) -> Result<Self, MatError> {
        let len = Self::sample_count(width, height, channels)?;
        let data = match depth {
            Depth::U8 => MatData::U8(vec![saturate_u8(value); len]),
            Depth::F32 => MatData::F32(vec![value; len]),
        };
        Self::from_data(width, height, channels, data)
    }

    /// Number of samples in a `width x height x channels` matrix.
    ///
    /// Zero extents and products that overflow `usize` are rejected.
    fn sample_count(width: u32, height: u32, channels: usize) -> Result<usize, MatError> {
        let invalid = MatError::InvalidDimensions {
            width,
            height,
            channels,
            expected: 0,
            got: 0,
        };
        if width == 0 || height == 0 || channels == 0 {
            return Err(invalid);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or(invalid)
    }

    /// Reshape this matrix in place, keeping the allocation when possible.
    ///
    /// Samples are reused only when shape and depth already match and no
    /// other `Mat` shares them. Otherwise a zeroed buffer is allocated.
    /// Reused samples keep their previous contents.
    pub fn create(
        &mut self,
        width: u32,
        height: u32,
        channels: usize,
        depth: Depth,
    ) -> Result<(), MatError> {
        let reusable = self.width == width
            && self.height == height
            && self.channels == channels
            && self.depth() == depth
            && Arc::get_mut(&mut self.data).is_some();
        if !reusable {
            *self = Self::zeros(width, height, channels, depth)?;
        }
        Ok(())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Element type.
    pub fn depth(&self) -> Depth {
        self.data.depth()
    }

    /// (width, height, channels)
    pub fn shape(&self) -> (u32, u32, usize) {
        (self.width, self.height, self.channels)
    }

    /// Whether this is the empty matrix.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether both matrices have the same width, height and channel count.
    pub fn same_shape(&self, other: &Mat) -> bool {
        self.shape() == other.shape()
    }

    /// Whether both matrices point at the same sample buffer.
    pub fn shares_data(&self, other: &Mat) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Shared view of the samples.
    pub fn data(&self) -> &MatData {
        &self.data
    }

    /// Mutable view of the samples, copying them first if shared.
    pub fn data_mut(&mut self) -> &mut MatData {
        Arc::make_mut(&mut self.data)
    }

    /// 8-bit samples, if this is a `U8` matrix.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self.data.as_ref() {
            MatData::U8(v) => Some(v),
            MatData::F32(_) => None,
        }
    }

    /// Float samples, if this is an `F32` matrix.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self.data.as_ref() {
            MatData::F32(v) => Some(v),
            MatData::U8(_) => None,
        }
    }

    /// Read a single sample as `f64`.
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> Option<f64> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * self.channels + channel;
        match self.data.as_ref() {
            MatData::U8(v) => v.get(idx).map(|&s| s as f64),
            MatData::F32(v) => v.get(idx).map(|&s| s as f64),
        }
    }

    /// Convert to another depth computing `sample * alpha + beta`.
    ///
    /// Conversion to `U8` rounds and saturates.
    pub fn convert_to(&self, depth: Depth, alpha: f64, beta: f64) -> Mat {
        let scale = |s: f32| (s as f64 * alpha + beta) as f32;
        let data = match (self.data.as_ref(), depth) {
            (MatData::U8(v), Depth::U8) => MatData::U8(v.iter().map(|&s| saturate_u8(scale(s as f32))).collect()),
            (MatData::U8(v), Depth::F32) => MatData::F32(v.iter().map(|&s| scale(s as f32)).collect()),
            (MatData::F32(v), Depth::U8) => MatData::U8(v.iter().map(|&s| saturate_u8(scale(s))).collect()),
            (MatData::F32(v), Depth::F32) => MatData::F32(v.iter().map(|&s| scale(s)).collect()),
        };
        Mat {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: Arc::new(data),
        }
    }

    /// Build a matrix from a decoded image.
    ///
    /// 8-bit and 32-bit float layouts are copied as-is; 16-bit images are
    /// narrowed to 8 bits.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self, MatError> {
        let (width, height) = image.dimensions();
        match image {
            DynamicImage::ImageLuma8(buf) => Self::from_u8(width, height, 1, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => Self::from_u8(width, height, 2, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => Self::from_u8(width, height, 3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => Self::from_u8(width, height, 4, buf.as_raw().clone()),
            DynamicImage::ImageRgb32F(buf) => Self::from_f32(width, height, 3, buf.as_raw().clone()),
            DynamicImage::ImageRgba32F(buf) => Self::from_f32(width, height, 4, buf.as_raw().clone()),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (false, false) => Self::from_u8(width, height, 1, other.to_luma8().into_raw()),
                    (false, true) => Self::from_u8(width, height, 2, other.to_luma_alpha8().into_raw()),
                    (true, false) => Self::from_u8(width, height, 3, other.to_rgb8().into_raw()),
                    (true, true) => Self::from_u8(width, height, 4, other.to_rgba8().into_raw()),
                }
            }
        }
    }

    /// Export to a [`DynamicImage`].
    ///
    /// `U8` matrices with 1-4 channels and `F32` matrices with 3 or 4
    /// channels have a direct layout; anything else has to be converted with
    /// [`Mat::convert_to`] first.
    pub fn to_dynamic(&self) -> Result<DynamicImage, MatError> {
        let (w, h) = (self.width, self.height);
        let image = match (self.data.as_ref(), self.channels) {
            (MatData::U8(v), 1) => image::GrayImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageLuma8),
            (MatData::U8(v), 2) => image::GrayAlphaImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageLumaA8),
            (MatData::U8(v), 3) => image::RgbImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb8),
            (MatData::U8(v), 4) => image::RgbaImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba8),
            (MatData::F32(v), 3) => image::Rgb32FImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgb32F),
            (MatData::F32(v), 4) => image::Rgba32FImage::from_raw(w, h, v.clone()).map(DynamicImage::ImageRgba32F),
            _ => None,
        };
        image.ok_or(MatError::UnsupportedLayout {
            channels: self.channels,
            depth: self.depth(),
        })
    }
}

impl fmt::Display for Mat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mat({}x{}x{} {})", self.width, self.height, self.channels, self.depth())
    }
}
