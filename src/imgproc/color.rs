//! Color space conversion.

use super::mat::{Mat, MatData, Sample};
use super::MatError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Supported color conversions, numbered like OpenCV's `COLOR_*` codes.
///
/// Several OpenCV names share a code because the operation is symmetric
/// (`BGR2RGB` and `RGB2BGR` are both a red/blue swap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorConversion {
    /// BGR2BGRA / RGB2RGBA
    AddAlpha,
    /// BGRA2BGR / RGBA2RGB
    DropAlpha,
    /// BGR2RGBA / RGB2BGRA
    SwapRbAddAlpha,
    /// RGBA2BGR / BGRA2RGB
    SwapRbDropAlpha,
    /// BGR2RGB / RGB2BGR
    SwapRb,
    /// BGRA2RGBA / RGBA2BGRA
    SwapRbKeepAlpha,
    BgrToGray,
    RgbToGray,
    /// GRAY2BGR / GRAY2RGB
    GrayToBgr,
    /// GRAY2BGRA / GRAY2RGBA
    GrayToBgra,
    BgraToGray,
    RgbaToGray,
    BgrToLab,
    RgbToLab,
}

impl ColorConversion {
    /// RGB to single channel luminance.
    pub const RGB2GRAY: i64 = 7;
    /// Red/blue channel swap.
    pub const RGB2BGR: i64 = 4;
    /// RGB to CIE L*a*b*.
    pub const RGB2LAB: i64 = 45;
    /// BGR to CIE L*a*b*.
    pub const BGR2LAB: i64 = 44;

    /// Every supported conversion, in code order.
    pub const ALL: [ColorConversion; 14] = [
        ColorConversion::AddAlpha,
        ColorConversion::DropAlpha,
        ColorConversion::SwapRbAddAlpha,
        ColorConversion::SwapRbDropAlpha,
        ColorConversion::SwapRb,
        ColorConversion::SwapRbKeepAlpha,
        ColorConversion::BgrToGray,
        ColorConversion::RgbToGray,
        ColorConversion::GrayToBgr,
        ColorConversion::GrayToBgra,
        ColorConversion::BgraToGray,
        ColorConversion::RgbaToGray,
        ColorConversion::BgrToLab,
        ColorConversion::RgbToLab,
    ];

    /// Look up a conversion by its numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Numeric code of this conversion.
    pub fn code(&self) -> i64 {
        match self {
            ColorConversion::AddAlpha => 0,
            ColorConversion::DropAlpha => 1,
            ColorConversion::SwapRbAddAlpha => 2,
            ColorConversion::SwapRbDropAlpha => 3,
            ColorConversion::SwapRb => 4,
            ColorConversion::SwapRbKeepAlpha => 5,
            ColorConversion::BgrToGray => 6,
            ColorConversion::RgbToGray => 7,
            ColorConversion::GrayToBgr => 8,
            ColorConversion::GrayToBgra => 9,
            ColorConversion::BgraToGray => 10,
            ColorConversion::RgbaToGray => 11,
            ColorConversion::BgrToLab => 44,
            ColorConversion::RgbToLab => 45,
        }
    }

    /// OpenCV-style name.
    pub fn name(&self) -> &'static str {
        match self {
            ColorConversion::AddAlpha => "BGR2BGRA",
            ColorConversion::DropAlpha => "BGRA2BGR",
            ColorConversion::SwapRbAddAlpha => "BGR2RGBA",
            ColorConversion::SwapRbDropAlpha => "RGBA2BGR",
            ColorConversion::SwapRb => "RGB2BGR",
            ColorConversion::SwapRbKeepAlpha => "BGRA2RGBA",
            ColorConversion::BgrToGray => "BGR2GRAY",
            ColorConversion::RgbToGray => "RGB2GRAY",
            ColorConversion::GrayToBgr => "GRAY2BGR",
            ColorConversion::GrayToBgra => "GRAY2BGRA",
            ColorConversion::BgraToGray => "BGRA2GRAY",
            ColorConversion::RgbaToGray => "RGBA2GRAY",
            ColorConversion::BgrToLab => "BGR2LAB",
            ColorConversion::RgbToLab => "RGB2LAB",
        }
    }

    /// Whether the conversion accepts an input with `channels` channels.
    pub fn accepts(&self, channels: usize) -> bool {
        match self {
            ColorConversion::AddAlpha | ColorConversion::SwapRbAddAlpha => channels == 3,
            ColorConversion::DropAlpha
            | ColorConversion::SwapRbDropAlpha
            | ColorConversion::SwapRbKeepAlpha => channels == 4,
            ColorConversion::GrayToBgr | ColorConversion::GrayToBgra => channels == 1,
            ColorConversion::SwapRb
            | ColorConversion::BgrToGray
            | ColorConversion::RgbToGray
            | ColorConversion::BgraToGray
            | ColorConversion::RgbaToGray
            | ColorConversion::BgrToLab
            | ColorConversion::RgbToLab => channels == 3 || channels == 4,
        }
    }

    /// Number of channels produced.
    pub fn output_channels(&self) -> usize {
        match self {
            ColorConversion::AddAlpha
            | ColorConversion::SwapRbAddAlpha
            | ColorConversion::SwapRbKeepAlpha
            | ColorConversion::GrayToBgra => 4,
            ColorConversion::DropAlpha
            | ColorConversion::SwapRbDropAlpha
            | ColorConversion::SwapRb
            | ColorConversion::GrayToBgr
            | ColorConversion::BgrToLab
            | ColorConversion::RgbToLab => 3,
            ColorConversion::BgrToGray
            | ColorConversion::RgbToGray
            | ColorConversion::BgraToGray
            | ColorConversion::RgbaToGray => 1,
        }
    }

    /// Human-readable list of the commonly used codes.
    pub fn documented_codes() -> String {
        format!(
            " RGB2GRAY = {}\n RGB2BGR = {}\n RGB2LAB = {}\n BGR2LAB = {}",
            Self::RGB2GRAY,
            Self::RGB2BGR,
            Self::RGB2LAB,
            Self::BGR2LAB
        )
    }
}

/// Convert the color representation of `src`.
///
/// The output keeps the depth of the input. 8-bit gray values are rounded;
/// 8-bit Lab is encoded as `L*255/100, a+128, b+128`, while float input is
/// expected in [0, 1] and yields raw L*a*b*.
pub fn cvt_color(src: &Mat, code: ColorConversion) -> Result<Mat, MatError> {
    if src.is_empty() {
        return Err(MatError::Empty { operation: code.name() });
    }
    let scn = src.channels();
    if !code.accepts(scn) {
        return Err(MatError::UnsupportedChannels {
            operation: code.name(),
            channels: scn,
        });
    }
    let dcn = code.output_channels();
    let width = src.width() as usize;

    let data = match src.data() {
        MatData::U8(samples) => MatData::U8(convert_pixels(samples, width, scn, dcn, code)),
        MatData::F32(samples) => MatData::F32(convert_pixels(samples, width, scn, dcn, code)),
    };
    Mat::from_data(src.width(), src.height(), dcn, data)
}

fn convert_pixels<T: Sample>(
    src: &[T],
    width: usize,
    scn: usize,
    dcn: usize,
    code: ColorConversion,
) -> Vec<T> {
    let mut dst = vec![T::default(); src.len() / scn * dcn];
    dst.par_chunks_mut(width * dcn)
        .zip(src.par_chunks(width * scn))
        .for_each(|(drow, srow)| {
            for (d, s) in drow.chunks_exact_mut(dcn).zip(srow.chunks_exact(scn)) {
                convert_pixel(s, d, code);
            }
        });
    dst
}

#[inline]
fn convert_pixel<T: Sample>(s: &[T], d: &mut [T], code: ColorConversion) {
    match code {
        ColorConversion::AddAlpha => {
            d[..3].copy_from_slice(&s[..3]);
            d[3] = T::OPAQUE;
        }
        ColorConversion::DropAlpha => d.copy_from_slice(&s[..3]),
        ColorConversion::SwapRbAddAlpha => {
            swap_rb(s, d);
            d[3] = T::OPAQUE;
        }
        ColorConversion::SwapRbDropAlpha | ColorConversion::SwapRb => swap_rb(s, d),
        ColorConversion::SwapRbKeepAlpha => {
            swap_rb(s, d);
            d[3] = s[3];
        }
        ColorConversion::BgrToGray | ColorConversion::BgraToGray => d[0] = gray(s[2], s[1], s[0]),
        ColorConversion::RgbToGray | ColorConversion::RgbaToGray => d[0] = gray(s[0], s[1], s[2]),
        ColorConversion::GrayToBgr => d.fill(s[0]),
        ColorConversion::GrayToBgra => {
            d[..3].fill(s[0]);
            d[3] = T::OPAQUE;
        }
        ColorConversion::BgrToLab => d.copy_from_slice(&T::encode_lab(lab(s[2], s[1], s[0]))),
        ColorConversion::RgbToLab => d.copy_from_slice(&T::encode_lab(lab(s[0], s[1], s[2]))),
    }
}

#[inline]
fn swap_rb<T: Sample>(s: &[T], d: &mut [T]) {
    d[0] = s[2];
    d[1] = s[1];
    d[2] = s[0];
}

#[inline]
fn gray<T: Sample>(r: T, g: T, b: T) -> T {
    T::from_f32(0.299 * r.to_f32() + 0.587 * g.to_f32() + 0.114 * b.to_f32())
}

// D65 reference white
const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;
const LAB_EPSILON: f32 = 0.008856;

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab<T: Sample>(r: T, g: T, b: T) -> [f32; 3] {
    let r = srgb_to_linear(r.to_unit());
    let g = srgb_to_linear(g.to_unit());
    let b = srgb_to_linear(b.to_unit());

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

    let l = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    let fy = lab_f(y);
    [l, 500.0 * (lab_f(x) - fy), 200.0 * (fy - lab_f(z))]
}
