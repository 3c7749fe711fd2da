//! Element-wise arithmetic and norms.

use super::mat::{Mat, MatData};
use super::MatError;
use rayon::prelude::*;

/// Element-wise `a + b`. 8-bit samples saturate at 255.
pub fn add(a: &Mat, b: &Mat) -> Result<Mat, MatError> {
    if a.is_empty() || b.is_empty() {
        return Err(MatError::Empty { operation: "add" });
    }
    if !a.same_shape(b) {
        return Err(MatError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }
    let data = match (a.data(), b.data()) {
        (MatData::U8(x), MatData::U8(y)) => {
            MatData::U8(x.par_iter().zip(y.par_iter()).map(|(&p, &q)| p.saturating_add(q)).collect())
        }
        (MatData::F32(x), MatData::F32(y)) => {
            MatData::F32(x.par_iter().zip(y.par_iter()).map(|(&p, &q)| p + q).collect())
        }
        _ => {
            return Err(MatError::DepthMismatch {
                left: a.depth(),
                right: b.depth(),
            })
        }
    };
    Mat::from_data(a.width(), a.height(), a.channels(), data)
}

/// Element-wise absolute value. Unsigned input is returned unchanged.
pub fn abs(src: &Mat) -> Mat {
    match src.data() {
        MatData::U8(_) => src.clone(),
        MatData::F32(_) => {
            let mut out = src.clone();
            if let MatData::F32(v) = out.data_mut() {
                v.par_iter_mut().for_each(|s| *s = s.abs());
            }
            out
        }
    }
}

/// Infinity norm: the largest absolute sample, over all channels.
///
/// Returns 0 for the empty matrix and NaN if any sample is NaN.
pub fn norm_inf(src: &Mat) -> f64 {
    let pick = |a: f64, b: f64| if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) };
    match src.data() {
        MatData::U8(v) => v.par_iter().map(|&s| s as f64).reduce(|| 0.0, pick),
        MatData::F32(v) => v.par_iter().map(|&s| (s as f64).abs()).reduce(|| 0.0, pick),
    }
}
