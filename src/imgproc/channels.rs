//! Channel split and merge.

use super::mat::{Mat, MatData};
use super::MatError;

/// Split an interleaved image into one single-channel image per channel.
pub fn split(src: &Mat) -> Result<Vec<Mat>, MatError> {
    let mut planes = vec![Mat::default(); src.channels()];
    split_into(src, &mut planes)?;
    Ok(planes)
}

/// Split into caller-provided planes, reusing their buffers when possible.
///
/// `planes` must hold exactly one entry per channel of `src`. Each plane is
/// reshaped with [`Mat::create`], so a plane whose samples are not shared
/// with anyone else is overwritten in place.
pub fn split_into(src: &Mat, planes: &mut [Mat]) -> Result<(), MatError> {
    if src.is_empty() {
        return Err(MatError::Empty { operation: "split" });
    }
    let cn = src.channels();
    if planes.len() != cn {
        return Err(MatError::UnsupportedChannels {
            operation: "split",
            channels: cn,
        });
    }

    for (c, plane) in planes.iter_mut().enumerate() {
        plane.create(src.width(), src.height(), 1, src.depth())?;
        match (src.data(), plane.data_mut()) {
            (MatData::U8(s), MatData::U8(d)) => copy_plane(s, d, cn, c),
            (MatData::F32(s), MatData::F32(d)) => copy_plane(s, d, cn, c),
            _ => unreachable!("plane depth matches source after create"),
        }
    }
    Ok(())
}

fn copy_plane<T: Copy>(src: &[T], dst: &mut [T], cn: usize, channel: usize) {
    for (d, s) in dst.iter_mut().zip(src.iter().skip(channel).step_by(cn)) {
        *d = *s;
    }
}

/// Interleave single-channel images of equal size and depth.
pub fn merge(planes: &[Mat]) -> Result<Mat, MatError> {
    let first = planes.first().ok_or(MatError::Empty { operation: "merge" })?;
    if first.is_empty() {
        return Err(MatError::Empty { operation: "merge" });
    }
    for plane in planes {
        if plane.channels() != 1 {
            return Err(MatError::UnsupportedChannels {
                operation: "merge",
                channels: plane.channels(),
            });
        }
        if !plane.same_shape(first) {
            return Err(MatError::ShapeMismatch {
                left: first.shape(),
                right: plane.shape(),
            });
        }
        if plane.depth() != first.depth() {
            return Err(MatError::DepthMismatch {
                left: first.depth(),
                right: plane.depth(),
            });
        }
    }

    let cn = planes.len();
    let mut out = Mat::zeros(first.width(), first.height(), cn, first.depth())?;
    for (c, plane) in planes.iter().enumerate() {
        match (out.data_mut(), plane.data()) {
            (MatData::U8(d), MatData::U8(s)) => interleave(s, d, cn, c),
            (MatData::F32(d), MatData::F32(s)) => interleave(s, d, cn, c),
            _ => unreachable!("depths checked above"),
        }
    }
    Ok(out)
}

fn interleave<T: Copy>(src: &[T], dst: &mut [T], cn: usize, channel: usize) {
    for (d, s) in dst.iter_mut().skip(channel).step_by(cn).zip(src.iter()) {
        *d = *s;
    }
}
