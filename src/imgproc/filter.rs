//! Directional derivative (Sobel) filtering.

use super::mat::{Depth, Mat, MatData, Sample};
use super::MatError;
use rayon::prelude::*;

/// Largest supported aperture.
pub const MAX_KSIZE: u32 = 31;

/// Separable Sobel kernels `(kx, ky)` for the given derivative orders.
///
/// Order 0 along an axis is the binomial smoothing kernel of the aperture
/// size, so `(dx, dy) = (0, 0)` smooths instead of passing the image
/// through. A `ksize` of 1 means no smoothing: the kernel is `[1]` for
/// order 0 and the 3-tap derivative otherwise.
pub fn sobel_kernels(dx: u32, dy: u32, ksize: u32) -> Result<(Vec<f32>, Vec<f32>), MatError> {
    if ksize % 2 == 0 || ksize > MAX_KSIZE {
        return Err(MatError::InvalidKernel {
            reason: format!("aperture size must be odd and at most {}, got {}", MAX_KSIZE, ksize),
        });
    }
    let kx = deriv_kernel(dx, if ksize == 1 && dx > 0 { 3 } else { ksize })?;
    let ky = deriv_kernel(dy, if ksize == 1 && dy > 0 { 3 } else { ksize })?;
    Ok((kx, ky))
}

fn deriv_kernel(order: u32, ksize: u32) -> Result<Vec<f32>, MatError> {
    if ksize == 1 {
        return Ok(vec![1.0]);
    }
    if order >= ksize {
        return Err(MatError::InvalidKernel {
            reason: format!("derivative order {} must be less than aperture size {}", order, ksize),
        });
    }

    let n = ksize as usize;
    let mut kernel = vec![0i64; n + 1];
    kernel[0] = 1;

    // Smoothing passes: convolve with [1, 1].
    for _ in 0..(n - order as usize - 1) {
        let mut prev = kernel[0];
        for j in 1..=n {
            let next = kernel[j] + kernel[j - 1];
            kernel[j - 1] = prev;
            prev = next;
        }
    }

    // Differencing passes: convolve with [-1, 1].
    for _ in 0..order {
        let mut prev = -kernel[0];
        for j in 1..=n {
            let next = kernel[j - 1] - kernel[j];
            kernel[j - 1] = prev;
            prev = next;
        }
    }

    Ok(kernel[..n].iter().map(|&v| v as f32).collect())
}

/// Reflect-101 border: `gfedcb|abcdefgh|gfedcba`.
#[inline]
fn reflect_101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let i = i.rem_euclid(period);
    if i >= len as isize {
        (period - i) as usize
    } else {
        i as usize
    }
}

/// Compute the `(dx, dy)` directional derivative of `src`.
///
/// Every channel is filtered independently with the separable kernels from
/// [`sobel_kernels`], as a correlation with reflect-101 borders. The result
/// has depth `ddepth`; `U8` output is rounded and saturated.
pub fn sobel(src: &Mat, ddepth: Depth, dx: u32, dy: u32, ksize: u32) -> Result<Mat, MatError> {
    if src.is_empty() {
        return Err(MatError::Empty { operation: "sobel" });
    }
    let (kx, ky) = sobel_kernels(dx, dy, ksize)?;

    let filtered = match src.data() {
        MatData::U8(samples) => correlate(samples, src, &kx, &ky),
        MatData::F32(samples) => correlate(samples, src, &kx, &ky),
    };

    let out = Mat::from_f32(src.width(), src.height(), src.channels(), filtered)?;
    Ok(match ddepth {
        Depth::F32 => out,
        Depth::U8 => out.convert_to(Depth::U8, 1.0, 0.0),
    })
}

fn correlate<T: Sample>(samples: &[T], shape: &Mat, kx: &[f32], ky: &[f32]) -> Vec<f32> {
    let width = shape.width() as usize;
    let height = shape.height() as usize;
    let cn = shape.channels();
    let row_len = width * cn;
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut horizontal = vec![0.0f32; samples.len()];
    horizontal
        .par_chunks_mut(row_len)
        .zip(samples.par_chunks(row_len))
        .for_each(|(out_row, in_row)| {
            for x in 0..width {
                for c in 0..cn {
                    let mut acc = 0.0f32;
                    for (i, &k) in kx.iter().enumerate() {
                        let sx = reflect_101(x as isize + i as isize - rx, width);
                        acc += k * in_row[sx * cn + c].to_f32();
                    }
                    out_row[x * cn + c] = acc;
                }
            }
        });

    let mut out = vec![0.0f32; samples.len()];
    out.par_chunks_mut(row_len).enumerate().for_each(|(y, out_row)| {
        for (j, &k) in ky.iter().enumerate() {
            let sy = reflect_101(y as isize + j as isize - ry, height);
            let src_row = &horizontal[sy * row_len..(sy + 1) * row_len];
            for (o, &s) in out_row.iter_mut().zip(src_row) {
                *o += k * s;
            }
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels_match_known_taps() {
        let (kx, ky) = sobel_kernels(1, 0, 3).unwrap();
        assert_eq!(kx, vec![-1.0, 0.0, 1.0]);
        assert_eq!(ky, vec![1.0, 2.0, 1.0]);

        let (kx, _) = sobel_kernels(2, 0, 3).unwrap();
        assert_eq!(kx, vec![1.0, -2.0, 1.0]);

        let (kx, ky) = sobel_kernels(1, 0, 5).unwrap();
        assert_eq!(kx, vec![-1.0, -2.0, 0.0, 2.0, 1.0]);
        assert_eq!(ky, vec![1.0, 4.0, 6.0, 4.0, 1.0]);

        let (kx, ky) = sobel_kernels(1, 0, 1).unwrap();
        assert_eq!(kx, vec![-1.0, 0.0, 1.0]);
        assert_eq!(ky, vec![1.0]);
    }

    #[test]
    fn test_invalid_kernels() {
        assert!(sobel_kernels(0, 0, 4).is_err());
        assert!(sobel_kernels(0, 0, 33).is_err());
        assert!(sobel_kernels(3, 0, 3).is_err());
        assert!(sobel_kernels(0, 5, 5).is_err());
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 4), 1);
        assert_eq!(reflect_101(-2, 4), 2);
        assert_eq!(reflect_101(4, 4), 2);
        assert_eq!(reflect_101(2, 4), 2);
        assert_eq!(reflect_101(-3, 1), 0);
    }

    #[test]
    fn test_horizontal_ramp() {
        // f(x) = 10x, so every interior response is (f(x+1) - f(x-1)) * 4 = 80.
        let data: Vec<u8> = (0..5).flat_map(|_| (0..5).map(|x| x * 10)).collect();
        let src = Mat::from_u8(5, 5, 1, data).unwrap();
        let gx = sobel(&src, Depth::F32, 1, 0, 3).unwrap();
        assert_eq!(gx.depth(), Depth::F32);
        for y in 0..5 {
            for x in 1..4 {
                assert_eq!(gx.sample(x, y, 0), Some(80.0));
            }
            // reflect-101 mirrors the neighbour, so the edges cancel out
            assert_eq!(gx.sample(0, y, 0), Some(0.0));
        }

        let gy = sobel(&src, Depth::F32, 0, 1, 3).unwrap();
        assert!(gy.as_f32().unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_order_smooths_constant_image() {
        let src = Mat::filled(4, 3, 2, Depth::F32, 1.5).unwrap();
        let out = sobel(&src, Depth::F32, 0, 0, 3).unwrap();
        assert!(out.as_f32().unwrap().iter().all(|&v| v == 24.0));
    }

    #[test]
    fn test_u8_output_saturates() {
        let data: Vec<u8> = (0..3).flat_map(|_| [0u8, 200, 0]).collect();
        let src = Mat::from_u8(3, 3, 1, data).unwrap();
        let out = sobel(&src, Depth::U8, 2, 0, 3).unwrap();
        assert_eq!(out.depth(), Depth::U8);
        // center: (0 - 400 + 0) * 4 -> saturates at 0; edges: (200 - 0 + 200) * 4 -> 255
        assert_eq!(out.sample(1, 1, 0), Some(0.0));
        assert_eq!(out.sample(0, 1, 0), Some(255.0));
    }
}
