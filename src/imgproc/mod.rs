//! Pixel-level image processing primitives.
//!
//! This module is the numeric layer that the processing nodes call into. It
//! follows the OpenCV calling conventions (conversion codes, Sobel kernels,
//! reflect-101 borders, saturating 8-bit arithmetic) so node behaviour can be
//! checked against a direct call with the same arguments.
//!
//! Nodes never reach into [`Mat`] internals; everything they need is exposed
//! through the free functions re-exported here.

mod arithm;
mod channels;
mod color;
mod filter;
mod mat;

pub use arithm::{abs, add, norm_inf};
pub use channels::{merge, split, split_into};
pub use color::{cvt_color, ColorConversion};
pub use filter::{sobel, sobel_kernels, MAX_KSIZE};
pub use mat::{Depth, Mat, MatData};

use thiserror::Error;

/// Errors raised by the image processing primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatError {
    #[error("Invalid dimensions {width}x{height}x{channels}: expected {expected} samples, got {got}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        channels: usize,
        expected: usize,
        got: usize,
    },

    #[error("Operation '{operation}' received an empty image")]
    Empty { operation: &'static str },

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (u32, u32, usize),
        right: (u32, u32, usize),
    },

    #[error("Depth mismatch: {left} vs {right}")]
    DepthMismatch { left: Depth, right: Depth },

    #[error("Operation '{operation}' does not support {channels} channel(s)")]
    UnsupportedChannels {
        operation: &'static str,
        channels: usize,
    },

    #[error("No image layout for {channels} channel(s) of depth {depth}")]
    UnsupportedLayout { channels: usize, depth: Depth },

    #[error("Invalid kernel: {reason}")]
    InvalidKernel { reason: String },
}
