//! Built-in node implementations.
//!
//! This module contains the standard nodes that ship with imgproc-nodes.

mod arithm;
mod channels;
mod color;
mod gradient;

use crate::core::error::RegistryError;
use crate::filters::registry::NodeRegistry;
use crate::imgproc::Mat;

/// Register all built-in nodes.
pub fn register_all(registry: &mut NodeRegistry) -> Result<(), RegistryError> {
    registry.register::<ColorConvert>()?;
    registry.register::<ChannelSplit>()?;
    registry.register::<GradientFilter>()?;
    registry.register::<BinaryAdd<Mat>>()?;
    registry.register::<BinaryAdd<f64>>()?;
    registry.register::<BinaryAdd<i64>>()?;
    registry.register::<AbsNormalize>()?;
    Ok(())
}

// Re-export for direct access
pub use arithm::{AbsNormalize, BinaryAdd, Summable};
pub use channels::ChannelSplit;
pub use color::ColorConvert;
pub use gradient::GradientFilter;
