//! Directional derivative node.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{ConfigurationError, ExecutionError, PortResult};
use crate::core::node::{Category, NodeMetadata, ProcessingNode, StatusCode};
use crate::imgproc::{sobel, sobel_kernels, Depth, Mat, MAX_KSIZE};

/// Sobel derivative of order (`x`, `y`) with a `ksize` aperture.
///
/// Output is always 32-bit float. Order 0 along an axis smooths with the
/// binomial kernel, so the default `x = 0, y = 0` is a smoothing filter.
#[derive(Debug, Clone)]
pub struct GradientFilter {
    dx: u32,
    dy: u32,
    ksize: u32,
}

impl Default for GradientFilter {
    fn default() -> Self {
        Self { dx: 0, dy: 0, ksize: 3 }
    }
}

fn non_negative(params: &ParameterSet, name: &str) -> Result<u32, ConfigurationError> {
    let value = *params.get::<i64>(name)?;
    u32::try_from(value).map_err(|_| ConfigurationError::InvalidValue {
        parameter: name.to_string(),
        reason: format!("must be between 0 and {}, got {}", u32::MAX, value),
    })
}

impl ProcessingNode for GradientFilter {
    fn metadata() -> NodeMetadata {
        NodeMetadata::builder("sobel", "Sobel")
            .description("Image derivative along x and y using separable Sobel kernels")
            .category(Category::Edge)
            .tags(["sobel", "gradient", "derivative", "edge"])
            .build()
    }

    fn declare_parameters(params: &mut ParameterSet) -> PortResult<()> {
        params.declare_with_default("x", 0i64, "Order of the derivative along x")?;
        params.declare_with_default("y", 0i64, "Order of the derivative along y")?;
        params.declare_with_default(
            "ksize",
            3i64,
            format!("Aperture size: odd, at most {}", MAX_KSIZE),
        )
    }

    fn declare_ports(
        _params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()> {
        inputs.declare::<Mat>("input", "Image to differentiate")?;
        outputs.declare::<Mat>("out", "Derivative image (f32)")
    }

    fn configure(&mut self, params: &ParameterSet) -> Result<(), ConfigurationError> {
        let dx = non_negative(params, "x")?;
        let dy = non_negative(params, "y")?;
        let ksize = non_negative(params, "ksize")?;
        // Aperture first, then each order against it.
        for (parameter, dx, dy) in [("ksize", 0, 0), ("x", dx, 0), ("y", 0, dy)] {
            sobel_kernels(dx, dy, ksize).map_err(|e| ConfigurationError::InvalidValue {
                parameter: parameter.to_string(),
                reason: e.to_string(),
            })?;
        }
        *self = Self { dx, dy, ksize };
        Ok(())
    }

    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError> {
        let input = inputs.get::<Mat>("input")?;
        let out = sobel(input, Depth::F32, self.dx, self.dy, self.ksize)
            .map_err(|e| ExecutionError::unsupported("sobel", e))?;
        outputs.set("out", out)?;
        Ok(StatusCode::OK)
    }

    fn clone_box(&self) -> Box<dyn ProcessingNode> {
        Box::new(self.clone())
    }
}
