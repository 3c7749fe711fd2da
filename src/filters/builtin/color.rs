//! Color space conversion node.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{ConfigurationError, ExecutionError, PortResult};
use crate::core::node::{Category, NodeMetadata, ProcessingNode, StatusCode};
use crate::imgproc::{cvt_color, ColorConversion, Mat};

/// Convert an image between color representations.
///
/// The `flag` parameter takes OpenCV conversion codes; see
/// [`ColorConversion`] for the supported set.
#[derive(Debug, Clone)]
pub struct ColorConvert {
    conversion: ColorConversion,
}

impl Default for ColorConvert {
    fn default() -> Self {
        Self {
            conversion: ColorConversion::SwapRb,
        }
    }
}

impl ProcessingNode for ColorConvert {
    fn metadata() -> NodeMetadata {
        NodeMetadata::builder("cvt_color", "Color Convert")
            .description("Convert an image from one color space to another")
            .category(Category::Color)
            .tags(["color", "gray", "lab", "bgr", "rgb"])
            .build()
    }

    fn declare_parameters(params: &mut ParameterSet) -> PortResult<()> {
        params.declare_with_default(
            "flag",
            ColorConversion::RGB2BGR,
            format!(
                "Conversion code. Common values:\n{}",
                ColorConversion::documented_codes()
            ),
        )
    }

    fn declare_ports(
        _params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()> {
        inputs.declare::<Mat>("input", "Image to convert")?;
        outputs.declare::<Mat>("out", "Converted image")
    }

    fn configure(&mut self, params: &ParameterSet) -> Result<(), ConfigurationError> {
        let code = *params.get::<i64>("flag")?;
        self.conversion =
            ColorConversion::from_code(code).ok_or_else(|| ConfigurationError::InvalidValue {
                parameter: "flag".to_string(),
                reason: format!("unsupported color conversion code {}", code),
            })?;
        Ok(())
    }

    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError> {
        let input = inputs.get::<Mat>("input")?;
        let out = cvt_color(input, self.conversion)
            .map_err(|e| ExecutionError::unsupported("cvt_color", e))?;
        outputs.set("out", out)?;
        Ok(StatusCode::OK)
    }

    fn clone_box(&self) -> Box<dyn ProcessingNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::NodeInstance;
    use crate::core::types::Value;
    use crate::imgproc::Depth;

    fn rgb_image() -> Mat {
        Mat::from_u8(2, 2, 3, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 200, 100, 0]).unwrap()
    }

    fn run(code: i64, input: &Mat) -> Result<Mat, ExecutionError> {
        let mut node = NodeInstance::of::<ColorConvert>().unwrap();
        node.set_parameter("flag", Value::Integer(code)).unwrap();
        node.configure().unwrap();
        node.bind_input("input", Value::Image(input.clone())).unwrap();
        node.execute()?;
        Ok(node.output_as::<Mat>("out").unwrap().clone())
    }

    #[test]
    fn test_default_flag_swaps_red_and_blue() {
        let mut node = NodeInstance::of::<ColorConvert>().unwrap();
        node.configure().unwrap();
        node.bind_input("input", Value::Image(rgb_image())).unwrap();
        node.execute().unwrap();
        let out = node.output_as::<Mat>("out").unwrap();
        assert_eq!(&out.as_u8().unwrap()[..3], &[30, 20, 10]);
    }

    #[test]
    fn test_matches_direct_call_for_every_code() {
        let rgb = rgb_image();
        let rgba = ColorConversion::from_code(0)
            .map(|c| cvt_color(&rgb, c).unwrap())
            .unwrap();
        let gray = Mat::from_u8(2, 2, 1, vec![0, 64, 128, 255]).unwrap();

        for conversion in ColorConversion::ALL {
            let input = [&gray, &rgb, &rgba]
                .into_iter()
                .find(|m| conversion.accepts(m.channels()))
                .unwrap();
            let expected = cvt_color(input, conversion).unwrap();
            assert_eq!(run(conversion.code(), input).unwrap(), expected, "{}", conversion.name());
        }
    }

    #[test]
    fn test_unknown_code_rejected_at_configure() {
        let mut node = NodeInstance::of::<ColorConvert>().unwrap();
        node.set_parameter("flag", Value::Integer(999)).unwrap();
        assert!(matches!(
            node.configure(),
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_wrong_channel_count() {
        let two = Mat::zeros(2, 2, 2, Depth::U8).unwrap();
        assert!(matches!(
            run(ColorConversion::RGB2GRAY, &two),
            Err(ExecutionError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_input_type_checked_on_access() {
        let mut node = NodeInstance::of::<ColorConvert>().unwrap();
        node.configure().unwrap();
        node.bind_input("input", Value::Float(1.0)).unwrap();
        assert!(matches!(
            node.execute(),
            Err(ExecutionError::TypeMismatch { .. })
        ));
    }
}
