//! Channel splitting node.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{ExecutionError, PortResult};
use crate::core::node::{Category, NodeMetadata, ProcessingNode, StatusCode};
use crate::imgproc::{split_into, Mat};

const OUTPUTS: [&str; 3] = ["out_0", "out_1", "out_2"];

/// Split a three channel image into three single channel images.
///
/// A single channel input is passed to all three outputs. The planes are
/// kept between runs so their buffers can be reused once downstream nodes
/// have released them. This scratch state belongs to the instance, so one
/// instance must not be shared between concurrent pipelines; clone it
/// instead.
#[derive(Debug, Clone, Default)]
pub struct ChannelSplit {
    planes: [Mat; 3],
}

impl ProcessingNode for ChannelSplit {
    fn metadata() -> NodeMetadata {
        NodeMetadata::builder("channel_splitter", "Channel Splitter")
            .description("Split a 3-channel image into its individual channels")
            .category(Category::Channels)
            .tags(["split", "channel", "plane"])
            .build()
    }

    fn declare_ports(
        _params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()> {
        inputs.declare::<Mat>("input", "Image with 1 or 3 channels")?;
        for (i, name) in OUTPUTS.iter().enumerate() {
            outputs.declare::<Mat>(*name, format!("Channel {}", i))?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError> {
        let input = inputs.get::<Mat>("input")?;
        match input.channels() {
            1 => {
                for name in OUTPUTS {
                    outputs.set(name, input.clone())?;
                }
            }
            3 => {
                split_into(input, &mut self.planes)
                    .map_err(|e| ExecutionError::unsupported("channel_splitter", e))?;
                for (name, plane) in OUTPUTS.iter().zip(&self.planes) {
                    outputs.set(name, plane.clone())?;
                }
            }
            n => {
                return Err(ExecutionError::UnsupportedFormat {
                    node: "channel_splitter".to_string(),
                    reason: format!("expected 1 or 3 channels, got {}", n),
                });
            }
        }
        Ok(StatusCode::OK)
    }

    fn reset(&mut self) {
        self.planes = Default::default();
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
    use crate::imgproc::{split, Depth};

    fn splitter() -> NodeInstance {
        let mut node = NodeInstance::of::<ChannelSplit>().unwrap();
        node.configure().unwrap();
        node
    }

    #[test]
    fn test_three_channels_match_split() {
        let img = Mat::from_u8(2, 2, 3, (0..12).collect()).unwrap();
        let mut node = splitter();
        node.bind_input("input", Value::Image(img.clone())).unwrap();
        node.execute().unwrap();

        let expected = split(&img).unwrap();
        for (name, plane) in OUTPUTS.iter().zip(&expected) {
            assert_eq!(node.output_as::<Mat>(name).unwrap(), plane);
        }
    }

    #[test]
    fn test_single_channel_is_replicated() {
        let img = Mat::from_f32(2, 1, 1, vec![0.25, -3.0]).unwrap();
        let mut node = splitter();
        node.bind_input("input", Value::Image(img.clone())).unwrap();
        node.execute().unwrap();
        for name in OUTPUTS {
            let out = node.output_as::<Mat>(name).unwrap();
            assert_eq!(out, &img);
            assert!(out.shares_data(&img));
        }
    }

    #[test]
    fn test_other_channel_counts_write_nothing() {
        for channels in [2, 4] {
            let img = Mat::zeros(2, 2, channels, Depth::U8).unwrap();
            let mut node = splitter();
            node.bind_input("input", Value::Image(img)).unwrap();
            assert!(matches!(
                node.execute(),
                Err(ExecutionError::UnsupportedFormat { .. })
            ));
            assert!(OUTPUTS.iter().all(|name| node.output(name).is_none()));
        }
    }

    #[test]
    fn test_planes_reused_after_release() {
        let mut node = ChannelSplit::default();
        let mut params = PortSet::parameters();
        let mut inputs = PortSet::inputs();
        let mut outputs = PortSet::outputs();
        ChannelSplit::declare_parameters(&mut params).unwrap();
        ChannelSplit::declare_ports(&params, &mut inputs, &mut outputs).unwrap();

        inputs
            .set("input", Mat::from_u8(1, 1, 3, vec![1, 2, 3]).unwrap())
            .unwrap();
        node.process(&inputs, &mut outputs).unwrap();
        outputs.clear_values();

        inputs
            .set("input", Mat::from_u8(1, 1, 3, vec![7, 8, 9]).unwrap())
            .unwrap();
        node.process(&inputs, &mut outputs).unwrap();
        assert_eq!(outputs.get::<Mat>("out_2").unwrap().as_u8().unwrap(), &[9]);
        // outputs still hold the planes, so the next run must not write into them
        let held = outputs.get::<Mat>("out_0").unwrap().clone();
        inputs
            .set("input", Mat::from_u8(1, 1, 3, vec![4, 5, 6]).unwrap())
            .unwrap();
        node.process(&inputs, &mut outputs).unwrap();
        assert_eq!(held.as_u8().unwrap(), &[7]);
        assert_eq!(outputs.get::<Mat>("out_0").unwrap().as_u8().unwrap(), &[4]);

        node.reset();
        assert!(node.planes.iter().all(Mat::is_empty));
    }
}
