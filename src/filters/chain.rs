//! Linear image chains.
//!
//! A chain runs registered single-image nodes one after another, feeding
//! each node's `out` into the next node's `input`. It is the smallest
//! driver needed to push an image through a few nodes, as the CLI does.

use crate::core::error::{ImgprocError, ImgprocResult};
use crate::core::types::Value;
use crate::filters::registry::NodeRegistry;
use crate::imgproc::Mat;

/// Input port every chain stage reads.
pub const CHAIN_INPUT: &str = "input";
/// Output port every chain stage writes.
pub const CHAIN_OUTPUT: &str = "out";

/// One node of a chain together with its parameter bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStage {
    /// Registered node id.
    pub node: String,
    /// Parameters bound before `configure`, in order.
    pub parameters: Vec<(String, Value)>,
}

impl ChainStage {
    /// Stage running `node` with its default parameters.
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind a parameter. A later binding of the same name wins.
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.push((name.into(), value));
        self
    }
}

/// Run `input` through `stages` in order and return the last output.
///
/// Every stage is instantiated from `registry`, configured, executed once
/// and dropped. An empty chain returns the input unchanged.
pub fn run_chain(registry: &NodeRegistry, stages: &[ChainStage], input: Mat) -> ImgprocResult<Mat> {
    let mut current = input;

    for stage in stages {
        let mut node = registry.instantiate(&stage.node)?;
        for (name, value) in &stage.parameters {
            node.set_parameter(name, value.clone())?;
        }
        node.configure()?;
        node.bind_input(CHAIN_INPUT, Value::Image(current))?;
        node.execute()?;

        current = match node.take_output(CHAIN_OUTPUT) {
            Some(Value::Image(mat)) => mat,
            Some(other) => {
                return Err(ImgprocError::Other(format!(
                    "node '{}' wrote {} to '{}', expected an image",
                    stage.node,
                    other.get_type(),
                    CHAIN_OUTPUT
                )))
            }
            None => {
                return Err(ImgprocError::Other(format!(
                    "node '{}' did not write '{}'",
                    stage.node, CHAIN_OUTPUT
                )))
            }
        };
        log::debug!("{} -> {}", stage.node, current);
    }

    Ok(current)
}
