//! # imgproc-nodes - Typed Image Processing Nodes
//!
//! A library of image processing nodes for dataflow pipeline runtimes. Each
//! node declares typed parameters and typed input/output ports, is configured
//! once, and then executed any number of times by the host runtime.
//!
//! ## Features
//!
//! - **Typed Ports**: Values are checked against their declarations when a
//!   node reads them
//! - **Explicit Lifecycle**: Declare, configure once, execute many times
//! - **Introspectable Registry**: Every node type exposes a JSON schema
//! - **Parallel Kernels**: Pixel loops run row-parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use imgproc_nodes::prelude::*;
//!
//! let registry = NodeRegistry::global().read();
//!
//! let mut sobel = registry.instantiate("sobel")?;
//! sobel.set_parameter("x", Value::Integer(1))?;
//! sobel.configure()?;
//!
//! let image = Mat::from_dynamic(&image::open("input.png")?)?;
//! sobel.bind_input("input", Value::Image(image))?;
//! sobel.execute()?;
//!
//! let gradient = sobel.output_as::<Mat>("out")?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Values, port declarations, containers, the node trait and errors
//! - [`imgproc`]: The `Mat` image buffer and pixel-level primitives
//! - [`filters`]: Node registry, built-in nodes and the chain runner
//!
//! ## Creating Custom Nodes
//!
//! Implement [`ProcessingNode`](core::node::ProcessingNode) and register the
//! type with [`NodeRegistry::register`](filters::registry::NodeRegistry::register):
//!
//! ```rust,ignore
//! use imgproc_nodes::prelude::*;
//!
//! #[derive(Clone, Default)]
//! struct Threshold { level: f64 }
//!
//! impl ProcessingNode for Threshold {
//!     fn metadata() -> NodeMetadata {
//!         NodeMetadata::builder("threshold", "Threshold")
//!             .category(Category::Adjust)
//!             .build()
//!     }
//!
//!     fn declare_parameters(params: &mut ParameterSet) -> PortResult<()> {
//!         params.declare_with_default("level", 128.0, "Cut-off value")
//!     }
//!
//!     fn declare_ports(_: &ParameterSet, inputs: &mut PortSet, outputs: &mut PortSet) -> PortResult<()> {
//!         inputs.declare::<Mat>("input", "Image")?;
//!         outputs.declare::<Mat>("out", "Binary image")
//!     }
//!
//!     fn configure(&mut self, params: &ParameterSet) -> Result<(), ConfigurationError> {
//!         self.level = *params.get::<f64>("level")?;
//!         Ok(())
//!     }
//!
//!     fn process(&mut self, inputs: &PortSet, outputs: &mut PortSet) -> Result<StatusCode, ExecutionError> {
//!         // ...
//!         Ok(StatusCode::OK)
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn ProcessingNode> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! NodeRegistry::global().write().register::<Threshold>()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod filters;
pub mod imgproc;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use imgproc_nodes::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{PortType, PortValue, Value};

    // Node traits and types
    pub use crate::core::instance::NodeInstance;
    pub use crate::core::node::{Category, NodeMetadata, ProcessingNode, StatusCode};

    // Declarations and containers
    pub use crate::core::context::{ParameterSet, PortSet};
    pub use crate::core::port::{PortDefinition, PortDirection};

    // Errors
    pub use crate::core::error::{
        ConfigurationError, ExecutionError, ExecutionResult, ImgprocError, ImgprocResult, NodeId,
        PortError, PortResult, RegistryError,
    };

    // Image library
    pub use crate::imgproc::{ColorConversion, Depth, Mat, MatError};

    // Registry
    pub use crate::filters::registry::{NodeDescriptor, NodeFactory, NodeRegistry, RegistryBuilder};
    pub use crate::filters::chain::{run_chain, ChainStage};

    // Built-in nodes
    pub use crate::filters::builtin::{
        AbsNormalize, BinaryAdd, ChannelSplit, ColorConvert, GradientFilter, Summable,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
