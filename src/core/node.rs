//! ProcessingNode trait and node metadata.
//!
//! A processing node goes through four phases: it declares its parameters
//! (once per node type), declares its ports from those parameters, is
//! configured once per instance, and then processes any number of times.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{ConfigurationError, ExecutionError, PortResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category for organizing node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Color space conversions
    Color,
    /// Channel split and merge
    Channels,
    /// Edge detection and gradients
    Edge,
    /// Arithmetic
    Math,
    /// Normalization and value mapping
    Adjust,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    #[default]
    Custom,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Color => "Color",
            Category::Channels => "Channels",
            Category::Edge => "Edge",
            Category::Math => "Math",
            Category::Adjust => "Adjust",
            Category::Utility => "Utility",
            Category::Custom => "Custom",
        }
    }

    /// Get all categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Color,
            Category::Channels,
            Category::Edge,
            Category::Math,
            Category::Adjust,
            Category::Utility,
            Category::Custom,
        ]
    }
}

/// Result code returned by a successful [`ProcessingNode::process`].
///
/// Zero means success. Nonzero codes are reserved for the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Unique identifier for this node type (e.g., "cvt_color")
    pub id: String,
    /// Human-readable name (e.g., "Color Convert")
    pub name: String,
    /// Category for organization
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Version string
    pub version: String,
    /// Author or source
    pub author: String,
    /// Searchable tags
    pub tags: Vec<String>,
}

impl NodeMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> NodeMetadataBuilder {
        NodeMetadataBuilder::new(id, name)
    }
}

/// Builder for NodeMetadata.
pub struct NodeMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    version: String,
    author: String,
    tags: Vec<String>,
}

impl NodeMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::Custom,
            description: String::new(),
            version: crate::VERSION.to_string(),
            author: crate::NAME.to_string(),
            tags: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Add a tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add multiple tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(|t| t.into()));
        self
    }

    /// Build the metadata.
    pub fn build(self) -> NodeMetadata {
        NodeMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            version: self.version,
            author: self.author,
            tags: self.tags,
        }
    }
}

/// The core trait for processing nodes.
///
/// # Lifecycle
///
/// 1. [`declare_parameters`](Self::declare_parameters) runs once per node
///    type, before any instance exists.
/// 2. [`declare_ports`](Self::declare_ports) builds the input and output
///    sets from the declared parameters. It must give the same result every
///    time it is called.
/// 3. [`configure`](Self::configure) reads bound parameter values (or their
///    defaults) and caches what `process` needs. Called exactly once.
/// 4. [`process`](Self::process) reads inputs and writes outputs, using only
///    configure-time state and the current inputs.
///
/// # Thread Safety
///
/// Nodes are `Send` so they can move between worker threads. `process`
/// takes `&mut self`, so one instance never runs twice at the same time;
/// parallel pipelines clone instances with [`clone_box`](Self::clone_box).
///
/// # Example Implementation
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct Invert;
///
/// impl ProcessingNode for Invert {
///     fn metadata() -> NodeMetadata {
///         NodeMetadata::builder("invert", "Invert")
///             .category(Category::Adjust)
///             .build()
///     }
///
///     fn declare_ports(_: &ParameterSet, inputs: &mut PortSet, outputs: &mut PortSet) -> PortResult<()> {
///         inputs.declare::<Mat>("input", "Image to invert")?;
///         outputs.declare::<Mat>("out", "Inverted image")
///     }
///
///     fn process(&mut self, inputs: &PortSet, outputs: &mut PortSet) -> Result<StatusCode, ExecutionError> {
///         let img = inputs.get::<Mat>("input")?;
///         outputs.set("out", img.convert_to(img.depth(), -1.0, 255.0))?;
///         Ok(StatusCode::OK)
///     }
///
///     fn clone_box(&self) -> Box<dyn ProcessingNode> {
///         Box::new(self.clone())
///     }
/// }
/// ```
pub trait ProcessingNode: Send {
    /// Static description of the node type.
    fn metadata() -> NodeMetadata
    where
        Self: Sized;

    /// Declare the node's parameters. Every parameter needs a default.
    fn declare_parameters(_params: &mut ParameterSet) -> PortResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }

    /// Declare input and output ports.
    fn declare_ports(
        params: &ParameterSet,
        inputs: &mut PortSet,
        outputs: &mut PortSet,
    ) -> PortResult<()>
    where
        Self: Sized;

    /// Read and cache parameter values.
    fn configure(&mut self, _params: &ParameterSet) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Run the node on the current inputs.
    fn process(
        &mut self,
        inputs: &PortSet,
        outputs: &mut PortSet,
    ) -> Result<StatusCode, ExecutionError>;

    /// Drop any scratch state kept between executions.
    fn reset(&mut self) {}

    /// Clone this node into a boxed trait object.
    fn clone_box(&self) -> Box<dyn ProcessingNode>;
}

impl Clone for Box<dyn ProcessingNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
