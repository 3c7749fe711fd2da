//! Core types and traits for imgproc-nodes.
//!
//! This module contains the foundational types every node is built from:
//! - Value types (Image, Integer, Float, etc.)
//! - Port and parameter declarations
//! - Typed slot containers
//! - The node trait, metadata and instance driver
//! - Error types

pub mod types;
pub mod port;
pub mod error;
pub mod context;
pub mod node;
pub mod instance;

// Re-export commonly used types
pub use types::{Value, PortType, PortValue};
pub use port::{PortDefinition, PortDirection};
pub use error::{
    ImgprocError, PortError, ConfigurationError, ExecutionError, RegistryError, NodeId,
};
pub use context::{PortSet, ParameterSet};
pub use node::{ProcessingNode, NodeMetadata, Category, StatusCode};
pub use instance::NodeInstance;
