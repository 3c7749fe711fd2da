//! Error types for imgproc-nodes.
//!
//! Uses thiserror for structured errors with context. Each lifecycle phase
//! has its own enum so callers can tell a bad declaration from a bad
//! configuration from a failed execution.

use crate::core::types::PortType;
use crate::imgproc::MatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type.
///
/// Encompasses all error categories and enables `?` across phases.
#[derive(Error, Debug)]
pub enum ImgprocError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Matrix error: {0}")]
    Mat(#[from] MatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors from declaring and accessing port or parameter slots.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortError {
    #[error("Port '{port}' is not declared")]
    UnknownPort { port: String },

    #[error("Port '{port}' is already declared")]
    DuplicatePort { port: String },

    #[error("Port '{port}' expects {expected}, got {got}")]
    TypeMismatch {
        port: String,
        expected: PortType,
        got: PortType,
    },

    #[error("Port '{port}' has no value")]
    Unbound { port: String },

    #[error("Parameter '{port}' must be declared with a default value")]
    MissingDefault { port: String },
}

/// Errors raised while a node reads its parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing parameter '{parameter}'")]
    MissingParameter { parameter: String },

    #[error("Parameter '{parameter}' expects {expected}, got {got}")]
    WrongType {
        parameter: String,
        expected: PortType,
        got: PortType,
    },

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue { parameter: String, reason: String },

    #[error("Node '{node}' is already configured")]
    AlreadyConfigured { node: String },

    #[error("{0}")]
    Schema(PortError),
}

impl From<PortError> for ConfigurationError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::TypeMismatch { port, expected, got } => ConfigurationError::WrongType {
                parameter: port,
                expected,
                got,
            },
            PortError::Unbound { port } | PortError::UnknownPort { port } => {
                ConfigurationError::MissingParameter { parameter: port }
            }
            other => ConfigurationError::Schema(other),
        }
    }
}

/// Errors during node execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Input '{port}' expects {expected}, got {got}")]
    TypeMismatch {
        port: String,
        expected: PortType,
        got: PortType,
    },

    #[error("Missing input '{port}'")]
    MissingInput { port: String },

    #[error("{node}: unsupported input: {reason}")]
    UnsupportedFormat { node: String, reason: String },

    #[error("{node}: numeric degeneracy: {reason}")]
    NumericDegeneracy { node: String, reason: String },

    #[error("Node '{node}' was executed before being configured")]
    NotConfigured { node: String },

    #[error("{0}")]
    Port(PortError),
}

impl ExecutionError {
    /// Wrap an image library failure as an unsupported-input error.
    pub fn unsupported(node: &str, error: impl fmt::Display) -> Self {
        ExecutionError::UnsupportedFormat {
            node: node.to_string(),
            reason: error.to_string(),
        }
    }

    /// Whether the failure came from the input data rather than the wiring.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::UnsupportedFormat { .. } | ExecutionError::NumericDegeneracy { .. }
        )
    }
}

impl From<PortError> for ExecutionError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::TypeMismatch { port, expected, got } => {
                ExecutionError::TypeMismatch { port, expected, got }
            }
            PortError::Unbound { port } => ExecutionError::MissingInput { port },
            other => ExecutionError::Port(other),
        }
    }
}

/// Errors from the node registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Node type '{0}' is not registered")]
    NodeNotFound(String),

    #[error("Node type '{0}' is disabled")]
    Disabled(String),

    #[error("Node type '{node}' declares an invalid schema: {error}")]
    Schema { node: String, error: PortError },
}

/// Result type alias for top-level operations.
pub type ImgprocResult<T> = Result<T, ImgprocError>;

/// Result type alias for port declarations and access.
pub type PortResult<T> = Result<T, PortError>;

/// Result type alias for execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
