//! Node implementations, their registry and a linear chain runner.

pub mod registry;
pub mod builtin;
pub mod chain;

pub use chain::{run_chain, ChainStage};
pub use registry::{NodeDescriptor, NodeFactory, NodeRegistry, RegistryBuilder};
