//! Node registry for managing available node types.
//!
//! Each node type is registered as a [`NodeDescriptor`] (metadata plus
//! parameter and port schemas) and a factory. The runtime looks node types
//! up by id, inspects their schemas and instantiates them.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{PortResult, RegistryError};
use crate::core::instance::NodeInstance;
use crate::core::node::{Category, NodeMetadata, ProcessingNode};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Factory function for creating node instances.
pub type NodeFactory = Arc<dyn Fn() -> Box<dyn ProcessingNode> + Send + Sync>;

/// Introspectable description of a node type.
///
/// Serializes to JSON as the metadata followed by the parameter, input and
/// output declarations.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescriptor {
    pub metadata: NodeMetadata,
    pub parameters: ParameterSet,
    pub inputs: PortSet,
    pub outputs: PortSet,
}

impl NodeDescriptor {
    /// Run the declaration phase of `N`.
    pub fn of<N: ProcessingNode>() -> PortResult<Self> {
        let mut parameters = PortSet::parameters();
        let mut inputs = PortSet::inputs();
        let mut outputs = PortSet::outputs();
        N::declare_parameters(&mut parameters)?;
        N::declare_ports(&parameters, &mut inputs, &mut outputs)?;
        Ok(Self {
            metadata: N::metadata(),
            parameters,
            inputs,
            outputs,
        })
    }

    /// Registered id of the node type.
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Pretty-printed JSON schema.
    pub fn schema_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Registry entry containing descriptor and factory.
#[derive(Clone)]
struct RegistryEntry {
    /// Factory function to create instances.
    factory: NodeFactory,
    /// Cached descriptor (avoids re-running the declaration phase).
    descriptor: Arc<NodeDescriptor>,
    /// Whether this node type can be instantiated.
    enabled: bool,
}

/// Registry for all available node types.
pub struct NodeRegistry {
    nodes: IndexMap<String, RegistryEntry>,
}

static GLOBAL: OnceLock<RwLock<NodeRegistry>> = OnceLock::new();

impl NodeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with built-in nodes.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Process-wide registry, populated with the built-ins on first use.
    ///
    /// Plugins register into it with `NodeRegistry::global().write()`.
    pub fn global() -> &'static RwLock<NodeRegistry> {
        GLOBAL.get_or_init(|| {
            let registry = Self::with_builtins().unwrap_or_else(|e| {
                log::error!("Failed to register built-in nodes: {}", e);
                Self::new()
            });
            RwLock::new(registry)
        })
    }

    /// Register a node type constructed with `Default`.
    ///
    /// An existing entry with the same id is replaced.
    pub fn register<N>(&mut self) -> Result<(), RegistryError>
    where
        N: ProcessingNode + Default + 'static,
    {
        let descriptor = NodeDescriptor::of::<N>().map_err(|error| RegistryError::Schema {
            node: N::metadata().id,
            error,
        })?;
        self.register_with(descriptor, || Box::new(N::default()));
        Ok(())
    }

    /// Register a node type from a prepared descriptor and factory.
    pub fn register_with<F>(&mut self, descriptor: NodeDescriptor, factory: F)
    where
        F: Fn() -> Box<dyn ProcessingNode> + Send + Sync + 'static,
    {
        let id = descriptor.id().to_string();
        log::trace!("Registering node type '{}'", id);
        let entry = RegistryEntry {
            factory: Arc::new(factory),
            descriptor: Arc::new(descriptor),
            enabled: true,
        };
        if self.nodes.insert(id.clone(), entry).is_some() {
            log::debug!("Node type '{}' was already registered and has been replaced", id);
        }
    }

    fn enabled_entry(&self, id: &str) -> Result<&RegistryEntry, RegistryError> {
        let entry = self
            .nodes
            .get(id)
            .ok_or_else(|| RegistryError::NodeNotFound(id.to_string()))?;
        if !entry.enabled {
            return Err(RegistryError::Disabled(id.to_string()));
        }
        Ok(entry)
    }

    /// Create a bare node by id.
    pub fn create(&self, id: &str) -> Result<Box<dyn ProcessingNode>, RegistryError> {
        self.enabled_entry(id).map(|e| (e.factory)())
    }

    /// Create a node together with fresh copies of its declared slots.
    pub fn instantiate(&self, id: &str) -> Result<NodeInstance, RegistryError> {
        let entry = self.enabled_entry(id)?;
        let d = &entry.descriptor;
        Ok(NodeInstance::new(
            d.id(),
            (entry.factory)(),
            d.parameters.clone(),
            d.inputs.clone(),
            d.outputs.clone(),
        ))
    }

    /// Get the descriptor of a node type.
    pub fn descriptor(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.get(id).map(|e| e.descriptor.as_ref())
    }

    /// Check if a node type is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get all registered ids in registration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Get all descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.values().map(|e| e.descriptor.as_ref())
    }

    /// Get node ids in a category.
    pub fn nodes_by_category(&self, category: Category) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, e)| e.descriptor.metadata.category == category)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Search node types by id, name, description or tag.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.nodes
            .iter()
            .filter(|(_, entry)| {
                let m = &entry.descriptor.metadata;
                let name_match = m.name.to_lowercase().contains(&query);
                let desc_match = m.description.to_lowercase().contains(&query);
                let tag_match = m.tags.iter().any(|t| t.to_lowercase().contains(&query));
                let id_match = m.id.to_lowercase().contains(&query);

                name_match || desc_match || tag_match || id_match
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Enable or disable a node type.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        if let Some(entry) = self.nodes.get_mut(id) {
            entry.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Unregister a node type.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.nodes.shift_remove(id).is_some()
    }

    /// Get the total number of registered node types.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get count of enabled node types.
    pub fn enabled_count(&self) -> usize {
        self.nodes.values().filter(|e| e.enabled).count()
    }

    /// Get enabled node types grouped by category, each group sorted by name.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&NodeMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&NodeMetadata>> = IndexMap::new();

        for entry in self.nodes.values() {
            if entry.enabled {
                grouped
                    .entry(entry.descriptor.metadata.category)
                    .or_default()
                    .push(&entry.descriptor.metadata);
            }
        }

        for nodes in grouped.values_mut() {
            nodes.sort_by(|a, b| a.name.cmp(&b.name));
        }

        grouped
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating a customized registry.
pub struct RegistryBuilder {
    registry: NodeRegistry,
    include_builtins: bool,
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: NodeRegistry::new(),
            include_builtins: true,
            error: None,
        }
    }

    /// Include or exclude built-in nodes.
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    /// Register a custom node type.
    pub fn register<N>(mut self) -> Self
    where
        N: ProcessingNode + Default + 'static,
    {
        if self.error.is_none() {
            self.error = self.registry.register::<N>().err();
        }
        self
    }

    /// Build the registry, reporting the first registration failure.
    pub fn build(mut self) -> Result<NodeRegistry, RegistryError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.include_builtins {
            crate::filters::builtin::register_all(&mut self.registry)?;
        }
        Ok(self.registry)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::{AbsNormalize, BinaryAdd, ColorConvert, GradientFilter};
    use crate::imgproc::Mat;

    #[test]
    fn test_register_and_create() {
        let mut registry = NodeRegistry::new();
        registry.register::<GradientFilter>().unwrap();

        assert!(registry.contains("sobel"));
        assert!(registry.create("sobel").is_ok());
        assert!(matches!(
            registry.create("missing"),
            Err(RegistryError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_instantiate_copies_schema() {
        let mut registry = NodeRegistry::new();
        registry.register::<ColorConvert>().unwrap();

        let node = registry.instantiate("cvt_color").unwrap();
        assert_eq!(node.node_type(), "cvt_color");
        assert_eq!(node.parameters().get::<i64>("flag"), Ok(&4));
        assert!(node.inputs().contains("input"));
        assert!(node.outputs().contains("out"));
    }

    #[test]
    fn test_descriptor_json() {
        let descriptor = NodeDescriptor::of::<GradientFilter>().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&descriptor.schema_json().unwrap()).unwrap();
        assert_eq!(json["metadata"]["id"], "sobel");
        let names: Vec<_> = json["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["x", "y", "ksize"]);
        assert_eq!(json["parameters"][2]["default_value"]["data"], 3);
        assert_eq!(json["outputs"][0]["port_type"], "Image");
    }

    #[test]
    fn test_category_grouping() {
        let registry = NodeRegistry::with_builtins().unwrap();
        let math = registry.nodes_by_category(Category::Math);
        assert_eq!(math, vec!["add_image", "add_float", "add_integer"]);

        let grouped = registry.grouped_by_category();
        assert_eq!(grouped[&Category::Edge].len(), 1);
    }

    #[test]
    fn test_search() {
        let registry = NodeRegistry::with_builtins().unwrap();
        assert_eq!(registry.search("SOBEL"), vec!["sobel"]);
        assert!(registry.search("nonexistent").is_empty());
    }

    #[test]
    fn test_enable_disable() {
        let mut registry = NodeRegistry::new();
        registry.register::<AbsNormalize>().unwrap();

        registry.set_enabled("abs_normalized", false);
        assert!(matches!(
            registry.instantiate("abs_normalized"),
            Err(RegistryError::Disabled(_))
        ));
        assert_eq!(registry.enabled_count(), 0);

        registry.set_enabled("abs_normalized", true);
        assert!(registry.instantiate("abs_normalized").is_ok());
        assert!(!registry.set_enabled("missing", true));
    }

    #[test]
    fn test_unregister() {
        let mut registry = NodeRegistry::with_builtins().unwrap();
        let before = registry.len();
        assert!(registry.unregister("add_float"));
        assert!(!registry.contains("add_float"));
        assert_eq!(registry.len(), before - 1);
        assert!(!registry.unregister("add_float"));
    }

    #[test]
    fn test_builder() {
        let registry = RegistryBuilder::new()
            .with_builtins(false)
            .register::<BinaryAdd<Mat>>()
            .build()
            .unwrap();
        assert_eq!(registry.node_ids().collect::<Vec<_>>(), vec!["add_image"]);
    }

    #[test]
    fn test_global_has_builtins() {
        let registry = NodeRegistry::global().read();
        for id in ["cvt_color", "channel_splitter", "sobel", "add_image", "abs_normalized"] {
            assert!(registry.contains(id), "missing {}", id);
        }
    }
}
