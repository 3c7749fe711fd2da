//! A configured node together with its bound slots.
//!
//! [`NodeInstance`] is what the runtime holds for each node in a pipeline.
//! It owns the boxed node and its parameter, input and output sets, and
//! enforces the lifecycle: parameters are bound, `configure` runs exactly
//! once, and only then may the node execute.

use crate::core::context::{ParameterSet, PortSet};
use crate::core::error::{
    ConfigurationError, ExecutionError, ExecutionResult, NodeId, PortError, PortResult,
};
use crate::core::node::{ProcessingNode, StatusCode};
use crate::core::types::{PortValue, Value};

/// A node plus its slot sets and lifecycle state.
pub struct NodeInstance {
    id: NodeId,
    node_type: String,
    node: Box<dyn ProcessingNode>,
    parameters: ParameterSet,
    inputs: PortSet,
    outputs: PortSet,
    configured: bool,
}

impl NodeInstance {
    /// Wrap a node with the slot sets declared for its type.
    pub fn new(
        node_type: impl Into<String>,
        node: Box<dyn ProcessingNode>,
        parameters: ParameterSet,
        inputs: PortSet,
        outputs: PortSet,
    ) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            node,
            parameters,
            inputs,
            outputs,
            configured: false,
        }
    }

    /// Declare the slots of `N` and wrap a default-constructed node.
    pub fn of<N>() -> PortResult<Self>
    where
        N: ProcessingNode + Default + 'static,
    {
        let mut parameters = PortSet::parameters();
        let mut inputs = PortSet::inputs();
        let mut outputs = PortSet::outputs();
        N::declare_parameters(&mut parameters)?;
        N::declare_ports(&parameters, &mut inputs, &mut outputs)?;
        Ok(Self::new(
            N::metadata().id,
            Box::new(N::default()),
            parameters,
            inputs,
            outputs,
        ))
    }

    /// Unique id of this instance.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Registered id of the node type.
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn inputs(&self) -> &PortSet {
        &self.inputs
    }

    pub fn outputs(&self) -> &PortSet {
        &self.outputs
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Bind a parameter value. Its type is checked by `configure`.
    pub fn set_parameter(&mut self, name: &str, value: Value) -> Result<(), ConfigurationError> {
        self.ensure_unconfigured()?;
        self.parameters
            .bind(name, value)
            .map_err(ConfigurationError::Schema)
    }

    /// Bind every entry of a JSON object as a parameter.
    pub fn set_parameters_json(&mut self, json: &serde_json::Value) -> Result<(), ConfigurationError> {
        let object = json.as_object().ok_or_else(|| ConfigurationError::InvalidValue {
            parameter: self.node_type.clone(),
            reason: "parameters must be a JSON object".to_string(),
        })?;
        for (name, raw) in object {
            let value = Value::from_json(raw).ok_or_else(|| ConfigurationError::InvalidValue {
                parameter: name.clone(),
                reason: format!("unsupported JSON value {}", raw),
            })?;
            self.set_parameter(name, value)?;
        }
        Ok(())
    }

    /// Let the node read its parameters. Allowed exactly once.
    pub fn configure(&mut self) -> Result<(), ConfigurationError> {
        self.ensure_unconfigured()?;
        log::debug!("Configuring {} ({})", self.node_type, self.id);
        if let Err(e) = self.node.configure(&self.parameters) {
            log::error!("Configuration of {} ({}) failed: {}", self.node_type, self.id, e);
            return Err(e);
        }
        self.configured = true;
        Ok(())
    }

    fn ensure_unconfigured(&self) -> Result<(), ConfigurationError> {
        if self.configured {
            return Err(ConfigurationError::AlreadyConfigured {
                node: self.node_type.clone(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Bind an input value. Its type is checked when the node reads it.
    pub fn bind_input(&mut self, name: &str, value: Value) -> ExecutionResult<()> {
        self.inputs.bind(name, value).map_err(ExecutionError::Port)
    }

    /// Run the node once on the bound inputs.
    ///
    /// Outputs from a previous run are cleared first, so after a failure no
    /// stale values remain.
    pub fn execute(&mut self) -> ExecutionResult<StatusCode> {
        if !self.configured {
            return Err(ExecutionError::NotConfigured {
                node: self.node_type.clone(),
            });
        }
        self.outputs.clear_values();
        log::debug!("Executing {} ({})", self.node_type, self.id);

        match self.node.process(&self.inputs, &mut self.outputs) {
            Ok(status) => Ok(status),
            Err(e) => {
                log::error!("Node {} ({}) failed: {}", self.node_type, self.id, e);
                Err(e)
            }
        }
    }

    /// Value written to an output by the last run.
    pub fn output(&self, name: &str) -> Option<&Value> {
        if self.outputs.is_bound(name) {
            self.outputs.get_value(name).ok()
        } else {
            None
        }
    }

    /// Typed access to an output written by the last run.
    pub fn output_as<T: PortValue>(&self, name: &str) -> PortResult<&T> {
        if !self.outputs.is_bound(name) {
            return Err(PortError::Unbound {
                port: name.to_string(),
            });
        }
        self.outputs.get::<T>(name)
    }

    /// Move an output value out of the instance.
    pub fn take_output(&mut self, name: &str) -> Option<Value> {
        self.outputs.take(name)
    }

    /// Drop bound inputs, outputs and node scratch state. Configuration is
    /// kept.
    pub fn reset(&mut self) {
        self.node.reset();
        self.inputs.clear_values();
        self.outputs.clear_values();
    }
}

/// Cloning copies the configuration into a fresh instance with its own id
/// and no scratch state, ready to run alongside the original.
impl Clone for NodeInstance {
    fn clone(&self) -> Self {
        let mut node = self.node.clone_box();
        node.reset();
        let mut inputs = self.inputs.clone();
        inputs.clear_values();
        let mut outputs = self.outputs.clone();
        outputs.clear_values();
        Self {
            id: NodeId::new(),
            node_type: self.node_type.clone(),
            node,
            parameters: self.parameters.clone(),
            inputs,
            outputs,
            configured: self.configured,
        }
    }
}

impl std::fmt::Debug for NodeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeInstance")
            .field("id", &self.id)
            .field("node_type", &self.node_type)
            .field("configured", &self.configured)
            .field("parameters", &self.parameters.names().collect::<Vec<_>>())
            .field("inputs", &self.inputs.names().collect::<Vec<_>>())
            .field("outputs", &self.outputs.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::builtin::{BinaryAdd, GradientFilter};
    use crate::imgproc::{Depth, Mat};

    #[test]
    fn test_execute_requires_configure() {
        let mut node = NodeInstance::of::<BinaryAdd<i64>>().unwrap();
        node.bind_input("a", Value::Integer(1)).unwrap();
        node.bind_input("b", Value::Integer(2)).unwrap();
        assert!(matches!(node.execute(), Err(ExecutionError::NotConfigured { .. })));

        node.configure().unwrap();
        assert_eq!(node.execute(), Ok(StatusCode::OK));
        assert_eq!(node.output("out"), Some(&Value::Integer(3)));
        assert_eq!(node.output_as::<i64>("out"), Ok(&3));
    }

    #[test]
    fn test_configure_only_once() {
        let mut node = NodeInstance::of::<GradientFilter>().unwrap();
        node.configure().unwrap();
        assert!(matches!(
            node.configure(),
            Err(ConfigurationError::AlreadyConfigured { .. })
        ));
        assert!(matches!(
            node.set_parameter("x", Value::Integer(1)),
            Err(ConfigurationError::AlreadyConfigured { .. })
        ));
    }

    #[test]
    fn test_parameters_from_json() {
        let mut node = NodeInstance::of::<GradientFilter>().unwrap();
        node.set_parameters_json(&serde_json::json!({ "x": 1, "ksize": 5 }))
            .unwrap();
        assert_eq!(node.parameters().get::<i64>("x"), Ok(&1));
        assert_eq!(node.parameters().get::<i64>("y"), Ok(&0));

        assert!(node
            .set_parameters_json(&serde_json::json!({ "x": [1] }))
            .is_err());
        assert!(matches!(
            node.set_parameters_json(&serde_json::json!({ "nope": 1 })),
            Err(ConfigurationError::Schema(PortError::UnknownPort { .. }))
        ));
        assert!(node.set_parameters_json(&serde_json::json!(3)).is_err());
    }

    #[test]
    fn test_wrong_parameter_type_fails_at_configure() {
        let mut node = NodeInstance::of::<GradientFilter>().unwrap();
        node.set_parameter("x", Value::Float(1.0)).unwrap();
        assert!(matches!(
            node.configure(),
            Err(ConfigurationError::WrongType { .. })
        ));
        assert!(!node.is_configured());
    }

    #[test]
    fn test_outputs_cleared_between_runs() {
        let mut node = NodeInstance::of::<BinaryAdd<i64>>().unwrap();
        node.configure().unwrap();
        node.bind_input("a", Value::Integer(i64::MAX)).unwrap();
        node.bind_input("b", Value::Integer(0)).unwrap();
        node.execute().unwrap();
        assert!(node.output("out").is_some());

        node.bind_input("b", Value::Integer(1)).unwrap();
        assert!(matches!(
            node.execute(),
            Err(ExecutionError::NumericDegeneracy { .. })
        ));
        assert!(node.output("out").is_none());
    }

    #[test]
    fn test_clone_keeps_configuration() {
        let mut node = NodeInstance::of::<GradientFilter>().unwrap();
        node.set_parameter("x", Value::Integer(1)).unwrap();
        node.configure().unwrap();
        node.bind_input("input", Value::Image(Mat::zeros(3, 3, 1, Depth::U8).unwrap()))
            .unwrap();

        let mut copy = node.clone();
        assert_ne!(copy.id(), node.id());
        assert!(copy.is_configured());
        assert!(!copy.inputs().is_bound("input"));

        copy.bind_input("input", Value::Image(Mat::filled(3, 3, 1, Depth::U8, 5.0).unwrap()))
            .unwrap();
        copy.execute().unwrap();
        let out = copy.output_as::<Mat>("out").unwrap();
        assert!(out.as_f32().unwrap().iter().all(|&v| v == 0.0));
    }
}
