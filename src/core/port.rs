//! Port and parameter declarations.
//!
//! A declaration gives a slot its name, type and direction. Inputs and
//! outputs carry data between nodes; parameters are the node's
//! configuration and always carry a default.

use crate::core::types::{PortType, Value};
use serde::{Deserialize, Serialize};

/// Direction of a declared slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    Parameter,
}

/// Declaration of a single input, output or parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDefinition {
    /// Unique name within its set (used in code)
    pub name: String,
    /// Human-readable name
    pub display_name: String,
    /// Type of data this slot holds
    pub port_type: PortType,
    /// Input, output or parameter
    pub direction: PortDirection,
    /// Description for documentation and tooltips
    pub description: String,
    /// Default value; always present for parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl PortDefinition {
    /// Create a new declaration.
    pub fn new(name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        let name = name.into();
        Self {
            display_name: Self::name_to_display(&name),
            name,
            port_type,
            direction,
            description: String::new(),
            default_value: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Convert snake_case name to Title Case display name.
    fn name_to_display(name: &str) -> String {
        name.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_generation() {
        let port = PortDefinition::new("out_0", PortType::Image, PortDirection::Input);
        assert_eq!(port.display_name, "Out 0");
        assert_eq!(port.direction, PortDirection::Input);

        let param = PortDefinition::new("max_value", PortType::Integer, PortDirection::Parameter)
            .with_default(Value::Integer(3))
            .with_description("Upper bound");
        assert_eq!(param.display_name, "Max Value");
        assert_eq!(param.default_value, Some(Value::Integer(3)));
        assert_eq!(param.description, "Upper bound");
    }

    #[test]
    fn test_definition_serializes_without_empty_default() {
        let port = PortDefinition::new("out", PortType::Image, PortDirection::Output);
        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["direction"], "output");
        assert_eq!(json["port_type"], "Image");
        assert!(json.get("default_value").is_none());
    }
}
