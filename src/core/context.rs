//! Typed port and parameter containers.
//!
//! A [`PortSet`] is an ordered map from slot name to a declaration plus an
//! optional bound value. Nodes declare their slots once, the runtime binds
//! values, and the node reads them back with typed accessors.

use crate::core::error::{PortError, PortResult};
use crate::core::port::{PortDefinition, PortDirection};
use crate::core::types::{PortValue, Value};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone)]
struct Slot {
    definition: PortDefinition,
    value: Option<Value>,
}

/// Ordered collection of declared slots and their bound values.
///
/// Declaration order is preserved, so schemas and `out_0`, `out_1`, ...
/// enumerate in the order the node declared them.
#[derive(Debug, Clone)]
pub struct PortSet {
    direction: PortDirection,
    slots: IndexMap<String, Slot>,
}

/// Parameter container. Every parameter slot carries a default.
pub type ParameterSet = PortSet;

impl PortSet {
    /// Create an empty set for the given direction.
    pub fn new(direction: PortDirection) -> Self {
        Self {
            direction,
            slots: IndexMap::new(),
        }
    }

    /// Create an empty input set.
    pub fn inputs() -> Self {
        Self::new(PortDirection::Input)
    }

    /// Create an empty output set.
    pub fn outputs() -> Self {
        Self::new(PortDirection::Output)
    }

    /// Create an empty parameter set.
    pub fn parameters() -> ParameterSet {
        Self::new(PortDirection::Parameter)
    }

    /// Direction of every slot in this set.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    // ========================================================================
    // Declaration
    // ========================================================================

    /// Declare a slot of type `T` without a default.
    ///
    /// Parameters need a default, so this fails on a parameter set.
    pub fn declare<T: PortValue>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> PortResult<()> {
        let name = name.into();
        if self.direction == PortDirection::Parameter {
            return Err(PortError::MissingDefault { port: name });
        }
        self.declare_definition(
            PortDefinition::new(name, T::PORT_TYPE, self.direction).with_description(description),
        )
    }

    /// Declare a slot of type `T` whose reads fall back to `default`.
    pub fn declare_with_default<T: PortValue>(
        &mut self,
        name: impl Into<String>,
        default: T,
        description: impl Into<String>,
    ) -> PortResult<()> {
        self.declare_definition(
            PortDefinition::new(name, T::PORT_TYPE, self.direction)
                .with_default(default.into_value())
                .with_description(description),
        )
    }

    /// Declare a slot from a prepared definition.
    ///
    /// The definition's direction is overridden by the set's. A default
    /// must match the declared type.
    pub fn declare_definition(&mut self, mut definition: PortDefinition) -> PortResult<()> {
        definition.direction = self.direction;
        if self.slots.contains_key(&definition.name) {
            return Err(PortError::DuplicatePort {
                port: definition.name,
            });
        }
        match &definition.default_value {
            Some(default) if !definition.port_type.matches(default) => {
                return Err(PortError::TypeMismatch {
                    port: definition.name,
                    expected: definition.port_type,
                    got: default.get_type(),
                });
            }
            None if self.direction == PortDirection::Parameter => {
                return Err(PortError::MissingDefault {
                    port: definition.name,
                });
            }
            _ => {}
        }
        self.slots.insert(
            definition.name.clone(),
            Slot {
                definition,
                value: None,
            },
        );
        Ok(())
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Read a slot as `T`: the bound value, else the default.
    pub fn get<T: PortValue>(&self, name: &str) -> PortResult<&T> {
        let value = self.get_value(name)?;
        T::from_value(value).ok_or_else(|| PortError::TypeMismatch {
            port: name.to_string(),
            expected: T::PORT_TYPE,
            got: value.get_type(),
        })
    }

    /// Read a slot's value without a type check.
    pub fn get_value(&self, name: &str) -> PortResult<&Value> {
        let slot = self.slot(name)?;
        slot.value
            .as_ref()
            .or(slot.definition.default_value.as_ref())
            .ok_or_else(|| PortError::Unbound {
                port: name.to_string(),
            })
    }

    /// Bind a value without checking its type.
    ///
    /// This is the runtime's entry point: a mismatch is only reported when
    /// the node reads the slot.
    pub fn bind(&mut self, name: &str, value: Value) -> PortResult<()> {
        self.slot_mut(name)?.value = Some(value);
        Ok(())
    }

    /// Bind a typed value, checking it against the declaration.
    pub fn set<T: PortValue>(&mut self, name: &str, value: T) -> PortResult<()> {
        let slot = self.slot_mut(name)?;
        if slot.definition.port_type != T::PORT_TYPE {
            return Err(PortError::TypeMismatch {
                port: name.to_string(),
                expected: slot.definition.port_type,
                got: T::PORT_TYPE,
            });
        }
        slot.value = Some(value.into_value());
        Ok(())
    }

    /// Remove and return the bound value, leaving the slot unbound.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.slots.get_mut(name).and_then(|slot| slot.value.take())
    }

    /// Unbind every slot. Declarations are kept.
    pub fn clear_values(&mut self) {
        for slot in self.slots.values_mut() {
            slot.value = None;
        }
    }

    /// Whether a value is bound (defaults do not count).
    pub fn is_bound(&self, name: &str) -> bool {
        self.slots.get(name).map_or(false, |slot| slot.value.is_some())
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Declaration for `name`.
    pub fn definition(&self, name: &str) -> Option<&PortDefinition> {
        self.slots.get(name).map(|slot| &slot.definition)
    }

    /// All declarations in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &PortDefinition> {
        self.slots.values().map(|slot| &slot.definition)
    }

    /// All slot names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(|s| s.as_str())
    }

    /// Bound values in declaration order.
    pub fn bound_values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots
            .iter()
            .filter_map(|(name, slot)| slot.value.as_ref().map(|v| (name.as_str(), v)))
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, name: &str) -> PortResult<&Slot> {
        self.slots.get(name).ok_or_else(|| PortError::UnknownPort {
            port: name.to_string(),
        })
    }

    fn slot_mut(&mut self, name: &str) -> PortResult<&mut Slot> {
        self.slots.get_mut(name).ok_or_else(|| PortError::UnknownPort {
            port: name.to_string(),
        })
    }
}

/// A set serializes as the list of its declarations. Bound values are
/// runtime state and are left out.
impl Serialize for PortSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.definitions())
    }
}
