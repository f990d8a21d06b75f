//! Vertex identity and record types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Storage-assigned vertex identity, unique within an engine instance.
pub type VertexId = u64;

/// A vertex as stored in the graph: a typed record with named properties and
/// an optional vector embedding.
///
/// The vector is a first-class field rather than a property value; which
/// property *name* it is published under is decided by the index descriptor,
/// and the adapter performs that mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VertexRecord {
    label: String,
    properties: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<Vec<f32>>,
}

impl VertexRecord {
    /// Creates a new vertex record with the given label (vertex type).
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            properties: HashMap::new(),
            vector: None,
        }
    }

    /// Adds a property to this record (builder pattern).
    #[must_use]
    pub fn with_property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    /// Adds a vector embedding to this record (builder pattern).
    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Returns the vertex label (type).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns all properties of this record.
    #[must_use]
    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    /// Returns a specific property value, if present.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets a property value.
    pub fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }

    /// Returns the optional vector embedding.
    #[must_use]
    pub fn vector(&self) -> Option<&[f32]> {
        self.vector.as_deref()
    }
}
