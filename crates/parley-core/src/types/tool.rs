use serde::{Deserialize, Serialize};

/// Definition of a tool the model can call
///
/// The tool function itself lives with the caller; adapters only forward the
/// definition and report calls by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, unique within a request
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Input shape accepted by the tool
    #[serde(default)]
    pub schema: ToolSchema,
}

impl Tool {
    /// Create a tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: ToolSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

/// JSON Schema fragment describing a tool's input object
///
/// Forwarded verbatim; its content is never validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Schema `properties` object, keyed by argument name
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Names of required arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Schema for a tool that takes no arguments
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a schema from a `properties` JSON object
    ///
    /// Non-object values yield an empty property set.
    pub fn from_properties(properties: serde_json::Value) -> Self {
        let properties = match properties {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            properties,
            required: Vec::new(),
        }
    }

    /// Mark arguments as required
    #[must_use]
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }
}
