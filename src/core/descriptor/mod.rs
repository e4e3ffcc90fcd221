//! # Descriptor Module
//!
//! The declarative description of one image transform: a source input plus an
//! ordered chain of named operations. Descriptors are pure data - building one
//! performs no I/O, and invalid operations only surface when the transform
//! capability is invoked.
//!
//! Operation order is significant: reordering changes both the derived
//! identity and the visual result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named operation with positional arguments.
///
/// Serialized field names (`method`, `args`) are the wire format embedded in
/// markers and must stay stable across releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Name of the transform capability to invoke
    #[serde(rename = "method")]
    pub name: String,
    /// Positional arguments, passed through in recorded order
    pub args: Vec<Value>,
}

/// An immutable description of a source image plus its transform chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Path to the source image
    pub input_path: String,
    /// Ordered operations to apply
    pub operations: Vec<Operation>,
}

impl Descriptor {
    /// Create a descriptor with no operations
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            operations: Vec::new(),
        }
    }

    /// Return a new descriptor with `name(args)` appended to the chain
    #[must_use]
    pub fn with_operation(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.operations.push(Operation {
            name: name.into(),
            args,
        });
        self
    }

    /// The final operation in the chain, if any
    pub fn last_operation(&self) -> Option<&Operation> {
        self.operations.last()
    }
}

// Bare input paths coerce to zero-operation descriptors; every entry point
// that accepts "a descriptor or a path" takes `impl Into<Descriptor>`.
impl From<&str> for Descriptor {
    fn from(input_path: &str) -> Self {
        Self::new(input_path)
    }
}

impl From<String> for Descriptor {
    fn from(input_path: String) -> Self {
        Self::new(input_path)
    }
}
