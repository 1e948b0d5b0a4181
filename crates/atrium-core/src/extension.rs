//! Extension declarations and their resolved form.
//!
//! An extension is a capability contribution a plugin makes to the host: a
//! kind string (e.g. `"console.nav/item"`) plus free-form properties. A
//! property whose value has the shape `{"$codeRef": "<export>"}` is an
//! encoded code reference into the plugin's own bundle; resolution swaps it
//! for a live handle from the loaded module.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::module::ExportHandle;

/// Property key that marks a JSON object as an encoded code reference.
pub const CODE_REF_KEY: &str = "$codeRef";

/// An extension as declared in a plugin manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDeclaration {
    /// Extension point this contribution targets.
    pub kind: String,
    /// Declared properties; values may be encoded code references.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, Value>,
}

/// Extract the code-reference name from a property value, if it is one.
///
/// Only the exact shape `{"$codeRef": "<non-empty string>"}` counts; anything
/// else is a plain value.
#[must_use]
pub fn encoded_code_ref(value: &Value) -> Option<&str> {
    let obj = value.as_object()?;
    let reference = obj.get(CODE_REF_KEY)?.as_str()?;
    if reference.is_empty() {
        return None;
    }
    Some(reference)
}

/// An extension after code-reference resolution.
#[derive(Clone)]
pub struct ResolvedExtension {
    /// Extension point this contribution targets.
    pub kind: String,
    /// Resolved properties. Properties whose code references failed to
    /// resolve are absent.
    pub properties: HashMap<String, ResolvedProperty>,
}

/// A single resolved extension property.
#[derive(Clone)]
pub enum ResolvedProperty {
    /// A plain JSON value, passed through unchanged.
    Value(Value),
    /// A live handle into the plugin's loaded module.
    Code(ExportHandle),
}

impl ResolvedProperty {
    /// The plain value, if this property is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Code(_) => None,
        }
    }

    /// The module handle, if this property is a resolved code reference.
    #[must_use]
    pub fn as_code(&self) -> Option<&ExportHandle> {
        match self {
            Self::Value(_) => None,
            Self::Code(handle) => Some(handle),
        }
    }
}

impl fmt::Debug for ResolvedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Code(_) => f.debug_tuple("Code").field(&"<export handle>").finish(),
        }
    }
}

impl fmt::Debug for ResolvedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedExtension")
            .field("kind", &self.kind)
            .field("properties", &self.properties)
            .finish()
    }
}
