use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wrapkit_types::{ForeignValue, HandleId};

/// One object stored in a [`MemoryRuntime`](crate::MemoryRuntime).
///
/// Plain objects carry named properties. Collection objects additionally
/// carry an ordered element list and a generation counter that moves on
/// every list mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignObject {
    pub id: HandleId,
    pub type_name: String,
    pub properties: BTreeMap<String, ForeignValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<HandleId>>,
    #[serde(default)]
    pub generation: u64,
    #[serde(default)]
    pub ref_count: u32,
    /// Freed once the last local reference is released.
    #[serde(default)]
    pub disposable: bool,
}

impl ForeignObject {
    pub(crate) fn new(type_name: impl Into<String>) -> Self {
        Self {
            id: HandleId::new(),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
            items: None,
            generation: 0,
            ref_count: 0,
            disposable: false,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.items.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&ForeignValue> {
        self.properties.get(name)
    }

    /// Extract a string property.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(ForeignValue::as_str)
    }

    /// Extract a numeric property; integers widen.
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.property(name).and_then(ForeignValue::as_f64)
    }

    /// Extract a boolean property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.property(name).and_then(ForeignValue::as_bool)
    }
}
