//! JSON snapshot format for seeding a [`MemoryRuntime`].
//!
//! Objects are declared under local keys and reference each other with
//! `{"ref": "<key>"}`. Handles are minted at load time, so a snapshot can be
//! loaded any number of times into independent runtimes.
//!
//! ```json
//! {
//!   "types": [{"name": "Component"}, {"name": "Bearing", "base": "Component"}],
//!   "enums": {"LubricantType": ["Mineral", "Synthetic"]},
//!   "objects": [
//!     {"key": "b1", "type": "Bearing", "properties": {"Id": 1, "Name": "B1"}},
//!     {"key": "parts", "type": "ComponentList", "items": ["b1"]}
//!   ],
//!   "roots": {"parts": "parts"}
//! }
//! ```

use crate::memory::State;
use crate::{ForeignObject, MemoryRuntime, RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;
use wrapkit_types::{ForeignValue, HandleId};

/// A declared foreign type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

/// A declared object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, SnapshotValue>,
    /// Present for collection objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub disposable: bool,
}

/// A property value as written in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Ref {
        #[serde(rename = "ref")]
        target: String,
    },
    Enum {
        #[serde(rename = "enum")]
        enum_type: String,
        member: String,
    },
    Overridable {
        value: Box<SnapshotValue>,
        overridden: bool,
    },
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SnapshotValue>),
    Null,
}

impl SnapshotValue {
    fn resolve(&self, keys: &HashMap<String, HandleId>) -> RuntimeResult<ForeignValue> {
        Ok(match self {
            Self::Ref { target } => ForeignValue::Handle(lookup(keys, target)?),
            Self::Enum { enum_type, member } => ForeignValue::enum_member(enum_type, member),
            Self::Overridable { value, overridden } => {
                ForeignValue::overridable(value.resolve(keys)?, *overridden)
            }
            Self::Bool(b) => ForeignValue::Bool(*b),
            Self::Int(i) => ForeignValue::Int(*i),
            Self::Float(f) => ForeignValue::Float(*f),
            Self::Str(s) => ForeignValue::Str(s.clone()),
            Self::List(items) => ForeignValue::List(
                items
                    .iter()
                    .map(|item| item.resolve(keys))
                    .collect::<RuntimeResult<_>>()?,
            ),
            Self::Null => ForeignValue::Null,
        })
    }
}

fn lookup(keys: &HashMap<String, HandleId>, key: &str) -> RuntimeResult<HandleId> {
    keys.get(key)
        .copied()
        .ok_or_else(|| RuntimeError::Snapshot(format!("reference to undeclared object '{key}'")))
}

/// A complete object graph description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub objects: Vec<ObjectDecl>,
    /// Root name → object key.
    #[serde(default)]
    pub roots: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> RuntimeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

impl MemoryRuntime {
    /// Builds a runtime from a snapshot, validating types, references and
    /// enum members.
    pub fn from_snapshot(snapshot: &Snapshot) -> RuntimeResult<Self> {
        let mut state = State::default();

        for decl in &snapshot.types {
            if state.types.contains_key(&decl.name) {
                return Err(RuntimeError::Snapshot(format!(
                    "type '{}' declared twice",
                    decl.name
                )));
            }
            state.types.insert(decl.name.clone(), decl.base.clone());
        }
        for decl in &snapshot.types {
            if let Some(base) = &decl.base {
                if !state.types.contains_key(base) {
                    return Err(RuntimeError::Snapshot(format!(
                        "type '{}' derives from undeclared '{base}'",
                        decl.name
                    )));
                }
            }
        }
        for (name, members) in &snapshot.enums {
            state.enums.insert(name.clone(), members.clone());
        }

        // First pass mints handles so objects can reference each other in any
        // order.
        let mut keys = HashMap::new();
        for decl in &snapshot.objects {
            if !state.types.contains_key(&decl.type_name) {
                return Err(RuntimeError::UnknownType(decl.type_name.clone()));
            }
            let obj = ForeignObject::new(decl.type_name.clone());
            if keys.insert(decl.key.clone(), obj.id).is_some() {
                return Err(RuntimeError::Snapshot(format!(
                    "object key '{}' declared twice",
                    decl.key
                )));
            }
            state.objects.insert(obj.id, obj);
        }

        for decl in &snapshot.objects {
            let id = lookup(&keys, &decl.key)?;
            let mut properties = BTreeMap::new();
            for (name, value) in &decl.properties {
                let value = value.resolve(&keys)?;
                state
                    .validate_value(name, &value)
                    .map_err(|e| match e {
                        RuntimeError::TypeMismatch { property, detail } => {
                            RuntimeError::Snapshot(format!("property '{property}': {detail}"))
                        }
                        other => other,
                    })?;
                properties.insert(name.clone(), value);
            }
            let items = decl
                .items
                .as_ref()
                .map(|items| {
                    items
                        .iter()
                        .map(|key| lookup(&keys, key))
                        .collect::<RuntimeResult<Vec<_>>>()
                })
                .transpose()?;
            if let Some(obj) = state.objects.get_mut(&id) {
                obj.properties = properties;
                obj.items = items;
                obj.disposable = decl.disposable;
            }
        }

        for (name, key) in &snapshot.roots {
            let id = lookup(&keys, key)?;
            state.roots.insert(name.clone(), id);
        }

        info!(
            types = state.types.len(),
            objects = state.objects.len(),
            roots = state.roots.len(),
            "Loaded foreign object snapshot"
        );
        Ok(MemoryRuntime::from_state(state))
    }

    /// Reads and loads a JSON snapshot file.
    pub fn load_json(path: &Path) -> RuntimeResult<Self> {
        Self::from_snapshot(&Snapshot::load(path)?)
    }
}
