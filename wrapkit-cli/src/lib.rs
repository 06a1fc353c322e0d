//! Library side of the `wrapkit` inspector.
//!
//! [`Inspector`] loads a JSON snapshot into a [`MemoryRuntime`], installs
//! the demo drivetrain methods and answers the CLI subcommands through typed
//! proxies. Every answer is read live through handles; nothing is cached
//! between commands.

pub mod model;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use wrapkit_proxy::{Handle, Key, ProxyConfig, Session, Wrapper};
use wrapkit_runtime::{ForeignRuntime, MemoryRuntime, Snapshot};
use wrapkit_types::{simple_name, ForeignValue, HandleId};

pub struct Inspector {
    runtime: Arc<MemoryRuntime>,
    session: Session,
}

impl Inspector {
    pub fn open(path: &Path, config: ProxyConfig) -> Result<Self> {
        let snapshot = Snapshot::load(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        Self::from_snapshot(&snapshot, config)
    }

    pub fn from_snapshot(snapshot: &Snapshot, config: ProxyConfig) -> Result<Self> {
        let runtime = Arc::new(MemoryRuntime::from_snapshot(snapshot)?);
        model::install_methods(&runtime)?;
        let session = Session::with_config(runtime.clone(), model::registry()?, config);
        info!(objects = runtime.object_count(), "Inspector ready");
        Ok(Self { runtime, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Roots with their runtime and resolved wrapper types, then every
    /// registered wrapper type.
    pub fn types(&self) -> Result<String> {
        let registry = self.session.registry();
        let mut out = String::from("roots:\n");
        for name in self.runtime.root_names() {
            let id = self
                .runtime
                .root(&name)
                .ok_or_else(|| anyhow!("root '{name}' vanished"))?;
            let runtime_type = self.runtime.type_of(id)?;
            let local = registry.resolve_type(&*self.runtime, &runtime_type)?;
            writeln!(out, "  {name:<16} {runtime_type:<28} -> {local}")?;
        }
        out.push_str("wrappers:\n");
        for type_name in registry.registered_types() {
            writeln!(out, "  {type_name}")?;
        }
        Ok(out)
    }

    pub fn show(&self, root: &str) -> Result<Value> {
        let wrapper = self.session.root(root)?;
        self.describe(&*wrapper)
    }

    /// One row per element: id, name, wrapper type and summary.
    pub fn list(&self, root: &str, property: &str) -> Result<Vec<String>> {
        let parent = self.session.root(root)?;
        let collection = parent
            .handle()
            .get_collection::<model::Component>(property)
            .with_context(|| format!("'{property}' on '{root}' is not a collection"))?;
        let settings = &self.session.config().collections;

        let mut rows = Vec::new();
        for element in collection.iter()? {
            let element = element?;
            let handle = element.handle();
            rows.push(format!(
                "{:>6}  {:<16} {:<24} {}",
                cell(handle, &settings.id_property),
                cell(handle, &settings.name_property),
                element.declared_type(),
                model::summary(&*element)?,
            ));
        }
        Ok(rows)
    }

    /// Looks up one element by id (numeric key) or name. See [`parse_key`].
    pub fn get(&self, root: &str, property: &str, key: &str) -> Result<Value> {
        let parent = self.session.root(root)?;
        let collection = parent
            .handle()
            .get_collection::<model::Component>(property)
            .with_context(|| format!("'{property}' on '{root}' is not a collection"))?;
        let element = collection.get(parse_key(key))?;
        self.describe(&*element)
    }

    /// Calls a catalogued method on a root with JSON arguments.
    ///
    /// Arguments are a JSON array. Objects reference foreign objects:
    /// `{"root": name}`, `{"handle": id}` or
    /// `{"root": name, "collection": property, "key": id-or-name}`.
    pub fn call(&self, root: &str, method: &str, args: &str) -> Result<Value> {
        let overloads =
            model::overloads_for(method).ok_or_else(|| anyhow!("unknown method '{method}'"))?;
        let target = self.session.root(root)?;
        let args = self.parse_args(args)?;
        let result = target.handle().invoke(&overloads, &args)?;
        Ok(self.render(&result))
    }

    fn describe(&self, wrapper: &dyn Wrapper) -> Result<Value> {
        let handle = wrapper.handle();
        let object = self
            .runtime
            .object(handle.id())
            .ok_or_else(|| anyhow!("object {} vanished", handle.id()))?;

        let mut properties = Map::new();
        for name in object.properties.keys() {
            properties.insert(name.clone(), self.render(&handle.get_raw(name)?));
        }
        let mut out = json!({
            "handle": handle.id().to_string(),
            "runtime_type": handle.runtime_type()?,
            "wrapper": wrapper.declared_type(),
            "summary": model::summary(wrapper)?,
            "properties": properties,
        });
        if object.is_collection() {
            out["items"] = json!(self.runtime.len(handle.id())?);
        }
        Ok(out)
    }

    fn render(&self, value: &ForeignValue) -> Value {
        match value {
            ForeignValue::Null => Value::Null,
            ForeignValue::Bool(b) => json!(b),
            ForeignValue::Int(i) => json!(i),
            ForeignValue::Float(f) => json!(f),
            ForeignValue::Str(s) => json!(s),
            ForeignValue::Enum { type_name, member } => {
                json!(format!("{}.{member}", simple_name(type_name)))
            }
            ForeignValue::Handle(id) => match self.runtime.type_of(*id) {
                Ok(type_name) => json!({ "handle": id.to_string(), "type": type_name }),
                Err(_) => json!({ "handle": id.to_string() }),
            },
            ForeignValue::List(items) => {
                Value::Array(items.iter().map(|item| self.render(item)).collect())
            }
            ForeignValue::Overridable { value, overridden } => {
                json!({ "value": self.render(value), "overridden": overridden })
            }
        }
    }

    fn parse_args(&self, raw: &str) -> Result<Vec<ForeignValue>> {
        let value: Value = serde_json::from_str(raw).context("arguments must be JSON")?;
        match value {
            Value::Array(items) => items.iter().map(|item| self.to_foreign(item)).collect(),
            other => Ok(vec![self.to_foreign(&other)?]),
        }
    }

    fn to_foreign(&self, value: &Value) -> Result<ForeignValue> {
        Ok(match value {
            Value::Null => ForeignValue::Null,
            Value::Bool(b) => ForeignValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ForeignValue::Int(i),
                None => ForeignValue::Float(
                    n.as_f64()
                        .ok_or_else(|| anyhow!("unsupported number {n}"))?,
                ),
            },
            Value::String(s) => ForeignValue::Str(s.clone()),
            Value::Array(items) => ForeignValue::List(
                items
                    .iter()
                    .map(|item| self.to_foreign(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(map) => ForeignValue::Handle(self.reference(map)?),
        })
    }

    fn reference(&self, map: &Map<String, Value>) -> Result<HandleId> {
        if let Some(Value::String(id)) = map.get("handle") {
            return Ok(id.parse::<HandleId>()?);
        }
        let Some(Value::String(root)) = map.get("root") else {
            bail!("object arguments need a \"root\" or \"handle\" field");
        };
        let root_id = self
            .runtime
            .root(root)
            .ok_or_else(|| anyhow!("unknown root '{root}'"))?;
        let Some(Value::String(property)) = map.get("collection") else {
            return Ok(root_id);
        };
        let key = match map.get("key") {
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Key::Id)
                .ok_or_else(|| anyhow!("element ids are integers"))?,
            Some(Value::String(name)) => Key::Name(name.clone()),
            _ => bail!("collection references need a \"key\""),
        };
        let parent = self.session.acquire(root_id)?;
        let element = parent
            .get_collection::<model::Component>(property)?
            .get(key)?;
        Ok(element.id())
    }
}

/// Numeric keys look up by id, anything else by name. A `name:` prefix
/// forces a name lookup, for names made only of digits.
pub fn parse_key(raw: &str) -> Key {
    if let Some(name) = raw.strip_prefix("name:") {
        return Key::Name(name.to_string());
    }
    raw.parse::<i64>()
        .map_or_else(|_| Key::Name(raw.to_string()), Key::Id)
}

fn cell(handle: &Handle, property: &str) -> String {
    match handle.get_raw(property) {
        Ok(ForeignValue::Int(i)) => i.to_string(),
        Ok(ForeignValue::Str(s)) => s,
        Ok(ForeignValue::Null) | Err(_) => "-".to_string(),
        Ok(other) => other.kind().to_string(),
    }
}
