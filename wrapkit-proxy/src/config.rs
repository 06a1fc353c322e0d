//! Proxy configuration, read from a TOML file such as `wrapkit.toml`.
//!
//! ```toml
//! [registry]
//! match_simple_names = true
//!
//! [registry.aliases]
//! "Legacy.PlainBearing" = "Drive.Bearing"
//!
//! [collections]
//! id_property = "Id"
//! name_property = "Name"
//! name_policy = "strict"   # or "first_match"
//! ```

use crate::collection::NamePolicy;
use crate::{ProxyError, ProxyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub collections: CollectionSettings,
}

/// How the wrapper registry matches runtime type names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Allow matching on the segment after the last `.`.
    #[serde(default = "default_true")]
    pub match_simple_names: bool,
    /// Foreign type name → registered type name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            match_simple_names: true,
            aliases: BTreeMap::new(),
        }
    }
}

/// Which element properties key a collection, and how name clashes behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_id_property")]
    pub id_property: String,
    #[serde(default = "default_name_property")]
    pub name_property: String,
    #[serde(default)]
    pub name_policy: NamePolicy,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            id_property: default_id_property(),
            name_property: default_name_property(),
            name_policy: NamePolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_id_property() -> String {
    "Id".to_string()
}

fn default_name_property() -> String {
    "Name".to_string()
}

impl ProxyConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> ProxyResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ProxyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> ProxyResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Loads from `path` if it exists. Falls back to defaults, with a log
    /// line, when the file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded proxy config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("{}. Falling back to default config.", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> ProxyResult<()> {
        let collections = &self.collections;
        if collections.id_property.is_empty() || collections.name_property.is_empty() {
            return Err(ProxyError::Config(
                "collection key properties must not be empty".into(),
            ));
        }
        if collections.id_property == collections.name_property {
            return Err(ProxyError::Config(format!(
                "id and name both use property '{}'",
                collections.id_property
            )));
        }
        if let Some((foreign, _)) = self.registry.aliases.iter().find(|(f, l)| f == l) {
            return Err(ProxyError::Config(format!("alias '{foreign}' maps to itself")));
        }
        Ok(())
    }
}
