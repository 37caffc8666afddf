//! Permission route table
//!
//! Maps permission names to the routes that require them. Entry order is
//! significant: resolution returns the first permission, in table order,
//! with a matching route.

use std::{fmt, path::Path};

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{
    error::{Error, Result},
    route_matcher::RoutePattern,
};

const DEFAULT_ROUTES_YAML: &str = include_str!("../../config/permission_routes.yaml");

/// Route configuration for one permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// `"METHOD /path"` patterns that require the permission
    pub paths: Vec<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RouteConfig {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A permission together with its parsed route patterns
#[derive(Debug, Clone)]
pub struct PermissionRoutes {
    name: String,
    config: RouteConfig,
    patterns: Vec<RoutePattern>,
}

impl PermissionRoutes {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.config.description.as_deref()
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// True if any of this permission's routes matches the request
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches(method, path))
    }
}

/// Ordered mapping from permission name to route configuration
#[derive(Debug, Clone, Default)]
pub struct PermissionRouteTable {
    entries: Vec<PermissionRoutes>,
}

impl PermissionRouteTable {
    /// Create an empty table; every route is public
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront's built-in route table
    pub fn storefront_defaults() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_ROUTES_YAML)
    }

    /// Build a table from `(name, config)` pairs, keeping their order
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, RouteConfig)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, config) in entries {
            table.insert(name, config)?;
        }
        Ok(table)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(Error::ConfigError(format!(
                "Unsupported route table format: {}",
                path.display()
            ))),
        }
    }

    /// Add a permission, or replace an existing one in place.
    ///
    /// Every pattern is parsed up front; a malformed one rejects the entry.
    pub fn insert(&mut self, name: impl Into<String>, config: RouteConfig) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::ConfigError(
                "Permission name cannot be empty".to_string(),
            ));
        }

        let patterns = config
            .paths
            .iter()
            .map(|path| {
                RoutePattern::parse(path).map_err(|err| Error::InvalidPermissionRoute {
                    permission: name.clone(),
                    pattern: path.clone(),
                    reason: match err {
                        Error::InvalidRoutePattern { reason, .. } => reason,
                        other => other.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let entry = PermissionRoutes {
            name,
            config,
            patterns,
        };

        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// Iterate entries in table order
    pub fn iter(&self) -> impl Iterator<Item = &PermissionRoutes> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PermissionRoutes> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize back to YAML, preserving entry order
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Serialize for PermissionRouteTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PermissionRouteTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = PermissionRouteTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of permission name to route configuration")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut table = PermissionRouteTable::new();
                while let Some((name, config)) = map.next_entry::<String, RouteConfig>()? {
                    table.insert(name, config).map_err(de::Error::custom)?;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_preserves_order() {
        let yaml = r#"
zeta.view:
  paths: ["GET /z"]
alpha.view:
  paths: ["GET /a"]
  description: First letter
"#;
        let table = PermissionRouteTable::from_yaml_str(yaml).unwrap();
        let names: Vec<_> = table.permission_names().collect();
        assert_eq!(names, vec!["zeta.view", "alpha.view"]);
        assert_eq!(
            table.get("alpha.view").unwrap().description(),
            Some("First letter")
        );
    }

    #[test]
    fn test_json_preserves_order() {
        let json = r#"{"b.x": {"paths": ["POST /b"]}, "a.x": {"paths": ["POST /a"]}}"#;
        let table = PermissionRouteTable::from_json_str(json).unwrap();
        let names: Vec<_> = table.permission_names().collect();
        assert_eq!(names, vec!["b.x", "a.x"]);
    }

    #[test]
    fn test_malformed_pattern_rejected_at_load() {
        let yaml = "broken.perm:\n  paths: [\"GET/no-space\"]\n";
        let err = PermissionRouteTable::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("broken.perm"));

        let mut table = PermissionRouteTable::new();
        let err = table
            .insert("x.y", RouteConfig::new(["NOSPACE"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPermissionRoute { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = PermissionRouteTable::from_entries([
            ("a", RouteConfig::new(["GET /a"])),
            ("b", RouteConfig::new(["GET /b"])),
        ])
        .unwrap();
        table.insert("a", RouteConfig::new(["GET /a2"])).unwrap();

        let names: Vec<_> = table.permission_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(table.get("a").unwrap().matches("GET", "/a2"));
        assert!(!table.get("a").unwrap().matches("GET", "/a"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut table = PermissionRouteTable::new();
        assert!(table.insert("  ", RouteConfig::new(["GET /"])).is_err());
    }

    #[test]
    fn test_storefront_defaults_load() {
        let table = PermissionRouteTable::storefront_defaults().unwrap();
        assert_eq!(table.permission_names().next(), Some("products.create"));
        assert!(table.get("roles.manage").is_some());
        assert!(table
            .get("orders.cancel")
            .unwrap()
            .matches("DELETE", "/api/v1/orders/9/cancel"));
    }

    #[test]
    fn test_yaml_round_trip_keeps_order() {
        let table = PermissionRouteTable::storefront_defaults().unwrap();
        let reloaded = PermissionRouteTable::from_yaml_str(&table.to_yaml().unwrap()).unwrap();
        assert!(table.permission_names().eq(reloaded.permission_names()));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("routes.yml");
        std::fs::write(&yaml_path, "a.b:\n  paths: [\"GET /x\"]\n").unwrap();
        assert_eq!(PermissionRouteTable::load(&yaml_path).unwrap().len(), 1);

        let json_path = dir.path().join("routes.json");
        std::fs::write(&json_path, r#"{"a.b": {"paths": ["GET /x"]}}"#).unwrap();
        assert_eq!(PermissionRouteTable::load(&json_path).unwrap().len(), 1);

        let txt_path = dir.path().join("routes.txt");
        std::fs::write(&txt_path, "").unwrap();
        assert!(matches!(
            PermissionRouteTable::load(&txt_path),
            Err(Error::ConfigError(_))
        ));
    }
}
