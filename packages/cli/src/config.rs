use animgraph_model::{ConnectorRole, PropertyValue, Registry, Vec2, Vec3, TITLE_PROPERTY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "animgraph.config.json";

/// Animgraph configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Project file used when a command is given none
    #[serde(default = "default_project")]
    pub project: String,

    /// Node types available to documents
    #[serde(default = "default_node_types")]
    pub node_types: Vec<NodeTypeConfig>,
}

fn default_project() -> String {
    "scene.animgraph.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeConfig {
    pub title: String,

    #[serde(default)]
    pub properties: Vec<PropertyConfig>,

    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub title: String,

    /// Also fixes the value type of the property
    pub default: PropertyValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub title: String,
    pub role: ConnectorRole,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            debug!(path = %config_path.display(), types = config.node_types.len(), "Loaded config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Build the node type registry described by this config
    pub fn registry(&self) -> Arc<Registry> {
        self.node_types
            .iter()
            .fold(Registry::builder(), |builder, node_type| {
                builder.node_type(node_type.title.clone(), |mut t| {
                    for property in &node_type.properties {
                        t = t.property(property.title.clone(), property.default.clone());
                    }
                    for connector in &node_type.connectors {
                        t = t.connector(connector.title.clone(), connector.role);
                    }
                    t
                })
            })
            .build()
    }

    /// Resolve a project path, falling back to the configured one
    pub fn project_path(&self, cwd: &str, project: Option<&str>) -> PathBuf {
        PathBuf::from(cwd).join(project.unwrap_or(&self.project))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: default_project(),
            node_types: default_node_types(),
        }
    }
}

fn node_type(
    title: &str,
    properties: Vec<(&str, PropertyValue)>,
    connectors: Vec<(&str, ConnectorRole)>,
) -> NodeTypeConfig {
    NodeTypeConfig {
        title: title.to_string(),
        properties: properties
            .into_iter()
            .map(|(title, default)| PropertyConfig {
                title: title.to_string(),
                default,
            })
            .collect(),
        connectors: connectors
            .into_iter()
            .map(|(title, role)| ConnectorConfig {
                title: title.to_string(),
                role,
            })
            .collect(),
    }
}

fn default_node_types() -> Vec<NodeTypeConfig> {
    use ConnectorRole::{Input, Output};

    vec![
        node_type(
            "Group",
            vec![(TITLE_PROPERTY, "group".into()), ("opacity", 1.0.into())],
            vec![("in", Input), ("out", Output)],
        ),
        node_type(
            "Transform",
            vec![
                (TITLE_PROPERTY, "transform".into()),
                ("position", Vec2::new(0.0, 0.0).into()),
                ("rotation", 0.0.into()),
                ("scale", Vec2::new(1.0, 1.0).into()),
            ],
            vec![("parent", Input), ("matrix", Output)],
        ),
        node_type(
            "Text",
            vec![
                (TITLE_PROPERTY, "text".into()),
                ("content", "".into()),
                ("size", 12i64.into()),
                ("color", Vec3::new(1.0, 1.0, 1.0).into()),
            ],
            vec![("matrix", Input)],
        ),
        node_type(
            "Shape",
            vec![
                (TITLE_PROPERTY, "shape".into()),
                ("sides", 4i64.into()),
                ("radius", 50.0.into()),
                ("fill", Vec3::new(1.0, 1.0, 1.0).into()),
            ],
            vec![("matrix", Input)],
        ),
    ]
}
