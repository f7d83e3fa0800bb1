// Preset document layout (TOML)

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetDocument {
    pub container: ContainerSection,
    pub image: ImageSection,
    pub database: Option<DatabaseSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub env: Vec<EnvDecl>,
    #[serde(default)]
    pub ports: Vec<String>,
    #[serde(default)]
    pub healthcheck: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvDecl {
    pub name: String,
    pub value: EnvValue,
}

impl EnvDecl {
    /// `NAME=value` form passed to the engine.
    pub fn to_entry(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Environment values are either integers or strings; anything else fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Integer(i64),
    Text(String),
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Integer(n) => write!(f, "{n}"),
            EnvValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    pub name: String,
    pub reset_command: String,
}
