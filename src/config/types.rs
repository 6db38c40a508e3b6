//! Raw resource definition types matching the JSON document (`{ "resources": [...] }`).

use serde::{Deserialize, Serialize};

/// Rule kind named in a field definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKindConfig {
    String,
    NonEmptyString,
    Email,
    Integer,
    PositiveInteger,
    Boolean,
    Enum,
}

/// One allowed value of an enum field. Text values compare case-sensitively; integer values
/// accept numeric strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Int(i64),
    Text(String),
}

impl EnumValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            EnumValue::Int(n) => serde_json::Value::Number((*n).into()),
            EnumValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for EnumValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumValue::Int(n) => write!(f, "{}", n),
            EnumValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub name: String,
    pub kind: FieldKindConfig,
    #[serde(default)]
    pub required: bool,
    /// Allowed values; only meaningful for `enum`.
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// Value used on create when the field is absent from the payload.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub max_length: Option<u32>,
    /// Column override; defaults to the snake_case field name.
    #[serde(default)]
    pub column: Option<String>,
    /// Parent resource whose id this field holds.
    #[serde(default)]
    pub references: Option<String>,
    #[serde(default)]
    pub missing_code: Option<String>,
    #[serde(default)]
    pub invalid_code: Option<String>,
    #[serde(default)]
    pub duplicate_code: Option<String>,
}

/// Dependent resource deleted together with its parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildConfig {
    pub resource: String,
    pub foreign_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    /// Path segment, e.g. `blog-posts`.
    pub name: String,
    pub table: String,
    /// Singular human name used in messages, e.g. `Blog post`.
    pub label: String,
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub unique_key: Option<String>,
    #[serde(default)]
    pub search: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub display_order: Option<String>,
    #[serde(default)]
    pub children: Vec<ChildConfig>,
}

/// All resource definitions in one document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    pub resources: Vec<ResourceConfig>,
}
