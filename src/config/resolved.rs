//! Resolved resource model: definitions validated and flattened for runtime use.

use crate::config::EnumValue;
use serde_json::Value;
use std::collections::HashMap;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Field names maintained by the system; payload values for them are ignored.
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Text,
    NonEmptyText,
    Email,
    Integer,
    PositiveInteger,
    Boolean,
    Enum(Vec<EnumValue>),
}

impl FieldKind {
    pub fn is_text(&self) -> bool {
        match self {
            FieldKind::Text | FieldKind::NonEmptyText | FieldKind::Email => true,
            FieldKind::Enum(values) => values.iter().all(|v| matches!(v, EnumValue::Text(_))),
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            FieldKind::Integer | FieldKind::PositiveInteger => true,
            FieldKind::Enum(values) => values.iter().all(|v| matches!(v, EnumValue::Int(_))),
            _ => false,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        if self.is_integer() {
            ColumnType::BigInt
        } else if matches!(self, FieldKind::Boolean) {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }
}

/// Storage type of a column; drives SQL casts, DDL and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    BigInt,
    Boolean,
    Timestamptz,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::BigInt => "bigint",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamptz => "timestamptz",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldRule {
    pub name: String,
    pub column: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    pub max_length: Option<usize>,
    /// Parent resource name when the field holds a foreign id.
    pub references: Option<String>,
    pub missing_code: String,
    pub invalid_code: String,
    pub duplicate_code: String,
}

#[derive(Clone, Debug)]
pub struct ChildSpec {
    pub resource: String,
    /// Field on the child resource holding the parent id.
    pub foreign_key: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub name: String,
    pub table: String,
    pub label: String,
    /// Declaration order; validation checks fields in this order.
    pub fields: Vec<FieldRule>,
    pub unique_key: Option<String>,
    pub search: Vec<String>,
    pub filters: Vec<String>,
    pub display_order: Option<String>,
    pub children: Vec<ChildSpec>,
}

impl ResolvedResource {
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn unique_field(&self) -> Option<&FieldRule> {
        self.unique_key.as_deref().and_then(|k| self.field(k))
    }

    /// Column name and type for a declared or system field.
    pub fn column(&self, field: &str) -> Option<(&str, ColumnType)> {
        match field {
            ID_FIELD => Some(("id", ColumnType::BigInt)),
            CREATED_AT_FIELD => Some(("created_at", ColumnType::Timestamptz)),
            UPDATED_AT_FIELD => Some(("updated_at", ColumnType::Timestamptz)),
            _ => self
                .field(field)
                .map(|f| (f.column.as_str(), f.kind.column_type())),
        }
    }

    /// All stored fields in column order: id, declared fields, timestamps.
    pub fn stored_fields(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.fields.len() + 3);
        out.push(ID_FIELD);
        out.extend(self.fields.iter().map(|f| f.name.as_str()));
        out.push(CREATED_AT_FIELD);
        out.push(UPDATED_AT_FIELD);
        out
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub resources: Vec<ResolvedResource>,
    pub by_name: HashMap<String, usize>,
}

impl ResolvedModel {
    pub fn resource(&self, name: &str) -> Option<&ResolvedResource> {
        self.by_name.get(name).and_then(|&i| self.resources.get(i))
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }
}
