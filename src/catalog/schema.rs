//! Typed tool parameter schemas.
//!
//! Tool sources report JSON Schema as untyped JSON. The catalog keeps a
//! recursive, typed subset: type, description, object properties, array items,
//! enumerations and defaults. Anything else in the source schema is dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    #[default]
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    #[serde(other)]
    Any,
}

impl SchemaType {
    fn parse(s: &str) -> Self {
        match s {
            "object" => Self::Object,
            "array" => Self::Array,
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, InputSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<InputSchema>>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self::default()
    }

    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: InputSchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn required_property(mut self, name: impl Into<String>, schema: InputSchema) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.insert(name, schema);
        self
    }

    pub fn items(mut self, items: InputSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn enum_values(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Lenient conversion from a raw JSON Schema value.
    ///
    /// Missing or non-object input yields an empty object schema. A `type`
    /// array such as `["string", "null"]` takes its first non-null member.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::object();
        };

        let schema_type = match obj.get("type") {
            Some(Value::String(s)) => SchemaType::parse(s),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map(SchemaType::parse)
                .unwrap_or(SchemaType::Null),
            _ if obj.contains_key("properties") => SchemaType::Object,
            _ if obj.contains_key("items") => SchemaType::Array,
            _ if obj.is_empty() => SchemaType::Object,
            _ => SchemaType::Any,
        };

        let properties = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), Self::from_json(prop)))
                    .collect()
            })
            .unwrap_or_default();

        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        Self {
            schema_type,
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            properties,
            required,
            items: obj.get("items").map(|i| Box::new(Self::from_json(i))),
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            default: obj.get("default").cloned(),
        }
    }

    /// Render back to a JSON Schema value for export.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if self.schema_type != SchemaType::Any {
            obj.insert("type".into(), Value::String(self.schema_type.as_str().into()));
        }
        if let Some(desc) = &self.description {
            obj.insert("description".into(), Value::String(desc.clone()));
        }
        if !self.properties.is_empty() || self.schema_type == SchemaType::Object {
            let props: Map<String, Value> = self
                .properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_json()))
                .collect();
            obj.insert("properties".into(), Value::Object(props));
        }
        if !self.required.is_empty() {
            obj.insert(
                "required".into(),
                Value::Array(self.required.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(items) = &self.items {
            obj.insert("items".into(), items.to_json());
        }
        if !self.enum_values.is_empty() {
            obj.insert("enum".into(), Value::Array(self.enum_values.clone()));
        }
        if let Some(default) = &self.default {
            obj.insert("default".into(), default.clone());
        }
        Value::Object(obj)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Depth-first walk collecting every property description.
    pub fn descriptions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_descriptions(&mut out);
        out
    }

    fn collect_descriptions<'a>(&'a self, out: &mut Vec<&'a str>) {
        for prop in self.properties.values() {
            if let Some(d) = &prop.description {
                out.push(d);
            }
            prop.collect_descriptions(out);
        }
        if let Some(items) = &self.items {
            if let Some(d) = &items.description {
                out.push(d);
            }
            items.collect_descriptions(out);
        }
    }
}

impl From<&Value> for InputSchema {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_nested() {
        let schema = InputSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Repository path" },
                "files": {
                    "type": "array",
                    "items": { "type": "string", "description": "File to stage" }
                },
                "mode": { "type": "string", "enum": ["soft", "hard"] }
            },
            "required": ["path"]
        }));

        assert_eq!(schema.schema_type, SchemaType::Object);
        assert_eq!(schema.required, vec!["path"]);
        assert_eq!(schema.properties["files"].schema_type, SchemaType::Array);
        assert_eq!(
            schema.properties["files"].items.as_ref().unwrap().schema_type,
            SchemaType::String
        );
        assert_eq!(schema.properties["mode"].enum_values.len(), 2);
        assert_eq!(schema.descriptions(), vec!["File to stage", "Repository path"]);
    }

    #[test]
    fn test_from_json_nullable_type() {
        let schema = InputSchema::from_json(&json!({ "type": ["null", "integer"] }));
        assert_eq!(schema.schema_type, SchemaType::Integer);
    }

    #[test]
    fn test_from_json_non_object() {
        assert_eq!(InputSchema::from_json(&Value::Null), InputSchema::object());
    }

    #[test]
    fn test_to_json_preserves_structure() {
        let schema = InputSchema::object()
            .required_property("query", InputSchema::of_type(SchemaType::String))
            .property(
                "limit",
                InputSchema::of_type(SchemaType::Integer).description("Max results"),
            );
        let value = schema.to_json();

        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["query"]));
        assert_eq!(value["properties"]["limit"]["description"], "Max results");
        assert_eq!(InputSchema::from_json(&value), schema);
    }

    #[test]
    fn test_empty_object_has_properties_key() {
        let value = InputSchema::object().to_json();
        assert_eq!(value, json!({ "type": "object", "properties": {} }));
    }

    #[test]
    fn test_unknown_type_deserializes_as_any() {
        let schema: InputSchema = serde_json::from_str(r#"{"type": "tuple"}"#).unwrap();
        assert_eq!(schema.schema_type, SchemaType::Any);
    }
}
