//! Response-shape constraint for structured output
//!
//! A small subset of the service's OpenAPI-style schema: the six primitive
//! kinds, array items, and object properties. Object fields are always
//! required and keep their declaration order (sent as `propertyOrdering` so
//! the generated JSON lists fields the same way).

use serde::{Serialize, Serializer};

/// Primitive kinds understood by the service, serialized upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Expected JSON shape of a structured response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Box<Schema>>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_properties"
    )]
    properties: Vec<(String, Schema)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    property_ordering: Vec<String>,
}

impl Schema {
    fn primitive(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            items: None,
            properties: Vec::new(),
            required: Vec::new(),
            property_ordering: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::primitive(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::primitive(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::primitive(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::primitive(SchemaType::Boolean)
    }

    /// Array whose elements all match `item`.
    pub fn array(item: Schema) -> Self {
        Self {
            items: Some(Box::new(item)),
            ..Self::primitive(SchemaType::Array)
        }
    }

    /// Object with the given fields, all required, in the given order.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let properties: Vec<(String, Schema)> = fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        let names: Vec<String> = properties.iter().map(|(name, _)| name.clone()).collect();
        Self {
            properties,
            required: names.clone(),
            property_ordering: names,
            ..Self::primitive(SchemaType::Object)
        }
    }

    /// Attach a field description the model sees as guidance.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> SchemaType {
        self.kind
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_properties<S>(properties: &Vec<(String, Schema)>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(properties.iter().map(|(name, schema)| (name, schema)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_serialize_upper_case_type() {
        let cases = [
            (Schema::string(), "STRING"),
            (Schema::number(), "NUMBER"),
            (Schema::integer(), "INTEGER"),
            (Schema::boolean(), "BOOLEAN"),
        ];
        for (schema, expected) in cases {
            let json = serde_json::to_value(&schema).unwrap();
            assert_eq!(json, serde_json::json!({ "type": expected }));
        }
    }

    #[test]
    fn object_marks_all_fields_required_in_order() {
        let schema = Schema::object([
            ("question", Schema::string()),
            ("options", Schema::array(Schema::string())),
            ("correctIndex", Schema::integer()),
        ]);
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["type"], "OBJECT");
        assert_eq!(
            json["required"],
            serde_json::json!(["question", "options", "correctIndex"])
        );
        assert_eq!(
            json["propertyOrdering"],
            serde_json::json!(["question", "options", "correctIndex"])
        );
        assert_eq!(json["properties"]["options"]["type"], "ARRAY");
        assert_eq!(json["properties"]["options"]["items"]["type"], "STRING");
        assert_eq!(json["properties"]["correctIndex"]["type"], "INTEGER");
    }

    #[test]
    fn description_is_emitted_when_set() {
        let schema = Schema::boolean().describe("true when the answer is correct");
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["description"], "true when the answer is correct");
    }

    #[test]
    fn nested_objects_serialize_recursively() {
        let schema = Schema::object([(
            "steps",
            Schema::array(Schema::object([
                ("explanation", Schema::string()),
                ("result", Schema::string()),
            ])),
        )]);
        let json = serde_json::to_value(&schema).unwrap();
        let step = &json["properties"]["steps"]["items"];
        assert_eq!(step["type"], "OBJECT");
        assert_eq!(step["required"], serde_json::json!(["explanation", "result"]));
    }
}
