//! Schema inference from type names and `Schema` tags.

use super::model::SchemaObject;
use crate::metadata::{attr, kinds, AttrValue, Tag};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema for a type name, plus the named component it refers to, if any.
///
/// The open object type is inferred as `string`; an explicit `type` on the
/// `Schema` tag is what turns it into an object.
pub fn infer_from_type(type_name: &str) -> (SchemaObject, Option<String>) {
    let simple = type_name.rsplit(['.', ':']).next().unwrap_or(type_name);

    if let Some(element) = simple.strip_suffix("[]") {
        let (items, component) = infer_from_type(element);
        let schema = SchemaObject {
            items: Some(Box::new(items)),
            ..SchemaObject::of_type("array")
        };
        return (schema, component);
    }

    let schema = match simple {
        "String" | "str" | "string" | "char" | "Character" => SchemaObject::of_type("string"),
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" | "int" | "Integer" | "short" | "Short"
        | "byte" | "Byte" => SchemaObject::formatted("integer", "int32"),
        "i64" | "u64" | "isize" | "usize" | "long" | "Long" | "BigInteger" => {
            SchemaObject::formatted("integer", "int64")
        }
        "f32" | "float" | "Float" => SchemaObject::formatted("number", "float"),
        "f64" | "double" | "Double" => SchemaObject::formatted("number", "double"),
        "BigDecimal" | "Decimal" => SchemaObject::of_type("number"),
        "bool" | "boolean" | "Boolean" => SchemaObject::of_type("boolean"),
        "OffsetDateTime" | "ZonedDateTime" | "Instant" | "DateTime" | "LocalDateTime" => {
            SchemaObject::formatted("string", "date-time")
        }
        "LocalDate" | "NaiveDate" | "Date" => SchemaObject::formatted("string", "date"),
        "UUID" | "Uuid" => SchemaObject::formatted("string", "uuid"),
        kinds::OPEN_OBJECT_TYPE => SchemaObject::of_type("string"),
        component => return (SchemaObject::reference(component), Some(component.to_string())),
    };
    (schema, None)
}

/// Schema described by a `Schema` tag.
///
/// Explicit attributes win over what the `implementation` implies. Named
/// components referenced by the result are added to `components`.
pub fn from_schema_tag(tag: &Tag, components: &mut BTreeMap<String, SchemaObject>) -> SchemaObject {
    if let Some(reference) = tag.str_attr(attr::REF) {
        return SchemaObject {
            reference: Some(reference.to_string()),
            ..Default::default()
        };
    }

    let mut schema = match tag.str_attr(attr::IMPLEMENTATION) {
        Some(implementation) => {
            let (inferred, component) = infer_from_type(implementation);
            register_component(component, components);
            inferred
        }
        None => SchemaObject::default(),
    };

    if let Some(schema_type) = tag.str_attr(attr::TYPE) {
        schema.reference = None;
        schema.schema_type = Some(schema_type.to_string());
        if schema.schema_type.as_deref() != Some("string") {
            schema.format = None;
        }
    }
    if let Some(format) = tag.str_attr(attr::FORMAT) {
        schema.format = Some(format.to_string());
    }
    if let Some(pattern) = tag.str_attr(attr::PATTERN) {
        schema.pattern = Some(pattern.to_string());
    }
    if let Some(example) = tag.attr(attr::EXAMPLE) {
        schema.example = example_value(example);
    }

    schema
}

/// Schema for a declared type name, registering components as needed.
pub fn for_type_name(type_name: &str, components: &mut BTreeMap<String, SchemaObject>) -> SchemaObject {
    let (schema, component) = infer_from_type(type_name);
    register_component(component, components);
    schema
}

fn register_component(component: Option<String>, components: &mut BTreeMap<String, SchemaObject>) {
    if let Some(name) = component {
        components
            .entry(name)
            .or_insert_with(|| SchemaObject::of_type("object"));
    }
}

fn example_value(value: &AttrValue) -> Option<Value> {
    match value {
        AttrValue::Str(s) if s.is_empty() => None,
        AttrValue::Str(s) => Some(Value::String(s.clone())),
        AttrValue::Bool(b) => Some(Value::Bool(*b)),
        AttrValue::Int(i) => Some(Value::from(*i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_inference() {
        assert_eq!(infer_from_type("java.lang.String").0, SchemaObject::of_type("string"));
        assert_eq!(infer_from_type("i64").0, SchemaObject::formatted("integer", "int64"));
        assert_eq!(infer_from_type("bool").0, SchemaObject::of_type("boolean"));
        assert_eq!(
            infer_from_type("java.time.OffsetDateTime").0,
            SchemaObject::formatted("string", "date-time")
        );
    }

    #[test]
    fn test_open_object_is_inferred_as_string() {
        let (schema, component) = infer_from_type("Object");
        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert!(component.is_none());
    }

    #[test]
    fn test_named_type_becomes_component() {
        let (schema, component) = infer_from_type("org.acme.model.User");
        assert_eq!(schema.reference.as_deref(), Some("#/components/schemas/User"));
        assert_eq!(component.as_deref(), Some("User"));
    }

    #[test]
    fn test_array_inference() {
        let (schema, _) = infer_from_type("String[]");
        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(schema.items.unwrap().schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_explicit_type_overrides_implementation() {
        let mut components = BTreeMap::new();
        let tag = Tag::new(kinds::SCHEMA)
            .with(attr::IMPLEMENTATION, "Object")
            .with(attr::TYPE, "object");

        let schema = from_schema_tag(&tag, &mut components);
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(components.is_empty());
    }

    #[test]
    fn test_schema_tag_details() {
        let mut components = BTreeMap::new();
        let tag = Tag::new(kinds::SCHEMA)
            .with(attr::IMPLEMENTATION, "OffsetDateTime")
            .with(attr::PATTERN, "yyyy-MM-dd'T'HH:mm:ssXXX")
            .with(attr::EXAMPLE, "2024-01-31T10:15:30+01:00");

        let schema = from_schema_tag(&tag, &mut components);
        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert_eq!(schema.format.as_deref(), Some("date-time"));
        assert_eq!(schema.pattern.as_deref(), Some("yyyy-MM-dd'T'HH:mm:ssXXX"));
        assert_eq!(
            schema.example,
            Some(Value::String("2024-01-31T10:15:30+01:00".into()))
        );
    }

    #[test]
    fn test_components_registered_once() {
        let mut components = BTreeMap::new();
        for_type_name("org.acme.User", &mut components);
        for_type_name("org.acme.User", &mut components);
        assert_eq!(components.len(), 1);
        assert_eq!(components["User"], SchemaObject::of_type("object"));
    }
}
