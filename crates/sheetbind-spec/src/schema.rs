use crate::document::MappingDoc;

/// Generate the JSON Schema for [`MappingDoc`] as a serde value.
pub fn generate_schema_value() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(MappingDoc))
        .expect("schema serialization cannot fail")
}

/// Generate the JSON Schema for [`MappingDoc`] as pretty-printed JSON.
pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value())
        .expect("schema serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_well_formed() {
        let value = generate_schema_value();
        assert!(value.is_object(), "schema root should be an object");
        let text = generate_schema_json_pretty();
        assert!(text.contains("sheetbind Mapping Document"));
    }
}
