use sheetbind_spec::{
    Binding, ConvertOptions, FieldType, MappingDoc, NestedBinding, OverrideDoc, PositionSpec,
};

fn load_fixture(name: &str) -> MappingDoc {
    let path = format!("tests/fixtures/{}.yaml", name);
    let text = std::fs::read_to_string(path).expect("failed to read fixture");
    MappingDoc::from_yaml_str(&text).expect("fixture should deserialize")
}

#[test]
fn order_sheet_fixture_validates() {
    let doc = load_fixture("order_sheet");
    doc.validate().expect("fixture should validate");
}

#[test]
fn wrong_spec_ident_rejected() {
    let mut doc = load_fixture("order_sheet");
    doc.spec = "fio".to_string();
    let err = doc.validate().expect_err("validation should fail");
    assert!(err.issues().iter().any(|i| i.path == "spec"));
}

#[test]
fn malformed_address_reported_with_path() {
    let mut doc = load_fixture("order_sheet");
    let field = doc.records[0]
        .fields
        .iter_mut()
        .find(|f| f.name == "code")
        .unwrap();
    field.binding = Binding::Cell(PositionSpec::a1("not an address"));

    let err = doc.validate().expect_err("validation should fail");
    let issue = err
        .issues()
        .iter()
        .find(|i| i.path == "records[0].fields[0].binding")
        .expect("expected a binding issue");
    assert!(issue.message.contains("malformed A1 address"));
}

#[test]
fn negative_position_literal_rejected() {
    let mut doc = load_fixture("order_sheet");
    let field = doc.records[0]
        .fields
        .iter_mut()
        .find(|f| f.name == "express")
        .unwrap();
    field.binding = Binding::Cell(PositionSpec {
        at: None,
        row: Some(-1),
        col: Some(0),
    });

    let err = doc.validate().expect_err("validation should fail");
    assert!(err.issues().iter().any(|i| i.message.contains("negative")));
}

#[test]
fn array_binding_requires_container_type() {
    let mut doc = load_fixture("order_sheet");
    let field = doc.records[0]
        .fields
        .iter_mut()
        .find(|f| f.name == "remarks")
        .unwrap();
    field.field_type = FieldType::Text;

    let err = doc.validate().expect_err("validation should fail");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("array_region binding requires a container type"))
    );
}

#[test]
fn unknown_table_mapping_rejected() {
    let mut doc = load_fixture("order_sheet");
    doc.records.retain(|r| r.name != "item");

    let err = doc.validate().expect_err("validation should fail");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("unknown mapping `item`"))
    );
}

#[test]
fn cyclic_nested_reference_rejected() {
    let mut doc = load_fixture("order_sheet");
    let item = doc
        .records
        .iter_mut()
        .find(|r| r.name == "item")
        .unwrap();
    item.fields.push(sheetbind_spec::FieldSpec {
        name: "parent".to_string(),
        field_type: FieldType::Record,
        binding: Binding::Nested(NestedBinding {
            mapping: "order".to_string(),
            origin: PositionSpec::a1("A1"),
        }),
        options: ConvertOptions::default(),
        item_type: None,
    });

    let err = doc.validate().expect_err("validation should fail");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("cyclic mapping reference"))
    );
}

#[test]
fn duplicate_field_names_rejected() {
    let mut doc = load_fixture("order_sheet");
    let clone = doc.records[0].fields[0].clone();
    doc.records[0].fields.push(clone);

    let err = doc.validate().expect_err("validation should fail");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("duplicate field name `code`"))
    );
}

#[test]
fn wholesale_override_replaces_everything() {
    let mut doc = load_fixture("order_sheet");
    let overrides = OverrideDoc::from_yaml_str(
        r#"
spec: sbo
spec_version: "0.2.0"
overrides:
  - record: order
    field: code
    type: text
    binding:
      labelled:
        label: Code
        direction: right
"#,
    )
    .expect("override doc parses");

    overrides.apply_to(&mut doc).expect("overrides apply");
    let field = doc.record("order").unwrap().field("code").unwrap();
    assert!(matches!(&field.binding, Binding::Labelled(l) if l.label == "Code"));
    // Wholesale replacement drops the compile-time options too.
    assert_eq!(field.options, ConvertOptions::default());
    doc.validate().expect("merged document still validates");
}

#[test]
fn additive_override_overlays_only_present_groups() {
    let mut doc = load_fixture("order_sheet");
    let overrides = OverrideDoc::from_yaml_str(
        r#"
spec: sbo
spec_version: "0.2.0"
overrides:
  - record: order
    field: code
    additive: true
    options:
      trim: true
      default: "N/A"
"#,
    )
    .expect("override doc parses");

    overrides.apply_to(&mut doc).expect("overrides apply");
    let field = doc.record("order").unwrap().field("code").unwrap();
    // Binding untouched, options replaced as a group.
    assert_eq!(field.binding, Binding::Cell(PositionSpec::a1("B1")));
    assert_eq!(field.options.default.as_deref(), Some("N/A"));
    assert!(field.options.trim);
}

#[test]
fn override_unknown_field_is_an_error() {
    let mut doc = load_fixture("order_sheet");
    let overrides = OverrideDoc::from_yaml_str(
        r#"
spec: sbo
spec_version: "0.2.0"
overrides:
  - record: order
    field: no_such_field
    additive: true
"#,
    )
    .expect("override doc parses");

    let err = overrides
        .apply_to(&mut doc)
        .expect_err("unknown field must be rejected");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("no field `no_such_field`"))
    );
}

#[test]
fn wholesale_override_without_binding_is_an_error() {
    let mut doc = load_fixture("order_sheet");
    let overrides = OverrideDoc::from_yaml_str(
        r#"
spec: sbo
spec_version: "0.2.0"
overrides:
  - record: order
    field: code
    type: text
"#,
    )
    .expect("override doc parses");

    let err = overrides
        .apply_to(&mut doc)
        .expect_err("incomplete wholesale override must be rejected");
    assert!(
        err.issues()
            .iter()
            .any(|i| i.message.contains("must carry both `type` and `binding`"))
    );
}

#[test]
fn yaml_disk_roundtrip() {
    let doc = load_fixture("order_sheet");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.yaml");
    std::fs::write(&path, doc.to_yaml().unwrap()).unwrap();

    let reloaded =
        MappingDoc::from_yaml_reader(std::fs::File::open(&path).unwrap()).expect("reloads");
    reloaded.validate().expect("reloaded document validates");
    assert_eq!(reloaded.records.len(), doc.records.len());
}
