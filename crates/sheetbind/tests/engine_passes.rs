use chrono::NaiveDate;
use sheetbind::{
    BindOptions, Binder, CellValue, FieldValue, GridReader, MappingBindings, MemoryGrid,
    RecordAccess,
};
use sheetbind_common::{CellAddress, Region};
use sheetbind_spec::{MappingDoc, OverrideDoc};

const ORDER_DOC: &str = r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: order-sheet
  name: Order Sheet
records:
  - name: order
    sheet: Orders
    fields:
      - name: code
        type: text
        binding: { cell: { at: B1 } }
        options: { trim: true }
      - name: issued
        type: date
        binding: { labelled: { label: Issued, direction: right } }
      - name: express
        type: bool
        binding: { cell: { at: B3 } }
        options: { true_values: ["○"], false_values: ["×"] }
      - name: remarks
        type: { list: { item: text } }
        binding: { array_region: { origin: { at: D2 }, axis: down } }
      - name: items
        type: rows
        binding: { table_region: { origin: { at: A5 }, mapping: item } }
      - name: shipping
        type: record
        binding: { nested: { mapping: address, origin: { at: F1 } } }
  - name: item
    fields:
      - name: sku
        type: text
        binding: { column: { header: SKU } }
      - name: qty
        type: int
        binding: { column: { header: Qty } }
  - name: address
    fields:
      - name: city
        type: text
        binding: { cell: { at: A1 } }
      - name: zip
        type: text
        binding: { cell: { at: A2 } }
"#;

fn bindings() -> MappingBindings {
    MappingBindings::new(MappingDoc::from_yaml_str(ORDER_DOC).unwrap()).unwrap()
}

fn order_grid() -> MemoryGrid {
    let mut grid = MemoryGrid::new();
    grid.set_text("Orders", "B1", "  ORD-7  ");
    grid.set_text("Orders", "A2", "Issued");
    grid.set_text("Orders", "B2", "2017-08-20");
    grid.set_text("Orders", "B3", "○");
    grid.set_text("Orders", "D2", "fragile");
    grid.set_text("Orders", "D3", "gift wrap");
    grid.set_text("Orders", "A5", "SKU");
    grid.set_text("Orders", "B5", "Qty");
    grid.set_text("Orders", "A6", "W-1");
    grid.set_text("Orders", "B6", "2");
    grid.set_text("Orders", "A7", "W-2");
    grid.set_text("Orders", "B7", "3");
    grid.set_text("Orders", "F1", "Osaka");
    grid.set_text("Orders", "F2", "530-0001");
    grid
}

#[test]
fn load_resolves_every_binding_kind() {
    let bindings = bindings();
    let binder = Binder::new(&bindings);
    let (order, report) = binder.load(&order_grid(), "order").unwrap();
    assert!(report.is_empty());

    assert_eq!(order.text("code"), Some("ORD-7"));
    assert_eq!(
        order.date("issued"),
        Some(NaiveDate::from_ymd_opt(2017, 8, 20).unwrap())
    );
    assert_eq!(order.boolean("express"), Some(true));
    assert_eq!(
        order.list("remarks"),
        Some(
            &[
                CellValue::Text("fragile".into()),
                CellValue::Text("gift wrap".into()),
            ][..]
        )
    );

    let items = order.rows("items").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].text("sku"), Some("W-1"));
    assert_eq!(items[0].int("qty"), Some(2));
    assert_eq!(items[1].text("sku"), Some("W-2"));
    assert_eq!(items[1].int("qty"), Some(3));

    let shipping = order.record("shipping").unwrap();
    assert_eq!(shipping.text("city"), Some("Osaka"));
    assert_eq!(shipping.text("zip"), Some("530-0001"));
}

#[test]
fn save_writes_changes_back() {
    let bindings = bindings();
    let binder = Binder::new(&bindings);
    let mut grid = order_grid();
    let (mut order, _) = binder.load(&grid, "order").unwrap();

    order.set("code", CellValue::Text("ORD-8".into()).into());
    order.set("express", CellValue::Bool(false).into());
    order.set(
        "remarks",
        FieldValue::List(vec![CellValue::Text("reorder".into())]),
    );

    let report = binder.save(&mut grid, "order", &order).unwrap();
    assert!(report.is_empty());

    assert_eq!(grid.cell_text("Orders", a1("B1")).unwrap(), "ORD-8");
    // Stock save literals write a native boolean cell.
    let cell = grid.read_cell("Orders", a1("B3")).unwrap().unwrap();
    assert_eq!(cell.value, Some(CellValue::Bool(false)));
    assert_eq!(grid.cell_text("Orders", a1("D2")).unwrap(), "reorder");
    // Labelled value round-trips through the searched position.
    assert_eq!(grid.cell_text("Orders", a1("B2")).unwrap(), "2017-08-20");
    // Table rows rewrite in place.
    assert_eq!(grid.cell_text("Orders", a1("A6")).unwrap(), "W-1");
    let qty = grid.read_cell("Orders", a1("B6")).unwrap().unwrap();
    assert_eq!(qty.value, Some(CellValue::Int(2)));
}

#[test]
fn merged_region_counts_as_one_item() {
    let bindings = bindings();
    let binder = Binder::new(&bindings);
    let mut grid = order_grid();
    // Re-shape the remarks run: D2:D3 merged into one item, next item at D4.
    grid.set_text("Orders", "D3", "");
    grid.set_text("Orders", "D4", "gift wrap");
    grid.add_merged_region("Orders", Region::parse_a1("D2:D3").unwrap())
        .unwrap();

    let (order, report) = binder.load(&grid, "order").unwrap();
    assert!(report.is_empty());
    assert_eq!(
        order.list("remarks"),
        Some(
            &[
                CellValue::Text("fragile".into()),
                CellValue::Text("gift wrap".into()),
            ][..]
        )
    );
}

#[test]
fn counted_array_keeps_blank_placeholders() {
    let doc = r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: slots
  name: Slots
records:
  - name: main
    sheet: S
    fields:
      - name: slots
        type:
          array:
            item: text
            len: 4
        binding:
          array_region:
            origin: { at: A1 }
            axis: right
"#;
    let bindings = MappingBindings::new(MappingDoc::from_yaml_str(doc).unwrap()).unwrap();
    let mut grid = MemoryGrid::new();
    grid.set_text("S", "A1", "a");
    // B1 is blank on purpose.
    grid.set_text("S", "C1", "c");
    grid.set_text("S", "D1", "d");

    let binder = Binder::new(&bindings);
    let (record, report) = binder.load(&grid, "main").unwrap();
    assert!(report.is_empty());
    assert_eq!(
        record.list("slots"),
        Some(
            &[
                CellValue::Text("a".into()),
                CellValue::Empty,
                CellValue::Text("c".into()),
                CellValue::Text("d".into()),
            ][..]
        )
    );
}

#[test]
fn set_field_dedups_first_occurrence() {
    let doc = r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: tags
  name: Tags
records:
  - name: main
    sheet: S
    fields:
      - name: tags
        type: { set: { item: text } }
        binding:
          array_region:
            origin: { at: A1 }
            axis: down
"#;
    let bindings = MappingBindings::new(MappingDoc::from_yaml_str(doc).unwrap()).unwrap();
    let mut grid = MemoryGrid::new();
    grid.set_text("S", "A1", "red");
    grid.set_text("S", "A2", "blue");
    grid.set_text("S", "A3", "red");

    let (record, _) = Binder::new(&bindings).load(&grid, "main").unwrap();
    assert_eq!(
        record.list("tags"),
        Some(
            &[
                CellValue::Text("red".into()),
                CellValue::Text("blue".into()),
            ][..]
        )
    );
}

#[test]
fn formula_takes_precedence_only_when_primary() {
    let doc = r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: totals
  name: Totals
records:
  - name: main
    sheet: S
    fields:
      - name: subtotal
        type: int
        binding: { cell: { at: A1 } }
        options: { formula: "SUM(B1:B9)" }
      - name: total
        type: int
        binding: { cell: { at: A2 } }
        options: { formula: "SUM(A1:A1)", formula_primary: true }
"#;
    let bindings = MappingBindings::new(MappingDoc::from_yaml_str(doc).unwrap()).unwrap();
    let mut grid = MemoryGrid::new();
    grid.add_sheet("S");

    let mut record = sheetbind::DynRecord::new();
    record.set("subtotal", CellValue::Int(10).into());
    record.set("total", CellValue::Int(99).into());

    Binder::new(&bindings).save(&mut grid, "main", &record).unwrap();

    // Value present and formula not primary: the value wins.
    let subtotal = grid.read_cell("S", a1("A1")).unwrap().unwrap();
    assert_eq!(subtotal.value, Some(CellValue::Int(10)));
    assert_eq!(subtotal.formula, None);
    // formula_primary overrides even a present value.
    let total = grid.read_cell("S", a1("A2")).unwrap().unwrap();
    assert_eq!(total.formula.as_deref(), Some("SUM(A1:A1)"));

    // Absent value falls back to the formula.
    record.clear("subtotal");
    Binder::new(&bindings).save(&mut grid, "main", &record).unwrap();
    let subtotal = grid.read_cell("S", a1("A1")).unwrap().unwrap();
    assert_eq!(subtotal.formula.as_deref(), Some("SUM(B1:B9)"));
}

#[test]
fn override_document_redirects_a_field() {
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
    .unwrap();
    let doc = MappingDoc::from_yaml_str(ORDER_DOC).unwrap();
    let bindings = MappingBindings::with_overrides(doc, &overrides).unwrap();

    let mut grid = order_grid();
    grid.set_text("Orders", "A1", "Code");
    grid.set_text("Orders", "B1", "ORD-9");

    let (order, _) = Binder::new(&bindings).load(&grid, "order").unwrap();
    // Wholesale replacement also dropped the trim option.
    assert_eq!(order.text("code"), Some("ORD-9"));
}

#[test]
fn blank_cell_takes_default_literal() {
    let doc = r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: defaults
  name: Defaults
records:
  - name: main
    sheet: S
    fields:
      - name: note
        type: text
        binding: { cell: { at: A1 } }
        options: { default: "初期値" }
      - name: since
        type: date
        binding: { cell: { at: A2 } }
        options: { default: "2017-08-20" }
"#;
    let bindings = MappingBindings::new(MappingDoc::from_yaml_str(doc).unwrap()).unwrap();
    let mut grid = MemoryGrid::new();
    grid.add_sheet("S");

    let (record, report) = Binder::new(&bindings).load(&grid, "main").unwrap();
    assert!(report.is_empty());
    assert_eq!(record.text("note"), Some("初期値"));
    assert_eq!(
        record.date("since"),
        Some(NaiveDate::from_ymd_opt(2017, 8, 20).unwrap())
    );
}

#[test]
fn missing_sheet_is_rejected_upfront() {
    let bindings = bindings();
    let grid = MemoryGrid::new();
    let err = Binder::new(&bindings).load(&grid, "order").unwrap_err();
    assert!(matches!(
        err,
        sheetbind::BindError::MissingSheet { ref sheet, .. } if sheet == "Orders"
    ));
}

#[test]
fn unknown_record_is_a_config_error() {
    let bindings = bindings();
    let err = Binder::new(&bindings)
        .load(&order_grid(), "no_such_record")
        .unwrap_err();
    assert!(matches!(
        err,
        sheetbind::BindError::Config(sheetbind::ConfigError::UnknownMapping(_))
    ));
}

#[test]
fn typed_record_must_declare_mapped_fields() {
    struct OnlyCode {
        code: Option<FieldValue>,
    }
    impl sheetbind::RecordAccess for OnlyCode {
        fn has_field(&self, field: &str) -> bool {
            field == "code"
        }
        fn get(&self, field: &str) -> Option<&FieldValue> {
            (field == "code").then(|| self.code.as_ref()).flatten()
        }
        fn set(&mut self, field: &str, value: FieldValue) {
            if field == "code" {
                self.code = Some(value);
            }
        }
        fn clear(&mut self, field: &str) {
            if field == "code" {
                self.code = None;
            }
        }
    }

    let bindings = bindings();
    let mut record = OnlyCode { code: None };
    let err = Binder::new(&bindings)
        .load_into(&order_grid(), "order", &mut record)
        .unwrap_err();
    assert!(matches!(
        err,
        sheetbind::BindError::Config(sheetbind::ConfigError::UnknownField { .. })
    ));
}

#[test]
fn load_with_options_continues_and_save_roundtrips_dates() {
    let bindings = bindings();
    let binder = Binder::new(&bindings).with_options(BindOptions {
        continue_on_error: true,
        locale: None,
    });
    let mut grid = order_grid();
    let (order, _) = binder.load(&grid, "order").unwrap();

    // Dates write back as native date cells through the labelled position.
    binder.save(&mut grid, "order", &order).unwrap();
    let issued = grid.read_cell("Orders", a1("B2")).unwrap().unwrap();
    assert_eq!(
        issued.value,
        Some(CellValue::Date(NaiveDate::from_ymd_opt(2017, 8, 20).unwrap()))
    );
    assert_eq!(
        issued.style.as_ref().and_then(|s| s.number_format.as_deref()),
        Some("yyyy-mm-dd")
    );
}

fn a1(text: &str) -> CellAddress {
    CellAddress::parse_a1(text).unwrap()
}
