//! Runtime record values.
//!
//! A pass reads into (or writes out of) anything implementing [`RecordAccess`].
//! [`DynRecord`] is the engine-provided implementation: an ordered field map
//! that accepts any field name, which is what `Binder::load` hands back.

use sheetbind_common::CellValue;

/// Value held by one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A single converted cell value.
    Value(CellValue),
    /// Items of a list/set/array field, in region order.
    List(Vec<CellValue>),
    /// A nested sub-record.
    Record(DynRecord),
    /// Sub-records of a table region, one per row.
    Rows(Vec<DynRecord>),
}

impl FieldValue {
    pub fn as_value(&self) -> Option<&CellValue> {
        match self {
            FieldValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&DynRecord> {
        match self {
            FieldValue::Record(rec) => Some(rec),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[DynRecord]> {
        match self {
            FieldValue::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<CellValue> for FieldValue {
    fn from(value: CellValue) -> Self {
        FieldValue::Value(value)
    }
}

/// Field access contract between the engine and a record representation.
///
/// `has_field` reports whether the record type *declares* a field, independent
/// of whether a value is currently present; the binder verifies every mapped
/// field upfront so configuration mismatches surface before any cell is read.
pub trait RecordAccess {
    fn has_field(&self, field: &str) -> bool;

    fn get(&self, field: &str) -> Option<&FieldValue>;

    fn set(&mut self, field: &str, value: FieldValue);

    fn clear(&mut self, field: &str);
}

/// Ordered, dynamically-typed record. Fields keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DynRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Typed accessor: scalar value of a field.
    pub fn value(&self, field: &str) -> Option<&CellValue> {
        self.get(field)?.as_value()
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.value(field)? {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        match self.value(field)? {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.value(field)? {
            CellValue::Number(n) => Some(*n),
            CellValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match self.value(field)? {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn date(&self, field: &str) -> Option<chrono::NaiveDate> {
        match self.value(field)? {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> Option<&[CellValue]> {
        self.get(field)?.as_list()
    }

    pub fn record(&self, field: &str) -> Option<&DynRecord> {
        self.get(field)?.as_record()
    }

    pub fn rows(&self, field: &str) -> Option<&[DynRecord]> {
        self.get(field)?.as_rows()
    }
}

impl RecordAccess for DynRecord {
    /// Dynamic records accept every field name.
    fn has_field(&self, _field: &str) -> bool {
        true
    }

    fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    fn set(&mut self, field: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| name == field) {
            slot.1 = value;
        } else {
            self.fields.push((field.to_string(), value));
        }
    }

    fn clear(&mut self, field: &str) {
        self.fields.retain(|(name, _)| name != field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place_and_keeps_order() {
        let mut rec = DynRecord::new();
        rec.set("a", CellValue::Int(1).into());
        rec.set("b", CellValue::Text("x".into()).into());
        rec.set("a", CellValue::Int(2).into());

        let names: Vec<&str> = rec.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(rec.int("a"), Some(2));
    }

    #[test]
    fn typed_accessors_reject_wrong_variant() {
        let mut rec = DynRecord::new();
        rec.set("n", CellValue::Int(7).into());
        assert_eq!(rec.text("n"), None);
        assert_eq!(rec.number("n"), Some(7.0));
    }

    #[test]
    fn clear_removes_field() {
        let mut rec = DynRecord::new();
        rec.set("a", CellValue::Bool(true).into());
        rec.clear("a");
        assert!(rec.get("a").is_none());
    }
}
