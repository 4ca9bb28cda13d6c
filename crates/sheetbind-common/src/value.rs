use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A typed cell value as stored in a grid document.
///
/// This is the closed set of scalar types the binding engine converts to and
/// from; container shapes (lists, sets, sub-records) live in the record layer,
/// never in a single cell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Empty,
}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Int(i) => i.hash(state),
            CellValue::Number(n) => n.to_bits().hash(state),
            CellValue::Text(s) => s.hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Time(t) => t.hash(state),
            CellValue::Empty => state.write_u8(0),
        }
    }
}

impl Eq for CellValue {}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Time(t) => write!(f, "{t}"),
            CellValue::Empty => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Name of the stored type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "int",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Bool(_) => "bool",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
            CellValue::Time(_) => "time",
            CellValue::Empty => "empty",
        }
    }

    /// Structural blankness: `Empty` or zero-length text.
    ///
    /// Whitespace-only text is NOT blank; trimming is a converter concern.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Textual form used as converter input for non-native cells.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blankness() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text(String::new()).is_blank());
        assert!(!CellValue::Text("  ".into()).is_blank());
        assert!(!CellValue::Int(0).is_blank());
        assert!(!CellValue::Bool(false).is_blank());
    }

    #[test]
    fn display_forms() {
        assert_eq!(CellValue::Int(42).to_string(), "42");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2017, 8, 20).unwrap()).to_string(),
            "2017-08-20"
        );
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn hash_distinguishes_numbers() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(CellValue::Number(1.5));
        set.insert(CellValue::Number(1.5));
        set.insert(CellValue::Number(2.5));
        assert_eq!(set.len(), 2);
    }
}
