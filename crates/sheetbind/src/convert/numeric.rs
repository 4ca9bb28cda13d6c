use sheetbind_common::CellValue;
use sheetbind_spec::ConvertOptions;

use super::{Converter, ParseFailure};

/// Invariant (locale-independent) integer converter. `.` is the only decimal
/// separator and `,` the only tolerated grouping separator.
pub struct IntConverter {
    grouping: bool,
}

impl IntConverter {
    pub fn from_options(opts: &ConvertOptions) -> Self {
        Self {
            grouping: opts.grouping,
        }
    }
}

impl Converter for IntConverter {
    fn target(&self) -> &'static str {
        "int"
    }

    fn from_cell(&self, value: &CellValue) -> Option<CellValue> {
        match value {
            CellValue::Int(_) => Some(value.clone()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() <= i64::MAX as f64 => {
                Some(CellValue::Int(*n as i64))
            }
            _ => None,
        }
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        let cleaned = strip_grouping(text, self.grouping);
        cleaned
            .parse::<i64>()
            .map(CellValue::Int)
            .map_err(|_| ParseFailure::new(text))
    }

    fn format(&self, value: &CellValue) -> String {
        match value {
            CellValue::Int(i) if self.grouping => group_integer(&i.to_string()),
            other => other.as_text(),
        }
    }

    fn grid_pattern(&self) -> Option<&str> {
        self.grouping.then_some("#,##0")
    }
}

/// Invariant floating-point converter with optional fixed decimals on write.
pub struct FloatConverter {
    grouping: bool,
    decimals: Option<u8>,
    grid_pattern: Option<String>,
}

impl FloatConverter {
    pub fn from_options(opts: &ConvertOptions) -> Self {
        let grid_pattern = match (opts.grouping, opts.decimals) {
            (_, Some(d)) => {
                let frac = "0".repeat(d as usize);
                let int_part = if opts.grouping { "#,##0" } else { "0" };
                if d == 0 {
                    Some(int_part.to_string())
                } else {
                    Some(format!("{int_part}.{frac}"))
                }
            }
            (true, None) => Some("#,##0.###".to_string()),
            (false, None) => None,
        };
        Self {
            grouping: opts.grouping,
            decimals: opts.decimals,
            grid_pattern,
        }
    }
}

impl Converter for FloatConverter {
    fn target(&self) -> &'static str {
        "float"
    }

    fn from_cell(&self, value: &CellValue) -> Option<CellValue> {
        match value {
            CellValue::Number(_) => Some(value.clone()),
            CellValue::Int(i) => Some(CellValue::Number(*i as f64)),
            _ => None,
        }
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        let cleaned = strip_grouping(text, self.grouping);
        match cleaned.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(CellValue::Number(n)),
            _ => Err(ParseFailure::new(text)),
        }
    }

    fn format(&self, value: &CellValue) -> String {
        let n = match value {
            CellValue::Number(n) => *n,
            CellValue::Int(i) => *i as f64,
            other => return other.as_text(),
        };
        let base = match self.decimals {
            Some(d) => format!("{:.*}", d as usize, n),
            None => n.to_string(),
        };
        if self.grouping {
            let (int_part, frac_part) = base.split_once('.').unwrap_or((base.as_str(), ""));
            let grouped = group_integer(int_part);
            if frac_part.is_empty() {
                grouped
            } else {
                format!("{grouped}.{frac_part}")
            }
        } else {
            base
        }
    }

    fn to_cell(&self, value: &CellValue) -> CellValue {
        match value {
            CellValue::Int(i) => CellValue::Number(*i as f64),
            other => other.clone(),
        }
    }

    fn grid_pattern(&self) -> Option<&str> {
        self.grid_pattern.as_deref()
    }
}

fn strip_grouping(text: &str, grouping: bool) -> String {
    if grouping {
        text.replace(',', "")
    } else {
        text.to_string()
    }
}

/// Insert thousands separators into a (possibly signed) integer string.
fn group_integer(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_parses_invariant() {
        let c = IntConverter::from_options(&ConvertOptions::default());
        assert_eq!(c.parse("42").unwrap(), CellValue::Int(42));
        assert_eq!(c.parse("-7").unwrap(), CellValue::Int(-7));
        assert!(c.parse("1,000").is_err(), "grouping rejected unless enabled");
        assert!(c.parse("4.5").is_err());
        assert!(c.parse("abc").is_err());
    }

    #[test]
    fn int_grouping_tolerated_and_emitted() {
        let c = IntConverter::from_options(&ConvertOptions {
            grouping: true,
            ..Default::default()
        });
        assert_eq!(c.parse("1,234,567").unwrap(), CellValue::Int(1_234_567));
        assert_eq!(c.format(&CellValue::Int(1_234_567)), "1,234,567");
        assert_eq!(c.format(&CellValue::Int(-1000)), "-1,000");
        assert_eq!(c.format(&CellValue::Int(999)), "999");
        assert_eq!(c.grid_pattern(), Some("#,##0"));
    }

    #[test]
    fn int_accepts_whole_numeric_cells() {
        let c = IntConverter::from_options(&ConvertOptions::default());
        assert_eq!(c.from_cell(&CellValue::Number(3.0)), Some(CellValue::Int(3)));
        assert_eq!(c.from_cell(&CellValue::Number(3.5)), None);
    }

    #[test]
    fn float_fixed_decimals_on_write() {
        let c = FloatConverter::from_options(&ConvertOptions {
            decimals: Some(2),
            ..Default::default()
        });
        assert_eq!(c.format(&CellValue::Number(3.14159)), "3.14");
        assert_eq!(c.format(&CellValue::Number(2.0)), "2.00");
        assert_eq!(c.grid_pattern(), Some("0.00"));
    }

    #[test]
    fn float_grouping_with_decimals() {
        let c = FloatConverter::from_options(&ConvertOptions {
            grouping: true,
            decimals: Some(1),
            ..Default::default()
        });
        assert_eq!(c.format(&CellValue::Number(1234.56)), "1,234.6");
        assert_eq!(c.grid_pattern(), Some("#,##0.0"));
    }

    #[test]
    fn float_rejects_non_finite() {
        let c = FloatConverter::from_options(&ConvertOptions::default());
        assert!(c.parse("NaN").is_err());
        assert!(c.parse("inf").is_err());
        assert_eq!(c.parse("-0.5").unwrap(), CellValue::Number(-0.5));
    }

    #[test]
    fn float_writes_native_number_cells() {
        let c = FloatConverter::from_options(&ConvertOptions::default());
        assert_eq!(c.to_cell(&CellValue::Int(3)), CellValue::Number(3.0));
        assert_eq!(c.to_cell(&CellValue::Number(0.5)), CellValue::Number(0.5));
    }
}
