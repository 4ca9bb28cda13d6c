use sheetbind_common::CellValue;
use sheetbind_spec::ConvertOptions;

use super::{Converter, ParseFailure};

const DEFAULT_TRUE: &[&str] = &["true", "1", "yes", "on", "y", "t"];
const DEFAULT_FALSE: &[&str] = &["false", "0", "no", "off", "n", "f"];

/// Boolean converter with configurable synonym lists.
///
/// Unmatched input fails with the candidate list unless `fail_to_false` forces
/// it to `false`; `fail_to_false` covers absence too. Otherwise absence
/// coerces to `false` only for non-nullable fields.
pub struct BoolConverter {
    true_values: Vec<String>,
    false_values: Vec<String>,
    ignore_case: bool,
    fail_to_false: bool,
    nullable: bool,
    save_as_true: String,
    save_as_false: String,
}

impl BoolConverter {
    pub fn from_options(opts: &ConvertOptions) -> Self {
        Self {
            true_values: opts
                .true_values
                .clone()
                .unwrap_or_else(|| DEFAULT_TRUE.iter().map(|s| s.to_string()).collect()),
            false_values: opts
                .false_values
                .clone()
                .unwrap_or_else(|| DEFAULT_FALSE.iter().map(|s| s.to_string()).collect()),
            ignore_case: opts.ignore_case.unwrap_or(true),
            fail_to_false: opts.fail_to_false,
            nullable: opts.nullable.unwrap_or(true),
            save_as_true: opts.save_as_true.clone().unwrap_or_else(|| "true".to_string()),
            save_as_false: opts.save_as_false.clone().unwrap_or_else(|| "false".to_string()),
        }
    }

    fn matches(&self, candidates: &[String], text: &str) -> bool {
        candidates.iter().any(|c| {
            if self.ignore_case {
                // Unicode synonyms like `○` compare byte-wise either way.
                c.to_lowercase() == text.to_lowercase()
            } else {
                c == text
            }
        })
    }

    fn candidates(&self) -> String {
        self.true_values
            .iter()
            .chain(self.false_values.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the save literals are the stock `true`/`false`, in which case
    /// a native boolean cell is written instead of text.
    fn saves_native(&self) -> bool {
        self.save_as_true == "true" && self.save_as_false == "false"
    }
}

impl Converter for BoolConverter {
    fn target(&self) -> &'static str {
        "bool"
    }

    fn from_cell(&self, value: &CellValue) -> Option<CellValue> {
        match value {
            CellValue::Bool(_) => Some(value.clone()),
            _ => None,
        }
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        if self.matches(&self.true_values, text) {
            return Ok(CellValue::Bool(true));
        }
        if self.matches(&self.false_values, text) {
            return Ok(CellValue::Bool(false));
        }
        // fail_to_false is checked before any nullability coercion: unmatched
        // input never reaches the absence path.
        if self.fail_to_false {
            return Ok(CellValue::Bool(false));
        }
        Err(ParseFailure::new(text).var("candidates", self.candidates()))
    }

    fn format(&self, value: &CellValue) -> String {
        match value {
            CellValue::Bool(true) => self.save_as_true.clone(),
            CellValue::Bool(false) => self.save_as_false.clone(),
            other => other.as_text(),
        }
    }

    fn to_cell(&self, value: &CellValue) -> CellValue {
        if self.saves_native()
            && let CellValue::Bool(b) = value
        {
            return CellValue::Bool(*b);
        }
        CellValue::Text(self.format(value))
    }

    fn absent_value(&self) -> Option<CellValue> {
        // fail_to_false covers the blank cell too, before the nullability
        // coercion is consulted.
        if self.fail_to_false || !self.nullable {
            Some(CellValue::Bool(false))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(opts: ConvertOptions) -> BoolConverter {
        BoolConverter::from_options(&opts)
    }

    #[test]
    fn default_synonyms_cover_the_full_matrix() {
        let c = conv(ConvertOptions::default());
        for t in ["true", "1", "yes", "on", "y", "t", "TRUE", "Yes"] {
            assert_eq!(c.parse(t).unwrap(), CellValue::Bool(true), "input `{t}`");
        }
        for f in ["false", "0", "no", "off", "n", "f", "FALSE", "No"] {
            assert_eq!(c.parse(f).unwrap(), CellValue::Bool(false), "input `{f}`");
        }
    }

    #[test]
    fn unmatched_input_reports_candidates() {
        let c = conv(ConvertOptions::default());
        let err = c.parse("maybe").unwrap_err();
        assert_eq!(err.raw, "maybe");
        let candidates = &err.vars[0].1;
        assert!(candidates.contains("true"));
        assert!(candidates.contains("off"));
    }

    #[test]
    fn fail_to_false_forces_unmatched_input() {
        let c = conv(ConvertOptions {
            fail_to_false: true,
            ..Default::default()
        });
        assert_eq!(c.parse("maybe").unwrap(), CellValue::Bool(false));
    }

    #[test]
    fn custom_synonyms_replace_defaults() {
        let c = conv(ConvertOptions {
            true_values: Some(vec!["○".to_string()]),
            false_values: Some(vec!["×".to_string()]),
            ..Default::default()
        });
        assert_eq!(c.parse("○").unwrap(), CellValue::Bool(true));
        assert_eq!(c.parse("×").unwrap(), CellValue::Bool(false));
        assert!(c.parse("true").is_err(), "defaults are replaced, not extended");
    }

    #[test]
    fn case_sensitive_when_configured() {
        let c = conv(ConvertOptions {
            ignore_case: Some(false),
            ..Default::default()
        });
        assert!(c.parse("TRUE").is_err());
        assert_eq!(c.parse("true").unwrap(), CellValue::Bool(true));
    }

    #[test]
    fn absence_coerces_only_when_non_nullable() {
        let nullable = conv(ConvertOptions::default());
        assert_eq!(nullable.absent_value(), None);

        let primitive = conv(ConvertOptions {
            nullable: Some(false),
            ..Default::default()
        });
        assert_eq!(primitive.absent_value(), Some(CellValue::Bool(false)));
    }

    #[test]
    fn fail_to_false_covers_the_blank_cell() {
        let c = conv(ConvertOptions {
            fail_to_false: true,
            ..Default::default()
        });
        // Nullable, but the fail policy still forces false on absence.
        assert_eq!(c.absent_value(), Some(CellValue::Bool(false)));
    }

    #[test]
    fn save_literals_switch_to_text_cells() {
        let stock = conv(ConvertOptions::default());
        assert_eq!(stock.to_cell(&CellValue::Bool(true)), CellValue::Bool(true));

        let custom = conv(ConvertOptions {
            save_as_true: Some("○".to_string()),
            save_as_false: Some("×".to_string()),
            ..Default::default()
        });
        assert_eq!(
            custom.to_cell(&CellValue::Bool(false)),
            CellValue::Text("×".to_string())
        );
    }
}
