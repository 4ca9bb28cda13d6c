use sheetbind_common::CellValue;

use super::{Converter, ParseFailure};

/// Identity converter for text fields.
pub struct TextConverter;

impl Converter for TextConverter {
    fn target(&self) -> &'static str {
        "text"
    }

    fn from_cell(&self, _value: &CellValue) -> Option<CellValue> {
        // Text always takes the text path: a stored-text shortcut would skip
        // the trim/default steps that run before parse.
        None
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        Ok(CellValue::Text(text.to_string()))
    }

    fn format(&self, value: &CellValue) -> String {
        value.as_text()
    }

    fn to_cell(&self, value: &CellValue) -> CellValue {
        CellValue::Text(self.format(value))
    }
}

/// Matches input against a declared variant list; the stored value is the
/// canonical variant spelling, whatever the input's casing.
pub struct EnumConverter {
    variants: Vec<String>,
    ignore_case: bool,
}

impl EnumConverter {
    pub fn from_options(variants: &[String], opts: &sheetbind_spec::ConvertOptions) -> Self {
        Self {
            variants: variants.to_vec(),
            ignore_case: opts.ignore_case.unwrap_or(true),
        }
    }

    fn matches(&self, text: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| {
                if self.ignore_case {
                    v.eq_ignore_ascii_case(text)
                } else {
                    v.as_str() == text
                }
            })
            .map(String::as_str)
    }
}

impl Converter for EnumConverter {
    fn target(&self) -> &'static str {
        "enum"
    }

    fn from_cell(&self, _value: &CellValue) -> Option<CellValue> {
        // Enum matching always goes through the text path so unmatched values
        // surface the candidate list.
        None
    }

    fn parse(&self, text: &str) -> Result<CellValue, ParseFailure> {
        match self.matches(text) {
            Some(canonical) => Ok(CellValue::Text(canonical.to_string())),
            None => Err(ParseFailure::new(text).var("candidates", self.variants.join(", "))),
        }
    }

    fn format(&self, value: &CellValue) -> String {
        value.as_text()
    }

    fn to_cell(&self, value: &CellValue) -> CellValue {
        CellValue::Text(self.format(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_preserves_content() {
        let conv = TextConverter;
        assert_eq!(
            conv.parse("  spaced  ").unwrap(),
            CellValue::Text("  spaced  ".to_string())
        );
    }

    #[test]
    fn enum_match_is_case_insensitive_by_default() {
        let opts = sheetbind_spec::ConvertOptions::default();
        let conv = EnumConverter::from_options(
            &["Red".to_string(), "Green".to_string()],
            &opts,
        );
        assert_eq!(conv.parse("red").unwrap(), CellValue::Text("Red".to_string()));

        let err = conv.parse("Blue").unwrap_err();
        assert_eq!(err.raw, "Blue");
        assert_eq!(
            err.vars,
            vec![("candidates".to_string(), "Red, Green".to_string())]
        );
    }

    #[test]
    fn enum_case_sensitive_when_configured() {
        let opts = sheetbind_spec::ConvertOptions {
            ignore_case: Some(false),
            ..Default::default()
        };
        let conv = EnumConverter::from_options(&["Red".to_string()], &opts);
        assert!(conv.parse("red").is_err());
    }
}
