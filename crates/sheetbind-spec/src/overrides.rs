use schemars::JsonSchema;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::document::{
    Binding, ConvertOptions, FieldType, MappingDoc, SpecVersion, CURRENT_SPEC_VERSION,
};
use crate::validation::{SpecIssue, ValidationError};

/// Constant identifier for override documents.
pub const OVERRIDE_IDENT: &str = "sbo";

/// External override document (`spec: sbo`).
///
/// Presence of an entry for a (record, field) pair supersedes that field's
/// compile-time configuration wholesale; an entry marked `additive: true`
/// overlays only the attribute groups it carries. Absence leaves the
/// compile-time configuration untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OverrideDoc {
    /// Identifier for this specification (must be `sbo`).
    pub spec: String,
    #[serde(rename = "spec_version")]
    pub spec_version: SpecVersion,
    /// Per-field override entries.
    pub overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OverrideEntry {
    /// Target record mapping name.
    pub record: String,
    /// Target field name; must exist on the record.
    pub field: String,
    /// Overlay only the attribute groups present instead of replacing wholesale.
    #[serde(default)]
    pub additive: bool,
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub binding: Option<Binding>,
    #[serde(default)]
    pub options: Option<ConvertOptions>,
    #[serde(default)]
    pub item_type: Option<FieldType>,
}

impl OverrideDoc {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(yaml),
        )
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        crate::document::to_yaml_singleton_map(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply the overrides to `doc` in place.
    ///
    /// Malformed entries (unknown record or field, a wholesale entry missing
    /// its replacement type/binding) are configuration errors; nothing is
    /// applied when any entry is bad. The merged document is re-validated by
    /// the caller's binding step.
    pub fn apply_to(&self, doc: &mut MappingDoc) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != OVERRIDE_IDENT {
            issues.push(SpecIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    OVERRIDE_IDENT, self.spec
                ),
            ));
        }

        let current_version = Version::parse(CURRENT_SPEC_VERSION)
            .expect("CURRENT_SPEC_VERSION must be valid semver");
        if self.spec_version.0.major != current_version.major {
            issues.push(SpecIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    self.spec_version.0, current_version.major
                ),
            ));
        }

        for (idx, entry) in self.overrides.iter().enumerate() {
            let path = format!("overrides[{idx}]");
            let Some(record) = doc.records.iter().find(|r| r.name == entry.record) else {
                issues.push(SpecIssue::new(
                    format!("{path}.record"),
                    format!("unknown record `{}`", entry.record),
                ));
                continue;
            };
            if record.field(&entry.field).is_none() {
                issues.push(SpecIssue::new(
                    format!("{path}.field"),
                    format!(
                        "record `{}` has no field `{}`",
                        entry.record, entry.field
                    ),
                ));
                continue;
            }
            if !entry.additive && (entry.field_type.is_none() || entry.binding.is_none()) {
                issues.push(SpecIssue::new(
                    path,
                    "a wholesale override must carry both `type` and `binding`".to_string(),
                ));
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        for entry in &self.overrides {
            let record = doc
                .records
                .iter_mut()
                .find(|r| r.name == entry.record)
                .expect("record presence was checked above");
            let field = record
                .fields
                .iter_mut()
                .find(|f| f.name == entry.field)
                .expect("field presence was checked above");

            if entry.additive {
                if let Some(field_type) = &entry.field_type {
                    field.field_type = field_type.clone();
                }
                if let Some(binding) = &entry.binding {
                    field.binding = binding.clone();
                }
                if let Some(options) = &entry.options {
                    field.options = options.clone();
                }
                if let Some(item_type) = &entry.item_type {
                    field.item_type = Some(item_type.clone());
                }
            } else {
                field.field_type = entry
                    .field_type
                    .clone()
                    .expect("wholesale entry carries a type");
                field.binding = entry
                    .binding
                    .clone()
                    .expect("wholesale entry carries a binding");
                field.options = entry.options.clone().unwrap_or_default();
                field.item_type = entry.item_type.clone();
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for OverrideDoc {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverrideDoc::from_yaml_str(s)
    }
}
