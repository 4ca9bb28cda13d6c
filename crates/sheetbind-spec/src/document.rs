use std::fmt;

use regex::Regex;
use schemars::JsonSchema;
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_yaml::with::singleton_map_recursive;
use sheetbind_common::{CellAddress, Region};

use crate::validation::{SpecIssue, ValidationError};

/// Current supported mapping specification version.
pub const CURRENT_SPEC_VERSION: &str = "0.2.0";
/// Constant identifier for mapping documents.
pub const SPEC_IDENT: &str = "sbm";

/// Canonical mapping document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "sheetbind Mapping Document",
    description = "Declares, per record field, where the field lives in a grid document and how its cell content converts to a typed value."
)]
#[serde(deny_unknown_fields)]
pub struct MappingDoc {
    /// Identifier for this specification (must be `sbm`).
    pub spec: String,
    #[serde(rename = "spec_version")]
    pub spec_version: SpecVersion,
    /// Human-facing metadata describing the mapping.
    pub mapping: MappingMeta,
    /// Record mappings, including sub-mappings referenced by table and nested bindings.
    pub records: Vec<RecordMapping>,
}

impl MappingDoc {
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        // Enum bindings are written as single-key maps (`cell: {at: B1}`),
        // not `!cell` tags, so the YAML path goes through singleton_map.
        singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_reader(reader))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        to_yaml_singleton_map(self)
    }

    /// Locate a record mapping by name.
    pub fn record(&self, name: &str) -> Option<&RecordMapping> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Normalize the document in-place for deterministic comparison.
    ///
    /// - Records are sorted lexicographically by name; field order is kept.
    /// - Tags (if any) are sorted and deduplicated.
    /// - Enum variant lists are deduplicated, preserving first occurrence.
    pub fn normalize(&mut self) {
        if let Some(tags) = &mut self.mapping.tags {
            tags.sort();
            tags.dedup();
        }

        self.records.sort_by(|a, b| a.name.cmp(&b.name));

        for record in &mut self.records {
            for field in &mut record.fields {
                field.field_type.dedup_enum_variants();
                if let Some(item) = &mut field.item_type {
                    item.dedup_enum_variants();
                }
            }
        }
    }

    /// Return a normalized copy of the document.
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Validate the document and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(SpecIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        let current_version = Version::parse(CURRENT_SPEC_VERSION)
            .expect("CURRENT_SPEC_VERSION must be valid semver");
        let spec_version = &self.spec_version.0;
        if spec_version.major != current_version.major {
            issues.push(SpecIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    spec_version, current_version.major
                ),
            ));
        }

        let id_pattern = Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$")
            .expect("mapping id regex must compile");
        if !id_pattern.is_match(&self.mapping.id) {
            issues.push(SpecIssue::new(
                "mapping.id",
                "id must be lowercase alphanumeric with hyphens, 3-64 chars".to_string(),
            ));
        }

        let mut seen_records = std::collections::HashSet::new();
        for (idx, record) in self.records.iter().enumerate() {
            if !seen_records.insert(&record.name) {
                issues.push(SpecIssue::new(
                    format!("records[{idx}].name"),
                    format!("duplicate record name `{}`", record.name),
                ));
            }
            record.validate_into(idx, self, &mut issues);
        }

        self.check_reference_cycles(&mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Detect cyclic nested/table mapping references. Cycles would make a pass
    /// recurse without bound, so they are a document error, not a data error.
    fn check_reference_cycles(&self, issues: &mut Vec<SpecIssue>) {
        for (idx, record) in self.records.iter().enumerate() {
            let mut stack = vec![record.name.as_str()];
            if self.walk_references(record, &mut stack) {
                issues.push(SpecIssue::new(
                    format!("records[{idx}]"),
                    format!("cyclic mapping reference through `{}`", stack.join(" -> ")),
                ));
            }
        }
    }

    fn walk_references<'a>(&'a self, record: &'a RecordMapping, stack: &mut Vec<&'a str>) -> bool {
        for field in &record.fields {
            let target = match &field.binding {
                Binding::TableRegion(t) => Some(t.mapping.as_str()),
                Binding::Nested(n) => Some(n.mapping.as_str()),
                _ => None,
            };
            let Some(target) = target else { continue };
            if stack.contains(&target) {
                stack.push(target);
                return true;
            }
            let Some(next) = self.record(target) else {
                // Missing references are reported per field elsewhere.
                continue;
            };
            stack.push(target);
            if self.walk_references(next, stack) {
                return true;
            }
            stack.pop();
        }
        false
    }
}

impl std::str::FromStr for MappingDoc {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MappingDoc::from_yaml_str(s)
    }
}

pub(crate) fn to_yaml_singleton_map<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    let mut out = Vec::new();
    let mut ser = serde_yaml::Serializer::new(&mut out);
    singleton_map_recursive::serialize(value, &mut ser)?;
    String::from_utf8(out).map_err(serde::ser::Error::custom)
}

/// Mapping metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MappingMeta {
    /// Stable identifier for the mapping (lowercase alphanumeric + hyphen).
    pub id: String,
    /// Human readable mapping name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// One record type bound to a sheet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RecordMapping {
    /// Record name, referenced by table/nested bindings and by callers.
    pub name: String,
    /// Target sheet. Optional for sub-mappings, which inherit the parent's sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered field declarations.
    pub fields: Vec<FieldSpec>,
}

impl RecordMapping {
    /// Locate a field spec by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn validate_into(&self, idx: usize, doc: &MappingDoc, issues: &mut Vec<SpecIssue>) {
        let mut seen_fields = std::collections::HashSet::new();
        for (fidx, field) in self.fields.iter().enumerate() {
            let path = format!("records[{idx}].fields[{fidx}]");
            if !seen_fields.insert(&field.name) {
                issues.push(SpecIssue::new(
                    format!("{path}.name"),
                    format!("duplicate field name `{}`", field.name),
                ));
            }
            field.validate_into(&path, doc, issues);
        }
    }
}

/// One field's declarative binding.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    /// Declared value type of the record field.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Where the field lives in the grid.
    pub binding: Binding,
    /// Converter options (trim, default literal, patterns, synonyms, ...).
    #[serde(default)]
    pub options: ConvertOptions,
    /// Item-type override for container fields; defaults to the declared element type.
    #[serde(default)]
    pub item_type: Option<FieldType>,
}

impl FieldSpec {
    fn validate_into(&self, path: &str, doc: &MappingDoc, issues: &mut Vec<SpecIssue>) {
        self.field_type.validate_into(&format!("{path}.type"), issues);
        if let Some(item) = &self.item_type {
            item.validate_into(&format!("{path}.item_type"), issues);
            if !item.is_scalar() {
                issues.push(SpecIssue::new(
                    format!("{path}.item_type"),
                    "item-type override must be a scalar type".to_string(),
                ));
            }
            if !self.field_type.is_container() {
                issues.push(SpecIssue::new(
                    format!("{path}.item_type"),
                    "item-type override is only valid on container fields".to_string(),
                ));
            }
        }

        let binding_path = format!("{path}.binding");
        match &self.binding {
            Binding::Cell(pos) => {
                pos.validate_into(&binding_path, issues);
                self.require_scalar(&binding_path, "cell", issues);
            }
            Binding::Labelled(labelled) => {
                labelled.validate_into(&binding_path, issues);
                self.require_scalar(&binding_path, "labelled", issues);
            }
            Binding::Column(column) => {
                if column.header.trim().is_empty() {
                    issues.push(SpecIssue::new(
                        format!("{binding_path}.header"),
                        "column header must not be empty".to_string(),
                    ));
                }
                self.require_scalar(&binding_path, "column", issues);
            }
            Binding::ArrayRegion(array) => {
                array.origin.validate_into(&format!("{binding_path}.origin"), issues);
                if !self.field_type.is_container() {
                    issues.push(SpecIssue::new(
                        binding_path.clone(),
                        format!(
                            "array_region binding requires a container type, found `{}`",
                            self.field_type.name()
                        ),
                    ));
                }
                if let FieldType::Array(arr) = &self.field_type
                    && array.count.is_none()
                    && arr.len == 0
                {
                    issues.push(SpecIssue::new(
                        binding_path.clone(),
                        "fixed-size array requires a region count or a declared length"
                            .to_string(),
                    ));
                }
            }
            Binding::TableRegion(table) => {
                table.origin.validate_into(&format!("{binding_path}.origin"), issues);
                if self.field_type != FieldType::Rows {
                    issues.push(SpecIssue::new(
                        binding_path.clone(),
                        format!(
                            "table_region binding requires type `rows`, found `{}`",
                            self.field_type.name()
                        ),
                    ));
                }
                match doc.record(&table.mapping) {
                    None => issues.push(SpecIssue::new(
                        format!("{binding_path}.mapping"),
                        format!("unknown mapping `{}`", table.mapping),
                    )),
                    Some(target) => {
                        let has_column = target
                            .fields
                            .iter()
                            .any(|f| matches!(f.binding, Binding::Column(_)));
                        if !has_column {
                            issues.push(SpecIssue::new(
                                format!("{binding_path}.mapping"),
                                format!(
                                    "mapping `{}` has no column-bound fields to form table rows",
                                    table.mapping
                                ),
                            ));
                        }
                    }
                }
            }
            Binding::Nested(nested) => {
                nested.origin.validate_into(&format!("{binding_path}.origin"), issues);
                if self.field_type != FieldType::Record {
                    issues.push(SpecIssue::new(
                        binding_path.clone(),
                        format!(
                            "nested binding requires type `record`, found `{}`",
                            self.field_type.name()
                        ),
                    ));
                }
                if doc.record(&nested.mapping).is_none() {
                    issues.push(SpecIssue::new(
                        format!("{binding_path}.mapping"),
                        format!("unknown mapping `{}`", nested.mapping),
                    ));
                }
            }
        }
    }

    fn require_scalar(&self, path: &str, kind: &str, issues: &mut Vec<SpecIssue>) {
        if !self.field_type.is_scalar() {
            issues.push(SpecIssue::new(
                path.to_string(),
                format!(
                    "{kind} binding requires a scalar type, found `{}`",
                    self.field_type.name()
                ),
            ));
        }
    }
}

/// Closed set of declared field types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Bool,
    Int,
    Float,
    Date,
    DateTime,
    Time,
    /// A nested sub-record described by a referenced mapping.
    Record,
    /// A sequence of sub-records, one per table row.
    Rows,
    /// A declared variant list.
    Enum(EnumType),
    /// Ordered sequence; read order is preserved.
    List(ContainerType),
    /// Deduplicated by value equality; first occurrence wins.
    Set(ContainerType),
    /// Fixed-size sequence.
    Array(ArrayType),
}

impl FieldType {
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            FieldType::Record
                | FieldType::Rows
                | FieldType::List(_)
                | FieldType::Set(_)
                | FieldType::Array(_)
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            FieldType::List(_) | FieldType::Set(_) | FieldType::Array(_)
        )
    }

    /// Declared element type of a container.
    pub fn item(&self) -> Option<&FieldType> {
        match self {
            FieldType::List(c) | FieldType::Set(c) => Some(&c.item),
            FieldType::Array(a) => Some(&a.item),
            _ => None,
        }
    }

    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Bool => "bool",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Record => "record",
            FieldType::Rows => "rows",
            FieldType::Enum(_) => "enum",
            FieldType::List(_) => "list",
            FieldType::Set(_) => "set",
            FieldType::Array(_) => "array",
        }
    }

    fn validate_into(&self, path: &str, issues: &mut Vec<SpecIssue>) {
        match self {
            FieldType::Enum(e) => {
                if e.variants.is_empty() {
                    issues.push(SpecIssue::new(
                        path.to_string(),
                        "enum type must declare at least one variant".to_string(),
                    ));
                }
            }
            FieldType::List(c) | FieldType::Set(c) => {
                c.item.validate_into(path, issues);
                if !c.item.is_scalar() {
                    issues.push(SpecIssue::new(
                        path.to_string(),
                        "container item type must be scalar".to_string(),
                    ));
                }
            }
            FieldType::Array(a) => {
                a.item.validate_into(path, issues);
                if !a.item.is_scalar() {
                    issues.push(SpecIssue::new(
                        path.to_string(),
                        "array item type must be scalar".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }

    fn dedup_enum_variants(&mut self) {
        if let FieldType::Enum(e) = self {
            let mut seen = std::collections::HashSet::new();
            e.variants.retain(|v| seen.insert(v.clone()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EnumType {
    /// Allowed values, in declaration order (order is kept for error messages).
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContainerType {
    pub item: Box<FieldType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ArrayType {
    pub item: Box<FieldType>,
    /// Fixed element count; `array_region` bindings may instead carry a count.
    #[serde(default)]
    pub len: u32,
}

/// Closed set of binding kinds; exactly one position strategy per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// A single explicitly addressed cell.
    Cell(PositionSpec),
    /// A cell at a directional offset from a label cell found by text search.
    Labelled(LabelledBinding),
    /// A directional run of item cells.
    ArrayRegion(ArrayRegionBinding),
    /// A rectangular table of header-labelled columns, one sub-record per row.
    TableRegion(TableRegionBinding),
    /// A column of a table mapping, located by its header text.
    Column(ColumnBinding),
    /// A nested sub-record at an origin offset.
    Nested(NestedBinding),
}

impl Binding {
    /// Name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::Cell(_) => "cell",
            Binding::Labelled(_) => "labelled",
            Binding::ArrayRegion(_) => "array_region",
            Binding::TableRegion(_) => "table_region",
            Binding::Column(_) => "column",
            Binding::Nested(_) => "nested",
        }
    }
}

/// Explicit position: an A1 address, or literal row/column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PositionSpec {
    /// A1-style address (e.g. `C4`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    /// 0-based row literal; signed so overrides can be validated, not clamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<i64>,
    /// 0-based column literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<i64>,
}

impl PositionSpec {
    pub fn a1(addr: impl Into<String>) -> Self {
        Self {
            at: Some(addr.into()),
            row: None,
            col: None,
        }
    }

    fn validate_into(&self, path: &str, issues: &mut Vec<SpecIssue>) {
        match (&self.at, self.row, self.col) {
            (Some(at), None, None) => {
                if let Err(err) = CellAddress::parse_a1(at) {
                    issues.push(SpecIssue::new(path.to_string(), err.to_string()));
                }
            }
            (None, Some(row), Some(col)) => {
                if let Err(err) = CellAddress::from_literals(row, col) {
                    issues.push(SpecIssue::new(path.to_string(), err.to_string()));
                }
            }
            _ => {
                issues.push(SpecIssue::new(
                    path.to_string(),
                    "position must set either `at` or both `row` and `col`".to_string(),
                ));
            }
        }
    }
}

/// Search/offset direction for labelled bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Right
    }
}

/// Layout axis for array and table regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Down,
    Right,
}

impl Default for Axis {
    fn default() -> Self {
        Axis::Down
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LabelledBinding {
    /// Label text to search for; matched against trimmed cell text.
    pub label: String,
    /// Treat `label` as an anchored regular expression.
    #[serde(default)]
    pub regex: bool,
    /// Direction from the label cell to the value cell.
    #[serde(default)]
    pub direction: Direction,
    /// Steps along `direction` (defaults to 1).
    #[serde(default = "default_offset")]
    pub offset: u32,
    /// Optional `A1:B2` region bounding the label search.
    #[serde(default)]
    pub within: Option<String>,
}

fn default_offset() -> u32 {
    1
}

impl LabelledBinding {
    fn validate_into(&self, path: &str, issues: &mut Vec<SpecIssue>) {
        if self.label.is_empty() {
            issues.push(SpecIssue::new(
                format!("{path}.label"),
                "label must not be empty".to_string(),
            ));
        }
        if self.regex && Regex::new(&self.label).is_err() {
            issues.push(SpecIssue::new(
                format!("{path}.label"),
                format!("label regex `{}` does not compile", self.label),
            ));
        }
        if self.offset == 0 {
            issues.push(SpecIssue::new(
                format!("{path}.offset"),
                "offset must be at least 1".to_string(),
            ));
        }
        if let Some(within) = &self.within
            && let Err(err) = Region::parse_a1(within)
        {
            issues.push(SpecIssue::new(format!("{path}.within"), err.to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ArrayRegionBinding {
    /// First item cell.
    pub origin: PositionSpec,
    /// Step axis: one row down or one column right per item.
    #[serde(default)]
    pub axis: Axis,
    /// Fixed item count. When absent, reading stops at the first blank cell.
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableRegionBinding {
    /// Leftmost cell of the header row.
    pub origin: PositionSpec,
    /// Name of the sub-mapping whose column-bound fields describe one row.
    pub mapping: String,
    /// Fixed row count. When absent, rows end where every mapped column is blank.
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ColumnBinding {
    /// Header text identifying this column within the table's header row.
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NestedBinding {
    /// Name of the sub-mapping to bind at `origin`.
    pub mapping: String,
    /// Origin the sub-mapping's explicit positions are relative to.
    pub origin: PositionSpec,
}

/// Per-field converter options. Everything defaults to off/unset; the engine
/// applies type-specific defaults where the document is silent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConvertOptions {
    /// Trim surrounding whitespace from raw cell text before conversion.
    #[serde(default)]
    pub trim: bool,
    /// Literal substituted when the (trimmed) cell text is empty on load, or
    /// when the field value is absent on save.
    #[serde(default)]
    pub default: Option<String>,
    /// Formula written on save instead of a formatted value.
    #[serde(default)]
    pub formula: Option<String>,
    /// When true, the formula takes precedence over a present value.
    #[serde(default)]
    pub formula_primary: bool,
    /// Text parse/format pattern (chrono `%` syntax for temporal types).
    #[serde(default)]
    pub pattern: Option<String>,
    /// Independently configurable number-format pattern applied to the cell
    /// style on save.
    #[serde(default)]
    pub grid_pattern: Option<String>,
    /// Retry a relaxed pattern set when strict parsing fails.
    #[serde(default)]
    pub lenient: bool,
    /// BCP 47 locale tag; selects message-template sets.
    #[serde(default)]
    pub locale: Option<String>,
    /// `local`, `utc`, or a fixed offset such as `+09:00`.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Synonyms accepted as true on load.
    #[serde(default)]
    pub true_values: Option<Vec<String>>,
    /// Synonyms accepted as false on load.
    #[serde(default)]
    pub false_values: Option<Vec<String>>,
    /// Case-insensitive synonym/variant matching (defaults to on).
    #[serde(default)]
    pub ignore_case: Option<bool>,
    /// Force unmatched boolean input to `false` instead of failing.
    #[serde(default)]
    pub fail_to_false: bool,
    /// Literal written for `true` (defaults to `true`).
    #[serde(default)]
    pub save_as_true: Option<String>,
    /// Literal written for `false` (defaults to `false`).
    #[serde(default)]
    pub save_as_false: Option<String>,
    /// When false, an absent value coerces to the type's zero value (`false`).
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Tolerate thousands separators on read and emit them on write.
    #[serde(default)]
    pub grouping: bool,
    /// Fixed decimal places on write for float fields.
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Wrap text in the written cell.
    #[serde(default)]
    pub wrap_text: bool,
    /// Shrink the written cell's text to fit.
    #[serde(default)]
    pub shrink_to_fit: bool,
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }

    pub fn current() -> Self {
        Self(Version::parse(CURRENT_SPEC_VERSION).expect("CURRENT_SPEC_VERSION must be valid semver"))
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 0.2.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl JsonSchema for SpecVersion {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "SpecVersion".into()
    }

    fn json_schema(_generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": r"^[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z-.]+)?(?:\+[0-9A-Za-z-.]+)?$"
        })
    }
}

pub(crate) mod example_data {
    use super::*;

    pub fn order_sheet_example() -> MappingDoc {
        serde_json::from_value(serde_json::json!({
            "spec": SPEC_IDENT,
            "spec_version": CURRENT_SPEC_VERSION,
            "mapping": {
                "id": "order-sheet",
                "name": "Order Sheet",
                "description": "Binds an order record and its line items to the Orders sheet."
            },
            "records": [
                {
                    "name": "order",
                    "sheet": "Orders",
                    "fields": [
                        {
                            "name": "code",
                            "type": "text",
                            "binding": { "cell": { "at": "B1" } },
                            "options": { "trim": true }
                        },
                        {
                            "name": "issued",
                            "type": "date",
                            "binding": { "labelled": { "label": "Issued", "direction": "right" } },
                            "options": { "pattern": "%Y-%m-%d" }
                        },
                        {
                            "name": "express",
                            "type": "bool",
                            "binding": { "cell": { "row": 2, "col": 1 } },
                            "options": { "true_values": ["yes", "○"], "false_values": ["no", "×"] }
                        },
                        {
                            "name": "remarks",
                            "type": { "list": { "item": "text" } },
                            "binding": { "array_region": { "origin": { "at": "D2" }, "axis": "down" } }
                        },
                        {
                            "name": "items",
                            "type": "rows",
                            "binding": { "table_region": { "origin": { "at": "A5" }, "mapping": "item" } }
                        }
                    ]
                },
                {
                    "name": "item",
                    "fields": [
                        { "name": "sku", "type": "text", "binding": { "column": { "header": "SKU" } } },
                        { "name": "qty", "type": "int", "binding": { "column": { "header": "Qty" } } }
                    ]
                }
            ]
        }))
        .expect("example mapping should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_validates() {
        example_data::order_sheet_example()
            .validate()
            .expect("example should validate");
    }

    #[test]
    fn yaml_roundtrip() {
        let doc = example_data::order_sheet_example();
        let yaml = doc.to_yaml().unwrap();
        // Bindings stay in the documented single-key map form, never `!` tags.
        assert!(!yaml.contains('!'), "unexpected YAML tag in:\n{yaml}");
        let reparsed = MappingDoc::from_yaml_str(&yaml).unwrap();
        assert_eq!(reparsed.records.len(), doc.records.len());
        assert_eq!(
            reparsed.record("order").unwrap().field("code").unwrap().binding,
            Binding::Cell(PositionSpec::a1("B1"))
        );
    }

    #[test]
    fn yaml_map_form_parses() {
        let doc = MappingDoc::from_yaml_str(
            r#"
spec: sbm
spec_version: "0.2.0"
mapping:
  id: map-form
  name: Map Form
records:
  - name: main
    sheet: S
    fields:
      - name: code
        type: text
        binding: { cell: { at: B1 } }
      - name: remarks
        type: { list: { item: text } }
        binding:
          array_region:
            origin: { at: D2 }
            axis: down
"#,
        )
        .unwrap();
        let field = doc.record("main").unwrap().field("code").unwrap();
        assert_eq!(field.binding, Binding::Cell(PositionSpec::a1("B1")));
        let remarks = doc.record("main").unwrap().field("remarks").unwrap();
        assert!(matches!(remarks.binding, Binding::ArrayRegion(_)));
        assert!(matches!(remarks.field_type, FieldType::List(_)));
    }

    #[test]
    fn normalize_sorts_records_and_dedups() {
        let mut doc = example_data::order_sheet_example();
        doc.mapping.tags = Some(vec!["b".into(), "a".into(), "a".into()]);
        doc.normalize();
        assert_eq!(doc.mapping.tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(doc.records[0].name, "item");
    }
}
