//! sheetbind mapping specification.
//!
//! Defines the declarative mapping document (`spec: sbm`) that describes where
//! each field of a record lives in a grid and how its cell content converts to
//! a typed value, plus the override document (`spec: sbo`) that replaces or
//! overlays per-field configuration without touching the compile-time
//! declarations.

pub mod document;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use document::{
    ArrayRegionBinding, ArrayType, Axis, Binding, ColumnBinding, ContainerType, ConvertOptions,
    Direction, EnumType, FieldSpec, FieldType, LabelledBinding, MappingDoc, MappingMeta,
    NestedBinding, PositionSpec, RecordMapping, SpecVersion, TableRegionBinding,
    CURRENT_SPEC_VERSION, SPEC_IDENT,
};
pub use overrides::{OverrideDoc, OverrideEntry, OVERRIDE_IDENT};
pub use schema::{generate_schema_json_pretty, generate_schema_value};
pub use validation::{SpecIssue, ValidationError};
