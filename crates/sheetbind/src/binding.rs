//! Bound mapping model.
//!
//! [`MappingBindings`] turns a validated mapping document into a resolved
//! form: parsed addresses, compiled label matchers, built converter pipelines,
//! and parsed default literals. Every configuration error surfaces here,
//! before any pass touches a cell.

use regex::Regex;
use sheetbind_common::{Axis, CellAddress, Direction, Region};
use sheetbind_spec::{
    self as spec, Binding, FieldSpec, FieldType, MappingDoc, OverrideDoc, PositionSpec,
    RecordMapping,
};

use crate::convert::{ConverterRegistry, Pipeline};
use crate::error::{BindError, ConfigError};
use crate::resolver::LabelMatcher;

/// A mapping document resolved into directly executable bindings.
#[derive(Debug)]
pub struct MappingBindings {
    doc: MappingDoc,
    records: Vec<BoundRecord>,
}

impl MappingBindings {
    /// Validate and resolve with the built-in converter set.
    pub fn new(doc: MappingDoc) -> Result<Self, BindError> {
        Self::with_registry(doc, &ConverterRegistry::new())
    }

    /// Apply an override document first, then validate and resolve the merged
    /// result. Nothing is applied when any override entry is bad.
    pub fn with_overrides(mut doc: MappingDoc, overrides: &OverrideDoc) -> Result<Self, BindError> {
        overrides.apply_to(&mut doc)?;
        Self::new(doc)
    }

    /// Validate and resolve with custom converters available.
    pub fn with_registry(doc: MappingDoc, registry: &ConverterRegistry) -> Result<Self, BindError> {
        doc.validate()?;
        let records = doc
            .records
            .iter()
            .map(|record| BoundRecord::build(record, &doc, registry))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { doc, records })
    }

    pub fn doc(&self) -> &MappingDoc {
        &self.doc
    }

    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub(crate) fn record_index(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }

    pub(crate) fn bound(&self, index: usize) -> &BoundRecord {
        &self.records[index]
    }
}

/// One record mapping, fully resolved.
#[derive(Debug)]
pub(crate) struct BoundRecord {
    pub(crate) name: String,
    pub(crate) sheet: Option<String>,
    pub(crate) fields: Vec<BoundField>,
}

#[derive(Debug)]
pub(crate) struct BoundField {
    pub(crate) name: String,
    pub(crate) kind: BoundKind,
}

#[derive(Debug)]
pub(crate) enum BoundKind {
    /// Single explicitly addressed cell.
    Cell { addr: CellAddress, pipeline: Pipeline },
    /// Cell at a directional offset from a searched label.
    Labelled {
        matcher: LabelMatcher,
        direction: Direction,
        offset: u32,
        within: Option<Region>,
        pipeline: Pipeline,
    },
    /// Directional run of item cells.
    Array {
        origin: CellAddress,
        axis: Axis,
        count: Option<u32>,
        shape: ContainerShape,
        pipeline: Pipeline,
    },
    /// Header row plus one sub-record per data row.
    Table {
        origin: CellAddress,
        mapping: usize,
        count: Option<u32>,
    },
    /// Column of a table mapping, located by header text.
    Column { header: String, pipeline: Pipeline },
    /// Sub-record whose positions are relative to an origin.
    Nested { origin: CellAddress, mapping: usize },
}

/// Container semantics of an array-region field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerShape {
    /// Region order preserved.
    List,
    /// Deduplicated by value equality, first occurrence wins.
    Set,
    /// Fixed length; blank positions hold `Empty` placeholders.
    Array { len: u32 },
}

impl BoundRecord {
    fn build(
        record: &RecordMapping,
        doc: &MappingDoc,
        registry: &ConverterRegistry,
    ) -> Result<Self, ConfigError> {
        let fields = record
            .fields
            .iter()
            .map(|field| BoundField::build(field, doc, registry))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            name: record.name.clone(),
            sheet: record.sheet.clone(),
            fields,
        })
    }

    pub(crate) fn column_fields(&self) -> impl Iterator<Item = (&BoundField, &str, &Pipeline)> {
        self.fields.iter().filter_map(|field| match &field.kind {
            BoundKind::Column { header, pipeline } => Some((field, header.as_str(), pipeline)),
            _ => None,
        })
    }
}

impl BoundField {
    fn build(
        field: &FieldSpec,
        doc: &MappingDoc,
        registry: &ConverterRegistry,
    ) -> Result<Self, ConfigError> {
        let kind = match &field.binding {
            Binding::Cell(pos) => BoundKind::Cell {
                addr: resolve_position(&field.name, pos)?,
                pipeline: scalar_pipeline(field, registry)?,
            },
            Binding::Labelled(labelled) => {
                let matcher = if labelled.regex {
                    let anchored = format!("^(?:{})$", labelled.label);
                    let re = Regex::new(&anchored).map_err(|err| {
                        ConfigError::UnsupportedBinding {
                            field: field.name.clone(),
                            kind: "labelled",
                            reason: format!("label regex does not compile: {err}"),
                        }
                    })?;
                    LabelMatcher::Pattern(re)
                } else {
                    LabelMatcher::Text(labelled.label.clone())
                };
                let within = match &labelled.within {
                    Some(text) => Some(Region::parse_a1(text).map_err(|source| {
                        ConfigError::InvalidPosition {
                            field: field.name.clone(),
                            source,
                        }
                    })?),
                    None => None,
                };
                BoundKind::Labelled {
                    matcher,
                    direction: convert_direction(labelled.direction),
                    offset: labelled.offset,
                    within,
                    pipeline: scalar_pipeline(field, registry)?,
                }
            }
            Binding::ArrayRegion(array) => {
                let (shape, item_type) = container_shape(field)?;
                let count = match (array.count, shape) {
                    (Some(n), _) => Some(n),
                    (None, ContainerShape::Array { len }) => Some(len),
                    (None, _) => None,
                };
                BoundKind::Array {
                    origin: resolve_position(&field.name, &array.origin)?,
                    axis: convert_axis(array.axis),
                    count,
                    shape,
                    pipeline: Pipeline::build(&field.name, item_type, &field.options, registry)?,
                }
            }
            Binding::TableRegion(table) => BoundKind::Table {
                origin: resolve_position(&field.name, &table.origin)?,
                mapping: mapping_index(doc, &table.mapping)?,
                count: table.count,
            },
            Binding::Column(column) => BoundKind::Column {
                header: column.header.clone(),
                pipeline: scalar_pipeline(field, registry)?,
            },
            Binding::Nested(nested) => BoundKind::Nested {
                origin: resolve_position(&field.name, &nested.origin)?,
                mapping: mapping_index(doc, &nested.mapping)?,
            },
        };
        Ok(Self {
            name: field.name.clone(),
            kind,
        })
    }
}

fn scalar_pipeline(field: &FieldSpec, registry: &ConverterRegistry) -> Result<Pipeline, ConfigError> {
    Pipeline::build(&field.name, &field.field_type, &field.options, registry)
}

/// Container shape plus the effective item type (honoring `item_type`).
fn container_shape(field: &FieldSpec) -> Result<(ContainerShape, &FieldType), ConfigError> {
    let declared_item = field.field_type.item().ok_or_else(|| {
        ConfigError::UnsupportedBinding {
            field: field.name.clone(),
            kind: "array_region",
            reason: format!("type `{}` is not a container", field.field_type.name()),
        }
    })?;
    let item = field.item_type.as_ref().unwrap_or(declared_item);
    let shape = match &field.field_type {
        FieldType::List(_) => ContainerShape::List,
        FieldType::Set(_) => ContainerShape::Set,
        FieldType::Array(arr) => ContainerShape::Array { len: arr.len },
        _ => unreachable!("item() returned Some for a non-container"),
    };
    Ok((shape, item))
}

fn resolve_position(field: &str, pos: &PositionSpec) -> Result<CellAddress, ConfigError> {
    let result = match (&pos.at, pos.row, pos.col) {
        (Some(at), _, _) => CellAddress::parse_a1(at),
        (None, Some(row), Some(col)) => CellAddress::from_literals(row, col),
        _ => {
            return Err(ConfigError::UnsupportedBinding {
                field: field.to_string(),
                kind: "cell",
                reason: "position must set either `at` or both `row` and `col`".to_string(),
            });
        }
    };
    result.map_err(|source| ConfigError::InvalidPosition {
        field: field.to_string(),
        source,
    })
}

fn mapping_index(doc: &MappingDoc, name: &str) -> Result<usize, ConfigError> {
    doc.records
        .iter()
        .position(|r| r.name == name)
        .ok_or_else(|| ConfigError::UnknownMapping(name.to_string()))
}

fn convert_direction(direction: spec::Direction) -> Direction {
    match direction {
        spec::Direction::Up => Direction::Up,
        spec::Direction::Down => Direction::Down,
        spec::Direction::Left => Direction::Left,
        spec::Direction::Right => Direction::Right,
    }
}

fn convert_axis(axis: spec::Axis) -> Axis {
    match axis {
        spec::Axis::Down => Axis::Down,
        spec::Axis::Right => Axis::Right,
    }
}
