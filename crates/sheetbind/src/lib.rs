//! sheetbind: a declarative binding engine between grid documents and records.
//!
//! A mapping document (see [`sheetbind_spec`]) declares, per record field,
//! where the field lives in a grid — an explicit cell, a cell found relative
//! to a label, a directional run of item cells, a header-matched table, or a
//! nested sub-record — and how its cell content converts to a typed value.
//! This crate resolves such a document into [`MappingBindings`] and executes
//! bidirectional passes over anything implementing the grid capability traits
//! from [`sheetbind_grid`]:
//!
//! ```no_run
//! use sheetbind::{Binder, BindOptions, MappingBindings};
//! use sheetbind_grid::JsonGridAdapter;
//! use sheetbind_spec::MappingDoc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = MappingDoc::from_yaml_str(std::fs::read_to_string("orders.yaml")?.as_str())?;
//! let bindings = MappingBindings::new(doc)?;
//! let grid = JsonGridAdapter::open_path("orders.json")?.to_memory()?;
//!
//! let binder = Binder::new(&bindings).with_options(BindOptions {
//!     continue_on_error: true,
//!     ..Default::default()
//! });
//! let (order, report) = binder.load(&grid, "order")?;
//! for message in binder.render_report(&report) {
//!     eprintln!("{message}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Passes are total under `continue_on_error`: every recoverable failure is
//! recorded in the [`BindingReport`] and the pass keeps going, so one bad cell
//! never hides the rest of the sheet.

pub mod binder;
pub mod binding;
pub mod convert;
pub mod error;
pub mod message;
pub mod record;
pub mod report;

mod process;
mod resolver;

pub use binder::{BindOptions, Binder};
pub use binding::MappingBindings;
pub use convert::{Converter, ConverterRegistry, ParseFailure};
pub use error::{BindError, ConfigError};
pub use message::MessageTemplates;
pub use record::{DynRecord, FieldValue, RecordAccess};
pub use report::{BindingReport, ConversionFailure, FailureKind};

pub use sheetbind_common::{Axis, CellAddress, CellValue, Direction, Region};
pub use sheetbind_grid::{CellData, GridError, GridReader, GridWriter, MemoryGrid, StyleOptions};
