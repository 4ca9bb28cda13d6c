//! Grid-document capability layer.
//!
//! The binding engine never opens or serializes spreadsheet files itself; it
//! consumes the [`GridReader`]/[`GridWriter`] traits defined here. Two backends
//! are bundled: [`MemoryGrid`], a plain in-memory store, and
//! [`backends::JsonGridAdapter`], which round-trips fixtures through a
//! versioned JSON document.

pub mod backends;
pub mod error;
pub mod memory;
pub mod traits;

pub use backends::JsonGridAdapter;
pub use error::GridError;
pub use memory::MemoryGrid;
pub use traits::{CellData, GridReader, GridWriter, StyleOptions};

// Re-export for convenience
pub use sheetbind_common::{CellAddress, CellValue, Region};
