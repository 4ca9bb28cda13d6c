pub mod address;
pub mod value;

pub use address::{AddressError, Axis, CellAddress, Direction, Region, COL_MAX, ROW_MAX};
pub use value::CellValue;
