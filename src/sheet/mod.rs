//! Spreadsheet reading for batch job sheets.

pub mod grid;
pub mod layout;

pub use grid::Grid;
pub use layout::{ColumnRole, DataRow, SheetLayout};
