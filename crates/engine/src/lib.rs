pub mod addr;
pub mod cell;
pub mod dep_graph;
pub mod error;
pub mod extents;
pub mod formula;
pub mod sheet;

pub use addr::{Addr, Size, MAX_COLS, MAX_ROWS};
pub use cell::{Cell, CellContent, CellValue};
pub use error::SheetError;
pub use formula::{ArithError, CellLookup};
pub use sheet::Sheet;
