pub mod evolution;
pub mod types;

pub use evolution::{ensure_column, read_or_extend, set_field, Evolution};
pub use types::{Column, ColumnKind};
