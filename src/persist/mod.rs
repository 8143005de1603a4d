pub mod csv_store;

pub use csv_store::{load, save};

use crate::table::Table;

/// Why a load produced no usable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// Nothing exists at the path.
    Missing,
    /// The file exists but holds no header.
    Blank,
    /// The file could not be parsed as a participant list.
    Unreadable(String),
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Table),
    Empty(EmptyReason),
}
