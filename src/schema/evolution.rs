//! Schema-on-write: a field write or read that names a column the table does not
//! have extends the table with that column instead of failing.

use tracing::warn;

use crate::error::{RegistryError, Result};
use crate::table::{RecordId, Table};

/// Whether a field operation had to grow the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evolution {
    Unchanged,
    Extended,
}

fn extend(table: &mut Table, column: &str) {
    warn!(
        "column '{}' not found in data table - it will be added with empty values",
        column
    );
    table.add_column(column);
}

/// Add `column` if the table lacks it.
pub fn ensure_column(table: &mut Table, column: &str) -> Evolution {
    if table.has_column(column) {
        return Evolution::Unchanged;
    }
    extend(table, column);
    Evolution::Extended
}

/// Write `value` into `column` of record `id`, adding the column first if needed.
pub fn set_field(
    table: &mut Table,
    id: RecordId,
    column: &str,
    value: &str,
) -> Result<Evolution> {
    match table.set_field(id, column, value) {
        Ok(()) => Ok(Evolution::Unchanged),
        Err(RegistryError::MissingColumn { .. }) => {
            extend(table, column);
            table.set_field(id, column, value)?;
            Ok(Evolution::Extended)
        }
        Err(e) => Err(e),
    }
}

/// Read `column` of record `id`. Returns `None` when the column was missing;
/// it has been added with empty values by the time this returns.
pub fn read_or_extend(table: &mut Table, id: RecordId, column: &str) -> Result<Option<String>> {
    match table.field(id, column) {
        Ok(value) => Ok(Some(value.to_string())),
        Err(RegistryError::MissingColumn { .. }) => {
            extend(table, column);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_participants() -> (Table, RecordId, RecordId) {
        let mut t = Table::new("ppid", ["ppid", "age"]);
        let p1 = t.insert_record();
        t.set_field(p1, "ppid", "p1").unwrap();
        t.set_field(p1, "age", "20").unwrap();
        let p2 = t.insert_record();
        t.set_field(p2, "ppid", "p2").unwrap();
        (t, p1, p2)
    }

    #[test]
    fn unknown_field_adds_exactly_one_column() {
        let (mut t, p1, p2) = two_participants();

        let outcome = set_field(&mut t, p1, "group", "control").unwrap();

        assert_eq!(outcome, Evolution::Extended);
        assert_eq!(
            t.column_names().collect::<Vec<_>>(),
            vec!["ppid", "age", "group"]
        );
        assert_eq!(t.field(p1, "group").unwrap(), "control");
        assert_eq!(t.field(p2, "group").unwrap(), "");
    }

    #[test]
    fn known_field_leaves_schema_alone() {
        let (mut t, p1, _) = two_participants();
        assert_eq!(set_field(&mut t, p1, "age", "21").unwrap(), Evolution::Unchanged);
        assert_eq!(t.columns().len(), 2);
        assert_eq!(t.field(p1, "age").unwrap(), "21");
    }

    #[test]
    fn read_of_missing_column_extends_and_reports_none() {
        let (mut t, p1, _) = two_participants();
        assert_eq!(read_or_extend(&mut t, p1, "age").unwrap().as_deref(), Some("20"));
        assert_eq!(read_or_extend(&mut t, p1, "handedness").unwrap(), None);
        assert!(t.has_column("handedness"));
        assert_eq!(read_or_extend(&mut t, p1, "handedness").unwrap().as_deref(), Some(""));
    }
}
