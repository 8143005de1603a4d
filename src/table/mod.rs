//! In-memory participant table: an ordered, growable column set plus the
//! ordered rows that reference it.

pub mod record;

pub use record::{Record, RecordId};

use std::collections::HashMap;

use tracing::error;

use crate::error::{RegistryError, Result};
use crate::schema::Column;

/// Outcome of [`Table::add_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnChange {
    Added,
    /// The column already existed; nothing was touched.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    key_column: String,
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl Table {
    /// Header-only table with the given columns in order. Repeated names are
    /// collapsed onto their first occurrence.
    pub fn new<I, S>(key_column: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self {
            key_column: key_column.into(),
            columns: Vec::new(),
            records: Vec::new(),
        };
        for name in columns {
            table.add_column(name);
        }
        table
    }

    /// Build from parsed rows. Each row holds one value per column, in column order;
    /// missing trailing values become empty.
    pub(crate) fn from_rows(
        key_column: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let records = rows
            .into_iter()
            .map(|row| {
                let mut record = Record::blank(columns.iter().map(|c| c.name.as_str()));
                for (col, value) in columns.iter().zip(row) {
                    record.put(&col.name, value);
                }
                record
            })
            .collect();
        Self {
            key_column: key_column.into(),
            columns,
            records,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a text column, giving every existing record an empty value for it.
    pub fn add_column(&mut self, name: impl Into<String>) -> ColumnChange {
        let name = name.into();
        if self.has_column(&name) {
            return ColumnChange::Unchanged;
        }
        for record in &mut self.records {
            record.put(&name, String::new());
        }
        self.columns.push(Column::text(name));
        ColumnChange::Added
    }

    /// Handle of the single record whose key equals `key`.
    pub fn locate(&self, key: &str) -> Result<RecordId> {
        let mut hits = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.get(&self.key_column) == Some(key))
            .map(|(i, _)| i);

        let first = hits.next().ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })?;
        let extra = hits.count();
        if extra > 0 {
            let count = extra + 1;
            error!(key, count, "duplicate participant key in data table");
            return Err(RegistryError::AmbiguousKey {
                key: key.to_string(),
                count,
            });
        }
        Ok(RecordId(first))
    }

    pub fn find_by_key(&self, key: &str) -> Result<&Record> {
        let id = self.locate(key)?;
        Ok(&self.records[id.0])
    }

    /// Append a record with an empty value in every column. The key is not
    /// checked here; set it before looking the record up.
    pub fn insert_record(&mut self) -> RecordId {
        let record = Record::blank(self.column_names());
        self.records.push(record);
        RecordId(self.records.len() - 1)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    /// Read one cell. Fails with `MissingColumn` when `column` is not part of the schema.
    pub fn field(&self, id: RecordId, column: &str) -> Result<&str> {
        let record = self.record(id).ok_or_else(|| unknown_record(id))?;
        if !self.has_column(column) {
            return Err(RegistryError::MissingColumn {
                column: column.to_string(),
            });
        }
        Ok(record.get(column).unwrap_or_default())
    }

    /// Write one cell. Fails with `MissingColumn` when `column` is not part of the schema.
    pub fn set_field(
        &mut self,
        id: RecordId,
        column: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        if !self.has_column(column) {
            return Err(RegistryError::MissingColumn {
                column: column.to_string(),
            });
        }
        let record = self.records.get_mut(id.0).ok_or_else(|| unknown_record(id))?;
        record.put(column, value);
        Ok(())
    }

    /// Key of every record in table order, empty for records without one.
    /// The iterator is cheap to clone, so callers can restart it.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.records
            .iter()
            .map(|r| r.get(&self.key_column).unwrap_or_default())
    }

    /// Keys carried by more than one record, with their counts, in first-seen order.
    pub fn duplicate_keys(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for key in self.all_keys() {
            let n = counts.entry(key).or_insert(0);
            if *n == 0 {
                order.push(key);
            }
            *n += 1;
        }
        order
            .into_iter()
            .filter_map(|k| {
                let n = counts[k];
                (n > 1).then(|| (k.to_string(), n))
            })
            .collect()
    }

    /// Cells of `record` in column order.
    pub fn row_values<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = &'a str> + 'a {
        self.columns
            .iter()
            .map(move |c| record.get(&c.name).unwrap_or_default())
    }
}

fn unknown_record(id: RecordId) -> RegistryError {
    RegistryError::NotFound {
        key: format!("record #{}", id.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        let mut t = Table::new("ppid", ["ppid", "age"]);
        let p1 = t.insert_record();
        t.set_field(p1, "ppid", "p1").unwrap();
        t.set_field(p1, "age", "20").unwrap();
        let p2 = t.insert_record();
        t.set_field(p2, "ppid", "p2").unwrap();
        t
    }

    #[test]
    fn add_column_is_idempotent() {
        let mut once = sample();
        assert_eq!(once.add_column("group"), ColumnChange::Added);

        let mut twice = sample();
        twice.add_column("group");
        assert_eq!(twice.add_column("group"), ColumnChange::Unchanged);

        assert_eq!(once, twice);
        assert_eq!(
            twice.column_names().collect::<Vec<_>>(),
            vec!["ppid", "age", "group"]
        );
    }

    #[test]
    fn add_column_fills_existing_records_with_empty() {
        let mut t = sample();
        t.add_column("group");
        let p1 = t.locate("p1").unwrap();
        assert_eq!(t.field(p1, "group").unwrap(), "");
        assert_eq!(t.field(p1, "age").unwrap(), "20");
    }

    #[test]
    fn find_by_key_unique_missing_and_ambiguous() {
        let mut t = sample();
        assert_eq!(t.find_by_key("p1").unwrap().get("age"), Some("20"));

        assert!(matches!(
            t.find_by_key("nobody"),
            Err(RegistryError::NotFound { key }) if key == "nobody"
        ));

        let dup = t.insert_record();
        t.set_field(dup, "ppid", "p1").unwrap();
        assert!(matches!(
            t.find_by_key("p1"),
            Err(RegistryError::AmbiguousKey { count: 2, .. })
        ));
    }

    #[test]
    fn inserted_record_is_blank_until_populated() {
        let mut t = sample();
        let id = t.insert_record();
        assert_eq!(t.field(id, "ppid").unwrap(), "");
        assert_eq!(t.field(id, "age").unwrap(), "");
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn unknown_column_is_reported_not_created() {
        let mut t = sample();
        let p1 = t.locate("p1").unwrap();
        assert!(matches!(
            t.set_field(p1, "group", "a"),
            Err(RegistryError::MissingColumn { column }) if column == "group"
        ));
        assert!(matches!(
            t.field(p1, "group"),
            Err(RegistryError::MissingColumn { .. })
        ));
        assert!(!t.has_column("group"));
    }

    #[test]
    fn all_keys_in_table_order_and_restartable() {
        let mut t = sample();
        t.insert_record();
        let again = t.insert_record();
        t.set_field(again, "ppid", "p1").unwrap();

        let keys = t.all_keys();
        let first: Vec<_> = keys.clone().collect();
        let second: Vec<_> = keys.collect();
        assert_eq!(first, vec!["p1", "p2", "", "p1"]);
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_keys_are_counted() {
        let mut t = sample();
        for _ in 0..2 {
            let id = t.insert_record();
            t.set_field(id, "ppid", "p2").unwrap();
        }
        assert_eq!(t.duplicate_keys(), vec![("p2".to_string(), 3)]);
    }

    #[test]
    fn new_collapses_repeated_columns() {
        let t = Table::new("ppid", ["ppid", "age", "ppid"]);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["ppid", "age"]);
    }
}
