use std::collections::HashMap;

/// Handle to a record inside the [`Table`](super::Table) that produced it.
///
/// Records are never removed, so a handle stays valid for the lifetime of its table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One participant row: column name → text value.
///
/// Cells are only written through the owning table, which checks the column
/// exists first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub(crate) fn blank<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            values: columns
                .into_iter()
                .map(|c| (c.to_string(), String::new()))
                .collect(),
        }
    }

    /// Value for `column`, or `None` if this record has no cell for it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub(crate) fn put(&mut self, column: &str, value: impl Into<String>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
