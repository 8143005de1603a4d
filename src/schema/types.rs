// src/schema/types.rs

use serde::{Deserialize, Serialize};

/// Value kind of a column. Participant lists only ever hold text.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Text,
}

/// A single named column of the participant table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Text,
        }
    }
}
