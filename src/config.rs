// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

pub const DEFAULT_KEY_COLUMN: &str = "ppid";
pub const DEFAULT_PLACEHOLDER_KEY: &str = "example001";

/// One expected participant data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Value used when a fresh list is bootstrapped and the form surface has no default.
    #[serde(default)]
    pub default: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub key_column: String,
    pub placeholder_key: String,
    pub list_extension: String,
    pub default_list_name: String,
    pub start_folder: PathBuf,
    pub fields: Vec<FieldSpec>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            placeholder_key: DEFAULT_PLACEHOLDER_KEY.to_string(),
            list_extension: "csv".to_string(),
            default_list_name: "participant_list".to_string(),
            start_folder: PathBuf::from("."),
            fields: vec![FieldSpec::new(DEFAULT_KEY_COLUMN, "")],
        }
    }
}

impl RegistryConfig {
    /// Config with the given data points; the key column is put first if it is missing.
    pub fn with_fields(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        let mut cfg = Self {
            fields: fields.into_iter().collect(),
            ..Self::default()
        };
        cfg.ensure_key_field();
        cfg
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let mut cfg: Self = serde_yaml::from_str(text).context("parsing registry config")?;
        cfg.ensure_key_field();
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading registry config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading {:?}", path))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn ensure_key_field(&mut self) {
        if !self.fields.iter().any(|f| f.name == self.key_column) {
            self.fields
                .insert(0, FieldSpec::new(self.key_column.clone(), ""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn yaml_fills_defaults_and_key_field() {
        let cfg = RegistryConfig::from_yaml_str(
            "fields:\n  - name: age\n    default: \"0\"\n  - name: group\n",
        )
        .unwrap();
        assert_eq!(cfg.key_column, "ppid");
        assert_eq!(cfg.placeholder_key, "example001");
        assert_eq!(cfg.field_names().collect::<Vec<_>>(), vec!["ppid", "age", "group"]);
        assert_eq!(cfg.fields[1].default, "0");
        assert_eq!(cfg.fields[2].default, "");
    }

    #[test]
    fn explicit_key_field_keeps_its_position() {
        let cfg = RegistryConfig::with_fields([
            FieldSpec::new("age", "0"),
            FieldSpec::new("ppid", ""),
        ]);
        assert_eq!(cfg.field_names().collect::<Vec<_>>(), vec!["age", "ppid"]);
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(RegistryConfig::from_yaml_str("fields: 12").is_err());
    }
}
