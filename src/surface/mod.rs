//! Interfaces the registry drives: pickers, the participant form, the participant
//! selector, and user notifications. Implementations live with the front end;
//! `memory` and `picker` hold the ones this crate ships.

pub mod memory;
pub mod picker;

pub use memory::{MemoryForm, MemorySelection, RecordingNotifier};
pub use picker::{DirectoryPicker, FixedPicker};

use serde::ser::{Serialize, Serializer};
use std::{
    future::Future,
    path::{Path, PathBuf},
};

/// Field values of one participant as submitted by the form, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingForm {
    fields: Vec<(String, String)>,
}

impl PendingForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value for it in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PendingForm {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut form = PendingForm::new();
        for (k, v) in iter {
            form.insert(k, v);
        }
        form
    }
}

impl Serialize for PendingForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// File dialogs. Both resolve once, with `None` when the user cancels.
pub trait FilePicker {
    fn pick_open(
        &self,
        dir: &Path,
        extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;

    fn pick_save(
        &self,
        dir: &Path,
        default_name: &str,
        extension: &str,
    ) -> impl Future<Output = Option<PathBuf>> + Send;
}

pub trait FormSurface {
    /// Values of a fully validated form, or `None` if validation failed.
    fn completed_form(&self) -> Option<PendingForm>;
    fn set_field_value(&mut self, field: &str, value: &str);
    fn clear_field(&mut self, field: &str);
    fn default_value(&self, field: &str) -> Option<String>;
    fn mark_field_invalid(&mut self, field: &str);
    fn set_enabled(&mut self, _enabled: bool) {}
}

pub trait SelectionSurface {
    fn set_available_keys(&mut self, keys: Vec<String>);
    /// True when the "new participant" entry is selected.
    fn is_creating_new(&self) -> bool;
    fn selected_key(&self) -> Option<String>;
    fn select_new(&mut self);
    fn set_enabled(&mut self, _enabled: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Attention,
    Warning,
    Error,
}

/// What confirming a notice asks the registry to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAction {
    CreateList(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub on_confirm: Option<NoticeAction>,
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// The surfaces a registry operation may touch, borrowed for the duration of one call.
pub struct Surfaces<'a> {
    pub form: &'a mut dyn FormSurface,
    pub selection: &'a mut dyn SelectionSurface,
    pub notifier: &'a mut dyn Notifier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pending_form_keeps_order_and_replaces_in_place() {
        let mut form: PendingForm = [("ppid", "p1"), ("age", "20")].into_iter().collect();
        form.insert("ppid", "p9");
        form.insert("group", "a");
        assert_eq!(
            form.iter().collect::<Vec<_>>(),
            vec![("ppid", "p9"), ("age", "20"), ("group", "a")]
        );
    }

    #[test]
    fn pending_form_serializes_as_ordered_object() {
        let form: PendingForm = [("ppid", "p1"), ("age", "20")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&form).unwrap(),
            r#"{"ppid":"p1","age":"20"}"#
        );
    }
}
