//! Surfaces that keep their state in plain fields. Used by the console driver and tests.

use std::collections::HashMap;

use super::{FormSurface, Notice, Notifier, PendingForm, SelectionSurface};

#[derive(Debug, Default, Clone)]
pub struct MemoryForm {
    /// Current contents of each field, in the order fields were first touched.
    pub values: PendingForm,
    pub defaults: HashMap<String, String>,
    pub invalid: Vec<String>,
    pub enabled: bool,
    /// When set, `completed_form` reports a validation failure.
    pub reject: bool,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            defaults: defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn fill<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in values {
            self.values.insert(k, v);
        }
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field)
    }
}

impl FormSurface for MemoryForm {
    fn completed_form(&self) -> Option<PendingForm> {
        (!self.reject).then(|| self.values.clone())
    }

    fn set_field_value(&mut self, field: &str, value: &str) {
        self.values.insert(field, value);
    }

    fn clear_field(&mut self, field: &str) {
        self.values.insert(field, "");
    }

    fn default_value(&self, field: &str) -> Option<String> {
        self.defaults.get(field).cloned()
    }

    fn mark_field_invalid(&mut self, field: &str) {
        self.invalid.push(field.to_string());
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySelection {
    pub keys: Vec<String>,
    /// `None` means the "new participant" entry.
    pub selected: Option<String>,
    pub enabled: bool,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, key: impl Into<String>) {
        self.selected = Some(key.into());
    }
}

impl SelectionSurface for MemorySelection {
    fn set_available_keys(&mut self, keys: Vec<String>) {
        self.keys = keys;
    }

    fn is_creating_new(&self) -> bool {
        self.selected.is_none()
    }

    fn selected_key(&self) -> Option<String> {
        self.selected.clone()
    }

    fn select_new(&mut self) {
        self.selected = None;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Keeps every notice it is shown.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub notices: Vec<Notice>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
