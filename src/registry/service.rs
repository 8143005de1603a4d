//! The participant registry: sole owner of the loaded table. Front-end surfaces
//! only ever receive values read out of it or hand back a completed form.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument};

use super::sanitize::participant_id;
use super::state::SessionState;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::persist::{self, LoadOutcome};
use crate::schema::{self, Evolution};
use crate::surface::{
    FilePicker, FormSurface, Notice, NoticeAction, PendingForm, Severity, Surfaces,
};
use crate::table::{RecordId, Table};

#[derive(Debug)]
pub struct ParticipantRegistry {
    config: RegistryConfig,
    state: SessionState,
    table: Option<Table>,
    list_path: Option<PathBuf>,
    current_folder: PathBuf,
    participant_details: Option<PendingForm>,
}

impl ParticipantRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        let current_folder = config.start_folder.clone();
        Self {
            config,
            state: SessionState::Uninitialized,
            table: None,
            list_path: None,
            current_folder,
            participant_details: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn list_path(&self) -> Option<&Path> {
        self.list_path.as_deref()
    }

    /// Folder the pickers open in: the start folder until a list is chosen,
    /// then the folder holding that list.
    pub fn current_folder(&self) -> &Path {
        &self.current_folder
    }

    pub fn set_current_folder(&mut self, dir: impl Into<PathBuf>) {
        self.current_folder = dir.into();
    }

    /// Form values of the last participant committed by [`finish`](Self::finish).
    pub fn participant_details(&self) -> Option<&PendingForm> {
        self.participant_details.as_ref()
    }

    /// Keys of all participants in table order.
    pub fn keys(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| t.all_keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Lock the selector and form until a list is loaded.
    pub fn init(&mut self, ui: &mut Surfaces<'_>) {
        ui.selection.set_enabled(false);
        ui.form.set_enabled(false);
    }

    /// Ask the picker for an existing list and load it. `Ok(None)` when nothing was picked.
    pub async fn select_list<P: FilePicker>(
        &mut self,
        picker: &P,
        ui: &mut Surfaces<'_>,
    ) -> Result<Option<SessionState>> {
        let picked = picker
            .pick_open(&self.current_folder, &self.config.list_extension)
            .await;
        match picked {
            Some(path) => self.check_set_list(path, ui).map(Some),
            None => Ok(None),
        }
    }

    /// Ask the picker where a new list should live and load from there. A path with
    /// no file behind it ends in `NeedsBootstrap`.
    pub async fn create_list<P: FilePicker>(
        &mut self,
        picker: &P,
        ui: &mut Surfaces<'_>,
    ) -> Result<Option<SessionState>> {
        let picked = picker
            .pick_save(
                &self.current_folder,
                &self.config.default_list_name,
                &self.config.list_extension,
            )
            .await;
        match picked {
            Some(path) => self.check_set_list(path, ui).map(Some),
            None => Ok(None),
        }
    }

    /// Remember `path` as the working list, move the current folder next to it, and load it.
    pub fn check_set_list(
        &mut self,
        path: impl Into<PathBuf>,
        ui: &mut Surfaces<'_>,
    ) -> Result<SessionState> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.current_folder = parent.to_path_buf();
        }
        self.list_path = Some(path);
        self.reload(ui)
    }

    /// Load the working list again from disk.
    #[instrument(level = "debug", skip_all)]
    pub fn reload(&mut self, ui: &mut Surfaces<'_>) -> Result<SessionState> {
        let path = self.list_path.clone().ok_or(RegistryError::NoListLoaded)?;
        self.state = SessionState::Loading;

        let outcome = match persist::load(&path, &self.config.key_column) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = SessionState::Uninitialized;
                self.table = None;
                return Err(e);
            }
        };

        match outcome {
            LoadOutcome::Loaded(mut table) => {
                schema::ensure_column(&mut table, &self.config.key_column);
                info!(
                    records = table.len(),
                    columns = table.columns().len(),
                    "loaded {}",
                    path.display()
                );
                ui.selection
                    .set_available_keys(table.all_keys().map(str::to_string).collect());
                ui.selection.select_new();
                ui.selection.set_enabled(true);
                ui.form.set_enabled(true);
                self.table = Some(table);
                self.state = SessionState::Loaded;
            }
            LoadOutcome::Empty(reason) => {
                debug!(?reason, "no usable participant list at {}", path.display());
                self.table = None;
                self.state = SessionState::NeedsBootstrap;
                ui.notifier.notify(Notice {
                    severity: Severity::Attention,
                    message: format!(
                        "An empty participant list will be created at {}. Data you collect will be stored in the same folder as this list.",
                        path.display()
                    ),
                    on_confirm: Some(NoticeAction::CreateList(path)),
                });
            }
        }
        Ok(self.state)
    }

    /// Run the action attached to a confirmed notice. A notice about a list other
    /// than the working one is stale and refused.
    pub fn confirm(&mut self, action: NoticeAction, ui: &mut Surfaces<'_>) -> Result<SessionState> {
        match action {
            NoticeAction::CreateList(path) => {
                if self.list_path.as_deref() != Some(path.as_path()) {
                    return Err(RegistryError::InvalidState {
                        op: "create list",
                        state: self.state.as_str(),
                    });
                }
                self.bootstrap(ui)
            }
        }
    }

    /// Write a fresh list holding one example participant, then load it back.
    ///
    /// Only allowed while the session waits for bootstrap, so an existing list is
    /// never overwritten.
    pub fn bootstrap(&mut self, ui: &mut Surfaces<'_>) -> Result<SessionState> {
        if self.state != SessionState::NeedsBootstrap {
            return Err(RegistryError::InvalidState {
                op: "bootstrap",
                state: self.state.as_str(),
            });
        }
        let path = self.list_path.clone().ok_or(RegistryError::NoListLoaded)?;

        let mut table = Table::new(&self.config.key_column, self.config.field_names());
        let id = table.insert_record();
        for field in &self.config.fields {
            let value = ui
                .form
                .default_value(&field.name)
                .unwrap_or_else(|| field.default.clone());
            table.set_field(id, &field.name, value)?;
        }
        table.set_field(id, &self.config.key_column, &self.config.placeholder_key)?;

        persist::save(&table, &path)?;
        info!("created participant list {}", path.display());
        self.reload(ui)
    }

    /// Fill the form with the participant's stored values. A data point the list has
    /// no column for gets the column added and its form field cleared.
    pub fn select_participant(&mut self, key: &str, form: &mut dyn FormSurface) -> Result<()> {
        let Self {
            table,
            config,
            state,
            ..
        } = self;
        let table = table.as_mut().ok_or(RegistryError::NoListLoaded)?;
        let id = table.locate(key)?;

        for field in &config.fields {
            match schema::read_or_extend(table, id, &field.name)? {
                Some(value) => form.set_field_value(&field.name, &value),
                None => {
                    *state = SessionState::Loaded;
                    form.clear_field(&field.name);
                }
            }
        }
        Ok(())
    }

    /// Commit the completed form as a new participant or over the selected one,
    /// write the list, and return the participant's identifier.
    #[instrument(level = "debug", skip_all)]
    pub fn finish(&mut self, ui: &mut Surfaces<'_>) -> Result<String> {
        if self.table.is_none() {
            return Err(RegistryError::NoListLoaded);
        }
        let form = ui.form.completed_form().ok_or_else(|| {
            error!("form not completed correctly");
            RegistryError::FormIncomplete
        })?;

        let key_column = self.config.key_column.clone();
        let ppid = match participant_id(form.get(&key_column).unwrap_or_default()) {
            Ok(id) => id,
            Err(e) => {
                ui.form.mark_field_invalid(&key_column);
                return Err(e);
            }
        };

        let creating = ui.selection.is_creating_new();
        let selected = ui.selection.selected_key();
        let table = self.table.as_mut().ok_or(RegistryError::NoListLoaded)?;
        // Restored if the write fails, so a retry sees the table as it is on disk.
        let before = table.clone();
        let id = target_record(table, &ppid, creating, selected.as_deref())?;

        self.state = SessionState::Loaded;
        for (field, value) in form.iter() {
            let value = if field == key_column { ppid.as_str() } else { value };
            schema::set_field(table, id, field, value)?;
        }

        if let Err(e) = self.commit() {
            error!(ppid = %ppid, "participant not saved: {}", e);
            self.table = Some(before);
            return Err(e);
        }
        ui.selection.set_available_keys(self.keys());
        self.participant_details = Some(form);
        Ok(ppid)
    }

    /// Set one field of one participant outside the form flow. The change is kept
    /// in memory until the next [`commit`](Self::commit).
    pub fn update_field(&mut self, key: &str, field: &str, value: &str) -> Result<Evolution> {
        let table = self.table.as_mut().ok_or(RegistryError::NoListLoaded)?;
        let id = table.locate(key)?;
        let evolution = schema::set_field(table, id, field, value)?;
        self.state = SessionState::Loaded;
        Ok(evolution)
    }

    /// Write the whole table back to the working list.
    pub fn commit(&mut self) -> Result<()> {
        let table = self.table.as_ref().ok_or(RegistryError::NoListLoaded)?;
        let path = self.list_path.as_deref().ok_or(RegistryError::NoListLoaded)?;
        persist::save(table, path)?;
        info!("updating {}", path.display());
        self.state = SessionState::Committed;
        Ok(())
    }
}

/// Record a finished form should be written into.
///
/// New participants get a fresh record, provided no record already holds `ppid`.
/// An existing participant must still resolve by its selected key, and may only be
/// renamed to a key nobody else holds.
fn target_record(
    table: &mut Table,
    ppid: &str,
    creating: bool,
    selected: Option<&str>,
) -> Result<RecordId> {
    if creating {
        if key_taken(table, ppid)? {
            return Err(RegistryError::DuplicateKey {
                key: ppid.to_string(),
            });
        }
        return Ok(table.insert_record());
    }

    let old = selected.ok_or_else(|| RegistryError::NotFound {
        key: ppid.to_string(),
    })?;
    let id = table.locate(old)?;
    if ppid != old && key_taken(table, ppid)? {
        return Err(RegistryError::DuplicateKey {
            key: ppid.to_string(),
        });
    }
    Ok(id)
}

fn key_taken(table: &Table, key: &str) -> Result<bool> {
    match table.locate(key) {
        Ok(_) | Err(RegistryError::AmbiguousKey { .. }) => Ok(true),
        Err(RegistryError::NotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
