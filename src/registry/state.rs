/// Lifecycle of one working session over a participant list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Loaded,
    /// The list file is missing, blank or unreadable; waiting for the user to
    /// confirm that a fresh list may be created.
    NeedsBootstrap,
    /// The table was just written back. Any further edit returns to `Loaded`.
    Committed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Loading => "loading",
            SessionState::Loaded => "loaded",
            SessionState::NeedsBootstrap => "awaiting bootstrap",
            SessionState::Committed => "committed",
        }
    }

    /// A table is present and may be queried or edited.
    pub fn has_table(&self) -> bool {
        matches!(self, SessionState::Loaded | SessionState::Committed)
    }
}
