pub mod sanitize;
pub mod service;
pub mod state;

pub use sanitize::{participant_id, safe_filename};
pub use service::ParticipantRegistry;
pub use state::SessionState;
