pub mod config;
pub mod error;
pub mod persist;
pub mod registry;
pub mod schema;
pub mod surface;
pub mod table;

pub use config::{FieldSpec, RegistryConfig};
pub use error::{RegistryError, Result};
pub use registry::{ParticipantRegistry, SessionState};
pub use table::{Record, RecordId, Table};
