pub mod admin;
pub mod commands;
pub mod connection_settings;
pub mod error;
pub mod queries;
pub mod transport;

pub use admin::{AdminSettings, TopicAdminClient};
pub use error::{AdminError, ErrorKind, Operation};
