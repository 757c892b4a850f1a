mod client;
mod settings;

pub use client::TopicAdminClient;
pub use settings::AdminSettings;
