pub mod create_topic;
pub mod delete_topics;
