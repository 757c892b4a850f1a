pub mod describe_topic;
