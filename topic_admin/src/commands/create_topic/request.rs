use crate::error::AdminError;

pub const DEFAULT_PARTITIONS: i32 = 1;
pub const DEFAULT_REPLICATION_FACTOR: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopicRequest {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl NewTopicRequest {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }

    /// One partition, one replica.
    pub fn default_for(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_PARTITIONS, DEFAULT_REPLICATION_FACTOR)
    }

    /// Checks what can be checked without asking the cluster. The upper bound
    /// on the replication factor is enforced by the brokers.
    pub fn validate(&self) -> Result<(), AdminError> {
        if self.name.trim().is_empty() {
            return Err(AdminError::InvalidConfiguration(
                "Topic name must not be empty".to_owned(),
            ));
        }
        if self.partitions < 1 {
            return Err(AdminError::InvalidConfiguration(format!(
                "Topic '{}' needs at least one partition, got {}",
                self.name, self.partitions
            )));
        }
        if self.replication_factor < 1 {
            return Err(AdminError::InvalidConfiguration(format!(
                "Topic '{}' needs a replication factor of at least 1, got {}",
                self.name, self.replication_factor
            )));
        }

        Ok(())
    }
}
