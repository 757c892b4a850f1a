/// Point-in-time view of a topic. Stale as soon as it is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescription {
    pub name: String,
    pub partitions: Vec<PartitionDescription>,
}

impl TopicDescription {
    pub fn partitions_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn replication_factor(&self) -> usize {
        self.partitions
            .iter()
            .map(|p| p.replicas.len())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescription {
    pub id: i32,
    /// Broker id of the leader, `None` while leadership is being elected.
    pub leader: Option<i32>,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}
