/// Broker acknowledgement of a delete request. Topics in `deleted` may stay
/// visible to describe/list for a while after this is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteTopicsOutcome {
    pub deleted: Vec<String>,
    /// Names the broker did not know about.
    pub missing: Vec<String>,
}

impl DeleteTopicsOutcome {
    pub fn is_fully_acknowledged(&self) -> bool {
        self.missing.is_empty()
    }
}
