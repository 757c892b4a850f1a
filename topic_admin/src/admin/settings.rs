use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSettings {
    /// Upper bound for every wait on a broker response.
    pub request_timeout: Duration,
    /// How long `close` lets in-flight operations drain before cancelling them.
    pub close_grace_period: Duration,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            close_grace_period: DEFAULT_CLOSE_GRACE_PERIOD,
        }
    }
}
