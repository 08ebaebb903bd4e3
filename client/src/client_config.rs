use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// How long a take request may stay unanswered before it resolves as
    /// denied with [`kitbase_shared::DenyReason::TimedOut`].
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}
