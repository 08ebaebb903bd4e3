use kitbase_shared::{AgentKey, ConnectionRef};

/// What the host knows about one network participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    connection: ConnectionRef,
    agent: AgentKey,
    active: bool,
}

impl ConnectionRecord {
    pub(crate) fn new(connection: ConnectionRef, agent: AgentKey) -> Self {
        Self {
            connection,
            agent,
            active: true,
        }
    }

    pub fn connection(&self) -> ConnectionRef {
        self.connection
    }

    pub fn agent(&self) -> AgentKey {
        self.agent
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
