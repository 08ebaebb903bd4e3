use std::fmt;

/// Opaque handle to a network participant, handed out by the host adapter.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ConnectionRef(u64);

impl ConnectionRef {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cn#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientType {
    User,
    Bot,
}

/// Who is behind an Agent.
///
/// A `Bot` identity never carries a connection; the constructors are the only
/// way to build one, so that cannot be violated. The display name is the only
/// field that changes after creation, and only through [`Identity::renamed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    connection: Option<ConnectionRef>,
    display_name: String,
    client_type: ClientType,
}

impl Identity {
    pub fn user(connection: ConnectionRef, display_name: impl Into<String>) -> Self {
        Self {
            connection: Some(connection),
            display_name: display_name.into(),
            client_type: ClientType::User,
        }
    }

    pub fn bot(display_name: impl Into<String>) -> Self {
        Self {
            connection: None,
            display_name: display_name.into(),
            client_type: ClientType::Bot,
        }
    }

    pub fn connection(&self) -> Option<ConnectionRef> {
        self.connection
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn is_user(&self) -> bool {
        self.client_type == ClientType::User
    }

    pub fn compare_connection(&self, connection: &ConnectionRef) -> bool {
        self.connection.as_ref() == Some(connection)
    }

    pub fn renamed(&self, display_name: impl Into<String>) -> Self {
        Self {
            connection: self.connection,
            display_name: display_name.into(),
            client_type: self.client_type,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.connection {
            Some(connection) => write!(f, "{} ({})", self.display_name, connection),
            None => write!(f, "{} (bot)", self.display_name),
        }
    }
}
