/// Which side of the authority boundary a process sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }

    pub fn is_server(&self) -> bool {
        *self == HostType::Server
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostType::Server => "Server",
            HostType::Client => "Client",
        }
    }
}
