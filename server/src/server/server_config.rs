use std::default::Default;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Determines whether a player agent backed by a user must have an
    /// active connection to take a pawn.
    pub require_player_connection: bool,
    /// Upper bound on how many pawns a single agent may own at once.
    pub max_pawns_per_agent: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_player_connection: true,
            max_pawns_per_agent: None,
        }
    }
}
