use kitbase_shared::{AgentKey, Ownable, Tickable};

/// Per-pawn hooks: eligibility, owner change notification and simulation.
pub trait PawnBehavior: Ownable + Tickable + Send {}

impl<T: Ownable + Tickable + Send> PawnBehavior for T {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PawnConfig {
    /// Only player agents can own this pawn
    pub requires_player: bool,
}

impl PawnConfig {
    pub fn player() -> Self {
        Self {
            requires_player: true,
        }
    }
}

pub struct BasicPawn;

impl Ownable for BasicPawn {}
impl Tickable for BasicPawn {}

/// Something an agent can control. Created independently of ownership.
pub struct Pawn {
    owner: Option<AgentKey>,
    config: PawnConfig,
    pub(crate) behavior: Box<dyn PawnBehavior>,
}

impl Pawn {
    pub(crate) fn new(config: PawnConfig, behavior: Box<dyn PawnBehavior>) -> Self {
        Self {
            owner: None,
            config,
            behavior,
        }
    }

    pub fn owner(&self) -> Option<AgentKey> {
        self.owner
    }

    pub fn requires_player(&self) -> bool {
        self.config.requires_player
    }

    pub fn config(&self) -> PawnConfig {
        self.config
    }

    pub(crate) fn set_owner(&mut self, owner: Option<AgentKey>) {
        self.owner = owner;
    }
}
