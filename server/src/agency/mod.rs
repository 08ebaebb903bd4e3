pub mod agent;
pub mod pawn;
pub mod registry;
