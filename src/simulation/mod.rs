//! Simulation loop and the manager that drives a battle to its end

pub mod decider;
pub mod manager;
pub mod phase;
pub mod scenario;
pub mod store;

pub use decider::{BasicCommander, BattleView, Decider};
pub use manager::{BattleSnapshot, SimulationManager};
pub use phase::{BattleOutcome, Phase};
pub use scenario::Scenario;
pub use store::FormationStore;
