pub mod report;
pub mod runner;
pub mod scenario;

pub use report::{ConversationReport, SimulationReport};
pub use runner::{simulate, Moderator};
pub use scenario::{SimulationConfig, SlotValues, SystemConfig};
