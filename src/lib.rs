pub mod agenda;
pub mod diagact;
pub mod error;
pub mod eval;
pub mod goals;
pub mod history;
pub mod profile;
pub mod random;
pub mod simulator;
pub mod system;
pub mod types;

pub use agenda::Agenda;
pub use diagact::DialogAct;
pub use error::{AgendaError, ProfileError, SimulationError};
pub use eval::{simulate, ConversationReport, Moderator, SimulationConfig, SimulationReport};
pub use goals::GoalGenerator;
pub use history::{ConversationLog, DialogueTurn, Speaker};
pub use profile::{Profile, ProfileBook};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use simulator::{AgendaUser, ResponseHandler, UserTurn};
pub use system::{RuleBasedBookingBot, ScriptedSystem, SystemAgent};
pub use types::{Annotation, AnnotationKey, Goal, GoalType, GoalValue, UserGoal, DONT_CARE};
