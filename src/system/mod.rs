//! Dialogue systems the simulated user can be run against.
//!
//! The simulator only sees annotations, so a system under test is anything that maps the
//! user's annotations for a turn to its own.

use crate::types::Annotation;

pub mod rule_based;
pub mod scripted;

pub use rule_based::RuleBasedBookingBot;
pub use scripted::ScriptedSystem;

pub trait SystemAgent: Send {
    /// Answers one user turn.
    fn respond(&mut self, user: &[Annotation]) -> Vec<Annotation>;

    /// Forgets all conversation state before a new dialogue.
    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}
