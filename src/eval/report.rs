use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{history::ConversationLog, types::UserGoal};

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub system: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub max_turns: usize,
    pub total: usize,
    pub succeeded: usize,
    /// Conversations in which the system reported a successful booking.
    pub completed: usize,
    pub success_rate: f64,
    pub completion_rate: f64,
    pub mean_turns: f64,
    pub conversations: Vec<ConversationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationReport {
    pub index: usize,
    pub goal: UserGoal,
    pub turns: usize,
    pub success: bool,
    pub completed: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<ConversationLog>,
}

impl SimulationReport {
    pub fn from_conversations(
        system: impl Into<String>,
        max_turns: usize,
        started_at: DateTime<Utc>,
        conversations: Vec<ConversationReport>,
    ) -> Self {
        let total = conversations.len();
        let succeeded = conversations.iter().filter(|c| c.success).count();
        let completed = conversations.iter().filter(|c| c.completed).count();
        let turns: usize = conversations.iter().map(|c| c.turns).sum();

        Self {
            system: system.into(),
            started_at,
            finished_at: Utc::now(),
            max_turns,
            total,
            succeeded,
            completed,
            success_rate: ratio(succeeded, total),
            completion_rate: ratio(completed, total),
            mean_turns: ratio(turns, total),
            conversations,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversationReport> {
        self.conversations.iter().filter(|c| !c.success)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} successful ({:.1}%), {} completed, {:.2} turns on average",
            self.system,
            self.succeeded,
            self.total,
            self.success_rate * 100.0,
            self.completed,
            self.mean_turns
        )
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
