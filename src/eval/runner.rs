use chrono::Utc;

use crate::{
    diagact::DialogAct,
    eval::{
        report::{ConversationReport, SimulationReport},
        scenario::SimulationConfig,
    },
    history::ConversationLog,
    profile::Profile,
    random::SeededRandom,
    simulator::AgendaUser,
    system::SystemAgent,
    types::UserGoal,
    SimulationError,
};

/// Drives an [`AgendaUser`] against a [`SystemAgent`], one conversation per user goal.
pub struct Moderator {
    user: AgendaUser,
    system: Box<dyn SystemAgent>,
    keep_transcripts: bool,
}

impl Moderator {
    pub fn new(user: AgendaUser, system: Box<dyn SystemAgent>) -> Self {
        Self {
            user,
            system,
            keep_transcripts: false,
        }
    }

    /// Builds the user, the system and the goals described by `config`.
    pub fn from_config(config: &SimulationConfig) -> Result<(Self, Vec<UserGoal>), SimulationError> {
        let (mut goal_random, user_random) = match config.seed {
            Some(seed) => (SeededRandom::new(seed), SeededRandom::new(seed.wrapping_add(1))),
            None => (SeededRandom::from_entropy(), SeededRandom::from_entropy()),
        };

        let goals = if config.goals.is_empty() {
            config.goal_generator().generate(config.runs, &mut goal_random)
        } else {
            config.goals.clone()
        };

        let user = AgendaUser::with_random(config.max_turns, user_random);
        let moderator = Self::new(user, config.build_system()?);
        Ok((moderator, goals))
    }

    pub fn with_transcripts(mut self, keep: bool) -> Self {
        self.keep_transcripts = keep;
        self
    }

    pub fn user(&self) -> &AgendaUser {
        &self.user
    }

    pub fn max_turns(&self) -> usize {
        self.user.max_turn()
    }

    /// A conversation succeeds when it ends on its own before the last two turns and the
    /// system did not report a failure. Without a turn ceiling only failures count.
    pub fn is_success(&self, turns: usize, failed: bool) -> bool {
        let max_turns = self.max_turns();
        !failed && (max_turns == 0 || turns < max_turns - 1)
    }

    pub fn run(&mut self, profile: &Profile, goals: &[UserGoal]) -> Result<SimulationReport, SimulationError> {
        if goals.is_empty() {
            return Err(SimulationError::NoGoals);
        }
        profile.validate()?;

        let started_at = Utc::now();
        let mut conversations = Vec::with_capacity(goals.len());
        for (index, goal) in goals.iter().enumerate() {
            conversations.push(self.run_conversation(index, profile, goal)?);
        }

        let report = SimulationReport::from_conversations(self.system.name(), self.max_turns(), started_at, conversations);
        tracing::info!(
            system = %report.system,
            total = report.total,
            succeeded = report.succeeded,
            mean_turns = report.mean_turns,
            "simulation finished"
        );
        Ok(report)
    }

    pub fn run_conversation(
        &mut self,
        index: usize,
        profile: &Profile,
        goal: &UserGoal,
    ) -> Result<ConversationReport, SimulationError> {
        self.system.reset();
        self.user.reset();
        self.user.initialize(profile.clone(), goal.clone())?;

        let mut log = ConversationLog::new();
        let mut user_turn = self.user.start_conversation()?;
        log.push_user(user_turn.clone());
        let mut turns = 1;
        let mut failed = false;
        let mut completed = false;

        loop {
            let system_turn = self.system.respond(&user_turn);
            turns += 1;
            completed |= system_turn.iter().any(|a| a.diagact == DialogAct::NotifySuccess);
            log.push_system(system_turn.clone());
            if let Some(turn) = log.last() {
                tracing::debug!(conversation = index, turns, "{turn}");
            }

            let reply = self.user.next(&system_turn, turns)?;
            turns += 1;
            log.push_user(reply.annotations.clone());
            if let Some(turn) = log.last() {
                tracing::debug!(conversation = index, turns, "{turn}");
            }

            if reply.failed {
                failed = true;
                break;
            }
            if reply.episode_over {
                break;
            }
            user_turn = reply.annotations;
        }

        let success = self.is_success(turns, failed);
        tracing::info!(conversation = index, turns, success, completed, "conversation finished");

        Ok(ConversationReport {
            index,
            goal: goal.clone(),
            turns,
            success,
            completed,
            failed,
            transcript: self.keep_transcripts.then_some(log),
        })
    }
}

/// Runs every conversation described by `config`.
pub fn simulate(config: &SimulationConfig, keep_transcripts: bool) -> Result<SimulationReport, SimulationError> {
    let profile = config.resolve_profile()?;
    let (moderator, goals) = Moderator::from_config(config)?;
    moderator.with_transcripts(keep_transcripts).run(&profile, &goals)
}
