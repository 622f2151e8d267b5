//! Agenda-based simulated user.
//!
//! The user keeps its pending intentions on an [`Agenda`]. Every system turn is routed
//! through a handler table keyed by dialogue act; whatever the handlers produce is split
//! into single-slot annotations, ordered by priority and pushed, and the user's reply is
//! a bounded, single-act batch popped from the top.

mod handlers;

use std::{cmp::Reverse, collections::HashSet, fmt};

use serde::Serialize;

use crate::{
    agenda::Agenda,
    diagact::DialogAct,
    profile::Profile,
    random::{RandomSource, SeededRandom},
    types::{Annotation, Goal, UserGoal},
    SimulationError,
};

pub use handlers::ResponseHandler;

/// What the user says in one turn and whether the conversation is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserTurn {
    pub annotations: Vec<Annotation>,
    pub episode_over: bool,
    pub failed: bool,
}

impl UserTurn {
    fn finished(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations,
            episode_over: true,
            failed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Ended,
    Failed,
}

fn termination_for(act: DialogAct) -> Option<Termination> {
    match act {
        DialogAct::Goodbye | DialogAct::NotifySuccess => Some(Termination::Ended),
        DialogAct::NotifyFailure => Some(Termination::Failed),
        _ => None,
    }
}

pub struct AgendaUser {
    max_turn: usize,
    profile: Option<Profile>,
    user_goal: Option<UserGoal>,
    agenda: Agenda,
    informed_slots: HashSet<String>,
    requested_option_slots: HashSet<String>,
    random: Box<dyn RandomSource>,
}

impl fmt::Debug for AgendaUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgendaUser")
            .field("max_turn", &self.max_turn)
            .field("profile", &self.profile)
            .field("user_goal", &self.user_goal)
            .field("agenda_len", &self.agenda.len())
            .field("informed_slots", &self.informed_slots)
            .field("requested_option_slots", &self.requested_option_slots)
            .finish()
    }
}

impl AgendaUser {
    /// A `max_turn` of zero disables the turn ceiling.
    pub fn new(max_turn: usize) -> Self {
        Self::with_random(max_turn, SeededRandom::from_entropy())
    }

    pub fn with_random(max_turn: usize, random: impl RandomSource + 'static) -> Self {
        Self {
            max_turn,
            profile: None,
            user_goal: None,
            agenda: Agenda::new(),
            informed_slots: HashSet::new(),
            requested_option_slots: HashSet::new(),
            random: Box::new(random),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_user_goal(mut self, user_goal: UserGoal) -> Self {
        self.user_goal = Some(user_goal);
        self
    }

    pub fn max_turn(&self) -> usize {
        self.max_turn
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn user_goal(&self) -> Option<&UserGoal> {
        self.user_goal.as_ref()
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn agenda_mut(&mut self) -> &mut Agenda {
        &mut self.agenda
    }

    pub fn informed_slots(&self) -> &HashSet<String> {
        &self.informed_slots
    }

    pub fn requested_option_slots(&self) -> &HashSet<String> {
        &self.requested_option_slots
    }

    /// Forgets the bound profile and goal along with everything said so far.
    pub fn reset(&mut self) {
        self.profile = None;
        self.user_goal = None;
        self.agenda.clear();
        self.informed_slots.clear();
        self.requested_option_slots.clear();
    }

    /// Builds the initial agenda. A profile or goal bound earlier takes precedence over
    /// the arguments; call [`AgendaUser::reset`] first to switch to a new goal.
    pub fn initialize(&mut self, profile: Profile, user_goal: UserGoal) -> Result<(), SimulationError> {
        self.agenda.clear();
        if self.profile.is_none() {
            profile.validate()?;
            self.profile = Some(profile);
        }
        if self.user_goal.is_none() {
            self.user_goal = Some(user_goal);
        }

        let goal = self.bound_goal()?.clone();
        let selected = self.choose_agenda_slots(&goal)?;
        self.create_agenda(selected, &goal.domain)
    }

    /// Picks which goal slots seed the agenda: the first slot always, every later slot
    /// with probability `agenda_size`.
    pub fn choose_agenda_slots(&mut self, goal: &UserGoal) -> Result<Vec<(String, Goal)>, SimulationError> {
        let agenda_size = self.bound_profile()?.agenda_size;
        let mut selected = Vec::new();

        for (index, slot_goal) in goal.goal_list.iter().enumerate() {
            if index == 0 || self.draw() < agenda_size {
                selected.push((goal.intent.clone(), slot_goal.clone()));
            }
        }
        Ok(selected)
    }

    /// Seeds the agenda with informs and requests for the selected slots. Requests go in
    /// first so that informs are expressed first.
    pub fn create_agenda(&mut self, selected: Vec<(String, Goal)>, domain: &str) -> Result<(), SimulationError> {
        let inform_probability = self.bound_profile()?.inform;
        let mut informs = Vec::new();
        let mut requests = Vec::new();

        for (intent, goal) in selected {
            if !goal.is_open() {
                informs.push(Annotation::new(DialogAct::Inform, intent, domain).with_goal(goal));
                continue;
            }

            // the first open slot is informed when nothing else has been
            let draw = self.draw();
            if informs.is_empty() || draw < inform_probability {
                informs.push(Annotation::new(DialogAct::Inform, intent, domain).with_goal(goal));
            } else {
                requests.push(
                    Annotation::new(DialogAct::Request, intent, domain).with_goal(Goal::placeholder(goal.slot)),
                );
            }
        }

        self.agenda.push_all(requests);
        self.agenda.push_all(informs);
        tracing::info!(len = self.agenda.len(), "agenda created:\n{}", self.agenda);
        Ok(())
    }

    /// Opening turn: an optional greeting followed by the informs on top of the agenda.
    pub fn start_conversation(&mut self) -> Result<Vec<Annotation>, SimulationError> {
        let polite = self.bound_profile()?.polite;
        let mut response = Vec::new();

        if self.draw() < polite {
            response.push(self.annotation(DialogAct::Greeting)?);
        }

        let budget = self.pop_budget()?;
        let informs = self
            .agenda
            .iter()
            .rev()
            .take(budget)
            .take_while(|annotation| annotation.diagact == DialogAct::Inform)
            .count();
        tracing::debug!(budget, informs, "starting conversation");

        response.extend(self.agenda.pop(informs, false));
        Ok(response)
    }

    /// Reacts to one system turn.
    ///
    /// Once `turn_count` reaches `max_turn - 1` the episode is over and nothing is said.
    /// An empty reply also ends the episode, softened into a goodbye for polite users.
    pub fn next(&mut self, system: &[Annotation], turn_count: usize) -> Result<UserTurn, SimulationError> {
        if self.max_turn > 0 && turn_count + 1 >= self.max_turn {
            tracing::debug!(turn_count, max_turn = self.max_turn, "turn limit reached");
            return Ok(UserTurn::finished(Vec::new()));
        }

        let mut produced = Vec::new();
        let mut episode_over = false;
        let mut failed = false;

        for annotation in system {
            if let Some(handler) = handlers::handler_for(annotation.diagact) {
                produced.extend(handler(self, annotation)?);
            }
            match termination_for(annotation.diagact) {
                Some(Termination::Ended) => episode_over = true,
                Some(Termination::Failed) => {
                    episode_over = true;
                    failed = true;
                }
                None => {}
            }
        }

        let mut single_slot: Vec<Annotation> = produced.into_iter().flat_map(Annotation::split).collect();
        single_slot.sort_by_key(|annotation| Reverse(annotation.diagact.priority()));
        self.agenda.push_all(single_slot);

        let mut annotations = Vec::new();
        if !episode_over {
            let budget = self.pop_budget()?;
            annotations = self.agenda.pop(budget, false);
        }

        if annotations.is_empty() {
            episode_over = true;
            if self.draw() < self.bound_profile()?.polite {
                annotations.push(self.annotation(DialogAct::Goodbye)?);
            }
            tracing::debug!("nothing left to say, ending episode");
        }

        Ok(UserTurn {
            annotations,
            episode_over,
            failed,
        })
    }

    fn pop_budget(&self) -> Result<usize, SimulationError> {
        let verbose = self.bound_profile()?.verbose;
        Ok(((verbose * self.agenda.len() as f64).floor() as usize).max(1))
    }

    fn draw(&mut self) -> f64 {
        self.random.next_f64()
    }

    fn bound_profile(&self) -> Result<&Profile, SimulationError> {
        self.profile.as_ref().ok_or(SimulationError::NotInitialized)
    }

    fn bound_goal(&self) -> Result<&UserGoal, SimulationError> {
        self.user_goal.as_ref().ok_or(SimulationError::NotInitialized)
    }

    /// Goal-less annotation in the user's own intent and domain.
    fn annotation(&self, act: DialogAct) -> Result<Annotation, SimulationError> {
        let goal = self.bound_goal()?;
        Ok(Annotation::new(act, goal.intent.clone(), goal.domain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random::ScriptedRandom, types::GoalValue};

    fn profile(polite: f64, verbose: f64, inform: f64, agenda_size: f64, requests_for_options: f64) -> Profile {
        Profile::new(polite, verbose, inform, agenda_size, requests_for_options)
    }

    fn booking(goals: Vec<Goal>) -> UserGoal {
        UserGoal::new("movie", "booking", goals)
    }

    fn slots(annotations: &[Annotation]) -> Vec<&str> {
        annotations
            .iter()
            .flat_map(|annotation| annotation.goal_list.iter().map(|goal| goal.slot.as_str()))
            .collect()
    }

    #[test]
    fn first_slot_is_always_chosen() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.99))
            .with_profile(profile(0.0, 1.0, 1.0, 0.0, 0.0));
        let goal = booking(vec![Goal::fixed("date", "today"), Goal::fixed("time", "2 pm")]);

        let selected = user.choose_agenda_slots(&goal).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, "booking");
        assert_eq!(selected[0].1.slot, "date");
    }

    #[test]
    fn later_slots_follow_agenda_size_draws() {
        // draws for slots 2 and 3
        let mut user = AgendaUser::with_random(10, ScriptedRandom::new([0.2, 0.8]))
            .with_profile(profile(0.0, 1.0, 1.0, 0.5, 0.0));
        let goal = booking(vec![
            Goal::fixed("date", "today"),
            Goal::fixed("time", "2 pm"),
            Goal::fixed("movie", "avatar"),
        ]);

        let selected = user.choose_agenda_slots(&goal).unwrap();
        let names: Vec<_> = selected.iter().map(|(_, goal)| goal.slot.as_str()).collect();
        assert_eq!(names, vec!["date", "time"]);
    }

    #[test]
    fn first_open_slot_is_informed_even_with_zero_inform_probability() {
        // with inform=0.0 only the first open slot is informed, so the opening turn is never empty
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.99))
            .with_profile(profile(0.0, 1.0, 0.0, 1.0, 0.0));
        let selected = vec![
            ("booking".to_string(), Goal::open("movie")),
            ("booking".to_string(), Goal::open("theatre_name")),
        ];

        user.create_agenda(selected, "movie").unwrap();
        let agenda = user.agenda();
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].diagact, DialogAct::Request);
        assert_eq!(agenda[0].goal_list[0].slot, "theatre_name");
        assert!(agenda[0].goal_list[0].value.is_empty());
        assert_eq!(agenda[1].diagact, DialogAct::Inform);
        assert_eq!(agenda[1].goal_list[0].slot, "movie");
    }

    #[test]
    fn informs_sit_above_requests() {
        // the open slot draws 0.9 against inform=0.5, so it becomes a request
        let mut user = AgendaUser::with_random(10, ScriptedRandom::new([0.9]))
            .with_profile(profile(0.0, 1.0, 0.5, 1.0, 0.0));
        let selected = vec![
            ("booking".to_string(), Goal::fixed("date", "today")),
            ("booking".to_string(), Goal::open("movie")),
            ("booking".to_string(), Goal::fixed("time", "2 pm")),
        ];

        user.create_agenda(selected, "movie").unwrap();
        let acts: Vec<_> = user.agenda().iter().map(|a| a.diagact).collect();
        assert_eq!(acts, vec![DialogAct::Request, DialogAct::Inform, DialogAct::Inform]);
        assert_eq!(slots(&user.agenda_mut().pop(2, false)), vec!["date", "time"]);
    }

    #[test]
    fn opening_turn_informs_in_goal_order() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.5));
        let goal = booking(vec![Goal::fixed("date", "tomorrow"), Goal::fixed("time", "2 pm")]);

        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), goal).unwrap();
        assert_eq!(user.agenda().len(), 2);
        assert!(user.agenda().iter().all(|a| a.diagact == DialogAct::Inform));

        let opening = user.start_conversation().unwrap();
        assert_eq!(opening.len(), 2);
        assert!(opening.iter().all(|a| a.diagact == DialogAct::Inform));
        assert_eq!(slots(&opening), vec!["date", "time"]);
        assert!(user.agenda().is_empty());
    }

    #[test]
    fn polite_user_greets_first() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.1));
        let goal = booking(vec![Goal::fixed("date", "tomorrow"), Goal::open("movie")]);

        user.initialize(profile(1.0, 0.5, 0.0, 1.0, 0.0), goal).unwrap();
        let opening = user.start_conversation().unwrap();

        assert_eq!(opening[0].diagact, DialogAct::Greeting);
        assert_eq!(opening[0].intent, "booking");
        // verbose 0.5 over two entries allows a single inform
        assert_eq!(opening.len(), 2);
        assert_eq!(opening[1].goal_list[0].slot, "date");
        assert_eq!(user.agenda().len(), 1);
        assert_eq!(user.agenda()[0].diagact, DialogAct::Request);
    }

    #[test]
    fn opening_turn_stops_at_first_non_inform() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.9))
            .with_profile(profile(0.0, 1.0, 0.0, 1.0, 0.0))
            .with_user_goal(booking(vec![Goal::fixed("date", "today")]));
        user.agenda_mut().push(
            Annotation::new(DialogAct::Request, "booking", "movie").with_goal(Goal::placeholder("movie")),
        );

        assert!(user.start_conversation().unwrap().is_empty());
        assert_eq!(user.agenda().len(), 1);
    }

    #[test]
    fn turn_limit_ends_episode_silently() {
        let mut user = AgendaUser::with_random(5, ScriptedRandom::constant(0.0));
        let goal = booking(vec![Goal::fixed("date", "tomorrow"), Goal::fixed("time", "2 pm")]);
        user.initialize(profile(1.0, 1.0, 1.0, 1.0, 0.0), goal).unwrap();

        let request = Annotation::new(DialogAct::Request, "booking", "movie").with_goal(Goal::placeholder("date"));
        let turn = user.next(&[request], 4).unwrap();

        assert!(turn.episode_over);
        assert!(!turn.failed);
        assert!(turn.annotations.is_empty());
        assert_eq!(user.agenda().len(), 2);
    }

    #[test]
    fn zero_max_turn_disables_limit() {
        let mut user = AgendaUser::with_random(0, ScriptedRandom::constant(0.9));
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap();

        let turn = user.next(&[], 1_000).unwrap();
        assert!(!turn.episode_over);
        assert_eq!(slots(&turn.annotations), vec!["date"]);
    }

    #[test]
    fn request_is_answered_with_inform() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.9));
        let goal = booking(vec![
            Goal::fixed("date", "tomorrow"),
            Goal::fixed("time", "2 pm"),
            Goal::fixed("movie", "avatar"),
        ]);
        // agenda_size 0 keeps only the first slot on the agenda
        user.initialize(profile(0.0, 1.0, 1.0, 0.0, 0.0), goal).unwrap();
        user.start_conversation().unwrap();

        let request = Annotation::new(DialogAct::Request, "booking", "movie")
            .with_goal(Goal::placeholder("time"))
            .with_goal(Goal::placeholder("movie"));
        let turn = user.next(&[request], 2).unwrap();

        assert!(!turn.episode_over);
        assert!(turn.annotations.iter().all(|a| a.diagact == DialogAct::Inform));
        assert_eq!(slots(&turn.annotations), vec!["time", "movie"]);
        assert!(user.informed_slots().contains("time"));
        assert!(user.informed_slots().contains("movie"));
    }

    #[test]
    fn dont_care_request_asks_for_options() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.5));
        let goal = booking(vec![
            Goal::fixed("date", "tomorrow"),
            Goal::new("num_people", GoalValue::dont_care(), Some(crate::types::GoalType::Open)),
        ]);
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 1.0), goal).unwrap();
        // both slots were informed onto the agenda; the options request must replace the stale inform
        assert_eq!(user.agenda().search_agenda(DialogAct::Inform, Some("num_people")).len(), 1);

        let request =
            Annotation::new(DialogAct::Request, "booking", "movie").with_goal(Goal::placeholder("num_people"));
        let response = user.response_to_request(&request).unwrap();

        assert_eq!(response.len(), 1);
        assert_eq!(response[0].diagact, DialogAct::RequestAlts);
        assert_eq!(slots(&response), vec!["num_people"]);
        assert!(user.requested_option_slots().contains("num_people"));
        assert!(!user.informed_slots().contains("num_people"));
        assert!(user.agenda().search_agenda(DialogAct::Inform, Some("num_people")).is_empty());

        // a second request for the same slot does not ask again
        assert!(user.response_to_request(&request).unwrap().is_empty());
    }

    #[test]
    fn notify_failure_fails_episode() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.9));
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap();

        let failure = Annotation::new(DialogAct::NotifyFailure, "booking", "movie");
        let turn = user.next(&[failure], 3).unwrap();

        assert!(turn.episode_over);
        assert!(turn.failed);
        // impolite users leave silently
        assert!(turn.annotations.is_empty());
        assert!(user.agenda().iter().any(|a| a.diagact == DialogAct::Goodbye));
    }

    #[test]
    fn notify_success_ends_with_goodbye_for_polite_users() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.1));
        user.initialize(profile(1.0, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap();

        let success = Annotation::new(DialogAct::NotifySuccess, "booking", "movie");
        let turn = user.next(&[success], 3).unwrap();

        assert!(turn.episode_over);
        assert!(!turn.failed);
        assert_eq!(turn.annotations.len(), 1);
        assert_eq!(turn.annotations[0].diagact, DialogAct::Goodbye);
    }

    #[test]
    fn empty_agenda_ends_episode() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.9));
        user.initialize(profile(0.5, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap();
        user.start_conversation().unwrap();

        let turn = user.next(&[Annotation::new(DialogAct::Affirm, "booking", "movie")], 2).unwrap();
        assert!(turn.episode_over);
        assert!(turn.annotations.is_empty());
    }

    #[test]
    fn unhandled_acts_contribute_nothing() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.9));
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap();

        let system = [
            Annotation::new(DialogAct::CantUnderstand, "booking", "movie"),
            Annotation::new(DialogAct::Other, "booking", "movie"),
            Annotation::new(DialogAct::ThankYou, "booking", "movie"),
        ];
        let turn = user.next(&system, 2).unwrap();
        assert!(!turn.episode_over);
        assert_eq!(slots(&turn.annotations), vec!["date"]);
        assert!(user.agenda().is_empty());
    }

    #[test]
    fn initialize_keeps_bound_goal_until_reset() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.0));
        let first = booking(vec![Goal::fixed("date", "today")]);
        let second = booking(vec![Goal::fixed("time", "7 pm")]);

        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), first.clone()).unwrap();
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), second.clone()).unwrap();
        assert_eq!(user.user_goal(), Some(&first));

        user.reset();
        user.initialize(profile(0.0, 1.0, 1.0, 1.0, 0.0), second.clone()).unwrap();
        assert_eq!(user.user_goal(), Some(&second));
        assert_eq!(user.agenda()[0].goal_list[0].slot, "time");
    }

    #[test]
    fn initialize_rejects_invalid_profile() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.0));
        let error = user
            .initialize(profile(2.0, 1.0, 1.0, 1.0, 0.0), booking(vec![Goal::fixed("date", "today")]))
            .unwrap_err();
        assert!(matches!(error, SimulationError::Profile(_)));
    }

    #[test]
    fn uninitialized_user_reports_error() {
        let mut user = AgendaUser::with_random(10, ScriptedRandom::constant(0.0));
        assert!(matches!(user.start_conversation(), Err(SimulationError::NotInitialized)));
    }

    #[test]
    fn mixed_turn_is_split_and_pushed_by_priority() {
        let mut user = AgendaUser::with_random(20, ScriptedRandom::constant(0.9));
        let goal = booking(vec![
            Goal::fixed("date", "tomorrow"),
            Goal::fixed("time", "2 pm"),
            Goal::fixed("movie", "avatar"),
        ]);
        user.initialize(profile(0.0, 1.0, 1.0, 0.0, 0.0), goal).unwrap();
        user.start_conversation().unwrap();
        assert!(user.agenda().is_empty());

        let request = Annotation::new(DialogAct::Request, "booking", "movie")
            .with_goal(Goal::placeholder("time"))
            .with_goal(Goal::placeholder("movie"));
        let confirm = Annotation::new(DialogAct::Confirm, "booking", "movie").with_goal(Goal::fixed("date", "tomorrow"));
        let turn = user.next(&[request, confirm], 2).unwrap();

        // AFFIRM has the lower priority, so it is pushed last and popped alone
        assert_eq!(turn.annotations.len(), 1);
        assert_eq!(turn.annotations[0].diagact, DialogAct::Affirm);
        assert!(!turn.episode_over);

        let agenda = user.agenda();
        assert_eq!(agenda.len(), 2);
        assert!(agenda.iter().all(|a| a.diagact == DialogAct::Inform && a.goal_list.len() == 1));
        assert_eq!(agenda[0].goal_list[0].slot, "time");
        assert_eq!(agenda[1].goal_list[0].slot, "movie");
    }
}
