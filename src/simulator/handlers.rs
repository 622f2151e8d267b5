use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::AgendaUser;
use crate::{
    diagact::DialogAct,
    types::{Annotation, Goal, GoalType, GoalValue},
    SimulationError,
};

/// Reaction of the simulated user to one system annotation.
pub type ResponseHandler = fn(&mut AgendaUser, &Annotation) -> Result<Vec<Annotation>, SimulationError>;

/// Handler table. Acts without an entry produce no user annotations.
pub(super) fn handler_for(act: DialogAct) -> Option<ResponseHandler> {
    let handler: ResponseHandler = match act {
        DialogAct::Greeting => AgendaUser::response_to_greeting,
        DialogAct::Inform => AgendaUser::response_to_inform,
        DialogAct::Request => AgendaUser::response_to_request,
        DialogAct::Confirm => AgendaUser::response_to_confirm,
        DialogAct::Offer => AgendaUser::response_to_offer,
        DialogAct::Select => AgendaUser::response_to_select,
        DialogAct::Negate => AgendaUser::response_to_negate,
        DialogAct::NotifySuccess => AgendaUser::response_to_notify_success,
        DialogAct::NotifyFailure => AgendaUser::response_to_notify_failure,
        DialogAct::Affirm
        | DialogAct::Goodbye
        | DialogAct::ThankYou
        | DialogAct::RequestAlts
        | DialogAct::CantUnderstand
        | DialogAct::Other => return None,
    };
    Some(handler)
}

impl AgendaUser {
    /// A system greeting is answered like the opening turn.
    pub fn response_to_greeting(&mut self, _system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        self.start_conversation()
    }

    /// Extension point for revising informed values; says nothing for now.
    pub fn response_to_inform(&mut self, _system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        Ok(Vec::new())
    }

    /// Extension point for a system rejecting a user value; says nothing for now.
    pub fn response_to_negate(&mut self, _system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        Ok(Vec::new())
    }

    /// Informs requested slots, or asks for options on slots the user does not care about.
    ///
    /// Slots already informed are skipped. An options request replaces any inform for the
    /// same slot still waiting on the agenda.
    pub fn response_to_request(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        let requests_for_options = self.bound_profile()?.requests_for_options;
        let user_goal = self.bound_goal()?.clone();
        let (intent, domain) = self.context_of(system)?;

        let mut to_inform = Vec::new();
        let mut to_request_options = Vec::new();

        for requested in &system.goal_list {
            let slot = requested.slot.as_str();
            if self.informed_slots.contains(slot) {
                continue;
            }
            let Some(goal) = user_goal.goal_for(slot) else {
                tracing::warn!(slot, "system requested a slot missing from the user goal");
                continue;
            };

            if goal.value.is_dont_care() {
                if self.draw() < requests_for_options {
                    if !self.requested_option_slots.contains(slot) {
                        to_request_options.push(goal.clone());
                    }
                } else {
                    to_inform.push(goal.clone());
                }
            } else {
                to_inform.push(goal.clone());
                self.informed_slots.insert(slot.to_string());
            }
        }

        let mut response = Vec::new();
        if !to_inform.is_empty() {
            response.push(Annotation::new(DialogAct::Inform, intent.clone(), domain.clone()).with_goals(to_inform));
        }

        if !to_request_options.is_empty() {
            let mut stale = Vec::new();
            for goal in &to_request_options {
                self.requested_option_slots.insert(goal.slot.clone());
                stale.extend(self.agenda.search_agenda(DialogAct::Inform, Some(&goal.slot)));
            }
            self.agenda.remove_by_index(stale)?;
            response.push(Annotation::new(DialogAct::RequestAlts, intent, domain).with_goals(to_request_options));
        }

        Ok(response)
    }

    /// Affirms a confirmation unless a confirmed value contradicts a concrete preference,
    /// in which case the preferred goals are negated back.
    pub fn response_to_confirm(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        let user_goal = self.bound_goal()?;
        let mut negations = Vec::new();

        for confirmed in system.goal_list.iter().filter(|goal| !goal.value.is_empty()) {
            let Some(preferred) = user_goal.goal_for(&confirmed.slot) else {
                continue;
            };
            if preferred.value.is_empty() || preferred.value.is_dont_care() {
                continue;
            }
            let offered = confirmed.value.value_set();
            if preferred.value.value_set().is_disjoint(&offered) {
                negations.push(preferred.clone());
            }
        }

        let (intent, domain) = self.context_of(system)?;
        let response = if negations.is_empty() {
            Annotation::new(DialogAct::Affirm, intent, domain)
        } else {
            Annotation::new(DialogAct::Negate, intent, domain).with_goals(negations)
        };
        Ok(vec![response])
    }

    /// Judges each offered slot against the user's goal type.
    ///
    /// Fixed slots need every preferred value on offer, flexible slots ask for
    /// alternatives instead of refusing, multiple-value slots accept any overlap and
    /// open slots accept anything.
    pub fn response_to_offer(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        let user_goal = self.bound_goal()?;
        let (intent, domain) = self.context_of(system)?;

        let mut offered: IndexMap<&str, BTreeSet<&str>> = IndexMap::new();
        for goal in &system.goal_list {
            offered.entry(goal.slot.as_str()).or_default().extend(goal.value.values());
        }

        let mut response = Vec::new();
        for (slot, values) in offered {
            let Some(preferred) = user_goal.goal_for(slot) else {
                continue;
            };
            let wanted = preferred.value.value_set();
            let accepted = Goal::new(
                slot,
                GoalValue::list(values.iter().copied()),
                preferred.goal_type,
            );

            let act = if preferred.value.is_dont_care() {
                DialogAct::Affirm
            } else {
                match preferred.goal_type {
                    Some(GoalType::Fixed) if wanted.is_subset(&values) => DialogAct::Affirm,
                    Some(GoalType::Fixed) => DialogAct::Negate,
                    Some(GoalType::Flexible) if wanted.is_subset(&values) => DialogAct::Affirm,
                    Some(GoalType::Flexible) => DialogAct::RequestAlts,
                    Some(GoalType::MultipleValue) if !wanted.is_disjoint(&values) => DialogAct::Affirm,
                    Some(GoalType::MultipleValue) => DialogAct::Negate,
                    Some(GoalType::Open) | None => DialogAct::Affirm,
                }
            };

            let goal = if act == DialogAct::Affirm {
                accepted
            } else {
                preferred.clone()
            };
            response.push(Annotation::new(act, intent.clone(), domain.clone()).with_goal(goal));
        }

        Ok(response)
    }

    /// Takes up the system's selection by informing it back.
    pub fn response_to_select(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        if system.goal_list.is_empty() {
            return Ok(Vec::new());
        }
        let (intent, domain) = self.context_of(system)?;
        Ok(vec![
            Annotation::new(DialogAct::Inform, intent, domain).with_goals(system.goal_list.iter().cloned()),
        ])
    }

    pub fn response_to_notify_success(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        let (intent, domain) = self.context_of(system)?;
        Ok(vec![Annotation::new(DialogAct::ThankYou, intent, domain)])
    }

    pub fn response_to_notify_failure(&mut self, system: &Annotation) -> Result<Vec<Annotation>, SimulationError> {
        let (intent, domain) = self.context_of(system)?;
        Ok(vec![Annotation::new(DialogAct::Goodbye, intent, domain)])
    }

    /// Intent and domain to answer in: the system's, falling back to the user goal's.
    fn context_of(&self, system: &Annotation) -> Result<(String, String), SimulationError> {
        let goal = self.bound_goal()?;
        let intent = if system.intent.is_empty() {
            goal.intent.clone()
        } else {
            system.intent.clone()
        };
        let domain = if system.domain.is_empty() {
            goal.domain.clone()
        } else {
            system.domain.clone()
        };
        Ok((intent, domain))
    }
}
