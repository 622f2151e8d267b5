use indexmap::IndexMap;

use crate::{
    diagact::DialogAct,
    system::SystemAgent,
    types::{Annotation, Goal, GoalValue},
};

const SLOT_ORDER: [&str; 5] = ["date", "time", "movie", "num_people", "theatre_name"];

const DEFAULT_VALUES: [(&str, &str); 5] = [
    ("time", "2 pm"),
    ("date", "tomorrow"),
    ("movie", "12 angry men"),
    ("theatre_name", "angelika"),
    ("num_people", "2"),
];

/// Slot-filling movie ticket bot.
///
/// Asks for one missing slot per turn in a fixed order, answers questions about a slot by
/// selecting a default value, and asks for confirmation once every slot is known. An
/// affirmed confirmation books the tickets.
#[derive(Debug, Clone)]
pub struct RuleBasedBookingBot {
    intent: String,
    domain: String,
    slot_order: Vec<String>,
    defaults: IndexMap<String, String>,
    known: IndexMap<String, Goal>,
    awaiting_confirmation: bool,
}

impl RuleBasedBookingBot {
    pub fn new() -> Self {
        Self {
            intent: "booking".to_string(),
            domain: "movie".to_string(),
            slot_order: SLOT_ORDER.iter().map(|slot| slot.to_string()).collect(),
            defaults: DEFAULT_VALUES
                .iter()
                .map(|(slot, value)| (slot.to_string(), value.to_string()))
                .collect(),
            known: IndexMap::new(),
            awaiting_confirmation: false,
        }
    }

    pub fn with_context(mut self, intent: impl Into<String>, domain: impl Into<String>) -> Self {
        self.intent = intent.into();
        self.domain = domain.into();
        self
    }

    /// Replaces the slots the bot collects, in the order it asks for them.
    pub fn with_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slot_order = slots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(slot.into(), value.into());
        self
    }

    /// Value the bot currently holds for a slot.
    pub fn known(&self, slot: &str) -> Option<&GoalValue> {
        self.known.get(slot).map(|goal| &goal.value)
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    fn annotation(&self, act: DialogAct) -> Annotation {
        Annotation::new(act, self.intent.clone(), self.domain.clone())
    }

    /// Stores an informed value, substituting the default for "dont care".
    fn record(&mut self, goal: &Goal) {
        if goal.value.is_empty() {
            return;
        }
        let value = match self.defaults.get(&goal.slot) {
            Some(default) if goal.value.is_dont_care() => GoalValue::list([default.clone()]),
            _ => goal.value.clone(),
        };
        self.known
            .insert(goal.slot.clone(), Goal::new(goal.slot.clone(), value, goal.goal_type));
    }

    fn missing_slot(&self) -> Option<&str> {
        self.slot_order
            .iter()
            .map(String::as_str)
            .find(|slot| !self.known.contains_key(*slot))
    }

    /// Known goals in asking order, followed by any extra slots the user volunteered.
    fn known_goals(&self) -> Vec<Goal> {
        let ordered = self
            .slot_order
            .iter()
            .filter_map(|slot| self.known.get(slot).cloned());
        let extra = self
            .known
            .values()
            .filter(|goal| !self.slot_order.contains(&goal.slot))
            .cloned();
        ordered.chain(extra).collect()
    }
}

impl Default for RuleBasedBookingBot {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemAgent for RuleBasedBookingBot {
    fn respond(&mut self, user: &[Annotation]) -> Vec<Annotation> {
        let mut affirmed = false;
        let mut asked: Vec<String> = Vec::new();

        for annotation in user {
            match annotation.diagact {
                DialogAct::Inform => {
                    for goal in &annotation.goal_list {
                        self.record(goal);
                    }
                }
                DialogAct::Request | DialogAct::RequestAlts => {
                    for goal in &annotation.goal_list {
                        if !asked.contains(&goal.slot) {
                            asked.push(goal.slot.clone());
                        }
                    }
                }
                DialogAct::Affirm => affirmed = true,
                DialogAct::Negate => {
                    self.awaiting_confirmation = false;
                    // a negation carrying a value corrects the slot, a bare one retracts it
                    for goal in &annotation.goal_list {
                        if goal.value.is_empty() || goal.value.is_dont_care() {
                            self.known.shift_remove(&goal.slot);
                        } else {
                            self.record(goal);
                        }
                    }
                }
                DialogAct::Goodbye => return vec![self.annotation(DialogAct::Goodbye)],
                _ => {}
            }
        }

        if affirmed && self.awaiting_confirmation && self.missing_slot().is_none() {
            self.awaiting_confirmation = false;
            tracing::debug!(bot = self.name(), "booking confirmed");
            return vec![self.annotation(DialogAct::NotifySuccess).with_goals(self.known_goals())];
        }

        let selections: Vec<Goal> = asked
            .iter()
            .filter_map(|slot| {
                self.defaults
                    .get(slot)
                    .map(|value| Goal::new(slot.clone(), GoalValue::list([value.clone()]), None))
            })
            .collect();
        if !selections.is_empty() {
            return vec![self.annotation(DialogAct::Select).with_goals(selections)];
        }

        if let Some(slot) = self.missing_slot() {
            let request = self.annotation(DialogAct::Request).with_goal(Goal::placeholder(slot));
            self.awaiting_confirmation = false;
            return vec![request];
        }

        self.awaiting_confirmation = true;
        vec![self.annotation(DialogAct::Confirm).with_goals(self.known_goals())]
    }

    fn reset(&mut self) {
        self.known.clear();
        self.awaiting_confirmation = false;
    }

    fn name(&self) -> &'static str {
        "rule-based-booking"
    }
}
