use indexmap::IndexMap;

use crate::{
    random::RandomSource,
    types::{Goal, GoalType, GoalValue, UserGoal},
};

const GOAL_TYPES: [GoalType; 4] = [
    GoalType::Fixed,
    GoalType::Flexible,
    GoalType::MultipleValue,
    GoalType::Open,
];

/// Number of candidate values a multiple-value goal accepts.
const MULTIPLE_VALUE_COUNT: usize = 3;

/// Draws random user goals over a fixed set of slots and candidate values.
#[derive(Debug, Clone)]
pub struct GoalGenerator {
    domain: String,
    intent: String,
    slot_values: IndexMap<String, Vec<String>>,
    goal_types: Vec<GoalType>,
}

impl GoalGenerator {
    pub fn new(domain: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            intent: intent.into(),
            slot_values: IndexMap::new(),
            goal_types: GOAL_TYPES.to_vec(),
        }
    }

    /// Slots and values of the movie ticket booking domain.
    pub fn movie_booking() -> Self {
        Self::new("movie", "booking")
            .with_slot("time", ["2", "3", "12", "7", "2 pm", "12 pm", "7 pm", "12 am", "7 am"])
            .with_slot(
                "date",
                ["today", "tomorrow", "saturday", "monday", "tuesday", "wednesday", "friday"],
            )
            .with_slot(
                "movie",
                [
                    "achcham yenbadhu madamaiyada",
                    "12 angry men",
                    "a man called love",
                    "american pastoral",
                    "avatar",
                ],
            )
            .with_slot(
                "theatre_name",
                ["amc mercado", "aquarius", "lincoln square cinemas", "angelika", "the stanford theater"],
            )
            .with_slot("num_people", ["1", "2", "3", "4"])
    }

    /// Keeps the slots but draws goals for another domain and intent.
    pub fn with_context(mut self, domain: impl Into<String>, intent: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.intent = intent.into();
        self
    }

    pub fn with_slot<I, S>(mut self, slot: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.slot_values
            .insert(slot.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts the goal types drawn for each slot. An empty list keeps the current set.
    pub fn with_goal_types(mut self, goal_types: Vec<GoalType>) -> Self {
        if !goal_types.is_empty() {
            self.goal_types = goal_types;
        }
        self
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.slot_values.keys().map(String::as_str)
    }

    pub fn generate_one(&self, random: &mut dyn RandomSource) -> UserGoal {
        let goal_list = self
            .slot_values
            .iter()
            .map(|(slot, values)| self.random_goal(slot, values, &mut *random))
            .collect();
        UserGoal::new(self.domain.clone(), self.intent.clone(), goal_list)
    }

    pub fn generate(&self, count: usize, random: &mut dyn RandomSource) -> Vec<UserGoal> {
        (0..count).map(|_| self.generate_one(&mut *random)).collect()
    }

    fn random_goal(&self, slot: &str, values: &[String], random: &mut dyn RandomSource) -> Goal {
        let goal_type = self.goal_types[random.choose_index(self.goal_types.len())];
        let value = match goal_type {
            GoalType::Fixed | GoalType::Flexible if values.is_empty() => GoalValue::dont_care(),
            GoalType::Fixed | GoalType::Flexible => {
                GoalValue::List(vec![values[random.choose_index(values.len())].clone()])
            }
            GoalType::Open => GoalValue::dont_care(),
            GoalType::MultipleValue => {
                GoalValue::List(values.iter().take(MULTIPLE_VALUE_COUNT).cloned().collect())
            }
        };
        Goal::new(slot, value, Some(goal_type))
    }
}

impl Default for GoalGenerator {
    fn default() -> Self {
        Self::movie_booking()
    }
}
