use std::{collections::BTreeSet, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::diagact::DialogAct;

/// Value a user holds for a slot when they have no preference.
pub const DONT_CARE: &str = "dont care";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Fixed,
    Flexible,
    Open,
    MultipleValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GoalValue {
    #[default]
    Empty,
    Scalar(String),
    List(Vec<String>),
}

impl GoalValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        GoalValue::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GoalValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn dont_care() -> Self {
        GoalValue::List(vec![DONT_CARE.to_string()])
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GoalValue::Empty => true,
            GoalValue::Scalar(_) => false,
            GoalValue::List(values) => values.is_empty(),
        }
    }

    /// True for the "dont care" sentinel, either bare or as a one-element list.
    pub fn is_dont_care(&self) -> bool {
        match self {
            GoalValue::Scalar(value) => value == DONT_CARE,
            GoalValue::List(values) => values.len() == 1 && values[0] == DONT_CARE,
            GoalValue::Empty => false,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            GoalValue::Empty => Vec::new(),
            GoalValue::Scalar(value) => vec![value.as_str()],
            GoalValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn value_set(&self) -> BTreeSet<&str> {
        self.values().into_iter().collect()
    }
}

impl fmt::Display for GoalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoalValue::Empty => f.write_str("-"),
            GoalValue::Scalar(value) => f.write_str(value),
            GoalValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

/// One slot of the user's private goal, or a request placeholder when `value` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Goal {
    pub slot: String,
    #[serde(default)]
    pub value: GoalValue,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<GoalType>,
}

impl Goal {
    pub fn new(slot: impl Into<String>, value: GoalValue, goal_type: Option<GoalType>) -> Self {
        Self {
            slot: slot.into(),
            value,
            goal_type,
        }
    }

    pub fn fixed(slot: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(slot, GoalValue::scalar(value), Some(GoalType::Fixed))
    }

    pub fn open(slot: impl Into<String>) -> Self {
        Self::new(slot, GoalValue::dont_care(), Some(GoalType::Open))
    }

    /// Placeholder goal carried by a request for a slot.
    pub fn placeholder(slot: impl Into<String>) -> Self {
        Self::new(slot, GoalValue::Empty, None)
    }

    pub fn is_open(&self) -> bool {
        self.goal_type == Some(GoalType::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserGoal {
    pub domain: String,
    pub intent: String,
    pub goal_list: Vec<Goal>,
}

impl UserGoal {
    pub fn new(domain: impl Into<String>, intent: impl Into<String>, goal_list: Vec<Goal>) -> Self {
        Self {
            domain: domain.into(),
            intent: intent.into(),
            goal_list,
        }
    }

    /// Last goal with the given slot name.
    pub fn goal_for(&self, slot: &str) -> Option<&Goal> {
        self.goal_list.iter().rev().find(|goal| goal.slot == slot)
    }
}

/// Identity of an annotation inside an agenda: its dialogue act and the set of slots it
/// mentions. Goal order, values, intent and domain do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationKey {
    pub diagact: DialogAct,
    pub slots: BTreeSet<String>,
}

/// Atomic unit of communication between the simulated user and the system.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Annotation {
    pub diagact: DialogAct,
    #[serde(default)]
    pub goal_list: Vec<Goal>,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub domain: String,
}

impl Annotation {
    pub fn new(diagact: DialogAct, intent: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            diagact,
            goal_list: Vec::new(),
            intent: intent.into(),
            domain: domain.into(),
        }
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal_list.push(goal);
        self
    }

    pub fn with_goals<I>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = Goal>,
    {
        self.goal_list.extend(goals);
        self
    }

    pub fn key(&self) -> AnnotationKey {
        AnnotationKey {
            diagact: self.diagact,
            slots: self.goal_list.iter().map(|goal| goal.slot.clone()).collect(),
        }
    }

    pub fn mentions_slot(&self, slot: &str) -> bool {
        self.goal_list.iter().any(|goal| goal.slot == slot)
    }

    /// Splits a multi-goal annotation into one annotation per goal.
    pub fn split(self) -> Vec<Annotation> {
        if self.goal_list.len() <= 1 {
            return vec![self];
        }

        let Annotation {
            diagact,
            goal_list,
            intent,
            domain,
        } = self;

        goal_list
            .into_iter()
            .map(|goal| Annotation {
                diagact,
                goal_list: vec![goal],
                intent: intent.clone(),
                domain: domain.clone(),
            })
            .collect()
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Annotation {}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.diagact)?;
        for (index, goal) in self.goal_list.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", goal.slot, goal.value)?;
        }
        f.write_str(")")
    }
}
