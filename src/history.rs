use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{diagact::DialogAct, types::Annotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    System,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => f.write_str("user"),
            Speaker::System => f.write_str("system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: Speaker,
    pub annotations: Vec<Annotation>,
}

impl DialogueTurn {
    pub fn new(speaker: Speaker, annotations: Vec<Annotation>) -> Self {
        Self { speaker, annotations }
    }

    pub fn has_act(&self, act: DialogAct) -> bool {
        self.annotations.iter().any(|annotation| annotation.diagact == act)
    }
}

impl fmt::Display for DialogueTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.speaker)?;
        for annotation in &self.annotations {
            write!(f, " {annotation}")?;
        }
        Ok(())
    }
}

/// Transcript of one simulated dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<DialogueTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn push(&mut self, turn: DialogueTurn) {
        self.turns.push(turn);
    }

    pub fn push_user(&mut self, annotations: Vec<Annotation>) {
        self.push(DialogueTurn::new(Speaker::User, annotations));
    }

    pub fn push_system(&mut self, annotations: Vec<Annotation>) {
        self.push(DialogueTurn::new(Speaker::System, annotations));
    }

    pub fn turns(&self) -> &[DialogueTurn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<DialogueTurn> {
        self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DialogueTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn last(&self) -> Option<&DialogueTurn> {
        self.turns.last()
    }

    /// Last turn spoken by `speaker`.
    pub fn last_from(&self, speaker: Speaker) -> Option<&DialogueTurn> {
        self.turns.iter().rev().find(|turn| turn.speaker == speaker)
    }

    /// True when any turn of `speaker` carried `act`.
    pub fn contains_act(&self, speaker: Speaker, act: DialogAct) -> bool {
        self.turns
            .iter()
            .any(|turn| turn.speaker == speaker && turn.has_act(act))
    }
}

impl fmt::Display for ConversationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for turn in &self.turns {
            writeln!(f, "{turn}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a DialogueTurn;
    type IntoIter = std::slice::Iter<'a, DialogueTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
