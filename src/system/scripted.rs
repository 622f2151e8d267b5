use std::path::Path;

use crate::{
    diagact::DialogAct,
    system::SystemAgent,
    types::Annotation,
    SimulationError,
};

/// Replays fixed system turns and says goodbye once they run out.
#[derive(Debug, Clone)]
pub struct ScriptedSystem {
    turns: Vec<Vec<Annotation>>,
    current: usize,
    intent: String,
    domain: String,
}

impl ScriptedSystem {
    pub fn new(turns: Vec<Vec<Annotation>>) -> Self {
        Self {
            turns,
            current: 0,
            intent: "booking".to_string(),
            domain: "movie".to_string(),
        }
    }

    /// Intent and domain of the closing goodbye.
    pub fn with_context(mut self, intent: impl Into<String>, domain: impl Into<String>) -> Self {
        self.intent = intent.into();
        self.domain = domain.into();
        self
    }

    /// Parses a YAML (or JSON) list of turns, each a list of annotations.
    pub fn from_yaml_str(input: &str) -> Result<Self, SimulationError> {
        let turns: Vec<Vec<Annotation>> = serde_yaml::from_str(input)?;
        Ok(Self::new(turns))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn remaining(&self) -> usize {
        self.turns.len().saturating_sub(self.current)
    }

    fn next_turn(&mut self) -> Option<Vec<Annotation>> {
        let turn = self.turns.get(self.current)?.clone();
        self.current += 1;
        Some(turn)
    }
}

impl SystemAgent for ScriptedSystem {
    fn respond(&mut self, _user: &[Annotation]) -> Vec<Annotation> {
        self.next_turn().unwrap_or_else(|| {
            vec![Annotation::new(
                DialogAct::Goodbye,
                self.intent.clone(),
                self.domain.clone(),
            )]
        })
    }

    fn reset(&mut self) {
        self.current = 0;
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
