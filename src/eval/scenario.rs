use std::{
    fs,
    path::{Path, PathBuf},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    goals::GoalGenerator,
    profile::{Profile, ProfileBook},
    system::{RuleBasedBookingBot, ScriptedSystem, SystemAgent},
    types::{GoalType, UserGoal},
    SimulationError,
};

/// Settings of one batch of simulated conversations, loaded from YAML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SimulationConfig {
    /// Number of conversations to simulate when goals are generated.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Turn ceiling of a conversation; zero disables it.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Seed for goal generation and user decisions. Omit for a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_intent")]
    pub intent: String,
    /// Inline user profile. Takes precedence over `profile_name`.
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Entry of the `profiles` file to simulate.
    #[serde(default)]
    pub profile_name: Option<String>,
    /// Named profiles file, relative to the config file.
    #[serde(default)]
    pub profiles: Option<PathBuf>,
    /// Fixed user goals. When empty, `runs` goals are generated.
    #[serde(default)]
    pub goals: Vec<UserGoal>,
    /// Slot values for generated goals. When empty, the movie booking slots are used.
    #[serde(default)]
    pub slots: Vec<SlotValues>,
    /// Goal types drawn for generated goals. When empty, all types are used.
    #[serde(default)]
    pub goal_types: Vec<GoalType>,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlotValues {
    pub slot: String,
    pub values: Vec<String>,
}

/// Dialogue system the simulated user talks to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemConfig {
    #[default]
    RuleBased,
    /// Replays system turns from a YAML or JSON file, relative to the config file.
    Scripted { path: PathBuf },
}

fn default_runs() -> usize {
    100
}

fn default_max_turns() -> usize {
    15
}

fn default_domain() -> String {
    "movie".to_string()
}

fn default_intent() -> String {
    "booking".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            max_turns: default_max_turns(),
            seed: None,
            domain: default_domain(),
            intent: default_intent(),
            profile: None,
            profile_name: None,
            profiles: None,
            goals: Vec::new(),
            slots: Vec::new(),
            goal_types: Vec::new(),
            system: SystemConfig::default(),
            base_dir: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self, SimulationError> {
        let config: SimulationConfig = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(input: &str) -> Result<Self, SimulationError> {
        let config: SimulationConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.json` file as JSON and anything else as YAML. Relative paths inside the
    /// file resolve against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let mut config = if ext == "json" {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.max_turns == 1 {
            return Err(SimulationError::InvalidConfig(
                "max_turns must be zero or at least 2".to_string(),
            ));
        }
        if self.goals.is_empty() && self.runs == 0 {
            return Err(SimulationError::InvalidConfig(
                "runs must be positive when no goals are given".to_string(),
            ));
        }
        if let Some(slot) = self.slots.iter().find(|slot| slot.values.is_empty()) {
            return Err(SimulationError::InvalidConfig(format!(
                "slot `{}` has no values",
                slot.slot
            )));
        }
        if self.profile_name.is_some() && self.profiles.is_none() {
            return Err(SimulationError::InvalidConfig(
                "profile_name requires a profiles file".to_string(),
            ));
        }
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// The inline profile, else the named entry of the profiles file, else the default.
    pub fn resolve_profile(&self) -> Result<Profile, SimulationError> {
        if let Some(profile) = &self.profile {
            return Ok(profile.clone());
        }
        match (&self.profile_name, &self.profiles) {
            (Some(name), Some(path)) => {
                let book = ProfileBook::from_path(self.resolve(path))?;
                Ok(book.get(name)?.clone())
            }
            _ => Ok(Profile::default()),
        }
    }

    pub fn goal_generator(&self) -> GoalGenerator {
        let generator = if self.slots.is_empty() {
            GoalGenerator::movie_booking().with_context(self.domain.clone(), self.intent.clone())
        } else {
            self.slots.iter().fold(
                GoalGenerator::new(self.domain.clone(), self.intent.clone()),
                |generator, slot| generator.with_slot(slot.slot.clone(), slot.values.iter().cloned()),
            )
        };
        generator.with_goal_types(self.goal_types.clone())
    }

    pub fn build_system(&self) -> Result<Box<dyn SystemAgent>, SimulationError> {
        let system: Box<dyn SystemAgent> = match &self.system {
            SystemConfig::RuleBased => {
                let mut bot = RuleBasedBookingBot::new().with_context(self.intent.clone(), self.domain.clone());
                if !self.slots.is_empty() {
                    bot = bot.with_slots(self.slots.iter().map(|slot| slot.slot.clone()));
                    for slot in &self.slots {
                        if let Some(value) = slot.values.first() {
                            bot = bot.with_default(slot.slot.clone(), value.clone());
                        }
                    }
                }
                Box::new(bot)
            }
            SystemConfig::Scripted { path } => Box::new(
                ScriptedSystem::from_path(self.resolve(path))?
                    .with_context(self.intent.clone(), self.domain.clone()),
            ),
        };
        Ok(system)
    }
}
