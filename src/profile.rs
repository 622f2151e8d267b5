use std::{collections::BTreeMap, fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Behavioural probabilities of a simulated user, each within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Profile {
    /// Chance of greeting the system and of saying goodbye before leaving.
    pub polite: f64,
    /// Share of the agenda expressed in a single turn.
    pub verbose: f64,
    /// Chance of informing a don't-care slot up front instead of asking about it.
    pub inform: f64,
    /// Chance of each goal slot after the first being put on the initial agenda.
    pub agenda_size: f64,
    /// Chance of asking for options when the system requests a don't-care slot.
    pub requests_for_options: f64,
    /// Additional named probabilities carried along for other policies.
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl Profile {
    pub fn new(polite: f64, verbose: f64, inform: f64, agenda_size: f64, requests_for_options: f64) -> Self {
        Self {
            polite,
            verbose,
            inform,
            agenda_size,
            requests_for_options,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: f64) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "polite" => Some(self.polite),
            "verbose" => Some(self.verbose),
            "inform" => Some(self.inform),
            "agenda_size" => Some(self.agenda_size),
            "requests_for_options" => Some(self.requests_for_options),
            other => self.extra.get(other).copied(),
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let named = [
            ("polite", self.polite),
            ("verbose", self.verbose),
            ("inform", self.inform),
            ("agenda_size", self.agenda_size),
            ("requests_for_options", self.requests_for_options),
        ];
        let extra = self.extra.iter().map(|(key, value)| (key.as_str(), *value));

        for (key, value) in named.into_iter().chain(extra) {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::OutOfRange {
                    key: key.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ProfileError> {
        let profile: Profile = serde_yaml::from_str(input)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5)
    }
}

/// Named profiles, as kept in a user profile file keyed by user name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProfileBook {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileBook {
    pub fn from_yaml_str(input: &str) -> Result<Self, ProfileError> {
        let book: ProfileBook = serde_yaml::from_str(input)?;
        for profile in book.profiles.values() {
            profile.validate()?;
        }
        Ok(book)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    pub fn get(&self, name: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProfileError::UnknownProfile(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_with_extra_keys() {
        let profile = Profile::from_yaml_str(
            "polite: 0.8\nverbose: 0.3\ninform: 0.6\nagenda_size: 0.7\nrequests_for_options: 0.2\npatience: 0.4\n",
        )
        .unwrap();

        assert_eq!(profile.polite, 0.8);
        assert_eq!(profile.get("patience"), Some(0.4));
        assert_eq!(profile.get("missing"), None);
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let error = Profile::from_yaml_str(
            "polite: 1.5\nverbose: 0.3\ninform: 0.6\nagenda_size: 0.7\nrequests_for_options: 0.2\n",
        )
        .unwrap_err();
        assert!(matches!(error, ProfileError::OutOfRange { ref key, .. } if key == "polite"));

        let extra = Profile::default().with_extra("patience", -0.1);
        assert!(extra.validate().is_err());
    }

    #[test]
    fn rejects_missing_required_key() {
        let error = Profile::from_yaml_str("polite: 0.5\nverbose: 0.5\n").unwrap_err();
        assert!(matches!(error, ProfileError::Parse(_)));
    }

    #[test]
    fn profile_book_looks_up_by_name() {
        let book = ProfileBook::from_yaml_str(
            "alice:\n  polite: 1.0\n  verbose: 0.5\n  inform: 0.5\n  agenda_size: 0.5\n  requests_for_options: 0.0\n",
        )
        .unwrap();

        assert_eq!(book.get("alice").unwrap().polite, 1.0);
        assert!(matches!(book.get("bob"), Err(ProfileError::UnknownProfile(_))));
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["alice"]);
    }
}
