use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::SimulationError;

/// Dialogue act kinds exchanged between the simulated user and the system.
///
/// The priority breaks ties when several pending intentions are merged into the
/// agenda; a higher value is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogAct {
    Greeting,
    Inform,
    Affirm,
    Negate,
    NotifySuccess,
    NotifyFailure,
    #[serde(alias = "GOOD_BYE")]
    Goodbye,
    ThankYou,
    Request,
    Confirm,
    #[serde(alias = "REQUEST_OPTIONS")]
    RequestAlts,
    Offer,
    Select,
    CantUnderstand,
    Other,
}

impl DialogAct {
    pub const ALL: [DialogAct; 15] = [
        DialogAct::Greeting,
        DialogAct::Inform,
        DialogAct::Affirm,
        DialogAct::Negate,
        DialogAct::NotifySuccess,
        DialogAct::NotifyFailure,
        DialogAct::Goodbye,
        DialogAct::ThankYou,
        DialogAct::Request,
        DialogAct::Confirm,
        DialogAct::RequestAlts,
        DialogAct::Offer,
        DialogAct::Select,
        DialogAct::CantUnderstand,
        DialogAct::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DialogAct::Greeting => "GREETING",
            DialogAct::Inform => "INFORM",
            DialogAct::Affirm => "AFFIRM",
            DialogAct::Negate => "NEGATE",
            DialogAct::NotifySuccess => "NOTIFY_SUCCESS",
            DialogAct::NotifyFailure => "NOTIFY_FAILURE",
            DialogAct::Goodbye => "GOODBYE",
            DialogAct::ThankYou => "THANK_YOU",
            DialogAct::Request => "REQUEST",
            DialogAct::Confirm => "CONFIRM",
            DialogAct::RequestAlts => "REQUEST_ALTS",
            DialogAct::Offer => "OFFER",
            DialogAct::Select => "SELECT",
            DialogAct::CantUnderstand => "CANT_UNDERSTAND",
            DialogAct::Other => "OTHER",
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            DialogAct::Greeting => 4,
            DialogAct::Inform => 3,
            DialogAct::Affirm
            | DialogAct::Negate
            | DialogAct::NotifySuccess
            | DialogAct::NotifyFailure
            | DialogAct::Goodbye
            | DialogAct::CantUnderstand
            | DialogAct::Other => 2,
            DialogAct::ThankYou
            | DialogAct::Request
            | DialogAct::Confirm
            | DialogAct::RequestAlts
            | DialogAct::Offer
            | DialogAct::Select => 1,
        }
    }

    /// Parses a label coming from an NLU layer, falling back to [`DialogAct::Other`]
    /// for labels outside the registry.
    pub fn parse_lossy(label: &str) -> Self {
        label.parse().unwrap_or(DialogAct::Other)
    }
}

impl fmt::Display for DialogAct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialogAct {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let act = match normalized.as_str() {
            "GOOD_BYE" => DialogAct::Goodbye,
            "REQUEST_OPTIONS" => DialogAct::RequestAlts,
            other => DialogAct::ALL
                .into_iter()
                .find(|act| act.name() == other)
                .ok_or_else(|| SimulationError::UnknownDialogAct(value.to_string()))?,
        };
        Ok(act)
    }
}
