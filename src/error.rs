use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgendaError {
    #[error("annotation not found in agenda: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile value for `{key}` must be within [0, 1], got {value}")]
    OutOfRange { key: String, value: f64 },

    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("failed to parse profile YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Agenda(#[from] AgendaError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("unknown dialogue act: {0}")]
    UnknownDialogAct(String),

    #[error("no user goals available for simulation")]
    NoGoals,

    #[error("agenda user used before initialize")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
