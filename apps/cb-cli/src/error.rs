//! Error type for the command-line driver.

use cb_scenario::ScenarioError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Scenario(#[from] ScenarioError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
