use std::io;

/// Configuration problems detected at startup. All of them are fatal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "mismatched targets: every <TARGET>_BRANCH_NAME needs a matching <TARGET>_SCRIPT_PATH \
         and vice versa (branch only: {branch_only:?}, path only: {path_only:?})"
    )]
    MismatchedTargets {
        branch_only: Vec<String>,
        path_only: Vec<String>,
    },

    #[error("empty value for '{key}'")]
    EmptyValue { key: String },

    #[error("branch '{branch}' is claimed by both '{first}' and '{second}'")]
    DuplicateBranch {
        branch: String,
        first: String,
        second: String,
    },

    #[error("invalid {key} value '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// Custom error type for push_deploy operations
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Helper type for Results that use DeployError
pub type Result<T> = std::result::Result<T, DeployError>;
