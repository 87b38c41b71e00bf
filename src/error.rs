use std::path::PathBuf;

/// Errors raised while running the actor-critic loop against a simulated world.
#[derive(Debug, thiserror::Error)]
pub enum RlError {
    #[error("illegal action {action} in state {state}")]
    IllegalAction { action: String, state: String },

    #[error("no legal actions available in state {0}")]
    NoLegalActions(String),

    #[error("environment is not ready to receive actions")]
    EnvNotReady,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to plot: {0}")]
    Plot(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_action_display() {
        let err = RlError::IllegalAction {
            action: "HanoiMove { from: 1, to: 2 }".to_string(),
            state: "[0, 0]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "illegal action HanoiMove { from: 1, to: 2 } in state [0, 0]"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::Validation("trainer.lrate must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: trainer.lrate must be > 0"
        );
    }
}
