use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action_selection::EpsilonUpdateStrategy;
use crate::critic::CriticConfig;
use crate::env::{GamblerConfig, HanoiConfig, PoleBalancingConfig};
use crate::error::ConfigError;
use crate::trainer::TrainerConfig;

/// The simulated world to train on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProblemConfig {
    Cartpole(PoleBalancingConfig),
    Hanoi(HanoiConfig),
    Gambler(GamblerConfig),
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig::Cartpole(PoleBalancingConfig::default())
    }
}

impl ProblemConfig {
    pub fn name(&self) -> &'static str {
        match self {
            ProblemConfig::Cartpole(_) => "cartpole",
            ProblemConfig::Hanoi(_) => "hanoi",
            ProblemConfig::Gambler(_) => "gambler",
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub problem: ProblemConfig,
    pub trainer: TrainerConfig,
    pub critic: CriticConfig,
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.into())
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Falls back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.trainer;
        if t.episodes == 0 {
            return Err(invalid("trainer.episodes must be > 0"));
        }
        if t.max_steps == 0 {
            return Err(invalid("trainer.max_steps must be > 0"));
        }
        if t.checkpoints == 0 || t.checkpoints > t.episodes {
            return Err(invalid("trainer.checkpoints must be in [1, trainer.episodes]"));
        }
        if !unit_interval(t.epsilon) {
            return Err(invalid("trainer.epsilon must be in [0, 1]"));
        }
        if t.lrate <= 0.0 || t.lrate > 1.0 {
            return Err(invalid("trainer.lrate must be in (0, 1]"));
        }
        if !unit_interval(t.drate) {
            return Err(invalid("trainer.drate must be in [0, 1]"));
        }
        if !unit_interval(t.trace_decay) {
            return Err(invalid("trainer.trace_decay must be in [0, 1]"));
        }
        match t.epsilon_decay {
            EpsilonUpdateStrategy::Multiplicative {
                factor,
                final_epsilon,
            } => {
                if !unit_interval(factor) {
                    return Err(invalid("trainer.epsilon_decay.factor must be in [0, 1]"));
                }
                if !unit_interval(final_epsilon) {
                    return Err(invalid("trainer.epsilon_decay.final_epsilon must be in [0, 1]"));
                }
            }
            EpsilonUpdateStrategy::Additive {
                step,
                final_epsilon,
            } => {
                if step < 0.0 {
                    return Err(invalid("trainer.epsilon_decay.step must be >= 0"));
                }
                if !unit_interval(final_epsilon) {
                    return Err(invalid("trainer.epsilon_decay.final_epsilon must be in [0, 1]"));
                }
            }
            EpsilonUpdateStrategy::None => {}
        }

        let c = &self.critic;
        if !c.table_critic {
            if c.layers.last() != Some(&1) || c.layers.contains(&0) {
                return Err(invalid(
                    "critic.layers must be positive widths ending with 1",
                ));
            }
            if c.nn_lrate <= 0.0 {
                return Err(invalid("critic.nn_lrate must be > 0"));
            }
            if c.fit_iterations == 0 {
                return Err(invalid("critic.fit_iterations must be > 0"));
            }
        }

        match &self.problem {
            ProblemConfig::Cartpole(p) => {
                if p.pole_length <= 0.0 || p.pole_mass <= 0.0 || p.cart_mass <= 0.0 {
                    return Err(invalid("problem pole length and masses must be > 0"));
                }
                if p.tau <= 0.0 {
                    return Err(invalid("problem.tau must be > 0"));
                }
                if p.max_angle <= 0.0 || p.max_x_pos <= 0.0 {
                    return Err(invalid("problem bounds must be > 0"));
                }
                if p.steps == 0 {
                    return Err(invalid("problem.steps must be > 0"));
                }
            }
            ProblemConfig::Hanoi(p) => {
                if p.num_pegs < 3 {
                    return Err(invalid("problem.num_pegs must be >= 3"));
                }
                if p.num_discs == 0 {
                    return Err(invalid("problem.num_discs must be > 0"));
                }
                if p.max_steps == 0 {
                    return Err(invalid("problem.max_steps must be > 0"));
                }
            }
            ProblemConfig::Gambler(p) => {
                if !unit_interval(p.win_prob) {
                    return Err(invalid("problem.win_prob must be in [0, 1]"));
                }
                if p.max_coins < 2 {
                    return Err(invalid("problem.max_coins must be >= 2"));
                }
                if let Some(coins) = p.initial_coins {
                    if coins == 0 || coins >= p.max_coins {
                        return Err(invalid(
                            "problem.initial_coins must be in [1, problem.max_coins)",
                        ));
                    }
                }
                if p.max_steps == 0 {
                    return Err(invalid("problem.max_steps must be > 0"));
                }
            }
        }
        Ok(())
    }
}
