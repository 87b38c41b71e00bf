pub mod action_selection;
pub mod actor;
pub mod config;
pub mod critic;
pub mod env;
pub mod error;
pub mod network;
pub mod trainer;
pub mod utils;

pub use actor::Actor;
pub use config::{AppConfig, ProblemConfig};
pub use critic::{Critic, CriticConfig};
pub use error::{ConfigError, RlError};
pub use trainer::{TrainResults, Trainer, TrainerConfig};
