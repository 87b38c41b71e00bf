use kdam::{tqdm, BarExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action_selection::{EpsilonGreedy, EpsilonUpdateStrategy};
use crate::actor::Actor;
use crate::critic::{Critic, CriticConfig};
use crate::env::Env;
use crate::error::RlError;
use crate::utils::SharedRng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub episodes: usize,
    /// Steps after which the trainer gives up on an episode.
    pub max_steps: usize,
    pub epsilon: f64,
    pub lrate: f64,
    pub trace_decay: f64,
    pub drate: f64,
    pub checkpoints: usize,
    pub epsilon_decay: EpsilonUpdateStrategy,
    pub anneal_with_approximator: bool,
    pub demonstration_episodes: usize,
    pub seed: Option<u64>,
    pub show_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            max_steps: 300,
            epsilon: 0.5,
            lrate: 0.1,
            trace_decay: 0.5,
            drate: 0.9,
            checkpoints: 10,
            epsilon_decay: EpsilonUpdateStrategy::default(),
            anneal_with_approximator: false,
            demonstration_episodes: 1,
            seed: None,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub length: usize,
    pub reward: f64,
    pub mean_td_error: f64,
    pub loss: f64,
    /// Approximator fits made during the episode.
    pub fits: usize,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointSummary {
    pub checkpoint: usize,
    pub episodes: usize,
    pub mean_length: f64,
    pub successes: usize,
    /// Epsilon used during the block, before annealing.
    pub epsilon: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainResults {
    pub episode_lengths: Vec<usize>,
    pub rewards: Vec<f64>,
    pub td_errors: Vec<f64>,
    pub losses: Vec<f64>,
    pub successes: Vec<bool>,
    pub checkpoints: Vec<CheckpointSummary>,
    pub demonstration_lengths: Vec<usize>,
}

/// Couples an actor and a critic through one simulated world.
pub struct Trainer<E: Env> {
    env: E,
    actor: Actor<E::State, E::Action>,
    critic: Critic<E::State>,
    exploration: EpsilonGreedy,
    config: TrainerConfig,
    last_batch: (Vec<E::State>, Vec<f64>),
}

impl<E: Env> Trainer<E> {
    pub fn new(
        env: E,
        config: &TrainerConfig,
        critic_config: &CriticConfig,
        rng: SharedRng,
    ) -> Self {
        let actor = Actor::new(config.lrate, config.drate, config.trace_decay, rng.clone());
        let critic = Critic::from_config(
            critic_config,
            env.state_size(),
            config.lrate,
            config.drate,
            config.trace_decay,
            rng.clone(),
        );
        let exploration = EpsilonGreedy::new(config.epsilon, config.epsilon_decay, rng);
        Self {
            env,
            actor,
            critic,
            exploration,
            config: config.clone(),
            last_batch: (vec![], vec![]),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.get_epsilon()
    }

    pub fn actor(&self) -> &Actor<E::State, E::Action> {
        &self.actor
    }

    pub fn critic(&self) -> &Critic<E::State> {
        &self.critic
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// States and targets of the last approximator fit.
    pub fn last_batch(&self) -> (&[E::State], &[f64]) {
        (&self.last_batch.0, &self.last_batch.1)
    }

    fn choose_action(&self, state: &E::State) -> Result<E::Action, RlError> {
        let greedy = self.exploration.should_exploit();
        let legal_actions = self.env.get_legal_actions(state);
        self.actor.propose_action(greedy, state, &legal_actions)
    }

    /// Runs one episode; with `learn` unset the actor and critic are only read.
    pub fn run_episode(&mut self, learn: bool) -> Result<EpisodeReport, RlError> {
        let mut state = self.env.produce_initial_state();
        self.actor.initiate_eligibility();
        self.critic.initiate_eligibility();
        let table = self.critic.is_table();

        let mut action = self.choose_action(&state)?;
        let mut history: Vec<(E::State, E::Action)> = vec![];
        let mut states: Vec<E::State> = vec![];
        let mut targets: Vec<f64> = vec![];
        let mut length: usize = 0;
        let mut total_reward: f64 = 0.0;
        let mut td_error_sum: f64 = 0.0;
        let mut loss: f64 = 0.0;
        let mut fits: usize = 0;

        loop {
            let reward = self.env.update(&action)?;
            length += 1;
            total_reward += reward;
            let new_state = self.env.get_current_state();
            history.push((state.clone(), action.clone()));

            let terminal = self.env.is_current_state_terminal() || length >= self.config.max_steps;
            let proposed_action = if terminal {
                None
            } else {
                Some(self.choose_action(&new_state)?)
            };

            if learn {
                let (td_error, target) = self.critic.get_td_error(reward, &state, &new_state);
                td_error_sum += td_error.abs();
                self.actor
                    .set_state_action_eligibility((state.clone(), action.clone()), 1.0);
                if table {
                    self.critic.set_state_eligibility(state.clone(), 1.0);
                } else {
                    states.push(state.clone());
                    targets.push(target);
                }
                for pair in &history {
                    if table {
                        self.critic.update_state_value(&pair.0, td_error);
                        self.critic.update_state_eligibility(&pair.0);
                    }
                    self.actor.update_state_action_value(pair, td_error);
                    self.actor.update_state_action_eligibility(pair);
                }
                if !table && terminal {
                    if self.env.is_current_state_final_state() {
                        states.push(new_state.clone());
                        targets.push(0.0);
                    }
                    loss = self.critic.update_state_values(&states, &targets)?;
                    fits += 1;
                    self.last_batch = (std::mem::take(&mut states), std::mem::take(&mut targets));
                }
            }

            match proposed_action {
                Some(next) => {
                    state = new_state;
                    action = next;
                }
                None => break,
            }
        }

        let success = self.env.is_current_state_final_state();
        self.env.store_game_length();
        Ok(EpisodeReport {
            length,
            reward: total_reward,
            mean_td_error: td_error_sum / length as f64,
            loss,
            fits,
            success,
        })
    }

    /// Plays one episode without learning and returns every rendered frame.
    pub fn example(&mut self) -> Result<Vec<String>, RlError> {
        let mut state = self.env.produce_initial_state();
        let mut frames = vec![self.env.render()];
        let mut steps: usize = 0;
        loop {
            let action = self.choose_action(&state)?;
            let reward = self.env.update(&action)?;
            steps += 1;
            frames.push(format!("{:?} -> reward {}\n{}", action, reward, self.env.render()));
            if self.env.is_current_state_terminal() || steps >= self.config.max_steps {
                return Ok(frames);
            }
            state = self.env.get_current_state();
        }
    }

    fn anneals(&self) -> bool {
        self.critic.is_table() || self.config.anneal_with_approximator
    }

    pub fn train(&mut self) -> Result<TrainResults, RlError> {
        let episodes = self.config.episodes;
        let checkpoints = self.config.checkpoints.clamp(1, episodes.max(1));
        let block = (episodes + checkpoints - 1) / checkpoints;
        let mut results = TrainResults::default();

        info!(
            episodes,
            checkpoints,
            table_critic = self.critic.is_table(),
            epsilon = self.epsilon(),
            "training started"
        );

        let mut pb = tqdm!(total = episodes, disable = !self.config.show_progress);
        pb.set_description(format!("CHECKPOINT {}", 1));
        if self.config.show_progress {
            pb.refresh()?;
        }

        let mut block_start: usize = 0;
        for episode in 0..episodes {
            let report = self.run_episode(true)?;
            debug!(
                episode,
                length = report.length,
                reward = report.reward,
                td_error = report.mean_td_error,
                loss = report.loss,
                fits = report.fits,
                success = report.success,
                "episode finished"
            );
            results.episode_lengths.push(report.length);
            results.rewards.push(report.reward);
            results.td_errors.push(report.mean_td_error);
            results.losses.push(report.loss);
            results.successes.push(report.success);
            pb.update(1)?;

            let end_of_block = (episode + 1) % block == 0 || episode + 1 == episodes;
            if !end_of_block {
                continue;
            }
            let lengths = &results.episode_lengths[block_start..];
            let summary = CheckpointSummary {
                checkpoint: results.checkpoints.len() + 1,
                episodes: lengths.len(),
                mean_length: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
                successes: results.successes[block_start..].iter().filter(|s| **s).count(),
                epsilon: self.epsilon(),
            };
            info!(
                checkpoint = summary.checkpoint,
                mean_length = summary.mean_length,
                successes = summary.successes,
                epsilon = summary.epsilon,
                "checkpoint reached"
            );
            pb.set_postfix(format!(
                "mean length={:.1}, epsilon={:.3}",
                summary.mean_length, summary.epsilon
            ));
            pb.set_description(format!("CHECKPOINT {}", summary.checkpoint + 1));
            results.checkpoints.push(summary);
            if self.anneals() {
                self.exploration.update();
            }
            block_start = episode + 1;
        }

        self.exploration.force(0.0);
        for _ in 0..self.config.demonstration_episodes {
            let report = self.run_episode(false)?;
            info!(
                length = report.length,
                reward = report.reward,
                success = report.success,
                "demonstration finished"
            );
            results.demonstration_lengths.push(report.length);
        }
        Ok(results)
    }
}
