use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{illegal_action, one_hot, Env, Observation};
use crate::error::RlError;
use crate::utils::SharedRng;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamblerConfig {
    pub win_prob: f64,
    pub max_coins: u32,
    pub max_steps: usize,
    /// Fixed starting purse; drawn uniformly from 1..max_coins when absent.
    pub initial_coins: Option<u32>,
}

impl Default for GamblerConfig {
    fn default() -> Self {
        Self {
            win_prob: 0.4,
            max_coins: 100,
            max_steps: 300,
            initial_coins: None,
        }
    }
}

#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct GamblerState {
    pub coins: u32,
    pub max_coins: u32,
}

impl Observation for GamblerState {
    fn features(&self) -> Array1<f64> {
        one_hot(self.coins as usize, self.max_coins as usize + 1)
    }
}

#[derive(Debug, Clone)]
pub struct GamblerEnv {
    config: GamblerConfig,
    coins: u32,
    current_step: usize,
    failed: bool,
    history: Vec<u32>,
    historic_game_length: Vec<usize>,
    rng: SharedRng,
}

impl GamblerEnv {
    pub const MIN_BET: u32 = 1;

    pub fn new(config: GamblerConfig, rng: SharedRng) -> Self {
        let mut env = Self {
            config,
            coins: 0,
            current_step: 0,
            failed: false,
            history: vec![],
            historic_game_length: vec![],
            rng,
        };
        env.produce_initial_state();
        env
    }

    fn max_bet(&self, coins: u32) -> u32 {
        coins.min(self.config.max_coins.saturating_sub(coins))
    }

    /// Purse after every bet of the current game.
    pub fn history(&self) -> &[u32] {
        &self.history
    }
}

impl Env for GamblerEnv {
    type State = GamblerState;
    type Action = u32;

    fn produce_initial_state(&mut self) -> GamblerState {
        self.current_step = 0;
        self.failed = false;
        self.coins = match self.config.initial_coins {
            Some(coins) => coins,
            None => self.rng.borrow_mut().gen_range(1..self.config.max_coins),
        };
        self.history = vec![self.coins];
        self.get_current_state()
    }

    fn get_current_state(&self) -> GamblerState {
        GamblerState {
            coins: self.coins,
            max_coins: self.config.max_coins,
        }
    }

    fn update(&mut self, action: &u32) -> Result<f64, RlError> {
        if self.is_current_state_terminal() {
            return Err(RlError::EnvNotReady);
        }
        let bet: u32 = *action;
        if bet < Self::MIN_BET || bet > self.max_bet(self.coins) {
            return Err(illegal_action(action, &self.get_current_state()));
        }
        self.current_step += 1;

        let old_coins: u32 = self.coins;
        let won: bool = self.rng.borrow_mut().gen::<f64>() < self.config.win_prob;
        self.coins = if won { old_coins + bet } else { old_coins - bet };
        self.history.push(self.coins);

        if self.current_step >= self.config.max_steps || self.coins == 0 {
            self.failed = true;
        }
        Ok(self.coins as f64 - old_coins as f64)
    }

    fn get_legal_actions(&self, state: &GamblerState) -> Vec<u32> {
        (Self::MIN_BET..=self.max_bet(state.coins)).collect()
    }

    fn is_current_state_final_state(&self) -> bool {
        self.coins == self.config.max_coins
    }

    fn is_current_state_failed_state(&self) -> bool {
        self.failed
    }

    fn state_size(&self) -> usize {
        self.config.max_coins as usize + 1
    }

    fn store_game_length(&mut self) {
        self.historic_game_length.push(self.current_step);
    }

    fn historic_game_lengths(&self) -> &[usize] {
        &self.historic_game_length
    }

    fn render(&self) -> String {
        format!("coins: {}/{}", self.coins, self.config.max_coins)
    }
}
