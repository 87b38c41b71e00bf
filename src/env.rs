pub mod gambler;
pub mod hanoi;
pub mod pole_balancing;

use std::fmt::Debug;
use std::hash::Hash;

use ndarray::Array1;

use crate::error::RlError;

pub use gambler::{GamblerConfig, GamblerEnv, GamblerState};
pub use hanoi::{HanoiConfig, HanoiEnv, HanoiMove, HanoiState};
pub use pole_balancing::{PoleBalancingConfig, PoleBalancingEnv, PoleBalancingState};

/// A state as seen by the learners: hashable for the tables, flattenable for the network.
pub trait Observation: Clone + Eq + Hash + Debug {
    fn features(&self) -> Array1<f64>;
}

pub trait Env {
    type State: Observation;
    type Action: Clone + Eq + Hash + Debug;

    fn produce_initial_state(&mut self) -> Self::State;
    fn get_current_state(&self) -> Self::State;
    fn update(&mut self, action: &Self::Action) -> Result<f64, RlError>;
    fn get_legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;
    fn is_current_state_final_state(&self) -> bool;
    fn is_current_state_failed_state(&self) -> bool;

    /// Length of the feature vector of every state of this world.
    fn state_size(&self) -> usize;
    fn store_game_length(&mut self);
    fn historic_game_lengths(&self) -> &[usize];
    fn render(&self) -> String;

    fn is_current_state_terminal(&self) -> bool {
        self.is_current_state_final_state() || self.is_current_state_failed_state()
    }
}

pub(crate) fn one_hot(position: usize, size: usize) -> Array1<f64> {
    let mut vector = Array1::zeros(size);
    if position < size {
        vector[position] = 1.0;
    }
    vector
}

pub(crate) fn illegal_action<A: Debug, S: Debug>(action: &A, state: &S) -> RlError {
    RlError::IllegalAction {
        action: format!("{:?}", action),
        state: format!("{:?}", state),
    }
}
