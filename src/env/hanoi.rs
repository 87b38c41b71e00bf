use indexmap::IndexSet;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{illegal_action, one_hot, Env, Observation};
use crate::error::RlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HanoiConfig {
    pub num_pegs: usize,
    pub num_discs: usize,
    pub max_steps: usize,
}

impl Default for HanoiConfig {
    fn default() -> Self {
        Self {
            num_pegs: 3,
            num_discs: 3,
            max_steps: 300,
        }
    }
}

#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HanoiMove {
    pub from: usize,
    pub to: usize,
}

impl HanoiMove {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// Peg of every disc; disc 0 is the largest, the last disc the smallest.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct HanoiState {
    pub pegs: Vec<usize>,
    pub num_pegs: usize,
}

impl HanoiState {
    pub fn new(num_pegs: usize, num_discs: usize) -> Self {
        Self {
            pegs: vec![0; num_discs],
            num_pegs,
        }
    }

    pub fn top_disc(&self, peg: usize) -> Option<usize> {
        (0..self.pegs.len()).rev().find(|disc| self.pegs[*disc] == peg)
    }

    /// The source peg holds a disc and the target's top disc, if any, is bigger.
    pub fn allows(&self, mv: &HanoiMove) -> bool {
        if mv.from == mv.to {
            return false;
        }
        for disc in (0..self.pegs.len()).rev() {
            if self.pegs[disc] == mv.to {
                return false;
            }
            if self.pegs[disc] == mv.from {
                return true;
            }
        }
        false
    }

    fn apply(&mut self, mv: &HanoiMove) {
        if let Some(disc) = self.top_disc(mv.from) {
            self.pegs[disc] = mv.to;
        }
    }

    pub fn render(&self) -> String {
        let mut result = String::new();
        for peg in 0..self.num_pegs {
            let discs: Vec<String> = (0..self.pegs.len())
                .filter(|disc| self.pegs[*disc] == peg)
                .map(|disc| (self.pegs.len() - disc).to_string())
                .collect();
            result.push_str(&format!("peg {}: {}\n", peg, discs.join(" ")));
        }
        result
    }
}

impl Observation for HanoiState {
    fn features(&self) -> Array1<f64> {
        let mut features = Array1::zeros(self.pegs.len() * self.num_pegs);
        for (disc, peg) in self.pegs.iter().enumerate() {
            let start = disc * self.num_pegs;
            features
                .slice_mut(ndarray::s![start..start + self.num_pegs])
                .assign(&one_hot(*peg, self.num_pegs));
        }
        features
    }
}

#[derive(Debug, Clone)]
pub struct HanoiEnv {
    config: HanoiConfig,
    moves: IndexSet<HanoiMove>,
    state: HanoiState,
    current_step: usize,
    failed: bool,
    history: Vec<HanoiState>,
    best_history: Vec<HanoiState>,
    historic_game_length: Vec<usize>,
}

impl HanoiEnv {
    pub fn new(config: HanoiConfig) -> Self {
        let mut moves: IndexSet<HanoiMove> = IndexSet::new();
        for from in 0..config.num_pegs {
            for to in 0..config.num_pegs {
                if from != to {
                    moves.insert(HanoiMove::new(from, to));
                }
            }
        }
        let mut env = Self {
            config,
            moves,
            state: HanoiState::new(config.num_pegs, config.num_discs),
            current_step: 0,
            failed: false,
            history: vec![],
            best_history: vec![],
            historic_game_length: vec![],
        };
        env.produce_initial_state();
        env
    }

    /// Every move between two distinct pegs, legal or not.
    pub fn moves(&self) -> &IndexSet<HanoiMove> {
        &self.moves
    }

    /// States of the shortest game stored so far.
    pub fn best_history(&self) -> &[HanoiState] {
        &self.best_history
    }
}

impl Env for HanoiEnv {
    type State = HanoiState;
    type Action = HanoiMove;

    fn produce_initial_state(&mut self) -> HanoiState {
        self.current_step = 0;
        self.failed = false;
        self.state = HanoiState::new(self.config.num_pegs, self.config.num_discs);
        self.history = vec![self.state.clone()];
        self.get_current_state()
    }

    fn get_current_state(&self) -> HanoiState {
        self.state.clone()
    }

    fn update(&mut self, action: &HanoiMove) -> Result<f64, RlError> {
        if self.is_current_state_terminal() {
            return Err(RlError::EnvNotReady);
        }
        if !self.moves.contains(action) || !self.state.allows(action) {
            return Err(illegal_action(action, &self.state));
        }
        self.current_step += 1;
        self.state.apply(action);
        self.history.push(self.state.clone());

        if self.current_step >= self.config.max_steps {
            self.failed = true;
        }
        Ok(-1.0)
    }

    fn get_legal_actions(&self, state: &HanoiState) -> Vec<HanoiMove> {
        self.moves
            .iter()
            .filter(|mv| state.allows(mv))
            .copied()
            .collect()
    }

    fn is_current_state_final_state(&self) -> bool {
        self.state
            .pegs
            .iter()
            .all(|peg| *peg == self.config.num_pegs - 1)
    }

    fn is_current_state_failed_state(&self) -> bool {
        self.failed
    }

    fn state_size(&self) -> usize {
        self.config.num_pegs * self.config.num_discs
    }

    fn store_game_length(&mut self) {
        let is_best = match self.historic_game_length.iter().min() {
            Some(best) => self.current_step < *best,
            None => true,
        };
        if is_best {
            self.best_history = self.history.clone();
        }
        self.historic_game_length.push(self.current_step);
    }

    fn historic_game_lengths(&self) -> &[usize] {
        &self.historic_game_length
    }

    fn render(&self) -> String {
        self.state.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_env() -> HanoiEnv {
        HanoiEnv::new(HanoiConfig {
            num_pegs: 3,
            num_discs: 2,
            max_steps: 300,
        })
    }

    #[test]
    fn catalogue_has_every_ordered_pair_of_distinct_pegs() {
        let env = small_env();
        assert_eq!(env.moves().len(), 6);
        assert_eq!(env.moves().get_index(0), Some(&HanoiMove::new(0, 1)));
    }

    #[test]
    fn larger_disc_cannot_go_on_smaller() {
        let mut env = small_env();
        env.update(&HanoiMove::new(0, 1)).unwrap();
        let state = env.get_current_state();
        assert!(!state.allows(&HanoiMove::new(0, 1)));
        assert!(state.allows(&HanoiMove::new(0, 2)));
        assert!(state.allows(&HanoiMove::new(1, 0)));
        assert!(matches!(
            env.update(&HanoiMove::new(0, 1)),
            Err(RlError::IllegalAction { .. })
        ));
    }

    #[test]
    fn moves_to_missing_pegs_are_illegal() {
        let mut env = small_env();
        assert!(matches!(
            env.update(&HanoiMove::new(0, 3)),
            Err(RlError::IllegalAction { .. })
        ));
    }

    #[test]
    fn optimal_two_disc_game_is_final_in_three_moves() {
        let mut env = small_env();
        for mv in [
            HanoiMove::new(0, 1),
            HanoiMove::new(0, 2),
            HanoiMove::new(1, 2),
        ] {
            assert_eq!(env.update(&mv).ok(), Some(-1.0));
        }
        assert!(env.is_current_state_final_state());
        assert!(matches!(
            env.update(&HanoiMove::new(2, 0)),
            Err(RlError::EnvNotReady)
        ));
        env.store_game_length();
        assert_eq!(env.historic_game_lengths(), &[3]);
        assert_eq!(env.best_history().len(), 4);
    }

    #[test]
    fn shorter_games_replace_the_best_history() {
        let mut env = small_env();
        env.update(&HanoiMove::new(0, 2)).unwrap();
        env.update(&HanoiMove::new(2, 1)).unwrap();
        env.store_game_length();
        env.produce_initial_state();
        env.update(&HanoiMove::new(0, 1)).unwrap();
        env.store_game_length();
        assert_eq!(env.best_history().len(), 2);
        env.produce_initial_state();
        env.update(&HanoiMove::new(0, 1)).unwrap();
        env.update(&HanoiMove::new(0, 2)).unwrap();
        env.store_game_length();
        assert_eq!(env.best_history().len(), 2);
        assert_eq!(env.historic_game_lengths(), &[2, 1, 2]);
    }

    #[test]
    fn features_are_one_hot_per_disc() {
        let state = HanoiState {
            pegs: vec![2, 0],
            num_pegs: 3,
        };
        assert_eq!(state.features().to_vec(), vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn render_lists_discs_bottom_up() {
        let env = small_env();
        assert_eq!(env.render(), "peg 0: 2 1\npeg 1: \npeg 2: \n");
    }

    #[test]
    fn timeout_fails_the_game() {
        let mut env = HanoiEnv::new(HanoiConfig {
            num_pegs: 3,
            num_discs: 2,
            max_steps: 2,
        });
        env.update(&HanoiMove::new(0, 1)).unwrap();
        env.update(&HanoiMove::new(1, 0)).unwrap();
        assert!(env.is_current_state_failed_state());
        assert!(!env.is_current_state_final_state());
    }
}
