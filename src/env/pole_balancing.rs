use ndarray::{arr1, Array1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Env, Observation};
use crate::error::RlError;
use crate::utils::{to_hundredths, SharedRng};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoleBalancingConfig {
    pub pole_length: f64,
    pub pole_mass: f64,
    pub cart_mass: f64,
    pub gravity: f64,
    pub force: f64,
    pub max_angle: f64,
    pub max_x_pos: f64,
    pub tau: f64,
    /// Steps the pole has to stay up for the episode to count as a success.
    pub steps: usize,
}

impl Default for PoleBalancingConfig {
    fn default() -> Self {
        Self {
            pole_length: 0.5,
            pole_mass: 0.1,
            cart_mass: 1.0,
            gravity: 9.8,
            force: 10.0,
            max_angle: 0.21,
            max_x_pos: 2.4,
            tau: 0.02,
            steps: 300,
        }
    }
}

/// Cart and pole variables rounded to hundredths.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub struct PoleBalancingState {
    pub x_pos: i64,
    pub x_vel: i64,
    pub angle: i64,
    pub angle_vel: i64,
}

impl Observation for PoleBalancingState {
    fn features(&self) -> Array1<f64> {
        arr1(&[
            self.x_pos as f64 / 100.0,
            self.x_vel as f64 / 100.0,
            self.angle as f64 / 100.0,
            self.angle_vel as f64 / 100.0,
        ])
    }
}

#[derive(Debug, Clone)]
pub struct PoleBalancingEnv {
    config: PoleBalancingConfig,
    angle: f64,
    angle_vel: f64,
    x_pos: f64,
    x_vel: f64,
    current_step: usize,
    balancing_failed: bool,
    cart_exited: bool,
    historic_game_length: Vec<usize>,
    rng: SharedRng,
}

impl PoleBalancingEnv {
    pub const ACTIONS: [bool; 2] = [false, true];

    pub fn new(config: PoleBalancingConfig, rng: SharedRng) -> Self {
        let mut env = Self {
            config,
            angle: 0.0,
            angle_vel: 0.0,
            x_pos: 0.0,
            x_vel: 0.0,
            current_step: 0,
            balancing_failed: false,
            cart_exited: false,
            historic_game_length: vec![],
            rng,
        };
        env.produce_initial_state();
        env
    }

    fn angle_acc(&self, force: f64) -> f64 {
        let c = &self.config;
        let total_mass = c.pole_mass + c.cart_mass;
        let (sin, cos) = self.angle.sin_cos();
        let numerator = c.gravity * sin
            + cos * (-force - c.pole_mass * c.pole_length * self.angle_vel.powi(2) * sin)
                / total_mass;
        let denominator = c.pole_length * (4.0 / 3.0 - c.pole_mass * cos.powi(2) / total_mass);
        numerator / denominator
    }

    fn x_acc(&self, force: f64, angle_acc: f64) -> f64 {
        let c = &self.config;
        let (sin, cos) = self.angle.sin_cos();
        (force + c.pole_mass * c.pole_length * (self.angle_vel.powi(2) * sin - angle_acc * cos))
            / (c.pole_mass + c.cart_mass)
    }

    /// Next (x_pos, x_vel, angle, angle_vel) if `push_right` is applied; the world is left unchanged.
    pub fn get_child_state(&self, push_right: bool) -> (f64, f64, f64, f64) {
        let force = if push_right {
            self.config.force
        } else {
            -self.config.force
        };
        let angle_acc = self.angle_acc(force);
        let x_acc = self.x_acc(force, angle_acc);
        let tau = self.config.tau;
        (
            self.x_pos + tau * self.x_vel,
            self.x_vel + tau * x_acc,
            self.angle + tau * self.angle_vel,
            self.angle_vel + tau * angle_acc,
        )
    }
}

impl Env for PoleBalancingEnv {
    type State = PoleBalancingState;
    type Action = bool;

    fn produce_initial_state(&mut self) -> PoleBalancingState {
        let max_angle = self.config.max_angle;
        self.angle = self.rng.borrow_mut().gen_range(-max_angle..=max_angle);
        self.angle_vel = 0.0;
        self.x_pos = 0.0;
        self.x_vel = 0.0;
        self.current_step = 0;
        self.balancing_failed = false;
        self.cart_exited = false;
        self.get_current_state()
    }

    fn get_current_state(&self) -> PoleBalancingState {
        PoleBalancingState {
            x_pos: to_hundredths(self.x_pos),
            x_vel: to_hundredths(self.x_vel),
            angle: to_hundredths(self.angle),
            angle_vel: to_hundredths(self.angle_vel),
        }
    }

    fn update(&mut self, action: &bool) -> Result<f64, RlError> {
        if self.is_current_state_terminal() {
            return Err(RlError::EnvNotReady);
        }
        self.current_step += 1;
        let (x_pos, x_vel, angle, angle_vel) = self.get_child_state(*action);
        self.x_pos = x_pos;
        self.x_vel = x_vel;
        self.angle = angle;
        self.angle_vel = angle_vel;

        if self.angle.abs() > self.config.max_angle {
            self.balancing_failed = true;
        }
        if self.x_pos.abs() > self.config.max_x_pos {
            self.cart_exited = true;
        }
        Ok(1.0)
    }

    fn get_legal_actions(&self, _state: &PoleBalancingState) -> Vec<bool> {
        Self::ACTIONS.to_vec()
    }

    fn is_current_state_final_state(&self) -> bool {
        self.current_step >= self.config.steps && !self.is_current_state_failed_state()
    }

    fn is_current_state_failed_state(&self) -> bool {
        self.balancing_failed || self.cart_exited
    }

    fn state_size(&self) -> usize {
        4
    }

    fn store_game_length(&mut self) {
        self.historic_game_length.push(self.current_step);
    }

    fn historic_game_lengths(&self) -> &[usize] {
        &self.historic_game_length
    }

    fn render(&self) -> String {
        format!(
            "x_pos: {:.3} x_vel: {:.3} angle: {:.3} angle_vel: {:.3}",
            self.x_pos, self.x_vel, self.angle, self.angle_vel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::shared_rng;

    fn upright_env(steps: usize) -> PoleBalancingEnv {
        let config = PoleBalancingConfig {
            steps,
            ..PoleBalancingConfig::default()
        };
        let mut env = PoleBalancingEnv::new(config, shared_rng(Some(4)));
        env.angle = 0.0;
        env
    }

    #[test]
    fn initial_angle_is_within_bounds() {
        let mut env = PoleBalancingEnv::new(PoleBalancingConfig::default(), shared_rng(Some(8)));
        for _ in 0..100 {
            let state = env.produce_initial_state();
            assert!(state.angle.abs() <= 21);
            assert_eq!((state.x_pos, state.x_vel, state.angle_vel), (0, 0, 0));
        }
    }

    #[test]
    fn pushing_right_moves_cart_right_and_tips_pole_left() {
        let mut env = upright_env(300);
        assert_eq!(env.update(&true).ok(), Some(1.0));
        let state = env.get_current_state();
        assert!(state.x_vel > 0);
        assert!(state.angle_vel < 0);
        assert_eq!(state.x_pos, 0);
    }

    #[test]
    fn child_state_does_not_move_the_world() {
        let env = upright_env(300);
        let before = env.get_current_state();
        let _ = env.get_child_state(false);
        assert_eq!(env.get_current_state(), before);
    }

    #[test]
    fn falling_pole_fails() {
        let mut env = upright_env(300);
        env.angle = 0.3;
        env.update(&false).unwrap();
        assert!(env.is_current_state_failed_state());
        assert!(!env.is_current_state_final_state());
        assert!(matches!(env.update(&false), Err(RlError::EnvNotReady)));
    }

    #[test]
    fn surviving_all_steps_is_final() {
        let mut env = upright_env(4);
        for push_right in [true, false, false, true] {
            env.update(&push_right).unwrap();
        }
        assert!(env.is_current_state_final_state());
        env.store_game_length();
        assert_eq!(env.historic_game_lengths(), &[4]);
    }

    #[test]
    fn both_pushes_always_legal() {
        let env = upright_env(10);
        assert_eq!(env.get_legal_actions(&env.get_current_state()), vec![false, true]);
    }
}
