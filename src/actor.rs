use std::fmt::Debug;
use std::hash::Hash;

use fxhash::FxHashMap;
use rand::seq::SliceRandom;

use crate::error::RlError;
use crate::utils::SharedRng;

/// Key of the policy and eligibility tables: a state joined with an action.
pub type StateAction<S, A> = (S, A);

/// Tabular policy over state-action pairs with its own eligibility trace.
#[derive(Debug, Clone)]
pub struct Actor<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> {
    learning_rate: f64,
    discount_factor: f64,
    trace_decay: f64,
    policy: FxHashMap<StateAction<S, A>, f64>,
    eligibility: FxHashMap<StateAction<S, A>, f64>,
    rng: SharedRng,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> Actor<S, A> {
    pub fn new(learning_rate: f64, discount_factor: f64, trace_decay: f64, rng: SharedRng) -> Self {
        Self {
            learning_rate,
            discount_factor,
            trace_decay,
            policy: FxHashMap::default(),
            eligibility: FxHashMap::default(),
            rng,
        }
    }

    pub fn initiate_eligibility(&mut self) {
        self.eligibility = FxHashMap::default();
    }

    pub fn get_state_action_value(&self, pair: &StateAction<S, A>) -> f64 {
        *self.policy.get(pair).unwrap_or(&0.0)
    }

    pub fn set_state_action_value(&mut self, pair: StateAction<S, A>, value: f64) {
        self.policy.insert(pair, value);
    }

    pub fn get_state_action_eligibility(&self, pair: &StateAction<S, A>) -> f64 {
        *self.eligibility.get(pair).unwrap_or(&0.0)
    }

    pub fn set_state_action_eligibility(&mut self, pair: StateAction<S, A>, value: f64) {
        self.eligibility.insert(pair, value);
    }

    pub fn update_state_action_value(&mut self, pair: &StateAction<S, A>, td_error: f64) {
        let value = self.get_state_action_value(pair)
            + self.learning_rate * td_error * self.get_state_action_eligibility(pair);
        self.set_state_action_value(pair.clone(), value);
    }

    pub fn update_state_action_eligibility(&mut self, pair: &StateAction<S, A>) {
        let eligibility =
            self.discount_factor * self.trace_decay * self.get_state_action_eligibility(pair);
        self.set_state_action_eligibility(pair.clone(), eligibility);
    }

    /// Random legal action, or when `greedy` a random one among the highest valued.
    pub fn propose_action(&self, greedy: bool, state: &S, legal_actions: &[A]) -> Result<A, RlError> {
        if !greedy {
            return legal_actions
                .choose(&mut *self.rng.borrow_mut())
                .cloned()
                .ok_or_else(|| RlError::NoLegalActions(format!("{:?}", state)));
        }
        let mut best_actions: Vec<&A> = vec![];
        let mut best_value: f64 = f64::NEG_INFINITY;
        for action in legal_actions {
            let value = self.get_state_action_value(&(state.clone(), action.clone()));
            if value > best_value {
                best_actions = vec![action];
                best_value = value;
            } else if value == best_value {
                best_actions.push(action);
            }
        }
        best_actions
            .choose(&mut *self.rng.borrow_mut())
            .map(|action| (*action).clone())
            .ok_or_else(|| RlError::NoLegalActions(format!("{:?}", state)))
    }

    /// Number of state-action pairs with a stored policy value.
    pub fn len(&self) -> usize {
        self.policy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policy.is_empty()
    }
}
