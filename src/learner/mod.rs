pub mod monte_carlo;

use std::collections::HashMap;

use rand::prelude::*;

use crate::game::{Action, State, ACTIONS};

// Optimistic estimate reported for state-action pairs that were never
// updated. It drives early exploration through the greedy argmax but carries
// zero weight once the first real return arrives.
pub const INITIAL_VALUE: f64 = 0.5;

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub exploration_rate: f64,
    pub dealer_stand_threshold: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            exploration_rate: 0.1,
            dealer_stand_threshold: 17,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StateAction {
    pub state: State,
    pub action: Action,
}

impl StateAction {
    pub fn new(state: State, action: Action) -> StateAction {
        StateAction { state, action }
    }
}

// Tabular action-value estimate together with per-key visit counts.
// The two maps co-evolve 1:1: every value update increments its count.
#[derive(Clone, Debug, Default)]
pub struct LearnedPolicy {
    values: HashMap<StateAction, f64>,
    counts: HashMap<StateAction, u32>,
}

impl LearnedPolicy {
    pub fn new() -> LearnedPolicy {
        LearnedPolicy::default()
    }

    pub fn value(&self, key: &StateAction) -> f64 {
        *self.values.get(key).unwrap_or(&INITIAL_VALUE)
    }

    pub fn count(&self, key: &StateAction) -> u32 {
        *self.counts.get(key).unwrap_or(&0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    // Folds one observed return into the exact running mean for the key.
    pub fn update(&mut self, key: StateAction, returns: f64) {
        let count = self.count(&key);
        let weight = count as f64;
        let value = weight / (weight + 1.0) * self.value(&key) + returns / (weight + 1.0);
        self.values.insert(key, value);
        self.counts.insert(key, count + 1);
    }

    // Best known action for the state. Ties go to the first action in
    // ACTIONS order, so a fresh state resolves to Stop.
    pub fn greedy_action(&self, state: &State) -> Action {
        let mut best = ACTIONS[0];
        let mut best_value = self.value(&StateAction::new(*state, best));
        for &action in ACTIONS[1..].iter() {
            let value = self.value(&StateAction::new(*state, action));
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }
}

// ε-greedy behavior policy over the current estimates, with two
// deterministic boundary cases: below 11 a hit can never bust, and 21 is
// never hit.
pub fn select_action<R: Rng>(
    policy: &LearnedPolicy,
    state: &State,
    exploration_rate: f64,
    rng: &mut R,
) -> Action {
    if state.player_sum < 11 {
        return Action::Hit;
    }
    if state.player_sum == 21 {
        return Action::Stop;
    }
    if rng.gen::<f64>() < exploration_rate {
        return ACTIONS[rng.gen_range(0..ACTIONS.len())];
    }
    policy.greedy_action(state)
}
