use rand::prelude::*;

use crate::game::{Deck, Environment, State};
use crate::learner::{select_action, Config, LearnedPolicy, StateAction};

// One record of an episode: the reward received entering the step and the
// state-action visit taken from it. The terminal record carries the final
// reward and no visit.
#[derive(Clone, Copy, Debug)]
struct Step {
    reward: f64,
    visit: Option<StateAction>,
}

// First-visit Monte Carlo control: generates whole episodes with the
// ε-greedy behavior policy, then folds the observed returns into the
// action-value table with an exact running average (no learning rate, no
// discounting).
pub struct Trainer<D: Deck, R: Rng> {
    env: Environment<D>,
    rng: R,
    exploration_rate: f64,
    policy: LearnedPolicy,
}

impl<D: Deck, R: Rng> Trainer<D, R> {
    pub fn new(deck: D, rng: R, config: Config) -> Trainer<D, R> {
        assert!(
            (0.0..=1.0).contains(&config.exploration_rate),
            "exploration rate out of range: {}",
            config.exploration_rate
        );
        Trainer {
            env: Environment::new(deck, config.dealer_stand_threshold),
            rng,
            exploration_rate: config.exploration_rate,
            policy: LearnedPolicy::new(),
        }
    }

    pub fn policy(&self) -> &LearnedPolicy {
        &self.policy
    }

    // Runs the given number of independent episodes, updating the value
    // table after each one.
    pub fn train(&mut self, n_episodes: u64) {
        assert!(n_episodes > 0, "episode count must be positive");
        for _ in 0..n_episodes {
            let history = self.run_episode(None);
            self.update_from_history(&history);
        }
    }

    // Plays greedy episodes without learning and returns the mean reward.
    pub fn evaluate(&mut self, episodes: u64) -> f64 {
        assert!(episodes > 0, "episode count must be positive");
        let mut total = 0.0;
        for _ in 0..episodes {
            let mut state = self.env.random_initial_state();
            loop {
                let action = select_action(&self.policy, &state, 0.0, &mut self.rng);
                let (reward, next) = self.env.step(&state, action);
                match next {
                    Some(next) => state = next,
                    None => {
                        total += reward;
                        break;
                    }
                }
            }
        }
        total / episodes as f64
    }

    // Generates a single episode from a fresh (or supplied) initial state.
    // Each visit is recorded before dynamics are applied; the terminal
    // transition appends a sentinel record holding the final reward.
    //
    // Always terminates: the player sum never decreases except through an
    // ace demotion, and each demotion permanently consumes the usable ace,
    // so repeated hits must reach a stand or a bust.
    fn run_episode(&mut self, start: Option<State>) -> Vec<Step> {
        let mut state = match start {
            Some(state) => state,
            None => self.env.random_initial_state(),
        };

        let mut history = Vec::new();
        loop {
            let action = select_action(&self.policy, &state, self.exploration_rate, &mut self.rng);
            history.push(Step {
                reward: 0.0,
                visit: Some(StateAction::new(state, action)),
            });
            let (reward, next) = self.env.step(&state, action);
            match next {
                Some(next) => state = next,
                None => {
                    history.push(Step {
                        reward,
                        visit: None,
                    });
                    break;
                }
            }
        }
        history
    }

    // Backward pass over one episode. The accumulated return is the plain
    // undiscounted sum of all rewards strictly after the step, kept general
    // even though only the terminal reward is non-zero in this environment.
    // Repeated visits to the same key within one episode all get updated;
    // there is no first-visit deduplication.
    fn update_from_history(&mut self, history: &[Step]) {
        let mut returns = 0.0;
        for i in (0..history.len().saturating_sub(1)).rev() {
            returns += history[i + 1].reward;
            if let Some(visit) = history[i].visit {
                self.policy.update(visit, returns);
            }
        }
    }
}
