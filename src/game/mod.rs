use std::collections::VecDeque;

use rand::prelude::*;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Action {
    Stop,
    Hit,
}

// Enumeration order doubles as the greedy tie-break order: Stop wins ties.
pub const ACTIONS: [Action; 2] = [Action::Stop, Action::Hit];

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct State {
    // Counts a usable ace as 11.
    pub player_sum: u32,
    pub usable_ace: bool,
    pub dealer_upcard: u32,
}

// Source of card values in [1, 10].
pub trait Deck {
    fn draw(&mut self) -> u32;
}

// Draws with replacement: 13 equally likely ranks, with jack, queen and king
// all counting 10, so a 10 comes up with probability 4/13.
pub struct InfiniteDeck<R: Rng> {
    rng: R,
}

impl InfiniteDeck<ThreadRng> {
    pub fn new() -> InfiniteDeck<ThreadRng> {
        InfiniteDeck { rng: thread_rng() }
    }
}

impl InfiniteDeck<StdRng> {
    pub fn seeded(seed: u64) -> InfiniteDeck<StdRng> {
        InfiniteDeck {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> Deck for InfiniteDeck<R> {
    fn draw(&mut self) -> u32 {
        self.rng.gen_range(1..=13).min(10)
    }
}

// Deals a predetermined sequence of cards. Panics when exhausted.
pub struct FixedDeck {
    cards: VecDeque<u32>,
}

impl FixedDeck {
    pub fn new(cards: &[u32]) -> FixedDeck {
        assert!(cards.iter().all(|c| (1..=10).contains(c)));
        FixedDeck {
            cards: cards.iter().copied().collect(),
        }
    }
}

impl Deck for FixedDeck {
    fn draw(&mut self) -> u32 {
        self.cards.pop_front().expect("fixed deck exhausted")
    }
}

pub struct Environment<D: Deck> {
    deck: D,
    dealer_stand_threshold: u32,
}

impl<D: Deck> Environment<D> {
    pub fn new(deck: D, dealer_stand_threshold: u32) -> Environment<D> {
        Environment {
            deck,
            dealer_stand_threshold,
        }
    }

    // Deals two player cards and the dealer upcard.
    // A single ace bonus is granted even if both player cards are aces.
    pub fn random_initial_state(&mut self) -> State {
        let cards = (self.deck.draw(), self.deck.draw());
        let usable_ace = cards.0 == 1 || cards.1 == 1;
        State {
            player_sum: cards.0 + cards.1 + if usable_ace { 10 } else { 0 },
            usable_ace,
            dealer_upcard: self.deck.draw(),
        }
    }

    // Applies one action to the state, dealing cards as required.
    // Returns:
    // * (1/-1, None) if the action is Stop; the reward is determined by letting
    //   the dealer play out their hand, with a draw counting as a loss.
    // * (-1, None) if the action is Hit and the player has gone bust.
    // * (0, Some(State)) if the action is Hit and the player didn't go over 21.
    pub fn step(&mut self, state: &State, action: Action) -> (f64, Option<State>) {
        assert!(
            state.player_sum <= 21,
            "step on a terminal state: {:?}",
            state
        );

        if action == Action::Stop {
            let dealer_sum = self.dealer_sum(state.dealer_upcard);
            if dealer_sum > 21 || state.player_sum > dealer_sum {
                return (1.0, None);
            }
            return (-1.0, None);
        }

        // Action is Hit. The policy never hits a 21.
        assert!(state.player_sum < 21, "hit on 21: {:?}", state);

        let mut player_sum = state.player_sum;
        let mut usable_ace = state.usable_ace;

        let card = self.deck.draw();
        if card == 1 && !usable_ace {
            // First ace counts as 11.
            player_sum += 11;
            usable_ace = true;
        } else {
            player_sum += card;
        }

        if player_sum > 21 {
            if !usable_ace {
                // Player has gone bust.
                return (-1.0, None);
            }
            // Demote the ace to 1 and keep going.
            player_sum -= 10;
            usable_ace = false;
        }

        (
            0.0,
            Some(State {
                player_sum,
                usable_ace,
                dealer_upcard: state.dealer_upcard,
            }),
        )
    }

    // Plays out the dealer's fixed policy: hit below the stand threshold,
    // demoting a counted ace instead of busting when possible.
    // The returned sum may exceed 21 (dealer bust).
    fn dealer_sum(&mut self, upcard: u32) -> u32 {
        let mut has_ace = upcard == 1;
        let mut sum = upcard + if has_ace { 10 } else { 0 };
        while sum < self.dealer_stand_threshold {
            let card = self.deck.draw();
            has_ace = has_ace || card == 1;
            sum += card;
            if sum > 21 && has_ace {
                sum -= 10;
                has_ace = false;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_env(cards: &[u32]) -> Environment<FixedDeck> {
        Environment::new(FixedDeck::new(cards), 17)
    }

    fn state(player_sum: u32, usable_ace: bool, dealer_upcard: u32) -> State {
        State {
            player_sum,
            usable_ace,
            dealer_upcard,
        }
    }

    #[test]
    fn infinite_deck_range_and_ten_frequency() {
        let mut deck = InfiniteDeck::seeded(7);
        let draws = 130000;
        let mut tens = 0;
        for _ in 0..draws {
            let card = deck.draw();
            assert!((1..=10).contains(&card));
            if card == 10 {
                tens += 1;
            }
        }
        // Expected frequency is 4/13 ≈ 0.3077.
        let frequency = tens as f64 / draws as f64;
        assert!(frequency > 0.29 && frequency < 0.33, "{}", frequency);
    }

    #[test]
    fn initial_state_single_ace() {
        let mut env = fixed_env(&[1, 6, 9]);
        assert_eq!(env.random_initial_state(), state(17, true, 9));
    }

    #[test]
    fn initial_state_double_ace_counts_one_bonus() {
        // Two aces still get the +10 bonus only once.
        let mut env = fixed_env(&[1, 1, 5]);
        assert_eq!(env.random_initial_state(), state(12, true, 5));
    }

    #[test]
    fn initial_state_no_ace() {
        let mut env = fixed_env(&[10, 7, 2]);
        assert_eq!(env.random_initial_state(), state(17, false, 2));
    }

    #[test]
    fn hit_below_twelve_never_busts() {
        for player_sum in 2..=11 {
            let mut env = fixed_env(&[10]);
            let (reward, next) = env.step(&state(player_sum, false, 5), Action::Hit);
            assert_eq!(reward, 0.0);
            let next = next.unwrap();
            assert!(next.player_sum <= 21);
            assert!(!(next.usable_ace && next.player_sum > 21));
        }
    }

    #[test]
    fn hit_first_ace_counts_eleven() {
        let mut env = fixed_env(&[1]);
        let (reward, next) = env.step(&state(5, false, 9), Action::Hit);
        assert_eq!(reward, 0.0);
        assert_eq!(next, Some(state(16, true, 9)));
    }

    #[test]
    fn hit_second_ace_counts_one() {
        let mut env = fixed_env(&[1]);
        let (reward, next) = env.step(&state(16, true, 9), Action::Hit);
        assert_eq!(reward, 0.0);
        assert_eq!(next, Some(state(17, true, 9)));
    }

    #[test]
    fn hit_ace_on_eleven_promotes_then_demotes() {
        // 11 + 11 = 22, immediately demoted back to 12 with no usable ace.
        let mut env = fixed_env(&[1]);
        let (reward, next) = env.step(&state(11, false, 5), Action::Hit);
        assert_eq!(reward, 0.0);
        assert_eq!(next, Some(state(12, false, 5)));
    }

    #[test]
    fn hit_over_21_demotes_usable_ace() {
        // 18 + 9 = 27 -> demoted to 17.
        let mut env = fixed_env(&[9]);
        let (reward, next) = env.step(&state(18, true, 5), Action::Hit);
        assert_eq!(reward, 0.0);
        assert_eq!(next, Some(state(17, false, 5)));
    }

    #[test]
    fn hit_bust_without_ace() {
        let mut env = fixed_env(&[10]);
        let (reward, next) = env.step(&state(12, false, 6), Action::Hit);
        assert_eq!(reward, -1.0);
        assert_eq!(next, None);
    }

    #[test]
    #[should_panic]
    fn step_on_busted_state_panics() {
        let mut env = fixed_env(&[10]);
        env.step(&state(22, false, 5), Action::Hit);
    }

    #[test]
    #[should_panic]
    fn hit_on_21_panics() {
        let mut env = fixed_env(&[10]);
        env.step(&state(21, false, 5), Action::Hit);
    }

    #[test]
    fn dealer_stands_at_seventeen_or_above() {
        // 10 + 10 = 20 >= 17, so only one card is drawn.
        let mut env = fixed_env(&[10]);
        assert_eq!(env.dealer_sum(10), 20);

        // Ace upcard counts as 11; 11 + 9 = 20.
        let mut env = fixed_env(&[9]);
        assert_eq!(env.dealer_sum(1), 20);
    }

    #[test]
    fn dealer_demotes_ace_instead_of_busting() {
        // 11 -> 14 -> 23, demoted to 13 -> 21, stand.
        let mut env = fixed_env(&[3, 9, 8]);
        assert_eq!(env.dealer_sum(1), 21);
    }

    #[test]
    fn dealer_busts_without_ace() {
        // 10 -> 16 -> 26, no ace to demote.
        let mut env = fixed_env(&[6, 10]);
        assert_eq!(env.dealer_sum(10), 26);
    }

    #[test]
    fn stop_wins_against_lower_dealer_sum() {
        // Dealer draws 7 for a final sum of 17; 20 > 17.
        let mut env = fixed_env(&[7]);
        let (reward, next) = env.step(&state(20, false, 10), Action::Stop);
        assert_eq!(reward, 1.0);
        assert_eq!(next, None);
    }

    #[test]
    fn stop_wins_against_dealer_bust() {
        // Dealer: 10 -> 16 -> 26, bust.
        let mut env = fixed_env(&[6, 10]);
        let (reward, next) = env.step(&state(12, false, 10), Action::Stop);
        assert_eq!(reward, 1.0);
        assert_eq!(next, None);
    }

    #[test]
    fn stop_loses_on_draw() {
        // Dealer reaches 20 as well; draws are scored as losses.
        let mut env = fixed_env(&[10]);
        let (reward, next) = env.step(&state(20, false, 10), Action::Stop);
        assert_eq!(reward, -1.0);
        assert_eq!(next, None);
    }

    #[test]
    fn stop_loses_against_higher_dealer_sum() {
        let mut env = fixed_env(&[10]);
        let (reward, next) = env.step(&state(18, false, 10), Action::Stop);
        assert_eq!(reward, -1.0);
        assert_eq!(next, None);
    }

    #[test]
    fn rewards_stay_in_range() {
        let mut env = Environment::new(InfiniteDeck::seeded(11), 17);
        for _ in 0..1000 {
            let mut state = env.random_initial_state();
            loop {
                let action = if state.player_sum < 17 {
                    Action::Hit
                } else {
                    Action::Stop
                };
                let (reward, next) = env.step(&state, action);
                assert!(reward == -1.0 || reward == 0.0 || reward == 1.0);
                match next {
                    Some(next) => {
                        // Non-terminal transitions carry no reward and keep
                        // the state invariants intact.
                        assert_eq!(reward, 0.0);
                        assert!(next.player_sum <= 21);
                        assert!((1..=10).contains(&next.dealer_upcard));
                        state = next;
                    }
                    None => {
                        assert_ne!(reward, 0.0);
                        break;
                    }
                }
            }
        }
    }
}
