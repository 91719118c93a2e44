mod game;
mod learner;

use plotlib::{
    page::Page,
    repr::Plot,
    style::{PointMarker, PointStyle},
    view::ContinuousView,
};
use prettytable::{Cell, Row, Table};
use rand::prelude::*;

use game::{Action, InfiniteDeck, State, ACTIONS};
use learner::monte_carlo::Trainer;
use learner::{Config, LearnedPolicy, StateAction};

fn print_policy(policy: &LearnedPolicy) {
    let mut table = Table::new();

    // Print header: dealer upcards, ace first.
    let mut header = Vec::new();
    header.push(Cell::new(""));
    header.push(Cell::new("Ace?"));
    for dealer_upcard in 1..=10 {
        header.push(match dealer_upcard {
            1 => Cell::new("A"),
            v => Cell::new(&format!("{}", v)),
        });
    }
    table.add_row(Row::new(header));

    for usable_ace in &[false, true] {
        for player_sum in 11..=21 {
            let mut cells = Vec::new();
            cells.push(Cell::new(&format!("{}", player_sum)));
            cells.push(Cell::new(match usable_ace {
                true => "Y",
                false => "N",
            }));
            for dealer_upcard in 1..=10 {
                let state = State {
                    player_sum,
                    usable_ace: *usable_ace,
                    dealer_upcard,
                };

                // Leave the cell blank if neither action was ever visited.
                let visited = ACTIONS
                    .iter()
                    .any(|a| policy.count(&StateAction::new(state, *a)) > 0);
                if !visited {
                    cells.push(Cell::new(""));
                    continue;
                }

                match policy.greedy_action(&state) {
                    Action::Hit => cells.push(Cell::new("H")),
                    Action::Stop => cells.push(Cell::new("S")),
                }
            }
            table.add_row(Row::new(cells));
        }
    }
    table.printstd();
}

fn print_convergence(curve: &Vec<(f64, f64)>) {
    let episodes = curve.last().unwrap().0;
    let s1 = Plot::new(curve.clone()).point_style(PointStyle::new().marker(PointMarker::Circle));
    let v = ContinuousView::new()
        .add(s1)
        .x_range(0.0, episodes)
        .y_range(-1.0, 1.0)
        .x_label("Episodes")
        .y_label("Avg return");
    println!(
        "{}",
        Page::single(&v).dimensions(100, 50).to_text().unwrap()
    );
}

fn main() {
    let mut trainer = Trainer::new(InfiniteDeck::new(), thread_rng(), Config::default());

    // Train in rounds, sampling the greedy performance after each one.
    let mut curve = Vec::new();
    let round = 100000;
    for i in 0..50u64 {
        trainer.train(round);
        let avg_return = trainer.evaluate(10000);
        curve.push((((i + 1) * round) as f64, avg_return));
    }

    println!("Learned {} state-action values", trainer.policy().len());
    print_convergence(&curve);
    print_policy(trainer.policy());
    println!("Average greedy returns: {}", curve.last().unwrap().1);
}
