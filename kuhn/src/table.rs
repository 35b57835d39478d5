use log::debug;
use rand::Rng;

use crate::{
    error::Result,
    game::{
        Deal,
        GameState,
    },
    players::Player,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandResult {
    pub state: GameState,
    /// Payoff of the player in seat 0.
    pub payoff: i32,
}

impl HandResult {
    pub fn describe(&self, names: [&str; 2]) -> String {
        let winner = if self.payoff > 0 {
            names[0]
        } else {
            names[1]
        };
        format!("Game ended: {} wins {}. Replay: {}", winner, self.payoff.abs(), self.state)
    }
}

/// Plays one hand between the players in seat 0 and seat 1.
pub fn play_hand(deal: Deal, mut players: [&mut dyn Player; 2]) -> Result<HandResult> {
    for player in players.iter_mut() {
        player.reset();
    }

    let mut state = GameState::new(deal);
    loop {
        if let Some(payoff) = state.payoff() {
            return Ok(HandResult {
                state,
                payoff,
            });
        }
        let seat = state.active_player();
        let action = players[seat].act(&state.info_set())?;
        debug!("{}: seat {} plays {}", state, seat, action);
        state = state.with_action(action);
    }
}

/// Average payoff per hand of `a` against `b` over `hands` hands, switching
/// seats every hand.
pub fn compete<R: Rng>(
    a: &mut dyn Player,
    b: &mut dyn Player,
    hands: usize,
    rng: &mut R,
) -> Result<f64> {
    let mut score = 0i64;
    for hand in 0..hands {
        let deal = Deal::sample(rng);
        score += if hand % 2 == 0 {
            play_hand(deal, [&mut *a, &mut *b])?.payoff as i64
        } else {
            -play_hand(deal, [&mut *b, &mut *a])?.payoff as i64
        };
    }
    Ok(if hands == 0 {
        0.0
    } else {
        score as f64 / hands as f64
    })
}

#[cfg(test)]
mod tests {
    use more_asserts::assert_gt;
    use rand::SeedableRng;
    use wyhash::WyRng;

    use super::*;
    use crate::{
        error::KuhnError,
        game::{
            Action,
            Card,
            InfoSet,
        },
        players::{
            RandomPlayer,
            TightAggressivePlayer,
        },
    };

    /// Plays a fixed sequence of actions and records what it was shown.
    struct Scripted {
        actions: Vec<Action>,
        seen: Vec<String>,
        resets: usize,
    }

    impl Scripted {
        fn new(actions: &str) -> Self {
            Scripted {
                actions: actions.chars().rev().map(|c| Action::try_from(c).unwrap()).collect(),
                seen: vec![],
                resets: 0,
            }
        }
    }

    impl Player for Scripted {
        fn reset(&mut self) {
            self.resets += 1;
        }

        fn act(&mut self, info_set: &InfoSet) -> Result<Action> {
            self.seen.push(info_set.to_string());
            self.actions.pop().ok_or_else(|| KuhnError::UnknownInfoSet(info_set.to_string()))
        }
    }

    #[test]
    fn test_play_hand() {
        let deal = Deal::new(Card::Queen, Card::King).unwrap();
        let mut p0 = Scripted::new("pb");
        let mut p1 = Scripted::new("b");
        let result = play_hand(deal, [&mut p0, &mut p1]).unwrap();

        assert_eq!("12pbb", result.state.to_string());
        assert_eq!(-2, result.payoff);
        assert_eq!(vec!["1", "1pb"], p0.seen);
        assert_eq!(vec!["2p"], p1.seen);
        assert_eq!((1, 1), (p0.resets, p1.resets));
        assert_eq!("Game ended: bot wins 2. Replay: 12pbb", result.describe(["you", "bot"]));
    }

    #[test]
    fn test_play_hand_fold() {
        let deal = Deal::new(Card::Jack, Card::King).unwrap();
        let mut p0 = Scripted::new("b");
        let mut p1 = Scripted::new("p");
        let result = play_hand(deal, [&mut p0, &mut p1]).unwrap();
        assert_eq!(1, result.payoff);
        assert_eq!("Game ended: you wins 1. Replay: 02bp", result.describe(["you", "bot"]));
    }

    #[test]
    fn test_play_hand_propagates_errors() {
        let deal = Deal::new(Card::Jack, Card::King).unwrap();
        let mut p0 = Scripted::new("");
        let mut p1 = Scripted::new("");
        assert!(play_hand(deal, [&mut p0, &mut p1]).is_err());
    }

    #[test]
    fn test_compete() {
        let mut rng = WyRng::seed_from_u64(3);
        let mut tag = TightAggressivePlayer::new(WyRng::seed_from_u64(1));
        let mut random = RandomPlayer::new(WyRng::seed_from_u64(2));
        let score = compete(&mut tag, &mut random, 20_000, &mut rng).unwrap();
        assert_gt!(score, 0.0);

        let mut rng = WyRng::seed_from_u64(3);
        let mut a = RandomPlayer::new(WyRng::seed_from_u64(4));
        let mut b = RandomPlayer::new(WyRng::seed_from_u64(5));
        let score = compete(&mut a, &mut b, 20_000, &mut rng).unwrap();
        assert!(score.abs() < 0.05, "{}", score);
    }
}
