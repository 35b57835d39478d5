//! Opponents that can sit at a Kuhn table: a human on a terminal, two
//! scripted baselines and the trained CFR strategy.

use std::{
    collections::HashMap,
    io::{
        self,
        BufRead,
        Stdin,
        Stdout,
        Write,
    },
};

use log::warn;
use rand::Rng;
use rand_distr::{
    Distribution,
    WeightedIndex,
};

use crate::{
    error::{
        KuhnError,
        Result,
    },
    game::{
        Action,
        Card,
        InfoSet,
    },
    store::InfoSetStore,
};

pub trait Player {
    /// Forgets anything remembered during the previous hand.
    fn reset(&mut self) {}

    fn act(&mut self, info_set: &InfoSet) -> Result<Action>;
}

/// Reads actions from `input`, asking again until a valid one is entered.
pub struct HumanPlayer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        HumanPlayer {
            input,
            output,
        }
    }
}

impl HumanPlayer<io::StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        HumanPlayer::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn act(&mut self, info_set: &InfoSet) -> Result<Action> {
        loop {
            write!(
                self.output,
                "You hold {}. Action so far: {}. Pass/bet (p/b)? ",
                info_set.card, info_set.history
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
            }
            match line.parse::<Action>() {
                Ok(action) => return Ok(action),
                Err(e) => {
                    warn!("{}", e);
                    writeln!(self.output, "{}", e)?;
                }
            }
        }
    }
}

/// Passes or bets with equal probability.
pub struct RandomPlayer<R> {
    rng: R,
}

impl<R: Rng> RandomPlayer<R> {
    pub fn new(rng: R) -> Self {
        RandomPlayer {
            rng,
        }
    }
}

impl<R: Rng> Player for RandomPlayer<R> {
    fn act(&mut self, _info_set: &InfoSet) -> Result<Action> {
        Ok(Action::VALUES[self.rng.gen_range(0..Action::COUNT)])
    }
}

/// Always passes the jack, always bets the king, flips a coin with the queen.
pub struct TightAggressivePlayer<R> {
    rng: R,
}

impl<R: Rng> TightAggressivePlayer<R> {
    pub fn new(rng: R) -> Self {
        TightAggressivePlayer {
            rng,
        }
    }
}

impl<R: Rng> Player for TightAggressivePlayer<R> {
    fn act(&mut self, info_set: &InfoSet) -> Result<Action> {
        Ok(match info_set.card {
            Card::Jack => Action::Pass,
            Card::King => Action::Bet,
            Card::Queen => Action::VALUES[self.rng.gen_range(0..Action::COUNT)],
        })
    }
}

/// Plays the average strategy of a trained store.
pub struct CfrPlayer<R> {
    strategy: HashMap<InfoSet, WeightedIndex<f64>>,
    rng: R,
}

impl<R: Rng> CfrPlayer<R> {
    /// Fails unless the store covers every information set of the game.
    pub fn new(store: &InfoSetStore, rng: R) -> Result<Self> {
        let missing = store.missing_info_sets();
        if !missing.is_empty() {
            warn!(
                "{} of {} information sets were never trained",
                missing.len(),
                InfoSet::all().len()
            );
            return Err(KuhnError::MissingInfoSets(missing.iter().map(|i| i.to_string()).collect()));
        }

        let mut strategy = HashMap::new();
        for (info_set, node) in store.iter() {
            let dist = WeightedIndex::new(node.average_strategy()).map_err(|e| {
                KuhnError::MalformedNode {
                    info_set: info_set.to_string(),
                    reason: e.to_string(),
                }
            })?;
            strategy.insert(info_set.clone(), dist);
        }
        Ok(CfrPlayer {
            strategy,
            rng,
        })
    }
}

impl<R: Rng> Player for CfrPlayer<R> {
    fn act(&mut self, info_set: &InfoSet) -> Result<Action> {
        let dist = self
            .strategy
            .get(info_set)
            .ok_or_else(|| KuhnError::UnknownInfoSet(info_set.to_string()))?;
        Ok(Action::VALUES[dist.sample(&mut self.rng)])
    }
}
