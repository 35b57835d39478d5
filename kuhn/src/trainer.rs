use std::{
    fs::File,
    path::{
        Path,
        PathBuf,
    },
    time::{
        Duration,
        Instant,
    },
};

use clap::{
    Args,
    ValueHint,
};
use log::{
    debug,
    info,
};
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use wyhash::WyRng;

use crate::{
    error::Result,
    eval::compute_exploitability,
    game::{
        payoff,
        Action,
        Deal,
        History,
        InfoSet,
    },
    store::InfoSetStore,
};

#[derive(Args, Clone, Debug)]
pub struct TrainingArgs {
    #[clap(long, short, value_parser, default_value_t = 1000)]
    pub iterations: usize,

    #[clap(long, short, value_parser, default_value_t = 42)]
    pub seed: u64,

    /// Number of independent trainers whose stores are summed at the end.
    #[clap(long, short, value_parser = clap::value_parser!(u32).range(1..), default_value_t = 1)]
    pub workers: u32,

    /// Appends progress (iteration, elapsed seconds, value, exploitability) as CSV.
    #[clap(long, short, value_parser, value_hint(ValueHint::FilePath))]
    pub log_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct ProgressRecord {
    iteration: usize,
    elapsed_seconds: u64,
    average_value: f64,
    exploitability: f64,
}

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

pub struct Trainer {
    store: InfoSetStore,
    rng: WyRng,
    progress_log: Option<csv::Writer<File>>,
}

impl Trainer {
    pub fn new(seed: u64) -> Self {
        Self::with_store(InfoSetStore::new(), seed)
    }

    /// Continues training from a previously accumulated store.
    pub fn with_store(store: InfoSetStore, seed: u64) -> Self {
        Trainer {
            store,
            rng: WyRng::seed_from_u64(seed),
            progress_log: None,
        }
    }

    pub fn log_progress_to<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.progress_log = Some(csv::Writer::from_path(path)?);
        Ok(())
    }

    pub fn store(&self) -> &InfoSetStore {
        &self.store
    }

    pub fn into_store(self) -> InfoSetStore {
        self.store
    }

    /// Counterfactual value of the state for the player to act at `history`.
    /// `reach0` and `reach1` are the probabilities that each player's own
    /// actions lead to this history.
    pub fn cfr(&mut self, deal: &Deal, history: &History, reach0: f64, reach1: f64) -> f64 {
        let player = history.active_player();
        let payoff = payoff(deal, history);
        debug_assert!(
            payoff.is_some() || history.is_decision_point(),
            "history {} continues past the end of the hand",
            history
        );
        if let Some(payoff) = payoff {
            return if player == 0 {
                payoff as f64
            } else {
                -payoff as f64
            };
        }

        let reach = [reach0, reach1];
        let info_set = InfoSet::new(deal.card(player), history.clone());
        let node = self.store.ensure_exists(&info_set);
        let strategy = node.current_strategy();
        for act in Action::VALUES {
            node.add_strategy_weight(act, reach[player] * strategy[act.index()]);
        }

        let mut action_utils = [0.0; Action::COUNT];
        let mut node_util = 0.0;
        for act in Action::VALUES {
            let i = act.index();
            let mut next_reach = reach;
            next_reach[player] *= strategy[i];
            action_utils[i] =
                -self.cfr(deal, &history.with_action(act), next_reach[0], next_reach[1]);
            node_util += strategy[i] * action_utils[i];
        }

        let opponent_prob = reach[player ^ 1];
        for act in Action::VALUES {
            let regret = action_utils[act.index()] - node_util;
            self.store.add_regret(&info_set, act, opponent_prob * regret);
        }
        debug!("{} {:?} utils: {:?} -> {}", info_set, strategy, action_utils, node_util);

        node_util
    }

    /// Runs the recursion on one freshly sampled deal and returns the value
    /// for player 0.
    pub fn train_iteration(&mut self) -> f64 {
        let deal = Deal::sample(&mut self.rng);
        self.cfr(&deal, &History::new(), 1.0, 1.0)
    }

    /// Trains for `iterations` and returns the average game value for
    /// player 0.
    pub fn train(&mut self, iterations: usize) -> Result<f64> {
        let mut util = 0.0;
        let start_t = Instant::now();
        let mut timer = Instant::now();
        for i in 0..iterations {
            util += self.train_iteration();
            if timer.elapsed() > PROGRESS_INTERVAL {
                self.report_progress(i + 1, util / (i + 1) as f64, start_t)?;
                timer = Instant::now();
            }
        }
        let average_value = if iterations == 0 {
            0.0
        } else {
            util / iterations as f64
        };
        self.report_progress(iterations, average_value, start_t)?;

        info!("Training has finished");
        log_summary(&self.store, average_value);
        Ok(average_value)
    }

    fn report_progress(
        &mut self,
        iteration: usize,
        average_value: f64,
        start_t: Instant,
    ) -> Result<()> {
        let exploitability = compute_exploitability(&self.store);
        info!("epoch {:10}: exploitability: {}", iteration, exploitability);
        info!("Average game value: {}", average_value);

        if let Some(w) = &mut self.progress_log {
            w.serialize(ProgressRecord {
                iteration,
                elapsed_seconds: start_t.elapsed().as_secs(),
                average_value,
                exploitability,
            })?;
            w.flush()?;
        }
        Ok(())
    }
}

/// Logs the average strategy of every node and how close it is to an
/// equilibrium.
pub fn log_summary(store: &InfoSetStore, average_value: f64) {
    info!("Nodes [");
    for line in store.to_string().lines() {
        info!("    {}", line);
    }
    info!("]");

    info!("# of infoset: {}", store.len());
    info!("Average game value: {}", average_value);
    info!("exploitability: {}", compute_exploitability(store));
}

/// Trains `workers` independent trainers in parallel, each starting from a
/// copy of `base`, and adds what every worker accumulated on top of `base`
/// once all of them have finished. Worker `w` is seeded with `seed + w`.
pub fn train_parallel(
    base: &InfoSetStore,
    iterations: usize,
    workers: usize,
    seed: u64,
) -> (InfoSetStore, f64) {
    let workers = workers.max(1);
    let results: Vec<(InfoSetStore, f64)> = (0..workers)
        .into_par_iter()
        .map(|w| {
            let share = iterations / workers + usize::from(w < iterations % workers);
            let mut trainer = Trainer::with_store(base.clone(), seed.wrapping_add(w as u64));
            let util: f64 = (0..share).map(|_| trainer.train_iteration()).sum();
            debug!("worker {} finished {} iterations", w, share);
            (trainer.into_store(), util)
        })
        .collect();

    let mut store = base.clone();
    let mut util = 0.0;
    for (worker_store, worker_util) in &results {
        store.merge_delta(worker_store, base);
        util += worker_util;
    }
    let average_value = if iterations == 0 {
        0.0
    } else {
        util / iterations as f64
    };
    info!("Training has finished ({} workers)", workers);
    log_summary(&store, average_value);
    (store, average_value)
}
