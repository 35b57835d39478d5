use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use more_asserts::assert_ge;

use crate::{
    game::{
        legal_actions,
        Action,
        Deal,
        GameState,
        InfoSet,
    },
    store::InfoSetStore,
};

pub trait Strategy {
    fn get_strategy(&self, info_set: &InfoSet) -> Option<[f64; Action::COUNT]>;

    fn safe_get_strategy(&self, info_set: &InfoSet) -> [f64; Action::COUNT] {
        self.get_strategy(info_set).unwrap_or([1.0 / Action::COUNT as f64; Action::COUNT])
    }
}

impl Strategy for InfoSetStore {
    fn get_strategy(&self, info_set: &InfoSet) -> Option<[f64; Action::COUNT]> {
        self.average_strategy(info_set)
    }
}

impl Strategy for HashMap<InfoSet, [f64; Action::COUNT]> {
    fn get_strategy(&self, info_set: &InfoSet) -> Option<[f64; Action::COUNT]> {
        self.get(info_set).copied()
    }
}

fn max_index(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_i, a), (_j, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn best_response_utils_to_pure_strategy(
    values: &HashMap<InfoSet, [f64; Action::COUNT]>,
) -> HashMap<InfoSet, [f64; Action::COUNT]> {
    values
        .iter()
        .map(|(info_set, utils)| {
            let mut pure_strategy = [0.0; Action::COUNT];
            pure_strategy[max_index(utils)] = 1.0;
            (info_set.clone(), pure_strategy)
        })
        .collect()
}

/// States of one information set with the probability that chance and the
/// opponent lead to each of them.
#[derive(Default)]
struct ReachProbabilities {
    reach_probabilities: HashMap<GameState, f64>,
}

impl ReachProbabilities {
    fn insert(&mut self, state: GameState, reach_probability: f64) {
        *self.reach_probabilities.entry(state).or_insert(0.0) += reach_probability;
    }
}

fn chance_probability() -> f64 {
    1.0 / Deal::all().len() as f64
}

fn calc_reach_probabilities<St: Strategy>(
    br_player: usize,
    strategy: &St,
    state: &GameState,
    reach_probability: f64,
    reach_probabilities: &mut HashMap<InfoSet, ReachProbabilities>,
) {
    if state.is_terminal() {
        return;
    }

    let info_set = state.info_set();
    if state.active_player() == br_player {
        reach_probabilities.entry(info_set).or_default().insert(state.clone(), reach_probability);
        for act in legal_actions() {
            // the best response player reaches every child on its own.
            calc_reach_probabilities(
                br_player,
                strategy,
                &state.with_action(act),
                reach_probability,
                reach_probabilities,
            );
        }
    } else {
        let strategy_ary = strategy.safe_get_strategy(&info_set);
        for act in legal_actions() {
            calc_reach_probabilities(
                br_player,
                strategy,
                &state.with_action(act),
                reach_probability * strategy_ary[act.index()],
                reach_probabilities,
            );
        }
    }
}

/// Value of `state` for `br_player` if that player best-responds to
/// `strategy` while the opponent follows it.
fn calc_best_response_value<St: Strategy>(
    action_utilities: &mut HashMap<InfoSet, [f64; Action::COUNT]>,
    reach_probabilities: &HashMap<InfoSet, ReachProbabilities>,
    br_player: usize,
    strategy: &St,
    state: &GameState,
) -> f64 {
    if let Some(payoff) = state.payoff_for(br_player) {
        return payoff as f64;
    }

    let info_set = state.info_set();
    if state.active_player() == br_player {
        // The best action is chosen per INFO SET, weighing every state in it.
        if !action_utilities.contains_key(&info_set) {
            let mut act_utils = [0.0; Action::COUNT];
            if let Some(rp) = reach_probabilities.get(&info_set) {
                for act in legal_actions() {
                    for (sib_state, state_reach_prob) in rp.reach_probabilities.iter() {
                        let util = calc_best_response_value(
                            action_utilities,
                            reach_probabilities,
                            br_player,
                            strategy,
                            &sib_state.with_action(act),
                        );
                        act_utils[act.index()] += state_reach_prob * util;
                    }
                }
            }
            action_utilities.insert(info_set.clone(), act_utils);
        }

        let best_action_index = action_utilities.get(&info_set).map(|u| max_index(u)).unwrap_or(0);
        return calc_best_response_value(
            action_utilities,
            reach_probabilities,
            br_player,
            strategy,
            &state.with_action(Action::VALUES[best_action_index]),
        );
    }

    let strategy_ary = strategy.safe_get_strategy(&info_set);
    let mut node_util = 0.0;
    for act in legal_actions() {
        let util = calc_best_response_value(
            action_utilities,
            reach_probabilities,
            br_player,
            strategy,
            &state.with_action(act),
        );
        node_util += strategy_ary[act.index()] * util;
    }
    node_util
}

fn calc_state_expected_value<S0: Strategy, S1: Strategy>(
    player: usize,
    strategy0: &S0,
    strategy1: &S1,
    state: &GameState,
) -> f64 {
    if let Some(payoff) = state.payoff_for(player) {
        return payoff as f64;
    }
    let info_set = state.info_set();
    let strategy = match state.active_player() {
        0 => strategy0.safe_get_strategy(&info_set),
        _ => strategy1.safe_get_strategy(&info_set),
    };
    debug!("p: {}, infoset: {}, strategy: {:?}", state.active_player(), info_set, strategy);
    legal_actions()
        .iter()
        .map(|act| {
            strategy[act.index()]
                * calc_state_expected_value(player, strategy0, strategy1, &state.with_action(*act))
        })
        .sum()
}

/// Exact expected payoff of `player` when player 0 follows `strategy0` and
/// player 1 follows `strategy1`, averaged over all deals.
pub fn calc_expected_value<S0: Strategy, S1: Strategy>(
    player: usize,
    strategy0: &S0,
    strategy1: &S1,
) -> f64 {
    Deal::all()
        .into_iter()
        .map(|deal| {
            chance_probability()
                * calc_state_expected_value(player, strategy0, strategy1, &GameState::new(deal))
        })
        .sum()
}

/// Pure best response of `br_player` against `strategy`.
pub fn best_response<St: Strategy>(
    br_player: usize,
    strategy: &St,
) -> HashMap<InfoSet, [f64; Action::COUNT]> {
    let mut reach_probabilities: HashMap<InfoSet, ReachProbabilities> = HashMap::new();
    for deal in Deal::all() {
        calc_reach_probabilities(
            br_player,
            strategy,
            &GameState::new(deal),
            chance_probability(),
            &mut reach_probabilities,
        );
    }

    let mut action_utilities: HashMap<InfoSet, [f64; Action::COUNT]> = HashMap::new();
    let mut br_value = 0.0;
    for deal in Deal::all() {
        br_value += chance_probability()
            * calc_best_response_value(
                &mut action_utilities,
                &reach_probabilities,
                br_player,
                strategy,
                &GameState::new(deal),
            );
    }
    debug!("util_{}(br{}): {}", br_player, br_player, br_value);

    if log::log_enabled!(log::Level::Debug) {
        debug!("Best responses for Player{}", br_player);
        for info_set in action_utilities.keys().sorted() {
            debug!("{}: {:?}", info_set, action_utilities[info_set]);
            if let Some(rp) = reach_probabilities.get(info_set) {
                for (s, prob) in rp.reach_probabilities.iter().sorted_by_key(|(k, _v)| *k) {
                    debug!("    {}: {}", s, prob);
                }
            }
        }
    }

    best_response_utils_to_pure_strategy(&action_utilities)
}

/// Average gain of the two best responses against `strategy`. Zero exactly
/// at a Nash equilibrium.
pub fn compute_exploitability<St: Strategy>(strategy: &St) -> f64 {
    let br_pure_strategies0 = best_response(0, strategy);
    let br_pure_strategies1 = best_response(1, strategy);

    let ev_0 = calc_expected_value(1, strategy, &br_pure_strategies1);
    let ev_1 = calc_expected_value(0, &br_pure_strategies0, strategy);

    debug!("util_1(s0, s_br1): {} util_0(s_br0, s1): {}", ev_0, ev_1);
    let exploitability = (ev_0 + ev_1) / 2.0;
    assert_ge!(exploitability, -1e-12, "Exploitability must be positive value.");
    exploitability
}
