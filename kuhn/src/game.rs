use std::{
    fmt::Display,
    str::FromStr,
};

use itertools::Itertools;
use rand::{
    seq::SliceRandom,
    Rng,
};
use serde::{
    de,
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::error::{
    KuhnError,
    Result,
};

pub const PLAYER_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Card {
    Jack = 0,
    Queen = 1,
    King = 2,
}

impl Card {
    pub const VALUES: [Card; 3] = [Card::Jack, Card::Queen, Card::King];
    pub const COUNT: usize = Card::VALUES.len();

    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<char> for Card {
    type Error = KuhnError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '0' => Ok(Card::Jack),
            '1' => Ok(Card::Queen),
            '2' => Ok(Card::King),
            _ => Err(KuhnError::InvalidCard(c)),
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rank())
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    Pass,
    Bet,
}

impl Action {
    /// Every per-action vector in the crate is indexed in this order.
    pub const VALUES: [Action; 2] = [Action::Pass, Action::Bet];
    pub const COUNT: usize = Action::VALUES.len();

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn to_char(&self) -> char {
        match self {
            Action::Pass => 'p',
            Action::Bet => 'b',
        }
    }
}

impl TryFrom<char> for Action {
    type Error = KuhnError;

    fn try_from(c: char) -> Result<Self> {
        match c {
            'p' => Ok(Action::Pass),
            'b' => Ok(Action::Bet),
            _ => Err(KuhnError::InvalidAction(c.to_string())),
        }
    }
}

impl FromStr for Action {
    type Err = KuhnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "pass" => Ok(Action::Pass),
            "b" | "bet" => Ok(Action::Bet),
            _ => Err(KuhnError::InvalidAction(s.trim().to_string())),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Both actions are legal at every non-terminal state.
pub fn legal_actions() -> [Action; Action::COUNT] {
    Action::VALUES
}

/// Cards held by player 0, player 1 and the undealt card, in that order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deal {
    cards: [Card; Card::COUNT],
}

impl Deal {
    pub fn new(card0: Card, card1: Card) -> Result<Self> {
        if card0 == card1 {
            return Err(KuhnError::InvalidDeal(card0));
        }
        let undealt = Card::VALUES
            .into_iter()
            .find(|c| *c != card0 && *c != card1)
            .ok_or(KuhnError::InvalidDeal(card0))?;
        Ok(Deal {
            cards: [card0, card1, undealt],
        })
    }

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        let mut cards = Card::VALUES;
        cards.shuffle(rng);
        Deal {
            cards,
        }
    }

    /// All six deals, each equally likely.
    pub fn all() -> Vec<Deal> {
        Card::VALUES
            .into_iter()
            .permutations(Card::COUNT)
            .map(|p| Deal {
                cards: [p[0], p[1], p[2]],
            })
            .collect()
    }

    pub fn card(&self, player: usize) -> Card {
        self.cards[player]
    }

    pub fn undealt(&self) -> Card {
        self.cards[PLAYER_COUNT]
    }
}

impl Display for Deal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.cards[0], self.cards[1])
    }
}

#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct History(Vec<Action>);

impl History {
    pub fn new() -> Self {
        History(vec![])
    }

    pub fn with_action(&self, action: Action) -> Self {
        let mut actions = self.0.clone();
        actions.push(action);
        History(actions)
    }

    pub fn actions(&self) -> &[Action] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn active_player(&self) -> usize {
        self.0.len() % PLAYER_COUNT
    }

    pub fn is_terminal(&self) -> bool {
        let n = self.0.len();
        n >= 2 && !matches!((self.0[n - 2], self.0[n - 1]), (Action::Pass, Action::Bet))
    }

    /// True if some player still has to act here, i.e. neither this history
    /// nor any of its prefixes ended the hand.
    pub fn is_decision_point(&self) -> bool {
        (0..=self.0.len()).all(|len| !History(self.0[..len].to_vec()).is_terminal())
    }

    /// Every history at which a player acts: "", "p", "b" and "pb".
    pub fn decision_points() -> Vec<History> {
        let mut found = vec![];
        let mut stack = vec![History::new()];
        while let Some(history) = stack.pop() {
            if history.is_terminal() {
                continue;
            }
            for action in legal_actions() {
                stack.push(history.with_action(action));
            }
            found.push(history);
        }
        found.sort_by_key(|h| (h.len(), h.clone()));
        found
    }
}

impl FromStr for History {
    type Err = KuhnError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars().map(Action::try_from).collect::<Result<Vec<_>>>().map(History)
    }
}

impl Display for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for action in &self.0 {
            write!(f, "{}", action)?;
        }
        Ok(())
    }
}

/// Payoff of a finished hand for player 0, or `None` while the hand is still
/// running.
pub fn payoff(deal: &Deal, history: &History) -> Option<i32> {
    let actions = history.actions();
    let n = actions.len();
    if n < 2 {
        return None;
    }

    let showdown = |stake: i32| {
        if deal.card(0) > deal.card(1) {
            stake
        } else {
            -stake
        }
    };
    match (actions[n - 2], actions[n - 1]) {
        (Action::Pass, Action::Pass) => Some(showdown(1)),
        (Action::Bet, Action::Bet) => Some(showdown(2)),
        // The player who passed last folded; with an even history that is player 1.
        (Action::Bet, Action::Pass) => Some(if n % 2 == 0 {
            1
        } else {
            -1
        }),
        (Action::Pass, Action::Bet) => None,
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GameState {
    pub deal: Deal,
    pub history: History,
}

impl GameState {
    pub fn new(deal: Deal) -> Self {
        GameState {
            deal,
            history: History::new(),
        }
    }

    pub fn with_action(&self, action: Action) -> Self {
        GameState {
            deal: self.deal,
            history: self.history.with_action(action),
        }
    }

    pub fn active_player(&self) -> usize {
        self.history.active_player()
    }

    pub fn is_terminal(&self) -> bool {
        self.payoff().is_some()
    }

    pub fn payoff(&self) -> Option<i32> {
        payoff(&self.deal, &self.history)
    }

    pub fn payoff_for(&self, player: usize) -> Option<i32> {
        self.payoff().map(|p| if player == 0 { p } else { -p })
    }

    pub fn info_set(&self) -> InfoSet {
        InfoSet {
            card: self.deal.card(self.active_player()),
            history: self.history.clone(),
        }
    }
}

impl Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.deal, self.history)
    }
}

/// What the acting player observes: the own card and the public history.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InfoSet {
    pub card: Card,
    pub history: History,
}

impl InfoSet {
    pub fn new(card: Card, history: History) -> Self {
        InfoSet {
            card,
            history,
        }
    }

    pub fn player(&self) -> usize {
        self.history.active_player()
    }

    /// The twelve information sets of the game.
    pub fn all() -> Vec<InfoSet> {
        History::decision_points()
            .into_iter()
            .cartesian_product(Card::VALUES)
            .map(|(history, card)| InfoSet::new(card, history))
            .collect()
    }
}

impl Display for InfoSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.card, self.history)
    }
}

impl FromStr for InfoSet {
    type Err = KuhnError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let card = chars
            .next()
            .ok_or_else(|| KuhnError::InvalidInfoSet(s.to_string(), "empty id"))
            .and_then(Card::try_from)?;
        let history: History = chars
            .as_str()
            .parse()
            .map_err(|_| KuhnError::InvalidInfoSet(s.to_string(), "bad action in history"))?;
        if !history.is_decision_point() {
            return Err(KuhnError::InvalidInfoSet(
                s.to_string(),
                "no player acts after this history",
            ));
        }
        Ok(InfoSet::new(card, history))
    }
}

impl Serialize for InfoSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for InfoSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
