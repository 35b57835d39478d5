use thiserror::Error;

use crate::game::Card;

#[derive(Debug, Error)]
pub enum KuhnError {
    #[error("invalid action {0:?}, expected p (pass) or b (bet)")]
    InvalidAction(String),

    #[error("invalid card {0:?}, expected a rank in 0..=2")]
    InvalidCard(char),

    #[error("invalid deal: both players hold {0}")]
    InvalidDeal(Card),

    #[error("invalid information set {0:?}: {1}")]
    InvalidInfoSet(String, &'static str),

    #[error("unknown information set {0}")]
    UnknownInfoSet(String),

    #[error("malformed node {info_set}: {reason}")]
    MalformedNode {
        info_set: String,
        reason: String,
    },

    #[error("strategy is missing information sets: {}", .0.join(", "))]
    MissingInfoSets(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, KuhnError>;
