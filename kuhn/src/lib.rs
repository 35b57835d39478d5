//! Counterfactual regret minimization for three-card Kuhn poker.
//!
//! [`Trainer`] walks the game tree for one sampled deal per iteration and
//! accumulates regrets and average strategies in an [`InfoSetStore`]. The
//! average strategy can be saved, evaluated with [`eval`] and played with
//! [`players::CfrPlayer`] at a [`table`].

pub mod error;
pub mod eval;
pub mod game;
pub mod node;
pub mod players;
pub mod store;
pub mod table;
pub mod trainer;

pub use error::{
    KuhnError,
    Result,
};
pub use store::InfoSetStore;
pub use trainer::{
    train_parallel,
    Trainer,
    TrainingArgs,
};
