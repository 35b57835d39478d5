use std::{
    error::Error,
    io,
    path::PathBuf,
};

use clap::{
    Args,
    Parser,
    Subcommand,
    ValueHint,
};
use log::{
    info,
    warn,
};
use rand::SeedableRng;
use wyhash::WyRng;

use kuhn::{
    eval::compute_exploitability,
    game::Deal,
    players::{
        CfrPlayer,
        HumanPlayer,
        Player,
        RandomPlayer,
        TightAggressivePlayer,
    },
    table::{
        compete,
        play_hand,
    },
    train_parallel,
    InfoSetStore,
    KuhnError,
    Trainer,
    TrainingArgs,
};

#[derive(Parser)]
struct AppArgs {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trains a strategy and saves it.
    Train(TrainArgs),
    /// Plays against a trained strategy in the terminal.
    Play(PlayArgs),
    /// Round robin between the built-in players.
    Compete(CompeteArgs),
    /// Prints the average strategy of a saved store.
    Strategy(StrategyArgs),
}

#[derive(Args)]
struct TrainArgs {
    #[clap(flatten)]
    training: TrainingArgs,

    /// Continues training from this store.
    #[clap(long, value_parser, value_hint(ValueHint::FilePath))]
    load: Option<PathBuf>,

    #[clap(long, value_parser, value_hint(ValueHint::FilePath), default_value = "cfr.json")]
    save: PathBuf,
}

#[derive(Args)]
struct PlayArgs {
    #[clap(long, value_parser, value_hint(ValueHint::FilePath), default_value = "cfr.json")]
    strategy: PathBuf,

    #[clap(long, short, value_parser, default_value = "you")]
    name: String,

    #[clap(long, short, value_parser, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct CompeteArgs {
    /// Adds the trained strategy to the round robin.
    #[clap(long, value_parser, value_hint(ValueHint::FilePath))]
    strategy: Option<PathBuf>,

    #[clap(long, short = 'n', value_parser, default_value_t = 100_000)]
    hands: usize,

    #[clap(long, short, value_parser, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct StrategyArgs {
    #[clap(long, value_parser, value_hint(ValueHint::FilePath), default_value = "cfr.json")]
    strategy: PathBuf,
}

fn train(args: TrainArgs) -> Result<(), Box<dyn Error>> {
    let training = args.training;
    let base = match &args.load {
        Some(path) => InfoSetStore::load(path)?,
        None => InfoSetStore::new(),
    };

    let store = if training.workers > 1 {
        if training.log_path.is_some() {
            warn!("progress log is only written by single worker training");
        }
        let (store, _) =
            train_parallel(&base, training.iterations, training.workers as usize, training.seed);
        store
    } else {
        let mut trainer = Trainer::with_store(base, training.seed);
        if let Some(path) = &training.log_path {
            trainer.log_progress_to(path)?;
        }
        trainer.train(training.iterations)?;
        trainer.into_store()
    };

    store.save(&args.save)?;
    Ok(())
}

fn play(args: PlayArgs) -> Result<(), Box<dyn Error>> {
    let store = InfoSetStore::load(&args.strategy)?;
    let mut bot = CfrPlayer::new(&store, WyRng::seed_from_u64(args.seed.wrapping_add(1)))?;
    let mut human = HumanPlayer::stdio();
    let mut rng = WyRng::seed_from_u64(args.seed);

    let mut score = 0i64;
    let mut games = 0u64;
    loop {
        let deal = Deal::sample(&mut rng);
        let (result, names, sign) = if games % 2 == 0 {
            (play_hand(deal, [&mut human, &mut bot]), [args.name.as_str(), "cfrbot"], 1)
        } else {
            (play_hand(deal, [&mut bot, &mut human]), ["cfrbot", args.name.as_str()], -1)
        };
        let result = match result {
            Ok(result) => result,
            Err(KuhnError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        println!("{}", result.describe(names));
        score += sign * result.payoff as i64;
        games += 1;
        println!("Score: {}. Games played: {}", score, games);
    }

    println!();
    info!("Final score: {} over {} games", score, games);
    Ok(())
}

fn round_robin(args: CompeteArgs) -> Result<(), Box<dyn Error>> {
    let mut players: Vec<(&str, Box<dyn Player>)> = vec![];
    players.push((
        "random",
        Box::new(RandomPlayer::new(WyRng::seed_from_u64(args.seed.wrapping_add(1)))),
    ));
    players.push((
        "tight-aggressive",
        Box::new(TightAggressivePlayer::new(WyRng::seed_from_u64(args.seed.wrapping_add(2)))),
    ));
    if let Some(path) = &args.strategy {
        let store = InfoSetStore::load(path)?;
        players.push((
            "cfr",
            Box::new(CfrPlayer::new(&store, WyRng::seed_from_u64(args.seed.wrapping_add(3)))?),
        ));
    }

    let mut rng = WyRng::seed_from_u64(args.seed);
    for j in 1..players.len() {
        let (left, right) = players.split_at_mut(j);
        let (name_b, b) = &mut right[0];
        for (name_a, a) in left.iter_mut() {
            let score = compete(a.as_mut(), b.as_mut(), args.hands, &mut rng)?;
            info!("{:>16} vs {:<16} {:+.3} per hand", name_a, name_b, score);
        }
    }
    Ok(())
}

fn print_strategy(args: StrategyArgs) -> Result<(), Box<dyn Error>> {
    let store = InfoSetStore::load(&args.strategy)?;
    print!("{}", store);
    let missing = store.missing_info_sets();
    if !missing.is_empty() {
        warn!("{} information sets were never trained", missing.len());
    }
    info!("exploitability: {}", compute_exploitability(&store));
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger with a default log level of INFO.
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = AppArgs::parse();
    match args.command {
        Command::Train(args) => train(args),
        Command::Play(args) => play(args),
        Command::Compete(args) => round_robin(args),
        Command::Strategy(args) => print_strategy(args),
    }
}
