use kuhn::{
    eval::compute_exploitability,
    game::{
        Action,
        InfoSet,
    },
    players::{
        CfrPlayer,
        RandomPlayer,
    },
    table::compete,
    InfoSetStore,
    KuhnError,
    Trainer,
};
use more_asserts::{
    assert_gt,
    assert_lt,
};
use rand::SeedableRng;
use wyhash::WyRng;

fn info_set(s: &str) -> InfoSet {
    s.parse().unwrap()
}

#[test]
fn test_resume_from_saved_store() {
    let mut trainer = Trainer::new(1);
    trainer.train(1_000).unwrap();

    let mut buf = vec![];
    trainer.store().to_writer(&mut buf).unwrap();
    let loaded = InfoSetStore::from_reader(buf.as_slice()).unwrap();
    assert_eq!(trainer.store(), &loaded);

    let mut resumed = Trainer::with_store(loaded, 2);
    let mut continued = Trainer::with_store(trainer.into_store(), 2);
    resumed.train(1_000).unwrap();
    continued.train(1_000).unwrap();
    assert_eq!(continued.store(), resumed.store());
}

#[test]
fn test_save_and_load_file() {
    let mut trainer = Trainer::new(5);
    trainer.train(500).unwrap();

    let path = std::env::temp_dir().join(format!("kuhn-store-{}.json", std::process::id()));
    trainer.store().save(&path).unwrap();
    let loaded = InfoSetStore::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(trainer.store().len(), loaded.len());
    for (id, node) in trainer.store().iter() {
        let other = loaded.get(id).unwrap();
        for i in 0..Action::COUNT {
            assert_eq!(node.regrets()[i].to_bits(), other.regrets()[i].to_bits());
            assert_eq!(
                node.cumulative_strategy()[i].to_bits(),
                other.cumulative_strategy()[i].to_bits()
            );
        }
    }
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("kuhn-store-does-not-exist.json");
    assert!(matches!(InfoSetStore::load(path), Err(KuhnError::Io(_))));
}

#[test]
fn test_trained_player() {
    let mut trainer = Trainer::new(11);
    trainer.train(50_000).unwrap();
    let store = trainer.store();

    assert_gt!(store.average_strategy(&info_set("0")).unwrap()[Action::Pass.index()], 0.5);
    assert_gt!(store.average_strategy(&info_set("2")).unwrap()[Action::Bet.index()], 0.5);
    assert_lt!(compute_exploitability(store), compute_exploitability(&InfoSetStore::new()));

    let mut cfr = CfrPlayer::new(store, WyRng::seed_from_u64(1)).unwrap();
    let mut random = RandomPlayer::new(WyRng::seed_from_u64(2));
    let score = compete(&mut cfr, &mut random, 20_000, &mut WyRng::seed_from_u64(3)).unwrap();
    assert_gt!(score, 0.05);
}
