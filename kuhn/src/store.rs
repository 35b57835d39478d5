use std::{
    collections::BTreeMap,
    fmt::Display,
    fs::File,
    io::{
        BufReader,
        BufWriter,
        Read,
        Write,
    },
    path::Path,
};

use itertools::Itertools;
use log::info;
use serde::{
    de::{
        self,
        MapAccess,
        Visitor,
    },
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::{
    error::{
        KuhnError,
        Result,
    },
    game::{
        Action,
        InfoSet,
    },
    node::Node,
};

/// Regret and strategy accumulators for every information set visited so far.
///
/// Entries are created lazily and only ever accumulate: the same information
/// set is reached from several deals and every visit adds to the same node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InfoSetStore {
    nodes: BTreeMap<InfoSet, Node>,
}

impl InfoSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_exists(&mut self, info_set: &InfoSet) -> &mut Node {
        self.nodes.entry(info_set.clone()).or_default()
    }

    pub fn get(&self, info_set: &InfoSet) -> Option<&Node> {
        self.nodes.get(info_set)
    }

    pub fn regrets(&self, info_set: &InfoSet) -> Option<&[f64; Action::COUNT]> {
        self.nodes.get(info_set).map(Node::regrets)
    }

    pub fn add_regret(&mut self, info_set: &InfoSet, action: Action, delta: f64) {
        self.ensure_exists(info_set).add_regret(action, delta);
    }

    pub fn add_strategy_weight(&mut self, info_set: &InfoSet, action: Action, delta: f64) {
        self.ensure_exists(info_set).add_strategy_weight(action, delta);
    }

    pub fn average_strategy(&self, info_set: &InfoSet) -> Option<[f64; Action::COUNT]> {
        self.nodes.get(info_set).map(Node::average_strategy)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InfoSet, &Node)> {
        self.nodes.iter()
    }

    /// Information sets of the game that have never been visited.
    pub fn missing_info_sets(&self) -> Vec<InfoSet> {
        InfoSet::all().into_iter().filter(|i| !self.nodes.contains_key(i)).collect()
    }

    /// Adds every accumulator of `other` into this store.
    pub fn merge(&mut self, other: &InfoSetStore) {
        for (info_set, node) in &other.nodes {
            self.ensure_exists(info_set).merge(node);
        }
    }

    /// Adds what `updated` accumulated since it was copied from `base`.
    pub fn merge_delta(&mut self, updated: &InfoSetStore, base: &InfoSetStore) {
        let zero = Node::new();
        for (info_set, node) in &updated.nodes {
            let before = base.nodes.get(info_set).unwrap_or(&zero);
            self.ensure_exists(info_set).merge_delta(node, before);
        }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a store and rejects it as a whole if any entry is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let store: InfoSetStore = serde_json::from_reader(reader)?;
        for (info_set, node) in &store.nodes {
            node.validate().map_err(|reason| KuhnError::MalformedNode {
                info_set: info_set.to_string(),
                reason,
            })?;
        }
        Ok(store)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.to_writer(&mut w)?;
        w.flush()?;
        info!("Saved {} information sets to {}", self.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let store = Self::from_reader(BufReader::new(f))?;
        info!("Loaded {} information sets from {}", store.len(), path.as_ref().display());
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for InfoSetStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = InfoSetStore;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map from information set ids to nodes")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut nodes = BTreeMap::new();
                while let Some((info_set, node)) = map.next_entry::<InfoSet, Node>()? {
                    if nodes.contains_key(&info_set) {
                        return Err(de::Error::custom(format!(
                            "duplicate information set {}",
                            info_set
                        )));
                    }
                    nodes.insert(info_set, node);
                }
                Ok(InfoSetStore {
                    nodes,
                })
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}

impl Display for InfoSetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (info_set, node) in self.nodes.iter().sorted_by_key(|(i, _)| (i.history.len(), *i)) {
            let avg = node.average_strategy();
            writeln!(
                f,
                "{:5} pass: {:.3} bet: {:.3}",
                info_set.to_string(),
                avg[Action::Pass.index()],
                avg[Action::Bet.index()]
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_set(s: &str) -> InfoSet {
        s.parse().unwrap()
    }

    #[test]
    fn test_accumulates() {
        let mut store = InfoSetStore::new();
        let id = info_set("1p");
        assert!(store.regrets(&id).is_none());

        store.ensure_exists(&id);
        assert_eq!(Some(&[0.0, 0.0]), store.regrets(&id));
        store.add_regret(&id, Action::Bet, 2.0);
        store.add_regret(&id, Action::Bet, -0.5);
        store.add_strategy_weight(&id, Action::Pass, 1.0);
        store.add_strategy_weight(&id, Action::Pass, 2.0);
        store.add_strategy_weight(&id, Action::Bet, 1.0);

        assert_eq!(Some(&[0.0, 1.5]), store.regrets(&id));
        assert_eq!(Some([0.75, 0.25]), store.average_strategy(&id));
        assert_eq!(1, store.len());
        assert_eq!(11, store.missing_info_sets().len());
    }

    #[test]
    fn test_merge() {
        let mut a = InfoSetStore::new();
        a.add_regret(&info_set("0"), Action::Pass, 1.0);
        let mut b = InfoSetStore::new();
        b.add_regret(&info_set("0"), Action::Pass, 2.0);
        b.add_strategy_weight(&info_set("2b"), Action::Bet, 1.0);

        a.merge(&b);
        assert_eq!(2, a.len());
        assert_eq!(Some(&[3.0, 0.0]), a.regrets(&info_set("0")));
        assert_eq!(Some([0.0, 1.0]), a.average_strategy(&info_set("2b")));
    }

    #[test]
    fn test_merge_delta() {
        let mut base = InfoSetStore::new();
        base.add_regret(&info_set("0"), Action::Pass, 4.0);
        let mut updated = base.clone();
        updated.add_regret(&info_set("0"), Action::Pass, 1.0);
        updated.add_strategy_weight(&info_set("1b"), Action::Bet, 2.0);

        let mut merged = base.clone();
        merged.merge_delta(&updated, &base);
        merged.merge_delta(&updated, &base);
        assert_eq!(Some(&[6.0, 0.0]), merged.regrets(&info_set("0")));
        assert_eq!(&[0.0, 4.0], merged.get(&info_set("1b")).unwrap().cumulative_strategy());
    }

    #[test]
    fn test_round_trip() {
        let mut store = InfoSetStore::new();
        store.add_regret(&info_set("0pb"), Action::Pass, 0.1 + 0.2);
        store.add_regret(&info_set("0pb"), Action::Bet, -1.0 / 3.0);
        store.add_strategy_weight(&info_set("2"), Action::Bet, std::f64::consts::PI);
        store.add_strategy_weight(&info_set("2"), Action::Pass, 1e-300);

        let mut buf = vec![];
        store.to_writer(&mut buf).unwrap();
        let loaded = InfoSetStore::from_reader(buf.as_slice()).unwrap();
        assert_eq!(store, loaded);
        for (id, node) in store.iter() {
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
    fn test_load_rejects_malformed() {
        let bad = [
            r#"{"3": {"regrets": [0.0, 0.0], "cumulative_strategy": [0.0, 0.0]}}"#,
            r#"{"0pp": {"regrets": [0.0, 0.0], "cumulative_strategy": [0.0, 0.0]}}"#,
            r#"{"": {"regrets": [0.0, 0.0], "cumulative_strategy": [0.0, 0.0]}}"#,
            r#"{"0": {"regrets": [0.0, 0.0]}}"#,
            r#"{"0": {"regrets": [0.0], "cumulative_strategy": [0.0, 0.0]}}"#,
            r#"{"0": {"regrets": [0.0, 0.0], "cumulative_strategy": [-1.0, 0.0]}}"#,
            r#"{"0": {"regrets": [0.0, 0.0], "cumulative_strategy": [0.0, 0.0], "x": 1}}"#,
            r#"{"0": {"regrets": [1.0, 0.0], "cumulative_strategy": [0.0, 0.0]},
                "0": {"regrets": [0.0, 0.0], "cumulative_strategy": [0.0, 0.0]}}"#,
            r#"[]"#,
        ];
        for json in bad {
            assert!(InfoSetStore::from_reader(json.as_bytes()).is_err(), "{}", json);
        }

        let good = r#"{"1pb": {"regrets": [0.5, -0.5], "cumulative_strategy": [1.0, 3.0]}}"#;
        let store = InfoSetStore::from_reader(good.as_bytes()).unwrap();
        assert_eq!(Some([0.25, 0.75]), store.average_strategy(&info_set("1pb")));
    }

    #[test]
    fn test_display() {
        let mut store = InfoSetStore::new();
        store.add_strategy_weight(&info_set("2pb"), Action::Bet, 1.0);
        store.add_strategy_weight(&info_set("0"), Action::Pass, 3.0);
        store.add_strategy_weight(&info_set("0"), Action::Bet, 1.0);
        assert_eq!(
            "0     pass: 0.750 bet: 0.250\n2pb   pass: 0.000 bet: 1.000\n",
            store.to_string()
        );
    }
}
