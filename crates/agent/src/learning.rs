use std::collections::HashMap;
use std::path::{Path, PathBuf};

use duel_shared::{LearningConfig, MissingTable};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actions::ActionSpace;
use crate::state::StateKey;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Q-table not found at {0}")]
    Missing(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed Q-table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Q-table has {found} actions per state, expected {expected}")]
    ActionCount { expected: usize, found: usize },
}

/// State -> one value per action. Unseen states read as all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    action_count: usize,
    rows: HashMap<StateKey, Vec<f64>>,
}

/// Aggregate view of a table, for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TableSummary {
    pub states: usize,
    pub action_count: usize,
    pub non_zero: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct QEntry {
    state: StateKey,
    values: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct QTableFile {
    action_count: usize,
    entries: Vec<QEntry>,
}

impl QTable {
    pub fn new(action_count: usize) -> Self {
        Self {
            action_count,
            rows: HashMap::new(),
        }
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Number of states that have a row.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `state`, inserting a zero row on first access.
    pub fn row_mut(&mut self, state: &StateKey) -> &mut [f64] {
        let n = self.action_count;
        self.rows.entry(*state).or_insert_with(|| vec![0.0; n])
    }

    /// Row for `state` without inserting. `None` means "all zeros".
    pub fn row(&self, state: &StateKey) -> Option<&[f64]> {
        self.rows.get(state).map(Vec::as_slice)
    }

    pub fn value(&self, state: &StateKey, action: usize) -> f64 {
        self.row(state)
            .and_then(|r| r.get(action).copied())
            .unwrap_or(0.0)
    }

    pub fn max_value(&mut self, state: &StateKey) -> f64 {
        let row: &[f64] = self.row_mut(state);
        row[argmax(row)]
    }

    pub fn best_action(&mut self, state: &StateKey) -> usize {
        argmax(self.row_mut(state))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f64])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn summary(&self) -> TableSummary {
        let mut summary = TableSummary {
            states: self.rows.len(),
            action_count: self.action_count,
            ..Default::default()
        };
        for v in self.rows.values().flatten() {
            if *v != 0.0 {
                summary.non_zero += 1;
            }
            summary.min = Some(summary.min.map_or(*v, |m: f64| m.min(*v)));
            summary.max = Some(summary.max.map_or(*v, |m: f64| m.max(*v)));
        }
        summary
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut entries: Vec<QEntry> = self
            .rows
            .iter()
            .map(|(state, values)| QEntry {
                state: *state,
                values: values.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.state.cmp(&b.state));
        serde_json::to_string(&QTableFile {
            action_count: self.action_count,
            entries,
        })
    }

    /// Parse a table; every row must match `expected_actions`.
    pub fn from_json(text: &str, expected_actions: usize) -> Result<Self, TableError> {
        let file: QTableFile = serde_json::from_str(text)?;
        if file.action_count != expected_actions {
            return Err(TableError::ActionCount {
                expected: expected_actions,
                found: file.action_count,
            });
        }
        let mut rows = HashMap::with_capacity(file.entries.len());
        for entry in file.entries {
            if entry.values.len() != expected_actions {
                return Err(TableError::ActionCount {
                    expected: expected_actions,
                    found: entry.values.len(),
                });
            }
            rows.insert(entry.state, entry.values);
        }
        Ok(Self {
            action_count: expected_actions,
            rows,
        })
    }

    /// Write the whole table, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|source| TableError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path, expected_actions: usize) -> Result<Self, TableError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TableError::Missing(path.to_path_buf()))
            }
            Err(source) => {
                return Err(TableError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&text, expected_actions)
    }
}

/// Index of the first maximum.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Epsilon-greedy tabular Q-learner over a fixed action space.
pub struct QLearningAgent {
    table: QTable,
    actions: ActionSpace,
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    rng: Pcg64,
}

impl QLearningAgent {
    pub fn new(actions: ActionSpace, config: &LearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        Self {
            table: QTable::new(actions.len()),
            actions,
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            epsilon: config.epsilon,
            rng,
        }
    }

    pub fn actions(&self) -> &ActionSpace {
        &self.actions
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Random action with probability epsilon, otherwise the greedy one.
    pub fn select_action(&mut self, state: &StateKey) -> usize {
        if self.rng.gen::<f64>() < self.epsilon {
            let idx = self.rng.gen_range(0..self.actions.len());
            debug!(action = idx, "exploring");
            idx
        } else {
            self.table.best_action(state)
        }
    }

    pub fn greedy_action(&mut self, state: &StateKey) -> usize {
        self.table.best_action(state)
    }

    /// One-step Q-learning update. Returns the new value of (state, action).
    pub fn update(&mut self, state: &StateKey, action: usize, reward: f64, next_state: &StateKey) -> f64 {
        let target = reward + self.discount_factor * self.table.max_value(next_state);
        let row = self.table.row_mut(state);
        let q = &mut row[action];
        *q += self.learning_rate * (target - *q);
        *q
    }

    pub fn persist(&self, path: &Path) -> Result<(), TableError> {
        self.table.save(path)?;
        info!(path = %path.display(), states = self.table.len(), "Q-table saved");
        Ok(())
    }

    /// Replace the table with the one stored at `path`.
    pub fn restore(&mut self, path: &Path) -> Result<(), TableError> {
        self.table = QTable::load(path, self.actions.len())?;
        info!(path = %path.display(), states = self.table.len(), "Q-table loaded");
        Ok(())
    }

    /// Restore, applying `policy` when the file does not exist.
    pub fn restore_with(&mut self, path: &Path, policy: MissingTable) -> Result<(), TableError> {
        match (self.restore(path), policy) {
            (Err(TableError::Missing(p)), MissingTable::Empty) => {
                warn!(path = %p.display(), "no Q-table to load, starting empty");
                Ok(())
            }
            (res, _) => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_shared::{ActionConfig, STATE_DIMS};

    fn key(v: i32) -> StateKey {
        StateKey([v; STATE_DIMS])
    }

    fn agent(epsilon: f64) -> QLearningAgent {
        let config = LearningConfig {
            learning_rate: 0.1,
            discount_factor: 0.2,
            epsilon,
            seed: Some(7),
        };
        QLearningAgent::new(ActionSpace::combined(&ActionConfig::default()), &config)
    }

    #[test]
    fn test_unseen_state_is_zero() {
        let mut table = QTable::new(4);
        assert!(table.row(&key(1)).is_none());
        assert_eq!(table.value(&key(1), 3), 0.0);
        assert_eq!(table.row_mut(&key(1)), &[0.0; 4]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[-5.0, -1.0, -1.0]), 1);
    }

    #[test]
    fn test_greedy_when_epsilon_zero() {
        let mut a = agent(0.0);
        let s = key(0);
        a.table.row_mut(&s)[42] = 1.5;
        for _ in 0..50 {
            assert_eq!(a.select_action(&s), 42);
        }
    }

    #[test]
    fn test_exploration_when_epsilon_one() {
        let mut a = agent(1.0);
        let s = key(0);
        a.table.row_mut(&s)[0] = 100.0;
        let picks: Vec<usize> = (0..200).map(|_| a.select_action(&s)).collect();
        assert!(picks.iter().all(|&i| i < 132));
        assert!(picks.iter().any(|&i| i != 0));
    }

    #[test]
    fn test_seeded_selection_reproducible() {
        let mut a = agent(0.5);
        let mut b = agent(0.5);
        let s = key(3);
        let xs: Vec<usize> = (0..100).map(|_| a.select_action(&s)).collect();
        let ys: Vec<usize> = (0..100).map(|_| b.select_action(&s)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_update_formula() {
        let mut a = agent(0.0);
        let s = key(0);
        let next = key(1);
        a.table.row_mut(&next)[5] = 10.0;
        // 0 + 0.1 * (20 + 0.2 * 10 - 0) = 2.2
        let q = a.update(&s, 3, 20.0, &next);
        assert!((q - 2.2).abs() < 1e-12);
        assert!((a.table.value(&s, 3) - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_update_contracts_toward_target() {
        let mut a = agent(0.0);
        let s = key(0);
        let next = key(1);

        // below target: increases
        let before = a.table.value(&s, 0);
        let after = a.update(&s, 0, 10.0, &next);
        assert!(after > before);
        assert!(after < 10.0);

        // above target: decreases
        a.table.row_mut(&s)[1] = 500.0;
        let after = a.update(&s, 1, 10.0, &next);
        assert!(after < 500.0);
        assert!(after > 10.0);
    }

    #[test]
    fn test_negative_reward_pushes_down() {
        let mut a = agent(0.0);
        let q = a.update(&key(0), 70, -50.0, &key(1));
        assert!(q < 0.0);
        // the greedy choice now avoids the penalized action
        assert_ne!(a.greedy_action(&key(0)), 70);
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");

        let mut a = agent(0.0);
        a.update(&key(0), 3, 20.0, &key(1));
        a.update(&key(-2), 100, -50.0, &key(0));
        a.persist(&path).unwrap();

        let mut b = agent(0.0);
        b.restore(&path).unwrap();
        assert_eq!(b.table, a.table);
        assert_eq!(b.table.value(&key(0), 3), a.table.value(&key(0), 3));
        // absent from both: still zero
        assert!(b.table.row(&key(9)).is_none());
        assert_eq!(b.table.row_mut(&key(9)), vec![0.0; 132].as_slice());
    }

    #[test]
    fn test_restore_missing_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let mut a = agent(0.0);
        assert!(matches!(a.restore(&path), Err(TableError::Missing(_))));
        assert!(matches!(
            a.restore_with(&path, MissingTable::Fail),
            Err(TableError::Missing(_))
        ));
        a.restore_with(&path, MissingTable::Empty).unwrap();
        assert!(a.table().is_empty());
    }

    #[test]
    fn test_restore_rejects_wrong_action_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        let mut small = QTable::new(66);
        small.row_mut(&key(0))[1] = 1.0;
        small.save(&path).unwrap();

        let mut a = agent(0.0);
        assert!(matches!(
            a.restore(&path),
            Err(TableError::ActionCount {
                expected: 132,
                found: 66
            })
        ));
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.json");
        std::fs::write(&path, "not json").unwrap();
        let mut a = agent(0.0);
        assert!(matches!(a.restore(&path), Err(TableError::Json(_))));
    }

    #[test]
    fn test_summary() {
        let mut table = QTable::new(3);
        assert_eq!(table.summary().min, None);
        table.row_mut(&key(0))[1] = -2.0;
        table.row_mut(&key(1))[2] = 4.5;
        let s = table.summary();
        assert_eq!(s.states, 2);
        assert_eq!(s.action_count, 3);
        assert_eq!(s.non_zero, 2);
        assert_eq!(s.min, Some(-2.0));
        assert_eq!(s.max, Some(4.5));
    }
}
