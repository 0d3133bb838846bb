//! A single puzzle: hidden graph, chosen answer states, player guess, scoring.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::automaton::{AutomataData, state_names, symbol_alphabet, worm_size};
use crate::error::{GenerationError, Result, WormError};
use crate::generator::generate_graph;

/// Identifier of a session, unique for the registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOwner {
    /// A script process; the session ends when the process is gone.
    Process(u32),
    /// The manual-entry UI. Never swept.
    Manual,
}

/// States the player's answers are checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// State whose indegree is asked for.
    pub indegree: String,
    /// State whose value is asked for.
    pub value: String,
    /// Position in the depth-first order whose state is asked for.
    pub dfs_order: usize,
}

/// The player's current answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guess {
    pub path: String,
    pub bipartite: bool,
    pub value: i64,
    pub indegree: i64,
    pub dfs_state: String,
}

impl Default for Guess {
    fn default() -> Self {
        Self {
            path: String::new(),
            bipartite: false,
            value: -1,
            indegree: -1,
            dfs_state: String::new(),
        }
    }
}

/// One guess field with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessField {
    Path(String),
    Bipartite(bool),
    Value(i64),
    Indegree(i64),
    DfsState(String),
}

/// The answers a perfect guess would contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expected {
    pub path_length: usize,
    pub bipartite: bool,
    pub value: Option<i64>,
    pub indegree: usize,
    pub dfs_state: String,
}

/// Reward penalty for probing the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scoring {
    pub floor: f64,
    pub exponent: f64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            floor: 0.1,
            exponent: 2.0,
        }
    }
}

impl Scoring {
    /// `1 - (1 - floor) * min(tests / max_size, 1)^exponent`.
    ///
    /// Exactly 1 without tests, never below `floor`.
    pub fn penalty(&self, tests: u32, max_size: usize) -> f64 {
        if tests == 0 {
            return 1.0;
        }
        let floor = if self.floor.is_nan() {
            0.0
        } else {
            self.floor.clamp(0.0, 1.0)
        };
        let ratio = (f64::from(tests) / max_size.max(1) as f64).min(1.0);
        let penalty = 1.0 - (1.0 - floor) * ratio.powf(self.exponent);
        if penalty.is_nan() {
            return floor;
        }
        penalty.clamp(floor, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleSession {
    pub id: SessionId,
    pub owner: SessionOwner,
    pub graph: AutomataData,
    pub params: Params,
    pub guess: Guess,
    pub start_time_ms: u64,
    pub finish_time_ms: Option<u64>,
    pub tests_done: u32,
    /// Set once the session is finished, `0` when ended without solving.
    pub reward: Option<f64>,
}

impl PuzzleSession {
    pub fn new(
        id: SessionId,
        owner: SessionOwner,
        graph: AutomataData,
        params: Params,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            owner,
            graph,
            params,
            guess: Guess::default(),
            start_time_ms: now_ms,
            finish_time_ms: None,
            tests_done: 0,
            reward: None,
        }
    }

    /// Generate a fresh puzzle sized for `completions`.
    ///
    /// A failed generation is discarded and redone with new randomness, up
    /// to `attempts` times.
    pub fn generate<R: Rng + ?Sized>(
        id: SessionId,
        owner: SessionOwner,
        completions: f64,
        attempts: u32,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self> {
        let mut last = None;
        for attempt in 1..=attempts.max(1) {
            let size = worm_size(completions, rng);
            let symbols = symbol_alphabet(size.symbols);
            match generate_graph(size.states, &symbols, rng) {
                Ok(generated) => {
                    debug!(
                        %id,
                        attempt,
                        states = size.states,
                        symbols = size.symbols,
                        "worm graph ready"
                    );
                    let graph =
                        AutomataData::new(state_names(size.states), symbols, generated.transitions);
                    let params = choose_params(&graph, rng);
                    return Ok(Self::new(id, owner, graph, params, now_ms));
                }
                Err(err) => {
                    warn!(%id, attempt, error = %err, "worm graph generation failed, retrying");
                    last = Some(err);
                }
            }
        }
        Err(WormError::GenerationExhausted {
            attempts: attempts.max(1),
            last: last.unwrap_or(GenerationError::NoOpenEdges),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finish_time_ms.is_some()
    }

    /// Walk `input` from the start state; counts as one test.
    pub fn evaluate(&mut self, input: &str) -> String {
        self.tests_done += 1;
        self.graph.evaluate(input).to_string()
    }

    pub fn set_guess(&mut self, field: GuessField) {
        match field {
            GuessField::Path(path) => self.guess.path = path,
            GuessField::Bipartite(bipartite) => self.guess.bipartite = bipartite,
            GuessField::Value(value) => self.guess.value = value,
            GuessField::Indegree(indegree) => self.guess.indegree = indegree,
            GuessField::DfsState(state) => self.guess.dfs_state = state,
        }
    }

    pub fn expected(&self) -> Expected {
        let props = &self.graph.properties;
        let value_state = self.graph.state_index(&self.params.value);
        let indegree_state = self.graph.state_index(&self.params.indegree);
        let dfs_state = props
            .dfs_order
            .get(self.params.dfs_order)
            .map(|&s| self.graph.state_name(s).to_string())
            .unwrap_or_default();

        Expected {
            path_length: props.path_length,
            bipartite: props.bipartite,
            value: value_state.and_then(|s| props.values.get(s).copied().flatten()),
            indegree: indegree_state
                .and_then(|s| props.indegrees.get(s).copied())
                .unwrap_or(0),
            dfs_state,
        }
    }

    /// Right length, and it actually leads to the target.
    pub fn is_path_correct(&self) -> bool {
        let target = self.graph.state_name(self.graph.target());
        self.guess.path.chars().count() == self.graph.properties.path_length
            && self.graph.evaluate(&self.guess.path) == target
    }

    pub fn is_bipartite_correct(&self) -> bool {
        self.guess.bipartite == self.graph.properties.bipartite
    }

    pub fn is_node_value_correct(&self) -> bool {
        self.expected().value == Some(self.guess.value)
    }

    pub fn is_node_indegree_correct(&self) -> bool {
        i64::try_from(self.expected().indegree).is_ok_and(|d| d == self.guess.indegree)
    }

    pub fn is_dfs_state_correct(&self) -> bool {
        self.guess.dfs_state == self.expected().dfs_state
    }

    /// Finish the session and score the guess.
    ///
    /// Without a correct path the reward is `0`. Otherwise it is the share of
    /// correct answers, reduced by [`Scoring::penalty`].
    pub fn solve(&mut self, now_ms: u64, scoring: &Scoring) -> Result<f64> {
        if self.is_finished() {
            return Err(WormError::AlreadySolved(self.id));
        }
        self.finish_time_ms = Some(now_ms);

        let checks = [
            self.is_path_correct(),
            self.is_bipartite_correct(),
            self.is_node_value_correct(),
            self.is_node_indegree_correct(),
            self.is_dfs_state_correct(),
        ];
        let reward = if checks[0] {
            let correct = checks.iter().filter(|&&c| c).count() as f64;
            let penalty = scoring.penalty(self.tests_done, self.graph.max_size());
            correct / checks.len() as f64 * penalty
        } else {
            0.0
        };

        self.reward = Some(reward);
        Ok(reward)
    }

    /// Finish without scoring.
    pub fn end(&mut self, now_ms: u64) {
        if !self.is_finished() {
            self.finish_time_ms = Some(now_ms);
            self.reward = Some(0.0);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            owner: self.owner,
            states: self.graph.states.clone(),
            symbols: self.graph.symbols.iter().map(char::to_string).collect(),
            params: self.params.clone(),
            guess: self.guess.clone(),
            tests_done: self.tests_done,
            start_time_ms: self.start_time_ms,
            finish_time_ms: self.finish_time_ms,
            reward: self.reward,
            expected: self.is_finished().then(|| self.expected()),
        }
    }
}

fn choose_params<R: Rng + ?Sized>(graph: &AutomataData, rng: &mut R) -> Params {
    let n = graph.states.len();
    let dfs_len = graph.properties.dfs_order.len().max(1);
    Params {
        indegree: graph.state_name(rng.gen_range(0..n)).to_string(),
        value: graph.state_name(rng.gen_range(0..n)).to_string(),
        dfs_order: rng.gen_range(0..n) % dfs_len,
    }
}

/// Serializable view of a session. Answers are only included once it is
/// finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub owner: SessionOwner,
    pub states: Vec<String>,
    pub symbols: Vec<String>,
    pub params: Params,
    pub guess: Guess,
    pub tests_done: u32,
    pub start_time_ms: u64,
    pub finish_time_ms: Option<u64>,
    pub reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
}
