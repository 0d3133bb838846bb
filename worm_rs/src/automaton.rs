//! Automaton data: states, alphabet, transitions and derived properties.
//!
//! States are referred to by index. Index `0` is the start state, the last
//! index is the target. Names (`s00`, `s01`, ...) only exist for display and
//! for the answers a player submits.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis;

/// Result of walking an input that falls off the graph.
pub const NULL_STATE: &str = "snull";

/// Alphabet the symbols are drawn from, in order.
pub const BASE64_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub type StateId = usize;

/// Sparse transition function `state x symbol -> state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    edges: Vec<BTreeMap<char, StateId>>,
}

impl Transitions {
    pub fn new(states: usize) -> Self {
        Self {
            edges: vec![BTreeMap::new(); states],
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, from: StateId, symbol: char) -> Option<StateId> {
        self.edges.get(from)?.get(&symbol).copied()
    }

    /// Set `from --symbol--> to`, returning the destination it replaced.
    pub fn insert(&mut self, from: StateId, symbol: char, to: StateId) -> Option<StateId> {
        self.edges[from].insert(symbol, to)
    }

    pub fn out_degree(&self, from: StateId) -> usize {
        self.edges.get(from).map_or(0, BTreeMap::len)
    }

    pub fn has_symbol(&self, from: StateId, symbol: char) -> bool {
        self.edges
            .get(from)
            .is_some_and(|edges| edges.contains_key(&symbol))
    }

    /// Destinations of `from`, ordered by symbol code point.
    pub fn successors(&self, from: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.edges.get(from).into_iter().flat_map(|e| e.values().copied())
    }

    /// `(from, symbol, to)` for every edge.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, char, StateId)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .flat_map(|(from, e)| e.iter().map(move |(&symbol, &to)| (from, symbol, to)))
    }

    /// True if some other state has an edge into `state`.
    pub fn is_entered(&self, state: StateId) -> bool {
        self.iter().any(|(from, _, to)| to == state && from != state)
    }

    /// Follow `input` from `start`. `None` when a symbol has no transition.
    pub fn walk(&self, start: StateId, input: &str) -> Option<StateId> {
        input
            .chars()
            .try_fold(start, |state, symbol| self.get(state, symbol))
    }
}

/// Ground truth computed once per graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// Length of the shortest input leading from start to target.
    pub path_length: usize,
    pub bipartite: bool,
    /// Jump height per state; `None` for states without outgoing edges.
    pub values: Vec<Option<i64>>,
    pub indegrees: Vec<usize>,
    /// States in depth-first visiting order from the start state.
    pub dfs_order: Vec<StateId>,
}

/// A generated puzzle graph with its properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomataData {
    pub states: Vec<String>,
    pub symbols: Vec<char>,
    pub transitions: Transitions,
    pub properties: Properties,
}

impl AutomataData {
    /// Wrap generated transitions and compute their properties.
    pub fn new(states: Vec<String>, symbols: Vec<char>, transitions: Transitions) -> Self {
        let properties = analysis::calculate_properties(&transitions, &symbols);
        Self {
            states,
            symbols,
            transitions,
            properties,
        }
    }

    pub fn start(&self) -> StateId {
        0
    }

    pub fn target(&self) -> StateId {
        self.states.len().saturating_sub(1)
    }

    pub fn state_name(&self, state: StateId) -> &str {
        self.states.get(state).map_or(NULL_STATE, String::as_str)
    }

    pub fn state_index(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|s| s == name)
    }

    /// Name of the state reached by walking `input` from the start state,
    /// or [`NULL_STATE`].
    pub fn evaluate(&self, input: &str) -> &str {
        match self.transitions.walk(self.start(), input) {
            Some(state) => self.state_name(state),
            None => NULL_STATE,
        }
    }

    /// Upper bound on distinct test inputs: one per state and symbol.
    pub fn max_size(&self) -> usize {
        self.states.len() * self.symbols.len()
    }
}

/// Number of states and symbols of a new puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WormSize {
    pub states: usize,
    pub symbols: usize,
}

/// Pick a puzzle size. Grows with the number of completions.
pub fn worm_size<R: Rng + ?Sized>(completions: f64, rng: &mut R) -> WormSize {
    let base = f64::from(rng.gen_range(20u32..=40));
    let size = ((rng.r#gen::<f64>() + 0.5) * completions.max(0.0)).floor() + base;
    let states = 6f64.max(((rng.r#gen::<f64>() + 1.5) * size.sqrt()).floor());
    let symbols = 2f64.max((size / states * (rng.r#gen::<f64>() * 0.25 + 0.5)).floor());

    WormSize {
        states: states as usize,
        symbols: (symbols as usize).min(BASE64_ALPHABET.len()),
    }
}

/// `s0`, `s1`, ... zero padded to `ceil(log10(count))` digits.
pub fn state_names(count: usize) -> Vec<String> {
    let width = (count as f64).log10().ceil().max(0.0) as usize;
    (0..count).map(|i| format!("s{:0width$}", i)).collect()
}

/// First `count` characters of [`BASE64_ALPHABET`].
pub fn symbol_alphabet(count: usize) -> Vec<char> {
    BASE64_ALPHABET.chars().take(count).collect()
}
